//! Weekly index option selling CLI.
//!
//! Usage:
//! ```bash
//! # Backtest NIFTY over the last year of data/NSEI.csv
//! strangle-backtest backtest --symbol NIFTY --data data
//!
//! # Paper trade continuously (Ctrl-C to stop)
//! strangle-backtest paper --config config/default.toml --data data
//!
//! # Performance report from the paper ledger
//! strangle-backtest report --ledger fno_trades.db
//!
//! # Price an option / solve for implied volatility
//! strangle-backtest price --spot 22000 --strike 21000 --days 7 --vol 0.15 --kind PE
//! strangle-backtest iv --spot 22000 --strike 21000 --premium 12.5 --days 7 --kind PE
//! ```

use std::path::{Path, PathBuf};
use std::sync::atomic::{AtomicBool, Ordering};
use std::sync::Arc;

use anyhow::{bail, Context, Result};
use chrono::{Duration, Local, NaiveDate};
use clap::{Parser, Subcommand};
use tracing::info;

use strangle_backtest::backtest::{save_artifacts, BacktestEngine};
use strangle_backtest::config::AppConfig;
use strangle_backtest::data::{HistoricalFeed, HistoryLoader, OptionType, PriceHistory, UnderlyingSpec};
use strangle_backtest::metrics::PerformanceReport;
use strangle_backtest::notify::{LogNotifier, TradeEvent};
use strangle_backtest::paper::{replay, run_loop, run_scan_cycle, PaperTrader};
use strangle_backtest::position::{SqliteLedger, TradeFilter, TradeLedger};
use strangle_backtest::pricing::{BlackScholes, PremiumEstimator};
use strangle_backtest::risk::AdmissionGate;

#[derive(Parser)]
#[command(name = "strangle-backtest")]
#[command(about = "Pricing, backtesting and paper trading for weekly index option selling")]
#[command(version)]
struct Cli {
    /// Path to configuration file (defaults are used when omitted)
    #[arg(short, long, global = true)]
    config: Option<PathBuf>,

    #[command(subcommand)]
    command: Commands,
}

#[derive(Subcommand)]
enum Commands {
    /// Backtest the weekly strangle on one underlying
    Backtest {
        /// Trading symbol (NIFTY, BANKNIFTY)
        #[arg(short, long, default_value = "NIFTY")]
        symbol: String,

        /// Directory of `{symbol}.csv` daily closes
        #[arg(short, long, default_value = "data")]
        data: PathBuf,

        /// Start date (YYYY-MM-DD); defaults to end minus the lookback
        #[arg(long)]
        start: Option<NaiveDate>,

        /// End date (YYYY-MM-DD); defaults to the last date in the data
        #[arg(long)]
        end: Option<NaiveDate>,

        /// Directory for report.json, trades.csv and equity.csv
        #[arg(short, long)]
        output: Option<PathBuf>,
    },

    /// Paper trade the configured strategy
    Paper {
        /// Directory of `{symbol}.csv` daily closes
        #[arg(short, long, default_value = "data")]
        data: PathBuf,

        /// Run a single scan and exit
        #[arg(long)]
        once: bool,

        /// Replay daily scans from this date instead of running live
        #[arg(long, requires = "replay_to")]
        replay_from: Option<NaiveDate>,

        /// Last date of the replay
        #[arg(long)]
        replay_to: Option<NaiveDate>,
    },

    /// Show performance of the paper trade ledger
    Report {
        /// Ledger file (defaults to the configured ledger path)
        #[arg(short, long)]
        ledger: Option<PathBuf>,

        /// Print the Markdown message instead of the console summary
        #[arg(long)]
        markdown: bool,
    },

    /// Price an option and its Greeks
    Price {
        #[arg(long)]
        spot: f64,

        #[arg(long)]
        strike: f64,

        /// Calendar days to expiry
        #[arg(long)]
        days: i64,

        /// Annualized volatility (0.20 = 20%)
        #[arg(long, default_value_t = 0.20)]
        vol: f64,

        /// CE or PE
        #[arg(long, value_parser = parse_option_type)]
        kind: OptionType,
    },

    /// Solve for implied volatility from a premium
    Iv {
        #[arg(long)]
        spot: f64,

        #[arg(long)]
        strike: f64,

        #[arg(long)]
        premium: f64,

        /// Calendar days to expiry
        #[arg(long)]
        days: i64,

        /// CE or PE
        #[arg(long, value_parser = parse_option_type)]
        kind: OptionType,
    },
}

fn parse_option_type(s: &str) -> Result<OptionType, String> {
    OptionType::from_str(s).ok_or_else(|| format!("unknown option type '{}', expected CE or PE", s))
}

fn load_config(path: Option<&Path>) -> Result<AppConfig> {
    match path {
        Some(path) => AppConfig::from_toml(path)
            .with_context(|| format!("failed to load config {}", path.display())),
        None => Ok(AppConfig::default()),
    }
}

fn find_underlying<'a>(config: &'a AppConfig, symbol: &str) -> Result<&'a UnderlyingSpec> {
    match config.underlying(symbol) {
        Some(u) => Ok(u),
        None => bail!("Unknown underlying: {}", symbol),
    }
}

fn load_history(config: &AppConfig, data: &Path, underlying: &UnderlyingSpec) -> Result<PriceHistory> {
    HistoryLoader::new(data)
        .with_volatility(config.pricing.volatility_window, config.pricing.fallback_volatility)
        .load(&underlying.data_symbol)
        .with_context(|| format!("failed to load history for {}", underlying.symbol))
}

fn main() -> Result<()> {
    // Initialize logging
    tracing_subscriber::fmt()
        .with_env_filter(
            tracing_subscriber::EnvFilter::from_default_env()
                .add_directive("strangle_backtest=info".parse()?),
        )
        .init();

    let cli = Cli::parse();
    let config = load_config(cli.config.as_deref())?;

    match cli.command {
        Commands::Backtest {
            symbol,
            data,
            start,
            end,
            output,
        } => run_backtest(&config, &symbol, &data, start, end, output.as_deref()),
        Commands::Paper {
            data,
            once,
            replay_from,
            replay_to,
        } => run_paper(&config, &data, once, replay_from.zip(replay_to)),
        Commands::Report { ledger, markdown } => {
            let path = ledger.unwrap_or_else(|| PathBuf::from(&config.paper.ledger_path));
            let ledger = SqliteLedger::open(&path)
                .with_context(|| format!("failed to open ledger {}", path.display()))?;
            let report =
                PerformanceReport::from_trades(&ledger.query(&TradeFilter::all())?, Local::now().date_naive());
            if markdown {
                println!("{}", report.render());
            } else {
                println!("{}", report.summary());
            }
            Ok(())
        }
        Commands::Price {
            spot,
            strike,
            days,
            vol,
            kind,
        } => {
            let estimator = PremiumEstimator::new(&config.pricing);
            let greeks = estimator.model().greeks(spot, strike, days as f64 / 365.0, vol, kind);
            let estimate = estimator.estimate(spot, strike, days, vol, kind);
            println!("{} {} {} ({} days, vol {:.2})", spot, strike, kind, days, vol);
            println!("  Premium:  {:.2} ({:?})", estimate.premium, estimate.source);
            println!("  Delta:    {:.4}", greeks.delta);
            println!("  Gamma:    {:.6}", greeks.gamma);
            println!("  Theta:    {:.4}", greeks.theta);
            println!("  Vega:     {:.4}", greeks.vega);
            println!("  Rho:      {:.4}", greeks.rho);
            Ok(())
        }
        Commands::Iv {
            spot,
            strike,
            premium,
            days,
            kind,
        } => {
            let model = BlackScholes::new(config.pricing.risk_free_rate);
            let iv = model.implied_volatility(spot, strike, premium, days as f64 / 365.0, kind);
            println!(
                "Implied volatility: {:.4} ({} iterations{})",
                iv.volatility,
                iv.iterations,
                if iv.converged { "" } else { ", not converged" }
            );
            Ok(())
        }
    }
}

fn run_backtest(
    config: &AppConfig,
    symbol: &str,
    data: &Path,
    start: Option<NaiveDate>,
    end: Option<NaiveDate>,
    output: Option<&Path>,
) -> Result<()> {
    let underlying = find_underlying(config, symbol)?;
    let history = load_history(config, data, underlying)?;

    let Some(last_date) = history.last_date() else {
        bail!("No data for {}", underlying.symbol);
    };
    let end = end.unwrap_or(last_date);
    let start = start.unwrap_or(end - Duration::days(config.backtest.lookback_days));
    if start > end {
        bail!("Start date {} is after end date {}", start, end);
    }

    let mut engine = BacktestEngine::new(
        config.backtest.clone(),
        PremiumEstimator::new(&config.pricing),
        config.exits,
    );
    let report = engine.run(underlying, &history, start, end);

    println!("{}", report.summary());

    if let Some(dir) = output {
        let run_dir = save_artifacts(&report, dir)?;
        println!("\nResults saved to {}", run_dir.display());
    }

    Ok(())
}

fn run_paper(
    config: &AppConfig,
    data: &Path,
    once: bool,
    replay_range: Option<(NaiveDate, NaiveDate)>,
) -> Result<()> {
    let estimator = PremiumEstimator::new(&config.pricing);
    let today = Local::now().date_naive();
    let mut feed = HistoricalFeed::new(estimator, today);
    for underlying in &config.underlyings {
        feed.insert(&underlying.symbol, load_history(config, data, underlying)?);
    }

    let ledger = SqliteLedger::open(&config.paper.ledger_path)
        .with_context(|| format!("failed to open ledger {}", config.paper.ledger_path))?;
    let strategy = config.strategy.kind.build(&config.strategy, config.exits);
    let mut trader = PaperTrader::new(
        ledger,
        AdmissionGate::new(config.risk.clone(), config.exits),
        strategy,
        Box::new(LogNotifier::new(&config.paper.agent_name)),
        config.underlyings.clone(),
    );

    let mode = if replay_range.is_some() { "REPLAY" } else { "PAPER" };
    info!(
        "Strategy: {} | Mode: {} | Capital: ₹{} | Max positions: {}",
        trader.strategy_name(),
        mode,
        config.risk.capital,
        config.risk.max_positions
    );
    trader.notify(&TradeEvent::Started {
        strategy: trader.strategy_name().to_string(),
        mode: mode.to_string(),
        instruments: config.underlyings.iter().map(|u| u.symbol.clone()).collect(),
    });

    if let Some((from, to)) = replay_range {
        let scan_time = config.strategy.entry_after + Duration::minutes(30);
        replay(&mut trader, &mut feed, from, to, scan_time)?;
        println!("{}", trader.performance(to)?.summary());
        return Ok(());
    }

    if once {
        let now = Local::now().naive_local();
        run_scan_cycle(&mut trader, &mut feed, now)?;
        println!("{}", trader.performance(now.date())?.summary());
        return Ok(());
    }

    // Setup signal handler for graceful shutdown
    let running = Arc::new(AtomicBool::new(true));
    let r = running.clone();
    ctrlc::set_handler(move || {
        r.store(false, Ordering::SeqCst);
    })
    .context("Error setting Ctrl-C handler")?;

    let report = run_loop(&mut trader, &mut feed, &config.paper, &running, || {
        Local::now().naive_local()
    })?;
    println!("{}", report.summary());

    Ok(())
}
