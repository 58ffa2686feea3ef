//! End-to-end backtests on synthetic daily histories.

use approx::assert_relative_eq;
use chrono::{Datelike, Duration, NaiveDate, Weekday};
use rust_decimal::Decimal;
use rust_decimal_macros::dec;

use strangle_backtest::backtest::{BacktestConfig, BacktestEngine, CycleOutcome, CycleRules, CycleSimulator};
use strangle_backtest::data::{DailyBar, HistoryLoader, OptionType, PriceHistory, UnderlyingSpec};
use strangle_backtest::metrics::MetricsCalculator;
use strangle_backtest::position::TradeStatus;
use strangle_backtest::pricing::PremiumEstimator;
use strangle_backtest::risk::ExitRules;

fn date(y: i32, m: u32, d: u32) -> NaiveDate {
    NaiveDate::from_ymd_opt(y, m, d).unwrap()
}

/// Weekday bars with closes from `close_at(day_index)`.
fn weekday_history(start: NaiveDate, days: i64, close_at: impl Fn(i64) -> f64) -> PriceHistory {
    PriceHistory::from_bars(
        "NIFTY",
        (0..days)
            .map(|i| (i, start + Duration::days(i)))
            .filter(|(_, d)| !matches!(d.weekday(), Weekday::Sat | Weekday::Sun))
            .map(|(i, d)| DailyBar {
                date: d,
                close: close_at(i),
                volatility: 0.20,
            }),
    )
}

#[test]
fn ten_percent_otm_strikes_and_skip_filter() {
    let nifty = UnderlyingSpec::nifty();
    let put_strike = nifty.otm_strike(22_000.0, 0.10, OptionType::Put);
    let call_strike = nifty.otm_strike(22_000.0, 0.10, OptionType::Call);
    assert_eq!(put_strike, 19_800.0);
    assert_eq!(call_strike, 24_200.0);

    let estimator = PremiumEstimator::default();
    let put = estimator.premium(22_000.0, put_strike, 7, 0.20, OptionType::Put);
    let call = estimator.premium(22_000.0, call_strike, 7, 0.20, OptionType::Call);
    assert!(put >= 1.0 && call >= 1.0);

    // Run the same setup through a full cycle (Monday entry, Thursday expiry)
    let start = date(2024, 1, 1);
    let history = weekday_history(start, 4, |_| 22_000.0);
    let simulator = CycleSimulator::new(nifty, estimator.clone(), CycleRules::default());
    let outcome = simulator.simulate(&history, date(2024, 1, 4));

    let entry_put = estimator.premium(22_000.0, put_strike, 3, 0.20, OptionType::Put);
    let entry_call = estimator.premium(22_000.0, call_strike, 3, 0.20, OptionType::Call);
    if entry_put < 20.0 || entry_call < 20.0 {
        let CycleOutcome::Skipped(skipped) = outcome else {
            panic!("cheap premiums must skip the cycle");
        };
        assert_relative_eq!(skipped.put_premium, entry_put);
        assert_relative_eq!(skipped.call_premium, entry_call);

        let mut engine = BacktestEngine::new(BacktestConfig::default(), estimator, ExitRules::default());
        let report = engine.run(&UnderlyingSpec::nifty(), &history, start, date(2024, 1, 4));
        assert_eq!(report.skipped_cycles(), 1);
        assert_eq!(report.final_capital, report.initial_capital);
        assert!(report.equity_curve.is_empty());
    } else {
        let CycleOutcome::Traded(trade) = outcome else {
            panic!("premiums above the minimum must trade");
        };
        assert_eq!(trade.status, TradeStatus::Closed);
    }
}

#[test]
fn year_of_cycles_keeps_equity_and_drawdown_consistent() {
    let start = date(2024, 1, 1);
    // Slow uptrend with a sharp two-week selloff in the middle
    let history = weekday_history(start, 364, |i| {
        let base = 21_000.0 + i as f64 * 5.0;
        if (150..164).contains(&i) {
            base * 0.93
        } else {
            base
        }
    });

    let config = BacktestConfig {
        otm_pct: 0.02,
        ..BacktestConfig::default()
    };
    let mut engine = BacktestEngine::new(config, PremiumEstimator::default(), ExitRules::default());
    let report = engine.run(&UnderlyingSpec::nifty(), &history, start, date(2024, 12, 29));

    assert_eq!(report.cycles_attempted, 52);
    assert_eq!(
        report.trades.len() + report.skipped_cycles() + report.no_entry_cycles,
        report.cycles_attempted
    );
    assert!(report.has_trades());

    // Chronological, non-overlapping cycles
    for pair in report.trades.windows(2) {
        assert!(pair[0].exit_date < pair[1].entry_date);
    }

    // Capital is the running sum of cycle P&L
    let total: Decimal = report.trades.iter().map(|t| t.total_pnl).sum();
    assert_eq!(report.final_capital, report.initial_capital + total);
    assert_eq!(report.summary.total_pnl, total);
    assert_eq!(report.equity_curve.last().map(|p| p.capital), Some(report.final_capital));

    // Drawdown series is never positive and its minimum is the max drawdown
    assert!(report.drawdown.series.iter().all(|p| p.drawdown_pct <= 0.0));
    let min = report
        .drawdown
        .drawdown_pcts()
        .into_iter()
        .fold(0.0_f64, f64::min);
    assert_relative_eq!(report.max_drawdown_pct, min);

    assert_relative_eq!(
        report.total_return_pct,
        MetricsCalculator::total_return_pct(report.initial_capital, report.final_capital)
    );
}

#[test]
fn backtest_from_csv_file() {
    let dir = tempfile::tempdir().unwrap();
    let mut csv = String::from("Date,Close\n");
    let mut day = date(2024, 1, 1);
    while day <= date(2024, 3, 29) {
        if !matches!(day.weekday(), Weekday::Sat | Weekday::Sun) {
            csv.push_str(&format!("{},22000\n", day));
        }
        day += Duration::days(1);
    }
    std::fs::write(dir.path().join("NSEI.csv"), csv).unwrap();

    let nifty = UnderlyingSpec::nifty();
    let history = HistoryLoader::new(dir.path()).load(&nifty.data_symbol).unwrap();
    assert_eq!(history.first_date(), Some(date(2024, 1, 1)));

    let config = BacktestConfig {
        otm_pct: 0.01,
        initial_capital: dec!(500000),
        ..BacktestConfig::default()
    };
    let mut engine = BacktestEngine::new(config, PremiumEstimator::default(), ExitRules::default());
    let report = engine.run(&nifty, &history, date(2024, 1, 1), date(2024, 3, 29));

    assert_eq!(report.cycles_attempted, 13);
    assert!(report.trades.iter().all(|t| t.put.strike == 21_800.0 && t.call.strike == 22_200.0));
    assert!(report.summary().contains("Backtest Results: NIFTY"));
}
