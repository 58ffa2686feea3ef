//! Core backtesting engine.
//!
//! Runs the weekly simulation loop:
//! 1. List weekly expiries in the period
//! 2. Simulate each cycle in chronological order
//! 3. Carry capital forward by each cycle's P&L
//! 4. Record an equity point per traded cycle

use chrono::{NaiveDate, Weekday};
use rust_decimal::Decimal;
use serde::{Deserialize, Serialize};
use tracing::{debug, info};

use crate::data::{PriceHistory, UnderlyingSpec};
use crate::metrics::MetricsCalculator;
use crate::pricing::PremiumEstimator;
use crate::risk::ExitRules;

use super::cycle::{CycleOutcome, CycleRules, CycleSimulator, SkippedCycle};
use super::report::BacktestReport;
use super::trade::StrangleTrade;

/// Configuration for backtest execution.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct BacktestConfig {
    /// Starting capital.
    pub initial_capital: Decimal,

    /// Distance of both strikes from spot (0.10 = 10%).
    pub otm_pct: f64,

    /// Minimum premium on each leg to enter a cycle.
    pub min_entry_premium: f64,

    /// Weekday on which open cycles are closed.
    pub scheduled_exit: Weekday,

    /// Default period length when no start date is given.
    pub lookback_days: i64,
}

impl Default for BacktestConfig {
    fn default() -> Self {
        Self {
            initial_capital: Decimal::from(100_000),
            otm_pct: 0.10,
            min_entry_premium: 20.0,
            scheduled_exit: Weekday::Thu,
            lookback_days: 365,
        }
    }
}

impl BacktestConfig {
    pub fn cycle_rules(&self, exits: ExitRules) -> CycleRules {
        CycleRules {
            otm_pct: self.otm_pct,
            min_entry_premium: self.min_entry_premium,
            exits,
            scheduled_exit: self.scheduled_exit,
        }
    }
}

/// Capital after a settled cycle.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct EquityPoint {
    /// Exit date of the cycle.
    pub date: NaiveDate,
    pub capital: Decimal,
    /// Realized P&L of the cycle.
    pub pnl: Decimal,
}

/// The main backtesting engine.
pub struct BacktestEngine {
    config: BacktestConfig,
    estimator: PremiumEstimator,
    exits: ExitRules,
    capital: Decimal,
    trades: Vec<StrangleTrade>,
    skipped: Vec<SkippedCycle>,
    equity_curve: Vec<EquityPoint>,
    cycles_attempted: usize,
    no_entry_cycles: usize,
}

impl BacktestEngine {
    /// Create a new backtest engine.
    pub fn new(config: BacktestConfig, estimator: PremiumEstimator, exits: ExitRules) -> Self {
        let capital = config.initial_capital;
        Self {
            config,
            estimator,
            exits,
            capital,
            trades: Vec::new(),
            skipped: Vec::new(),
            equity_curve: Vec::new(),
            cycles_attempted: 0,
            no_entry_cycles: 0,
        }
    }

    pub fn config(&self) -> &BacktestConfig {
        &self.config
    }

    /// Run the weekly strategy on one underlying over `[start_date, end_date]`.
    pub fn run(
        &mut self,
        underlying: &UnderlyingSpec,
        history: &PriceHistory,
        start_date: NaiveDate,
        end_date: NaiveDate,
    ) -> BacktestReport {
        // Reset state
        self.capital = self.config.initial_capital;
        self.trades.clear();
        self.skipped.clear();
        self.equity_curve.clear();
        self.cycles_attempted = 0;
        self.no_entry_cycles = 0;

        let simulator = CycleSimulator::new(
            underlying.clone(),
            self.estimator.clone(),
            self.config.cycle_rules(self.exits),
        );
        let expiries = simulator.calendar().expiries(start_date, end_date);

        info!(
            "Backtesting {} weekly cycles for {} ({} to {})",
            expiries.len(),
            underlying.symbol,
            start_date,
            end_date
        );

        for expiry in expiries {
            self.process_cycle(&simulator, history, expiry);
        }

        info!(
            "Backtest complete: {} trades, {} skipped, final capital ₹{:.2}",
            self.trades.len(),
            self.skipped.len(),
            self.capital
        );

        self.build_report(&underlying.symbol, start_date, end_date)
    }

    fn process_cycle(&mut self, simulator: &CycleSimulator, history: &PriceHistory, expiry: NaiveDate) {
        self.cycles_attempted += 1;

        match simulator.simulate(history, expiry) {
            CycleOutcome::Traded(trade) => {
                self.capital += trade.total_pnl;
                self.equity_curve.push(EquityPoint {
                    date: trade.exit_date,
                    capital: self.capital,
                    pnl: trade.total_pnl,
                });
                debug!(
                    "Cycle {} -> {}: ₹{:+.0} ({}), capital ₹{:.0}",
                    trade.entry_date, trade.exit_date, trade.total_pnl, trade.exit_reason, self.capital
                );
                self.trades.push(trade);
            }
            CycleOutcome::Skipped(skipped) => self.skipped.push(skipped),
            CycleOutcome::NoEntryDay => self.no_entry_cycles += 1,
        }
    }

    fn build_report(&self, symbol: &str, start_date: NaiveDate, end_date: NaiveDate) -> BacktestReport {
        let drawdown = MetricsCalculator::drawdown(&self.equity_curve);

        BacktestReport {
            symbol: symbol.to_string(),
            start_date,
            end_date,
            initial_capital: self.config.initial_capital,
            final_capital: self.capital,
            total_return_pct: MetricsCalculator::total_return_pct(self.config.initial_capital, self.capital),
            max_drawdown_pct: drawdown.max_drawdown_pct,
            summary: MetricsCalculator::aggregate(&self.trades),
            cycles_attempted: self.cycles_attempted,
            no_entry_cycles: self.no_entry_cycles,
            trades: self.trades.clone(),
            skipped: self.skipped.clone(),
            equity_curve: self.equity_curve.clone(),
            drawdown,
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::data::DailyBar;
    use chrono::Duration;
    use rust_decimal_macros::dec;

    fn flat_history(start: NaiveDate, days: i64, close: f64) -> PriceHistory {
        PriceHistory::from_bars(
            "NIFTY",
            (0..days).map(|i| DailyBar {
                date: start + Duration::days(i),
                close,
                volatility: 0.20,
            }),
        )
    }

    fn engine(otm_pct: f64) -> BacktestEngine {
        let config = BacktestConfig {
            otm_pct,
            ..BacktestConfig::default()
        };
        BacktestEngine::new(config, PremiumEstimator::default(), ExitRules::default())
    }

    #[test]
    fn test_capital_carries_across_cycles() {
        let start = NaiveDate::from_ymd_opt(2024, 1, 1).unwrap();
        let history = flat_history(start, 28, 22_000.0);

        let mut engine = engine(0.01);
        let report = engine.run(&UnderlyingSpec::nifty(), &history, start, start + Duration::days(27));

        assert_eq!(report.cycles_attempted, 4);
        assert_eq!(report.trades.len(), 4);
        assert_eq!(report.equity_curve.len(), 4);

        let mut capital = dec!(100000);
        for (trade, point) in report.trades.iter().zip(&report.equity_curve) {
            capital += trade.total_pnl;
            assert_eq!(point.capital, capital);
            assert_eq!(point.date, trade.exit_date);
        }
        assert_eq!(report.final_capital, capital);
    }

    #[test]
    fn test_rerun_resets_state() {
        let start = NaiveDate::from_ymd_opt(2024, 1, 1).unwrap();
        let history = flat_history(start, 14, 22_000.0);
        let end = start + Duration::days(13);

        let mut engine = engine(0.01);
        let first = engine.run(&UnderlyingSpec::nifty(), &history, start, end);
        let second = engine.run(&UnderlyingSpec::nifty(), &history, start, end);

        assert_eq!(first.final_capital, second.final_capital);
        assert_eq!(first.trades.len(), second.trades.len());
    }

    #[test]
    fn test_missing_weeks_count_as_no_entry() {
        let start = NaiveDate::from_ymd_opt(2024, 1, 1).unwrap();
        // Only the first week has data
        let history = flat_history(start, 4, 22_000.0);

        let mut engine = engine(0.01);
        let report = engine.run(&UnderlyingSpec::nifty(), &history, start, start + Duration::days(20));

        assert_eq!(report.cycles_attempted, 3);
        assert_eq!(report.no_entry_cycles, 2);
        assert_eq!(report.trades.len(), 1);
    }

    #[test]
    fn test_entry_after_wednesday_expiry_is_no_entry() {
        let expiry = NaiveDate::from_ymd_opt(2024, 1, 3).unwrap();
        // Monday to Wednesday missing, first bar is the Thursday after expiry
        let history = flat_history(expiry + Duration::days(1), 2, 48_000.0);

        let mut engine = engine(0.10);
        let report = engine.run(&UnderlyingSpec::banknifty(), &history, expiry, expiry);

        assert_eq!(report.cycles_attempted, 1);
        assert_eq!(report.no_entry_cycles, 1);
        assert!(report.skipped.is_empty());
        assert_eq!(report.final_capital, report.initial_capital);
    }

    #[test]
    fn test_skipped_cycles_leave_capital_unchanged() {
        let start = NaiveDate::from_ymd_opt(2024, 1, 1).unwrap();
        let history = flat_history(start, 14, 22_000.0);

        let config = BacktestConfig {
            otm_pct: 0.10,
            min_entry_premium: 1_000.0,
            ..BacktestConfig::default()
        };
        let mut engine = BacktestEngine::new(config, PremiumEstimator::default(), ExitRules::default());
        let report = engine.run(&UnderlyingSpec::nifty(), &history, start, start + Duration::days(13));

        assert_eq!(report.skipped.len(), 2);
        assert!(report.trades.is_empty());
        assert!(report.equity_curve.is_empty());
        assert_eq!(report.final_capital, dec!(100000));
        assert_eq!(report.total_return_pct, 0.0);
    }
}
