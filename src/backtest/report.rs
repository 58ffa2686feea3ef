//! Result of a completed backtest.

use chrono::NaiveDate;
use rust_decimal::Decimal;
use serde::{Deserialize, Serialize};

use super::cycle::SkippedCycle;
use super::engine::EquityPoint;
use super::trade::StrangleTrade;
use crate::metrics::{DrawdownAnalysis, TradeSummary};

/// Trades listed at the end of the console summary.
pub const SUMMARY_RECENT_TRADES: usize = 5;

/// Aggregated backtest output, derived from the trade list and equity curve.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct BacktestReport {
    /// Underlying tested.
    pub symbol: String,

    pub start_date: NaiveDate,

    pub end_date: NaiveDate,

    pub initial_capital: Decimal,

    pub final_capital: Decimal,

    /// Total return percentage.
    pub total_return_pct: f64,

    /// Deepest drawdown of the equity curve (non-positive).
    pub max_drawdown_pct: f64,

    /// Statistics over traded cycles.
    pub summary: TradeSummary,

    /// Every weekly expiry in the period.
    pub cycles_attempted: usize,

    /// Expiries whose entry window had no market data.
    pub no_entry_cycles: usize,

    /// Traded cycles in chronological order.
    pub trades: Vec<StrangleTrade>,

    /// Cycles rejected by the minimum premium filter.
    pub skipped: Vec<SkippedCycle>,

    pub equity_curve: Vec<EquityPoint>,

    pub drawdown: DrawdownAnalysis,
}

impl BacktestReport {
    pub fn has_trades(&self) -> bool {
        !self.trades.is_empty()
    }

    pub fn skipped_cycles(&self) -> usize {
        self.skipped.len()
    }

    pub fn total_pnl(&self) -> Decimal {
        self.summary.total_pnl
    }

    /// The last `n` trades, oldest first.
    pub fn recent_trades(&self, n: usize) -> &[StrangleTrade] {
        let start = self.trades.len().saturating_sub(n);
        &self.trades[start..]
    }

    /// Generate summary string.
    pub fn summary(&self) -> String {
        let s = &self.summary;
        let mut text = format!(
            "Backtest Results: {} ({} to {})\n\
             ----------------------------------------\n\
             Cycles: {} (traded: {}, skipped: {}, no entry: {})\n\
             Total Trades: {}\n\
             Winners: {}\n\
             Losers: {}\n\
             Win Rate: {:.2}%\n\
             Total P&L: ₹{:+.0}\n\
             Avg Win: ₹{:.0}\n\
             Avg Loss: ₹{:.0}\n\
             Max Win: ₹{:.0}\n\
             Max Loss: ₹{:.0}\n\
             Initial Capital: ₹{:.0}\n\
             Final Capital: ₹{:.0}\n\
             Total Return: {:+.2}%\n\
             Max Drawdown: {:.2}%",
            self.symbol,
            self.start_date,
            self.end_date,
            self.cycles_attempted,
            self.trades.len(),
            self.skipped_cycles(),
            self.no_entry_cycles,
            s.total_trades,
            s.winning_trades,
            s.losing_trades,
            s.win_rate,
            s.total_pnl,
            s.avg_win,
            s.avg_loss,
            s.max_win,
            s.max_loss,
            self.initial_capital,
            self.final_capital,
            self.total_return_pct,
            self.max_drawdown_pct,
        );

        let recent = self.recent_trades(SUMMARY_RECENT_TRADES);
        if !recent.is_empty() {
            text.push_str(&format!("\n\nLast {} Trades:", recent.len()));
            for trade in recent {
                text.push_str(&format!(
                    "\n  {} -> {}: ₹{:+.0} ({})",
                    trade.entry_date, trade.exit_date, trade.total_pnl, trade.exit_reason
                ));
            }
        }

        text
    }
}
