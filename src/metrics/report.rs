//! Performance report over live or paper trades.

use chrono::{Days, NaiveDate};
use serde::{Deserialize, Serialize};

use super::calculator::{DailyPnl, MetricsCalculator, SymbolBreakdown, TradeSummary};
use crate::position::Trade;

/// Trades shown in the recent-trades section.
pub const RECENT_TRADES: usize = 5;
/// Calendar days, counted back from the report date, in the daily P&L section.
pub const RECENT_DAYS: u64 = 7;

/// Snapshot of ledger performance.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct PerformanceReport {
    pub overall: TradeSummary,
    pub open_positions: usize,
    /// Most recently entered trades, newest first.
    pub recent: Vec<Trade>,
    pub daily: Vec<DailyPnl>,
    pub by_symbol: Vec<SymbolBreakdown>,
}

impl PerformanceReport {
    /// Build a report from every trade in the ledger as of `as_of`.
    pub fn from_trades(trades: &[Trade], as_of: NaiveDate) -> Self {
        let closed: Vec<Trade> = trades.iter().filter(|t| !t.is_open()).cloned().collect();

        let mut recent: Vec<Trade> = trades.to_vec();
        recent.sort_by(|a, b| b.entry_time.cmp(&a.entry_time).then(b.id.cmp(&a.id)));
        recent.truncate(RECENT_TRADES);

        let window_start = as_of.checked_sub_days(Days::new(RECENT_DAYS)).unwrap_or(NaiveDate::MIN);
        let mut daily = MetricsCalculator::daily_pnl(&closed);
        daily.retain(|day| day.date >= window_start);

        Self {
            overall: MetricsCalculator::aggregate(&closed),
            open_positions: trades.iter().filter(|t| t.is_open()).count(),
            recent,
            daily,
            by_symbol: MetricsCalculator::symbol_breakdown(&closed),
        }
    }

    /// Console summary.
    pub fn summary(&self) -> String {
        format!(
            "Performance Summary\n\
             ====================\n\
             {}\n\
             Open Positions: {}",
            self.overall.summary(),
            self.open_positions,
        )
    }

    /// Markdown report for messaging.
    pub fn render(&self) -> String {
        let overall = &self.overall;
        let mut lines = vec![
            "*F&O PERFORMANCE REPORT*".to_string(),
            String::new(),
            "*Overall Performance:*".to_string(),
            format!("Total Trades: {}", overall.total_trades),
            format!("Win Rate: {:.1}%", overall.win_rate),
            format!("Total P&L: ₹{:+.0}", overall.total_pnl),
            format!("Avg P&L: ₹{:+.0}", overall.avg_pnl),
            format!("Max Win: ₹{:.0}", overall.max_win),
            format!("Max Loss: ₹{:.0}", overall.max_loss),
            format!("Open Positions: {}", self.open_positions),
        ];

        if !self.recent.is_empty() {
            lines.push(String::new());
            lines.push(format!("*Last {} Trades:*", self.recent.len()));
            for trade in &self.recent {
                match (trade.pnl, trade.exit_reason) {
                    (Some(pnl), Some(reason)) => lines.push(format!(
                        "{} {} {}: ₹{:+.0} ({})",
                        trade.symbol, trade.strike, trade.option_type, pnl, reason
                    )),
                    _ => lines.push(format!(
                        "{} {} {}: OPEN @ ₹{:.0}",
                        trade.symbol, trade.strike, trade.option_type, trade.entry_premium
                    )),
                }
            }
        }

        if !self.daily.is_empty() {
            lines.push(String::new());
            lines.push(format!("*Last {} Days P&L:*", RECENT_DAYS));
            for day in &self.daily {
                lines.push(format!(
                    "{}: ₹{:+.0} ({}W/{}L)",
                    day.date, day.pnl, day.wins, day.losses
                ));
            }
        }

        if !self.by_symbol.is_empty() {
            lines.push(String::new());
            lines.push("*By Symbol:*".to_string());
            for row in &self.by_symbol {
                lines.push(format!(
                    "{}: ₹{:+.0} ({:.0}% WR, {} trades)",
                    row.symbol, row.total_pnl, row.win_rate, row.trades
                ));
            }
        }

        lines.join("\n")
    }
}
