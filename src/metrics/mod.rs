//! Performance metrics module.
//!
//! Provides:
//! - Win rate, average and extreme P&L
//! - Drawdown against the running equity peak
//! - Per-symbol and per-day breakdowns
//! - The performance report for live and paper trading

pub mod calculator;
pub mod report;

pub use calculator::{
    ClosedTrade, DailyPnl, DrawdownAnalysis, DrawdownPoint, MetricsCalculator, SymbolBreakdown,
    TradeSummary,
};
pub use report::PerformanceReport;
