//! Backtesting engine for weekly short strangles.
//!
//! This module replays the weekly option-selling cycle over daily history:
//! - Entry on the first trading day of the expiry week
//! - Day-by-day exit evaluation with fixed trigger priority
//! - Settlement at intrinsic value on expiry
//! - Capital carried across cycles and summarized in a report

pub mod cycle;
pub mod engine;
pub mod export;
pub mod report;
pub mod trade;

pub use cycle::{CycleOutcome, CycleRules, CycleSimulator, SkippedCycle};
pub use engine::{BacktestConfig, BacktestEngine, EquityPoint};
pub use export::{export_equity_csv, export_json, export_trades_csv, import_json, save_artifacts};
pub use report::BacktestReport;
pub use trade::{LegResult, StrangleTrade};
