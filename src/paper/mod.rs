//! Paper trading: strategy signals executed against a trade ledger
//! without real orders.

pub mod runner;
pub mod trader;

pub use runner::{replay, run_loop, run_scan_cycle, PaperConfig};
pub use trader::{ClosedPosition, PaperTrader, ScanSummary, SignalOutcome};
