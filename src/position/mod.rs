pub mod ledger;
pub mod lifecycle;
pub mod sqlite;
pub mod trade;

pub use ledger::{InMemoryLedger, LedgerError, TradeFilter, TradeLedger};
pub use sqlite::SqliteLedger;
pub use lifecycle::PositionManager;
pub use trade::{ExitReason, Trade, TradeId, TradeParams, TradeStatus};
