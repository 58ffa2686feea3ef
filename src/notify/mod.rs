//! Trade notifications.

pub mod event;
pub mod sink;

pub use event::TradeEvent;
pub use sink::{dispatch, LogNotifier, MemoryNotifier, Notifier, NotifyError, NullNotifier};
