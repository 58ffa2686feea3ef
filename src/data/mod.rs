pub mod feed;
pub mod history;
pub mod loader;
pub mod types;

use chrono::NaiveDate;
use thiserror::Error;

pub use feed::{HistoricalFeed, MarketData};
pub use history::{PriceHistory, DEFAULT_VOLATILITY_WINDOW, FALLBACK_VOLATILITY, TRADING_DAYS_PER_YEAR};
pub use loader::{HistoryLoader, LoaderError};
pub use types::{to_f64, to_money, DailyBar, OptionType, UnderlyingSpec};

/// Market data lookups that callers skip rather than treat as fatal.
#[derive(Error, Debug, Clone, PartialEq)]
pub enum DataError {
    #[error("No market data for {symbol} on {date}")]
    Unavailable { symbol: String, date: NaiveDate },

    #[error("Unknown symbol: {0}")]
    UnknownSymbol(String),
}
