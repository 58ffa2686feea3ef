//! Trade ledger: persistence of trades keyed by id.
//!
//! The ledger is opened once and owned for the life of the process. Only one
//! writer is assumed, so no locking is done. The persistent implementation
//! lives in [`super::sqlite`].

use std::collections::BTreeMap;

use chrono::{NaiveDate, NaiveDateTime};
use thiserror::Error;

use super::trade::{Trade, TradeId, TradeParams, TradeStatus};

#[derive(Error, Debug)]
pub enum LedgerError {
    #[error("IO error: {0}")]
    Io(#[from] std::io::Error),

    #[error("SQLite error: {0}")]
    Sqlite(#[from] rusqlite::Error),

    #[error("Corrupt ledger row {id}: {message}")]
    Corrupt { id: TradeId, message: String },

    #[error("Trade not found: {0}")]
    NotFound(TradeId),
}

/// Query filter over trades. Unset fields match everything.
#[derive(Debug, Clone, Default, PartialEq)]
pub struct TradeFilter {
    pub status: Option<TradeStatus>,
    pub symbol: Option<String>,
    /// Earliest entry date (inclusive).
    pub from: Option<NaiveDate>,
    /// Latest entry date (inclusive).
    pub to: Option<NaiveDate>,
}

impl TradeFilter {
    pub fn all() -> Self {
        Self::default()
    }

    pub fn open() -> Self {
        Self::default().with_status(TradeStatus::Open)
    }

    pub fn closed() -> Self {
        Self::default().with_status(TradeStatus::Closed)
    }

    pub fn with_status(mut self, status: TradeStatus) -> Self {
        self.status = Some(status);
        self
    }

    pub fn with_symbol(mut self, symbol: &str) -> Self {
        self.symbol = Some(symbol.to_string());
        self
    }

    pub fn between(mut self, from: NaiveDate, to: NaiveDate) -> Self {
        self.from = Some(from);
        self.to = Some(to);
        self
    }

    pub fn matches(&self, trade: &Trade) -> bool {
        let entry_date = trade.entry_time.date();
        self.status.map_or(true, |s| trade.status == s)
            && self.symbol.as_deref().map_or(true, |s| trade.symbol == s)
            && self.from.map_or(true, |d| entry_date >= d)
            && self.to.map_or(true, |d| entry_date <= d)
    }
}

/// Storage for trades.
pub trait TradeLedger {
    /// Insert a new OPEN trade, assigning its id.
    fn insert(&mut self, params: TradeParams, entry_time: NaiveDateTime) -> Result<Trade, LedgerError>;

    fn get(&self, id: TradeId) -> Result<Option<Trade>, LedgerError>;

    /// Replace a stored trade. Fails with `NotFound` for unknown ids.
    fn update(&mut self, trade: &Trade) -> Result<(), LedgerError>;

    /// Trades matching `filter`, ordered by id.
    fn query(&self, filter: &TradeFilter) -> Result<Vec<Trade>, LedgerError>;
}

/// Ledger held in memory only.
#[derive(Debug, Clone, Default)]
pub struct InMemoryLedger {
    trades: BTreeMap<TradeId, Trade>,
    next_id: TradeId,
}

impl InMemoryLedger {
    pub fn new() -> Self {
        Self {
            trades: BTreeMap::new(),
            next_id: 1,
        }
    }

    pub fn len(&self) -> usize {
        self.trades.len()
    }

    pub fn is_empty(&self) -> bool {
        self.trades.is_empty()
    }
}

impl TradeLedger for InMemoryLedger {
    fn insert(&mut self, params: TradeParams, entry_time: NaiveDateTime) -> Result<Trade, LedgerError> {
        // Default-constructed ledgers start at zero
        let id = self.next_id.max(1);
        self.next_id = id + 1;

        let trade = Trade::open(id, params, entry_time);
        self.trades.insert(id, trade.clone());
        Ok(trade)
    }

    fn get(&self, id: TradeId) -> Result<Option<Trade>, LedgerError> {
        Ok(self.trades.get(&id).cloned())
    }

    fn update(&mut self, trade: &Trade) -> Result<(), LedgerError> {
        match self.trades.get_mut(&trade.id) {
            Some(stored) => {
                *stored = trade.clone();
                Ok(())
            }
            None => Err(LedgerError::NotFound(trade.id)),
        }
    }

    fn query(&self, filter: &TradeFilter) -> Result<Vec<Trade>, LedgerError> {
        Ok(self
            .trades
            .values()
            .filter(|t| filter.matches(t))
            .cloned()
            .collect())
    }
}

impl<L: TradeLedger + ?Sized> TradeLedger for Box<L> {
    fn insert(&mut self, params: TradeParams, entry_time: NaiveDateTime) -> Result<Trade, LedgerError> {
        (**self).insert(params, entry_time)
    }

    fn get(&self, id: TradeId) -> Result<Option<Trade>, LedgerError> {
        (**self).get(id)
    }

    fn update(&mut self, trade: &Trade) -> Result<(), LedgerError> {
        (**self).update(trade)
    }

    fn query(&self, filter: &TradeFilter) -> Result<Vec<Trade>, LedgerError> {
        (**self).query(filter)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::data::OptionType;
    use crate::position::trade::ExitReason;
    use rust_decimal_macros::dec;

    fn ts(day: u32) -> NaiveDateTime {
        NaiveDate::from_ymd_opt(2024, 1, day)
            .unwrap()
            .and_hms_opt(10, 0, 0)
            .unwrap()
    }

    fn params(symbol: &str, option_type: OptionType) -> TradeParams {
        TradeParams {
            symbol: symbol.to_string(),
            option_type,
            strike: dec!(20000),
            entry_premium: dec!(55),
            lot_size: 50,
            strategy: "test".to_string(),
            expiry: NaiveDate::from_ymd_opt(2024, 1, 11).unwrap(),
        }
    }

    #[test]
    fn test_insert_assigns_unique_ids() {
        let mut ledger = InMemoryLedger::new();
        let a = ledger.insert(params("NIFTY", OptionType::Put), ts(8)).unwrap();
        let b = ledger.insert(params("NIFTY", OptionType::Call), ts(8)).unwrap();
        assert_ne!(a.id, b.id);
        assert_eq!(ledger.get(a.id).unwrap(), Some(a));
    }

    #[test]
    fn test_default_ledger_ids_start_at_one() {
        let mut ledger = InMemoryLedger::default();
        let trade = ledger.insert(params("NIFTY", OptionType::Put), ts(8)).unwrap();
        assert_eq!(trade.id, 1);
    }

    #[test]
    fn test_update_unknown_is_not_found() {
        let mut ledger = InMemoryLedger::new();
        let trade = Trade::open(42, params("NIFTY", OptionType::Put), ts(8));
        assert!(matches!(ledger.update(&trade), Err(LedgerError::NotFound(42))));
    }

    #[test]
    fn test_query_filters() {
        let mut ledger = InMemoryLedger::new();
        let mut first = ledger.insert(params("NIFTY", OptionType::Put), ts(1)).unwrap();
        ledger.insert(params("BANKNIFTY", OptionType::Put), ts(8)).unwrap();
        ledger.insert(params("NIFTY", OptionType::Call), ts(15)).unwrap();

        first.close(dec!(20), ExitReason::TargetHit, ts(2));
        ledger.update(&first).unwrap();

        assert_eq!(ledger.query(&TradeFilter::all()).unwrap().len(), 3);
        assert_eq!(ledger.query(&TradeFilter::open()).unwrap().len(), 2);
        assert_eq!(ledger.query(&TradeFilter::closed()).unwrap().len(), 1);
        assert_eq!(
            ledger.query(&TradeFilter::all().with_symbol("NIFTY")).unwrap().len(),
            2
        );

        let window = TradeFilter::all().between(
            NaiveDate::from_ymd_opt(2024, 1, 5).unwrap(),
            NaiveDate::from_ymd_opt(2024, 1, 15).unwrap(),
        );
        let in_window = ledger.query(&window).unwrap();
        assert_eq!(in_window.len(), 2);
        assert!(in_window.iter().all(|t| t.entry_time >= ts(8)));
    }
}
