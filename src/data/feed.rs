//! Market data access for live and paper operation.
//!
//! `MarketData` is the seam to whatever supplies prices. `HistoricalFeed`
//! serves it from loaded daily histories: spot is the last close on or
//! before the as-of date and option prices are model estimates.

use std::collections::HashMap;

use chrono::{NaiveDate, NaiveDateTime};

use super::history::PriceHistory;
use super::types::OptionType;
use super::DataError;
use crate::pricing::PremiumEstimator;

/// Source of underlying and option prices.
pub trait MarketData {
    /// Daily close of `symbol` on `date`.
    fn close(&self, symbol: &str, date: NaiveDate) -> Result<f64, DataError>;

    /// Annualized historical volatility of `symbol` at `date`.
    fn historical_volatility(&self, symbol: &str, date: NaiveDate) -> Result<f64, DataError>;

    /// Current spot price.
    fn spot_price(&self, symbol: &str) -> Result<f64, DataError>;

    /// Last traded price of an option, if one is available.
    fn option_last_price(
        &self,
        symbol: &str,
        strike: f64,
        option_type: OptionType,
        expiry: NaiveDate,
    ) -> Option<f64>;

    /// Called before every scan so snapshot feeds can advance.
    fn refresh(&mut self, _now: NaiveDateTime) {}
}

/// Market data replayed from daily histories.
pub struct HistoricalFeed {
    histories: HashMap<String, PriceHistory>,
    estimator: PremiumEstimator,
    as_of: NaiveDate,
}

impl HistoricalFeed {
    pub fn new(estimator: PremiumEstimator, as_of: NaiveDate) -> Self {
        Self {
            histories: HashMap::new(),
            estimator,
            as_of,
        }
    }

    /// Register a history under a trading symbol (e.g. "NIFTY").
    pub fn with_history(mut self, symbol: &str, history: PriceHistory) -> Self {
        self.insert(symbol, history);
        self
    }

    pub fn insert(&mut self, symbol: &str, history: PriceHistory) {
        self.histories.insert(symbol.to_string(), history);
    }

    pub fn as_of(&self) -> NaiveDate {
        self.as_of
    }

    pub fn set_as_of(&mut self, date: NaiveDate) {
        self.as_of = date;
    }

    pub fn history(&self, symbol: &str) -> Result<&PriceHistory, DataError> {
        self.histories
            .get(symbol)
            .ok_or_else(|| DataError::UnknownSymbol(symbol.to_string()))
    }

    /// Trading dates in `[start, end]` across every loaded history.
    pub fn trading_dates(&self, start: NaiveDate, end: NaiveDate) -> Vec<NaiveDate> {
        let mut dates: Vec<NaiveDate> = self
            .histories
            .values()
            .flat_map(|h| h.bars_between(start, end).map(|b| b.date))
            .collect();
        dates.sort();
        dates.dedup();
        dates
    }
}

impl MarketData for HistoricalFeed {
    fn close(&self, symbol: &str, date: NaiveDate) -> Result<f64, DataError> {
        self.history(symbol)?.close(date)
    }

    fn historical_volatility(&self, symbol: &str, date: NaiveDate) -> Result<f64, DataError> {
        self.history(symbol)?.volatility(date)
    }

    fn spot_price(&self, symbol: &str) -> Result<f64, DataError> {
        self.history(symbol)?
            .latest_on_or_before(self.as_of)
            .map(|b| b.close)
            .ok_or(DataError::Unavailable {
                symbol: symbol.to_string(),
                date: self.as_of,
            })
    }

    fn option_last_price(
        &self,
        symbol: &str,
        strike: f64,
        option_type: OptionType,
        expiry: NaiveDate,
    ) -> Option<f64> {
        let bar = self.history(symbol).ok()?.latest_on_or_before(self.as_of)?;
        let days = (expiry - self.as_of).num_days();
        Some(
            self.estimator
                .premium(bar.close, strike, days, bar.volatility, option_type),
        )
    }

    fn refresh(&mut self, now: NaiveDateTime) {
        self.as_of = now.date();
    }
}
