//! Daily price history with rolling historical volatility.
//!
//! Volatility at a date is the sample standard deviation of the trailing
//! `window` daily returns, annualized with 252 trading days. Dates without a
//! full window fall back to a fixed default.

use std::collections::BTreeMap;

use chrono::NaiveDate;

use super::types::DailyBar;
use super::DataError;

/// Rolling window (trading days) for historical volatility.
pub const DEFAULT_VOLATILITY_WINDOW: usize = 20;

/// Volatility assumed before the rolling window has filled.
pub const FALLBACK_VOLATILITY: f64 = 0.30;

/// Trading days per year used to annualize daily volatility.
pub const TRADING_DAYS_PER_YEAR: f64 = 252.0;

/// Close-price history for a single symbol, keyed by date.
#[derive(Debug, Clone, Default)]
pub struct PriceHistory {
    symbol: String,
    bars: BTreeMap<NaiveDate, DailyBar>,
}

impl PriceHistory {
    /// Build a history from pre-computed bars.
    pub fn from_bars(symbol: &str, bars: impl IntoIterator<Item = DailyBar>) -> Self {
        Self {
            symbol: symbol.to_string(),
            bars: bars.into_iter().map(|b| (b.date, b)).collect(),
        }
    }

    /// Build a history from raw closes, computing rolling volatility.
    pub fn from_closes(
        symbol: &str,
        closes: &[(NaiveDate, f64)],
        window: usize,
        fallback_volatility: f64,
    ) -> Self {
        let mut sorted = closes.to_vec();
        sorted.sort_by_key(|(date, _)| *date);
        sorted.dedup_by_key(|(date, _)| *date);

        let prices: Vec<f64> = sorted.iter().map(|(_, close)| *close).collect();
        let vols = rolling_volatility(&prices, window, fallback_volatility);

        let bars = sorted
            .iter()
            .zip(vols)
            .map(|(&(date, close), volatility)| DailyBar {
                date,
                close,
                volatility,
            });

        Self::from_bars(symbol, bars)
    }

    pub fn symbol(&self) -> &str {
        &self.symbol
    }

    pub fn len(&self) -> usize {
        self.bars.len()
    }

    pub fn is_empty(&self) -> bool {
        self.bars.is_empty()
    }

    /// Whether the market traded (and we have a close) on `date`.
    pub fn has_data(&self, date: NaiveDate) -> bool {
        self.bars.contains_key(&date)
    }

    pub fn bar(&self, date: NaiveDate) -> Option<&DailyBar> {
        self.bars.get(&date)
    }

    pub fn close(&self, date: NaiveDate) -> Result<f64, DataError> {
        self.bar(date)
            .map(|b| b.close)
            .ok_or_else(|| self.unavailable(date))
    }

    pub fn volatility(&self, date: NaiveDate) -> Result<f64, DataError> {
        self.bar(date)
            .map(|b| b.volatility)
            .ok_or_else(|| self.unavailable(date))
    }

    /// Most recent bar on or before `date`.
    pub fn latest_on_or_before(&self, date: NaiveDate) -> Option<&DailyBar> {
        self.bars.range(..=date).next_back().map(|(_, b)| b)
    }

    pub fn first_date(&self) -> Option<NaiveDate> {
        self.bars.keys().next().copied()
    }

    pub fn last_date(&self) -> Option<NaiveDate> {
        self.bars.keys().next_back().copied()
    }

    /// Bars in `[start, end]`, ascending.
    pub fn bars_between(&self, start: NaiveDate, end: NaiveDate) -> impl Iterator<Item = &DailyBar> {
        self.bars.range(start..=end).map(|(_, b)| b)
    }

    fn unavailable(&self, date: NaiveDate) -> DataError {
        DataError::Unavailable {
            symbol: self.symbol.clone(),
            date,
        }
    }
}

/// Annualized rolling standard deviation of simple returns.
///
/// Index `i` uses returns `i-window+1..=i`, so the first `window` prices
/// have no estimate and take `fallback`.
fn rolling_volatility(prices: &[f64], window: usize, fallback: f64) -> Vec<f64> {
    if window < 2 {
        return vec![fallback; prices.len()];
    }

    let returns: Vec<f64> = prices
        .windows(2)
        .map(|w| if w[0] != 0.0 { w[1] / w[0] - 1.0 } else { f64::NAN })
        .collect();

    (0..prices.len())
        .map(|i| {
            if i < window {
                return fallback;
            }
            // returns[k] is the return ending at price k + 1
            let slice = &returns[i - window..i];
            let n = slice.len() as f64;
            let mean = slice.iter().sum::<f64>() / n;
            let variance = slice.iter().map(|r| (r - mean).powi(2)).sum::<f64>() / (n - 1.0);
            let vol = variance.sqrt() * TRADING_DAYS_PER_YEAR.sqrt();
            if vol.is_finite() {
                vol
            } else {
                fallback
            }
        })
        .collect()
}

#[cfg(test)]
mod tests {
    use super::*;
    use approx::assert_relative_eq;

    fn day(n: u32) -> NaiveDate {
        NaiveDate::from_ymd_opt(2024, 1, 1).unwrap() + chrono::Duration::days(n as i64)
    }

    #[test]
    fn test_lookup_and_missing_dates() {
        let history = PriceHistory::from_closes(
            "NIFTY",
            &[(day(0), 100.0), (day(1), 101.0), (day(3), 102.0)],
            DEFAULT_VOLATILITY_WINDOW,
            FALLBACK_VOLATILITY,
        );

        assert_eq!(history.len(), 3);
        assert!(history.has_data(day(1)));
        assert!(!history.has_data(day(2)));
        assert_eq!(history.close(day(3)).unwrap(), 102.0);
        assert_eq!(
            history.close(day(2)),
            Err(DataError::Unavailable {
                symbol: "NIFTY".to_string(),
                date: day(2)
            })
        );
        assert_eq!(history.latest_on_or_before(day(2)).unwrap().date, day(1));
    }

    #[test]
    fn test_fallback_before_window_fills() {
        let closes: Vec<_> = (0..5).map(|i| (day(i), 100.0 + i as f64)).collect();
        let history = PriceHistory::from_closes("NIFTY", &closes, 20, 0.30);
        for i in 0..5 {
            assert_eq!(history.volatility(day(i)).unwrap(), 0.30);
        }
    }

    #[test]
    fn test_constant_returns_have_zero_volatility() {
        // Geometric growth: every return is identical.
        let closes: Vec<_> = (0..10)
            .map(|i| (day(i), 100.0 * 1.01_f64.powi(i as i32)))
            .collect();
        let history = PriceHistory::from_closes("NIFTY", &closes, 3, 0.30);

        assert_eq!(history.volatility(day(2)).unwrap(), 0.30);
        assert_relative_eq!(history.volatility(day(3)).unwrap(), 0.0, epsilon = 1e-9);
        assert_relative_eq!(history.volatility(day(9)).unwrap(), 0.0, epsilon = 1e-9);
    }

    #[test]
    fn test_rolling_volatility_matches_sample_std() {
        let prices = [100.0, 102.0, 99.0, 101.0];
        let vols = rolling_volatility(&prices, 3, 0.30);

        let returns = [0.02, 99.0 / 102.0 - 1.0, 101.0 / 99.0 - 1.0];
        let mean = returns.iter().sum::<f64>() / 3.0;
        let var = returns.iter().map(|r| (r - mean).powi(2)).sum::<f64>() / 2.0;

        assert_eq!(vols[..3], [0.30, 0.30, 0.30]);
        assert_relative_eq!(vols[3], var.sqrt() * 252.0_f64.sqrt(), epsilon = 1e-12);
    }
}
