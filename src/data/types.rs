//! Core data types shared by pricing, backtesting and paper trading.
//!
//! Prices flowing through the pricing model are `f64`; anything that ends
//! up on a ledger or in a capital account is converted to `Decimal`.

use std::fmt;

use chrono::{NaiveDate, Weekday};
use rust_decimal::Decimal;
use serde::{Deserialize, Serialize};

/// Option type (call or put).
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub enum OptionType {
    #[serde(rename = "CE", alias = "CALL")]
    Call,
    #[serde(rename = "PE", alias = "PUT")]
    Put,
}

impl OptionType {
    pub fn from_str(s: &str) -> Option<Self> {
        match s.to_uppercase().as_str() {
            "C" | "CE" | "CALL" => Some(Self::Call),
            "P" | "PE" | "PUT" => Some(Self::Put),
            _ => None,
        }
    }

    pub fn as_str(&self) -> &'static str {
        match self {
            Self::Call => "CE",
            Self::Put => "PE",
        }
    }

    /// Value of the option at expiry.
    pub fn intrinsic(&self, spot: f64, strike: f64) -> f64 {
        match self {
            Self::Call => (spot - strike).max(0.0),
            Self::Put => (strike - spot).max(0.0),
        }
    }
}

impl fmt::Display for OptionType {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

/// Contract specification for an index with weekly options.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct UnderlyingSpec {
    /// Trading symbol (e.g., "NIFTY").
    pub symbol: String,
    /// Symbol used by the historical price source (e.g., "^NSEI").
    pub data_symbol: String,
    /// Contract multiplier.
    pub lot_size: u32,
    /// Distance between listed strikes.
    pub strike_step: f64,
    /// Weekday on which weekly contracts expire.
    pub expiry_weekday: Weekday,
}

impl UnderlyingSpec {
    /// NIFTY 50: Thursday expiry, 50-point strikes.
    pub fn nifty() -> Self {
        Self {
            symbol: "NIFTY".to_string(),
            data_symbol: "^NSEI".to_string(),
            lot_size: 50,
            strike_step: 50.0,
            expiry_weekday: Weekday::Thu,
        }
    }

    /// Bank Nifty: Wednesday expiry, 100-point strikes.
    pub fn banknifty() -> Self {
        Self {
            symbol: "BANKNIFTY".to_string(),
            data_symbol: "^NSEBANK".to_string(),
            lot_size: 15,
            strike_step: 100.0,
            expiry_weekday: Weekday::Wed,
        }
    }

    /// Round a raw price to the nearest listed strike.
    ///
    /// Exact halves go to the even multiple of the step.
    pub fn round_to_strike(&self, price: f64) -> f64 {
        (price / self.strike_step).round_ties_even() * self.strike_step
    }

    /// Strike `otm_pct` away from spot on the out-of-the-money side.
    pub fn otm_strike(&self, spot: f64, otm_pct: f64, option_type: OptionType) -> f64 {
        let target = match option_type {
            OptionType::Call => spot * (1.0 + otm_pct),
            OptionType::Put => spot * (1.0 - otm_pct),
        };
        self.round_to_strike(target)
    }

    /// Exchange-style contract name, e.g. `NIFTY2024010419800PE`.
    pub fn trading_symbol(&self, expiry: NaiveDate, strike: f64, option_type: OptionType) -> String {
        format!(
            "{}{}{}{}",
            self.symbol,
            expiry.format("%Y%m%d"),
            strike.round() as i64,
            option_type.as_str()
        )
    }
}

/// Daily close with the rolling historical volatility at that date.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct DailyBar {
    pub date: NaiveDate,
    pub close: f64,
    /// Annualized volatility of daily returns.
    pub volatility: f64,
}

/// Convert a model price to a ledger amount (2 decimal places).
pub fn to_money(value: f64) -> Decimal {
    Decimal::try_from(value)
        .map(|d| d.round_dp(2))
        .unwrap_or(Decimal::ZERO)
}

/// Convert a ledger amount back into model space.
pub fn to_f64(value: Decimal) -> f64 {
    value.try_into().unwrap_or(0.0)
}
