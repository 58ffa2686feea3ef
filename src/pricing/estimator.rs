//! Premium estimation with input sanitation and a heuristic fallback.
//!
//! The estimator never fails: bad volatility inputs are replaced with a
//! default, degenerate formula output is replaced with a rule-of-thumb
//! premium, and the result is floored at one currency unit.

use serde::{Deserialize, Serialize};

use super::black_scholes::BlackScholes;
use super::PricingConfig;
use crate::data::OptionType;

/// Which path produced an estimate.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub enum PremiumSource {
    /// Expired: intrinsic value.
    Intrinsic,
    /// Black-Scholes premium.
    Formula,
    /// Rule-of-thumb fallback after the formula degenerated.
    Heuristic,
}

#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct PremiumEstimate {
    pub premium: f64,
    pub source: PremiumSource,
    /// Volatility actually used after sanitation.
    pub volatility: f64,
}

/// Non-failing premium estimator.
#[derive(Debug, Clone)]
pub struct PremiumEstimator {
    model: BlackScholes,
    default_volatility: f64,
    min_premium: f64,
}

impl Default for PremiumEstimator {
    fn default() -> Self {
        Self::new(&PricingConfig::default())
    }
}

impl PremiumEstimator {
    pub fn new(config: &PricingConfig) -> Self {
        Self {
            model: BlackScholes::new(config.risk_free_rate),
            default_volatility: config.default_volatility,
            min_premium: config.min_premium,
        }
    }

    pub fn model(&self) -> &BlackScholes {
        &self.model
    }

    /// Estimate a premium `days_to_expiry` calendar days before expiry.
    pub fn estimate(
        &self,
        spot: f64,
        strike: f64,
        days_to_expiry: i64,
        volatility: f64,
        option_type: OptionType,
    ) -> PremiumEstimate {
        if days_to_expiry <= 0 {
            return PremiumEstimate {
                premium: option_type.intrinsic(spot, strike),
                source: PremiumSource::Intrinsic,
                volatility,
            };
        }

        let volatility = if volatility.is_nan() || volatility <= 0.0 {
            self.default_volatility
        } else {
            volatility
        };

        let time = days_to_expiry as f64 / 365.0;
        let formula = self
            .model
            .greeks(spot, strike, time, volatility, option_type)
            .premium;

        let (raw, source) = if formula.is_finite() && formula > 0.0 {
            (formula, PremiumSource::Formula)
        } else {
            (
                Self::heuristic_premium(spot, strike, time),
                PremiumSource::Heuristic,
            )
        };

        let premium = if raw.is_finite() {
            raw.max(self.min_premium)
        } else {
            self.min_premium
        };

        PremiumEstimate {
            premium,
            source,
            volatility,
        }
    }

    /// Premium only.
    pub fn premium(
        &self,
        spot: f64,
        strike: f64,
        days_to_expiry: i64,
        volatility: f64,
        option_type: OptionType,
    ) -> f64 {
        self.estimate(spot, strike, days_to_expiry, volatility, option_type)
            .premium
    }

    /// 1% of spot per unit root-time, scaled up with distance from the money.
    fn heuristic_premium(spot: f64, strike: f64, time: f64) -> f64 {
        let moneyness = (spot - strike).abs() / spot;
        spot * 0.01 * time.sqrt() * (1.0 + 2.0 * moneyness)
    }
}
