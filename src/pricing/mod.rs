pub mod black_scholes;
pub mod estimator;

use serde::{Deserialize, Serialize};

pub use black_scholes::{BlackScholes, GreeksResult, IvEstimate, DEFAULT_RISK_FREE_RATE};
pub use estimator::{PremiumEstimate, PremiumEstimator, PremiumSource};

use crate::data::{DEFAULT_VOLATILITY_WINDOW, FALLBACK_VOLATILITY};

/// Pricing model parameters.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct PricingConfig {
    /// Annual risk-free rate.
    pub risk_free_rate: f64,
    /// Volatility substituted for missing or non-positive inputs.
    pub default_volatility: f64,
    /// Smallest premium the estimator returns before expiry.
    pub min_premium: f64,
    /// Trading days in the rolling historical volatility window.
    pub volatility_window: usize,
    /// Historical volatility used before the window fills.
    pub fallback_volatility: f64,
}

impl Default for PricingConfig {
    fn default() -> Self {
        Self {
            risk_free_rate: DEFAULT_RISK_FREE_RATE,
            default_volatility: 0.20,
            min_premium: 1.0,
            volatility_window: DEFAULT_VOLATILITY_WINDOW,
            fallback_volatility: FALLBACK_VOLATILITY,
        }
    }
}
