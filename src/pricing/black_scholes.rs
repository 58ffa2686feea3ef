//! Black-Scholes premium, Greeks and implied volatility.
//!
//! European options on an index with no dividend yield. Greeks are scaled
//! the way traders quote them:
//! - Vega: per 1 volatility point (1%)
//! - Theta: per calendar day
//! - Rho: per 1% change in rate

use std::f64::consts::{PI, SQRT_2};

use serde::{Deserialize, Serialize};
use statrs::function::erf::erfc;

use crate::data::OptionType;

/// Default annual risk-free rate for Indian index options.
pub const DEFAULT_RISK_FREE_RATE: f64 = 0.07;

/// Starting volatility for the implied volatility search.
pub const IV_INITIAL_GUESS: f64 = 0.30;
/// Premium difference at which the search stops.
pub const IV_TOLERANCE: f64 = 1e-4;
pub const IV_MAX_ITERATIONS: u32 = 100;
pub const IV_MIN: f64 = 0.01;
pub const IV_MAX: f64 = 2.0;

/// Raw vega below which Newton steps are meaningless.
const VEGA_STALL: f64 = 1e-8;

/// Premium and sensitivities for a single option.
#[derive(Debug, Clone, Copy, Default, PartialEq, Serialize, Deserialize)]
pub struct GreeksResult {
    pub premium: f64,
    pub delta: f64,
    pub gamma: f64,
    /// Per calendar day.
    pub theta: f64,
    /// Per volatility point.
    pub vega: f64,
    /// Per 1% rate move.
    pub rho: f64,
}

/// Outcome of an implied volatility search.
///
/// The search never fails; `converged` tells whether the premium was
/// matched within tolerance or the best estimate was returned.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct IvEstimate {
    pub volatility: f64,
    pub iterations: u32,
    pub converged: bool,
}

/// Black-Scholes calculator.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct BlackScholes {
    /// Risk-free interest rate
    pub rate: f64,
}

impl Default for BlackScholes {
    fn default() -> Self {
        Self {
            rate: DEFAULT_RISK_FREE_RATE,
        }
    }
}

impl BlackScholes {
    pub fn new(rate: f64) -> Self {
        Self { rate }
    }

    fn d1(&self, spot: f64, strike: f64, time: f64, vol: f64) -> f64 {
        ((spot / strike).ln() + (self.rate + 0.5 * vol * vol) * time) / (vol * time.sqrt())
    }

    /// Standard normal CDF.
    fn norm_cdf(x: f64) -> f64 {
        0.5 * erfc(-x / SQRT_2)
    }

    /// Standard normal PDF.
    fn norm_pdf(x: f64) -> f64 {
        (-0.5 * x * x).exp() / (2.0 * PI).sqrt()
    }

    /// Premium and Greeks.
    ///
    /// Returns an all-zero result when `time <= 0`; the value at expiry is
    /// intrinsic and is the caller's concern. `vol` must be positive.
    pub fn greeks(
        &self,
        spot: f64,
        strike: f64,
        time: f64,
        vol: f64,
        option_type: OptionType,
    ) -> GreeksResult {
        if time <= 0.0 {
            return GreeksResult::default();
        }

        let sqrt_t = time.sqrt();
        let d1 = self.d1(spot, strike, time, vol);
        let d2 = d1 - vol * sqrt_t;
        let discount = (-self.rate * time).exp();
        let pdf_d1 = Self::norm_pdf(d1);

        let gamma = pdf_d1 / (spot * vol * sqrt_t);
        let vega = spot * pdf_d1 * sqrt_t / 100.0;
        let decay = -spot * pdf_d1 * vol / (2.0 * sqrt_t);

        let (premium, delta, theta, rho) = match option_type {
            OptionType::Call => {
                let nd1 = Self::norm_cdf(d1);
                let nd2 = Self::norm_cdf(d2);
                (
                    spot * nd1 - strike * discount * nd2,
                    nd1,
                    (decay - self.rate * strike * discount * nd2) / 365.0,
                    strike * time * discount * nd2 / 100.0,
                )
            }
            OptionType::Put => {
                let nd1 = Self::norm_cdf(-d1);
                let nd2 = Self::norm_cdf(-d2);
                (
                    strike * discount * nd2 - spot * nd1,
                    -nd1,
                    (decay + self.rate * strike * discount * nd2) / 365.0,
                    -strike * time * discount * nd2 / 100.0,
                )
            }
        };

        GreeksResult {
            premium: premium.max(0.0),
            delta,
            gamma,
            theta,
            vega,
            rho,
        }
    }

    /// Premium only.
    pub fn price(&self, spot: f64, strike: f64, time: f64, vol: f64, option_type: OptionType) -> f64 {
        self.greeks(spot, strike, time, vol, option_type).premium
    }

    /// Implied volatility by Newton-Raphson.
    ///
    /// Starts at 30% and clamps every step into [1%, 200%]. Stops when the
    /// model premium is within 1e-4 of `premium`, when vega vanishes, or
    /// after 100 iterations; the last candidate is returned in every case.
    /// Premiums outside what the formula can produce (below intrinsic,
    /// near-zero time) do not recover a meaningful volatility.
    pub fn implied_volatility(
        &self,
        spot: f64,
        strike: f64,
        premium: f64,
        time: f64,
        option_type: OptionType,
    ) -> IvEstimate {
        let mut vol = IV_INITIAL_GUESS;

        for iteration in 1..=IV_MAX_ITERATIONS {
            let greeks = self.greeks(spot, strike, time, vol, option_type);
            let diff = greeks.premium - premium;

            if diff.abs() < IV_TOLERANCE {
                return IvEstimate {
                    volatility: vol,
                    iterations: iteration,
                    converged: true,
                };
            }

            // Undo the per-point scaling
            let raw_vega = greeks.vega * 100.0;
            if raw_vega.abs() < VEGA_STALL || !raw_vega.is_finite() {
                return IvEstimate {
                    volatility: vol,
                    iterations: iteration,
                    converged: false,
                };
            }

            vol = (vol - diff / raw_vega).clamp(IV_MIN, IV_MAX);
        }

        IvEstimate {
            volatility: vol,
            iterations: IV_MAX_ITERATIONS,
            converged: false,
        }
    }
}
