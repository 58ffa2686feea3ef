//! Application configuration.
//!
//! Loaded once at startup from TOML and passed to every component
//! constructor. Every section falls back to its defaults when omitted.

use std::path::Path;

use rust_decimal::Decimal;
use serde::{Deserialize, Serialize};
use thiserror::Error;

use crate::backtest::BacktestConfig;
use crate::data::UnderlyingSpec;
use crate::paper::PaperConfig;
use crate::pricing::PricingConfig;
use crate::risk::{ExitRules, RiskConfig};
use crate::strategy::StrategyConfig;

/// Errors from loading configuration.
#[derive(Error, Debug)]
pub enum ConfigError {
    #[error("IO error: {0}")]
    Io(#[from] std::io::Error),

    #[error("TOML parse error: {0}")]
    Toml(#[from] toml::de::Error),

    #[error("Invalid configuration: {0}")]
    Invalid(String),
}

/// Full application configuration.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct AppConfig {
    pub backtest: BacktestConfig,
    pub strategy: StrategyConfig,
    pub exits: ExitRules,
    pub risk: RiskConfig,
    pub pricing: PricingConfig,
    pub paper: PaperConfig,
    pub underlyings: Vec<UnderlyingSpec>,
}

impl Default for AppConfig {
    fn default() -> Self {
        Self {
            backtest: BacktestConfig::default(),
            strategy: StrategyConfig::default(),
            exits: ExitRules::default(),
            risk: RiskConfig::default(),
            pricing: PricingConfig::default(),
            paper: PaperConfig::default(),
            underlyings: vec![UnderlyingSpec::nifty(), UnderlyingSpec::banknifty()],
        }
    }
}

impl AppConfig {
    /// Load and validate a TOML file.
    pub fn from_toml(path: &Path) -> Result<Self, ConfigError> {
        let content = std::fs::read_to_string(path)?;
        Self::from_toml_str(&content)
    }

    pub fn from_toml_str(content: &str) -> Result<Self, ConfigError> {
        let config: Self = toml::from_str(content)?;
        config.validate()?;
        Ok(config)
    }

    /// Underlying spec by trading symbol.
    pub fn underlying(&self, symbol: &str) -> Option<&UnderlyingSpec> {
        self.underlyings
            .iter()
            .find(|u| u.symbol.eq_ignore_ascii_case(symbol))
    }

    pub fn validate(&self) -> Result<(), ConfigError> {
        let invalid = |msg: String| Err(ConfigError::Invalid(msg));

        if self.underlyings.is_empty() {
            return invalid("at least one underlying is required".to_string());
        }
        for u in &self.underlyings {
            if u.lot_size == 0 {
                return invalid(format!("{}: lot_size must be positive", u.symbol));
            }
            if !(u.strike_step > 0.0) {
                return invalid(format!("{}: strike_step must be positive", u.symbol));
            }
        }

        for (name, otm) in [("backtest.otm_pct", self.backtest.otm_pct), ("strategy.otm_pct", self.strategy.otm_pct)] {
            if !(otm > 0.0 && otm < 1.0) {
                return invalid(format!("{} must be in (0, 1), got {}", name, otm));
            }
        }

        if self.backtest.initial_capital <= Decimal::ZERO {
            return invalid("backtest.initial_capital must be positive".to_string());
        }
        if self.risk.capital <= Decimal::ZERO {
            return invalid("risk.capital must be positive".to_string());
        }
        if self.risk.margin_rate <= Decimal::ZERO {
            return invalid("risk.margin_rate must be positive".to_string());
        }
        if self.risk.max_positions == 0 {
            return invalid("risk.max_positions must be at least 1".to_string());
        }

        if !(self.exits.profit_target_ratio > 0.0 && self.exits.profit_target_ratio < 1.0) {
            return invalid(format!(
                "exits.profit_target_ratio must be in (0, 1), got {}",
                self.exits.profit_target_ratio
            ));
        }
        if !(self.exits.stop_loss_multiplier > 1.0) {
            return invalid(format!(
                "exits.stop_loss_multiplier must be above 1, got {}",
                self.exits.stop_loss_multiplier
            ));
        }

        if self.pricing.min_premium <= 0.0 {
            return invalid("pricing.min_premium must be positive".to_string());
        }
        if self.paper.scan_interval_secs == 0 {
            return invalid("paper.scan_interval_secs must be positive".to_string());
        }

        Ok(())
    }
}
