//! Profit-target and stop-loss levels for premium sold.

use rust_decimal::Decimal;
use serde::{Deserialize, Serialize};

use crate::data::to_money;

/// Exit thresholds relative to the entry premium.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct ExitRules {
    /// Take profit once the premium decays to this fraction of entry.
    pub profit_target_ratio: f64,
    /// Stop out once the premium grows to this multiple of entry.
    pub stop_loss_multiplier: f64,
}

impl Default for ExitRules {
    fn default() -> Self {
        Self {
            profit_target_ratio: 0.5,
            stop_loss_multiplier: 2.0,
        }
    }
}

impl ExitRules {
    pub fn target(&self, entry_premium: f64) -> f64 {
        entry_premium * self.profit_target_ratio
    }

    pub fn stop_loss(&self, entry_premium: f64) -> f64 {
        entry_premium * self.stop_loss_multiplier
    }

    pub fn target_hit(&self, entry_premium: f64, current_premium: f64) -> bool {
        current_premium <= self.target(entry_premium)
    }

    pub fn stop_loss_hit(&self, entry_premium: f64, current_premium: f64) -> bool {
        current_premium >= self.stop_loss(entry_premium)
    }

    pub fn target_money(&self, entry_premium: Decimal) -> Decimal {
        entry_premium * to_money(self.profit_target_ratio)
    }

    pub fn stop_loss_money(&self, entry_premium: Decimal) -> Decimal {
        entry_premium * to_money(self.stop_loss_multiplier)
    }
}
