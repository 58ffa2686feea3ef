//! Admission control for new positions.
//!
//! A candidate is admitted when:
//! - fewer than `max_positions` positions are open
//! - its approximate margin fits in the capital not already blocked by
//!   open positions
//!
//! Margin is `strike * lot_size * margin_rate` for every underlying.

use rust_decimal::Decimal;
use serde::{Deserialize, Serialize};

use super::exit_rules::ExitRules;
use crate::position::Trade;

/// Capital and position limits.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct RiskConfig {
    /// Trading capital.
    pub capital: Decimal,
    /// Maximum simultaneously open positions.
    pub max_positions: usize,
    /// Fraction of notional blocked as margin.
    pub margin_rate: Decimal,
}

impl Default for RiskConfig {
    fn default() -> Self {
        Self {
            capital: Decimal::from(100_000),
            max_positions: 2,
            margin_rate: Decimal::new(12, 2),
        }
    }
}

/// Position proposed for opening.
#[derive(Debug, Clone, PartialEq)]
pub struct AdmissionCandidate {
    pub symbol: String,
    pub strike: Decimal,
    pub premium: Decimal,
    pub lot_size: u32,
}

/// Levels computed for an approved candidate.
#[derive(Debug, Clone, PartialEq)]
pub struct Approval {
    pub margin: Decimal,
    pub stop_loss: Decimal,
    pub target: Decimal,
    /// Capital free before this position.
    pub available_capital: Decimal,
}

#[derive(Debug, Clone, PartialEq)]
pub enum AdmissionDecision {
    Approved(Approval),
    Rejected { reason: String },
}

impl AdmissionDecision {
    pub fn is_approved(&self) -> bool {
        matches!(self, Self::Approved(_))
    }

    pub fn reason(&self) -> &str {
        match self {
            Self::Approved(_) => "Approved",
            Self::Rejected { reason } => reason,
        }
    }
}

/// Gate that approves or declines new positions.
#[derive(Debug, Clone)]
pub struct AdmissionGate {
    config: RiskConfig,
    exits: ExitRules,
}

impl AdmissionGate {
    pub fn new(config: RiskConfig, exits: ExitRules) -> Self {
        Self { config, exits }
    }

    pub fn config(&self) -> &RiskConfig {
        &self.config
    }

    /// Margin for a strike and lot.
    pub fn margin_for(&self, strike: Decimal, lot_size: u32) -> Decimal {
        strike * Decimal::from(lot_size) * self.config.margin_rate
    }

    /// Margin already blocked by open positions.
    pub fn used_margin(&self, open_positions: &[Trade]) -> Decimal {
        open_positions
            .iter()
            .filter(|t| t.is_open())
            .map(|t| t.margin(self.config.margin_rate))
            .sum()
    }

    pub fn available_capital(&self, open_positions: &[Trade]) -> Decimal {
        self.config.capital - self.used_margin(open_positions)
    }

    /// Decide whether `candidate` may be opened alongside `open_positions`.
    pub fn admit(&self, candidate: &AdmissionCandidate, open_positions: &[Trade]) -> AdmissionDecision {
        let open_count = open_positions.iter().filter(|t| t.is_open()).count();
        if open_count >= self.config.max_positions {
            return AdmissionDecision::Rejected {
                reason: format!("Max positions ({}) reached", self.config.max_positions),
            };
        }

        let margin = self.margin_for(candidate.strike, candidate.lot_size);
        let available = self.available_capital(open_positions);
        if margin > available {
            return AdmissionDecision::Rejected {
                reason: format!(
                    "Insufficient capital (need {:.0}, have {:.0})",
                    margin, available
                ),
            };
        }

        AdmissionDecision::Approved(Approval {
            margin,
            stop_loss: self.exits.stop_loss_money(candidate.premium),
            target: self.exits.target_money(candidate.premium),
            available_capital: available,
        })
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::data::OptionType;
    use crate::position::TradeParams;
    use chrono::NaiveDate;
    use rust_decimal_macros::dec;

    fn open_trade(id: u64, strike: Decimal, lot_size: u32) -> Trade {
        let params = TradeParams {
            symbol: "NIFTY".to_string(),
            option_type: OptionType::Put,
            strike,
            entry_premium: dec!(60),
            lot_size,
            strategy: "test".to_string(),
            expiry: NaiveDate::from_ymd_opt(2024, 1, 11).unwrap(),
        };
        let entry = NaiveDate::from_ymd_opt(2024, 1, 8)
            .unwrap()
            .and_hms_opt(10, 0, 0)
            .unwrap();
        Trade::open(id, params, entry)
    }

    fn candidate(strike: Decimal, lot_size: u32) -> AdmissionCandidate {
        AdmissionCandidate {
            symbol: "NIFTY".to_string(),
            strike,
            premium: dec!(60),
            lot_size,
        }
    }

    fn gate() -> AdmissionGate {
        AdmissionGate::new(RiskConfig::default(), ExitRules::default())
    }

    #[test]
    fn test_approval_levels() {
        let decision = gate().admit(&candidate(dec!(20000), 10), &[]);
        match decision {
            AdmissionDecision::Approved(approval) => {
                assert_eq!(approval.margin, dec!(24000));
                assert_eq!(approval.stop_loss, dec!(120));
                assert_eq!(approval.target, dec!(30));
                assert_eq!(approval.available_capital, dec!(100000));
            }
            other => panic!("expected approval, got {:?}", other),
        }
    }

    #[test]
    fn test_position_limit() {
        let open = vec![open_trade(1, dec!(20000), 1), open_trade(2, dec!(20000), 1)];
        let decision = gate().admit(&candidate(dec!(20000), 1), &open);

        assert!(!decision.is_approved());
        assert_eq!(decision.reason(), "Max positions (2) reached");
    }

    #[test]
    fn test_closed_positions_do_not_count() {
        let mut closed = open_trade(1, dec!(20000), 1);
        let exit = closed.entry_time;
        closed.close(dec!(30), crate::position::ExitReason::TargetHit, exit);
        let open = vec![closed, open_trade(2, dec!(20000), 1)];

        assert!(gate().admit(&candidate(dec!(20000), 1), &open).is_approved());
    }

    #[test]
    fn test_margin_against_remaining_capital() {
        // 20000 * 25 * 0.12 = 60000 already used, 40000 left
        let open = vec![open_trade(1, dec!(20000), 25)];
        assert_eq!(gate().used_margin(&open), dec!(60000));

        let decision = gate().admit(&candidate(dec!(20000), 20), &open);
        assert_eq!(
            decision,
            AdmissionDecision::Rejected {
                reason: "Insufficient capital (need 48000, have 40000)".to_string()
            }
        );

        assert!(gate().admit(&candidate(dec!(20000), 15), &open).is_approved());
    }

    #[test]
    fn test_full_nifty_lot_exceeds_default_capital() {
        // 19800 * 50 * 0.12 = 118800 > 100000
        let decision = gate().admit(&candidate(dec!(19800), 50), &[]);
        assert!(decision.reason().starts_with("Insufficient capital"));
    }
}
