//! Risk management module.
//!
//! Provides:
//! - Admission control (position limit, margin against free capital)
//! - Profit-target and stop-loss levels

pub mod admission;
pub mod exit_rules;

pub use admission::{AdmissionCandidate, AdmissionDecision, AdmissionGate, Approval, RiskConfig};
pub use exit_rules::ExitRules;
