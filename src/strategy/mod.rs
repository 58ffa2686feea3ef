//! Trading strategies for live and paper operation.
//!
//! A strategy proposes entries from current market data and decides when an
//! open trade should be closed. New strategies are added as new
//! `StrategyKind` variants with their own `Strategy` implementation.

pub mod weekly_option_selling;

use chrono::{NaiveDate, NaiveDateTime};
use rust_decimal::Decimal;
use serde::{Deserialize, Serialize};

pub use weekly_option_selling::{StrategyConfig, WeeklyOptionSelling};

use crate::data::{to_money, MarketData, OptionType, UnderlyingSpec};
use crate::position::{ExitReason, Trade, TradeParams};
use crate::risk::{AdmissionCandidate, ExitRules};

/// Inputs for one signal scan of one underlying.
#[derive(Debug, Clone)]
pub struct SignalContext<'a> {
    pub underlying: &'a UnderlyingSpec,
    pub spot: f64,
    pub expiry: NaiveDate,
    pub now: NaiveDateTime,
}

/// Proposal to sell one option.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Signal {
    pub symbol: String,
    pub option_type: OptionType,
    pub strike: f64,
    pub premium: f64,
    pub expiry: NaiveDate,
    pub stop_loss: f64,
    pub target: f64,
    /// Exchange contract name.
    pub trading_symbol: String,
    pub lot_size: u32,
    pub strategy: String,
}

impl Signal {
    pub fn to_params(&self) -> TradeParams {
        TradeParams {
            symbol: self.symbol.clone(),
            option_type: self.option_type,
            strike: to_money(self.strike),
            entry_premium: to_money(self.premium),
            lot_size: self.lot_size,
            strategy: self.strategy.clone(),
            expiry: self.expiry,
        }
    }

    pub fn to_candidate(&self) -> AdmissionCandidate {
        AdmissionCandidate {
            symbol: self.symbol.clone(),
            strike: to_money(self.strike),
            premium: to_money(self.premium),
            lot_size: self.lot_size,
        }
    }

    pub fn premium_money(&self) -> Decimal {
        to_money(self.premium)
    }
}

/// Entry and exit decisions of a trading strategy.
pub trait Strategy {
    fn name(&self) -> &str;

    /// Signals for one underlying; empty outside the entry window.
    fn generate_signals(&self, ctx: &SignalContext<'_>, market: &dyn MarketData) -> Vec<Signal>;

    /// Reason to close `trade` at `current_premium`, if any.
    fn should_exit(&self, trade: &Trade, current_premium: f64, now: NaiveDateTime) -> Option<ExitReason>;
}

/// Available strategies.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum StrategyKind {
    #[default]
    WeeklyOptionSelling,
}

impl StrategyKind {
    pub fn build(&self, config: &StrategyConfig, exits: ExitRules) -> Box<dyn Strategy> {
        match self {
            Self::WeeklyOptionSelling => Box::new(WeeklyOptionSelling::new(config.clone(), exits)),
        }
    }
}
