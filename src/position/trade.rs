//! Single-leg option trades for live and paper operation.
//!
//! A trade is created OPEN and moves to CLOSED exactly once. Exit fields
//! (`exit_premium`, `exit_time`, `pnl`, `exit_reason`) are populated by that
//! transition and never before.

use std::fmt;

use chrono::{NaiveDate, NaiveDateTime, Weekday};
use rust_decimal::Decimal;
use serde::{Deserialize, Serialize};

use crate::calendar::weekday_name;
use crate::data::OptionType;
use crate::metrics::ClosedTrade;

/// Ledger-assigned trade identifier.
pub type TradeId = u64;

/// Status of a trade.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "UPPERCASE")]
pub enum TradeStatus {
    Open,
    Closed,
}

impl fmt::Display for TradeStatus {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::Open => f.write_str("OPEN"),
            Self::Closed => f.write_str("CLOSED"),
        }
    }
}

/// Reason a position was closed.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub enum ExitReason {
    /// Put leg decayed to the profit target.
    PutTarget,
    /// Call leg decayed to the profit target.
    CallTarget,
    /// Put leg reached the stop-loss multiple.
    PutStopLoss,
    /// Call leg reached the stop-loss multiple.
    CallStopLoss,
    /// Fixed weekday exit regardless of P&L.
    ScheduledExit(Weekday),
    /// Settled at intrinsic value on expiry.
    Expiry,
    /// Single-leg profit target.
    TargetHit,
    /// Single-leg stop loss.
    StopLossHit,
    /// Live exit day reached.
    ExitDay(Weekday),
    /// Closed on expiry day.
    ExpiryDay,
    Manual,
}

impl ExitReason {
    /// Whether the exit locked in the profit target.
    pub fn is_target(&self) -> bool {
        matches!(self, Self::PutTarget | Self::CallTarget | Self::TargetHit)
    }

    pub fn is_stop_loss(&self) -> bool {
        matches!(self, Self::PutStopLoss | Self::CallStopLoss | Self::StopLossHit)
    }
}

impl fmt::Display for ExitReason {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::PutTarget => f.write_str("Put Target Hit"),
            Self::CallTarget => f.write_str("Call Target Hit"),
            Self::PutStopLoss => f.write_str("Put Stop Loss"),
            Self::CallStopLoss => f.write_str("Call Stop Loss"),
            Self::ScheduledExit(day) => write!(f, "{} Exit", weekday_name(*day)),
            Self::Expiry => f.write_str("Expiry"),
            Self::TargetHit => f.write_str("Target Hit"),
            Self::StopLossHit => f.write_str("Stop Loss Hit"),
            Self::ExitDay(day) => write!(f, "Exit Day ({})", weekday_name(*day)),
            Self::ExpiryDay => f.write_str("Expiry Day"),
            Self::Manual => f.write_str("Manual"),
        }
    }
}

/// Parameters for opening a trade.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct TradeParams {
    pub symbol: String,
    pub option_type: OptionType,
    pub strike: Decimal,
    pub entry_premium: Decimal,
    pub lot_size: u32,
    pub strategy: String,
    pub expiry: NaiveDate,
}

/// A single option position sold to open.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Trade {
    pub id: TradeId,
    /// Underlying symbol.
    pub symbol: String,
    pub option_type: OptionType,
    pub strike: Decimal,
    /// Premium collected per unit.
    pub entry_premium: Decimal,
    /// Premium paid per unit to close.
    pub exit_premium: Option<Decimal>,
    /// Contract multiplier.
    pub lot_size: u32,
    pub entry_time: NaiveDateTime,
    pub exit_time: Option<NaiveDateTime>,
    /// Realized P&L (if closed).
    pub pnl: Option<Decimal>,
    pub status: TradeStatus,
    pub exit_reason: Option<ExitReason>,
    /// Name of the strategy that generated the trade.
    pub strategy: String,
    pub expiry: NaiveDate,
}

impl Trade {
    /// New OPEN trade.
    pub fn open(id: TradeId, params: TradeParams, entry_time: NaiveDateTime) -> Self {
        Self {
            id,
            symbol: params.symbol,
            option_type: params.option_type,
            strike: params.strike,
            entry_premium: params.entry_premium,
            exit_premium: None,
            lot_size: params.lot_size,
            entry_time,
            exit_time: None,
            pnl: None,
            status: TradeStatus::Open,
            exit_reason: None,
            strategy: params.strategy,
            expiry: params.expiry,
        }
    }

    pub fn is_open(&self) -> bool {
        self.status == TradeStatus::Open
    }

    /// P&L if closed at `premium`.
    pub fn pnl_at(&self, premium: Decimal) -> Decimal {
        (self.entry_premium - premium) * Decimal::from(self.lot_size)
    }

    /// Close the trade.
    ///
    /// Returns the realized P&L, or `None` if the trade was already closed.
    pub fn close(
        &mut self,
        exit_premium: Decimal,
        reason: ExitReason,
        exit_time: NaiveDateTime,
    ) -> Option<Decimal> {
        if !self.is_open() {
            return None;
        }

        let pnl = self.pnl_at(exit_premium);
        self.status = TradeStatus::Closed;
        self.exit_premium = Some(exit_premium);
        self.exit_time = Some(exit_time);
        self.exit_reason = Some(reason);
        self.pnl = Some(pnl);
        Some(pnl)
    }

    /// Approximate margin blocked by this position.
    pub fn margin(&self, margin_rate: Decimal) -> Decimal {
        self.strike * Decimal::from(self.lot_size) * margin_rate
    }

    pub fn exit_date(&self) -> Option<NaiveDate> {
        self.exit_time.map(|t| t.date())
    }
}

impl ClosedTrade for Trade {
    fn symbol(&self) -> &str {
        &self.symbol
    }

    fn realized_pnl(&self) -> Option<Decimal> {
        self.pnl
    }

    fn exit_date(&self) -> Option<NaiveDate> {
        Trade::exit_date(self)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use rust_decimal_macros::dec;

    fn ts(day: u32, hour: u32) -> NaiveDateTime {
        NaiveDate::from_ymd_opt(2024, 1, day)
            .unwrap()
            .and_hms_opt(hour, 0, 0)
            .unwrap()
    }

    fn params() -> TradeParams {
        TradeParams {
            symbol: "NIFTY".to_string(),
            option_type: OptionType::Put,
            strike: dec!(18700),
            entry_premium: dec!(60),
            lot_size: 50,
            strategy: "Weekly Option Selling".to_string(),
            expiry: NaiveDate::from_ymd_opt(2024, 1, 4).unwrap(),
        }
    }

    #[test]
    fn test_open_has_no_exit_fields() {
        let trade = Trade::open(1, params(), ts(1, 10));
        assert!(trade.is_open());
        assert_eq!(trade.exit_premium, None);
        assert_eq!(trade.exit_time, None);
        assert_eq!(trade.pnl, None);
        assert_eq!(trade.exit_reason, None);
    }

    #[test]
    fn test_close_sets_exit_fields_once() {
        let mut trade = Trade::open(1, params(), ts(1, 10));

        let pnl = trade.close(dec!(30), ExitReason::TargetHit, ts(2, 11));
        assert_eq!(pnl, Some(dec!(1500)));
        assert_eq!(trade.status, TradeStatus::Closed);
        assert_eq!(trade.exit_premium, Some(dec!(30)));
        assert_eq!(trade.exit_date(), NaiveDate::from_ymd_opt(2024, 1, 2));

        // Second close is rejected and leaves the record untouched
        assert_eq!(trade.close(dec!(120), ExitReason::StopLossHit, ts(3, 11)), None);
        assert_eq!(trade.pnl, Some(dec!(1500)));
        assert_eq!(trade.exit_reason, Some(ExitReason::TargetHit));
    }

    #[test]
    fn test_losing_close() {
        let mut trade = Trade::open(1, params(), ts(1, 10));
        assert_eq!(
            trade.close(dec!(120), ExitReason::StopLossHit, ts(2, 11)),
            Some(dec!(-3000))
        );
    }

    #[test]
    fn test_margin() {
        let trade = Trade::open(1, params(), ts(1, 10));
        assert_eq!(trade.margin(dec!(0.12)), dec!(112200));
    }

    #[test]
    fn test_exit_reason_labels() {
        assert_eq!(ExitReason::PutTarget.to_string(), "Put Target Hit");
        assert_eq!(ExitReason::CallStopLoss.to_string(), "Call Stop Loss");
        assert_eq!(ExitReason::ScheduledExit(Weekday::Thu).to_string(), "Thursday Exit");
        assert_eq!(ExitReason::ExitDay(Weekday::Fri).to_string(), "Exit Day (Friday)");
        assert!(ExitReason::CallTarget.is_target());
        assert!(ExitReason::StopLossHit.is_stop_loss());
        assert!(!ExitReason::Expiry.is_target());
    }

    #[test]
    fn test_status_serializes_uppercase() {
        assert_eq!(serde_json::to_string(&TradeStatus::Open).unwrap(), "\"OPEN\"");
        assert_eq!(serde_json::to_string(&TradeStatus::Closed).unwrap(), "\"CLOSED\"");
    }
}
