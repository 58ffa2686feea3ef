//! Weekly strangle records produced by the backtest.
//!
//! Each simulated cycle sells one put and one call and closes both legs
//! together, so a cycle yields exactly one `StrangleTrade`.

use chrono::NaiveDate;
use rust_decimal::Decimal;
use serde::{Deserialize, Serialize};

use crate::data::OptionType;
use crate::metrics::ClosedTrade;
use crate::position::{ExitReason, TradeStatus};

/// One leg of a strangle.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct LegResult {
    pub option_type: OptionType,
    pub strike: f64,
    /// Premium collected per unit.
    pub entry_premium: Decimal,
    /// Premium paid per unit to close.
    pub exit_premium: Decimal,
    /// `(entry - exit) * lot_size`.
    pub pnl: Decimal,
}

impl LegResult {
    pub fn new(
        option_type: OptionType,
        strike: f64,
        entry_premium: Decimal,
        exit_premium: Decimal,
        lot_size: u32,
    ) -> Self {
        Self {
            option_type,
            strike,
            entry_premium,
            exit_premium,
            pnl: (entry_premium - exit_premium) * Decimal::from(lot_size),
        }
    }
}

/// A completed weekly cycle.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct StrangleTrade {
    pub symbol: String,
    pub entry_date: NaiveDate,
    pub exit_date: NaiveDate,
    pub expiry: NaiveDate,
    /// Underlying close on the entry date.
    pub entry_spot: f64,
    /// Underlying close used for the exit.
    pub exit_spot: f64,
    pub lot_size: u32,
    pub put: LegResult,
    pub call: LegResult,
    pub total_pnl: Decimal,
    pub exit_reason: ExitReason,
    pub status: TradeStatus,
}

impl StrangleTrade {
    pub fn days_held(&self) -> i64 {
        (self.exit_date - self.entry_date).num_days()
    }

    pub fn is_winner(&self) -> bool {
        self.total_pnl > Decimal::ZERO
    }

    /// Total premium collected at entry.
    pub fn credit(&self) -> Decimal {
        (self.put.entry_premium + self.call.entry_premium) * Decimal::from(self.lot_size)
    }
}

impl ClosedTrade for StrangleTrade {
    fn symbol(&self) -> &str {
        &self.symbol
    }

    fn realized_pnl(&self) -> Option<Decimal> {
        (self.status == TradeStatus::Closed).then_some(self.total_pnl)
    }

    fn exit_date(&self) -> Option<NaiveDate> {
        Some(self.exit_date)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use rust_decimal_macros::dec;

    #[test]
    fn test_leg_pnl_for_sold_option() {
        let leg = LegResult::new(OptionType::Put, 19_800.0, dec!(45.20), dec!(12.10), 50);
        assert_eq!(leg.pnl, dec!(1655));

        let losing = LegResult::new(OptionType::Call, 24_200.0, dec!(30), dec!(75.5), 50);
        assert_eq!(losing.pnl, dec!(-2275));
    }

    #[test]
    fn test_strangle_accessors() {
        let put = LegResult::new(OptionType::Put, 19_800.0, dec!(40), dec!(20), 50);
        let call = LegResult::new(OptionType::Call, 24_200.0, dec!(30), dec!(25), 50);
        let trade = StrangleTrade {
            symbol: "NIFTY".to_string(),
            entry_date: NaiveDate::from_ymd_opt(2024, 1, 1).unwrap(),
            exit_date: NaiveDate::from_ymd_opt(2024, 1, 3).unwrap(),
            expiry: NaiveDate::from_ymd_opt(2024, 1, 4).unwrap(),
            entry_spot: 22_000.0,
            exit_spot: 22_050.0,
            lot_size: 50,
            total_pnl: put.pnl + call.pnl,
            put,
            call,
            exit_reason: ExitReason::PutTarget,
            status: TradeStatus::Closed,
        };

        assert_eq!(trade.days_held(), 2);
        assert_eq!(trade.total_pnl, dec!(1250));
        assert_eq!(trade.credit(), dec!(3500));
        assert!(trade.is_winner());
        assert_eq!(trade.realized_pnl(), Some(dec!(1250)));
    }
}
