//! Simulation of one weekly strangle cycle.
//!
//! A cycle moves ENTRY_PENDING -> OPEN -> CLOSED:
//! 1. Find the entry day (Monday of the expiry week or the next day with data)
//! 2. Price both OTM legs; skip the cycle if either is too cheap
//! 3. Walk forward day by day, re-pricing both legs, until a trigger fires
//! 4. Otherwise settle both legs at intrinsic value on expiry

use chrono::{Datelike, Duration, NaiveDate, Weekday};
use serde::{Deserialize, Serialize};
use tracing::debug;

use super::trade::{LegResult, StrangleTrade};
use crate::calendar::ExpiryCalendar;
use crate::data::{to_money, OptionType, PriceHistory, UnderlyingSpec};
use crate::position::{ExitReason, TradeStatus};
use crate::pricing::PremiumEstimator;
use crate::risk::ExitRules;

/// Entry filter and exit triggers for a cycle.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct CycleRules {
    /// Distance of both strikes from spot (0.10 = 10%).
    pub otm_pct: f64,
    /// Both legs must collect at least this premium.
    pub min_entry_premium: f64,
    pub exits: ExitRules,
    /// Weekday on which the position is closed regardless of P&L.
    pub scheduled_exit: Weekday,
}

impl Default for CycleRules {
    fn default() -> Self {
        Self {
            otm_pct: 0.10,
            min_entry_premium: 20.0,
            exits: ExitRules::default(),
            scheduled_exit: Weekday::Thu,
        }
    }
}

impl CycleRules {
    /// First exit trigger that fires, in fixed priority order:
    /// put target, call target, put stop, call stop, scheduled weekday.
    pub fn exit_trigger(
        &self,
        put_entry: f64,
        call_entry: f64,
        put_now: f64,
        call_now: f64,
        date: NaiveDate,
    ) -> Option<ExitReason> {
        if self.exits.target_hit(put_entry, put_now) {
            Some(ExitReason::PutTarget)
        } else if self.exits.target_hit(call_entry, call_now) {
            Some(ExitReason::CallTarget)
        } else if self.exits.stop_loss_hit(put_entry, put_now) {
            Some(ExitReason::PutStopLoss)
        } else if self.exits.stop_loss_hit(call_entry, call_now) {
            Some(ExitReason::CallStopLoss)
        } else if date.weekday() == self.scheduled_exit {
            Some(ExitReason::ScheduledExit(self.scheduled_exit))
        } else {
            None
        }
    }
}

/// A cycle whose entry premiums failed the minimum.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct SkippedCycle {
    pub entry_date: NaiveDate,
    pub expiry: NaiveDate,
    pub put_premium: f64,
    pub call_premium: f64,
}

/// Result of simulating one expiry.
#[derive(Debug, Clone, PartialEq)]
pub enum CycleOutcome {
    Traded(StrangleTrade),
    /// Premiums below the minimum; no trade and no capital change.
    Skipped(SkippedCycle),
    /// No day with data in the entry window.
    NoEntryDay,
}

/// Simulates weekly cycles for one underlying.
#[derive(Debug, Clone)]
pub struct CycleSimulator {
    underlying: UnderlyingSpec,
    calendar: ExpiryCalendar,
    estimator: PremiumEstimator,
    rules: CycleRules,
}

impl CycleSimulator {
    pub fn new(underlying: UnderlyingSpec, estimator: PremiumEstimator, rules: CycleRules) -> Self {
        let calendar = ExpiryCalendar::new(underlying.expiry_weekday);
        Self {
            underlying,
            calendar,
            estimator,
            rules,
        }
    }

    pub fn underlying(&self) -> &UnderlyingSpec {
        &self.underlying
    }

    pub fn calendar(&self) -> &ExpiryCalendar {
        &self.calendar
    }

    pub fn rules(&self) -> &CycleRules {
        &self.rules
    }

    fn price(&self, spot: f64, strike: f64, days: i64, vol: f64, option_type: OptionType) -> f64 {
        self.estimator.premium(spot, strike, days, vol, option_type)
    }

    /// Simulate the cycle expiring on `expiry`.
    pub fn simulate(&self, history: &PriceHistory, expiry: NaiveDate) -> CycleOutcome {
        let Some(entry_date) = self.calendar.entry_date_for(expiry, |d| history.has_data(d)) else {
            debug!("No entry day for expiry {}", expiry);
            return CycleOutcome::NoEntryDay;
        };
        let Some(entry_bar) = history.bar(entry_date) else {
            return CycleOutcome::NoEntryDay;
        };

        let spot = entry_bar.close;
        let put_strike = self.underlying.otm_strike(spot, self.rules.otm_pct, OptionType::Put);
        let call_strike = self.underlying.otm_strike(spot, self.rules.otm_pct, OptionType::Call);
        let days_to_expiry = (expiry - entry_date).num_days();

        let put_entry = self.price(spot, put_strike, days_to_expiry, entry_bar.volatility, OptionType::Put);
        let call_entry = self.price(spot, call_strike, days_to_expiry, entry_bar.volatility, OptionType::Call);

        if put_entry < self.rules.min_entry_premium || call_entry < self.rules.min_entry_premium {
            debug!(
                "Skipped {}: Put={:.0}, Call={:.0}",
                entry_date, put_entry, call_entry
            );
            return CycleOutcome::Skipped(SkippedCycle {
                entry_date,
                expiry,
                put_premium: put_entry,
                call_premium: call_entry,
            });
        }

        debug!(
            "Entry {}: Spot={:.0}, Put {}@{:.2}, Call {}@{:.2}",
            entry_date, spot, put_strike, put_entry, call_strike, call_entry
        );

        let (exit_date, exit_spot, put_exit, call_exit, reason) = self
            .walk_to_exit(history, entry_date, expiry, put_strike, call_strike, put_entry, call_entry)
            .unwrap_or_else(|| {
                // Settle at intrinsic; fall back to the entry spot without an expiry close
                let settle_spot = history.close(expiry).unwrap_or(spot);
                (
                    expiry,
                    settle_spot,
                    OptionType::Put.intrinsic(settle_spot, put_strike),
                    OptionType::Call.intrinsic(settle_spot, call_strike),
                    ExitReason::Expiry,
                )
            });

        let lot_size = self.underlying.lot_size;
        let put = LegResult::new(OptionType::Put, put_strike, to_money(put_entry), to_money(put_exit), lot_size);
        let call = LegResult::new(OptionType::Call, call_strike, to_money(call_entry), to_money(call_exit), lot_size);

        CycleOutcome::Traded(StrangleTrade {
            symbol: self.underlying.symbol.clone(),
            entry_date,
            exit_date,
            expiry,
            entry_spot: spot,
            exit_spot,
            lot_size,
            total_pnl: put.pnl + call.pnl,
            put,
            call,
            exit_reason: reason,
            status: TradeStatus::Closed,
        })
    }

    /// Day-by-day exit evaluation from the day after entry through expiry.
    #[allow(clippy::too_many_arguments)]
    fn walk_to_exit(
        &self,
        history: &PriceHistory,
        entry_date: NaiveDate,
        expiry: NaiveDate,
        put_strike: f64,
        call_strike: f64,
        put_entry: f64,
        call_entry: f64,
    ) -> Option<(NaiveDate, f64, f64, f64, ExitReason)> {
        let mut date = entry_date + Duration::days(1);
        while date <= expiry {
            if let Some(bar) = history.bar(date) {
                let days_left = (expiry - date).num_days();
                let put_now = self.price(bar.close, put_strike, days_left, bar.volatility, OptionType::Put);
                let call_now = self.price(bar.close, call_strike, days_left, bar.volatility, OptionType::Call);

                if let Some(reason) =
                    self.rules
                        .exit_trigger(put_entry, call_entry, put_now, call_now, date)
                {
                    return Some((date, bar.close, put_now, call_now, reason));
                }
            }
            date += Duration::days(1);
        }
        None
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::data::DailyBar;
    use rust_decimal::Decimal;

    fn date(d: u32) -> NaiveDate {
        NaiveDate::from_ymd_opt(2024, 1, d).unwrap()
    }

    fn history(closes: &[(u32, f64)]) -> PriceHistory {
        PriceHistory::from_bars(
            "NIFTY",
            closes.iter().map(|&(d, close)| DailyBar {
                date: date(d),
                close,
                volatility: 0.20,
            }),
        )
    }

    fn near_money() -> CycleSimulator {
        let rules = CycleRules {
            otm_pct: 0.01,
            ..CycleRules::default()
        };
        CycleSimulator::new(UnderlyingSpec::nifty(), PremiumEstimator::default(), rules)
    }

    #[test]
    fn test_put_target_beats_call_stop() {
        let rules = CycleRules::default();
        // Put decayed to half while the call doubled on the same day
        let reason = rules.exit_trigger(40.0, 30.0, 20.0, 60.0, date(2));
        assert_eq!(reason, Some(ExitReason::PutTarget));
    }

    #[test]
    fn test_trigger_priority_order() {
        let rules = CycleRules::default();
        assert_eq!(rules.exit_trigger(40.0, 30.0, 30.0, 15.0, date(2)), Some(ExitReason::CallTarget));
        assert_eq!(rules.exit_trigger(40.0, 30.0, 80.0, 60.0, date(2)), Some(ExitReason::PutStopLoss));
        assert_eq!(rules.exit_trigger(40.0, 30.0, 45.0, 60.0, date(2)), Some(ExitReason::CallStopLoss));
        // 2024-01-04 is a Thursday
        assert_eq!(
            rules.exit_trigger(40.0, 30.0, 35.0, 25.0, date(4)),
            Some(ExitReason::ScheduledExit(Weekday::Thu))
        );
        assert_eq!(rules.exit_trigger(40.0, 30.0, 35.0, 25.0, date(3)), None);
    }

    #[test]
    fn test_no_entry_day() {
        let sim = near_money();
        let outcome = sim.simulate(&history(&[(8, 22_000.0)]), date(4));
        assert_eq!(outcome, CycleOutcome::NoEntryDay);
    }

    #[test]
    fn test_cheap_premiums_skip_cycle() {
        let sim = CycleSimulator::new(
            UnderlyingSpec::nifty(),
            PremiumEstimator::default(),
            CycleRules {
                otm_pct: 0.10,
                min_entry_premium: 20.0,
                ..CycleRules::default()
            },
        );
        let outcome = sim.simulate(&history(&[(1, 22_000.0), (2, 22_000.0)]), date(4));

        match outcome {
            CycleOutcome::Skipped(skipped) => {
                assert_eq!(skipped.entry_date, date(1));
                assert!(skipped.put_premium < 20.0 || skipped.call_premium < 20.0);
            }
            other => panic!("expected skip, got {:?}", other),
        }
    }

    #[test]
    fn test_flat_market_exits_on_thursday() {
        let sim = near_money();
        let outcome = sim.simulate(
            &history(&[(1, 22_000.0), (2, 22_000.0), (3, 22_000.0), (4, 22_000.0)]),
            date(4),
        );

        let CycleOutcome::Traded(trade) = outcome else {
            panic!("expected a trade");
        };
        assert_eq!(trade.put.strike, 21_800.0);
        assert_eq!(trade.call.strike, 22_200.0);
        assert_eq!(trade.entry_date, date(1));
        assert_eq!(trade.status, TradeStatus::Closed);
        assert_eq!(trade.total_pnl, trade.put.pnl + trade.call.pnl);
        assert!(trade.total_pnl > Decimal::ZERO);
        assert!(trade.exit_date > trade.entry_date && trade.exit_date <= date(4));
    }

    #[test]
    fn test_crash_hits_call_target_first() {
        let sim = near_money();
        let outcome = sim.simulate(&history(&[(1, 22_000.0), (2, 20_000.0)]), date(4));

        let CycleOutcome::Traded(trade) = outcome else {
            panic!("expected a trade");
        };
        // Call collapses and put explodes the same day; call target wins
        assert_eq!(trade.exit_reason, ExitReason::CallTarget);
        assert_eq!(trade.exit_date, date(2));
        assert!(trade.total_pnl < Decimal::ZERO);
    }

    #[test]
    fn test_settles_at_expiry_with_entry_spot_when_expiry_missing() {
        let rules = CycleRules {
            otm_pct: 0.01,
            // Unreachable thresholds and no scheduled exit inside the window
            exits: ExitRules {
                profit_target_ratio: 0.0,
                stop_loss_multiplier: 100.0,
            },
            scheduled_exit: Weekday::Sat,
            ..CycleRules::default()
        };
        let sim = CycleSimulator::new(UnderlyingSpec::nifty(), PremiumEstimator::default(), rules);
        let outcome = sim.simulate(&history(&[(1, 22_000.0), (2, 22_010.0)]), date(4));

        let CycleOutcome::Traded(trade) = outcome else {
            panic!("expected a trade");
        };
        assert_eq!(trade.exit_reason, ExitReason::Expiry);
        assert_eq!(trade.exit_date, date(4));
        assert_eq!(trade.exit_spot, 22_000.0);
        // Both strikes are out of the money at the entry spot
        assert_eq!(trade.put.exit_premium, Decimal::ZERO);
        assert_eq!(trade.call.exit_premium, Decimal::ZERO);
        assert_eq!(
            trade.total_pnl,
            (trade.put.entry_premium + trade.call.entry_premium) * Decimal::from(50)
        );
    }
}
