//! Weekly option selling.
//!
//! Sell an out-of-the-money put and call on Monday morning, take profit at
//! half the premium, stop out at twice the premium, and close everything
//! on the exit days before expiry.

use chrono::{Datelike, NaiveDateTime, NaiveTime, Weekday};
use serde::{Deserialize, Serialize};
use tracing::debug;

use super::{Signal, SignalContext, Strategy, StrategyKind};
use crate::data::{to_f64, MarketData, OptionType};
use crate::position::{ExitReason, Trade};
use crate::risk::ExitRules;

/// Strategy parameters.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct StrategyConfig {
    pub kind: StrategyKind,
    /// Distance of strikes from spot (0.15 = 15%).
    pub otm_pct: f64,
    /// Options cheaper than this are not worth selling.
    pub min_signal_premium: f64,
    pub entry_weekday: Weekday,
    /// Earliest entry time on the entry day.
    pub entry_after: NaiveTime,
    /// Days on which open positions are closed regardless of P&L.
    pub exit_days: Vec<Weekday>,
}

impl Default for StrategyConfig {
    fn default() -> Self {
        Self {
            kind: StrategyKind::WeeklyOptionSelling,
            otm_pct: 0.15,
            min_signal_premium: 50.0,
            entry_weekday: Weekday::Mon,
            entry_after: NaiveTime::from_hms_opt(9, 30, 0).unwrap_or(NaiveTime::MIN),
            exit_days: vec![Weekday::Thu, Weekday::Fri],
        }
    }
}

pub struct WeeklyOptionSelling {
    config: StrategyConfig,
    exits: ExitRules,
}

impl WeeklyOptionSelling {
    pub const NAME: &'static str = "Weekly Option Selling";

    pub fn new(config: StrategyConfig, exits: ExitRules) -> Self {
        Self { config, exits }
    }

    fn in_entry_window(&self, now: NaiveDateTime) -> bool {
        now.weekday() == self.config.entry_weekday && now.time() >= self.config.entry_after
    }
}

impl Strategy for WeeklyOptionSelling {
    fn name(&self) -> &str {
        Self::NAME
    }

    fn generate_signals(&self, ctx: &SignalContext<'_>, market: &dyn MarketData) -> Vec<Signal> {
        if !self.in_entry_window(ctx.now) {
            return Vec::new();
        }

        let underlying = ctx.underlying;
        let mut signals = Vec::new();

        for option_type in [OptionType::Put, OptionType::Call] {
            let strike = underlying.otm_strike(ctx.spot, self.config.otm_pct, option_type);
            let Some(premium) =
                market.option_last_price(&underlying.symbol, strike, option_type, ctx.expiry)
            else {
                debug!("No quote for {} {} {}", underlying.symbol, strike, option_type);
                continue;
            };

            if premium < self.config.min_signal_premium {
                debug!(
                    "{} {} {} premium {:.2} below minimum {:.2}",
                    underlying.symbol, strike, option_type, premium, self.config.min_signal_premium
                );
                continue;
            }

            signals.push(Signal {
                symbol: underlying.symbol.clone(),
                option_type,
                strike,
                premium,
                expiry: ctx.expiry,
                stop_loss: self.exits.stop_loss(premium),
                target: self.exits.target(premium),
                trading_symbol: underlying.trading_symbol(ctx.expiry, strike, option_type),
                lot_size: underlying.lot_size,
                strategy: Self::NAME.to_string(),
            });
        }

        signals
    }

    fn should_exit(&self, trade: &Trade, current_premium: f64, now: NaiveDateTime) -> Option<ExitReason> {
        let entry = to_f64(trade.entry_premium);

        if self.exits.target_hit(entry, current_premium) {
            return Some(ExitReason::TargetHit);
        }
        if self.exits.stop_loss_hit(entry, current_premium) {
            return Some(ExitReason::StopLossHit);
        }

        let weekday = now.weekday();
        if self.config.exit_days.contains(&weekday) {
            return Some(ExitReason::ExitDay(weekday));
        }
        if now.date() >= trade.expiry {
            return Some(ExitReason::ExpiryDay);
        }

        None
    }
}
