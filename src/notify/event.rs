//! Trade events and their Markdown rendering.

use chrono::NaiveDate;
use rust_decimal::Decimal;
use serde::{Deserialize, Serialize};

use crate::data::OptionType;
use crate::position::ExitReason;

/// Something worth telling the operator about.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(tag = "event", rename_all = "snake_case")]
pub enum TradeEvent {
    Started {
        strategy: String,
        mode: String,
        instruments: Vec<String>,
    },
    Entry {
        symbol: String,
        option_type: OptionType,
        strike: Decimal,
        premium: Decimal,
        lot_size: u32,
        margin: Decimal,
        stop_loss: Decimal,
        target: Decimal,
        expiry: NaiveDate,
        strategy: String,
    },
    Exit {
        symbol: String,
        option_type: OptionType,
        strike: Decimal,
        entry_premium: Decimal,
        exit_premium: Decimal,
        pnl: Decimal,
        reason: ExitReason,
    },
    DailySummary {
        open_positions: usize,
        total_pnl: Decimal,
        win_rate: f64,
        trades: usize,
        strategy: String,
    },
    RiskAlert {
        message: String,
    },
}

impl TradeEvent {
    pub fn title(&self) -> &'static str {
        match self {
            Self::Started { .. } => "F&O AGENT STARTED",
            Self::Entry { .. } => "F&O ENTRY SIGNAL",
            Self::Exit { .. } => "F&O EXIT SIGNAL",
            Self::DailySummary { .. } => "F&O DAILY SUMMARY",
            Self::RiskAlert { .. } => "RISK ALERT",
        }
    }

    /// Markdown message prefixed with the agent name.
    pub fn render(&self, agent: &str) -> String {
        format!("*{}*\n\n*{}*\n\n{}", agent, self.title(), self.body())
    }

    fn body(&self) -> String {
        match self {
            Self::Started {
                strategy,
                mode,
                instruments,
            } => format!(
                "Strategy: {}\nMode: {}\nInstruments: {}",
                strategy,
                mode,
                instruments.join(", ")
            ),
            Self::Entry {
                symbol,
                option_type,
                strike,
                premium,
                lot_size,
                margin,
                stop_loss,
                target,
                expiry,
                strategy,
            } => format!(
                "*SELL {} {} {}*\n\
                 Premium: ₹{:.2}\n\
                 Lot Size: {}\n\
                 Margin: ₹{:.0}\n\
                 Stop Loss: ₹{:.2}\n\
                 Target: ₹{:.2}\n\
                 Expiry: {}\n\n\
                 Strategy: {}",
                symbol, strike, option_type, premium, lot_size, margin, stop_loss, target, expiry, strategy
            ),
            Self::Exit {
                symbol,
                option_type,
                strike,
                entry_premium,
                exit_premium,
                pnl,
                reason,
            } => format!(
                "*{} {} {}* {}\n\
                 Entry Premium: ₹{:.2}\n\
                 Exit Premium: ₹{:.2}\n\
                 P&L: ₹{:+.0}\n\
                 Reason: {}",
                symbol,
                strike,
                option_type,
                if *pnl > Decimal::ZERO { "WIN" } else { "LOSS" },
                entry_premium,
                exit_premium,
                pnl,
                reason
            ),
            Self::DailySummary {
                open_positions,
                total_pnl,
                win_rate,
                trades,
                strategy,
            } => format!(
                "Open Positions: {}\n\
                 Total P&L: ₹{:+.0}\n\
                 Win Rate: {:.1}%\n\
                 Trades: {}\n\n\
                 Strategy: {}",
                open_positions, total_pnl, win_rate, trades, strategy
            ),
            Self::RiskAlert { message } => message.clone(),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use rust_decimal_macros::dec;

    #[test]
    fn test_entry_render() {
        let event = TradeEvent::Entry {
            symbol: "NIFTY".to_string(),
            option_type: OptionType::Put,
            strike: dec!(18700),
            premium: dec!(62.5),
            lot_size: 50,
            margin: dec!(112200),
            stop_loss: dec!(125),
            target: dec!(31.25),
            expiry: NaiveDate::from_ymd_opt(2024, 1, 4).unwrap(),
            strategy: "Weekly Option Selling".to_string(),
        };

        let text = event.render("F&O Agent");
        assert!(text.starts_with("*F&O Agent*\n\n*F&O ENTRY SIGNAL*"));
        assert!(text.contains("*SELL NIFTY 18700 PE*"));
        assert!(text.contains("Premium: ₹62.50"));
        assert!(text.contains("Margin: ₹112200"));
        assert!(text.contains("Expiry: 2024-01-04"));
    }

    #[test]
    fn test_exit_render() {
        let event = TradeEvent::Exit {
            symbol: "BANKNIFTY".to_string(),
            option_type: OptionType::Call,
            strike: dec!(52000),
            entry_premium: dec!(80),
            exit_premium: dec!(160),
            pnl: dec!(-1200),
            reason: ExitReason::StopLossHit,
        };

        let text = event.render("F&O Agent");
        assert!(text.contains("*BANKNIFTY 52000 CE* LOSS"));
        assert!(text.contains("P&L: ₹-1200"));
        assert!(text.contains("Reason: Stop Loss Hit"));
    }

    #[test]
    fn test_events_serialize_with_tag() {
        let event = TradeEvent::RiskAlert {
            message: "Daily loss limit near".to_string(),
        };
        let json = serde_json::to_string(&event).unwrap();
        assert!(json.contains("\"event\":\"risk_alert\""));
    }
}
