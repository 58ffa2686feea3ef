//! Paper execution of strategy signals.
//!
//! Each scan:
//! 1. Checks exit conditions on open positions and closes the ones that fire
//! 2. Generates signals for every configured underlying
//! 3. Passes each signal through the admission gate
//! 4. Records approved trades and notifies

use chrono::{NaiveDate, NaiveDateTime};
use rust_decimal::Decimal;
use serde::{Deserialize, Serialize};
use tracing::{debug, info, warn};

use crate::calendar::next_weekly_expiry;
use crate::data::{to_f64, to_money, MarketData, OptionType, UnderlyingSpec};
use crate::metrics::PerformanceReport;
use crate::notify::{dispatch, Notifier, TradeEvent};
use crate::position::{
    ExitReason, LedgerError, PositionManager, Trade, TradeFilter, TradeId, TradeLedger,
};
use crate::risk::{AdmissionDecision, AdmissionGate};
use crate::strategy::{Signal, SignalContext, Strategy};

/// Position closed during monitoring.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ClosedPosition {
    pub id: TradeId,
    pub symbol: String,
    pub option_type: OptionType,
    pub strike: Decimal,
    pub exit_premium: Decimal,
    pub pnl: Decimal,
    pub reason: ExitReason,
}

/// What happened to a signal.
#[derive(Debug, Clone, PartialEq)]
pub enum SignalOutcome {
    Opened(TradeId),
    Rejected(String),
    /// Same contract already held.
    Duplicate,
}

/// Counts from one scan.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct ScanSummary {
    pub closed: Vec<ClosedPosition>,
    pub signals: usize,
    pub opened: usize,
    pub rejected: usize,
    pub open_positions: usize,
}

/// Paper trading executor.
pub struct PaperTrader<L: TradeLedger> {
    positions: PositionManager<L>,
    gate: AdmissionGate,
    strategy: Box<dyn Strategy>,
    notifier: Box<dyn Notifier>,
    underlyings: Vec<UnderlyingSpec>,
}

impl<L: TradeLedger> PaperTrader<L> {
    pub fn new(
        ledger: L,
        gate: AdmissionGate,
        strategy: Box<dyn Strategy>,
        notifier: Box<dyn Notifier>,
        underlyings: Vec<UnderlyingSpec>,
    ) -> Self {
        Self {
            positions: PositionManager::new(ledger),
            gate,
            strategy,
            notifier,
            underlyings,
        }
    }

    pub fn positions(&self) -> &PositionManager<L> {
        &self.positions
    }

    pub fn strategy_name(&self) -> &str {
        self.strategy.name()
    }

    pub fn underlyings(&self) -> &[UnderlyingSpec] {
        &self.underlyings
    }

    pub fn notify(&self, event: &TradeEvent) {
        dispatch(self.notifier.as_ref(), event);
    }

    /// Admit and record one signal.
    pub fn execute_signal(&mut self, signal: &Signal, now: NaiveDateTime) -> Result<SignalOutcome, LedgerError> {
        let open = self.positions.open_positions()?;
        let params = signal.to_params();

        let held = open.iter().any(|t| {
            t.symbol == params.symbol
                && t.option_type == params.option_type
                && t.strike == params.strike
                && t.expiry == params.expiry
        });
        if held {
            debug!("Already holding {}", signal.trading_symbol);
            return Ok(SignalOutcome::Duplicate);
        }

        let approval = match self.gate.admit(&signal.to_candidate(), &open) {
            AdmissionDecision::Approved(approval) => approval,
            AdmissionDecision::Rejected { reason } => {
                info!("Trade rejected: {}", reason);
                return Ok(SignalOutcome::Rejected(reason));
            }
        };

        let id = self.positions.open(params.clone(), now)?;

        info!(
            "SELL {} {} {} @ ₹{:.2} | Lot {} | Margin ₹{:.0} | SL ₹{:.2} | Target ₹{:.2}",
            params.symbol,
            params.strike,
            params.option_type,
            params.entry_premium,
            params.lot_size,
            approval.margin,
            approval.stop_loss,
            approval.target
        );

        self.notify(&TradeEvent::Entry {
            symbol: params.symbol,
            option_type: params.option_type,
            strike: params.strike,
            premium: params.entry_premium,
            lot_size: params.lot_size,
            margin: approval.margin,
            stop_loss: approval.stop_loss,
            target: approval.target,
            expiry: params.expiry,
            strategy: params.strategy,
        });

        Ok(SignalOutcome::Opened(id))
    }

    /// Close open positions whose exit conditions fire at `now`.
    pub fn monitor_positions(
        &mut self,
        market: &dyn MarketData,
        now: NaiveDateTime,
    ) -> Result<Vec<ClosedPosition>, LedgerError> {
        let mut closed = Vec::new();

        for position in self.positions.open_positions()? {
            let Some(current) = market.option_last_price(
                &position.symbol,
                to_f64(position.strike),
                position.option_type,
                position.expiry,
            ) else {
                debug!("No quote for trade {}", position.id);
                continue;
            };

            let Some(reason) = self.strategy.should_exit(&position, current, now) else {
                continue;
            };

            let exit_premium = to_money(current);
            let Some(pnl) = self.positions.close(position.id, exit_premium, reason, now)? else {
                continue;
            };

            self.notify(&TradeEvent::Exit {
                symbol: position.symbol.clone(),
                option_type: position.option_type,
                strike: position.strike,
                entry_premium: position.entry_premium,
                exit_premium,
                pnl,
                reason,
            });

            closed.push(ClosedPosition {
                id: position.id,
                symbol: position.symbol,
                option_type: position.option_type,
                strike: position.strike,
                exit_premium,
                pnl,
                reason,
            });
        }

        Ok(closed)
    }

    /// One full scan: monitor, then look for and execute new signals.
    pub fn scan(&mut self, market: &dyn MarketData, now: NaiveDateTime) -> Result<ScanSummary, LedgerError> {
        let mut summary = ScanSummary {
            closed: self.monitor_positions(market, now)?,
            ..ScanSummary::default()
        };

        for underlying in self.underlyings.clone() {
            let spot = match market.spot_price(&underlying.symbol) {
                Ok(spot) => spot,
                Err(e) => {
                    warn!("Skipping {}: {}", underlying.symbol, e);
                    continue;
                }
            };
            let expiry = next_weekly_expiry(now.date(), underlying.expiry_weekday);

            let ctx = SignalContext {
                underlying: &underlying,
                spot,
                expiry,
                now,
            };
            let signals = self.strategy.generate_signals(&ctx, market);
            debug!(
                "{}: spot ₹{:.2}, expiry {}, {} signal(s)",
                underlying.symbol,
                spot,
                expiry,
                signals.len()
            );

            for signal in &signals {
                summary.signals += 1;
                match self.execute_signal(signal, now)? {
                    SignalOutcome::Opened(_) => summary.opened += 1,
                    SignalOutcome::Rejected(_) => summary.rejected += 1,
                    SignalOutcome::Duplicate => {}
                }
            }
        }

        summary.open_positions = self.positions.open_positions()?.len();
        Ok(summary)
    }

    pub fn all_trades(&self) -> Result<Vec<Trade>, LedgerError> {
        self.positions.query(&TradeFilter::all())
    }

    pub fn performance(&self, as_of: NaiveDate) -> Result<PerformanceReport, LedgerError> {
        Ok(PerformanceReport::from_trades(&self.all_trades()?, as_of))
    }

    /// Daily summary event from the current ledger.
    pub fn daily_summary(&self, as_of: NaiveDate) -> Result<TradeEvent, LedgerError> {
        let report = self.performance(as_of)?;
        Ok(TradeEvent::DailySummary {
            open_positions: report.open_positions,
            total_pnl: report.overall.total_pnl,
            win_rate: report.overall.win_rate,
            trades: report.overall.total_trades,
            strategy: self.strategy.name().to_string(),
        })
    }
}
