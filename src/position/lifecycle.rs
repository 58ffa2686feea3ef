//! OPEN -> CLOSED transitions for live and paper positions.

use chrono::NaiveDateTime;
use rust_decimal::Decimal;
use tracing::{debug, info};

use super::ledger::{LedgerError, TradeFilter, TradeLedger};
use super::trade::{ExitReason, Trade, TradeId, TradeParams};

/// Opens and closes trades against a ledger.
pub struct PositionManager<L: TradeLedger> {
    ledger: L,
}

impl<L: TradeLedger> PositionManager<L> {
    pub fn new(ledger: L) -> Self {
        Self { ledger }
    }

    pub fn ledger(&self) -> &L {
        &self.ledger
    }

    /// Record a new OPEN trade entered at `now`.
    pub fn open(&mut self, params: TradeParams, now: NaiveDateTime) -> Result<TradeId, LedgerError> {
        let trade = self.ledger.insert(params, now)?;
        info!(
            "Opened trade {}: {} {} {} @ {}",
            trade.id, trade.symbol, trade.strike, trade.option_type, trade.entry_premium
        );
        Ok(trade.id)
    }

    /// Close a trade at `exit_premium`, returning the realized P&L.
    ///
    /// Unknown ids and trades that are already closed are left alone and
    /// yield `Ok(None)`.
    pub fn close(
        &mut self,
        id: TradeId,
        exit_premium: Decimal,
        reason: ExitReason,
        now: NaiveDateTime,
    ) -> Result<Option<Decimal>, LedgerError> {
        let Some(mut trade) = self.ledger.get(id)? else {
            debug!("Close requested for unknown trade {}", id);
            return Ok(None);
        };

        let Some(pnl) = trade.close(exit_premium, reason, now) else {
            debug!("Trade {} is already closed", id);
            return Ok(None);
        };

        self.ledger.update(&trade)?;
        info!("Closed trade {} ({}): P&L {}", id, reason, pnl);
        Ok(Some(pnl))
    }

    pub fn get(&self, id: TradeId) -> Result<Option<Trade>, LedgerError> {
        self.ledger.get(id)
    }

    pub fn open_positions(&self) -> Result<Vec<Trade>, LedgerError> {
        self.ledger.query(&TradeFilter::open())
    }

    pub fn closed_trades(&self) -> Result<Vec<Trade>, LedgerError> {
        self.ledger.query(&TradeFilter::closed())
    }

    pub fn query(&self, filter: &TradeFilter) -> Result<Vec<Trade>, LedgerError> {
        self.ledger.query(filter)
    }
}
