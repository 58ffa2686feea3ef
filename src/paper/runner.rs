//! Scan loop for paper trading.
//!
//! The loop runs a scan, sleeps for the scan interval and repeats until the
//! running flag is cleared. On shutdown it logs a final performance report
//! and sends a daily summary.

use std::sync::atomic::{AtomicBool, Ordering};
use std::thread;
use std::time::Duration;

use chrono::{NaiveDate, NaiveDateTime, NaiveTime};
use serde::{Deserialize, Serialize};
use tracing::{error, info};

use super::trader::{PaperTrader, ScanSummary};
use crate::data::{HistoricalFeed, MarketData};
use crate::metrics::PerformanceReport;
use crate::position::{LedgerError, TradeLedger};

/// Sleep granularity while waiting for the next scan.
const SLEEP_SLICE: Duration = Duration::from_millis(250);

/// Paper trading settings.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct PaperConfig {
    /// Seconds between scans.
    pub scan_interval_secs: u64,
    /// Seconds to wait after a failed scan.
    pub error_backoff_secs: u64,
    /// JSON trade ledger.
    pub ledger_path: String,
    /// Name prefixed to every notification.
    pub agent_name: String,
}

impl Default for PaperConfig {
    fn default() -> Self {
        Self {
            scan_interval_secs: 300,
            error_backoff_secs: 60,
            ledger_path: "fno_trades.db".to_string(),
            agent_name: "F&O Agent".to_string(),
        }
    }
}

/// Run one scan and log what it did.
pub fn run_scan_cycle<L: TradeLedger>(
    trader: &mut PaperTrader<L>,
    market: &mut dyn MarketData,
    now: NaiveDateTime,
) -> Result<ScanSummary, LedgerError> {
    market.refresh(now);
    info!("Scan cycle: {}", now.format("%Y-%m-%d %H:%M:%S"));

    let summary = trader.scan(market, now)?;
    for closed in &summary.closed {
        info!(
            "Closed {} {} {}: {} (P&L: ₹{:+.0})",
            closed.symbol, closed.strike, closed.option_type, closed.reason, closed.pnl
        );
    }

    let perf = trader.performance(now.date())?;
    info!(
        "Open={} | Signals={} | Opened={} | Trades={} | P&L=₹{:+.0} | WR={:.1}%",
        summary.open_positions,
        summary.signals,
        summary.opened,
        perf.overall.total_trades,
        perf.overall.total_pnl,
        perf.overall.win_rate
    );

    Ok(summary)
}

/// Sleep up to `total`, returning early once `running` is cleared.
fn interruptible_sleep(total: Duration, running: &AtomicBool) {
    let mut remaining = total;
    while !remaining.is_zero() && running.load(Ordering::SeqCst) {
        let step = remaining.min(SLEEP_SLICE);
        thread::sleep(step);
        remaining -= step;
    }
}

/// Scan repeatedly until `running` is cleared, then flush a final report.
pub fn run_loop<L, C>(
    trader: &mut PaperTrader<L>,
    market: &mut dyn MarketData,
    config: &PaperConfig,
    running: &AtomicBool,
    mut clock: C,
) -> Result<PerformanceReport, LedgerError>
where
    L: TradeLedger,
    C: FnMut() -> NaiveDateTime,
{
    info!(
        "Starting continuous monitoring (scan every {}s)",
        config.scan_interval_secs
    );

    while running.load(Ordering::SeqCst) {
        match run_scan_cycle(trader, market, clock()) {
            Ok(_) => interruptible_sleep(Duration::from_secs(config.scan_interval_secs), running),
            Err(e) => {
                error!("Error in scan loop: {}", e);
                interruptible_sleep(Duration::from_secs(config.error_backoff_secs), running);
            }
        }
    }

    info!("Stopping agent...");
    let today = clock().date();
    let report = trader.performance(today)?;
    info!("Final performance:\n{}", report.summary());
    let summary = trader.daily_summary(today)?;
    trader.notify(&summary);

    Ok(report)
}

/// Drive the trader over historical trading days, one scan per day at
/// `scan_time`.
pub fn replay<L: TradeLedger>(
    trader: &mut PaperTrader<L>,
    feed: &mut HistoricalFeed,
    start: NaiveDate,
    end: NaiveDate,
    scan_time: NaiveTime,
) -> Result<Vec<ScanSummary>, LedgerError> {
    let dates = feed.trading_dates(start, end);
    info!("Replaying {} trading days ({} to {})", dates.len(), start, end);

    dates
        .into_iter()
        .map(|date| run_scan_cycle(trader, feed, date.and_time(scan_time)))
        .collect()
}
