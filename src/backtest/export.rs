//! Backtest output files: JSON report, trade CSV and equity CSV.

use std::path::{Path, PathBuf};

use anyhow::{Context, Result};

use super::engine::EquityPoint;
use super::report::BacktestReport;
use super::trade::StrangleTrade;

/// Serialize a report as pretty JSON.
pub fn export_json(report: &BacktestReport) -> Result<String> {
    serde_json::to_string_pretty(report).context("failed to serialize BacktestReport to JSON")
}

/// Read a report written by [`export_json`].
pub fn import_json(json: &str) -> Result<BacktestReport> {
    serde_json::from_str(json).context("failed to deserialize BacktestReport from JSON")
}

/// One row per traded cycle, both legs side by side.
pub fn export_trades_csv(trades: &[StrangleTrade]) -> Result<String> {
    let mut wtr = csv::Writer::from_writer(vec![]);

    wtr.write_record([
        "symbol",
        "entry_date",
        "exit_date",
        "expiry",
        "entry_spot",
        "exit_spot",
        "put_strike",
        "put_entry",
        "put_exit",
        "put_pnl",
        "call_strike",
        "call_entry",
        "call_exit",
        "call_pnl",
        "total_pnl",
        "exit_reason",
    ])?;

    for t in trades {
        wtr.write_record([
            &t.symbol,
            &t.entry_date.to_string(),
            &t.exit_date.to_string(),
            &t.expiry.to_string(),
            &format!("{:.2}", t.entry_spot),
            &format!("{:.2}", t.exit_spot),
            &format!("{:.0}", t.put.strike),
            &t.put.entry_premium.to_string(),
            &t.put.exit_premium.to_string(),
            &t.put.pnl.to_string(),
            &format!("{:.0}", t.call.strike),
            &t.call.entry_premium.to_string(),
            &t.call.exit_premium.to_string(),
            &t.call.pnl.to_string(),
            &t.total_pnl.to_string(),
            &t.exit_reason.to_string(),
        ])?;
    }

    let data = wtr.into_inner().context("failed to flush CSV writer")?;
    String::from_utf8(data).context("CSV output is not valid UTF-8")
}

/// Equity curve with date, capital and cycle P&L columns.
pub fn export_equity_csv(equity_curve: &[EquityPoint]) -> Result<String> {
    let mut wtr = csv::Writer::from_writer(vec![]);
    wtr.write_record(["date", "capital", "pnl"])?;
    for point in equity_curve {
        wtr.write_record([
            &point.date.to_string(),
            &point.capital.to_string(),
            &point.pnl.to_string(),
        ])?;
    }
    let data = wtr.into_inner().context("failed to flush CSV writer")?;
    String::from_utf8(data).context("CSV output is not valid UTF-8")
}

/// Write `report.json`, `trades.csv` and `equity.csv` into
/// `{output_dir}/{symbol}_{start}_{end}/` and return that directory.
pub fn save_artifacts(report: &BacktestReport, output_dir: &Path) -> Result<PathBuf> {
    let dirname = format!(
        "{}_{}_{}",
        report.symbol,
        report.start_date.format("%Y%m%d"),
        report.end_date.format("%Y%m%d")
    );
    let run_dir = output_dir.join(dirname);
    std::fs::create_dir_all(&run_dir)
        .with_context(|| format!("failed to create output dir: {}", run_dir.display()))?;

    std::fs::write(run_dir.join("report.json"), export_json(report)?)?;
    std::fs::write(run_dir.join("trades.csv"), export_trades_csv(&report.trades)?)?;
    std::fs::write(run_dir.join("equity.csv"), export_equity_csv(&report.equity_curve)?)?;

    Ok(run_dir)
}
