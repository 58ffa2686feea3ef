//! SQLite-backed trade ledger.
//!
//! Trades live in a single `fno_trades` table. Every mutation is one INSERT
//! or UPDATE statement, so a crash never leaves a half-written ledger.
//! Money columns are stored as decimal text to keep `Decimal` exact.

use std::path::{Path, PathBuf};

use chrono::{Days, NaiveDate, NaiveDateTime, NaiveTime};
use rusqlite::types::{ToSql, Type};
use rusqlite::{params, params_from_iter, Connection, OptionalExtension, Row};
use rust_decimal::Decimal;
use tracing::{debug, info};

use super::ledger::{LedgerError, TradeFilter, TradeLedger};
use super::trade::{ExitReason, Trade, TradeId, TradeParams, TradeStatus};
use crate::data::OptionType;

const SCHEMA: &str = "
CREATE TABLE IF NOT EXISTS fno_trades (
    id INTEGER PRIMARY KEY AUTOINCREMENT,
    symbol TEXT NOT NULL,
    option_type TEXT NOT NULL,
    strike TEXT NOT NULL,
    entry_premium TEXT NOT NULL,
    exit_premium TEXT,
    lot_size INTEGER NOT NULL,
    entry_time TEXT NOT NULL,
    exit_time TEXT,
    pnl TEXT,
    status TEXT NOT NULL,
    exit_reason TEXT,
    strategy TEXT,
    expiry TEXT
);
CREATE INDEX IF NOT EXISTS idx_fno_trades_status ON fno_trades (status);
";

const COLUMNS: &str = "id, symbol, option_type, strike, entry_premium, exit_premium, lot_size, \
                       entry_time, exit_time, pnl, status, exit_reason, strategy, expiry";

/// Ledger persisted in a SQLite database file.
#[derive(Debug)]
pub struct SqliteLedger {
    path: PathBuf,
    conn: Connection,
}

impl SqliteLedger {
    /// Open the ledger at `path`, creating the database and table if absent.
    pub fn open(path: impl AsRef<Path>) -> Result<Self, LedgerError> {
        let path = path.as_ref().to_path_buf();
        if let Some(parent) = path.parent().filter(|p| !p.as_os_str().is_empty()) {
            std::fs::create_dir_all(parent)?;
        }

        let conn = Connection::open(&path)?;
        conn.execute_batch(SCHEMA)?;

        let count: i64 = conn.query_row("SELECT COUNT(*) FROM fno_trades", [], |row| row.get(0))?;
        info!("Opened ledger {} with {} trades", path.display(), count);

        Ok(Self { path, conn })
    }

    /// Ledger in a private in-memory database.
    pub fn in_memory() -> Result<Self, LedgerError> {
        let conn = Connection::open_in_memory()?;
        conn.execute_batch(SCHEMA)?;
        Ok(Self {
            path: PathBuf::from(":memory:"),
            conn,
        })
    }

    pub fn path(&self) -> &Path {
        &self.path
    }
}

impl TradeLedger for SqliteLedger {
    fn insert(&mut self, params: TradeParams, entry_time: NaiveDateTime) -> Result<Trade, LedgerError> {
        self.conn.execute(
            "INSERT INTO fno_trades
                (symbol, option_type, strike, entry_premium, lot_size, entry_time, status, strategy, expiry)
             VALUES (?1, ?2, ?3, ?4, ?5, ?6, ?7, ?8, ?9)",
            params![
                params.symbol,
                params.option_type.as_str(),
                params.strike.to_string(),
                params.entry_premium.to_string(),
                params.lot_size,
                entry_time,
                TradeStatus::Open.to_string(),
                params.strategy,
                params.expiry,
            ],
        )?;

        let id = self.conn.last_insert_rowid() as TradeId;
        debug!("Inserted trade {} ({} {} {})", id, params.symbol, params.strike, params.option_type);
        Ok(Trade::open(id, params, entry_time))
    }

    fn get(&self, id: TradeId) -> Result<Option<Trade>, LedgerError> {
        let sql = format!("SELECT {} FROM fno_trades WHERE id = ?1", COLUMNS);
        let trade = self
            .conn
            .query_row(&sql, params![id], read_trade)
            .optional()?;
        Ok(trade)
    }

    fn update(&mut self, trade: &Trade) -> Result<(), LedgerError> {
        let exit_reason = trade
            .exit_reason
            .map(|r| serde_json::to_string(&r))
            .transpose()
            .map_err(|e| LedgerError::Corrupt {
                id: trade.id,
                message: e.to_string(),
            })?;

        let changed = self.conn.execute(
            "UPDATE fno_trades SET
                symbol = ?2, option_type = ?3, strike = ?4, entry_premium = ?5, exit_premium = ?6,
                lot_size = ?7, entry_time = ?8, exit_time = ?9, pnl = ?10, status = ?11,
                exit_reason = ?12, strategy = ?13, expiry = ?14
             WHERE id = ?1",
            params![
                trade.id,
                trade.symbol,
                trade.option_type.as_str(),
                trade.strike.to_string(),
                trade.entry_premium.to_string(),
                trade.exit_premium.map(|d| d.to_string()),
                trade.lot_size,
                trade.entry_time,
                trade.exit_time,
                trade.pnl.map(|d| d.to_string()),
                trade.status.to_string(),
                exit_reason,
                trade.strategy,
                trade.expiry,
            ],
        )?;

        if changed == 0 {
            return Err(LedgerError::NotFound(trade.id));
        }
        Ok(())
    }

    fn query(&self, filter: &TradeFilter) -> Result<Vec<Trade>, LedgerError> {
        let mut sql = format!("SELECT {} FROM fno_trades WHERE 1 = 1", COLUMNS);
        let mut args: Vec<Box<dyn ToSql>> = Vec::new();

        if let Some(status) = filter.status {
            sql.push_str(" AND status = ?");
            args.push(Box::new(status.to_string()));
        }
        if let Some(symbol) = &filter.symbol {
            sql.push_str(" AND symbol = ?");
            args.push(Box::new(symbol.clone()));
        }
        if let Some(from) = filter.from {
            sql.push_str(" AND entry_time >= ?");
            args.push(Box::new(start_of(from)));
        }
        if let Some(to) = filter.to {
            // Entry times are compared as text, so bound by the next midnight
            let end = to.checked_add_days(Days::new(1)).unwrap_or(to);
            sql.push_str(" AND entry_time < ?");
            args.push(Box::new(start_of(end)));
        }
        sql.push_str(" ORDER BY id");

        let mut stmt = self.conn.prepare(&sql)?;
        let trades = stmt
            .query_map(params_from_iter(args.iter()), read_trade)?
            .collect::<Result<Vec<_>, _>>()?;
        Ok(trades)
    }
}

fn start_of(date: NaiveDate) -> NaiveDateTime {
    date.and_time(NaiveTime::MIN)
}

fn read_trade(row: &Row<'_>) -> rusqlite::Result<Trade> {
    Ok(Trade {
        id: row.get(0)?,
        symbol: row.get(1)?,
        option_type: parse_column(row, 2, OptionType::from_str)?,
        strike: parse_column(row, 3, parse_decimal)?,
        entry_premium: parse_column(row, 4, parse_decimal)?,
        exit_premium: parse_optional(row, 5, parse_decimal)?,
        lot_size: row.get(6)?,
        entry_time: row.get(7)?,
        exit_time: row.get(8)?,
        pnl: parse_optional(row, 9, parse_decimal)?,
        status: parse_column(row, 10, parse_status)?,
        exit_reason: parse_optional(row, 11, |s| serde_json::from_str::<ExitReason>(s).ok())?,
        strategy: row.get::<_, Option<String>>(12)?.unwrap_or_default(),
        expiry: row.get(13)?,
    })
}

fn parse_decimal(s: &str) -> Option<Decimal> {
    s.parse().ok()
}

fn parse_status(s: &str) -> Option<TradeStatus> {
    match s {
        "OPEN" => Some(TradeStatus::Open),
        "CLOSED" => Some(TradeStatus::Closed),
        _ => None,
    }
}

fn parse_column<T>(row: &Row<'_>, idx: usize, parse: impl FnOnce(&str) -> Option<T>) -> rusqlite::Result<T> {
    let raw: String = row.get(idx)?;
    parse(&raw).ok_or_else(|| invalid_text(idx, &raw))
}

fn parse_optional<T>(
    row: &Row<'_>,
    idx: usize,
    parse: impl FnOnce(&str) -> Option<T>,
) -> rusqlite::Result<Option<T>> {
    match row.get::<_, Option<String>>(idx)? {
        Some(raw) => parse(&raw).map(Some).ok_or_else(|| invalid_text(idx, &raw)),
        None => Ok(None),
    }
}

fn invalid_text(idx: usize, raw: &str) -> rusqlite::Error {
    rusqlite::Error::FromSqlConversionFailure(idx, Type::Text, format!("invalid value '{}'", raw).into())
}
