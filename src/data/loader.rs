//! Data loader for daily close CSV files.
//!
//! Expects one file per symbol at `{data_dir}/{symbol}.csv` with at least a
//! `date` and `close` column (Yahoo-style `Date`/`Close` headers are
//! accepted). Timestamps are truncated to their date part; rows whose close
//! is missing or unparseable are skipped.

use std::io::Read;
use std::path::{Path, PathBuf};

use chrono::NaiveDate;
use serde::Deserialize;
use thiserror::Error;
use tracing::{debug, info};

use super::history::{PriceHistory, DEFAULT_VOLATILITY_WINDOW, FALLBACK_VOLATILITY};

#[derive(Error, Debug)]
pub enum LoaderError {
    #[error("File not found: {0}")]
    FileNotFound(String),

    #[error("CSV error: {0}")]
    Csv(#[from] csv::Error),

    #[error("Invalid data: {0}")]
    InvalidData(String),

    #[error("IO error: {0}")]
    Io(#[from] std::io::Error),
}

#[derive(Debug, Deserialize)]
struct CloseRecord {
    #[serde(alias = "Date")]
    date: String,
    #[serde(alias = "Close")]
    close: String,
}

/// CSV loader for daily close histories.
pub struct HistoryLoader {
    data_dir: PathBuf,
    volatility_window: usize,
    fallback_volatility: f64,
}

impl HistoryLoader {
    /// Create a new loader pointing to a directory of `{symbol}.csv` files.
    pub fn new(data_dir: impl AsRef<Path>) -> Self {
        Self {
            data_dir: data_dir.as_ref().to_path_buf(),
            volatility_window: DEFAULT_VOLATILITY_WINDOW,
            fallback_volatility: FALLBACK_VOLATILITY,
        }
    }

    pub fn with_volatility(mut self, window: usize, fallback: f64) -> Self {
        self.volatility_window = window;
        self.fallback_volatility = fallback;
        self
    }

    /// Path of the CSV file for a symbol (`^` is dropped from index tickers).
    pub fn csv_path(&self, symbol: &str) -> PathBuf {
        let file_stem = symbol.trim_start_matches('^');
        self.data_dir.join(format!("{}.csv", file_stem))
    }

    /// Load the full history for a symbol.
    pub fn load(&self, symbol: &str) -> Result<PriceHistory, LoaderError> {
        let path = self.csv_path(symbol);
        if !path.exists() {
            return Err(LoaderError::FileNotFound(path.display().to_string()));
        }

        let file = std::fs::File::open(&path)?;
        let closes = Self::read_closes(file)?;
        if closes.is_empty() {
            return Err(LoaderError::InvalidData(format!(
                "{} contains no usable rows",
                path.display()
            )));
        }

        info!("Loaded {} days of {} data from {}", closes.len(), symbol, path.display());

        Ok(PriceHistory::from_closes(
            symbol,
            &closes,
            self.volatility_window,
            self.fallback_volatility,
        ))
    }

    /// Parse `date,close` rows from any reader.
    pub fn read_closes<R: Read>(reader: R) -> Result<Vec<(NaiveDate, f64)>, LoaderError> {
        let mut rdr = csv::ReaderBuilder::new()
            .trim(csv::Trim::All)
            .from_reader(reader);

        let mut closes = Vec::new();
        for record in rdr.deserialize::<CloseRecord>() {
            let record = record?;
            let date_part = record.date.get(..10).unwrap_or(&record.date);
            let date = NaiveDate::parse_from_str(date_part, "%Y-%m-%d").map_err(|e| {
                LoaderError::InvalidData(format!("bad date '{}': {}", record.date, e))
            })?;

            match record.close.parse::<f64>() {
                Ok(close) if close.is_finite() && close > 0.0 => closes.push((date, close)),
                _ => debug!("Skipping {} with close '{}'", date, record.close),
            }
        }

        Ok(closes)
    }
}
