//! CSV price history adapter.
//!
//! Reads one flat file with a header row naming `Date`, `Ticker`, `Open`,
//! `High`, `Low`, `Close` and `Volume` in any order and any letter case.
//! Extra columns are ignored.

use crate::domain::error::EngineError;
use crate::domain::price::{PricePoint, sort_prices};
use crate::ports::data_port::DataPort;
use chrono::{NaiveDate, NaiveDateTime};
use std::fs;
use std::path::PathBuf;

const REQUIRED_COLUMNS: [&str; 7] = ["date", "ticker", "open", "high", "low", "close", "volume"];

pub struct CsvAdapter {
    path: PathBuf,
}

/// Positions of the required columns within a record.
struct ColumnMap {
    date: usize,
    ticker: usize,
    open: usize,
    high: usize,
    low: usize,
    close: usize,
    volume: usize,
}

impl ColumnMap {
    fn from_headers(headers: &csv::StringRecord) -> Result<Self, EngineError> {
        let find = |name: &str| {
            headers
                .iter()
                .position(|h| h.trim().eq_ignore_ascii_case(name))
                .ok_or_else(|| EngineError::MissingColumn {
                    column: name.to_string(),
                })
        };
        let [date, ticker, open, high, low, close, volume] = REQUIRED_COLUMNS;
        Ok(Self {
            date: find(date)?,
            ticker: find(ticker)?,
            open: find(open)?,
            high: find(high)?,
            low: find(low)?,
            close: find(close)?,
            volume: find(volume)?,
        })
    }
}

impl CsvAdapter {
    pub fn new(path: PathBuf) -> Self {
        Self { path }
    }

    fn parse_date(value: &str) -> Option<NaiveDate> {
        let value = value.trim();
        NaiveDate::parse_from_str(value, "%Y-%m-%d")
            .ok()
            .or_else(|| {
                NaiveDateTime::parse_from_str(value, "%Y-%m-%d %H:%M:%S")
                    .ok()
                    .map(|dt| dt.date())
            })
            .or_else(|| {
                NaiveDateTime::parse_from_str(value, "%Y-%m-%dT%H:%M:%S")
                    .ok()
                    .map(|dt| dt.date())
            })
    }

    fn parse_record(
        record: &csv::StringRecord,
        columns: &ColumnMap,
    ) -> Result<PricePoint, EngineError> {
        let line = record.position().map(|p| p.line()).unwrap_or(0);
        let field = |idx: usize, name: &str| {
            record.get(idx).ok_or_else(|| EngineError::InvalidRecord {
                line,
                reason: format!("missing {} value", name),
            })
        };
        let number = |idx: usize, name: &str| -> Result<f64, EngineError> {
            let raw = field(idx, name)?;
            raw.trim().parse().map_err(|_| EngineError::InvalidRecord {
                line,
                reason: format!("invalid {} value '{}'", name, raw),
            })
        };

        let raw_date = field(columns.date, "date")?;
        let date = Self::parse_date(raw_date).ok_or_else(|| EngineError::InvalidRecord {
            line,
            reason: format!("invalid date '{}', expected YYYY-MM-DD", raw_date),
        })?;

        let ticker = field(columns.ticker, "ticker")?.trim();
        if ticker.is_empty() {
            return Err(EngineError::InvalidRecord {
                line,
                reason: "empty ticker".into(),
            });
        }

        Ok(PricePoint {
            date,
            ticker: ticker.to_string(),
            open: number(columns.open, "open")?,
            high: number(columns.high, "high")?,
            low: number(columns.low, "low")?,
            close: number(columns.close, "close")?,
            volume: number(columns.volume, "volume")?,
        })
    }
}

impl DataPort for CsvAdapter {
    fn load_prices(&self) -> Result<Vec<PricePoint>, EngineError> {
        let content = fs::read_to_string(&self.path)?;

        let mut rdr = csv::Reader::from_reader(content.as_bytes());
        let columns = ColumnMap::from_headers(rdr.headers()?)?;

        let mut prices = Vec::new();
        for result in rdr.records() {
            let record = result?;
            prices.push(Self::parse_record(&record, &columns)?);
        }

        sort_prices(&mut prices);
        tracing::debug!(path = %self.path.display(), rows = prices.len(), "price history loaded");
        Ok(prices)
    }
}
