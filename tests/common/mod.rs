#![allow(dead_code)]

use chrono::NaiveDate;
use stratbench::domain::error::EngineError;
pub use stratbench::domain::price::PricePoint;
use stratbench::ports::data_port::DataPort;
use std::cell::Cell;

pub struct MockDataPort {
    pub prices: Vec<PricePoint>,
    pub error: Option<String>,
    pub loads: Cell<usize>,
}

impl MockDataPort {
    pub fn new() -> Self {
        Self {
            prices: Vec::new(),
            error: None,
            loads: Cell::new(0),
        }
    }

    pub fn with_prices(mut self, prices: Vec<PricePoint>) -> Self {
        self.prices.extend(prices);
        self
    }

    pub fn with_error(mut self, reason: &str) -> Self {
        self.error = Some(reason.to_string());
        self
    }
}

impl DataPort for MockDataPort {
    fn load_prices(&self) -> Result<Vec<PricePoint>, EngineError> {
        self.loads.set(self.loads.get() + 1);
        if let Some(reason) = &self.error {
            return Err(EngineError::InvalidRecord {
                line: 0,
                reason: reason.clone(),
            });
        }
        Ok(self.prices.clone())
    }
}

pub fn date(y: i32, m: u32, d: u32) -> NaiveDate {
    NaiveDate::from_ymd_opt(y, m, d).unwrap()
}

pub fn make_point(ticker: &str, date: &str, close: f64) -> PricePoint {
    PricePoint {
        date: NaiveDate::parse_from_str(date, "%Y-%m-%d").unwrap(),
        ticker: ticker.to_string(),
        open: close - 1.0,
        high: close + 1.0,
        low: close - 2.0,
        close,
        volume: 1000.0,
    }
}

/// Daily series starting at `start_date` with the given closes.
pub fn series(ticker: &str, start_date: &str, closes: &[f64]) -> Vec<PricePoint> {
    let start = NaiveDate::parse_from_str(start_date, "%Y-%m-%d").unwrap();
    closes
        .iter()
        .enumerate()
        .map(|(i, &close)| PricePoint {
            date: start + chrono::Duration::days(i as i64),
            ticker: ticker.to_string(),
            open: close,
            high: close + 1.0,
            low: close - 1.0,
            close,
            volume: 1000.0,
        })
        .collect()
}

/// Linear trend of `count` daily closes.
pub fn generate_points(
    ticker: &str,
    start_date: &str,
    count: usize,
    start_price: f64,
    step: f64,
) -> Vec<PricePoint> {
    let closes: Vec<f64> = (0..count).map(|i| start_price + step * i as f64).collect();
    series(ticker, start_date, &closes)
}

/// Deterministic oscillating series that triggers both RSI and SMA signals.
pub fn oscillating(ticker: &str, start_date: &str, count: usize, base: f64) -> Vec<PricePoint> {
    let closes: Vec<f64> = (0..count)
        .map(|i| {
            let phase = (i % 20) as f64;
            let swing = if phase < 10.0 { phase } else { 20.0 - phase };
            base + swing * 2.0 + (i / 20) as f64
        })
        .collect();
    series(ticker, start_date, &closes)
}

pub const PRICE_CSV_HEADER: &str = "Date,Ticker,Open,High,Low,Close,Volume\n";

pub fn to_csv(points: &[PricePoint]) -> String {
    let mut out = String::from(PRICE_CSV_HEADER);
    for p in points {
        out.push_str(&format!(
            "{},{},{},{},{},{},{}\n",
            p.date, p.ticker, p.open, p.high, p.low, p.close, p.volume
        ));
    }
    out
}
