//! Dollar-cost averaging.
//!
//! Not signal based: the price series is bucketed into periods and a fixed
//! currency amount is spent at the first available close of every period.

use chrono::{Datelike, Days, NaiveDate, Weekday};
use std::fmt;
use std::str::FromStr;

use crate::domain::error::EngineError;
use crate::domain::position::TradeRecord;
use crate::domain::price::PricePoint;

/// Resampling period for scheduled purchases.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Frequency {
    Daily,
    /// Weeks ending on the given weekday (`W` ends on Sunday).
    Weekly(Weekday),
    Monthly,
    Quarterly,
    Yearly,
}

impl Frequency {
    /// Identify the period a date falls in. Dates sharing a key share a bucket.
    pub fn bucket(self, date: NaiveDate) -> (i32, u32) {
        match self {
            Frequency::Daily => (date.year(), date.ordinal()),
            Frequency::Weekly(end) => {
                let ahead = (end.num_days_from_monday() + 7
                    - date.weekday().num_days_from_monday())
                    % 7;
                let week_end = date + Days::new(u64::from(ahead));
                (week_end.year(), week_end.ordinal())
            }
            Frequency::Monthly => (date.year(), date.month()),
            Frequency::Quarterly => (date.year(), (date.month() - 1) / 3),
            Frequency::Yearly => (date.year(), 0),
        }
    }
}

impl Default for Frequency {
    fn default() -> Self {
        Frequency::Weekly(Weekday::Sun)
    }
}

impl FromStr for Frequency {
    type Err = String;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        let upper = s.trim().to_uppercase();
        match upper.as_str() {
            "D" => Ok(Frequency::Daily),
            "W" => Ok(Frequency::Weekly(Weekday::Sun)),
            "M" | "MS" | "ME" => Ok(Frequency::Monthly),
            "Q" | "QS" | "QE" => Ok(Frequency::Quarterly),
            "Y" | "YS" | "YE" | "A" | "AS" => Ok(Frequency::Yearly),
            other => match other.strip_prefix("W-") {
                Some(day) => parse_weekday(day)
                    .map(Frequency::Weekly)
                    .ok_or_else(|| format!("unknown weekday anchor '{}'", day)),
                None => Err(format!("unknown frequency '{}'", s.trim())),
            },
        }
    }
}

fn parse_weekday(day: &str) -> Option<Weekday> {
    let weekday = match day {
        "MON" => Weekday::Mon,
        "TUE" => Weekday::Tue,
        "WED" => Weekday::Wed,
        "THU" => Weekday::Thu,
        "FRI" => Weekday::Fri,
        "SAT" => Weekday::Sat,
        "SUN" => Weekday::Sun,
        _ => return None,
    };
    Some(weekday)
}

impl fmt::Display for Frequency {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Frequency::Daily => write!(f, "D"),
            Frequency::Weekly(Weekday::Sun) => write!(f, "W"),
            Frequency::Weekly(day) => write!(f, "W-{}", day.to_string().to_uppercase()),
            Frequency::Monthly => write!(f, "M"),
            Frequency::Quarterly => write!(f, "Q"),
            Frequency::Yearly => write!(f, "Y"),
        }
    }
}

#[derive(Debug, Clone, PartialEq)]
pub struct DcaConfig {
    pub amount_per_asset: f64,
    pub frequency: Frequency,
    pub assets: Option<Vec<String>>,
}

impl Default for DcaConfig {
    fn default() -> Self {
        DcaConfig {
            amount_per_asset: 100.0,
            frequency: Frequency::default(),
            assets: None,
        }
    }
}

impl DcaConfig {
    pub fn validate(&self, section: &str) -> Result<(), EngineError> {
        if !(self.amount_per_asset.is_finite() && self.amount_per_asset > 0.0) {
            return Err(EngineError::invalid(
                section,
                "amount_per_asset",
                "amount_per_asset must be positive",
            ));
        }
        Ok(())
    }

    /// One trade per period at the first observation of the period, sized
    /// `amount_per_asset / close`. Every other date carries zero units.
    ///
    /// `prices` must be sorted by date.
    pub fn trades(&self, ticker: &str, prices: &[PricePoint]) -> Vec<TradeRecord> {
        let mut current: Option<(i32, u32)> = None;
        prices
            .iter()
            .map(|p| {
                let bucket = self.frequency.bucket(p.date);
                let first_in_bucket = current != Some(bucket);
                current = Some(bucket);

                let trade_units = if !first_in_bucket {
                    0.0
                } else if p.close > 0.0 {
                    self.amount_per_asset / p.close
                } else {
                    tracing::warn!(ticker, date = %p.date, close = p.close, "skipping purchase at non-positive close");
                    0.0
                };

                TradeRecord {
                    date: p.date,
                    ticker: ticker.to_string(),
                    trade_units,
                }
            })
            .collect()
    }
}
