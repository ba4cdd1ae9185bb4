//! Price history representation.
//!
//! A price history is a flat table of [`PricePoint`] rows keyed by
//! (ticker, date). Strategies consume it one ticker at a time, in date order.

use crate::domain::error::EngineError;
use chrono::NaiveDate;
use std::collections::BTreeMap;

#[derive(Debug, Clone, PartialEq)]
pub struct PricePoint {
    pub date: NaiveDate,
    pub ticker: String,
    pub open: f64,
    pub high: f64,
    pub low: f64,
    pub close: f64,
    pub volume: f64,
}

/// Stable sort by (ticker, date).
pub fn sort_prices(points: &mut [PricePoint]) {
    points.sort_by(|a, b| a.ticker.cmp(&b.ticker).then(a.date.cmp(&b.date)));
}

/// Split a flat history into per-ticker series, each sorted by date.
///
/// Fails on a repeated (ticker, date) pair.
pub fn group_by_ticker(
    points: &[PricePoint],
) -> Result<BTreeMap<String, Vec<PricePoint>>, EngineError> {
    let mut groups: BTreeMap<String, Vec<PricePoint>> = BTreeMap::new();
    for point in points {
        groups
            .entry(point.ticker.clone())
            .or_default()
            .push(point.clone());
    }

    for (ticker, series) in groups.iter_mut() {
        series.sort_by_key(|p| p.date);
        if let Some(w) = series.windows(2).find(|w| w[0].date == w[1].date) {
            return Err(EngineError::DuplicateDate {
                ticker: ticker.clone(),
                date: w[0].date,
            });
        }
    }

    Ok(groups)
}

/// Keep rows whose date falls inside the inclusive window.
pub fn filter_dates(
    points: Vec<PricePoint>,
    start: Option<NaiveDate>,
    end: Option<NaiveDate>,
) -> Vec<PricePoint> {
    points
        .into_iter()
        .filter(|p| start.is_none_or(|s| p.date >= s) && end.is_none_or(|e| p.date <= e))
        .collect()
}
