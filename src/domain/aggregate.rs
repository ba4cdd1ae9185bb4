//! Multi-asset aggregation.
//!
//! Flattens per-ticker portfolio series into one table and derives a
//! cross-asset total series by summing the rows present on each date.
//! Tickers without a row on a date contribute nothing; there is no
//! forward fill.
//!
//! The total `return_pct` is the plain sum of per-ticker percentages, not a
//! capital-weighted return. Use [`crate::domain::metrics::summarize`] for a
//! weighted figure.

use chrono::NaiveDate;
use std::collections::BTreeMap;

use super::portfolio::PortfolioState;

#[derive(Debug, Clone, PartialEq)]
pub struct TotalPoint {
    pub date: NaiveDate,
    pub pnl: f64,
    pub total_invested: f64,
    pub portfolio_value: f64,
    pub return_pct: f64,
    /// Number of tickers with a row on this date.
    pub tickers: usize,
}

impl TotalPoint {
    fn empty(date: NaiveDate) -> Self {
        TotalPoint {
            date,
            pnl: 0.0,
            total_invested: 0.0,
            portfolio_value: 0.0,
            return_pct: 0.0,
            tickers: 0,
        }
    }

    fn add(&mut self, state: &PortfolioState) {
        self.pnl += state.pnl;
        self.total_invested += state.total_invested;
        self.portfolio_value += state.portfolio_value;
        // undefined percentages are skipped
        self.return_pct += state.return_pct.unwrap_or(0.0);
        self.tickers += 1;
    }
}

#[derive(Debug, Clone, PartialEq, Default)]
pub struct MultiAssetResult {
    /// Every ticker's rows, sorted by (ticker, date).
    pub rows: Vec<PortfolioState>,
    /// One point per distinct date, ascending.
    pub total: Vec<TotalPoint>,
}

pub fn aggregate(per_ticker: Vec<Vec<PortfolioState>>) -> MultiAssetResult {
    let mut rows: Vec<PortfolioState> = per_ticker.into_iter().flatten().collect();
    rows.sort_by(|a, b| a.ticker.cmp(&b.ticker).then(a.date.cmp(&b.date)));

    let mut by_date: BTreeMap<NaiveDate, TotalPoint> = BTreeMap::new();
    for state in &rows {
        by_date
            .entry(state.date)
            .or_insert_with(|| TotalPoint::empty(state.date))
            .add(state);
    }

    MultiAssetResult {
        rows,
        total: by_date.into_values().collect(),
    }
}
