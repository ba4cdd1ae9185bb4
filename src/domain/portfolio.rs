//! Per-ticker portfolio accumulation.
//!
//! Folds a ticker's trade units over its price series into a running
//! [`PortfolioState`] row per date.
//!
//! A sell reduces `total_invested` by the sale proceeds at the current
//! close, not by the cost basis of the units sold.

use chrono::NaiveDate;
use std::collections::HashMap;

use super::error::EngineError;
use super::position::TradeRecord;
use super::price::PricePoint;

/// What `return_pct` and `avg_cost` report when their denominator is <= 0.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum SentinelPolicy {
    /// Report 0.
    Zero,
    /// Report no value.
    Undefined,
}

impl SentinelPolicy {
    /// `numerator / denominator * scale`, or the sentinel when `denominator <= 0`.
    pub fn ratio(self, numerator: f64, denominator: f64, scale: f64) -> Option<f64> {
        if denominator > 0.0 {
            Some(numerator / denominator * scale)
        } else {
            match self {
                SentinelPolicy::Zero => Some(0.0),
                SentinelPolicy::Undefined => None,
            }
        }
    }
}

#[derive(Debug, Clone, PartialEq)]
pub struct PortfolioState {
    pub date: NaiveDate,
    pub ticker: String,
    pub close: f64,
    pub trade_units: f64,
    pub buy_amount: f64,
    pub cumulative_units: f64,
    pub total_invested: f64,
    pub portfolio_value: f64,
    pub pnl: f64,
    pub return_pct: Option<f64>,
    pub avg_cost: Option<f64>,
}

/// Running totals carried through the fold.
#[derive(Debug, Clone, Copy, Default)]
pub struct Accumulator {
    pub cumulative_units: f64,
    pub total_invested: f64,
}

impl Accumulator {
    pub fn step(
        &mut self,
        ticker: &str,
        date: NaiveDate,
        close: f64,
        trade_units: f64,
        sentinel: SentinelPolicy,
    ) -> PortfolioState {
        let buy_amount = close * trade_units;
        self.cumulative_units += trade_units;
        self.total_invested += buy_amount;

        let portfolio_value = self.cumulative_units * close;
        let pnl = portfolio_value - self.total_invested;

        PortfolioState {
            date,
            ticker: ticker.to_string(),
            close,
            trade_units,
            buy_amount,
            cumulative_units: self.cumulative_units,
            total_invested: self.total_invested,
            portfolio_value,
            pnl,
            return_pct: sentinel.ratio(pnl, self.total_invested, 100.0),
            avg_cost: sentinel.ratio(self.total_invested, self.cumulative_units, 1.0),
        }
    }
}

/// Accumulate one ticker's trades against its price series.
///
/// Prices are processed in date order (sorted stably if needed). Dates with
/// no trade record contribute zero units; a trade on a date with no price
/// is an error.
pub fn accumulate(
    ticker: &str,
    trades: &[TradeRecord],
    prices: &[PricePoint],
    sentinel: SentinelPolicy,
) -> Result<Vec<PortfolioState>, EngineError> {
    let mut units_by_date: HashMap<NaiveDate, f64> = HashMap::with_capacity(trades.len());
    for trade in trades {
        *units_by_date.entry(trade.date).or_insert(0.0) += trade.trade_units;
    }

    let mut ordered: Vec<&PricePoint> = prices.iter().collect();
    ordered.sort_by_key(|p| p.date);

    let mut acc = Accumulator::default();
    let mut states = Vec::with_capacity(ordered.len());
    for price in ordered {
        let units = units_by_date.remove(&price.date).unwrap_or(0.0);
        states.push(acc.step(ticker, price.date, price.close, units, sentinel));
    }

    if let Some(date) = units_by_date.keys().min() {
        return Err(EngineError::UnpricedTrade {
            ticker: ticker.to_string(),
            date: *date,
        });
    }

    Ok(states)
}
