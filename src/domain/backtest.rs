//! Backtest pipeline: signals, position resolution, accumulation and
//! aggregation for one strategy over a multi-asset price history.
//!
//! [`BacktestConfig`] carries the run-level settings read from the
//! `[backtest]` configuration section.

use chrono::NaiveDate;
use std::path::PathBuf;
use tracing::{debug, info};

use super::aggregate::{MultiAssetResult, TotalPoint, aggregate};
use super::compare::RankingMetric;
use super::error::{EngineError, Stage};
use super::portfolio::{PortfolioState, SentinelPolicy, accumulate};
use super::price::PricePoint;
use super::runner::{BacktestRunner, RunnerKind};
use super::strategy::Strategy;
use super::universe::select_universe;

#[derive(Debug, Clone, PartialEq)]
pub struct BacktestConfig {
    pub data_path: PathBuf,
    pub start_date: Option<NaiveDate>,
    pub end_date: Option<NaiveDate>,
    /// Default allow-list for strategies without their own.
    pub assets: Option<Vec<String>>,
    pub metric: RankingMetric,
    pub runner: RunnerKind,
    /// Strategy section names, in comparison order.
    pub strategies: Vec<String>,
}

#[derive(Debug, Clone, PartialEq)]
pub struct BacktestResult {
    pub strategy: String,
    pub sentinel: SentinelPolicy,
    /// Per-ticker rows, sorted by (ticker, date).
    pub rows: Vec<PortfolioState>,
    /// Cross-asset totals, one per date.
    pub total: Vec<TotalPoint>,
}

impl BacktestResult {
    /// Distinct tickers in row order.
    pub fn tickers(&self) -> Vec<&str> {
        let mut tickers: Vec<&str> = self.rows.iter().map(|r| r.ticker.as_str()).collect();
        tickers.dedup();
        tickers
    }

    /// Rows of one ticker. Relies on `rows` being sorted by (ticker, date).
    pub fn rows_for(&self, ticker: &str) -> &[PortfolioState] {
        let start = self.rows.partition_point(|r| r.ticker.as_str() < ticker);
        let len = self.rows[start..].partition_point(|r| r.ticker == ticker);
        &self.rows[start..start + len]
    }

    /// Last row of every ticker, in ticker order.
    pub fn final_states(&self) -> Vec<&PortfolioState> {
        self.rows
            .iter()
            .enumerate()
            .filter(|(i, row)| {
                self.rows
                    .get(i + 1)
                    .is_none_or(|next| next.ticker != row.ticker)
            })
            .map(|(_, row)| row)
            .collect()
    }

    pub fn final_state(&self, ticker: &str) -> Option<&PortfolioState> {
        self.rows_for(ticker).last()
    }
}

/// Pipeline for one ticker's date-sorted series.
pub fn run_ticker(
    strategy: &Strategy,
    ticker: &str,
    prices: &[PricePoint],
) -> Result<Vec<PortfolioState>, EngineError> {
    if let Some(bad) = prices.iter().find(|p| !p.close.is_finite()) {
        let err = EngineError::NonFiniteClose {
            ticker: ticker.to_string(),
            date: bad.date,
            close: bad.close,
        };
        return Err(err.at(Stage::Signals, ticker));
    }

    let trades = strategy.trades_for_ticker(ticker, prices);
    debug!(
        ticker,
        trades = trades.iter().filter(|t| t.trade_units != 0.0).count(),
        "trades resolved"
    );

    accumulate(ticker, &trades, prices, strategy.sentinel())
        .map_err(|e| e.at(Stage::Accumulate, ticker))
}

/// Run `strategy` over `prices`, fanning tickers out through `runner`.
///
/// Fails fast on invalid parameters or an empty universe; no partial
/// results are returned.
pub fn run_backtest(
    name: &str,
    strategy: &Strategy,
    prices: &[PricePoint],
    runner: &dyn BacktestRunner,
) -> Result<BacktestResult, EngineError> {
    strategy.validate(name)?;
    let universe = select_universe(prices, strategy.assets())?;
    info!(
        strategy = name,
        kind = %strategy.kind(),
        tickers = universe.len(),
        runner = runner.name(),
        "running backtest"
    );

    let per_ticker = runner.run_tickers(&universe, &|ticker, series| {
        run_ticker(strategy, ticker, series)
    })?;
    let MultiAssetResult { rows, total } = aggregate(per_ticker);

    info!(strategy = name, rows = rows.len(), "backtest complete");
    Ok(BacktestResult {
        strategy: name.to_string(),
        sentinel: strategy.sentinel(),
        rows,
        total,
    })
}
