//! Execution strategies for the per-ticker and per-strategy fan-out.
//!
//! Every ticker's pipeline depends only on its own price series and every
//! strategy's run only on the shared history, so both levels can be spread
//! across a rayon pool. Results always come back in input order.

use rayon::prelude::*;
use std::collections::BTreeMap;
use std::fmt;
use std::str::FromStr;

use crate::domain::backtest::BacktestResult;
use crate::domain::error::EngineError;
use crate::domain::portfolio::PortfolioState;
use crate::domain::price::PricePoint;

/// Full pipeline for one ticker's date-sorted series.
pub type TickerJob<'a> =
    dyn Fn(&str, &[PricePoint]) -> Result<Vec<PortfolioState>, EngineError> + Sync + 'a;

/// Full backtest of the strategy at the given index.
pub type StrategyJob<'a> = dyn Fn(usize) -> Result<BacktestResult, EngineError> + Sync + 'a;

pub trait BacktestRunner: Send + Sync {
    fn name(&self) -> &'static str;

    /// Run `job` for every ticker, returning results in ticker order.
    fn run_tickers(
        &self,
        universe: &BTreeMap<String, Vec<PricePoint>>,
        job: &TickerJob<'_>,
    ) -> Result<Vec<Vec<PortfolioState>>, EngineError>;

    /// Run `job` for indices `0..count`, returning results in index order.
    fn run_strategies(
        &self,
        count: usize,
        job: &StrategyJob<'_>,
    ) -> Result<Vec<BacktestResult>, EngineError>;
}

#[derive(Debug, Clone, Copy, Default)]
pub struct SequentialRunner;

impl BacktestRunner for SequentialRunner {
    fn name(&self) -> &'static str {
        "sequential"
    }

    fn run_tickers(
        &self,
        universe: &BTreeMap<String, Vec<PricePoint>>,
        job: &TickerJob<'_>,
    ) -> Result<Vec<Vec<PortfolioState>>, EngineError> {
        universe
            .iter()
            .map(|(ticker, series)| job(ticker, series))
            .collect()
    }

    fn run_strategies(
        &self,
        count: usize,
        job: &StrategyJob<'_>,
    ) -> Result<Vec<BacktestResult>, EngineError> {
        (0..count).map(job).collect()
    }
}

#[derive(Debug, Clone, Copy, Default)]
pub struct ParallelRunner;

impl BacktestRunner for ParallelRunner {
    fn name(&self) -> &'static str {
        "parallel"
    }

    fn run_tickers(
        &self,
        universe: &BTreeMap<String, Vec<PricePoint>>,
        job: &TickerJob<'_>,
    ) -> Result<Vec<Vec<PortfolioState>>, EngineError> {
        let entries: Vec<(&String, &Vec<PricePoint>)> = universe.iter().collect();
        // Collect every outcome first so the reported error is the first in
        // ticker order, same as the sequential runner.
        let outcomes: Vec<Result<Vec<PortfolioState>, EngineError>> = entries
            .par_iter()
            .map(|(ticker, series)| job(ticker, series))
            .collect();
        outcomes.into_iter().collect()
    }

    fn run_strategies(
        &self,
        count: usize,
        job: &StrategyJob<'_>,
    ) -> Result<Vec<BacktestResult>, EngineError> {
        let outcomes: Vec<Result<BacktestResult, EngineError>> =
            (0..count).into_par_iter().map(job).collect();
        outcomes.into_iter().collect()
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum RunnerKind {
    Sequential,
    #[default]
    Parallel,
}

impl RunnerKind {
    pub fn build(self) -> Box<dyn BacktestRunner> {
        match self {
            RunnerKind::Sequential => Box::new(SequentialRunner),
            RunnerKind::Parallel => Box::new(ParallelRunner),
        }
    }
}

impl fmt::Display for RunnerKind {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            RunnerKind::Sequential => write!(f, "sequential"),
            RunnerKind::Parallel => write!(f, "parallel"),
        }
    }
}

impl FromStr for RunnerKind {
    type Err = String;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.trim().to_lowercase().as_str() {
            "sequential" => Ok(RunnerKind::Sequential),
            "parallel" => Ok(RunnerKind::Parallel),
            other => Err(format!("unknown runner '{}'", other)),
        }
    }
}
