//! Strategy comparison and ranking.
//!
//! Every strategy runs over the same history. Within each ticker the final
//! portfolio states are ranked by a chosen metric, descending, with ties
//! kept in strategy order. A global leaderboard then averages returns and
//! counts first places per strategy.

use std::cmp::Ordering;
use std::collections::BTreeSet;
use std::fmt;
use std::str::FromStr;

use chrono::NaiveDate;
use tracing::{info, warn};

use super::backtest::{BacktestResult, run_backtest};
use super::error::EngineError;
use super::portfolio::PortfolioState;
use super::price::PricePoint;
use super::runner::BacktestRunner;
use super::strategy::Strategy;

#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum RankingMetric {
    #[default]
    ReturnPct,
    Pnl,
    PortfolioValue,
    TotalInvested,
}

impl RankingMetric {
    pub fn value(self, state: &PortfolioState) -> Option<f64> {
        match self {
            RankingMetric::ReturnPct => state.return_pct,
            RankingMetric::Pnl => Some(state.pnl),
            RankingMetric::PortfolioValue => Some(state.portfolio_value),
            RankingMetric::TotalInvested => Some(state.total_invested),
        }
    }
}

impl fmt::Display for RankingMetric {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let name = match self {
            RankingMetric::ReturnPct => "return_pct",
            RankingMetric::Pnl => "pnl",
            RankingMetric::PortfolioValue => "portfolio_value",
            RankingMetric::TotalInvested => "total_invested",
        };
        f.write_str(name)
    }
}

impl FromStr for RankingMetric {
    type Err = String;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.trim().to_lowercase().as_str() {
            "return_pct" | "return" => Ok(RankingMetric::ReturnPct),
            "pnl" => Ok(RankingMetric::Pnl),
            "portfolio_value" => Ok(RankingMetric::PortfolioValue),
            "total_invested" => Ok(RankingMetric::TotalInvested),
            other => Err(format!("unknown ranking metric '{}'", other)),
        }
    }
}

/// Final state of one strategy on one ticker, with its rank there.
#[derive(Debug, Clone, PartialEq)]
pub struct StrategySummary {
    pub strategy: String,
    pub ticker: String,
    pub date: NaiveDate,
    pub total_invested: f64,
    pub portfolio_value: f64,
    pub pnl: f64,
    pub return_pct: Option<f64>,
    pub avg_cost: Option<f64>,
    /// 1-based rank within the ticker.
    pub rank: usize,
    /// Rank-1 strategy on this ticker.
    pub best_strategy: String,
}

#[derive(Debug, Clone, PartialEq)]
pub struct GlobalSummary {
    pub strategy: String,
    /// Mean of defined per-ticker final returns; `None` when none are defined.
    pub avg_return_pct: Option<f64>,
    pub total_pnl: f64,
    pub win_count: usize,
}

#[derive(Debug, Clone, PartialEq)]
pub struct Comparison {
    pub metric: RankingMetric,
    /// Sorted by (ticker, rank).
    pub details: Vec<StrategySummary>,
    /// Sorted by average return, best first.
    pub global: Vec<GlobalSummary>,
    pub best: Option<String>,
    /// (strategy, ticker) pairs left out of a ticker's ranking for lack of rows.
    pub excluded: Vec<(String, String)>,
}

/// Descending order with undefined values last.
fn descending(a: Option<f64>, b: Option<f64>) -> Ordering {
    match (a, b) {
        (Some(a), Some(b)) => b.partial_cmp(&a).unwrap_or(Ordering::Equal),
        (Some(_), None) => Ordering::Less,
        (None, Some(_)) => Ordering::Greater,
        (None, None) => Ordering::Equal,
    }
}

/// Rank already-computed backtest results, given in strategy order.
pub fn rank_results(results: &[BacktestResult], metric: RankingMetric) -> Comparison {
    let tickers: BTreeSet<&str> = results.iter().flat_map(|r| r.tickers()).collect();

    let mut details = Vec::new();
    let mut excluded = Vec::new();
    for ticker in tickers {
        let mut candidates: Vec<(&str, &PortfolioState)> = Vec::with_capacity(results.len());
        for result in results {
            match result.final_state(ticker) {
                Some(state) => candidates.push((result.strategy.as_str(), state)),
                None => {
                    warn!(
                        strategy = %result.strategy,
                        ticker,
                        "no rows, excluded from ranking"
                    );
                    excluded.push((result.strategy.clone(), ticker.to_string()));
                }
            }
        }

        // sort_by is stable: ties keep strategy order
        candidates.sort_by(|a, b| descending(metric.value(a.1), metric.value(b.1)));
        let Some(best) = candidates.first().map(|(name, _)| name.to_string()) else {
            continue;
        };
        for (i, (name, state)) in candidates.into_iter().enumerate() {
            details.push(StrategySummary {
                strategy: name.to_string(),
                ticker: ticker.to_string(),
                date: state.date,
                total_invested: state.total_invested,
                portfolio_value: state.portfolio_value,
                pnl: state.pnl,
                return_pct: state.return_pct,
                avg_cost: state.avg_cost,
                rank: i + 1,
                best_strategy: best.clone(),
            });
        }
    }

    let mut global: Vec<GlobalSummary> = results
        .iter()
        .map(|result| {
            let own: Vec<&StrategySummary> = details
                .iter()
                .filter(|d| d.strategy == result.strategy)
                .collect();
            let returns: Vec<f64> = own.iter().filter_map(|d| d.return_pct).collect();
            let avg_return_pct = if returns.is_empty() {
                None
            } else {
                Some(returns.iter().sum::<f64>() / returns.len() as f64)
            };
            GlobalSummary {
                strategy: result.strategy.clone(),
                avg_return_pct,
                total_pnl: own.iter().map(|d| d.pnl).sum(),
                win_count: own.iter().filter(|d| d.rank == 1).count(),
            }
        })
        .collect();
    global.sort_by(|a, b| descending(a.avg_return_pct, b.avg_return_pct));

    let best = global.first().map(|g| g.strategy.clone());
    Comparison {
        metric,
        details,
        global,
        best,
        excluded,
    }
}

/// Run every named strategy over `prices` and rank the outcomes.
///
/// Strategies run through `runner` (possibly in parallel) but results are
/// collected in the order given, so ranking is reproducible.
pub fn compare(
    strategies: &[(String, Strategy)],
    prices: &[PricePoint],
    metric: RankingMetric,
    runner: &dyn BacktestRunner,
) -> Result<Comparison, EngineError> {
    if strategies.is_empty() {
        return Err(EngineError::NoStrategies);
    }

    for (name, strategy) in strategies {
        strategy.validate(name)?;
    }

    info!(
        strategies = strategies.len(),
        %metric,
        runner = runner.name(),
        "comparing strategies"
    );
    let results = runner.run_strategies(strategies.len(), &|i| {
        let (name, strategy) = &strategies[i];
        run_backtest(name, strategy, prices, runner).map_err(|e| e.for_strategy(name))
    })?;

    let comparison = rank_results(&results, metric);
    if let Some(best) = &comparison.best {
        info!(best = %best, "comparison complete");
    }
    Ok(comparison)
}
