//! Final-position summary of a backtest.

use super::backtest::BacktestResult;

pub const TOTAL_LABEL: &str = "TOTAL";

#[derive(Debug, Clone, PartialEq)]
pub struct TickerSummary {
    pub ticker: String,
    pub total_invested: f64,
    pub portfolio_value: f64,
    pub pnl: f64,
    /// `100 * pnl / total_invested` under the strategy's sentinel policy.
    pub return_pct: Option<f64>,
}

/// One row per ticker from its last portfolio state, optionally followed by
/// a [`TOTAL_LABEL`] row whose return is capital weighted.
pub fn summarize(result: &BacktestResult, include_total: bool) -> Vec<TickerSummary> {
    let mut rows: Vec<TickerSummary> = result
        .final_states()
        .into_iter()
        .map(|s| TickerSummary {
            ticker: s.ticker.clone(),
            total_invested: s.total_invested,
            portfolio_value: s.portfolio_value,
            pnl: s.pnl,
            return_pct: result.sentinel.ratio(s.pnl, s.total_invested, 100.0),
        })
        .collect();

    if include_total && !rows.is_empty() {
        let total_invested: f64 = rows.iter().map(|r| r.total_invested).sum();
        let portfolio_value: f64 = rows.iter().map(|r| r.portfolio_value).sum();
        let pnl: f64 = rows.iter().map(|r| r.pnl).sum();
        rows.push(TickerSummary {
            ticker: TOTAL_LABEL.to_string(),
            total_invested,
            portfolio_value,
            pnl,
            return_pct: result.sentinel.ratio(pnl, total_invested, 100.0),
        });
    }

    rows
}
