//! CSV report adapter implementing ReportPort.
//!
//! A backtest is written to `<output>/<strategy>/`:
//! - `strategy_<TICKER>.csv` per ticker
//! - `strategy_ALL.csv` with every ticker's rows
//! - `strategy_SUM.csv` with the cross-asset total series
//! - `summary.csv` with final positions and a TOTAL row
//!
//! A comparison is written to `<output>/comparison_details.csv` and
//! `<output>/comparison.csv`. Undefined values are written as empty fields.

use std::fs;
use std::path::{Path, PathBuf};

use crate::domain::aggregate::TotalPoint;
use crate::domain::backtest::BacktestResult;
use crate::domain::compare::Comparison;
use crate::domain::error::EngineError;
use crate::domain::metrics::summarize;
use crate::domain::portfolio::PortfolioState;
use crate::ports::report_port::ReportPort;

const STATE_HEADER: [&str; 11] = [
    "Date",
    "Ticker",
    "Close",
    "Trade_units",
    "Buy_amount",
    "Cumulative_units",
    "Total_invested",
    "Portfolio_value",
    "PnL",
    "Return_pct",
    "Avg_cost",
];

pub struct CsvReportAdapter {
    output_dir: PathBuf,
}

fn optional(value: Option<f64>) -> String {
    value.map(|v| v.to_string()).unwrap_or_default()
}

/// Ticker or strategy name made safe for use in a file name.
fn file_stem(name: &str) -> String {
    name.chars()
        .map(|c| if c == '/' || c == '\\' || c == ':' { '_' } else { c })
        .collect()
}

impl CsvReportAdapter {
    pub fn new(output_dir: PathBuf) -> Self {
        Self { output_dir }
    }

    fn write_states(path: &Path, rows: &[PortfolioState]) -> Result<(), EngineError> {
        let mut wtr = csv::Writer::from_path(path)?;
        wtr.write_record(STATE_HEADER)?;
        for s in rows {
            wtr.write_record([
                s.date.to_string(),
                s.ticker.clone(),
                s.close.to_string(),
                s.trade_units.to_string(),
                s.buy_amount.to_string(),
                s.cumulative_units.to_string(),
                s.total_invested.to_string(),
                s.portfolio_value.to_string(),
                s.pnl.to_string(),
                optional(s.return_pct),
                optional(s.avg_cost),
            ])?;
        }
        wtr.flush()?;
        Ok(())
    }

    fn write_total(path: &Path, total: &[TotalPoint]) -> Result<(), EngineError> {
        let mut wtr = csv::Writer::from_path(path)?;
        wtr.write_record([
            "Date",
            "PnL",
            "Total_invested",
            "Portfolio_value",
            "Return_pct",
            "Tickers",
        ])?;
        for t in total {
            wtr.write_record([
                t.date.to_string(),
                t.pnl.to_string(),
                t.total_invested.to_string(),
                t.portfolio_value.to_string(),
                t.return_pct.to_string(),
                t.tickers.to_string(),
            ])?;
        }
        wtr.flush()?;
        Ok(())
    }
}

impl ReportPort for CsvReportAdapter {
    fn write_backtest(&self, result: &BacktestResult) -> Result<(), EngineError> {
        let dir = self.output_dir.join(file_stem(&result.strategy));
        fs::create_dir_all(&dir)?;

        for ticker in result.tickers() {
            let path = dir.join(format!("strategy_{}.csv", file_stem(ticker)));
            Self::write_states(&path, result.rows_for(ticker))?;
        }
        Self::write_states(&dir.join("strategy_ALL.csv"), &result.rows)?;
        Self::write_total(&dir.join("strategy_SUM.csv"), &result.total)?;

        let mut wtr = csv::Writer::from_path(dir.join("summary.csv"))?;
        wtr.write_record(["Ticker", "Total_invested", "Portfolio_value", "PnL", "Return_pct"])?;
        for row in summarize(result, true) {
            wtr.write_record([
                row.ticker,
                row.total_invested.to_string(),
                row.portfolio_value.to_string(),
                row.pnl.to_string(),
                optional(row.return_pct),
            ])?;
        }
        wtr.flush()?;

        tracing::info!(dir = %dir.display(), "backtest report written");
        Ok(())
    }

    fn write_comparison(&self, comparison: &Comparison) -> Result<(), EngineError> {
        fs::create_dir_all(&self.output_dir)?;

        let mut wtr = csv::Writer::from_path(self.output_dir.join("comparison_details.csv"))?;
        wtr.write_record([
            "Strategy",
            "Ticker",
            "Date",
            "Total_invested",
            "Portfolio_value",
            "PnL",
            "Return_pct",
            "Avg_cost",
            "Rank",
            "Best_strategy",
        ])?;
        for d in &comparison.details {
            wtr.write_record([
                d.strategy.clone(),
                d.ticker.clone(),
                d.date.to_string(),
                d.total_invested.to_string(),
                d.portfolio_value.to_string(),
                d.pnl.to_string(),
                optional(d.return_pct),
                optional(d.avg_cost),
                d.rank.to_string(),
                d.best_strategy.clone(),
            ])?;
        }
        wtr.flush()?;

        let mut wtr = csv::Writer::from_path(self.output_dir.join("comparison.csv"))?;
        wtr.write_record(["Strategy", "Avg_Return_pct", "Total_PnL", "Win_count"])?;
        for g in &comparison.global {
            wtr.write_record([
                g.strategy.clone(),
                optional(g.avg_return_pct),
                g.total_pnl.to_string(),
                g.win_count.to_string(),
            ])?;
        }
        wtr.flush()?;

        tracing::info!(dir = %self.output_dir.display(), "comparison report written");
        Ok(())
    }
}
