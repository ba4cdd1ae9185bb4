//! CLI definition and dispatch.

use clap::{Parser, Subcommand};
use std::path::{Path, PathBuf};
use std::process::ExitCode;
use tracing::info;
use tracing_subscriber::EnvFilter;

use crate::adapters::csv_adapter::CsvAdapter;
use crate::adapters::csv_report_adapter::CsvReportAdapter;
use crate::adapters::file_config_adapter::FileConfigAdapter;
use crate::domain::backtest::{BacktestConfig, BacktestResult};
use crate::domain::compare::{Comparison, RankingMetric, compare};
use crate::domain::config_validation::{
    build_backtest_config, build_strategies, build_strategy, validate_config,
};
use crate::domain::error::EngineError;
use crate::domain::metrics::summarize;
use crate::domain::price::{PricePoint, filter_dates};
use crate::domain::strategy::Strategy;
use crate::ports::data_port::DataPort;
use crate::ports::report_port::ReportPort;

#[derive(Parser, Debug)]
#[command(name = "stratbench", about = "Multi-asset strategy backtester")]
pub struct Cli {
    /// Debug logging (overrides RUST_LOG)
    #[arg(short, long, global = true)]
    pub verbose: bool,

    #[command(subcommand)]
    pub command: Command,
}

#[derive(Subcommand, Debug)]
pub enum Command {
    /// Backtest one strategy section
    Backtest {
        #[arg(short, long)]
        config: PathBuf,
        #[arg(short, long)]
        strategy: String,
        #[arg(short, long)]
        output: Option<PathBuf>,
    },
    /// Run and rank every strategy listed in [backtest] strategies
    Compare {
        #[arg(short, long)]
        config: PathBuf,
        #[arg(short, long)]
        metric: Option<RankingMetric>,
        #[arg(short, long)]
        output: Option<PathBuf>,
    },
    /// Validate a configuration file without running anything
    Validate {
        #[arg(short, long)]
        config: PathBuf,
    },
}

/// Install the stderr log subscriber. `RUST_LOG` applies unless `verbose`.
pub fn init_logging(verbose: bool) {
    let filter = if verbose {
        EnvFilter::new("debug")
    } else {
        EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new("info"))
    };
    let _ = tracing_subscriber::fmt()
        .with_env_filter(filter)
        .with_writer(std::io::stderr)
        .with_target(false)
        .try_init();
}

pub fn run(cli: Cli) -> ExitCode {
    let outcome = match cli.command {
        Command::Backtest {
            config,
            strategy,
            output,
        } => run_backtest_command(&config, &strategy, output.as_deref()),
        Command::Compare {
            config,
            metric,
            output,
        } => run_compare_command(&config, metric, output.as_deref()),
        Command::Validate { config } => run_validate(&config),
    };

    match outcome {
        Ok(()) => ExitCode::SUCCESS,
        Err(e) => {
            eprintln!("error: {e}");
            (&e).into()
        }
    }
}

/// Relative data paths resolve against the config file's directory.
fn resolve_data_path(config_path: &Path, data_path: &Path) -> PathBuf {
    if data_path.is_absolute() {
        return data_path.to_path_buf();
    }
    config_path
        .parent()
        .map(|dir| dir.join(data_path))
        .unwrap_or_else(|| data_path.to_path_buf())
}

pub fn load_prices(
    config_path: &Path,
    bt_config: &BacktestConfig,
) -> Result<Vec<PricePoint>, EngineError> {
    let path = resolve_data_path(config_path, &bt_config.data_path);
    info!(path = %path.display(), "loading price history");
    let prices = CsvAdapter::new(path).load_prices()?;
    let prices = filter_dates(prices, bt_config.start_date, bt_config.end_date);
    info!(rows = prices.len(), "price history ready");
    Ok(prices)
}

pub fn run_backtest_command(
    config_path: &Path,
    strategy_name: &str,
    output: Option<&Path>,
) -> Result<(), EngineError> {
    info!(config = %config_path.display(), "loading config");
    let adapter = FileConfigAdapter::from_file(config_path)?;
    let bt_config = build_backtest_config(&adapter)?;

    let name = strategy_name.to_lowercase();
    let strategy = build_strategy(&adapter, &name, bt_config.assets.as_deref())?;
    let prices = load_prices(config_path, &bt_config)?;

    let runner = bt_config.runner.build();
    let mut result = strategy
        .backtest(&prices, runner.as_ref())
        .map_err(|e| e.for_strategy(&name))?;
    result.strategy = name;
    print_backtest(&strategy, &result);

    if let Some(dir) = output {
        CsvReportAdapter::new(dir.to_path_buf()).write_backtest(&result)?;
        println!("\nReport written to: {}", dir.display());
    }
    Ok(())
}

pub fn run_compare_command(
    config_path: &Path,
    metric: Option<RankingMetric>,
    output: Option<&Path>,
) -> Result<(), EngineError> {
    info!(config = %config_path.display(), "loading config");
    let adapter = FileConfigAdapter::from_file(config_path)?;
    let bt_config = build_backtest_config(&adapter)?;
    let strategies = build_strategies(&adapter, &bt_config)?;
    let prices = load_prices(config_path, &bt_config)?;

    let metric = metric.unwrap_or(bt_config.metric);
    let runner = bt_config.runner.build();
    let comparison = compare(&strategies, &prices, metric, runner.as_ref())?;
    print_comparison(&comparison);

    if let Some(dir) = output {
        CsvReportAdapter::new(dir.to_path_buf()).write_comparison(&comparison)?;
        println!("\nReport written to: {}", dir.display());
    }
    Ok(())
}

pub fn run_validate(config_path: &Path) -> Result<(), EngineError> {
    info!(config = %config_path.display(), "validating config");
    let adapter = FileConfigAdapter::from_file(config_path)?;
    let count = validate_config(&adapter)?;
    println!("Config validated successfully: {} strategies", count);
    Ok(())
}

fn fmt_pct(value: Option<f64>) -> String {
    value
        .map(|v| format!("{:.2}%", v))
        .unwrap_or_else(|| "n/a".to_string())
}

fn print_backtest(strategy: &Strategy, result: &BacktestResult) {
    println!("\n=== Backtest: {} ({}) ===", result.strategy, strategy.kind());
    for (key, value) in strategy.params() {
        println!("  {:<18}{}", key, value);
    }

    println!(
        "\n{:<12} {:>14} {:>14} {:>14} {:>10}",
        "Ticker", "Invested", "Value", "PnL", "Return"
    );
    for row in summarize(result, true) {
        println!(
            "{:<12} {:>14.2} {:>14.2} {:>14.2} {:>10}",
            row.ticker,
            row.total_invested,
            row.portfolio_value,
            row.pnl,
            fmt_pct(row.return_pct)
        );
    }
}

fn print_comparison(comparison: &Comparison) {
    println!("\n=== Per-Ticker Ranking ({}) ===", comparison.metric);
    println!(
        "{:<12} {:<16} {:>5} {:>14} {:>10}",
        "Ticker", "Strategy", "Rank", "PnL", "Return"
    );
    for d in &comparison.details {
        println!(
            "{:<12} {:<16} {:>5} {:>14.2} {:>10}",
            d.ticker,
            d.strategy,
            d.rank,
            d.pnl,
            fmt_pct(d.return_pct)
        );
    }

    println!("\n=== Leaderboard ===");
    println!(
        "{:<16} {:>12} {:>14} {:>6}",
        "Strategy", "Avg Return", "Total PnL", "Wins"
    );
    for g in &comparison.global {
        println!(
            "{:<16} {:>12} {:>14.2} {:>6}",
            g.strategy,
            fmt_pct(g.avg_return_pct),
            g.total_pnl,
            g.win_count
        );
    }

    if let Some(best) = &comparison.best {
        println!("\nBest strategy: {}", best);
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn relative_data_path_resolves_against_config_dir() {
        let resolved = resolve_data_path(Path::new("/cfg/run.ini"), Path::new("data/p.csv"));
        assert_eq!(resolved, PathBuf::from("/cfg/data/p.csv"));
        let absolute = resolve_data_path(Path::new("/cfg/run.ini"), Path::new("/abs/p.csv"));
        assert_eq!(absolute, PathBuf::from("/abs/p.csv"));
    }

    #[test]
    fn cli_parses_subcommands() {
        let cli = Cli::try_parse_from([
            "stratbench",
            "compare",
            "--config",
            "run.ini",
            "--metric",
            "pnl",
        ])
        .unwrap();
        match cli.command {
            Command::Compare { metric, .. } => assert_eq!(metric, Some(RankingMetric::Pnl)),
            other => panic!("unexpected command {other:?}"),
        }

        let cli = Cli::try_parse_from(["stratbench", "-v", "validate", "-c", "run.ini"]).unwrap();
        assert!(cli.verbose);
    }

    #[test]
    fn cli_rejects_unknown_metric() {
        let result = Cli::try_parse_from([
            "stratbench",
            "compare",
            "--config",
            "run.ini",
            "--metric",
            "sharpe",
        ]);
        assert!(result.is_err());
    }
}
