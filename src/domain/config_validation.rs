//! Configuration validation and construction.
//!
//! Reads the `[backtest]` section and one section per strategy through a
//! [`ConfigPort`], rejecting unknown keys, and builds validated
//! [`BacktestConfig`] and [`Strategy`] values.

use crate::domain::backtest::BacktestConfig;
use crate::domain::compare::RankingMetric;
use crate::domain::error::EngineError;
use crate::domain::runner::RunnerKind;
use crate::domain::strategy::{
    BuyAndHoldConfig, DcaConfig, Frequency, RsiConfig, SmaConfig, Strategy, StrategyKind,
};
use crate::domain::universe::parse_assets;
use crate::ports::config_port::ConfigPort;
use chrono::NaiveDate;
use std::collections::HashSet;
use std::path::PathBuf;
use std::str::FromStr;

pub const BACKTEST_SECTION: &str = "backtest";

const BACKTEST_KEYS: [&str; 7] = [
    "data",
    "assets",
    "metric",
    "runner",
    "strategies",
    "start_date",
    "end_date",
];

fn strategy_keys(kind: StrategyKind) -> &'static [&'static str] {
    match kind {
        StrategyKind::BuyAndHold => &["kind", "assets"],
        StrategyKind::Rsi => &["kind", "assets", "period", "buy_threshold", "sell_threshold"],
        StrategyKind::SmaCrossover => &["kind", "assets", "short_window", "long_window"],
        StrategyKind::Dca => &["kind", "assets", "amount_per_asset", "frequency"],
    }
}

fn check_known_keys(
    config: &dyn ConfigPort,
    section: &str,
    allowed: &[&str],
) -> Result<(), EngineError> {
    for key in config.keys(section).unwrap_or_default() {
        if !allowed.contains(&key.as_str()) {
            return Err(EngineError::UnknownConfigKey {
                section: section.to_string(),
                key,
            });
        }
    }
    Ok(())
}

/// Parse an optional value with `FromStr`, mapping failures to `ConfigInvalid`.
fn parse_opt<T: FromStr>(
    config: &dyn ConfigPort,
    section: &str,
    key: &str,
    expected: &str,
) -> Result<Option<T>, EngineError> {
    match config.get_string(section, key) {
        None => Ok(None),
        Some(raw) => raw.parse().map(Some).map_err(|_| {
            EngineError::invalid(section, key, format!("'{}' is not {}", raw, expected))
        }),
    }
}

fn parse_date(config: &dyn ConfigPort, key: &str) -> Result<Option<NaiveDate>, EngineError> {
    match config.get_string(BACKTEST_SECTION, key) {
        None => Ok(None),
        Some(s) => NaiveDate::parse_from_str(&s, "%Y-%m-%d")
            .map(Some)
            .map_err(|_| {
                EngineError::invalid(
                    BACKTEST_SECTION,
                    key,
                    format!("invalid {} format, expected YYYY-MM-DD", key),
                )
            }),
    }
}

fn parse_list(
    config: &dyn ConfigPort,
    section: &str,
    key: &str,
) -> Result<Option<Vec<String>>, EngineError> {
    match config.get_string(section, key) {
        None => Ok(None),
        Some(raw) => parse_assets(&raw)
            .map(Some)
            .map_err(|e| EngineError::invalid(section, key, e.to_string())),
    }
}

fn parse_with<T>(
    config: &dyn ConfigPort,
    section: &str,
    key: &str,
    parse: impl FnOnce(&str) -> Result<T, String>,
) -> Result<Option<T>, EngineError> {
    match config.get_string(section, key) {
        None => Ok(None),
        Some(raw) => parse(&raw)
            .map(Some)
            .map_err(|reason| EngineError::invalid(section, key, reason)),
    }
}

pub fn build_backtest_config(config: &dyn ConfigPort) -> Result<BacktestConfig, EngineError> {
    if !config.has_section(BACKTEST_SECTION) {
        return Err(EngineError::ConfigMissing {
            section: BACKTEST_SECTION.into(),
            key: "data".into(),
        });
    }
    check_known_keys(config, BACKTEST_SECTION, &BACKTEST_KEYS)?;

    let data_path = config
        .get_string(BACKTEST_SECTION, "data")
        .map(PathBuf::from)
        .ok_or_else(|| EngineError::ConfigMissing {
            section: BACKTEST_SECTION.into(),
            key: "data".into(),
        })?;

    let start_date = parse_date(config, "start_date")?;
    let end_date = parse_date(config, "end_date")?;
    if let (Some(start), Some(end)) = (start_date, end_date) {
        if start >= end {
            return Err(EngineError::invalid(
                BACKTEST_SECTION,
                "start_date",
                "start_date must be before end_date",
            ));
        }
    }

    let metric = parse_with(config, BACKTEST_SECTION, "metric", RankingMetric::from_str)?
        .unwrap_or_default();
    let runner =
        parse_with(config, BACKTEST_SECTION, "runner", RunnerKind::from_str)?.unwrap_or_default();

    let strategies: Vec<String> = parse_list(config, BACKTEST_SECTION, "strategies")?
        .unwrap_or_default()
        .into_iter()
        .map(|s| s.to_lowercase())
        .collect();
    let mut seen = HashSet::new();
    if let Some(dup) = strategies.iter().find(|s| !seen.insert(s.as_str())) {
        return Err(EngineError::invalid(
            BACKTEST_SECTION,
            "strategies",
            format!("duplicate strategy '{}'", dup),
        ));
    }

    Ok(BacktestConfig {
        data_path,
        start_date,
        end_date,
        assets: parse_list(config, BACKTEST_SECTION, "assets")?,
        metric,
        runner,
        strategies,
    })
}

/// Build the strategy defined in `[section]`, falling back to
/// `default_assets` when the section has no allow-list of its own.
pub fn build_strategy(
    config: &dyn ConfigPort,
    section: &str,
    default_assets: Option<&[String]>,
) -> Result<Strategy, EngineError> {
    if section.eq_ignore_ascii_case(BACKTEST_SECTION) || !config.has_section(section) {
        return Err(EngineError::UnknownStrategy {
            name: section.to_string(),
        });
    }

    let kind: StrategyKind = parse_with(config, section, "kind", StrategyKind::from_str)?
        .ok_or_else(|| EngineError::ConfigMissing {
            section: section.to_string(),
            key: "kind".into(),
        })?;
    check_known_keys(config, section, strategy_keys(kind))?;

    let assets = parse_list(config, section, "assets")?
        .or_else(|| default_assets.map(<[String]>::to_vec));

    let strategy = match kind {
        StrategyKind::BuyAndHold => Strategy::BuyAndHold(BuyAndHoldConfig { assets }),
        StrategyKind::Rsi => {
            let defaults = RsiConfig::default();
            Strategy::Rsi(RsiConfig {
                period: parse_opt(config, section, "period", "a positive integer")?
                    .unwrap_or(defaults.period),
                buy_threshold: parse_opt(config, section, "buy_threshold", "a number")?
                    .unwrap_or(defaults.buy_threshold),
                sell_threshold: parse_opt(config, section, "sell_threshold", "a number")?
                    .unwrap_or(defaults.sell_threshold),
                assets,
            })
        }
        StrategyKind::SmaCrossover => {
            let defaults = SmaConfig::default();
            Strategy::SmaCrossover(SmaConfig {
                short_window: parse_opt(config, section, "short_window", "a positive integer")?
                    .unwrap_or(defaults.short_window),
                long_window: parse_opt(config, section, "long_window", "a positive integer")?
                    .unwrap_or(defaults.long_window),
                assets,
            })
        }
        StrategyKind::Dca => {
            let defaults = DcaConfig::default();
            Strategy::Dca(DcaConfig {
                amount_per_asset: parse_opt(config, section, "amount_per_asset", "a number")?
                    .unwrap_or(defaults.amount_per_asset),
                frequency: parse_with(config, section, "frequency", Frequency::from_str)?
                    .unwrap_or(defaults.frequency),
                assets,
            })
        }
    };

    strategy.validate(section)?;
    Ok(strategy)
}

/// Build every strategy named in `[backtest] strategies`, in order.
pub fn build_strategies(
    config: &dyn ConfigPort,
    backtest: &BacktestConfig,
) -> Result<Vec<(String, Strategy)>, EngineError> {
    if backtest.strategies.is_empty() {
        return Err(EngineError::NoStrategies);
    }
    backtest
        .strategies
        .iter()
        .map(|name| {
            build_strategy(config, name, backtest.assets.as_deref()).map(|s| (name.clone(), s))
        })
        .collect()
}

/// Validate the whole file: the backtest section and every listed strategy.
pub fn validate_config(config: &dyn ConfigPort) -> Result<usize, EngineError> {
    let backtest = build_backtest_config(config)?;
    let strategies = build_strategies(config, &backtest)?;
    Ok(strategies.len())
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::adapters::file_config_adapter::FileConfigAdapter;

    fn make_config(content: &str) -> FileConfigAdapter {
        FileConfigAdapter::from_string(content).unwrap()
    }

    const FULL: &str = r#"
[backtest]
data = prices.csv
assets = AAPL, MSFT
metric = pnl
runner = sequential
strategies = weekly, rsi_fast, cross, hold
start_date = 2020-01-01
end_date = 2024-12-31

[weekly]
kind = dca
amount_per_asset = 250
frequency = W-MON

[rsi_fast]
kind = rsi
period = 7
buy_threshold = 25
sell_threshold = 75
assets = TSLA

[cross]
kind = sma
short_window = 10
long_window = 30

[hold]
kind = buy_hold
"#;

    #[test]
    fn valid_config_passes() {
        let config = make_config(FULL);
        let bt = build_backtest_config(&config).unwrap();
        assert_eq!(bt.data_path, PathBuf::from("prices.csv"));
        assert_eq!(bt.metric, RankingMetric::Pnl);
        assert_eq!(bt.runner, RunnerKind::Sequential);
        assert_eq!(bt.strategies, vec!["weekly", "rsi_fast", "cross", "hold"]);
        assert_eq!(bt.start_date, NaiveDate::from_ymd_opt(2020, 1, 1));
        assert_eq!(validate_config(&config).unwrap(), 4);
    }

    #[test]
    fn strategies_built_with_defaults_and_overrides() {
        let config = make_config(FULL);
        let bt = build_backtest_config(&config).unwrap();
        let strategies = build_strategies(&config, &bt).unwrap();

        match &strategies[0].1 {
            Strategy::Dca(c) => {
                assert_eq!(c.amount_per_asset, 250.0);
                assert_eq!(c.frequency, Frequency::Weekly(chrono::Weekday::Mon));
                assert_eq!(c.assets, Some(vec!["AAPL".to_string(), "MSFT".to_string()]));
            }
            other => panic!("unexpected strategy {other:?}"),
        }
        match &strategies[1].1 {
            Strategy::Rsi(c) => {
                assert_eq!(c.period, 7);
                assert_eq!(c.assets, Some(vec!["TSLA".to_string()]));
            }
            other => panic!("unexpected strategy {other:?}"),
        }
        assert_eq!(strategies[3].1.kind(), StrategyKind::BuyAndHold);
    }

    #[test]
    fn defaults_when_optional_keys_absent() {
        let config = make_config("[backtest]\ndata = p.csv\n[r]\nkind = rsi\n");
        let bt = build_backtest_config(&config).unwrap();
        assert_eq!(bt.metric, RankingMetric::ReturnPct);
        assert_eq!(bt.runner, RunnerKind::Parallel);
        assert!(bt.strategies.is_empty());
        assert_eq!(
            build_strategy(&config, "r", None).unwrap(),
            Strategy::Rsi(RsiConfig::default())
        );
    }

    #[test]
    fn missing_data_fails() {
        let config = make_config("[backtest]\nmetric = pnl\n");
        let err = build_backtest_config(&config).unwrap_err();
        assert!(matches!(err, EngineError::ConfigMissing { key, .. } if key == "data"));
    }

    #[test]
    fn missing_backtest_section_fails() {
        let config = make_config("[other]\nx = 1\n");
        assert!(matches!(
            build_backtest_config(&config),
            Err(EngineError::ConfigMissing { .. })
        ));
    }

    #[test]
    fn unknown_backtest_key_fails() {
        let config = make_config("[backtest]\ndata = p.csv\ninitial_capital = 1000\n");
        let err = build_backtest_config(&config).unwrap_err();
        assert!(matches!(err, EngineError::UnknownConfigKey { key, .. } if key == "initial_capital"));
    }

    #[test]
    fn unknown_strategy_key_fails() {
        let config = make_config("[s]\nkind = sma\nperiod = 14\n");
        let err = build_strategy(&config, "s", None).unwrap_err();
        assert!(matches!(err, EngineError::UnknownConfigKey { key, .. } if key == "period"));
    }

    #[test]
    fn invalid_start_date_format_fails() {
        let config = make_config("[backtest]\ndata = p.csv\nstart_date = 01/01/2020\n");
        let err = build_backtest_config(&config).unwrap_err();
        assert!(matches!(err, EngineError::ConfigInvalid { key, .. } if key == "start_date"));
    }

    #[test]
    fn start_date_after_end_date_fails() {
        let config = make_config(
            "[backtest]\ndata = p.csv\nstart_date = 2024-01-01\nend_date = 2020-01-01\n",
        );
        assert!(build_backtest_config(&config).is_err());
    }

    #[test]
    fn invalid_metric_and_runner_fail() {
        let config = make_config("[backtest]\ndata = p.csv\nmetric = sharpe\n");
        let err = build_backtest_config(&config).unwrap_err();
        assert!(matches!(err, EngineError::ConfigInvalid { key, .. } if key == "metric"));

        let config = make_config("[backtest]\ndata = p.csv\nrunner = gpu\n");
        let err = build_backtest_config(&config).unwrap_err();
        assert!(matches!(err, EngineError::ConfigInvalid { key, .. } if key == "runner"));
    }

    #[test]
    fn duplicate_strategy_fails() {
        let config = make_config("[backtest]\ndata = p.csv\nstrategies = a, A\n");
        let err = build_backtest_config(&config).unwrap_err();
        assert!(matches!(err, EngineError::ConfigInvalid { key, .. } if key == "strategies"));
    }

    #[test]
    fn unknown_strategy_section_fails() {
        let config = make_config("[backtest]\ndata = p.csv\nstrategies = ghost\n");
        let bt = build_backtest_config(&config).unwrap();
        let err = build_strategies(&config, &bt).unwrap_err();
        assert!(matches!(err, EngineError::UnknownStrategy { name } if name == "ghost"));
    }

    #[test]
    fn no_strategies_listed_fails() {
        let config = make_config("[backtest]\ndata = p.csv\n");
        let bt = build_backtest_config(&config).unwrap();
        assert!(matches!(
            build_strategies(&config, &bt),
            Err(EngineError::NoStrategies)
        ));
    }

    #[test]
    fn missing_or_unknown_kind_fails() {
        let config = make_config("[s]\nperiod = 14\n");
        let err = build_strategy(&config, "s", None).unwrap_err();
        assert!(matches!(err, EngineError::ConfigMissing { key, .. } if key == "kind"));

        let config = make_config("[s]\nkind = macd\n");
        let err = build_strategy(&config, "s", None).unwrap_err();
        assert!(matches!(err, EngineError::ConfigInvalid { key, .. } if key == "kind"));
    }

    #[test]
    fn non_numeric_parameter_fails() {
        let config = make_config("[s]\nkind = rsi\nperiod = fourteen\n");
        let err = build_strategy(&config, "s", None).unwrap_err();
        assert!(matches!(err, EngineError::ConfigInvalid { key, .. } if key == "period"));

        let config = make_config("[s]\nkind = sma\nshort_window = -5\n");
        assert!(build_strategy(&config, "s", None).is_err());
    }

    #[test]
    fn zero_window_fails() {
        let config = make_config("[s]\nkind = sma\nshort_window = 0\nlong_window = 5\n");
        let err = build_strategy(&config, "s", None).unwrap_err();
        assert!(matches!(err, EngineError::ConfigInvalid { key, .. } if key == "short_window"));
    }

    #[test]
    fn thresholds_out_of_range_fail() {
        let config = make_config("[s]\nkind = rsi\nbuy_threshold = -1\n");
        assert!(build_strategy(&config, "s", None).is_err());
        let config = make_config("[s]\nkind = rsi\nbuy_threshold = 80\nsell_threshold = 20\n");
        assert!(build_strategy(&config, "s", None).is_err());
    }

    #[test]
    fn bad_frequency_fails() {
        let config = make_config("[s]\nkind = dca\nfrequency = fortnightly\n");
        let err = build_strategy(&config, "s", None).unwrap_err();
        assert!(matches!(err, EngineError::ConfigInvalid { key, .. } if key == "frequency"));
    }

    #[test]
    fn empty_asset_token_fails() {
        let config = make_config("[s]\nkind = buy_hold\nassets = AAPL,,MSFT\n");
        let err = build_strategy(&config, "s", None).unwrap_err();
        assert!(matches!(err, EngineError::ConfigInvalid { key, .. } if key == "assets"));
    }
}
