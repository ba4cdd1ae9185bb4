//! Strategy variants and their common interface.
//!
//! The set of strategies is closed: each variant owns a validated parameter
//! struct. Discrete variants emit [`Signal`](crate::domain::signal::Signal)s
//! that go through the position resolver; DCA emits trade units directly.

pub mod buy_hold;
pub mod dca;
pub mod rsi;
pub mod sma;

use std::fmt;
use std::str::FromStr;

use crate::domain::backtest::{self, BacktestResult};
use crate::domain::error::EngineError;
use crate::domain::portfolio::SentinelPolicy;
use crate::domain::position::{self, PositionPolicy, TradeRecord};
use crate::domain::price::PricePoint;
use crate::domain::runner::BacktestRunner;
use crate::domain::signal::DatedSignal;
use crate::domain::universe::select_universe;

pub use buy_hold::BuyAndHoldConfig;
pub use dca::{DcaConfig, Frequency};
pub use rsi::RsiConfig;
pub use sma::SmaConfig;

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum StrategyKind {
    BuyAndHold,
    Rsi,
    SmaCrossover,
    Dca,
}

impl StrategyKind {
    pub fn label(self) -> &'static str {
        match self {
            StrategyKind::BuyAndHold => "buy_hold",
            StrategyKind::Rsi => "rsi",
            StrategyKind::SmaCrossover => "sma",
            StrategyKind::Dca => "dca",
        }
    }
}

impl fmt::Display for StrategyKind {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.label())
    }
}

impl FromStr for StrategyKind {
    type Err = String;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.trim().to_lowercase().as_str() {
            "buy_hold" | "buyhold" | "buy_and_hold" => Ok(StrategyKind::BuyAndHold),
            "rsi" => Ok(StrategyKind::Rsi),
            "sma" | "sma_crossover" => Ok(StrategyKind::SmaCrossover),
            "dca" => Ok(StrategyKind::Dca),
            other => Err(format!("unknown strategy kind '{}'", other)),
        }
    }
}

#[derive(Debug, Clone, PartialEq)]
pub enum Strategy {
    BuyAndHold(BuyAndHoldConfig),
    Rsi(RsiConfig),
    SmaCrossover(SmaConfig),
    Dca(DcaConfig),
}

impl Strategy {
    pub fn kind(&self) -> StrategyKind {
        match self {
            Strategy::BuyAndHold(_) => StrategyKind::BuyAndHold,
            Strategy::Rsi(_) => StrategyKind::Rsi,
            Strategy::SmaCrossover(_) => StrategyKind::SmaCrossover,
            Strategy::Dca(_) => StrategyKind::Dca,
        }
    }

    /// Default display name, used when no section name is available.
    pub fn name(&self) -> &'static str {
        self.kind().label()
    }

    /// Asset allow-list; `None` trades every ticker in the history.
    pub fn assets(&self) -> Option<&[String]> {
        match self {
            Strategy::BuyAndHold(c) => c.assets.as_deref(),
            Strategy::Rsi(c) => c.assets.as_deref(),
            Strategy::SmaCrossover(c) => c.assets.as_deref(),
            Strategy::Dca(c) => c.assets.as_deref(),
        }
    }

    pub fn set_assets(&mut self, assets: Option<Vec<String>>) {
        match self {
            Strategy::BuyAndHold(c) => c.assets = assets,
            Strategy::Rsi(c) => c.assets = assets,
            Strategy::SmaCrossover(c) => c.assets = assets,
            Strategy::Dca(c) => c.assets = assets,
        }
    }

    /// Parameters in declaration order, formatted for display.
    pub fn params(&self) -> Vec<(&'static str, String)> {
        let mut params = match self {
            Strategy::BuyAndHold(_) => Vec::new(),
            Strategy::Rsi(c) => vec![
                ("period", c.period.to_string()),
                ("buy_threshold", c.buy_threshold.to_string()),
                ("sell_threshold", c.sell_threshold.to_string()),
            ],
            Strategy::SmaCrossover(c) => vec![
                ("short_window", c.short_window.to_string()),
                ("long_window", c.long_window.to_string()),
            ],
            Strategy::Dca(c) => vec![
                ("amount_per_asset", c.amount_per_asset.to_string()),
                ("frequency", c.frequency.to_string()),
            ],
        };
        let assets = self
            .assets()
            .map(|a| a.join(","))
            .unwrap_or_else(|| "all".to_string());
        params.push(("assets", assets));
        params
    }

    pub fn validate(&self, section: &str) -> Result<(), EngineError> {
        match self {
            Strategy::BuyAndHold(_) => Ok(()),
            Strategy::Rsi(c) => c.validate(section),
            Strategy::SmaCrossover(c) => c.validate(section),
            Strategy::Dca(c) => c.validate(section),
        }?;
        if self.assets().is_some_and(|a| a.is_empty()) {
            return Err(EngineError::invalid(section, "assets", "asset list is empty"));
        }
        Ok(())
    }

    pub fn sentinel(&self) -> SentinelPolicy {
        match self {
            Strategy::Dca(_) => SentinelPolicy::Undefined,
            _ => SentinelPolicy::Zero,
        }
    }

    /// Directional signals, or `None` for DCA which trades on a schedule.
    pub fn generate_signals(&self, prices: &[PricePoint]) -> Option<Vec<DatedSignal>> {
        match self {
            Strategy::BuyAndHold(c) => Some(c.generate_signals(prices)),
            Strategy::Rsi(c) => Some(c.generate_signals(prices)),
            Strategy::SmaCrossover(c) => Some(c.generate_signals(prices)),
            Strategy::Dca(_) => None,
        }
    }

    pub fn position_policy(&self) -> PositionPolicy {
        match self {
            Strategy::BuyAndHold(_) => PositionPolicy::BuyOnce,
            _ => PositionPolicy::LongOnly,
        }
    }

    /// Constraint-resolved trades for one ticker's date-sorted prices.
    pub fn trades_for_ticker(&self, ticker: &str, prices: &[PricePoint]) -> Vec<TradeRecord> {
        match (self, self.generate_signals(prices)) {
            (Strategy::Dca(c), _) => c.trades(ticker, prices),
            (_, Some(signals)) => position::resolve(ticker, &signals, self.position_policy()),
            (_, None) => Vec::new(),
        }
    }

    /// Trades for every allow-listed ticker, sorted by (ticker, date).
    ///
    /// Parameter errors carry the kind label as their section; callers that
    /// know the config section validate under it first.
    pub fn run(&self, prices: &[PricePoint]) -> Result<Vec<TradeRecord>, EngineError> {
        self.validate(self.name())?;
        let universe = select_universe(prices, self.assets())?;
        Ok(universe
            .iter()
            .flat_map(|(ticker, series)| self.trades_for_ticker(ticker, series))
            .collect())
    }

    /// Full pipeline: trades, per-ticker accumulation, cross-asset totals.
    /// The result is labelled with the kind label.
    pub fn backtest(
        &self,
        prices: &[PricePoint],
        runner: &dyn BacktestRunner,
    ) -> Result<BacktestResult, EngineError> {
        backtest::run_backtest(self.name(), self, prices, runner)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn kind_parses_aliases() {
        assert_eq!("RSI".parse::<StrategyKind>().unwrap(), StrategyKind::Rsi);
        assert_eq!(
            "buy_and_hold".parse::<StrategyKind>().unwrap(),
            StrategyKind::BuyAndHold
        );
        assert_eq!(
            "sma_crossover".parse::<StrategyKind>().unwrap(),
            StrategyKind::SmaCrossover
        );
        assert!("macd".parse::<StrategyKind>().is_err());
    }

    #[test]
    fn name_round_trips_through_kind() {
        for strategy in [
            Strategy::BuyAndHold(BuyAndHoldConfig::default()),
            Strategy::Rsi(RsiConfig::default()),
            Strategy::SmaCrossover(SmaConfig::default()),
            Strategy::Dca(DcaConfig::default()),
        ] {
            assert_eq!(strategy.name().parse::<StrategyKind>().unwrap(), strategy.kind());
        }
    }

    #[test]
    fn sentinel_per_kind() {
        assert_eq!(
            Strategy::Dca(DcaConfig::default()).sentinel(),
            SentinelPolicy::Undefined
        );
        assert_eq!(
            Strategy::Rsi(RsiConfig::default()).sentinel(),
            SentinelPolicy::Zero
        );
    }

    #[test]
    fn params_in_order() {
        let strategy = Strategy::SmaCrossover(SmaConfig {
            short_window: 5,
            long_window: 10,
            assets: Some(vec!["AAPL".into(), "MSFT".into()]),
        });
        let params = strategy.params();
        assert_eq!(params[0], ("short_window", "5".to_string()));
        assert_eq!(params[1], ("long_window", "10".to_string()));
        assert_eq!(params[2], ("assets", "AAPL,MSFT".to_string()));
    }

    #[test]
    fn empty_allow_list_is_invalid() {
        let mut strategy = Strategy::BuyAndHold(BuyAndHoldConfig::default());
        strategy.set_assets(Some(vec![]));
        let err = strategy.validate("hold").unwrap_err();
        assert!(matches!(err, EngineError::ConfigInvalid { key, .. } if key == "assets"));
    }

    #[test]
    fn dca_has_no_signals() {
        let strategy = Strategy::Dca(DcaConfig::default());
        assert!(strategy.generate_signals(&[]).is_none());
    }
}
