//! RSI mean-reversion: buy when oversold, sell when overbought.

use crate::domain::error::EngineError;
use crate::domain::indicator::rsi::calculate_rsi;
use crate::domain::price::PricePoint;
use crate::domain::signal::{DatedSignal, Signal};

#[derive(Debug, Clone, PartialEq)]
pub struct RsiConfig {
    pub period: usize,
    pub buy_threshold: f64,
    pub sell_threshold: f64,
    pub assets: Option<Vec<String>>,
}

impl Default for RsiConfig {
    fn default() -> Self {
        RsiConfig {
            period: 14,
            buy_threshold: 30.0,
            sell_threshold: 70.0,
            assets: None,
        }
    }
}

impl RsiConfig {
    pub fn validate(&self, section: &str) -> Result<(), EngineError> {
        if self.period == 0 {
            return Err(EngineError::invalid(section, "period", "period must be at least 1"));
        }
        for (key, value) in [
            ("buy_threshold", self.buy_threshold),
            ("sell_threshold", self.sell_threshold),
        ] {
            if !(0.0..=100.0).contains(&value) {
                return Err(EngineError::invalid(
                    section,
                    key,
                    format!("{} must be between 0 and 100", key),
                ));
            }
        }
        if self.buy_threshold >= self.sell_threshold {
            return Err(EngineError::invalid(
                section,
                "buy_threshold",
                "buy_threshold must be below sell_threshold",
            ));
        }
        Ok(())
    }

    pub fn generate_signals(&self, prices: &[PricePoint]) -> Vec<DatedSignal> {
        let series = calculate_rsi(prices, self.period);
        tracing::debug!(indicator = %series.indicator_type, points = prices.len(), "indicator computed");
        series
            .values
            .iter()
            .map(|point| {
                let signal = match point.get() {
                    Some(rsi) if rsi > self.sell_threshold => Signal::Sell,
                    Some(rsi) if rsi < self.buy_threshold => Signal::Buy,
                    _ => Signal::Hold,
                };
                DatedSignal {
                    date: point.date,
                    signal,
                }
            })
            .collect()
    }
}
