//! Moving-average crossover: long while the short SMA is above the long SMA.

use crate::domain::error::EngineError;
use crate::domain::indicator::sma::calculate_sma;
use crate::domain::price::PricePoint;
use crate::domain::signal::{DatedSignal, Signal};

#[derive(Debug, Clone, PartialEq)]
pub struct SmaConfig {
    pub short_window: usize,
    pub long_window: usize,
    pub assets: Option<Vec<String>>,
}

impl Default for SmaConfig {
    fn default() -> Self {
        SmaConfig {
            short_window: 20,
            long_window: 50,
            assets: None,
        }
    }
}

impl SmaConfig {
    pub fn validate(&self, section: &str) -> Result<(), EngineError> {
        if self.short_window == 0 {
            return Err(EngineError::invalid(
                section,
                "short_window",
                "short_window must be at least 1",
            ));
        }
        if self.long_window == 0 {
            return Err(EngineError::invalid(
                section,
                "long_window",
                "long_window must be at least 1",
            ));
        }
        if self.short_window >= self.long_window {
            return Err(EngineError::invalid(
                section,
                "short_window",
                "short_window must be less than long_window",
            ));
        }
        Ok(())
    }

    pub fn generate_signals(&self, prices: &[PricePoint]) -> Vec<DatedSignal> {
        let short = calculate_sma(prices, self.short_window);
        let long = calculate_sma(prices, self.long_window);
        tracing::debug!(
            short = %short.indicator_type,
            long = %long.indicator_type,
            points = prices.len(),
            "indicators computed"
        );

        short
            .values
            .iter()
            .zip(long.values.iter())
            .map(|(s, l)| {
                let signal = match (s.get(), l.get()) {
                    (Some(s), Some(l)) if s > l => Signal::Buy,
                    (Some(s), Some(l)) if s < l => Signal::Sell,
                    _ => Signal::Hold,
                };
                DatedSignal {
                    date: s.date,
                    signal,
                }
            })
            .collect()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::domain::position::{self, PositionPolicy};
    use chrono::{Days, NaiveDate};

    fn prices(closes: &[f64]) -> Vec<PricePoint> {
        let start = NaiveDate::from_ymd_opt(2024, 1, 1).unwrap();
        closes
            .iter()
            .enumerate()
            .map(|(i, &close)| PricePoint {
                date: start + Days::new(i as u64),
                ticker: "AAPL".into(),
                open: close,
                high: close,
                low: close,
                close,
                volume: 0.0,
            })
            .collect()
    }

    fn config(short: usize, long: usize) -> SmaConfig {
        SmaConfig {
            short_window: short,
            long_window: long,
            assets: None,
        }
    }

    #[test]
    fn hold_until_long_window_fills() {
        let signals = config(1, 3).generate_signals(&prices(&[1.0, 2.0, 3.0]));
        assert_eq!(signals[0].signal, Signal::Hold);
        assert_eq!(signals[1].signal, Signal::Hold);
        assert_eq!(signals[2].signal, Signal::Buy);
    }

    #[test]
    fn crossover_directions() {
        // rising then falling
        let signals = config(1, 2).generate_signals(&prices(&[1.0, 2.0, 1.0]));
        let values: Vec<Signal> = signals.iter().map(|s| s.signal).collect();
        assert_eq!(values, vec![Signal::Hold, Signal::Buy, Signal::Sell]);
    }

    #[test]
    fn tie_holds() {
        let signals = config(1, 2).generate_signals(&prices(&[5.0, 5.0, 5.0]));
        assert!(signals.iter().all(|s| s.signal == Signal::Hold));
    }

    #[test]
    fn flat_tail_after_large_prices_holds() {
        let mut closes: Vec<f64> = (0..300)
            .map(|i| 60_000.0 + ((i * 37) % 101) as f64 * 0.37)
            .collect();
        closes.extend(std::iter::repeat_n(1.1, 60));
        let history = prices(&closes);
        let strategy = config(5, 20);

        let signals = strategy.generate_signals(&history);
        assert!(signals[330..].iter().all(|s| s.signal == Signal::Hold));

        let trades = position::resolve("AAPL", &signals, PositionPolicy::LongOnly);
        assert!(trades[330..].iter().all(|t| t.trade_units == 0.0));
    }

    #[test]
    fn validate_windows() {
        assert!(SmaConfig::default().validate("sma").is_ok());
        let err = config(0, 5).validate("sma").unwrap_err();
        assert!(matches!(err, EngineError::ConfigInvalid { key, .. } if key == "short_window"));
        let err = config(5, 0).validate("sma").unwrap_err();
        assert!(matches!(err, EngineError::ConfigInvalid { key, .. } if key == "long_window"));
        assert!(config(50, 20).validate("sma").is_err());
    }

    #[test]
    fn empty_history() {
        assert!(SmaConfig::default().generate_signals(&[]).is_empty());
    }
}
