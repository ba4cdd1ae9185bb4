//! Simple Moving Average of closes.
//!
//! Each window mean is taken as the latest close plus the mean deviation
//! from it, so a constant window yields exactly that constant and equal
//! windows of different lengths compare equal. Warmup: first (n-1) points
//! are invalid.

use crate::domain::indicator::{IndicatorPoint, IndicatorSeries, IndicatorType};
use crate::domain::price::PricePoint;

pub fn calculate_sma(prices: &[PricePoint], period: usize) -> IndicatorSeries {
    if period == 0 {
        return IndicatorSeries {
            indicator_type: IndicatorType::Sma(period),
            values: prices.iter().map(|p| IndicatorPoint::invalid(p.date)).collect(),
        };
    }

    let values = prices
        .iter()
        .enumerate()
        .map(|(i, price)| {
            if i + 1 < period {
                return IndicatorPoint::invalid(price.date);
            }
            let window = &prices[i + 1 - period..=i];
            let deviation: f64 = window.iter().map(|p| p.close - price.close).sum();
            IndicatorPoint {
                date: price.date,
                valid: true,
                value: price.close + deviation / period as f64,
            }
        })
        .collect();

    IndicatorSeries {
        indicator_type: IndicatorType::Sma(period),
        values,
    }
}
