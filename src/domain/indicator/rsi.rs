//! RSI (Relative Strength Index) indicator implementation.
//!
//! Average gain and average loss are simple means over the trailing
//! `period` close-to-close changes:
//!
//! Formula: RSI = 100 - (100 / (1 + avg_gain / avg_loss))
//! If avg_loss == 0 and avg_gain > 0: RSI = 100
//! If both are 0 the point is invalid (no movement in the window).
//!
//! Warmup: first `period` points are invalid (need `period` price changes).

use crate::domain::indicator::{IndicatorPoint, IndicatorSeries, IndicatorType};
use crate::domain::price::PricePoint;

pub fn calculate_rsi(prices: &[PricePoint], period: usize) -> IndicatorSeries {
    if period == 0 || prices.len() < 2 {
        return IndicatorSeries {
            indicator_type: IndicatorType::Rsi(period),
            values: prices.iter().map(|p| IndicatorPoint::invalid(p.date)).collect(),
        };
    }

    let mut gains: Vec<f64> = Vec::with_capacity(prices.len() - 1);
    let mut losses: Vec<f64> = Vec::with_capacity(prices.len() - 1);
    for w in prices.windows(2) {
        let change = w[1].close - w[0].close;
        gains.push(change.max(0.0));
        losses.push((-change).max(0.0));
    }

    let mut values = Vec::with_capacity(prices.len());
    values.push(IndicatorPoint::invalid(prices[0].date));

    for (i, price) in prices.iter().enumerate().skip(1) {
        // gains[i - 1] is the change into price i
        if i < period {
            values.push(IndicatorPoint::invalid(price.date));
            continue;
        }

        let window = i - period..i;
        let avg_gain = gains[window.clone()].iter().sum::<f64>() / period as f64;
        let avg_loss = losses[window].iter().sum::<f64>() / period as f64;

        let point = match rsi_value(avg_gain, avg_loss) {
            Some(rsi) => IndicatorPoint {
                date: price.date,
                valid: true,
                value: rsi,
            },
            None => IndicatorPoint::invalid(price.date),
        };
        values.push(point);
    }

    IndicatorSeries {
        indicator_type: IndicatorType::Rsi(period),
        values,
    }
}

fn rsi_value(avg_gain: f64, avg_loss: f64) -> Option<f64> {
    if avg_loss == 0.0 {
        return (avg_gain > 0.0).then_some(100.0);
    }
    Some(100.0 - (100.0 / (1.0 + avg_gain / avg_loss)))
}

#[cfg(test)]
mod tests {
    use super::*;
    use chrono::NaiveDate;

    fn make_price(date: &str, close: f64) -> PricePoint {
        PricePoint {
            date: NaiveDate::parse_from_str(date, "%Y-%m-%d").unwrap(),
            ticker: "TEST".into(),
            open: close,
            high: close,
            low: close,
            close,
            volume: 1000.0,
        }
    }

    fn series_of(closes: &[f64]) -> Vec<PricePoint> {
        closes
            .iter()
            .enumerate()
            .map(|(i, &c)| make_price(&format!("2024-01-{:02}", i + 1), c))
            .collect()
    }

    #[test]
    fn rsi_empty_prices() {
        let series = calculate_rsi(&[], 14);
        assert_eq!(series.values.len(), 0);
    }

    #[test]
    fn rsi_single_price() {
        let series = calculate_rsi(&[make_price("2024-01-01", 100.0)], 14);
        assert_eq!(series.values.len(), 1);
        assert!(!series.values[0].valid);
    }

    #[test]
    fn rsi_warmup_period() {
        let prices: Vec<PricePoint> = (1..=6)
            .map(|i| make_price(&format!("2024-01-{:02}", i), 100.0 + (i % 2) as f64))
            .collect();
        let series = calculate_rsi(&prices, 3);

        assert_eq!(series.values.len(), 6);
        for i in 0..3 {
            assert!(!series.values[i].valid, "point {} should be invalid", i);
        }
        for i in 3..6 {
            assert!(series.values[i].valid, "point {} should be valid", i);
        }
    }

    #[test]
    fn rsi_all_gains_saturates() {
        let series = calculate_rsi(&series_of(&[1.0, 2.0, 3.0, 4.0]), 3);
        assert_eq!(series.values[3].get(), Some(100.0));
    }

    #[test]
    fn rsi_all_losses_is_zero() {
        let series = calculate_rsi(&series_of(&[4.0, 3.0, 2.0, 1.0]), 3);
        assert_eq!(series.values[3].get(), Some(0.0));
    }

    #[test]
    fn rsi_flat_window_is_undefined() {
        let series = calculate_rsi(&series_of(&[5.0, 5.0, 5.0, 5.0]), 3);
        assert!(!series.values[3].valid);
    }

    #[test]
    fn rsi_simple_average_known_value() {
        // changes: +2, -1, +1 -> avg_gain = 1, avg_loss = 1/3, rs = 3
        let series = calculate_rsi(&series_of(&[10.0, 12.0, 11.0, 12.0]), 3);
        let rsi = series.values[3].get().unwrap();
        assert!((rsi - 75.0).abs() < 1e-9);
    }

    #[test]
    fn rsi_window_slides() {
        // window for last point: -1, +1, -3 -> gain 1/3, loss 4/3, rs = 0.25
        let series = calculate_rsi(&series_of(&[10.0, 12.0, 11.0, 12.0, 9.0]), 3);
        let rsi = series.values[4].get().unwrap();
        assert!((rsi - 20.0).abs() < 1e-9);
    }

    #[test]
    fn rsi_in_range() {
        let closes: Vec<f64> = (1..=20).map(|i| 100.0 + (i as f64 % 7.0 - 3.0) * 2.0).collect();
        let series = calculate_rsi(&series_of(&closes), 5);
        for rsi in series.values.iter().filter_map(IndicatorPoint::get) {
            assert!((0.0..=100.0).contains(&rsi), "RSI {} out of range", rsi);
        }
    }

    #[test]
    fn rsi_zero_period() {
        let series = calculate_rsi(&series_of(&[1.0, 2.0]), 0);
        assert_eq!(series.values.len(), 2);
        assert!(series.values.iter().all(|p| !p.valid));
        assert_eq!(series.indicator_type, IndicatorType::Rsi(0));
    }
}
