//! Buy one unit at the first date and hold it.

use crate::domain::price::PricePoint;
use crate::domain::signal::{DatedSignal, Signal};

#[derive(Debug, Clone, Default, PartialEq)]
pub struct BuyAndHoldConfig {
    pub assets: Option<Vec<String>>,
}

impl BuyAndHoldConfig {
    pub fn generate_signals(&self, prices: &[PricePoint]) -> Vec<DatedSignal> {
        prices
            .iter()
            .enumerate()
            .map(|(i, p)| DatedSignal {
                date: p.date,
                signal: if i == 0 { Signal::Buy } else { Signal::Hold },
            })
            .collect()
    }
}
