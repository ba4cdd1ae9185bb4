//! Directional signals emitted by discrete strategies.

use chrono::NaiveDate;

#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum Signal {
    Buy,
    #[default]
    Hold,
    Sell,
}

impl Signal {
    /// +1 buy, 0 hold, -1 sell.
    pub fn value(self) -> i8 {
        match self {
            Signal::Buy => 1,
            Signal::Hold => 0,
            Signal::Sell => -1,
        }
    }

    /// Desired unit delta before position constraints are applied.
    pub fn unit_delta(self) -> f64 {
        f64::from(self.value())
    }
}

/// A signal aligned with a price date.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct DatedSignal {
    pub date: NaiveDate,
    pub signal: Signal,
}
