//! Position resolution: signals to executable trade units.
//!
//! A left fold over one ticker's signals in date order. Each accepted
//! buy adds one unit, each accepted sell removes one. The running position
//! never goes below zero.

use chrono::NaiveDate;

use super::signal::DatedSignal;

/// Signed unit quantity actually executed at a date.
#[derive(Debug, Clone, PartialEq)]
pub struct TradeRecord {
    pub date: NaiveDate,
    pub ticker: String,
    pub trade_units: f64,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum PositionPolicy {
    /// Buys always accepted; sells rejected when nothing is held.
    LongOnly,
    /// As `LongOnly`, and buys rejected once one unit is held.
    BuyOnce,
}

/// Running state carried through the fold.
#[derive(Debug, Clone, Copy, Default, PartialEq)]
pub struct Position {
    pub units: f64,
}

impl Position {
    /// Apply a desired unit delta under `policy`, returning the accepted delta.
    pub fn apply(&mut self, delta: f64, policy: PositionPolicy) -> f64 {
        let accepted = if delta < 0.0 {
            if self.units + delta < 0.0 { 0.0 } else { delta }
        } else if delta > 0.0 && policy == PositionPolicy::BuyOnce && self.units >= 1.0 {
            0.0
        } else {
            delta
        };
        self.units += accepted;
        accepted
    }
}

pub fn resolve(ticker: &str, signals: &[DatedSignal], policy: PositionPolicy) -> Vec<TradeRecord> {
    let mut position = Position::default();
    signals
        .iter()
        .map(|s| {
            let wanted = s.signal.unit_delta();
            let accepted = position.apply(wanted, policy);
            if accepted != wanted {
                tracing::trace!(ticker, date = %s.date, wanted, "trade rejected");
            }
            TradeRecord {
                date: s.date,
                ticker: ticker.to_string(),
                trade_units: accepted,
            }
        })
        .collect()
}
