//! Price history access port trait.

use crate::domain::error::EngineError;
use crate::domain::price::PricePoint;

pub trait DataPort {
    /// Full price history, sorted by (ticker, date).
    fn load_prices(&self) -> Result<Vec<PricePoint>, EngineError>;

    /// Distinct tickers in the history, sorted.
    fn list_tickers(&self) -> Result<Vec<String>, EngineError> {
        let mut tickers: Vec<String> = self
            .load_prices()?
            .into_iter()
            .map(|p| p.ticker)
            .collect();
        tickers.sort();
        tickers.dedup();
        Ok(tickers)
    }
}
