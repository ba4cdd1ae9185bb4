//! Asset universe selection.
//!
//! Parses asset allow-lists from configuration and narrows a price history
//! to the tickers a strategy trades.

use crate::domain::error::EngineError;
use crate::domain::price::{PricePoint, group_by_ticker};
use std::collections::{BTreeMap, HashSet};

#[derive(Debug, Clone, thiserror::Error)]
pub enum UniverseError {
    #[error("empty token in asset list")]
    EmptyToken,

    #[error("duplicate asset: {0}")]
    DuplicateAsset(String),
}

/// Split a comma-separated asset list. Tickers are kept verbatim apart from
/// surrounding whitespace.
pub fn parse_assets(input: &str) -> Result<Vec<String>, UniverseError> {
    let mut assets = Vec::new();
    let mut seen = HashSet::new();

    for token in input.split(',') {
        let trimmed = token.trim();
        if trimmed.is_empty() {
            return Err(UniverseError::EmptyToken);
        }
        if !seen.insert(trimmed.to_string()) {
            return Err(UniverseError::DuplicateAsset(trimmed.to_string()));
        }
        assets.push(trimmed.to_string());
    }

    Ok(assets)
}

/// Group `prices` by ticker, keeping only allow-listed tickers.
///
/// `None` keeps every ticker. Allow-listed tickers absent from the history
/// are logged and skipped; nothing left at all is an error.
pub fn select_universe(
    prices: &[PricePoint],
    assets: Option<&[String]>,
) -> Result<BTreeMap<String, Vec<PricePoint>>, EngineError> {
    let mut groups = group_by_ticker(prices)?;

    if let Some(allowed) = assets {
        let allowed: HashSet<&str> = allowed.iter().map(String::as_str).collect();
        let before = groups.len();
        groups.retain(|ticker, _| allowed.contains(ticker.as_str()));
        if groups.len() < before {
            tracing::debug!(
                dropped = before - groups.len(),
                "tickers outside the allow-list dropped"
            );
        }
        for missing in allowed.iter().filter(|t| !groups.contains_key(**t)) {
            tracing::warn!(ticker = missing, "allow-listed ticker has no price history");
        }
    }

    if groups.is_empty() {
        return Err(EngineError::EmptyUniverse);
    }

    tracing::debug!(tickers = groups.len(), "universe selected");
    Ok(groups)
}
