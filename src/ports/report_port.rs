//! Report output port trait.

use crate::domain::backtest::BacktestResult;
use crate::domain::compare::Comparison;
use crate::domain::error::EngineError;

/// Port for persisting backtest and comparison tables.
pub trait ReportPort {
    fn write_backtest(&self, result: &BacktestResult) -> Result<(), EngineError>;

    fn write_comparison(&self, comparison: &Comparison) -> Result<(), EngineError>;
}
