//! Core domain types and logic: the backtesting pipeline from price history
//! to ranked strategy outcomes.

pub mod price;
pub mod signal;
pub mod indicator;
pub mod strategy;
pub mod position;
pub mod portfolio;
pub mod aggregate;
pub mod runner;
pub mod backtest;
pub mod metrics;
pub mod compare;
pub mod universe;
pub mod config_validation;
pub mod error;
