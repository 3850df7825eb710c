//! Core domain types and simulation logic.

pub mod bar;
pub mod merge;
pub mod trade;
pub mod execution;
pub mod backtest;
pub mod ledger;
pub mod metrics;
pub mod config_validation;
pub mod error;
