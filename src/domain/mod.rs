//! Core domain types and logic.

pub mod candle;
pub mod position;
pub mod ledger;
pub mod execution;
pub mod indicator;
pub mod indicator_helpers;
pub mod indicator_row;
pub mod signal;
pub mod position_manager;
pub mod risk;
pub mod scheduler;
pub mod metrics;
pub mod config;
pub mod config_validation;
pub mod error;
