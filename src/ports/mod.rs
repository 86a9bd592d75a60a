//! Port traits: the seams between the trading core and the outside world.

pub mod config_port;
pub mod data_port;
pub mod execution_port;
pub mod ledger_port;
