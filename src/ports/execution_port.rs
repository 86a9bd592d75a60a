//! Order execution port trait.

use crate::domain::error::TraderError;

/// What the exchange reports back for a filled market order.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct FillConfirmation {
    pub price: f64,
    pub amount: f64,
}

pub trait ExecutionPort {
    fn submit_market_buy(&self, symbol: &str, amount: f64) -> Result<FillConfirmation, TraderError>;
    fn submit_market_sell(&self, symbol: &str, amount: f64) -> Result<FillConfirmation, TraderError>;
}
