//! Fill models: how a quoted price becomes an executed price, amount and fee.
//!
//! The position manager only ever talks to [`FillModel`]; simulated and
//! exchange-backed execution differ solely in the fills they return.

use crate::domain::error::TraderError;
use crate::ports::execution_port::ExecutionPort;

/// An executed order as seen by the position manager.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct Fill {
    pub price: f64,
    pub amount: f64,
    pub fee: f64,
}

pub trait FillModel {
    /// Buy `notional` worth of `symbol` quoted at `quote`.
    ///
    /// `position_value` is the unleveraged capital committed to the trade.
    fn fill_entry(
        &self,
        symbol: &str,
        quote: f64,
        notional: f64,
        position_value: f64,
    ) -> Result<Fill, TraderError>;

    /// Sell `amount` of `symbol` quoted at `quote`.
    fn fill_exit(
        &self,
        symbol: &str,
        quote: f64,
        amount: f64,
        position_value: f64,
    ) -> Result<Fill, TraderError>;
}

/// Entry (buy) execution price: `quote * (1 + slippage)`.
pub fn apply_slippage_entry(quote: f64, slippage: f64) -> f64 {
    quote * (1.0 + slippage)
}

/// Exit (sell) execution price: `quote * (1 - slippage)`.
pub fn apply_slippage_exit(quote: f64, slippage: f64) -> f64 {
    quote * (1.0 - slippage)
}

pub fn calculate_fee(position_value: f64, fee_rate: f64) -> f64 {
    position_value * fee_rate
}

fn check_quote(symbol: &str, quote: f64) -> Result<(), TraderError> {
    if quote.is_finite() && quote > 0.0 {
        Ok(())
    } else {
        Err(TraderError::Execution {
            symbol: symbol.to_string(),
            reason: format!("invalid quote {quote}"),
        })
    }
}

/// Paper trading: fixed-rate slippage and a fee on the committed capital.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct SimulatedFill {
    pub slippage: f64,
    pub fee_rate: f64,
}

impl FillModel for SimulatedFill {
    fn fill_entry(
        &self,
        symbol: &str,
        quote: f64,
        notional: f64,
        position_value: f64,
    ) -> Result<Fill, TraderError> {
        check_quote(symbol, quote)?;
        let price = apply_slippage_entry(quote, self.slippage);
        Ok(Fill {
            price,
            amount: notional / price,
            fee: calculate_fee(position_value, self.fee_rate),
        })
    }

    fn fill_exit(
        &self,
        symbol: &str,
        quote: f64,
        amount: f64,
        position_value: f64,
    ) -> Result<Fill, TraderError> {
        check_quote(symbol, quote)?;
        Ok(Fill {
            price: apply_slippage_exit(quote, self.slippage),
            amount,
            fee: calculate_fee(position_value, self.fee_rate),
        })
    }
}

/// Real orders through an [`ExecutionPort`]. Prices and amounts are whatever
/// the exchange reports; exchange fees stay outside this ledger.
pub struct DirectFill {
    port: Box<dyn ExecutionPort>,
}

impl DirectFill {
    pub fn new(port: Box<dyn ExecutionPort>) -> Self {
        DirectFill { port }
    }
}

impl FillModel for DirectFill {
    fn fill_entry(
        &self,
        symbol: &str,
        quote: f64,
        notional: f64,
        _position_value: f64,
    ) -> Result<Fill, TraderError> {
        check_quote(symbol, quote)?;
        let confirmation = self.port.submit_market_buy(symbol, notional / quote)?;
        Ok(Fill {
            price: confirmation.price,
            amount: confirmation.amount,
            fee: 0.0,
        })
    }

    fn fill_exit(
        &self,
        symbol: &str,
        _quote: f64,
        amount: f64,
        _position_value: f64,
    ) -> Result<Fill, TraderError> {
        let confirmation = self.port.submit_market_sell(symbol, amount)?;
        Ok(Fill {
            price: confirmation.price,
            amount: confirmation.amount,
            fee: 0.0,
        })
    }
}
