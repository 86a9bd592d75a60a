//! Trade ledger persistence port trait.

use crate::domain::error::TraderError;
use crate::domain::position::TradeRecord;

/// Append-only store of closed trades. Append order is chronological.
pub trait TradeLedgerPort {
    fn append(&mut self, record: &TradeRecord) -> Result<(), TraderError>;
    fn flush(&mut self) -> Result<(), TraderError>;
}
