//! Per-strategy position lifecycle: FLAT -> OPEN -> FLAT.
//!
//! At most one position exists per strategy. Opening and closing are
//! all-or-nothing: a failed fill leaves every position, the capital ledger
//! and the risk state exactly as they were.

use std::collections::HashMap;
use std::collections::hash_map::Entry;

use chrono::{DateTime, Utc};

use crate::domain::config::StrategyConfig;
use crate::domain::error::TraderError;
use crate::domain::execution::{Fill, FillModel};
use crate::domain::ledger::CapitalLedger;
use crate::domain::position::{ExitReason, Position, TradeRecord, protective_levels};
use crate::domain::risk::{EntryBlock, RiskGovernor};
use crate::domain::signal::Signal;

/// What one tick did to a strategy's position.
#[derive(Debug, Clone, PartialEq)]
pub enum TickAction {
    Opened(Position),
    Closed(TradeRecord),
    /// Open position kept; `highest_price` may have moved.
    Holding,
    /// Flat and no entry signal.
    Idle,
    EntryBlocked(EntryBlock),
}

pub struct PositionManager {
    positions: HashMap<String, Position>,
    fill_model: Box<dyn FillModel>,
}

impl PositionManager {
    pub fn new(fill_model: Box<dyn FillModel>) -> Self {
        PositionManager {
            positions: HashMap::new(),
            fill_model,
        }
    }

    pub fn position(&self, strategy: &str) -> Option<&Position> {
        self.positions.get(strategy)
    }

    pub fn has_position(&self, strategy: &str) -> bool {
        self.positions.contains_key(strategy)
    }

    pub fn open_count(&self) -> usize {
        self.positions.len()
    }

    pub fn positions(&self) -> impl Iterator<Item = &Position> {
        self.positions.values()
    }

    /// Drive one strategy for one tick at `price`.
    ///
    /// An open position is checked for exits; an entry signal while open is
    /// ignored. A flat strategy opens on an entry signal unless the risk
    /// governor blocks it.
    pub fn on_tick(
        &mut self,
        strategy: &StrategyConfig,
        signal: Signal,
        price: f64,
        now: DateTime<Utc>,
        ledger: &mut CapitalLedger,
        risk: &mut RiskGovernor,
    ) -> Result<TickAction, TraderError> {
        if self.has_position(&strategy.name) {
            return match self.manage_open(strategy, signal.exit, price, now, ledger)? {
                Some(record) => {
                    risk.observe(ledger.capital, now);
                    Ok(TickAction::Closed(record))
                }
                None => Ok(TickAction::Holding),
            };
        }

        if !signal.entry {
            return Ok(TickAction::Idle);
        }

        if let Some(block) = risk.entry_block(ledger.capital, now) {
            return Ok(TickAction::EntryBlocked(block));
        }

        let position = self.open(strategy, price, ledger.capital, now)?;
        Ok(TickAction::Opened(position.clone()))
    }

    /// Open a position sized from `capital`. Returns the existing position
    /// untouched if the strategy is already open.
    pub fn open(
        &mut self,
        strategy: &StrategyConfig,
        quote: f64,
        capital: f64,
        now: DateTime<Utc>,
    ) -> Result<&Position, TraderError> {
        match self.positions.entry(strategy.name.clone()) {
            Entry::Occupied(existing) => Ok(&*existing.into_mut()),
            Entry::Vacant(slot) => {
                let position_value = capital * strategy.position_size;
                let notional = position_value * strategy.leverage;
                let fill = self
                    .fill_model
                    .fill_entry(&strategy.symbol, quote, notional, position_value)?;
                let (stop_loss, take_profit) =
                    protective_levels(fill.price, strategy.stop_loss, strategy.take_profit);

                Ok(&*slot.insert(Position {
                    strategy: strategy.name.clone(),
                    symbol: strategy.symbol.clone(),
                    entry_price: fill.price,
                    amount: fill.amount,
                    leverage: strategy.leverage,
                    stop_loss,
                    take_profit,
                    highest_price: fill.price,
                    entry_time: now,
                    entry_fee: fill.fee,
                    position_value,
                }))
            }
        }
    }

    /// Close `strategy`'s position at `quote`, settle it into the ledger and
    /// return the trade record.
    pub fn close(
        &mut self,
        strategy: &str,
        quote: f64,
        reason: ExitReason,
        now: DateTime<Utc>,
        ledger: &mut CapitalLedger,
    ) -> Result<TradeRecord, TraderError> {
        let position = self
            .positions
            .get(strategy)
            .ok_or_else(|| TraderError::Execution {
                symbol: strategy.to_string(),
                reason: "no open position".to_string(),
            })?;

        let fill = self.fill_model.fill_exit(
            &position.symbol,
            quote,
            position.amount,
            position.position_value,
        )?;
        let record = trade_record(position, &fill, reason, now);

        self.positions.remove(strategy);
        ledger.settle(record.clone());
        Ok(record)
    }

    fn manage_open(
        &mut self,
        strategy: &StrategyConfig,
        signal_exit: bool,
        price: f64,
        now: DateTime<Utc>,
        ledger: &mut CapitalLedger,
    ) -> Result<Option<TradeRecord>, TraderError> {
        let Some(current) = self.positions.get(&strategy.name) else {
            return Ok(None);
        };

        let mut updated = current.clone();
        updated.update_highest(price);

        match updated.exit_reason(price, strategy.trailing_stop, signal_exit) {
            Some(reason) => self
                .close(&strategy.name, price, reason, now, ledger)
                .map(Some),
            None => {
                self.positions.insert(strategy.name.clone(), updated);
                Ok(None)
            }
        }
    }
}

/// P&L of a closed position. Returns are leveraged against the capital
/// committed at open; both sides' fees come off the dollar result.
fn trade_record(position: &Position, exit: &Fill, reason: ExitReason, now: DateTime<Utc>) -> TradeRecord {
    let price_change = (exit.price - position.entry_price) / position.entry_price;
    let fees = position.entry_fee + exit.fee;

    TradeRecord {
        strategy: position.strategy.clone(),
        symbol: position.symbol.clone(),
        entry_price: position.entry_price,
        exit_price: exit.price,
        pnl_pct: price_change * position.leverage * 100.0,
        pnl_usd: position.position_value * price_change * position.leverage - fees,
        fees,
        reason,
        entry_time: position.entry_time,
        exit_time: now,
    }
}
