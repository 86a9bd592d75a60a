//! Open positions, exit reasons and closed-trade records.

use std::fmt;

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

/// Why a position was closed. Variants are listed in evaluation priority.
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum ExitReason {
    StopLoss,
    TakeProfit,
    TrailingStop,
    StrategySignal,
}

impl ExitReason {
    pub fn as_str(&self) -> &'static str {
        match self {
            ExitReason::StopLoss => "stop_loss",
            ExitReason::TakeProfit => "take_profit",
            ExitReason::TrailingStop => "trailing_stop",
            ExitReason::StrategySignal => "strategy_signal",
        }
    }
}

impl fmt::Display for ExitReason {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

/// A long spot position held by one strategy.
///
/// `stop_loss` and `take_profit` are absolute price levels; `0.0` disables
/// the corresponding check.
#[derive(Debug, Clone, PartialEq)]
pub struct Position {
    pub strategy: String,
    pub symbol: String,
    pub entry_price: f64,
    pub amount: f64,
    pub leverage: f64,
    pub stop_loss: f64,
    pub take_profit: f64,
    pub highest_price: f64,
    pub entry_time: DateTime<Utc>,
    pub entry_fee: f64,
    /// Capital committed at open, before leverage.
    pub position_value: f64,
}

impl Position {
    pub fn market_value(&self, price: f64) -> f64 {
        self.amount * price
    }

    /// Leveraged return on the committed capital, in percent.
    pub fn unrealized_pnl_pct(&self, price: f64) -> f64 {
        (price - self.entry_price) / self.entry_price * self.leverage * 100.0
    }

    pub fn update_highest(&mut self, price: f64) {
        if price > self.highest_price {
            self.highest_price = price;
        }
    }

    pub fn should_stop_loss(&self, price: f64) -> bool {
        self.stop_loss > 0.0 && price <= self.stop_loss
    }

    pub fn should_take_profit(&self, price: f64) -> bool {
        self.take_profit > 0.0 && price >= self.take_profit
    }

    /// Current trailing exit level, or `None` when trailing is disabled.
    pub fn trailing_level(&self, trailing_pct: f64) -> Option<f64> {
        (trailing_pct > 0.0).then(|| self.highest_price * (1.0 - trailing_pct))
    }

    pub fn should_trail_out(&self, price: f64, trailing_pct: f64) -> bool {
        self.trailing_level(trailing_pct)
            .is_some_and(|level| price <= level)
    }

    /// First matching exit condition, in fixed priority order.
    ///
    /// Does not touch `highest_price`; callers update it first.
    pub fn exit_reason(&self, price: f64, trailing_pct: f64, signal_exit: bool) -> Option<ExitReason> {
        if self.should_stop_loss(price) {
            Some(ExitReason::StopLoss)
        } else if self.should_take_profit(price) {
            Some(ExitReason::TakeProfit)
        } else if self.should_trail_out(price, trailing_pct) {
            Some(ExitReason::TrailingStop)
        } else if signal_exit {
            Some(ExitReason::StrategySignal)
        } else {
            None
        }
    }
}

/// Stop and target levels for a fill, `0.0` where the percentage is zero.
pub fn protective_levels(fill_price: f64, stop_pct: f64, take_pct: f64) -> (f64, f64) {
    let stop_loss = if stop_pct > 0.0 {
        fill_price * (1.0 - stop_pct)
    } else {
        0.0
    };
    let take_profit = if take_pct > 0.0 {
        fill_price * (1.0 + take_pct)
    } else {
        0.0
    };
    (stop_loss, take_profit)
}

/// A closed trade as written to, and read back from, the trade ledger.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct TradeRecord {
    pub strategy: String,
    pub symbol: String,
    pub entry_price: f64,
    pub exit_price: f64,
    pub pnl_pct: f64,
    pub pnl_usd: f64,
    pub fees: f64,
    pub reason: ExitReason,
    pub entry_time: DateTime<Utc>,
    pub exit_time: DateTime<Utc>,
}
