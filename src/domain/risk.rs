//! Capital circuit breakers.
//!
//! The governor only ever blocks new entries. Open positions keep being
//! managed by their own exits, and the loop keeps running.

use std::fmt;

use chrono::{DateTime, NaiveDate, Utc};

/// Why new entries are currently refused.
#[derive(Debug, Clone, Copy, PartialEq)]
pub enum EntryBlock {
    MaxDrawdown { drawdown: f64, limit: f64 },
    MaxDailyLoss { loss: f64, limit: f64 },
}

impl fmt::Display for EntryBlock {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            EntryBlock::MaxDrawdown { drawdown, limit } => write!(
                f,
                "drawdown {:.2}% reached limit {:.2}%",
                drawdown * 100.0,
                limit * 100.0
            ),
            EntryBlock::MaxDailyLoss { loss, limit } => write!(
                f,
                "daily loss {:.2}% reached limit {:.2}%",
                loss * 100.0,
                limit * 100.0
            ),
        }
    }
}

#[derive(Debug, Clone, PartialEq)]
pub struct RiskGovernor {
    /// Fraction below peak capital; 0 disables.
    pub max_drawdown: f64,
    /// Fraction below the day's opening capital; 0 disables.
    pub max_daily_loss: f64,
    peak_capital: f64,
    day: NaiveDate,
    day_start_capital: f64,
}

impl RiskGovernor {
    pub fn new(max_drawdown: f64, max_daily_loss: f64, capital: f64, now: DateTime<Utc>) -> Self {
        RiskGovernor {
            max_drawdown,
            max_daily_loss,
            peak_capital: capital,
            day: now.date_naive(),
            day_start_capital: capital,
        }
    }

    /// Track peak capital and roll the day over on a new UTC date.
    pub fn observe(&mut self, capital: f64, now: DateTime<Utc>) {
        let today = now.date_naive();
        if today != self.day {
            self.day = today;
            self.day_start_capital = capital;
        }
        if capital > self.peak_capital {
            self.peak_capital = capital;
        }
    }

    pub fn drawdown(&self, capital: f64) -> f64 {
        loss_fraction(self.peak_capital, capital)
    }

    pub fn daily_loss(&self, capital: f64) -> f64 {
        loss_fraction(self.day_start_capital, capital)
    }

    /// `Some` when a breaker is tripped and the entry must be skipped.
    pub fn entry_block(&mut self, capital: f64, now: DateTime<Utc>) -> Option<EntryBlock> {
        self.observe(capital, now);

        let drawdown = self.drawdown(capital);
        if self.max_drawdown > 0.0 && drawdown >= self.max_drawdown {
            return Some(EntryBlock::MaxDrawdown {
                drawdown,
                limit: self.max_drawdown,
            });
        }

        let loss = self.daily_loss(capital);
        if self.max_daily_loss > 0.0 && loss >= self.max_daily_loss {
            return Some(EntryBlock::MaxDailyLoss {
                loss,
                limit: self.max_daily_loss,
            });
        }

        None
    }
}

fn loss_fraction(reference: f64, capital: f64) -> f64 {
    if reference <= 0.0 {
        return 0.0;
    }
    ((reference - capital) / reference).max(0.0)
}
