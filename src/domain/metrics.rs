//! Performance summary over the capital ledger.

use std::collections::BTreeMap;
use std::fmt;

use crate::domain::ledger::CapitalLedger;
use crate::domain::position::ExitReason;

/// Closed-trade statistics for one strategy or one exit reason.
#[derive(Debug, Clone, Default, PartialEq)]
pub struct GroupStats {
    pub trades: usize,
    pub wins: usize,
    pub pnl: f64,
}

impl GroupStats {
    fn add(&mut self, pnl: f64) {
        self.trades += 1;
        if pnl > 0.0 {
            self.wins += 1;
        }
        self.pnl += pnl;
    }

    pub fn win_rate(&self) -> f64 {
        if self.trades > 0 {
            self.wins as f64 / self.trades as f64
        } else {
            0.0
        }
    }
}

pub const ALERT_MIN_WIN_RATE: f64 = 0.40;
pub const ALERT_MIN_PROFIT_FACTOR: f64 = 1.5;
pub const ALERT_MAX_DRAWDOWN: f64 = 0.15;

/// A performance figure outside its healthy range.
#[derive(Debug, Clone, Copy, PartialEq)]
pub enum RiskAlert {
    LowWinRate(f64),
    LowProfitFactor(f64),
    DeepDrawdown(f64),
}

impl fmt::Display for RiskAlert {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            RiskAlert::LowWinRate(rate) => write!(
                f,
                "win rate {:.1}% is below {:.0}%",
                rate * 100.0,
                ALERT_MIN_WIN_RATE * 100.0
            ),
            RiskAlert::LowProfitFactor(pf) => write!(
                f,
                "profit factor {:.2} is below {:.2}",
                pf, ALERT_MIN_PROFIT_FACTOR
            ),
            RiskAlert::DeepDrawdown(dd) => write!(
                f,
                "max drawdown {:.1}% exceeds {:.0}%",
                dd * 100.0,
                ALERT_MAX_DRAWDOWN * 100.0
            ),
        }
    }
}

#[derive(Debug, Clone, PartialEq)]
pub struct Summary {
    pub starting_capital: f64,
    pub current_capital: f64,
    pub total_pnl: f64,
    /// Fraction of starting capital.
    pub total_return: f64,
    pub total_trades: usize,
    pub trades_won: usize,
    pub trades_lost: usize,
    pub win_rate: f64,
    pub profit_factor: f64,
    pub avg_win: f64,
    pub avg_loss: f64,
    pub largest_win: f64,
    pub largest_loss: f64,
    /// Deepest peak-to-trough fall of the closed-trade equity path, as a fraction.
    pub max_drawdown: f64,
    pub total_fees: f64,
    pub avg_hold_hours: f64,
    pub open_positions: usize,
    pub by_strategy: BTreeMap<String, GroupStats>,
    pub by_reason: BTreeMap<ExitReason, GroupStats>,
}

impl Summary {
    pub fn compute(ledger: &CapitalLedger, open_positions: usize) -> Self {
        let trades = &ledger.trades;

        let mut trades_won = 0usize;
        let mut trades_lost = 0usize;
        let mut total_wins = 0.0_f64;
        let mut total_losses = 0.0_f64;
        let mut largest_win = 0.0_f64;
        let mut largest_loss = 0.0_f64;
        let mut hold_seconds = 0i64;
        let mut by_strategy: BTreeMap<String, GroupStats> = BTreeMap::new();
        let mut by_reason: BTreeMap<ExitReason, GroupStats> = BTreeMap::new();

        for trade in trades {
            let pnl = trade.pnl_usd;
            if pnl > 0.0 {
                trades_won += 1;
                total_wins += pnl;
                largest_win = largest_win.max(pnl);
            } else if pnl < 0.0 {
                trades_lost += 1;
                total_losses += pnl.abs();
                largest_loss = largest_loss.max(pnl.abs());
            }
            hold_seconds += (trade.exit_time - trade.entry_time).num_seconds();
            by_strategy.entry(trade.strategy.clone()).or_default().add(pnl);
            by_reason.entry(trade.reason).or_default().add(pnl);
        }

        let total_trades = trades.len();
        let win_rate = if total_trades > 0 {
            trades_won as f64 / total_trades as f64
        } else {
            0.0
        };

        let profit_factor = if total_losses > 0.0 {
            total_wins / total_losses
        } else if total_wins > 0.0 {
            f64::INFINITY
        } else {
            0.0
        };

        let total_return = if ledger.initial_capital > 0.0 {
            ledger.total_pnl() / ledger.initial_capital
        } else {
            0.0
        };

        Summary {
            starting_capital: ledger.initial_capital,
            current_capital: ledger.capital,
            total_pnl: ledger.total_pnl(),
            total_return,
            total_trades,
            trades_won,
            trades_lost,
            win_rate,
            profit_factor,
            avg_win: mean(total_wins, trades_won),
            avg_loss: mean(total_losses, trades_lost),
            largest_win,
            largest_loss,
            max_drawdown: max_drawdown(&ledger.equity_path()),
            total_fees: ledger.total_fees(),
            avg_hold_hours: mean(hold_seconds as f64 / 3600.0, total_trades),
            open_positions,
            by_strategy,
            by_reason,
        }
    }
}

impl Summary {
    /// Figures outside their healthy range. Nothing is flagged before the
    /// first closed trade.
    pub fn alerts(&self) -> Vec<RiskAlert> {
        let mut alerts = Vec::new();
        if self.total_trades == 0 {
            return alerts;
        }
        if self.win_rate < ALERT_MIN_WIN_RATE {
            alerts.push(RiskAlert::LowWinRate(self.win_rate));
        }
        if self.profit_factor < ALERT_MIN_PROFIT_FACTOR {
            alerts.push(RiskAlert::LowProfitFactor(self.profit_factor));
        }
        if self.max_drawdown > ALERT_MAX_DRAWDOWN {
            alerts.push(RiskAlert::DeepDrawdown(self.max_drawdown));
        }
        alerts
    }
}

fn mean(total: f64, count: usize) -> f64 {
    if count > 0 { total / count as f64 } else { 0.0 }
}

fn max_drawdown(equity: &[f64]) -> f64 {
    let Some(&first) = equity.first() else {
        return 0.0;
    };
    let mut peak = first;
    let mut max_dd = 0.0_f64;
    for &value in equity {
        if value > peak {
            peak = value;
        } else if peak > 0.0 {
            max_dd = max_dd.max((peak - value) / peak);
        }
    }
    max_dd
}

impl fmt::Display for Summary {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        writeln!(f, "Starting Capital:  ${:.2}", self.starting_capital)?;
        writeln!(f, "Current Capital:   ${:.2}", self.current_capital)?;
        writeln!(
            f,
            "Total PnL:         ${:+.2} ({:+.2}%)",
            self.total_pnl,
            self.total_return * 100.0
        )?;
        writeln!(
            f,
            "Trades:            {} ({} won / {} lost, win rate {:.1}%)",
            self.total_trades,
            self.trades_won,
            self.trades_lost,
            self.win_rate * 100.0
        )?;
        writeln!(f, "Profit Factor:     {:.2}", self.profit_factor)?;
        writeln!(
            f,
            "Avg Win / Loss:    ${:.2} / ${:.2}",
            self.avg_win, self.avg_loss
        )?;
        writeln!(
            f,
            "Largest Win/Loss:  ${:.2} / ${:.2}",
            self.largest_win, self.largest_loss
        )?;
        writeln!(f, "Max Drawdown:      {:.2}%", self.max_drawdown * 100.0)?;
        writeln!(f, "Fees Paid:         ${:.2}", self.total_fees)?;
        writeln!(f, "Avg Hold Time:     {:.1} hours", self.avg_hold_hours)?;
        write!(f, "Open Positions:    {}", self.open_positions)?;

        for (name, stats) in &self.by_strategy {
            write!(
                f,
                "\n  {:<12} | trades {:>3} | pnl ${:>+10.2} | win rate {:>5.1}%",
                name,
                stats.trades,
                stats.pnl,
                stats.win_rate() * 100.0
            )?;
        }
        for (reason, stats) in &self.by_reason {
            write!(
                f,
                "\n  {:<16} | count {:>3} | pnl ${:>+10.2}",
                reason.as_str(),
                stats.trades,
                stats.pnl
            )?;
        }
        Ok(())
    }
}
