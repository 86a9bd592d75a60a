//! Running capital balance and the sequence of closed trades.

use crate::domain::position::TradeRecord;

#[derive(Debug, Clone, PartialEq)]
pub struct CapitalLedger {
    pub initial_capital: f64,
    pub capital: f64,
    pub trades: Vec<TradeRecord>,
}

impl CapitalLedger {
    pub fn new(initial_capital: f64) -> Self {
        CapitalLedger {
            initial_capital,
            capital: initial_capital,
            trades: Vec::new(),
        }
    }

    /// Apply a closed trade: the only place capital changes.
    pub fn settle(&mut self, record: TradeRecord) {
        self.capital += record.pnl_usd;
        self.trades.push(record);
    }

    pub fn trade_count(&self) -> usize {
        self.trades.len()
    }

    pub fn total_pnl(&self) -> f64 {
        self.capital - self.initial_capital
    }

    pub fn total_fees(&self) -> f64 {
        self.trades.iter().map(|t| t.fees).sum()
    }

    /// Capital after each closed trade, starting with the initial balance.
    pub fn equity_path(&self) -> Vec<f64> {
        let mut path = Vec::with_capacity(self.trades.len() + 1);
        let mut capital = self.initial_capital;
        path.push(capital);
        for trade in &self.trades {
            capital += trade.pnl_usd;
            path.push(capital);
        }
        path
    }
}
