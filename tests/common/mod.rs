#![allow(dead_code)]

use chrono::{DateTime, Duration, TimeZone, Utc};
use spotbot::domain::candle::Candle;
use spotbot::domain::config::{StrategyConfig, TraderConfig};
use spotbot::domain::error::TraderError;
use spotbot::domain::position::TradeRecord;
use spotbot::domain::signal::SignalKind;
use spotbot::ports::data_port::MarketDataPort;
use spotbot::ports::execution_port::{ExecutionPort, FillConfirmation};
use spotbot::ports::ledger_port::TradeLedgerPort;
use std::cell::RefCell;
use std::collections::HashMap;
use std::path::PathBuf;
use std::time::Duration as StdDuration;

pub struct MockFeed {
    pub data: HashMap<String, Vec<Candle>>,
    pub errors: HashMap<String, String>,
}

impl MockFeed {
    pub fn new() -> Self {
        Self {
            data: HashMap::new(),
            errors: HashMap::new(),
        }
    }

    pub fn with_candles(mut self, symbol: &str, candles: Vec<Candle>) -> Self {
        self.data.insert(symbol.to_string(), candles);
        self
    }

    pub fn with_error(mut self, symbol: &str, reason: &str) -> Self {
        self.errors.insert(symbol.to_string(), reason.to_string());
        self
    }
}

impl MarketDataPort for MockFeed {
    fn fetch_candles(
        &self,
        symbol: &str,
        _timeframe: &str,
        limit: usize,
    ) -> Result<Vec<Candle>, TraderError> {
        if let Some(reason) = self.errors.get(symbol) {
            return Err(TraderError::Feed {
                symbol: symbol.to_string(),
                reason: reason.clone(),
            });
        }
        let candles = self.data.get(symbol).cloned().unwrap_or_default();
        let start = candles.len().saturating_sub(limit);
        Ok(candles[start..].to_vec())
    }
}

/// Fills every order at a fixed price and records what was sent.
pub struct MockExecution {
    pub price: f64,
    pub orders: RefCell<Vec<(String, &'static str, f64)>>,
    pub reject: bool,
}

impl MockExecution {
    pub fn at(price: f64) -> Self {
        Self {
            price,
            orders: RefCell::new(Vec::new()),
            reject: false,
        }
    }

    fn fill(&self, symbol: &str, side: &'static str, amount: f64) -> Result<FillConfirmation, TraderError> {
        if self.reject {
            return Err(TraderError::Execution {
                symbol: symbol.to_string(),
                reason: "insufficient balance".to_string(),
            });
        }
        self.orders
            .borrow_mut()
            .push((symbol.to_string(), side, amount));
        Ok(FillConfirmation {
            price: self.price,
            amount,
        })
    }
}

impl ExecutionPort for MockExecution {
    fn submit_market_buy(&self, symbol: &str, amount: f64) -> Result<FillConfirmation, TraderError> {
        self.fill(symbol, "buy", amount)
    }

    fn submit_market_sell(&self, symbol: &str, amount: f64) -> Result<FillConfirmation, TraderError> {
        self.fill(symbol, "sell", amount)
    }
}

#[derive(Default)]
pub struct MemoryLedger {
    pub records: Vec<TradeRecord>,
    pub flushes: usize,
}

impl TradeLedgerPort for MemoryLedger {
    fn append(&mut self, record: &TradeRecord) -> Result<(), TraderError> {
        self.records.push(record.clone());
        Ok(())
    }

    fn flush(&mut self) -> Result<(), TraderError> {
        self.flushes += 1;
        Ok(())
    }
}

pub fn t0() -> DateTime<Utc> {
    Utc.with_ymd_and_hms(2024, 1, 1, 0, 0, 0).unwrap()
}

pub fn make_candle(index: usize, high: f64, low: f64, close: f64) -> Candle {
    Candle {
        timestamp: t0() + Duration::hours(index as i64),
        open: close,
        high,
        low,
        close,
        volume: 100.0,
    }
}

/// Hourly candles with a fixed 1% range around each close.
pub fn candles_from_closes(closes: &[f64]) -> Vec<Candle> {
    closes
        .iter()
        .enumerate()
        .map(|(i, &c)| make_candle(i, c * 1.01, c * 0.99, c))
        .collect()
}

/// 60 choppy bars around 1.00, a 30-bar rally from 1.03 to 1.32, then 20 flat
/// bars at 0.90. An ADX breakout strategy enters during the rally and is
/// stopped out on the first flat bar.
pub fn breakout_then_crash() -> Vec<Candle> {
    let mut candles = Vec::new();
    for i in 0..60 {
        let (high, low) = if i % 2 == 0 { (1.01, 0.99) } else { (1.02, 0.98) };
        candles.push(make_candle(i, high, low, 1.00));
    }
    for j in 0..30 {
        let high = 1.03 + 0.01 * j as f64;
        candles.push(make_candle(60 + j, high, high - 0.02, high - 0.002));
    }
    for k in 0..20 {
        candles.push(make_candle(90 + k, 0.91, 0.89, 0.90));
    }
    candles
}

pub fn adx_strategy(name: &str, symbol: &str) -> StrategyConfig {
    StrategyConfig {
        name: name.to_string(),
        signal: SignalKind::AdxBreakout,
        symbol: symbol.to_string(),
        enabled: true,
        leverage: 2.0,
        position_size: 0.25,
        stop_loss: 0.08,
        take_profit: 0.0,
        trailing_stop: 0.0,
    }
}

pub fn trader_config(strategies: Vec<StrategyConfig>) -> TraderConfig {
    TraderConfig {
        initial_capital: 10_000.0,
        max_leverage: 5.0,
        max_drawdown: 0.15,
        max_daily_loss: 0.03,
        update_interval: StdDuration::from_secs(60),
        summary_interval: StdDuration::ZERO,
        simulation: true,
        slippage: 0.0,
        fees: 0.0,
        timeframe: "1h".to_string(),
        candle_limit: 300,
        ledger_path: PathBuf::from("trades.csv"),
        feed_base_url: "http://localhost".to_string(),
        strategies,
    }
}

pub const VALID_INI: &str = r#"
[trader]
initial_capital = 10000
max_leverage = 5.0
max_drawdown = 0.15
max_daily_loss = 0.03
update_interval = 60
simulation = true
slippage = 0.001
fees = 0.001
timeframe = 1h
candle_limit = 300
strategies = ADA_RSI,SOL_STOCH,XRP_ADX

[feed]
base_url = https://api.binance.com

[ADA_RSI]
signal = rsi_reversal
symbol = ADA/USDT
leverage = 2.0
position_size = 0.25
stop_loss = 0.08
take_profit = 0.15
trailing_stop = 0.10

[SOL_STOCH]
signal = stoch_crossover
symbol = SOL/USDT
leverage = 1.5
position_size = 0.20
stop_loss = 0.06
take_profit = 0.12
trailing_stop = 0.08

[XRP_ADX]
signal = adx_breakout
enabled = false
symbol = XRP/USDT
leverage = 2.5
position_size = 0.30
stop_loss = 0.10
take_profit = 0.20
trailing_stop = 0.12
"#;
