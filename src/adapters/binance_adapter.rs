//! Binance public market data over the REST klines endpoint.
//!
//! Only the unauthenticated `GET /api/v3/klines` call is used. Each kline is
//! a JSON array `[open_time_ms, open, high, low, close, volume, ...]` with
//! prices sent as strings.

use std::time::Duration;

use chrono::{DateTime, Utc};
use serde_json::Value;
use tracing::debug;

use crate::domain::candle::{Candle, is_strictly_increasing};
use crate::domain::error::TraderError;
use crate::ports::data_port::MarketDataPort;

const REQUEST_TIMEOUT: Duration = Duration::from_secs(30);

pub struct BinanceAdapter {
    client: reqwest::blocking::Client,
    base_url: String,
}

impl BinanceAdapter {
    pub fn new(base_url: &str) -> Result<Self, TraderError> {
        let client = reqwest::blocking::Client::builder()
            .timeout(REQUEST_TIMEOUT)
            .user_agent(concat!("spotbot/", env!("CARGO_PKG_VERSION")))
            .build()
            .map_err(|e| TraderError::Feed {
                symbol: String::new(),
                reason: format!("failed to build HTTP client: {e}"),
            })?;

        Ok(Self {
            client,
            base_url: base_url.trim_end_matches('/').to_string(),
        })
    }

    fn klines_url(&self, symbol: &str, timeframe: &str, limit: usize) -> String {
        format!(
            "{}/api/v3/klines?symbol={}&interval={}&limit={}",
            self.base_url,
            exchange_symbol(symbol),
            timeframe,
            limit
        )
    }
}

/// `ADA/USDT` -> `ADAUSDT`.
pub fn exchange_symbol(symbol: &str) -> String {
    symbol.replace('/', "").to_uppercase()
}

fn feed_error(symbol: &str, reason: impl Into<String>) -> TraderError {
    TraderError::Feed {
        symbol: symbol.to_string(),
        reason: reason.into(),
    }
}

fn number(value: &Value) -> Option<f64> {
    match value {
        Value::String(s) => s.parse().ok(),
        Value::Number(n) => n.as_f64(),
        _ => None,
    }
}

/// Parse a klines response body into candles, oldest first.
pub fn parse_klines(symbol: &str, body: &Value) -> Result<Vec<Candle>, TraderError> {
    let rows = body
        .as_array()
        .ok_or_else(|| feed_error(symbol, "klines response is not an array"))?;

    let mut candles = Vec::with_capacity(rows.len());
    for (i, row) in rows.iter().enumerate() {
        let fields = row
            .as_array()
            .filter(|f| f.len() >= 6)
            .ok_or_else(|| feed_error(symbol, format!("kline {i} is malformed")))?;

        let open_time = fields[0]
            .as_i64()
            .and_then(DateTime::<Utc>::from_timestamp_millis)
            .ok_or_else(|| feed_error(symbol, format!("kline {i} has an invalid open time")))?;

        let mut prices = [0.0_f64; 5];
        for (slot, field) in prices.iter_mut().zip(&fields[1..6]) {
            *slot = number(field)
                .ok_or_else(|| feed_error(symbol, format!("kline {i} has a non-numeric field")))?;
        }
        let [open, high, low, close, volume] = prices;

        candles.push(Candle {
            timestamp: open_time,
            open,
            high,
            low,
            close,
            volume,
        });
    }

    if !is_strictly_increasing(&candles) {
        return Err(feed_error(symbol, "kline timestamps are not strictly increasing"));
    }

    Ok(candles)
}

impl MarketDataPort for BinanceAdapter {
    fn fetch_candles(
        &self,
        symbol: &str,
        timeframe: &str,
        limit: usize,
    ) -> Result<Vec<Candle>, TraderError> {
        let url = self.klines_url(symbol, timeframe, limit);
        debug!(%symbol, %url, "fetching klines");

        let response = self
            .client
            .get(&url)
            .send()
            .map_err(|e| feed_error(symbol, format!("request failed: {e}")))?;

        let status = response.status();
        if !status.is_success() {
            let body = response.text().unwrap_or_default();
            return Err(feed_error(symbol, format!("HTTP {status}: {body}")));
        }

        let body: Value = response
            .json()
            .map_err(|e| feed_error(symbol, format!("invalid JSON: {e}")))?;

        parse_klines(symbol, &body)
    }
}
