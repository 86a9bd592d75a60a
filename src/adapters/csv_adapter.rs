//! CSV candle files: the replay feed and the matching writer.
//!
//! One file per symbol, named after the exchange symbol (`ADAUSDT.csv`), with
//! the header `timestamp,open,high,low,close,volume`. Timestamps may be
//! RFC 3339, `YYYY-MM-DD HH:MM:SS` (UTC) or epoch milliseconds.

use std::cell::Cell;
use std::collections::{BTreeSet, HashMap};
use std::fs::File;
use std::path::{Path, PathBuf};

use chrono::{DateTime, NaiveDateTime, Utc};
use serde::{Deserialize, Serialize};

use crate::adapters::binance_adapter::exchange_symbol;
use crate::domain::candle::Candle;
use crate::domain::error::TraderError;
use crate::ports::data_port::{MarketDataPort, ReplayFeedPort};

#[derive(Debug, Deserialize, Serialize)]
struct CandleRow {
    timestamp: String,
    open: f64,
    high: f64,
    low: f64,
    close: f64,
    volume: f64,
}

pub fn candle_file(dir: &Path, symbol: &str) -> PathBuf {
    dir.join(format!("{}.csv", exchange_symbol(symbol)))
}

fn parse_timestamp(value: &str) -> Option<DateTime<Utc>> {
    let value = value.trim();
    if let Ok(dt) = DateTime::parse_from_rfc3339(value) {
        return Some(dt.with_timezone(&Utc));
    }
    if let Ok(naive) = NaiveDateTime::parse_from_str(value, "%Y-%m-%d %H:%M:%S") {
        return Some(naive.and_utc());
    }
    value
        .parse::<i64>()
        .ok()
        .and_then(DateTime::<Utc>::from_timestamp_millis)
}

/// Read a candle file, sorted by timestamp with duplicate timestamps dropped.
pub fn read_candles(path: &Path, symbol: &str) -> Result<Vec<Candle>, TraderError> {
    let feed_error = |reason: String| TraderError::Feed {
        symbol: symbol.to_string(),
        reason,
    };

    let file = File::open(path)
        .map_err(|e| feed_error(format!("failed to read {}: {}", path.display(), e)))?;
    let mut rdr = csv::Reader::from_reader(file);

    let mut candles = Vec::new();
    for (line, result) in rdr.deserialize::<CandleRow>().enumerate() {
        let row = result.map_err(|e| feed_error(format!("CSV parse error: {}", e)))?;
        let timestamp = parse_timestamp(&row.timestamp).ok_or_else(|| {
            feed_error(format!(
                "invalid timestamp '{}' on row {}",
                row.timestamp,
                line + 1
            ))
        })?;
        candles.push(Candle {
            timestamp,
            open: row.open,
            high: row.high,
            low: row.low,
            close: row.close,
            volume: row.volume,
        });
    }

    candles.sort_by_key(|c| c.timestamp);
    candles.dedup_by_key(|c| c.timestamp);
    Ok(candles)
}

/// Write candles in the format [`read_candles`] accepts.
pub fn write_candles(path: &Path, candles: &[Candle]) -> Result<(), TraderError> {
    let mut wtr = csv::Writer::from_path(path).map_err(|e| TraderError::Io(e.into()))?;
    for candle in candles {
        wtr.serialize(CandleRow {
            timestamp: candle.timestamp.to_rfc3339(),
            open: candle.open,
            high: candle.high,
            low: candle.low,
            close: candle.close,
            volume: candle.volume,
        })
        .map_err(|e| TraderError::Io(e.into()))?;
    }
    wtr.flush()?;
    Ok(())
}

/// Historical candles revealed one timestamp at a time.
///
/// `fetch_candles` only returns candles at or before the replay clock, so the
/// trading engine sees exactly what a live feed would have shown at that
/// moment.
pub struct CsvReplayFeed {
    series: HashMap<String, Vec<Candle>>,
    clock: Cell<Option<DateTime<Utc>>>,
}

impl CsvReplayFeed {
    /// Load `{SYMBOL}.csv` for every symbol from `dir`.
    pub fn load(dir: &Path, symbols: &[String]) -> Result<Self, TraderError> {
        let mut series = HashMap::new();
        for symbol in symbols {
            let candles = read_candles(&candle_file(dir, symbol), symbol)?;
            series.insert(symbol.to_uppercase(), candles);
        }
        Ok(Self::from_series(series))
    }

    pub fn from_series(series: HashMap<String, Vec<Candle>>) -> Self {
        let series = series
            .into_iter()
            .map(|(symbol, candles)| (symbol.to_uppercase(), candles))
            .collect();
        CsvReplayFeed {
            series,
            clock: Cell::new(None),
        }
    }

    pub fn clock(&self) -> Option<DateTime<Utc>> {
        self.clock.get()
    }
}

impl MarketDataPort for CsvReplayFeed {
    fn fetch_candles(
        &self,
        symbol: &str,
        _timeframe: &str,
        limit: usize,
    ) -> Result<Vec<Candle>, TraderError> {
        let candles = self
            .series
            .get(&symbol.to_uppercase())
            .ok_or_else(|| TraderError::Feed {
                symbol: symbol.to_string(),
                reason: "no replay data loaded".to_string(),
            })?;

        let visible = match self.clock.get() {
            Some(now) => candles.partition_point(|c| c.timestamp <= now),
            None => candles.len(),
        };
        let start = visible.saturating_sub(limit);
        Ok(candles[start..visible].to_vec())
    }
}

impl ReplayFeedPort for CsvReplayFeed {
    fn timeline(&self) -> Vec<DateTime<Utc>> {
        self.series
            .values()
            .flatten()
            .map(|c| c.timestamp)
            .collect::<BTreeSet<_>>()
            .into_iter()
            .collect()
    }

    fn advance_to(&self, now: DateTime<Utc>) {
        self.clock.set(Some(now));
    }
}
