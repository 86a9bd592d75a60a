//! Per-strategy entry/exit predicates over enriched rows.
//!
//! Each evaluator reads only the latest few rows it is given. A predicate is
//! false whenever a row it consults is not ready or an indicator it needs is
//! undefined.

use std::fmt;
use std::str::FromStr;

use crate::domain::indicator_row::IndicatorRow;

pub const RSI_OVERSOLD: f64 = 35.0;
pub const RSI_EXIT: f64 = 60.0;
pub const RSI_MIN_VOLUME_RATIO: f64 = 0.8;
/// Position of the trend-filter row counted from the end, latest row = 1.
pub const RSI_TREND_LOOKBACK: usize = 10;

pub const STOCH_OVERSOLD: f64 = 30.0;
pub const STOCH_EXIT: f64 = 80.0;

pub const ADX_STRONG: f64 = 25.0;
pub const ADX_WEAK: f64 = 20.0;
pub const ADX_RISE_LOOKBACK: usize = 3;
pub const BREAKOUT_WINDOW: usize = 20;

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum SignalKind {
    RsiReversal,
    StochCrossover,
    AdxBreakout,
}

#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct Signal {
    pub entry: bool,
    pub exit: bool,
}

#[derive(Debug, Clone, PartialEq, Eq, thiserror::Error)]
#[error("unknown signal kind '{0}' (expected rsi_reversal, stoch_crossover or adx_breakout)")]
pub struct UnknownSignalKind(pub String);

impl SignalKind {
    pub fn as_str(&self) -> &'static str {
        match self {
            SignalKind::RsiReversal => "rsi_reversal",
            SignalKind::StochCrossover => "stoch_crossover",
            SignalKind::AdxBreakout => "adx_breakout",
        }
    }

    pub fn evaluate(&self, rows: &[IndicatorRow]) -> Signal {
        match self {
            SignalKind::RsiReversal => rsi_reversal(rows),
            SignalKind::StochCrossover => stoch_crossover(rows),
            SignalKind::AdxBreakout => adx_breakout(rows),
        }
    }
}

impl fmt::Display for SignalKind {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

impl FromStr for SignalKind {
    type Err = UnknownSignalKind;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.trim().to_lowercase().as_str() {
            "rsi_reversal" => Ok(SignalKind::RsiReversal),
            "stoch_crossover" => Ok(SignalKind::StochCrossover),
            "adx_breakout" => Ok(SignalKind::AdxBreakout),
            other => Err(UnknownSignalKind(other.to_string())),
        }
    }
}

/// The row `back` positions before the latest one, if it exists and is ready.
fn ready_row(rows: &[IndicatorRow], back: usize) -> Option<&IndicatorRow> {
    let idx = rows.len().checked_sub(1 + back)?;
    rows.get(idx).filter(|r| r.ready)
}

fn rsi_reversal(rows: &[IndicatorRow]) -> Signal {
    let Some(latest) = ready_row(rows, 0) else {
        return Signal::default();
    };

    let exit = latest.rsi.is_some_and(|rsi| rsi > RSI_EXIT);

    let entry = rsi_reversal_entry(rows, latest).unwrap_or(false);

    Signal { entry, exit }
}

fn rsi_reversal_entry(rows: &[IndicatorRow], latest: &IndicatorRow) -> Option<bool> {
    let prev = ready_row(rows, 1)?;
    let trend = ready_row(rows, RSI_TREND_LOOKBACK - 1)?;
    let (rsi, prev_rsi, vol_ratio) = (latest.rsi?, prev.rsi?, latest.vol_ratio?);
    Some(
        rsi < RSI_OVERSOLD
            && rsi > prev_rsi
            && vol_ratio > RSI_MIN_VOLUME_RATIO
            && trend.ema20 > latest.ema50,
    )
}

fn stoch_crossover(rows: &[IndicatorRow]) -> Signal {
    let Some(latest) = ready_row(rows, 0) else {
        return Signal::default();
    };

    let exit = latest.stoch_k.is_some_and(|k| k > STOCH_EXIT);

    let entry = stoch_crossover_entry(rows, latest).unwrap_or(false);

    Signal { entry, exit }
}

fn stoch_crossover_entry(rows: &[IndicatorRow], latest: &IndicatorRow) -> Option<bool> {
    let prev = ready_row(rows, 1)?;
    let (k, d) = (latest.stoch_k?, latest.stoch_d?);
    let (prev_k, prev_d) = (prev.stoch_k?, prev.stoch_d?);
    Some(k < STOCH_OVERSOLD && k > d && prev_k <= prev_d && latest.ema20 > latest.ema50)
}

fn adx_breakout(rows: &[IndicatorRow]) -> Signal {
    let Some(latest) = ready_row(rows, 0) else {
        return Signal::default();
    };

    let exit = latest.adx.is_some_and(|adx| adx < ADX_WEAK);

    let entry = adx_breakout_entry(rows, latest).unwrap_or(false);

    Signal { entry, exit }
}

fn adx_breakout_entry(rows: &[IndicatorRow], latest: &IndicatorRow) -> Option<bool> {
    let earlier = ready_row(rows, ADX_RISE_LOOKBACK)?;
    let (adx, earlier_adx) = (latest.adx?, earlier.adx?);
    // Highest high of the rows preceding the latest one.
    let end = rows.len() - 1;
    let start = end.checked_sub(BREAKOUT_WINDOW)?;
    let prior_high = rows[start..end]
        .iter()
        .map(|r| r.candle.high)
        .fold(f64::NEG_INFINITY, f64::max);
    Some(adx > ADX_STRONG && adx > earlier_adx && latest.candle.close > prior_high)
}
