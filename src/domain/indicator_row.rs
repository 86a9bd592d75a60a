//! Enriched candle rows: a candle plus every indicator the strategies read.

use crate::domain::candle::Candle;
use crate::domain::indicator::IndicatorSeries;
use crate::domain::indicator::adx::calculate_adx;
use crate::domain::indicator::ema::calculate_ema;
use crate::domain::indicator::rsi::calculate_rsi;
use crate::domain::indicator::stochastic::calculate_stochastic;
use crate::domain::indicator::volume::calculate_volume_ratio;

/// Samples required before a row is ready for signal evaluation.
pub const WARMUP_CANDLES: usize = 50;

pub const EMA_FAST: usize = 20;
pub const EMA_SLOW: usize = 50;
pub const EMA_TREND: usize = 200;
pub const RSI_PERIOD: usize = 14;
pub const STOCH_K_PERIOD: usize = 14;
pub const STOCH_D_PERIOD: usize = 3;
pub const ADX_PERIOD: usize = 14;
pub const VOLUME_PERIOD: usize = 20;

#[derive(Debug, Clone)]
pub struct IndicatorRow {
    pub candle: Candle,
    pub ema20: f64,
    pub ema50: f64,
    pub ema200: f64,
    pub rsi: Option<f64>,
    pub stoch_k: Option<f64>,
    pub stoch_d: Option<f64>,
    pub adx: Option<f64>,
    pub vol_ratio: Option<f64>,
    pub ready: bool,
}

/// Enrich a candle series. One row per candle, in the same order.
pub fn compute_indicators(candles: &[Candle]) -> Vec<IndicatorRow> {
    let ema20 = calculate_ema(candles, EMA_FAST);
    let ema50 = calculate_ema(candles, EMA_SLOW);
    let ema200 = calculate_ema(candles, EMA_TREND);
    let rsi = calculate_rsi(candles, RSI_PERIOD);
    let stoch = calculate_stochastic(candles, STOCH_K_PERIOD, STOCH_D_PERIOD);
    let adx = calculate_adx(candles, ADX_PERIOD);
    let vol_ratio = calculate_volume_ratio(candles, VOLUME_PERIOD);

    candles
        .iter()
        .enumerate()
        .map(|(i, candle)| {
            let (stoch_k, stoch_d) = stoch.stochastic_at(i);
            IndicatorRow {
                candle: candle.clone(),
                ema20: ema_at(&ema20, i, candle),
                ema50: ema_at(&ema50, i, candle),
                ema200: ema_at(&ema200, i, candle),
                rsi: rsi.simple_at(i),
                stoch_k,
                stoch_d,
                adx: adx.simple_at(i),
                vol_ratio: vol_ratio.simple_at(i),
                ready: i + 1 >= WARMUP_CANDLES,
            }
        })
        .collect()
}

fn ema_at(series: &IndicatorSeries, index: usize, candle: &Candle) -> f64 {
    series.simple_at(index).unwrap_or(candle.close)
}
