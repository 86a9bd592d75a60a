//! RSI (Relative Strength Index) indicator implementation.
//!
//! Average gain and average loss are simple means over the trailing `n`
//! close-to-close changes (no Wilder smoothing).
//!
//! Formula: RSI = 100 - (100 / (1 + avg_gain / avg_loss))
//! If avg_loss == 0: RSI = 100
//!
//! Warmup: first n candles are invalid (need n price changes).

use crate::domain::candle::Candle;
use crate::domain::indicator::{IndicatorSeries, IndicatorType, series_from_options};
use crate::domain::indicator_helpers::rolling_mean;

pub fn calculate_rsi(candles: &[Candle], period: usize) -> IndicatorSeries {
    let mut gains: Vec<Option<f64>> = Vec::with_capacity(candles.len());
    let mut losses: Vec<Option<f64>> = Vec::with_capacity(candles.len());

    for (i, candle) in candles.iter().enumerate() {
        if i == 0 {
            gains.push(None);
            losses.push(None);
            continue;
        }
        let change = candle.close - candles[i - 1].close;
        gains.push(Some(if change > 0.0 { change } else { 0.0 }));
        losses.push(Some(if change < 0.0 { -change } else { 0.0 }));
    }

    let avg_gain = rolling_mean(&gains, period);
    let avg_loss = rolling_mean(&losses, period);

    let rsi: Vec<Option<f64>> = avg_gain
        .iter()
        .zip(avg_loss.iter())
        .map(|(g, l)| match (g, l) {
            (Some(g), Some(l)) => Some(rsi_from_averages(*g, *l)),
            _ => None,
        })
        .collect();

    series_from_options(
        IndicatorType::Rsi(period),
        candles.iter().map(|c| c.timestamp),
        &rsi,
    )
}

fn rsi_from_averages(avg_gain: f64, avg_loss: f64) -> f64 {
    if avg_loss == 0.0 {
        100.0
    } else {
        100.0 - (100.0 / (1.0 + avg_gain / avg_loss))
    }
}
