//! Volume ratio: current volume over its `n`-period simple moving average.

use crate::domain::candle::Candle;
use crate::domain::indicator::{IndicatorSeries, IndicatorType, series_from_options};
use crate::domain::indicator_helpers::rolling_mean;

pub fn calculate_volume_ratio(candles: &[Candle], period: usize) -> IndicatorSeries {
    let volumes: Vec<Option<f64>> = candles.iter().map(|c| Some(c.volume)).collect();
    let averages = rolling_mean(&volumes, period);

    let ratios: Vec<Option<f64>> = candles
        .iter()
        .zip(averages.iter())
        .map(|(candle, avg)| match avg {
            Some(avg) if *avg > 0.0 => Some(candle.volume / avg),
            _ => None,
        })
        .collect();

    series_from_options(
        IndicatorType::VolumeRatio(period),
        candles.iter().map(|c| c.timestamp),
        &ratios,
    )
}
