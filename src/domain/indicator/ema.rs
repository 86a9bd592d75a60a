//! Exponential Moving Average indicator.
//!
//! k = 2/(n+1), seeded with the first close, then EMA[i] = C[i]*k + EMA[i-1]*(1-k).
//! Every point is valid; readiness is decided by the row builder.

use crate::domain::candle::Candle;
use crate::domain::indicator::{IndicatorPoint, IndicatorSeries, IndicatorType, IndicatorValue};

pub fn calculate_ema(candles: &[Candle], period: usize) -> IndicatorSeries {
    if period == 0 || candles.is_empty() {
        return IndicatorSeries {
            indicator_type: IndicatorType::Ema(period),
            values: Vec::new(),
        };
    }

    let mut values = Vec::with_capacity(candles.len());
    let k = smoothing_factor(period);
    let mut ema = candles[0].close;

    for (i, candle) in candles.iter().enumerate() {
        if i > 0 {
            ema = candle.close * k + ema * (1.0 - k);
        }
        values.push(IndicatorPoint {
            timestamp: candle.timestamp,
            valid: true,
            value: IndicatorValue::Simple(ema),
        });
    }

    IndicatorSeries {
        indicator_type: IndicatorType::Ema(period),
        values,
    }
}

pub fn smoothing_factor(period: usize) -> f64 {
    2.0 / (period as f64 + 1.0)
}

#[cfg(test)]
mod tests {
    use super::*;
    use chrono::{Duration, TimeZone, Utc};

    fn make_candles(prices: &[f64]) -> Vec<Candle> {
        let start = Utc.with_ymd_and_hms(2024, 1, 1, 0, 0, 0).unwrap();
        prices
            .iter()
            .enumerate()
            .map(|(i, &close)| Candle {
                timestamp: start + Duration::hours(i as i64),
                open: close,
                high: close,
                low: close,
                close,
                volume: 1000.0,
            })
            .collect()
    }

    fn value(series: &IndicatorSeries, i: usize) -> f64 {
        series.simple_at(i).unwrap()
    }

    #[test]
    fn ema_seed_is_first_close() {
        let candles = make_candles(&[10.0, 20.0, 30.0]);
        let series = calculate_ema(&candles, 3);
        assert!(series.values.iter().all(|p| p.valid));
        assert!((value(&series, 0) - 10.0).abs() < f64::EPSILON);
    }

    #[test]
    fn ema_recursive_calculation() {
        let candles = make_candles(&[10.0, 20.0, 30.0, 40.0]);
        let series = calculate_ema(&candles, 3);

        let k = 2.0 / 4.0;
        let e1 = 20.0 * k + 10.0 * (1.0 - k);
        let e2 = 30.0 * k + e1 * (1.0 - k);
        let e3 = 40.0 * k + e2 * (1.0 - k);

        assert!((value(&series, 1) - e1).abs() < 1e-12);
        assert!((value(&series, 2) - e2).abs() < 1e-12);
        assert!((value(&series, 3) - e3).abs() < 1e-12);
    }

    #[test]
    fn ema_period_1_tracks_close() {
        let candles = make_candles(&[10.0, 20.0, 30.0]);
        let series = calculate_ema(&candles, 1);
        assert!((value(&series, 1) - 20.0).abs() < f64::EPSILON);
        assert!((value(&series, 2) - 30.0).abs() < f64::EPSILON);
    }

    #[test]
    fn ema_equal_prices() {
        let candles = make_candles(&[100.0; 5]);
        let series = calculate_ema(&candles, 3);
        for i in 0..5 {
            assert!((value(&series, i) - 100.0).abs() < f64::EPSILON);
        }
    }

    #[test]
    fn ema_indicator_type() {
        let candles = make_candles(&[10.0, 20.0, 30.0]);
        let series = calculate_ema(&candles, 5);
        assert_eq!(series.indicator_type, IndicatorType::Ema(5));
    }

    #[test]
    fn ema_empty_candles() {
        let series = calculate_ema(&[], 3);
        assert!(series.values.is_empty());
    }

    #[test]
    fn ema_period_0() {
        let candles = make_candles(&[10.0, 20.0]);
        let series = calculate_ema(&candles, 0);
        assert!(series.values.is_empty());
    }

    #[test]
    fn ema_smoothing_factor() {
        assert!((smoothing_factor(10) - 2.0 / 11.0).abs() < f64::EPSILON);
        assert!((smoothing_factor(20) - 2.0 / 21.0).abs() < f64::EPSILON);
    }
}
