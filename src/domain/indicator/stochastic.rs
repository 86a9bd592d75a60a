//! Stochastic oscillator (%K, %D).
//!
//! %K = 100 * (close - lowest_low(k)) / (highest_high(k) - lowest_low(k))
//! %D = simple mean of the last `d` %K values
//!
//! A flat window (highest_high == lowest_low) leaves %K undefined, and any
//! %D window containing an undefined %K is undefined as well.

use crate::domain::candle::Candle;
use crate::domain::indicator::{
    IndicatorPoint, IndicatorSeries, IndicatorType, IndicatorValue, invalid_point,
};
use crate::domain::indicator_helpers::{rolling_max, rolling_mean, rolling_min};

pub fn calculate_stochastic(candles: &[Candle], k_period: usize, d_period: usize) -> IndicatorSeries {
    let highs: Vec<f64> = candles.iter().map(|c| c.high).collect();
    let lows: Vec<f64> = candles.iter().map(|c| c.low).collect();
    let highest = rolling_max(&highs, k_period);
    let lowest = rolling_min(&lows, k_period);

    let k_values: Vec<Option<f64>> = candles
        .iter()
        .enumerate()
        .map(|(i, candle)| match (highest[i], lowest[i]) {
            (Some(hh), Some(ll)) if hh > ll => Some(100.0 * (candle.close - ll) / (hh - ll)),
            _ => None,
        })
        .collect();

    let d_values = rolling_mean(&k_values, d_period);

    let values = candles
        .iter()
        .enumerate()
        .map(|(i, candle)| match k_values[i] {
            Some(k) => IndicatorPoint {
                timestamp: candle.timestamp,
                valid: true,
                value: IndicatorValue::Stochastic { k, d: d_values[i] },
            },
            None => invalid_point(candle.timestamp),
        })
        .collect();

    IndicatorSeries {
        indicator_type: IndicatorType::Stochastic { k_period, d_period },
        values,
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use chrono::{Duration, TimeZone, Utc};

    fn make_candle(i: usize, high: f64, low: f64, close: f64) -> Candle {
        let start = Utc.with_ymd_and_hms(2024, 1, 1, 0, 0, 0).unwrap();
        Candle {
            timestamp: start + Duration::hours(i as i64),
            open: close,
            high,
            low,
            close,
            volume: 1000.0,
        }
    }

    #[test]
    fn stochastic_warmup() {
        let candles: Vec<Candle> = (0..5)
            .map(|i| make_candle(i, 110.0 + i as f64, 90.0, 100.0))
            .collect();
        let series = calculate_stochastic(&candles, 3, 2);

        assert_eq!(series.stochastic_at(0), (None, None));
        assert_eq!(series.stochastic_at(1), (None, None));
        let (k, d) = series.stochastic_at(2);
        assert!(k.is_some());
        assert!(d.is_none());
        let (k, d) = series.stochastic_at(3);
        assert!(k.is_some());
        assert!(d.is_some());
    }

    #[test]
    fn stochastic_known_values() {
        let candles = vec![
            make_candle(0, 10.0, 0.0, 5.0),
            make_candle(1, 12.0, 2.0, 10.0),
            make_candle(2, 14.0, 4.0, 14.0),
        ];
        let series = calculate_stochastic(&candles, 3, 1);
        // hh 14, ll 0, close 14 → 100
        let (k, d) = series.stochastic_at(2);
        assert!((k.unwrap() - 100.0).abs() < 1e-9);
        assert!((d.unwrap() - 100.0).abs() < 1e-9);
    }

    #[test]
    fn stochastic_d_is_mean_of_k() {
        let candles = vec![
            make_candle(0, 10.0, 0.0, 5.0),
            make_candle(1, 10.0, 0.0, 2.0),
            make_candle(2, 10.0, 0.0, 8.0),
        ];
        let series = calculate_stochastic(&candles, 1, 3);
        let (_, d) = series.stochastic_at(2);
        assert!((d.unwrap() - 50.0).abs() < 1e-9);
    }

    #[test]
    fn flat_window_leaves_k_undefined() {
        let candles: Vec<Candle> = (0..6).map(|i| make_candle(i, 100.0, 100.0, 100.0)).collect();
        let series = calculate_stochastic(&candles, 3, 3);
        for i in 0..6 {
            assert_eq!(series.stochastic_at(i), (None, None));
            assert!(!series.values[i].valid);
        }
    }

    #[test]
    fn undefined_k_poisons_d_window() {
        let mut candles: Vec<Candle> = (0..3).map(|i| make_candle(i, 100.0, 100.0, 100.0)).collect();
        candles.push(make_candle(3, 110.0, 95.0, 105.0));
        candles.push(make_candle(4, 112.0, 96.0, 108.0));
        let series = calculate_stochastic(&candles, 2, 3);
        // %K at 1 and 2 undefined (flat window); %K defined from 3 on.
        let (k3, d3) = series.stochastic_at(3);
        assert!(k3.is_some());
        assert!(d3.is_none());
        let (_, d4) = series.stochastic_at(4);
        assert!(d4.is_none());
    }

    #[test]
    fn stochastic_indicator_type() {
        let series = calculate_stochastic(&[], 14, 3);
        assert!(series.values.is_empty());
        assert_eq!(
            series.indicator_type,
            IndicatorType::Stochastic {
                k_period: 14,
                d_period: 3
            }
        );
    }
}
