//! ADX (Average Directional Index) indicator.
//!
//! Steps:
//! 1. +DM = max(high - prev_high, 0), -DM = max(prev_low - low, 0)
//! 2. Smooth +DM, -DM and true range with an `n`-sample simple mean (ATR)
//! 3. +DI = 100 * smoothed(+DM) / ATR, -DI = 100 * smoothed(-DM) / ATR
//! 4. DX = 100 * |+DI - -DI| / (+DI + -DI)
//! 5. ADX = `n`-sample simple mean of DX
//!
//! ATR == 0 leaves DI and DX undefined. +DI + -DI == 0 yields DX = 0.
//! First defined ADX sits at index 2n - 1.

use crate::domain::candle::Candle;
use crate::domain::indicator::{IndicatorSeries, IndicatorType, series_from_options};
use crate::domain::indicator_helpers::rolling_mean;

pub fn calculate_adx(candles: &[Candle], period: usize) -> IndicatorSeries {
    let n = candles.len();
    let mut plus_dm: Vec<Option<f64>> = vec![None; n];
    let mut minus_dm: Vec<Option<f64>> = vec![None; n];
    let mut tr: Vec<Option<f64>> = vec![None; n];

    for i in 1..n {
        let up = candles[i].high - candles[i - 1].high;
        let down = candles[i - 1].low - candles[i].low;
        plus_dm[i] = Some(up.max(0.0));
        minus_dm[i] = Some(down.max(0.0));
        tr[i] = Some(candles[i].true_range(candles[i - 1].close));
    }

    let atr = rolling_mean(&tr, period);
    let smooth_plus = rolling_mean(&plus_dm, period);
    let smooth_minus = rolling_mean(&minus_dm, period);

    let dx: Vec<Option<f64>> = (0..n)
        .map(|i| {
            let (atr, plus, minus) = (atr[i]?, smooth_plus[i]?, smooth_minus[i]?);
            if atr == 0.0 {
                return None;
            }
            let plus_di = 100.0 * plus / atr;
            let minus_di = 100.0 * minus / atr;
            let di_sum = plus_di + minus_di;
            if di_sum == 0.0 {
                Some(0.0)
            } else {
                Some(100.0 * (plus_di - minus_di).abs() / di_sum)
            }
        })
        .collect();

    let adx = rolling_mean(&dx, period);

    series_from_options(
        IndicatorType::Adx(period),
        candles.iter().map(|c| c.timestamp),
        &adx,
    )
}
