//! Technical indicator implementations.
//!
//! This module provides types for representing indicator values and series:
//! - `IndicatorPoint`: A single point in an indicator time series
//! - `IndicatorValue`: Enum for different indicator output shapes
//! - `IndicatorType`: Enum for indicator identity + parameters
//! - `IndicatorSeries`: A time series of indicator values
//!
//! A point with `valid == false` carries no usable value: either the warm-up
//! window is not filled yet or the value is mathematically undefined there.

pub mod adx;
pub mod ema;
pub mod rsi;
pub mod stochastic;
pub mod volume;

use chrono::{DateTime, Utc};
use std::fmt;

#[derive(Debug, Clone)]
pub struct IndicatorPoint {
    pub timestamp: DateTime<Utc>,
    pub valid: bool,
    pub value: IndicatorValue,
}

#[derive(Debug, Clone)]
pub enum IndicatorValue {
    Simple(f64),
    /// `d` is `None` until three consecutive defined %K values exist.
    Stochastic { k: f64, d: Option<f64> },
}

#[derive(Debug, Clone, PartialEq, Eq, Hash)]
pub enum IndicatorType {
    Ema(usize),
    Rsi(usize),
    Adx(usize),
    VolumeRatio(usize),
    Stochastic { k_period: usize, d_period: usize },
}

#[derive(Debug, Clone)]
pub struct IndicatorSeries {
    pub indicator_type: IndicatorType,
    pub values: Vec<IndicatorPoint>,
}

impl IndicatorSeries {
    /// Value of a `Simple` series at `index`, if the point is valid.
    pub fn simple_at(&self, index: usize) -> Option<f64> {
        let point = self.values.get(index)?;
        match point.value {
            IndicatorValue::Simple(v) if point.valid => Some(v),
            _ => None,
        }
    }

    /// (%K, %D) of a stochastic series at `index`.
    pub fn stochastic_at(&self, index: usize) -> (Option<f64>, Option<f64>) {
        match self.values.get(index) {
            Some(IndicatorPoint {
                valid: true,
                value: IndicatorValue::Stochastic { k, d },
                ..
            }) => (Some(*k), *d),
            _ => (None, None),
        }
    }
}

impl fmt::Display for IndicatorType {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            IndicatorType::Ema(period) => write!(f, "EMA({})", period),
            IndicatorType::Rsi(period) => write!(f, "RSI({})", period),
            IndicatorType::Adx(period) => write!(f, "ADX({})", period),
            IndicatorType::VolumeRatio(period) => write!(f, "VOLUME_RATIO({})", period),
            IndicatorType::Stochastic { k_period, d_period } => {
                write!(f, "STOCHASTIC({},{})", k_period, d_period)
            }
        }
    }
}

/// A point that carries no value yet.
pub(crate) fn invalid_point(timestamp: DateTime<Utc>) -> IndicatorPoint {
    IndicatorPoint {
        timestamp,
        valid: false,
        value: IndicatorValue::Simple(0.0),
    }
}

/// Turn per-candle optional values into a series.
pub(crate) fn series_from_options(
    indicator_type: IndicatorType,
    timestamps: impl Iterator<Item = DateTime<Utc>>,
    values: &[Option<f64>],
) -> IndicatorSeries {
    let values = timestamps
        .zip(values.iter())
        .map(|(timestamp, v)| match v {
            Some(v) => IndicatorPoint {
                timestamp,
                valid: true,
                value: IndicatorValue::Simple(*v),
            },
            None => invalid_point(timestamp),
        })
        .collect();
    IndicatorSeries {
        indicator_type,
        values,
    }
}
