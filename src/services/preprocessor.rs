//! Scaling and windowing of closing prices
//!
//! Turns a [`PriceSeries`] into the supervised training set the forecaster
//! consumes:
//! - closes are min-max scaled into [0, 1] using the whole series
//! - every run of `window_length` scaled closes becomes one input, with the
//!   next scaled close as its target
//!
//! Windows keep time order: window `i` covers positions `[i, i + window_length)`.

use crate::error::{AppError, Result};
use crate::models::PriceSeries;
use serde::{Deserialize, Serialize};
use tracing::debug;

/// Min-max scaling parameters of a source series
///
/// A constant series (min == max) scales every value to 0.0 and inverts any
/// scaled value back to `min`.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct MinMaxScaler {
    min: f64,
    max: f64,
}

impl MinMaxScaler {
    /// Fit to the full set of values
    pub fn fit(values: &[f64]) -> Result<Self> {
        if values.is_empty() {
            return Err(AppError::InvalidInput("cannot scale an empty series".to_string()));
        }
        if values.iter().any(|v| !v.is_finite()) {
            return Err(AppError::InvalidInput("series contains non-finite prices".to_string()));
        }

        let min = values.iter().cloned().fold(f64::INFINITY, f64::min);
        let max = values.iter().cloned().fold(f64::NEG_INFINITY, f64::max);
        Ok(Self { min, max })
    }

    pub fn min(&self) -> f64 {
        self.min
    }

    pub fn max(&self) -> f64 {
        self.max
    }

    /// True when every source value was identical
    pub fn is_degenerate(&self) -> bool {
        self.max == self.min
    }

    pub fn transform(&self, value: f64) -> f64 {
        if self.is_degenerate() {
            0.0
        } else {
            (value - self.min) / (self.max - self.min)
        }
    }

    pub fn inverse_transform(&self, scaled: f64) -> f64 {
        scaled * (self.max - self.min) + self.min
    }
}

/// Scaled closes plus the parameters needed to undo the scaling
#[derive(Debug, Clone, PartialEq)]
pub struct ScaledSeries {
    values: Vec<f64>,
    scaler: MinMaxScaler,
}

impl ScaledSeries {
    pub fn values(&self) -> &[f64] {
        &self.values
    }

    pub fn scaler(&self) -> MinMaxScaler {
        self.scaler
    }

    /// The most recent `n` scaled values (the rollout seed)
    pub fn tail(&self, n: usize) -> &[f64] {
        &self.values[self.values.len().saturating_sub(n)..]
    }
}

/// One training example: `window_length` scaled closes and the close after them
#[derive(Debug, Clone, PartialEq)]
pub struct Window {
    pub inputs: Vec<f64>,
    pub target: f64,
}

/// All windows of a scaled series, in time order
#[derive(Debug, Clone, PartialEq)]
pub struct TrainingSet {
    window_length: usize,
    windows: Vec<Window>,
}

impl TrainingSet {
    pub fn window_length(&self) -> usize {
        self.window_length
    }

    pub fn windows(&self) -> &[Window] {
        &self.windows
    }

    pub fn len(&self) -> usize {
        self.windows.len()
    }

    pub fn is_empty(&self) -> bool {
        self.windows.is_empty()
    }
}

/// Scales and windows price series for a fixed window length
#[derive(Debug, Clone, Copy)]
pub struct Preprocessor {
    window_length: usize,
}

impl Preprocessor {
    pub fn new(window_length: usize) -> Self {
        Self { window_length }
    }

    pub fn window_length(&self) -> usize {
        self.window_length
    }

    /// Scale the series into [0, 1]
    pub fn scale(&self, series: &PriceSeries) -> Result<ScaledSeries> {
        let closes = series.closes();
        let scaler = MinMaxScaler::fit(&closes)?;
        let values = closes.iter().map(|&c| scaler.transform(c)).collect();

        debug!(
            ticker = series.ticker(),
            min = scaler.min(),
            max = scaler.max(),
            degenerate = scaler.is_degenerate(),
            "Scaled closing prices"
        );

        Ok(ScaledSeries { values, scaler })
    }

    /// Slide a `window_length` window one step at a time across the series
    ///
    /// Needs strictly more values than the window length.
    pub fn make_windows(&self, scaled: &ScaledSeries) -> Result<TrainingSet> {
        let n = scaled.values.len();
        if n <= self.window_length {
            return Err(AppError::InsufficientHistory {
                available: n,
                required: self.window_length + 1,
            });
        }

        let windows = scaled
            .values
            .windows(self.window_length + 1)
            .map(|w| Window {
                inputs: w[..self.window_length].to_vec(),
                target: w[self.window_length],
            })
            .collect();

        Ok(TrainingSet {
            window_length: self.window_length,
            windows,
        })
    }

    /// Scale then window in one go
    pub fn prepare(&self, series: &PriceSeries) -> Result<(ScaledSeries, TrainingSet)> {
        if series.len() <= self.window_length {
            return Err(AppError::InsufficientHistory {
                available: series.len(),
                required: self.window_length + 1,
            });
        }

        let scaled = self.scale(series)?;
        let training = self.make_windows(&scaled)?;
        Ok((scaled, training))
    }
}
