use crate::constants::{
    BATCH_SIZE, DENSE_UNITS, EPOCHS, FIRST_LSTM_UNITS, FORECAST_HORIZON, LEARNING_RATE,
    SECOND_LSTM_UNITS, WINDOW_LENGTH,
};
use crate::error::{AppError, Result};
use crate::utils::env_parse;
use serde::{Deserialize, Serialize};

/// Hyperparameters for one forecast run
///
/// Every request builds a fresh model from this configuration and trains it
/// once; nothing is carried over between requests.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ForecastConfig {
    /// Scaled closes per model input (default 60)
    pub window_length: usize,

    /// Forecast steps returned (default 60)
    pub horizon: usize,

    /// Units of the first LSTM layer, which returns the full sequence (default 128)
    pub first_lstm_units: usize,

    /// Units of the second LSTM layer, whose final hidden state is kept (default 64)
    pub second_lstm_units: usize,

    /// Width of the dense layer before the scalar output (default 25)
    pub dense_units: usize,

    /// Passes over the training windows (default 1)
    pub epochs: usize,

    /// Windows per optimiser step (default 8)
    pub batch_size: usize,

    /// Adam learning rate (default 0.001)
    pub learning_rate: f64,
}

impl Default for ForecastConfig {
    fn default() -> Self {
        Self {
            window_length: WINDOW_LENGTH,
            horizon: FORECAST_HORIZON,
            first_lstm_units: FIRST_LSTM_UNITS,
            second_lstm_units: SECOND_LSTM_UNITS,
            dense_units: DENSE_UNITS,
            epochs: EPOCHS,
            batch_size: BATCH_SIZE,
            learning_rate: LEARNING_RATE,
        }
    }
}

impl ForecastConfig {
    /// Defaults, overridden by FORECAST_EPOCHS, FORECAST_BATCH_SIZE and
    /// FORECAST_LEARNING_RATE when set
    pub fn from_env() -> Self {
        let mut config = Self::default();
        if let Some(epochs) = env_parse("FORECAST_EPOCHS") {
            config.epochs = epochs;
        }
        if let Some(batch_size) = env_parse("FORECAST_BATCH_SIZE") {
            config.batch_size = batch_size;
        }
        if let Some(learning_rate) = env_parse("FORECAST_LEARNING_RATE") {
            config.learning_rate = learning_rate;
        }
        config
    }

    pub fn with_layers(mut self, first_lstm_units: usize, second_lstm_units: usize, dense_units: usize) -> Self {
        self.first_lstm_units = first_lstm_units;
        self.second_lstm_units = second_lstm_units;
        self.dense_units = dense_units;
        self
    }

    pub fn with_epochs(mut self, epochs: usize) -> Self {
        self.epochs = epochs;
        self
    }

    pub fn with_batch_size(mut self, batch_size: usize) -> Self {
        self.batch_size = batch_size;
        self
    }

    pub fn with_learning_rate(mut self, learning_rate: f64) -> Self {
        self.learning_rate = learning_rate;
        self
    }

    pub fn with_window_length(mut self, window_length: usize) -> Self {
        self.window_length = window_length;
        self
    }

    pub fn with_horizon(mut self, horizon: usize) -> Self {
        self.horizon = horizon;
        self
    }

    /// Check every size is usable before any model is built
    pub fn validate(&self) -> Result<()> {
        let sizes = [
            ("window_length", self.window_length),
            ("horizon", self.horizon),
            ("first_lstm_units", self.first_lstm_units),
            ("second_lstm_units", self.second_lstm_units),
            ("dense_units", self.dense_units),
            ("epochs", self.epochs),
            ("batch_size", self.batch_size),
        ];

        if let Some((name, _)) = sizes.iter().find(|(_, value)| *value == 0) {
            return Err(AppError::Config(format!("{} must be greater than zero", name)));
        }

        if !self.learning_rate.is_finite() || self.learning_rate <= 0.0 {
            return Err(AppError::Config(format!(
                "learning_rate must be a positive number, got {}",
                self.learning_rate
            )));
        }

        Ok(())
    }

    /// Shortest history that still yields one training window
    pub fn min_history(&self) -> usize {
        self.window_length + 1
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_defaults() {
        let config = ForecastConfig::default();
        assert_eq!(config.window_length, 60);
        assert_eq!(config.horizon, 60);
        assert_eq!(config.first_lstm_units, 128);
        assert_eq!(config.second_lstm_units, 64);
        assert_eq!(config.dense_units, 25);
        assert_eq!(config.epochs, 1);
        assert_eq!(config.batch_size, 8);
        assert_eq!(config.learning_rate, 0.001);
        assert_eq!(config.min_history(), 61);
        assert!(config.validate().is_ok());
    }

    #[test]
    fn test_builder() {
        let config = ForecastConfig::default()
            .with_layers(16, 8, 4)
            .with_epochs(2)
            .with_batch_size(4)
            .with_learning_rate(0.01);

        assert_eq!(config.first_lstm_units, 16);
        assert_eq!(config.second_lstm_units, 8);
        assert_eq!(config.dense_units, 4);
        assert_eq!(config.epochs, 2);
        assert_eq!(config.batch_size, 4);
        assert_eq!(config.learning_rate, 0.01);
    }

    #[test]
    fn test_validate_rejects_zero_sizes() {
        let err = ForecastConfig::default().with_batch_size(0).validate().unwrap_err();
        assert!(matches!(err, AppError::Config(ref msg) if msg.contains("batch_size")));

        let err = ForecastConfig::default().with_layers(16, 0, 4).validate().unwrap_err();
        assert!(matches!(err, AppError::Config(ref msg) if msg.contains("second_lstm_units")));
    }

    #[test]
    fn test_validate_rejects_bad_learning_rate() {
        assert!(ForecastConfig::default().with_learning_rate(0.0).validate().is_err());
        assert!(ForecastConfig::default().with_learning_rate(f64::NAN).validate().is_err());
    }
}
