//! Forecast Constants
//!
//! Defaults for the forecasting pipeline and the upstream market-data API.
//!
//! ## Forecast shape
//!
//! - Model input: the last 60 scaled closing prices, shaped (60, 1)
//! - Model output: one scaled price (the next step)
//! - Rollout: 60 steps, one per calendar day starting tomorrow

/// Number of scaled closes fed to the model per prediction
pub const WINDOW_LENGTH: usize = 60;

/// Number of forecast steps (calendar days) returned per request
pub const FORECAST_HORIZON: usize = 60;

/// Default model shape: units of the first (sequence-returning) LSTM layer
pub const FIRST_LSTM_UNITS: usize = 128;

/// Default model shape: units of the second LSTM layer
pub const SECOND_LSTM_UNITS: usize = 64;

/// Default model shape: width of the dense reduction before the output
pub const DENSE_UNITS: usize = 25;

/// Training passes over the windows per request
pub const EPOCHS: usize = 1;

/// Windows per optimiser step
pub const BATCH_SIZE: usize = 8;

/// Adam learning rate
pub const LEARNING_RATE: f64 = 1e-3;

/// Upstream chart API
pub const YAHOO_BASE_URL: &str = "https://query1.finance.yahoo.com";

/// Upstream request timeout in seconds
pub const UPSTREAM_TIMEOUT_SECS: u64 = 30;

/// Date format used on the wire (requests and responses)
pub const DATE_FORMAT: &str = "%Y-%m-%d";

/// Longest ticker symbol accepted
pub const MAX_TICKER_LEN: usize = 20;

/// Default HTTP port
pub const DEFAULT_PORT: u16 = 8000;

/// Default CORS origin (local frontend dev server)
pub const DEFAULT_ALLOWED_ORIGIN: &str = "http://localhost:3000";
