pub mod api_logging;
pub mod forecast_service;
pub mod forecaster;
pub mod preprocessor;
pub mod price_source;
pub mod yahoo;

pub use api_logging::{write_api_log_entry, ApiStatus, ForecastMetrics};
pub use forecast_service::{validate_request, Forecast, ForecastService, SharedForecastService};
pub use forecaster::{Forecaster, PriceLstm, TrainingReport};
pub use preprocessor::{MinMaxScaler, Preprocessor, ScaledSeries, TrainingSet, Window};
pub use price_source::{PriceSource, SharedPriceSource};
pub use yahoo::YahooClient;
