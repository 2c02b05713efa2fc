mod forecast;
mod forecast_config;
mod price_series;

pub use forecast::{ForecastPoint, ForecastRequest};
pub use forecast_config::ForecastConfig;
pub use price_series::{PricePoint, PriceSeries};
