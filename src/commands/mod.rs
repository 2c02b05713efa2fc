pub mod forecast;
pub mod serve;

use crate::error::Result;
use crate::models::ForecastConfig;
use crate::services::{ForecastService, YahooClient};
use crate::utils::{get_upstream_timeout, get_yahoo_base_url};
use std::sync::Arc;

/// Forecast service backed by the Yahoo chart API, configured from the environment
pub fn build_service() -> Result<ForecastService> {
    let client = YahooClient::new(get_yahoo_base_url(), get_upstream_timeout())?;
    ForecastService::new(Arc::new(client), ForecastConfig::from_env())
}
