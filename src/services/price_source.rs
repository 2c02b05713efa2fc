use crate::error::Result;
use crate::models::PriceSeries;
use async_trait::async_trait;
use chrono::{DateTime, NaiveDate, Utc};
use std::sync::Arc;

/// Provider of daily closing prices
#[async_trait]
pub trait PriceSource: Send + Sync {
    /// Short name used in logs
    fn name(&self) -> &'static str;

    /// Daily closes for `ticker` in the half-open range `[start, end)`
    ///
    /// An unknown ticker or an empty range yields an empty series, not an error.
    async fn fetch_closes(&self, ticker: &str, start: NaiveDate, end: DateTime<Utc>) -> Result<PriceSeries>;
}

pub type SharedPriceSource = Arc<dyn PriceSource>;
