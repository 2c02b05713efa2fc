use crate::error::{AppError, Result};
use crate::models::{PricePoint, PriceSeries};
use crate::services::price_source::PriceSource;
use async_trait::async_trait;
use chrono::{DateTime, NaiveDate, Utc};
use reqwest::StatusCode;
use serde::Deserialize;
use std::time::Duration;
use tracing::{debug, info, warn};

const USER_AGENT: &str = "Mozilla/5.0 (Windows NT 10.0; Win64; x64) AppleWebKit/537.36 (KHTML, like Gecko) Chrome/120.0.0.0 Safari/537.36";

#[derive(Debug, Deserialize)]
struct ChartEnvelope {
    chart: ChartBody,
}

#[derive(Debug, Deserialize)]
struct ChartBody {
    result: Option<Vec<ChartResult>>,
    error: Option<ChartError>,
}

#[derive(Debug, Deserialize)]
struct ChartError {
    code: String,
    description: Option<String>,
}

#[derive(Debug, Deserialize)]
struct ChartResult {
    meta: Option<ChartMeta>,
    timestamp: Option<Vec<i64>>,
    indicators: Indicators,
}

#[derive(Debug, Deserialize)]
struct ChartMeta {
    /// Exchange offset from UTC in seconds
    gmtoffset: Option<i64>,
}

#[derive(Debug, Deserialize)]
struct Indicators {
    #[serde(default)]
    quote: Vec<Quote>,
}

#[derive(Debug, Deserialize)]
struct Quote {
    #[serde(default)]
    close: Vec<Option<f64>>,
}

/// Client for the Yahoo Finance chart API (daily closes)
pub struct YahooClient {
    base_url: String,
    client: reqwest::Client,
}

impl YahooClient {
    /// Create a new chart API client
    ///
    /// # Arguments
    /// * `base_url` - API root, e.g. "https://query1.finance.yahoo.com"
    /// * `timeout` - Per-request timeout
    pub fn new(base_url: String, timeout: Duration) -> Result<Self> {
        let base_url = base_url.trim().trim_end_matches('/').to_string();

        if !base_url.starts_with("http://") && !base_url.starts_with("https://") {
            return Err(AppError::Config(format!(
                "Invalid base_url: must start with http:// or https://, got: '{}'",
                base_url
            )));
        }

        let client = reqwest::Client::builder()
            .timeout(timeout)
            .user_agent(USER_AGENT)
            .build()
            .map_err(|e| AppError::Network(format!("Failed to create HTTP client: {}", e)))?;

        info!("Created YahooClient: base_url='{}', timeout={:?}", base_url, timeout);

        Ok(Self { base_url, client })
    }

    fn chart_url(&self, ticker: &str) -> String {
        format!("{}/v8/finance/chart/{}", self.base_url, ticker)
    }
}

#[async_trait]
impl PriceSource for YahooClient {
    fn name(&self) -> &'static str {
        "yahoo"
    }

    async fn fetch_closes(&self, ticker: &str, start: NaiveDate, end: DateTime<Utc>) -> Result<PriceSeries> {
        let period1 = start.and_hms_opt(0, 0, 0).map(|dt| dt.and_utc().timestamp()).unwrap_or(0);
        let period2 = end.timestamp();

        if period1 >= period2 {
            debug!(ticker, %start, %end, "Empty date range, skipping upstream request");
            return Ok(PriceSeries::empty(ticker));
        }

        let url = self.chart_url(ticker);
        debug!(ticker, period1, period2, url = %url, "Fetching daily closes");

        let response = self
            .client
            .get(&url)
            .query(&[
                ("period1", period1.to_string()),
                ("period2", period2.to_string()),
                ("interval", "1d".to_string()),
                ("events", "history".to_string()),
            ])
            .send()
            .await?;

        let status = response.status();
        let body = response.text().await?;

        match status {
            s if s.is_success() => parse_chart_response(ticker, &body, end),
            StatusCode::NOT_FOUND => {
                warn!(ticker, "Upstream reports unknown ticker");
                Ok(PriceSeries::empty(ticker))
            }
            StatusCode::TOO_MANY_REQUESTS => Err(AppError::Network("rate limited by market data provider".to_string())),
            s => Err(AppError::Network(format!(
                "market data provider returned {} for {}",
                s.as_u16(),
                ticker
            ))),
        }
    }
}

/// Parse a chart API body into a series, keeping rows strictly before `end`
pub fn parse_chart_response(ticker: &str, body: &str, end: DateTime<Utc>) -> Result<PriceSeries> {
    let envelope: ChartEnvelope = serde_json::from_str(body)?;

    if let Some(error) = envelope.chart.error {
        if error.code.eq_ignore_ascii_case("Not Found") {
            return Ok(PriceSeries::empty(ticker));
        }
        return Err(AppError::Network(format!(
            "market data provider error {}: {}",
            error.code,
            error.description.unwrap_or_default()
        )));
    }

    let Some(result) = envelope.chart.result.and_then(|r| r.into_iter().next()) else {
        return Ok(PriceSeries::empty(ticker));
    };

    let timestamps = result.timestamp.unwrap_or_default();
    let closes = result
        .indicators
        .quote
        .into_iter()
        .next()
        .map(|q| q.close)
        .unwrap_or_default();

    if timestamps.len() != closes.len() && !closes.is_empty() {
        return Err(AppError::Parse(format!(
            "chart response has {} timestamps but {} closes",
            timestamps.len(),
            closes.len()
        )));
    }

    let offset = result.meta.and_then(|m| m.gmtoffset).unwrap_or(0);
    let end_ts = end.timestamp();

    let points = timestamps
        .iter()
        .zip(closes)
        .filter_map(|(&ts, close)| {
            if ts >= end_ts {
                return None;
            }
            let date = DateTime::from_timestamp(ts + offset, 0)?.date_naive();
            close.map(|c| PricePoint::new(date, c))
        })
        .collect();

    let series = PriceSeries::new(ticker, points);
    debug!(ticker, rows = series.len(), "Parsed chart response");
    Ok(series)
}
