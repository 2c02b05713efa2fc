use crate::constants::{DATE_FORMAT, MAX_TICKER_LEN};
use crate::error::{AppError, Result};
use crate::models::{ForecastConfig, ForecastPoint, ForecastRequest};
use crate::services::forecaster::Forecaster;
use crate::services::price_source::SharedPriceSource;
use chrono::{DateTime, NaiveDate, Utc};
use std::sync::Arc;
use tracing::{debug, info, instrument};

/// Request after validation: normalised ticker and parsed start date
#[derive(Debug, Clone, PartialEq)]
pub struct ValidatedRequest {
    pub ticker: String,
    pub start: NaiveDate,
}

/// Result of one successful forecast run
#[derive(Debug, Clone)]
pub struct Forecast {
    pub ticker: String,
    pub start: NaiveDate,
    /// Daily closes the model was trained on
    pub history_points: usize,
    pub points: Vec<ForecastPoint>,
}

/// Validate and normalise a forecast request
///
/// Tickers are trimmed and upper-cased and may contain letters, digits and
/// `. - ^ =` (e.g. `BRK-B`, `^GSPC`, `RELIANCE.NS`, `EURUSD=X`).
pub fn validate_request(request: &ForecastRequest, today: NaiveDate) -> Result<ValidatedRequest> {
    let ticker = request.ticker.trim().to_uppercase();
    if ticker.is_empty() {
        return Err(AppError::InvalidInput("ticker must not be empty".to_string()));
    }
    if ticker.len() > MAX_TICKER_LEN {
        return Err(AppError::InvalidInput(format!(
            "ticker must be at most {} characters",
            MAX_TICKER_LEN
        )));
    }
    if !ticker
        .chars()
        .all(|c| c.is_ascii_alphanumeric() || matches!(c, '.' | '-' | '^' | '='))
    {
        return Err(AppError::InvalidInput(format!("invalid ticker symbol: {}", ticker)));
    }

    let start = NaiveDate::parse_from_str(request.start.trim(), DATE_FORMAT).map_err(|_| {
        AppError::InvalidInput(format!(
            "invalid start date '{}', expected YYYY-MM-DD",
            request.start
        ))
    })?;
    if start > today {
        return Err(AppError::InvalidInput(format!(
            "start date {} is in the future",
            start
        )));
    }

    Ok(ValidatedRequest { ticker, start })
}

/// Request pipeline: validate, fetch, train, roll out
pub struct ForecastService {
    source: SharedPriceSource,
    config: ForecastConfig,
}

pub type SharedForecastService = Arc<ForecastService>;

impl ForecastService {
    pub fn new(source: SharedPriceSource, config: ForecastConfig) -> Result<Self> {
        config.validate()?;
        Ok(Self { source, config })
    }

    pub fn config(&self) -> &ForecastConfig {
        &self.config
    }

    pub fn source_name(&self) -> &'static str {
        self.source.name()
    }

    /// Forecast from now
    pub async fn generate(&self, request: &ForecastRequest) -> Result<Forecast> {
        self.generate_at(request, Utc::now()).await
    }

    /// Forecast with an explicit "now": history is fetched for `[start, now)`
    /// and forecast dates start the day after `now`
    ///
    /// Dates are anchored on the UTC calendar day of `now`, not the server's
    /// local timezone, so every deployment dates the same request the same way.
    #[instrument(skip(self, request), fields(ticker = %request.ticker, start = %request.start))]
    pub async fn generate_at(&self, request: &ForecastRequest, now: DateTime<Utc>) -> Result<Forecast> {
        let today = now.date_naive();
        let ValidatedRequest { ticker, start } = validate_request(request, today)?;

        let series = self.source.fetch_closes(&ticker, start, now).await?;
        debug!(source = self.source.name(), rows = series.len(), "Fetched price history");

        if series.is_empty() {
            return Err(AppError::NotFound(format!(
                "Data not found for ticker {} from {}",
                ticker, start
            )));
        }

        let history_points = series.len();
        let config = self.config.clone();
        // Training and rollout are CPU-bound; keep them off the async workers
        let points = tokio::task::spawn_blocking(move || {
            let forecaster = Forecaster::new(config)?;
            forecaster.forecast(&series, today)
        })
        .await??;

        info!(ticker = %ticker, history_points, points = points.len(), "Forecast generated");

        Ok(Forecast {
            ticker,
            start,
            history_points,
            points,
        })
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::services::price_source::test_support::{linear_closes, FailingPriceSource, StaticPriceSource};
    use chrono::{Duration, TimeZone};

    fn today() -> NaiveDate {
        NaiveDate::from_ymd_opt(2025, 3, 1).unwrap()
    }

    fn service(closes: Vec<f64>) -> ForecastService {
        let config = ForecastConfig::default().with_layers(8, 4, 4);
        ForecastService::new(Arc::new(StaticPriceSource { closes }), config).unwrap()
    }

    #[test]
    fn test_validate_request_normalises_ticker() {
        let req = ForecastRequest::new("  brk-b ", "2020-01-02");
        let validated = validate_request(&req, today()).unwrap();
        assert_eq!(validated.ticker, "BRK-B");
        assert_eq!(validated.start, NaiveDate::from_ymd_opt(2020, 1, 2).unwrap());

        assert!(validate_request(&ForecastRequest::new("^GSPC", "2020-01-02"), today()).is_ok());
        assert!(validate_request(&ForecastRequest::new("RELIANCE.NS", "2020-01-02"), today()).is_ok());
    }

    #[test]
    fn test_validate_request_rejects_bad_input() {
        let cases = [
            ForecastRequest::new("", "2020-01-01"),
            ForecastRequest::new("AAPL/../x", "2020-01-01"),
            ForecastRequest::new("A".repeat(21), "2020-01-01"),
            ForecastRequest::new("AAPL", "01/02/2020"),
            ForecastRequest::new("AAPL", "2030-01-01"),
        ];

        for req in cases {
            let err = validate_request(&req, today()).unwrap_err();
            assert!(matches!(err, AppError::InvalidInput(_)), "{:?} -> {:?}", req, err);
        }
    }

    #[tokio::test]
    async fn test_empty_history_is_not_found() {
        let err = service(vec![])
            .generate(&ForecastRequest::new("AAPL", "2020-01-01"))
            .await
            .unwrap_err();
        assert!(matches!(err, AppError::NotFound(_)));
    }

    #[tokio::test]
    async fn test_short_history_is_insufficient() {
        let err = service(linear_closes(10))
            .generate(&ForecastRequest::new("AAPL", "2020-01-01"))
            .await
            .unwrap_err();
        assert!(matches!(err, AppError::InsufficientHistory { available: 10, required: 61 }));
    }

    #[tokio::test]
    async fn test_upstream_failure_propagates() {
        let service = ForecastService::new(Arc::new(FailingPriceSource), ForecastConfig::default()).unwrap();
        let err = service
            .generate(&ForecastRequest::new("AAPL", "2020-01-01"))
            .await
            .unwrap_err();
        assert!(matches!(err, AppError::Network(_)));
    }

    #[tokio::test]
    async fn test_generate_sixty_points() {
        let now = Utc.with_ymd_and_hms(2025, 3, 1, 15, 0, 0).unwrap();
        let forecast = service(linear_closes(120))
            .generate_at(&ForecastRequest::new("aapl", "2024-06-01"), now)
            .await
            .unwrap();

        assert_eq!(forecast.ticker, "AAPL");
        assert_eq!(forecast.history_points, 120);
        assert_eq!(forecast.points.len(), 60);
        assert_eq!(forecast.points[0].date, today() + Duration::days(1));
        assert_eq!(forecast.points[59].date, today() + Duration::days(60));
        assert!(forecast.points.iter().all(|p| p.price.is_finite()));
    }

    #[tokio::test]
    async fn test_forecast_dates_follow_utc_day() {
        // 23:30 UTC is already the next day in UTC+ zones; dates stay on the UTC calendar
        let now = Utc.with_ymd_and_hms(2025, 3, 1, 23, 30, 0).unwrap();
        let forecast = service(linear_closes(90))
            .generate_at(&ForecastRequest::new("AAPL", "2024-06-01"), now)
            .await
            .unwrap();

        assert_eq!(forecast.points[0].date, NaiveDate::from_ymd_opt(2025, 3, 2).unwrap());

        let early = Utc.with_ymd_and_hms(2025, 3, 2, 0, 30, 0).unwrap();
        let forecast = service(linear_closes(90))
            .generate_at(&ForecastRequest::new("AAPL", "2024-06-01"), early)
            .await
            .unwrap();

        assert_eq!(forecast.points[0].date, NaiveDate::from_ymd_opt(2025, 3, 3).unwrap());
    }
}
