use crate::error::AppError;
use crate::models::{ForecastPoint, ForecastRequest};
use crate::server::AppState;
use crate::services::{write_api_log_entry, ForecastMetrics, SharedForecastService};
use axum::{
    extract::{rejection::JsonRejection, Json, OriginalUri, State},
    http::{StatusCode, Uri},
    response::{IntoResponse, Response},
};
use chrono::Utc;
use serde::Serialize;
use tracing::{debug, error, instrument, warn};

/// Response body for GET /health
#[derive(Debug, Serialize)]
pub struct HealthResponse {
    pub status: &'static str,
    pub version: &'static str,
    pub uptime_secs: u64,
    /// RFC 3339
    pub current_system_time: String,
    pub data_source: &'static str,
    pub window_length: usize,
    pub horizon: usize,
    /// Fewest daily closes a forecast request needs
    pub min_history: usize,
}

/// Metrics for a request, logged under the path the client called
fn request_metrics(uri: &Uri) -> ForecastMetrics {
    let mut metrics = ForecastMetrics::new(Utc::now());
    metrics.endpoint = uri.path().to_string();
    metrics
}

/// POST /predict/ - Train on the ticker's history and return a 60-day forecast
///
/// Body: `{"ticker": "AAPL", "start": "2020-01-01"}`. Responds with a JSON
/// array of `{"date", "price"}` objects dated from tomorrow.
#[instrument(skip(service, payload), fields(path = %uri.path()))]
pub async fn predict_handler(
    State(service): State<SharedForecastService>,
    OriginalUri(uri): OriginalUri,
    payload: Result<Json<ForecastRequest>, JsonRejection>,
) -> Response {
    let mut metrics = request_metrics(&uri);

    let result = match payload {
        Ok(Json(request)) => {
            metrics.ticker = request.ticker.trim().to_uppercase();
            debug!(ticker = %metrics.ticker, start = %request.start, "Received forecast request");
            service.generate(&request).await
        }
        Err(rejection) => Err(AppError::InvalidInput(rejection.body_text())),
    };

    let response = match result {
        Ok(forecast) => {
            metrics.history_points = forecast.history_points;
            metrics.forecast_points = forecast.points.len();
            let points: Vec<ForecastPoint> = forecast.points;
            (StatusCode::OK, Json(points)).into_response()
        }
        Err(e) => {
            if e.status_code().is_server_error() {
                error!(ticker = %metrics.ticker, error = %e, "Forecast failed");
            } else {
                warn!(ticker = %metrics.ticker, error = %e, "Forecast rejected");
            }
            metrics.fail(e.kind(), e.to_string());
            e.into_response()
        }
    };

    metrics.complete();
    write_api_log_entry(&metrics);

    response
}

/// GET /health - Liveness and model shape
pub async fn health_handler(State(app_state): State<AppState>) -> impl IntoResponse {
    let config = app_state.service.config();

    // No request log for /health (too noisy)
    Json(HealthResponse {
        status: "ok",
        version: env!("CARGO_PKG_VERSION"),
        uptime_secs: app_state.started_at.elapsed().as_secs(),
        current_system_time: Utc::now().to_rfc3339(),
        data_source: app_state.service.source_name(),
        window_length: config.window_length,
        horizon: config.horizon,
        min_history: config.min_history(),
    })
}
