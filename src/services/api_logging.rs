use chrono::{DateTime, Utc};
use tracing::info;

/// Per-request forecast metrics
#[derive(Debug, Clone)]
pub struct ForecastMetrics {
    pub start_time: DateTime<Utc>,
    pub end_time: DateTime<Utc>,
    pub duration_ms: u64,
    pub status: ApiStatus,
    pub endpoint: String,
    pub ticker: String,
    pub history_points: usize,
    pub forecast_points: usize,
    pub error_kind: Option<&'static str>,
    pub error_message: Option<String>,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ApiStatus {
    Success,
    Fail,
}

impl ForecastMetrics {
    pub fn new(start_time: DateTime<Utc>) -> Self {
        Self {
            start_time,
            end_time: start_time,
            duration_ms: 0,
            status: ApiStatus::Success,
            endpoint: String::new(),
            ticker: String::new(),
            history_points: 0,
            forecast_points: 0,
            error_kind: None,
            error_message: None,
        }
    }

    pub fn complete(&mut self) {
        self.complete_at(Utc::now());
    }

    pub fn complete_at(&mut self, end_time: DateTime<Utc>) {
        self.end_time = end_time;
        self.duration_ms = (self.end_time - self.start_time).num_milliseconds().max(0) as u64;
    }

    pub fn fail(&mut self, kind: &'static str, message: String) {
        self.status = ApiStatus::Fail;
        self.error_kind = Some(kind);
        self.error_message = Some(message);
    }
}

/// Compact one-line summary of a request
pub fn format_log_line(metrics: &ForecastMetrics) -> String {
    let status_str = match metrics.status {
        ApiStatus::Success => "OK",
        ApiStatus::Fail => "FAIL",
    };

    let duration_str = if metrics.duration_ms >= 1000 {
        format!("{}.{:01}s", metrics.duration_ms / 1000, (metrics.duration_ms % 1000) / 100)
    } else {
        format!("{}ms", metrics.duration_ms)
    };

    let error_info = match (metrics.error_kind, &metrics.error_message) {
        (Some(kind), Some(message)) => format!(" error:{} ({})", kind, message),
        (Some(kind), None) => format!(" error:{}", kind),
        (None, Some(message)) => format!(" error:{}", message),
        (None, None) => String::new(),
    };

    format!(
        "{} | {} | {} | {} | {} | ticker:{} history:{} forecast:{}{}",
        metrics.start_time.format("%Y-%m-%d %H:%M:%S"),
        metrics.end_time.format("%Y-%m-%d %H:%M:%S"),
        duration_str,
        metrics.endpoint,
        status_str,
        metrics.ticker,
        metrics.history_points,
        metrics.forecast_points,
        error_info
    )
}

/// Emit the request summary on the `api_requests` tracing target
pub fn write_api_log_entry(metrics: &ForecastMetrics) {
    info!(target: "api_requests", "{}", format_log_line(metrics));
}

#[cfg(test)]
mod tests {
    use super::*;
    use chrono::{Duration, TimeZone, Utc};

    #[test]
    fn test_forecast_metrics() {
        let start_time = Utc.with_ymd_and_hms(2024, 12, 1, 15, 30, 45).unwrap();
        let mut metrics = ForecastMetrics::new(start_time);

        metrics.endpoint = "/predict/".to_string();
        metrics.ticker = "AAPL".to_string();
        metrics.history_points = 250;
        metrics.forecast_points = 60;

        metrics.complete_at(start_time + Duration::milliseconds(2345));

        assert_eq!(metrics.status, ApiStatus::Success);
        assert_eq!(metrics.duration_ms, 2345);
        assert_eq!(
            format_log_line(&metrics),
            "2024-12-01 15:30:45 | 2024-12-01 15:30:47 | 2.3s | /predict/ | OK | ticker:AAPL history:250 forecast:60"
        );
    }

    #[test]
    fn test_failed_request_line() {
        let start_time = Utc.with_ymd_and_hms(2024, 12, 1, 15, 30, 45).unwrap();
        let mut metrics = ForecastMetrics::new(start_time);
        metrics.endpoint = "/predict/".to_string();
        metrics.ticker = "NOPE".to_string();
        metrics.fail("data_not_found", "Not found: NOPE".to_string());
        metrics.complete_at(start_time + Duration::milliseconds(120));

        let line = format_log_line(&metrics);
        assert!(line.contains("| 120ms |"));
        assert!(line.contains("| FAIL |"));
        assert!(line.ends_with("error:data_not_found (Not found: NOPE)"));
    }
}
