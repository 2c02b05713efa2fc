use crate::constants::{DEFAULT_ALLOWED_ORIGIN, DEFAULT_PORT, UPSTREAM_TIMEOUT_SECS, YAHOO_BASE_URL};
use std::time::Duration;

/// Get HTTP port from environment variable or use default
pub fn get_port() -> u16 {
    std::env::var("PORT")
        .ok()
        .and_then(|v| v.trim().parse().ok())
        .unwrap_or(DEFAULT_PORT)
}

/// Get CORS origins from ALLOWED_ORIGINS (comma-separated) or use default
pub fn get_allowed_origins() -> Vec<String> {
    std::env::var("ALLOWED_ORIGINS")
        .map(|v| parse_origins(&v))
        .ok()
        .filter(|origins| !origins.is_empty())
        .unwrap_or_else(|| vec![DEFAULT_ALLOWED_ORIGIN.to_string()])
}

/// Get Yahoo chart API base URL from environment variable or use default
pub fn get_yahoo_base_url() -> String {
    std::env::var("YAHOO_BASE_URL")
        .map(|v| v.trim().trim_end_matches('/').to_string())
        .ok()
        .filter(|v| !v.is_empty())
        .unwrap_or_else(|| YAHOO_BASE_URL.to_string())
}

/// Get upstream request timeout from environment variable or use default
pub fn get_upstream_timeout() -> Duration {
    let secs = std::env::var("UPSTREAM_TIMEOUT_SECS")
        .ok()
        .and_then(|v| v.trim().parse().ok())
        .filter(|&s: &u64| s > 0)
        .unwrap_or(UPSTREAM_TIMEOUT_SECS);
    Duration::from_secs(secs)
}

/// Read and parse an environment variable, ignoring unset or malformed values
pub fn env_parse<T: std::str::FromStr>(key: &str) -> Option<T> {
    std::env::var(key).ok().and_then(|v| v.trim().parse().ok())
}

fn parse_origins(value: &str) -> Vec<String> {
    value
        .split(',')
        .map(|s| s.trim().trim_end_matches('/').to_string())
        .filter(|s| !s.is_empty())
        .collect()
}

/// Initialize the global tracing subscriber (RUST_LOG, default "info")
pub fn init_tracing() {
    let _ = tracing_subscriber::fmt()
        .with_env_filter(
            tracing_subscriber::EnvFilter::try_from_default_env()
                .unwrap_or_else(|_| tracing_subscriber::EnvFilter::new("info")),
        )
        .with_target(false)
        .with_writer(std::io::stderr)
        .try_init();
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_parse_origins() {
        let origins = parse_origins(" http://localhost:3000/, https://example.com ,,");
        assert_eq!(origins, vec!["http://localhost:3000", "https://example.com"]);
    }

    #[test]
    fn test_parse_origins_empty() {
        assert!(parse_origins(" , ").is_empty());
    }
}
