pub mod api;

use crate::services::SharedForecastService;
use axum::{
    extract::FromRef,
    http::{HeaderValue, Method},
    routing::{get, post},
    Router,
};
use std::net::SocketAddr;
use std::time::Instant;
use tower_http::cors::{AllowOrigin, Any, CorsLayer};

/// Application state shared across all handlers
#[derive(Clone)]
pub struct AppState {
    pub service: SharedForecastService,
    pub started_at: Instant,
}

impl AppState {
    pub fn new(service: SharedForecastService) -> Self {
        Self {
            service,
            started_at: Instant::now(),
        }
    }
}

// FromRef implementations to extract specific state components
impl FromRef<AppState> for SharedForecastService {
    fn from_ref(app_state: &AppState) -> SharedForecastService {
        app_state.service.clone()
    }
}

/// CORS for the given origins; unparsable origins are skipped and `*` allows any origin
pub fn cors_layer(allowed_origins: &[String]) -> CorsLayer {
    let cors = CorsLayer::new()
        .allow_methods([Method::GET, Method::POST, Method::OPTIONS])
        .allow_headers(Any);

    if allowed_origins.iter().any(|origin| origin.trim() == "*") {
        tracing::warn!("CORS wildcard configured, allowing any origin");
        return cors.allow_origin(AllowOrigin::any());
    }

    let origins: Vec<HeaderValue> = allowed_origins
        .iter()
        .filter_map(|origin| match origin.parse::<HeaderValue>() {
            Ok(value) => Some(value),
            Err(e) => {
                tracing::warn!(origin = %origin, error = %e, "Ignoring invalid CORS origin");
                None
            }
        })
        .collect();

    cors.allow_origin(AllowOrigin::list(origins))
}

/// Routes with CORS and state attached
pub fn router(app_state: AppState, allowed_origins: &[String]) -> Router {
    Router::new()
        .route("/predict/", post(api::predict_handler))
        .route("/predict", post(api::predict_handler))
        .route("/health", get(api::health_handler))
        .layer(cors_layer(allowed_origins))
        .with_state(app_state)
}

/// Start the axum server
pub async fn serve(
    service: SharedForecastService,
    port: u16,
    allowed_origins: Vec<String>,
) -> Result<(), Box<dyn std::error::Error>> {
    tracing::info!("Starting priceforecast server");
    tracing::info!(origins = ?allowed_origins, "CORS allowed origins");

    tracing::info!("Registering routes:");
    tracing::info!("  POST /predict/  {{\"ticker\": \"AAPL\", \"start\": \"2020-01-01\"}}");
    tracing::info!("  GET  /health");

    let app = router(AppState::new(service), &allowed_origins);

    let addr = SocketAddr::from(([0, 0, 0, 0], port));
    tracing::info!(%addr, "Server listening");

    let listener = tokio::net::TcpListener::bind(addr).await?;
    axum::serve(
        listener,
        app.into_make_service_with_connect_info::<SocketAddr>(),
    )
    .with_graceful_shutdown(async {
        tokio::signal::ctrl_c().await.ok();
        tracing::info!("Shutdown signal received");
    })
    .await?;

    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::models::ForecastConfig;
    use crate::services::price_source::test_support::{linear_closes, StaticPriceSource};
    use crate::services::ForecastService;
    use axum::{
        body::Body,
        http::{header, Request, StatusCode},
        response::Response,
    };
    use serde_json::Value;
    use std::sync::Arc;
    use tower::ServiceExt;

    fn test_router(closes: Vec<f64>, origins: &[&str]) -> Router {
        let config = ForecastConfig::default().with_layers(8, 4, 4);
        let service = ForecastService::new(Arc::new(StaticPriceSource { closes }), config).unwrap();
        let origins: Vec<String> = origins.iter().map(|o| o.to_string()).collect();
        router(AppState::new(Arc::new(service)), &origins)
    }

    fn post_json(uri: &str, body: &str) -> Request<Body> {
        Request::builder()
            .method(Method::POST)
            .uri(uri)
            .header(header::CONTENT_TYPE, "application/json")
            .body(Body::from(body.to_string()))
            .unwrap()
    }

    fn preflight(origin: &str) -> Request<Body> {
        Request::builder()
            .method(Method::OPTIONS)
            .uri("/predict/")
            .header(header::ORIGIN, origin)
            .header(header::ACCESS_CONTROL_REQUEST_METHOD, "POST")
            .body(Body::empty())
            .unwrap()
    }

    async fn body_json(response: Response) -> Value {
        let bytes = axum::body::to_bytes(response.into_body(), usize::MAX).await.unwrap();
        serde_json::from_slice(&bytes).unwrap()
    }

    #[tokio::test]
    async fn test_predict_routes_with_and_without_slash() {
        for uri in ["/predict/", "/predict"] {
            let response = test_router(linear_closes(120), &["http://localhost:3000"])
                .oneshot(post_json(uri, r#"{"ticker": "AAPL", "start": "2020-01-01"}"#))
                .await
                .unwrap();

            assert_eq!(response.status(), StatusCode::OK, "{}", uri);
            assert_eq!(body_json(response).await.as_array().unwrap().len(), 60, "{}", uri);
        }
    }

    #[tokio::test]
    async fn test_predict_accepts_start_date_alias() {
        let response = test_router(linear_closes(120), &["http://localhost:3000"])
            .oneshot(post_json("/predict/", r#"{"ticker": "AAPL", "start_date": "2020-01-01"}"#))
            .await
            .unwrap();

        assert_eq!(response.status(), StatusCode::OK);
        assert_eq!(body_json(response).await.as_array().unwrap().len(), 60);
    }

    #[tokio::test]
    async fn test_malformed_body_is_invalid_input() {
        let app = test_router(linear_closes(120), &["http://localhost:3000"]);

        for body in [r#"{"ticker": "AAPL""#, r#"{"ticker": "AAPL"}"#, "[]"] {
            let response = app.clone().oneshot(post_json("/predict/", body)).await.unwrap();
            assert_eq!(response.status(), StatusCode::BAD_REQUEST, "{}", body);
            assert_eq!(body_json(response).await["error"], "invalid_input", "{}", body);
        }
    }

    #[tokio::test]
    async fn test_health_route() {
        let response = test_router(vec![], &["http://localhost:3000"])
            .oneshot(Request::builder().uri("/health").body(Body::empty()).unwrap())
            .await
            .unwrap();

        assert_eq!(response.status(), StatusCode::OK);
        assert_eq!(body_json(response).await["status"], "ok");
    }

    #[tokio::test]
    async fn test_cors_preflight_for_allowed_origin() {
        let response = test_router(vec![], &["http://localhost:3000", "bad\norigin"])
            .oneshot(preflight("http://localhost:3000"))
            .await
            .unwrap();

        assert_eq!(response.status(), StatusCode::OK);
        assert_eq!(
            response.headers().get(header::ACCESS_CONTROL_ALLOW_ORIGIN).unwrap(),
            "http://localhost:3000"
        );
    }

    #[tokio::test]
    async fn test_cors_preflight_for_other_origin() {
        let response = test_router(vec![], &["http://localhost:3000"])
            .oneshot(preflight("http://evil.example"))
            .await
            .unwrap();

        assert!(response.headers().get(header::ACCESS_CONTROL_ALLOW_ORIGIN).is_none());
    }

    #[tokio::test]
    async fn test_cors_wildcard_allows_any_origin() {
        let response = test_router(vec![], &["*"])
            .oneshot(preflight("http://anywhere.example"))
            .await
            .unwrap();

        assert_eq!(response.headers().get(header::ACCESS_CONTROL_ALLOW_ORIGIN).unwrap(), "*");
    }
}
