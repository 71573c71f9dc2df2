//! Health check endpoints

use axum::{extract::State, http::StatusCode, response::Json, routing::get, Router};
use serde::Serialize;
use wallet_services::ConnectionHealth;

use crate::AppState;

/// Health check response
#[derive(Debug, Serialize)]
struct HealthResponse {
    status: String,
    node: ConnectionHealth,
    latest_tick: Option<u64>,
}

/// Health check handler
async fn health_check(State(state): State<AppState>) -> (StatusCode, Json<HealthResponse>) {
    let node = state.poller.health();
    let healthy = node.connected && !node.is_stale;

    let response = HealthResponse {
        status: if healthy { "healthy" } else { "degraded" }.to_string(),
        node,
        latest_tick: state.poller.latest_tick(),
    };

    let code = if healthy {
        StatusCode::OK
    } else {
        StatusCode::SERVICE_UNAVAILABLE
    };

    (code, Json(response))
}

/// Simple liveness check (always returns OK if server is running)
async fn liveness() -> &'static str {
    "OK"
}

/// Create health routes
pub fn routes() -> Router<AppState> {
    Router::new()
        .route("/health", get(health_check))
        .route("/health/live", get(liveness))
}

#[cfg(test)]
mod tests {
    use super::super::test_support::{get, offline_app, send};
    use axum::body::to_bytes;
    use tower::ServiceExt;

    #[tokio::test]
    async fn test_liveness() {
        let response = offline_app().oneshot(get("/api/health/live")).await.unwrap();
        assert_eq!(response.status(), 200);
        let body = to_bytes(response.into_body(), usize::MAX).await.unwrap();
        assert_eq!(&body[..], b"OK");
    }

    #[tokio::test]
    async fn test_health_degraded_before_first_poll() {
        let (status, json) = send(offline_app(), get("/api/health")).await;
        assert_eq!(status, 503);
        assert_eq!(json["status"], "degraded");
        assert_eq!(json["node"]["connected"], false);
        assert!(json["latest_tick"].is_null());
    }
}
