//! Health check endpoint
//!
//! Liveness only: the response never depends on the database.

use axum::http::{header, StatusCode};
use axum::response::IntoResponse;
use axum::{routing::get, Router};

/// Fixed response body, byte for byte.
pub const HEALTH_BODY: &str = r#"{"status": "ok", "message": "Everything is ok"}"#;

/// GET /v1/healthcheck
async fn healthcheck() -> impl IntoResponse {
    tracing::debug!("Health check requested");
    (
        StatusCode::OK,
        [(header::CONTENT_TYPE, "application/json")],
        HEALTH_BODY,
    )
}

/// Health routes
pub fn router<S>() -> Router<S>
where
    S: Clone + Send + Sync + 'static,
{
    Router::new().route("/healthcheck", get(healthcheck))
}
