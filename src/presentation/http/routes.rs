//! Route Configuration
//!
//! Configures the status surface routes.

use axum::{response::IntoResponse, routing::get, Router};
use tower_http::trace::TraceLayer;

use super::handlers;
use crate::application::dto::SharedStatus;
use crate::infrastructure::metrics;

/// Create the status router
pub fn create_router(status: SharedStatus) -> Router {
    Router::new()
        // Health check endpoints
        .route("/health", get(handlers::health::health_check))
        .route("/health/live", get(handlers::health::liveness))
        .route("/health/ready", get(handlers::health::readiness))
        // Session snapshot
        .route("/status", get(handlers::status::get_status))
        // Prometheus metrics endpoint
        .route("/metrics", get(metrics_handler))
        .layer(TraceLayer::new_for_http())
        .with_state(status)
}

/// Prometheus metrics endpoint handler
async fn metrics_handler() -> impl IntoResponse {
    let metrics = metrics::gather_metrics();
    (
        [(
            axum::http::header::CONTENT_TYPE,
            "text/plain; version=0.0.4; charset=utf-8",
        )],
        metrics,
    )
}
