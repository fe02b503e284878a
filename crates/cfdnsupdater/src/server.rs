//! HTTP front: liveness, readiness and Prometheus metrics
//!
//! Readiness is unconditional; it does not reflect whether the update loop
//! has completed a successful cycle.

use axum::Router;
use axum::extract::State;
use axum::http::header;
use axum::response::IntoResponse;
use axum::routing::get;
use cfdns_core::UpdateMetrics;
use cfdns_core::metrics::PROMETHEUS_CONTENT_TYPE;
use std::sync::Arc;

/// Build the router with all routes mounted under `prefix`
///
/// `prefix` must already be validated (empty or starting with "/").
pub fn router(prefix: &str, metrics: Arc<UpdateMetrics>) -> Router {
    let prefix = prefix.trim_end_matches('/');

    Router::new()
        .route(&format!("{prefix}/metrics"), get(metrics_handler))
        .route(&format!("{prefix}/ready"), get(ready_handler))
        .route(&format!("{prefix}/alive"), get(alive_handler))
        .with_state(metrics)
}

async fn alive_handler() -> &'static str {
    "Alive."
}

async fn ready_handler() -> &'static str {
    "Ready."
}

async fn metrics_handler(State(metrics): State<Arc<UpdateMetrics>>) -> impl IntoResponse {
    (
        [(header::CONTENT_TYPE, PROMETHEUS_CONTENT_TYPE)],
        metrics.export_prometheus(),
    )
}
