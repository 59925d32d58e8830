//! Prometheus scrape endpoint
//!
//! `GET /metrics` renders the global `metrics-exporter-prometheus` recorder
//! in Prometheus text format. Domain counters (`reservations_created_total`,
//! `parking_sessions_started_total` and friends) land here alongside the
//! per-request HTTP metrics.

use axum::{extract::State, http::StatusCode, response::IntoResponse};
use metrics_exporter_prometheus::PrometheusHandle;

/// Shared state for the metrics endpoint
#[derive(Clone)]
pub struct MetricsState {
    pub handle: PrometheusHandle,
}

/// `GET /metrics` — Prometheus scrape endpoint (no auth)
pub async fn prometheus_metrics(State(state): State<MetricsState>) -> impl IntoResponse {
    (
        StatusCode::OK,
        [("content-type", "text/plain; version=0.0.4; charset=utf-8")],
        state.handle.render(),
    )
}
