use std::sync::Arc;
use std::time::Instant;

use axum::{
    extract::State,
    http::{header, StatusCode},
    response::{IntoResponse, Response},
    Json,
};
use metrics_exporter_prometheus::PrometheusHandle;
use serde::Serialize;

use crate::config::ServiceConfig;
use crate::lifecycle::state::{Phase, PhaseTracker};

/// State injected into monitoring handlers.
#[derive(Clone)]
pub struct MonitorState {
    pub identity: Arc<ServiceConfig>,
    pub phase: PhaseTracker,
    pub metrics: PrometheusHandle,
    pub started_at: Instant,
}

#[derive(Debug, Serialize)]
pub struct HealthStatus {
    pub status: &'static str,
    pub service: String,
    pub environment: String,
    pub version: &'static str,
    pub phase: &'static str,
    pub uptime_seconds: u64,
}

#[derive(Debug, Serialize)]
pub struct ReadinessStatus {
    pub ready: bool,
    pub phase: &'static str,
}

/// Liveness. Healthy unless the launcher has failed.
pub async fn get_health(State(state): State<MonitorState>) -> (StatusCode, Json<HealthStatus>) {
    let phase = state.phase.get();
    let (code, status) = if phase == Phase::Failed {
        (StatusCode::SERVICE_UNAVAILABLE, "failed")
    } else {
        (StatusCode::OK, "ok")
    };

    (
        code,
        Json(HealthStatus {
            status,
            service: state.identity.name.clone(),
            environment: state.identity.environment.clone(),
            version: env!("CARGO_PKG_VERSION"),
            phase: phase.as_str(),
            uptime_seconds: state.started_at.elapsed().as_secs(),
        }),
    )
}

/// Readiness. Ready only while services are running.
pub async fn get_ready(State(state): State<MonitorState>) -> (StatusCode, Json<ReadinessStatus>) {
    let phase = state.phase.get();
    let ready = phase == Phase::Running;
    let code = if ready {
        StatusCode::OK
    } else {
        StatusCode::SERVICE_UNAVAILABLE
    };

    (
        code,
        Json(ReadinessStatus {
            ready,
            phase: phase.as_str(),
        }),
    )
}

/// Prometheus text exposition.
pub async fn get_metrics(State(state): State<MonitorState>) -> Response {
    (
        [(header::CONTENT_TYPE, "text/plain; version=0.0.4")],
        state.metrics.render(),
    )
        .into_response()
}
