//! Monitoring endpoint served as a lifecycle service.
//!
//! # Responsibilities
//! - Bind the monitoring address when the launcher starts it
//! - Serve `/health`, `/ready` and `/metrics`
//! - Stop on the shared shutdown token or on its own `stop`

use std::net::SocketAddr;
use std::sync::{Arc, OnceLock};
use std::time::{Duration, Instant as StdInstant};

use async_trait::async_trait;
use axum::{routing::get, Router};
use tokio::net::TcpListener;
use tokio::time::Instant;
use tokio_util::sync::CancellationToken;
use tower_http::{timeout::TimeoutLayer, trace::TraceLayer};

use crate::config::{MonitoringConfig, ServiceConfig};
use crate::health::handlers::{get_health, get_metrics, get_ready, MonitorState};
use crate::lifecycle::service::{BoxError, Service};
use crate::lifecycle::state::PhaseTracker;
use crate::observability::metrics;

/// Health, readiness and metrics endpoint.
pub struct MonitoringService {
    config: MonitoringConfig,
    state: MonitorState,
    stopped: CancellationToken,
    local_addr: OnceLock<SocketAddr>,
}

impl MonitoringService {
    pub fn new(config: MonitoringConfig, identity: ServiceConfig, phase: PhaseTracker) -> Self {
        let state = MonitorState {
            identity: Arc::new(identity),
            phase,
            metrics: metrics::init_metrics(),
            started_at: StdInstant::now(),
        };

        Self {
            config,
            state,
            stopped: CancellationToken::new(),
            local_addr: OnceLock::new(),
        }
    }

    /// Address actually bound, once `start` has bound the listener.
    pub fn local_addr(&self) -> Option<SocketAddr> {
        self.local_addr.get().copied()
    }

    /// Build the Axum router with all middleware layers.
    #[allow(deprecated)]
    pub fn router(&self) -> Router {
        Router::new()
            .route("/health", get(get_health))
            .route("/ready", get(get_ready))
            .route("/metrics", get(get_metrics))
            .with_state(self.state.clone())
            .layer(TimeoutLayer::new(Duration::from_secs(
                self.config.request_timeout_secs,
            )))
            .layer(TraceLayer::new_for_http())
    }
}

#[async_trait]
impl Service for MonitoringService {
    async fn start(&self, token: CancellationToken) -> Result<(), BoxError> {
        let listener = TcpListener::bind(&self.config.bind_address)
            .await
            .map_err(|e| format!("failed to bind {}: {}", self.config.bind_address, e))?;
        let addr = listener.local_addr()?;
        let _ = self.local_addr.set(addr);

        tracing::info!(address = %addr, "Monitoring endpoint listening");

        let stopped = self.stopped.clone();
        axum::serve(listener, self.router())
            .with_graceful_shutdown(async move {
                tokio::select! {
                    _ = token.cancelled() => {}
                    _ = stopped.cancelled() => {}
                }
            })
            .await?;

        tracing::info!("Monitoring endpoint stopped");
        Ok(())
    }

    async fn stop(&self, _deadline: Instant) -> Result<(), BoxError> {
        self.stopped.cancel();
        Ok(())
    }

    fn name(&self) -> &str {
        "monitoring"
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::lifecycle::state::Phase;
    use axum::body::Body;
    use axum::http::{Request, StatusCode};
    use tower::ServiceExt;

    fn service(phase: PhaseTracker) -> MonitoringService {
        let config = MonitoringConfig {
            bind_address: "127.0.0.1:0".into(),
            request_timeout_secs: 5,
        };
        MonitoringService::new(config, ServiceConfig::default(), phase)
    }

    async fn status_of(router: Router, path: &str) -> StatusCode {
        router
            .oneshot(Request::builder().uri(path).body(Body::empty()).unwrap())
            .await
            .unwrap()
            .status()
    }

    #[tokio::test]
    async fn test_ready_follows_phase() {
        let phase = PhaseTracker::new();
        let svc = service(phase.clone());

        assert_eq!(status_of(svc.router(), "/ready").await, StatusCode::SERVICE_UNAVAILABLE);

        phase.set(Phase::Running);
        assert_eq!(status_of(svc.router(), "/ready").await, StatusCode::OK);

        phase.set(Phase::ShuttingDown);
        assert_eq!(status_of(svc.router(), "/ready").await, StatusCode::SERVICE_UNAVAILABLE);
    }

    #[tokio::test]
    async fn test_health_reports_failure() {
        let phase = PhaseTracker::new();
        let svc = service(phase.clone());

        assert_eq!(status_of(svc.router(), "/health").await, StatusCode::OK);
        phase.set(Phase::Failed);
        assert_eq!(status_of(svc.router(), "/health").await, StatusCode::SERVICE_UNAVAILABLE);
    }

    #[tokio::test]
    async fn test_metrics_endpoint_serves_text() {
        let svc = service(PhaseTracker::new());
        assert_eq!(status_of(svc.router(), "/metrics").await, StatusCode::OK);
        assert_eq!(status_of(svc.router(), "/nope").await, StatusCode::NOT_FOUND);
    }

    #[tokio::test]
    async fn test_stop_ends_start() {
        let svc = Arc::new(service(PhaseTracker::new()));
        let running = Arc::clone(&svc);
        let handle = tokio::spawn(async move { running.start(CancellationToken::new()).await });

        while svc.local_addr().is_none() {
            tokio::time::sleep(Duration::from_millis(10)).await;
        }
        svc.stop(Instant::now() + Duration::from_secs(1)).await.unwrap();

        let result = tokio::time::timeout(Duration::from_secs(5), handle)
            .await
            .expect("start should return after stop")
            .unwrap();
        assert!(result.is_ok());
    }
}
