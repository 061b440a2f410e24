//! The launcher: drives initializers and services through the lifecycle.
//!
//! # Data Flow
//! ```text
//! run(token):
//!     init()            sequential, registration order, fail fast
//!     spawn services    one JoinSet task each, all before waiting
//!     join all          first unexpected failure cancels siblings
//!     shutdown()        reverse registration order, shared deadline
//! ```

use std::any::Any;
use std::collections::HashMap;
use std::panic::AssertUnwindSafe;
use std::sync::Arc;
use std::time::Duration;

use futures_util::FutureExt;
use tokio::task::{JoinError, JoinSet};
use tokio::time::{timeout_at, Instant};
use tokio_util::sync::CancellationToken;
use tracing::Instrument;
use uuid::Uuid;

use crate::lifecycle::error::LifecycleError;
use crate::lifecycle::service::{BoxError, Initializer, Service};
use crate::lifecycle::state::{Phase, PhaseTracker};
use crate::observability::metrics;

/// Shutdown budget shared by all `stop` calls unless configured otherwise.
pub const DEFAULT_SHUTDOWN_TIMEOUT: Duration = Duration::from_secs(30);

/// Deadline used when `now + timeout` is not representable (about 30 years).
const FAR_FUTURE: Duration = Duration::from_secs(86_400 * 365 * 30);

/// Orchestrates the lifecycle of a set of initializers and services.
///
/// Assembled with `&mut self` methods and consumed by [`Launcher::run`], so it
/// cannot be mutated while running or reused afterwards.
pub struct Launcher {
    initializers: Vec<Arc<dyn Initializer>>,
    services: Vec<Arc<dyn Service>>,
    shutdown_timeout: Duration,
    span: Option<tracing::Span>,
    phase: PhaseTracker,
}

impl Launcher {
    pub fn new() -> Self {
        Self {
            initializers: Vec::new(),
            services: Vec::new(),
            shutdown_timeout: DEFAULT_SHUTDOWN_TIMEOUT,
            span: None,
            phase: PhaseTracker::new(),
        }
    }

    /// Override the total time budget for stopping all services.
    pub fn with_shutdown_timeout(mut self, timeout: Duration) -> Self {
        self.shutdown_timeout = timeout;
        self
    }

    /// Log every lifecycle event inside `span` instead of a fresh
    /// `launcher` span with its own `run_id`.
    pub fn with_span(mut self, span: tracing::Span) -> Self {
        self.span = Some(span);
        self
    }

    pub fn add_initializer(&mut self, initializer: Arc<dyn Initializer>) -> &mut Self {
        self.initializers.push(initializer);
        self
    }

    pub fn add_service(&mut self, service: Arc<dyn Service>) -> &mut Self {
        self.services.push(service);
        self
    }

    pub fn shutdown_timeout(&self) -> Duration {
        self.shutdown_timeout
    }

    pub fn initializer_count(&self) -> usize {
        self.initializers.len()
    }

    pub fn service_count(&self) -> usize {
        self.services.len()
    }

    /// Shared view of the current phase, e.g. for readiness probes.
    pub fn phase_tracker(&self) -> PhaseTracker {
        self.phase.clone()
    }

    /// Run every initializer in registration order.
    ///
    /// Stops at the first failure; later initializers are not run.
    pub async fn init(&self, token: &CancellationToken) -> Result<(), LifecycleError> {
        self.phase.set(Phase::Initializing);

        for (index, initializer) in self.initializers.iter().enumerate() {
            let name = initializer.name();
            tracing::info!(index, initializer = name, "Running initializer");

            let outcome = match AssertUnwindSafe(initializer.init(token)).catch_unwind().await {
                Ok(result) => result,
                Err(payload) => Err(format!("panicked: {}", panic_message(payload)).into()),
            };

            if let Err(source) = outcome {
                metrics::record_initializer(name, false);
                self.phase.set(Phase::Failed);
                let err = LifecycleError::Initialization {
                    index,
                    name: name.to_string(),
                    source,
                };
                tracing::error!(error = %err, "Initialization failed");
                return Err(err);
            }

            metrics::record_initializer(name, true);
        }

        tracing::info!(
            count = self.initializers.len(),
            "All initializers completed"
        );
        Ok(())
    }

    /// Run the full lifecycle.
    ///
    /// Returns `Ok(())` when the run ended because `token` (or a child of it)
    /// was cancelled, even if some `stop` calls failed. Returns the first
    /// unexpected service failure otherwise, after teardown has finished.
    pub async fn run(self, token: CancellationToken) -> Result<(), LifecycleError> {
        let span = self
            .span
            .clone()
            .unwrap_or_else(|| tracing::info_span!("launcher", run_id = %Uuid::new_v4()));
        self.run_inner(token).instrument(span).await
    }

    async fn run_inner(self, token: CancellationToken) -> Result<(), LifecycleError> {
        self.init(&token).await?;

        let ctx = token.child_token();
        let mut tasks = JoinSet::new();
        let mut task_index = HashMap::with_capacity(self.services.len());

        for (index, service) in self.services.iter().enumerate() {
            let service = Arc::clone(service);
            let service_token = ctx.clone();
            let span = tracing::info_span!("service", index, name = service.name());
            let handle = tasks.spawn(
                async move {
                    tracing::info!("Service starting");
                    let result = service.start(service_token).await;
                    (index, result)
                }
                .instrument(span),
            );
            task_index.insert(handle.id(), index);
        }

        self.phase.set(Phase::Running);
        metrics::set_running_services(tasks.len());
        tracing::info!(count = self.services.len(), "All services launched");

        let mut failure: Option<LifecycleError> = None;

        while let Some(joined) = tasks.join_next().await {
            metrics::set_running_services(tasks.len());

            let unexpected = match joined {
                Ok((index, Ok(()))) => {
                    let name = self.services[index].name();
                    metrics::record_service_exit(name, "ok");
                    tracing::info!(index, service = name, "Service exited");
                    None
                }
                Ok((index, Err(source))) => {
                    self.classify_error(index, source, &ctx)
                }
                Err(join_err) => {
                    let index = task_index.get(&join_err.id()).copied().unwrap_or_default();
                    self.classify_panic(index, join_err, &ctx)
                }
            };

            if let Some(err) = unexpected {
                tracing::error!(error = %err, "Service failed unexpectedly, shutting down remaining services");
                ctx.cancel();
                failure.get_or_insert(err);
            }
        }

        if failure.is_none() {
            if ctx.is_cancelled() {
                tracing::info!("Shutdown requested, all services have returned");
            } else {
                tracing::info!("All services returned without a shutdown request");
            }
        }

        self.shutdown().await;

        match failure {
            Some(err) => {
                self.phase.set(Phase::Failed);
                Err(err)
            }
            None => {
                self.phase.set(Phase::Terminated);
                Ok(())
            }
        }
    }

    fn classify_error(
        &self,
        index: usize,
        source: BoxError,
        ctx: &CancellationToken,
    ) -> Option<LifecycleError> {
        let name = self.services[index].name();

        if ctx.is_cancelled() {
            metrics::record_service_exit(name, "cancelled");
            tracing::info!(index, service = name, error = %source, "Service returned an error after shutdown was requested");
            return None;
        }

        metrics::record_service_exit(name, "error");
        Some(LifecycleError::ServiceStart {
            index,
            name: name.to_string(),
            source,
        })
    }

    fn classify_panic(
        &self,
        index: usize,
        join_err: JoinError,
        ctx: &CancellationToken,
    ) -> Option<LifecycleError> {
        let name = self.services.get(index).map(|s| s.name()).unwrap_or("unknown");
        let message = if join_err.is_panic() {
            panic_message(join_err.into_panic())
        } else {
            "task cancelled".to_string()
        };

        metrics::record_service_exit(name, "panic");

        if ctx.is_cancelled() {
            tracing::warn!(index, service = name, %message, "Service panicked during shutdown");
            return None;
        }

        Some(LifecycleError::ServicePanicked {
            index,
            name: name.to_string(),
            message,
        })
    }

    /// Stop every service, last registered first, sharing one deadline.
    ///
    /// Failures, panics and timeouts are logged and teardown continues.
    async fn shutdown(&self) {
        self.phase.set(Phase::ShuttingDown);
        let deadline = deadline_after(self.shutdown_timeout);

        tracing::info!(
            count = self.services.len(),
            timeout = ?self.shutdown_timeout,
            "Stopping services"
        );

        for (index, service) in self.services.iter().enumerate().rev() {
            let name = service.name();

            let stop = AssertUnwindSafe(service.stop(deadline)).catch_unwind();

            match timeout_at(deadline, stop).await {
                Ok(Ok(Ok(()))) => {
                    tracing::info!(index, service = name, "Service stopped");
                }
                Ok(Ok(Err(source))) => {
                    metrics::record_stop_failure(name, "error");
                    let err = LifecycleError::Stop {
                        index,
                        name: name.to_string(),
                        source,
                    };
                    tracing::error!(error = %err, "Service stop failed, continuing teardown");
                }
                Ok(Err(payload)) => {
                    metrics::record_stop_failure(name, "panic");
                    tracing::error!(
                        index,
                        service = name,
                        message = %panic_message(payload),
                        "Service stop panicked, continuing teardown"
                    );
                }
                Err(_) => {
                    metrics::record_stop_failure(name, "timeout");
                    tracing::warn!(
                        index,
                        service = name,
                        "Service stop exceeded the shutdown deadline, abandoning it"
                    );
                }
            }
        }

        tracing::info!("Shutdown complete");
    }
}

impl Default for Launcher {
    fn default() -> Self {
        Self::new()
    }
}

fn deadline_after(timeout: Duration) -> Instant {
    let now = Instant::now();
    now.checked_add(timeout).unwrap_or_else(|| now + FAR_FUTURE)
}

fn panic_message(payload: Box<dyn Any + Send>) -> String {
    if let Some(s) = payload.downcast_ref::<&str>() {
        (*s).to_string()
    } else if let Some(s) = payload.downcast_ref::<String>() {
        s.clone()
    } else {
        "non-string panic payload".to_string()
    }
}
