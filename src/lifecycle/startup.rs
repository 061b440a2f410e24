//! Startup orchestration (composition root).
//!
//! # Responsibilities
//! - Initialize logging from configuration
//! - Publish the configuration process-wide
//! - Assemble the launcher: storage initializer (when configured),
//!   monitoring endpoint, then caller services
//! - Wire OS signals to the shutdown token and run
//!
//! # Design Decisions
//! - Fail fast: invalid log configuration is fatal before anything runs
//! - Monitoring registers before business services, so it stops last
//! - Not re-entrant with respect to the process-wide registry: a second
//!   bootstrap re-initializes the same tables, so repositories must be
//!   idempotent

use std::sync::Arc;

use thiserror::Error;
use uuid::Uuid;

use crate::config::{self, AppConfig};
use crate::health::MonitoringService;
use crate::lifecycle::error::LifecycleError;
use crate::lifecycle::launcher::Launcher;
use crate::lifecycle::service::Service;
use crate::lifecycle::shutdown::Shutdown;
use crate::lifecycle::signals::spawn_signal_listener;
use crate::observability::logging::{init_logging, LoggingError};
use crate::storage::{Registry, StorageInitializer};

#[derive(Debug, Error)]
pub enum BootstrapError {
    #[error(transparent)]
    Logging(#[from] LoggingError),

    #[error(transparent)]
    Lifecycle(#[from] LifecycleError),
}

/// Builder for one run of a process.
pub struct Bootstrap {
    config: AppConfig,
    registry: Arc<Registry>,
    services: Vec<Arc<dyn Service>>,
    shutdown: Shutdown,
    signal_handlers: bool,
}

impl Bootstrap {
    /// Start from `config`, the process-wide registry and a fresh shutdown
    /// coordinator wired to OS signals.
    pub fn new(config: AppConfig) -> Self {
        Self {
            config,
            registry: Registry::global(),
            services: Vec::new(),
            shutdown: Shutdown::new(),
            signal_handlers: true,
        }
    }

    /// Use `registry` instead of the process-wide one.
    pub fn with_registry(mut self, registry: Arc<Registry>) -> Self {
        self.registry = registry;
        self
    }

    pub fn with_service(mut self, service: Arc<dyn Service>) -> Self {
        self.services.push(service);
        self
    }

    pub fn with_services(mut self, services: impl IntoIterator<Item = Arc<dyn Service>>) -> Self {
        self.services.extend(services);
        self
    }

    /// Drive shutdown from `shutdown` (in addition to OS signals, if enabled).
    pub fn with_shutdown(mut self, shutdown: Shutdown) -> Self {
        self.shutdown = shutdown;
        self
    }

    /// Do not install SIGINT/SIGTERM handlers; the caller owns shutdown.
    pub fn without_signal_handlers(mut self) -> Self {
        self.signal_handlers = false;
        self
    }

    /// Handle that triggers shutdown of this run.
    pub fn shutdown_handle(&self) -> Shutdown {
        self.shutdown.clone()
    }

    /// Assemble everything and run until shutdown or failure.
    pub async fn run(self) -> Result<(), BootstrapError> {
        init_logging(&self.config.logging)?;

        let config = Arc::new(self.config);
        config::publish(Arc::clone(&config));

        tracing::info!(
            service = %config.service.name,
            environment = %config.service.environment,
            version = env!("CARGO_PKG_VERSION"),
            "Bootstrapping"
        );

        let mut launcher = Launcher::new()
            .with_shutdown_timeout(config.lifecycle.shutdown_timeout())
            .with_span(tracing::info_span!(
                "launcher",
                service = %config.service.name,
                run_id = %Uuid::new_v4()
            ));

        if config.storage.is_enabled() {
            launcher.add_initializer(Arc::new(StorageInitializer::new(
                config.storage.clone(),
                Arc::clone(&self.registry),
            )));
        } else {
            tracing::info!("Storage disabled: no database_url configured");
        }

        let monitoring = MonitoringService::new(
            config.monitoring.clone(),
            config.service.clone(),
            launcher.phase_tracker(),
        );
        launcher.add_service(Arc::new(monitoring));

        for service in self.services {
            launcher.add_service(service);
        }

        let listener = self
            .signal_handlers
            .then(|| spawn_signal_listener(self.shutdown.clone()));

        let result = launcher.run(self.shutdown.token()).await;

        if let Some(listener) = listener {
            listener.abort();
        }

        result?;
        tracing::info!(service = %config.service.name, "Run finished cleanly");
        Ok(())
    }
}

/// Run `services` under the configuration `config` until a process signal
/// or a failure.
pub async fn bootstrap(
    config: AppConfig,
    services: Vec<Arc<dyn Service>>,
) -> Result<(), BootstrapError> {
    Bootstrap::new(config).with_services(services).run().await
}
