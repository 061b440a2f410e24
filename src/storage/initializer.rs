//! Storage initializer: connect, then initialize every registered repository.
//!
//! The pool opened here only serves schema setup and is closed once every
//! repository has been initialized. Business services open their own.

use std::sync::Arc;

use async_trait::async_trait;
use tokio_util::sync::CancellationToken;

use crate::config::StorageConfig;
use crate::lifecycle::service::{BoxError, Initializer};
use crate::storage::database::{Database, StorageError};
use crate::storage::registry::{Registry, RegistryError};

pub struct StorageInitializer {
    config: StorageConfig,
    registry: Arc<Registry>,
}

impl StorageInitializer {
    pub fn new(config: StorageConfig, registry: Arc<Registry>) -> Self {
        Self {
            config,
            registry,
        }
    }

    /// Initialize every registered repository against `db`, then close it.
    ///
    /// The pool is closed whether or not initialization succeeded.
    pub async fn initialize(&self, db: Database) -> Result<usize, RegistryError> {
        let result = self.registry.initialize_all(&db).await;
        db.close().await;
        result
    }

    /// Connect, retrying with backoff up to `connect_retries` extra times.
    async fn connect(&self, token: &CancellationToken) -> Result<Database, BoxError> {
        let backoff = self.config.retry_backoff();
        let attempts = self.config.connect_retries.saturating_add(1);
        let mut last_error: Option<StorageError> = None;

        for attempt in 0..attempts {
            let delay = backoff.delay(attempt);
            if !delay.is_zero() {
                tracing::info!(attempt, delay = ?delay, "Retrying storage connection");
            }

            let result = tokio::select! {
                biased;
                _ = token.cancelled() => return Err("storage initialization cancelled".into()),
                res = async {
                    tokio::time::sleep(delay).await;
                    Database::connect(&self.config).await
                } => res,
            };

            match result {
                Ok(db) => return Ok(db),
                Err(e) => {
                    tracing::warn!(attempt, error = %e, "Storage connection attempt failed");
                    last_error = Some(e);
                }
            }
        }

        match last_error {
            Some(e) => Err(e.into()),
            None => Err("no storage connection attempts were made".into()),
        }
    }
}

#[async_trait]
impl Initializer for StorageInitializer {
    async fn init(&self, token: &CancellationToken) -> Result<(), BoxError> {
        tracing::info!(
            repositories = self.registry.len(),
            max_connections = self.config.max_connections,
            "Connecting to storage"
        );

        let db = self.connect(token).await?;

        let initialized = self.initialize(db).await?;
        tracing::info!(tables = initialized, "Storage initialized");
        Ok(())
    }

    fn name(&self) -> &str {
        "storage"
    }
}
