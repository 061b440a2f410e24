//! Repository registry.
//!
//! # Responsibilities
//! - Keep an insertion-ordered list of repositories
//! - Initialize their storage, in order, when the storage initializer runs
//!
//! # Design Decisions
//! - One mutex guards both writes and snapshot reads
//! - Snapshots are copies; callers never see the internal vector
//! - Fail fast: a half-migrated schema must not reach business code
//! - A process-wide instance exists for registration at load time; anything
//!   that needs isolation constructs its own `Registry`

use std::sync::{Arc, LazyLock, Mutex, MutexGuard, PoisonError};

use async_trait::async_trait;
use thiserror::Error;

use crate::lifecycle::service::BoxError;
use crate::observability::metrics;
use crate::storage::database::Database;

/// A data-access unit that names its backing table and can create/migrate it.
#[async_trait]
pub trait Repository: Send + Sync {
    fn table_name(&self) -> &str;

    /// Create or migrate the backing table. Must be idempotent.
    async fn initialize_storage(&self, db: &Database) -> Result<(), BoxError>;
}

#[derive(Debug, Error)]
pub enum RegistryError {
    #[error("failed to initialize storage for table `{table}`: {source}")]
    Initialize {
        table: String,
        #[source]
        source: BoxError,
    },
}

impl RegistryError {
    /// Table whose initialization failed.
    pub fn table(&self) -> &str {
        match self {
            RegistryError::Initialize { table, .. } => table,
        }
    }
}

static GLOBAL: LazyLock<Arc<Registry>> = LazyLock::new(|| Arc::new(Registry::new()));

/// Thread-safe, insertion-ordered collection of repositories.
#[derive(Default)]
pub struct Registry {
    repositories: Mutex<Vec<Arc<dyn Repository>>>,
}

impl Registry {
    pub const fn new() -> Self {
        Self {
            repositories: Mutex::new(Vec::new()),
        }
    }

    /// The process-wide registry.
    pub fn global() -> Arc<Registry> {
        Arc::clone(&GLOBAL)
    }

    fn lock(&self) -> MutexGuard<'_, Vec<Arc<dyn Repository>>> {
        // A panic while holding the lock cannot leave the vector half-written.
        self.repositories
            .lock()
            .unwrap_or_else(PoisonError::into_inner)
    }

    /// Append a repository. Safe for concurrent callers.
    pub fn register(&self, repository: Arc<dyn Repository>) {
        tracing::debug!(table = repository.table_name(), "Repository registered");
        self.lock().push(repository);
    }

    /// Copy of the registered repositories, in registration order.
    pub fn snapshot(&self) -> Vec<Arc<dyn Repository>> {
        self.lock().clone()
    }

    pub fn len(&self) -> usize {
        self.lock().len()
    }

    pub fn is_empty(&self) -> bool {
        self.lock().is_empty()
    }

    /// Remove every repository.
    ///
    /// Only for test isolation: not safe to call while other threads are
    /// still registering, as their entries may land before or after the reset.
    pub fn reset(&self) {
        self.lock().clear();
    }

    /// Initialize every repository's storage in registration order.
    ///
    /// Stops at the first failure; later repositories are not initialized.
    /// Returns how many tables were initialized.
    pub async fn initialize_all(&self, db: &Database) -> Result<usize, RegistryError> {
        let repositories = self.snapshot();
        let total = repositories.len();

        for (position, repository) in repositories.iter().enumerate() {
            let table = repository.table_name();

            if let Err(source) = repository.initialize_storage(db).await {
                tracing::error!(table, error = %source, "Table initialization failed");
                return Err(RegistryError::Initialize {
                    table: table.to_string(),
                    source,
                });
            }

            metrics::record_table_initialized(table);
            tracing::info!(table, progress = %format!("{}/{}", position + 1, total), "Table initialized");
        }

        Ok(total)
    }
}

/// Register a repository in the process-wide registry.
pub fn register(repository: Arc<dyn Repository>) {
    GLOBAL.register(repository);
}

#[cfg(test)]
mod tests {
    use super::*;

    struct Named(String);

    #[async_trait]
    impl Repository for Named {
        fn table_name(&self) -> &str {
            &self.0
        }

        async fn initialize_storage(&self, _db: &Database) -> Result<(), BoxError> {
            Ok(())
        }
    }

    fn named(name: &str) -> Arc<dyn Repository> {
        Arc::new(Named(name.to_string()))
    }

    #[test]
    fn test_snapshot_preserves_order_and_is_a_copy() {
        let registry = Registry::new();
        registry.register(named("users"));
        registry.register(named("orders"));

        let mut snapshot = registry.snapshot();
        snapshot.clear();

        let tables: Vec<_> = registry
            .snapshot()
            .iter()
            .map(|r| r.table_name().to_string())
            .collect();
        assert_eq!(tables, vec!["users", "orders"]);
    }

    #[test]
    fn test_reset_clears() {
        let registry = Registry::new();
        registry.register(named("users"));
        assert_eq!(registry.len(), 1);

        registry.reset();
        assert!(registry.is_empty());
    }

    #[test]
    fn test_concurrent_registration_loses_nothing() {
        let registry = Registry::new();
        let threads = 16;
        let per_thread = 50;

        std::thread::scope(|scope| {
            for t in 0..threads {
                let registry = &registry;
                scope.spawn(move || {
                    for i in 0..per_thread {
                        registry.register(named(&format!("t{t}_{i}")));
                    }
                });
            }
        });

        let snapshot = registry.snapshot();
        assert_eq!(snapshot.len(), threads * per_thread);

        let mut names: Vec<_> = snapshot.iter().map(|r| r.table_name().to_string()).collect();
        names.sort();
        names.dedup();
        assert_eq!(names.len(), threads * per_thread);
    }
}
