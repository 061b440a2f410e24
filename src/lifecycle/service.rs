//! Capabilities a component implements to take part in the lifecycle.
//!
//! # Responsibilities
//! - `Initializer`: one-shot, blocking pre-start hook
//! - `Service`: long-lived unit with explicit start/stop
//!
//! # Design Decisions
//! - Both traits are object safe; the launcher stores `Arc<dyn ...>`
//! - `name()` defaults to the concrete type name for diagnostics

use async_trait::async_trait;
use tokio::time::Instant;
use tokio_util::sync::CancellationToken;

/// Error type returned across capability boundaries.
pub type BoxError = Box<dyn std::error::Error + Send + Sync + 'static>;

/// A pre-start setup step (e.g. "connect to storage and migrate schema").
#[async_trait]
pub trait Initializer: Send + Sync {
    /// Run the setup step. Blocks the startup pipeline until it completes.
    async fn init(&self, token: &CancellationToken) -> Result<(), BoxError>;

    /// Name used in logs and errors.
    fn name(&self) -> &str {
        std::any::type_name::<Self>()
    }
}

/// A long-running unit of work.
#[async_trait]
pub trait Service: Send + Sync {
    /// Run until `token` is cancelled or an internal failure occurs.
    ///
    /// Returning `Ok(())` before cancellation is allowed and does not stop
    /// sibling services. Returning an error before cancellation triggers
    /// shutdown of the whole launcher.
    async fn start(&self, token: CancellationToken) -> Result<(), BoxError>;

    /// Release resources. Must finish before `deadline`; the launcher drops
    /// the future once the deadline passes.
    async fn stop(&self, deadline: Instant) -> Result<(), BoxError>;

    /// Name used in logs and errors.
    fn name(&self) -> &str {
        std::any::type_name::<Self>()
    }
}
