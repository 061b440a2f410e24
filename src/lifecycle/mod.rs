//! Lifecycle management subsystem.
//!
//! # Data Flow
//! ```text
//! Startup (startup.rs):
//!     Logging → Publish config → Assemble launcher → Run
//!
//! Launcher (launcher.rs):
//!     Initializers (sequential) → Services (concurrent) → Join all
//!     → Stop services (reverse order)
//!
//! Signals (signals.rs):
//!     SIGTERM/SIGINT → Trigger graceful shutdown (shutdown.rs)
//!     Repeated signal during shutdown → Forced exit
//! ```
//!
//! # Design Decisions
//! - Ordered startup: initializers first, services only once all succeed
//! - Ordered shutdown: last registered service stops first
//! - Shutdown has timeout: a stop still running at the deadline is dropped

pub mod error;
pub mod launcher;
pub mod service;
pub mod shutdown;
pub mod signals;
pub mod startup;
pub mod state;

pub use error::LifecycleError;
pub use launcher::{Launcher, DEFAULT_SHUTDOWN_TIMEOUT};
pub use service::{BoxError, Initializer, Service};
pub use shutdown::Shutdown;
pub use startup::{bootstrap, Bootstrap, BootstrapError};
pub use state::{Phase, PhaseTracker};
