//! Health and monitoring subsystem.
//!
//! # Data Flow
//! ```text
//! Launcher phase (lifecycle::state)
//!     → PhaseTracker (atomic, shared)
//!     → /ready    200 while Running, 503 otherwise
//!     → /health   200 unless Failed
//! Metrics recorder (observability::metrics)
//!     → /metrics  Prometheus text
//! ```
//!
//! # Design Decisions
//! - The endpoint is an ordinary lifecycle service, registered before
//!   business services so it is stopped last
//! - Readiness is derived from the launcher, not probed

pub mod handlers;
pub mod server;

pub use server::MonitoringService;
