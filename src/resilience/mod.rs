//! Resilience helpers.
//!
//! # Design Decisions
//! - Startup dependencies (storage) may come up after the process does;
//!   connecting is retried a bounded number of times with jittered backoff
//! - Every wait is cancellable by the shutdown token

pub mod backoff;

pub use backoff::Backoff;
