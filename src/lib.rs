//! Process lifecycle launcher library.
//!
//! Sequences one-shot initializers, runs long-lived services concurrently,
//! and tears them down in reverse order on a shutdown signal or failure.

pub mod config;
pub mod health;
pub mod lifecycle;
pub mod observability;
pub mod resilience;
pub mod storage;

pub use config::schema::AppConfig;
pub use lifecycle::{bootstrap, Bootstrap, Initializer, Launcher, Service, Shutdown};
pub use storage::{Registry, Repository};
