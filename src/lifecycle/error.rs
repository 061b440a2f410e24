//! Lifecycle error taxonomy.

use thiserror::Error;

use crate::lifecycle::service::BoxError;

/// Errors raised while driving initializers and services.
#[derive(Debug, Error)]
pub enum LifecycleError {
    /// An initializer failed; no later initializer ran and no service started.
    #[error("initializer #{index} ({name}) failed: {source}")]
    Initialization {
        index: usize,
        name: String,
        #[source]
        source: BoxError,
    },

    /// A service's `start` returned an error while no shutdown was requested.
    #[error("service #{index} ({name}) failed: {source}")]
    ServiceStart {
        index: usize,
        name: String,
        #[source]
        source: BoxError,
    },

    /// A service task panicked while no shutdown was requested.
    #[error("service #{index} ({name}) panicked: {message}")]
    ServicePanicked {
        index: usize,
        name: String,
        message: String,
    },

    /// A service's `stop` failed. Only ever logged.
    #[error("service #{index} ({name}) failed to stop: {source}")]
    Stop {
        index: usize,
        name: String,
        #[source]
        source: BoxError,
    },
}

impl LifecycleError {
    /// Position of the failing component in its registration list.
    pub fn index(&self) -> usize {
        match self {
            LifecycleError::Initialization { index, .. }
            | LifecycleError::ServiceStart { index, .. }
            | LifecycleError::ServicePanicked { index, .. }
            | LifecycleError::Stop { index, .. } => *index,
        }
    }

    /// Name of the failing component.
    pub fn component(&self) -> &str {
        match self {
            LifecycleError::Initialization { name, .. }
            | LifecycleError::ServiceStart { name, .. }
            | LifecycleError::ServicePanicked { name, .. }
            | LifecycleError::Stop { name, .. } => name,
        }
    }
}
