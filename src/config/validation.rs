//! Configuration validation.
//!
//! # Responsibilities
//! - Semantic validation (serde handles syntactic)
//! - Validate value ranges (timeouts > 0, addresses parse)
//!
//! # Design Decisions
//! - Returns all validation errors, not just first
//! - Log level/format use the logging subsystem's own parsers, so a config
//!   that validates cannot fail logging setup at bootstrap

use std::net::SocketAddr;
use std::str::FromStr;

use thiserror::Error;

use crate::config::schema::AppConfig;
use crate::observability::logging::{parse_level, LogFormat};

/// A single semantic problem in a configuration.
#[derive(Debug, Clone, PartialEq, Eq, Error)]
#[error("{field}: {message}")]
pub struct ValidationError {
    pub field: &'static str,
    pub message: String,
}

impl ValidationError {
    fn new(field: &'static str, message: impl Into<String>) -> Self {
        Self {
            field,
            message: message.into(),
        }
    }
}

/// Check a configuration, collecting every problem found.
pub fn validate_config(config: &AppConfig) -> Result<(), Vec<ValidationError>> {
    let mut errors = Vec::new();

    if config.service.name.trim().is_empty() {
        errors.push(ValidationError::new("service.name", "must not be empty"));
    }

    if config.server.http_port == 0 {
        errors.push(ValidationError::new("server.http_port", "must be non-zero"));
    }
    if config.server.grpc_port == 0 {
        errors.push(ValidationError::new("server.grpc_port", "must be non-zero"));
    }
    if config.server.http_port == config.server.grpc_port {
        errors.push(ValidationError::new(
            "server.grpc_port",
            "must differ from server.http_port",
        ));
    }

    if let Err(e) = config.monitoring.bind_address.parse::<SocketAddr>() {
        errors.push(ValidationError::new(
            "monitoring.bind_address",
            format!("invalid socket address `{}`: {}", config.monitoring.bind_address, e),
        ));
    }
    if config.monitoring.request_timeout_secs == 0 {
        errors.push(ValidationError::new(
            "monitoring.request_timeout_secs",
            "must be greater than zero",
        ));
    }

    if let Err(e) = parse_level(&config.logging.level) {
        errors.push(ValidationError::new("logging.level", e.to_string()));
    }
    if let Err(e) = LogFormat::from_str(&config.logging.format) {
        errors.push(ValidationError::new("logging.format", e.to_string()));
    }

    if config.storage.is_enabled() {
        if config.storage.max_connections == 0 {
            errors.push(ValidationError::new(
                "storage.max_connections",
                "must be greater than zero",
            ));
        }
        if config.storage.connect_timeout_secs == 0 {
            errors.push(ValidationError::new(
                "storage.connect_timeout_secs",
                "must be greater than zero",
            ));
        }
        if config.storage.retry_max_delay_ms < config.storage.retry_base_delay_ms {
            errors.push(ValidationError::new(
                "storage.retry_max_delay_ms",
                "must not be less than storage.retry_base_delay_ms",
            ));
        }
    }

    if config.lifecycle.shutdown_timeout_secs == 0 {
        errors.push(ValidationError::new(
            "lifecycle.shutdown_timeout_secs",
            "must be greater than zero",
        ));
    }

    if errors.is_empty() {
        Ok(())
    } else {
        Err(errors)
    }
}
