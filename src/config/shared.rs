//! Process-wide published configuration.
//!
//! The composition root publishes the configuration it was started with;
//! any component can read it afterwards without it being threaded through
//! every constructor. Publishing again replaces the value atomically.

use std::sync::Arc;

use arc_swap::ArcSwapOption;

use crate::config::schema::AppConfig;

static CURRENT: ArcSwapOption<AppConfig> = ArcSwapOption::const_empty();

/// Publish `config` as the process-wide configuration.
pub fn publish(config: Arc<AppConfig>) {
    tracing::debug!(service = %config.service.name, "Publishing configuration");
    CURRENT.store(Some(config));
}

/// The most recently published configuration, if any.
pub fn current() -> Option<Arc<AppConfig>> {
    CURRENT.load_full()
}
