//! Shared test doubles for lifecycle and registry tests.

#![allow(dead_code)]

use std::sync::atomic::{AtomicUsize, Ordering};
use std::sync::{Arc, Mutex};
use std::time::Duration;

use async_trait::async_trait;
use service_launcher::lifecycle::BoxError;
use service_launcher::storage::Database;
use service_launcher::{Initializer, Repository, Service};
use tokio::time::Instant;
use tokio_util::sync::CancellationToken;

/// Ordered record of calls made on test doubles.
#[derive(Clone, Default)]
pub struct EventLog(Arc<Mutex<Vec<String>>>);

impl EventLog {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn push(&self, event: impl Into<String>) {
        self.0.lock().unwrap().push(event.into());
    }

    pub fn events(&self) -> Vec<String> {
        self.0.lock().unwrap().clone()
    }

    /// Events starting with `prefix`, in order.
    pub fn with_prefix(&self, prefix: &str) -> Vec<String> {
        self.events()
            .into_iter()
            .filter(|e| e.starts_with(prefix))
            .collect()
    }
}

pub struct RecordingInitializer {
    name: String,
    log: EventLog,
    fail: bool,
    panic: bool,
}

impl RecordingInitializer {
    pub fn ok(name: &str, log: &EventLog) -> Arc<Self> {
        Arc::new(Self {
            name: name.to_string(),
            log: log.clone(),
            fail: false,
            panic: false,
        })
    }

    pub fn failing(name: &str, log: &EventLog) -> Arc<Self> {
        Arc::new(Self {
            name: name.to_string(),
            log: log.clone(),
            fail: true,
            panic: false,
        })
    }

    pub fn panicking(name: &str, log: &EventLog) -> Arc<Self> {
        Arc::new(Self {
            name: name.to_string(),
            log: log.clone(),
            fail: false,
            panic: true,
        })
    }
}

#[async_trait]
impl Initializer for RecordingInitializer {
    async fn init(&self, _token: &CancellationToken) -> Result<(), BoxError> {
        self.log.push(format!("init:{}", self.name));
        if self.panic {
            panic!("{} blew up", self.name);
        }
        if self.fail {
            return Err(format!("{} exploded", self.name).into());
        }
        Ok(())
    }

    fn name(&self) -> &str {
        &self.name
    }
}

/// How a `RecordingService` behaves once started.
#[derive(Clone, Copy)]
pub enum StartBehavior {
    /// Block until cancelled, then return Ok.
    UntilCancelled,
    /// Block until cancelled, then return an error.
    ErrorOnCancel,
    /// Return an error after the given delay, without waiting for cancellation.
    FailAfter(Duration),
    /// Return Ok right away.
    ReturnImmediately,
}

pub struct RecordingService {
    name: String,
    log: EventLog,
    behavior: StartBehavior,
    stop_fails: bool,
    stop_panics: bool,
    stop_delay: Option<Duration>,
    completed: Arc<AtomicUsize>,
}

impl RecordingService {
    pub fn new(name: &str, log: &EventLog) -> Self {
        Self {
            name: name.to_string(),
            log: log.clone(),
            behavior: StartBehavior::UntilCancelled,
            stop_fails: false,
            stop_panics: false,
            stop_delay: None,
            completed: Arc::new(AtomicUsize::new(0)),
        }
    }

    pub fn behavior(mut self, behavior: StartBehavior) -> Self {
        self.behavior = behavior;
        self
    }

    pub fn stop_fails(mut self) -> Self {
        self.stop_fails = true;
        self
    }

    pub fn stop_panics(mut self) -> Self {
        self.stop_panics = true;
        self
    }

    pub fn stop_delay(mut self, delay: Duration) -> Self {
        self.stop_delay = Some(delay);
        self
    }

    /// Share a counter incremented whenever `start` returns.
    pub fn completion_counter(mut self, counter: &Arc<AtomicUsize>) -> Self {
        self.completed = Arc::clone(counter);
        self
    }

    pub fn build(self) -> Arc<Self> {
        Arc::new(self)
    }
}

#[async_trait]
impl Service for RecordingService {
    async fn start(&self, token: CancellationToken) -> Result<(), BoxError> {
        self.log.push(format!("start:{}", self.name));

        let result = match self.behavior {
            StartBehavior::UntilCancelled => {
                token.cancelled().await;
                Ok(())
            }
            StartBehavior::ErrorOnCancel => {
                token.cancelled().await;
                Err(format!("{} interrupted", self.name).into())
            }
            StartBehavior::FailAfter(delay) => {
                tokio::time::sleep(delay).await;
                Err(format!("{} crashed", self.name).into())
            }
            StartBehavior::ReturnImmediately => Ok(()),
        };

        self.log.push(format!("exit:{}", self.name));
        self.completed.fetch_add(1, Ordering::SeqCst);
        result
    }

    async fn stop(&self, _deadline: Instant) -> Result<(), BoxError> {
        self.log.push(format!("stop:{}", self.name));
        if let Some(delay) = self.stop_delay {
            tokio::time::sleep(delay).await;
        }
        if self.stop_panics {
            panic!("{} panicked while stopping", self.name);
        }
        if self.stop_fails {
            return Err(format!("{} refused to stop", self.name).into());
        }
        Ok(())
    }

    fn name(&self) -> &str {
        &self.name
    }
}

pub struct RecordingRepository {
    table: String,
    log: EventLog,
    fail: bool,
}

impl RecordingRepository {
    pub fn ok(table: &str, log: &EventLog) -> Arc<Self> {
        Arc::new(Self {
            table: table.to_string(),
            log: log.clone(),
            fail: false,
        })
    }

    pub fn failing(table: &str, log: &EventLog) -> Arc<Self> {
        Arc::new(Self {
            table: table.to_string(),
            log: log.clone(),
            fail: true,
        })
    }
}

#[async_trait]
impl Repository for RecordingRepository {
    fn table_name(&self) -> &str {
        &self.table
    }

    async fn initialize_storage(&self, _db: &Database) -> Result<(), BoxError> {
        self.log.push(format!("init:{}", self.table));
        if self.fail {
            return Err("duplicate column".into());
        }
        Ok(())
    }
}
