//! OS signal handling.
//!
//! # Responsibilities
//! - Listen for SIGINT (Ctrl+C) and, on unix, SIGTERM
//! - Translate the first signal into a shutdown trigger
//! - Force the process to exit on a signal received while shutdown is
//!   already in progress
//!
//! # Design Decisions
//! - Owned by the composition root; the launcher only sees a token
//! - The listener outlives the trigger so a hung teardown can be interrupted
//!   from the terminal; the composition root aborts it once the run returns

use std::future::Future;

use tokio::signal;
use tokio::task::JoinHandle;

use crate::lifecycle::shutdown::Shutdown;

/// Exit status used when a repeated signal forces the process down.
pub const FORCED_EXIT_CODE: i32 = 130;

/// Which signal ended the wait.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum SignalKind {
    Interrupt,
    Terminate,
}

/// Wait for an interrupt or terminate signal.
pub async fn wait_for_signal() -> std::io::Result<SignalKind> {
    #[cfg(unix)]
    {
        let mut terminate = signal::unix::signal(signal::unix::SignalKind::terminate())?;
        tokio::select! {
            res = signal::ctrl_c() => res.map(|_| SignalKind::Interrupt),
            _ = terminate.recv() => Ok(SignalKind::Terminate),
        }
    }

    #[cfg(not(unix))]
    {
        signal::ctrl_c().await.map(|_| SignalKind::Interrupt)
    }
}

/// Spawn a task that triggers `shutdown` on the first process signal and
/// exits the process on the next one.
pub fn spawn_signal_listener(shutdown: Shutdown) -> JoinHandle<()> {
    tokio::spawn(listen(shutdown, wait_for_signal, |kind| {
        tracing::warn!(signal = ?kind, "Signal received during shutdown, forcing exit");
        std::process::exit(FORCED_EXIT_CODE);
    }))
}

async fn listen<W, Fut, F>(shutdown: Shutdown, mut next_signal: W, force: F)
where
    W: FnMut() -> Fut,
    Fut: Future<Output = std::io::Result<SignalKind>>,
    F: FnOnce(SignalKind),
{
    tokio::select! {
        biased;
        _ = shutdown.wait() => {
            tracing::debug!("Shutdown triggered programmatically");
        }
        res = next_signal() => match res {
            Ok(kind) => {
                tracing::info!(signal = ?kind, "Shutdown signal received");
                shutdown.trigger();
            }
            Err(e) => {
                tracing::error!(error = %e, "Failed to install signal handlers; shutdown must be triggered programmatically");
                return;
            }
        },
    }

    match next_signal().await {
        Ok(kind) => force(kind),
        Err(e) => tracing::error!(error = %e, "Signal listener failed during shutdown"),
    }
}
