//! Launcher phase tracking.
//!
//! # States
//! ```text
//! Assembling → Initializing → Running → ShuttingDown → Terminated
//!                   │            │
//!                   └──► Failed ◄┘
//! ```
//!
//! `Failed` from `Running` is recorded after teardown has finished, so the
//! tracker passes through `ShuttingDown` first.

use std::fmt;
use std::sync::atomic::{AtomicU8, Ordering};
use std::sync::Arc;

/// Lifecycle phase of a launcher.
#[repr(u8)]
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Phase {
    Assembling = 0,
    Initializing = 1,
    Running = 2,
    ShuttingDown = 3,
    Terminated = 4,
    Failed = 5,
}

impl From<u8> for Phase {
    fn from(val: u8) -> Self {
        match val {
            1 => Phase::Initializing,
            2 => Phase::Running,
            3 => Phase::ShuttingDown,
            4 => Phase::Terminated,
            5 => Phase::Failed,
            _ => Phase::Assembling,
        }
    }
}

impl Phase {
    pub fn as_str(&self) -> &'static str {
        match self {
            Phase::Assembling => "assembling",
            Phase::Initializing => "initializing",
            Phase::Running => "running",
            Phase::ShuttingDown => "shutting_down",
            Phase::Terminated => "terminated",
            Phase::Failed => "failed",
        }
    }

    /// Whether the launcher has left the lifecycle for good.
    pub fn is_final(&self) -> bool {
        matches!(self, Phase::Terminated | Phase::Failed)
    }
}

impl fmt::Display for Phase {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

/// Shared, cheaply cloneable view of a launcher's phase.
#[derive(Debug, Clone, Default)]
pub struct PhaseTracker {
    phase: Arc<AtomicU8>,
}

impl PhaseTracker {
    pub fn new() -> Self {
        Self::default()
    }

    /// Current phase.
    pub fn get(&self) -> Phase {
        Phase::from(self.phase.load(Ordering::Acquire))
    }

    pub(crate) fn set(&self, phase: Phase) {
        let previous = Phase::from(self.phase.swap(phase as u8, Ordering::AcqRel));
        if previous != phase {
            tracing::debug!(from = %previous, to = %phase, "Launcher phase changed");
        }
    }

    /// True only while services are running.
    pub fn is_ready(&self) -> bool {
        self.get() == Phase::Running
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_phase_round_trips_through_u8() {
        for phase in [
            Phase::Assembling,
            Phase::Initializing,
            Phase::Running,
            Phase::ShuttingDown,
            Phase::Terminated,
            Phase::Failed,
        ] {
            assert_eq!(Phase::from(phase as u8), phase);
        }
        assert_eq!(Phase::from(200), Phase::Assembling);
    }

    #[test]
    fn test_tracker_clones_share_state() {
        let tracker = PhaseTracker::new();
        let view = tracker.clone();
        assert_eq!(view.get(), Phase::Assembling);

        tracker.set(Phase::Running);
        assert!(view.is_ready());

        tracker.set(Phase::Failed);
        assert!(view.get().is_final());
        assert!(!view.is_ready());
    }
}
