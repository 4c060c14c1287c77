//! Shared reset-run state.
//!
//! Provides the thread-safe status value the presentation layer reads while a
//! reset is in flight. The orchestrator is the only writer.

use tokio::sync::RwLock;

// ─────────────────────────────────────────────────────────────────────────────
// RunStatus
// ─────────────────────────────────────────────────────────────────────────────

/// Lifecycle of the most recent reset run.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub enum RunStatus {
    /// No run has started, or the last confirmation was dismissed.
    #[default]
    Idle,
    /// Deletes and upserts are in flight.
    Running,
    /// The last run completed with no surfaced errors.
    Done,
    /// The last run completed, but at least one error notification fired.
    Failed,
}

// ─────────────────────────────────────────────────────────────────────────────
// ResetState
// ─────────────────────────────────────────────────────────────────────────────

/// Shared run state, read-only outside the orchestrator.
#[derive(Debug, Default)]
pub struct ResetState {
    /// Current status. Protected by RwLock so observers can read while the
    /// orchestrator holds the write side only for transitions.
    status: RwLock<RunStatus>,
}

impl ResetState {
    /// Creates a new state in `Idle`.
    pub fn new() -> Self {
        Self::default()
    }

    /// Returns the current run status.
    pub async fn status(&self) -> RunStatus {
        *self.status.read().await
    }

    /// Returns true while a reset run is in flight.
    pub async fn is_busy(&self) -> bool {
        self.status().await == RunStatus::Running
    }

    /// Marks a run as started.
    pub(crate) async fn begin(&self) {
        *self.status.write().await = RunStatus::Running;
    }

    /// Marks a run as finished.
    pub(crate) async fn finish(&self, clean: bool) {
        *self.status.write().await = if clean {
            RunStatus::Done
        } else {
            RunStatus::Failed
        };
    }
}
