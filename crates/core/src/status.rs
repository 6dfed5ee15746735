//! Job status lifecycle.

use serde::{Deserialize, Serialize};

/// Execution status of an analysis job.
///
/// Transitions are monotonic: `Queued` → `Processing` → `Completed`/`Failed`.
/// A status never regresses, and terminal records are never mutated again.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub enum JobStatus {
    /// Accepted and dispatched, waiting to be picked up.
    Queued,
    /// Currently being analyzed.
    Processing,
    /// Analysis finished; a result is present.
    Completed,
    /// Analysis failed; a structured failure result is present.
    Failed,
}

impl JobStatus {
    pub fn is_terminal(&self) -> bool {
        matches!(self, JobStatus::Completed | JobStatus::Failed)
    }
}
