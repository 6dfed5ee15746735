//! Persisted job record.

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use serde_json::Value as JsonValue;

use vitalscan_core::{JobId, JobKind, JobStatus};

/// On-disk/store form of a finished job.
///
/// Only terminal records are ever written: the gateway does not persist a
/// `Queued` row, so absence from the store means "still processing". The
/// `result` is opaque to the pipeline and present exactly when the status is
/// terminal; `simulated` marks results fabricated by the fallback path.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct JobRecord {
    pub job_id: JobId,
    pub kind: JobKind,
    pub status: JobStatus,
    pub result: Option<JsonValue>,
    pub completed_at: Option<DateTime<Utc>>,
    #[serde(default)]
    pub simulated: bool,
}

impl JobRecord {
    /// Terminal `Completed` record; sets `completedAt` to now.
    pub fn completed(job_id: JobId, kind: JobKind, result: JsonValue, simulated: bool) -> Self {
        Self {
            job_id,
            kind,
            status: JobStatus::Completed,
            result: Some(result),
            completed_at: Some(Utc::now()),
            simulated,
        }
    }

    /// Terminal `Failed` record carrying a structured failure result.
    pub fn failed(job_id: JobId, kind: JobKind, result: JsonValue, simulated: bool) -> Self {
        Self {
            job_id,
            kind,
            status: JobStatus::Failed,
            result: Some(result),
            completed_at: Some(Utc::now()),
            simulated,
        }
    }

    pub fn is_terminal(&self) -> bool {
        self.status.is_terminal()
    }
}
