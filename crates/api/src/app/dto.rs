//! Request/response DTOs for the analysis surface.

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use serde_json::Value as JsonValue;

use vitalscan_core::JobId;
use vitalscan_jobs::PollStatus;

/// Body of `POST /api/analysis`.
#[derive(Debug, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct AnalysisSubmission {
    /// Analysis kind tag; defaults to signal analysis when omitted.
    pub kind: Option<String>,
    /// Opaque payload forwarded to the worker untouched.
    #[serde(default)]
    pub payload: JsonValue,
}

/// `202 Accepted` reply to a submission.
#[derive(Debug, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct SubmissionAccepted {
    pub job_id: JobId,
    pub status: &'static str,
    pub check_status_url: String,
}

impl SubmissionAccepted {
    pub fn new(job_id: JobId) -> Self {
        Self {
            job_id,
            status: "Processing",
            check_status_url: format!("/api/analysis/jobs/{job_id}"),
        }
    }
}

/// Reply to a status poll. Terminal fields are absent while processing.
#[derive(Debug, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct JobStatusResponse {
    pub job_id: JobId,
    pub status: &'static str,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub result: Option<JsonValue>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub completed_at: Option<DateTime<Utc>>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub simulated: Option<bool>,
}

impl JobStatusResponse {
    pub fn from_poll(job_id: JobId, poll: PollStatus) -> Self {
        match poll {
            PollStatus::Processing => Self {
                job_id,
                status: "Processing",
                result: None,
                completed_at: None,
                simulated: None,
            },
            PollStatus::Completed {
                result,
                completed_at,
                simulated,
            } => Self {
                job_id,
                status: "Completed",
                result: Some(result),
                completed_at: Some(completed_at),
                simulated: Some(simulated),
            },
            PollStatus::Failed {
                result,
                completed_at,
                simulated,
            } => Self {
                job_id,
                status: "Failed",
                result: Some(result),
                completed_at: Some(completed_at),
                simulated: Some(simulated),
            },
        }
    }
}
