use std::sync::Arc;

use axum::{
    Extension, Json, Router,
    extract::Path,
    http::StatusCode,
    response::{IntoResponse, Response},
    routing::{get, post},
};

use vitalscan_core::{JobId, JobKind};

use crate::app::dto::{AnalysisSubmission, JobStatusResponse, SubmissionAccepted};
use crate::app::errors::json_error;
use crate::app::services::AppServices;

pub fn router() -> Router {
    Router::new()
        .route("/", post(submit))
        .route("/jobs/:job_id", get(status))
}

/// `POST /api/analysis` — accept a job, reply 202 before it runs.
async fn submit(
    Extension(services): Extension<Arc<AppServices>>,
    Json(body): Json<AnalysisSubmission>,
) -> Response {
    let kind = JobKind::from(body.kind.unwrap_or_else(|| "signal-analysis".to_string()));
    let payload = body.payload;

    // The broker client does blocking socket IO; keep it off the runtime.
    let submitted =
        tokio::task::spawn_blocking(move || services.gateway.submit(kind, payload)).await;

    match submitted {
        Ok(job_id) => {
            (StatusCode::ACCEPTED, Json(SubmissionAccepted::new(job_id))).into_response()
        }
        Err(e) => json_error(
            StatusCode::INTERNAL_SERVER_ERROR,
            "submission_failed",
            e.to_string(),
        ),
    }
}

/// `GET /api/analysis/jobs/:job_id` — current status, terminal or not.
async fn status(
    Extension(services): Extension<Arc<AppServices>>,
    Path(job_id): Path<String>,
) -> Response {
    let job_id: JobId = match job_id.parse() {
        Ok(id) => id,
        Err(_) => {
            return json_error(
                StatusCode::BAD_REQUEST,
                "invalid_job_id",
                "job id must be a UUID",
            );
        }
    };

    let poll = services.poller.poll(job_id);
    Json(JobStatusResponse::from_poll(job_id, poll)).into_response()
}
