//! Job status, result and analysis route handlers.

use axum::extract::{Path, State};
use axum::response::{IntoResponse, Response};
use axum::Json;
use serde_json::json;

use vf_core::{AnalysisResult, JobId, JobStatus, TaskId};
use vf_pipeline::StatusUpdate;

use crate::context::AppContext;
use crate::error::AppError;

/// GET /api/jobs
pub async fn list_jobs(State(ctx): State<AppContext>) -> Json<Vec<StatusUpdate>> {
    Json(ctx.store().list_statuses())
}

/// GET /api/status/{job_id}
///
/// Unknown ids answer with the `unknown` stage rather than 404.
pub async fn get_status(
    State(ctx): State<AppContext>,
    Path(job_id): Path<String>,
) -> Json<JobStatus> {
    Json(ctx.store().get_status(&JobId::from(job_id)))
}

/// GET /api/result/{job_id}
///
/// Renders `{}` until the job has completed.
pub async fn get_result(State(ctx): State<AppContext>, Path(job_id): Path<String>) -> Response {
    match ctx.store().get_result(&JobId::from(job_id)) {
        Some(result) => Json(result).into_response(),
        None => Json(json!({})).into_response(),
    }
}

/// GET /api/analysis/{task_id}
pub async fn get_analysis(
    State(ctx): State<AppContext>,
    Path(task_id): Path<String>,
) -> Result<Json<AnalysisResult>, AppError> {
    let task_id = TaskId::from(task_id);
    ctx.store()
        .get_analysis(&task_id)
        .map(Json)
        .ok_or_else(|| vf_core::Error::not_found("analysis", &task_id).into())
}
