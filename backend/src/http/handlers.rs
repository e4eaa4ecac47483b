//! HTTP handlers for the REST API.
//!
//! Each handler corresponds to an API endpoint and delegates to
//! [`BottleneckJobs`](crate::services::BottleneckJobs).

use axum::{
    extract::{Path, Query, State},
    Json,
};
use serde_json::Value;

use super::dto::{HealthResponse, JobStatusResponse, SearchQuery, SubmitResponse};
use super::error::AppError;
use super::state::AppState;
use crate::models::TargetKind;
use crate::services::{JobId, JobStatus};

/// Result type for handlers.
pub type HandlerResult<T> = Result<Json<T>, AppError>;

/// Parse an integer path segment. Signs, whitespace and leading zeros are rejected.
fn parse_id(raw: &str, what: &str) -> Result<i64, AppError> {
    let invalid = || AppError::BadRequest(format!("{} must be a valid integer number", what));
    let value: i64 = raw.parse().map_err(|_| invalid())?;
    if value.to_string() != raw {
        return Err(invalid());
    }
    Ok(value)
}

fn parse_job_id(raw: &str) -> Result<JobId, AppError> {
    let value = parse_id(raw, "Job id")?;
    u64::try_from(value)
        .map(JobId::new)
        .map_err(|_| AppError::BadRequest("Job id must be a valid integer number".to_string()))
}

// =============================================================================
// Health Check
// =============================================================================

/// GET /health
///
/// Health check endpoint to verify the service is running and the repository is reachable.
pub async fn health_check(State(state): State<AppState>) -> HandlerResult<HealthResponse> {
    let db_status = match state.repository.health_check().await {
        Ok(true) => "connected".to_string(),
        Ok(false) => "disconnected".to_string(),
        Err(e) => format!("error: {}", e),
    };

    Ok(Json(HealthResponse {
        status: "ok".to_string(),
        version: env!("CARGO_PKG_VERSION").to_string(),
        database: db_status,
        pending_jobs: state.jobs.pending(),
    }))
}

// =============================================================================
// Job submission
// =============================================================================

/// POST /jobs/submit/analysis/group/{group_id}/
pub async fn submit_group_analysis(
    State(state): State<AppState>,
    Path(group_id): Path<String>,
) -> HandlerResult<SubmitResponse> {
    let remote_id = parse_id(&group_id, "Group id")?;
    let job_id = state.jobs.submit_analysis(TargetKind::Group, remote_id);
    Ok(Json(SubmitResponse { job_id }))
}

/// POST /jobs/submit/analysis/prof/{prof_id}/
pub async fn submit_instructor_analysis(
    State(state): State<AppState>,
    Path(prof_id): Path<String>,
) -> HandlerResult<SubmitResponse> {
    let remote_id = parse_id(&prof_id, "Professor id")?;
    let job_id = state.jobs.submit_analysis(TargetKind::Instructor, remote_id);
    Ok(Json(SubmitResponse { job_id }))
}

/// POST /jobs/submit/search/?limit=&match=&pageToken=
pub async fn submit_search(
    State(state): State<AppState>,
    Query(query): Query<SearchQuery>,
) -> HandlerResult<SubmitResponse> {
    let job_id = state
        .jobs
        .submit_search(query.limit, query.match_text, query.page_token);
    Ok(Json(SubmitResponse { job_id }))
}

// =============================================================================
// Job polling
// =============================================================================

/// GET /jobs/status/{job_id}/
///
/// Reporting `error` consumes it: later calls answer `not found`.
pub async fn get_job_status(
    State(state): State<AppState>,
    Path(job_id): Path<String>,
) -> HandlerResult<JobStatusResponse> {
    let job_id = parse_job_id(&job_id)?;
    Ok(Json(JobStatusResponse {
        status: state.jobs.get_status(job_id),
    }))
}

/// GET /jobs/result/{job_id}/
///
/// Returns the result once; 503 while processing, 404 when unknown or already
/// collected, 500 when the job failed.
pub async fn get_job_result(
    State(state): State<AppState>,
    Path(job_id): Path<String>,
) -> HandlerResult<Value> {
    let job_id = parse_job_id(&job_id)?;
    let not_found = || {
        AppError::NotFound(format!(
            "Job {} is not found (either not placed yet or already collected)",
            job_id
        ))
    };

    match state.jobs.get_status(job_id) {
        JobStatus::Done => state.jobs.get_result(job_id).map(Json).ok_or_else(not_found),
        JobStatus::Processing => Err(AppError::JobProcessing(job_id)),
        JobStatus::Error => Err(AppError::JobFailed(job_id)),
        JobStatus::NotFound => Err(not_found()),
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_parse_id_accepts_canonical_integers() {
        assert_eq!(parse_id("133", "Group id").unwrap(), 133);
        assert_eq!(parse_id("-5", "Group id").unwrap(), -5);
    }

    #[test]
    fn test_parse_id_rejects_non_canonical_input() {
        for raw in ["abc", "12a", "012", "+12", " 12", "", "1.5"] {
            assert!(
                matches!(parse_id(raw, "Group id"), Err(AppError::BadRequest(_))),
                "{:?} should be rejected",
                raw
            );
        }
    }

    #[test]
    fn test_negative_job_id_is_rejected() {
        assert!(matches!(parse_job_id("-1"), Err(AppError::BadRequest(_))));
        assert_eq!(parse_job_id("7").unwrap(), JobId::new(7));
    }
}
