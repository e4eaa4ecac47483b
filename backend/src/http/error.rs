//! HTTP error handling and response types.

use axum::{
    http::StatusCode,
    response::{IntoResponse, Response},
    Json,
};
use serde::{Deserialize, Serialize};

use crate::services::JobId;

/// API error response body.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ApiError {
    /// Error code for programmatic handling
    pub code: String,
    /// Human-readable error message
    pub message: String,
    /// Optional additional details
    #[serde(skip_serializing_if = "Option::is_none")]
    pub details: Option<String>,
}

impl ApiError {
    pub fn new(code: impl Into<String>, message: impl Into<String>) -> Self {
        Self {
            code: code.into(),
            message: message.into(),
            details: None,
        }
    }

    pub fn with_details(mut self, details: impl Into<String>) -> Self {
        self.details = Some(details.into());
        self
    }
}

/// Application error type for HTTP handlers.
#[derive(Debug)]
pub enum AppError {
    /// Resource not found
    NotFound(String),
    /// Invalid request (validation error)
    BadRequest(String),
    /// The job has not finished yet
    JobProcessing(JobId),
    /// The job failed; the failure is reported only once
    JobFailed(JobId),
}

impl IntoResponse for AppError {
    fn into_response(self) -> Response {
        let (status, error) = match self {
            AppError::NotFound(msg) => (StatusCode::NOT_FOUND, ApiError::new("NOT_FOUND", msg)),
            AppError::BadRequest(msg) => {
                (StatusCode::BAD_REQUEST, ApiError::new("BAD_REQUEST", msg))
            }
            AppError::JobProcessing(id) => (
                StatusCode::SERVICE_UNAVAILABLE,
                ApiError::new(
                    "JOB_PROCESSING",
                    "The job result cannot be retrieved as the job is being processed",
                )
                .with_details(format!("job {}", id)),
            ),
            AppError::JobFailed(id) => (
                StatusCode::INTERNAL_SERVER_ERROR,
                ApiError::new(
                    "JOB_FAILED",
                    "An internal error occurred while processing the job",
                )
                .with_details(format!("job {}", id)),
            ),
        };

        (status, Json(error)).into_response()
    }
}
