//! Request and response bodies of the HTTP API.

use serde::{Deserialize, Serialize};

use crate::services::{JobId, JobStatus};

/// Health check response.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct HealthResponse {
    /// Status of the service
    pub status: String,
    /// Version of the crate
    pub version: String,
    /// Repository status
    pub database: String,
    /// Jobs queued, running, or holding an uncollected result
    pub pending_jobs: usize,
}

/// Response of the submit endpoints.
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct SubmitResponse {
    pub job_id: JobId,
}

/// Response of the status endpoint.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct JobStatusResponse {
    pub status: JobStatus,
}

/// Query parameters of the search endpoint.
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct SearchQuery {
    #[serde(default)]
    pub limit: Option<u32>,
    #[serde(default, rename = "match")]
    pub match_text: Option<String>,
    #[serde(default, rename = "pageToken")]
    pub page_token: Option<String>,
}
