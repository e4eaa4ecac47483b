//! Work requests accepted by the job queue.

use serde::{Deserialize, Serialize};

use super::target::TargetKind;

/// Analyze the schedule of one target.
#[derive(Debug, Clone, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub struct AnalysisRequest {
    pub kind: TargetKind,
    pub remote_id: i64,
}

/// Search the remote API and analyze every target found.
#[derive(Debug, Clone, Default, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub struct SearchRequest {
    pub limit: Option<u32>,
    #[serde(rename = "match")]
    pub match_text: Option<String>,
    pub page_token: Option<String>,
}
