//! Job-based entry points for analysis and search.
//!
//! Every request becomes a job on the shared [`JobQueue`]; callers get a job
//! id back immediately and poll for the outcome.

use anyhow::anyhow;
use serde::Serialize;
use serde_json::Value;
use std::sync::Arc;

use crate::models::{AnalysisRequest, SearchRequest, TargetKind};

use super::job_queue::{JobId, JobQueue, JobQueueConfig, JobRequest, JobStatus};
use super::processor::BottleneckService;

/// Turn a processing outcome into a job value. Nothing fetched fails the job.
fn into_job_value<T: Serialize>(result: Option<T>) -> anyhow::Result<Value> {
    let value = result.ok_or_else(|| anyhow!("remote API returned no data"))?;
    Ok(serde_json::to_value(value)?)
}

/// Queue-backed facade over [`BottleneckService`].
#[derive(Clone)]
pub struct BottleneckJobs {
    queue: JobQueue,
    service: Arc<BottleneckService>,
}

impl BottleneckJobs {
    /// Must be called from within a Tokio runtime; see [`JobQueue::new`].
    pub fn new(service: Arc<BottleneckService>, config: JobQueueConfig) -> Self {
        Self {
            queue: JobQueue::new(config),
            service,
        }
    }

    pub fn service(&self) -> &Arc<BottleneckService> {
        &self.service
    }

    pub fn submit_analysis(&self, kind: TargetKind, remote_id: i64) -> JobId {
        let request = JobRequest::Analysis(AnalysisRequest { kind, remote_id });
        let service = Arc::clone(&self.service);

        self.queue.submit(request, async move {
            into_job_value(service.process_analysis(kind, remote_id).await?)
        })
    }

    pub fn submit_search(
        &self,
        limit: Option<u32>,
        match_text: Option<String>,
        page_token: Option<String>,
    ) -> JobId {
        let search = SearchRequest {
            limit,
            match_text,
            page_token,
        };
        let service = Arc::clone(&self.service);
        let request = JobRequest::Search(search.clone());

        self.queue.submit(request, async move {
            into_job_value(service.process_search(&search).await?)
        })
    }

    pub fn get_status(&self, job_id: JobId) -> JobStatus {
        self.queue.status(job_id)
    }

    /// Collect a finished job's result. Returns `Some` at most once per job.
    pub fn get_result(&self, job_id: JobId) -> Option<Value> {
        self.queue.result(job_id)
    }

    /// Jobs queued, running, or holding an uncollected result.
    pub fn pending(&self) -> usize {
        self.queue.len()
    }
}
