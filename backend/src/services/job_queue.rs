//! Serial job queue with request deduplication.
//!
//! Submitted work runs on a single background worker, one job at a time, in
//! submission order. Callers poll [`JobQueue::status`] and collect the value
//! once with [`JobQueue::result`].
//!
//! Lifecycle of a job id:
//!
//! ```text
//! submit ──► Processing ──► Done ──result()──► NotFound
//!                 │
//!                 └──► Error ──status()──► NotFound
//! ```

use anyhow::anyhow;
use futures::future::BoxFuture;
use futures::FutureExt;
use parking_lot::Mutex;
use serde::{Deserialize, Serialize};
use serde_json::Value;
use std::any::Any;
use std::collections::{BTreeMap, HashMap, HashSet};
use std::future::Future;
use std::panic::AssertUnwindSafe;
use std::sync::Arc;
use std::time::Duration;
use tokio::sync::mpsc;

use crate::models::{AnalysisRequest, SearchRequest};

crate::define_id_type!(u64, JobId);

/// The request a job was submitted for. Equal requests share one job.
#[derive(Debug, Clone, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(tag = "type", rename_all = "lowercase")]
pub enum JobRequest {
    Analysis(AnalysisRequest),
    Search(SearchRequest),
}

/// Observable state of a job.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum JobStatus {
    /// Queued or running.
    Processing,
    /// Finished; the result is waiting to be collected.
    Done,
    /// Failed. Reported once, after which the id is unknown.
    Error,
    /// Unknown id, or a job whose outcome was already observed.
    #[serde(rename = "not found")]
    NotFound,
}

#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct JobQueueConfig {
    /// Upper bound on the run time of one job body. `None` means unbounded.
    pub job_timeout: Option<Duration>,
}

/// Work executed for a job.
pub type JobWork = BoxFuture<'static, anyhow::Result<Value>>;

struct QueuedJob {
    id: JobId,
    work: JobWork,
}

#[derive(Default)]
struct JobState {
    /// Last allocated id; ids start at 1.
    next_id: u64,
    /// Pending jobs and finished jobs whose result was not collected yet.
    requests: BTreeMap<JobId, JobRequest>,
    results: HashMap<JobId, Value>,
    failed: HashSet<JobId>,
}

impl JobState {
    fn find(&self, request: &JobRequest) -> Option<JobId> {
        self.requests
            .iter()
            .find(|(_, recorded)| *recorded == request)
            .map(|(id, _)| *id)
    }

    fn allocate(&mut self, request: JobRequest) -> JobId {
        self.next_id += 1;
        let id = JobId::new(self.next_id);
        self.requests.insert(id, request);
        id
    }

    fn finish(&mut self, id: JobId, outcome: anyhow::Result<Value>) {
        match outcome {
            Ok(value) => {
                self.results.insert(id, value);
                log::debug!("Job {} done", id);
            }
            Err(error) => {
                let request = self.requests.remove(&id);
                self.failed.insert(id);
                log::error!("Job {} failed for {:?}: {:#}", id, request, error);
            }
        }
    }
}

/// Handle to the queue. Clones share the same queue and worker.
#[derive(Clone)]
pub struct JobQueue {
    state: Arc<Mutex<JobState>>,
    sender: mpsc::UnboundedSender<QueuedJob>,
}

impl JobQueue {
    /// Create the queue and spawn its worker.
    ///
    /// Must be called from within a Tokio runtime. The worker stops once every
    /// handle is dropped and the queued jobs have run.
    pub fn new(config: JobQueueConfig) -> Self {
        let (sender, receiver) = mpsc::unbounded_channel();
        let state = Arc::new(Mutex::new(JobState::default()));

        tokio::spawn(run_worker(Arc::clone(&state), receiver, config));

        Self { state, sender }
    }

    /// Queue `work` for `request` and return the job id.
    ///
    /// When a job for an equal request is still queued, running, or finished
    /// but uncollected, its id is returned and `work` is dropped unpolled.
    pub fn submit<F>(&self, request: JobRequest, work: F) -> JobId
    where
        F: Future<Output = anyhow::Result<Value>> + Send + 'static,
    {
        let mut state = self.state.lock();

        if let Some(id) = state.find(&request) {
            log::debug!("Request {:?} already has job {}", request, id);
            return id;
        }

        let id = state.allocate(request);
        let job = QueuedJob {
            id,
            work: work.boxed(),
        };
        if self.sender.send(job).is_err() {
            state.finish(id, Err(anyhow!("job worker is not running")));
        } else {
            log::info!("Queued job {}", id);
        }
        id
    }

    /// Current state of a job. Reporting [`JobStatus::Error`] forgets the job.
    pub fn status(&self, id: JobId) -> JobStatus {
        let mut state = self.state.lock();

        if state.results.contains_key(&id) {
            JobStatus::Done
        } else if state.failed.remove(&id) {
            JobStatus::Error
        } else if state.requests.contains_key(&id) {
            JobStatus::Processing
        } else {
            JobStatus::NotFound
        }
    }

    /// Take the result of a finished job. Returns `Some` at most once per job.
    pub fn result(&self, id: JobId) -> Option<Value> {
        let mut state = self.state.lock();
        let value = state.results.remove(&id)?;
        state.requests.remove(&id);
        Some(value)
    }

    /// Number of jobs queued, running, or holding an uncollected result.
    pub fn len(&self) -> usize {
        self.state.lock().requests.len()
    }

    pub fn is_empty(&self) -> bool {
        self.len() == 0
    }
}

async fn run_worker(
    state: Arc<Mutex<JobState>>,
    mut receiver: mpsc::UnboundedReceiver<QueuedJob>,
    config: JobQueueConfig,
) {
    while let Some(job) = receiver.recv().await {
        log::debug!("Running job {}", job.id);
        let outcome = run_job(job.work, config.job_timeout).await;
        state.lock().finish(job.id, outcome);
    }
    log::debug!("Job worker stopped");
}

/// Run one job body, turning a timeout or a panic into an error.
async fn run_job(work: JobWork, timeout: Option<Duration>) -> anyhow::Result<Value> {
    let guarded = AssertUnwindSafe(work).catch_unwind();

    let outcome = match timeout {
        Some(limit) => tokio::time::timeout(limit, guarded)
            .await
            .map_err(|_| anyhow!("timed out after {:?}", limit))?,
        None => guarded.await,
    };

    match outcome {
        Ok(result) => result,
        Err(panic) => Err(anyhow!("panicked: {}", panic_message(panic.as_ref()))),
    }
}

fn panic_message(panic: &(dyn Any + Send)) -> &str {
    if let Some(message) = panic.downcast_ref::<&str>() {
        *message
    } else if let Some(message) = panic.downcast_ref::<String>() {
        message.as_str()
    } else {
        "non-string panic payload"
    }
}
