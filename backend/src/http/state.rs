//! Application state for the HTTP server.

use std::sync::Arc;

use crate::db::repository::FullRepository;
use crate::services::BottleneckJobs;

/// Shared application state passed to all handlers.
#[derive(Clone)]
pub struct AppState {
    /// Repository instance, used for health reporting
    pub repository: Arc<dyn FullRepository>,
    /// Job entry points
    pub jobs: BottleneckJobs,
}

impl AppState {
    pub fn new(repository: Arc<dyn FullRepository>, jobs: BottleneckJobs) -> Self {
        Self { repository, jobs }
    }

    /// State whose repository is the one the job service writes to.
    pub fn from_jobs(jobs: BottleneckJobs) -> Self {
        let repository = Arc::clone(jobs.service().repository());
        Self::new(repository, jobs)
    }
}
