//! Service layer: processing pipeline and the job queue in front of it.
//!
//! - [`processor`]: fetch, checksum, parse, analyze and store one request
//! - [`hydrate`]: client-facing form of stored bottlenecks
//! - [`job_queue`]: serial, deduplicating job execution
//! - [`jobs`]: submit/status/result entry points used by the HTTP layer

pub mod hydrate;
pub mod job_queue;
pub mod jobs;
pub mod processor;

pub use hydrate::{hydrate_from_repository, hydrate_with_lessons, HydrateError};
pub use job_queue::{JobId, JobQueue, JobQueueConfig, JobRequest, JobStatus};
pub use jobs::BottleneckJobs;
pub use processor::{BottleneckService, SearchResultHydrated, TargetHydrated};
