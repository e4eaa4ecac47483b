#![allow(dead_code)]

use std::collections::{HashMap, HashSet};
use std::sync::atomic::{AtomicUsize, Ordering};
use std::sync::Arc;
use std::time::Duration;

use async_trait::async_trait;
use parking_lot::Mutex;

use schedule_bottlenecks::config::AppConfig;
use schedule_bottlenecks::db::LocalRepository;
use schedule_bottlenecks::fetch::{FetchError, RemoteApi, SearchResult};
use schedule_bottlenecks::models::{SearchRequest, Target, TargetKind};
use schedule_bottlenecks::services::{BottleneckJobs, BottleneckService, JobQueueConfig};

static ENV_LOCK: std::sync::Mutex<()> = std::sync::Mutex::new(());

/// Runs `f` with environment variables temporarily modified.
///
/// Restores the variables on unwind and serializes access to the process
/// environment across tests running in parallel.
///
/// `changes` is a list of `(key, value)` pairs:
/// - `Some(v)` sets the variable to `v`
/// - `None` removes the variable
pub fn with_scoped_env<F, R>(changes: &[(&str, Option<&str>)], f: F) -> R
where
    F: FnOnce() -> R,
{
    let _lock = ENV_LOCK.lock().unwrap_or_else(|e| e.into_inner());
    let _guard = ScopedEnv::new(changes);
    f()
}

struct ScopedEnv {
    snapshot: Vec<(String, Option<String>)>,
}

impl ScopedEnv {
    fn new(changes: &[(&str, Option<&str>)]) -> Self {
        let keys: HashSet<&str> = changes.iter().map(|(k, _)| *k).collect();
        let snapshot = keys
            .into_iter()
            .map(|k| (k.to_string(), std::env::var(k).ok()))
            .collect::<Vec<_>>();

        for (k, v) in changes {
            match v {
                Some(val) => std::env::set_var(k, val),
                None => std::env::remove_var(k),
            }
        }

        Self { snapshot }
    }
}

impl Drop for ScopedEnv {
    fn drop(&mut self) {
        for (k, v) in self.snapshot.drain(..) {
            match v {
                Some(val) => std::env::set_var(&k, val),
                None => std::env::remove_var(&k),
            }
        }
    }
}

/// One VEVENT with a UTC start, e.g. `event("А-1 (В-78)", "Лекция", "20240902T090000Z")`.
pub fn event(location: &str, summary: &str, start: &str) -> String {
    format!(
        "BEGIN:VEVENT\r\nSUMMARY:{}\r\nLOCATION:{}\r\nDTSTART:{}\r\nDTEND:{}\r\nEND:VEVENT\r\n",
        summary, location, start, start
    )
}

pub fn calendar(events: &[String]) -> String {
    format!(
        "BEGIN:VCALENDAR\r\nVERSION:2.0\r\nPRODID:-//tests//EN\r\n{}END:VCALENDAR\r\n",
        events.concat()
    )
}

/// Monday 2024-09-02: a distant-classroom pair (09:00 and 10:40 on different
/// campuses) followed by a large gap (10:40 to 17:00).
pub fn monday_calendar() -> String {
    calendar(&[
        event("А-301 (В-78)", "ЛК Математика", "20240902T090000Z"),
        event("Б-105 (МП-1)", "ПР Физика", "20240902T104000Z"),
        event("Б-110 (МП-1)", "ЛБ Химия", "20240902T170000Z"),
    ])
}

/// In-memory stand-in for the remote schedule API.
#[derive(Default)]
pub struct StubRemote {
    calendars: Mutex<HashMap<(TargetKind, i64), String>>,
    search: Mutex<Option<SearchResult>>,
    calendar_calls: AtomicUsize,
    latency: Mutex<Option<Duration>>,
}

impl StubRemote {
    pub fn new() -> Arc<Self> {
        Arc::new(Self::default())
    }

    pub fn set_calendar(&self, kind: TargetKind, remote_id: i64, text: impl Into<String>) {
        self.calendars.lock().insert((kind, remote_id), text.into());
    }

    pub fn set_search(&self, result: SearchResult) {
        *self.search.lock() = Some(result);
    }

    /// Delay every calendar fetch, keeping jobs in the processing state.
    pub fn set_latency(&self, latency: Duration) {
        *self.latency.lock() = Some(latency);
    }

    pub fn calendar_calls(&self) -> usize {
        self.calendar_calls.load(Ordering::SeqCst)
    }
}

#[async_trait]
impl RemoteApi for StubRemote {
    async fn fetch_calendar(&self, target: &Target) -> Result<Option<String>, FetchError> {
        self.calendar_calls.fetch_add(1, Ordering::SeqCst);
        let latency = *self.latency.lock();
        if let Some(latency) = latency {
            tokio::time::sleep(latency).await;
        }
        Ok(self
            .calendars
            .lock()
            .get(&(target.kind, target.remote_id))
            .cloned())
    }

    async fn fetch_targets(
        &self,
        _request: &SearchRequest,
    ) -> Result<Option<SearchResult>, FetchError> {
        Ok(self.search.lock().clone())
    }
}

pub fn service(
    repository: &LocalRepository,
    remote: &Arc<StubRemote>,
    config: &AppConfig,
) -> Arc<BottleneckService> {
    Arc::new(BottleneckService::from_config(
        Arc::new(repository.clone()),
        remote.clone(),
        config,
    ))
}

/// Job facade over a fresh repository and `remote`, with default settings.
pub fn jobs(remote: &Arc<StubRemote>) -> (LocalRepository, BottleneckJobs) {
    let repository = LocalRepository::new();
    let service = service(&repository, remote, &AppConfig::default());
    (repository, BottleneckJobs::new(service, JobQueueConfig::default()))
}
