//! Tests for the HTTP API through the full router.

#![cfg(feature = "http-server")]

mod support;

use std::time::Duration;

use axum::{
    body::{to_bytes, Body},
    http::{Method, Request, StatusCode},
    Router,
};
use serde_json::Value;
use tower::ServiceExt;

use schedule_bottlenecks::http::{create_router, AppState};
use schedule_bottlenecks::models::TargetKind;
use schedule_bottlenecks::services::BottleneckJobs;

use support::{monday_calendar, StubRemote};

fn app(jobs: &BottleneckJobs) -> Router {
    create_router(AppState::from_jobs(jobs.clone()))
}

async fn send(app: &Router, method: Method, uri: &str) -> (StatusCode, Value) {
    let response = app
        .clone()
        .oneshot(
            Request::builder()
                .method(method)
                .uri(uri)
                .body(Body::empty())
                .unwrap(),
        )
        .await
        .unwrap();

    let status = response.status();
    let bytes = to_bytes(response.into_body(), usize::MAX).await.unwrap();
    let body = if bytes.is_empty() {
        Value::Null
    } else {
        serde_json::from_slice(&bytes).unwrap()
    };
    (status, body)
}

async fn wait_for_status(app: &Router, job_id: u64, expected: &str) {
    for _ in 0..200 {
        let (_, body) = send(app, Method::GET, &format!("/jobs/status/{}/", job_id)).await;
        if body["status"] == expected {
            return;
        }
        tokio::time::sleep(Duration::from_millis(10)).await;
    }
    panic!("job {} never reached {}", job_id, expected);
}

#[tokio::test]
async fn test_health_check() {
    let (_repository, jobs) = support::jobs(&StubRemote::new());
    let (status, body) = send(&app(&jobs), Method::GET, "/health").await;

    assert_eq!(status, StatusCode::OK);
    assert_eq!(body["status"], "ok");
    assert_eq!(body["database"], "connected");
    assert_eq!(body["pending_jobs"], 0);
}

#[tokio::test]
async fn test_health_check_reports_unhealthy_repository() {
    let (repository, jobs) = support::jobs(&StubRemote::new());
    repository.set_healthy(false);
    let (status, body) = send(&app(&jobs), Method::GET, "/health").await;

    assert_eq!(status, StatusCode::OK);
    assert_eq!(body["database"], "disconnected");
}

#[tokio::test]
async fn test_invalid_ids_are_rejected() {
    let (_repository, jobs) = support::jobs(&StubRemote::new());
    let app = app(&jobs);

    for (uri, message) in [
        ("/jobs/submit/analysis/group/abc/", "Group id must be a valid integer number"),
        ("/jobs/submit/analysis/prof/1x", "Professor id must be a valid integer number"),
    ] {
        let (status, body) = send(&app, Method::POST, uri).await;
        assert_eq!(status, StatusCode::BAD_REQUEST, "{}", uri);
        assert_eq!(body["code"], "BAD_REQUEST");
        assert_eq!(body["message"], message);
    }

    let (status, body) = send(&app, Method::GET, "/jobs/status/one/").await;
    assert_eq!(status, StatusCode::BAD_REQUEST);
    assert_eq!(body["message"], "Job id must be a valid integer number");
    assert_eq!(jobs.pending(), 0);
}

#[tokio::test]
async fn test_trailing_slash_is_optional() {
    let remote = StubRemote::new();
    remote.set_calendar(TargetKind::Group, 133, monday_calendar());
    let (_repository, jobs) = support::jobs(&remote);
    let app = app(&jobs);

    let (status, with_slash) = send(&app, Method::POST, "/jobs/submit/analysis/group/133/").await;
    assert_eq!(status, StatusCode::OK);
    let (status, without_slash) = send(&app, Method::POST, "/jobs/submit/analysis/group/133").await;
    assert_eq!(status, StatusCode::OK);

    assert_eq!(with_slash["jobId"], 1);
    assert_eq!(with_slash, without_slash);
}

#[tokio::test]
async fn test_analysis_job_lifecycle() {
    let remote = StubRemote::new();
    remote.set_calendar(TargetKind::Instructor, 42, monday_calendar());
    let (_repository, jobs) = support::jobs(&remote);
    let app = app(&jobs);

    let (_, submitted) = send(&app, Method::POST, "/jobs/submit/analysis/prof/42/").await;
    let job_id = submitted["jobId"].as_u64().unwrap();

    wait_for_status(&app, job_id, "done").await;

    let (status, result) = send(&app, Method::GET, &format!("/jobs/result/{}", job_id)).await;
    assert_eq!(status, StatusCode::OK);
    assert_eq!(result["distantClassrooms"].as_array().unwrap().len(), 1);
    assert_eq!(result["largeGaps"].as_array().unwrap().len(), 1);

    let (status, body) = send(&app, Method::GET, &format!("/jobs/result/{}/", job_id)).await;
    assert_eq!(status, StatusCode::NOT_FOUND);
    assert_eq!(body["code"], "NOT_FOUND");

    let (_, body) = send(&app, Method::GET, &format!("/jobs/status/{}/", job_id)).await;
    assert_eq!(body["status"], "not found");
}

#[tokio::test]
async fn test_failed_job_reports_error() {
    let (_repository, jobs) = support::jobs(&StubRemote::new());
    let app = app(&jobs);

    let (_, submitted) = send(&app, Method::POST, "/jobs/submit/analysis/group/7").await;
    let job_id = submitted["jobId"].as_u64().unwrap();

    // wait on the queue directly so the error is not consumed by a status poll
    for _ in 0..200 {
        if jobs.pending() == 0 {
            break;
        }
        tokio::time::sleep(Duration::from_millis(10)).await;
    }

    let (status, body) = send(&app, Method::GET, &format!("/jobs/result/{}/", job_id)).await;
    assert_eq!(status, StatusCode::INTERNAL_SERVER_ERROR);
    assert_eq!(body["code"], "JOB_FAILED");

    let (status, _) = send(&app, Method::GET, &format!("/jobs/result/{}/", job_id)).await;
    assert_eq!(status, StatusCode::NOT_FOUND);
}

#[tokio::test]
async fn test_unknown_job() {
    let (_repository, jobs) = support::jobs(&StubRemote::new());
    let app = app(&jobs);

    let (status, body) = send(&app, Method::GET, "/jobs/status/999/").await;
    assert_eq!(status, StatusCode::OK);
    assert_eq!(body["status"], "not found");

    let (status, _) = send(&app, Method::GET, "/jobs/result/999").await;
    assert_eq!(status, StatusCode::NOT_FOUND);
}

#[tokio::test]
async fn test_search_query_parameters_feed_deduplication() {
    let (_repository, jobs) = support::jobs(&StubRemote::new());
    let app = app(&jobs);

    let (status, first) = send(
        &app,
        Method::POST,
        "/jobs/submit/search/?limit=5&match=%D0%98%D0%9A%D0%91%D0%9E",
    )
    .await;
    assert_eq!(status, StatusCode::OK);
    let (_, same) = send(
        &app,
        Method::POST,
        "/jobs/submit/search?match=%D0%98%D0%9A%D0%91%D0%9E&limit=5",
    )
    .await;
    let (_, other) = send(&app, Method::POST, "/jobs/submit/search/?pageToken=abc").await;

    assert_eq!(first["jobId"], same["jobId"]);
    assert_ne!(first["jobId"], other["jobId"]);
}

#[tokio::test]
async fn test_processing_job_result_is_unavailable() {
    let remote = StubRemote::new();
    remote.set_latency(Duration::from_secs(2));
    let (_repository, jobs) = support::jobs(&remote);
    let app = app(&jobs);

    let job_id = jobs.submit_analysis(TargetKind::Group, 1);
    let (status, body) = send(&app, Method::GET, &format!("/jobs/result/{}/", job_id)).await;

    assert_eq!(status, StatusCode::SERVICE_UNAVAILABLE);
    assert_eq!(body["code"], "JOB_PROCESSING");

    let (_, body) = send(&app, Method::GET, &format!("/jobs/status/{}", job_id)).await;
    assert_eq!(body["status"], "processing");
}
