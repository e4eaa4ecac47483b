//! Router configuration for the HTTP API.
//!
//! This module sets up all routes, middleware (CORS, compression, tracing),
//! and creates the axum router ready for serving.

use axum::{
    routing::{get, post, MethodRouter},
    Router,
};
use tower_http::{
    compression::CompressionLayer,
    cors::{Any, CorsLayer},
    trace::TraceLayer,
};

use super::handlers;
use super::state::AppState;

/// Route `path` both with and without its trailing slash.
fn route_both(
    router: Router<AppState>,
    path: &str,
    method: MethodRouter<AppState>,
) -> Router<AppState> {
    let bare = path.trim_end_matches('/');
    router
        .route(bare, method.clone())
        .route(&format!("{}/", bare), method)
}

/// Create the main application router with all routes and middleware.
pub fn create_router(state: AppState) -> Router {
    // CORS configuration - permissive, the API carries no credentials
    let cors = CorsLayer::new()
        .allow_origin(Any)
        .allow_methods(Any)
        .allow_headers(Any);

    let mut jobs = Router::new();
    for (path, method) in [
        (
            "/submit/analysis/group/{group_id}/",
            post(handlers::submit_group_analysis),
        ),
        (
            "/submit/analysis/prof/{prof_id}/",
            post(handlers::submit_instructor_analysis),
        ),
        ("/submit/search/", post(handlers::submit_search)),
        ("/status/{job_id}/", get(handlers::get_job_status)),
        ("/result/{job_id}/", get(handlers::get_job_result)),
    ] {
        jobs = route_both(jobs, path, method);
    }

    Router::new()
        .route("/health", get(handlers::health_check))
        .nest("/jobs", jobs)
        .layer(CompressionLayer::new())
        .layer(TraceLayer::new_for_http())
        .layer(cors)
        .with_state(state)
}
