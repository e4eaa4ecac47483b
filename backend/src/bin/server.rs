//! Schedule bottleneck HTTP server.
//!
//! Loads `bottleneck.toml`, builds the repository, the remote API client and
//! the job queue, then serves the REST API.
//!
//! # Usage
//!
//! ```bash
//! cargo run --bin bottleneck-server
//!
//! # With an explicit configuration file
//! BOTTLENECK_CONFIG=/etc/bottleneck.toml cargo run --bin bottleneck-server
//! ```
//!
//! # Environment Variables
//!
//! - `BOTTLENECK_CONFIG`: Path of the configuration file
//! - `HOST`: Server host (overrides `app.host`)
//! - `PORT`: Server port (overrides `app.port`)
//! - `RUST_LOG`: Log level (default: info)

use std::env;
use std::net::SocketAddr;
use std::sync::Arc;

use tracing::{info, Level};
use tracing_subscriber::FmtSubscriber;

use schedule_bottlenecks::config::AppConfig;
use schedule_bottlenecks::db::RepositoryFactory;
use schedule_bottlenecks::fetch::HttpRemoteApi;
use schedule_bottlenecks::http::{create_router, AppState};
use schedule_bottlenecks::services::{BottleneckJobs, BottleneckService, JobQueueConfig};

#[tokio::main]
async fn main() -> anyhow::Result<()> {
    // Initialize logging
    FmtSubscriber::builder()
        .with_max_level(
            env::var("RUST_LOG")
                .ok()
                .and_then(|s| s.parse().ok())
                .unwrap_or(Level::INFO),
        )
        .with_target(true)
        .with_thread_ids(true)
        .init();

    info!("Starting schedule bottleneck server");

    let config = AppConfig::load()?;

    let repository = RepositoryFactory::from_config(&config)?;
    info!("Repository initialized successfully");

    let remote = Arc::new(HttpRemoteApi::new(&config.fetch)?);
    let service = Arc::new(BottleneckService::from_config(
        Arc::clone(&repository),
        remote,
        &config,
    ));
    let jobs = BottleneckJobs::new(
        service,
        JobQueueConfig {
            job_timeout: config.app.job_timeout(),
        },
    );

    let app = create_router(AppState::new(repository, jobs));

    // Determine bind address
    let host = env::var("HOST").unwrap_or_else(|_| config.app.host.clone());
    let port: u16 = env::var("PORT")
        .ok()
        .and_then(|s| s.parse().ok())
        .unwrap_or(config.app.port);
    let addr: SocketAddr = format!("{}:{}", host, port).parse()?;

    info!("Server listening on http://{}", addr);

    let listener = tokio::net::TcpListener::bind(addr).await?;
    axum::serve(listener, app).await?;

    Ok(())
}
