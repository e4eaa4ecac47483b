//! # Schedule Bottlenecks
//!
//! Detection of inconvenient spots in university timetables.
//!
//! Timetables are fetched as iCalendar documents from a remote schedule API,
//! expanded into individual lessons and analyzed for three kinds of
//! bottlenecks:
//!
//! - **Distant classrooms**: consecutive lessons in rooms too far apart for
//!   the break between them
//! - **Large gaps**: long idle stretches between lessons of the same day
//! - **Unbalanced weeks**: weeks whose busiest and quietest days differ too much
//!
//! Requests run as jobs on a serial, deduplicating queue and are exposed over
//! a small REST API.
//!
//! ## Architecture
//!
//! - [`models`]: Lessons, targets, bottlenecks and request types
//! - [`calendar`]: iCalendar parsing and recurrence expansion
//! - [`algorithms`]: Grouping, classifiers and the bottleneck analyzer
//! - [`db`]: Repository pattern and the in-memory store
//! - [`fetch`]: Remote schedule API client
//! - [`services`]: Processing pipeline and the job queue
//! - [`config`]: TOML configuration
//! - [`http`]: Axum-based HTTP server and request handlers

// Allow large error types - RepositoryError contains rich context for debugging
#![allow(clippy::result_large_err)]

pub mod algorithms;
pub mod calendar;
pub mod config;
pub mod db;
pub mod fetch;
pub mod models;
pub mod services;

#[cfg(feature = "http-server")]
pub mod http;
