//! Storage of targets, lessons and analysis results.
//!
//! Storage is accessed through the Repository pattern so backends can be
//! swapped without touching the processing code.
//!
//! ```text
//! ┌─────────────────────────────────────────────────────────┐
//! │  HTTP layer / job queue                                 │
//! └───────────────────┬─────────────────────────────────────┘
//!                     │
//! ┌───────────────────▼─────────────────────────────────────┐
//! │  services::processor - fetch, checksum, analyze, store  │
//! └───────────────────┬─────────────────────────────────────┘
//!                     │
//! ┌───────────────────▼─────────────────────────────────────┐
//! │  repository - FullRepository trait                      │
//! └───────────────────┬─────────────────────────────────────┘
//!                     │
//!     ┌───────────────▼──────────────────────────────┐
//!     │             Local Repository                  │
//!     │               (in-memory)                     │
//!     └──────────────────────────────────────────────┘
//! ```
//!
//! - `repository`: Trait definitions and error types
//! - `repositories::local`: In-memory implementation
//! - `factory`: Creates repository instances from configuration
//! - `checksum`: Calendar digests used to skip unchanged schedules

pub mod checksum;
pub mod factory;
pub mod repositories;
pub mod repository;

pub use checksum::calculate_checksum;
pub use factory::{RepositoryFactory, RepositoryType};
pub use repositories::LocalRepository;
pub use repository::{
    BottleneckRepository, ErrorContext, FullRepository, LessonRepository, RepositoryError,
    RepositoryResult, TargetRepository,
};
