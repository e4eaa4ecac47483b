//! Repository trait definitions for storage operations.
//!
//! Storage is split into focused traits so implementations and tests can
//! work with only the part they need.
//!
//! # Module Organization
//!
//! - [`error`]: Error types for repository operations
//! - [`target`]: Targets and their calendar checksums
//! - [`lesson`]: Lessons parsed from a target's calendar
//! - [`bottleneck`]: Stored analysis results
//!
//! # Convenience Trait Bound
//!
//! For code that needs every capability, use the [`FullRepository`] bound:
//!
//! ```ignore
//! async fn reanalyze<R: FullRepository + ?Sized>(repo: &R, key: &TargetKey) -> RepositoryResult<()> {
//!     let lessons = repo.find_lessons(key).await?;
//!     repo.clear_bottlenecks(key).await?;
//!     // ...
//!     Ok(())
//! }
//! ```

pub mod bottleneck;
pub mod error;
pub mod lesson;
pub mod target;

// Re-export error types
pub use error::{ErrorContext, RepositoryError, RepositoryResult};

// Re-export all traits
pub use bottleneck::BottleneckRepository;
pub use lesson::LessonRepository;
pub use target::TargetRepository;

/// Composite trait bound for a complete repository implementation.
///
/// Automatically implemented for any type that implements all three
/// repository traits.
pub trait FullRepository: TargetRepository + LessonRepository + BottleneckRepository {}

// Blanket implementation: any type implementing all three traits automatically implements FullRepository
impl<T> FullRepository for T where T: TargetRepository + LessonRepository + BottleneckRepository {}
