//! Lesson repository trait.

use async_trait::async_trait;

use super::error::RepositoryResult;
use crate::models::{Lesson, LessonId, TargetKey};

/// Storage of the lessons parsed from a target's calendar.
///
/// Operations addressing a target fail with `RepositoryError::NotFound` when
/// the target doesn't exist.
#[async_trait]
pub trait LessonRepository: Send + Sync {
    /// Store lessons for a target.
    ///
    /// Returns the stored lessons, in input order, with their ids and target
    /// assigned. Any id or target already set on the input is ignored.
    async fn add_lessons(&self, key: &TargetKey, lessons: &[Lesson])
        -> RepositoryResult<Vec<Lesson>>;

    /// All lessons of a target, ordered by start time.
    async fn find_lessons(&self, key: &TargetKey) -> RepositoryResult<Vec<Lesson>>;

    /// A single lesson of a target, `None` if it doesn't belong to the target.
    async fn find_lesson(&self, key: &TargetKey, id: LessonId)
        -> RepositoryResult<Option<Lesson>>;

    /// Remove every lesson of a target. Returns how many were removed.
    async fn clear_lessons(&self, key: &TargetKey) -> RepositoryResult<usize>;

    /// Remove one lesson. Returns whether it existed.
    async fn remove_lesson(&self, id: LessonId) -> RepositoryResult<bool>;
}
