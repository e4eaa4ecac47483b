//! Target repository trait.
//!
//! Targets are the groups and instructors whose schedules are analyzed. Every
//! lesson and bottleneck belongs to exactly one target.

use async_trait::async_trait;

use super::error::RepositoryResult;
use crate::models::{Target, TargetKey, TargetKind};

/// Repository trait for schedule targets.
///
/// # Thread Safety
/// Implementations must be `Send + Sync` to work with async Rust.
#[async_trait]
pub trait TargetRepository: Send + Sync {
    // ==================== Health & Connection ====================

    /// Check if the storage backend is healthy.
    ///
    /// # Returns
    /// - `Ok(true)` if the backend is healthy
    /// - `Ok(false)` if it is unhealthy but no error occurred
    /// - `Err(RepositoryError)` if an error occurred during the check
    async fn health_check(&self) -> RepositoryResult<bool>;

    // ==================== Target Operations ====================

    /// Fetch the target with the given remote identity, creating it if absent.
    ///
    /// A freshly created target has no checksum, lessons or bottlenecks.
    ///
    /// # Arguments
    /// * `kind` - Whether the target is a group or an instructor
    /// * `remote_id` - Identifier of the target in the remote schedule API
    ///
    /// # Returns
    /// * `Ok(Target)` - The stored target, with its id assigned
    /// * `Err(RepositoryError)` - If the operation fails
    async fn get_or_create_target(
        &self,
        kind: TargetKind,
        remote_id: i64,
    ) -> RepositoryResult<Target>;

    /// Look up a target.
    ///
    /// # Returns
    /// * `Ok(Some(Target))` - The stored target
    /// * `Ok(None)` - If no such target exists
    async fn find_target(&self, key: &TargetKey) -> RepositoryResult<Option<Target>>;

    /// Checksum of the last calendar analyzed for a target.
    ///
    /// # Returns
    /// * `Ok(None)` - If the target was never analyzed
    /// * `Err(RepositoryError::NotFound)` - If the target doesn't exist
    async fn get_checksum(&self, key: &TargetKey) -> RepositoryResult<Option<String>>;

    /// Record the checksum of the calendar the stored results were computed from.
    ///
    /// # Returns
    /// * `Err(RepositoryError::NotFound)` - If the target doesn't exist
    async fn set_checksum(&self, key: &TargetKey, checksum: &str) -> RepositoryResult<()>;

    /// Delete a target together with its lessons and bottlenecks.
    ///
    /// # Returns
    /// * `Ok(true)` - If the target existed and was deleted
    /// * `Ok(false)` - If there was nothing to delete
    async fn delete_target(&self, key: &TargetKey) -> RepositoryResult<bool>;
}
