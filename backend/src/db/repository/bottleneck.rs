//! Bottleneck repository trait.

use async_trait::async_trait;

use super::error::RepositoryResult;
use crate::models::{Bottlenecks, TargetKey};

/// Storage of analysis results.
#[async_trait]
pub trait BottleneckRepository: Send + Sync {
    /// Store an analysis result for a target.
    ///
    /// Every bottleneck is stored under the addressed target; the returned
    /// bundle carries the assigned ids.
    async fn add_bottlenecks(
        &self,
        key: &TargetKey,
        bottlenecks: &Bottlenecks,
    ) -> RepositoryResult<Bottlenecks>;

    /// Every stored bottleneck of a target.
    async fn find_bottlenecks(&self, key: &TargetKey) -> RepositoryResult<Bottlenecks>;

    /// Remove every bottleneck of a target. Returns how many were removed.
    async fn clear_bottlenecks(&self, key: &TargetKey) -> RepositoryResult<usize>;
}
