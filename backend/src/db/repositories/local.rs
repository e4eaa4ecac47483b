//! In-memory local repository implementation.
//!
//! This module provides a local implementation of all repository traits
//! suitable for tests and single-process deployments. All data is stored in
//! memory and lost on restart.

use async_trait::async_trait;
use parking_lot::RwLock;
use std::collections::{BTreeMap, HashMap};
use std::sync::Arc;

use crate::db::repository::*;
use crate::models::{
    BottleneckId, Bottlenecks, DistantClassroom, LargeGap, Lesson, LessonId, Target, TargetId,
    TargetKey, TargetKind, UnbalancedWeek,
};

/// In-memory local repository.
///
/// Cloning is cheap and every clone shares the same data.
///
/// # Example
/// ```
/// use schedule_bottlenecks::db::repositories::LocalRepository;
/// use schedule_bottlenecks::db::repository::TargetRepository;
/// use schedule_bottlenecks::models::TargetKind;
///
/// tokio::runtime::Runtime::new().unwrap().block_on(async {
///     let repo = LocalRepository::new();
///     let target = repo.get_or_create_target(TargetKind::Group, 42).await.unwrap();
///     assert!(target.id.is_some());
/// });
/// ```
#[derive(Clone, Default)]
pub struct LocalRepository {
    data: Arc<RwLock<LocalData>>,
}

struct LocalData {
    targets: HashMap<TargetId, Target>,
    lessons: BTreeMap<LessonId, Lesson>,
    distant_classrooms: BTreeMap<BottleneckId, DistantClassroom>,
    large_gaps: BTreeMap<BottleneckId, LargeGap>,
    unbalanced_weeks: BTreeMap<BottleneckId, UnbalancedWeek>,

    // ID counters
    next_target_id: i64,
    next_lesson_id: i64,
    next_bottleneck_id: i64,

    // Connection health
    is_healthy: bool,
}

impl Default for LocalData {
    fn default() -> Self {
        Self {
            targets: HashMap::new(),
            lessons: BTreeMap::new(),
            distant_classrooms: BTreeMap::new(),
            large_gaps: BTreeMap::new(),
            unbalanced_weeks: BTreeMap::new(),
            next_target_id: 1,
            next_lesson_id: 1,
            next_bottleneck_id: 1,
            is_healthy: true,
        }
    }
}

impl LocalData {
    fn ensure_healthy(&self) -> RepositoryResult<()> {
        if !self.is_healthy {
            return Err(RepositoryError::connection("Local repository is not healthy"));
        }
        Ok(())
    }

    fn resolve(&self, key: &TargetKey) -> Option<TargetId> {
        match *key {
            TargetKey::Id(id) => self.targets.contains_key(&id).then_some(id),
            TargetKey::Remote { kind, remote_id } => self
                .targets
                .values()
                .find(|target| target.kind == kind && target.remote_id == remote_id)
                .and_then(|target| target.id),
        }
    }

    /// Healthy backend and existing target, or the matching error.
    fn require_target(&self, key: &TargetKey, operation: &str) -> RepositoryResult<TargetId> {
        self.ensure_healthy()?;
        self.resolve(key).ok_or_else(|| {
            RepositoryError::not_found_with_context(
                format!("Target {} not found", key),
                ErrorContext::new(operation)
                    .with_entity("target")
                    .with_entity_id(key),
            )
        })
    }

    fn next_bottleneck_id(&mut self) -> BottleneckId {
        let id = BottleneckId::new(self.next_bottleneck_id);
        self.next_bottleneck_id += 1;
        id
    }

    fn bottleneck_count(&self, target_id: TargetId) -> usize {
        self.distant_classrooms
            .values()
            .filter(|b| b.target_id == target_id)
            .count()
            + self
                .large_gaps
                .values()
                .filter(|b| b.target_id == target_id)
                .count()
            + self
                .unbalanced_weeks
                .values()
                .filter(|b| b.target_id == target_id)
                .count()
    }

    fn remove_bottlenecks_of(&mut self, target_id: TargetId) -> usize {
        let removed = self.bottleneck_count(target_id);
        self.distant_classrooms.retain(|_, b| b.target_id != target_id);
        self.large_gaps.retain(|_, b| b.target_id != target_id);
        self.unbalanced_weeks.retain(|_, b| b.target_id != target_id);
        removed
    }

    fn remove_lessons_of(&mut self, target_id: TargetId) -> usize {
        let before = self.lessons.len();
        self.lessons
            .retain(|_, lesson| lesson.target_id != Some(target_id));
        before - self.lessons.len()
    }
}

impl LocalRepository {
    /// Create a new empty local repository.
    pub fn new() -> Self {
        Self::default()
    }

    /// Set the health status (for testing failure paths).
    pub fn set_healthy(&self, healthy: bool) {
        self.data.write().is_healthy = healthy;
    }

    /// Number of stored targets.
    pub fn target_count(&self) -> usize {
        self.data.read().targets.len()
    }
}

#[async_trait]
impl TargetRepository for LocalRepository {
    async fn health_check(&self) -> RepositoryResult<bool> {
        Ok(self.data.read().is_healthy)
    }

    async fn get_or_create_target(
        &self,
        kind: TargetKind,
        remote_id: i64,
    ) -> RepositoryResult<Target> {
        let mut data = self.data.write();
        data.ensure_healthy()?;

        let key = TargetKey::Remote { kind, remote_id };
        if let Some(id) = data.resolve(&key) {
            if let Some(target) = data.targets.get(&id) {
                return Ok(target.clone());
            }
        }

        let id = TargetId::new(data.next_target_id);
        data.next_target_id += 1;

        let target = Target {
            id: Some(id),
            ..Target::new(kind, remote_id)
        };
        data.targets.insert(id, target.clone());
        log::debug!("Created target {} as #{}", key, id);
        Ok(target)
    }

    async fn find_target(&self, key: &TargetKey) -> RepositoryResult<Option<Target>> {
        let data = self.data.read();
        data.ensure_healthy()?;
        Ok(data
            .resolve(key)
            .and_then(|id| data.targets.get(&id))
            .cloned())
    }

    async fn get_checksum(&self, key: &TargetKey) -> RepositoryResult<Option<String>> {
        let data = self.data.read();
        let id = data.require_target(key, "get_checksum")?;
        Ok(data.targets.get(&id).and_then(|t| t.checksum.clone()))
    }

    async fn set_checksum(&self, key: &TargetKey, checksum: &str) -> RepositoryResult<()> {
        let mut data = self.data.write();
        let id = data.require_target(key, "set_checksum")?;
        if let Some(target) = data.targets.get_mut(&id) {
            target.checksum = Some(checksum.to_string());
        }
        Ok(())
    }

    async fn delete_target(&self, key: &TargetKey) -> RepositoryResult<bool> {
        let mut data = self.data.write();
        data.ensure_healthy()?;
        let Some(id) = data.resolve(key) else {
            return Ok(false);
        };

        data.remove_lessons_of(id);
        data.remove_bottlenecks_of(id);
        Ok(data.targets.remove(&id).is_some())
    }
}

#[async_trait]
impl LessonRepository for LocalRepository {
    async fn add_lessons(
        &self,
        key: &TargetKey,
        lessons: &[Lesson],
    ) -> RepositoryResult<Vec<Lesson>> {
        let mut data = self.data.write();
        let target_id = data.require_target(key, "add_lessons")?;

        let mut stored = Vec::with_capacity(lessons.len());
        for lesson in lessons {
            let id = LessonId::new(data.next_lesson_id);
            data.next_lesson_id += 1;

            let lesson = lesson.clone().with_identity(id, target_id);
            data.lessons.insert(id, lesson.clone());
            stored.push(lesson);
        }

        Ok(stored)
    }

    async fn find_lessons(&self, key: &TargetKey) -> RepositoryResult<Vec<Lesson>> {
        let data = self.data.read();
        let target_id = data.require_target(key, "find_lessons")?;

        let mut lessons: Vec<Lesson> = data
            .lessons
            .values()
            .filter(|lesson| lesson.target_id == Some(target_id))
            .cloned()
            .collect();
        lessons.sort_by_key(|lesson| lesson.start_time);
        Ok(lessons)
    }

    async fn find_lesson(
        &self,
        key: &TargetKey,
        id: LessonId,
    ) -> RepositoryResult<Option<Lesson>> {
        let data = self.data.read();
        let target_id = data.require_target(key, "find_lesson")?;
        Ok(data
            .lessons
            .get(&id)
            .filter(|lesson| lesson.target_id == Some(target_id))
            .cloned())
    }

    async fn clear_lessons(&self, key: &TargetKey) -> RepositoryResult<usize> {
        let mut data = self.data.write();
        let target_id = data.require_target(key, "clear_lessons")?;
        Ok(data.remove_lessons_of(target_id))
    }

    async fn remove_lesson(&self, id: LessonId) -> RepositoryResult<bool> {
        let mut data = self.data.write();
        data.ensure_healthy()?;
        Ok(data.lessons.remove(&id).is_some())
    }
}

#[async_trait]
impl BottleneckRepository for LocalRepository {
    async fn add_bottlenecks(
        &self,
        key: &TargetKey,
        bottlenecks: &Bottlenecks,
    ) -> RepositoryResult<Bottlenecks> {
        let mut data = self.data.write();
        let target_id = data.require_target(key, "add_bottlenecks")?;
        let mut stored = Bottlenecks::default();

        for bottleneck in &bottlenecks.distant_classrooms {
            let id = data.next_bottleneck_id();
            let bottleneck = DistantClassroom {
                id: Some(id),
                target_id,
                ..bottleneck.clone()
            };
            data.distant_classrooms.insert(id, bottleneck.clone());
            stored.distant_classrooms.push(bottleneck);
        }

        for bottleneck in &bottlenecks.large_gaps {
            let id = data.next_bottleneck_id();
            let bottleneck = LargeGap {
                id: Some(id),
                target_id,
                ..bottleneck.clone()
            };
            data.large_gaps.insert(id, bottleneck.clone());
            stored.large_gaps.push(bottleneck);
        }

        for bottleneck in &bottlenecks.unbalanced_weeks {
            let id = data.next_bottleneck_id();
            let bottleneck = UnbalancedWeek {
                id: Some(id),
                target_id,
                ..bottleneck.clone()
            };
            data.unbalanced_weeks.insert(id, bottleneck.clone());
            stored.unbalanced_weeks.push(bottleneck);
        }

        Ok(stored)
    }

    async fn find_bottlenecks(&self, key: &TargetKey) -> RepositoryResult<Bottlenecks> {
        let data = self.data.read();
        let target_id = data.require_target(key, "find_bottlenecks")?;

        Ok(Bottlenecks {
            distant_classrooms: data
                .distant_classrooms
                .values()
                .filter(|b| b.target_id == target_id)
                .cloned()
                .collect(),
            large_gaps: data
                .large_gaps
                .values()
                .filter(|b| b.target_id == target_id)
                .cloned()
                .collect(),
            unbalanced_weeks: data
                .unbalanced_weeks
                .values()
                .filter(|b| b.target_id == target_id)
                .cloned()
                .collect(),
        })
    }

    async fn clear_bottlenecks(&self, key: &TargetKey) -> RepositoryResult<usize> {
        let mut data = self.data.write();
        let target_id = data.require_target(key, "clear_bottlenecks")?;
        Ok(data.remove_bottlenecks_of(target_id))
    }
}
