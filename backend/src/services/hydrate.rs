//! Conversion of stored bottlenecks into the client-facing form.
//!
//! Pair bottlenecks reference lessons by id; hydration embeds the lessons
//! themselves, stripped of storage identity. Lessons are resolved either from
//! a list already in hand or through the repository.

use chrono::{DateTime, Utc};
use futures::future::try_join_all;
use std::collections::HashMap;

use crate::db::repository::{LessonRepository, RepositoryError};
use crate::models::{
    Bottlenecks, BottlenecksHydrated, Lesson, LessonId, LessonPairHydrated, TargetKey,
    UnbalancedWeek, UnbalancedWeekHydrated,
};

#[derive(Debug, thiserror::Error)]
pub enum HydrateError {
    #[error("Lesson {0} referenced by a bottleneck is missing")]
    MissingLesson(LessonId),

    #[error(transparent)]
    Repository(#[from] RepositoryError),
}

/// `(lesson_a, lesson_b, start)` of a distant-classroom or large-gap finding.
type PairRef = (LessonId, LessonId, DateTime<Utc>);

fn distant_classroom_refs(bottlenecks: &Bottlenecks) -> Vec<PairRef> {
    bottlenecks
        .distant_classrooms
        .iter()
        .map(|b| (b.lesson_a, b.lesson_b, b.start_time))
        .collect()
}

fn large_gap_refs(bottlenecks: &Bottlenecks) -> Vec<PairRef> {
    bottlenecks
        .large_gaps
        .iter()
        .map(|b| (b.lesson_a, b.lesson_b, b.start_time))
        .collect()
}

fn unbalanced_weeks(weeks: &[UnbalancedWeek]) -> Vec<UnbalancedWeekHydrated> {
    weeks.iter().map(UnbalancedWeekHydrated::from).collect()
}

fn pair(lesson_a: &Lesson, lesson_b: &Lesson, start_time: DateTime<Utc>) -> LessonPairHydrated {
    LessonPairHydrated {
        lesson_a: lesson_a.stripped(),
        lesson_b: lesson_b.stripped(),
        start_time,
    }
}

/// Hydrate using lessons already in hand, e.g. those just stored.
pub fn hydrate_with_lessons(
    bottlenecks: &Bottlenecks,
    lessons: &[Lesson],
) -> Result<BottlenecksHydrated, HydrateError> {
    let index: HashMap<LessonId, &Lesson> = lessons
        .iter()
        .filter_map(|lesson| lesson.id.map(|id| (id, lesson)))
        .collect();

    let lookup = |id: LessonId| {
        index
            .get(&id)
            .copied()
            .ok_or(HydrateError::MissingLesson(id))
    };
    let hydrate_pairs = |refs: Vec<PairRef>| {
        refs.into_iter()
            .map(|(a, b, start)| -> Result<LessonPairHydrated, HydrateError> {
                Ok(pair(lookup(a)?, lookup(b)?, start))
            })
            .collect::<Result<Vec<_>, _>>()
    };

    Ok(BottlenecksHydrated {
        distant_classrooms: hydrate_pairs(distant_classroom_refs(bottlenecks))?,
        large_gaps: hydrate_pairs(large_gap_refs(bottlenecks))?,
        unbalanced_weeks: unbalanced_weeks(&bottlenecks.unbalanced_weeks),
    })
}

/// Hydrate by loading the referenced lessons of `key` from the repository.
///
/// Lookups for all pairs run concurrently.
pub async fn hydrate_from_repository<R>(
    repository: &R,
    key: &TargetKey,
    bottlenecks: &Bottlenecks,
) -> Result<BottlenecksHydrated, HydrateError>
where
    R: LessonRepository + ?Sized,
{
    let distant_classrooms =
        hydrate_pairs_from(repository, key, distant_classroom_refs(bottlenecks)).await?;
    let large_gaps = hydrate_pairs_from(repository, key, large_gap_refs(bottlenecks)).await?;

    Ok(BottlenecksHydrated {
        distant_classrooms,
        large_gaps,
        unbalanced_weeks: unbalanced_weeks(&bottlenecks.unbalanced_weeks),
    })
}

async fn hydrate_pairs_from<R>(
    repository: &R,
    key: &TargetKey,
    refs: Vec<PairRef>,
) -> Result<Vec<LessonPairHydrated>, HydrateError>
where
    R: LessonRepository + ?Sized,
{
    let load = |id: LessonId| async move {
        repository
            .find_lesson(key, id)
            .await
            .map_err(HydrateError::from)
            .and_then(|lesson| lesson.ok_or(HydrateError::MissingLesson(id)))
    };

    try_join_all(refs.into_iter().map(|(a, b, start)| async move {
        let (lesson_a, lesson_b) = futures::try_join!(load(a), load(b))?;
        Ok::<_, HydrateError>(pair(&lesson_a, &lesson_b, start))
    }))
    .await
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::db::repositories::LocalRepository;
    use crate::db::repository::TargetRepository;
    use crate::models::{DistantClassroom, TargetId, TargetKind};
    use chrono::TimeZone;

    fn lesson(id: i64, hour: u32) -> Lesson {
        Lesson::new(
            format!("А-{}", id),
            "Лекция",
            Utc.with_ymd_and_hms(2024, 9, 2, hour, 0, 0).unwrap(),
        )
        .with_identity(LessonId::new(id), TargetId::new(1))
    }

    fn distant(a: &Lesson, b: &Lesson) -> Bottlenecks {
        Bottlenecks {
            distant_classrooms: vec![DistantClassroom {
                id: None,
                target_id: TargetId::new(1),
                lesson_a: a.id.unwrap(),
                lesson_b: b.id.unwrap(),
                start_time: a.start_time,
            }],
            ..Bottlenecks::default()
        }
    }

    #[test]
    fn test_local_hydration_strips_lessons() {
        let (a, b) = (lesson(1, 9), lesson(2, 11));
        let hydrated = hydrate_with_lessons(&distant(&a, &b), &[a.clone(), b.clone()]).unwrap();

        let found = &hydrated.distant_classrooms[0];
        assert_eq!(found.lesson_a, a.stripped());
        assert_eq!(found.lesson_b.location, "А-2");
        assert_eq!(found.lesson_a.id, None);
        assert_eq!(found.start_time, a.start_time);
        assert!(hydrated.large_gaps.is_empty());
    }

    #[test]
    fn test_local_hydration_reports_missing_lesson() {
        let (a, b) = (lesson(1, 9), lesson(2, 11));
        let err = hydrate_with_lessons(&distant(&a, &b), &[a]).unwrap_err();
        assert!(matches!(err, HydrateError::MissingLesson(id) if id == LessonId::new(2)));
    }

    #[tokio::test]
    async fn test_repository_hydration_matches_local() {
        let repo = LocalRepository::new();
        let key = repo
            .get_or_create_target(TargetKind::Group, 1)
            .await
            .unwrap()
            .key();
        let stored = repo
            .add_lessons(&key, &[lesson(0, 9), lesson(0, 11)])
            .await
            .unwrap();
        let bottlenecks = distant(&stored[0], &stored[1]);

        let remote = hydrate_from_repository(&repo, &key, &bottlenecks).await.unwrap();
        let local = hydrate_with_lessons(&bottlenecks, &stored).unwrap();
        assert_eq!(remote, local);
    }

    #[tokio::test]
    async fn test_repository_hydration_reports_missing_lesson() {
        let repo = LocalRepository::new();
        let key = repo
            .get_or_create_target(TargetKind::Group, 1)
            .await
            .unwrap()
            .key();
        let stored = repo.add_lessons(&key, &[lesson(0, 9)]).await.unwrap();
        let orphan = lesson(99, 11);

        let err = hydrate_from_repository(&repo, &key, &distant(&stored[0], &orphan))
            .await
            .unwrap_err();
        assert!(matches!(err, HydrateError::MissingLesson(_)));
    }
}
