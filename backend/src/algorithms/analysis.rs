//! Bottleneck analysis of a target's lessons.
//!
//! [`BottleneckAnalyzer`] composes the chronological grouping, the pairwise
//! predicates and the week balance into one [`Bottlenecks`] bundle.
//!
//! All lessons handed to the analyzer must already be stored: bottlenecks
//! reference lessons by id and belong to the lessons' target. Violations are
//! reported as [`AnalysisError`] and abort the analysis.

use crate::config::AnalysisConfig;
use crate::models::{
    Bottlenecks, DistantClassroom, LargeGap, Lesson, LessonId, TargetId, UnbalancedWeek,
    BALANCED_WEEKDAYS,
};
use chrono::{Datelike, Weekday};

use super::classifiers::{is_distant_classroom, is_large_gap};
use super::grouping::{
    arrange_into_pairs, arrange_into_weeks, collapse_refs_to_groups, collapse_to_groups,
    week_start, LessonPair,
};

/// Result type for analysis operations
pub type AnalysisResult<T> = Result<T, AnalysisError>;

/// Contract violations detected while building bottlenecks.
#[derive(Debug, Clone, PartialEq, Eq, thiserror::Error)]
pub enum AnalysisError {
    #[error("Lesson at {0} has no target; both lessons must have a target to construct a bottleneck")]
    MissingTarget(chrono::DateTime<chrono::Utc>),

    #[error("Lesson at {0} has no id; lessons must be stored before constructing a bottleneck")]
    MissingLessonId(chrono::DateTime<chrono::Utc>),

    #[error("Lessons belong to different targets ({0} and {1})")]
    TargetMismatch(TargetId, TargetId),
}

/// Per-weekday count of distinct time groups, Monday first. Sunday is not counted.
pub fn week_balance(week: &[&Lesson]) -> [u32; BALANCED_WEEKDAYS] {
    let mut counts = [0u32; BALANCED_WEEKDAYS];

    for group in collapse_refs_to_groups(week) {
        let weekday = group[0].start_time.weekday();
        if weekday != Weekday::Sun {
            counts[weekday.num_days_from_monday() as usize] += 1;
        }
    }

    counts
}

/// Difference between the busiest and quietest non-empty day, if any day is non-empty.
pub fn balance_range(counts: &[u32]) -> Option<u32> {
    let nonzero = counts.iter().copied().filter(|count| *count != 0);
    let min = nonzero.clone().min()?;
    let max = nonzero.max()?;
    Some(max - min)
}

/// Identity of a stored lesson: `(id, target)`.
fn stored_identity(lesson: &Lesson) -> AnalysisResult<(LessonId, TargetId)> {
    let target = lesson
        .target_id
        .ok_or(AnalysisError::MissingTarget(lesson.start_time))?;
    let id = lesson
        .id
        .ok_or(AnalysisError::MissingLessonId(lesson.start_time))?;
    Ok((id, target))
}

/// Validated `(target, lesson_a, lesson_b)` of a pair bottleneck.
fn pair_identity(pair: &LessonPair<'_>) -> AnalysisResult<(TargetId, LessonId, LessonId)> {
    let (a, b) = pair;
    let target_a = a.target_id.ok_or(AnalysisError::MissingTarget(a.start_time))?;
    let target_b = b.target_id.ok_or(AnalysisError::MissingTarget(b.start_time))?;
    if target_a != target_b {
        return Err(AnalysisError::TargetMismatch(target_a, target_b));
    }
    let (id_a, _) = stored_identity(a)?;
    let (id_b, _) = stored_identity(b)?;
    Ok((target_a, id_a, id_b))
}

/// Shared target of every lesson in a week.
fn week_target(week: &[&Lesson]) -> AnalysisResult<Option<TargetId>> {
    let mut shared: Option<TargetId> = None;
    for lesson in week {
        let target = lesson
            .target_id
            .ok_or(AnalysisError::MissingTarget(lesson.start_time))?;
        match shared {
            Some(expected) if expected != target => {
                return Err(AnalysisError::TargetMismatch(expected, target))
            }
            _ => shared = Some(target),
        }
    }
    Ok(shared)
}

/// Detects bottlenecks in a set of lessons using fixed thresholds.
#[derive(Debug, Clone, Default)]
pub struct BottleneckAnalyzer {
    config: AnalysisConfig,
}

impl BottleneckAnalyzer {
    pub fn new(config: AnalysisConfig) -> Self {
        Self { config }
    }

    pub fn config(&self) -> &AnalysisConfig {
        &self.config
    }

    /// Run every detector over `lessons`.
    ///
    /// The lesson pairs are built once and shared by both pairwise detectors.
    pub fn analyze(&self, lessons: &[Lesson]) -> AnalysisResult<Bottlenecks> {
        let groups = collapse_to_groups(lessons);
        let pairs = arrange_into_pairs(&groups);

        let bottlenecks = Bottlenecks {
            distant_classrooms: self.distant_classrooms_from_pairs(&pairs)?,
            large_gaps: self.large_gaps_from_pairs(&pairs)?,
            unbalanced_weeks: self.unbalanced_weeks(lessons)?,
        };

        log::debug!(
            "Analyzed {} lessons: {} distant classrooms, {} large gaps, {} unbalanced weeks",
            lessons.len(),
            bottlenecks.distant_classrooms.len(),
            bottlenecks.large_gaps.len(),
            bottlenecks.unbalanced_weeks.len()
        );

        Ok(bottlenecks)
    }

    /// Consecutive lessons in rooms too far apart for the break between them.
    pub fn distant_classrooms(&self, lessons: &[Lesson]) -> AnalysisResult<Vec<DistantClassroom>> {
        let groups = collapse_to_groups(lessons);
        self.distant_classrooms_from_pairs(&arrange_into_pairs(&groups))
    }

    /// Consecutive same-day lessons separated by an excessive gap.
    pub fn large_gaps(&self, lessons: &[Lesson]) -> AnalysisResult<Vec<LargeGap>> {
        let groups = collapse_to_groups(lessons);
        self.large_gaps_from_pairs(&arrange_into_pairs(&groups))
    }

    /// Weeks whose non-empty weekdays differ by more than the configured range.
    pub fn unbalanced_weeks(&self, lessons: &[Lesson]) -> AnalysisResult<Vec<UnbalancedWeek>> {
        let mut bottlenecks = Vec::new();

        for week in arrange_into_weeks(lessons) {
            let counts = week_balance(&week);
            let Some(range) = balance_range(&counts) else {
                continue;
            };
            if range <= self.config.max_range_of_lessons_per_day {
                continue;
            }

            let Some(target_id) = week_target(&week)? else {
                continue;
            };

            bottlenecks.push(UnbalancedWeek {
                id: None,
                target_id,
                week_start: week_start(week[0].start_time),
                daily_counts: counts,
            });
        }

        Ok(bottlenecks)
    }

    fn distant_classrooms_from_pairs(
        &self,
        pairs: &[LessonPair<'_>],
    ) -> AnalysisResult<Vec<DistantClassroom>> {
        pairs
            .iter()
            .filter(|(a, b)| is_distant_classroom(a, b, &self.config))
            .map(|pair| {
                let (target_id, lesson_a, lesson_b) = pair_identity(pair)?;
                Ok(DistantClassroom {
                    id: None,
                    target_id,
                    lesson_a,
                    lesson_b,
                    start_time: pair.0.start_time,
                })
            })
            .collect()
    }

    fn large_gaps_from_pairs(&self, pairs: &[LessonPair<'_>]) -> AnalysisResult<Vec<LargeGap>> {
        pairs
            .iter()
            .filter(|(a, b)| is_large_gap(a, b, &self.config))
            .map(|pair| {
                let (target_id, lesson_a, lesson_b) = pair_identity(pair)?;
                Ok(LargeGap {
                    id: None,
                    target_id,
                    lesson_a,
                    lesson_b,
                    start_time: pair.0.start_time,
                })
            })
            .collect()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use chrono::{TimeZone, Utc};

    fn stored(id: i64, day: u32, hour: u32, minute: u32, location: &str) -> Lesson {
        Lesson::new(
            location,
            "Lecture",
            Utc.with_ymd_and_hms(2024, 9, day, hour, minute, 0).unwrap(),
        )
        .with_identity(LessonId::new(id), TargetId::new(1))
    }

    fn analyzer(max_range: u32) -> BottleneckAnalyzer {
        BottleneckAnalyzer::new(AnalysisConfig {
            max_gap_hours: 3.0,
            max_range_of_lessons_per_day: max_range,
            ..AnalysisConfig::default()
        })
    }

    #[test]
    fn test_balance_range_ignores_zero_days() {
        assert_eq!(balance_range(&[3, 3, 3, 3, 1, 0]), Some(2));
        assert_eq!(balance_range(&[2, 2, 2, 2, 2, 0]), Some(0));
        assert_eq!(balance_range(&[0, 0, 0, 0, 0, 0]), None);
    }

    #[test]
    fn test_week_balance_counts_simultaneous_lessons_once() {
        // 2024-09-02 is a Monday
        let a = stored(1, 2, 9, 0, "A");
        let b = stored(2, 2, 9, 0, "B");
        let c = stored(3, 3, 9, 0, "C");
        let counts = week_balance(&[&a, &b, &c]);
        assert_eq!(counts, [1, 1, 0, 0, 0, 0]);
    }

    #[test]
    fn test_week_balance_skips_sunday() {
        let sunday = stored(1, 1, 9, 0, "A");
        assert_eq!(week_balance(&[&sunday]), [0; 6]);
    }

    #[test]
    fn test_sunday_only_week_is_never_flagged() {
        let lessons = vec![stored(1, 1, 9, 0, "A"), stored(2, 1, 11, 0, "A")];
        assert!(analyzer(0).unbalanced_weeks(&lessons).unwrap().is_empty());
    }

    #[test]
    fn test_pair_bottleneck_requires_identity() {
        let a = Lesson::new(
            "А-301 (ИВЦ)",
            "Math",
            Utc.with_ymd_and_hms(2024, 9, 2, 10, 0, 0).unwrap(),
        );
        let b = stored(2, 2, 11, 30, "Б-105 (Юж)");

        let err = analyzer(2).analyze(&[a, b]).unwrap_err();
        assert!(matches!(err, AnalysisError::MissingTarget(_)));
    }

    #[test]
    fn test_pair_bottleneck_rejects_missing_id() {
        let mut a = stored(1, 2, 10, 0, "А-301 (ИВЦ)");
        a.id = None;
        let b = stored(2, 2, 11, 30, "Б-105 (Юж)");

        let err = analyzer(2).distant_classrooms(&[a, b]).unwrap_err();
        assert!(matches!(err, AnalysisError::MissingLessonId(_)));
    }

    #[test]
    fn test_pair_bottleneck_rejects_mixed_targets() {
        let a = stored(1, 2, 10, 0, "А-301 (ИВЦ)");
        let b = Lesson::new(
            "Б-105 (Юж)",
            "Math",
            Utc.with_ymd_and_hms(2024, 9, 2, 11, 30, 0).unwrap(),
        )
        .with_identity(LessonId::new(2), TargetId::new(9));

        let err = analyzer(2).distant_classrooms(&[a, b]).unwrap_err();
        assert_eq!(
            err,
            AnalysisError::TargetMismatch(TargetId::new(1), TargetId::new(9))
        );
    }

    /// Monday 2024-09-02 with three time groups, Tuesday with one.
    fn uneven_week() -> Vec<Lesson> {
        vec![
            stored(1, 2, 9, 0, "А-1"),
            stored(2, 2, 11, 0, "А-1"),
            stored(3, 2, 13, 0, "А-1"),
            stored(4, 3, 9, 0, "А-1"),
        ]
    }

    #[test]
    fn test_flagged_week_rejects_mixed_targets() {
        let mut lessons = uneven_week();
        lessons[3].target_id = Some(TargetId::new(2));

        let err = analyzer(1).unbalanced_weeks(&lessons).unwrap_err();
        assert_eq!(
            err,
            AnalysisError::TargetMismatch(TargetId::new(1), TargetId::new(2))
        );
    }

    #[test]
    fn test_flagged_week_rejects_missing_target() {
        let mut lessons = uneven_week();
        lessons[3].target_id = None;

        let err = analyzer(1).unbalanced_weeks(&lessons).unwrap_err();
        assert!(matches!(err, AnalysisError::MissingTarget(_)));
    }

    #[test]
    fn test_unflagged_week_ignores_targets() {
        let mut lessons = uneven_week();
        lessons[3].target_id = Some(TargetId::new(2));
        lessons[0].target_id = None;

        assert_eq!(analyzer(2).unbalanced_weeks(&lessons), Ok(vec![]));
    }

    #[test]
    fn test_unflagged_pairs_do_not_need_identity() {
        // same building, long break: no bottleneck is built, so no identity is checked
        let a = Lesson::new("А-1", "Math", Utc.with_ymd_and_hms(2024, 9, 2, 9, 0, 0).unwrap());
        let b = Lesson::new("А-2", "Math", Utc.with_ymd_and_hms(2024, 9, 2, 10, 40, 0).unwrap());
        assert!(analyzer(5).analyze(&[a, b]).unwrap().is_empty());
    }
}
