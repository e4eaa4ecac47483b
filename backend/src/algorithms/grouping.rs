//! Chronological grouping of lessons.
//!
//! Lessons sharing a start instant form one *time group*. Consecutive time
//! groups are paired for the pairwise classifiers, and time groups are counted
//! per weekday for the week balance.

use chrono::{DateTime, Datelike, Duration, NaiveTime, Utc};

use crate::models::Lesson;

/// A non-empty set of lessons starting at the same instant.
pub type LessonGroup<'a> = Vec<&'a Lesson>;

/// Two lessons from adjacent time groups, earlier lesson first.
pub type LessonPair<'a> = (&'a Lesson, &'a Lesson);

/// References to `lessons` sorted by start time.
///
/// The sort is stable, so simultaneous lessons keep their input order.
fn sorted_by_start(lessons: &[Lesson]) -> Vec<&Lesson> {
    let mut sorted: Vec<&Lesson> = lessons.iter().collect();
    sorted.sort_by_key(|lesson| lesson.start_time);
    sorted
}

/// Collapse lessons into chronologically ordered groups of simultaneous lessons.
///
/// Every input lesson lands in exactly one group; no two adjacent groups share
/// a start time.
pub fn collapse_to_groups(lessons: &[Lesson]) -> Vec<LessonGroup<'_>> {
    group_sorted(sorted_by_start(lessons))
}

/// [`collapse_to_groups`] over borrowed lessons, e.g. one week of a schedule.
pub fn collapse_refs_to_groups<'a>(lessons: &[&'a Lesson]) -> Vec<LessonGroup<'a>> {
    let mut sorted = lessons.to_vec();
    sorted.sort_by_key(|lesson| lesson.start_time);
    group_sorted(sorted)
}

fn group_sorted(sorted: Vec<&Lesson>) -> Vec<LessonGroup<'_>> {
    let mut groups: Vec<LessonGroup<'_>> = Vec::new();

    for lesson in sorted {
        match groups.last_mut() {
            Some(group) if group[0].start_time == lesson.start_time => group.push(lesson),
            _ => groups.push(vec![lesson]),
        }
    }

    groups
}

/// Expand adjacent groups into lesson pairs.
///
/// For groups `i` and `i + 1` every combination of a lesson from the first and
/// a lesson from the second is emitted, so the result holds exactly
/// `Σ |g_i| · |g_(i+1)|` pairs in group order.
pub fn arrange_into_pairs<'a>(groups: &[LessonGroup<'a>]) -> Vec<LessonPair<'a>> {
    groups
        .windows(2)
        .flat_map(|window| {
            let (current, next) = (&window[0], &window[1]);
            current
                .iter()
                .flat_map(move |a| next.iter().map(move |b| (*a, *b)))
        })
        .collect()
}

/// Sunday 00:00 UTC opening the week that contains `instant`.
pub fn week_start(instant: DateTime<Utc>) -> DateTime<Utc> {
    let days_since_sunday = i64::from(instant.weekday().num_days_from_sunday());
    let sunday = instant.date_naive() - Duration::days(days_since_sunday);
    sunday.and_time(NaiveTime::MIN).and_utc()
}

/// Split lessons into calendar weeks (Sunday to Saturday, UTC).
///
/// Weeks are returned in chronological order and only weeks with lessons
/// appear.
pub fn arrange_into_weeks(lessons: &[Lesson]) -> Vec<Vec<&Lesson>> {
    let mut weeks: Vec<Vec<&Lesson>> = Vec::new();

    for lesson in sorted_by_start(lessons) {
        match weeks.last_mut() {
            Some(week) if week_start(week[0].start_time) == week_start(lesson.start_time) => {
                week.push(lesson)
            }
            _ => weeks.push(vec![lesson]),
        }
    }

    weeks
}
