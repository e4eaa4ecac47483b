//! Pairwise bottleneck predicates.
//!
//! Both predicates take two lessons from adjacent time groups, `a` starting
//! before `b`, and decide whether the pair is a bottleneck.

use chrono::{Datelike, Duration};

use crate::config::AnalysisConfig;
use crate::models::{lesson_duration, Lesson};

/// Location marker of lessons held online.
pub const ONLINE_MARKER: &str = "Дистанционно (СДО)";

/// Summary marker of physical education lessons.
pub const GYM_MARKER: &str = "Физическая культура и спорт";

/// Campus whose buildings are close enough to never count as distant.
pub const SHARED_CAMPUS: &str = "(С-20)";

/// Longest break between lessons on different campuses that is still too short.
const CAMPUS_TRAVEL_MINUTES: i64 = 90;

/// Longest break between lessons in different buildings that is still too short.
const BUILDING_TRAVEL_MINUTES: i64 = 10;

/// Idle time between the end of `a` and the start of `b`.
pub fn break_between(a: &Lesson, b: &Lesson) -> Duration {
    b.start_time - a.start_time - lesson_duration()
}

pub fn is_online(lesson: &Lesson) -> bool {
    lesson.location.contains(ONLINE_MARKER)
}

pub fn is_gym(lesson: &Lesson) -> bool {
    lesson.summary.contains(GYM_MARKER)
}

/// Leading run of characters that are neither whitespace nor `-`.
///
/// `"А-301 (В-78)"` yields `"А"`; an empty location yields `""`.
pub fn building_of(location: &str) -> &str {
    let start = location.trim_start_matches(|c: char| c.is_whitespace() || c == '-');
    let end = start
        .find(|c: char| c.is_whitespace() || c == '-')
        .unwrap_or(start.len());
    &start[..end]
}

/// Parenthesized campus suffix, including the parentheses.
///
/// The campus starts at the first `(` directly preceded by a space that is
/// followed by at least one character and a closing `)`; it runs to the last
/// `)` of the location. `"А-301 (В-78)"` yields `"(В-78)"`.
pub fn campus_of(location: &str) -> &str {
    for (open, _) in location.match_indices(" (") {
        let start = open + 1;
        // at least one character between the parentheses
        let body_start = start + 1;
        let Some(first_char) = location[body_start..].chars().next() else {
            continue;
        };
        if let Some(close) = location.rfind(')') {
            if close >= body_start + first_char.len_utf8() {
                return &location[start..=close];
            }
        }
    }
    ""
}

/// Whether the rooms of `a` and `b` are too far apart for the break between them.
///
/// Different campuses tolerate a longer break than different buildings on one
/// campus; the building-level check only runs with
/// `ignore_different_buildings` enabled.
pub fn is_distant_classroom(a: &Lesson, b: &Lesson, config: &AnalysisConfig) -> bool {
    if config.ignore_online_classes && (is_online(a) || is_online(b)) {
        return false;
    }
    if config.ignore_gym_classes && (is_gym(a) || is_gym(b)) {
        return false;
    }

    let (campus_a, campus_b) = (campus_of(&a.location), campus_of(&b.location));
    if campus_a == SHARED_CAMPUS && campus_b == SHARED_CAMPUS {
        return false;
    }

    let pause = break_between(a, b);

    if pause <= Duration::minutes(CAMPUS_TRAVEL_MINUTES) && campus_a != campus_b {
        return true;
    }

    if !config.ignore_different_buildings {
        return false;
    }

    pause <= Duration::minutes(BUILDING_TRAVEL_MINUTES)
        && building_of(&a.location) != building_of(&b.location)
}

/// Whether `a` and `b` are separated by at least `max_gap_hours` of idle time.
///
/// Lessons are considered the same day when their UTC day-of-month matches.
pub fn is_large_gap(a: &Lesson, b: &Lesson, config: &AnalysisConfig) -> bool {
    if config.ignore_online_classes && (is_online(a) || is_online(b)) {
        return false;
    }

    // FIXME: compares day-of-month only, so lessons a month apart on the same
    // date count as one day. Confirm "same calendar day" before changing.
    if a.start_time.day() != b.start_time.day() {
        return false;
    }

    break_between(a, b) >= max_gap(config)
}

/// `max_gap_hours` as a duration, clamped well inside the range chrono can
/// represent (`i64::MAX` milliseconds). NaN is treated as zero.
fn max_gap(config: &AnalysisConfig) -> Duration {
    let limit = i64::MAX as f64 / 2.0;
    let millis = (config.max_gap_hours * 3_600_000.0).round();
    Duration::milliseconds(millis.clamp(-limit, limit) as i64)
}
