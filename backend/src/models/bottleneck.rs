//! Bottleneck records and their presentation ("hydrated") forms.
//!
//! Stored bottlenecks reference lessons by id. Hydrated bottlenecks embed
//! stripped copies of the lessons and are what clients receive.

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

use super::lesson::{Lesson, LessonId};
use super::target::TargetId;

crate::define_id_type!(i64, BottleneckId);

/// Number of weekday slots counted by the week balance (Monday..Saturday).
pub const BALANCED_WEEKDAYS: usize = 6;

/// Two consecutive lessons in rooms too far apart for the break between them.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct DistantClassroom {
    pub id: Option<BottleneckId>,
    pub target_id: TargetId,
    pub lesson_a: LessonId,
    pub lesson_b: LessonId,
    pub start_time: DateTime<Utc>,
}

/// Two consecutive lessons on the same day separated by an excessive gap.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct LargeGap {
    pub id: Option<BottleneckId>,
    pub target_id: TargetId,
    pub lesson_a: LessonId,
    pub lesson_b: LessonId,
    pub start_time: DateTime<Utc>,
}

/// A week whose per-weekday lesson counts are too uneven.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct UnbalancedWeek {
    pub id: Option<BottleneckId>,
    pub target_id: TargetId,
    /// Sunday 00:00 UTC opening the week.
    pub week_start: DateTime<Utc>,
    /// Distinct time slots per day, Monday first.
    pub daily_counts: [u32; BALANCED_WEEKDAYS],
}

/// All bottlenecks found for one target.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct Bottlenecks {
    pub distant_classrooms: Vec<DistantClassroom>,
    pub large_gaps: Vec<LargeGap>,
    pub unbalanced_weeks: Vec<UnbalancedWeek>,
}

impl Bottlenecks {
    pub fn is_empty(&self) -> bool {
        self.distant_classrooms.is_empty()
            && self.large_gaps.is_empty()
            && self.unbalanced_weeks.is_empty()
    }

    pub fn len(&self) -> usize {
        self.distant_classrooms.len() + self.large_gaps.len() + self.unbalanced_weeks.len()
    }
}

/// Pair bottleneck with its lessons embedded.
///
/// Shared by distant-classroom and large-gap findings.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct LessonPairHydrated {
    pub lesson_a: Lesson,
    pub lesson_b: Lesson,
    #[serde(rename = "start_date")]
    pub start_time: DateTime<Utc>,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct UnbalancedWeekHydrated {
    #[serde(rename = "start_date")]
    pub week_start: DateTime<Utc>,
    #[serde(rename = "lessons")]
    pub daily_counts: [u32; BALANCED_WEEKDAYS],
}

/// Client-facing bottleneck bundle.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct BottlenecksHydrated {
    pub distant_classrooms: Vec<LessonPairHydrated>,
    pub large_gaps: Vec<LessonPairHydrated>,
    pub unbalanced_weeks: Vec<UnbalancedWeekHydrated>,
}

impl From<&UnbalancedWeek> for UnbalancedWeekHydrated {
    fn from(week: &UnbalancedWeek) -> Self {
        Self {
            week_start: week.week_start,
            daily_counts: week.daily_counts,
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use chrono::TimeZone;

    #[test]
    fn test_hydrated_bundle_wire_names() {
        let week = UnbalancedWeek {
            id: None,
            target_id: TargetId::new(1),
            week_start: Utc.with_ymd_and_hms(2024, 9, 1, 0, 0, 0).unwrap(),
            daily_counts: [3, 3, 3, 3, 1, 0],
        };
        let bundle = BottlenecksHydrated {
            unbalanced_weeks: vec![(&week).into()],
            ..Default::default()
        };

        let json = serde_json::to_value(&bundle).unwrap();
        assert!(json.get("distantClassrooms").is_some());
        assert!(json.get("largeGaps").is_some());
        assert_eq!(
            json["unbalancedWeeks"][0]["lessons"],
            serde_json::json!([3, 3, 3, 3, 1, 0])
        );
    }

    #[test]
    fn test_len_counts_all_lists() {
        let mut bottlenecks = Bottlenecks::default();
        assert!(bottlenecks.is_empty());

        bottlenecks.unbalanced_weeks.push(UnbalancedWeek {
            id: None,
            target_id: TargetId::new(1),
            week_start: Utc.with_ymd_and_hms(2024, 9, 1, 0, 0, 0).unwrap(),
            daily_counts: [1, 0, 0, 0, 0, 0],
        });
        assert_eq!(bottlenecks.len(), 1);
        assert!(!bottlenecks.is_empty());
    }
}
