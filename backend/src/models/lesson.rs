//! Timetabled lessons.

use chrono::{DateTime, Duration, Utc};
use serde::{Deserialize, Serialize};

use super::target::TargetId;

crate::define_id_type!(i64, LessonId);

/// Fixed duration of every lesson, in minutes.
pub const LESSON_DURATION_MINUTES: i64 = 90;

/// Fixed duration of every lesson.
pub fn lesson_duration() -> Duration {
    Duration::minutes(LESSON_DURATION_MINUTES)
}

/// One timetabled class occurrence.
///
/// `id` and `target_id` are assigned by the persistence layer; a lesson that
/// was just parsed from a calendar carries neither.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Lesson {
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub id: Option<LessonId>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub target_id: Option<TargetId>,
    pub location: String,
    pub summary: String,
    #[serde(rename = "start_date")]
    pub start_time: DateTime<Utc>,
}

impl Lesson {
    pub fn new(
        location: impl Into<String>,
        summary: impl Into<String>,
        start_time: DateTime<Utc>,
    ) -> Self {
        Self {
            id: None,
            target_id: None,
            location: location.into(),
            summary: summary.into(),
            start_time,
        }
    }

    /// Attach persistence identity.
    pub fn with_identity(mut self, id: LessonId, target_id: TargetId) -> Self {
        self.id = Some(id);
        self.target_id = Some(target_id);
        self
    }

    /// Instant the lesson ends.
    pub fn end_time(&self) -> DateTime<Utc> {
        self.start_time + lesson_duration()
    }

    /// Copy of the lesson detached from its target and storage identity.
    pub fn stripped(&self) -> Self {
        Self {
            id: None,
            target_id: None,
            location: self.location.clone(),
            summary: self.summary.clone(),
            start_time: self.start_time,
        }
    }
}
