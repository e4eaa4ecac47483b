//! Expansion of `RRULE` recurrences.
//!
//! Only the `DAILY` and `WEEKLY` frequencies are expanded, which covers
//! university timetables. Rules with another frequency produce the first
//! occurrence only.

use chrono::{DateTime, Duration, Utc};

use super::{CalendarError, CalendarResult};

/// Upper bound on occurrences generated for one event.
pub const MAX_OCCURRENCES: usize = 1000;

#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Frequency {
    Daily,
    Weekly,
    Unsupported(String),
}

/// The parts of an `RRULE` value that drive expansion.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct RecurrenceRule {
    pub frequency: Frequency,
    pub interval: u32,
    pub count: Option<u32>,
    pub until: Option<DateTime<Utc>>,
}

impl RecurrenceRule {
    /// Parse an `RRULE` value. `resolve_until` turns the raw `UNTIL` value into an instant.
    pub fn parse(
        value: &str,
        resolve_until: impl Fn(&str) -> CalendarResult<DateTime<Utc>>,
    ) -> CalendarResult<Self> {
        let invalid = |reason: &str| CalendarError::InvalidRule {
            rule: value.to_string(),
            reason: reason.to_string(),
        };

        let mut frequency = None;
        let mut interval = 1;
        let mut count = None;
        let mut until = None;

        for part in value.split(';').filter(|part| !part.is_empty()) {
            let (key, part_value) = part.split_once('=').ok_or_else(|| invalid("missing '='"))?;
            match key.trim().to_ascii_uppercase().as_str() {
                "FREQ" => {
                    frequency = Some(match part_value.to_ascii_uppercase().as_str() {
                        "DAILY" => Frequency::Daily,
                        "WEEKLY" => Frequency::Weekly,
                        other => Frequency::Unsupported(other.to_string()),
                    })
                }
                "INTERVAL" => {
                    interval = part_value
                        .parse::<u32>()
                        .ok()
                        .filter(|interval| *interval > 0)
                        .ok_or_else(|| invalid("INTERVAL must be a positive integer"))?
                }
                "COUNT" => {
                    count = Some(
                        part_value
                            .parse::<u32>()
                            .map_err(|_| invalid("COUNT must be a non-negative integer"))?,
                    )
                }
                "UNTIL" => until = Some(resolve_until(part_value)?),
                other => log::debug!("Ignoring RRULE part {} in {}", other, value),
            }
        }

        Ok(Self {
            frequency: frequency.ok_or_else(|| invalid("FREQ is required"))?,
            interval,
            count,
            until,
        })
    }

    fn step(&self) -> Option<Duration> {
        match self.frequency {
            Frequency::Daily => Some(Duration::days(i64::from(self.interval))),
            Frequency::Weekly => Some(Duration::weeks(i64::from(self.interval))),
            Frequency::Unsupported(_) => None,
        }
    }

    /// Occurrences starting at `start`, in chronological order.
    ///
    /// `start` is always the first occurrence. `COUNT` and `UNTIL` (inclusive)
    /// both bound the expansion; unbounded rules stop at [`MAX_OCCURRENCES`].
    pub fn expand(&self, start: DateTime<Utc>) -> Vec<DateTime<Utc>> {
        let Some(step) = self.step() else {
            log::warn!(
                "Unsupported RRULE frequency {:?}, keeping the first occurrence only",
                self.frequency
            );
            return vec![start];
        };

        let limit = self
            .count
            .map_or(MAX_OCCURRENCES, |count| (count as usize).min(MAX_OCCURRENCES));

        let mut occurrences = Vec::new();
        let mut current = start;
        while occurrences.len() < limit {
            if self.until.is_some_and(|until| current > until) {
                return occurrences;
            }
            occurrences.push(current);
            current = match current.checked_add_signed(step) {
                Some(next) => next,
                None => {
                    log::warn!(
                        "Recurrence starting {} overflows the date range after {} occurrences",
                        start,
                        occurrences.len()
                    );
                    return occurrences;
                }
            };
        }

        if !matches!(self.count, Some(count) if count as usize <= MAX_OCCURRENCES) {
            log::warn!(
                "Recurrence starting {} truncated at {} occurrences",
                start,
                MAX_OCCURRENCES
            );
        }
        occurrences
    }
}
