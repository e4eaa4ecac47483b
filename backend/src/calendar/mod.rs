//! Extraction of lessons from iCalendar (RFC 5545) documents.
//!
//! The remote schedule API serves one calendar per target. Every `VEVENT`
//! with a `LOCATION` is a lesson; recurring events are expanded into one
//! lesson per occurrence.
//!
//! Only the subset of the format used by timetables is understood: zones are
//! reduced to the fixed offset of their standard time, and recurrences to
//! `DAILY` and `WEEKLY` rules (see [`recurrence`]).

pub mod content;
pub mod datetime;
pub mod recurrence;

use chrono::{DateTime, Utc};
use std::collections::BTreeSet;

use crate::models::Lesson;
use content::{unfold, ContentLine};
use datetime::{parse_instant, parse_offset, Zones};
use recurrence::RecurrenceRule;

pub use recurrence::MAX_OCCURRENCES;

/// Result type for calendar parsing
pub type CalendarResult<T> = Result<T, CalendarError>;

#[derive(Debug, Clone, PartialEq, Eq, thiserror::Error)]
pub enum CalendarError {
    #[error("Document contains no VCALENDAR component")]
    MissingCalendar,

    #[error("Component {0} is never closed")]
    UnterminatedComponent(String),

    #[error("END:{found} does not close the open component {open:?}")]
    UnexpectedEnd { found: String, open: Option<String> },

    #[error("Event '{0}' has no DTSTART")]
    MissingStart(String),

    #[error("Invalid date-time value '{0}'")]
    InvalidDateTime(String),

    #[error("Invalid UTC offset '{0}'")]
    InvalidOffset(String),

    #[error("Invalid RRULE '{rule}': {reason}")]
    InvalidRule { rule: String, reason: String },
}

#[derive(Debug, Default)]
struct RawEvent {
    location: Option<String>,
    summary: Option<String>,
    start: Option<ContentLine>,
    rule: Option<String>,
    exdates: Vec<ContentLine>,
    rdates: Vec<ContentLine>,
}

#[derive(Debug, Default)]
struct RawZone {
    tzid: Option<String>,
    standard_offset: Option<String>,
    any_offset: Option<String>,
}

/// Events and zones of a document, before date resolution.
#[derive(Debug, Default)]
struct Calendar {
    events: Vec<RawEvent>,
    zones: Vec<RawZone>,
}

impl Calendar {
    fn parse(text: &str) -> CalendarResult<Self> {
        let mut calendar = Calendar::default();
        let mut open: Vec<String> = Vec::new();
        let mut seen_calendar = false;

        for line in unfold(text) {
            if line.trim().is_empty() {
                continue;
            }
            let Some(property) = ContentLine::parse(&line) else {
                log::debug!("Skipping malformed calendar line: {}", line);
                continue;
            };

            match property.name.as_str() {
                "BEGIN" => {
                    let component = property.value.trim().to_ascii_uppercase();
                    match component.as_str() {
                        "VCALENDAR" => seen_calendar = true,
                        "VEVENT" => calendar.events.push(RawEvent::default()),
                        "VTIMEZONE" => calendar.zones.push(RawZone::default()),
                        _ => {}
                    }
                    open.push(component);
                }
                "END" => {
                    let component = property.value.trim().to_ascii_uppercase();
                    if open.last() != Some(&component) {
                        return Err(CalendarError::UnexpectedEnd {
                            found: component,
                            open: open.pop(),
                        });
                    }
                    open.pop();
                }
                _ => calendar.apply(open.last().map(String::as_str), property),
            }
        }

        if let Some(component) = open.pop() {
            return Err(CalendarError::UnterminatedComponent(component));
        }
        if !seen_calendar {
            return Err(CalendarError::MissingCalendar);
        }
        Ok(calendar)
    }

    /// Attach a property to the innermost open component.
    fn apply(&mut self, component: Option<&str>, property: ContentLine) {
        match component {
            Some("VEVENT") => {
                let Some(event) = self.events.last_mut() else {
                    return;
                };
                match property.name.as_str() {
                    "LOCATION" => event.location = Some(property.text()),
                    "SUMMARY" => event.summary = Some(property.text()),
                    "DTSTART" => event.start = Some(property),
                    "RRULE" => event.rule = Some(property.value),
                    "EXDATE" => event.exdates.push(property),
                    "RDATE" => event.rdates.push(property),
                    _ => {}
                }
            }
            Some("VTIMEZONE") if property.name == "TZID" => {
                if let Some(zone) = self.zones.last_mut() {
                    zone.tzid = Some(property.value.trim().to_string());
                }
            }
            Some(sub @ ("STANDARD" | "DAYLIGHT")) if property.name == "TZOFFSETTO" => {
                if let Some(zone) = self.zones.last_mut() {
                    if sub == "STANDARD" {
                        zone.standard_offset = Some(property.value.clone());
                    }
                    zone.any_offset.get_or_insert(property.value);
                }
            }
            _ => {}
        }
    }

    fn zones(&self) -> CalendarResult<Zones> {
        let mut zones = Zones::new();
        for zone in &self.zones {
            let (Some(tzid), Some(offset)) = (
                zone.tzid.as_ref(),
                zone.standard_offset.as_ref().or(zone.any_offset.as_ref()),
            ) else {
                continue;
            };
            zones.insert(tzid.clone(), parse_offset(offset)?);
        }
        Ok(zones)
    }
}

/// Instants listed by a DTSTART/EXDATE/RDATE property (comma separated).
fn instants(property: &ContentLine, zones: &Zones) -> CalendarResult<Vec<DateTime<Utc>>> {
    property
        .value
        .split(',')
        .filter(|value| !value.trim().is_empty())
        .map(|value| parse_instant(value, property.param("TZID"), zones))
        .collect()
}

impl RawEvent {
    fn occurrences(&self, zones: &Zones) -> CalendarResult<Vec<DateTime<Utc>>> {
        let start_property = self.start.as_ref().ok_or_else(|| {
            CalendarError::MissingStart(self.summary.clone().unwrap_or_default())
        })?;
        let tzid = start_property.param("TZID");
        let start = parse_instant(&start_property.value, tzid, zones)?;

        let mut occurrences: BTreeSet<DateTime<Utc>> = match &self.rule {
            Some(rule) => RecurrenceRule::parse(rule, |until| parse_instant(until, tzid, zones))?
                .expand(start)
                .into_iter()
                .collect(),
            None => BTreeSet::from([start]),
        };

        for rdate in &self.rdates {
            occurrences.extend(instants(rdate, zones)?);
        }
        for exdate in &self.exdates {
            for excluded in instants(exdate, zones)? {
                occurrences.remove(&excluded);
            }
        }

        Ok(occurrences.into_iter().collect())
    }
}

/// Parse a calendar document into lessons sorted by start time.
///
/// Events without a `LOCATION` are skipped. The lessons carry no id or target.
pub fn parse_lessons(text: &str) -> CalendarResult<Vec<Lesson>> {
    let calendar = Calendar::parse(text)?;
    let zones = calendar.zones()?;

    let mut lessons = Vec::new();
    for event in &calendar.events {
        let Some(location) = &event.location else {
            continue;
        };
        let summary = event.summary.clone().unwrap_or_default();

        for start in event.occurrences(&zones)? {
            lessons.push(Lesson::new(location.clone(), summary.clone(), start));
        }
    }

    lessons.sort_by_key(|lesson| lesson.start_time);
    log::debug!(
        "Parsed {} lessons from {} events",
        lessons.len(),
        calendar.events.len()
    );
    Ok(lessons)
}
