//! DATE, DATE-TIME and UTC-OFFSET values.

use chrono::{DateTime, FixedOffset, NaiveDate, NaiveDateTime, NaiveTime, TimeZone, Utc};
use std::collections::HashMap;

use super::{CalendarError, CalendarResult};

/// UTC offsets of the `VTIMEZONE` components of a calendar, by `TZID`.
pub type Zones = HashMap<String, FixedOffset>;

/// Parse a `TZOFFSETTO`-style offset: `+HHMM` or `+HHMMSS`.
pub fn parse_offset(value: &str) -> CalendarResult<FixedOffset> {
    let invalid = || CalendarError::InvalidOffset(value.to_string());
    let value = value.trim();

    let (sign, digits) = if let Some(rest) = value.strip_prefix('+') {
        (1, rest)
    } else if let Some(rest) = value.strip_prefix('-') {
        (-1, rest)
    } else {
        return Err(invalid());
    };
    if !matches!(digits.len(), 4 | 6) || !digits.bytes().all(|b| b.is_ascii_digit()) {
        return Err(invalid());
    }

    let field = |range: std::ops::Range<usize>| digits[range].parse::<i32>().map_err(|_| invalid());
    let hours = field(0..2)?;
    let minutes = field(2..4)?;
    let seconds = if digits.len() == 6 { field(4..6)? } else { 0 };

    FixedOffset::east_opt(sign * (hours * 3600 + minutes * 60 + seconds)).ok_or_else(invalid)
}

/// Resolve a DATE or DATE-TIME value to an instant.
///
/// `Z`-suffixed values are UTC. Other values are local to `tzid` when it names
/// a known zone and are otherwise treated as UTC. DATE values start at midnight.
pub fn parse_instant(
    value: &str,
    tzid: Option<&str>,
    zones: &Zones,
) -> CalendarResult<DateTime<Utc>> {
    let value = value.trim();
    let invalid = || CalendarError::InvalidDateTime(value.to_string());

    if let Some(utc) = value.strip_suffix('Z') {
        let naive = NaiveDateTime::parse_from_str(utc, "%Y%m%dT%H%M%S").map_err(|_| invalid())?;
        return Ok(naive.and_utc());
    }

    let naive = if value.len() == 8 {
        NaiveDate::parse_from_str(value, "%Y%m%d")
            .map_err(|_| invalid())?
            .and_time(NaiveTime::MIN)
    } else {
        NaiveDateTime::parse_from_str(value, "%Y%m%dT%H%M%S").map_err(|_| invalid())?
    };

    let Some(tzid) = tzid else {
        return Ok(naive.and_utc());
    };
    let Some(offset) = zones.get(tzid) else {
        log::warn!("Unknown TZID {}, treating {} as UTC", tzid, value);
        return Ok(naive.and_utc());
    };

    offset
        .from_local_datetime(&naive)
        .single()
        .map(|local| local.with_timezone(&Utc))
        .ok_or_else(invalid)
}

#[cfg(test)]
mod tests {
    use super::*;

    fn moscow() -> Zones {
        Zones::from([("Europe/Moscow".to_string(), parse_offset("+0300").unwrap())])
    }

    #[test]
    fn test_parse_offset() {
        assert_eq!(parse_offset("+0300").unwrap().local_minus_utc(), 3 * 3600);
        assert_eq!(parse_offset("-0530").unwrap().local_minus_utc(), -(5 * 3600 + 30 * 60));
        assert_eq!(parse_offset("+023015").unwrap().local_minus_utc(), 2 * 3600 + 30 * 60 + 15);
        assert!(parse_offset("0300").is_err());
        assert!(parse_offset("+3").is_err());
        assert!(parse_offset("").is_err());
    }

    #[test]
    fn test_utc_value() {
        let instant = parse_instant("20240902T060000Z", None, &Zones::new()).unwrap();
        assert_eq!(instant, Utc.with_ymd_and_hms(2024, 9, 2, 6, 0, 0).unwrap());
    }

    #[test]
    fn test_zoned_value() {
        let instant = parse_instant("20240902T090000", Some("Europe/Moscow"), &moscow()).unwrap();
        assert_eq!(instant, Utc.with_ymd_and_hms(2024, 9, 2, 6, 0, 0).unwrap());
    }

    #[test]
    fn test_floating_and_unknown_zone_are_utc() {
        let expected = Utc.with_ymd_and_hms(2024, 9, 2, 9, 0, 0).unwrap();
        assert_eq!(parse_instant("20240902T090000", None, &moscow()).unwrap(), expected);
        assert_eq!(
            parse_instant("20240902T090000", Some("Asia/Tokyo"), &moscow()).unwrap(),
            expected
        );
    }

    #[test]
    fn test_date_value_starts_at_midnight() {
        let instant = parse_instant("20240902", None, &Zones::new()).unwrap();
        assert_eq!(instant, Utc.with_ymd_and_hms(2024, 9, 2, 0, 0, 0).unwrap());
    }

    #[test]
    fn test_invalid_value() {
        assert!(matches!(
            parse_instant("2024-09-02", None, &Zones::new()),
            Err(CalendarError::InvalidDateTime(_))
        ));
    }
}
