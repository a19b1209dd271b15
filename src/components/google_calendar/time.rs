use super::models::{CalendarEvent, EventTime};
use chrono::{DateTime, NaiveDate, NaiveDateTime, Utc};

/// Parse an event boundary as a UTC instant.
///
/// Timed boundaries are RFC 3339; all-day boundaries are taken as UTC midnight.
/// A `dateTime` without offset is read as UTC.
pub fn parse_event_time(time: &EventTime) -> Option<DateTime<Utc>> {
    if let Some(date_time) = &time.date_time {
        if let Ok(dt) = DateTime::parse_from_rfc3339(date_time) {
            return Some(dt.with_timezone(&Utc));
        }
        return NaiveDateTime::parse_from_str(date_time, "%Y-%m-%dT%H:%M:%S")
            .ok()
            .map(|naive| naive.and_utc());
    }

    let date = NaiveDate::parse_from_str(time.date.as_deref()?, "%Y-%m-%d").ok()?;
    Some(date.and_hms_opt(0, 0, 0)?.and_utc())
}

/// Start and end of an event, if both can be parsed
pub fn event_interval(event: &CalendarEvent) -> Option<(DateTime<Utc>, DateTime<Utc>)> {
    let start = parse_event_time(&event.start)?;
    let end = parse_event_time(&event.end)?;
    Some((start, end))
}

#[cfg(test)]
mod tests {
    use super::*;
    use chrono::TimeZone;

    fn timed(s: &str) -> EventTime {
        EventTime {
            date_time: Some(s.to_string()),
            ..Default::default()
        }
    }

    #[test]
    fn test_parse_offsets() {
        assert_eq!(
            parse_event_time(&timed("2024-01-01T12:00:00+02:00")),
            Some(Utc.with_ymd_and_hms(2024, 1, 1, 10, 0, 0).unwrap())
        );
        assert_eq!(
            parse_event_time(&timed("2024-01-01T10:00:00Z")),
            Some(Utc.with_ymd_and_hms(2024, 1, 1, 10, 0, 0).unwrap())
        );
        assert_eq!(
            parse_event_time(&timed("2024-01-01T10:00:00")),
            Some(Utc.with_ymd_and_hms(2024, 1, 1, 10, 0, 0).unwrap())
        );
    }

    #[test]
    fn test_parse_all_day() {
        let time = EventTime {
            date: Some("2024-03-05".to_string()),
            ..Default::default()
        };
        assert_eq!(
            parse_event_time(&time),
            Some(Utc.with_ymd_and_hms(2024, 3, 5, 0, 0, 0).unwrap())
        );
    }

    #[test]
    fn test_unparseable() {
        assert_eq!(parse_event_time(&timed("tomorrow")), None);
        assert_eq!(parse_event_time(&EventTime::default()), None);
    }
}
