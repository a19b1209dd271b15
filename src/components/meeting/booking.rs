use super::slots::SLOT_LABEL_FORMAT;
use crate::components::google_calendar::models::{Attendee, CalendarEvent, EventTime, NewEvent};
use crate::error::{request_error, SchedulerResult};
use chrono::{Duration, NaiveDate, NaiveDateTime, NaiveTime};

/// Shortest meeting that can be booked, in hours
pub const MIN_DURATION_HOURS: u32 = 1;
/// Longest meeting that can be booked, in hours
pub const MAX_DURATION_HOURS: u32 = 4;

const EVENT_URL: &str = "https://calendar.google.com/calendar/r/event";

/// Comma separated addresses, trimmed. Addresses are not validated.
pub fn parse_attendees(raw: &str) -> Vec<String> {
    raw.split(',')
        .map(str::trim)
        .filter(|email| !email.is_empty())
        .map(str::to_string)
        .collect()
}

/// What the time field of the form carried
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum TimeSelection {
    /// Bare `HH:MM`, combined with the picked date
    TimeOfDay(NaiveTime),
    /// A suggested slot label; it carries its own date
    Slot(NaiveDateTime),
}

impl TimeSelection {
    /// Meeting start for the picked date
    pub fn start_on(self, date: NaiveDate) -> NaiveDateTime {
        match self {
            TimeSelection::TimeOfDay(time) => date.and_time(time),
            TimeSelection::Slot(start) => start,
        }
    }
}

/// Accept `HH:MM` or a slot label `YYYY-MM-DD HH:MM`
pub fn parse_time_selection(raw: &str) -> SchedulerResult<TimeSelection> {
    let raw = raw.trim();
    if let Ok(time) = NaiveTime::parse_from_str(raw, "%H:%M") {
        return Ok(TimeSelection::TimeOfDay(time));
    }
    NaiveDateTime::parse_from_str(raw, SLOT_LABEL_FORMAT)
        .map(TimeSelection::Slot)
        .map_err(|_| request_error(&format!("'{}' is not a valid time slot", raw)))
}

/// A meeting the user asked to schedule
#[derive(Debug, Clone, PartialEq)]
pub struct MeetingRequest {
    pub title: String,
    pub date: NaiveDate,
    pub time: NaiveTime,
    pub duration_hours: u32,
    pub attendees: Vec<String>,
}

impl MeetingRequest {
    pub fn new(
        title: impl Into<String>,
        date: NaiveDate,
        time: NaiveTime,
        duration_hours: u32,
        attendees: Vec<String>,
    ) -> SchedulerResult<Self> {
        if !(MIN_DURATION_HOURS..=MAX_DURATION_HOURS).contains(&duration_hours) {
            return Err(request_error(&format!(
                "Duration must be between {} and {} hours",
                MIN_DURATION_HOURS, MAX_DURATION_HOURS
            )));
        }

        Ok(Self {
            title: title.into(),
            date,
            time,
            duration_hours,
            attendees,
        })
    }

    pub fn start(&self) -> NaiveDateTime {
        self.date.and_time(self.time)
    }

    pub fn end(&self) -> NaiveDateTime {
        self.start() + Duration::hours(i64::from(self.duration_hours))
    }

    /// Insertion payload; both boundaries are wall-clock times in `time_zone`
    pub fn to_event(&self, time_zone: &str) -> NewEvent {
        let boundary = |dt: NaiveDateTime| EventTime {
            date_time: Some(dt.format("%Y-%m-%dT%H:%M:%S").to_string()),
            date: None,
            time_zone: Some(time_zone.to_string()),
        };

        NewEvent {
            summary: self.title.clone(),
            start: boundary(self.start()),
            end: boundary(self.end()),
            attendees: self
                .attendees
                .iter()
                .map(|email| Attendee { email: email.clone() })
                .collect(),
        }
    }
}

/// Link to the created event in the calendar web UI
pub fn event_link(event: &CalendarEvent) -> String {
    match &event.html_link {
        Some(link) if !link.is_empty() => link.clone(),
        _ => format!("{}?eid={}", EVENT_URL, urlencoding::encode(&event.id)),
    }
}
