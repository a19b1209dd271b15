use serde::{Deserialize, Serialize};

/// Calendar event as returned by the events endpoint
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize, Default)]
#[serde(rename_all = "camelCase")]
pub struct CalendarEvent {
    #[serde(default)]
    pub id: String,
    pub summary: Option<String>,
    #[serde(default)]
    pub start: EventTime,
    #[serde(default)]
    pub end: EventTime,
    #[serde(default)]
    pub attendees: Vec<Attendee>,
    pub html_link: Option<String>,
}

impl CalendarEvent {
    /// The literal start timestamp, empty for all-day events
    pub fn start_date_time(&self) -> &str {
        self.start.date_time.as_deref().unwrap_or("")
    }
}

/// Start or end of an event; either `date_time` or `date` is set
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize, Default)]
#[serde(rename_all = "camelCase")]
pub struct EventTime {
    #[serde(skip_serializing_if = "Option::is_none")]
    pub date_time: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub date: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub time_zone: Option<String>,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize, Default)]
pub struct Attendee {
    pub email: String,
}

/// Body of an event insertion request
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct NewEvent {
    pub summary: String,
    pub start: EventTime,
    pub end: EventTime,
    pub attendees: Vec<Attendee>,
}

/// Page of results from the events list endpoint
#[derive(Debug, Deserialize, Default)]
pub(crate) struct EventList {
    #[serde(default)]
    pub items: Vec<CalendarEvent>,
}
