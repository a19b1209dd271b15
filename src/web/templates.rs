use super::session::Flash;
use crate::components::google_calendar::CalendarEvent;
use crate::components::meeting::booking::{MAX_DURATION_HOURS, MIN_DURATION_HOURS};
use askama::Template;
use rust_i18n::t;

/// One upcoming event as listed on the page
#[derive(Debug, Clone)]
pub struct EventRow {
    pub summary: String,
    pub start: String,
}

impl From<&CalendarEvent> for EventRow {
    fn from(event: &CalendarEvent) -> Self {
        let start = event
            .start
            .date_time
            .clone()
            .or_else(|| event.start.date.clone())
            .unwrap_or_default();

        Self {
            summary: event
                .summary
                .clone()
                .unwrap_or_else(|| t!("page.untitled").to_string()),
            start,
        }
    }
}

/// Static page text in the active locale
#[derive(Debug, Clone)]
pub struct PageText {
    pub lang: String,
    pub title: String,
    pub greeting: String,
    pub connect_prompt: String,
    pub connect_button: String,
    pub upcoming_events: String,
    pub no_events: String,
    pub suggested_slots: String,
    pub create_meeting: String,
    pub title_label: String,
    pub title_placeholder: String,
    pub attendees_label: String,
    pub attendees_placeholder: String,
    pub date_label: String,
    pub time_label: String,
    pub duration_label: String,
    pub schedule_button: String,
    pub disconnect_button: String,
    pub view_event: String,
}

impl PageText {
    pub fn current() -> Self {
        Self {
            lang: rust_i18n::locale().to_string(),
            title: t!("page.title").to_string(),
            greeting: t!("page.greeting").to_string(),
            connect_prompt: t!("page.connect_prompt").to_string(),
            connect_button: t!("page.connect_button").to_string(),
            upcoming_events: t!("page.upcoming_events").to_string(),
            no_events: t!("page.no_events").to_string(),
            suggested_slots: t!("page.suggested_slots").to_string(),
            create_meeting: t!("page.create_meeting").to_string(),
            title_label: t!("page.title_label").to_string(),
            title_placeholder: t!("page.title_placeholder").to_string(),
            attendees_label: t!("page.attendees_label").to_string(),
            attendees_placeholder: t!("page.attendees_placeholder").to_string(),
            date_label: t!("page.date_label").to_string(),
            time_label: t!("page.time_label").to_string(),
            duration_label: t!("page.duration_label").to_string(),
            schedule_button: t!("page.schedule_button").to_string(),
            disconnect_button: t!("page.disconnect_button").to_string(),
            view_event: t!("page.view_event").to_string(),
        }
    }
}

/// The single page of the application
#[derive(Template)]
#[template(path = "index.html")]
pub struct IndexTemplate {
    pub text: PageText,
    pub authorized: bool,
    pub flash: Option<Flash>,
    /// Result of the last form submission
    pub outcome: Option<Flash>,
    pub events: Vec<EventRow>,
    /// Slot labels, or the single "no slots" sentinel
    pub slot_options: Vec<String>,
    pub today: String,
    /// Zone the slots and the booked times are expressed in
    pub time_zone: String,
    pub min_duration: u32,
    pub max_duration: u32,
}

impl IndexTemplate {
    pub fn disconnected(flash: Option<Flash>) -> Self {
        Self {
            text: PageText::current(),
            authorized: false,
            flash,
            outcome: None,
            events: Vec::new(),
            slot_options: Vec::new(),
            today: String::new(),
            time_zone: String::new(),
            min_duration: MIN_DURATION_HOURS,
            max_duration: MAX_DURATION_HOURS,
        }
    }

    pub fn connected(
        flash: Option<Flash>,
        outcome: Option<Flash>,
        events: Vec<EventRow>,
        slot_options: Vec<String>,
        today: String,
        time_zone: String,
    ) -> Self {
        Self {
            text: PageText::current(),
            authorized: true,
            flash,
            outcome,
            events,
            slot_options,
            today,
            time_zone,
            min_duration: MIN_DURATION_HOURS,
            max_duration: MAX_DURATION_HOURS,
        }
    }
}
