use super::session::{session_id, Flash};
use super::templates::{EventRow, IndexTemplate};
use super::{AppState, WebError};
use crate::components::google_calendar::AccessToken;
use crate::components::meeting::{
    event_link, parse_attendees, parse_time_selection, suggest_slots, MeetingRequest, Slot,
};
use crate::error::{authorization_error, request_error, Error, ErrorKind, SchedulerResult};
use askama::Template;
use axum::{
    extract::{Form, State},
    response::{Html, IntoResponse, Redirect},
};
use axum_extra::extract::cookie::CookieJar;
use chrono::{NaiveDate, Utc};
use rust_i18n::t;
use serde::Deserialize;
use tracing::{error, info, warn};

/// Fields posted by the meeting form; everything arrives as text
#[derive(Debug, Clone, Deserialize)]
pub struct ScheduleForm {
    #[serde(default)]
    pub title: String,
    #[serde(default)]
    pub attendees: String,
    #[serde(default)]
    pub date: String,
    #[serde(default)]
    pub time: String,
    #[serde(default)]
    pub duration: String,
}

impl ScheduleForm {
    /// Coerce the text fields into a meeting request
    pub fn to_request(&self) -> SchedulerResult<MeetingRequest> {
        let date = NaiveDate::parse_from_str(self.date.trim(), "%Y-%m-%d")
            .map_err(|_| request_error(&format!("'{}' is not a valid date", self.date)))?;
        // A slot label wins over the picked date
        let start = parse_time_selection(&self.time)?.start_on(date);
        let duration_hours = self
            .duration
            .trim()
            .parse::<u32>()
            .map_err(|_| request_error(&format!("'{}' is not a valid duration", self.duration)))?;

        MeetingRequest::new(
            self.title.trim(),
            start.date(),
            start.time(),
            duration_hours,
            parse_attendees(&self.attendees),
        )
    }
}

/// Render an error the way the interface reports it
pub fn error_flash(err: &Error) -> Flash {
    let message = match err.kind() {
        ErrorKind::Authorization => t!("error_authorization", error = err.to_string()),
        ErrorKind::Request => t!("error_request", error = err.to_string()),
    };
    Flash::error(message.to_string())
}

/// Options for the slot select; the sentinel stands in for an empty list
pub fn slot_options(slots: &[Slot]) -> Vec<String> {
    if slots.is_empty() {
        vec![t!("no_free_slots").to_string()]
    } else {
        slots.iter().map(Slot::label).collect()
    }
}

/// Handler for the single page
pub async fn index_handler(
    State(state): State<AppState>,
    jar: CookieJar,
) -> Result<impl IntoResponse, WebError> {
    let (jar, id) = session_id(jar);

    // Outcome messages are shown once
    let session = state
        .sessions
        .update(id, |session| {
            let snapshot = session.clone();
            session.flash = None;
            session.submitted = false;
            snapshot
        })
        .await;

    let Some(token) = session.token else {
        let html = IndexTemplate::disconnected(session.flash).render()?;
        return Ok((jar, Html(html)));
    };

    let now = Utc::now();
    let zone = state.config.zone();
    // A submission's outcome is shown next to the form, anything else on top
    let (mut flash, outcome) = if session.submitted {
        (None, session.flash)
    } else {
        (session.flash, None)
    };

    let (events, slots) = match state.calendar.upcoming_events(&token, now).await {
        Ok(events) => {
            let slots = suggest_slots(now, zone, &events, state.config.slot_strategy);
            (events, slots)
        }
        Err(e) => {
            error!("Failed to fetch upcoming events: {}", e);
            if e.kind() == ErrorKind::Authorization {
                // Rejected token: fall back to the connect button
                state.sessions.update(id, |session| session.token = None).await;
                let html = IndexTemplate::disconnected(Some(error_flash(&e))).render()?;
                return Ok((jar, Html(html)));
            }
            flash = flash.or_else(|| Some(error_flash(&e)));
            (Vec::new(), Vec::new())
        }
    };

    let html = IndexTemplate::connected(
        flash,
        outcome,
        events.iter().map(EventRow::from).collect(),
        slot_options(&slots),
        now.with_timezone(&zone).format("%Y-%m-%d").to_string(),
        state.config.timezone.clone(),
    )
    .render()?;

    Ok((jar, Html(html)))
}

/// Handler for the connect button
pub async fn connect_handler(State(state): State<AppState>, jar: CookieJar) -> impl IntoResponse {
    let (jar, id) = session_id(jar);

    let flash = match state.authorizer.authorize().await {
        Ok(token) => {
            info!("Calendar connected for session {}", id);
            state.sessions.update(id, |session| session.token = Some(token)).await;
            Flash::success(t!("connected").to_string())
        }
        Err(e) => {
            error!("Authorization failed: {}", e);
            error_flash(&e)
        }
    };

    state.sessions.update(id, |session| session.flash = Some(flash)).await;
    (jar, Redirect::to("/"))
}

/// Handler for the meeting form submission
pub async fn schedule_handler(
    State(state): State<AppState>,
    jar: CookieJar,
    Form(form): Form<ScheduleForm>,
) -> impl IntoResponse {
    let (jar, id) = session_id(jar);
    let session = state.sessions.get(id).await;

    let outcome = match session.token {
        Some(token) => schedule_meeting(&state, &token, &form).await,
        None => Err(authorization_error(&t!("not_connected"))),
    };

    let flash = match outcome {
        Ok(link) => Flash::success(t!("meeting_scheduled").to_string()).with_link(link),
        Err(e) => {
            warn!("Failed to schedule meeting: {}", e);
            error_flash(&e)
        }
    };

    state
        .sessions
        .update(id, |session| {
            session.submitted = true;
            session.flash = Some(flash);
        })
        .await;

    (jar, Redirect::to("/"))
}

async fn schedule_meeting(
    state: &AppState,
    token: &AccessToken,
    form: &ScheduleForm,
) -> SchedulerResult<String> {
    let request = form.to_request()?;
    let event = request.to_event(&state.config.timezone);
    let created = state.calendar.create_event(token, &event).await?;
    info!("Meeting '{}' scheduled for {}", request.title, request.start());
    Ok(event_link(&created))
}

/// Handler for dropping the calendar connection
pub async fn disconnect_handler(State(state): State<AppState>, jar: CookieJar) -> impl IntoResponse {
    let (jar, id) = session_id(jar);
    state.sessions.remove(id).await;
    state
        .sessions
        .update(id, |session| session.flash = Some(Flash::success(t!("disconnected").to_string())))
        .await;
    (jar, Redirect::to("/"))
}

// Handler for API health check
pub async fn health_handler() -> &'static str {
    "OK"
}
