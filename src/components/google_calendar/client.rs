use super::models::{CalendarEvent, EventList, NewEvent};
use super::token::AccessToken;
use crate::config::Config;
use crate::error::{authorization_error, config_error, request_error, SchedulerResult};
use async_trait::async_trait;
use chrono::{DateTime, SecondsFormat, Utc};
use reqwest::{Client, Response, StatusCode};
use tracing::{debug, info};
use url::Url;

/// Calendar operations used by the presentation layer
#[async_trait]
pub trait CalendarService: Send + Sync + 'static {
    /// Upcoming single events starting at or after `now`, earliest first
    async fn upcoming_events(
        &self,
        token: &AccessToken,
        now: DateTime<Utc>,
    ) -> SchedulerResult<Vec<CalendarEvent>>;

    /// Insert an event and return the provider's record of it
    async fn create_event(&self, token: &AccessToken, event: &NewEvent) -> SchedulerResult<CalendarEvent>;
}

/// REST client for the Google Calendar v3 events endpoints
#[derive(Debug, Clone)]
pub struct GoogleCalendarClient {
    client: Client,
    api_url: Url,
    calendar_id: String,
    max_results: u32,
}

impl GoogleCalendarClient {
    pub fn new(api_url: &str, calendar_id: impl Into<String>, max_results: u32) -> SchedulerResult<Self> {
        let api_url = Url::parse(api_url)
            .map_err(|e| config_error(&format!("Failed to parse API URL: {}", e)))?;

        Ok(Self {
            client: Client::new(),
            api_url,
            calendar_id: calendar_id.into(),
            max_results,
        })
    }

    pub fn from_config(config: &Config) -> SchedulerResult<Self> {
        Self::new(&config.api_url, config.calendar_id.clone(), config.max_results)
    }

    /// `{api}/calendars/{calendar_id}/events` with the calendar id escaped
    fn events_url(&self) -> SchedulerResult<Url> {
        let mut url = self.api_url.clone();
        url.path_segments_mut()
            .map_err(|_| config_error("API URL cannot be a base"))?
            .pop_if_empty()
            .push("calendars")
            .push(&self.calendar_id)
            .push("events");
        Ok(url)
    }
}

/// Turn a non-success response into the matching error kind
async fn check_response(response: Response, action: &str) -> SchedulerResult<Response> {
    let status = response.status();
    if status.is_success() {
        return Ok(response);
    }

    let error_body = response
        .text()
        .await
        .unwrap_or_else(|_| "Could not read error response".to_string());
    let message = format!("Failed to {}: HTTP {} - {}", action, status, error_body);

    match status {
        StatusCode::UNAUTHORIZED | StatusCode::FORBIDDEN => Err(authorization_error(&message)),
        _ => Err(request_error(&message)),
    }
}

#[async_trait]
impl CalendarService for GoogleCalendarClient {
    async fn upcoming_events(
        &self,
        token: &AccessToken,
        now: DateTime<Utc>,
    ) -> SchedulerResult<Vec<CalendarEvent>> {
        let authorization = token.authorization_header(now)?;

        let mut url = self.events_url()?;
        url.query_pairs_mut()
            .append_pair("timeMin", &now.to_rfc3339_opts(SecondsFormat::Secs, true))
            .append_pair("maxResults", &self.max_results.to_string())
            .append_pair("singleEvents", "true")
            .append_pair("orderBy", "startTime");

        debug!("Fetching upcoming events from {}", url);

        let response = self
            .client
            .get(url)
            .header(reqwest::header::AUTHORIZATION, authorization)
            .send()
            .await
            .map_err(|e| request_error(&format!("Failed to fetch events: {}", e)))?;

        let response = check_response(response, "fetch events").await?;

        let events: EventList = response
            .json()
            .await
            .map_err(|e| request_error(&format!("Failed to parse events response: {}", e)))?;

        debug!("Fetched {} upcoming events", events.items.len());
        Ok(events.items)
    }

    async fn create_event(&self, token: &AccessToken, event: &NewEvent) -> SchedulerResult<CalendarEvent> {
        let authorization = token.authorization_header(Utc::now())?;
        let url = self.events_url()?;

        let response = self
            .client
            .post(url)
            .header(reqwest::header::AUTHORIZATION, authorization)
            .json(event)
            .send()
            .await
            .map_err(|e| request_error(&format!("Failed to create event: {}", e)))?;

        let response = check_response(response, "create event").await?;

        let created: CalendarEvent = response
            .json()
            .await
            .map_err(|e| request_error(&format!("Failed to parse created event: {}", e)))?;

        info!("Created event {} ({})", created.id, event.summary);
        Ok(created)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_events_url() {
        let client = GoogleCalendarClient::new("https://www.googleapis.com/calendar/v3", "primary", 10).unwrap();
        assert_eq!(
            client.events_url().unwrap().as_str(),
            "https://www.googleapis.com/calendar/v3/calendars/primary/events"
        );
    }

    #[test]
    fn test_events_url_escapes_calendar_id() {
        let client = GoogleCalendarClient::new("http://127.0.0.1:9000/", "team calendar#1", 10).unwrap();
        assert_eq!(
            client.events_url().unwrap().as_str(),
            "http://127.0.0.1:9000/calendars/team%20calendar%231/events"
        );
    }
}
