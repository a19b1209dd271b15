use chrono::{Duration, TimeZone, Utc};
use meeting_scheduler::components::google_calendar::oauth::BrowserLauncher;
use meeting_scheduler::components::google_calendar::{
    AccessToken, CalendarService, ClientSecret, CredentialSource, GoogleCalendarClient, OAuthFlow,
};
use meeting_scheduler::components::meeting::{parse_attendees, MeetingRequest};
use meeting_scheduler::error::ErrorKind;
use serde_json::json;
use std::collections::HashMap;
use std::io::{Read, Write};
use std::net::TcpStream;
use std::sync::Arc;
use url::Url;
use wiremock::matchers::{body_json, body_string_contains, header, method, path, query_param};
use wiremock::{Mock, MockServer, ResponseTemplate};

fn token() -> AccessToken {
    AccessToken::new("tok", None)
}

fn client(server: &MockServer) -> GoogleCalendarClient {
    GoogleCalendarClient::new(&server.uri(), "primary", 10).unwrap()
}

/// Test that upcoming events are requested with the expected query
#[tokio::test]
async fn test_list_upcoming_events() {
    let server = MockServer::start().await;
    let now = Utc.with_ymd_and_hms(2024, 1, 1, 10, 0, 0).unwrap();

    Mock::given(method("GET"))
        .and(path("/calendars/primary/events"))
        .and(query_param("timeMin", "2024-01-01T10:00:00Z"))
        .and(query_param("maxResults", "10"))
        .and(query_param("singleEvents", "true"))
        .and(query_param("orderBy", "startTime"))
        .and(header("authorization", "Bearer tok"))
        .respond_with(ResponseTemplate::new(200).set_body_json(json!({
            "kind": "calendar#events",
            "items": [
                {
                    "id": "event1",
                    "summary": "Test Event 1",
                    "start": { "dateTime": "2024-01-01T11:00:00Z" },
                    "end": { "dateTime": "2024-01-01T12:00:00Z" }
                },
                {
                    "id": "event2",
                    "start": { "date": "2024-01-02" },
                    "end": { "date": "2024-01-03" }
                }
            ]
        })))
        .expect(1)
        .mount(&server)
        .await;

    let events = client(&server).upcoming_events(&token(), now).await.unwrap();

    assert_eq!(events.len(), 2);
    assert_eq!(events[0].id, "event1");
    assert_eq!(events[0].summary.as_deref(), Some("Test Event 1"));
    assert_eq!(events[1].start.date.as_deref(), Some("2024-01-02"));
}

/// A response without items is an empty calendar
#[tokio::test]
async fn test_list_without_items() {
    let server = MockServer::start().await;

    Mock::given(method("GET"))
        .and(path("/calendars/primary/events"))
        .respond_with(ResponseTemplate::new(200).set_body_json(json!({ "kind": "calendar#events" })))
        .mount(&server)
        .await;

    let events = client(&server).upcoming_events(&token(), Utc::now()).await.unwrap();
    assert!(events.is_empty());
}

/// Rejected credentials surface as authorization failures
#[tokio::test]
async fn test_unauthorized_response() {
    let server = MockServer::start().await;

    Mock::given(method("GET"))
        .respond_with(ResponseTemplate::new(401).set_body_string("Invalid Credentials"))
        .mount(&server)
        .await;

    let err = client(&server).upcoming_events(&token(), Utc::now()).await.unwrap_err();
    assert_eq!(err.kind(), ErrorKind::Authorization);
    assert!(err.to_string().contains("Invalid Credentials"));
}

/// Other provider failures are request failures
#[tokio::test]
async fn test_server_error_response() {
    let server = MockServer::start().await;

    Mock::given(method("GET"))
        .respond_with(ResponseTemplate::new(503).set_body_string("Backend Error"))
        .mount(&server)
        .await;

    let err = client(&server).upcoming_events(&token(), Utc::now()).await.unwrap_err();
    assert_eq!(err.kind(), ErrorKind::Request);
    assert!(err.to_string().contains("503"));
}

/// An expired token never reaches the provider
#[tokio::test]
async fn test_expired_token_is_not_sent() {
    let server = MockServer::start().await;

    Mock::given(method("GET"))
        .respond_with(ResponseTemplate::new(200))
        .expect(0)
        .mount(&server)
        .await;

    let now = Utc::now();
    let expired = AccessToken::new("old", Some(now - Duration::minutes(5)));
    let err = client(&server).upcoming_events(&expired, now).await.unwrap_err();
    assert_eq!(err.kind(), ErrorKind::Authorization);
}

/// Test inserting an event built from a meeting request
#[tokio::test]
async fn test_create_event() {
    let server = MockServer::start().await;

    let request = MeetingRequest::new(
        "Design review",
        chrono::NaiveDate::from_ymd_opt(2024, 1, 1).unwrap(),
        chrono::NaiveTime::from_hms_opt(11, 0, 0).unwrap(),
        2,
        parse_attendees("a@x.com, b@y.com"),
    )
    .unwrap();

    Mock::given(method("POST"))
        .and(path("/calendars/primary/events"))
        .and(header("authorization", "Bearer tok"))
        .and(body_json(json!({
            "summary": "Design review",
            "start": { "dateTime": "2024-01-01T11:00:00", "timeZone": "UTC" },
            "end": { "dateTime": "2024-01-01T13:00:00", "timeZone": "UTC" },
            "attendees": [{ "email": "a@x.com" }, { "email": "b@y.com" }]
        })))
        .respond_with(ResponseTemplate::new(200).set_body_json(json!({
            "id": "created1",
            "summary": "Design review",
            "htmlLink": "https://www.google.com/calendar/event?eid=Y3JlYXRlZDE",
            "start": { "dateTime": "2024-01-01T11:00:00Z", "timeZone": "UTC" },
            "end": { "dateTime": "2024-01-01T13:00:00Z", "timeZone": "UTC" }
        })))
        .expect(1)
        .mount(&server)
        .await;

    let created = client(&server)
        .create_event(&token(), &request.to_event("UTC"))
        .await
        .unwrap();

    assert_eq!(created.id, "created1");
    assert!(created.html_link.is_some());
}

/// Provider validation errors are passed back verbatim
#[tokio::test]
async fn test_create_event_rejected() {
    let server = MockServer::start().await;

    Mock::given(method("POST"))
        .respond_with(ResponseTemplate::new(400).set_body_string("Invalid attendee email."))
        .mount(&server)
        .await;

    let event = MeetingRequest::new(
        "x",
        chrono::NaiveDate::from_ymd_opt(2024, 1, 1).unwrap(),
        chrono::NaiveTime::from_hms_opt(9, 0, 0).unwrap(),
        1,
        vec!["nope".to_string()],
    )
    .unwrap()
    .to_event("UTC");

    let err = client(&server).create_event(&token(), &event).await.unwrap_err();
    assert_eq!(err.kind(), ErrorKind::Request);
    assert!(err.to_string().contains("Invalid attendee email."));
}

fn inline_credentials(server: &MockServer) -> CredentialSource {
    CredentialSource::Inline(
        json!({
            "installed": {
                "client_id": "client-1.apps.googleusercontent.com",
                "client_secret": "secret-1",
                "auth_uri": "https://accounts.google.com/o/oauth2/auth",
                "token_uri": format!("{}/token", server.uri())
            }
        })
        .to_string(),
    )
}

/// Test the authorization code exchange
#[tokio::test]
async fn test_exchange_code() {
    let server = MockServer::start().await;

    Mock::given(method("POST"))
        .and(path("/token"))
        .and(body_string_contains("grant_type=authorization_code"))
        .and(body_string_contains("code=abc"))
        .respond_with(ResponseTemplate::new(200).set_body_json(json!({
            "access_token": "ya29.test",
            "expires_in": 3599,
            "token_type": "Bearer",
            "scope": "https://www.googleapis.com/auth/calendar"
        })))
        .expect(1)
        .mount(&server)
        .await;

    let source = inline_credentials(&server);
    let secret: ClientSecret = source.load().unwrap();
    let flow = OAuthFlow::new(source, std::time::Duration::from_secs(5));

    let token = flow
        .exchange_code(&secret, "abc", "http://127.0.0.1:1234/")
        .await
        .unwrap();

    assert_eq!(token.authorization_header(Utc::now()).unwrap(), "Bearer ya29.test");
    assert!(token.expires_at().is_some());
}

/// A rejected code is an authorization failure
#[tokio::test]
async fn test_exchange_code_rejected() {
    let server = MockServer::start().await;

    Mock::given(method("POST"))
        .and(path("/token"))
        .respond_with(ResponseTemplate::new(400).set_body_json(json!({ "error": "invalid_grant" })))
        .mount(&server)
        .await;

    let source = inline_credentials(&server);
    let secret = source.load().unwrap();
    let flow = OAuthFlow::new(source, std::time::Duration::from_secs(5));

    let err = flow.exchange_code(&secret, "bad", "http://127.0.0.1:1234/").await.unwrap_err();
    assert_eq!(err.kind(), ErrorKind::Authorization);
    assert!(err.to_string().contains("invalid_grant"));
}

fn send_get(addr: &str, path: &str) {
    if let Ok(mut stream) = TcpStream::connect(addr) {
        let _ = stream.set_read_timeout(Some(std::time::Duration::from_secs(2)));
        let _ = write!(
            stream,
            "GET {} HTTP/1.1\r\nHost: {}\r\nConnection: close\r\n\r\n",
            path, addr
        );
        let mut response = String::new();
        let _ = stream.read_to_string(&mut response);
    }
}

/// Plays the browser: follows the consent redirect back to the loopback listener
fn fake_browser(code: &'static str) -> BrowserLauncher {
    Arc::new(move |auth_url: &str| -> std::io::Result<()> {
        let url = Url::parse(auth_url).map_err(std::io::Error::other)?;
        let params: HashMap<String, String> = url.query_pairs().into_owned().collect();
        let redirect = Url::parse(&params["redirect_uri"]).map_err(std::io::Error::other)?;
        let addr = format!(
            "{}:{}",
            redirect.host_str().unwrap_or("127.0.0.1"),
            redirect.port().unwrap_or(80)
        );
        let state = params["state"].clone();

        std::thread::spawn(move || {
            send_get(&addr, "/favicon.ico");
            send_get(&addr, &format!("/?code={}&state={}", code, state));
        });
        Ok(())
    })
}

/// Test the whole consent flow through the loopback listener
#[tokio::test]
async fn test_full_authorization_flow() {
    let server = MockServer::start().await;

    Mock::given(method("POST"))
        .and(path("/token"))
        .and(body_string_contains("code=loopback-code"))
        .and(body_string_contains("redirect_uri=http%3A%2F%2F127.0.0.1%3A"))
        .respond_with(ResponseTemplate::new(200).set_body_json(json!({
            "access_token": "ya29.loopback",
            "expires_in": 3599
        })))
        .expect(1)
        .mount(&server)
        .await;

    let flow = OAuthFlow::new(inline_credentials(&server), std::time::Duration::from_secs(10))
        .with_launcher(fake_browser("loopback-code"));

    let token = flow.run().await.unwrap();
    assert_eq!(
        token.authorization_header(Utc::now()).unwrap(),
        "Bearer ya29.loopback"
    );
}

/// Missing credentials stop the flow before anything is opened
#[tokio::test]
async fn test_flow_without_credentials() {
    let launcher: BrowserLauncher = Arc::new(|_: &str| -> std::io::Result<()> {
        panic!("browser must not be opened")
    });
    let flow = OAuthFlow::new(
        CredentialSource::File("/nonexistent/credentials.json".into()),
        std::time::Duration::from_secs(1),
    )
    .with_launcher(launcher);

    let err = flow.run().await.unwrap_err();
    assert_eq!(err.kind(), ErrorKind::Authorization);
}
