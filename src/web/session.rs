use crate::components::google_calendar::AccessToken;
use axum_extra::extract::cookie::{Cookie, CookieJar, SameSite};
use chrono::{DateTime, Duration, Utc};
use std::collections::HashMap;
use std::sync::Arc;
use tokio::sync::RwLock;
use uuid::Uuid;

/// Name of the cookie carrying the session id
pub const SESSION_COOKIE: &str = "scheduler_session";

/// Lifetime of the cookie and of idle sessions on the server
pub const SESSION_TTL_HOURS: i64 = 12;

/// One-shot status message shown on the next render
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Flash {
    pub message: String,
    pub is_error: bool,
    /// Deep link to the created event, if any
    pub link: Option<String>,
}

impl Flash {
    pub fn success(message: impl Into<String>) -> Self {
        Self {
            message: message.into(),
            is_error: false,
            link: None,
        }
    }

    pub fn error(message: impl Into<String>) -> Self {
        Self {
            message: message.into(),
            is_error: true,
            link: None,
        }
    }

    pub fn with_link(mut self, link: impl Into<String>) -> Self {
        self.link = Some(link.into());
        self
    }
}

/// Everything remembered about one browser session
#[derive(Debug, Clone, Default)]
pub struct SessionContext {
    /// Present once the calendar has been connected
    pub token: Option<AccessToken>,
    /// Set by a schedule submission, cleared when its outcome is rendered
    pub submitted: bool,
    pub flash: Option<Flash>,
}

impl SessionContext {
    pub fn is_authorized(&self) -> bool {
        self.token.is_some()
    }

    /// Nothing worth keeping on the server
    pub fn is_empty(&self) -> bool {
        self.token.is_none() && self.flash.is_none() && !self.submitted
    }
}

#[derive(Debug, Clone)]
struct StoredSession {
    context: SessionContext,
    last_seen: DateTime<Utc>,
}

/// Process-local session contexts keyed by cookie id.
///
/// Only non-empty contexts are stored, and contexts idle for longer than the
/// TTL are dropped on the next write.
#[derive(Debug, Clone)]
pub struct SessionStore {
    sessions: Arc<RwLock<HashMap<Uuid, StoredSession>>>,
    ttl: Duration,
}

impl Default for SessionStore {
    fn default() -> Self {
        Self::with_ttl(Duration::hours(SESSION_TTL_HOURS))
    }
}

impl SessionStore {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn with_ttl(ttl: Duration) -> Self {
        Self {
            sessions: Arc::new(RwLock::new(HashMap::new())),
            ttl,
        }
    }

    fn is_live(&self, stored: &StoredSession, now: DateTime<Utc>) -> bool {
        now - stored.last_seen < self.ttl
    }

    /// Snapshot of a session; unknown or expired ids get a fresh context
    pub async fn get(&self, id: Uuid) -> SessionContext {
        let now = Utc::now();
        let sessions = self.sessions.read().await;
        sessions
            .get(&id)
            .filter(|stored| self.is_live(stored, now))
            .map(|stored| stored.context.clone())
            .unwrap_or_default()
    }

    /// Modify a session; the result is stored only if it is not empty
    pub async fn update<F, R>(&self, id: Uuid, f: F) -> R
    where
        F: FnOnce(&mut SessionContext) -> R,
    {
        let now = Utc::now();
        let mut sessions = self.sessions.write().await;
        sessions.retain(|_, stored| self.is_live(stored, now));

        let mut context = sessions
            .remove(&id)
            .map(|stored| stored.context)
            .unwrap_or_default();
        let result = f(&mut context);

        if !context.is_empty() {
            sessions.insert(id, StoredSession { context, last_seen: now });
        }
        result
    }

    pub async fn remove(&self, id: Uuid) {
        let mut sessions = self.sessions.write().await;
        sessions.remove(&id);
    }

    pub async fn len(&self) -> usize {
        self.sessions.read().await.len()
    }
}

/// Session id from the cookie jar, minting a new cookie when absent or invalid
pub fn session_id(jar: CookieJar) -> (CookieJar, Uuid) {
    if let Some(id) = jar
        .get(SESSION_COOKIE)
        .and_then(|cookie| Uuid::parse_str(cookie.value()).ok())
    {
        return (jar, id);
    }

    let id = Uuid::new_v4();
    let cookie = Cookie::build((SESSION_COOKIE, id.to_string()))
        .path("/")
        .http_only(true)
        .same_site(SameSite::Lax)
        .max_age(time::Duration::hours(SESSION_TTL_HOURS));
    (jar.add(cookie), id)
}
