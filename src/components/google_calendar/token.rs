use crate::error::{authorization_error, SchedulerResult};
use chrono::{DateTime, Duration, Utc};
use serde::Deserialize;

/// Response of the OAuth token endpoint
#[derive(Debug, Clone, Deserialize)]
pub struct TokenResponse {
    pub access_token: String,
    #[serde(default = "default_token_type")]
    pub token_type: String,
    pub expires_in: Option<i64>,
    pub scope: Option<String>,
}

fn default_token_type() -> String {
    "Bearer".to_string()
}

/// Authorized handle for calendar calls; lives only in the session
#[derive(Debug, Clone, PartialEq)]
pub struct AccessToken {
    access_token: String,
    token_type: String,
    expires_at: Option<DateTime<Utc>>,
    scope: Option<String>,
}

impl AccessToken {
    pub fn new(access_token: impl Into<String>, expires_at: Option<DateTime<Utc>>) -> Self {
        Self {
            access_token: access_token.into(),
            token_type: default_token_type(),
            expires_at,
            scope: None,
        }
    }

    /// Build a token from the endpoint response received at `now`
    pub fn from_response(response: TokenResponse, now: DateTime<Utc>) -> Self {
        Self {
            access_token: response.access_token,
            token_type: response.token_type,
            expires_at: response.expires_in.map(|secs| now + Duration::seconds(secs)),
            scope: response.scope,
        }
    }

    pub fn expires_at(&self) -> Option<DateTime<Utc>> {
        self.expires_at
    }

    pub fn scope(&self) -> Option<&str> {
        self.scope.as_deref()
    }

    pub fn is_expired(&self, now: DateTime<Utc>) -> bool {
        self.expires_at.is_some_and(|expiry| expiry <= now)
    }

    /// Value for the Authorization header.
    ///
    /// There is no refresh: an expired token is an authorization failure and
    /// the user has to connect again.
    pub fn authorization_header(&self, now: DateTime<Utc>) -> SchedulerResult<String> {
        if self.is_expired(now) {
            return Err(authorization_error(
                "Access token has expired, please connect your calendar again",
            ));
        }
        Ok(format!("{} {}", self.token_type, self.access_token))
    }
}
