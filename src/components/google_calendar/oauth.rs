use super::credentials::{ClientSecret, CredentialSource};
use super::token::{AccessToken, TokenResponse};
use crate::error::{authorization_error, SchedulerResult};
use async_trait::async_trait;
use chrono::Utc;
use reqwest::Client;
use std::collections::HashMap;
use std::sync::Arc;
use std::time::{Duration, Instant};
use tracing::{debug, info, warn};
use url::Url;

/// Read/write access to the user's calendars
pub const CALENDAR_SCOPE: &str = "https://www.googleapis.com/auth/calendar";

/// Path the consent page redirects back to on the loopback listener
const CALLBACK_PATH: &str = "/";

/// Something that can produce an authorized calendar handle
#[async_trait]
pub trait Authorizer: Send + Sync + 'static {
    async fn authorize(&self) -> SchedulerResult<AccessToken>;
}

/// Opens the consent page for the user
pub type BrowserLauncher = Arc<dyn Fn(&str) -> std::io::Result<()> + Send + Sync>;

/// Interactive installed-app OAuth flow with a loopback redirect
#[derive(Clone)]
pub struct OAuthFlow {
    source: CredentialSource,
    scopes: Vec<String>,
    client: Client,
    callback_timeout: Duration,
    launcher: BrowserLauncher,
}

impl OAuthFlow {
    pub fn new(source: CredentialSource, callback_timeout: Duration) -> Self {
        Self {
            source,
            scopes: vec![CALENDAR_SCOPE.to_string()],
            client: Client::new(),
            callback_timeout,
            launcher: Arc::new(|url: &str| webbrowser::open(url)),
        }
    }

    /// Replace the browser launcher, e.g. to drive the flow without a desktop
    pub fn with_launcher(mut self, launcher: BrowserLauncher) -> Self {
        self.launcher = launcher;
        self
    }

    /// Run the whole consent flow and exchange the code for a token
    pub async fn run(&self) -> SchedulerResult<AccessToken> {
        let secret = self.source.load()?;

        // Bind on an ephemeral port so several sessions never collide
        let server = tiny_http::Server::http("127.0.0.1:0")
            .map_err(|e| authorization_error(&format!("Failed to start callback server: {}", e)))?;
        let port = server
            .server_addr()
            .to_ip()
            .map(|addr| addr.port())
            .ok_or_else(|| authorization_error("Callback server has no IP address"))?;
        let redirect_uri = format!("http://127.0.0.1:{}{}", port, CALLBACK_PATH);

        let state = uuid::Uuid::new_v4().to_string();
        let auth_url = authorization_url(&secret, &redirect_uri, &self.scopes, &state)?;

        info!("Opening browser for Google Calendar authorization");
        if let Err(e) = (self.launcher)(auth_url.as_str()) {
            warn!("Failed to open browser ({}), visit this URL manually: {}", e, auth_url);
        }

        let timeout = self.callback_timeout;
        let code = tokio::task::spawn_blocking(move || wait_for_code(&server, &state, timeout))
            .await
            .map_err(|e| authorization_error(&format!("Callback task failed: {}", e)))??;

        info!("Received authorization code, exchanging for token");
        self.exchange_code(&secret, &code, &redirect_uri).await
    }

    /// Exchange an authorization code at the token endpoint
    pub async fn exchange_code(
        &self,
        secret: &ClientSecret,
        code: &str,
        redirect_uri: &str,
    ) -> SchedulerResult<AccessToken> {
        let params = [
            ("client_id", secret.client_id.as_str()),
            ("client_secret", secret.client_secret.as_str()),
            ("code", code),
            ("redirect_uri", redirect_uri),
            ("grant_type", "authorization_code"),
        ];

        let response = self
            .client
            .post(&secret.token_uri)
            .form(&params)
            .send()
            .await
            .map_err(|e| authorization_error(&format!("Failed to reach token endpoint: {}", e)))?;

        if !response.status().is_success() {
            let status = response.status();
            let error_body = response
                .text()
                .await
                .unwrap_or_else(|_| "Could not read error response".to_string());
            return Err(authorization_error(&format!(
                "Failed to get token: HTTP {} - {}",
                status, error_body
            )));
        }

        let token: TokenResponse = response
            .json()
            .await
            .map_err(|e| authorization_error(&format!("Failed to parse token response: {}", e)))?;

        Ok(AccessToken::from_response(token, Utc::now()))
    }
}

#[async_trait]
impl Authorizer for OAuthFlow {
    async fn authorize(&self) -> SchedulerResult<AccessToken> {
        self.run().await
    }
}

/// Consent page URL for the given client and redirect
pub fn authorization_url(
    secret: &ClientSecret,
    redirect_uri: &str,
    scopes: &[String],
    state: &str,
) -> SchedulerResult<Url> {
    let scope = scopes.join(" ");
    Url::parse_with_params(
        &secret.auth_uri,
        &[
            ("client_id", secret.client_id.as_str()),
            ("redirect_uri", redirect_uri),
            ("response_type", "code"),
            ("scope", scope.as_str()),
            ("state", state),
            ("access_type", "offline"),
        ],
    )
    .map_err(|e| authorization_error(&format!("Invalid auth_uri '{}': {}", secret.auth_uri, e)))
}

/// Inspect a request received on the loopback listener.
///
/// Returns `Ok(None)` for requests that are not the redirect (favicon and the like).
pub fn parse_callback(request_url: &str, expected_state: &str) -> SchedulerResult<Option<String>> {
    let url = Url::parse("http://127.0.0.1/")
        .and_then(|base| base.join(request_url))
        .map_err(|e| authorization_error(&format!("Malformed callback URL: {}", e)))?;

    if url.path() != CALLBACK_PATH {
        return Ok(None);
    }

    let params: HashMap<String, String> = url.query_pairs().into_owned().collect();
    if params.is_empty() {
        return Ok(None);
    }

    if let Some(error) = params.get("error") {
        return Err(authorization_error(&format!("Consent was not granted: {}", error)));
    }

    if params.get("state").map(String::as_str) != Some(expected_state) {
        return Err(authorization_error("OAuth state mismatch"));
    }

    params
        .get("code")
        .cloned()
        .map(Some)
        .ok_or_else(|| authorization_error("No authorization code found in callback"))
}

fn wait_for_code(server: &tiny_http::Server, state: &str, timeout: Duration) -> SchedulerResult<String> {
    let deadline = Instant::now() + timeout;

    loop {
        let remaining = deadline.saturating_duration_since(Instant::now());
        if remaining.is_zero() {
            return Err(authorization_error("Timed out waiting for authorization callback"));
        }

        let request = server
            .recv_timeout(remaining)
            .map_err(|e| authorization_error(&format!("Callback server error: {}", e)))?;
        let Some(request) = request else {
            continue;
        };

        match parse_callback(request.url(), state) {
            Ok(Some(code)) => {
                let response = tiny_http::Response::from_string(
                    "Authorization successful! You can close this window.",
                );
                if let Err(e) = request.respond(response) {
                    warn!("Failed to answer the browser: {}", e);
                }
                return Ok(code);
            }
            Ok(None) => {
                debug!("Ignoring request to {}", request.url());
                if let Err(e) = request.respond(tiny_http::Response::empty(404)) {
                    warn!("Failed to answer unrelated request: {}", e);
                }
            }
            Err(e) => {
                let response = tiny_http::Response::from_string(format!("{}", e)).with_status_code(400);
                if let Err(respond_err) = request.respond(response) {
                    warn!("Failed to report the callback error to the browser: {}", respond_err);
                }
                return Err(e);
            }
        }
    }
}
