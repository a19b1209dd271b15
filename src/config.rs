use crate::components::google_calendar::credentials::CredentialSource;
use crate::components::meeting::slots::SlotStrategy;
use crate::error::{config_error, env_error, SchedulerResult};
use chrono_tz::Tz;
use dotenvy::dotenv;
use serde::Deserialize;
use std::env;
use std::fs;
use std::net::{IpAddr, Ipv4Addr, SocketAddr};
use std::path::PathBuf;
use tracing::debug;

/// Default location of the OAuth client secret
pub const DEFAULT_CREDENTIALS_FILE: &str = "credentials.json";

/// Default Google Calendar v3 API root
pub const DEFAULT_API_URL: &str = "https://www.googleapis.com/calendar/v3";

/// Optional configuration file overlaid on top of the environment
pub const CONFIG_FILE: &str = "config/scheduler.toml";

const DEFAULT_PORT: u16 = 3000;
const DEFAULT_MAX_RESULTS: u32 = 10;
const MAX_RESULTS_LIMIT: u32 = 250;
const DEFAULT_CALLBACK_TIMEOUT_SECS: u64 = 300;

/// Main configuration structure for the scheduler
#[derive(Debug, Clone)]
pub struct Config {
    /// Path of the OAuth client secret JSON
    pub credentials_file: PathBuf,
    /// Client secret JSON provided by a hosted secret store; wins over the file
    pub credentials_json: Option<String>,
    /// Calendar to read from and write to
    pub calendar_id: String,
    /// Upper bound on the number of upcoming events fetched
    pub max_results: u32,
    /// Time zone attached to created events
    pub timezone: String,
    /// How candidate slots are checked against existing events
    pub slot_strategy: SlotStrategy,
    /// Address the web interface listens on
    pub bind_address: SocketAddr,
    /// Calendar API root, overridable for testing
    pub api_url: String,
    /// Locale for user-facing messages
    pub locale: String,
    /// How long to wait for the browser to come back from the consent page
    pub callback_timeout_secs: u64,
}

impl Default for Config {
    fn default() -> Self {
        Self {
            credentials_file: PathBuf::from(DEFAULT_CREDENTIALS_FILE),
            credentials_json: None,
            calendar_id: "primary".to_string(),
            max_results: DEFAULT_MAX_RESULTS,
            timezone: "UTC".to_string(),
            slot_strategy: SlotStrategy::default(),
            bind_address: SocketAddr::new(IpAddr::V4(Ipv4Addr::LOCALHOST), DEFAULT_PORT),
            api_url: DEFAULT_API_URL.to_string(),
            locale: "en".to_string(),
            callback_timeout_secs: DEFAULT_CALLBACK_TIMEOUT_SECS,
        }
    }
}

/// Values accepted in `config/scheduler.toml`
#[derive(Debug, Default, Deserialize)]
#[serde(deny_unknown_fields)]
pub struct FileConfig {
    pub credentials_file: Option<PathBuf>,
    pub calendar_id: Option<String>,
    pub max_results: Option<u32>,
    pub timezone: Option<String>,
    pub slot_strategy: Option<SlotStrategy>,
    pub host: Option<IpAddr>,
    pub port: Option<u16>,
    pub api_url: Option<String>,
    pub locale: Option<String>,
    pub callback_timeout_secs: Option<u64>,
}

impl Config {
    /// Load configuration from defaults, the config file and the environment.
    ///
    /// Precedence, lowest first: built-in defaults, `config/scheduler.toml`,
    /// then environment variables (including `.env`).
    pub fn load() -> SchedulerResult<Self> {
        // Load .env file if it exists
        dotenv().ok();

        let mut config = Config::default();

        if let Ok(content) = fs::read_to_string(CONFIG_FILE) {
            debug!("Applying settings from {}", CONFIG_FILE);
            let file_config: FileConfig = toml::from_str(&content)?;
            config.apply(file_config);
        }

        config.apply_lookup(|key| env::var(key).ok())?;
        config.validate()?;
        Ok(config)
    }

    /// Build a configuration from an arbitrary variable lookup
    pub fn from_lookup<F>(lookup: F) -> SchedulerResult<Self>
    where
        F: Fn(&str) -> Option<String>,
    {
        let mut config = Config::default();
        config.apply_lookup(lookup)?;
        Ok(config)
    }

    /// Overlay the variables that `lookup` knows about
    pub fn apply_lookup<F>(&mut self, lookup: F) -> SchedulerResult<()>
    where
        F: Fn(&str) -> Option<String>,
    {
        if let Some(path) = lookup("CREDENTIALS_FILE") {
            self.credentials_file = PathBuf::from(path);
        }
        if let Some(json) = lookup("GOOGLE_CREDENTIALS_JSON").filter(|json| !json.trim().is_empty()) {
            self.credentials_json = Some(json);
        }

        if let Some(calendar_id) = lookup("GOOGLE_CALENDAR_ID") {
            self.calendar_id = calendar_id;
        }
        if let Some(max_results) = lookup("MAX_RESULTS") {
            self.max_results = max_results
                .parse()
                .map_err(|_| env_error("MAX_RESULTS"))?;
        }
        if let Some(timezone) = lookup("TIMEZONE") {
            self.timezone = timezone;
        }
        if let Some(strategy) = lookup("SLOT_STRATEGY") {
            self.slot_strategy = strategy.parse()?;
        }

        let host = match lookup("HOST") {
            Some(host) => host.parse::<IpAddr>().map_err(|_| env_error("HOST"))?,
            None => self.bind_address.ip(),
        };
        let port = match lookup("PORT") {
            Some(port) => port.parse::<u16>().map_err(|_| env_error("PORT"))?,
            None => self.bind_address.port(),
        };
        self.bind_address = SocketAddr::new(host, port);

        if let Some(api_url) = lookup("GOOGLE_CALENDAR_API_URL") {
            self.api_url = api_url;
        }
        if let Some(locale) = lookup("APP_LOCALE") {
            self.locale = locale;
        }
        if let Some(timeout) = lookup("OAUTH_CALLBACK_TIMEOUT_SECS") {
            self.callback_timeout_secs = timeout
                .parse()
                .map_err(|_| env_error("OAUTH_CALLBACK_TIMEOUT_SECS"))?;
        }

        Ok(())
    }

    /// Overlay values from the config file
    pub fn apply(&mut self, file: FileConfig) {
        if let Some(path) = file.credentials_file {
            self.credentials_file = path;
        }
        if let Some(calendar_id) = file.calendar_id {
            self.calendar_id = calendar_id;
        }
        if let Some(max_results) = file.max_results {
            self.max_results = max_results;
        }
        if let Some(timezone) = file.timezone {
            self.timezone = timezone;
        }
        if let Some(strategy) = file.slot_strategy {
            self.slot_strategy = strategy;
        }
        if let Some(host) = file.host {
            self.bind_address.set_ip(host);
        }
        if let Some(port) = file.port {
            self.bind_address.set_port(port);
        }
        if let Some(api_url) = file.api_url {
            self.api_url = api_url;
        }
        if let Some(locale) = file.locale {
            self.locale = locale;
        }
        if let Some(timeout) = file.callback_timeout_secs {
            self.callback_timeout_secs = timeout;
        }
    }

    /// Check values that cannot be expressed in the types
    pub fn validate(&self) -> SchedulerResult<()> {
        if self.max_results == 0 || self.max_results > MAX_RESULTS_LIMIT {
            return Err(config_error(&format!(
                "max_results must be between 1 and {}",
                MAX_RESULTS_LIMIT
            )));
        }
        if self.timezone.parse::<Tz>().is_err() {
            return Err(config_error(&format!("Unknown timezone: {}", self.timezone)));
        }
        if self.calendar_id.trim().is_empty() {
            return Err(config_error("calendar_id must not be empty"));
        }
        url::Url::parse(&self.api_url)
            .map_err(|e| config_error(&format!("Invalid api_url '{}': {}", self.api_url, e)))?;
        Ok(())
    }

    /// Zone of the calendar; slots are suggested and meetings booked in it
    pub fn zone(&self) -> Tz {
        self.timezone.parse().unwrap_or(Tz::UTC)
    }

    /// Where the OAuth client secret comes from
    pub fn credential_source(&self) -> CredentialSource {
        match &self.credentials_json {
            Some(json) => CredentialSource::Inline(json.clone()),
            None => CredentialSource::File(self.credentials_file.clone()),
        }
    }
}
