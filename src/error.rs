use miette::Diagnostic;
use thiserror::Error;

/// Main error type for the application
#[derive(Debug, Error, Diagnostic)]
pub enum Error {
    #[error("Authorization failed: {0}")]
    #[diagnostic(code(meeting_scheduler::authorization))]
    Authorization(String),

    #[error("Request failed: {0}")]
    #[diagnostic(code(meeting_scheduler::request))]
    Request(String),

    #[error("Environment error: {0}")]
    #[diagnostic(code(meeting_scheduler::environment))]
    Environment(String),

    #[error("Configuration error: {0}")]
    #[diagnostic(code(meeting_scheduler::config))]
    Config(String),

    #[error(transparent)]
    #[diagnostic(code(meeting_scheduler::io))]
    Io(#[from] std::io::Error),

    #[error("Serialization error: {0}")]
    #[diagnostic(code(meeting_scheduler::serialization))]
    Serialization(String),

    #[error("Template error: {0}")]
    #[diagnostic(code(meeting_scheduler::template))]
    Template(String),

    #[error("Other error: {0}")]
    #[diagnostic(code(meeting_scheduler::other))]
    Other(String),
}

/// The two failure categories surfaced to the user
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ErrorKind {
    /// Credentials could not be loaded, consent failed or the token was rejected
    Authorization,
    /// Anything else: network, provider errors, bad form input
    Request,
}

impl Error {
    /// Collapse the error into the category shown in the interface
    pub fn kind(&self) -> ErrorKind {
        match self {
            Error::Authorization(_) => ErrorKind::Authorization,
            _ => ErrorKind::Request,
        }
    }
}

impl From<reqwest::Error> for Error {
    fn from(err: reqwest::Error) -> Self {
        Error::Request(err.to_string())
    }
}

impl From<serde_json::Error> for Error {
    fn from(err: serde_json::Error) -> Self {
        Error::Serialization(err.to_string())
    }
}

// Implement From for TOML deserialization errors
impl From<toml::de::Error> for Error {
    fn from(err: toml::de::Error) -> Self {
        Error::Config(err.to_string())
    }
}

impl From<askama::Error> for Error {
    fn from(err: askama::Error) -> Self {
        Error::Template(err.to_string())
    }
}

/// Type alias for Result with our Error type
pub type SchedulerResult<T> = Result<T, Error>;

/// Helper to create environment errors
pub fn env_error(var: &str) -> Error {
    Error::Environment(format!("Invalid environment variable: {}", var))
}

/// Helper to create configuration errors
pub fn config_error(message: &str) -> Error {
    Error::Config(message.to_string())
}

/// Helper to create authorization errors
pub fn authorization_error(message: &str) -> Error {
    Error::Authorization(message.to_string())
}

/// Helper to create request errors
pub fn request_error(message: &str) -> Error {
    Error::Request(message.to_string())
}

/// Helper to create other errors
pub fn other_error(message: &str) -> Error {
    Error::Other(message.to_string())
}
