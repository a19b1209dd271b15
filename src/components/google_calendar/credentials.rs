use crate::error::{authorization_error, SchedulerResult};
use serde::Deserialize;
use std::fs;
use std::path::PathBuf;

/// Google's consent page
pub const GOOGLE_AUTH_URL: &str = "https://accounts.google.com/o/oauth2/v2/auth";
/// Google's token endpoint
pub const GOOGLE_TOKEN_URL: &str = "https://oauth2.googleapis.com/token";

/// Where the client secret JSON is read from
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum CredentialSource {
    /// A `credentials.json` downloaded from the Cloud Console
    File(PathBuf),
    /// The same JSON provided by a hosted secret store
    Inline(String),
}

impl CredentialSource {
    pub fn load(&self) -> SchedulerResult<ClientSecret> {
        match self {
            CredentialSource::File(path) => {
                let content = fs::read_to_string(path).map_err(|e| {
                    authorization_error(&format!(
                        "Failed to read credentials file {}: {}",
                        path.display(),
                        e
                    ))
                })?;
                ClientSecret::from_json(&content)
            }
            CredentialSource::Inline(json) => ClientSecret::from_json(json),
        }
    }
}

/// OAuth client configuration
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ClientSecret {
    pub client_id: String,
    pub client_secret: String,
    pub auth_uri: String,
    pub token_uri: String,
}

#[derive(Debug, Deserialize)]
struct CredentialsFile {
    installed: Option<NestedSecret>,
    web: Option<NestedSecret>,
    client_id: Option<String>,
    client_secret: Option<String>,
}

#[derive(Debug, Deserialize)]
struct NestedSecret {
    client_id: String,
    client_secret: String,
    auth_uri: Option<String>,
    token_uri: Option<String>,
}

impl ClientSecret {
    /// Parse either the Cloud Console layout (`installed`/`web`) or a flat
    /// `{client_id, client_secret}` object
    pub fn from_json(json: &str) -> SchedulerResult<Self> {
        let file: CredentialsFile = serde_json::from_str(json)
            .map_err(|e| authorization_error(&format!("Failed to parse credentials JSON: {}", e)))?;

        let secret = if let Some(nested) = file.installed.or(file.web) {
            Self {
                client_id: nested.client_id,
                client_secret: nested.client_secret,
                auth_uri: nested.auth_uri.unwrap_or_else(|| GOOGLE_AUTH_URL.to_string()),
                token_uri: nested.token_uri.unwrap_or_else(|| GOOGLE_TOKEN_URL.to_string()),
            }
        } else if let (Some(client_id), Some(client_secret)) = (file.client_id, file.client_secret) {
            Self {
                client_id,
                client_secret,
                auth_uri: GOOGLE_AUTH_URL.to_string(),
                token_uri: GOOGLE_TOKEN_URL.to_string(),
            }
        } else {
            return Err(authorization_error(
                "Credentials must contain an 'installed' or 'web' section, or client_id and client_secret",
            ));
        };

        if secret.client_id.trim().is_empty() {
            return Err(authorization_error("Credentials have an empty client_id"));
        }

        Ok(secret)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::error::ErrorKind;
    use std::io::Write;

    #[test]
    fn test_installed_format() {
        let secret = ClientSecret::from_json(
            r#"{"installed":{"client_id":"123.apps.googleusercontent.com","project_id":"demo",
            "auth_uri":"https://accounts.google.com/o/oauth2/auth","token_uri":"https://oauth2.googleapis.com/token",
            "client_secret":"shh","redirect_uris":["http://localhost"]}}"#,
        )
        .unwrap();

        assert_eq!(secret.client_id, "123.apps.googleusercontent.com");
        assert_eq!(secret.client_secret, "shh");
        assert_eq!(secret.auth_uri, "https://accounts.google.com/o/oauth2/auth");
    }

    #[test]
    fn test_flat_format_uses_google_endpoints() {
        let secret = ClientSecret::from_json(r#"{"client_id":"id","client_secret":"secret"}"#).unwrap();
        assert_eq!(secret.auth_uri, GOOGLE_AUTH_URL);
        assert_eq!(secret.token_uri, GOOGLE_TOKEN_URL);
    }

    #[test]
    fn test_invalid_credentials() {
        let err = ClientSecret::from_json(r#"{"something":"else"}"#).unwrap_err();
        assert_eq!(err.kind(), ErrorKind::Authorization);

        let err = ClientSecret::from_json("not json").unwrap_err();
        assert_eq!(err.kind(), ErrorKind::Authorization);
    }

    #[test]
    fn test_load_from_file() {
        let mut file = tempfile::NamedTempFile::new().unwrap();
        write!(file, r#"{{"web":{{"client_id":"web-id","client_secret":"web-secret"}}}}"#).unwrap();

        let source = CredentialSource::File(file.path().to_path_buf());
        let secret = source.load().unwrap();
        assert_eq!(secret.client_id, "web-id");
    }

    #[test]
    fn test_missing_file_is_authorization_error() {
        let source = CredentialSource::File(PathBuf::from("/nonexistent/credentials.json"));
        let err = source.load().unwrap_err();
        assert_eq!(err.kind(), ErrorKind::Authorization);
        assert!(err.to_string().contains("/nonexistent/credentials.json"));
    }
}
