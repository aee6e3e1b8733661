//! Credentials file loading.
//!
//! The credentials file is located through `GOOGLE_APPLICATION_CREDENTIALS`
//! and must contain at least a `project_id`. Service-account files also
//! carry the key material used by [`crate::auth::ServiceAccountTokens`].

use std::fs;
use std::path::{Path, PathBuf};

use serde::Deserialize;
use tracing::debug;

/// Environment variable naming the credentials file.
pub const CREDENTIALS_ENV: &str = "GOOGLE_APPLICATION_CREDENTIALS";

/// Token endpoint used when the file does not name one.
pub const DEFAULT_TOKEN_URI: &str = "https://oauth2.googleapis.com/token";

/// Startup configuration errors. All of them are fatal.
#[derive(Debug, thiserror::Error)]
pub enum ConfigError {
    #[error("{0} env variable is not set")]
    EnvNotSet(String),
    #[error("cannot read {}: {source}", path.display())]
    Io {
        path: PathBuf,
        source: std::io::Error,
    },
    #[error("invalid credentials file {}: {message}", path.display())]
    Parse { path: PathBuf, message: String },
    #[error("credentials file is missing field `{0}`")]
    MissingField(&'static str),
}

/// Parsed credentials file.
#[derive(Debug, Clone, Deserialize)]
pub struct Credentials {
    /// Project whose inventory is collected.
    pub project_id: String,
    #[serde(default)]
    pub client_email: Option<String>,
    #[serde(default)]
    pub private_key: Option<String>,
    #[serde(default)]
    pub private_key_id: Option<String>,
    #[serde(default)]
    pub token_uri: Option<String>,
}

impl Credentials {
    /// Loads the file named by `GOOGLE_APPLICATION_CREDENTIALS`.
    pub fn from_env() -> Result<Self, ConfigError> {
        Self::from_env_var(CREDENTIALS_ENV)
    }

    /// Loads the file named by the environment variable `var`.
    pub fn from_env_var(var: &str) -> Result<Self, ConfigError> {
        let path = std::env::var_os(var)
            .filter(|p| !p.is_empty())
            .ok_or_else(|| ConfigError::EnvNotSet(var.to_string()))?;
        Self::from_path(path)
    }

    /// Loads a credentials file.
    pub fn from_path(path: impl AsRef<Path>) -> Result<Self, ConfigError> {
        let path = path.as_ref();
        let content = fs::read_to_string(path).map_err(|source| ConfigError::Io {
            path: path.to_path_buf(),
            source,
        })?;
        let creds = Self::parse(&content).map_err(|e| match e {
            ConfigError::Parse { message, .. } => ConfigError::Parse {
                path: path.to_path_buf(),
                message,
            },
            other => other,
        })?;
        debug!(path = %path.display(), project = %creds.project_id, "credentials loaded");
        Ok(creds)
    }

    /// Parses credentials JSON.
    pub fn parse(content: &str) -> Result<Self, ConfigError> {
        let value: serde_json::Value =
            serde_json::from_str(content).map_err(|e| ConfigError::Parse {
                path: PathBuf::new(),
                message: e.to_string(),
            })?;
        if value.get("project_id").and_then(|v| v.as_str()).is_none() {
            return Err(ConfigError::MissingField("project_id"));
        }
        serde_json::from_value(value).map_err(|e| ConfigError::Parse {
            path: PathBuf::new(),
            message: e.to_string(),
        })
    }

    /// Returns true if the file carries service-account key material.
    pub fn is_service_account(&self) -> bool {
        self.client_email.is_some() && self.private_key.is_some()
    }

    /// Token endpoint, defaulting to Google's OAuth2 endpoint.
    pub fn token_uri(&self) -> &str {
        self.token_uri.as_deref().unwrap_or(DEFAULT_TOKEN_URI)
    }
}
