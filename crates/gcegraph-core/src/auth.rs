//! OAuth2 access tokens for the Compute API.
//!
//! Two sources are supported: a pre-issued token (e.g. from
//! `gcloud auth print-access-token`) and the service-account JWT bearer
//! flow, where a claim set signed with the account's RSA key is exchanged
//! at the token endpoint.

use std::sync::Mutex;
use std::time::Duration;

use chrono::Utc;
use jsonwebtoken::{Algorithm, EncodingKey, Header};
use reqwest::blocking::Client;
use serde::{Deserialize, Serialize};
use tracing::{debug, info};

use crate::config::Credentials;

/// Read-only Compute Engine scope.
pub const COMPUTE_READONLY_SCOPE: &str = "https://www.googleapis.com/auth/compute.readonly";

/// Lifetime requested for the signed assertion (the maximum Google accepts).
const ASSERTION_LIFETIME_SECS: i64 = 3600;

/// Tokens are refreshed this long before they expire.
const EXPIRY_MARGIN_SECS: i64 = 60;

#[derive(Debug, thiserror::Error)]
pub enum AuthError {
    #[error("credentials file has no service account key (missing `{0}`)")]
    NotServiceAccount(&'static str),
    #[error("invalid service account key: {0}")]
    InvalidKey(String),
    #[error("token endpoint request failed: {0}")]
    Transport(String),
    #[error("token endpoint returned HTTP {status}: {message}")]
    Rejected { status: u16, message: String },
}

/// Supplies bearer tokens for API requests.
pub trait TokenSource {
    fn access_token(&self) -> Result<String, AuthError>;
}

/// A token obtained out of band.
#[derive(Clone)]
pub struct StaticToken(String);

impl StaticToken {
    pub fn new(token: impl Into<String>) -> Self {
        Self(token.into())
    }
}

impl std::fmt::Debug for StaticToken {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.write_str("StaticToken(..)")
    }
}

impl TokenSource for StaticToken {
    fn access_token(&self) -> Result<String, AuthError> {
        Ok(self.0.clone())
    }
}

/// JWT claim set for the bearer assertion.
#[derive(Debug, Serialize, PartialEq)]
struct AssertionClaims<'a> {
    iss: &'a str,
    scope: &'a str,
    aud: &'a str,
    iat: i64,
    exp: i64,
}

#[derive(Debug, Deserialize)]
struct TokenResponse {
    access_token: String,
    #[serde(default)]
    expires_in: Option<i64>,
}

#[derive(Debug, Clone)]
struct CachedToken {
    token: String,
    expires_at: i64,
}

/// Service-account token source (JWT bearer grant).
pub struct ServiceAccountTokens {
    http: Client,
    client_email: String,
    token_uri: String,
    key_id: Option<String>,
    key: EncodingKey,
    cached: Mutex<Option<CachedToken>>,
}

impl ServiceAccountTokens {
    /// Builds a token source from a service-account credentials file.
    pub fn from_credentials(creds: &Credentials, timeout: Duration) -> Result<Self, AuthError> {
        let client_email = creds
            .client_email
            .clone()
            .ok_or(AuthError::NotServiceAccount("client_email"))?;
        let pem = creds
            .private_key
            .as_deref()
            .ok_or(AuthError::NotServiceAccount("private_key"))?;
        let key = EncodingKey::from_rsa_pem(pem.as_bytes())
            .map_err(|e| AuthError::InvalidKey(e.to_string()))?;
        let http = Client::builder()
            .timeout(timeout)
            .build()
            .map_err(|e| AuthError::Transport(e.to_string()))?;

        Ok(Self {
            http,
            client_email,
            token_uri: creds.token_uri().to_string(),
            key_id: creds.private_key_id.clone(),
            key,
            cached: Mutex::new(None),
        })
    }

    fn claims(&self, now: i64) -> AssertionClaims<'_> {
        AssertionClaims {
            iss: &self.client_email,
            scope: COMPUTE_READONLY_SCOPE,
            aud: &self.token_uri,
            iat: now,
            exp: now + ASSERTION_LIFETIME_SECS,
        }
    }

    fn exchange(&self, now: i64) -> Result<CachedToken, AuthError> {
        let mut header = Header::new(Algorithm::RS256);
        header.kid = self.key_id.clone();
        let assertion = jsonwebtoken::encode(&header, &self.claims(now), &self.key)
            .map_err(|e| AuthError::InvalidKey(e.to_string()))?;

        let response = self
            .http
            .post(&self.token_uri)
            .form(&[
                ("grant_type", "urn:ietf:params:oauth:grant-type:jwt-bearer"),
                ("assertion", assertion.as_str()),
            ])
            .send()
            .map_err(|e| AuthError::Transport(e.to_string()))?;

        let status = response.status();
        let body = response
            .text()
            .map_err(|e| AuthError::Transport(e.to_string()))?;
        if !status.is_success() {
            return Err(AuthError::Rejected {
                status: status.as_u16(),
                message: body.trim().to_string(),
            });
        }
        parse_token_response(&body, now)
    }
}

impl TokenSource for ServiceAccountTokens {
    fn access_token(&self) -> Result<String, AuthError> {
        let now = Utc::now().timestamp();
        let mut cached = self
            .cached
            .lock()
            .unwrap_or_else(|poisoned| poisoned.into_inner());

        if let Some(tok) = cached.as_ref()
            && tok.expires_at - EXPIRY_MARGIN_SECS > now
        {
            return Ok(tok.token.clone());
        }

        debug!(account = %self.client_email, "requesting access token");
        let fresh = self.exchange(now)?;
        info!(account = %self.client_email, expires_in = fresh.expires_at - now, "access token obtained");
        let token = fresh.token.clone();
        *cached = Some(fresh);
        Ok(token)
    }
}

fn parse_token_response(body: &str, now: i64) -> Result<CachedToken, AuthError> {
    let parsed: TokenResponse = serde_json::from_str(body).map_err(|e| AuthError::Rejected {
        status: 200,
        message: format!("unexpected token response: {e}"),
    })?;
    Ok(CachedToken {
        token: parsed.access_token,
        expires_at: now + parsed.expires_in.unwrap_or(ASSERTION_LIFETIME_SECS),
    })
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_static_token() {
        let t = StaticToken::new("ya29.abc");
        assert_eq!(t.access_token().unwrap(), "ya29.abc");
        assert_eq!(format!("{t:?}"), "StaticToken(..)");
    }

    #[test]
    fn test_parse_token_response() {
        let tok = parse_token_response(
            r#"{"access_token": "ya29.x", "expires_in": 3599, "token_type": "Bearer"}"#,
            1_000,
        )
        .unwrap();
        assert_eq!(tok.token, "ya29.x");
        assert_eq!(tok.expires_at, 4_599);
    }

    #[test]
    fn test_parse_token_response_without_expiry() {
        let tok = parse_token_response(r#"{"access_token": "t"}"#, 0).unwrap();
        assert_eq!(tok.expires_at, ASSERTION_LIFETIME_SECS);
    }

    #[test]
    fn test_parse_token_response_rejects_garbage() {
        assert!(matches!(
            parse_token_response("<html>", 0),
            Err(AuthError::Rejected { .. })
        ));
    }

    #[test]
    fn test_credentials_without_key_are_rejected() {
        let creds = Credentials::parse(r#"{"project_id": "p"}"#).unwrap();
        let err = ServiceAccountTokens::from_credentials(&creds, Duration::from_secs(5))
            .err()
            .unwrap();
        assert!(matches!(err, AuthError::NotServiceAccount("client_email")));
    }

    #[test]
    fn test_invalid_pem_is_rejected() {
        let creds = Credentials::parse(
            r#"{"project_id": "p", "client_email": "a@p.iam", "private_key": "not a key"}"#,
        )
        .unwrap();
        let err = ServiceAccountTokens::from_credentials(&creds, Duration::from_secs(5))
            .err()
            .unwrap();
        assert!(matches!(err, AuthError::InvalidKey(_)));
    }
}
