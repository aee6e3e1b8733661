//! Compute Engine REST page source.

use std::time::Duration;

use reqwest::blocking::Client;
use tracing::debug;

use super::traits::{AggregatedPage, CollectError, PageSource, ResourceKind};
use crate::auth::TokenSource;

/// Blocking client for the Compute Engine `aggregated/*` list endpoints.
///
/// Every `fetch_page` is exactly one HTTPS request; failures are returned
/// to the caller without retry.
pub struct GceClient<T: TokenSource> {
    http: Client,
    base_url: String,
    page_size: u32,
    tokens: T,
}

impl<T: TokenSource> GceClient<T> {
    pub const DEFAULT_BASE_URL: &'static str = "https://compute.googleapis.com/compute/v1";
    /// Largest `maxResults` the aggregated list endpoints accept.
    pub const DEFAULT_PAGE_SIZE: u32 = 500;

    /// Creates a client using `tokens` for bearer authentication.
    pub fn new(tokens: T, timeout: Duration) -> Result<Self, CollectError> {
        let http = Client::builder()
            .timeout(timeout)
            .user_agent(concat!("gcegraph/", env!("CARGO_PKG_VERSION")))
            .build()
            .map_err(|e| CollectError::Transport(e.to_string()))?;
        Ok(Self {
            http,
            base_url: Self::DEFAULT_BASE_URL.to_string(),
            page_size: Self::DEFAULT_PAGE_SIZE,
            tokens,
        })
    }

    /// Overrides the API root (e.g. for a proxy or emulator).
    pub fn with_base_url(mut self, base_url: impl Into<String>) -> Self {
        self.base_url = base_url.into().trim_end_matches('/').to_string();
        self
    }

    /// Sets `maxResults` per page.
    pub fn with_page_size(mut self, page_size: u32) -> Self {
        self.page_size = page_size.max(1);
        self
    }

    fn list_url(&self, kind: ResourceKind, project: &str) -> String {
        format!(
            "{}/projects/{}/aggregated/{}",
            self.base_url,
            project,
            kind.path()
        )
    }
}

impl<T: TokenSource> PageSource for GceClient<T> {
    fn fetch_page(
        &self,
        kind: ResourceKind,
        project: &str,
        page_token: Option<&str>,
    ) -> Result<AggregatedPage, CollectError> {
        let token = self
            .tokens
            .access_token()
            .map_err(|e| CollectError::Auth(e.to_string()))?;

        let url = self.list_url(kind, project);
        let mut request = self
            .http
            .get(&url)
            .bearer_auth(token)
            .query(&[("maxResults", self.page_size.to_string())]);
        if let Some(page_token) = page_token {
            request = request.query(&[("pageToken", page_token)]);
        }

        debug!(%kind, project, has_token = page_token.is_some(), "requesting page");
        let response = request
            .send()
            .map_err(|e| CollectError::Transport(e.to_string()))?;
        let status = response.status();
        let body = response
            .text()
            .map_err(|e| CollectError::Transport(e.to_string()))?;

        if !status.is_success() {
            return Err(CollectError::Http {
                status: status.as_u16(),
                message: error_message(&body),
            });
        }

        serde_json::from_str(&body).map_err(|e| CollectError::Decode(format!("{kind}: {e}")))
    }
}

/// Extracts `error.message` from a Google API error body, falling back to
/// the (truncated) raw body.
fn error_message(body: &str) -> String {
    const MAX_RAW: usize = 200;

    serde_json::from_str::<serde_json::Value>(body)
        .ok()
        .and_then(|v| {
            v.get("error")
                .and_then(|e| e.get("message"))
                .and_then(|m| m.as_str())
                .map(str::to_string)
        })
        .unwrap_or_else(|| body.trim().chars().take(MAX_RAW).collect())
}
