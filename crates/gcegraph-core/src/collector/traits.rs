//! Page source abstraction for aggregated-list endpoints.
//!
//! The `PageSource` trait decouples pagination from transport, so the
//! `Pager` can be driven by the real Compute API or by scripted pages.

use std::collections::BTreeMap;
use std::fmt;

use serde::Deserialize;

/// Key the provider uses for the "no resources in this scope" pseudo-entry.
pub const WARNING_KEY: &str = "warning";

/// Resource kinds with an aggregated-list endpoint.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord)]
pub enum ResourceKind {
    Instances,
    MachineTypes,
    Disks,
}

impl ResourceKind {
    /// Path segment after `/projects/{project}/aggregated/`.
    pub fn path(self) -> &'static str {
        match self {
            ResourceKind::Instances => "instances",
            ResourceKind::MachineTypes => "machineTypes",
            ResourceKind::Disks => "disks",
        }
    }

    /// Key holding the resource array inside each scoped list.
    ///
    /// Matches the endpoint path for every kind the Compute API aggregates.
    pub fn items_key(self) -> &'static str {
        self.path()
    }
}

impl fmt::Display for ResourceKind {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.path())
    }
}

/// Error returned by page sources.
#[derive(Debug, thiserror::Error)]
pub enum CollectError {
    /// Connection, TLS or timeout failure.
    #[error("transport error: {0}")]
    Transport(String),
    /// Non-success HTTP status from the provider.
    #[error("HTTP {status}: {message}")]
    Http { status: u16, message: String },
    /// Response body did not match the aggregated-list shape.
    #[error("decode error: {0}")]
    Decode(String),
    /// Access token could not be obtained.
    #[error("auth error: {0}")]
    Auth(String),
}

/// One scope (zone or region) of an aggregated-list page.
///
/// Either carries the resource array under the kind's items key, or only a
/// `warning` object when the scope has nothing to report.
#[derive(Debug, Clone, Default, Deserialize)]
pub struct ScopedList {
    #[serde(flatten)]
    pub entries: BTreeMap<String, serde_json::Value>,
}

impl ScopedList {
    /// Returns true if the scope holds only a warning pseudo-entry.
    pub fn is_warning_only(&self) -> bool {
        self.entries.keys().all(|k| k == WARNING_KEY)
    }

    /// Resource entries stored under `key`, skipping the warning pseudo-entry.
    pub fn resources(&self, key: &str) -> Option<&Vec<serde_json::Value>> {
        if key == WARNING_KEY {
            return None;
        }
        self.entries.get(key).and_then(|v| v.as_array())
    }
}

/// One page of an aggregated-list response.
#[derive(Debug, Clone, Default, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct AggregatedPage {
    /// Scope name (e.g. `zones/us-central1-a`) to scoped list.
    #[serde(default)]
    pub items: BTreeMap<String, ScopedList>,
    /// Continuation token; absent or empty on the last page.
    #[serde(default)]
    pub next_page_token: Option<String>,
}

impl AggregatedPage {
    /// Continuation token, normalizing empty strings to `None`.
    pub fn continuation(&self) -> Option<&str> {
        self.next_page_token.as_deref().filter(|t| !t.is_empty())
    }
}

/// Fetches single pages of an aggregated list.
///
/// Each call is one provider request; implementations must not retry.
pub trait PageSource {
    fn fetch_page(
        &self,
        kind: ResourceKind,
        project: &str,
        page_token: Option<&str>,
    ) -> Result<AggregatedPage, CollectError>;
}

impl<S: PageSource + ?Sized> PageSource for &S {
    fn fetch_page(
        &self,
        kind: ResourceKind,
        project: &str,
        page_token: Option<&str>,
    ) -> Result<AggregatedPage, CollectError> {
        (**self).fetch_page(kind, project, page_token)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_page_deserializes_warning_scope() {
        let page: AggregatedPage = serde_json::from_str(
            r#"{
                "items": {
                    "zones/us-central1-a": {"instances": [{"name": "a"}]},
                    "zones/asia-east1-b": {"warning": {"code": "NO_RESULTS_ON_PAGE"}}
                },
                "nextPageToken": "abc"
            }"#,
        )
        .unwrap();

        assert_eq!(page.continuation(), Some("abc"));
        assert!(page.items["zones/asia-east1-b"].is_warning_only());
        assert!(!page.items["zones/us-central1-a"].is_warning_only());
        assert_eq!(
            page.items["zones/us-central1-a"]
                .resources("instances")
                .map(Vec::len),
            Some(1)
        );
        assert!(
            page.items["zones/asia-east1-b"]
                .resources("warning")
                .is_none()
        );
    }

    #[test]
    fn test_empty_token_is_last_page() {
        let page: AggregatedPage =
            serde_json::from_str(r#"{"items": {}, "nextPageToken": ""}"#).unwrap();
        assert!(page.continuation().is_none());
    }

    #[test]
    fn test_resource_kind_paths() {
        assert_eq!(ResourceKind::Instances.path(), "instances");
        assert_eq!(ResourceKind::MachineTypes.items_key(), "machineTypes");
        assert_eq!(ResourceKind::Disks.to_string(), "disks");
    }
}
