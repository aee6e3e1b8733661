//! In-memory page source.
//!
//! `MockPages` serves pre-built aggregated-list pages per resource kind and
//! chains them with synthetic continuation tokens (`page-1`, `page-2`, ...).

use std::cell::RefCell;
use std::collections::HashMap;

use crate::collector::traits::{AggregatedPage, CollectError, PageSource, ResourceKind};

/// Scripted page source for tests.
#[derive(Debug, Default)]
pub struct MockPages {
    /// Raw `items` objects per kind, in page order.
    pages: HashMap<ResourceKind, Vec<serde_json::Value>>,
    /// Errors to return instead of the page at a given index (returned once).
    failures: RefCell<HashMap<(ResourceKind, usize), CollectError>>,
    /// Tokens passed to `fetch_page`, per kind.
    requests: RefCell<HashMap<ResourceKind, Vec<Option<String>>>>,
}

impl MockPages {
    /// Creates a source with no pages.
    ///
    /// Kinds without pages answer with a single empty page.
    pub fn new() -> Self {
        Self::default()
    }

    /// Appends a page whose `items` object is `items`.
    pub fn push_page(&mut self, kind: ResourceKind, items: serde_json::Value) {
        self.pages.entry(kind).or_default().push(items);
    }

    /// Makes the request for page `index` (0-based) of `kind` fail with `err`.
    pub fn fail_at(&mut self, kind: ResourceKind, index: usize, err: CollectError) {
        self.failures.get_mut().insert((kind, index), err);
    }

    /// Number of `fetch_page` calls made for `kind`.
    pub fn calls(&self, kind: ResourceKind) -> usize {
        self.requests.borrow().get(&kind).map_or(0, Vec::len)
    }

    /// Page tokens requested for `kind`, in call order.
    pub fn requested_tokens(&self, kind: ResourceKind) -> Vec<Option<String>> {
        self.requests
            .borrow()
            .get(&kind)
            .cloned()
            .unwrap_or_default()
    }

    fn page_index(token: Option<&str>) -> Result<usize, CollectError> {
        match token {
            None => Ok(0),
            Some(t) => t
                .strip_prefix("page-")
                .and_then(|n| n.parse().ok())
                .ok_or_else(|| CollectError::Http {
                    status: 400,
                    message: format!("invalid page token {t:?}"),
                }),
        }
    }
}

impl PageSource for MockPages {
    fn fetch_page(
        &self,
        kind: ResourceKind,
        _project: &str,
        page_token: Option<&str>,
    ) -> Result<AggregatedPage, CollectError> {
        self.requests
            .borrow_mut()
            .entry(kind)
            .or_default()
            .push(page_token.map(str::to_string));

        let index = Self::page_index(page_token)?;
        if let Some(err) = self.failures.borrow_mut().remove(&(kind, index)) {
            return Err(err);
        }

        let pages = self.pages.get(&kind).map(Vec::as_slice).unwrap_or(&[]);
        if pages.is_empty() && index == 0 {
            return Ok(AggregatedPage::default());
        }
        let items = pages.get(index).ok_or_else(|| CollectError::Http {
            status: 400,
            message: format!("no page {index} for {kind}"),
        })?;

        let mut page = AggregatedPage {
            items: serde_json::from_value(items.clone())
                .map_err(|e| CollectError::Decode(e.to_string()))?,
            next_page_token: None,
        };
        if index + 1 < pages.len() {
            page.next_page_token = Some(format!("page-{}", index + 1));
        }
        Ok(page)
    }
}
