//! Lazy iteration over aggregated-list pages.

use std::marker::PhantomData;

use serde::de::DeserializeOwned;
use tracing::{debug, trace};

use super::traits::{CollectError, PageSource, ResourceKind};

#[derive(Debug, Clone, PartialEq, Eq)]
enum Cursor {
    /// First page not requested yet.
    Start,
    /// Next page to request.
    Token(String),
    /// Last page seen or an error was returned.
    Done,
}

/// Iterates one resource kind across all pages of an aggregated list.
///
/// Yields one batch per page with every non-warning entry of that page.
/// The pager is single-pass: once exhausted (or after an error) it yields
/// nothing more, and a fresh collection needs a new `Pager`.
pub struct Pager<'a, S: PageSource, T> {
    source: &'a S,
    kind: ResourceKind,
    project: &'a str,
    cursor: Cursor,
    pages: usize,
    _item: PhantomData<fn() -> T>,
}

impl<'a, S: PageSource, T: DeserializeOwned> Pager<'a, S, T> {
    pub fn new(source: &'a S, kind: ResourceKind, project: &'a str) -> Self {
        Self {
            source,
            kind,
            project,
            cursor: Cursor::Start,
            pages: 0,
            _item: PhantomData,
        }
    }

    /// Returns true while another page can be requested.
    pub fn has_more_pages(&self) -> bool {
        self.cursor != Cursor::Done
    }

    /// Number of pages fetched so far.
    pub fn pages_fetched(&self) -> usize {
        self.pages
    }

    /// Collects every batch into one vector, stopping at the first error.
    pub fn drain(&mut self) -> Result<Vec<T>, CollectError> {
        let mut all = Vec::new();
        for batch in self.by_ref() {
            all.extend(batch?);
        }
        debug!(kind = %self.kind, pages = self.pages, entries = all.len(), "collection drained");
        Ok(all)
    }

    fn fetch_next(&mut self) -> Result<Vec<T>, CollectError> {
        let token = match &self.cursor {
            Cursor::Start => None,
            Cursor::Token(t) => Some(t.as_str()),
            Cursor::Done => return Ok(Vec::new()),
        };

        let page = self.source.fetch_page(self.kind, self.project, token)?;
        self.pages += 1;

        let mut batch = Vec::new();
        for (scope, list) in &page.items {
            if list.is_warning_only() {
                trace!(kind = %self.kind, scope, "warning-only scope skipped");
                continue;
            }
            let Some(entries) = list.resources(self.kind.items_key()) else {
                trace!(kind = %self.kind, scope, "scope has no resources");
                continue;
            };
            for entry in entries {
                let item = T::deserialize(entry).map_err(|e| {
                    CollectError::Decode(format!("{} entry in {}: {}", self.kind, scope, e))
                })?;
                batch.push(item);
            }
        }

        self.cursor = match page.continuation() {
            Some(next) => Cursor::Token(next.to_string()),
            None => Cursor::Done,
        };
        trace!(kind = %self.kind, page = self.pages, entries = batch.len(), "page fetched");
        Ok(batch)
    }
}

impl<S: PageSource, T: DeserializeOwned> Iterator for Pager<'_, S, T> {
    type Item = Result<Vec<T>, CollectError>;

    fn next(&mut self) -> Option<Self::Item> {
        if !self.has_more_pages() {
            return None;
        }
        let result = self.fetch_next();
        if result.is_err() {
            self.cursor = Cursor::Done;
        }
        Some(result)
    }
}
