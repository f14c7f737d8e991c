//! Cursor-based listing pages

use std::fmt;

use crate::{BucketClient, BucketResult, ObjectSummary};

/// Parameters of a single list request
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct ListQuery {
    /// Page size cap; `None` leaves it to the backend
    pub max_results: Option<i32>,
    /// Only keys starting with this prefix
    pub prefix: Option<String>,
    /// Resume strictly after this key
    pub start_after: Option<String>,
}

impl ListQuery {
    /// A query for the first page of the whole bucket
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    /// Caps the number of entries per page
    #[must_use]
    pub const fn max_results(mut self, max_results: i32) -> Self {
        self.max_results = Some(max_results);
        self
    }

    /// Restricts the listing to keys starting with `prefix`
    #[must_use]
    pub fn prefix(mut self, prefix: impl Into<String>) -> Self {
        self.prefix = Some(prefix.into());
        self
    }

    /// Starts the listing strictly after `key`
    #[must_use]
    pub fn start_after(mut self, key: impl Into<String>) -> Self {
        self.start_after = Some(key.into());
        self
    }

    /// The query for the page following one that ended at `last_key`
    ///
    /// Without a last key the cursor stays where it was.
    pub(crate) fn next_page(&self, last_key: Option<&str>) -> Self {
        Self {
            start_after: last_key.map(str::to_string).or_else(|| self.start_after.clone()),
            ..self.clone()
        }
    }
}

/// One page of a listing
#[derive(Debug)]
pub struct ListPage {
    /// Objects in this page, in key order
    pub entries: Vec<ObjectSummary>,
    /// Continuation for the next page; `None` when the backend reported no more keys
    pub more: Option<MorePages>,
}

impl ListPage {
    /// Keys of the entries in this page
    #[must_use]
    pub fn keys(&self) -> Vec<&str> {
        self.entries.iter().map(|entry| entry.key.as_str()).collect()
    }
}

/// Lazy continuation of a listing
///
/// Holds only the client and the cursor for the next page. Every call to
/// [`MorePages::fetch`] issues a fresh request, so the same continuation can
/// be fetched more than once.
#[derive(Clone)]
pub struct MorePages {
    client: BucketClient,
    query: ListQuery,
}

impl fmt::Debug for MorePages {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("MorePages")
            .field("bucket", &self.client.bucket_name())
            .field("query", &self.query)
            .finish()
    }
}

impl MorePages {
    pub(crate) const fn new(client: BucketClient, query: ListQuery) -> Self {
        Self { client, query }
    }

    /// The key the next page starts after
    #[must_use]
    pub fn start_after(&self) -> Option<&str> {
        self.query.start_after.as_deref()
    }

    /// The query the next page will be listed with
    #[must_use]
    pub const fn query(&self) -> &ListQuery {
        &self.query
    }

    /// Fetches the next page
    ///
    /// # Errors
    ///
    /// Returns the `BucketError` of the underlying list request
    pub async fn fetch(&self) -> BucketResult<ListPage> {
        self.client.list(self.query.clone()).await
    }
}
