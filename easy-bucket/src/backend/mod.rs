//! Storage primitives the bucket client is built on
//!
//! [`ObjectStore`] is the seam between [`crate::BucketClient`] and the wire:
//! [`S3ObjectStore`] talks to any S3-compatible endpoint through the AWS SDK,
//! and an in-memory implementation is available for tests behind the
//! `test-utils` feature.

mod s3;

#[cfg(any(test, feature = "test-utils"))]
pub mod memory;

use aws_sdk_s3::presigning::PresigningConfig;
use chrono::{DateTime, Utc};

pub use s3::S3ObjectStore;

use crate::{BucketResult, ListQuery};

/// An object as reported by a listing
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ObjectSummary {
    /// Object key
    pub key: String,
    /// Size in bytes, if reported
    pub size: Option<i64>,
    /// Last modification time, if reported
    pub last_modified: Option<DateTime<Utc>>,
    /// Entity tag, if reported
    pub e_tag: Option<String>,
    /// Storage class, if reported
    pub storage_class: Option<String>,
}

impl ObjectSummary {
    /// Creates a summary carrying only a key
    #[must_use]
    pub fn new(key: impl Into<String>) -> Self {
        Self {
            key: key.into(),
            size: None,
            last_modified: None,
            e_tag: None,
            storage_class: None,
        }
    }
}

/// One raw page of a listing, in the store's key order
#[derive(Debug, Clone, Default)]
pub struct ListedObjects {
    /// Objects in this page
    pub objects: Vec<ObjectSummary>,
    /// Whether the store holds more matching keys after this page
    pub is_truncated: bool,
}

/// Storage operations against a single endpoint
#[async_trait::async_trait]
pub trait ObjectStore: Send + Sync {
    /// Writes `body` under `key`, replacing any existing object
    async fn put_object(
        &self,
        bucket: &str,
        key: &str,
        body: Vec<u8>,
        content_type: Option<&str>,
    ) -> BucketResult<()>;

    /// Lists one page of keys matching `query`
    async fn list_objects(&self, bucket: &str, query: &ListQuery) -> BucketResult<ListedObjects>;

    /// Removes all `keys` in one request
    async fn delete_objects(&self, bucket: &str, keys: Vec<String>) -> BucketResult<()>;

    /// Removes a single key; a missing key is not an error
    async fn delete_object(&self, bucket: &str, key: &str) -> BucketResult<()>;

    /// Produces a signed GET URL for `key`
    async fn presign_get(
        &self,
        bucket: &str,
        key: &str,
        presigning: PresigningConfig,
    ) -> BucketResult<String>;
}
