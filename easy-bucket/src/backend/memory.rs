//! In-memory object store for tests

use std::{
    collections::{BTreeMap, HashMap},
    sync::{
        atomic::{AtomicUsize, Ordering},
        Mutex, MutexGuard, PoisonError,
    },
};

use aws_sdk_s3::presigning::PresigningConfig;
use chrono::Utc;

use super::{ListedObjects, ObjectStore, ObjectSummary};
use crate::{BucketError, BucketResult, ListQuery};

/// Page size used when a listing does not set one
pub const DEFAULT_MAX_KEYS: usize = 1000;

/// An object held by [`InMemoryObjectStore`]
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct StoredObject {
    /// Object body
    pub body: Vec<u8>,
    /// Content type given at write time
    pub content_type: Option<String>,
}

type Buckets = HashMap<String, BTreeMap<String, StoredObject>>;

/// Object store keeping buckets in a map, ordered by key like S3
///
/// Buckets must be created up front; writing to an unknown bucket fails
/// with `BucketError::NotFound`.
#[derive(Debug, Default)]
pub struct InMemoryObjectStore {
    buckets: Mutex<Buckets>,
    list_calls: AtomicUsize,
    delete_batches: AtomicUsize,
    fail_delete_batch: Mutex<Option<usize>>,
}

impl InMemoryObjectStore {
    /// Creates a store holding one empty bucket
    #[must_use]
    pub fn with_bucket(bucket: &str) -> Self {
        let store = Self::default();
        store.lock().insert(bucket.to_string(), BTreeMap::new());
        store
    }

    fn lock(&self) -> MutexGuard<'_, Buckets> {
        self.buckets.lock().unwrap_or_else(PoisonError::into_inner)
    }

    /// Returns a stored object
    #[must_use]
    pub fn object(&self, bucket: &str, key: &str) -> Option<StoredObject> {
        self.lock().get(bucket)?.get(key).cloned()
    }

    /// Returns every key in a bucket, in order
    #[must_use]
    pub fn keys(&self, bucket: &str) -> Vec<String> {
        self.lock()
            .get(bucket)
            .map(|objects| objects.keys().cloned().collect())
            .unwrap_or_default()
    }

    /// Number of list requests served so far
    #[must_use]
    pub fn list_calls(&self) -> usize {
        self.list_calls.load(Ordering::SeqCst)
    }

    /// Number of bulk delete requests served so far
    #[must_use]
    pub fn delete_batches(&self) -> usize {
        self.delete_batches.load(Ordering::SeqCst)
    }

    /// Makes the `n`th bulk delete (1-based) fail without removing anything
    pub fn fail_delete_batch(&self, n: usize) {
        *self
            .fail_delete_batch
            .lock()
            .unwrap_or_else(PoisonError::into_inner) = Some(n);
    }

    fn no_such_bucket(bucket: &str) -> BucketError {
        BucketError::NotFound(format!("NoSuchBucket: {bucket}"))
    }
}

#[async_trait::async_trait]
impl ObjectStore for InMemoryObjectStore {
    async fn put_object(
        &self,
        bucket: &str,
        key: &str,
        body: Vec<u8>,
        content_type: Option<&str>,
    ) -> BucketResult<()> {
        let mut buckets = self.lock();
        let objects = buckets
            .get_mut(bucket)
            .ok_or_else(|| Self::no_such_bucket(bucket))?;

        objects.insert(
            key.to_string(),
            StoredObject {
                body,
                content_type: content_type.map(str::to_string),
            },
        );
        Ok(())
    }

    async fn list_objects(&self, bucket: &str, query: &ListQuery) -> BucketResult<ListedObjects> {
        self.list_calls.fetch_add(1, Ordering::SeqCst);

        let buckets = self.lock();
        let objects = buckets
            .get(bucket)
            .ok_or_else(|| Self::no_such_bucket(bucket))?;

        let max_keys = query
            .max_results
            .map_or(DEFAULT_MAX_KEYS, |n| usize::try_from(n).unwrap_or(0))
            .min(DEFAULT_MAX_KEYS);
        let prefix = query.prefix.as_deref().unwrap_or_default();
        let start_after = query.start_after.as_deref();

        let mut matching = objects
            .iter()
            .filter(|(key, _)| key.starts_with(prefix))
            .filter(|(key, _)| start_after.map_or(true, |after| key.as_str() > after));

        let page: Vec<ObjectSummary> = matching
            .by_ref()
            .take(max_keys)
            .map(|(key, object)| ObjectSummary {
                size: i64::try_from(object.body.len()).ok(),
                last_modified: Some(Utc::now()),
                ..ObjectSummary::new(key.clone())
            })
            .collect();

        Ok(ListedObjects {
            objects: page,
            is_truncated: matching.next().is_some(),
        })
    }

    async fn delete_objects(&self, bucket: &str, keys: Vec<String>) -> BucketResult<()> {
        let batch = self.delete_batches.fetch_add(1, Ordering::SeqCst) + 1;
        let fail_at = *self
            .fail_delete_batch
            .lock()
            .unwrap_or_else(PoisonError::into_inner);
        if fail_at == Some(batch) {
            return Err(BucketError::UpstreamError(format!(
                "InternalError: bulk delete {batch} failed"
            )));
        }

        let mut buckets = self.lock();
        let objects = buckets
            .get_mut(bucket)
            .ok_or_else(|| Self::no_such_bucket(bucket))?;
        for key in keys {
            objects.remove(&key);
        }
        Ok(())
    }

    async fn delete_object(&self, bucket: &str, key: &str) -> BucketResult<()> {
        let mut buckets = self.lock();
        let objects = buckets
            .get_mut(bucket)
            .ok_or_else(|| Self::no_such_bucket(bucket))?;
        objects.remove(key);
        Ok(())
    }

    async fn presign_get(
        &self,
        bucket: &str,
        key: &str,
        presigning: PresigningConfig,
    ) -> BucketResult<String> {
        Ok(format!(
            "memory://{bucket}/{key}?X-Amz-Expires={}",
            presigning.expires().as_secs()
        ))
    }
}
