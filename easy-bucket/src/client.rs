//! Bucket client implementation

use std::{fmt, sync::Arc, time::Duration};

use aws_sdk_s3::presigning::PresigningConfig;
use chrono::{DateTime, Utc};
use reqwest_middleware::ClientWithMiddleware;
use tracing::{debug, error, info};

use crate::{
    backend::{ObjectStore, S3ObjectStore},
    fetch, BucketConfig, BucketError, BucketResult, ListPage, ListQuery, MorePages,
};

/// Default lifetime of a share URL
pub const DEFAULT_SHARE_EXPIRY_SECS: u64 = 60 * 60;

/// Keys listed and deleted per round of [`BucketClient::delete_by_prefix`]
pub const DELETE_BATCH_SIZE: i32 = 200;

/// Presigned read URL with expiration information
#[derive(Debug, Clone)]
pub struct SharedUrl {
    /// The presigned URL for GET requests
    pub url: String,
    /// UTC timestamp when the URL expires
    pub expires_at: DateTime<Utc>,
}

/// Outcome of a prefix sweep
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct PrefixDeletion {
    /// Number of list+delete rounds that removed at least one key
    pub pages: usize,
    /// Number of keys removed
    pub deleted: usize,
}

/// Client for a single bucket
///
/// Configuration is fixed at construction. Clones share the underlying
/// storage and HTTP clients, and every operation is an independent request,
/// so one client can serve concurrent callers.
#[derive(Clone)]
pub struct BucketClient {
    store: Arc<dyn ObjectStore>,
    http_client: ClientWithMiddleware,
    bucket_name: String,
    public_base_url: String,
}

impl fmt::Debug for BucketClient {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("BucketClient")
            .field("bucket_name", &self.bucket_name)
            .field("public_base_url", &self.public_base_url)
            .finish_non_exhaustive()
    }
}

impl BucketClient {
    /// Creates a client for `bucket_name` on the configured endpoint
    ///
    /// # Errors
    ///
    /// Returns `BucketError::ConfigError` if the endpoint is not a valid URL
    /// or the HTTP client fails to be created
    pub fn new(bucket_name: impl Into<String>, config: &BucketConfig) -> BucketResult<Self> {
        let store = Arc::new(S3ObjectStore::from_config(config));
        let client = Self::with_store(bucket_name, config, store)?;

        info!(
            bucket = %client.bucket_name,
            endpoint = %config.endpoint,
            region = %config.region,
            "Initialized bucket client"
        );

        Ok(client)
    }

    /// Creates a client that talks to `store` instead of building an S3 client
    ///
    /// # Errors
    ///
    /// Returns `BucketError::ConfigError` if the endpoint is not a valid URL
    /// or the HTTP client fails to be created
    pub fn with_store(
        bucket_name: impl Into<String>,
        config: &BucketConfig,
        store: Arc<dyn ObjectStore>,
    ) -> BucketResult<Self> {
        let bucket_name = bucket_name.into();
        let endpoint = config.endpoint_url()?;

        // Virtual-hosted style: the bucket becomes a subdomain of the endpoint host
        let public_base_url = format!(
            "{}://{}.{}{}",
            endpoint.scheme(),
            bucket_name,
            endpoint.host_str().unwrap_or_default(),
            endpoint.port().map(|p| format!(":{p}")).unwrap_or_default(),
        );

        Ok(Self {
            store,
            http_client: fetch::http_client()?,
            bucket_name,
            public_base_url,
        })
    }

    /// Name of the bucket this client operates on
    #[must_use]
    pub fn bucket_name(&self) -> &str {
        &self.bucket_name
    }

    /// Public URL of `key`: `scheme://{bucket}.{host}/{key}`
    #[must_use]
    pub fn object_url(&self, key: &str) -> String {
        format!("{}/{key}", self.public_base_url)
    }

    /// Writes `content` under `key`, overwriting any existing object
    ///
    /// # Returns
    ///
    /// The public URL of the object
    ///
    /// # Errors
    ///
    /// Returns the `BucketError` of the failed write, unchanged
    pub async fn save(
        &self,
        key: &str,
        content: impl Into<Vec<u8>> + Send,
        content_type: Option<&str>,
    ) -> BucketResult<String> {
        self.store
            .put_object(&self.bucket_name, key, content.into(), content_type)
            .await?;

        debug!(bucket = %self.bucket_name, key, "Saved object");
        Ok(self.object_url(key))
    }

    /// Mirrors a remote file into the bucket root
    ///
    /// # Errors
    ///
    /// See [`BucketClient::download_to`]
    pub async fn download(&self, url: &str) -> BucketResult<String> {
        self.download_to(url, "").await
    }

    /// Mirrors a remote file into the bucket under `directory`
    ///
    /// The object key is `directory` followed by a generated
    /// `<id>.<extension>` name, the extension derived from the response's
    /// content type (`undefined` when it maps to none). `directory` is used
    /// verbatim, so it should end in `/`.
    ///
    /// # Returns
    ///
    /// The public URL of the saved object
    ///
    /// # Errors
    ///
    /// Returns `BucketError::Fetch` if the GET fails or returns an error status
    /// Returns the `save` error if writing the object fails
    pub async fn download_to(&self, url: &str, directory: &str) -> BucketResult<String> {
        let file = fetch::fetch(&self.http_client, url).await?;
        let key = format!("{directory}{}", file.file_name);

        self.save(&key, file.body, file.content_type.as_deref())
            .await
    }

    /// Lists one page of objects
    ///
    /// `more` is set exactly when the backend reports further keys; fetching
    /// it resumes strictly after the last key of this page. An empty page
    /// ends iteration.
    ///
    /// # Errors
    ///
    /// Returns the `BucketError` of the failed list request, unchanged
    pub async fn list(&self, query: ListQuery) -> BucketResult<ListPage> {
        let listed = self.store.list_objects(&self.bucket_name, &query).await?;

        let more = listed.is_truncated.then(|| {
            let last_key = listed.objects.last().map(|entry| entry.key.as_str());
            MorePages::new(self.clone(), query.next_page(last_key))
        });

        Ok(ListPage {
            entries: listed.objects,
            more,
        })
    }

    /// Deletes a single object
    ///
    /// Deleting a key that does not exist succeeds.
    ///
    /// # Errors
    ///
    /// Returns the `BucketError` of the failed delete, unchanged
    pub async fn delete(&self, key: &str) -> BucketResult<()> {
        self.store.delete_object(&self.bucket_name, key).await?;

        debug!(bucket = %self.bucket_name, key, "Deleted object");
        Ok(())
    }

    /// Deletes every object whose key starts with `prefix`
    ///
    /// Sweeps in rounds of [`DELETE_BATCH_SIZE`]: list a batch after the
    /// cursor, bulk-delete it, and continue while the backend reports more
    /// keys. An empty prefix deletes the whole bucket.
    ///
    /// A failed round aborts the sweep; keys removed by earlier rounds stay
    /// removed. Keys written under `prefix` while the sweep runs may or may
    /// not be deleted.
    ///
    /// # Errors
    ///
    /// Returns the `BucketError` of the first failed list or delete request
    pub async fn delete_by_prefix(&self, prefix: &str) -> BucketResult<PrefixDeletion> {
        let mut query = ListQuery::new()
            .max_results(DELETE_BATCH_SIZE)
            .prefix(prefix);
        let mut summary = PrefixDeletion::default();

        loop {
            let ListPage { entries, more } = self.list(query).await?;
            if entries.is_empty() {
                break;
            }

            let page = summary.pages + 1;
            info!(
                bucket = %self.bucket_name,
                prefix,
                page,
                page_size = DELETE_BATCH_SIZE,
                "Deleting page of objects"
            );

            let keys: Vec<String> = entries.into_iter().map(|entry| entry.key).collect();
            let count = keys.len();

            self.store
                .delete_objects(&self.bucket_name, keys)
                .await
                .inspect_err(|e| {
                    error!(
                        bucket = %self.bucket_name,
                        prefix,
                        page,
                        deleted = summary.deleted,
                        error = %e,
                        "Aborting prefix deletion"
                    );
                })?;

            summary.pages = page;
            summary.deleted += count;

            match more {
                Some(next) => query = next.query().clone(),
                None => break,
            }
        }

        info!(
            bucket = %self.bucket_name,
            prefix,
            pages = summary.pages,
            deleted = summary.deleted,
            "Prefix deletion finished"
        );

        Ok(summary)
    }

    /// Generates a share URL valid for [`DEFAULT_SHARE_EXPIRY_SECS`]
    ///
    /// # Errors
    ///
    /// See [`BucketClient::get_share_url_with_expiry`]
    pub async fn get_share_url(&self, key: &str) -> BucketResult<SharedUrl> {
        self.get_share_url_with_expiry(key, DEFAULT_SHARE_EXPIRY_SECS)
            .await
    }

    /// Generates a presigned GET URL for `key`, valid for `expires_secs`
    ///
    /// # Errors
    ///
    /// Returns `BucketError::ConfigError` if the expiry is zero or longer than
    /// the signer allows (one week)
    /// Returns `BucketError::S3Error` if presigned URL generation fails
    pub async fn get_share_url_with_expiry(
        &self,
        key: &str,
        expires_secs: u64,
    ) -> BucketResult<SharedUrl> {
        let expires_in = Duration::from_secs(expires_secs);
        let presigning = PresigningConfig::expires_in(expires_in).map_err(|e| {
            BucketError::ConfigError(format!("Failed to create presigning config: {e}"))
        })?;

        let url = self
            .store
            .presign_get(&self.bucket_name, key, presigning)
            .await?;
        let expires_at = Utc::now() + expires_in;

        debug!(
            bucket = %self.bucket_name,
            key,
            %expires_at,
            "Generated share URL"
        );

        Ok(SharedUrl { url, expires_at })
    }
}
