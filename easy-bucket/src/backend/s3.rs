//! S3 object store implementation

use aws_sdk_s3::{
    error::{ProvideErrorMetadata, SdkError},
    presigning::PresigningConfig,
    primitives::ByteStream,
    types::{Delete, Error as S3Error, Object, ObjectIdentifier},
    Client,
};
use chrono::DateTime;
use tracing::{debug, error};

use super::{ListedObjects, ObjectStore, ObjectSummary};
use crate::{BucketConfig, BucketError, BucketResult, ListQuery};

/// Object store backed by an S3-compatible endpoint
#[derive(Debug, Clone)]
pub struct S3ObjectStore {
    client: Client,
}

impl S3ObjectStore {
    /// Wraps a pre-configured S3 client
    #[must_use]
    pub const fn new(client: Client) -> Self {
        Self { client }
    }

    /// Builds an S3 client from endpoint, region and static credentials
    #[must_use]
    pub fn from_config(config: &BucketConfig) -> Self {
        Self::new(Client::from_conf(config.s3_client_config()))
    }
}

fn to_summary(object: &Object) -> ObjectSummary {
    ObjectSummary {
        key: object.key().unwrap_or_default().to_string(),
        size: object.size(),
        last_modified: object
            .last_modified()
            .and_then(|t| DateTime::from_timestamp(t.secs(), t.subsec_nanos())),
        e_tag: object.e_tag().map(str::to_string),
        storage_class: object.storage_class().map(|c| c.as_str().to_string()),
    }
}

/// Whether a failed request only reports that the key was already absent
///
/// S3 itself answers 204 for missing keys, some compatible stores answer `NoSuchKey`.
fn is_missing_key<E: ProvideErrorMetadata>(error: &SdkError<E>) -> bool {
    matches!(error, SdkError::ServiceError(service_err) if service_err.err().code() == Some("NoSuchKey"))
}

/// Turns per-key failures of a bulk delete into `BucketError::PartialDelete`
fn check_delete_errors(errors: &[S3Error]) -> BucketResult<()> {
    if errors.is_empty() {
        return Ok(());
    }

    let failed = errors
        .iter()
        .map(|err| {
            format!(
                "{}: {}",
                err.key().unwrap_or_default(),
                err.code().unwrap_or("UnknownError")
            )
        })
        .collect();

    Err(BucketError::PartialDelete { failed })
}

#[async_trait::async_trait]
impl ObjectStore for S3ObjectStore {
    async fn put_object(
        &self,
        bucket: &str,
        key: &str,
        body: Vec<u8>,
        content_type: Option<&str>,
    ) -> BucketResult<()> {
        debug!(bucket, key, size = body.len(), "Putting object");

        self.client
            .put_object()
            .bucket(bucket)
            .key(key)
            .body(ByteStream::from(body))
            .set_content_type(content_type.map(str::to_string))
            .send()
            .await
            .map_err(|e| {
                error!(bucket, key, error = ?e, "S3 put failed");
                BucketError::from(e)
            })?;

        Ok(())
    }

    async fn list_objects(&self, bucket: &str, query: &ListQuery) -> BucketResult<ListedObjects> {
        debug!(bucket, ?query, "Listing objects");

        let output = self
            .client
            .list_objects_v2()
            .bucket(bucket)
            .set_max_keys(query.max_results)
            .set_prefix(query.prefix.clone())
            .set_start_after(query.start_after.clone())
            .send()
            .await
            .map_err(|e| {
                error!(bucket, ?query, error = ?e, "S3 list failed");
                BucketError::from(e)
            })?;

        Ok(ListedObjects {
            objects: output.contents().iter().map(to_summary).collect(),
            is_truncated: output.is_truncated().unwrap_or(false),
        })
    }

    async fn delete_objects(&self, bucket: &str, keys: Vec<String>) -> BucketResult<()> {
        debug!(bucket, count = keys.len(), "Deleting objects");

        let objects = keys
            .into_iter()
            .map(|key| ObjectIdentifier::builder().key(key).build())
            .collect::<Result<Vec<_>, _>>()
            .map_err(|e| BucketError::S3Error(format!("Failed to build delete request: {e}")))?;

        let delete = Delete::builder()
            .set_objects(Some(objects))
            .quiet(true)
            .build()
            .map_err(|e| BucketError::S3Error(format!("Failed to build delete request: {e}")))?;

        let output = self
            .client
            .delete_objects()
            .bucket(bucket)
            .delete(delete)
            .send()
            .await
            .map_err(|e| {
                error!(bucket, error = ?e, "S3 bulk delete failed");
                BucketError::from(e)
            })?;

        check_delete_errors(output.errors()).inspect_err(|e| {
            error!(bucket, error = %e, "S3 bulk delete partially failed");
        })
    }

    async fn delete_object(&self, bucket: &str, key: &str) -> BucketResult<()> {
        debug!(bucket, key, "Deleting object");

        let result = self
            .client
            .delete_object()
            .bucket(bucket)
            .key(key)
            .send()
            .await;

        match result {
            Ok(_) => Ok(()),
            Err(e) if is_missing_key(&e) => {
                debug!(bucket, key, "Object already absent");
                Ok(())
            }
            Err(e) => {
                error!(bucket, key, error = ?e, "S3 delete failed");
                Err(BucketError::from(e))
            }
        }
    }

    async fn presign_get(
        &self,
        bucket: &str,
        key: &str,
        presigning: PresigningConfig,
    ) -> BucketResult<String> {
        debug!(bucket, key, expires_in = ?presigning.expires(), "Presigning GET");

        let presigned = self
            .client
            .get_object()
            .bucket(bucket)
            .key(key)
            .presigned(presigning)
            .await
            .map_err(|e| BucketError::S3Error(format!("Failed to generate presigned URL: {e}")))?;

        Ok(presigned.uri().to_string())
    }
}
