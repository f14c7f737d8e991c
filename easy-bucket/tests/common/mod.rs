// Not every helper is used in every test, so we allow dead code
#![allow(dead_code)]

use aws_sdk_s3::{
    primitives::ByteStream,
    types::{Delete, ObjectIdentifier},
    Client as S3Client,
};
use easy_bucket::{BucketClient, BucketConfig};
use uuid::Uuid;

/// Test configuration for LocalStack
pub const LOCALSTACK_ENDPOINT: &str = "http://localhost:4566";
pub const TEST_REGION: &str = "us-east-1";

/// Load `.env.example` and initialize tracing for tests
pub fn setup_test_env() {
    dotenvy::from_path(".env.example").ok();

    tracing_subscriber::fmt()
        .with_env_filter(tracing_subscriber::EnvFilter::from_default_env())
        .try_init()
        .ok();
}

/// Configuration pointing at LocalStack
pub fn localstack_config() -> BucketConfig {
    BucketConfig::from_env().unwrap_or_else(|_| {
        BucketConfig::new(LOCALSTACK_ENDPOINT, TEST_REGION, "test", "test")
    })
}

/// Keys listed per cleanup round (the S3 maximum)
pub const CLEANUP_PAGE_SIZE: i32 = 1000;

/// Empties a bucket page by page and deletes it
///
/// Each round lists from the start, so keys removed in earlier rounds never
/// need a continuation token. Stops early if a round fails.
pub async fn remove_bucket(client: &S3Client, bucket: &str, page_size: i32) {
    loop {
        let Ok(listed) = client
            .list_objects_v2()
            .bucket(bucket)
            .max_keys(page_size)
            .send()
            .await
        else {
            break;
        };

        let objects: Vec<ObjectIdentifier> = listed
            .contents()
            .iter()
            .filter_map(|object| object.key())
            .filter_map(|key| ObjectIdentifier::builder().key(key).build().ok())
            .collect();

        if objects.is_empty() {
            break;
        }

        let Ok(delete) = Delete::builder()
            .set_objects(Some(objects))
            .quiet(true)
            .build()
        else {
            break;
        };

        if client
            .delete_objects()
            .bucket(bucket)
            .delete(delete)
            .send()
            .await
            .is_err()
        {
            break;
        }
    }

    let _ = client.delete_bucket().bucket(bucket).send().await;
}

/// Test context that owns a unique bucket
///
/// Call [`TestContext::cleanup`] at the end of a test. Drop only schedules the
/// same cleanup on the runtime, which may shut down before it finishes.
pub struct TestContext {
    pub client: BucketClient,
    pub s3_client: S3Client,
    pub bucket_name: String,
    cleaned_up: bool,
}

impl Drop for TestContext {
    fn drop(&mut self) {
        if self.cleaned_up {
            return;
        }

        let client = self.s3_client.clone();
        let bucket = self.bucket_name.clone();

        if let Ok(handle) = tokio::runtime::Handle::try_current() {
            handle.spawn(async move {
                remove_bucket(&client, &bucket, CLEANUP_PAGE_SIZE).await;
            });
        }
    }
}

impl TestContext {
    /// Creates a fresh bucket to avoid interference among tests
    pub async fn new() -> Self {
        setup_test_env();

        let config = localstack_config();
        let s3_client = S3Client::from_conf(config.s3_client_config());
        let bucket_name = format!("easy-bucket-test-{}", Uuid::new_v4());

        s3_client
            .create_bucket()
            .bucket(&bucket_name)
            .send()
            .await
            .expect("Failed to create test bucket");

        let client =
            BucketClient::new(bucket_name.clone(), &config).expect("Failed to create client");

        Self {
            client,
            s3_client,
            bucket_name,
            cleaned_up: false,
        }
    }

    /// Empties and deletes the bucket before the test returns
    pub async fn cleanup(mut self) {
        remove_bucket(&self.s3_client, &self.bucket_name, CLEANUP_PAGE_SIZE).await;
        self.cleaned_up = true;
    }

    /// Reads an object back through the raw S3 client
    pub async fn read_object(&self, key: &str) -> Option<(Vec<u8>, Option<String>)> {
        let output = self
            .s3_client
            .get_object()
            .bucket(&self.bucket_name)
            .key(key)
            .send()
            .await
            .ok()?;
        let content_type = output.content_type().map(str::to_string);
        let body = output.body.collect().await.ok()?.into_bytes().to_vec();
        Some((body, content_type))
    }

    /// Writes objects directly, bypassing the client under test
    pub async fn put_objects(&self, keys: impl IntoIterator<Item = String>) {
        for key in keys {
            self.s3_client
                .put_object()
                .bucket(&self.bucket_name)
                .key(&key)
                .body(ByteStream::from(key.clone().into_bytes()))
                .send()
                .await
                .expect("Failed to put test object");
        }
    }

    /// All keys currently in the bucket
    pub async fn all_keys(&self) -> Vec<String> {
        let mut keys = Vec::new();
        let mut continuation_token = None;

        loop {
            let output = self
                .s3_client
                .list_objects_v2()
                .bucket(&self.bucket_name)
                .set_continuation_token(continuation_token)
                .send()
                .await
                .expect("Failed to list test bucket");

            keys.extend(
                output
                    .contents()
                    .iter()
                    .filter_map(|object| object.key().map(str::to_string)),
            );

            match output.next_continuation_token() {
                Some(token) if output.is_truncated() == Some(true) => {
                    continuation_token = Some(token.to_string());
                }
                _ => break,
            }
        }

        keys
    }
}
