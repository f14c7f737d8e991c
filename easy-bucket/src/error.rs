//! Error types for bucket operations

use aws_sdk_s3::error::{DisplayErrorContext, ProvideErrorMetadata, SdkError};
use thiserror::Error;

/// Result type for bucket operations
pub type BucketResult<T> = Result<T, BucketError>;

/// Service error codes that mean the request was not authorized
const AUTH_ERROR_CODES: &[&str] = &[
    "AccessDenied",
    "InvalidAccessKeyId",
    "SignatureDoesNotMatch",
    "InvalidToken",
    "ExpiredToken",
];

/// Errors that can occur during bucket operations
#[derive(Error, Debug)]
pub enum BucketError {
    /// Transport-level failure reaching the storage backend
    #[error("Network error: {0}")]
    Network(String),

    /// Credentials or request signature rejected by the storage backend
    #[error("Authorization error: {0}")]
    Auth(String),

    /// Bucket (or other addressed resource) does not exist
    #[error("Not found: {0}")]
    NotFound(String),

    /// S3 service error
    #[error("S3 service error: {0}")]
    S3Error(String),

    /// Upstream service error (5xx from S3)
    #[error("Upstream service error: {0}")]
    UpstreamError(String),

    /// Fetching a source URL for download failed
    #[error("Fetch error: {0}")]
    Fetch(String),

    /// A bulk delete completed but some keys were not removed
    #[error("Failed to delete {} object(s), first: {}", .failed.len(), .failed.first().map_or("", String::as_str))]
    PartialDelete {
        /// Per-key failures formatted as `key: code`
        failed: Vec<String>,
    },

    /// Configuration error
    #[error("Configuration error: {0}")]
    ConfigError(String),
}

impl BucketError {
    /// Checks if this error represents an upstream (5xx) error
    #[must_use]
    pub const fn is_upstream_error(&self) -> bool {
        matches!(self, Self::UpstreamError(_))
    }
}

impl<E> From<SdkError<E>> for BucketError
where
    E: ProvideErrorMetadata + std::error::Error + Send + Sync + 'static,
{
    fn from(error: SdkError<E>) -> Self {
        let message = DisplayErrorContext(&error).to_string();

        match &error {
            SdkError::DispatchFailure(_) | SdkError::TimeoutError(_) | SdkError::ResponseError(_) => {
                Self::Network(message)
            }
            SdkError::ServiceError(service_err) => {
                let status = service_err.raw().status().as_u16();
                let code = service_err.err().code().unwrap_or_default();

                if status == 401 || status == 403 || AUTH_ERROR_CODES.contains(&code) {
                    Self::Auth(message)
                } else if code == "NoSuchBucket" || status == 404 {
                    Self::NotFound(message)
                } else if status >= 500 {
                    Self::UpstreamError(message)
                } else {
                    Self::S3Error(message)
                }
            }
            _ => Self::S3Error(message),
        }
    }
}

impl From<reqwest_middleware::Error> for BucketError {
    fn from(error: reqwest_middleware::Error) -> Self {
        Self::Fetch(error.to_string())
    }
}

impl From<reqwest::Error> for BucketError {
    fn from(error: reqwest::Error) -> Self {
        Self::Fetch(error.to_string())
    }
}
