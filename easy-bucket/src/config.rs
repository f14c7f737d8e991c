//! Connection settings for an S3-compatible endpoint

use std::{env, fmt};

use aws_config::{retry::RetryConfig, BehaviorVersion, Region};
use aws_sdk_s3::config::Credentials;
use url::Url;

use crate::{BucketError, BucketResult};

/// Provider name attached to the static credentials
const CREDENTIALS_PROVIDER_NAME: &str = "easy-bucket";

/// Environment variable holding the public endpoint URL
pub const ENDPOINT_VAR: &str = "OSS_EXTERNAL_ENDPOINT";
/// Environment variable holding the region
pub const REGION_VAR: &str = "OSS_REGION";
/// Environment variable holding the access key ID
pub const ACCESS_KEY_VAR: &str = "OSS_ACCESS_KEY";
/// Environment variable holding the secret access key
pub const SECRET_KEY_VAR: &str = "OSS_ACCESS_SECRET";
/// Optional environment variable toggling path-style addressing
pub const FORCE_PATH_STYLE_VAR: &str = "OSS_FORCE_PATH_STYLE";

/// Endpoint, region and static credentials for a storage backend
#[derive(Clone, PartialEq, Eq)]
pub struct BucketConfig {
    /// Endpoint URL, e.g. `https://oss.example.com`
    pub endpoint: String,
    /// Region passed to the request signer
    pub region: String,
    /// Access key ID
    pub access_key: String,
    /// Secret access key
    pub secret_key: String,
    /// Address buckets as a path segment instead of a subdomain when sending requests
    pub force_path_style: bool,
}

impl fmt::Debug for BucketConfig {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("BucketConfig")
            .field("endpoint", &self.endpoint)
            .field("region", &self.region)
            .field("access_key", &self.access_key)
            .field("secret_key", &"<redacted>")
            .field("force_path_style", &self.force_path_style)
            .finish()
    }
}

impl BucketConfig {
    /// Creates a configuration with path-style addressing enabled
    #[must_use]
    pub fn new(
        endpoint: impl Into<String>,
        region: impl Into<String>,
        access_key: impl Into<String>,
        secret_key: impl Into<String>,
    ) -> Self {
        Self {
            endpoint: endpoint.into(),
            region: region.into(),
            access_key: access_key.into(),
            secret_key: secret_key.into(),
            force_path_style: true,
        }
    }

    /// Sets whether requests use path-style addressing
    #[must_use]
    pub const fn with_force_path_style(mut self, force_path_style: bool) -> Self {
        self.force_path_style = force_path_style;
        self
    }

    /// Reads the configuration from `OSS_*` environment variables
    ///
    /// `OSS_FORCE_PATH_STYLE` is optional and defaults to `true`; an
    /// unparsable value falls back to the default.
    ///
    /// # Errors
    ///
    /// Returns `BucketError::ConfigError` if a required variable is not set
    pub fn from_env() -> BucketResult<Self> {
        let force_path_style = env::var(FORCE_PATH_STYLE_VAR)
            .ok()
            .and_then(|val| val.trim().parse::<bool>().ok())
            .unwrap_or(true);

        Ok(Self::new(
            required_var(ENDPOINT_VAR)?,
            required_var(REGION_VAR)?,
            required_var(ACCESS_KEY_VAR)?,
            required_var(SECRET_KEY_VAR)?,
        )
        .with_force_path_style(force_path_style))
    }

    /// Parses the endpoint, requiring an absolute URL with a host
    ///
    /// # Errors
    ///
    /// Returns `BucketError::ConfigError` if the endpoint is not a valid URL
    pub fn endpoint_url(&self) -> BucketResult<Url> {
        let url = Url::parse(&self.endpoint).map_err(|e| {
            BucketError::ConfigError(format!("Invalid endpoint {}: {e}", self.endpoint))
        })?;

        if url.host_str().is_none() {
            return Err(BucketError::ConfigError(format!(
                "Endpoint {} has no host",
                self.endpoint
            )));
        }

        Ok(url)
    }

    /// S3 service configuration for this endpoint
    ///
    /// Retries are disabled so that every failure reaches the caller.
    #[must_use]
    pub fn s3_client_config(&self) -> aws_sdk_s3::Config {
        let credentials = Credentials::new(
            &self.access_key,
            &self.secret_key,
            None,
            None,
            CREDENTIALS_PROVIDER_NAME,
        );

        aws_sdk_s3::Config::builder()
            .behavior_version(BehaviorVersion::latest())
            .endpoint_url(&self.endpoint)
            .region(Region::new(self.region.clone()))
            .credentials_provider(credentials)
            .retry_config(RetryConfig::disabled())
            .force_path_style(self.force_path_style)
            .build()
    }
}

fn required_var(name: &str) -> BucketResult<String> {
    env::var(name)
        .map_err(|_| BucketError::ConfigError(format!("{name} environment variable not set")))
}
