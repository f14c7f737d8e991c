//! Outbound HTTP fetch for mirroring remote files

use reqwest::{header::CONTENT_TYPE, Client};
use reqwest_middleware::{ClientBuilder, ClientWithMiddleware};
use reqwest_tracing::TracingMiddleware;
use tracing::{debug, error};

use crate::{naming, BucketError, BucketResult};

/// Maximum number of idle connections to maintain per host
const MAX_IDLE_CONNECTIONS_PER_HOST: usize = 10;

/// A remote file ready to be saved
#[derive(Debug, Clone)]
pub struct FetchedFile {
    /// Generated `<id>.<extension>` file name
    pub file_name: String,
    /// `content-type` header of the response, verbatim
    pub content_type: Option<String>,
    /// Response body
    pub body: Vec<u8>,
}

/// Builds the HTTP client used for downloads
///
/// No request timeout is set; callers wrap calls if they need one.
///
/// # Errors
///
/// Returns `BucketError::ConfigError` if the HTTP client fails to be created
pub fn http_client() -> BucketResult<ClientWithMiddleware> {
    let reqwest_client = Client::builder()
        .pool_max_idle_per_host(MAX_IDLE_CONNECTIONS_PER_HOST)
        .build()
        .map_err(|e| BucketError::ConfigError(format!("Failed to create HTTP client: {e}")))?;

    Ok(ClientBuilder::new(reqwest_client)
        .with(TracingMiddleware::default())
        .build())
}

/// Fetches `url` and names the result after its content type
///
/// # Errors
///
/// Returns `BucketError::Fetch` if the request fails, the response status is
/// not a success, or the body cannot be read
pub async fn fetch(http_client: &ClientWithMiddleware, url: &str) -> BucketResult<FetchedFile> {
    debug!(url, "Fetching remote file");

    let response = http_client
        .get(url)
        .send()
        .await
        .inspect_err(|e| error!(url, error = %e, "Fetch failed"))?
        .error_for_status()
        .inspect_err(|e| error!(url, error = %e, "Fetch returned error status"))?;

    let content_type = response
        .headers()
        .get(CONTENT_TYPE)
        .and_then(|value| value.to_str().ok())
        .map(str::to_string);

    let body = response.bytes().await?.to_vec();
    let file_name = naming::file_name_for(content_type.as_deref());

    debug!(url, file_name = %file_name, size = body.len(), "Fetched remote file");

    Ok(FetchedFile {
        file_name,
        content_type,
        body,
    })
}
