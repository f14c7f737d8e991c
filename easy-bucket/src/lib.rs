//! Single-bucket facade over S3-compatible object storage
//!
//! [`BucketClient`] saves, mirrors, lists, deletes and shares objects in one
//! bucket, configured once from a [`BucketConfig`]:
//!
//! ```no_run
//! use easy_bucket::{BucketClient, BucketConfig, ListQuery};
//!
//! # async fn run() -> easy_bucket::BucketResult<()> {
//! let client = BucketClient::new("assets", &BucketConfig::from_env()?)?;
//!
//! let url = client.save("hello.txt", "hello", Some("text/plain")).await?;
//! let mirrored = client.download_to("https://example.com/logo.png", "images/").await?;
//!
//! let mut page = client.list(ListQuery::new().max_results(100)).await?;
//! loop {
//!     for entry in &page.entries {
//!         println!("{}", entry.key);
//!     }
//!     match page.more {
//!         Some(more) if !page.entries.is_empty() => page = more.fetch().await?,
//!         _ => break,
//!     }
//! }
//!
//! client.delete_by_prefix("images/").await?;
//! let shared = client.get_share_url("hello.txt").await?;
//! # let _ = (url, mirrored, shared);
//! # Ok(())
//! # }
//! ```

#![deny(
    clippy::all,
    clippy::pedantic,
    clippy::nursery,
    missing_docs,
    dead_code
)]

/// Storage primitives behind the client
pub mod backend;

mod client;
mod config;
mod error;
mod fetch;
mod listing;

/// File naming for downloaded objects
pub mod naming;

pub use backend::{ObjectStore, ObjectSummary, S3ObjectStore};
pub use client::{
    BucketClient, PrefixDeletion, SharedUrl, DEFAULT_SHARE_EXPIRY_SECS, DELETE_BATCH_SIZE,
};
pub use config::{
    BucketConfig, ACCESS_KEY_VAR, ENDPOINT_VAR, FORCE_PATH_STYLE_VAR, REGION_VAR, SECRET_KEY_VAR,
};
pub use error::{BucketError, BucketResult};
pub use fetch::FetchedFile;
pub use listing::{ListPage, ListQuery, MorePages};
