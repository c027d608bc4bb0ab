/// Cloudinary integration
///
/// - `store.rs` - signed uploads, delivery URLs, asset removal
/// - `fetch.rs` - downloading the transformed image
/// - `signature.rs` - request signing
///
/// Both network seams are traits so the orchestrator can be driven by
/// in-memory doubles in tests.

pub mod fetch;
pub mod signature;
pub mod store;

pub use fetch::{FetchResponse, HttpFetcher, ImageFetcher};
pub use store::{AssetStore, Cloudinary, StoredAsset};

use reqwest::Client;

use crate::config::Config;
use crate::error::{ReplaceError, Result};

/// One HTTP client for every outbound call, bounded by the configured timeout
pub fn build_client(config: &Config) -> Result<Client> {
    Client::builder()
        .timeout(config.request_timeout)
        .user_agent(concat!(env!("CARGO_PKG_NAME"), "/", env!("CARGO_PKG_VERSION")))
        .build()
        .map_err(|e| ReplaceError::Config(format!("failed to build HTTP client: {}", e)))
}
