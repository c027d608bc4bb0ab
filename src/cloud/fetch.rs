use async_trait::async_trait;
use reqwest::Client;
use tracing::{debug, error, instrument};

use crate::error::{ReplaceError, Result};

/// Raw answer from the delivery URL
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct FetchResponse {
    pub status: u16,
    pub bytes: Vec<u8>,
}

/// Downloads the transformed image
#[async_trait]
pub trait ImageFetcher: Send + Sync {
    /// GET `url`. Transport failures are errors; any HTTP status is a response.
    async fn get(&self, url: &str) -> Result<FetchResponse>;
}

/// `reqwest`-backed fetcher; the client carries the request timeout
#[derive(Debug, Clone)]
pub struct HttpFetcher {
    client: Client,
}

impl HttpFetcher {
    pub fn new(client: Client) -> Self {
        Self { client }
    }
}

#[async_trait]
impl ImageFetcher for HttpFetcher {
    #[instrument(skip(self))]
    async fn get(&self, url: &str) -> Result<FetchResponse> {
        debug!("Fetching transformed image");

        let response = self.client.get(url).send().await.map_err(|e| {
            error!(error = ?e, "Transformed image request failed");
            ReplaceError::Fetch {
                status: None,
                message: if e.is_timeout() {
                    format!("request timed out: {}", e)
                } else {
                    format!("request failed: {}", e)
                },
            }
        })?;

        let status = response.status().as_u16();
        let bytes = response.bytes().await.map_err(|e| {
            error!(error = ?e, status, "Failed to read transformed image body");
            ReplaceError::Fetch {
                status: Some(status),
                message: format!("failed to read response body: {}", e),
            }
        })?;

        debug!(status, bytes = bytes.len(), "Transformed image response received");
        Ok(FetchResponse {
            status,
            bytes: bytes.to_vec(),
        })
    }
}
