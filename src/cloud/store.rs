use async_trait::async_trait;
use chrono::Utc;
use reqwest::multipart::{Form, Part};
use reqwest::{Client, Url};
use serde::Deserialize;
use tracing::{debug, error, info, instrument, warn};

use super::signature::{self, SIGNATURE_ALGORITHM};
use crate::config::CloudCredentials;
use crate::error::{ReplaceError, Result};
use crate::state::upload::TempImage;

const API_BASE: &str = "https://api.cloudinary.com/v1_1";
/// Delivery is always over HTTPS
const DELIVERY_BASE: &str = "https://res.cloudinary.com";

/// What the store reports back after an upload
#[derive(Debug, Clone, PartialEq, Eq, Deserialize)]
pub struct StoredAsset {
    pub public_id: String,
    #[serde(default)]
    pub secure_url: String,
    #[serde(default)]
    pub width: Option<u32>,
    #[serde(default)]
    pub height: Option<u32>,
    #[serde(default)]
    pub format: Option<String>,
    #[serde(default)]
    pub bytes: Option<u64>,
}

/// Remote asset store that can derive transformed-asset URLs
#[async_trait]
pub trait AssetStore: Send + Sync {
    /// Upload the temp image under `public_id`
    async fn upload(&self, image: &TempImage, public_id: &str) -> Result<StoredAsset>;

    /// Fully qualified HTTPS URL of `public_id` with `transformation` applied
    fn delivery_url(&self, public_id: &str, transformation: &str) -> Result<String>;

    /// Delete the remote asset
    async fn destroy(&self, public_id: &str) -> Result<()>;
}

/// Cloudinary Upload API client
#[derive(Debug, Clone)]
pub struct Cloudinary {
    client: Client,
    credentials: CloudCredentials,
}

#[derive(Deserialize)]
struct ApiErrorBody {
    error: ApiErrorDetail,
}

#[derive(Deserialize)]
struct ApiErrorDetail {
    message: String,
}

#[derive(Deserialize)]
struct DestroyResponse {
    result: String,
}

impl Cloudinary {
    pub fn new(client: Client, credentials: CloudCredentials) -> Self {
        Self { client, credentials }
    }

    fn endpoint(&self, action: &str) -> String {
        format!("{}/{}/image/{}", API_BASE, self.credentials.cloud_name, action)
    }

    /// Signed form fields shared by every authenticated call
    fn signed_form(&self, public_id: &str) -> Form {
        let timestamp = Utc::now().timestamp().to_string();
        let params = [
            ("public_id", public_id),
            ("timestamp", timestamp.as_str()),
        ];
        let signature = signature::sign(&params, &self.credentials.api_secret);

        Form::new()
            .text("public_id", public_id.to_string())
            .text("timestamp", timestamp)
            .text("api_key", self.credentials.api_key.clone())
            .text("signature", signature)
            .text("signature_algorithm", SIGNATURE_ALGORITHM)
    }
}

/// Pull `error.message` out of a Cloudinary error body
fn api_error_message(body: &str) -> Option<String> {
    serde_json::from_str::<ApiErrorBody>(body)
        .ok()
        .map(|b| b.error.message)
}

#[async_trait]
impl AssetStore for Cloudinary {
    #[instrument(skip(self, image), fields(file = %image.file_name()))]
    async fn upload(&self, image: &TempImage, public_id: &str) -> Result<StoredAsset> {
        let bytes = tokio::fs::read(image.path())
            .await
            .map_err(|e| ReplaceError::io(&format!("reading {}", image.path().display()), e))?;

        debug!(bytes = bytes.len(), "Uploading image to Cloudinary");

        let form = self
            .signed_form(public_id)
            .part("file", Part::bytes(bytes).file_name(image.file_name()));

        let response = self
            .client
            .post(self.endpoint("upload"))
            .multipart(form)
            .send()
            .await
            .map_err(|e| {
                error!(error = ?e, "Failed to send upload request");
                ReplaceError::Upload {
                    status: None,
                    message: format!("request failed: {}", e),
                }
            })?;

        let status = response.status();
        if !status.is_success() {
            let body = response.text().await.unwrap_or_default();
            let message = api_error_message(&body).unwrap_or(body);
            error!(status = %status, message = %message, "Cloudinary rejected the upload");
            return Err(ReplaceError::Upload {
                status: Some(status.as_u16()),
                message,
            });
        }

        let asset: StoredAsset = response.json().await.map_err(|e| {
            error!(error = ?e, "Failed to parse upload response");
            ReplaceError::Upload {
                status: Some(status.as_u16()),
                message: format!("unexpected upload response: {}", e),
            }
        })?;

        info!(
            public_id = %asset.public_id,
            width = ?asset.width,
            height = ?asset.height,
            format = ?asset.format,
            bytes = ?asset.bytes,
            "Image uploaded"
        );
        debug!(secure_url = %asset.secure_url, "Stored asset URL");
        Ok(asset)
    }

    fn delivery_url(&self, public_id: &str, transformation: &str) -> Result<String> {
        let effect = format!("e_{}", transformation);
        let mut url = Url::parse(DELIVERY_BASE)
            .map_err(|e| ReplaceError::Config(format!("invalid delivery base: {}", e)))?;

        url.path_segments_mut()
            .map_err(|_| ReplaceError::Config("delivery base cannot carry a path".to_string()))?
            .pop_if_empty()
            .extend([
                self.credentials.cloud_name.as_str(),
                "image",
                "upload",
                effect.as_str(),
                public_id,
            ]);

        Ok(url.to_string())
    }

    #[instrument(skip(self))]
    async fn destroy(&self, public_id: &str) -> Result<()> {
        let response = self
            .client
            .post(self.endpoint("destroy"))
            .multipart(self.signed_form(public_id))
            .send()
            .await
            .map_err(|e| ReplaceError::Upload {
                status: None,
                message: format!("destroy request failed: {}", e),
            })?;

        let status = response.status();
        if !status.is_success() {
            let body = response.text().await.unwrap_or_default();
            return Err(ReplaceError::Upload {
                status: Some(status.as_u16()),
                message: api_error_message(&body).unwrap_or(body),
            });
        }

        match response.json::<DestroyResponse>().await {
            Ok(r) if r.result == "ok" => debug!("Remote asset destroyed"),
            Ok(r) => warn!(result = %r.result, "Destroy did not report ok"),
            Err(e) => warn!(error = %e, "Unreadable destroy response"),
        }
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn store() -> Cloudinary {
        Cloudinary::new(
            Client::new(),
            CloudCredentials {
                cloud_name: "demo".into(),
                api_key: "123456".into(),
                api_secret: "s3cr3t".into(),
            },
        )
    }

    #[test]
    fn test_delivery_url_default_request() {
        let url = store()
            .delivery_url(
                "replace-image-abc123",
                "gen_replace:from_sweater;to_leather jacket with pockets",
            )
            .unwrap();

        assert_eq!(
            url,
            "https://res.cloudinary.com/demo/image/upload/e_gen_replace:from_sweater;to_leather%20jacket%20with%20pockets/replace-image-abc123"
        );
    }

    #[test]
    fn test_delivery_url_is_https() {
        let url = store().delivery_url("id", "gen_replace:from_a;to_b").unwrap();
        assert!(url.starts_with("https://"));
    }

    #[test]
    fn test_endpoints() {
        let store = store();
        assert_eq!(
            store.endpoint("upload"),
            "https://api.cloudinary.com/v1_1/demo/image/upload"
        );
        assert_eq!(
            store.endpoint("destroy"),
            "https://api.cloudinary.com/v1_1/demo/image/destroy"
        );
    }

    #[test]
    fn test_api_error_message() {
        let body = r#"{"error":{"message":"Invalid Signature abc. String to sign - 'public_id=x&timestamp=1'."}}"#;
        assert_eq!(
            api_error_message(body).unwrap(),
            "Invalid Signature abc. String to sign - 'public_id=x&timestamp=1'."
        );
        assert!(api_error_message("<html>bad gateway</html>").is_none());
    }

    #[test]
    fn test_stored_asset_parses_upload_response() {
        let body = r#"{
            "asset_id": "b5e6d2b39ba3e0869d67141ba7dba6cf",
            "public_id": "replace-image-abc123",
            "version": 1719304854,
            "width": 1024,
            "height": 768,
            "format": "jpg",
            "resource_type": "image",
            "bytes": 120253,
            "secure_url": "https://res.cloudinary.com/demo/image/upload/v1719304854/replace-image-abc123.jpg"
        }"#;

        let asset: StoredAsset = serde_json::from_str(body).unwrap();
        assert_eq!(asset.public_id, "replace-image-abc123");
        assert_eq!(asset.width, Some(1024));
        assert_eq!(asset.format.as_deref(), Some("jpg"));
    }
}
