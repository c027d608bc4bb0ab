/// Replacement orchestrator
///
/// Drives one interaction: temp file → upload → transformation URL → fetch →
/// decode → comparison. Every external call comes back as a `Result`; nothing
/// here panics on a remote failure, and the temp file is released on every
/// path because `TempImage` removes itself on drop.
use std::path::{Path, PathBuf};

use tracing::{debug, info, instrument, warn};
use uuid::Uuid;

use crate::cloud::{self, AssetStore, Cloudinary, HttpFetcher, ImageFetcher};
use crate::config::Config;
use crate::error::{ReplaceError, Result};
use crate::state::data::{ComparisonResult, ImageSide, UploadedImage};
use crate::state::request::ReplacementRequest;
use crate::state::upload::{self, TempImage};

/// Fresh remote id, never reused between submissions
pub fn remote_id() -> String {
    format!("replace-image-{}", Uuid::new_v4().simple())
}

pub struct Orchestrator<S, F> {
    store: S,
    fetcher: F,
    temp_dir: PathBuf,
    purge_remote: bool,
}

impl Orchestrator<Cloudinary, HttpFetcher> {
    /// Wire up the real Cloudinary store and HTTP fetcher
    pub fn from_config(config: &Config) -> Result<Self> {
        let client = cloud::build_client(config)?;
        let store = Cloudinary::new(client.clone(), config.credentials.clone());
        let fetcher = HttpFetcher::new(client);

        Ok(Self::new(store, fetcher, config.temp_dir.clone()).with_purge_remote(config.purge_remote))
    }
}

impl<S, F> Orchestrator<S, F>
where
    S: AssetStore,
    F: ImageFetcher,
{
    pub fn new(store: S, fetcher: F, temp_dir: PathBuf) -> Self {
        Self {
            store,
            fetcher,
            temp_dir,
            purge_remote: false,
        }
    }

    pub fn with_purge_remote(mut self, purge_remote: bool) -> Self {
        self.purge_remote = purge_remote;
        self
    }

    pub fn temp_dir(&self) -> &Path {
        &self.temp_dir
    }

    /// Store the picked bytes in a fresh temp file
    pub fn accept_upload(&self, file_bytes: &[u8], declared_extension: &str) -> Result<TempImage> {
        upload::accept_upload(&self.temp_dir, file_bytes, declared_extension)
    }

    /// Release the temp file now
    pub fn cleanup(&self, image: TempImage) {
        image.cleanup();
    }

    /// Load a picked image for display.
    ///
    /// Writes it to a temp file, reads it back and decodes it, then lets the
    /// temp file go. Nothing is sent anywhere.
    #[instrument(skip(self, file_bytes), fields(bytes = file_bytes.len()))]
    pub async fn preview_upload(
        &self,
        display_name: String,
        file_bytes: Vec<u8>,
        declared_extension: &str,
    ) -> Result<UploadedImage> {
        let temp = self.accept_upload(&file_bytes, declared_extension)?;
        let extension = temp.extension();
        let stored = temp.read()?;
        temp.cleanup();

        let image = decode(stored, "uploaded image").await?;
        debug!(width = image.width, height = image.height, "Upload decoded");

        Ok(UploadedImage {
            display_name,
            extension,
            image,
        })
    }

    /// Upload, transform and fetch. Errors are returned, never raised.
    #[instrument(skip(self, image, request), fields(file = %image.file_name()))]
    pub async fn submit_for_replacement(
        &self,
        image: &TempImage,
        request: &ReplacementRequest,
    ) -> Result<ComparisonResult> {
        // Reject bad input before anything leaves the machine
        let descriptor = request.descriptor()?;

        let public_id = remote_id();
        let stored = self.store.upload(image, &public_id).await?;
        // Trust the id the store actually used
        let public_id = stored.public_id;

        let result = self.transform_and_fetch(image, &public_id, &descriptor).await;

        if self.purge_remote {
            if let Err(e) = self.store.destroy(&public_id).await {
                warn!(public_id = %public_id, error = %e, "Failed to remove remote asset");
            }
        }

        result
    }

    async fn transform_and_fetch(
        &self,
        image: &TempImage,
        public_id: &str,
        descriptor: &str,
    ) -> Result<ComparisonResult> {
        let url = self.store.delivery_url(public_id, descriptor)?;
        debug!(url = %url, "Transformed asset URL");

        let response = self.fetcher.get(&url).await?;
        if response.status != 200 {
            warn!(status = response.status, "Transformed image not available");
            return Err(ReplaceError::Fetch {
                status: Some(response.status),
                message: format!("delivery URL answered with status {}", response.status),
            });
        }

        let transformed = decode(response.bytes, "transformed image").await?;
        let original = decode(image.read()?, "original image").await?;

        info!(
            public_id = %public_id,
            original = %format!("{}x{}", original.width, original.height),
            transformed = %format!("{}x{}", transformed.width, transformed.height),
            "Replacement complete"
        );

        Ok(ComparisonResult {
            original,
            transformed,
            public_id: public_id.to_string(),
            transformed_url: url,
        })
    }

    /// One full interaction: temp file, submission, cleanup
    pub async fn run_interaction(
        &self,
        file_bytes: &[u8],
        declared_extension: &str,
        request: &ReplacementRequest,
    ) -> Result<ComparisonResult> {
        let temp = self.accept_upload(file_bytes, declared_extension)?;
        let result = self.submit_for_replacement(&temp, request).await;
        self.cleanup(temp);
        result
    }
}

/// Decode on the blocking pool; images can be large
async fn decode(bytes: Vec<u8>, what: &'static str) -> Result<ImageSide> {
    tokio::task::spawn_blocking(move || ImageSide::decode(bytes))
        .await
        .map_err(|e| ReplaceError::Decode(format!("{}: task join error: {}", what, e)))?
        .map_err(|e| ReplaceError::Decode(format!("{}: {}", what, e)))
}
