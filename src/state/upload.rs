use std::fmt;
use std::fs::OpenOptions;
use std::io::Write;
use std::path::{Path, PathBuf};
use std::str::FromStr;

use tracing::{debug, warn};
use uuid::Uuid;

use crate::error::{ReplaceError, Result};

/// Image types accepted by the picker and by `accept_upload`
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ImageExtension {
    Jpg,
    Jpeg,
    Png,
}

impl ImageExtension {
    /// Extensions offered in the file dialog filter
    pub const ALL: [&'static str; 3] = ["jpg", "jpeg", "png"];

    pub fn as_str(&self) -> &'static str {
        match self {
            ImageExtension::Jpg => "jpg",
            ImageExtension::Jpeg => "jpeg",
            ImageExtension::Png => "png",
        }
    }

    /// Extension of a picked file, if it is one we accept
    pub fn from_path(path: &Path) -> Result<Self> {
        let ext = path
            .extension()
            .map(|e| e.to_string_lossy().to_string())
            .unwrap_or_default();
        ext.parse()
    }
}

impl FromStr for ImageExtension {
    type Err = ReplaceError;

    fn from_str(s: &str) -> Result<Self> {
        let normalized = s.trim().trim_start_matches('.').to_ascii_lowercase();
        match normalized.as_str() {
            "jpg" => Ok(ImageExtension::Jpg),
            "jpeg" => Ok(ImageExtension::Jpeg),
            "png" => Ok(ImageExtension::Png),
            _ => Err(ReplaceError::Validation(format!(
                "Unsupported image type {:?}. Please upload a jpg, jpeg or png file.",
                s
            ))),
        }
    }
}

impl fmt::Display for ImageExtension {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

/// A per-interaction copy of the uploaded image on local disk.
///
/// The file name comes from a fresh v4 UUID, never from the user's file name.
/// The file is removed when the handle is dropped, so every exit path of an
/// interaction cleans up after itself.
#[derive(Debug)]
pub struct TempImage {
    path: PathBuf,
    extension: ImageExtension,
    removed: bool,
}

/// Write `file_bytes` to a uniquely named file inside `dir`.
pub fn accept_upload(dir: &Path, file_bytes: &[u8], declared_extension: &str) -> Result<TempImage> {
    let extension: ImageExtension = declared_extension.parse()?;

    std::fs::create_dir_all(dir)
        .map_err(|e| ReplaceError::io(&format!("creating {}", dir.display()), e))?;

    let path = dir.join(format!("temp_image_{}.{}", Uuid::new_v4().simple(), extension));

    // create_new: a name clash must never overwrite another interaction's file
    let mut file = OpenOptions::new()
        .write(true)
        .create_new(true)
        .open(&path)
        .map_err(|e| ReplaceError::io(&format!("creating {}", path.display()), e))?;

    // From here on the handle owns the file, so a failed write still removes it
    let image = TempImage {
        path,
        extension,
        removed: false,
    };

    file.write_all(file_bytes)
        .and_then(|_| file.flush())
        .map_err(|e| ReplaceError::io(&format!("writing {}", image.path.display()), e))?;

    debug!(path = %image.path.display(), bytes = file_bytes.len(), "Wrote temp image");
    Ok(image)
}

impl TempImage {
    pub fn path(&self) -> &Path {
        &self.path
    }

    pub fn extension(&self) -> ImageExtension {
        self.extension
    }

    /// File name used for the multipart upload
    pub fn file_name(&self) -> String {
        self.path
            .file_name()
            .map(|n| n.to_string_lossy().to_string())
            .unwrap_or_else(|| format!("upload.{}", self.extension))
    }

    /// Read the stored bytes back
    pub fn read(&self) -> Result<Vec<u8>> {
        std::fs::read(&self.path)
            .map_err(|e| ReplaceError::io(&format!("reading {}", self.path.display()), e))
    }

    /// Delete the temp file now instead of waiting for drop
    pub fn cleanup(mut self) {
        self.remove();
    }

    fn remove(&mut self) {
        if self.removed {
            return;
        }
        self.removed = true;

        match std::fs::remove_file(&self.path) {
            Ok(()) => debug!(path = %self.path.display(), "Removed temp image"),
            Err(e) if e.kind() == std::io::ErrorKind::NotFound => {}
            Err(e) => warn!(path = %self.path.display(), error = %e, "Failed to remove temp image"),
        }
    }
}

impl Drop for TempImage {
    fn drop(&mut self) {
        self.remove();
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn entries(dir: &Path) -> usize {
        std::fs::read_dir(dir).map(|d| d.count()).unwrap_or(0)
    }

    #[test]
    fn test_extension_parsing() {
        assert_eq!("JPG".parse::<ImageExtension>().unwrap(), ImageExtension::Jpg);
        assert_eq!(".jpeg".parse::<ImageExtension>().unwrap(), ImageExtension::Jpeg);
        assert_eq!("png".parse::<ImageExtension>().unwrap(), ImageExtension::Png);
        assert!("gif".parse::<ImageExtension>().is_err());
        assert!("".parse::<ImageExtension>().is_err());
    }

    #[test]
    fn test_extension_from_path() {
        assert_eq!(
            ImageExtension::from_path(Path::new("/photos/shirt.JPG")).unwrap(),
            ImageExtension::Jpg
        );
        assert!(ImageExtension::from_path(Path::new("/photos/shirt")).is_err());
    }

    #[test]
    fn test_bytes_read_back_and_removed_on_drop() {
        let dir = tempfile::tempdir().unwrap();
        let bytes = b"\x89PNG fake payload".to_vec();

        let image = accept_upload(dir.path(), &bytes, "png").unwrap();
        let path = image.path().to_path_buf();

        assert!(path.exists());
        assert_eq!(image.read().unwrap(), bytes);

        drop(image);
        assert!(!path.exists());
        assert_eq!(entries(dir.path()), 0);
    }

    #[test]
    fn test_cleanup_removes_file() {
        let dir = tempfile::tempdir().unwrap();
        let image = accept_upload(dir.path(), b"data", "jpg").unwrap();
        let path = image.path().to_path_buf();

        image.cleanup();
        assert!(!path.exists());
    }

    #[test]
    fn test_cleanup_tolerates_missing_file() {
        let dir = tempfile::tempdir().unwrap();
        let image = accept_upload(dir.path(), b"data", "jpg").unwrap();
        std::fs::remove_file(image.path()).unwrap();

        // Must not panic
        image.cleanup();
    }

    #[test]
    fn test_names_are_unique_and_not_user_derived() {
        let dir = tempfile::tempdir().unwrap();
        let a = accept_upload(dir.path(), b"a", "jpg").unwrap();
        let b = accept_upload(dir.path(), b"b", "jpg").unwrap();

        assert_ne!(a.path(), b.path());
        assert!(a.file_name().starts_with("temp_image_"));
        assert!(a.file_name().ends_with(".jpg"));
        assert_eq!(a.path().parent().unwrap(), dir.path());
    }

    #[test]
    fn test_rejected_extension_writes_nothing() {
        let dir = tempfile::tempdir().unwrap();
        let err = accept_upload(dir.path(), b"GIF89a", "gif").unwrap_err();

        assert!(matches!(err, ReplaceError::Validation(_)));
        assert_eq!(entries(dir.path()), 0);
    }

    #[test]
    fn test_creates_missing_directory() {
        let dir = tempfile::tempdir().unwrap();
        let nested = dir.path().join("a").join("b");

        let image = accept_upload(&nested, b"x", "png").unwrap();
        assert!(image.path().starts_with(&nested));
    }
}
