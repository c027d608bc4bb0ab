/// Shared data structures for the application state
///
/// These structs carry images between the orchestrator and the UI layer.
/// Bytes are kept exactly as uploaded or fetched; decoding only validates
/// them and records the dimensions.
use std::fmt;

use super::upload::ImageExtension;

/// One decoded-and-validated image
#[derive(Clone, PartialEq, Eq)]
pub struct ImageSide {
    /// Encoded bytes, untouched
    pub bytes: Vec<u8>,
    pub width: u32,
    pub height: u32,
}

impl ImageSide {
    /// Decode `bytes` to make sure they are an image and measure it
    pub fn decode(bytes: Vec<u8>) -> Result<Self, image::ImageError> {
        let decoded = image::load_from_memory(&bytes)?;
        Ok(Self {
            width: decoded.width(),
            height: decoded.height(),
            bytes,
        })
    }
}

// Bytes are summarized so messages stay readable in logs
impl fmt::Debug for ImageSide {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("ImageSide")
            .field("bytes", &format_args!("<{} bytes>", self.bytes.len()))
            .field("width", &self.width)
            .field("height", &self.height)
            .finish()
    }
}

/// The image the user picked
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct UploadedImage {
    /// Name of the picked file, for display only
    pub display_name: String,
    pub extension: ImageExtension,
    pub image: ImageSide,
}

/// Original and transformed image, ready to be shown side by side
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ComparisonResult {
    pub original: ImageSide,
    pub transformed: ImageSide,
    /// Remote id the original was stored under
    pub public_id: String,
    /// Delivery URL the transformed image was fetched from
    pub transformed_url: String,
}


#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_decode_keeps_bytes() {
        let bytes = fixtures::png(7, 5);
        let side = ImageSide::decode(bytes.clone()).unwrap();

        assert_eq!(side.bytes, bytes);
        assert_eq!((side.width, side.height), (7, 5));
    }

    #[test]
    fn test_decode_jpeg() {
        let side = ImageSide::decode(fixtures::jpeg(16, 8)).unwrap();
        assert_eq!((side.width, side.height), (16, 8));
    }

    #[test]
    fn test_decode_rejects_garbage() {
        assert!(ImageSide::decode(b"<html>404</html>".to_vec()).is_err());
    }

    #[test]
    fn test_debug_summarizes_bytes() {
        let side = ImageSide::decode(fixtures::png(2, 2)).unwrap();
        let printed = format!("{:?}", side);
        assert!(printed.contains("bytes>"));
        assert!(printed.contains("width: 2"));
    }
}
