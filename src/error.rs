/// Error types for the replace workflow
///
/// Every external call (temp file, upload, fetch, decode) is turned into one of
/// these variants so the UI can show a single message per interaction.
/// Only `Config` is fatal, and only at startup.
use thiserror::Error;

/// Shown whenever the transformed image cannot be fetched or decoded
pub const FETCH_FAILED_MESSAGE: &str =
    "Failed to fetch the transformed image. Please check your parameters and try again.";

/// Shown whenever the upload to the asset store fails
pub const UPLOAD_FAILED_MESSAGE: &str =
    "Failed to upload the image. Please check your credentials and connection and try again.";

#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum ReplaceError {
    /// Missing or invalid environment configuration
    #[error("configuration error: {0}")]
    Config(String),

    /// User input rejected before any network traffic
    #[error("invalid input: {0}")]
    Validation(String),

    /// The asset store rejected the upload or could not be reached
    #[error("upload failed: {message}")]
    Upload {
        status: Option<u16>,
        message: String,
    },

    /// The transformed asset URL did not answer with 200
    #[error("fetch failed: {message}")]
    Fetch {
        status: Option<u16>,
        message: String,
    },

    /// Bytes could not be decoded as an image
    #[error("decode failed: {0}")]
    Decode(String),

    /// Temp file could not be written or read back
    #[error("temp file error: {0}")]
    Io(String),
}

impl ReplaceError {
    /// The message surfaced to the user for this failure
    pub fn user_message(&self) -> String {
        match self {
            ReplaceError::Config(detail) => format!("Configuration error: {}", detail),
            ReplaceError::Validation(detail) => detail.clone(),
            ReplaceError::Upload { .. } => UPLOAD_FAILED_MESSAGE.to_string(),
            ReplaceError::Fetch { .. } | ReplaceError::Decode(_) => FETCH_FAILED_MESSAGE.to_string(),
            ReplaceError::Io(_) => {
                "Could not store the uploaded image temporarily. Please try again.".to_string()
            }
        }
    }

    /// HTTP status of a failed remote call, when there was a response
    pub fn status(&self) -> Option<u16> {
        match self {
            ReplaceError::Upload { status, .. } | ReplaceError::Fetch { status, .. } => *status,
            _ => None,
        }
    }

    /// Everything except a startup configuration error can be retried
    pub fn is_retryable(&self) -> bool {
        !matches!(self, ReplaceError::Config(_))
    }

    pub(crate) fn io(context: &str, err: std::io::Error) -> Self {
        ReplaceError::Io(format!("{}: {}", context, err))
    }
}

pub type Result<T> = std::result::Result<T, ReplaceError>;

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_fetch_and_decode_share_message() {
        let fetch = ReplaceError::Fetch {
            status: Some(404),
            message: "not found".into(),
        };
        let decode = ReplaceError::Decode("bad header".into());

        assert_eq!(fetch.user_message(), FETCH_FAILED_MESSAGE);
        assert_eq!(decode.user_message(), FETCH_FAILED_MESSAGE);
    }

    #[test]
    fn test_only_config_is_fatal() {
        assert!(!ReplaceError::Config("CLOUD_NAME".into()).is_retryable());
        assert!(ReplaceError::Upload {
            status: Some(401),
            message: "Invalid Signature".into()
        }
        .is_retryable());
        assert!(ReplaceError::Validation("empty".into()).is_retryable());
    }

    #[test]
    fn test_status_only_for_remote_calls() {
        let fetch = ReplaceError::Fetch {
            status: Some(500),
            message: "boom".into(),
        };
        assert_eq!(fetch.status(), Some(500));
        assert_eq!(ReplaceError::Decode("x".into()).status(), None);
    }

    #[test]
    fn test_validation_message_is_shown_verbatim() {
        let err = ReplaceError::Validation("Item to replace must not be empty".into());
        assert_eq!(err.user_message(), "Item to replace must not be empty");
    }
}
