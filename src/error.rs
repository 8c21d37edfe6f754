// Error types for stickerforge

use thiserror::Error;

/// Result type for sticker generation and export operations
pub type Result<T> = std::result::Result<T, StickerError>;

/// Errors that can occur while generating or exporting stickers
#[derive(Error, Debug)]
pub enum StickerError {
    /// The batch request or slot operation is malformed; nothing was dispatched
    #[error("Invalid request: {0}")]
    InvalidRequest(String),

    /// A required service credential is absent; generation cannot start
    #[error("Missing credential: {0}")]
    MissingCredential(String),

    /// The backend reported it is warming up; worth retrying after a longer wait
    #[error("Service unavailable: {0}")]
    ServiceUnavailable(String),

    /// Timeout or transport failure talking to the backend
    #[error("Network error: {0}")]
    Network(String),

    /// The backend answered with a hard failure status
    #[error("Generation failed: {0}")]
    Generation(String),

    /// Response bytes did not parse as an image
    #[error("Image decode error: {0}")]
    Decode(String),

    #[error("Image processing error: {0}")]
    ImageProcessing(String),

    #[error("IO error: {0}")]
    Io(#[from] std::io::Error),
}

impl From<image::ImageError> for StickerError {
    fn from(err: image::ImageError) -> Self {
        StickerError::ImageProcessing(err.to_string())
    }
}
