//! Error types for archive-to-deck conversion.

use thiserror::Error;

/// Result type alias using our Error type.
pub type Result<T> = std::result::Result<T, Error>;

/// Errors that can occur while converting an archive into slides.
#[derive(Error, Debug)]
pub enum Error {
    /// Failed to read or write a file.
    #[error("I/O error: {0}")]
    IoError(#[from] std::io::Error),

    /// The multipart container structure is unusable.
    #[error("MIME container error: {0}")]
    MimeError(String),

    /// A part payload could not be transfer-decoded.
    #[error("Payload decoding error: {0}")]
    DecodeError(String),

    /// An image could not be decoded or re-encoded.
    #[error("Image conversion error: {0}")]
    ImageError(String),

    /// An asset could not be stored or located.
    #[error("Asset store error: {0}")]
    AssetError(String),

    /// A slide could not be rendered.
    #[error("Slide rendering error: {0}")]
    RenderError(String),

    /// Failed to serialize output metadata.
    #[error("Serialization error: {0}")]
    SerializeError(String),
}
