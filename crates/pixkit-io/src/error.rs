//! Codec error type
//!
//! Every reader and writer in this crate reports an [`IoError`]. Failures
//! from the `png` and `jpeg-*` crates arrive as decode/encode messages;
//! header and raster problems found by the hand-written codecs are
//! [`IoError::InvalidData`] or [`IoError::UnsupportedFormat`].

use thiserror::Error;

/// Why a decode or encode failed
#[derive(Error, Debug)]
pub enum IoError {
    /// Opening, reading or writing a stream failed
    #[error("I/O error: {0}")]
    Io(#[from] std::io::Error),

    /// Unknown magic number, disabled format, or a variant of a known
    /// format this crate does not handle (e.g. a BMP bit count of 2)
    #[error("unsupported format: {0}")]
    UnsupportedFormat(String),

    /// Malformed or truncated header or pixel data
    #[error("invalid image data: {0}")]
    InvalidData(String),

    /// The declared image is larger than the decoder's [`Limits`](crate::Limits)
    #[error("limit exceeded: {0}")]
    LimitExceeded(String),

    /// The PNG or JPEG decoder rejected the stream
    #[error("decode error: {0}")]
    DecodeError(String),

    /// The PNG or JPEG encoder rejected the image
    #[error("encode error: {0}")]
    EncodeError(String),

    /// A pixel store check failed (e.g. an index past the palette)
    #[error("image error: {0}")]
    Core(#[from] pixkit_core::Error),
}

/// Result of a codec operation
pub type IoResult<T> = Result<T, IoError>;
