//! Error types for I/O operations.

use std::io;
use thiserror::Error;

/// I/O operation error.
#[derive(Debug, Error)]
pub enum IoError {
    /// File I/O error.
    #[error("I/O error: {0}")]
    Io(#[from] io::Error),

    /// Unsupported source or output format.
    #[error("unsupported format: {0}")]
    UnsupportedFormat(String),

    /// Invalid or corrupted file.
    #[error("invalid file: {0}")]
    InvalidFile(String),

    /// Decoding error.
    #[error("decode error: {0}")]
    DecodeError(String),

    /// Encoding error.
    #[error("encode error: {0}")]
    EncodeError(String),

    /// Feature requires an optional dependency that is not compiled in.
    #[error("feature unavailable: {0}")]
    UnsupportedFeature(String),

    /// Persisted edits carry a different format identifier or version.
    #[error("format mismatch: expected {expected}, found {found}")]
    FormatMismatch {
        /// Tag this build understands.
        expected: String,
        /// Tag found in the data.
        found: String,
    },

    /// Image buffer error.
    #[error(transparent)]
    Image(#[from] hdredit_core::Error),
}

/// Result type for I/O operations.
pub type IoResult<T> = Result<T, IoError>;
