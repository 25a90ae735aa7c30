//! Error types for rendering and export.

use hdredit_io::IoError;
use std::time::Duration;
use thiserror::Error;

/// Rendering or export error.
///
/// Errors are `Clone` so the render lane can report them to a session and the
/// session can keep the most recent one.
#[derive(Debug, Error, Clone, PartialEq)]
pub enum RenderError {
    /// Preview buffer could not be allocated.
    #[error("allocation failed: {0}")]
    Allocation(#[from] hdredit_core::Error),

    /// Compositing or buffer fill failed.
    #[error("render failed: {0}")]
    Render(String),

    /// Encoder reported an error.
    #[error("encode failed: {0}")]
    Encode(String),

    /// Output type has no encoder.
    #[error("unsupported content type: {0}")]
    UnsupportedContentType(String),

    /// Writing the export failed.
    #[error("write failed: {0}")]
    Io(String),

    /// The render lane has shut down.
    #[error("render lane closed")]
    LaneClosed,

    /// The render lane did not answer within the deadline.
    #[error("render did not finish within {0:?}")]
    Timeout(Duration),
}

impl From<IoError> for RenderError {
    fn from(e: IoError) -> Self {
        match e {
            IoError::UnsupportedFormat(what) => Self::UnsupportedContentType(what),
            IoError::Io(e) => Self::Io(e.to_string()),
            other => Self::Encode(other.to_string()),
        }
    }
}

impl From<std::io::Error> for RenderError {
    fn from(e: std::io::Error) -> Self {
        Self::Io(e.to_string())
    }
}

/// Result type for rendering and export.
pub type RenderResult<T> = Result<T, RenderError>;
