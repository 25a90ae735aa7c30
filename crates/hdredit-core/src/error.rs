//! Error types for hdredit-core operations.
//!
//! # Usage
//!
//! ```rust
//! use hdredit_core::{Error, Result};
//!
//! fn check(width: u32, height: u32) -> Result<()> {
//!     if width == 0 || height == 0 {
//!         return Err(Error::invalid_dimensions(width, height, "zero area"));
//!     }
//!     Ok(())
//! }
//! assert!(check(0, 4).is_err());
//! ```
//!
//! # Used By
//!
//! - [`crate::image::Image`] - buffer construction
//! - `hdredit-render` - preview buffer allocation

use thiserror::Error;

/// Result type alias using [`Error`] as the error type.
pub type Result<T> = std::result::Result<T, Error>;

/// Errors raised by image buffer construction and allocation.
#[derive(Debug, Error, Clone, PartialEq, Eq)]
pub enum Error {
    /// Memory allocation failed or was refused.
    ///
    /// Returned for zero-area requests, requests whose byte size overflows,
    /// requests above a configured pixel limit, and requests the allocator
    /// cannot satisfy.
    #[error("failed to allocate {requested} bytes: {reason}")]
    AllocationFailed {
        /// Requested size in bytes (0 when the size itself is invalid)
        requested: usize,
        /// Human-readable reason
        reason: String,
    },

    /// Image dimensions are invalid for the requested operation.
    #[error("invalid dimensions {width}x{height}: {reason}")]
    InvalidDimensions {
        /// Requested width
        width: u32,
        /// Requested height
        height: u32,
        /// Reason the dimensions are invalid
        reason: String,
    },

    /// Two buffers that must share a size do not.
    #[error("buffer size mismatch: expected {expected} samples, got {actual}")]
    BufferSizeMismatch {
        /// Expected number of samples
        expected: usize,
        /// Actual number of samples
        actual: usize,
    },
}

impl Error {
    /// Creates an [`Error::AllocationFailed`].
    pub fn allocation_failed(requested: usize, reason: impl Into<String>) -> Self {
        Self::AllocationFailed {
            requested,
            reason: reason.into(),
        }
    }

    /// Creates an [`Error::InvalidDimensions`].
    pub fn invalid_dimensions(width: u32, height: u32, reason: impl Into<String>) -> Self {
        Self::InvalidDimensions {
            width,
            height,
            reason: reason.into(),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn display_mentions_fields() {
        let err = Error::allocation_failed(0, "zero-area buffer 0x16");
        assert!(err.to_string().contains("zero-area"));

        let err = Error::invalid_dimensions(3, 0, "height is zero");
        assert!(err.to_string().contains("3x0"));
    }
}
