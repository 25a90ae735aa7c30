//! Persisted edits.
//!
//! An edit is stored next to the rendered image as an [`AdjustmentData`]
//! blob: a format identifier, a format version and a JSON body listing the
//! chain's records in canonical order:
//!
//! ```text
//! [{"id":"exposure","enabled":true,"value":0.5},
//!  {"id":"contrast","enabled":false,"value":1.0}, ...]
//! ```
//!
//! Loading is strict about the tags: any identifier or version mismatch, or a
//! body that does not decode to a complete chain, is a cache miss and yields
//! `None`. Callers then fall back to the default chain.
//!
//! ```rust
//! use hdredit_io::persist;
//! use hdredit_ops::{AdjustmentChain, AdjustmentId};
//!
//! let mut chain = AdjustmentChain::new();
//! chain.set(AdjustmentId::Sepia, Some(true), Some(0.3));
//!
//! let blob = persist::save(&chain).unwrap();
//! assert_eq!(persist::load(&blob), Some(chain));
//! ```

use crate::{IoError, IoResult};
use hdredit_ops::AdjustmentChain;
use serde::{Deserialize, Serialize};
use tracing::debug;

/// Identifier written into every blob.
pub const FORMAT_IDENTIFIER: &str = "org.hdredit.edits";

/// Version written into every blob.
pub const FORMAT_VERSION: &str = "1.0";

/// Opaque edit blob, as stored alongside an image.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct AdjustmentData {
    /// Producer identifier.
    pub format_identifier: String,
    /// Producer format version.
    pub format_version: String,
    /// Encoded chain.
    pub data: Vec<u8>,
}

impl AdjustmentData {
    /// Wraps raw bytes with explicit tags.
    pub fn new(format_identifier: impl Into<String>, format_version: impl Into<String>, data: Vec<u8>) -> Self {
        Self {
            format_identifier: format_identifier.into(),
            format_version: format_version.into(),
            data,
        }
    }
}

/// `true` if the blob's tags match this build.
pub fn can_load(blob: &AdjustmentData) -> bool {
    blob.format_identifier == FORMAT_IDENTIFIER && blob.format_version == FORMAT_VERSION
}

/// Encodes a chain. `None` only if serialization fails.
pub fn save(chain: &AdjustmentChain) -> Option<AdjustmentData> {
    match serde_json::to_vec(chain) {
        Ok(data) => Some(AdjustmentData::new(FORMAT_IDENTIFIER, FORMAT_VERSION, data)),
        Err(e) => {
            debug!(error = %e, "persist::save failed");
            None
        }
    }
}

/// Decodes a chain, or `None` on tag mismatch or malformed body.
pub fn load(blob: &AdjustmentData) -> Option<AdjustmentChain> {
    match try_load(blob) {
        Ok(chain) => Some(chain),
        Err(e) => {
            debug!(error = %e, "persisted edits ignored");
            None
        }
    }
}

/// Decodes a chain, or the default chain when the blob cannot be used.
pub fn load_or_default(blob: Option<&AdjustmentData>) -> AdjustmentChain {
    blob.and_then(load).unwrap_or_default()
}

/// Like [`load`], with the reason for a miss.
///
/// # Errors
///
/// [`IoError::FormatMismatch`] for foreign tags, [`IoError::DecodeError`]
/// for a body that is not a complete chain.
pub fn try_load(blob: &AdjustmentData) -> IoResult<AdjustmentChain> {
    if !can_load(blob) {
        return Err(IoError::FormatMismatch {
            expected: format!("{FORMAT_IDENTIFIER} {FORMAT_VERSION}"),
            found: format!("{} {}", blob.format_identifier, blob.format_version),
        });
    }
    serde_json::from_slice(&blob.data).map_err(|e| IoError::DecodeError(e.to_string()))
}
