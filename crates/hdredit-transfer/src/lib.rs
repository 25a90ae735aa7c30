//! # hdredit-transfer
//!
//! Transfer functions used by the HDR editing pipeline.
//!
//! | Function | Use | Linear scale |
//! |----------|-----|--------------|
//! | [`pq`] | HDR export and preview (default) | relative, 1.0 = 203 cd/m² |
//! | [`hlg`] | HDR export and preview for HLG sources | relative, 1.0 = 75% signal |
//! | [`srgb`] | Decoding SDR sources | display [0, 1] |
//!
//! [`TransferFunction`] selects between the two HDR encodings at runtime and
//! carries the matching CICP code point (ITU-T H.273).
//!
//! # Used By
//!
//! - `hdredit-io` - source decoding, PNG/HEIF encoding
//! - `hdredit-render` - preview buffers and color resolution

#![warn(missing_docs)]
#![warn(rustdoc::missing_crate_level_docs)]

pub mod hlg;
pub mod pq;
pub mod srgb;

use serde::{Deserialize, Serialize};
use std::fmt;

/// HDR transfer function selected for an output.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Default, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum TransferFunction {
    /// SMPTE ST 2084.
    #[default]
    Pq,
    /// ARIB STD-B67 / BT.2100 HLG.
    Hlg,
}

impl TransferFunction {
    /// CICP `TransferCharacteristics` code point.
    pub const fn cicp(self) -> u8 {
        match self {
            Self::Pq => 16,
            Self::Hlg => 18,
        }
    }

    /// Encodes a relative linear value to a signal in [0, 1].
    #[inline]
    pub fn encode(self, linear: f32) -> f32 {
        let signal = match self {
            Self::Pq => pq::encode_relative(linear),
            Self::Hlg => hlg::encode_relative(linear),
        };
        signal.clamp(0.0, 1.0)
    }

    /// Decodes a signal to a relative linear value.
    #[inline]
    pub fn decode(self, signal: f32) -> f32 {
        match self {
            Self::Pq => pq::decode_relative(signal),
            Self::Hlg => hlg::decode_relative(signal),
        }
    }

    /// Encodes an RGB triple.
    #[inline]
    pub fn encode_rgb(self, rgb: [f32; 3]) -> [f32; 3] {
        [self.encode(rgb[0]), self.encode(rgb[1]), self.encode(rgb[2])]
    }
}

impl fmt::Display for TransferFunction {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(match self {
            Self::Pq => "pq",
            Self::Hlg => "hlg",
        })
    }
}
