//! Output color description and encoder dispatch.
//!
//! Every encoder takes a working-space [`Image`] plus an [`HdrColorInfo`] and
//! produces non-linear signal values with [`signal_rgb`]: gamut conversion
//! out of BT.2020 when needed, then the HDR transfer function.

use crate::{ContentType, IoError, IoResult};
use hdredit_core::Image;
use hdredit_primaries::{ColorPrimaries, REC2020, YCbCrMatrix, apply, rgb_to_rgb_matrix};
use hdredit_transfer::TransferFunction;
use serde::{Deserialize, Serialize};
use std::fmt;

/// Color tags for an HDR output: transfer, primaries and Y'CbCr matrix.
///
/// The default is BT.2100 PQ with BT.2020 primaries, which is also the
/// fallback used when a source carries no color space.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Default, Serialize, Deserialize)]
pub struct HdrColorInfo {
    /// Transfer function.
    pub transfer: TransferFunction,
    /// Color primaries.
    pub primaries: ColorPrimaries,
    /// Y'CbCr matrix, used by subsampled outputs.
    pub matrix: YCbCrMatrix,
}

impl HdrColorInfo {
    /// BT.2100 with the given transfer.
    pub const fn bt2100(transfer: TransferFunction) -> Self {
        Self {
            transfer,
            primaries: ColorPrimaries::Bt2020,
            matrix: YCbCrMatrix::Bt2020Ncl,
        }
    }

    /// CICP quadruple `[primaries, transfer, matrix, full_range]` for RGB
    /// outputs (matrix 0, identity).
    pub const fn cicp_rgb(&self) -> [u8; 4] {
        [self.primaries.cicp(), self.transfer.cicp(), 0, 1]
    }
}

impl fmt::Display for HdrColorInfo {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}/{}/{}", self.primaries, self.transfer, self.matrix)
    }
}

/// Converts a working-space RGB triple to encoded signal values in [0, 1].
pub struct SignalEncoder {
    gamut: Option<glam::Mat3>,
    transfer: TransferFunction,
}

impl SignalEncoder {
    /// Prepares an encoder for `color`.
    pub fn new(color: &HdrColorInfo) -> Self {
        let dst = color.primaries.primaries();
        let gamut = (dst != &REC2020).then(|| rgb_to_rgb_matrix(&REC2020, dst));
        Self {
            gamut,
            transfer: color.transfer,
        }
    }

    /// Encodes one pixel.
    #[inline]
    pub fn encode(&self, rgb: [f32; 3]) -> [f32; 3] {
        let rgb = match &self.gamut {
            Some(m) => apply(m, rgb),
            None => rgb,
        };
        self.transfer.encode_rgb(rgb)
    }
}

/// Encoded signal for one working-space pixel.
pub fn signal_rgb(rgb: [f32; 3], color: &HdrColorInfo) -> [f32; 3] {
    SignalEncoder::new(color).encode(rgb)
}

/// Quantizes a [0, 1] signal to an unsigned integer of `bits` bits.
#[inline]
pub fn quantize(signal: f32, bits: u32) -> u16 {
    let max = ((1u32 << bits) - 1) as f32;
    (signal.clamp(0.0, 1.0) * max).round() as u16
}

/// Encodes `image` as `content_type`.
///
/// # Errors
///
/// [`IoError::UnsupportedFormat`] for [`ContentType::Other`], encoder errors
/// otherwise. Zero-area images are rejected by the encoders.
pub fn encode(image: &Image, content_type: &ContentType, color: &HdrColorInfo) -> IoResult<Vec<u8>> {
    match content_type {
        ContentType::Png => crate::png::encode_rgba16(image, color),
        ContentType::Heif => crate::heif::encode_heif10(image, color),
        ContentType::Other(name) => Err(IoError::UnsupportedFormat(format!("cannot write {name}"))),
    }
}
