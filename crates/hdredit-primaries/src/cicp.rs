//! Coding-independent code points (ITU-T H.273) for primaries and Y'CbCr
//! matrices.
//!
//! Transfer characteristics live next to the curves in `hdredit-transfer`.

use serde::{Deserialize, Serialize};
use std::fmt;

use crate::{DISPLAY_P3, Primaries, REC709, REC2020};

/// Color primaries tag written to containers and buffer attachments.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Default, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum ColorPrimaries {
    /// BT.709 / sRGB.
    Bt709,
    /// BT.2020 / BT.2100.
    #[default]
    Bt2020,
    /// SMPTE EG 432-1 (Display P3).
    DisplayP3,
}

impl ColorPrimaries {
    /// CICP `ColourPrimaries` code point.
    pub const fn cicp(self) -> u8 {
        match self {
            Self::Bt709 => 1,
            Self::Bt2020 => 9,
            Self::DisplayP3 => 12,
        }
    }

    /// Chromaticities for this tag.
    pub fn primaries(self) -> &'static Primaries {
        match self {
            Self::Bt709 => &REC709,
            Self::Bt2020 => &REC2020,
            Self::DisplayP3 => &DISPLAY_P3,
        }
    }
}

impl fmt::Display for ColorPrimaries {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(match self {
            Self::Bt709 => "bt709",
            Self::Bt2020 => "bt2020",
            Self::DisplayP3 => "display-p3",
        })
    }
}

/// Y'CbCr matrix coefficients.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Default, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum YCbCrMatrix {
    /// BT.709.
    Bt709,
    /// BT.2020 non-constant luminance.
    #[default]
    Bt2020Ncl,
}

impl YCbCrMatrix {
    /// CICP `MatrixCoefficients` code point.
    pub const fn cicp(self) -> u8 {
        match self {
            Self::Bt709 => 1,
            Self::Bt2020Ncl => 9,
        }
    }

    /// `(Kr, Kb)` luma coefficients.
    pub const fn coefficients(self) -> (f32, f32) {
        match self {
            Self::Bt709 => (0.2126, 0.0722),
            Self::Bt2020Ncl => (0.2627, 0.0593),
        }
    }

    /// Converts non-linear R'G'B' in [0, 1] to `(Y', Cb, Cr)`.
    ///
    /// `Y'` is in [0, 1]; `Cb` and `Cr` are in [-0.5, 0.5].
    #[inline]
    pub fn rgb_to_ycbcr(self, rgb: [f32; 3]) -> [f32; 3] {
        let (kr, kb) = self.coefficients();
        let kg = 1.0 - kr - kb;
        let y = kr * rgb[0] + kg * rgb[1] + kb * rgb[2];
        let cb = (rgb[2] - y) / (2.0 * (1.0 - kb));
        let cr = (rgb[0] - y) / (2.0 * (1.0 - kr));
        [y, cb, cr]
    }

    /// Inverse of [`rgb_to_ycbcr`](Self::rgb_to_ycbcr).
    #[inline]
    pub fn ycbcr_to_rgb(self, ycc: [f32; 3]) -> [f32; 3] {
        let (kr, kb) = self.coefficients();
        let kg = 1.0 - kr - kb;
        let [y, cb, cr] = ycc;
        let r = y + 2.0 * (1.0 - kr) * cr;
        let b = y + 2.0 * (1.0 - kb) * cb;
        let g = (y - kr * r - kb * b) / kg;
        [r, g, b]
    }
}

impl fmt::Display for YCbCrMatrix {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(match self {
            Self::Bt709 => "bt709",
            Self::Bt2020Ncl => "bt2020-ncl",
        })
    }
}
