//! # hdredit-primaries
//!
//! RGB primaries, gamut conversion matrices and the CICP tags (ITU-T H.273)
//! written into HDR outputs.
//!
//! The editing working space is linear BT.2020; decoders bring sources into it
//! with [`to_working_matrix`]:
//!
//! ```rust
//! use hdredit_core::ColorSpaceHint;
//! use hdredit_primaries::{apply, to_working_matrix};
//!
//! let m = to_working_matrix(Some(ColorSpaceHint::Srgb));
//! let white = apply(&m, [1.0, 1.0, 1.0]);
//! assert!((white[1] - 1.0).abs() < 1e-4);
//! ```

#![warn(missing_docs)]
#![warn(rustdoc::missing_crate_level_docs)]

pub mod cicp;

pub use cicp::{ColorPrimaries, YCbCrMatrix};

use glam::{Mat3, Vec3};
use hdredit_core::ColorSpaceHint;

/// RGB color space primaries and white point as CIE xy chromaticities.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct Primaries {
    /// Red primary (x, y)
    pub r: (f32, f32),
    /// Green primary (x, y)
    pub g: (f32, f32),
    /// Blue primary (x, y)
    pub b: (f32, f32),
    /// White point (x, y)
    pub w: (f32, f32),
    /// Display name
    pub name: &'static str,
}

/// D65 white point.
pub const D65_XY: (f32, f32) = (0.31270, 0.32900);

/// ITU-R BT.709 / sRGB.
pub const REC709: Primaries = Primaries {
    r: (0.640, 0.330),
    g: (0.300, 0.600),
    b: (0.150, 0.060),
    w: D65_XY,
    name: "Rec.709",
};

/// ITU-R BT.2020 / BT.2100.
pub const REC2020: Primaries = Primaries {
    r: (0.708, 0.292),
    g: (0.170, 0.797),
    b: (0.131, 0.046),
    w: D65_XY,
    name: "Rec.2020",
};

/// Display P3 (DCI-P3 primaries, D65 white).
pub const DISPLAY_P3: Primaries = Primaries {
    r: (0.680, 0.320),
    g: (0.265, 0.690),
    b: (0.150, 0.060),
    w: D65_XY,
    name: "Display P3",
};

#[inline]
fn xy_to_xyz(x: f32, y: f32) -> Vec3 {
    Vec3::new(x / y, 1.0, (1.0 - x - y) / y)
}

/// Normalized primary matrix: linear RGB to CIE XYZ.
pub fn rgb_to_xyz_matrix(p: &Primaries) -> Mat3 {
    let r = xy_to_xyz(p.r.0, p.r.1);
    let g = xy_to_xyz(p.g.0, p.g.1);
    let b = xy_to_xyz(p.b.0, p.b.1);
    let m = Mat3::from_cols(r, g, b);
    // Column scales such that RGB (1,1,1) maps to the white point.
    let s = m.inverse() * xy_to_xyz(p.w.0, p.w.1);
    Mat3::from_cols(r * s.x, g * s.y, b * s.z)
}

/// Linear RGB in `src` primaries to linear RGB in `dst` primaries.
///
/// Both spaces in this crate share D65, so no chromatic adaptation is applied.
pub fn rgb_to_rgb_matrix(src: &Primaries, dst: &Primaries) -> Mat3 {
    rgb_to_xyz_matrix(dst).inverse() * rgb_to_xyz_matrix(src)
}

/// Primaries a source was authored in, by hint.
///
/// BT.2100 hints are BT.2020. Unknown or absent hints are treated as sRGB
/// content, which is what untagged PNG and Radiance files carry.
pub fn primaries_for(hint: Option<ColorSpaceHint>) -> &'static Primaries {
    match hint {
        Some(ColorSpaceHint::Srgb | ColorSpaceHint::LinearSrgb) => &REC709,
        Some(ColorSpaceHint::DisplayP3) => &DISPLAY_P3,
        Some(ColorSpaceHint::Bt2100Hlg | ColorSpaceHint::Bt2100Pq | ColorSpaceHint::LinearBt2020) => &REC2020,
        Some(ColorSpaceHint::Unknown) | None => &REC709,
    }
}

/// Matrix bringing linear RGB in the hinted primaries into linear BT.2020.
pub fn to_working_matrix(hint: Option<ColorSpaceHint>) -> Mat3 {
    let src = primaries_for(hint);
    if src == &REC2020 {
        Mat3::IDENTITY
    } else {
        rgb_to_rgb_matrix(src, &REC2020)
    }
}

/// Applies a 3x3 matrix to an RGB triple.
#[inline]
pub fn apply(m: &Mat3, rgb: [f32; 3]) -> [f32; 3] {
    (*m * Vec3::from_array(rgb)).to_array()
}
