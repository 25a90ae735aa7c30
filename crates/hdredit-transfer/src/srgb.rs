//! sRGB piecewise curve (IEC 61966-2-1), used when decoding SDR sources.
//!
//! Decoding is extended symmetrically around zero so that values which went
//! negative in a wide-gamut round trip are not folded onto black.

/// Decodes an sRGB-encoded value to linear light.
#[inline]
pub fn eotf(v: f32) -> f32 {
    let a = v.abs();
    let l = if a <= 0.04045 {
        a / 12.92
    } else {
        ((a + 0.055) / 1.055).powf(2.4)
    };
    l.copysign(v)
}

/// Encodes linear light as sRGB.
#[inline]
pub fn oetf(l: f32) -> f32 {
    let a = l.abs();
    let v = if a <= 0.003_130_8 {
        a * 12.92
    } else {
        1.055 * a.powf(1.0 / 2.4) - 0.055
    };
    v.copysign(l)
}

/// Builds a decode table for integer samples of the given bit depth.
///
/// Entry `i` holds `eotf(i / max)`. Used by decoders to avoid a `powf` per
/// sample.
pub fn decode_table(bits: u8) -> Vec<f32> {
    let max = ((1u32 << bits) - 1) as f32;
    (0..=(1u32 << bits) - 1).map(|i| eotf(i as f32 / max)).collect()
}
