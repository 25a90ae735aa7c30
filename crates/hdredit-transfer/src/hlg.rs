//! Hybrid Log-Gamma (ITU-R BT.2100).
//!
//! The OETF maps scene light `E` in [0, 1] to signal `E'` in [0, 1]:
//!
//! ```text
//! E' = sqrt(3 * E)               E <= 1/12
//! E' = A * ln(12*E - B) + C      otherwise
//! ```
//!
//! Relative working values are placed so that `1.0` (reference white) lands at
//! the BT.2408 reference level of 75% signal, i.e. scene light
//! [`REFERENCE_WHITE_SCENE`].

const A: f32 = 0.178_832_77;
const B: f32 = 0.284_668_92;
const C: f32 = 0.559_910_73;

/// Scene light that encodes to 75% HLG signal.
pub const REFERENCE_WHITE_SCENE: f32 = 0.2647;

/// OETF: scene-linear light to HLG signal.
#[inline]
pub fn oetf(e: f32) -> f32 {
    if !(e > 0.0) {
        0.0
    } else if e <= 1.0 / 12.0 {
        (3.0 * e).sqrt()
    } else {
        A * (12.0 * e - B).ln() + C
    }
}

/// Inverse OETF: HLG signal to scene-linear light.
#[inline]
pub fn inverse_oetf(signal: f32) -> f32 {
    if !(signal > 0.0) {
        0.0
    } else if signal <= 0.5 {
        signal * signal / 3.0
    } else {
        (((signal - C) / A).exp() + B) / 12.0
    }
}

/// Encodes a relative linear value (1.0 = reference white).
#[inline]
pub fn encode_relative(linear: f32) -> f32 {
    oetf(linear * REFERENCE_WHITE_SCENE)
}

/// Decodes an HLG signal to a relative linear value.
#[inline]
pub fn decode_relative(signal: f32) -> f32 {
    inverse_oetf(signal) / REFERENCE_WHITE_SCENE
}
