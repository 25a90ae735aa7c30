//! SMPTE ST 2084 Perceptual Quantizer (PQ).
//!
//! # Range
//!
//! - Encoded: [0, 1]
//! - Linear: [0, 10000] cd/m²
//!
//! The editing pipeline works in relative scene-linear values where `1.0` is
//! SDR reference white. [`encode_relative`] / [`decode_relative`] map that
//! scale onto absolute luminance using [`REFERENCE_WHITE_NITS`]
//! (ITU-R BT.2408).
//!
//! ```rust
//! use hdredit_transfer::pq;
//!
//! // Reference white lands at ~58% signal.
//! let signal = pq::encode_relative(1.0);
//! assert!((signal - 0.58).abs() < 0.01);
//! ```

/// Peak luminance representable by PQ, in cd/m².
pub const L_MAX: f32 = 10000.0;

/// Luminance of relative `1.0`, in cd/m².
pub const REFERENCE_WHITE_NITS: f32 = 203.0;

const M1: f32 = 2610.0 / 16384.0;
const M2: f32 = 2523.0 / 4096.0 * 128.0;
const C1: f32 = 3424.0 / 4096.0;
const C2: f32 = 2413.0 / 4096.0 * 32.0;
const C3: f32 = 2392.0 / 4096.0 * 32.0;

/// Inverse EOTF: absolute luminance (cd/m²) to PQ signal.
///
/// Input above [`L_MAX`] saturates at `1.0`; non-positive input gives `0.0`.
#[inline]
pub fn oetf(nits: f32) -> f32 {
    if !(nits > 0.0) {
        return 0.0;
    }
    let y = (nits / L_MAX).min(1.0);
    let yp = y.powf(M1);
    ((C1 + C2 * yp) / (1.0 + C3 * yp)).powf(M2)
}

/// EOTF: PQ signal to absolute luminance (cd/m²).
#[inline]
pub fn eotf(signal: f32) -> f32 {
    if !(signal > 0.0) {
        return 0.0;
    }
    let vp = signal.min(1.0).powf(1.0 / M2);
    let num = (vp - C1).max(0.0);
    L_MAX * (num / (C2 - C3 * vp)).powf(1.0 / M1)
}

/// Encodes a relative linear value (1.0 = reference white).
#[inline]
pub fn encode_relative(linear: f32) -> f32 {
    oetf(linear * REFERENCE_WHITE_NITS)
}

/// Decodes a PQ signal to a relative linear value (1.0 = reference white).
#[inline]
pub fn decode_relative(signal: f32) -> f32 {
    eotf(signal) / REFERENCE_WHITE_NITS
}
