//! Filter engine: evaluates an [`AdjustmentChain`] over an [`Image`].
//!
//! [`compose`] is pure. It never touches the chain, performs no I/O and gives
//! bit-identical output for identical input: every pixel is computed
//! independently, so splitting the work across threads cannot change results.
//!
//! ```rust
//! use hdredit_core::Image;
//! use hdredit_ops::{compose, AdjustmentChain, AdjustmentId};
//!
//! let src = Image::filled(8, 8, [0.2, 0.2, 0.2, 1.0]);
//! let mut chain = AdjustmentChain::new();
//! chain.set(AdjustmentId::Exposure, Some(true), Some(1.0));
//!
//! let out = compose(&src, &chain, false);
//! assert!((out.pixel(0, 0)[0] - 0.4).abs() < 1e-6);
//!
//! // Bypass returns the source buffer itself.
//! assert!(compose(&src, &chain, true).shares_data(&src));
//! ```

use crate::AdjustmentChain;
use hdredit_core::{CHANNELS, Image};
use tracing::trace;

#[cfg(feature = "parallel")]
use rayon::prelude::*;

/// Pixels per parallel work item.
#[cfg(feature = "parallel")]
const PIXELS_PER_TASK: usize = 4096;

/// Applies the enabled entries of `chain` to `source`.
///
/// With `bypass` set, or when no entry is enabled, the source is returned
/// unchanged (sharing its buffer). Alpha is never modified.
pub fn compose(source: &Image, chain: &AdjustmentChain, bypass: bool) -> Image {
    if bypass || chain.is_identity() {
        return source.clone();
    }
    trace!(
        width = source.width(),
        height = source.height(),
        enabled = chain.enabled().count(),
        "filter::compose"
    );

    let mut out = source.clone();
    apply_chain_inplace(out.make_mut(), chain);
    out
}

/// Applies `chain` to interleaved RGBA samples in place.
pub fn apply_chain_inplace(data: &mut [f32], chain: &AdjustmentChain) {
    #[cfg(feature = "parallel")]
    data.par_chunks_mut(PIXELS_PER_TASK * CHANNELS)
        .for_each(|block| apply_block(block, chain));

    #[cfg(not(feature = "parallel"))]
    apply_block(data, chain);
}

#[inline]
fn apply_block(block: &mut [f32], chain: &AdjustmentChain) {
    for px in block.chunks_exact_mut(CHANNELS) {
        let rgb = chain.apply([px[0], px[1], px[2]]);
        px[..3].copy_from_slice(&rgb);
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::AdjustmentId;
    use approx::assert_relative_eq;

    fn gradient(w: u32, h: u32) -> Image {
        let mut data = Vec::with_capacity((w * h) as usize * CHANNELS);
        for y in 0..h {
            for x in 0..w {
                let t = (x + y * w) as f32 / (w * h) as f32;
                data.extend_from_slice(&[t * 3.0, 1.0 - t, t * t, 0.5]);
            }
        }
        Image::from_rgba(w, h, data).unwrap()
    }

    #[test]
    fn disabled_entries_are_pass_through() {
        let src = gradient(16, 9);
        let mut chain = AdjustmentChain::new();
        chain.set(AdjustmentId::Exposure, None, Some(1.7));
        chain.set(AdjustmentId::Sepia, None, Some(0.3));
        let out = compose(&src, &chain, false);
        assert_eq!(out.data(), src.data());
    }

    #[test]
    fn bypass_ignores_chain() {
        let src = gradient(4, 4);
        let mut chain = AdjustmentChain::new();
        for id in AdjustmentId::ALL {
            chain.set(id, Some(true), Some(0.7));
        }
        let out = compose(&src, &chain, true);
        assert!(out.shares_data(&src));
        assert_eq!(out, src);
    }

    #[test]
    fn uniform_gray_plus_one_stop() {
        let v = 0.3;
        let src = Image::filled(5, 3, [v, v, v, 1.0]);
        let mut chain = AdjustmentChain::new();
        chain.set(AdjustmentId::Exposure, Some(true), Some(1.0));
        let out = compose(&src, &chain, false);
        for px in out.pixels() {
            assert_relative_eq!(px[0], 2.0 * v, epsilon = 1e-6);
            assert_relative_eq!(px[1], 2.0 * v, epsilon = 1e-6);
            assert_relative_eq!(px[2], 2.0 * v, epsilon = 1e-6);
            assert_eq!(px[3], 1.0);
        }
    }

    #[test]
    fn compose_is_deterministic() {
        let src = gradient(97, 61);
        let mut chain = AdjustmentChain::new();
        chain.set(AdjustmentId::Contrast, Some(true), Some(1.3));
        chain.set(AdjustmentId::Saturation, Some(true), Some(1.6));
        chain.set(AdjustmentId::Sepia, Some(true), Some(0.2));
        let a = compose(&src, &chain, false);
        let b = compose(&src, &chain, false);
        assert_eq!(a.data(), b.data());
        // Source untouched.
        assert_eq!(src, gradient(97, 61));
    }

    #[test]
    fn alpha_is_untouched() {
        let src = gradient(8, 8);
        let mut chain = AdjustmentChain::new();
        chain.set(AdjustmentId::Exposure, Some(true), Some(-2.0));
        let out = compose(&src, &chain, false);
        assert!(out.pixels().all(|px| px[3] == 0.5));
    }

    #[test]
    fn order_is_canonical() {
        // exposure then contrast: (0.18 * 2 - 0.18) * 1.5 + 0.18 = 0.45
        let src = Image::filled(1, 1, [0.18, 0.18, 0.18, 1.0]);
        let mut chain = AdjustmentChain::new();
        chain.set(AdjustmentId::Contrast, Some(true), Some(1.5));
        chain.set(AdjustmentId::Exposure, Some(true), Some(1.0));
        let out = compose(&src, &chain, false);
        assert_relative_eq!(out.pixel(0, 0)[0], 0.45, epsilon = 1e-6);
    }
}
