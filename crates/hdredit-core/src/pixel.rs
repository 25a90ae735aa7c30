//! Luminance weights for the BT.2020 working space.
//!
//! `Y = 0.2627*R + 0.6780*G + 0.0593*B` (ITU-R BT.2020, Table 4). The same
//! coefficients drive saturation in `hdredit-ops` and the Y'CbCr matrix used for
//! preview buffers.

/// BT.2020 luminance coefficient for red channel.
pub const REC2020_LUMA_R: f32 = 0.2627;

/// BT.2020 luminance coefficient for green channel.
pub const REC2020_LUMA_G: f32 = 0.6780;

/// BT.2020 luminance coefficient for blue channel.
pub const REC2020_LUMA_B: f32 = 0.0593;

/// BT.2020 luminance coefficients as an array [R, G, B].
pub const REC2020_LUMA: [f32; 3] = [REC2020_LUMA_R, REC2020_LUMA_G, REC2020_LUMA_B];

/// Relative luminance of a linear BT.2020 triple.
///
/// ```
/// use hdredit_core::luminance_rec2020;
///
/// assert!((luminance_rec2020([1.0, 1.0, 1.0]) - 1.0).abs() < 1e-6);
/// ```
#[inline]
pub fn luminance_rec2020(rgb: [f32; 3]) -> f32 {
    rgb[0] * REC2020_LUMA_R + rgb[1] * REC2020_LUMA_G + rgb[2] * REC2020_LUMA_B
}

#[cfg(test)]
mod tests {
    use super::*;
    use approx::assert_relative_eq;

    #[test]
    fn weights_sum_to_one() {
        assert_relative_eq!(REC2020_LUMA.iter().sum::<f32>(), 1.0, epsilon = 1e-6);
    }

    #[test]
    fn gray_luma_is_gray() {
        assert_relative_eq!(luminance_rec2020([0.18, 0.18, 0.18]), 0.18, epsilon = 1e-6);
    }
}
