//! The fixed set of parametric adjustments.
//!
//! Each [`AdjustmentId`] owns a value range, an identity default and one pure
//! transform over a linear BT.2020 RGB triple. Transforms never clamp, so
//! values above 1.0 survive.
//!
//! | Id | Range | Default | Transform |
//! |----|-------|---------|-----------|
//! | `exposure` | [-2, 2] stops | 0 | `rgb * 2^v` |
//! | `contrast` | [0.5, 1.5] | 1 | `(rgb - 0.18) * v + 0.18` |
//! | `saturation` | [0, 2] | 1 | `luma + (rgb - luma) * v` |
//! | `sepia` | [0, 1] | 1 | `mix(rgb, sepia * rgb, v)` |

use crate::{OpsError, OpsResult};
use hdredit_core::luminance_rec2020;
use serde::{Deserialize, Serialize};
use std::fmt;
use std::ops::RangeInclusive;
use std::str::FromStr;

/// Linear mid-gray used as the contrast pivot.
pub const CONTRAST_PIVOT: f32 = 0.18;

/// Sepia tone matrix, rows produce R, G, B.
pub const SEPIA_MATRIX: [[f32; 3]; 3] = [
    [0.393, 0.769, 0.189],
    [0.349, 0.686, 0.168],
    [0.272, 0.534, 0.131],
];

/// Adjustment identifier, in canonical evaluation order.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum AdjustmentId {
    /// Exposure in stops.
    Exposure,
    /// Contrast around linear mid-gray.
    Contrast,
    /// Saturation around BT.2020 luma.
    Saturation,
    /// Sepia tone intensity.
    Sepia,
}

impl AdjustmentId {
    /// All identifiers in canonical order.
    pub const ALL: [AdjustmentId; 4] = [Self::Exposure, Self::Contrast, Self::Saturation, Self::Sepia];

    /// Position in the canonical order.
    #[inline]
    pub const fn index(self) -> usize {
        self as usize
    }

    /// Lowercase name, as used in persisted edits.
    pub const fn name(self) -> &'static str {
        match self {
            Self::Exposure => "exposure",
            Self::Contrast => "contrast",
            Self::Saturation => "saturation",
            Self::Sepia => "sepia",
        }
    }

    /// Identity value.
    pub const fn default_value(self) -> f64 {
        match self {
            Self::Exposure => 0.0,
            Self::Contrast => 1.0,
            Self::Saturation => 1.0,
            Self::Sepia => 1.0,
        }
    }

    /// Accepted value range.
    pub const fn range(self) -> RangeInclusive<f64> {
        match self {
            Self::Exposure => -2.0..=2.0,
            Self::Contrast => 0.5..=1.5,
            Self::Saturation => 0.0..=2.0,
            Self::Sepia => 0.0..=1.0,
        }
    }

    /// Clamps `value` into [`range`](Self::range). NaN becomes the default.
    pub fn clamp(self, value: f64) -> f64 {
        if value.is_nan() {
            return self.default_value();
        }
        let r = self.range();
        value.clamp(*r.start(), *r.end())
    }

    /// Applies this adjustment to a linear RGB triple.
    #[inline]
    pub fn apply(self, rgb: [f32; 3], value: f32) -> [f32; 3] {
        match self {
            Self::Exposure => {
                let gain = value.exp2();
                [rgb[0] * gain, rgb[1] * gain, rgb[2] * gain]
            }
            Self::Contrast => rgb.map(|c| (c - CONTRAST_PIVOT) * value + CONTRAST_PIVOT),
            Self::Saturation => {
                let luma = luminance_rec2020(rgb);
                rgb.map(|c| luma + (c - luma) * value)
            }
            Self::Sepia => {
                let toned = SEPIA_MATRIX
                    .map(|row| row[0] * rgb[0] + row[1] * rgb[1] + row[2] * rgb[2]);
                [
                    rgb[0] + (toned[0] - rgb[0]) * value,
                    rgb[1] + (toned[1] - rgb[1]) * value,
                    rgb[2] + (toned[2] - rgb[2]) * value,
                ]
            }
        }
    }
}

impl fmt::Display for AdjustmentId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.name())
    }
}

impl FromStr for AdjustmentId {
    type Err = OpsError;

    fn from_str(s: &str) -> OpsResult<Self> {
        Self::ALL
            .into_iter()
            .find(|id| id.name().eq_ignore_ascii_case(s.trim()))
            .ok_or_else(|| OpsError::UnknownAdjustment(s.to_string()))
    }
}

/// One entry of an adjustment chain.
///
/// The value is kept inside the id's range by every constructor, including
/// deserialization.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
#[serde(from = "AdjustmentRecord")]
pub struct Adjustment {
    /// Which adjustment this is.
    pub id: AdjustmentId,
    /// Disabled entries are pass-through.
    pub enabled: bool,
    value: f64,
}

/// Unvalidated wire form of [`Adjustment`].
#[derive(Deserialize)]
struct AdjustmentRecord {
    #[serde(alias = "identifier")]
    id: AdjustmentId,
    #[serde(default)]
    enabled: bool,
    value: Option<f64>,
}

impl From<AdjustmentRecord> for Adjustment {
    fn from(rec: AdjustmentRecord) -> Self {
        let value = rec.value.unwrap_or_else(|| rec.id.default_value());
        Self::new(rec.id, rec.enabled, value)
    }
}

impl Adjustment {
    /// Creates an entry, clamping `value`.
    pub fn new(id: AdjustmentId, enabled: bool, value: f64) -> Self {
        Self {
            id,
            enabled,
            value: id.clamp(value),
        }
    }

    /// Disabled entry at the identity default.
    pub fn identity(id: AdjustmentId) -> Self {
        Self::new(id, false, id.default_value())
    }

    /// Current value, always in range.
    #[inline]
    pub fn value(&self) -> f64 {
        self.value
    }

    /// Sets the value, clamping it.
    pub fn set_value(&mut self, value: f64) {
        self.value = self.id.clamp(value);
    }

    /// Applies the entry to an RGB triple; disabled entries return it as is.
    #[inline]
    pub fn apply(&self, rgb: [f32; 3]) -> [f32; 3] {
        if self.enabled {
            self.id.apply(rgb, self.value as f32)
        } else {
            rgb
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use approx::assert_relative_eq;

    const EPSILON: f32 = 1e-5;

    fn assert_rgb(a: [f32; 3], b: [f32; 3]) {
        for i in 0..3 {
            assert_relative_eq!(a[i], b[i], epsilon = EPSILON);
        }
    }

    #[test]
    fn tonal_defaults_are_identity() {
        // Sepia defaults to full intensity and is the only non-identity default.
        let rgb = [0.3, 1.7, 0.05];
        for id in [AdjustmentId::Exposure, AdjustmentId::Contrast, AdjustmentId::Saturation] {
            assert_rgb(id.apply(rgb, id.default_value() as f32), rgb);
        }
    }

    #[test]
    fn exposure_doubles_per_stop() {
        assert_rgb(AdjustmentId::Exposure.apply([0.25, 0.5, 2.0], 1.0), [0.5, 1.0, 4.0]);
        assert_rgb(AdjustmentId::Exposure.apply([0.5, 0.5, 0.5], -2.0), [0.125, 0.125, 0.125]);
    }

    #[test]
    fn contrast_keeps_pivot() {
        let gray = [CONTRAST_PIVOT; 3];
        assert_rgb(AdjustmentId::Contrast.apply(gray, 1.5), gray);
        let out = AdjustmentId::Contrast.apply([0.28, 0.08, 4.0], 1.5);
        assert_rgb(out, [0.33, 0.03, 5.91]);
    }

    #[test]
    fn zero_saturation_is_luma() {
        let out = AdjustmentId::Saturation.apply([1.0, 0.0, 0.0], 0.0);
        assert_rgb(out, [0.2627, 0.2627, 0.2627]);
    }

    #[test]
    fn sepia_zero_is_identity() {
        let rgb = [0.9, 0.1, 0.4];
        assert_rgb(AdjustmentId::Sepia.apply(rgb, 0.0), rgb);
    }

    #[test]
    fn hdr_values_are_not_clamped() {
        let out = AdjustmentId::Exposure.apply([8.0, 8.0, 8.0], 2.0);
        assert_rgb(out, [32.0, 32.0, 32.0]);
    }

    #[test]
    fn values_are_clamped() {
        assert_eq!(Adjustment::new(AdjustmentId::Exposure, true, 5.0).value(), 2.0);
        assert_eq!(Adjustment::new(AdjustmentId::Contrast, true, 0.0).value(), 0.5);
        assert_eq!(Adjustment::new(AdjustmentId::Sepia, true, f64::NAN).value(), 1.0);

        let mut adj = Adjustment::identity(AdjustmentId::Saturation);
        adj.set_value(-3.0);
        assert_eq!(adj.value(), 0.0);
    }

    #[test]
    fn parse_names() {
        assert_eq!("Exposure".parse::<AdjustmentId>().unwrap(), AdjustmentId::Exposure);
        assert_eq!(" sepia ".parse::<AdjustmentId>().unwrap(), AdjustmentId::Sepia);
        assert!(matches!("vibrance".parse::<AdjustmentId>(), Err(OpsError::UnknownAdjustment(_))));
    }

    #[test]
    fn record_deserialization_clamps() {
        let adj: Adjustment = serde_json::from_str(r#"{"id":"exposure","enabled":true,"value":9.5}"#).unwrap();
        assert_eq!(adj.value(), 2.0);

        let adj: Adjustment = serde_json::from_str(r#"{"identifier":"contrast","enabled":true,"value":1.2}"#).unwrap();
        assert_eq!(adj.id, AdjustmentId::Contrast);
        assert!(adj.enabled);
    }
}
