//! Source color space hints.
//!
//! Decoders report the color space a source was authored in as a
//! [`ColorSpaceHint`]. The hint travels with the [`Image`](crate::Image) and is
//! consulted when an export or preview chooses its HDR transfer function.
//!
//! The set is closed: producers pick a variant, consumers match on it. Free-form
//! names (ICC descriptions, container tags) go through
//! [`ColorSpaceHint::from_name`], which keeps the old "contains `HLG`"
//! heuristic so names like `kCGColorSpaceITUR_2100_HLG` still classify.

use serde::{Deserialize, Serialize};
use std::fmt;

/// Color space a source image was authored in.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum ColorSpaceHint {
    /// BT.2100 Hybrid Log-Gamma.
    Bt2100Hlg,
    /// BT.2100 Perceptual Quantizer.
    Bt2100Pq,
    /// Display P3 with sRGB transfer.
    DisplayP3,
    /// sRGB.
    Srgb,
    /// Scene-linear Rec.709 primaries (Radiance HDR, linear EXR).
    LinearSrgb,
    /// Scene-linear BT.2020 primaries.
    LinearBt2020,
    /// Named color space with no dedicated variant.
    Unknown,
}

impl ColorSpaceHint {
    /// Classifies a free-form color space name.
    ///
    /// Anything containing `HLG` (case-insensitive) is [`Self::Bt2100Hlg`];
    /// `PQ` / `2084` markers map to [`Self::Bt2100Pq`]. Remaining names are
    /// matched loosely against the other variants.
    ///
    /// ```
    /// use hdredit_core::ColorSpaceHint;
    ///
    /// assert_eq!(ColorSpaceHint::from_name("ITUR_2100_HLG"), ColorSpaceHint::Bt2100Hlg);
    /// assert_eq!(ColorSpaceHint::from_name("itur_2100_PQ"), ColorSpaceHint::Bt2100Pq);
    /// assert_eq!(ColorSpaceHint::from_name("Adobe RGB"), ColorSpaceHint::Unknown);
    /// ```
    pub fn from_name(name: &str) -> Self {
        let upper = name.to_ascii_uppercase();
        if upper.contains("HLG") {
            return Self::Bt2100Hlg;
        }
        if upper.contains("PQ") || upper.contains("2084") {
            return Self::Bt2100Pq;
        }
        let compact: String = upper.chars().filter(|c| c.is_ascii_alphanumeric()).collect();
        if compact.contains("P3") {
            Self::DisplayP3
        } else if compact.contains("LINEAR") && (compact.contains("2020") || compact.contains("2100")) {
            Self::LinearBt2020
        } else if compact.contains("LINEAR") && (compact.contains("SRGB") || compact.contains("709")) {
            Self::LinearSrgb
        } else if compact.contains("SRGB") {
            Self::Srgb
        } else {
            Self::Unknown
        }
    }

    /// Returns `true` for the Hybrid Log-Gamma family.
    #[inline]
    pub fn is_hlg(self) -> bool {
        matches!(self, Self::Bt2100Hlg)
    }

    /// Short canonical name.
    pub fn name(self) -> &'static str {
        match self {
            Self::Bt2100Hlg => "bt2100-hlg",
            Self::Bt2100Pq => "bt2100-pq",
            Self::DisplayP3 => "display-p3",
            Self::Srgb => "srgb",
            Self::LinearSrgb => "linear-srgb",
            Self::LinearBt2020 => "linear-bt2020",
            Self::Unknown => "unknown",
        }
    }
}

impl fmt::Display for ColorSpaceHint {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.name())
    }
}
