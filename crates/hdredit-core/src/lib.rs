//! # hdredit-core
//!
//! Core types shared by every hdredit crate.
//!
//! - [`Image`] - Immutable-by-default RGBA float buffer in the working space
//! - [`ColorSpaceHint`] - Closed set of source color spaces reported by decoders
//! - [`Error`] / [`Result`] - Buffer and dimension failures
//!
//! ## Working Space
//!
//! All pixel data handled by the editing pipeline is **scene-linear BT.2020**
//! with a D65 white point, stored as interleaved `[R, G, B, A]` `f32` samples.
//! Values are never clamped: highlights above 1.0 and slightly negative values
//! produced by gamut conversion survive every stage up to the encoder.
//!
//! `1.0` corresponds to the SDR reference white (203 cd/m² when encoded as PQ).
//!
//! ## Crate Structure
//!
//! ```text
//! hdredit-core (this crate)
//!    ^
//!    |
//!    +-- hdredit-transfer (PQ / HLG / sRGB curves)
//!    +-- hdredit-primaries (gamut matrices, CICP tags)
//!    +-- hdredit-ops (adjustment chain, filter engine)
//!    +-- hdredit-io (decoders, encoders, persistence)
//!    +-- hdredit-render (preview scheduling, export)
//! ```

#![warn(missing_docs)]
#![warn(rustdoc::missing_crate_level_docs)]

pub mod colorspace;
pub mod error;
pub mod image;
pub mod pixel;

pub use colorspace::ColorSpaceHint;
pub use error::{Error, Result};
pub use image::{CHANNELS, Image};
pub use pixel::{REC2020_LUMA, REC2020_LUMA_B, REC2020_LUMA_G, REC2020_LUMA_R, luminance_rec2020};

/// Prelude module for convenient imports.
///
/// ```
/// use hdredit_core::prelude::*;
/// ```
pub mod prelude {
    pub use crate::colorspace::ColorSpaceHint;
    pub use crate::error::{Error, Result};
    pub use crate::image::Image;
    pub use crate::pixel::luminance_rec2020;
}
