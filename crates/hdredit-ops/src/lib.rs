//! # hdredit-ops
//!
//! Parametric photographic adjustments for HDR images.
//!
//! # Modules
//!
//! - [`adjustment`] - The four adjustments and their pure per-pixel transforms
//! - [`chain`] - [`AdjustmentChain`], one entry per adjustment in fixed order
//! - [`filter`] - [`compose`], the filter engine
//!
//! All math runs on linear BT.2020 values with no clamping; see
//! `hdredit-core` for the working space.
//!
//! # Example
//!
//! ```rust
//! use hdredit_core::Image;
//! use hdredit_ops::{compose, AdjustmentChain, AdjustmentId};
//!
//! let mut chain = AdjustmentChain::new();
//! chain.set(AdjustmentId::Saturation, Some(true), Some(0.0));
//!
//! let img = Image::filled(2, 2, [1.0, 0.0, 0.0, 1.0]);
//! let gray = compose(&img, &chain, false);
//! let px = gray.pixel(0, 0);
//! assert!((px[0] - px[1]).abs() < 1e-6);
//! ```
//!
//! # Feature Flags
//!
//! - `parallel` (default) - evaluate pixels with rayon

#![warn(missing_docs)]
#![warn(rustdoc::missing_crate_level_docs)]

mod error;
pub mod adjustment;
pub mod chain;
pub mod filter;

pub use adjustment::{Adjustment, AdjustmentId, CONTRAST_PIVOT, SEPIA_MATRIX};
pub use chain::AdjustmentChain;
pub use error::{OpsError, OpsResult};
pub use filter::compose;
