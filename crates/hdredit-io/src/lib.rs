//! # hdredit-io
//!
//! Getting images in and out of the editor.
//!
//! - [`load`] - format sniffing, full-size decode, [`Asset`] and thumbnails
//! - [`png`] - PNG decode (8/16 bit, cICP aware) and 16-bit HDR encode
//! - [`hdr`] - Radiance RGBE decode
//! - [`heif`] - 10-bit HEIF encode/decode (feature `heif`)
//! - [`encode`] - [`HdrColorInfo`] and encoder dispatch by [`ContentType`]
//! - [`persist`] - versioned edit blobs ([`AdjustmentData`])
//!
//! Decoders return linear BT.2020 [`hdredit_core::Image`]s tagged with the
//! color space they were decoded from. Encoders take the same images and
//! apply the requested HDR transfer.
//!
//! # Supported Formats
//!
//! | Format | Read | Write | Notes |
//! |--------|------|-------|-------|
//! | PNG | Yes | Yes | write: 16-bit RGBA, PQ/HLG, cICP |
//! | Radiance | Yes | No | RGB, flat or RLE |
//! | HEIF | feature | feature | write: 10-bit, NCLX |
//!
//! # Example
//!
//! ```rust
//! use hdredit_core::Image;
//! use hdredit_io::{ContentType, HdrColorInfo, decode_bytes, encode};
//!
//! let img = Image::filled(8, 8, [1.0, 1.0, 1.0, 1.0]);
//! let bytes = encode(&img, &ContentType::Png, &HdrColorInfo::default()).unwrap();
//! let back = decode_bytes(&bytes).unwrap();
//! assert_eq!(back.width(), 8);
//! ```
//!
//! # Feature Flags
//!
//! - `heif` - HEIF/HEIC through libheif-rs

#![warn(missing_docs)]
#![warn(rustdoc::missing_crate_level_docs)]

mod error;
pub mod content;
pub mod encode;
pub mod hdr;
pub mod heif;
pub mod load;
pub mod persist;
pub mod png;

pub use content::ContentType;
pub use encode::{HdrColorInfo, encode};
pub use error::{IoError, IoResult};
pub use load::{Asset, AssetSource, SourceFormat, THUMBNAIL_MAX_PIXELS, decode_bytes, load_path, thumbnail};
pub use persist::AdjustmentData;
