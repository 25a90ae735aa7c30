//! # hdredit-render
//!
//! Live previews and final exports for edited HDR images.
//!
//! # Pipeline
//!
//! ```text
//! EditedImage::set_*  ──RenderRequest──▶  render lane (one thread)
//!        ▲                                  │ Coalescer (25 ms, trailing edge)
//!        │                                  │ compose ─▶ resolve ─▶ allocate
//!        │                                  │ attach_color ─▶ RenderContext::fill
//!        └──────── RenderEvent ◀────────────┘
//! ```
//!
//! - [`resolver`] - source hint to BT.2100 output color
//! - [`buffer`] - P010 [`PixelBuffer`]s and the [`BufferAllocator`]
//! - [`context`] - the [`RenderContext`] contract and [`CpuContext`]
//! - [`scheduler`] - [`RenderRequest`], [`Coalescer`], [`RenderState`]
//! - [`lane`] - the [`Renderer`] thread
//! - [`session`] - [`EditedImage`]
//! - [`export`] - file and in-memory exports
//!
//! # Example
//!
//! ```rust
//! use hdredit_core::Image;
//! use hdredit_io::ContentType;
//! use hdredit_ops::{AdjustmentChain, AdjustmentId};
//! use hdredit_render::{EditedImage, Renderer, RendererConfig};
//! use std::time::Duration;
//!
//! let renderer = Renderer::cpu(RendererConfig::default()).unwrap();
//! let source = Image::filled(16, 16, [0.18, 0.18, 0.18, 1.0]);
//! let mut edit = EditedImage::new(&renderer, source, AdjustmentChain::new());
//!
//! edit.set_adjustment(AdjustmentId::Exposure, Some(true), Some(1.0));
//! assert!(edit.wait_for_render(Duration::from_secs(5)));
//! assert_eq!(edit.published().unwrap().width(), 16);
//!
//! let png = edit.encode_to_bytes(&ContentType::Png, None).unwrap();
//! assert!(png.bytes.starts_with(b"\x89PNG"));
//! ```

#![warn(missing_docs)]
#![warn(rustdoc::missing_crate_level_docs)]

mod config;
mod error;
pub mod buffer;
pub mod context;
pub mod export;
pub mod lane;
pub mod resolver;
pub mod scheduler;
pub mod session;

pub use buffer::{BufferAllocator, BufferAttributes, PixelBuffer, PixelLayout};
pub use config::RendererConfig;
pub use context::{CpuContext, RenderContext};
pub use error::{RenderError, RenderResult};
pub use export::{EditingOutput, EncodedOutput, resolve_content_type};
pub use lane::{RenderEvent, Renderer, SessionId};
pub use resolver::resolve;
pub use scheduler::{Coalescer, RenderRequest, RenderState};
pub use session::EditedImage;
