//! Working-space image buffer.
//!
//! [`Image`] stores interleaved `[R, G, B, A]` `f32` samples in row-major
//! order, top-to-bottom:
//!
//! ```text
//! Memory: [R G B A R G B A ...]  <- Row 0
//!         [R G B A R G B A ...]  <- Row 1
//! ```
//!
//! # Memory Management
//!
//! Pixel data lives in an [`Arc<Vec<f32>>`]. Cloning an image shares the
//! buffer, so a source can be handed to a render thread without copying and
//! without locks. Writers go through [`Image::make_mut`], which copies only
//! when the buffer is shared.
//!
//! # Usage
//!
//! ```rust
//! use hdredit_core::Image;
//!
//! let img = Image::filled(4, 2, [0.18, 0.18, 0.18, 1.0]);
//! assert_eq!(img.pixel(3, 1), [0.18, 0.18, 0.18, 1.0]);
//!
//! let copy = img.clone();
//! assert!(copy.shares_data(&img));
//! ```

use crate::{ColorSpaceHint, Error, Result};
use std::fmt;
use std::sync::Arc;

/// Number of interleaved channels per pixel.
pub const CHANNELS: usize = 4;

/// RGBA `f32` image in the linear BT.2020 working space.
///
/// Zero-area images are valid values; consumers that cannot handle them
/// (buffer allocation, encoders) reject them explicitly.
#[derive(Clone, PartialEq)]
pub struct Image {
    data: Arc<Vec<f32>>,
    width: u32,
    height: u32,
    colorspace: Option<ColorSpaceHint>,
}

impl Image {
    /// Creates a transparent black image.
    pub fn new(width: u32, height: u32) -> Self {
        Self::filled(width, height, [0.0; CHANNELS])
    }

    /// Creates an image with every pixel set to `rgba`.
    pub fn filled(width: u32, height: u32, rgba: [f32; CHANNELS]) -> Self {
        let count = width as usize * height as usize;
        let mut data = Vec::with_capacity(count * CHANNELS);
        for _ in 0..count {
            data.extend_from_slice(&rgba);
        }
        Self {
            data: Arc::new(data),
            width,
            height,
            colorspace: None,
        }
    }

    /// Creates an image from interleaved RGBA samples.
    ///
    /// # Errors
    ///
    /// Returns [`Error::BufferSizeMismatch`] if `data.len()` is not
    /// `width * height * 4`.
    pub fn from_rgba(width: u32, height: u32, data: Vec<f32>) -> Result<Self> {
        let expected = width as usize * height as usize * CHANNELS;
        if data.len() != expected {
            return Err(Error::BufferSizeMismatch {
                expected,
                actual: data.len(),
            });
        }
        Ok(Self {
            data: Arc::new(data),
            width,
            height,
            colorspace: None,
        })
    }

    /// Returns the image tagged with a source color space hint.
    pub fn with_colorspace(mut self, hint: Option<ColorSpaceHint>) -> Self {
        self.colorspace = hint;
        self
    }

    /// Creates an image with the same size and hint, holding new samples.
    ///
    /// # Errors
    ///
    /// Same as [`Image::from_rgba`].
    pub fn with_data(&self, data: Vec<f32>) -> Result<Self> {
        Ok(Self::from_rgba(self.width, self.height, data)?.with_colorspace(self.colorspace))
    }

    /// Image width in pixels.
    #[inline]
    pub fn width(&self) -> u32 {
        self.width
    }

    /// Image height in pixels.
    #[inline]
    pub fn height(&self) -> u32 {
        self.height
    }

    /// Returns `true` when either dimension is zero.
    #[inline]
    pub fn is_empty(&self) -> bool {
        self.width == 0 || self.height == 0
    }

    /// Color space the source was authored in, if known.
    #[inline]
    pub fn colorspace(&self) -> Option<ColorSpaceHint> {
        self.colorspace
    }

    /// Interleaved RGBA samples.
    #[inline]
    pub fn data(&self) -> &[f32] {
        &self.data
    }

    /// Mutable access to the samples, cloning the buffer if it is shared.
    pub fn make_mut(&mut self) -> &mut [f32] {
        Arc::make_mut(&mut self.data).as_mut_slice()
    }

    /// Returns the pixel at `(x, y)`.
    ///
    /// # Panics
    ///
    /// Panics if the coordinates are out of bounds.
    pub fn pixel(&self, x: u32, y: u32) -> [f32; CHANNELS] {
        assert!(x < self.width && y < self.height, "pixel ({x}, {y}) out of bounds");
        let i = (y as usize * self.width as usize + x as usize) * CHANNELS;
        [self.data[i], self.data[i + 1], self.data[i + 2], self.data[i + 3]]
    }

    /// Iterates over pixels in row-major order.
    pub fn pixels(&self) -> impl Iterator<Item = &[f32]> {
        self.data.chunks_exact(CHANNELS)
    }

    /// Returns `true` if both images share the same pixel allocation.
    #[inline]
    pub fn shares_data(&self, other: &Self) -> bool {
        Arc::ptr_eq(&self.data, &other.data)
    }
}

impl fmt::Debug for Image {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("Image")
            .field("width", &self.width)
            .field("height", &self.height)
            .field("colorspace", &self.colorspace)
            .finish_non_exhaustive()
    }
}
