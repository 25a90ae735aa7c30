//! Preview pixel buffers.
//!
//! Previews use a 10-bit 4:2:0 biplanar full-range layout (P010): a luma
//! plane of one `u16` per pixel and an interleaved CbCr plane holding one
//! pair per 2x2 block. Samples are stored MSB-aligned, i.e. the 10-bit value
//! shifted left by 6.
//!
//! ```text
//! luma    Y Y Y Y      chroma  Cb Cr Cb Cr
//!         Y Y Y Y              Cb Cr Cb Cr
//!         Y Y Y Y
//!         Y Y Y Y
//! ```
//!
//! [`BufferAllocator::allocate`] never panics: zero-area, overflowing,
//! over-limit and unsatisfiable requests are all reported as
//! [`RenderError::Allocation`].

use crate::{RenderError, RenderResult};
use hdredit_core::Error;
use hdredit_io::HdrColorInfo;
use std::fmt;
use tracing::trace;

/// Shift between a 10-bit value and its MSB-aligned storage.
pub const P010_SHIFT: u32 = 6;

/// Default pixel limit: a 16384 x 16384 image.
pub const DEFAULT_MAX_PIXELS: usize = 16384 * 16384;

/// Pixel layout of a [`PixelBuffer`].
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Default)]
pub enum PixelLayout {
    /// 10-bit 4:2:0 Y'CbCr, two planes, full range.
    #[default]
    Yuv420Biplanar10FullRange,
}

impl PixelLayout {
    /// Significant bits per sample.
    pub const fn bits(self) -> u32 {
        match self {
            Self::Yuv420Biplanar10FullRange => 10,
        }
    }
}

impl fmt::Display for PixelLayout {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::Yuv420Biplanar10FullRange => f.write_str("P010 (4:2:0 10-bit full range)"),
        }
    }
}

/// Buffer attributes a display surface can rely on.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub struct BufferAttributes {
    /// Memory may be handed to a GPU without copying.
    pub gpu_shareable: bool,
    /// Buffer can back a display surface.
    pub surface_backed: bool,
}

impl Default for BufferAttributes {
    fn default() -> Self {
        Self {
            gpu_shareable: true,
            surface_backed: true,
        }
    }
}

/// A rendered preview.
#[derive(Clone, PartialEq)]
pub struct PixelBuffer {
    width: u32,
    height: u32,
    layout: PixelLayout,
    attributes: BufferAttributes,
    luma: Vec<u16>,
    chroma: Vec<u16>,
    color: Option<HdrColorInfo>,
}

impl PixelBuffer {
    /// Width in pixels.
    #[inline]
    pub fn width(&self) -> u32 {
        self.width
    }

    /// Height in pixels.
    #[inline]
    pub fn height(&self) -> u32 {
        self.height
    }

    /// Chroma plane size in CbCr pairs.
    #[inline]
    pub fn chroma_size(&self) -> (u32, u32) {
        (self.width.div_ceil(2), self.height.div_ceil(2))
    }

    /// Sample layout.
    pub fn layout(&self) -> PixelLayout {
        self.layout
    }

    /// Surface attributes.
    pub fn attributes(&self) -> BufferAttributes {
        self.attributes
    }

    /// Attached color, if any.
    pub fn color(&self) -> Option<HdrColorInfo> {
        self.color
    }

    /// Tags the buffer with its output color. Must happen before filling.
    pub fn attach_color(&mut self, color: HdrColorInfo) {
        self.color = Some(color);
    }

    /// Luma plane, MSB-aligned.
    pub fn luma(&self) -> &[u16] {
        &self.luma
    }

    /// Interleaved CbCr plane, MSB-aligned.
    pub fn chroma(&self) -> &[u16] {
        &self.chroma
    }

    /// Both planes, mutably.
    pub fn planes_mut(&mut self) -> (&mut [u16], &mut [u16]) {
        (&mut self.luma, &mut self.chroma)
    }

    /// 10-bit luma at pixel `(x, y)`.
    ///
    /// # Panics
    ///
    /// Panics if the coordinates are out of bounds.
    pub fn luma_at(&self, x: u32, y: u32) -> u16 {
        assert!(x < self.width && y < self.height, "pixel ({x}, {y}) out of bounds");
        self.luma[y as usize * self.width as usize + x as usize] >> P010_SHIFT
    }

    /// 10-bit `(Cb, Cr)` covering pixel `(x, y)`.
    ///
    /// # Panics
    ///
    /// Panics if the coordinates are out of bounds.
    pub fn chroma_at(&self, x: u32, y: u32) -> (u16, u16) {
        assert!(x < self.width && y < self.height, "pixel ({x}, {y}) out of bounds");
        let cw = self.chroma_size().0 as usize;
        let i = ((y / 2) as usize * cw + (x / 2) as usize) * 2;
        (self.chroma[i] >> P010_SHIFT, self.chroma[i + 1] >> P010_SHIFT)
    }

    /// Total size of both planes in bytes.
    pub fn byte_len(&self) -> usize {
        (self.luma.len() + self.chroma.len()) * size_of::<u16>()
    }

    /// Both planes as little-endian bytes, luma first.
    pub fn to_le_bytes(&self) -> Vec<u8> {
        self.luma
            .iter()
            .chain(&self.chroma)
            .flat_map(|s| s.to_le_bytes())
            .collect()
    }
}

impl fmt::Debug for PixelBuffer {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("PixelBuffer")
            .field("width", &self.width)
            .field("height", &self.height)
            .field("layout", &self.layout)
            .field("color", &self.color)
            .finish_non_exhaustive()
    }
}

/// Allocates preview buffers.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct BufferAllocator {
    max_pixels: usize,
}

impl Default for BufferAllocator {
    fn default() -> Self {
        Self::new(DEFAULT_MAX_PIXELS)
    }
}

impl BufferAllocator {
    /// Allocator refusing buffers above `max_pixels`.
    pub const fn new(max_pixels: usize) -> Self {
        Self { max_pixels }
    }

    /// Configured pixel limit.
    pub const fn max_pixels(&self) -> usize {
        self.max_pixels
    }

    /// Allocates a zeroed P010 buffer without color.
    ///
    /// # Errors
    ///
    /// [`RenderError::Allocation`] for zero-area, overflowing, over-limit or
    /// unsatisfiable requests.
    pub fn allocate(&self, width: u32, height: u32) -> RenderResult<PixelBuffer> {
        if width == 0 || height == 0 {
            return Err(Error::allocation_failed(0, format!("zero-area buffer {width}x{height}")).into());
        }
        let pixels = (width as usize)
            .checked_mul(height as usize)
            .ok_or_else(|| Error::allocation_failed(0, format!("{width}x{height} overflows")))?;
        if pixels > self.max_pixels {
            return Err(Error::allocation_failed(
                pixels.saturating_mul(size_of::<u16>()),
                format!("{width}x{height} exceeds limit of {} pixels", self.max_pixels),
            )
            .into());
        }
        let pairs = (width.div_ceil(2) as usize) * (height.div_ceil(2) as usize);
        trace!(width, height, "allocate P010");

        Ok(PixelBuffer {
            width,
            height,
            layout: PixelLayout::Yuv420Biplanar10FullRange,
            attributes: BufferAttributes::default(),
            luma: zeroed(pixels)?,
            chroma: zeroed(pairs.saturating_mul(2))?,
            color: None,
        })
    }
}

fn zeroed(len: usize) -> RenderResult<Vec<u16>> {
    let mut v = Vec::new();
    v.try_reserve_exact(len).map_err(|e| {
        RenderError::from(Error::allocation_failed(len.saturating_mul(size_of::<u16>()), e.to_string()))
    })?;
    v.resize(len, 0);
    Ok(v)
}
