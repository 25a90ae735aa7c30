//! Render context contract and the CPU implementation.
//!
//! A [`RenderContext`] is owned by the render lane and only ever touched from
//! that thread, so implementations need `Send` but not `Sync`. It does the two
//! device-facing jobs of the pipeline: filling preview buffers and encoding
//! exports. A GPU- or platform-backed context plugs in here.

use crate::buffer::{P010_SHIFT, PixelBuffer};
use crate::{RenderError, RenderResult};
use hdredit_core::{CHANNELS, Image};
use hdredit_io::encode::{SignalEncoder, quantize};
use hdredit_io::{ContentType, HdrColorInfo};
use rayon::prelude::*;
use tracing::trace;

/// Device-facing half of the pipeline.
pub trait RenderContext: Send {
    /// Context name for diagnostics.
    fn name(&self) -> &str;

    /// Converts a working-space image into `buffer`, using the color
    /// attached to the buffer.
    ///
    /// # Errors
    ///
    /// [`RenderError::Render`] when the buffer has no color attached or its
    /// size does not match the image.
    fn fill(&mut self, image: &Image, buffer: &mut PixelBuffer) -> RenderResult<()>;

    /// Encodes a working-space image as `content_type` in `color`.
    fn encode(&mut self, image: &Image, content_type: &ContentType, color: &HdrColorInfo) -> RenderResult<Vec<u8>>;
}

/// CPU context: rayon for pixel conversion, `hdredit-io` encoders.
#[derive(Debug, Default, Clone, Copy)]
pub struct CpuContext;

impl CpuContext {
    /// Creates a CPU context.
    pub fn new() -> Self {
        Self
    }
}

#[inline]
fn p010(v: f32) -> u16 {
    quantize(v, 10) << P010_SHIFT
}

/// Full-range chroma: `round(1023 * c + 512)`.
#[inline]
fn p010_chroma(c: f32) -> u16 {
    ((c * 1023.0 + 512.0).round().clamp(0.0, 1023.0) as u16) << P010_SHIFT
}

impl RenderContext for CpuContext {
    fn name(&self) -> &str {
        "cpu"
    }

    fn fill(&mut self, image: &Image, buffer: &mut PixelBuffer) -> RenderResult<()> {
        let color = buffer
            .color()
            .ok_or_else(|| RenderError::Render("buffer has no color attached".into()))?;
        if (image.width(), image.height()) != (buffer.width(), buffer.height()) {
            return Err(RenderError::Render(format!(
                "image {}x{} does not match buffer {}x{}",
                image.width(),
                image.height(),
                buffer.width(),
                buffer.height()
            )));
        }
        trace!(width = image.width(), height = image.height(), %color, "cpu fill");

        let (w, h) = (image.width() as usize, image.height() as usize);
        let signal = SignalEncoder::new(&color);
        let matrix = color.matrix;
        let ycc: Vec<[f32; 3]> = image
            .data()
            .par_chunks_exact(CHANNELS)
            .map(|px| matrix.rgb_to_ycbcr(signal.encode([px[0], px[1], px[2]])))
            .collect();

        let cw = w.div_ceil(2);
        let (luma, chroma) = buffer.planes_mut();
        luma.par_iter_mut().zip(ycc.par_iter()).for_each(|(dst, c)| *dst = p010(c[0]));
        chroma.par_chunks_exact_mut(cw * 2).enumerate().for_each(|(cy, row)| {
            for (cx, pair) in row.chunks_exact_mut(2).enumerate() {
                let (mut cb, mut cr, mut n) = (0.0f32, 0.0f32, 0.0f32);
                for y in cy * 2..(cy * 2 + 2).min(h) {
                    for x in cx * 2..(cx * 2 + 2).min(w) {
                        let c = ycc[y * w + x];
                        cb += c[1];
                        cr += c[2];
                        n += 1.0;
                    }
                }
                pair[0] = p010_chroma(cb / n);
                pair[1] = p010_chroma(cr / n);
            }
        });
        Ok(())
    }

    fn encode(&mut self, image: &Image, content_type: &ContentType, color: &HdrColorInfo) -> RenderResult<Vec<u8>> {
        trace!(%content_type, %color, "cpu encode");
        Ok(hdredit_io::encode(image, content_type, color)?)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::buffer::BufferAllocator;
    use hdredit_transfer::TransferFunction;

    fn filled(w: u32, h: u32, rgba: [f32; 4]) -> (Image, PixelBuffer) {
        let img = Image::filled(w, h, rgba);
        let mut buf = BufferAllocator::default().allocate(w, h).unwrap();
        buf.attach_color(HdrColorInfo::default());
        (img, buf)
    }

    #[test]
    fn gray_has_neutral_chroma() {
        let (img, mut buf) = filled(3, 3, [0.5, 0.5, 0.5, 1.0]);
        CpuContext.fill(&img, &mut buf).unwrap();
        let expect = quantize(TransferFunction::Pq.encode(0.5), 10);
        let y = buf.luma_at(2, 2);
        assert!(y.abs_diff(expect) <= 1, "{y} vs {expect}");
        assert_eq!(buf.chroma_at(2, 2), (512, 512));
    }

    #[test]
    fn red_moves_cr_up() {
        let (img, mut buf) = filled(2, 2, [1.0, 0.0, 0.0, 1.0]);
        CpuContext.fill(&img, &mut buf).unwrap();
        let (cb, cr) = buf.chroma_at(0, 0);
        assert!(cr > 512 && cb < 512, "cb {cb} cr {cr}");
    }

    #[test]
    fn needs_color() {
        let img = Image::filled(2, 2, [1.0; 4]);
        let mut buf = BufferAllocator::default().allocate(2, 2).unwrap();
        assert!(matches!(CpuContext.fill(&img, &mut buf), Err(RenderError::Render(_))));
    }

    #[test]
    fn size_mismatch_is_rejected() {
        let (_, mut buf) = filled(2, 2, [1.0; 4]);
        let img = Image::filled(3, 2, [1.0; 4]);
        assert!(matches!(CpuContext.fill(&img, &mut buf), Err(RenderError::Render(_))));
    }

    #[test]
    fn encode_rejects_other_types() {
        let img = Image::filled(2, 2, [1.0; 4]);
        let err = CpuContext.encode(&img, &ContentType::Other("public.tiff".into()), &HdrColorInfo::default());
        assert!(matches!(err, Err(RenderError::UnsupportedContentType(_))));
    }
}
