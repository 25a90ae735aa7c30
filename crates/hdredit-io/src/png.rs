//! PNG decoding and 16-bit HDR encoding.
//!
//! # Decoding
//!
//! 8- and 16-bit gray, gray+alpha, RGB and RGBA are accepted (palette and
//! low-bit images are expanded by the decoder). A `cICP` chunk selects the
//! transfer and primaries; untagged files are treated as sRGB. Samples are
//! linearised and converted to linear BT.2020 without clamping.
//!
//! # Encoding
//!
//! [`encode_rgba16`] writes 16-bit RGBA, PQ or HLG encoded, and a `cICP`
//! chunk carrying `[primaries, transfer, 0, 1]` so HDR-aware viewers decode
//! it correctly.

use crate::encode::{HdrColorInfo, SignalEncoder, quantize};
use crate::{IoError, IoResult};
use hdredit_core::{CHANNELS, ColorSpaceHint, Image};
use hdredit_primaries::{apply, to_working_matrix};
use hdredit_transfer::{TransferFunction, srgb};
use rayon::prelude::*;
use std::fs::File;
use std::io::{BufRead, BufReader, Cursor, Seek};
use std::path::Path;
use tracing::{debug, trace};

const CICP: png::chunk::ChunkType = png::chunk::ChunkType(*b"cICP");

/// Reads a PNG file into the working space.
pub fn read<P: AsRef<Path>>(path: P) -> IoResult<Image> {
    let file = File::open(path.as_ref())?;
    decode(BufReader::new(file))
}

/// Decodes PNG bytes into the working space.
pub fn decode_bytes(bytes: &[u8]) -> IoResult<Image> {
    decode(Cursor::new(bytes))
}

/// Decodes a PNG stream into the working space.
pub fn decode<R: BufRead + Seek>(reader: R) -> IoResult<Image> {
    let mut decoder = png::Decoder::new(reader);
    decoder.set_transformations(png::Transformations::EXPAND);
    let mut reader = decoder
        .read_info()
        .map_err(|e: png::DecodingError| IoError::DecodeError(e.to_string()))?;

    let hint = reader
        .info()
        .coding_independent_code_points
        .as_ref()
        .map(|c| hint_from_cicp(c.color_primaries, c.transfer_function))
        .unwrap_or(ColorSpaceHint::Srgb);

    let buf_size = reader
        .output_buffer_size()
        .ok_or_else(|| IoError::DecodeError("cannot determine output buffer size".into()))?;
    let mut buf = vec![0u8; buf_size];
    let info = reader
        .next_frame(&mut buf)
        .map_err(|e: png::DecodingError| IoError::DecodeError(e.to_string()))?;
    let (color_type, bit_depth) = reader.output_color_type();
    let bytes = &buf[..info.buffer_size()];

    let (width, height) = (info.width, info.height);
    trace!(width, height, ?color_type, ?bit_depth, %hint, "png::decode");

    let samples: Vec<u16> = match bit_depth {
        png::BitDepth::Eight => bytes.iter().map(|&b| b as u16).collect(),
        png::BitDepth::Sixteen => bytes
            .chunks_exact(2)
            .map(|c| u16::from_be_bytes([c[0], c[1]]))
            .collect(),
        other => return Err(IoError::DecodeError(format!("unexpected bit depth {other:?}"))),
    };
    let bits: u8 = if bit_depth == png::BitDepth::Sixteen { 16 } else { 8 };

    let rgba = expand_to_rgba(&samples, color_type, bits)?;
    let data = linearize(&rgba, bits, hint);
    Ok(Image::from_rgba(width, height, data)?.with_colorspace(Some(hint)))
}

/// Maps CICP primaries/transfer codes to a hint.
fn hint_from_cicp(primaries: u8, transfer: u8) -> ColorSpaceHint {
    match (transfer, primaries) {
        (16, _) => ColorSpaceHint::Bt2100Pq,
        (18, _) => ColorSpaceHint::Bt2100Hlg,
        (8, 9) => ColorSpaceHint::LinearBt2020,
        (8, _) => ColorSpaceHint::LinearSrgb,
        (_, 12) => ColorSpaceHint::DisplayP3,
        _ => ColorSpaceHint::Srgb,
    }
}

/// Expands gray/gray+alpha/RGB to interleaved RGBA with opaque alpha.
fn expand_to_rgba(samples: &[u16], color_type: png::ColorType, bits: u8) -> IoResult<Vec<u16>> {
    let opaque = ((1u32 << bits) - 1) as u16;
    let out = match color_type {
        png::ColorType::Rgba => samples.to_vec(),
        png::ColorType::Rgb => samples
            .chunks_exact(3)
            .flat_map(|p| [p[0], p[1], p[2], opaque])
            .collect(),
        png::ColorType::Grayscale => samples.iter().flat_map(|&g| [g, g, g, opaque]).collect(),
        png::ColorType::GrayscaleAlpha => samples
            .chunks_exact(2)
            .flat_map(|p| [p[0], p[0], p[0], p[1]])
            .collect(),
        png::ColorType::Indexed => {
            return Err(IoError::DecodeError("palette was not expanded".into()));
        }
    };
    Ok(out)
}

/// Integer RGBA to linear BT.2020 floats.
fn linearize(rgba: &[u16], bits: u8, hint: ColorSpaceHint) -> Vec<f32> {
    let max = ((1u32 << bits) - 1) as f32;
    let gamut = to_working_matrix(Some(hint));
    let curve: Box<dyn Fn(u16) -> f32 + Sync> = match hint {
        ColorSpaceHint::Bt2100Pq => Box::new(move |v| TransferFunction::Pq.decode(v as f32 / max)),
        ColorSpaceHint::Bt2100Hlg => Box::new(move |v| TransferFunction::Hlg.decode(v as f32 / max)),
        ColorSpaceHint::LinearBt2020 | ColorSpaceHint::LinearSrgb => Box::new(move |v| v as f32 / max),
        _ => {
            let table = srgb::decode_table(bits);
            Box::new(move |v| table[v as usize])
        }
    };

    let mut out = vec![0.0f32; rgba.len()];
    out.par_chunks_exact_mut(CHANNELS)
        .zip(rgba.par_chunks_exact(CHANNELS))
        .for_each(|(dst, src)| {
            let rgb = apply(&gamut, [curve(src[0]), curve(src[1]), curve(src[2])]);
            dst[..3].copy_from_slice(&rgb);
            dst[3] = src[3] as f32 / max;
        });
    out
}

/// Encodes a working-space image as 16-bit RGBA PNG.
///
/// # Errors
///
/// [`IoError::EncodeError`] for zero-area images or encoder failures.
pub fn encode_rgba16(image: &Image, color: &HdrColorInfo) -> IoResult<Vec<u8>> {
    if image.is_empty() {
        return Err(IoError::EncodeError(format!(
            "cannot encode {}x{} image",
            image.width(),
            image.height()
        )));
    }
    debug!(width = image.width(), height = image.height(), %color, "png::encode_rgba16");

    let signal = SignalEncoder::new(color);
    let mut pixels = vec![0u8; image.data().len() * 2];
    pixels
        .par_chunks_exact_mut(CHANNELS * 2)
        .zip(image.data().par_chunks_exact(CHANNELS))
        .for_each(|(dst, px)| {
            let rgb = signal.encode([px[0], px[1], px[2]]);
            let a = px[3].clamp(0.0, 1.0);
            for (i, v) in [rgb[0], rgb[1], rgb[2], a].into_iter().enumerate() {
                dst[i * 2..i * 2 + 2].copy_from_slice(&quantize(v, 16).to_be_bytes());
            }
        });

    let mut out = Vec::new();
    {
        let mut encoder = png::Encoder::new(&mut out, image.width(), image.height());
        encoder.set_color(png::ColorType::Rgba);
        encoder.set_depth(png::BitDepth::Sixteen);
        encoder.set_compression(png::Compression::default());

        let mut writer = encoder
            .write_header()
            .map_err(|e| IoError::EncodeError(e.to_string()))?;
        writer
            .write_chunk(CICP, &color.cicp_rgb())
            .map_err(|e| IoError::EncodeError(e.to_string()))?;
        writer
            .write_image_data(&pixels)
            .map_err(|e| IoError::EncodeError(e.to_string()))?;
        writer.finish().map_err(|e| IoError::EncodeError(e.to_string()))?;
    }
    Ok(out)
}

#[cfg(test)]
mod tests {
    use super::*;
    use approx::assert_relative_eq;

    fn srgb_png(width: u32, height: u32, rgb: [u8; 3]) -> Vec<u8> {
        let mut out = Vec::new();
        {
            let mut encoder = png::Encoder::new(&mut out, width, height);
            encoder.set_color(png::ColorType::Rgb);
            encoder.set_depth(png::BitDepth::Eight);
            let mut writer = encoder.write_header().unwrap();
            let data: Vec<u8> = (0..width * height).flat_map(|_| rgb).collect();
            writer.write_image_data(&data).unwrap();
        }
        out
    }

    #[test]
    fn srgb_white_decodes_to_linear_white() {
        let img = decode_bytes(&srgb_png(3, 2, [255, 255, 255])).unwrap();
        assert_eq!((img.width(), img.height()), (3, 2));
        assert_eq!(img.colorspace(), Some(ColorSpaceHint::Srgb));
        let px = img.pixel(2, 1);
        for c in &px[..3] {
            assert_relative_eq!(*c, 1.0, epsilon = 1e-4);
        }
        assert_eq!(px[3], 1.0);
    }

    #[test]
    fn srgb_mid_gray_is_linearised() {
        let img = decode_bytes(&srgb_png(1, 1, [128, 128, 128])).unwrap();
        assert_relative_eq!(img.pixel(0, 0)[1], srgb::eotf(128.0 / 255.0), epsilon = 1e-4);
    }

    #[test]
    fn hdr_export_decodes_back() {
        let src = Image::filled(4, 4, [2.5, 0.18, 0.6, 1.0]);
        let bytes = encode_rgba16(&src, &HdrColorInfo::default()).unwrap();
        assert_eq!(&bytes[..8], b"\x89PNG\r\n\x1a\n");

        let back = decode_bytes(&bytes).unwrap();
        assert_eq!(back.colorspace(), Some(ColorSpaceHint::Bt2100Pq));
        let px = back.pixel(1, 3);
        assert_relative_eq!(px[0], 2.5, max_relative = 2e-3);
        assert_relative_eq!(px[1], 0.18, max_relative = 2e-3);
        assert_relative_eq!(px[2], 0.6, max_relative = 2e-3);
    }

    #[test]
    fn cicp_chunk_is_written() {
        let src = Image::filled(2, 2, [0.5, 0.5, 0.5, 1.0]);
        let bytes = encode_rgba16(&src, &HdrColorInfo::bt2100(TransferFunction::Hlg)).unwrap();
        let pos = bytes.windows(4).position(|w| w == b"cICP").unwrap();
        assert_eq!(&bytes[pos + 4..pos + 8], &[9, 18, 0, 1]);
        let idat = bytes.windows(4).position(|w| w == b"IDAT").unwrap();
        assert!(pos < idat);
    }

    #[test]
    fn zero_area_is_rejected() {
        let err = encode_rgba16(&Image::new(0, 4), &HdrColorInfo::default());
        assert!(matches!(err, Err(IoError::EncodeError(_))));
    }

    #[test]
    fn garbage_is_a_decode_error() {
        assert!(matches!(decode_bytes(b"not a png"), Err(IoError::DecodeError(_))));
    }
}
