//! Radiance RGBE (`.hdr`) source decoding.
//!
//! Radiance files hold scene-linear Rec.709 values with a shared exponent, so
//! highlights far above 1.0 are common. Pixels are converted to linear
//! BT.2020 and never clamped. Both flat and new-style run-length encoded
//! scanlines are supported; `XYZE` files are rejected.

use crate::{IoError, IoResult};
use hdredit_core::{CHANNELS, ColorSpaceHint, Image};
use hdredit_primaries::{apply, to_working_matrix};
use std::fs::File;
use std::io::{BufRead, BufReader, Cursor, Read};
use std::path::Path;
use tracing::trace;

/// Leading bytes of every Radiance file.
pub const MAGIC: &[u8] = b"#?";

/// Header fields that affect decoding.
#[derive(Debug, Clone, PartialEq)]
pub struct RadianceHeader {
    /// Image width.
    pub width: u32,
    /// Image height.
    pub height: u32,
    /// Product of all `EXPOSURE=` lines; pixel values are divided by it.
    pub exposure: f32,
}

/// Reads a Radiance file into the working space.
pub fn read<P: AsRef<Path>>(path: P) -> IoResult<Image> {
    let file = File::open(path)?;
    decode(BufReader::new(file))
}

/// Decodes Radiance bytes into the working space.
pub fn decode_bytes(bytes: &[u8]) -> IoResult<Image> {
    decode(Cursor::new(bytes))
}

/// Decodes a Radiance stream into the working space.
pub fn decode<R: BufRead>(mut reader: R) -> IoResult<Image> {
    let header = read_header(&mut reader)?;
    trace!(width = header.width, height = header.height, exposure = header.exposure, "hdr::decode");

    let width = header.width as usize;
    let height = header.height as usize;
    let rgbe = read_rgbe(&mut reader, width, height)?;

    let to_working = to_working_matrix(Some(ColorSpaceHint::LinearSrgb));
    let scale = 1.0 / header.exposure;
    let mut data = Vec::with_capacity(width * height * CHANNELS);
    for px in rgbe.chunks_exact(4) {
        let rgb = rgbe_to_f32(px).map(|c| c * scale);
        data.extend_from_slice(&apply(&to_working, rgb));
        data.push(1.0);
    }

    Ok(Image::from_rgba(header.width, header.height, data)?.with_colorspace(Some(ColorSpaceHint::LinearSrgb)))
}

/// Parses the text header up to and including the resolution line.
pub fn read_header<R: BufRead>(reader: &mut R) -> IoResult<RadianceHeader> {
    let mut line = String::new();
    reader.read_line(&mut line)?;
    if !line.as_bytes().starts_with(MAGIC) {
        return Err(IoError::InvalidFile("Radiance magic not found".into()));
    }

    let mut exposure = 1.0f32;
    loop {
        line.clear();
        if reader.read_line(&mut line)? == 0 {
            return Err(IoError::InvalidFile("missing resolution line".into()));
        }
        let text = line.trim_end_matches(['\r', '\n']);

        if text.starts_with('-') || text.starts_with('+') {
            let (width, height) = parse_resolution(text)
                .ok_or_else(|| IoError::InvalidFile(format!("bad resolution line '{text}'")))?;
            return Ok(RadianceHeader { width, height, exposure });
        }

        let Some((key, value)) = text.split_once('=') else {
            continue;
        };
        match key.trim().to_ascii_uppercase().as_str() {
            "FORMAT" if value.trim().eq_ignore_ascii_case("32-bit_rle_xyze") => {
                return Err(IoError::UnsupportedFormat("Radiance XYZE".into()));
            }
            "EXPOSURE" => {
                if let Ok(v) = value.trim().parse::<f32>() {
                    if v > 0.0 {
                        exposure *= v;
                    }
                }
            }
            _ => {}
        }
    }
}

/// Parses `-Y <h> +X <w>`; other orientations are not supported.
fn parse_resolution(line: &str) -> Option<(u32, u32)> {
    let mut parts = line.split_whitespace();
    let (ya, h, xa, w) = (parts.next()?, parts.next()?, parts.next()?, parts.next()?);
    if ya != "-Y" || xa != "+X" || parts.next().is_some() {
        return None;
    }
    Some((w.parse().ok()?, h.parse().ok()?))
}

fn read_rgbe<R: Read>(reader: &mut R, width: usize, height: usize) -> IoResult<Vec<u8>> {
    let mut out = vec![0u8; width * height * 4];
    if out.is_empty() {
        return Ok(out);
    }
    // Old-style and flat files are not run-length encoded per channel.
    let rle_width = (8..=0x7fff).contains(&width);

    for row in out.chunks_exact_mut(width * 4) {
        let mut head = [0u8; 4];
        reader.read_exact(&mut head)?;
        let is_rle = rle_width && head[0] == 2 && head[1] == 2 && head[2] & 0x80 == 0;
        if is_rle {
            let encoded = ((head[2] as usize) << 8) | head[3] as usize;
            if encoded != width {
                return Err(IoError::DecodeError(format!(
                    "scanline width {encoded} does not match {width}"
                )));
            }
            read_rle_scanline(reader, row, width)?;
        } else {
            row[..4].copy_from_slice(&head);
            reader.read_exact(&mut row[4..])?;
        }
    }
    Ok(out)
}

fn read_rle_scanline<R: Read>(reader: &mut R, row: &mut [u8], width: usize) -> IoResult<()> {
    let mut channel = vec![0u8; width];
    for c in 0..4 {
        let mut x = 0;
        while x < width {
            let mut byte = [0u8; 1];
            reader.read_exact(&mut byte)?;
            let (run, literal) = if byte[0] > 128 {
                (byte[0] as usize - 128, false)
            } else {
                (byte[0] as usize, true)
            };
            if run == 0 || x + run > width {
                return Err(IoError::DecodeError("corrupt run-length data".into()));
            }
            if literal {
                reader.read_exact(&mut channel[x..x + run])?;
            } else {
                reader.read_exact(&mut byte)?;
                channel[x..x + run].fill(byte[0]);
            }
            x += run;
        }
        for (px, v) in row.chunks_exact_mut(4).zip(&channel) {
            px[c] = *v;
        }
    }
    Ok(())
}

#[inline]
fn rgbe_to_f32(px: &[u8]) -> [f32; 3] {
    if px[3] == 0 {
        return [0.0; 3];
    }
    // (mantissa + 0.5) / 256 * 2^(e - 128)
    let f = 2.0_f32.powi(px[3] as i32 - 136);
    [
        (px[0] as f32 + 0.5) * f,
        (px[1] as f32 + 0.5) * f,
        (px[2] as f32 + 0.5) * f,
    ]
}
