//! HEIF/HEIC 10-bit HDR encoding and source decoding.
//!
//! Requires the `heif` feature and system libheif >= 1.17. Encoding writes
//! planar 10-bit R'G'B' with an NCLX color profile built from the resolved
//! [`HdrColorInfo`]; libheif converts to 4:2:0 Y'CbCr for HEVC.
//!
//! Without the feature every function returns
//! [`IoError::UnsupportedFeature`], so exports fail cleanly instead of
//! producing an SDR file.

use crate::encode::HdrColorInfo;
use crate::{IoError, IoResult};
use hdredit_core::Image;

/// Leading `ftyp` brands that identify a HEIF container.
pub const BRANDS: [&[u8; 4]; 6] = [b"heic", b"heix", b"hevc", b"heim", b"mif1", b"msf1"];

/// `true` if `bytes` start with an ISO-BMFF `ftyp` box naming a HEIF brand.
pub fn is_heif(bytes: &[u8]) -> bool {
    bytes.len() >= 12 && &bytes[4..8] == b"ftyp" && BRANDS.iter().any(|b| &bytes[8..12] == *b)
}

#[cfg(feature = "heif")]
mod imp {
    use super::*;
    use crate::encode::{SignalEncoder, quantize};
    use hdredit_core::{CHANNELS, ColorSpaceHint};
    use hdredit_primaries::{ColorPrimaries, YCbCrMatrix, apply, to_working_matrix};
    use hdredit_transfer::{TransferFunction, srgb};
    use libheif_rs::{
        Channel, ColorProfileNCLX, ColorSpace, CompressionFormat, EncoderQuality, HeifContext, LibHeif,
        RgbChroma,
    };
    use tracing::debug;

    const BITS: u8 = 10;

    fn err(e: impl std::fmt::Display) -> IoError {
        IoError::EncodeError(format!("libheif: {e}"))
    }

    fn nclx(color: &HdrColorInfo) -> IoResult<ColorProfileNCLX> {
        use libheif_rs::{
            ColorPrimaries as P, MatrixCoefficients as M, TransferCharacteristics as T,
        };
        let mut profile = ColorProfileNCLX::new().ok_or_else(|| err("cannot allocate NCLX profile"))?;
        profile.set_color_primaries(match color.primaries {
            ColorPrimaries::Bt709 => P::ITU_R_BT_709_5,
            ColorPrimaries::Bt2020 => P::ITU_R_BT_2020_2_and_2100_0,
            ColorPrimaries::DisplayP3 => P::SMPTE_EG_432_1,
        });
        profile.set_transfer_characteristics(match color.transfer {
            TransferFunction::Pq => T::ITU_R_BT_2100_0_PQ,
            TransferFunction::Hlg => T::ITU_R_BT_2100_0_HLG,
        });
        profile.set_matrix_coefficients(match color.matrix {
            YCbCrMatrix::Bt709 => M::ITU_R_BT_709_5,
            YCbCrMatrix::Bt2020Ncl => M::ITU_R_BT_2020_2_non_constant_luminance,
        });
        profile.set_full_range_flag(1);
        Ok(profile)
    }

    pub fn encode_heif10(image: &Image, color: &HdrColorInfo) -> IoResult<Vec<u8>> {
        if image.is_empty() {
            return Err(IoError::EncodeError(format!(
                "cannot encode {}x{} image",
                image.width(),
                image.height()
            )));
        }
        let (w, h) = (image.width(), image.height());
        debug!(width = w, height = h, %color, "heif::encode_heif10");

        let mut out = libheif_rs::Image::new(w, h, ColorSpace::Rgb(RgbChroma::C444)).map_err(err)?;
        for ch in [Channel::R, Channel::G, Channel::B] {
            out.create_plane(ch, w, h, BITS).map_err(err)?;
        }
        out.set_color_profile_nclx(&nclx(color)?).map_err(err)?;

        let signal = SignalEncoder::new(color);
        {
            let planes = out.planes_mut();
            let (Some(r), Some(g), Some(b)) = (planes.r, planes.g, planes.b) else {
                return Err(err("missing RGB planes"));
            };
            let stride = r.stride;
            for (y, row) in image.data().chunks_exact(w as usize * CHANNELS).enumerate() {
                for (x, px) in row.chunks_exact(CHANNELS).enumerate() {
                    let rgb = signal.encode([px[0], px[1], px[2]]);
                    let at = y * stride + x * 2;
                    r.data[at..at + 2].copy_from_slice(&quantize(rgb[0], BITS as u32).to_ne_bytes());
                    g.data[at..at + 2].copy_from_slice(&quantize(rgb[1], BITS as u32).to_ne_bytes());
                    b.data[at..at + 2].copy_from_slice(&quantize(rgb[2], BITS as u32).to_ne_bytes());
                }
            }
        }

        let lib = LibHeif::new();
        let mut ctx = HeifContext::new().map_err(err)?;
        let mut encoder = lib.encoder_for_format(CompressionFormat::Hevc).map_err(err)?;
        encoder.set_quality(EncoderQuality::Lossy(90)).map_err(err)?;
        ctx.encode_image(&out, &mut encoder, None).map_err(err)?;
        ctx.write_to_bytes().map_err(err)
    }

    pub fn decode_bytes(bytes: &[u8]) -> IoResult<Image> {
        let derr = |e: libheif_rs::HeifError| IoError::DecodeError(format!("libheif: {e}"));
        let lib = LibHeif::new();
        let ctx = HeifContext::read_from_bytes(bytes).map_err(derr)?;
        let handle = ctx.primary_image_handle().map_err(derr)?;

        let hint = match handle.color_profile_nclx() {
            Some(p) => match p.transfer_characteristics() as u8 {
                16 => ColorSpaceHint::Bt2100Pq,
                18 => ColorSpaceHint::Bt2100Hlg,
                _ if p.color_primaries() as u8 == 12 => ColorSpaceHint::DisplayP3,
                _ => ColorSpaceHint::Srgb,
            },
            None => ColorSpaceHint::Srgb,
        };

        let bits = handle.luma_bits_per_pixel();
        let chroma = if bits > 8 { RgbChroma::HdrRgbaLe } else { RgbChroma::Rgba };
        let decoded = lib.decode(&handle, ColorSpace::Rgb(chroma), None).map_err(derr)?;
        let plane = decoded
            .planes()
            .interleaved
            .ok_or_else(|| IoError::DecodeError("no interleaved plane".into()))?;

        let (w, h) = (plane.width as usize, plane.height as usize);
        let max = ((1u32 << bits.max(8)) - 1) as f32;
        let gamut = to_working_matrix(Some(hint));
        let curve = |v: f32| match hint {
            ColorSpaceHint::Bt2100Pq => TransferFunction::Pq.decode(v),
            ColorSpaceHint::Bt2100Hlg => TransferFunction::Hlg.decode(v),
            _ => srgb::eotf(v),
        };

        let mut data = Vec::with_capacity(w * h * CHANNELS);
        for y in 0..h {
            let row = &plane.data[y * plane.stride..];
            for x in 0..w {
                let px: [f32; 4] = if bits > 8 {
                    std::array::from_fn(|c| {
                        let at = (x * 4 + c) * 2;
                        u16::from_le_bytes([row[at], row[at + 1]]) as f32 / max
                    })
                } else {
                    std::array::from_fn(|c| row[x * 4 + c] as f32 / max)
                };
                data.extend_from_slice(&apply(&gamut, [curve(px[0]), curve(px[1]), curve(px[2])]));
                data.push(px[3]);
            }
        }
        Ok(Image::from_rgba(w as u32, h as u32, data)?.with_colorspace(Some(hint)))
    }
}

/// Encodes a working-space image as 10-bit HEIF.
#[cfg(feature = "heif")]
pub fn encode_heif10(image: &Image, color: &HdrColorInfo) -> IoResult<Vec<u8>> {
    imp::encode_heif10(image, color)
}

/// Placeholder when the `heif` feature is disabled.
#[cfg(not(feature = "heif"))]
pub fn encode_heif10(_image: &Image, _color: &HdrColorInfo) -> IoResult<Vec<u8>> {
    Err(IoError::UnsupportedFeature("HEIF encoding requires the 'heif' feature".into()))
}

/// Decodes HEIF bytes into the working space.
#[cfg(feature = "heif")]
pub fn decode_bytes(bytes: &[u8]) -> IoResult<Image> {
    imp::decode_bytes(bytes)
}

/// Placeholder when the `heif` feature is disabled.
#[cfg(not(feature = "heif"))]
pub fn decode_bytes(_bytes: &[u8]) -> IoResult<Image> {
    Err(IoError::UnsupportedFeature("HEIF decoding requires the 'heif' feature".into()))
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn brand_sniffing() {
        let mut head = vec![0, 0, 0, 24];
        head.extend_from_slice(b"ftypheic");
        assert!(is_heif(&head));
        head[8..12].copy_from_slice(b"avif");
        assert!(!is_heif(&head));
        assert!(!is_heif(b"ftyp"));
    }

    #[cfg(not(feature = "heif"))]
    #[test]
    fn disabled_feature_reports_unsupported() {
        let img = Image::filled(2, 2, [1.0, 1.0, 1.0, 1.0]);
        let err = encode_heif10(&img, &HdrColorInfo::default());
        assert!(matches!(err, Err(IoError::UnsupportedFeature(_))));
    }

    #[cfg(feature = "heif")]
    #[test]
    fn encoded_heif_is_tagged() {
        let img = Image::filled(16, 16, [1.0, 0.5, 0.25, 1.0]);
        let bytes = encode_heif10(&img, &HdrColorInfo::default()).unwrap();
        assert!(is_heif(&bytes));
        let back = decode_bytes(&bytes).unwrap();
        assert_eq!(back.colorspace(), Some(hdredit_core::ColorSpaceHint::Bt2100Pq));
    }
}
