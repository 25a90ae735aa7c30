//! Source loading: format detection, full-size decode and thumbnails.
//!
//! An [`Asset`] names an image by path or by in-memory bytes and carries an
//! optional thumbnail. Decoding always expands to the full dynamic range of the
//! source. Thumbnails are box-filtered so their long edge is at most
//! [`THUMBNAIL_MAX_PIXELS`]; a failure to build one leaves the asset without a
//! thumbnail rather than failing the load.

use crate::{IoError, IoResult, hdr, heif, png};
use hdredit_core::{CHANNELS, Image};
use rayon::prelude::*;
use std::fmt;
use std::path::{Path, PathBuf};
use std::sync::Arc;
use tracing::{debug, trace, warn};

/// Long-edge limit for thumbnails.
pub const THUMBNAIL_MAX_PIXELS: u32 = 400;

/// Source container formats understood by the loader.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum SourceFormat {
    /// PNG, 8 or 16 bit.
    Png,
    /// Radiance RGBE.
    Radiance,
    /// HEIF/HEIC (needs the `heif` feature to decode).
    Heif,
}

impl SourceFormat {
    /// Detects the format from leading bytes.
    pub fn from_bytes(bytes: &[u8]) -> Option<Self> {
        if bytes.starts_with(b"\x89PNG\r\n\x1a\n") {
            Some(Self::Png)
        } else if bytes.starts_with(hdr::MAGIC) {
            Some(Self::Radiance)
        } else if heif::is_heif(bytes) {
            Some(Self::Heif)
        } else {
            None
        }
    }

    /// Detects the format from a file extension.
    pub fn from_extension(ext: &str) -> Option<Self> {
        match ext.to_ascii_lowercase().as_str() {
            "png" => Some(Self::Png),
            "hdr" | "rgbe" | "pic" => Some(Self::Radiance),
            "heic" | "heif" | "hif" => Some(Self::Heif),
            _ => None,
        }
    }
}

impl fmt::Display for SourceFormat {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(match self {
            Self::Png => "PNG",
            Self::Radiance => "Radiance HDR",
            Self::Heif => "HEIF",
        })
    }
}

/// Decodes an in-memory source into the working space.
///
/// # Errors
///
/// [`IoError::UnsupportedFormat`] when the bytes match no known format.
pub fn decode_bytes(bytes: &[u8]) -> IoResult<Image> {
    let format = SourceFormat::from_bytes(bytes)
        .ok_or_else(|| IoError::UnsupportedFormat("unrecognised image data".into()))?;
    decode_as(bytes, format)
}

fn decode_as(bytes: &[u8], format: SourceFormat) -> IoResult<Image> {
    trace!(%format, len = bytes.len(), "load::decode");
    match format {
        SourceFormat::Png => png::decode_bytes(bytes),
        SourceFormat::Radiance => hdr::decode_bytes(bytes),
        SourceFormat::Heif => heif::decode_bytes(bytes),
    }
}

/// Reads and decodes a file; magic bytes win over the extension.
pub fn load_path<P: AsRef<Path>>(path: P) -> IoResult<Image> {
    let path = path.as_ref();
    let bytes = std::fs::read(path)?;
    let format = SourceFormat::from_bytes(&bytes)
        .or_else(|| path.extension().and_then(|e| e.to_str()).and_then(SourceFormat::from_extension))
        .ok_or_else(|| IoError::UnsupportedFormat(path.display().to_string()))?;
    decode_as(&bytes, format)
}

/// Box-filters `image` so its long edge is at most `max_pixels`.
///
/// Images already small enough are returned as a cheap clone.
pub fn thumbnail(image: &Image, max_pixels: u32) -> Image {
    let (w, h) = (image.width(), image.height());
    let long = w.max(h);
    if long <= max_pixels || image.is_empty() || max_pixels == 0 {
        return image.clone();
    }
    let tw = ((w as u64 * max_pixels as u64) / long as u64).max(1) as u32;
    let th = ((h as u64 * max_pixels as u64) / long as u64).max(1) as u32;

    let src = image.data();
    let (sw, sh) = (w as usize, h as usize);
    let mut out = vec![0.0f32; tw as usize * th as usize * CHANNELS];
    out.par_chunks_exact_mut(tw as usize * CHANNELS)
        .enumerate()
        .for_each(|(ty, row)| {
            let y0 = ty * sh / th as usize;
            let y1 = ((ty + 1) * sh / th as usize).max(y0 + 1);
            for (tx, dst) in row.chunks_exact_mut(CHANNELS).enumerate() {
                let x0 = tx * sw / tw as usize;
                let x1 = ((tx + 1) * sw / tw as usize).max(x0 + 1);
                let mut acc = [0.0f32; CHANNELS];
                for y in y0..y1 {
                    for x in x0..x1 {
                        let i = (y * sw + x) * CHANNELS;
                        for c in 0..CHANNELS {
                            acc[c] += src[i + c];
                        }
                    }
                }
                let n = ((y1 - y0) * (x1 - x0)) as f32;
                for c in 0..CHANNELS {
                    dst[c] = acc[c] / n;
                }
            }
        });

    Image::from_rgba(tw, th, out)
        .map(|t| t.with_colorspace(image.colorspace()))
        .unwrap_or_else(|_| image.clone())
}

/// Where an asset's bytes live.
#[derive(Clone)]
pub enum AssetSource {
    /// A file on disk.
    File(PathBuf),
    /// Bytes handed over by a library or a caller.
    Bytes(Arc<[u8]>),
}

impl fmt::Debug for AssetSource {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::File(p) => f.debug_tuple("File").field(p).finish(),
            Self::Bytes(b) => write!(f, "Bytes({} bytes)", b.len()),
        }
    }
}

/// An image that can be opened for editing.
#[derive(Debug, Clone)]
pub struct Asset {
    id: String,
    source: AssetSource,
    thumbnail: Option<Image>,
}

impl Asset {
    /// Creates a file-backed asset and tries to build its thumbnail.
    pub fn from_path(path: impl Into<PathBuf>) -> Self {
        let path = path.into();
        let thumb = load_path(&path)
            .map(|img| thumbnail(&img, THUMBNAIL_MAX_PIXELS))
            .map_err(|e| warn!(path = %path.display(), error = %e, "no thumbnail"))
            .ok();
        Self {
            id: path.display().to_string(),
            source: AssetSource::File(path),
            thumbnail: thumb,
        }
    }

    /// Creates a bytes-backed asset under `identifier`.
    pub fn from_bytes(bytes: impl Into<Arc<[u8]>>, identifier: impl Into<String>) -> Self {
        let bytes = bytes.into();
        let identifier = identifier.into();
        let thumb = decode_bytes(&bytes)
            .map(|img| thumbnail(&img, THUMBNAIL_MAX_PIXELS))
            .map_err(|e| warn!(id = %identifier, error = %e, "no thumbnail"))
            .ok();
        Self {
            id: identifier,
            source: AssetSource::Bytes(bytes),
            thumbnail: thumb,
        }
    }

    /// Stable identifier: the path for files, the caller's id for bytes.
    pub fn id(&self) -> &str {
        &self.id
    }

    /// Display name: file name for files, identifier otherwise.
    pub fn name(&self) -> &str {
        match &self.source {
            AssetSource::File(p) => p.file_name().and_then(|n| n.to_str()).unwrap_or(self.id.as_str()),
            AssetSource::Bytes(_) => &self.id,
        }
    }

    /// Suggested export name: the source file stem, for file assets.
    pub fn default_filename(&self) -> Option<&str> {
        match &self.source {
            AssetSource::File(p) => p.file_stem().and_then(|s| s.to_str()),
            AssetSource::Bytes(_) => None,
        }
    }

    /// Where the bytes come from.
    pub fn source(&self) -> &AssetSource {
        &self.source
    }

    /// Thumbnail, if one could be built.
    pub fn thumbnail(&self) -> Option<&Image> {
        self.thumbnail.as_ref()
    }

    /// Decodes the full-size image.
    pub fn decode(&self) -> IoResult<Image> {
        let image = match &self.source {
            AssetSource::File(p) => load_path(p)?,
            AssetSource::Bytes(b) => decode_bytes(b)?,
        };
        debug!(id = %self.id, width = image.width(), height = image.height(), "asset decoded");
        Ok(image)
    }
}

impl PartialEq for Asset {
    fn eq(&self, other: &Self) -> bool {
        self.id == other.id
    }
}

impl Eq for Asset {}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::encode::HdrColorInfo;
    use approx::assert_relative_eq;

    fn pq_png(w: u32, h: u32, rgba: [f32; 4]) -> Vec<u8> {
        png::encode_rgba16(&Image::filled(w, h, rgba), &HdrColorInfo::default()).unwrap()
    }

    #[test]
    fn detect_by_magic() {
        assert_eq!(SourceFormat::from_bytes(&pq_png(1, 1, [0.0; 4])), Some(SourceFormat::Png));
        assert_eq!(SourceFormat::from_bytes(b"#?RADIANCE\n"), Some(SourceFormat::Radiance));
        assert_eq!(SourceFormat::from_bytes(b"GIF89a"), None);
        assert_eq!(SourceFormat::from_extension("HDR"), Some(SourceFormat::Radiance));
    }

    #[test]
    fn unknown_bytes_are_unsupported() {
        assert!(matches!(decode_bytes(b"hello"), Err(IoError::UnsupportedFormat(_))));
    }

    #[test]
    fn thumbnail_bounds_long_edge() {
        let img = Image::filled(1000, 500, [2.0, 1.0, 0.5, 1.0]);
        let t = thumbnail(&img, THUMBNAIL_MAX_PIXELS);
        assert_eq!((t.width(), t.height()), (400, 200));
        // Box filter keeps flat fields (and HDR values) intact.
        assert_relative_eq!(t.pixel(123, 77)[0], 2.0, epsilon = 1e-6);
    }

    #[test]
    fn small_images_are_not_resized() {
        let img = Image::filled(40, 30, [0.1, 0.2, 0.3, 1.0]);
        let t = thumbnail(&img, THUMBNAIL_MAX_PIXELS);
        assert!(t.shares_data(&img));
    }

    #[test]
    fn thumbnail_averages() {
        let data = vec![
            0.0, 0.0, 0.0, 1.0, 4.0, 4.0, 4.0, 1.0, //
            0.0, 0.0, 0.0, 1.0, 4.0, 4.0, 4.0, 1.0,
        ];
        let img = Image::from_rgba(2, 2, data).unwrap();
        let t = thumbnail(&img, 1);
        assert_eq!((t.width(), t.height()), (1, 1));
        assert_relative_eq!(t.pixel(0, 0)[0], 2.0, epsilon = 1e-6);
    }

    #[test]
    fn bytes_asset_has_thumbnail_and_decodes() {
        let asset = Asset::from_bytes(pq_png(800, 600, [1.0, 1.0, 1.0, 1.0]), "library/123");
        assert_eq!(asset.id(), "library/123");
        assert_eq!(asset.name(), "library/123");
        assert_eq!(asset.default_filename(), None);
        let thumb = asset.thumbnail().unwrap();
        assert_eq!((thumb.width(), thumb.height()), (400, 300));
        assert_eq!(asset.decode().unwrap().width(), 800);
    }

    #[test]
    fn file_asset_names() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("sunset.png");
        std::fs::write(&path, pq_png(4, 4, [0.5, 0.5, 0.5, 1.0])).unwrap();

        let asset = Asset::from_path(&path);
        assert_eq!(asset.name(), "sunset.png");
        assert_eq!(asset.default_filename(), Some("sunset"));
        assert!(asset.thumbnail().is_some());
    }

    #[test]
    fn broken_file_has_no_thumbnail() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("broken.png");
        std::fs::write(&path, b"\x89PNG\r\n\x1a\ntruncated").unwrap();

        let asset = Asset::from_path(&path);
        assert!(asset.thumbnail().is_none());
        assert!(asset.decode().is_err());
    }
}
