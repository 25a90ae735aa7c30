//! Output content types.
//!
//! Exports accept exactly two containers: HEIF (10-bit HDR) and PNG (16-bit
//! RGBA). Anything else is representable as [`ContentType::Other`] so callers
//! can pass through what the user asked for, and every encoder rejects it.
//!
//! ```rust
//! use hdredit_io::ContentType;
//!
//! assert_eq!(ContentType::parse("public.heic"), ContentType::Heif);
//! assert_eq!(ContentType::parse("image/png"), ContentType::Png);
//! assert_eq!(ContentType::from_extension("HEIC"), Some(ContentType::Heif));
//! assert!(!ContentType::parse("jpeg").is_supported());
//! ```

use std::fmt;
use std::path::Path;

/// Container an export is encoded into.
#[derive(Debug, Clone, PartialEq, Eq, Hash)]
pub enum ContentType {
    /// HEIF/HEIC, 10-bit, BT.2100.
    Heif,
    /// PNG, 16-bit RGBA with a `cICP` chunk.
    Png,
    /// Unsupported type, kept as given.
    Other(String),
}

impl ContentType {
    /// Parses a file extension (without the dot). `None` when unrecognised.
    pub fn from_extension(ext: &str) -> Option<Self> {
        match ext.to_ascii_lowercase().as_str() {
            "heic" | "heif" | "hif" => Some(Self::Heif),
            "png" => Some(Self::Png),
            _ => None,
        }
    }

    /// Content type implied by a path's extension; `None` without one.
    ///
    /// Unrecognised extensions become [`ContentType::Other`].
    pub fn from_path(path: &Path) -> Option<Self> {
        let ext = path.extension()?.to_string_lossy();
        Some(Self::from_extension(&ext).unwrap_or_else(|| Self::Other(ext.into_owned())))
    }

    /// Parses an extension, MIME type or type identifier.
    pub fn parse(s: &str) -> Self {
        let lower = s.trim().to_ascii_lowercase();
        match lower.as_str() {
            "public.heic" | "public.heif" | "image/heic" | "image/heif" => Self::Heif,
            "public.png" | "image/png" => Self::Png,
            other => Self::from_extension(other.trim_start_matches('.'))
                .unwrap_or_else(|| Self::Other(s.trim().to_string())),
        }
    }

    /// `true` for types an encoder exists for.
    pub fn is_supported(&self) -> bool {
        !matches!(self, Self::Other(_))
    }

    /// Preferred file extension.
    pub fn extension(&self) -> &str {
        match self {
            Self::Heif => "heic",
            Self::Png => "png",
            Self::Other(s) => s,
        }
    }

    /// MIME type.
    pub fn mime(&self) -> &str {
        match self {
            Self::Heif => "image/heic",
            Self::Png => "image/png",
            Self::Other(_) => "application/octet-stream",
        }
    }
}

impl fmt::Display for ContentType {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::Heif => f.write_str("heif"),
            Self::Png => f.write_str("png"),
            Self::Other(s) => write!(f, "{s} (unsupported)"),
        }
    }
}
