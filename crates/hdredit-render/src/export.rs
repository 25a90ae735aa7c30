//! Final exports.
//!
//! Exports always apply the chain (the before/after bypass only affects the
//! preview) at full source resolution. The encode runs on the render lane,
//! serialized with previews; the caller blocks until it finishes or the
//! renderer's deadline passes.
//!
//! File writes go through a temporary file in the destination directory that
//! is renamed over the target on success, so a failed export never leaves a
//! partial file behind.

use crate::lane::ExportJob;
use crate::resolver::resolve;
use crate::{EditedImage, RenderError, RenderResult};
use hdredit_core::ColorSpaceHint;
use hdredit_io::{AdjustmentData, ContentType, HdrColorInfo};
use std::io::Write;
use std::path::Path;
use tempfile::NamedTempFile;
use tracing::{debug, warn};

/// An encoded export.
#[derive(Debug, Clone, PartialEq)]
pub struct EncodedOutput {
    /// Container bytes.
    pub bytes: Vec<u8>,
    /// Container type.
    pub content_type: ContentType,
    /// Color the pixels were encoded in.
    pub color: HdrColorInfo,
}

/// Persisted edits together with the rendered result, for hosts that store
/// both (a photo library keeps the edits to allow re-editing later).
#[derive(Debug, Clone, PartialEq)]
pub struct EditingOutput {
    /// Versioned adjustment blob.
    pub adjustments: AdjustmentData,
    /// Rendered image.
    pub render: EncodedOutput,
}

/// Output type for a file export: explicit, else from the extension, else HEIF.
///
/// An unrecognised extension resolves to [`ContentType::Other`], which every
/// export path rejects; only a path without an extension defaults to HEIF.
pub fn resolve_content_type(path: &Path, explicit: Option<ContentType>) -> ContentType {
    explicit
        .or_else(|| ContentType::from_path(path))
        .unwrap_or(ContentType::Heif)
}

impl EditedImage {
    /// Renders and writes the edited image to `path`.
    ///
    /// Returns `false` on any failure; details are logged.
    pub fn write_to_file(&self, path: impl AsRef<Path>, content_type: Option<ContentType>) -> bool {
        let path = path.as_ref();
        match self.try_write_to_file(path, content_type) {
            Ok(ct) => {
                debug!(path = %path.display(), content_type = %ct, "export written");
                true
            }
            Err(e) => {
                warn!(path = %path.display(), error = %e, "export failed");
                false
            }
        }
    }

    /// Like [`write_to_file`](Self::write_to_file), with the error.
    /// Returns the content type that was written.
    pub fn try_write_to_file(&self, path: &Path, content_type: Option<ContentType>) -> RenderResult<ContentType> {
        let content_type = resolve_content_type(path, content_type);
        if !content_type.is_supported() {
            return Err(RenderError::UnsupportedContentType(content_type.to_string()));
        }
        let color = resolve(self.source.colorspace().as_ref());
        let bytes = self.run_export(&content_type, color)?;
        write_atomic(path, &bytes)?;
        Ok(content_type)
    }

    /// Renders the edited image to memory.
    ///
    /// `hint` selects the transfer (HLG for HLG hints, PQ otherwise); without
    /// one the output is BT.2020 PQ. Returns `None` for unsupported types or
    /// on failure.
    pub fn encode_to_bytes(&self, content_type: &ContentType, hint: Option<ColorSpaceHint>) -> Option<EncodedOutput> {
        match self.try_encode_to_bytes(content_type, hint) {
            Ok(out) => Some(out),
            Err(e) => {
                warn!(%content_type, error = %e, "encode failed");
                None
            }
        }
    }

    /// Like [`encode_to_bytes`](Self::encode_to_bytes), with the error.
    pub fn try_encode_to_bytes(
        &self,
        content_type: &ContentType,
        hint: Option<ColorSpaceHint>,
    ) -> RenderResult<EncodedOutput> {
        if !content_type.is_supported() {
            return Err(RenderError::UnsupportedContentType(content_type.to_string()));
        }
        let color = resolve(hint.as_ref());
        let bytes = self.run_export(content_type, color)?;
        Ok(EncodedOutput {
            bytes,
            content_type: content_type.clone(),
            color,
        })
    }

    /// Edits blob plus a HEIF render in the source's resolved color.
    pub fn editing_output(&self) -> Option<EditingOutput> {
        let adjustments = self.save_edits()?;
        let render = self.encode_to_bytes(&ContentType::Heif, self.source.colorspace())?;
        Some(EditingOutput { adjustments, render })
    }

    fn run_export(&self, content_type: &ContentType, color: HdrColorInfo) -> RenderResult<Vec<u8>> {
        self.lane.export(ExportJob {
            source: self.source.clone(),
            chain: self.chain,
            content_type: content_type.clone(),
            color,
        })
    }
}

/// Writes `bytes` to `path` via a sibling temporary file.
fn write_atomic(path: &Path, bytes: &[u8]) -> RenderResult<()> {
    let dir = match path.parent() {
        Some(p) if !p.as_os_str().is_empty() => p,
        _ => Path::new("."),
    };
    let mut tmp = NamedTempFile::new_in(dir)?;
    tmp.write_all(bytes)?;
    tmp.as_file().sync_all()?;
    tmp.persist(path).map_err(|e| RenderError::from(e.error))?;
    Ok(())
}
