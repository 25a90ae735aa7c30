//! CLI command implementations

pub mod apply;
pub mod export;
pub mod info;
pub mod preview;

use crate::AdjustArgs;
use anyhow::{Context, Result};
use hdredit_io::{AdjustmentData, Asset, persist};
use hdredit_ops::AdjustmentId;
use hdredit_render::{EditedImage, Renderer};
use std::path::Path;
use tracing::{debug, warn};

impl AdjustArgs {
    fn values(&self) -> [(AdjustmentId, Option<f64>); 4] {
        [
            (AdjustmentId::Exposure, self.exposure),
            (AdjustmentId::Contrast, self.contrast),
            (AdjustmentId::Saturation, self.saturation),
            (AdjustmentId::Sepia, self.sepia),
        ]
    }

    /// Applies the flags on top of the session's current chain.
    fn apply_to(&self, edit: &mut EditedImage) -> Result<()> {
        for (id, value) in self.values() {
            if let Some(v) = value {
                edit.set_adjustment(id, Some(true), Some(v));
                debug!(%id, requested = v, applied = edit.chain().get(id).value(), "adjustment");
            }
        }
        for name in &self.disable {
            let id: AdjustmentId = name.parse()?;
            edit.set_enabled(id, false);
        }
        Ok(())
    }
}

/// Opens `input` for editing with the adjustments from `adjust`.
pub fn open_session(renderer: &Renderer, input: &Path, adjust: &AdjustArgs) -> Result<EditedImage> {
    let edits = adjust.edits.as_deref().map(read_edits).transpose()?;
    if let Some(blob) = &edits {
        if let Err(e) = persist::try_load(blob) {
            warn!(error = %e, "saved edits ignored, starting from defaults");
        }
    }
    let asset = Asset::from_path(input);
    let mut edit = EditedImage::open(renderer, &asset, edits.as_ref())
        .with_context(|| format!("Failed to load: {}", input.display()))?;
    adjust.apply_to(&mut edit)?;
    Ok(edit)
}

/// Reads an edits sidecar.
pub fn read_edits(path: &Path) -> Result<AdjustmentData> {
    let bytes = std::fs::read(path).with_context(|| format!("Failed to read edits: {}", path.display()))?;
    serde_json::from_slice(&bytes).with_context(|| format!("Invalid edits file: {}", path.display()))
}

/// Writes an edits sidecar.
pub fn write_edits(path: &Path, edits: &AdjustmentData) -> Result<()> {
    let json = serde_json::to_vec_pretty(edits)?;
    std::fs::write(path, json).with_context(|| format!("Failed to write edits: {}", path.display()))
}

/// Format file size for display
pub fn format_size(bytes: u64) -> String {
    const KB: u64 = 1024;
    const MB: u64 = KB * 1024;

    if bytes >= MB {
        format!("{:.2} MB", bytes as f64 / MB as f64)
    } else if bytes >= KB {
        format!("{:.2} KB", bytes as f64 / KB as f64)
    } else {
        format!("{} B", bytes)
    }
}
