//! Export command: encode in memory and write the bytes, optionally with
//! the edits sidecar.

use crate::ExportArgs;
use crate::settings::Settings;
use anyhow::{Context, Result};
use hdredit_core::ColorSpaceHint;
use hdredit_io::ContentType;
use hdredit_render::Renderer;
use std::path::PathBuf;

/// Runs the export command.
pub fn run(args: ExportArgs, settings: &Settings) -> Result<()> {
    let renderer = Renderer::cpu(settings.renderer.clone())?;
    let edit = super::open_session(&renderer, &args.input, &args.adjust)?;

    let content_type = ContentType::parse(args.content_type.as_deref().unwrap_or(&settings.default_type));
    let hint = match args.colorspace.as_deref() {
        Some(name) => Some(ColorSpaceHint::from_name(name)),
        None => edit.source().colorspace(),
    };
    let out = edit
        .try_encode_to_bytes(&content_type, hint)
        .with_context(|| format!("Failed to encode {}", args.input.display()))?;

    let output = args.output.clone().unwrap_or_else(|| {
        let stem = edit.default_filename().unwrap_or("edited");
        PathBuf::from(format!("{stem}.{}", content_type.extension()))
    });
    std::fs::write(&output, &out.bytes).with_context(|| format!("Failed to write: {}", output.display()))?;
    println!(
        "{}: {} {} ({})",
        output.display(),
        out.content_type,
        out.color,
        super::format_size(out.bytes.len() as u64)
    );

    if args.with_edits {
        let sidecar = output.with_extension("edits.json");
        let edits = edit.save_edits().context("Failed to encode edits")?;
        super::write_edits(&sidecar, &edits)?;
        println!("{}: edits", sidecar.display());
    }
    Ok(())
}
