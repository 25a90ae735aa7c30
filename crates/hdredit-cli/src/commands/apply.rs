//! Apply command: edit an image and write the result to a file.

use crate::ApplyArgs;
use crate::settings::Settings;
use anyhow::{Context, Result};
use hdredit_io::ContentType;
use hdredit_render::Renderer;
use tracing::info;

/// Runs the apply command.
pub fn run(args: ApplyArgs, settings: &Settings) -> Result<()> {
    let renderer = Renderer::cpu(settings.renderer.clone())?;
    let edit = super::open_session(&renderer, &args.input, &args.adjust)?;

    let content_type = args.content_type.as_deref().map(ContentType::parse);
    let written = edit
        .try_write_to_file(&args.output, content_type)
        .with_context(|| format!("Failed to write: {}", args.output.display()))?;

    if let Some(path) = &args.save_edits {
        let edits = edit.save_edits().context("Failed to encode edits")?;
        super::write_edits(path, &edits)?;
    }

    let size = std::fs::metadata(&args.output).map(|m| m.len()).unwrap_or(0);
    info!(input = %args.input.display(), output = %args.output.display(), %written, "applied");
    println!(
        "{} -> {} ({}, {})",
        args.input.display(),
        args.output.display(),
        written,
        super::format_size(size)
    );
    Ok(())
}
