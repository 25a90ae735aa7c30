//! Preview command: render the P010 buffer the editor would display.

use crate::PreviewArgs;
use crate::settings::Settings;
use anyhow::{Context, Result, bail};
use hdredit_render::Renderer;

/// Runs the preview command.
pub fn run(args: PreviewArgs, settings: &Settings) -> Result<()> {
    let renderer = Renderer::cpu(settings.renderer.clone())?;
    let mut edit = super::open_session(&renderer, &args.input, &args.adjust)?;
    if args.show_original {
        edit.set_show_original(true);
    }

    if !edit.wait_for_render(settings.renderer.render_deadline()) {
        bail!("Preview did not finish within {:?}", settings.renderer.render_deadline());
    }
    if let Some(e) = edit.last_error() {
        return Err(e.clone()).context("Preview render failed");
    }
    let buf = edit.published().context("No preview was produced")?;

    let (lo, hi) = buf
        .luma()
        .iter()
        .fold((u16::MAX, 0u16), |(lo, hi), &y| (lo.min(y >> 6), hi.max(y >> 6)));
    println!("{}", args.input.display());
    println!("  Size:       {}x{}", buf.width(), buf.height());
    println!("  Layout:     {}", buf.layout());
    if let Some(color) = buf.color() {
        println!("  Color:      {color}");
    }
    println!("  Luma range: {lo}..{hi} (10-bit)");
    println!("  Buffer:     {}", super::format_size(buf.byte_len() as u64));

    if let Some(path) = &args.output {
        std::fs::write(path, buf.to_le_bytes()).with_context(|| format!("Failed to write: {}", path.display()))?;
        println!("  Written:    {}", path.display());
    }
    Ok(())
}
