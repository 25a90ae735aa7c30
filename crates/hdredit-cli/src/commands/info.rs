//! Image info command.
//!
//! Shows size, detected format, source color space, the BT.2100 color an
//! export would use, and luminance statistics in working-space units
//! (1.0 = reference white).

use crate::InfoArgs;
use anyhow::{Context, Result};
use hdredit_core::{Image, luminance_rec2020};
use hdredit_io::{SourceFormat, THUMBNAIL_MAX_PIXELS, load_path, thumbnail};
use hdredit_render::resolve;
use rayon::prelude::*;
use std::path::Path;

/// Luminance statistics over all pixels.
#[derive(Debug, Clone, Copy, PartialEq)]
struct Stats {
    min: f32,
    max: f32,
    mean: f32,
    /// Share of pixels brighter than reference white.
    above_white: f32,
}

fn compute_stats(image: &Image) -> Stats {
    let n = (image.width() as usize * image.height() as usize).max(1) as f64;
    let (min, max, sum, above) = image
        .data()
        .par_chunks_exact(4)
        .map(|px| {
            let y = luminance_rec2020([px[0], px[1], px[2]]);
            (y, y, y as f64, (y > 1.0) as u64)
        })
        .reduce(
            || (f32::INFINITY, f32::NEG_INFINITY, 0.0, 0),
            |a, b| (a.0.min(b.0), a.1.max(b.1), a.2 + b.2, a.3 + b.3),
        );
    if image.is_empty() {
        return Stats {
            min: 0.0,
            max: 0.0,
            mean: 0.0,
            above_white: 0.0,
        };
    }
    Stats {
        min,
        max,
        mean: (sum / n) as f32,
        above_white: (above as f64 / n) as f32,
    }
}

/// Runs the info command.
pub fn run(args: InfoArgs, verbose: u8) -> Result<()> {
    for path in &args.input {
        let head = std::fs::read(path).with_context(|| format!("Failed to read: {}", path.display()))?;
        let format = SourceFormat::from_bytes(&head);
        let file_size = head.len() as u64;
        drop(head);

        let image = load_path(path).with_context(|| format!("Failed to load: {}", path.display()))?;
        let stats = compute_stats(&image);

        if args.json {
            print_json(path, &image, format, file_size, &stats)?;
        } else {
            print_text(path, &image, format, file_size, &stats, verbose);
        }

        if args.input.len() > 1 && !args.json {
            println!();
        }
    }
    Ok(())
}

fn print_text(
    path: &Path,
    image: &Image,
    format: Option<SourceFormat>,
    file_size: u64,
    stats: &Stats,
    verbose: u8,
) {
    let color = resolve(image.colorspace().as_ref());
    println!("{}", path.display());
    println!("  Resolution: {}x{}", image.width(), image.height());
    if let Some(format) = format {
        println!("  Format:     {format}");
    }
    println!(
        "  Color:      {}",
        image.colorspace().map(|c| c.name()).unwrap_or("untagged")
    );
    println!("  Export as:  {color}");
    println!("  File size:  {}", super::format_size(file_size));
    println!("  Luminance:  min {:.4}  max {:.4}  mean {:.4}", stats.min, stats.max, stats.mean);
    println!("  Above ref:  {:.2}%", stats.above_white * 100.0);

    if verbose > 0 {
        let t = thumbnail(image, THUMBNAIL_MAX_PIXELS);
        println!("  Thumbnail:  {}x{}", t.width(), t.height());
    }
}

fn print_json(
    path: &Path,
    image: &Image,
    format: Option<SourceFormat>,
    file_size: u64,
    stats: &Stats,
) -> Result<()> {
    let color = resolve(image.colorspace().as_ref());
    let value = serde_json::json!({
        "path": path.display().to_string(),
        "width": image.width(),
        "height": image.height(),
        "format": format.map(|f| f.to_string()),
        "colorspace": image.colorspace(),
        "export_color": color,
        "file_size": file_size,
        "luminance": {
            "min": stats.min,
            "max": stats.max,
            "mean": stats.mean,
            "above_reference_white": stats.above_white,
        },
    });
    println!("{}", serde_json::to_string_pretty(&value)?);
    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn stats_of_flat_image() {
        let img = Image::filled(4, 4, [2.0, 2.0, 2.0, 1.0]);
        let s = compute_stats(&img);
        assert!((s.min - 2.0).abs() < 1e-5);
        assert!((s.max - 2.0).abs() < 1e-5);
        assert!((s.mean - 2.0).abs() < 1e-5);
        assert_eq!(s.above_white, 1.0);
    }

    #[test]
    fn stats_of_empty_image() {
        let s = compute_stats(&Image::new(0, 0));
        assert_eq!(s.max, 0.0);
    }
}
