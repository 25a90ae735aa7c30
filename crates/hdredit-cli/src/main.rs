//! hdredit - HDR photo adjustments from the command line
//!
//! Opens an HDR (or SDR) image, applies the exposure / contrast / saturation /
//! sepia chain and writes a BT.2100 PQ or HLG result.

use anyhow::{Context, Result};
use clap::{Args, Parser, Subcommand};
use std::path::PathBuf;
use tracing::warn;

mod commands;
mod logging;
mod settings;

#[derive(Parser)]
#[command(name = "hdredit")]
#[command(author, version, about = "HDR photo adjustments")]
#[command(long_about = "
Applies a fixed chain of photographic adjustments to HDR images and writes
10-bit HEIF or 16-bit PNG in BT.2100 (PQ, or HLG for HLG sources).

Examples:
  hdredit info photo.png                     # Size, color and luminance stats
  hdredit apply photo.png -o out.png --exposure 0.5 --contrast 1.2
  hdredit apply photo.hdr -o out.heic --saturation 0 --save-edits out.edits.json
  hdredit export photo.png --type png --colorspace hlg --with-edits
  hdredit preview photo.png --sepia 0.8 -o preview.p010
")]
struct Cli {
    #[command(subcommand)]
    command: Commands,

    /// Verbose output (-v info, -vv debug, -vvv trace)
    #[arg(short, long, global = true, action = clap::ArgAction::Count)]
    verbose: u8,

    /// Number of threads (0 = auto)
    #[arg(short = 'j', long, global = true, default_value = "0")]
    threads: usize,

    /// Settings file (RON); defaults to <config dir>/hdredit/settings.ron
    #[arg(long, global = true)]
    config: Option<PathBuf>,

    /// Also write logs to this file
    #[arg(long, global = true)]
    log_file: Option<PathBuf>,
}

#[derive(Subcommand)]
enum Commands {
    /// Display image information
    #[command(visible_alias = "i")]
    Info(InfoArgs),

    /// Apply adjustments and write the result to a file
    #[command(visible_alias = "a")]
    Apply(ApplyArgs),

    /// Encode the edited image in memory, optionally with its edits
    #[command(visible_alias = "e")]
    Export(ExportArgs),

    /// Render the P010 preview buffer
    #[command(visible_alias = "p")]
    Preview(PreviewArgs),
}

/// Adjustment flags shared by every editing command.
///
/// Giving a value enables the adjustment.
#[derive(Args, Debug, Clone, Default)]
pub struct AdjustArgs {
    /// Exposure in stops [-2, 2]
    #[arg(long, allow_negative_numbers = true)]
    exposure: Option<f64>,

    /// Contrast around linear mid-gray [0.5, 1.5]
    #[arg(long)]
    contrast: Option<f64>,

    /// Saturation [0, 2]
    #[arg(long)]
    saturation: Option<f64>,

    /// Sepia amount [0, 1]
    #[arg(long)]
    sepia: Option<f64>,

    /// Start from saved edits (JSON written by --save-edits)
    #[arg(long, value_name = "FILE")]
    edits: Option<PathBuf>,

    /// Disable an adjustment (repeatable)
    #[arg(long, value_name = "ADJUSTMENT")]
    disable: Vec<String>,
}

#[derive(Args)]
struct InfoArgs {
    /// Input image(s)
    #[arg(required = true)]
    input: Vec<PathBuf>,

    /// Machine-readable output (JSON)
    #[arg(long)]
    json: bool,
}

#[derive(Args)]
struct ApplyArgs {
    /// Input image
    input: PathBuf,

    /// Output file
    #[arg(short, long)]
    output: PathBuf,

    /// Output type (heic, png, image/png, public.heic); default from extension
    #[arg(short = 't', long = "type")]
    content_type: Option<String>,

    /// Write the edits next to the result
    #[arg(long, value_name = "FILE")]
    save_edits: Option<PathBuf>,

    #[command(flatten)]
    adjust: AdjustArgs,
}

#[derive(Args)]
struct ExportArgs {
    /// Input image
    input: PathBuf,

    /// Output file (default: <input stem>.<type extension>)
    #[arg(short, long)]
    output: Option<PathBuf>,

    /// Output type (default from settings, normally heic)
    #[arg(short = 't', long = "type")]
    content_type: Option<String>,

    /// Output color space hint (hlg, pq, ...); default from the source
    #[arg(long)]
    colorspace: Option<String>,

    /// Also write <output>.edits.json
    #[arg(long)]
    with_edits: bool,

    #[command(flatten)]
    adjust: AdjustArgs,
}

#[derive(Args)]
struct PreviewArgs {
    /// Input image
    input: PathBuf,

    /// Show the unedited image
    #[arg(long)]
    show_original: bool,

    /// Write raw P010 planes (little-endian, luma then CbCr)
    #[arg(short, long)]
    output: Option<PathBuf>,

    #[command(flatten)]
    adjust: AdjustArgs,
}

fn main() -> Result<()> {
    let cli = Cli::parse();

    let (settings, settings_note) = settings::load(cli.config.as_deref())?;
    let log_file = cli.log_file.clone().or_else(|| settings.log_file.clone());
    let _log_guard = logging::init(cli.verbose, log_file.as_deref());
    if let Some(note) = settings_note {
        warn!("{note}");
    }

    if cli.threads > 0 {
        rayon::ThreadPoolBuilder::new()
            .num_threads(cli.threads)
            .build_global()
            .context("Failed to configure thread pool")?;
    }

    match cli.command {
        Commands::Info(args) => commands::info::run(args, cli.verbose),
        Commands::Apply(args) => commands::apply::run(args, &settings),
        Commands::Export(args) => commands::export::run(args, &settings),
        Commands::Preview(args) => commands::preview::run(args, &settings),
    }
}
