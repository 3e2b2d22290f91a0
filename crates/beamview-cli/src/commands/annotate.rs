use std::path::PathBuf;

use anyhow::{Context, Result};
use beamview_core::io::image_io::{load_raw_image, save_display_png};
use beamview_core::process::annotation::{AnnotationEngine, CommentStyle};
use beamview_core::process::display::DisplayScaler;
use clap::Args;

#[derive(Args)]
pub struct AnnotateArgs {
    /// Annotation script
    pub script: PathBuf,

    /// Grayscale image to draw on
    pub image: PathBuf,

    /// Output PNG
    #[arg(short, long, default_value = "annotated.png")]
    pub output: PathBuf,

    /// Lower display bound (default: image minimum)
    #[arg(long)]
    pub min: Option<f64>,

    /// Upper display bound (default: image maximum)
    #[arg(long)]
    pub max: Option<f64>,

    /// Cut comments the way older scripts expect
    #[arg(long)]
    pub legacy_comments: bool,
}

pub fn run(args: &AnnotateArgs) -> Result<()> {
    let script = std::fs::read_to_string(&args.script)
        .with_context(|| format!("Failed to read script {}", args.script.display()))?;
    let raw = load_raw_image(&args.image)
        .with_context(|| format!("Failed to load {}", args.image.display()))?;
    let data = raw.mapv(f64::from);

    let min = args
        .min
        .unwrap_or_else(|| data.iter().copied().fold(f64::INFINITY, f64::min));
    let max = args
        .max
        .unwrap_or_else(|| data.iter().copied().fold(f64::NEG_INFINITY, f64::max));
    let mut display = DisplayScaler::default()
        .render(&data, min, max, None)
        .context("Cannot scale image")?;

    let style = if args.legacy_comments {
        CommentStyle::Legacy
    } else {
        CommentStyle::Standard
    };
    let annotations = AnnotationEngine::new(style).parse(&script, data.dim());
    let drawn = AnnotationEngine::apply(&mut display, &annotations);

    save_display_png(&display, &args.output)?;
    println!(
        "Drew {drawn} of {} annotation(s), saved to {}",
        annotations.len(),
        args.output.display()
    );
    Ok(())
}
