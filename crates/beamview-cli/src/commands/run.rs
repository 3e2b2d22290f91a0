use std::path::PathBuf;
use std::sync::mpsc::RecvTimeoutError;

use anyhow::{bail, Context, Result};
use beamview_core::acquisition::{
    AcquisitionEvent, AcquisitionReader, AcquisitionSource, DirectorySource, ResolutionRequest,
    SyntheticSource,
};
use beamview_core::consts::{ACQUISITION_TIMEOUT, HISTOGRAM_FULL_SCALE};
use beamview_core::pipeline::config::PipelineConfig;
use beamview_core::pipeline::session::Session;
use clap::Args;
use indicatif::{ProgressBar, ProgressStyle};
use tracing::warn;

use crate::summary::{print_run_header, print_run_summary, RunSummary};

#[derive(Args)]
pub struct RunArgs {
    /// Pipeline config file (TOML)
    #[arg(long)]
    pub config: Option<PathBuf>,

    /// Frame source: `synthetic` or `dir:<path>`
    #[arg(long, default_value = "synthetic")]
    pub source: String,

    /// Stop after this many frames
    #[arg(long, default_value = "100")]
    pub frames: u64,

    /// Frames per average (overrides the config)
    #[arg(long)]
    pub target: Option<usize>,

    /// Write averages and timestamp logs to this directory
    #[arg(short, long)]
    pub output: Option<PathBuf>,

    /// Synthetic source: skip a counter value every N frames
    #[arg(long)]
    pub drop_every: Option<u32>,

    /// Directory source: delete files once read
    #[arg(long)]
    pub delete_after_read: bool,
}

pub fn run(args: &RunArgs) -> Result<()> {
    let mut config = if let Some(ref config_path) = args.config {
        PipelineConfig::load(config_path)
            .with_context(|| format!("Failed to load config {}", config_path.display()))?
    } else {
        PipelineConfig::default()
    };
    if let Some(target) = args.target {
        config.accumulation.target = target;
    }
    if let Some(ref dir) = args.output {
        config.output.directory = Some(dir.clone());
        config.output.save_averages = true;
        config.output.timestamp_logs = true;
    }

    let mut source = open_source(args)?;
    let device = source
        .list_devices()?
        .into_iter()
        .next()
        .context("No acquisition device found")?;
    source
        .connect(&device)
        .with_context(|| format!("Failed to connect to {device}"))?;
    let sensor = source.sensor();
    let window = source.open_stream(ResolutionRequest::full(sensor))?;
    if window.is_none() {
        warn!("Resolution request rejected, keeping device defaults");
    }
    let bit_depth = source.bit_depth();

    let mut session = Session::new(&config)?;
    session.attach_output(&config.output)?;
    print_run_header(&config, &device, args.frames);

    let (reader, events) = AcquisitionReader::spawn(source, ACQUISITION_TIMEOUT)?;

    let pb = ProgressBar::new(config.accumulation.target as u64);
    pb.set_style(
        ProgressStyle::default_bar()
            .template("{msg:20} [{bar:40}] {pos}/{len}")?
            .progress_chars("=> "),
    );
    pb.set_message("Accumulating");

    let mut disconnect_reason = None;
    while session.stats().frames < args.frames {
        match events.recv_timeout(ACQUISITION_TIMEOUT * 2) {
            Ok(AcquisitionEvent::Frame(raw)) => {
                if session.process_raw(raw, bit_depth).is_some() {
                    pb.set_message(format!("Average {}", session.stats().rendered));
                }
                pb.set_position(session.accumulator().count() as u64);
            }
            Ok(AcquisitionEvent::Disconnected { reason }) => {
                disconnect_reason = Some(reason);
                break;
            }
            Err(RecvTimeoutError::Timeout) if reader.is_running() => continue,
            Err(_) => break,
        }
    }

    let skipped = reader.skipped();
    drop(reader.stop());
    pb.finish_with_message("Done");

    let level_peak = session
        .histogram()
        .and_then(|h| h.peak())
        .map(|(lo, hi, _)| (lo * HISTOGRAM_FULL_SCALE, hi * HISTOGRAM_FULL_SCALE));
    let saved = session.output().map_or(0, |o| o.saved_averages());
    let timestamp_records = session.finish_output()?;
    print_run_summary(&RunSummary {
        stats: session.stats(),
        dropped: session.tracker().total_dropped(),
        gap_events: session.tracker().gap_events(),
        skipped_by_consumer: skipped,
        last_signal: session.series().latest(),
        level_peak,
        saved_averages: saved,
        timestamp_records,
        output: config.output.directory.as_deref(),
        disconnect_reason: disconnect_reason.as_deref(),
    });

    Ok(())
}

fn open_source(args: &RunArgs) -> Result<Box<dyn AcquisitionSource>> {
    if args.source == "synthetic" {
        let mut source = SyntheticSource::default();
        if let Some(n) = args.drop_every {
            source = source.with_drop_every(n);
        }
        return Ok(Box::new(source));
    }
    if let Some(dir) = args.source.strip_prefix("dir:") {
        let source = DirectorySource::new(dir).with_delete_after_read(args.delete_after_read);
        return Ok(Box::new(source));
    }
    bail!("Unknown source {:?}, expected `synthetic` or `dir:<path>`", args.source)
}
