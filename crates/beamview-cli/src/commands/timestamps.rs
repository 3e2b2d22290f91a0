use std::path::PathBuf;

use anyhow::{Context, Result};
use beamview_core::acquisition::FrameSequenceTracker;
use beamview_core::consts::SEQUENCE_BIT_WIDTH;
use beamview_core::io::timestamp_log::TimestampLog;
use clap::Args;

#[derive(Args)]
pub struct TimestampsArgs {
    /// Frame counter log written by `run`
    pub frame_log: PathBuf,

    /// Matching host timestamp log
    #[arg(long)]
    pub host_log: Option<PathBuf>,

    /// Width of the embedded frame counter
    #[arg(long, default_value_t = SEQUENCE_BIT_WIDTH)]
    pub bits: u32,
}

pub fn run(args: &TimestampsArgs) -> Result<()> {
    let frames = TimestampLog::open(&args.frame_log)
        .with_context(|| format!("Failed to open {}", args.frame_log.display()))?;

    let mut tracker = FrameSequenceTracker::new(args.bits);
    let mut missing = 0u64;
    for value in frames.iter() {
        if value.is_finite() && value >= 0.0 {
            tracker.observe(value as u32);
        } else {
            missing += 1;
        }
    }

    println!("Records:     {}", frames.len());
    println!("Dropped:     {}", tracker.total_dropped());
    println!("Gaps:        {}", tracker.gap_events());
    if missing > 0 {
        println!("No counter:  {}", missing);
    }

    if let Some(ref path) = args.host_log {
        let host = TimestampLog::open(path)
            .with_context(|| format!("Failed to open {}", path.display()))?;
        if host.len() != frames.len() {
            println!(
                "Warning:     host log has {} records, frame log {}",
                host.len(),
                frames.len()
            );
        }
        let times: Vec<f64> = host.iter().filter(|t| t.is_finite()).collect();
        if let (Some(first), Some(last)) = (times.first(), times.last()) {
            let span = last - first;
            println!("Duration:    {:.3} s", span);
            if span > 0.0 && times.len() > 1 {
                println!("Mean rate:   {:.2} fps", (times.len() - 1) as f64 / span);
            }
        }
    }

    Ok(())
}
