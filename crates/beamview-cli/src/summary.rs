use std::path::Path;

use beamview_core::pipeline::config::PipelineConfig;
use beamview_core::pipeline::session::SessionStats;
use console::Style;

struct Styles {
    title: Style,
    header: Style,
    label: Style,
    value: Style,
    warn: Style,
    disabled: Style,
    path: Style,
}

impl Styles {
    fn new() -> Self {
        Self {
            title: Style::new().cyan().bold(),
            header: Style::new().cyan().bold(),
            label: Style::new().dim(),
            value: Style::new().bold().white(),
            warn: Style::new().yellow().bold(),
            disabled: Style::new().dim().yellow(),
            path: Style::new().underlined(),
        }
    }
}

pub struct RunSummary<'a> {
    pub stats: SessionStats,
    pub dropped: u64,
    pub gap_events: u64,
    pub skipped_by_consumer: u64,
    pub last_signal: Option<f64>,
    /// Sample range of the fullest histogram bin of the last average.
    pub level_peak: Option<(f64, f64)>,
    pub saved_averages: u64,
    pub timestamp_records: u64,
    pub output: Option<&'a Path>,
    pub disconnect_reason: Option<&'a str>,
}

pub fn print_run_header(config: &PipelineConfig, device: &str, frames: u64) {
    let s = Styles::new();

    println!();
    println!("  {}", s.title.apply_to("Beamview"));
    println!("  {}", s.title.apply_to("\u{2550}".repeat(8)));
    println!();
    println!("  {:<14}{}", s.label.apply_to("Device"), s.value.apply_to(device));
    println!("  {:<14}{}", s.label.apply_to("Frames"), s.value.apply_to(frames));
    println!(
        "  {:<14}{}",
        s.label.apply_to("Average of"),
        s.value.apply_to(format!("{} frames", config.accumulation.target))
    );
    match config.roi {
        Some(roi) => println!(
            "  {:<14}{}",
            s.label.apply_to("ROI"),
            s.value.apply_to(format!(
                "({}, {}) r={} taper={}",
                roi.center_x, roi.center_y, roi.radius, roi.taper
            ))
        ),
        None => println!(
            "  {:<14}{}",
            s.label.apply_to("ROI"),
            s.disabled.apply_to("full frame")
        ),
    }
    println!(
        "  {:<14}{}",
        s.label.apply_to("Display"),
        s.value.apply_to(format!("{} .. {}", config.display.min, config.display.max))
    );
    println!(
        "  {:<14}{}",
        s.label.apply_to("Processor"),
        s.value.apply_to(&config.processor.name)
    );
    println!();
}

pub fn print_run_summary(summary: &RunSummary) {
    let s = Styles::new();

    println!();
    println!("  {}", s.header.apply_to("Session"));
    println!(
        "    {:<16}{}",
        s.label.apply_to("Frames"),
        s.value.apply_to(summary.stats.frames)
    );
    let dropped_style = if summary.dropped > 0 { &s.warn } else { &s.value };
    println!(
        "    {:<16}{}",
        s.label.apply_to("Dropped"),
        dropped_style.apply_to(format!(
            "{} in {} gap(s)",
            summary.dropped, summary.gap_events
        ))
    );
    println!(
        "    {:<16}{}",
        s.label.apply_to("Not consumed"),
        s.value.apply_to(summary.skipped_by_consumer)
    );
    println!(
        "    {:<16}{}",
        s.label.apply_to("Averages"),
        s.value.apply_to(summary.stats.rendered)
    );
    if summary.stats.skipped_renders > 0 {
        println!(
            "    {:<16}{}",
            s.label.apply_to("Skipped renders"),
            s.warn.apply_to(summary.stats.skipped_renders)
        );
    }
    match summary.last_signal {
        Some(v) => println!(
            "    {:<16}{}",
            s.label.apply_to("Summed signal"),
            s.value.apply_to(format!("{v:.1}"))
        ),
        None => println!(
            "    {:<16}{}",
            s.label.apply_to("Summed signal"),
            s.disabled.apply_to("n/a")
        ),
    }
    if let Some((lo, hi)) = summary.level_peak {
        println!(
            "    {:<16}{}",
            s.label.apply_to("Peak level"),
            s.value.apply_to(format!("{lo:.1} .. {hi:.1}"))
        );
    }
    if let Some(dir) = summary.output {
        println!(
            "    {:<16}{}",
            s.label.apply_to("Output"),
            s.path.apply_to(dir.display())
        );
        println!(
            "    {:<16}{}",
            s.label.apply_to("Saved"),
            s.value.apply_to(format!(
                "{} average(s), {} timestamp record(s)",
                summary.saved_averages, summary.timestamp_records
            ))
        );
    }
    if let Some(reason) = summary.disconnect_reason {
        println!(
            "    {:<16}{}",
            s.label.apply_to("Disconnected"),
            s.warn.apply_to(reason)
        );
    }
    println!();
}
