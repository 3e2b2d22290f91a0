use std::path::PathBuf;

use anyhow::{Context, Result};
use beamview_core::pipeline::config::PipelineConfig;
use beamview_core::process::roi::RoiParams;
use clap::Args;

#[derive(Args)]
pub struct ConfigArgs {
    /// Write config to a file instead of stdout
    #[arg(short, long)]
    pub output: Option<PathBuf>,
}

/// Print or save a default PipelineConfig as TOML, with an example ROI
/// centered on the synthetic sensor.
pub fn run(args: &ConfigArgs) -> Result<()> {
    let config = PipelineConfig {
        roi: Some(RoiParams::new(320, 256, 100.0, 20.0)),
        ..Default::default()
    };
    let toml_str = toml::to_string_pretty(&config)?;

    if let Some(ref path) = args.output {
        std::fs::write(path, &toml_str)
            .with_context(|| format!("Failed to write config to {}", path.display()))?;
        println!("Default config saved to {}", path.display());
    } else {
        print!("{}", toml_str);
    }

    Ok(())
}
