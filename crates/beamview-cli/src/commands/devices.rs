use std::path::PathBuf;

use anyhow::Result;
use beamview_core::acquisition::{AcquisitionSource, DirectorySource, SyntheticSource};
use clap::Args;

#[derive(Args)]
pub struct DevicesArgs {
    /// Also list a watched image directory
    #[arg(long)]
    pub dir: Option<PathBuf>,
}

pub fn run(args: &DevicesArgs) -> Result<()> {
    let mut sources: Vec<(&str, Box<dyn AcquisitionSource>)> = Vec::new();
    sources.push(("synthetic", Box::new(SyntheticSource::default())));
    if let Some(ref dir) = args.dir {
        sources.push(("directory", Box::new(DirectorySource::new(dir))));
    }

    for (kind, source) in &mut sources {
        for id in source.list_devices()? {
            let sensor = source.sensor();
            if sensor.width > 0 {
                println!("{id:<24}{kind:<12}{}x{}", sensor.width, sensor.height);
            } else {
                println!("{id:<24}{kind}");
            }
        }
    }
    Ok(())
}
