use std::time::{Duration, Instant};

use anyhow::{Context, Result};
use beamview_core::device::camera::CameraControl;
use beamview_core::device::transport::PortTransport;
use clap::Args;

#[derive(Args)]
pub struct SerialArgs {
    /// Serial port, e.g. /dev/ttyUSB0
    pub port: String,

    /// Commands to send, e.g. "EXP 1000" or "EXP?"
    pub commands: Vec<String>,

    #[arg(long, default_value = "115200")]
    pub baud: u32,

    /// How long to collect replies, in milliseconds
    #[arg(long, default_value = "500")]
    pub wait_ms: u64,
}

pub fn run(args: &SerialArgs) -> Result<()> {
    let transport = PortTransport::open(&args.port, args.baud)
        .with_context(|| format!("Failed to open {}", args.port))?;
    let mut camera = CameraControl::sui_camera(transport)?;
    camera.on_connected()?;
    for command in &args.commands {
        camera.send(command)?;
    }

    let deadline = Instant::now() + Duration::from_millis(args.wait_ms);
    while Instant::now() < deadline {
        camera.poll()?;
    }

    let registers = camera.registers();
    for name in registers.names() {
        match registers.value(name)? {
            Some(raw) => println!("{name:<14}{raw}"),
            None => println!("{name:<14}(no reply)"),
        }
    }
    if let Ok((counts, seconds)) = camera.exposure() {
        println!("Exposure:     {counts} counts, {:.6} s", seconds);
    }
    if let Ok(fps) = camera.frame_rate() {
        println!("Frame rate:   {fps:.2} fps");
    }
    Ok(())
}
