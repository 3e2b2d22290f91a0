mod commands;
mod summary;

use anyhow::Result;
use clap::{Parser, Subcommand};
use tracing_subscriber::EnvFilter;

#[derive(Parser)]
#[command(name = "beamview", about = "Live beam camera viewer and frame pipeline")]
#[command(version)]
struct Cli {
    /// Enable verbose output
    #[arg(short, long, global = true)]
    verbose: bool,

    #[command(subcommand)]
    command: Commands,
}

#[derive(Subcommand)]
enum Commands {
    /// List available acquisition devices
    Devices(commands::devices::DevicesArgs),
    /// Run the live frame pipeline
    Run(commands::run::RunArgs),
    /// Print or save the default pipeline config
    Config(commands::config::ConfigArgs),
    /// Draw an annotation script onto an image
    Annotate(commands::annotate::AnnotateArgs),
    /// Check a frame timestamp log for dropped frames
    Timestamps(commands::timestamps::TimestampsArgs),
    /// Send commands to the camera over a serial port
    #[cfg(feature = "serial")]
    Serial(commands::serial::SerialArgs),
}

fn main() -> Result<()> {
    let cli = Cli::parse();

    let filter = if cli.verbose {
        EnvFilter::new("debug")
    } else {
        EnvFilter::new("warn")
    };
    tracing_subscriber::fmt().with_env_filter(filter).init();

    match &cli.command {
        Commands::Devices(args) => commands::devices::run(args),
        Commands::Run(args) => commands::run::run(args),
        Commands::Config(args) => commands::config::run(args),
        Commands::Annotate(args) => commands::annotate::run(args),
        Commands::Timestamps(args) => commands::timestamps::run(args),
        #[cfg(feature = "serial")]
        Commands::Serial(args) => commands::serial::run(args),
    }
}
