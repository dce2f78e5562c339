use clap::Parser;
use std::path::PathBuf;

use sqm_lib::{config::Config, pipeline};

#[derive(Parser, Debug)]
#[command(version)]
struct Opts {
    /// Pipeline configuration toml file.
    ///
    /// The default configuration (no sensor) is used when not provided.
    #[arg(long)]
    config: Option<PathBuf>,

    /// Remove the overlay snapshot and exit (module teardown)
    #[arg(long)]
    cleanup: bool,
}

fn main() -> Result<(), Box<dyn std::error::Error>> {
    tracing_subscriber::fmt::init();
    let opts = Opts::parse();

    let config = match &opts.config {
        Some(path) => Config::load(path)?,
        None => Config::default(),
    };

    if opts.cleanup {
        pipeline::cleanup(&config)?;
        return Ok(());
    }

    let summary = pipeline::run(&config);
    println!("{summary}");

    Ok(())
}
