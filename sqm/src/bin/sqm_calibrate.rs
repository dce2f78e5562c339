use clap::Parser;
use std::path::PathBuf;
use std::time::Duration;

use sqm_lib::{
    calibration::{self, CalibrationOpts},
    config::Config,
    interruptor::Interruptor,
    pipeline,
};

#[derive(Parser, Debug)]
#[command(version)]
struct Opts {
    /// Pipeline configuration toml file.
    ///
    /// The default configuration (no sensor) is used when not provided.
    #[arg(long)]
    config: Option<PathBuf>,

    /// Number of samples to record, overriding the configured value
    #[arg(long)]
    samples: Option<u32>,

    /// Delay between samples (e.g. '60s', '2m'), overriding the
    /// configured value
    #[arg(long, value_parser = humantime::parse_duration)]
    delay: Option<Duration>,
}

fn main() -> Result<(), Box<dyn std::error::Error>> {
    tracing_subscriber::fmt::init();
    let opts = Opts::parse();

    let intr = Interruptor::new();
    let intr_clone = intr.clone();
    ctrlc::set_handler(move || {
        if intr_clone.is_set() {
            let exit_code = if cfg!(target_family = "unix") {
                // 128 (fatal error signal "n") + 2 (control-c is fatal error signal 2)
                130
            } else {
                // Windows code 3221225786
                // -1073741510 == C000013A
                -1073741510
            };
            std::process::exit(exit_code);
        } else {
            intr_clone.set();
        }
    })?;

    let config = match &opts.config {
        Some(path) => Config::load(path)?,
        None => Config::default(),
    };

    let mut cal_opts = CalibrationOpts::from_config(&config);
    if let Some(samples) = opts.samples {
        cal_opts.samples = samples;
    }
    if let Some(delay) = opts.delay {
        cal_opts.delay = delay;
    }

    let summary = calibration::run(&config, &cal_opts, &intr, pipeline::run)?;
    println!(
        "Recorded {}/{} samples to {}",
        summary.rows_written,
        summary.samples_requested,
        config.calibration.log_file.display()
    );

    Ok(())
}
