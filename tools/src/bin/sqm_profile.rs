// cargo run --bin sqm-profile --release -- --min-lux 0.0001 --max-lux 200000 --steps 500 /tmp/sqm_profile.txt

use clap::Parser;
use std::fs::File;
use std::io::prelude::*;
use std::path::PathBuf;

use sqm_lib::{
    metrics,
    units::{Illuminance, Magnitude},
};

/// Print the sky-quality metric profile over an illuminance sweep
#[derive(Parser, Debug)]
#[command(version)]
struct Opts {
    /// Lower bound of the sweep, in lux
    #[arg(long, default_value_t = 0.0001)]
    min_lux: f64,

    /// Upper bound of the sweep, in lux
    #[arg(long, default_value_t = 200_000.0)]
    max_lux: f64,

    /// Number of logarithmically spaced sample points
    #[arg(long, default_value_t = 200)]
    steps: usize,

    /// Calibration offset applied to every point, in magnitudes
    #[arg(long, default_value_t = 0.0)]
    offset: f64,

    /// Output file path to write
    output: PathBuf,
}

fn main() -> Result<(), Box<dyn std::error::Error>> {
    let opts = Opts::parse();

    let mut output = File::create(opts.output)?;
    let offset = Magnitude::from_mags(opts.offset);

    let log_min = opts.min_lux.log10();
    let log_max = opts.max_lux.log10();
    let span = (opts.steps.saturating_sub(1)).max(1) as f64;

    for i in 0..opts.steps {
        let lux = 10f64.powf(log_min + (i as f64 / span) * (log_max - log_min));
        let m = metrics::derive(Illuminance::from_lux(lux), offset);

        writeln!(
            &mut output,
            "{} {} {} {}",
            lux,
            m.sqm.as_mags(),
            m.nelm.as_mags(),
            m.bortle.color
        )?;
    }

    Ok(())
}
