//! Calibration mode: drive repeated pipeline runs at a fixed cadence
//! and append one durable log row per sample.
//!
//! A single bad sample never aborts the run; the iteration is logged,
//! skipped, and the loop moves on. The loop also polls the interruptor
//! between iterations so an operator can stop a long run early.

use chrono::Local;
use std::{
    fs::{self, OpenOptions},
    io::Write,
    path::Path,
    thread,
    time::Duration,
};
use tracing::{error, info};

use crate::{
    config::Config,
    interruptor::Interruptor,
    snapshot::{self, PersistenceError},
};

/// Column header, written exactly once when the log file is created.
pub const LOG_HEADER: &str = "Timestamp,Lux,SQM_raw,SQM_adj,NELM,Rating,Offset";

const TIMESTAMP_FORMAT: &str = "%Y-%m-%d %H:%M:%S";

#[derive(Debug, Copy, Clone, PartialEq, Eq)]
pub struct CalibrationOpts {
    pub samples: u32,
    pub delay: Duration,
}

impl CalibrationOpts {
    pub fn from_config(config: &Config) -> Self {
        Self {
            samples: config.calibration.samples,
            delay: Duration::try_from_secs_f64(config.calibration.delay_secs)
                .unwrap_or_default(),
        }
    }
}

#[derive(Debug, Copy, Clone, PartialEq, Eq, Default)]
pub struct CalibrationSummary {
    pub samples_requested: u32,
    pub rows_written: u32,
    pub interrupted: bool,
}

/// Create the log file with its header if it does not exist yet.
/// Calling this on an existing log is a no-op.
pub fn ensure_log_header(path: &Path) -> Result<(), PersistenceError> {
    if path.exists() {
        return Ok(());
    }
    if let Some(parent) = path.parent() {
        if !parent.as_os_str().is_empty() {
            fs::create_dir_all(parent)?;
        }
    }
    fs::write(path, format!("{LOG_HEADER}\n"))?;
    Ok(())
}

/// Run `opts.samples` calibration iterations. The pipeline invocation
/// is injected so tests can script per-iteration outcomes.
pub fn run<F>(
    config: &Config,
    opts: &CalibrationOpts,
    intr: &Interruptor,
    mut sample: F,
) -> Result<CalibrationSummary, PersistenceError>
where
    F: FnMut(&Config) -> String,
{
    let log_path = &config.calibration.log_file;
    ensure_log_header(log_path)?;

    let mut summary = CalibrationSummary {
        samples_requested: opts.samples,
        ..Default::default()
    };

    for i in 1..=opts.samples {
        if intr.is_set() {
            summary.interrupted = true;
            info!(sample = i, "Calibration interrupted");
            break;
        }

        sample(config);

        // Round-trip through the snapshot on purpose: the log records
        // what the overlay actually sees, and a broken snapshot write
        // surfaces here as a skipped sample.
        match record_sample(config, log_path) {
            Ok(record) => {
                summary.rows_written += 1;
                info!(
                    sample = i,
                    total = opts.samples,
                    sqm = record.sqm_adj,
                    rating = %record.rating,
                    "Calibration sample recorded"
                );
            }
            Err(e) => error!(sample = i, error = %e, "Calibration sample skipped"),
        }

        thread::sleep(opts.delay);
    }

    info!(log = %log_path.display(), "Calibration complete");
    Ok(summary)
}

struct LogRecord {
    sqm_adj: f64,
    rating: String,
}

fn record_sample(config: &Config, log_path: &Path) -> Result<LogRecord, PersistenceError> {
    let snap = snapshot::read(config.snapshot_path())?;
    let lux = snap.lux_value()?;
    let sqm = snap.sqm_value()?;
    let nelm = snap.nelm_value()?;
    let offset = config.calibration_offset;
    let sqm_adj = sqm + offset;

    let mut log = OpenOptions::new().create(true).append(true).open(log_path)?;
    // The rating carries a comma, so it is the one quoted field
    writeln!(
        log,
        "{},{},{:.3},{:.3},{:.3},\"{}\",{}",
        Local::now().format(TIMESTAMP_FORMAT),
        lux,
        sqm,
        sqm_adj,
        nelm,
        snap.rating,
        offset
    )?;

    Ok(LogRecord {
        sqm_adj,
        rating: snap.rating,
    })
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::config::SensorType;
    use crate::metrics;
    use crate::snapshot::Snapshot;
    use crate::units::Illuminance;
    use std::path::Path;

    fn test_config(dir: &Path) -> Config {
        let mut cfg = Config {
            sensor_type: SensorType::Tsl2591,
            snapshot_file: Some(dir.join("allskylight.json")),
            ..Default::default()
        };
        cfg.calibration.log_file = dir.join("sqm_calibration_log.csv");
        cfg
    }

    fn write_valid_snapshot(cfg: &Config, lux: f64) {
        let illuminance = metrics::clamp(Illuminance::from_lux(lux));
        let m = metrics::derive(illuminance, cfg.offset());
        snapshot::write(cfg.snapshot_path(), &Snapshot::new(illuminance, &m)).unwrap();
    }

    fn zero_delay_opts(samples: u32) -> CalibrationOpts {
        CalibrationOpts {
            samples,
            delay: Duration::ZERO,
        }
    }

    #[test]
    fn header_is_written_exactly_once() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("log.csv");

        ensure_log_header(&path).unwrap();
        ensure_log_header(&path).unwrap();

        let content = fs::read_to_string(&path).unwrap();
        assert_eq!(content, format!("{LOG_HEADER}\n"));

        // An existing log with data rows is left untouched
        fs::write(&path, format!("{LOG_HEADER}\nrow\n")).unwrap();
        ensure_log_header(&path).unwrap();
        let content = fs::read_to_string(&path).unwrap();
        assert_eq!(content.lines().count(), 2);
    }

    #[test]
    fn failed_iterations_are_absorbed() {
        let dir = tempfile::tempdir().unwrap();
        let cfg = test_config(dir.path());

        let mut call = 0u32;
        let summary = run(&cfg, &zero_delay_opts(3), &Interruptor::new(), |c| {
            call += 1;
            if call == 2 {
                // A transient acquisition failure invalidates the snapshot
                snapshot::delete(c.snapshot_path()).unwrap();
                "Error reading tsl2591".to_owned()
            } else {
                write_valid_snapshot(c, 50.0);
                "ok".to_owned()
            }
        })
        .unwrap();

        assert_eq!(summary.samples_requested, 3);
        assert_eq!(summary.rows_written, 2);
        assert!(!summary.interrupted);

        let content = fs::read_to_string(&cfg.calibration.log_file).unwrap();
        let lines: Vec<&str> = content.lines().collect();
        assert_eq!(lines.len(), 3);
        assert_eq!(lines[0], LOG_HEADER);
        for line in &lines[1..] {
            assert!(line.contains(",50,"), "lux column in {line}");
            assert!(line.contains("\"Very bright"), "quoted rating in {line}");
        }
    }

    #[test]
    fn offset_is_applied_to_the_adjusted_column() {
        let dir = tempfile::tempdir().unwrap();
        let mut cfg = test_config(dir.path());
        cfg.calibration_offset = 0.5;

        let summary = run(&cfg, &zero_delay_opts(1), &Interruptor::new(), |c| {
            write_valid_snapshot(c, 108_000.0);
            "ok".to_owned()
        })
        .unwrap();
        assert_eq!(summary.rows_written, 1);

        let content = fs::read_to_string(&cfg.calibration.log_file).unwrap();
        let row = content.lines().nth(1).unwrap();
        // Snapshot sqm 0.50 (offset already applied), adjusted 1.000
        assert!(row.contains(",0.500,1.000,"), "row: {row}");
        assert!(row.ends_with(",0.5"), "row: {row}");
    }

    #[test]
    fn interrupt_stops_the_loop_early() {
        let dir = tempfile::tempdir().unwrap();
        let cfg = test_config(dir.path());

        let intr = Interruptor::new();
        intr.set();

        let mut calls = 0u32;
        let summary = run(&cfg, &zero_delay_opts(5), &intr, |c| {
            calls += 1;
            write_valid_snapshot(c, 50.0);
            "ok".to_owned()
        })
        .unwrap();

        assert_eq!(calls, 0);
        assert_eq!(summary.rows_written, 0);
        assert!(summary.interrupted);
        // The header still exists; the log is just empty of rows
        let content = fs::read_to_string(&cfg.calibration.log_file).unwrap();
        assert_eq!(content.lines().count(), 1);
    }
}
