//! Orchestration: select the adapter, acquire, derive metrics, persist
//! the snapshot, and hand a one-line summary back to the caller.
//!
//! Every failure mode folds into the summary string and invalidates the
//! snapshot; nothing here terminates the process, because the host
//! scheduler expects a best-effort result from every invocation.

use std::path::Path;
use tracing::{error, info};

use crate::{
    config::{Config, SensorType},
    metrics,
    sensor::{self, LightSensor},
    snapshot::{self, PersistenceError, Snapshot},
};

/// Run one acquisition-to-snapshot pass and return the human-readable
/// summary observed by the host.
pub fn run(config: &Config) -> String {
    if config.sensor_type == SensorType::None {
        invalidate_snapshot(config.snapshot_path());
        error!("No sensor defined");
        return "No sensor defined".to_owned();
    }

    match sensor::from_config(config) {
        Ok(mut sensor) => run_with_sensor(config, sensor.as_mut()),
        Err(e) => {
            invalidate_snapshot(config.snapshot_path());
            error!(sensor = %config.sensor_type, error = %e, "Failed to open sensor");
            format!("Error reading {}", config.sensor_type)
        }
    }
}

/// Pipeline body with the adapter supplied by the caller; lets tests
/// drive the full flow without hardware.
pub(crate) fn run_with_sensor(config: &Config, sensor: &mut dyn LightSensor) -> String {
    let reading = match sensor.acquire() {
        Ok(reading) => reading,
        Err(e) => {
            invalidate_snapshot(config.snapshot_path());
            error!(sensor = sensor.chip(), error = %e, "Failed to read sensor");
            return format!("Error reading {}", sensor.chip());
        }
    };

    let illuminance = metrics::clamp(reading.illuminance);
    let metrics = metrics::derive(illuminance, config.offset());
    let snapshot = Snapshot::new(illuminance, &metrics);

    if let Err(e) = snapshot::write(config.snapshot_path(), &snapshot) {
        // Degrade to "no data served" rather than leaving a stale record
        error!(error = %e, "Failed to write snapshot");
        invalidate_snapshot(config.snapshot_path());
    }

    info!(
        lux = illuminance.as_lux(),
        sqm = metrics.sqm.as_mags(),
        nelm = metrics.nelm.as_mags(),
        rating = %snapshot.rating,
        "Sky quality measured"
    );

    format!(
        "Lux {:.2}, NELM {:.2}, SQM {:.2} — {}",
        illuminance.as_lux(),
        metrics.nelm.as_mags(),
        metrics.sqm.as_mags(),
        snapshot.rating
    )
}

/// Teardown hook: never leave a stale snapshot behind for the overlay
/// once this module is disabled.
pub fn cleanup(config: &Config) -> Result<(), PersistenceError> {
    snapshot::delete(config.snapshot_path())
}

fn invalidate_snapshot(path: &Path) {
    if let Err(e) = snapshot::delete(path) {
        error!(snapshot = %path.display(), error = %e, "Failed to delete stale snapshot");
    }
}
