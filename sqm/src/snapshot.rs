//! The overlay snapshot: a flat key-to-text json record consumed by the
//! external renderer.
//!
//! The file existing at all is the signal that the last acquisition
//! succeeded. Invalid readings are signalled by deleting it, never by
//! writing zeros or placeholders.

use serde::{Deserialize, Serialize};
use std::{fs, io, path::Path};

use crate::metrics::{self, SkyMetrics};
use crate::units::Illuminance;

#[derive(Debug, thiserror::Error)]
pub enum PersistenceError {
    #[error("snapshot i/o failed: {0}")]
    Io(#[from] io::Error),
    #[error("snapshot is malformed: {0}")]
    Malformed(#[from] serde_json::Error),
    #[error("snapshot field {field} is not a number: '{value}'")]
    BadNumber {
        field: &'static str,
        value: String,
    },
}

/// Snapshot record. The key names are fixed by the overlay renderer;
/// every value is pre-formatted text.
#[derive(Clone, PartialEq, Debug, Serialize, Deserialize)]
pub struct Snapshot {
    #[serde(rename = "AS_LIGHTLUX")]
    pub lux: String,
    #[serde(rename = "AS_LIGHTNELM")]
    pub nelm: String,
    #[serde(rename = "AS_LIGHTSQM")]
    pub sqm: String,
    #[serde(rename = "AS_LIGHTDESC")]
    pub rating: String,
    #[serde(rename = "AS_LIGHTCOLOR")]
    pub color: String,
}

impl Snapshot {
    pub fn new(illuminance: Illuminance, metrics: &SkyMetrics) -> Self {
        Snapshot {
            lux: format!("{:.2}", illuminance.as_lux()),
            nelm: format!("{:.2}", metrics.nelm.as_mags()),
            sqm: format!("{:.2}", metrics.sqm.as_mags()),
            rating: metrics::sanitize(metrics.bortle.rating),
            color: metrics.bortle.color.to_owned(),
        }
    }

    pub fn lux_value(&self) -> Result<f64, PersistenceError> {
        parse_field("AS_LIGHTLUX", &self.lux)
    }

    pub fn sqm_value(&self) -> Result<f64, PersistenceError> {
        parse_field("AS_LIGHTSQM", &self.sqm)
    }

    pub fn nelm_value(&self) -> Result<f64, PersistenceError> {
        parse_field("AS_LIGHTNELM", &self.nelm)
    }
}

fn parse_field(field: &'static str, value: &str) -> Result<f64, PersistenceError> {
    value.trim().parse().map_err(|_| PersistenceError::BadNumber {
        field,
        value: value.to_owned(),
    })
}

pub fn write(path: &Path, snapshot: &Snapshot) -> Result<(), PersistenceError> {
    let json = serde_json::to_string_pretty(snapshot)?;
    fs::write(path, json)?;
    Ok(())
}

pub fn read(path: &Path) -> Result<Snapshot, PersistenceError> {
    let content = fs::read_to_string(path)?;
    Ok(serde_json::from_str(&content)?)
}

/// Remove the snapshot. A snapshot that never existed is already in the
/// "no valid reading" state, so a missing file is not an error.
pub fn delete(path: &Path) -> Result<(), PersistenceError> {
    match fs::remove_file(path) {
        Ok(()) => Ok(()),
        Err(e) if e.kind() == io::ErrorKind::NotFound => Ok(()),
        Err(e) => Err(e.into()),
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::units::Magnitude;
    use approx::assert_relative_eq;

    fn sample_snapshot() -> Snapshot {
        let illuminance = Illuminance::from_lux(123.456);
        let metrics = metrics::derive(illuminance, Magnitude::from_mags(0.0));
        Snapshot::new(illuminance, &metrics)
    }

    #[test]
    fn round_trip_preserves_values() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("allskylight.json");

        let snapshot = sample_snapshot();
        write(&path, &snapshot).unwrap();
        let restored = read(&path).unwrap();

        assert_eq!(restored, snapshot);
        assert_relative_eq!(restored.lux_value().unwrap(), 123.46);
        assert_relative_eq!(
            restored.sqm_value().unwrap(),
            snapshot.sqm.parse::<f64>().unwrap()
        );
        assert_relative_eq!(
            restored.nelm_value().unwrap(),
            snapshot.nelm.parse::<f64>().unwrap()
        );
    }

    #[test]
    fn written_file_uses_overlay_keys() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("allskylight.json");
        write(&path, &sample_snapshot()).unwrap();

        let content = std::fs::read_to_string(&path).unwrap();
        for key in [
            "AS_LIGHTLUX",
            "AS_LIGHTNELM",
            "AS_LIGHTSQM",
            "AS_LIGHTDESC",
            "AS_LIGHTCOLOR",
        ] {
            assert!(content.contains(key), "missing {key}");
        }
    }

    #[test]
    fn delete_is_idempotent() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("allskylight.json");

        delete(&path).unwrap();

        write(&path, &sample_snapshot()).unwrap();
        delete(&path).unwrap();
        assert!(!path.exists());
        delete(&path).unwrap();
    }

    #[test]
    fn non_numeric_fields_are_typed_errors() {
        let mut snapshot = sample_snapshot();
        snapshot.sqm = "n/a".to_owned();
        assert!(matches!(
            snapshot.sqm_value(),
            Err(PersistenceError::BadNumber { field: "AS_LIGHTSQM", .. })
        ));
    }
}
