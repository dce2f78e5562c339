//! Sensor abstraction: one contract over both supported chips.
//!
//! Each acquisition is self-contained. The adapter reopens the bus,
//! programs the chip, waits out one integration cycle, reads the
//! channels, and releases the handle before returning, so nothing holds
//! the shared bus between the infrequent polls.

use std::fmt;

use crate::config::{Config, SensorType};
use crate::units::Illuminance;

mod tsl2561;
mod tsl2591;

pub use self::tsl2561::Tsl2561Sensor;
pub use self::tsl2591::Tsl2591Sensor;

/// Normalized output of a single acquisition.
#[derive(Copy, Clone, PartialEq, Debug)]
pub struct LightReading {
    pub illuminance: Illuminance,
    /// Raw infrared channel counts, kept for diagnostics.
    pub infrared: Option<f64>,
    /// Raw visible (TSL2591) or broadband (TSL2561) channel counts.
    pub visible: Option<f64>,
}

#[derive(Debug, thiserror::Error)]
pub enum SensorError {
    /// The configuration selects no sensor at all.
    #[error("no sensor defined")]
    NotConfigured,

    /// Bus, driver, or chip-level failure during an acquisition.
    #[error("{chip}: acquisition failed: {detail}")]
    AcquisitionFailed {
        chip: &'static str,
        detail: String,
    },
}

impl SensorError {
    pub(crate) fn acquisition(chip: &'static str, detail: impl fmt::Display) -> Self {
        SensorError::AcquisitionFailed {
            chip,
            detail: detail.to_string(),
        }
    }
}

pub trait LightSensor {
    fn acquire(&mut self) -> Result<LightReading, SensorError>;

    /// Lowercase chip name used in logs and error summaries.
    fn chip(&self) -> &'static str;
}

/// Build the adapter selected by the configuration.
pub fn from_config(config: &Config) -> Result<Box<dyn LightSensor>, SensorError> {
    match config.sensor_type {
        SensorType::None => Err(SensorError::NotConfigured),
        SensorType::Tsl2591 => {
            let address = config
                .bus_address()
                .map_err(|e| SensorError::acquisition("tsl2591", e))?;
            Ok(Box::new(Tsl2591Sensor::new(
                config.bus_path().to_owned(),
                address,
                config.tsl2591.gain(),
                config.tsl2591.integration(),
            )))
        }
        SensorType::Tsl2561 => {
            let address = config
                .bus_address()
                .map_err(|e| SensorError::acquisition("tsl2561", e))?;
            Ok(Box::new(Tsl2561Sensor::new(
                config.bus_path().to_owned(),
                address,
                config.tsl2561.gain(),
                config.tsl2561.integration(),
            )))
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn no_sensor_is_a_configuration_error() {
        let cfg = Config::default();
        assert!(matches!(
            from_config(&cfg),
            Err(SensorError::NotConfigured)
        ));
    }

    #[test]
    fn adapters_report_their_chip() {
        let mut cfg = Config::default();

        cfg.sensor_type = SensorType::Tsl2591;
        assert_eq!(from_config(&cfg).unwrap().chip(), "tsl2591");

        cfg.sensor_type = SensorType::Tsl2561;
        assert_eq!(from_config(&cfg).unwrap().chip(), "tsl2561");
    }
}
