//! TSL2591 adapter: full-spectrum and infrared photodiode pair.

use linux_embedded_hal::I2cdev;
use std::{path::PathBuf, thread, time::Duration};
use tracing::debug;
use tsl::tsl2591::{Gain, IntegrationTime, Tsl2591};

use super::{LightReading, LightSensor, SensorError};
use crate::units::Illuminance;

const CHIP: &str = "tsl2591";

/// Margin on top of the integration cycle before the data registers are
/// read.
const SETTLE: Duration = Duration::from_millis(20);

pub struct Tsl2591Sensor {
    bus: PathBuf,
    address: Option<u8>,
    gain: Gain,
    integration: IntegrationTime,
}

impl Tsl2591Sensor {
    pub fn new(
        bus: PathBuf,
        address: Option<u8>,
        gain: Gain,
        integration: IntegrationTime,
    ) -> Self {
        Self {
            bus,
            address,
            gain,
            integration,
        }
    }
}

impl LightSensor for Tsl2591Sensor {
    fn chip(&self) -> &'static str {
        CHIP
    }

    fn acquire(&mut self) -> Result<LightReading, SensorError> {
        let i2c =
            I2cdev::new(&self.bus).map_err(|e| SensorError::acquisition(CHIP, e))?;
        let mut dev =
            Tsl2591::new(i2c, self.address).map_err(|e| SensorError::acquisition(CHIP, e))?;
        dev.set_timing(self.gain, self.integration)
            .map_err(|e| SensorError::acquisition(CHIP, e))?;
        dev.enable()
            .map_err(|e| SensorError::acquisition(CHIP, e))?;

        // The data registers hold a valid sample one full ALS cycle
        // after the ALS is enabled.
        thread::sleep(self.integration.duration() + SETTLE);

        let channels = dev.read_channels();
        let _ = dev.disable();
        let (full, ir) = channels.map_err(|e| SensorError::acquisition(CHIP, e))?;
        let lux = dev
            .calculate_lux(full, ir)
            .map_err(|e| SensorError::acquisition(CHIP, e))?;
        debug!(full, ir, lux, "tsl2591 acquisition");

        Ok(LightReading {
            illuminance: Illuminance::from_lux(lux),
            infrared: Some(f64::from(ir)),
            visible: Some(f64::from(full.saturating_sub(ir))),
        })
    }
}
