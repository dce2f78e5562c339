//! TSL2561 adapter: broadband and infrared photodiode pair.

use linux_embedded_hal::I2cdev;
use std::{path::PathBuf, thread, time::Duration};
use tracing::debug;
use tsl::tsl2561::{Gain, IntegrationTime, Tsl2561};

use super::{LightReading, LightSensor, SensorError};
use crate::units::Illuminance;

const CHIP: &str = "tsl2561";

/// Margin on top of the integration cycle before the data registers are
/// read.
const SETTLE: Duration = Duration::from_millis(20);

pub struct Tsl2561Sensor {
    bus: PathBuf,
    address: Option<u8>,
    gain: Gain,
    integration: IntegrationTime,
}

impl Tsl2561Sensor {
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

impl LightSensor for Tsl2561Sensor {
    fn chip(&self) -> &'static str {
        CHIP
    }

    fn acquire(&mut self) -> Result<LightReading, SensorError> {
        let i2c =
            I2cdev::new(&self.bus).map_err(|e| SensorError::acquisition(CHIP, e))?;
        let mut dev =
            Tsl2561::new(i2c, self.address).map_err(|e| SensorError::acquisition(CHIP, e))?;
        dev.set_timing(self.gain, self.integration)
            .map_err(|e| SensorError::acquisition(CHIP, e))?;
        dev.power_on()
            .map_err(|e| SensorError::acquisition(CHIP, e))?;

        thread::sleep(self.integration.duration() + SETTLE);

        let channels = dev.read_channels();
        let _ = dev.power_off();
        let (broadband, ir) = channels.map_err(|e| SensorError::acquisition(CHIP, e))?;

        // The chip reports a saturated sample as "no reading"; treat it
        // as zero illuminance and let the metric engine clamp it.
        let lux = dev.calculate_lux(broadband, ir).unwrap_or(0.0);
        debug!(broadband, ir, lux, "tsl2561 acquisition");

        Ok(LightReading {
            illuminance: Illuminance::from_lux(lux),
            infrared: Some(f64::from(ir)),
            visible: Some(f64::from(broadband)),
        })
    }
}
