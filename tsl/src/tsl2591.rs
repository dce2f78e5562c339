//! TSL2591 high-dynamic-range light sensor.
//!
//! Two photodiodes: channel 0 sees the full spectrum, channel 1 sees
//! infrared only. Lux is derived from the channel difference scaled by
//! counts-per-lux for the active gain and integration time.

use embedded_hal::i2c::I2c;
use tracing::debug;

use crate::Error;

/// Hardware default bus address.
pub const DEFAULT_ADDRESS: u8 = 0x29;

/// Expected value of the ID register.
const CHIP_ID: u8 = 0x50;

/// Every register access goes through the command register with the
/// transaction-normal bits set.
const COMMAND_BIT: u8 = 0xA0;

const REGISTER_ENABLE: u8 = 0x00;
const REGISTER_CONTROL: u8 = 0x01;
const REGISTER_ID: u8 = 0x12;
const REGISTER_CHAN0_LOW: u8 = 0x14;
const REGISTER_CHAN1_LOW: u8 = 0x16;

const ENABLE_POWERON: u8 = 0x01;
const ENABLE_AEN: u8 = 0x02;
const ENABLE_POWEROFF: u8 = 0x00;

/// Device glass factor from the lux equation in the application notes.
const LUX_DF: f64 = 408.0;

const CHANNEL_MAX: u16 = 0xFFFF;

/// Analog gain selector (AGAIN field of the control register).
#[derive(Copy, Clone, Eq, PartialEq, Ord, PartialOrd, Hash, Debug, Default)]
pub enum Gain {
    /// 1x
    Low,
    /// 25x
    #[default]
    Med,
    /// 428x
    High,
    /// 9876x
    Max,
}

impl Gain {
    fn bits(self) -> u8 {
        match self {
            Gain::Low => 0x00,
            Gain::Med => 0x10,
            Gain::High => 0x20,
            Gain::Max => 0x30,
        }
    }

    pub fn factor(self) -> f64 {
        match self {
            Gain::Low => 1.0,
            Gain::Med => 25.0,
            Gain::High => 428.0,
            Gain::Max => 9876.0,
        }
    }
}

/// ALS integration time selector (ATIME field of the control register).
#[derive(Copy, Clone, Eq, PartialEq, Ord, PartialOrd, Hash, Debug, Default)]
pub enum IntegrationTime {
    #[default]
    Ms100,
    Ms200,
    Ms300,
    Ms400,
    Ms500,
    Ms600,
}

impl IntegrationTime {
    fn bits(self) -> u8 {
        match self {
            IntegrationTime::Ms100 => 0x00,
            IntegrationTime::Ms200 => 0x01,
            IntegrationTime::Ms300 => 0x02,
            IntegrationTime::Ms400 => 0x03,
            IntegrationTime::Ms500 => 0x04,
            IntegrationTime::Ms600 => 0x05,
        }
    }

    pub fn millis(self) -> f64 {
        match self {
            IntegrationTime::Ms100 => 100.0,
            IntegrationTime::Ms200 => 200.0,
            IntegrationTime::Ms300 => 300.0,
            IntegrationTime::Ms400 => 400.0,
            IntegrationTime::Ms500 => 500.0,
            IntegrationTime::Ms600 => 600.0,
        }
    }

    /// Wall-clock duration of one integration cycle.
    pub fn duration(self) -> core::time::Duration {
        core::time::Duration::from_millis(self.millis() as u64)
    }
}

pub struct Tsl2591<I2C> {
    i2c: I2C,
    address: u8,
    gain: Gain,
    integration: IntegrationTime,
}

impl<I2C: I2c> Tsl2591<I2C> {
    /// Open the device and verify its ID register.
    pub fn new(i2c: I2C, address: Option<u8>) -> Result<Self, Error<I2C::Error>> {
        let mut dev = Self {
            i2c,
            address: address.unwrap_or(DEFAULT_ADDRESS),
            gain: Gain::default(),
            integration: IntegrationTime::default(),
        };
        let id = dev.read_register(REGISTER_ID)?;
        if id != CHIP_ID {
            return Err(Error::UnexpectedChipId(id));
        }
        Ok(dev)
    }

    /// Program gain and integration time in one control-register write.
    pub fn set_timing(
        &mut self,
        gain: Gain,
        integration: IntegrationTime,
    ) -> Result<(), Error<I2C::Error>> {
        self.write_register(REGISTER_CONTROL, integration.bits() | gain.bits())?;
        self.gain = gain;
        self.integration = integration;
        Ok(())
    }

    /// Power the oscillator and the ALS. The first valid sample is
    /// available one integration cycle later.
    pub fn enable(&mut self) -> Result<(), Error<I2C::Error>> {
        self.write_register(REGISTER_ENABLE, ENABLE_POWERON | ENABLE_AEN)
    }

    pub fn disable(&mut self) -> Result<(), Error<I2C::Error>> {
        self.write_register(REGISTER_ENABLE, ENABLE_POWEROFF)
    }

    /// Read the raw (full spectrum, infrared) channel pair.
    pub fn read_channels(&mut self) -> Result<(u16, u16), Error<I2C::Error>> {
        let ch0 = self.read_register_u16(REGISTER_CHAN0_LOW)?;
        let ch1 = self.read_register_u16(REGISTER_CHAN1_LOW)?;
        debug!(ch0, ch1, "tsl2591 raw channels");
        Ok((ch0, ch1))
    }

    /// Derive illuminance from a channel pair sampled with the current
    /// timing. A full-scale channel means the sample is saturated; a
    /// zero full-spectrum channel reads as 0 lux.
    pub fn calculate_lux(&self, ch0: u16, ch1: u16) -> Result<f64, Error<I2C::Error>> {
        if ch0 == CHANNEL_MAX || ch1 == CHANNEL_MAX {
            return Err(Error::Saturated);
        }
        if ch0 == 0 {
            return Ok(0.0);
        }
        let counts_per_lux = (self.integration.millis() * self.gain.factor()) / LUX_DF;
        let full = f64::from(ch0);
        let ir = f64::from(ch1);
        Ok(((full - ir) * (1.0 - ir / full)) / counts_per_lux)
    }

    fn read_register(&mut self, register: u8) -> Result<u8, Error<I2C::Error>> {
        let mut buf = [0u8; 1];
        self.i2c
            .write_read(self.address, &[COMMAND_BIT | register], &mut buf)
            .map_err(Error::Bus)?;
        Ok(buf[0])
    }

    fn read_register_u16(&mut self, register: u8) -> Result<u16, Error<I2C::Error>> {
        let mut buf = [0u8; 2];
        self.i2c
            .write_read(self.address, &[COMMAND_BIT | register], &mut buf)
            .map_err(Error::Bus)?;
        Ok(u16::from_le_bytes(buf))
    }

    fn write_register(&mut self, register: u8, value: u8) -> Result<(), Error<I2C::Error>> {
        self.i2c
            .write(self.address, &[COMMAND_BIT | register, value])
            .map_err(Error::Bus)
    }
}
