//! TSL2561 light sensor.
//!
//! Channel 0 is broadband (visible + infrared), channel 1 is infrared
//! only. Lux follows the piecewise channel-ratio approximation from the
//! datasheet, after the channels are normalized to nominal integration
//! time and 16x gain.

use embedded_hal::i2c::I2c;
use tracing::debug;

use crate::Error;

/// Hardware default bus address (ADDR pin floating).
pub const DEFAULT_ADDRESS: u8 = 0x39;

const COMMAND_BIT: u8 = 0x80;
/// Set alongside the command bit for 16-bit channel reads.
const WORD_BIT: u8 = 0x20;

const REGISTER_CONTROL: u8 = 0x00;
const REGISTER_TIMING: u8 = 0x01;
const REGISTER_ID: u8 = 0x0A;
const REGISTER_CHAN0_LOW: u8 = 0x0C;
const REGISTER_CHAN1_LOW: u8 = 0x0E;

const CONTROL_POWERON: u8 = 0x03;
const CONTROL_POWEROFF: u8 = 0x00;

const CHANNEL_MAX: u16 = 0xFFFF;

/// Analog gain selector (timing-register bit 4).
#[derive(Copy, Clone, Eq, PartialEq, Ord, PartialOrd, Hash, Debug, Default)]
pub enum Gain {
    /// 1x
    #[default]
    Low,
    /// 16x
    High,
}

impl Gain {
    fn bits(self) -> u8 {
        match self {
            Gain::Low => 0x00,
            Gain::High => 0x10,
        }
    }

    pub fn factor(self) -> f64 {
        match self {
            Gain::Low => 1.0,
            Gain::High => 16.0,
        }
    }
}

/// Integration time selector (timing-register bits 1:0).
#[derive(Copy, Clone, Eq, PartialEq, Ord, PartialOrd, Hash, Debug, Default)]
pub enum IntegrationTime {
    Ms13_7,
    #[default]
    Ms101,
    Ms402,
}

impl IntegrationTime {
    fn bits(self) -> u8 {
        match self {
            IntegrationTime::Ms13_7 => 0x00,
            IntegrationTime::Ms101 => 0x01,
            IntegrationTime::Ms402 => 0x02,
        }
    }

    /// Channel scaling to the nominal 402 ms integration window.
    fn channel_scale(self) -> f64 {
        match self {
            IntegrationTime::Ms13_7 => 322.0 / 11.0,
            IntegrationTime::Ms101 => 322.0 / 81.0,
            IntegrationTime::Ms402 => 1.0,
        }
    }

    /// Wall-clock duration of one integration cycle.
    pub fn duration(self) -> core::time::Duration {
        match self {
            IntegrationTime::Ms13_7 => core::time::Duration::from_micros(13_700),
            IntegrationTime::Ms101 => core::time::Duration::from_millis(101),
            IntegrationTime::Ms402 => core::time::Duration::from_millis(402),
        }
    }
}

pub struct Tsl2561<I2C> {
    i2c: I2C,
    address: u8,
    gain: Gain,
    integration: IntegrationTime,
}

impl<I2C: I2c> Tsl2561<I2C> {
    /// Open the device and verify the part number in its ID register.
    /// Part numbers 0x1 (CS package) and 0x5 (T/FN/CL package) are both
    /// TSL2561 variants.
    pub fn new(i2c: I2C, address: Option<u8>) -> Result<Self, Error<I2C::Error>> {
        let mut dev = Self {
            i2c,
            address: address.unwrap_or(DEFAULT_ADDRESS),
            gain: Gain::default(),
            integration: IntegrationTime::default(),
        };
        let id = dev.read_register(REGISTER_ID)?;
        if !matches!(id >> 4, 0x1 | 0x5) {
            return Err(Error::UnexpectedChipId(id));
        }
        Ok(dev)
    }

    pub fn power_on(&mut self) -> Result<(), Error<I2C::Error>> {
        self.write_register(REGISTER_CONTROL, CONTROL_POWERON)
    }

    pub fn power_off(&mut self) -> Result<(), Error<I2C::Error>> {
        self.write_register(REGISTER_CONTROL, CONTROL_POWEROFF)
    }

    /// Program gain and integration time in one timing-register write.
    pub fn set_timing(
        &mut self,
        gain: Gain,
        integration: IntegrationTime,
    ) -> Result<(), Error<I2C::Error>> {
        self.write_register(REGISTER_TIMING, gain.bits() | integration.bits())?;
        self.gain = gain;
        self.integration = integration;
        Ok(())
    }

    /// Read the raw (broadband, infrared) channel pair.
    pub fn read_channels(&mut self) -> Result<(u16, u16), Error<I2C::Error>> {
        let ch0 = self.read_register_u16(REGISTER_CHAN0_LOW)?;
        let ch1 = self.read_register_u16(REGISTER_CHAN1_LOW)?;
        debug!(ch0, ch1, "tsl2561 raw channels");
        Ok((ch0, ch1))
    }

    /// Derive illuminance from a channel pair sampled with the current
    /// timing. Returns `None` when a channel is clipped at full scale;
    /// the chip cannot produce a usable number there and the caller
    /// decides what an absent reading means.
    pub fn calculate_lux(&self, ch0: u16, ch1: u16) -> Option<f64> {
        if ch0 == CHANNEL_MAX || ch1 == CHANNEL_MAX {
            return None;
        }

        let scale = self.integration.channel_scale() * (16.0 / self.gain.factor());
        let ch0s = f64::from(ch0) * scale;
        let ch1s = f64::from(ch1) * scale;
        if ch0s == 0.0 {
            return Some(0.0);
        }

        let ratio = ch1s / ch0s;
        let lux = if ratio <= 0.50 {
            0.0304 * ch0s - 0.062 * ch0s * ratio.powf(1.4)
        } else if ratio <= 0.61 {
            0.0224 * ch0s - 0.031 * ch1s
        } else if ratio <= 0.80 {
            0.0128 * ch0s - 0.0153 * ch1s
        } else if ratio <= 1.30 {
            0.00146 * ch0s - 0.00112 * ch1s
        } else {
            0.0
        };
        Some(lux)
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
            .write_read(self.address, &[COMMAND_BIT | WORD_BIT | register], &mut buf)
            .map_err(Error::Bus)?;
        Ok(u16::from_le_bytes(buf))
    }

    fn write_register(&mut self, register: u8, value: u8) -> Result<(), Error<I2C::Error>> {
        self.i2c
            .write(self.address, &[COMMAND_BIT | register, value])
            .map_err(Error::Bus)
    }
}
