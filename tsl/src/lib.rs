//! Register-level drivers for the TSL family of ambient-light sensors.
//!
//! Both drivers are generic over a blocking [`embedded_hal::i2c::I2c`]
//! bus, so they run against the Linux character device on a host as well
//! as against a fake bus in tests. They expose the raw photodiode
//! channels plus the chip-specific counts-to-lux derivation; policy
//! decisions (what to do with a saturated or dark reading) are left to
//! the caller.

pub use crate::tsl2561::Tsl2561;
pub use crate::tsl2591::Tsl2591;

pub mod tsl2561;
pub mod tsl2591;

/// Error type shared by both drivers, generic over the bus error.
#[derive(Debug, PartialEq, thiserror::Error)]
pub enum Error<E> {
    #[error("i2c bus error: {0:?}")]
    Bus(E),

    /// The ID register did not identify a supported chip.
    #[error("unexpected chip id {0:#04x}")]
    UnexpectedChipId(u8),

    /// Channel data hit the ADC ceiling; the sample is unusable at the
    /// current gain/integration setting.
    #[error("channel data saturated at the current gain setting")]
    Saturated,
}
