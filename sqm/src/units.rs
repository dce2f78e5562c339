//! A lightweight uom-ish module for the photometric quantities the
//! pipeline passes around.
#![allow(dead_code)]

use std::ops::{Add, Sub};

#[derive(Copy, Clone, PartialEq, PartialOrd)]
pub struct Illuminance {
    lux: f64,
}

impl std::fmt::Debug for Illuminance {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "{} lx", self.lux)
    }
}

impl Illuminance {
    pub fn from_lux(lux: f64) -> Illuminance {
        Illuminance { lux }
    }

    pub fn as_lux(&self) -> f64 {
        self.lux
    }
}

/// Astronomical magnitude; used for both SQM (mag/arcsec²) and limiting
/// magnitude values.
#[derive(Copy, Clone, PartialEq, PartialOrd)]
pub struct Magnitude {
    mags: f64,
}

impl std::fmt::Debug for Magnitude {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "{} mag", self.mags)
    }
}

impl Magnitude {
    pub fn from_mags(mags: f64) -> Magnitude {
        Magnitude { mags }
    }

    pub fn as_mags(&self) -> f64 {
        self.mags
    }
}

impl Add<Magnitude> for Magnitude {
    type Output = Magnitude;

    fn add(self, rhs: Magnitude) -> Self::Output {
        Magnitude::from_mags(self.as_mags() + rhs.as_mags())
    }
}

impl Sub<Magnitude> for Magnitude {
    type Output = Magnitude;

    fn sub(self, rhs: Magnitude) -> Self::Output {
        Magnitude::from_mags(self.as_mags() - rhs.as_mags())
    }
}
