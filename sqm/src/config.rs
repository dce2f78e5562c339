//! Pipeline configuration, supplied by the host automation layer as a
//! kebab-case toml file.
//!
//! Gain and integration-time names resolve leniently: an unknown name
//! falls back to the variant's documented default instead of failing,
//! so a typo in the host configuration degrades to a sane acquisition
//! rather than a dead sensor.

use serde::Deserialize;
use std::{
    fmt, fs,
    path::{Path, PathBuf},
};
use tracing::info;

use crate::units::Magnitude;

const DEFAULT_I2C_BUS: &str = "/dev/i2c-1";
const DEFAULT_SNAPSHOT_FILE: &str = "allskylight.json";

#[derive(Debug, thiserror::Error)]
pub enum ConfigError {
    #[error("failed to read config file {path:?}: {source}")]
    Read {
        path: PathBuf,
        source: std::io::Error,
    },
    #[error("failed to parse config file: {0}")]
    Parse(#[from] toml::de::Error),
    #[error("invalid i2c address '{0}': expected hexadecimal text like 0x29")]
    InvalidAddress(String),
}

#[derive(Clone, PartialEq, Debug, Default, Deserialize)]
#[serde(default, rename_all = "kebab-case")]
pub struct Config {
    pub sensor_type: SensorType,
    pub i2c_bus: Option<PathBuf>,
    /// Optional bus-address override, hexadecimal text.
    pub i2c_address: Option<String>,
    /// Operator-tuned correction added to every SQM value. Set once at
    /// startup, immutable for the life of the process.
    pub calibration_offset: f64,
    pub snapshot_file: Option<PathBuf>,
    pub tsl2591: Tsl2591Settings,
    pub tsl2561: Tsl2561Settings,
    pub calibration: CalibrationSettings,
}

impl Config {
    pub fn load<P: AsRef<Path>>(path: P) -> Result<Self, ConfigError> {
        let path = path.as_ref();
        info!(config = %path.display(), "Loading configuration file");
        let content = fs::read_to_string(path).map_err(|source| ConfigError::Read {
            path: path.to_owned(),
            source,
        })?;
        Self::from_str_checked(&content)
    }

    pub fn from_str_checked(s: &str) -> Result<Self, ConfigError> {
        let cfg: Config = toml::from_str(s)?;
        // Surface malformed address text at load time instead of on the
        // first acquisition
        let _ = cfg.bus_address()?;
        Ok(cfg)
    }

    pub fn bus_path(&self) -> &Path {
        self.i2c_bus
            .as_deref()
            .unwrap_or_else(|| Path::new(DEFAULT_I2C_BUS))
    }

    pub fn snapshot_path(&self) -> &Path {
        self.snapshot_file
            .as_deref()
            .unwrap_or_else(|| Path::new(DEFAULT_SNAPSHOT_FILE))
    }

    /// The configured address override, if any. Empty text counts as
    /// "not configured", matching how the host leaves the field blank.
    pub fn bus_address(&self) -> Result<Option<u8>, ConfigError> {
        let text = match self.i2c_address.as_deref().map(str::trim) {
            None | Some("") => return Ok(None),
            Some(text) => text,
        };
        let digits = text
            .strip_prefix("0x")
            .or_else(|| text.strip_prefix("0X"))
            .unwrap_or(text);
        u8::from_str_radix(digits, 16)
            .map(Some)
            .map_err(|_| ConfigError::InvalidAddress(text.to_owned()))
    }

    pub fn offset(&self) -> Magnitude {
        Magnitude::from_mags(self.calibration_offset)
    }
}

#[derive(Copy, Clone, Eq, PartialEq, Ord, PartialOrd, Hash, Debug, Default, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum SensorType {
    #[default]
    None,
    Tsl2591,
    Tsl2561,
}

impl fmt::Display for SensorType {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let name = match self {
            SensorType::None => "none",
            SensorType::Tsl2591 => "tsl2591",
            SensorType::Tsl2561 => "tsl2561",
        };
        f.write_str(name)
    }
}

#[derive(Clone, PartialEq, Debug, Default, Deserialize)]
#[serde(default, rename_all = "kebab-case")]
pub struct Tsl2591Settings {
    pub gain: Option<String>,
    pub integration: Option<String>,
}

impl Tsl2591Settings {
    /// Named gain levels `1x`, `25x`, `428x`, `9876x`; anything else
    /// falls back to `25x`.
    pub fn gain(&self) -> tsl::tsl2591::Gain {
        use tsl::tsl2591::Gain;
        match self.gain.as_deref().map(str::trim) {
            Some("1x") => Gain::Low,
            Some("25x") => Gain::Med,
            Some("428x") => Gain::High,
            Some("9876x") => Gain::Max,
            _ => Gain::Med,
        }
    }

    /// Named durations `100ms` through `600ms`; anything else falls
    /// back to `100ms`.
    pub fn integration(&self) -> tsl::tsl2591::IntegrationTime {
        use tsl::tsl2591::IntegrationTime;
        match self.integration.as_deref().map(str::trim) {
            Some("100ms") => IntegrationTime::Ms100,
            Some("200ms") => IntegrationTime::Ms200,
            Some("300ms") => IntegrationTime::Ms300,
            Some("400ms") => IntegrationTime::Ms400,
            Some("500ms") => IntegrationTime::Ms500,
            Some("600ms") => IntegrationTime::Ms600,
            _ => IntegrationTime::Ms100,
        }
    }
}

#[derive(Clone, PartialEq, Debug, Default, Deserialize)]
#[serde(default, rename_all = "kebab-case")]
pub struct Tsl2561Settings {
    pub gain: Option<String>,
    pub integration: Option<String>,
}

impl Tsl2561Settings {
    /// Named gain levels `low` (1x) and `high` (16x), case-insensitive;
    /// anything else falls back to `low`.
    pub fn gain(&self) -> tsl::tsl2561::Gain {
        use tsl::tsl2561::Gain;
        match self.gain.as_deref().map(str::trim) {
            Some(name) if name.eq_ignore_ascii_case("high") => Gain::High,
            _ => Gain::Low,
        }
    }

    /// Named durations `13.7ms`, `101ms`, `402ms`; anything else falls
    /// back to `101ms`.
    pub fn integration(&self) -> tsl::tsl2561::IntegrationTime {
        use tsl::tsl2561::IntegrationTime;
        match self.integration.as_deref().map(str::trim) {
            Some("13.7ms") => IntegrationTime::Ms13_7,
            Some("101ms") => IntegrationTime::Ms101,
            Some("402ms") => IntegrationTime::Ms402,
            _ => IntegrationTime::Ms101,
        }
    }
}

#[derive(Clone, PartialEq, Debug, Deserialize)]
#[serde(default, rename_all = "kebab-case")]
pub struct CalibrationSettings {
    pub log_file: PathBuf,
    pub samples: u32,
    pub delay_secs: f64,
}

impl Default for CalibrationSettings {
    fn default() -> Self {
        Self {
            log_file: PathBuf::from("sqm_calibration_log.csv"),
            samples: 20,
            delay_secs: 60.0,
        }
    }
}
