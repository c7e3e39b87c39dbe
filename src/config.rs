//! Configuration using Figment
//!
//! Configuration is loaded from:
//! 1. a TOML file (base configuration)
//! 2. environment variables prefixed with `KINESIS_`, with `__` separating
//!    nested keys (`KINESIS_LOGGING__LEVEL=debug`)
//!
//! ```toml
//! [library]
//! path = "C:/Program Files/Thorlabs/Kinesis/Thorlabs.MotionControl.KCube.DCServo.dll"
//!
//! [logging]
//! level = "info"
//! format = "pretty"
//!
//! [status_codes]
//! "37" = "Device not homed"
//!
//! [[devices]]
//! serial = "27000001"
//! name = "x-stage"
//!
//! [devices.homing]
//! velocity = 1000
//! ```
//!
//! Each `[devices.<block>]` table is a parameter dictionary for one
//! [`BlockKind`], applied when the device is opened by
//! [`crate::manager::DeviceManager`].

use std::collections::{BTreeMap, HashSet};
use std::path::{Path, PathBuf};

use figment::{
    providers::{Env, Format, Toml},
    Figment,
};
use kinesis_sys::KCubeDcServoLibrary;
use serde::{Deserialize, Serialize};

use crate::device::serial_cstring;
use crate::error::{KinesisError, Result};
use crate::logging::{parse_level, LoggingConfig};
use crate::params::{BlockKind, ParamDict};
use crate::status::StatusTable;

/// Default configuration file name.
pub const DEFAULT_CONFIG_FILE: &str = "kinesis.toml";

/// Prefix of environment overrides.
pub const ENV_PREFIX: &str = "KINESIS_";

/// Longest serial number the vendor's device records can hold.
const MAX_SERIAL_LEN: usize = 8;

/// Top-level configuration
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct KinesisConfig {
    /// Vendor library location
    #[serde(default)]
    pub library: LibraryConfig,
    /// Logging settings
    #[serde(default)]
    pub logging: LoggingConfig,
    /// Additional status code descriptions, layered over the built-in table
    #[serde(default)]
    pub status_codes: StatusTable,
    /// Device definitions
    #[serde(default)]
    pub devices: Vec<DeviceDefinition>,
}

/// `[library]` section
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct LibraryConfig {
    /// Path or file name of the DLL
    #[serde(default = "default_library_path")]
    pub path: PathBuf,
}

impl Default for LibraryConfig {
    fn default() -> Self {
        Self {
            path: default_library_path(),
        }
    }
}

/// One `[[devices]]` entry
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct DeviceDefinition {
    /// Controller serial number
    pub serial: String,
    /// Human-readable label
    #[serde(default)]
    pub name: Option<String>,
    /// Whether this device is opened at startup
    #[serde(default = "default_enabled")]
    pub enabled: bool,
    /// Parameter dictionaries to apply on open, by block
    #[serde(flatten)]
    pub params: BTreeMap<BlockKind, ParamDict>,
}

impl DeviceDefinition {
    /// A bare definition with no parameters.
    pub fn new(serial: impl Into<String>) -> Self {
        Self {
            serial: serial.into(),
            name: None,
            enabled: true,
            params: BTreeMap::new(),
        }
    }

    /// Label for log output: the name if set, else the serial.
    pub fn label(&self) -> &str {
        self.name.as_deref().unwrap_or(&self.serial)
    }
}

fn default_library_path() -> PathBuf {
    PathBuf::from(KCubeDcServoLibrary::DEFAULT_NAME)
}

fn default_enabled() -> bool {
    true
}

impl KinesisConfig {
    /// Load configuration from `kinesis.toml` and environment variables
    pub fn load() -> Result<Self> {
        Self::load_from(DEFAULT_CONFIG_FILE)
    }

    /// Load configuration from a specific file path. A missing file yields
    /// the defaults, still subject to environment overrides.
    pub fn load_from<P: AsRef<Path>>(path: P) -> Result<Self> {
        Ok(Self::figment(path.as_ref()).extract()?)
    }

    fn figment(path: &Path) -> Figment {
        Figment::new()
            .merge(Toml::file(path))
            .merge(Env::prefixed(ENV_PREFIX).split("__"))
    }

    /// Validate configuration after loading
    pub fn validate(&self) -> Result<()> {
        parse_level(&self.logging.level)?;

        if self.library.path.as_os_str().is_empty() {
            return Err(config_error("library.path must not be empty"));
        }

        let mut serials = HashSet::new();
        for device in &self.devices {
            serial_cstring(&device.serial)
                .map_err(|e| config_error(format!("device '{}': {}", device.label(), e)))?;
            if device.serial.len() > MAX_SERIAL_LEN {
                return Err(config_error(format!(
                    "serial '{}' is longer than {} characters",
                    device.serial, MAX_SERIAL_LEN
                )));
            }
            if !serials.insert(device.serial.as_str()) {
                return Err(config_error(format!("Duplicate device serial: {}", device.serial)));
            }
        }

        Ok(())
    }

    /// Get all enabled devices
    pub fn enabled_devices(&self) -> Vec<&DeviceDefinition> {
        self.devices.iter().filter(|d| d.enabled).collect()
    }

    /// Built-in status descriptions with the configured overrides applied.
    pub fn status_table(&self) -> StatusTable {
        let mut table = StatusTable::kinesis_defaults();
        table.merge(&self.status_codes);
        table
    }
}

fn config_error(message: impl Into<String>) -> KinesisError {
    KinesisError::Config {
        message: message.into(),
    }
}
