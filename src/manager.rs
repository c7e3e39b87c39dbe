//! Opens and owns the devices named in the configuration.

use std::collections::BTreeMap;

use tracing::{info, warn};

use crate::config::{DeviceDefinition, KinesisConfig};
use crate::device::KCubeDcServo;
use crate::error::{KinesisError, Result};
use crate::library::Kinesis;

/// Sessions for every enabled device, keyed by serial number.
#[derive(Debug)]
pub struct DeviceManager {
    kinesis: Kinesis,
    devices: BTreeMap<String, KCubeDcServo>,
}

impl DeviceManager {
    /// An empty manager.
    pub fn new(kinesis: Kinesis) -> Self {
        Self {
            kinesis,
            devices: BTreeMap::new(),
        }
    }

    /// Build the device list, then open and configure every enabled device.
    ///
    /// Stops at the first device that fails to open or configure; devices
    /// opened before it are closed when the partial manager is dropped.
    pub fn from_config(kinesis: Kinesis, config: &KinesisConfig) -> Result<Self> {
        config.validate()?;
        kinesis.build_device_list()?;

        let mut manager = Self::new(kinesis);
        for definition in config.enabled_devices() {
            manager.open(definition)?;
        }
        info!(devices = manager.devices.len(), "Device manager ready");
        Ok(manager)
    }

    /// Open one device and apply its configured parameter dictionaries.
    ///
    /// Each dictionary is applied to a freshly read block which is then
    /// written back, so fields not named keep their device values.
    pub fn open(&mut self, definition: &DeviceDefinition) -> Result<&KCubeDcServo> {
        if self.devices.contains_key(&definition.serial) {
            return Err(KinesisError::Config {
                message: format!("device {} is already open", definition.serial),
            });
        }

        let device = self.kinesis.open(&definition.serial)?;
        for (kind, dict) in &definition.params {
            device.apply_block_dict(*kind, dict)?;
            info!(
                device = definition.label(),
                block = %kind,
                fields = dict.len(),
                "Applied configured parameters"
            );
        }

        let device: &KCubeDcServo = self
            .devices
            .entry(definition.serial.clone())
            .or_insert(device);
        Ok(device)
    }

    /// Session for `serial`, if open.
    pub fn get(&self, serial: &str) -> Option<&KCubeDcServo> {
        self.devices.get(serial)
    }

    /// Serial numbers of all open devices, sorted.
    pub fn serials(&self) -> Vec<&str> {
        self.devices.keys().map(String::as_str).collect()
    }

    /// Number of open devices.
    pub fn len(&self) -> usize {
        self.devices.len()
    }

    /// Whether no devices are open.
    pub fn is_empty(&self) -> bool {
        self.devices.is_empty()
    }

    /// Close every device, collecting the failures by serial.
    pub fn close_all(&mut self) -> Vec<(String, KinesisError)> {
        let mut failures = Vec::new();
        for (serial, device) in std::mem::take(&mut self.devices) {
            if let Err(e) = device.close() {
                warn!(serial = %serial, error = %e, "Failed to close device");
                failures.push((serial, e));
            }
        }
        failures
    }
}
