//! Discovery of connected devices.
//!
//! The vendor library keeps an internal list of the devices it found on the
//! USB bus. [`Kinesis::build_device_list`] refreshes it; the listing calls
//! read it back as serial numbers.

use std::os::raw::{c_char, c_int, c_short};

use kinesis_sys::{TLI_DeviceInfo, DWORD, MOT_MotorTypes};
use serde::{Deserialize, Serialize};
use tracing::debug;

use crate::device::serial_cstring;
use crate::error::{KinesisError, Result};
use crate::library::{c_chars_to_string, check, Kinesis};

pub use kinesis_sys::KCUBE_DC_SERVO_TYPE_ID;

/// Bytes reserved per listed device: an eight digit serial number, the
/// separator, and headroom for longer serials.
const SERIAL_SLOT: usize = 16;

/// Motor family reported in [`DeviceInfo`].
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum MotorType {
    /// Not a motor controller.
    NotMotor,
    /// Brushed DC servo.
    DcMotor,
    /// Stepper motor.
    Stepper,
    /// Brushless DC motor.
    Brushless,
    /// Vendor custom motor.
    Custom,
    /// A value this crate does not know, passed through unchanged.
    Other(i32),
}

impl MotorType {
    /// Convert from the raw vendor value.
    pub fn from_raw(raw: MOT_MotorTypes) -> Self {
        match raw {
            kinesis_sys::MOT_NotMotor => Self::NotMotor,
            kinesis_sys::MOT_DCMotor => Self::DcMotor,
            kinesis_sys::MOT_StepperMotor => Self::Stepper,
            kinesis_sys::MOT_BrushlessMotor => Self::Brushless,
            kinesis_sys::MOT_CustomMotor => Self::Custom,
            other => Self::Other(other),
        }
    }
}

/// Owned snapshot of a `TLI_DeviceInfo` record.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct DeviceInfo {
    /// Device type identifier; 27 for a K-Cube DC servo.
    pub type_id: u32,
    /// Human-readable type description.
    pub description: String,
    /// Serial number.
    pub serial_no: String,
    /// USB product id.
    pub pid: u32,
    /// Whether the vendor library recognises the type.
    pub is_known_type: bool,
    /// Kind of motor driven.
    pub motor_type: MotorType,
    /// Piezo controller.
    pub is_piezo_device: bool,
    /// Laser source.
    pub is_laser: bool,
    /// Custom device type.
    pub is_custom_type: bool,
    /// Rack or hub unit.
    pub is_rack: bool,
    /// Channel count.
    pub max_channels: i16,
}

impl From<&TLI_DeviceInfo> for DeviceInfo {
    fn from(raw: &TLI_DeviceInfo) -> Self {
        Self {
            type_id: raw.typeID,
            description: c_chars_to_string(&raw.description),
            serial_no: c_chars_to_string(&raw.serialNo),
            pid: raw.PID,
            is_known_type: raw.isKnownType,
            motor_type: MotorType::from_raw(raw.motorType),
            is_piezo_device: raw.isPiezoDevice,
            is_laser: raw.isLaser,
            is_custom_type: raw.isCustomType,
            is_rack: raw.isRack,
            max_channels: raw.maxChannels,
        }
    }
}

/// Split a comma-separated serial list, dropping empty entries.
pub(crate) fn split_serials(raw: &str) -> Vec<String> {
    raw.split(',')
        .map(str::trim)
        .filter(|s| !s.is_empty())
        .map(str::to_string)
        .collect()
}

impl Kinesis {
    /// Rescan the USB bus and rebuild the vendor's device list.
    pub fn build_device_list(&self) -> Result<()> {
        // SAFETY: takes no arguments.
        let code = unsafe { (self.fns().TLI_BuildDeviceList)() };
        check("TLI_BuildDeviceList", "", code)?;
        debug!(devices = self.device_list_size(), "Device list built");
        Ok(())
    }

    /// Number of devices in the current list.
    pub fn device_list_size(&self) -> usize {
        // SAFETY: takes no arguments.
        let size = unsafe { (self.fns().TLI_GetDeviceListSize)() };
        usize::try_from(size).unwrap_or(0)
    }

    /// Serial numbers of every listed device.
    pub fn device_list(&self) -> Result<Vec<String>> {
        let f = self.fns().TLI_GetDeviceListExt;
        self.read_serial_list("TLI_GetDeviceListExt", |buf, len| {
            // SAFETY: `buf` is writable for `len` bytes.
            unsafe { f(buf, len) }
        })
    }

    /// Serial numbers of listed devices of one type, e.g. [`KCUBE_DC_SERVO_TYPE_ID`].
    pub fn device_list_by_type(&self, type_id: i32) -> Result<Vec<String>> {
        let f = self.fns().TLI_GetDeviceListByTypeExt;
        self.read_serial_list("TLI_GetDeviceListByTypeExt", |buf, len| {
            // SAFETY: `buf` is writable for `len` bytes.
            unsafe { f(buf, len, type_id) }
        })
    }

    /// Serial numbers of listed devices matching any of `type_ids`.
    pub fn device_list_by_types(&self, type_ids: &[i32]) -> Result<Vec<String>> {
        let count = c_int::try_from(type_ids.len()).map_err(|_| KinesisError::DeviceList {
            message: format!("{} type ids is too many to pass", type_ids.len()),
        })?;
        // The DLL takes a mutable pointer but only reads the ids.
        let mut ids = type_ids.to_vec();
        let f = self.fns().TLI_GetDeviceListByTypesExt;
        self.read_serial_list("TLI_GetDeviceListByTypesExt", |buf, len| {
            // SAFETY: `buf` is writable for `len` bytes; `ids` holds `count` ints.
            unsafe { f(buf, len, ids.as_mut_ptr(), count) }
        })
    }

    /// Connected K-Cube DC servos.
    pub fn kcube_dc_servos(&self) -> Result<Vec<String>> {
        self.device_list_by_type(KCUBE_DC_SERVO_TYPE_ID)
    }

    /// Description of one listed device.
    pub fn device_info(&self, serial: &str) -> Result<DeviceInfo> {
        let serial_c = serial_cstring(serial)?;
        let mut raw = TLI_DeviceInfo::default();
        // SAFETY: serial is NUL-terminated; `raw` is a live, writable TLI_DeviceInfo.
        let code = unsafe { (self.fns().TLI_GetDeviceInfo)(serial_c.as_ptr(), &mut raw) };
        check("TLI_GetDeviceInfo", serial, code)?;
        Ok(DeviceInfo::from(&raw))
    }

    fn read_serial_list(
        &self,
        function: &'static str,
        mut read: impl FnMut(*mut c_char, DWORD) -> c_short,
    ) -> Result<Vec<String>> {
        let slots = self.device_list_size().max(1);
        let mut buffer = vec![0 as c_char; slots * SERIAL_SLOT + 1];
        let len = DWORD::try_from(buffer.len()).map_err(|_| KinesisError::DeviceList {
            message: format!("{} devices listed, buffer too large", slots),
        })?;

        let code = read(buffer.as_mut_ptr(), len);
        check(function, "", code)?;

        let serials = split_serials(&c_chars_to_string(&buffer));
        debug!(function, count = serials.len(), "Listed devices");
        Ok(serials)
    }
}
