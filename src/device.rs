//! Session with a single K-Cube DC servo controller.
//!
//! [`KCubeDcServo`] binds a serial number to the loaded library and exposes
//! one safe method per vendor entry point. The vendor library keeps the actual
//! connection state, keyed by serial number; this type only remembers whether
//! it opened the device so it can close it on drop.
//!
//! Motion commands return as soon as the controller accepted them. Waiting for
//! a move to finish is up to the caller, typically by polling
//! [`KCubeDcServo::request_position`] and [`KCubeDcServo::position`].

use std::ffi::CString;
use std::os::raw::{c_char, c_short};

use kinesis_sys::{
    KCubeDcServoFns, KMOT_MMIParams, KMOT_TriggerConfig, KMOT_TriggerParams,
    MOT_DC_PIDParameters, MOT_HomingParameters, MOT_JogParameters, MOT_LimitSwitchParameters,
    MOT_TravelModes, MOT_VelocityParameters, TLI_HardwareInformation, UNIT_TYPE,
};
use serde::{Deserialize, Serialize};
use tracing::{debug, info, instrument, warn};

use crate::error::{KinesisError, Result};
use crate::library::{c_chars_to_string, check, check_bool, Kinesis};
use crate::params::{BlockKind, MotorParams, ParamBlock, ParamDict, TravelLimits, VelocityLimits};

/// How to stop a move in progress.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum StopMode {
    /// Decelerate along the configured velocity profile.
    Profiled,
    /// Cut the drive at once.
    Immediate,
}

/// Physical quantity for unit conversion.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum UnitType {
    /// Position, in millimetres or degrees.
    Distance,
    /// Velocity, per second.
    Velocity,
    /// Acceleration, per second squared.
    Acceleration,
}

impl UnitType {
    /// Raw selector passed to the DLL.
    pub fn raw(self) -> UNIT_TYPE {
        match self {
            Self::Distance => kinesis_sys::UNIT_DISTANCE,
            Self::Velocity => kinesis_sys::UNIT_VELOCITY,
            Self::Acceleration => kinesis_sys::UNIT_ACCELERATION,
        }
    }
}

/// Linear or rotational stage.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum TravelMode {
    /// Not configured.
    Undefined,
    /// Translation stage.
    Linear,
    /// Rotation stage.
    Rotational,
    /// A value this crate does not know, passed through unchanged.
    Other(i32),
}

impl TravelMode {
    /// Convert from the raw vendor value.
    pub fn from_raw(raw: MOT_TravelModes) -> Self {
        match raw {
            kinesis_sys::MOT_TravelModeUndefined => Self::Undefined,
            kinesis_sys::MOT_Linear => Self::Linear,
            kinesis_sys::MOT_Rotational => Self::Rotational,
            other => Self::Other(other),
        }
    }

    /// Raw vendor value.
    pub fn raw(self) -> MOT_TravelModes {
        match self {
            Self::Undefined => kinesis_sys::MOT_TravelModeUndefined,
            Self::Linear => kinesis_sys::MOT_Linear,
            Self::Rotational => kinesis_sys::MOT_Rotational,
            Self::Other(raw) => raw,
        }
    }
}

/// Firmware and hardware metadata.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct HardwareInfo {
    /// Serial number as an integer.
    pub serial_number: u32,
    /// Model name, e.g. `KDC101`.
    pub model_number: String,
    /// Vendor hardware type code.
    pub hardware_type: u16,
    /// Packed firmware version; see [`HardwareInfo::firmware_version_string`].
    pub firmware_version: u32,
    /// Free-text description.
    pub notes: String,
    /// Opaque device-specific bytes.
    pub device_dependant_data: Vec<u8>,
    /// Hardware revision.
    pub hardware_version: u16,
    /// Modification state.
    pub modification_state: u16,
    /// Number of channels.
    pub num_channels: i16,
}

impl From<&TLI_HardwareInformation> for HardwareInfo {
    fn from(raw: &TLI_HardwareInformation) -> Self {
        Self {
            serial_number: raw.serialNumber,
            model_number: c_chars_to_string(&raw.modelNumber),
            hardware_type: raw.r#type,
            firmware_version: raw.firmwareVersion,
            notes: c_chars_to_string(&raw.notes),
            device_dependant_data: raw.deviceDependantData.iter().map(|&b| b as u8).collect(),
            hardware_version: raw.hardwareVersion,
            modification_state: raw.modificationState,
            num_channels: raw.numChannels,
        }
    }
}

impl HardwareInfo {
    /// Firmware version as `major.minor.patch`, packed one byte each from bit 16 down.
    pub fn firmware_version_string(&self) -> String {
        let v = self.firmware_version;
        format!("{}.{}.{}", (v >> 16) & 0xFF, (v >> 8) & 0xFF, v & 0xFF)
    }
}

/// Validate a serial number and turn it into the NUL-terminated form the DLL expects.
pub(crate) fn serial_cstring(serial: &str) -> Result<CString> {
    if serial.is_empty() {
        return Err(KinesisError::InvalidSerial {
            serial: serial.to_string(),
            reason: "serial number is empty",
        });
    }
    CString::new(serial).map_err(|_| KinesisError::InvalidSerial {
        serial: serial.to_string(),
        reason: "serial number contains a NUL byte",
    })
}

type GetBlockFn<T> = unsafe extern "C" fn(*const c_char, *mut T) -> c_short;

/// An open K-Cube DC servo controller.
///
/// Closed automatically when dropped; use [`KCubeDcServo::close`] to observe
/// the close status.
pub struct KCubeDcServo {
    kinesis: Kinesis,
    serial: String,
    serial_c: CString,
    open: bool,
}

impl Kinesis {
    /// Open a session with the controller identified by `serial`.
    pub fn open(&self, serial: &str) -> Result<KCubeDcServo> {
        KCubeDcServo::open(*self, serial)
    }
}

impl KCubeDcServo {
    /// Open a connection to the controller identified by `serial`.
    ///
    /// The device list must have been built first
    /// ([`Kinesis::build_device_list`]); the DLL only opens devices it has
    /// enumerated.
    ///
    /// # Errors
    ///
    /// - [`KinesisError::InvalidSerial`] if `serial` cannot be passed to C
    /// - [`KinesisError::Vendor`] with the raw `CC_Open` status otherwise
    #[instrument(skip(kinesis))]
    pub fn open(kinesis: Kinesis, serial: &str) -> Result<Self> {
        let serial_c = serial_cstring(serial)?;
        // SAFETY: serial_c is NUL-terminated and outlives the call.
        let code = unsafe { (kinesis.fns().CC_Open)(serial_c.as_ptr()) };
        check("CC_Open", serial, code)?;
        info!(serial, "Opened KCube DC servo");
        Ok(Self {
            kinesis,
            serial: serial.to_string(),
            serial_c,
            open: true,
        })
    }

    /// Serial number of this device.
    pub fn serial(&self) -> &str {
        &self.serial
    }

    /// Close the connection, reporting the `CC_Close` status.
    pub fn close(mut self) -> Result<()> {
        self.close_inner()
    }

    fn close_inner(&mut self) -> Result<()> {
        if !self.open {
            return Ok(());
        }
        self.open = false;
        // SAFETY: serial_c is NUL-terminated and owned by self.
        let code = unsafe { (self.fns().CC_Close)(self.serial_ptr()) };
        check("CC_Close", &self.serial, code)?;
        info!(serial = %self.serial, "Closed KCube DC servo");
        Ok(())
    }

    fn fns(&self) -> &'static KCubeDcServoFns {
        self.kinesis.fns()
    }

    fn serial_ptr(&self) -> *const c_char {
        self.serial_c.as_ptr()
    }

    fn check(&self, function: &'static str, code: c_short) -> Result<()> {
        check(function, &self.serial, code)
    }

    /// Call a `(serial, *mut block)` getter on a fresh, zeroed block.
    fn get_block<T: Default>(&self, function: &'static str, f: GetBlockFn<T>) -> Result<T> {
        let mut block = T::default();
        // SAFETY: the serial is NUL-terminated; `block` is a live, writable T
        // whose layout matches the vendor structure the function fills.
        let code = unsafe { f(self.serial_ptr(), &mut block) };
        self.check(function, code)?;
        debug!(serial = %self.serial, function, "Read parameter block");
        Ok(block)
    }

    /// Call a `(serial, *mut block)` setter. The DLL takes a mutable pointer
    /// even for setters, so it gets a private copy.
    fn set_block<T: Copy>(&self, function: &'static str, f: GetBlockFn<T>, block: &T) -> Result<()> {
        let mut copy = *block;
        // SAFETY: as in get_block; `copy` lives across the call.
        let code = unsafe { f(self.serial_ptr(), &mut copy) };
        self.check(function, code)?;
        debug!(serial = %self.serial, function, "Wrote parameter block");
        Ok(())
    }

    // =========================================================================
    // Connection
    // =========================================================================

    /// Flash the front-panel display so the unit can be found on the bench.
    pub fn identify(&self) {
        debug!(serial = %self.serial, function = "CC_Identify", "Calling Kinesis");
        // SAFETY: serial is NUL-terminated.
        unsafe { (self.fns().CC_Identify)(self.serial_ptr()) }
    }

    /// Drop pending messages the DLL has queued for this device.
    pub fn clear_message_queue(&self) {
        debug!(serial = %self.serial, function = "CC_ClearMessageQueue", "Calling Kinesis");
        // SAFETY: serial is NUL-terminated.
        unsafe { (self.fns().CC_ClearMessageQueue)(self.serial_ptr()) }
    }

    // =========================================================================
    // Motion
    // =========================================================================

    /// Whether the stage supports homing.
    pub fn can_home(&self) -> bool {
        // SAFETY: serial is NUL-terminated.
        unsafe { (self.fns().CC_CanHome)(self.serial_ptr()) }
    }

    /// Start homing. Returns once the command is accepted.
    pub fn home(&self) -> Result<()> {
        // SAFETY: serial is NUL-terminated.
        let code = unsafe { (self.fns().CC_Home)(self.serial_ptr()) };
        self.check("CC_Home", code)?;
        info!(serial = %self.serial, "Homing started");
        Ok(())
    }

    /// Start a move to an absolute position in device units.
    pub fn move_to_position(&self, index: i32) -> Result<()> {
        // SAFETY: serial is NUL-terminated.
        let code = unsafe { (self.fns().CC_MoveToPosition)(self.serial_ptr(), index) };
        self.check("CC_MoveToPosition", code)?;
        info!(serial = %self.serial, target = index, "Move started");
        Ok(())
    }

    /// Start a move relative to the current position, in device units.
    pub fn move_relative(&self, displacement: i32) -> Result<()> {
        // SAFETY: serial is NUL-terminated.
        let code = unsafe { (self.fns().CC_MoveRelative)(self.serial_ptr(), displacement) };
        self.check("CC_MoveRelative", code)?;
        info!(serial = %self.serial, displacement, "Relative move started");
        Ok(())
    }

    /// Stop the current move.
    pub fn stop(&self, mode: StopMode) -> Result<()> {
        let (function, f) = match mode {
            StopMode::Profiled => ("CC_StopProfiled", self.fns().CC_StopProfiled),
            StopMode::Immediate => ("CC_StopImmediate", self.fns().CC_StopImmediate),
        };
        // SAFETY: serial is NUL-terminated.
        let code = unsafe { f(self.serial_ptr()) };
        self.check(function, code)?;
        info!(serial = %self.serial, ?mode, "Stop requested");
        Ok(())
    }

    /// Ask the controller to report its position. The answer is picked up by
    /// a later [`KCubeDcServo::position`].
    pub fn request_position(&self) -> Result<()> {
        // SAFETY: serial is NUL-terminated.
        let code = unsafe { (self.fns().CC_RequestPosition)(self.serial_ptr()) };
        self.check("CC_RequestPosition", code)
    }

    /// Last position reported by the controller, in device units.
    ///
    /// This is the returned value itself, not a status code.
    pub fn position(&self) -> i32 {
        // SAFETY: serial is NUL-terminated.
        unsafe { (self.fns().CC_GetPosition)(self.serial_ptr()) }
    }

    // =========================================================================
    // Velocity
    // =========================================================================

    /// `(acceleration, max_velocity)` in device units.
    pub fn vel_params(&self) -> Result<(i32, i32)> {
        let mut acceleration = 0;
        let mut max_velocity = 0;
        // SAFETY: serial is NUL-terminated; both out-pointers are live locals.
        let code = unsafe {
            (self.fns().CC_GetVelParams)(self.serial_ptr(), &mut acceleration, &mut max_velocity)
        };
        self.check("CC_GetVelParams", code)?;
        Ok((acceleration, max_velocity))
    }

    /// Set acceleration and maximum velocity in device units.
    pub fn set_vel_params(&self, acceleration: i32, max_velocity: i32) -> Result<()> {
        // SAFETY: serial is NUL-terminated.
        let code = unsafe {
            (self.fns().CC_SetVelParams)(self.serial_ptr(), acceleration, max_velocity)
        };
        self.check("CC_SetVelParams", code)
    }

    /// Velocity profile as a block (`CC_GetVelParamsBlock`).
    pub fn velocity_params(&self) -> Result<MOT_VelocityParameters> {
        self.get_block("CC_GetVelParamsBlock", self.fns().CC_GetVelParamsBlock)
    }

    /// Write the velocity profile block.
    pub fn set_velocity_params(&self, params: &MOT_VelocityParameters) -> Result<()> {
        self.set_block("CC_SetVelParamsBlock", self.fns().CC_SetVelParamsBlock, params)
    }

    // =========================================================================
    // Parameter blocks
    // =========================================================================

    /// Jog mode, step size and velocity profile.
    pub fn jog_params(&self) -> Result<MOT_JogParameters> {
        self.get_block("CC_GetJogParamsBlock", self.fns().CC_GetJogParamsBlock)
    }

    /// Write the jog block.
    pub fn set_jog_params(&self, params: &MOT_JogParameters) -> Result<()> {
        self.set_block("CC_SetJogParamsBlock", self.fns().CC_SetJogParamsBlock, params)
    }

    /// Homing direction, switch, velocity and offset.
    pub fn homing_params(&self) -> Result<MOT_HomingParameters> {
        self.get_block("CC_GetHomingParamsBlock", self.fns().CC_GetHomingParamsBlock)
    }

    /// Write the homing block.
    pub fn set_homing_params(&self, params: &MOT_HomingParameters) -> Result<()> {
        self.set_block("CC_SetHomingParamsBlock", self.fns().CC_SetHomingParamsBlock, params)
    }

    /// Hardware and software limit switch configuration.
    pub fn limit_switch_params(&self) -> Result<MOT_LimitSwitchParameters> {
        self.get_block(
            "CC_GetLimitSwitchParamsBlock",
            self.fns().CC_GetLimitSwitchParamsBlock,
        )
    }

    /// Write the limit switch block.
    pub fn set_limit_switch_params(&self, params: &MOT_LimitSwitchParameters) -> Result<()> {
        self.set_block(
            "CC_SetLimitSwitchParamsBlock",
            self.fns().CC_SetLimitSwitchParamsBlock,
            params,
        )
    }

    /// Servo loop gains.
    pub fn pid_params(&self) -> Result<MOT_DC_PIDParameters> {
        self.get_block("CC_GetDCPIDParams", self.fns().CC_GetDCPIDParams)
    }

    /// Write the servo loop gains.
    pub fn set_pid_params(&self, params: &MOT_DC_PIDParameters) -> Result<()> {
        self.set_block("CC_SetDCPIDParams", self.fns().CC_SetDCPIDParams, params)
    }

    /// Front-panel wheel and display settings.
    pub fn mmi_params(&self) -> Result<KMOT_MMIParams> {
        self.get_block("CC_GetMMIParamsBlock", self.fns().CC_GetMMIParamsBlock)
    }

    /// Write the front-panel settings.
    pub fn set_mmi_params(&self, params: &KMOT_MMIParams) -> Result<()> {
        self.set_block("CC_SetMMIParamsBlock", self.fns().CC_SetMMIParamsBlock, params)
    }

    /// Trigger port modes and polarities.
    pub fn trigger_config(&self) -> Result<KMOT_TriggerConfig> {
        self.get_block(
            "CC_GetTriggerConfigParamsBlock",
            self.fns().CC_GetTriggerConfigParamsBlock,
        )
    }

    /// Write the trigger port configuration.
    pub fn set_trigger_config(&self, params: &KMOT_TriggerConfig) -> Result<()> {
        self.set_block(
            "CC_SetTriggerConfigParamsBlock",
            self.fns().CC_SetTriggerConfigParamsBlock,
            params,
        )
    }

    /// Position-triggered output pulse train.
    pub fn trigger_params(&self) -> Result<KMOT_TriggerParams> {
        self.get_block(
            "CC_GetTriggerParamsParamsBlock",
            self.fns().CC_GetTriggerParamsParamsBlock,
        )
    }

    /// Write the output pulse train.
    pub fn set_trigger_params(&self, params: &KMOT_TriggerParams) -> Result<()> {
        self.set_block(
            "CC_SetTriggerParamsParamsBlock",
            self.fns().CC_SetTriggerParamsParamsBlock,
            params,
        )
    }

    /// Firmware and hardware metadata.
    pub fn hardware_info(&self) -> Result<HardwareInfo> {
        let raw: TLI_HardwareInformation =
            self.get_block("CC_GetHardwareInfoBlock", self.fns().CC_GetHardwareInfoBlock)?;
        Ok(HardwareInfo::from(&raw))
    }

    // =========================================================================
    // Stage description (real units)
    // =========================================================================

    /// Steps per revolution, gearbox ratio and pitch of the stage.
    pub fn motor_params(&self) -> Result<MotorParams> {
        let mut params = MotorParams::default();
        // SAFETY: serial is NUL-terminated; out-pointers are fields of a live local.
        let code = unsafe {
            (self.fns().CC_GetMotorParamsExt)(
                self.serial_ptr(),
                &mut params.steps_per_rev,
                &mut params.gearbox_ratio,
                &mut params.pitch,
            )
        };
        self.check("CC_GetMotorParamsExt", code)?;
        Ok(params)
    }

    /// Describe the stage drive.
    pub fn set_motor_params(&self, params: &MotorParams) -> Result<()> {
        // SAFETY: serial is NUL-terminated.
        let code = unsafe {
            (self.fns().CC_SetMotorParamsExt)(
                self.serial_ptr(),
                params.steps_per_rev,
                params.gearbox_ratio,
                params.pitch,
            )
        };
        self.check("CC_SetMotorParamsExt", code)
    }

    /// Stage velocity and acceleration limits in real units.
    pub fn motor_velocity_limits(&self) -> Result<VelocityLimits> {
        let mut limits = VelocityLimits::default();
        // SAFETY: serial is NUL-terminated; out-pointers are fields of a live local.
        let code = unsafe {
            (self.fns().CC_GetMotorVelocityLimits)(
                self.serial_ptr(),
                &mut limits.max_velocity,
                &mut limits.max_acceleration,
            )
        };
        self.check("CC_GetMotorVelocityLimits", code)?;
        Ok(limits)
    }

    /// Set the stage velocity and acceleration limits.
    pub fn set_motor_velocity_limits(&self, limits: &VelocityLimits) -> Result<()> {
        // SAFETY: serial is NUL-terminated.
        let code = unsafe {
            (self.fns().CC_SetMotorVelocityLimits)(
                self.serial_ptr(),
                limits.max_velocity,
                limits.max_acceleration,
            )
        };
        self.check("CC_SetMotorVelocityLimits", code)
    }

    /// Travel mode. Returned directly by the DLL rather than through a status code.
    pub fn travel_mode(&self) -> TravelMode {
        // SAFETY: serial is NUL-terminated.
        TravelMode::from_raw(unsafe { (self.fns().CC_GetMotorTravelMode)(self.serial_ptr()) })
    }

    /// Declare the stage linear or rotational.
    pub fn set_travel_mode(&self, mode: TravelMode) -> Result<()> {
        // SAFETY: serial is NUL-terminated.
        let code = unsafe { (self.fns().CC_SetMotorTravelMode)(self.serial_ptr(), mode.raw()) };
        self.check("CC_SetMotorTravelMode", code)
    }

    /// Travel range in real units.
    pub fn travel_limits(&self) -> Result<TravelLimits> {
        let mut limits = TravelLimits::default();
        // SAFETY: serial is NUL-terminated; out-pointers are fields of a live local.
        let code = unsafe {
            (self.fns().CC_GetMotorTravelLimits)(
                self.serial_ptr(),
                &mut limits.min_position,
                &mut limits.max_position,
            )
        };
        self.check("CC_GetMotorTravelLimits", code)?;
        Ok(limits)
    }

    /// Set the travel range.
    pub fn set_travel_limits(&self, limits: &TravelLimits) -> Result<()> {
        // SAFETY: serial is NUL-terminated.
        let code = unsafe {
            (self.fns().CC_SetMotorTravelLimits)(
                self.serial_ptr(),
                limits.min_position,
                limits.max_position,
            )
        };
        self.check("CC_SetMotorTravelLimits", code)
    }

    // =========================================================================
    // Unit conversion
    // =========================================================================

    /// Convert device units to real units. The conversion is done by the DLL
    /// from the stage description it holds for this device.
    pub fn real_value_from_device_unit(&self, device_unit: i32, unit: UnitType) -> Result<f64> {
        let mut real = 0.0;
        // SAFETY: serial is NUL-terminated; `real` is a live local.
        let code = unsafe {
            (self.fns().CC_GetRealValueFromDeviceUnit)(
                self.serial_ptr(),
                device_unit,
                &mut real,
                unit.raw(),
            )
        };
        self.check("CC_GetRealValueFromDeviceUnit", code)?;
        Ok(real)
    }

    /// Convert real units to device units, again inside the DLL.
    pub fn device_unit_from_real_value(&self, real: f64, unit: UnitType) -> Result<i32> {
        let mut device_unit = 0;
        // SAFETY: serial is NUL-terminated; `device_unit` is a live local.
        let code = unsafe {
            (self.fns().CC_GetDeviceUnitFromRealValue)(
                self.serial_ptr(),
                real,
                &mut device_unit,
                unit.raw(),
            )
        };
        self.check("CC_GetDeviceUnitFromRealValue", code)?;
        Ok(device_unit)
    }

    // =========================================================================
    // Settings persistence
    // =========================================================================

    /// Ask the controller to send its current settings to the DLL.
    pub fn request_settings(&self) -> Result<()> {
        // SAFETY: serial is NUL-terminated.
        let code = unsafe { (self.fns().CC_RequestSettings)(self.serial_ptr()) };
        self.check("CC_RequestSettings", code)
    }

    /// Restore the stage's factory parameters.
    pub fn reset_stage_to_defaults(&self) -> Result<()> {
        // SAFETY: serial is NUL-terminated.
        let code = unsafe { (self.fns().CC_ResetStageToDefaults)(self.serial_ptr()) };
        self.check("CC_ResetStageToDefaults", code)
    }

    /// Load the settings stored for this device by the Kinesis software.
    pub fn load_settings(&self) -> Result<()> {
        // SAFETY: serial is NUL-terminated.
        let accepted = unsafe { (self.fns().CC_LoadSettings)(self.serial_ptr()) };
        check_bool("CC_LoadSettings", &self.serial, accepted)
    }

    /// Write the current settings to the controller's non-volatile memory.
    pub fn persist_settings(&self) -> Result<()> {
        // SAFETY: serial is NUL-terminated.
        let accepted = unsafe { (self.fns().CC_PersistSettings)(self.serial_ptr()) };
        check_bool("CC_PersistSettings", &self.serial, accepted)?;
        info!(serial = %self.serial, "Settings persisted");
        Ok(())
    }

    // =========================================================================
    // Blocks by name
    // =========================================================================

    /// Read one parameter block as a dictionary.
    pub fn block_dict(&self, kind: BlockKind) -> Result<ParamDict> {
        Ok(match kind {
            BlockKind::Velocity => self.velocity_params()?.get_dict(),
            BlockKind::Jog => self.jog_params()?.get_dict(),
            BlockKind::Homing => self.homing_params()?.get_dict(),
            BlockKind::LimitSwitch => self.limit_switch_params()?.get_dict(),
            BlockKind::Pid => self.pid_params()?.get_dict(),
            BlockKind::Mmi => self.mmi_params()?.get_dict(),
            BlockKind::TriggerConfig => self.trigger_config()?.get_dict(),
            BlockKind::TriggerParams => self.trigger_params()?.get_dict(),
            BlockKind::Motor => self.motor_params()?.get_dict(),
            BlockKind::VelocityLimits => self.motor_velocity_limits()?.get_dict(),
            BlockKind::TravelLimits => self.travel_limits()?.get_dict(),
        })
    }

    /// Read a block, assign the fields named in `dict`, and write it back.
    ///
    /// Nothing is written if the dictionary does not apply cleanly.
    pub fn apply_block_dict(&self, kind: BlockKind, dict: &ParamDict) -> Result<()> {
        fn merged<T: ParamBlock>(mut block: T, dict: &ParamDict) -> Result<T> {
            block.load_dict(dict)?;
            Ok(block)
        }

        let written = match kind {
            BlockKind::Velocity => {
                self.set_velocity_params(&merged(self.velocity_params()?, dict)?)
            }
            BlockKind::Jog => self.set_jog_params(&merged(self.jog_params()?, dict)?),
            BlockKind::Homing => self.set_homing_params(&merged(self.homing_params()?, dict)?),
            BlockKind::LimitSwitch => {
                self.set_limit_switch_params(&merged(self.limit_switch_params()?, dict)?)
            }
            BlockKind::Pid => self.set_pid_params(&merged(self.pid_params()?, dict)?),
            BlockKind::Mmi => self.set_mmi_params(&merged(self.mmi_params()?, dict)?),
            BlockKind::TriggerConfig => {
                self.set_trigger_config(&merged(self.trigger_config()?, dict)?)
            }
            BlockKind::TriggerParams => {
                self.set_trigger_params(&merged(self.trigger_params()?, dict)?)
            }
            BlockKind::Motor => self.set_motor_params(&merged(self.motor_params()?, dict)?),
            BlockKind::VelocityLimits => {
                self.set_motor_velocity_limits(&merged(self.motor_velocity_limits()?, dict)?)
            }
            BlockKind::TravelLimits => {
                self.set_travel_limits(&merged(self.travel_limits()?, dict)?)
            }
        };
        written?;
        debug!(serial = %self.serial, block = %kind, fields = dict.len(), "Applied parameter dictionary");
        Ok(())
    }
}

impl Drop for KCubeDcServo {
    fn drop(&mut self) {
        if let Err(e) = self.close_inner() {
            warn!(serial = %self.serial, error = %e, "Error closing KCube DC servo");
        }
    }
}

impl std::fmt::Debug for KCubeDcServo {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("KCubeDcServo")
            .field("serial", &self.serial)
            .field("open", &self.open)
            .finish()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::mock::{self, MockDevice};
    use tracing_test::traced_test;

    fn open_mock(serial: &str) -> KCubeDcServo {
        mock::attach(serial, MockDevice::default());
        let kinesis = mock::kinesis();
        kinesis.build_device_list().unwrap();
        kinesis.open(serial).unwrap()
    }

    #[test]
    #[traced_test]
    fn test_calls_and_failures_are_logged() {
        let stage = open_mock("83200001");
        assert!(logs_contain("Opened KCube DC servo"));

        stage.move_to_position(100).unwrap();
        assert!(logs_contain("Move started"));
        assert!(logs_contain("CC_MoveToPosition"));

        mock::detach("83200001");
        let err = stage.home().unwrap_err();
        assert_eq!(err.vendor_code(), Some(2));
        assert!(logs_contain("Kinesis call returned an error status"));

        drop(stage);
        assert!(logs_contain("Error closing KCube DC servo"));
    }

    #[test]
    fn test_drop_closes_device() {
        let stage = open_mock("83200002");
        assert!(mock::snapshot("83200002").unwrap().is_open());
        drop(stage);
        assert!(!mock::snapshot("83200002").unwrap().is_open());
    }

    #[test]
    fn test_explicit_close_reports_status() {
        let stage = open_mock("83200003");
        assert!(stage.close().is_ok());
        assert!(!mock::snapshot("83200003").unwrap().is_open());
    }

    #[test]
    fn test_serial_validation() {
        assert!(serial_cstring("27000001").is_ok());
        assert!(matches!(
            serial_cstring(""),
            Err(KinesisError::InvalidSerial { .. })
        ));
        assert!(matches!(
            serial_cstring("2700\u{0}001"),
            Err(KinesisError::InvalidSerial { .. })
        ));
    }

    #[test]
    fn test_travel_mode_raw_round_trip() {
        for raw in [0, 1, 2, 7] {
            assert_eq!(TravelMode::from_raw(raw).raw(), raw);
        }
        assert_eq!(TravelMode::from_raw(7), TravelMode::Other(7));
    }

    #[test]
    fn test_unit_type_selectors() {
        assert_eq!(UnitType::Distance.raw(), 0);
        assert_eq!(UnitType::Velocity.raw(), 1);
        assert_eq!(UnitType::Acceleration.raw(), 2);
    }

    #[test]
    fn test_firmware_version_string() {
        let info = HardwareInfo {
            serial_number: 27000001,
            model_number: "KDC101".into(),
            hardware_type: 16,
            firmware_version: 0x0002_0A03,
            notes: String::new(),
            device_dependant_data: vec![0; 12],
            hardware_version: 1,
            modification_state: 0,
            num_channels: 1,
        };
        assert_eq!(info.firmware_version_string(), "2.10.3");
    }
}
