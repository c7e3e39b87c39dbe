//! In-process stand-in for the vendor DLL.
//!
//! Every entry point of [`KCubeDcServoFns`] is implemented here as an
//! `extern "C"` function with the exact vendor signature, backed by a table of
//! simulated controllers keyed by serial number. The table is assembled into an
//! ordinary [`KCubeDcServoLibrary`], so everything above the function table
//! runs unchanged against it.
//!
//! Simulated behavior:
//! - a serial that was never [`attach`]ed, or is not in the device list,
//!   answers `2` (device not found)
//! - calls on a device that is not open answer `3` (device not opened)
//! - opening an open device answers `32` (already open)
//! - moves complete instantly; homing sets the position to zero
//! - unit conversion scales by [`MockDevice::counts_per_unit`]
//!
//! ```
//! use kinesis_motion::mock::{self, MockDevice};
//!
//! mock::attach("83000001", MockDevice::default());
//! let kinesis = mock::kinesis();
//! kinesis.build_device_list().unwrap();
//!
//! let stage = kinesis.open("83000001").unwrap();
//! stage.move_to_position(2048).unwrap();
//! assert_eq!(stage.position(), 2048);
//! ```

use std::collections::BTreeMap;
use std::ffi::CStr;
use std::os::raw::{c_char, c_double, c_int, c_short};

use kinesis_sys::{
    KCubeDcServoFns, KCubeDcServoLibrary, KMOT_MMIParams, KMOT_TriggerConfig, KMOT_TriggerParams,
    MOT_DC_PIDParameters, MOT_HomingParameters, MOT_JogParameters, MOT_LimitSwitchParameters,
    MOT_MotorTypes, MOT_StopModes, MOT_TravelModes, MOT_VelocityParameters, TLI_DeviceInfo,
    TLI_HardwareInformation, DWORD, UNIT_TYPE,
};
use once_cell::sync::Lazy;
use parking_lot::Mutex;

use crate::library::Kinesis;
use crate::params::{MotorParams, TravelLimits, VelocityLimits};

/// `FT_DeviceNotFound`
pub const DEVICE_NOT_FOUND: c_short = 2;
/// `FT_DeviceNotOpened`
pub const DEVICE_NOT_OPENED: c_short = 3;
/// `FT_InvalidParameter`
pub const INVALID_PARAMETER: c_short = 6;
/// `TL_ALREADY_OPEN`
pub const ALREADY_OPEN: c_short = 32;

/// State of one simulated controller.
#[derive(Debug, Clone)]
pub struct MockDevice {
    /// Reported by `TLI_GetDeviceInfo` and matched by the by-type listings.
    pub type_id: u32,
    /// Reported by `TLI_GetDeviceInfo`.
    pub description: String,
    /// Reported by `TLI_GetDeviceInfo`.
    pub motor_type: MOT_MotorTypes,
    /// Returned by `CC_GetHardwareInfoBlock`; the serial is filled on attach.
    pub hardware_info: TLI_HardwareInformation,
    /// Device units per real unit, used for every unit conversion.
    pub counts_per_unit: f64,
    /// Answer of `CC_CanHome`.
    pub can_home: bool,
    /// Current position in device units.
    pub position: i32,
    /// Set by `CC_Home`.
    pub homed: bool,
    /// Velocity profile, shared by `CC_Get/SetVelParams` and the block calls.
    pub velocity: MOT_VelocityParameters,
    /// Jog block.
    pub jog: MOT_JogParameters,
    /// Homing block.
    pub homing: MOT_HomingParameters,
    /// Limit switch block.
    pub limit_switch: MOT_LimitSwitchParameters,
    /// Servo loop gains.
    pub pid: MOT_DC_PIDParameters,
    /// Front-panel block.
    pub mmi: KMOT_MMIParams,
    /// Trigger port configuration.
    pub trigger_config: KMOT_TriggerConfig,
    /// Trigger pulse train.
    pub trigger_params: KMOT_TriggerParams,
    /// Stage drive description.
    pub motor: MotorParams,
    /// Stage velocity limits.
    pub velocity_limits: VelocityLimits,
    /// Raw travel mode.
    pub travel_mode: MOT_TravelModes,
    /// Stage travel range.
    pub travel_limits: TravelLimits,
    /// Times `CC_Identify` was called.
    pub identify_count: u32,
    /// Times `CC_PersistSettings` succeeded.
    pub persist_count: u32,
    /// Mode of the most recent stop command.
    pub last_stop: Option<MOT_StopModes>,
    open: bool,
}

impl MockDevice {
    /// A KDC101 driving a Z8-series actuator, with factory defaults.
    pub fn kdc101() -> Self {
        let mut hardware_info = TLI_HardwareInformation::default();
        fill_c_chars(&mut hardware_info.modelNumber, "KDC101");
        fill_c_chars(&mut hardware_info.notes, "Brushed DC Motor Controller");
        hardware_info.r#type = 16;
        hardware_info.firmwareVersion = 0x0002_0A03;
        hardware_info.hardwareVersion = 1;
        hardware_info.numChannels = 1;

        let velocity = MOT_VelocityParameters {
            minVelocity: 0,
            acceleration: 4506,
            maxVelocity: 772_981,
        };

        Self {
            type_id: kinesis_sys::KCUBE_DC_SERVO_TYPE_ID as u32,
            description: "KCube DC Servo".to_string(),
            motor_type: kinesis_sys::MOT_DCMotor,
            hardware_info,
            counts_per_unit: 34_304.0,
            can_home: true,
            position: 0,
            homed: false,
            velocity,
            jog: MOT_JogParameters {
                mode: kinesis_sys::MOT_SingleStep,
                stepSize: 34_304,
                velParams: velocity,
                stopMode: kinesis_sys::MOT_Profiled,
            },
            homing: MOT_HomingParameters {
                direction: kinesis_sys::MOT_Reverse,
                limitSwitch: kinesis_sys::MOT_ReverseLimitSwitch,
                velocity: 13_744,
                offsetDistance: 34_304,
            },
            limit_switch: MOT_LimitSwitchParameters {
                clockwiseHardwareLimit: kinesis_sys::MOT_LimitSwitchMakeOnContact,
                anticlockwiseHardwareLimit: kinesis_sys::MOT_LimitSwitchMakeOnContact,
                clockwisePosition: 0,
                anticlockwisePosition: 0,
                softLimitMode: kinesis_sys::MOT_LimitSwitchIgnored,
            },
            pid: MOT_DC_PIDParameters {
                proportionalGain: 435,
                integralGain: 195,
                differentialGain: 993,
                integralLimit: 195,
                parameterFilter: 15,
            },
            mmi: KMOT_MMIParams {
                JoystickMODE: 1,
                JoystickMaxVelocity: 772_981,
                JoystickAcceleration: 4506,
                JoystickDirectionSense: kinesis_sys::MOT_Normal,
                PresetPos1: 0,
                PresetPos2: 0,
                DisplayIntensity: 60,
                reserved: [0; 6],
            },
            trigger_config: KMOT_TriggerConfig::default(),
            trigger_params: KMOT_TriggerParams::default(),
            motor: MotorParams {
                steps_per_rev: 512.0,
                gearbox_ratio: 67.49,
                pitch: 1.0,
            },
            velocity_limits: VelocityLimits {
                max_velocity: 2.6,
                max_acceleration: 4.0,
            },
            travel_mode: kinesis_sys::MOT_Linear,
            travel_limits: TravelLimits {
                min_position: 0.0,
                max_position: 25.0,
            },
            identify_count: 0,
            persist_count: 0,
            last_stop: None,
            open: false,
        }
    }

    /// Whether a session currently has this device open.
    pub fn is_open(&self) -> bool {
        self.open
    }

    fn reset_to_defaults(&mut self) {
        let fresh = Self::kdc101();
        self.velocity = fresh.velocity;
        self.jog = fresh.jog;
        self.homing = fresh.homing;
        self.limit_switch = fresh.limit_switch;
        self.pid = fresh.pid;
        self.mmi = fresh.mmi;
        self.trigger_config = fresh.trigger_config;
        self.trigger_params = fresh.trigger_params;
    }
}

impl Default for MockDevice {
    fn default() -> Self {
        Self::kdc101()
    }
}

#[derive(Default)]
struct MockState {
    devices: BTreeMap<String, MockDevice>,
    listed: Vec<String>,
}

impl MockState {
    fn open(&mut self, serial: &str) -> Result<(), c_short> {
        if !self.listed.iter().any(|s| s == serial) {
            return Err(DEVICE_NOT_FOUND);
        }
        match self.devices.get_mut(serial) {
            None => Err(DEVICE_NOT_FOUND),
            Some(device) if device.open => Err(ALREADY_OPEN),
            Some(device) => {
                device.open = true;
                Ok(())
            }
        }
    }
}

static STATE: Lazy<Mutex<MockState>> = Lazy::new(|| Mutex::new(MockState::default()));

static LIBRARY: Lazy<KCubeDcServoLibrary> = Lazy::new(new_library);

/// Connect a simulated controller. It shows up after the next
/// `TLI_BuildDeviceList`. Replaces any device already attached under `serial`.
pub fn attach(serial: &str, mut device: MockDevice) {
    if let Ok(number) = serial.parse() {
        device.hardware_info.serialNumber = number;
    }
    device.open = false;
    STATE.lock().devices.insert(serial.to_string(), device);
}

/// Disconnect a simulated controller. Returns its final state.
pub fn detach(serial: &str) -> Option<MockDevice> {
    let mut state = STATE.lock();
    state.listed.retain(|s| s != serial);
    state.devices.remove(serial)
}

/// Current state of a simulated controller.
pub fn snapshot(serial: &str) -> Option<MockDevice> {
    STATE.lock().devices.get(serial).cloned()
}

/// A fresh library over the stub entry points, for [`crate::library::install`].
pub fn new_library() -> KCubeDcServoLibrary {
    KCubeDcServoLibrary::from_fns(fns())
}

/// The stub library, shared for the whole process.
pub fn library() -> &'static KCubeDcServoLibrary {
    &LIBRARY
}

/// A handle on the stub library that bypasses the process-wide slot.
pub fn kinesis() -> Kinesis {
    Kinesis::from_library(library())
}

/// The stub entry point table.
pub fn fns() -> KCubeDcServoFns {
    KCubeDcServoFns {
        TLI_BuildDeviceList: build_device_list,
        TLI_GetDeviceListSize: get_device_list_size,
        TLI_GetDeviceListExt: get_device_list_ext,
        TLI_GetDeviceListByTypeExt: get_device_list_by_type_ext,
        TLI_GetDeviceListByTypesExt: get_device_list_by_types_ext,
        TLI_GetDeviceInfo: get_device_info,
        CC_Open: open,
        CC_Close: close,
        CC_Identify: identify,
        CC_ClearMessageQueue: clear_message_queue,
        CC_CanHome: can_home,
        CC_Home: home,
        CC_MoveToPosition: move_to_position,
        CC_MoveRelative: move_relative,
        CC_StopProfiled: stop_profiled,
        CC_StopImmediate: stop_immediate,
        CC_RequestPosition: request_position,
        CC_GetPosition: get_position,
        CC_GetVelParams: get_vel_params,
        CC_SetVelParams: set_vel_params,
        CC_GetVelParamsBlock: get_vel_params_block,
        CC_SetVelParamsBlock: set_vel_params_block,
        CC_GetJogParamsBlock: get_jog_params_block,
        CC_SetJogParamsBlock: set_jog_params_block,
        CC_GetHomingParamsBlock: get_homing_params_block,
        CC_SetHomingParamsBlock: set_homing_params_block,
        CC_GetLimitSwitchParamsBlock: get_limit_switch_params_block,
        CC_SetLimitSwitchParamsBlock: set_limit_switch_params_block,
        CC_GetDCPIDParams: get_dc_pid_params,
        CC_SetDCPIDParams: set_dc_pid_params,
        CC_GetMMIParamsBlock: get_mmi_params_block,
        CC_SetMMIParamsBlock: set_mmi_params_block,
        CC_GetTriggerConfigParamsBlock: get_trigger_config_params_block,
        CC_SetTriggerConfigParamsBlock: set_trigger_config_params_block,
        CC_GetTriggerParamsParamsBlock: get_trigger_params_params_block,
        CC_SetTriggerParamsParamsBlock: set_trigger_params_params_block,
        CC_GetHardwareInfoBlock: get_hardware_info_block,
        CC_GetMotorParamsExt: get_motor_params_ext,
        CC_SetMotorParamsExt: set_motor_params_ext,
        CC_GetMotorVelocityLimits: get_motor_velocity_limits,
        CC_SetMotorVelocityLimits: set_motor_velocity_limits,
        CC_GetMotorTravelMode: get_motor_travel_mode,
        CC_SetMotorTravelMode: set_motor_travel_mode,
        CC_GetMotorTravelLimits: get_motor_travel_limits,
        CC_SetMotorTravelLimits: set_motor_travel_limits,
        CC_GetRealValueFromDeviceUnit: get_real_value_from_device_unit,
        CC_GetDeviceUnitFromRealValue: get_device_unit_from_real_value,
        CC_RequestSettings: request_settings,
        CC_ResetStageToDefaults: reset_stage_to_defaults,
        CC_LoadSettings: load_settings,
        CC_PersistSettings: persist_settings,
    }
}

// =============================================================================
// Helpers
// =============================================================================

fn fill_c_chars(dst: &mut [c_char], src: &str) {
    dst.fill(0);
    let room = dst.len().saturating_sub(1);
    for (slot, byte) in dst.iter_mut().zip(src.bytes().take(room)) {
        *slot = byte as c_char;
    }
}

unsafe fn serial_of(serial: *const c_char) -> Option<String> {
    if serial.is_null() {
        return None;
    }
    Some(CStr::from_ptr(serial).to_string_lossy().into_owned())
}

fn status(result: Result<(), c_short>) -> c_short {
    match result {
        Ok(()) => 0,
        Err(code) => code,
    }
}

/// Run `f` on a listed device that is open.
unsafe fn with_open<R>(
    serial: *const c_char,
    f: impl FnOnce(&mut MockDevice) -> R,
) -> Result<R, c_short> {
    let serial = serial_of(serial).ok_or(INVALID_PARAMETER)?;
    let mut state = STATE.lock();
    if !state.listed.contains(&serial) {
        return Err(DEVICE_NOT_FOUND);
    }
    let device = state.devices.get_mut(&serial).ok_or(DEVICE_NOT_FOUND)?;
    if !device.open {
        return Err(DEVICE_NOT_OPENED);
    }
    Ok(f(device))
}

/// Copy matching listed serials into `buffer` as a comma-separated list.
unsafe fn write_serials(
    buffer: *mut c_char,
    size: DWORD,
    matches: impl Fn(&MockDevice) -> bool,
) -> c_short {
    if buffer.is_null() {
        return INVALID_PARAMETER;
    }
    let state = STATE.lock();
    let mut list = String::new();
    for serial in &state.listed {
        if state.devices.get(serial).is_some_and(&matches) {
            list.push_str(serial);
            list.push(',');
        }
    }
    let bytes = list.as_bytes();
    if bytes.len() + 1 > size as usize {
        return INVALID_PARAMETER;
    }
    let out = std::slice::from_raw_parts_mut(buffer, size as usize);
    for (slot, byte) in out.iter_mut().zip(bytes) {
        *slot = *byte as c_char;
    }
    out[bytes.len()] = 0;
    0
}

// =============================================================================
// Device list
// =============================================================================

unsafe extern "C" fn build_device_list() -> c_short {
    let mut state = STATE.lock();
    state.listed = state.devices.keys().cloned().collect();
    0
}

unsafe extern "C" fn get_device_list_size() -> c_short {
    c_short::try_from(STATE.lock().listed.len()).unwrap_or(c_short::MAX)
}

unsafe extern "C" fn get_device_list_ext(buffer: *mut c_char, size: DWORD) -> c_short {
    write_serials(buffer, size, |_| true)
}

unsafe extern "C" fn get_device_list_by_type_ext(
    buffer: *mut c_char,
    size: DWORD,
    type_id: c_int,
) -> c_short {
    write_serials(buffer, size, |d| i64::from(d.type_id) == i64::from(type_id))
}

unsafe extern "C" fn get_device_list_by_types_ext(
    buffer: *mut c_char,
    size: DWORD,
    type_ids: *mut c_int,
    length: c_int,
) -> c_short {
    let ids: Vec<i64> = match usize::try_from(length) {
        Ok(0) => Vec::new(),
        Ok(len) if !type_ids.is_null() => std::slice::from_raw_parts(type_ids, len)
            .iter()
            .map(|&id| i64::from(id))
            .collect(),
        _ => return INVALID_PARAMETER,
    };
    write_serials(buffer, size, |d| ids.contains(&i64::from(d.type_id)))
}

unsafe extern "C" fn get_device_info(serial: *const c_char, info: *mut TLI_DeviceInfo) -> c_short {
    let Some(serial) = serial_of(serial) else {
        return INVALID_PARAMETER;
    };
    if info.is_null() {
        return INVALID_PARAMETER;
    }
    let state = STATE.lock();
    let Some(device) = state.devices.get(&serial) else {
        return DEVICE_NOT_FOUND;
    };

    let mut raw = TLI_DeviceInfo::default();
    raw.typeID = device.type_id;
    fill_c_chars(&mut raw.description, &device.description);
    fill_c_chars(&mut raw.serialNo, &serial);
    raw.PID = 0xFAF0;
    raw.isKnownType = true;
    raw.motorType = device.motor_type;
    raw.maxChannels = 1;
    *info = raw;
    0
}

// =============================================================================
// Connection
// =============================================================================

unsafe extern "C" fn open(serial: *const c_char) -> c_short {
    let Some(serial) = serial_of(serial) else {
        return INVALID_PARAMETER;
    };
    status(STATE.lock().open(&serial))
}

unsafe extern "C" fn close(serial: *const c_char) -> c_short {
    status(with_open(serial, |d| d.open = false))
}

unsafe extern "C" fn identify(serial: *const c_char) {
    let _ = with_open(serial, |d| d.identify_count += 1);
}

unsafe extern "C" fn clear_message_queue(serial: *const c_char) {
    let _ = with_open(serial, |_| ());
}

// =============================================================================
// Motion
// =============================================================================

unsafe extern "C" fn can_home(serial: *const c_char) -> bool {
    with_open(serial, |d| d.can_home).unwrap_or(false)
}

unsafe extern "C" fn home(serial: *const c_char) -> c_short {
    status(with_open(serial, |d| {
        d.position = 0;
        d.homed = true;
    }))
}

unsafe extern "C" fn move_to_position(serial: *const c_char, index: c_int) -> c_short {
    status(with_open(serial, |d| d.position = index))
}

unsafe extern "C" fn move_relative(serial: *const c_char, displacement: c_int) -> c_short {
    status(with_open(serial, |d| {
        d.position = d.position.saturating_add(displacement);
    }))
}

unsafe extern "C" fn stop_profiled(serial: *const c_char) -> c_short {
    status(with_open(serial, |d| d.last_stop = Some(kinesis_sys::MOT_Profiled)))
}

unsafe extern "C" fn stop_immediate(serial: *const c_char) -> c_short {
    status(with_open(serial, |d| d.last_stop = Some(kinesis_sys::MOT_Immediate)))
}

unsafe extern "C" fn request_position(serial: *const c_char) -> c_short {
    status(with_open(serial, |_| ()))
}

unsafe extern "C" fn get_position(serial: *const c_char) -> c_int {
    with_open(serial, |d| d.position).unwrap_or(0)
}

// =============================================================================
// Parameters
// =============================================================================

unsafe extern "C" fn get_vel_params(
    serial: *const c_char,
    acceleration: *mut c_int,
    max_velocity: *mut c_int,
) -> c_short {
    if acceleration.is_null() || max_velocity.is_null() {
        return INVALID_PARAMETER;
    }
    match with_open(serial, |d| d.velocity) {
        Ok(velocity) => {
            *acceleration = velocity.acceleration;
            *max_velocity = velocity.maxVelocity;
            0
        }
        Err(code) => code,
    }
}

unsafe extern "C" fn set_vel_params(
    serial: *const c_char,
    acceleration: c_int,
    max_velocity: c_int,
) -> c_short {
    status(with_open(serial, |d| {
        d.velocity.acceleration = acceleration;
        d.velocity.maxVelocity = max_velocity;
    }))
}

macro_rules! block_stubs {
    ($($get:ident, $set:ident: $ty:ty => $field:ident;)*) => {
        $(
            unsafe extern "C" fn $get(serial: *const c_char, params: *mut $ty) -> c_short {
                if params.is_null() {
                    return INVALID_PARAMETER;
                }
                match with_open(serial, |d| d.$field) {
                    Ok(block) => {
                        *params = block;
                        0
                    }
                    Err(code) => code,
                }
            }

            unsafe extern "C" fn $set(serial: *const c_char, params: *mut $ty) -> c_short {
                if params.is_null() {
                    return INVALID_PARAMETER;
                }
                let block = *params;
                status(with_open(serial, |d| d.$field = block))
            }
        )*
    };
}

block_stubs! {
    get_vel_params_block, set_vel_params_block: MOT_VelocityParameters => velocity;
    get_jog_params_block, set_jog_params_block: MOT_JogParameters => jog;
    get_homing_params_block, set_homing_params_block: MOT_HomingParameters => homing;
    get_limit_switch_params_block, set_limit_switch_params_block: MOT_LimitSwitchParameters => limit_switch;
    get_dc_pid_params, set_dc_pid_params: MOT_DC_PIDParameters => pid;
    get_mmi_params_block, set_mmi_params_block: KMOT_MMIParams => mmi;
    get_trigger_config_params_block, set_trigger_config_params_block: KMOT_TriggerConfig => trigger_config;
    get_trigger_params_params_block, set_trigger_params_params_block: KMOT_TriggerParams => trigger_params;
}

unsafe extern "C" fn get_hardware_info_block(
    serial: *const c_char,
    info: *mut TLI_HardwareInformation,
) -> c_short {
    if info.is_null() {
        return INVALID_PARAMETER;
    }
    match with_open(serial, |d| d.hardware_info) {
        Ok(hardware_info) => {
            *info = hardware_info;
            0
        }
        Err(code) => code,
    }
}

// =============================================================================
// Stage description
// =============================================================================

unsafe extern "C" fn get_motor_params_ext(
    serial: *const c_char,
    steps_per_rev: *mut c_double,
    gear_box_ratio: *mut c_double,
    pitch: *mut c_double,
) -> c_short {
    if steps_per_rev.is_null() || gear_box_ratio.is_null() || pitch.is_null() {
        return INVALID_PARAMETER;
    }
    match with_open(serial, |d| d.motor) {
        Ok(motor) => {
            *steps_per_rev = motor.steps_per_rev;
            *gear_box_ratio = motor.gearbox_ratio;
            *pitch = motor.pitch;
            0
        }
        Err(code) => code,
    }
}

unsafe extern "C" fn set_motor_params_ext(
    serial: *const c_char,
    steps_per_rev: c_double,
    gear_box_ratio: c_double,
    pitch: c_double,
) -> c_short {
    status(with_open(serial, |d| {
        d.motor = MotorParams {
            steps_per_rev,
            gearbox_ratio: gear_box_ratio,
            pitch,
        };
    }))
}

unsafe extern "C" fn get_motor_velocity_limits(
    serial: *const c_char,
    max_velocity: *mut c_double,
    max_acceleration: *mut c_double,
) -> c_short {
    if max_velocity.is_null() || max_acceleration.is_null() {
        return INVALID_PARAMETER;
    }
    match with_open(serial, |d| d.velocity_limits) {
        Ok(limits) => {
            *max_velocity = limits.max_velocity;
            *max_acceleration = limits.max_acceleration;
            0
        }
        Err(code) => code,
    }
}

unsafe extern "C" fn set_motor_velocity_limits(
    serial: *const c_char,
    max_velocity: c_double,
    max_acceleration: c_double,
) -> c_short {
    status(with_open(serial, |d| {
        d.velocity_limits = VelocityLimits {
            max_velocity,
            max_acceleration,
        };
    }))
}

unsafe extern "C" fn get_motor_travel_mode(serial: *const c_char) -> MOT_TravelModes {
    with_open(serial, |d| d.travel_mode).unwrap_or(kinesis_sys::MOT_TravelModeUndefined)
}

unsafe extern "C" fn set_motor_travel_mode(
    serial: *const c_char,
    travel_mode: MOT_TravelModes,
) -> c_short {
    status(with_open(serial, |d| d.travel_mode = travel_mode))
}

unsafe extern "C" fn get_motor_travel_limits(
    serial: *const c_char,
    min_position: *mut c_double,
    max_position: *mut c_double,
) -> c_short {
    if min_position.is_null() || max_position.is_null() {
        return INVALID_PARAMETER;
    }
    match with_open(serial, |d| d.travel_limits) {
        Ok(limits) => {
            *min_position = limits.min_position;
            *max_position = limits.max_position;
            0
        }
        Err(code) => code,
    }
}

unsafe extern "C" fn set_motor_travel_limits(
    serial: *const c_char,
    min_position: c_double,
    max_position: c_double,
) -> c_short {
    status(with_open(serial, |d| {
        d.travel_limits = TravelLimits {
            min_position,
            max_position,
        };
    }))
}

// =============================================================================
// Unit conversion
// =============================================================================

fn valid_unit(unit_type: UNIT_TYPE) -> bool {
    matches!(
        unit_type,
        kinesis_sys::UNIT_DISTANCE | kinesis_sys::UNIT_VELOCITY | kinesis_sys::UNIT_ACCELERATION
    )
}

unsafe extern "C" fn get_real_value_from_device_unit(
    serial: *const c_char,
    device_unit: c_int,
    real_unit: *mut c_double,
    unit_type: UNIT_TYPE,
) -> c_short {
    if real_unit.is_null() || !valid_unit(unit_type) {
        return INVALID_PARAMETER;
    }
    match with_open(serial, |d| d.counts_per_unit) {
        Ok(factor) if factor != 0.0 => {
            *real_unit = f64::from(device_unit) / factor;
            0
        }
        Ok(_) => INVALID_PARAMETER,
        Err(code) => code,
    }
}

unsafe extern "C" fn get_device_unit_from_real_value(
    serial: *const c_char,
    real_unit: c_double,
    device_unit: *mut c_int,
    unit_type: UNIT_TYPE,
) -> c_short {
    if device_unit.is_null() || !valid_unit(unit_type) {
        return INVALID_PARAMETER;
    }
    match with_open(serial, |d| d.counts_per_unit) {
        Ok(factor) => {
            let counts = (real_unit * factor).round();
            if !counts.is_finite() || counts < f64::from(c_int::MIN) || counts > f64::from(c_int::MAX) {
                return INVALID_PARAMETER;
            }
            *device_unit = counts as c_int;
            0
        }
        Err(code) => code,
    }
}

// =============================================================================
// Settings
// =============================================================================

unsafe extern "C" fn request_settings(serial: *const c_char) -> c_short {
    status(with_open(serial, |_| ()))
}

unsafe extern "C" fn reset_stage_to_defaults(serial: *const c_char) -> c_short {
    status(with_open(serial, MockDevice::reset_to_defaults))
}

unsafe extern "C" fn load_settings(serial: *const c_char) -> bool {
    with_open(serial, |_| ()).is_ok()
}

unsafe extern "C" fn persist_settings(serial: *const c_char) -> bool {
    with_open(serial, |d| d.persist_count += 1).is_ok()
}
