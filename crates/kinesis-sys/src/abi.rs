//! Structure layouts and enumeration constants of the Kinesis C ABI.
//!
//! Field names follow the vendor headers so that they can be matched against
//! the published documentation one-to-one. Enumerations are plain integer
//! aliases: the DLL may write values this crate does not list, and a Rust
//! `enum` holding an unlisted discriminant is undefined behaviour.

use std::os::raw::{c_char, c_int, c_short};

/// 16-bit unsigned Windows `WORD`.
pub type WORD = u16;
/// 32-bit unsigned Windows `DWORD` (LLP64, also on 64-bit targets).
pub type DWORD = u32;

// =============================================================================
// Enumerations
// =============================================================================

/// Motor type reported in [`TLI_DeviceInfo::motorType`].
pub type MOT_MotorTypes = c_int;
pub const MOT_NotMotor: MOT_MotorTypes = 0;
pub const MOT_DCMotor: MOT_MotorTypes = 1;
pub const MOT_StepperMotor: MOT_MotorTypes = 2;
pub const MOT_BrushlessMotor: MOT_MotorTypes = 3;
pub const MOT_CustomMotor: MOT_MotorTypes = 100;

/// Linear or rotational stage.
pub type MOT_TravelModes = c_int;
pub const MOT_TravelModeUndefined: MOT_TravelModes = 0;
pub const MOT_Linear: MOT_TravelModes = 1;
pub const MOT_Rotational: MOT_TravelModes = 2;

/// Jog mode, continuous or single step.
pub type MOT_JogModes = c_short;
pub const MOT_JogModeUndefined: MOT_JogModes = 0;
pub const MOT_Continuous: MOT_JogModes = 1;
pub const MOT_SingleStep: MOT_JogModes = 2;

/// Stop mode at the end of a jog.
pub type MOT_StopModes = c_short;
pub const MOT_StopModeUndefined: MOT_StopModes = 0;
pub const MOT_Immediate: MOT_StopModes = 1;
pub const MOT_Profiled: MOT_StopModes = 2;

/// Direction of travel used by homing.
pub type MOT_TravelDirection = c_short;
pub const MOT_TravelDirectionUndefined: MOT_TravelDirection = 0;
pub const MOT_Forwards: MOT_TravelDirection = 1;
pub const MOT_Reverse: MOT_TravelDirection = 2;

/// Which limit switch homing seeks.
pub type MOT_HomeLimitSwitchDirection = c_short;
pub const MOT_LimitSwitchDirectionUndefined: MOT_HomeLimitSwitchDirection = 0;
pub const MOT_ReverseLimitSwitch: MOT_HomeLimitSwitchDirection = 1;
pub const MOT_ForwardLimitSwitch: MOT_HomeLimitSwitchDirection = 4;

/// Joystick / wheel direction sense.
pub type MOT_DirectionSense = c_short;
pub const MOT_Normal: MOT_DirectionSense = 0;
pub const MOT_Backwards: MOT_DirectionSense = 1;

/// Hardware limit switch behaviour.
pub type MOT_LimitSwitchModes = WORD;
pub const MOT_LimitSwitchModeUndefined: MOT_LimitSwitchModes = 0x00;
pub const MOT_LimitSwitchIgnoreSwitch: MOT_LimitSwitchModes = 0x01;
pub const MOT_LimitSwitchMakeOnContact: MOT_LimitSwitchModes = 0x02;
pub const MOT_LimitSwitchBreakOnContact: MOT_LimitSwitchModes = 0x03;
pub const MOT_LimitSwitchMakeOnHome: MOT_LimitSwitchModes = 0x04;
pub const MOT_LimitSwitchBreakOnHome: MOT_LimitSwitchModes = 0x05;
pub const MOT_PMD_Reserved: MOT_LimitSwitchModes = 0x06;
pub const MOT_LimitSwitchIgnoreSwitchSwapped: MOT_LimitSwitchModes = 0x81;

/// Software limit behaviour.
pub type MOT_LimitSwitchSWModes = WORD;
pub const MOT_LimitSwitchSWModeUndefined: MOT_LimitSwitchSWModes = 0x00;
pub const MOT_LimitSwitchIgnored: MOT_LimitSwitchSWModes = 0x01;
pub const MOT_LimitSwitchStopImmediate: MOT_LimitSwitchSWModes = 0x02;
pub const MOT_LimitSwitchStopProfiled: MOT_LimitSwitchSWModes = 0x03;
pub const MOT_LimitSwitchIgnored_Rotational: MOT_LimitSwitchSWModes = 0x81;
pub const MOT_LimitSwitchStopImmediate_Rotational: MOT_LimitSwitchSWModes = 0x82;
pub const MOT_LimitSwitchStopProfiled_Rotational: MOT_LimitSwitchSWModes = 0x83;

/// Unit selector for `CC_GetRealValueFromDeviceUnit` and its inverse.
pub type UNIT_TYPE = c_int;
pub const UNIT_DISTANCE: UNIT_TYPE = 0;
pub const UNIT_VELOCITY: UNIT_TYPE = 1;
pub const UNIT_ACCELERATION: UNIT_TYPE = 2;

/// Device type identifier of a K-Cube DC servo, used by the `…ByType` listings.
pub const KCUBE_DC_SERVO_TYPE_ID: c_int = 27;

// =============================================================================
// Structures
// =============================================================================

/// Identification of a connected unit, filled by `TLI_GetDeviceInfo`.
#[repr(C)]
#[derive(Debug, Copy, Clone)]
pub struct TLI_DeviceInfo {
    pub typeID: DWORD,
    pub description: [c_char; 65],
    pub serialNo: [c_char; 9],
    pub PID: DWORD,
    pub isKnownType: bool,
    pub motorType: MOT_MotorTypes,
    pub isPiezoDevice: bool,
    pub isLaser: bool,
    pub isCustomType: bool,
    pub isRack: bool,
    pub maxChannels: c_short,
}

impl Default for TLI_DeviceInfo {
    fn default() -> Self {
        Self {
            typeID: 0,
            description: [0; 65],
            serialNo: [0; 9],
            PID: 0,
            isKnownType: false,
            motorType: MOT_NotMotor,
            isPiezoDevice: false,
            isLaser: false,
            isCustomType: false,
            isRack: false,
            maxChannels: 0,
        }
    }
}

/// Firmware and hardware metadata, filled by `CC_GetHardwareInfoBlock`.
#[repr(C)]
#[derive(Debug, Copy, Clone)]
pub struct TLI_HardwareInformation {
    pub serialNumber: DWORD,
    pub modelNumber: [c_char; 8],
    pub r#type: WORD,
    pub firmwareVersion: DWORD,
    pub notes: [c_char; 48],
    pub deviceDependantData: [i8; 12],
    pub hardwareVersion: WORD,
    pub modificationState: WORD,
    pub numChannels: c_short,
}

impl Default for TLI_HardwareInformation {
    fn default() -> Self {
        Self {
            serialNumber: 0,
            modelNumber: [0; 8],
            r#type: 0,
            firmwareVersion: 0,
            notes: [0; 48],
            deviceDependantData: [0; 12],
            hardwareVersion: 0,
            modificationState: 0,
            numChannels: 0,
        }
    }
}

/// Velocity profile in device units.
#[repr(C)]
#[derive(Debug, Copy, Clone, Default, PartialEq, Eq)]
pub struct MOT_VelocityParameters {
    pub minVelocity: c_int,
    pub acceleration: c_int,
    pub maxVelocity: c_int,
}

#[repr(C)]
#[derive(Debug, Copy, Clone, Default, PartialEq, Eq)]
pub struct MOT_JogParameters {
    pub mode: MOT_JogModes,
    pub stepSize: u32,
    pub velParams: MOT_VelocityParameters,
    pub stopMode: MOT_StopModes,
}

#[repr(C)]
#[derive(Debug, Copy, Clone, Default, PartialEq, Eq)]
pub struct MOT_HomingParameters {
    pub direction: MOT_TravelDirection,
    pub limitSwitch: MOT_HomeLimitSwitchDirection,
    pub velocity: u32,
    pub offsetDistance: u32,
}

#[repr(C)]
#[derive(Debug, Copy, Clone, Default, PartialEq, Eq)]
pub struct MOT_LimitSwitchParameters {
    pub clockwiseHardwareLimit: MOT_LimitSwitchModes,
    pub anticlockwiseHardwareLimit: MOT_LimitSwitchModes,
    pub clockwisePosition: DWORD,
    pub anticlockwisePosition: DWORD,
    pub softLimitMode: MOT_LimitSwitchSWModes,
}

/// Servo loop gains.
#[repr(C)]
#[derive(Debug, Copy, Clone, Default, PartialEq, Eq)]
pub struct MOT_DC_PIDParameters {
    pub proportionalGain: c_int,
    pub integralGain: c_int,
    pub differentialGain: c_int,
    pub integralLimit: c_int,
    pub parameterFilter: WORD,
}

/// Front-panel wheel and display settings.
#[repr(C)]
#[derive(Debug, Copy, Clone, Default, PartialEq, Eq)]
pub struct KMOT_MMIParams {
    pub JoystickMODE: c_int,
    pub JoystickMaxVelocity: i32,
    pub JoystickAcceleration: i32,
    pub JoystickDirectionSense: MOT_DirectionSense,
    pub PresetPos1: i32,
    pub PresetPos2: i32,
    pub DisplayIntensity: i16,
    pub reserved: [i16; 6],
}

#[repr(C)]
#[derive(Debug, Copy, Clone, Default, PartialEq, Eq)]
pub struct KMOT_TriggerConfig {
    pub Trigger1Mode: c_int,
    pub Trigger1Polarity: c_int,
    pub Trigger2Mode: c_int,
    pub Trigger2Polarity: c_int,
}

/// Position-triggered output pulse train.
#[repr(C)]
#[derive(Debug, Copy, Clone, Default, PartialEq, Eq)]
pub struct KMOT_TriggerParams {
    pub TriggerStartPositionFwd: i32,
    pub TriggerIntervalFwd: i32,
    pub TriggerPulseCountFwd: i32,
    pub TriggerStartPositionRev: i32,
    pub TriggerIntervalRev: i32,
    pub TriggerPulseCountRev: i32,
    pub TriggerPulseWidth: i32,
    pub CycleCount: i32,
    pub reserved: [i32; 6],
}
