//! Parameter blocks as field dictionaries.
//!
//! Every parameter block the device reads or writes can be viewed as a
//! dictionary of its fields ([`ParamBlock::get_dict`]) and bulk-assigned from
//! one ([`ParamBlock::load_dict`]). Dictionaries are plain serde values, so they
//! come straight from TOML configuration or JSON on the command line.
//!
//! Assignment is all-or-nothing: an unknown key or a value that cannot be
//! coerced leaves the block exactly as it was. Integers wider than their field
//! wrap to the field's width, so `-1` stored in a `u32` reads back as
//! `4294967295`.
//!
//! ```
//! use kinesis_motion::params::{FieldValue, ParamBlock, ParamDict};
//! use kinesis_sys::MOT_HomingParameters;
//!
//! let mut homing = MOT_HomingParameters::default();
//! let mut dict = ParamDict::new();
//! dict.insert("velocity".into(), FieldValue::Float(1500.7));
//! dict.insert("offsetDistance".into(), FieldValue::Text("4096".into()));
//! homing.load_dict(&dict).unwrap();
//!
//! assert_eq!(homing.velocity, 1500);
//! assert_eq!(homing.offsetDistance, 4096);
//! ```

use std::collections::BTreeMap;
use std::fmt;
use std::os::raw::c_char;
use std::str::FromStr;

use kinesis_sys::{
    KMOT_MMIParams, KMOT_TriggerConfig, KMOT_TriggerParams, MOT_DC_PIDParameters,
    MOT_HomingParameters, MOT_JogParameters, MOT_LimitSwitchParameters, MOT_VelocityParameters,
    TLI_DeviceInfo, TLI_HardwareInformation,
};
use serde::{Deserialize, Serialize};

use crate::error::{KinesisError, Result};
use crate::library::c_chars_to_string;

/// Field name to value.
pub type ParamDict = BTreeMap<String, FieldValue>;

/// A dynamically typed field value.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(untagged)]
pub enum FieldValue {
    /// Boolean, coerced to 0/1 for integer fields.
    Bool(bool),
    /// Integer.
    Int(i64),
    /// Floating point.
    Float(f64),
    /// Text, parsed when assigned to a numeric field.
    Text(String),
    /// Fixed-size array fields such as `reserved`.
    List(Vec<FieldValue>),
    /// Nested blocks such as `velParams`.
    Table(ParamDict),
}

impl FieldValue {
    /// Integer coercion: integers as-is, floats truncated toward zero,
    /// booleans as 0/1, strings parsed as decimal integers.
    pub fn as_int(&self) -> std::result::Result<i64, String> {
        match self {
            Self::Int(v) => Ok(*v),
            Self::Float(v) if v.is_finite() => Ok(v.trunc() as i64),
            Self::Float(v) => Err(format!("{} is not a finite number", v)),
            Self::Bool(b) => Ok(i64::from(*b)),
            Self::Text(s) => s
                .trim()
                .parse::<i64>()
                .map_err(|_| format!("'{}' is not an integer", s)),
            Self::List(_) => Err("expected a number, found a list".to_string()),
            Self::Table(_) => Err("expected a number, found a table".to_string()),
        }
    }

    /// Float coercion: numbers widened to `f64`, booleans as 0/1, strings parsed.
    pub fn as_float(&self) -> std::result::Result<f64, String> {
        match self {
            Self::Int(v) => Ok(*v as f64),
            Self::Float(v) => Ok(*v),
            Self::Bool(b) => Ok(if *b { 1.0 } else { 0.0 }),
            Self::Text(s) => s
                .trim()
                .parse::<f64>()
                .map_err(|_| format!("'{}' is not a number", s)),
            Self::List(_) => Err("expected a number, found a list".to_string()),
            Self::Table(_) => Err("expected a number, found a table".to_string()),
        }
    }

    /// Parse a command-line style `value`: integer, then float, then bool,
    /// otherwise text.
    pub fn parse_scalar(raw: &str) -> Self {
        let raw = raw.trim();
        if let Ok(v) = raw.parse::<i64>() {
            Self::Int(v)
        } else if let Ok(v) = raw.parse::<f64>() {
            Self::Float(v)
        } else if let Ok(v) = raw.parse::<bool>() {
            Self::Bool(v)
        } else {
            Self::Text(raw.to_string())
        }
    }
}

impl From<i64> for FieldValue {
    fn from(v: i64) -> Self {
        Self::Int(v)
    }
}

impl From<f64> for FieldValue {
    fn from(v: f64) -> Self {
        Self::Float(v)
    }
}

impl From<&str> for FieldValue {
    fn from(v: &str) -> Self {
        Self::Text(v.to_string())
    }
}

/// A fixed-layout parameter block with named fields.
pub trait ParamBlock: Copy {
    /// Name used in error messages.
    const BLOCK: &'static str;

    /// Field names in declaration order.
    fn field_names() -> &'static [&'static str];

    /// Current value of one field.
    fn get_field(&self, name: &str) -> Option<FieldValue>;

    /// Assign one field, coercing `value` to the field's declared type.
    fn set_field(&mut self, name: &str, value: &FieldValue) -> Result<()>;

    /// All fields as a dictionary.
    fn get_dict(&self) -> ParamDict {
        Self::field_names()
            .iter()
            .filter_map(|name| self.get_field(name).map(|v| (name.to_string(), v)))
            .collect()
    }

    /// Assign every field named in `dict`.
    ///
    /// # Errors
    ///
    /// - [`KinesisError::UnknownField`] if any key is not a field of this block
    /// - [`KinesisError::InvalidFieldValue`] if a value cannot be coerced
    ///
    /// On error no field is modified. Integers wrap to the field's width.
    fn load_dict(&mut self, dict: &ParamDict) -> Result<()> {
        if let Some(unknown) = dict
            .keys()
            .find(|key| !Self::field_names().contains(&key.as_str()))
        {
            return Err(KinesisError::UnknownField {
                block: Self::BLOCK,
                field: unknown.clone(),
            });
        }

        let mut staged = *self;
        for (name, value) in dict {
            staged.set_field(name, value)?;
        }
        *self = staged;
        Ok(())
    }
}

/// Integer field types. Conversion keeps the low bits, two's complement.
trait WrappingFromInt: Copy {
    fn wrapping_from(raw: i64) -> Self;
}

macro_rules! wrapping_from_int {
    ($($t:ty),*) => {
        $(
            impl WrappingFromInt for $t {
                #[allow(clippy::cast_possible_truncation, clippy::cast_sign_loss)]
                fn wrapping_from(raw: i64) -> Self {
                    raw as $t
                }
            }
        )*
    };
}

wrapping_from_int!(i8, u8, i16, u16, i32, u32);

fn coerce_int<T: WrappingFromInt>(block: &'static str, field: &str, value: &FieldValue) -> Result<T> {
    value
        .as_int()
        .map(T::wrapping_from)
        .map_err(|reason| KinesisError::invalid_field(block, field, reason))
}

fn coerce_bool(block: &'static str, field: &str, value: &FieldValue) -> Result<bool> {
    match value {
        FieldValue::Bool(b) => Ok(*b),
        other => other
            .as_int()
            .map(|v| v != 0)
            .map_err(|reason| KinesisError::invalid_field(block, field, reason)),
    }
}

/// Copy `value` into a fixed `char` array, NUL-padded.
fn coerce_text(block: &'static str, field: &str, value: &FieldValue, dst: &mut [c_char]) -> Result<()> {
    let FieldValue::Text(text) = value else {
        return Err(KinesisError::invalid_field(block, field, "expected text"));
    };
    if text.len() > dst.len() {
        return Err(KinesisError::invalid_field(
            block,
            field,
            format!("'{}' is longer than {} bytes", text, dst.len()),
        ));
    }
    dst.fill(0);
    for (slot, byte) in dst.iter_mut().zip(text.bytes()) {
        *slot = byte as c_char;
    }
    Ok(())
}

fn coerce_float(block: &'static str, field: &str, value: &FieldValue) -> Result<f64> {
    value
        .as_float()
        .map_err(|reason| KinesisError::invalid_field(block, field, reason))
}

macro_rules! param_block {
    (@name $field:ident) => { stringify!($field) };
    (@name $field:ident $name:literal) => { $name };

    (@get int, $place:expr) => { FieldValue::Int(i64::from($place)) };
    (@get float, $place:expr) => { FieldValue::Float($place) };
    (@get bool, $place:expr) => { FieldValue::Bool($place) };
    (@get text, $place:expr) => { FieldValue::Text(c_chars_to_string(&$place)) };
    (@get nested, $place:expr) => { FieldValue::Table($place.get_dict()) };
    (@get array, $place:expr) => {
        FieldValue::List($place.iter().map(|v| FieldValue::Int(i64::from(*v))).collect())
    };

    (@set int, $place:expr, $block:expr, $name:expr, $value:expr) => {
        $place = coerce_int($block, $name, $value)?
    };
    (@set float, $place:expr, $block:expr, $name:expr, $value:expr) => {
        $place = coerce_float($block, $name, $value)?
    };
    (@set bool, $place:expr, $block:expr, $name:expr, $value:expr) => {
        $place = coerce_bool($block, $name, $value)?
    };
    (@set text, $place:expr, $block:expr, $name:expr, $value:expr) => {
        coerce_text($block, $name, $value, &mut $place)?
    };
    (@set nested, $place:expr, $block:expr, $name:expr, $value:expr) => {
        match $value {
            FieldValue::Table(dict) => $place.load_dict(dict)?,
            _ => return Err(KinesisError::invalid_field($block, $name, "expected a table")),
        }
    };
    (@set array, $place:expr, $block:expr, $name:expr, $value:expr) => {{
        let items = match $value {
            FieldValue::List(items) if items.len() == $place.len() => items,
            FieldValue::List(items) => {
                return Err(KinesisError::invalid_field(
                    $block,
                    $name,
                    format!("expected {} elements, found {}", $place.len(), items.len()),
                ))
            }
            _ => return Err(KinesisError::invalid_field($block, $name, "expected a list")),
        };
        let mut array = $place;
        for (slot, item) in array.iter_mut().zip(items) {
            *slot = coerce_int($block, $name, item)?;
        }
        $place = array;
    }};

    ($ty:ty, $block:literal {
        $($field:ident $(as $rename:literal)?: $kind:ident),* $(,)?
    }) => {
        impl ParamBlock for $ty {
            const BLOCK: &'static str = $block;

            fn field_names() -> &'static [&'static str] {
                &[$(param_block!(@name $field $($rename)?)),*]
            }

            fn get_field(&self, name: &str) -> Option<FieldValue> {
                $(
                    if name == param_block!(@name $field $($rename)?) {
                        return Some(param_block!(@get $kind, self.$field));
                    }
                )*
                None
            }

            fn set_field(&mut self, name: &str, value: &FieldValue) -> Result<()> {
                $(
                    if name == param_block!(@name $field $($rename)?) {
                        param_block!(@set $kind, self.$field, $block, name, value);
                        return Ok(());
                    }
                )*
                Err(KinesisError::UnknownField {
                    block: $block,
                    field: name.to_string(),
                })
            }
        }
    };
}

param_block!(MOT_VelocityParameters, "MOT_VelocityParameters" {
    minVelocity: int,
    acceleration: int,
    maxVelocity: int,
});

param_block!(MOT_JogParameters, "MOT_JogParameters" {
    mode: int,
    stepSize: int,
    velParams: nested,
    stopMode: int,
});

param_block!(MOT_HomingParameters, "MOT_HomingParameters" {
    direction: int,
    limitSwitch: int,
    velocity: int,
    offsetDistance: int,
});

param_block!(MOT_LimitSwitchParameters, "MOT_LimitSwitchParameters" {
    clockwiseHardwareLimit: int,
    anticlockwiseHardwareLimit: int,
    clockwisePosition: int,
    anticlockwisePosition: int,
    softLimitMode: int,
});

param_block!(MOT_DC_PIDParameters, "MOT_DC_PIDParameters" {
    proportionalGain: int,
    integralGain: int,
    differentialGain: int,
    integralLimit: int,
    parameterFilter: int,
});

param_block!(KMOT_MMIParams, "KMOT_MMIParams" {
    JoystickMODE: int,
    JoystickMaxVelocity: int,
    JoystickAcceleration: int,
    JoystickDirectionSense: int,
    PresetPos1: int,
    PresetPos2: int,
    DisplayIntensity: int,
    reserved: array,
});

param_block!(KMOT_TriggerConfig, "KMOT_TriggerConfig" {
    Trigger1Mode: int,
    Trigger1Polarity: int,
    Trigger2Mode: int,
    Trigger2Polarity: int,
});

param_block!(KMOT_TriggerParams, "KMOT_TriggerParams" {
    TriggerStartPositionFwd: int,
    TriggerIntervalFwd: int,
    TriggerPulseCountFwd: int,
    TriggerStartPositionRev: int,
    TriggerIntervalRev: int,
    TriggerPulseCountRev: int,
    TriggerPulseWidth: int,
    CycleCount: int,
    reserved: array,
});

param_block!(TLI_DeviceInfo, "TLI_DeviceInfo" {
    typeID: int,
    description: text,
    serialNo: text,
    PID: int,
    isKnownType: bool,
    motorType: int,
    isPiezoDevice: bool,
    isLaser: bool,
    isCustomType: bool,
    isRack: bool,
    maxChannels: int,
});

param_block!(TLI_HardwareInformation, "TLI_HardwareInformation" {
    serialNumber: int,
    modelNumber: text,
    r#type as "type": int,
    firmwareVersion: int,
    notes: text,
    deviceDependantData: array,
    hardwareVersion: int,
    modificationState: int,
    numChannels: int,
});

/// Stage drive description in real units (`CC_Get/SetMotorParamsExt`).
#[derive(Debug, Clone, Copy, Default, PartialEq, Serialize, Deserialize)]
pub struct MotorParams {
    /// Encoder counts per motor revolution.
    pub steps_per_rev: f64,
    /// Motor revolutions per output revolution.
    pub gearbox_ratio: f64,
    /// Travel per output revolution.
    pub pitch: f64,
}

/// Maximum velocity and acceleration in real units.
#[derive(Debug, Clone, Copy, Default, PartialEq, Serialize, Deserialize)]
pub struct VelocityLimits {
    /// Maximum velocity.
    pub max_velocity: f64,
    /// Maximum acceleration.
    pub max_acceleration: f64,
}

/// Travel range in real units.
#[derive(Debug, Clone, Copy, Default, PartialEq, Serialize, Deserialize)]
pub struct TravelLimits {
    /// Lower end of travel.
    pub min_position: f64,
    /// Upper end of travel.
    pub max_position: f64,
}

param_block!(MotorParams, "MotorParams" {
    steps_per_rev: float,
    gearbox_ratio: float,
    pitch: float,
});

param_block!(VelocityLimits, "VelocityLimits" {
    max_velocity: float,
    max_acceleration: float,
});

param_block!(TravelLimits, "TravelLimits" {
    min_position: float,
    max_position: float,
});

/// Names the parameter blocks a device exposes, for configuration and the CLI.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum BlockKind {
    /// `MOT_VelocityParameters`
    Velocity,
    /// `MOT_JogParameters`
    Jog,
    /// `MOT_HomingParameters`
    Homing,
    /// `MOT_LimitSwitchParameters`
    LimitSwitch,
    /// `MOT_DC_PIDParameters`
    Pid,
    /// `KMOT_MMIParams`
    Mmi,
    /// `KMOT_TriggerConfig`
    TriggerConfig,
    /// `KMOT_TriggerParams`
    TriggerParams,
    /// [`MotorParams`]
    Motor,
    /// [`VelocityLimits`]
    VelocityLimits,
    /// [`TravelLimits`]
    TravelLimits,
}

impl BlockKind {
    /// Every block, in a stable order.
    pub const ALL: [BlockKind; 11] = [
        Self::Velocity,
        Self::Jog,
        Self::Homing,
        Self::LimitSwitch,
        Self::Pid,
        Self::Mmi,
        Self::TriggerConfig,
        Self::TriggerParams,
        Self::Motor,
        Self::VelocityLimits,
        Self::TravelLimits,
    ];

    /// Configuration / CLI name.
    pub fn name(self) -> &'static str {
        match self {
            Self::Velocity => "velocity",
            Self::Jog => "jog",
            Self::Homing => "homing",
            Self::LimitSwitch => "limit_switch",
            Self::Pid => "pid",
            Self::Mmi => "mmi",
            Self::TriggerConfig => "trigger_config",
            Self::TriggerParams => "trigger_params",
            Self::Motor => "motor",
            Self::VelocityLimits => "velocity_limits",
            Self::TravelLimits => "travel_limits",
        }
    }
}

impl fmt::Display for BlockKind {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.name())
    }
}

impl FromStr for BlockKind {
    type Err = String;

    fn from_str(s: &str) -> std::result::Result<Self, Self::Err> {
        let wanted = s.trim().to_ascii_lowercase().replace('-', "_");
        Self::ALL
            .into_iter()
            .find(|kind| kind.name() == wanted)
            .ok_or_else(|| {
                let names: Vec<_> = Self::ALL.iter().map(|k| k.name()).collect();
                format!("unknown block '{}'; expected one of: {}", s, names.join(", "))
            })
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn dict(entries: &[(&str, FieldValue)]) -> ParamDict {
        entries
            .iter()
            .map(|(k, v)| (k.to_string(), v.clone()))
            .collect()
    }

    #[test]
    fn test_get_dict_lists_every_field_in_order() {
        let pid = MOT_DC_PIDParameters {
            proportionalGain: 435,
            integralGain: 195,
            differentialGain: 993,
            integralLimit: 195,
            parameterFilter: 15,
        };
        let d = pid.get_dict();
        assert_eq!(d.len(), MOT_DC_PIDParameters::field_names().len());
        assert_eq!(d["proportionalGain"], FieldValue::Int(435));
        assert_eq!(d["parameterFilter"], FieldValue::Int(15));
    }

    #[test]
    fn test_subset_assignment_coerces_to_field_type() {
        let mut vel = MOT_VelocityParameters {
            minVelocity: 1,
            acceleration: 2,
            maxVelocity: 3,
        };
        vel.load_dict(&dict(&[
            ("acceleration", FieldValue::Float(4506.9)),
            ("maxVelocity", FieldValue::Text(" 772981 ".into())),
        ]))
        .unwrap();

        assert_eq!(vel.minVelocity, 1);
        assert_eq!(vel.acceleration, 4506);
        assert_eq!(vel.maxVelocity, 772_981);
    }

    #[test]
    fn test_negative_float_truncates_toward_zero() {
        let mut vel = MOT_VelocityParameters::default();
        vel.load_dict(&dict(&[("minVelocity", FieldValue::Float(-2.7))]))
            .unwrap();
        assert_eq!(vel.minVelocity, -2);
    }

    #[test]
    fn test_unknown_key_fails_before_any_mutation() {
        let original = MOT_HomingParameters {
            direction: 2,
            limitSwitch: 1,
            velocity: 100,
            offsetDistance: 5,
        };
        let mut homing = original;
        // "velocity" sorts first and is valid, so it would land without the up-front check.
        let err = homing
            .load_dict(&dict(&[
                ("velocity", FieldValue::Int(9999)),
                ("zspeed", FieldValue::Int(1)),
            ]))
            .unwrap_err();

        assert!(matches!(
            err,
            KinesisError::UnknownField { block: "MOT_HomingParameters", ref field } if field == "zspeed"
        ));
        assert_eq!(homing, original);
    }

    #[test]
    fn test_uncoercible_value_leaves_block_untouched() {
        let original = MOT_DC_PIDParameters::default();
        let mut pid = original;
        let err = pid
            .load_dict(&dict(&[
                ("integralGain", FieldValue::Int(10)),
                ("proportionalGain", FieldValue::Text("fast".into())),
            ]))
            .unwrap_err();
        assert!(matches!(err, KinesisError::InvalidFieldValue { .. }));
        assert_eq!(pid, original);
    }

    #[test]
    fn test_out_of_range_integer_wraps_to_field_width() {
        let mut homing = MOT_HomingParameters::default();
        homing
            .load_dict(&dict(&[
                ("velocity", FieldValue::Int(-1)),
                ("offsetDistance", FieldValue::Int(1 << 32 | 7)),
                ("direction", FieldValue::Int(65_538)),
            ]))
            .unwrap();
        assert_eq!(homing.velocity, 4_294_967_295);
        assert_eq!(homing.offsetDistance, 7);
        assert_eq!(homing.direction, 2);

        let mut limits = MOT_LimitSwitchParameters::default();
        limits
            .load_dict(&dict(&[("softLimitMode", FieldValue::Int(70_000))]))
            .unwrap();
        assert_eq!(limits.softLimitMode, (70_000_u32 - 65_536) as u16);

        let mut mmi = KMOT_MMIParams::default();
        mmi.load_dict(&dict(&[("DisplayIntensity", FieldValue::Float(-32_769.5))]))
            .unwrap();
        assert_eq!(mmi.DisplayIntensity, i16::MAX);
    }

    #[test]
    fn test_nested_block_assignment() {
        let mut jog = MOT_JogParameters::default();
        let inner = dict(&[("maxVelocity", FieldValue::Int(30_000))]);
        jog.load_dict(&dict(&[
            ("mode", FieldValue::Int(i64::from(kinesis_sys::MOT_SingleStep))),
            ("velParams", FieldValue::Table(inner)),
        ]))
        .unwrap();
        assert_eq!(jog.mode, kinesis_sys::MOT_SingleStep);
        assert_eq!(jog.velParams.maxVelocity, 30_000);

        let bad_inner = dict(&[("maxSpeed", FieldValue::Int(1))]);
        let before = jog;
        assert!(jog
            .load_dict(&dict(&[
                ("stepSize", FieldValue::Int(5)),
                ("velParams", FieldValue::Table(bad_inner)),
            ]))
            .is_err());
        assert_eq!(jog, before);
    }

    #[test]
    fn test_array_field_requires_exact_length() {
        let mut trig = KMOT_TriggerParams::default();
        let six = FieldValue::List((1..=6).map(FieldValue::Int).collect());
        trig.load_dict(&dict(&[("reserved", six)])).unwrap();
        assert_eq!(trig.reserved, [1, 2, 3, 4, 5, 6]);

        let three = FieldValue::List((1..=3).map(FieldValue::Int).collect());
        assert!(trig.load_dict(&dict(&[("reserved", three)])).is_err());
        assert_eq!(trig.reserved, [1, 2, 3, 4, 5, 6]);
    }

    #[test]
    fn test_float_block_coercion() {
        let mut motor = MotorParams::default();
        motor
            .load_dict(&dict(&[
                ("steps_per_rev", FieldValue::Int(512)),
                ("gearbox_ratio", FieldValue::Text("67.49".into())),
                ("pitch", FieldValue::Float(1.0)),
            ]))
            .unwrap();
        assert_eq!(motor.steps_per_rev, 512.0);
        assert!((motor.gearbox_ratio - 67.49).abs() < 1e-12);
        assert_eq!(motor.get_dict()["pitch"], FieldValue::Float(1.0));
    }

    #[test]
    fn test_dict_from_toml_and_json() {
        let from_toml: ParamDict = toml::from_str(
            "velocity = 1500\noffsetDistance = 4096.0\ndirection = \"2\"\n",
        )
        .unwrap();
        let mut homing = MOT_HomingParameters::default();
        homing.load_dict(&from_toml).unwrap();
        assert_eq!(homing.velocity, 1500);
        assert_eq!(homing.offsetDistance, 4096);
        assert_eq!(homing.direction, 2);

        let from_json: ParamDict =
            serde_json::from_str(r#"{"Trigger1Mode": 2, "Trigger1Polarity": true}"#).unwrap();
        let mut config = KMOT_TriggerConfig::default();
        config.load_dict(&from_json).unwrap();
        assert_eq!(config.Trigger1Mode, 2);
        assert_eq!(config.Trigger1Polarity, 1);
    }

    #[test]
    fn test_device_info_dict() {
        let mut info = TLI_DeviceInfo::default();
        info.load_dict(&dict(&[
            ("typeID", FieldValue::Int(27)),
            ("serialNo", FieldValue::Text("27000001".into())),
            ("description", FieldValue::Text("KCube DC Servo".into())),
            ("isKnownType", FieldValue::Int(1)),
            ("motorType", FieldValue::Int(i64::from(kinesis_sys::MOT_DCMotor))),
        ]))
        .unwrap();

        let d = info.get_dict();
        assert_eq!(d.len(), TLI_DeviceInfo::field_names().len());
        assert_eq!(d["serialNo"], FieldValue::Text("27000001".into()));
        assert_eq!(d["description"], FieldValue::Text("KCube DC Servo".into()));
        assert_eq!(d["isKnownType"], FieldValue::Bool(true));
        assert_eq!(d["isRack"], FieldValue::Bool(false));
        assert_eq!(d["motorType"], FieldValue::Int(1));

        let err = info
            .load_dict(&dict(&[("serialNo", FieldValue::Text("2700000123".into()))]))
            .unwrap_err();
        assert!(matches!(err, KinesisError::InvalidFieldValue { .. }));
        assert_eq!(info.get_dict()["serialNo"], FieldValue::Text("27000001".into()));
    }

    #[test]
    fn test_hardware_info_dict() {
        let mut hw = TLI_HardwareInformation::default();
        hw.load_dict(&dict(&[
            ("serialNumber", FieldValue::Int(27_000_001)),
            ("modelNumber", FieldValue::Text("KDC101".into())),
            ("type", FieldValue::Int(16)),
            ("firmwareVersion", FieldValue::Int(0x0002_0A03)),
            ("deviceDependantData", FieldValue::List((0..12).map(FieldValue::Int).collect())),
        ]))
        .unwrap();
        assert_eq!(hw.r#type, 16);
        assert_eq!(hw.deviceDependantData[11], 11);

        let d = hw.get_dict();
        assert_eq!(TLI_HardwareInformation::field_names()[2], "type");
        assert_eq!(d["type"], FieldValue::Int(16));
        assert_eq!(d["modelNumber"], FieldValue::Text("KDC101".into()));
        assert_eq!(d["notes"], FieldValue::Text(String::new()));
        assert!(hw.load_dict(&dict(&[("r#type", FieldValue::Int(1))])).is_err());
    }

    #[test]
    fn test_parse_scalar() {
        assert_eq!(FieldValue::parse_scalar("42"), FieldValue::Int(42));
        assert_eq!(FieldValue::parse_scalar("4.5"), FieldValue::Float(4.5));
        assert_eq!(FieldValue::parse_scalar("true"), FieldValue::Bool(true));
        assert_eq!(FieldValue::parse_scalar("abc"), FieldValue::Text("abc".into()));
    }

    #[test]
    fn test_block_kind_names_round_trip() {
        for kind in BlockKind::ALL {
            assert_eq!(kind.name().parse::<BlockKind>(), Ok(kind));
        }
        assert_eq!("limit-switch".parse::<BlockKind>(), Ok(BlockKind::LimitSwitch));
        assert!("spindle".parse::<BlockKind>().is_err());
    }
}
