//! Device session test suite against the simulated controllers.
//!
//! Every test attaches its own serial number, so tests can run in parallel
//! against the shared stub library.
//!
//! # Test Coverage
//!
//! | Test | Description |
//! |------|-------------|
//! | `test_enumeration` | Device list, type filters and device info |
//! | `test_open_errors` | Unknown serial, invalid serial, double open |
//! | `test_motion` | Home, absolute and relative moves, stops |
//! | `test_parameter_blocks` | Get/set of every block |
//! | `test_block_dicts` | Dictionary read and all-or-nothing apply |
//! | `test_unit_conversion` | Delegated device/real unit conversion |
//! | `test_settings` | Request, reset, load and persist |

#![cfg(feature = "mock")]

use kinesis_motion::mock::{self, MockDevice};
use kinesis_motion::{
    BlockKind, FieldValue, KCubeDcServo, KinesisError, MotorType, ParamDict, StopMode, TravelMode,
    UnitType, KCUBE_DC_SERVO_TYPE_ID,
};
use kinesis_sys::MOT_VelocityParameters;

// =============================================================================
// Helpers
// =============================================================================

fn attach_and_open(serial: &str) -> KCubeDcServo {
    mock::attach(serial, MockDevice::default());
    let kinesis = mock::kinesis();
    kinesis.build_device_list().unwrap();
    kinesis.open(serial).unwrap()
}

fn dict(entries: &[(&str, FieldValue)]) -> ParamDict {
    entries
        .iter()
        .map(|(k, v)| (k.to_string(), v.clone()))
        .collect()
}

// =============================================================================
// Enumeration
// =============================================================================

#[test]
fn test_enumeration() {
    let mut other = MockDevice::default();
    other.type_id = 28;
    other.description = "KCube Brushless".into();
    mock::attach("83300001", MockDevice::default());
    mock::attach("28300002", other);

    let kinesis = mock::kinesis();
    kinesis.build_device_list().unwrap();
    assert!(kinesis.device_list_size() >= 2);

    let all = kinesis.device_list().unwrap();
    assert!(all.contains(&"83300001".to_string()));
    assert!(all.contains(&"28300002".to_string()));

    let servos = kinesis.device_list_by_type(KCUBE_DC_SERVO_TYPE_ID).unwrap();
    assert!(servos.contains(&"83300001".to_string()));
    assert!(!servos.contains(&"28300002".to_string()));

    let both = kinesis.device_list_by_types(&[27, 28]).unwrap();
    assert!(both.contains(&"83300001".to_string()));
    assert!(both.contains(&"28300002".to_string()));
    assert!(kinesis.device_list_by_types(&[]).unwrap().is_empty());

    let info = kinesis.device_info("28300002").unwrap();
    assert_eq!(info.serial_no, "28300002");
    assert_eq!(info.type_id, 28);
    assert_eq!(info.description, "KCube Brushless");
    assert_eq!(info.motor_type, MotorType::DcMotor);

    let err = kinesis.device_info("99399999").unwrap_err();
    assert_eq!(err.vendor_code(), Some(mock::DEVICE_NOT_FOUND));
}

// =============================================================================
// Lifecycle
// =============================================================================

#[test]
fn test_open_errors() {
    let kinesis = mock::kinesis();

    let err = kinesis.open("99300001").unwrap_err();
    assert!(matches!(
        err,
        KinesisError::Vendor { function: "CC_Open", ref serial, .. } if serial == "99300001"
    ));
    assert_eq!(err.vendor_code(), Some(2));

    assert!(matches!(
        kinesis.open(""),
        Err(KinesisError::InvalidSerial { .. })
    ));

    let stage = attach_and_open("83300002");
    let err = kinesis.open("83300002").unwrap_err();
    assert_eq!(err.vendor_code(), Some(mock::ALREADY_OPEN));
    stage.close().unwrap();

    // Closed devices can be opened again.
    let again = kinesis.open("83300002").unwrap();
    assert_eq!(again.serial(), "83300002");
}

#[test]
fn test_identify_and_queue() {
    let stage = attach_and_open("83300003");
    stage.identify();
    stage.identify();
    stage.clear_message_queue();
    assert_eq!(mock::snapshot("83300003").unwrap().identify_count, 2);
}

// =============================================================================
// Motion
// =============================================================================

#[test]
fn test_motion() {
    let stage = attach_and_open("83300004");
    assert!(stage.can_home());

    stage.move_to_position(10_000).unwrap();
    stage.request_position().unwrap();
    assert_eq!(stage.position(), 10_000);

    stage.move_relative(-2_500).unwrap();
    assert_eq!(stage.position(), 7_500);

    stage.home().unwrap();
    assert_eq!(stage.position(), 0);
    assert!(mock::snapshot("83300004").unwrap().homed);

    stage.stop(StopMode::Immediate).unwrap();
    assert_eq!(
        mock::snapshot("83300004").unwrap().last_stop,
        Some(kinesis_sys::MOT_Immediate)
    );
    stage.stop(StopMode::Profiled).unwrap();
    assert_eq!(
        mock::snapshot("83300004").unwrap().last_stop,
        Some(kinesis_sys::MOT_Profiled)
    );
}

#[test]
fn test_stage_that_cannot_home() {
    let mut device = MockDevice::default();
    device.can_home = false;
    mock::attach("83300005", device);
    let kinesis = mock::kinesis();
    kinesis.build_device_list().unwrap();
    let stage = kinesis.open("83300005").unwrap();
    assert!(!stage.can_home());
}

// =============================================================================
// Parameters
// =============================================================================

#[test]
fn test_parameter_blocks() {
    let stage = attach_and_open("83300006");

    assert_eq!(stage.vel_params().unwrap(), (4506, 772_981));
    stage.set_vel_params(5000, 600_000).unwrap();
    let velocity = stage.velocity_params().unwrap();
    assert_eq!(velocity.acceleration, 5000);
    assert_eq!(velocity.maxVelocity, 600_000);

    stage
        .set_velocity_params(&MOT_VelocityParameters {
            minVelocity: 1,
            acceleration: 2,
            maxVelocity: 3,
        })
        .unwrap();
    assert_eq!(stage.vel_params().unwrap(), (2, 3));

    let mut jog = stage.jog_params().unwrap();
    jog.stepSize = 1024;
    stage.set_jog_params(&jog).unwrap();
    assert_eq!(stage.jog_params().unwrap().stepSize, 1024);

    let mut homing = stage.homing_params().unwrap();
    homing.velocity = 20_000;
    stage.set_homing_params(&homing).unwrap();
    assert_eq!(stage.homing_params().unwrap(), homing);

    let mut limits = stage.limit_switch_params().unwrap();
    limits.softLimitMode = kinesis_sys::MOT_LimitSwitchStopProfiled;
    stage.set_limit_switch_params(&limits).unwrap();
    assert_eq!(stage.limit_switch_params().unwrap(), limits);

    let mut pid = stage.pid_params().unwrap();
    assert_eq!(pid.proportionalGain, 435);
    pid.integralGain = 200;
    stage.set_pid_params(&pid).unwrap();
    assert_eq!(stage.pid_params().unwrap().integralGain, 200);

    let mut mmi = stage.mmi_params().unwrap();
    mmi.DisplayIntensity = 10;
    stage.set_mmi_params(&mmi).unwrap();
    assert_eq!(stage.mmi_params().unwrap().DisplayIntensity, 10);

    let mut trigger = stage.trigger_config().unwrap();
    trigger.Trigger1Mode = 2;
    stage.set_trigger_config(&trigger).unwrap();
    assert_eq!(stage.trigger_config().unwrap().Trigger1Mode, 2);

    let mut pulses = stage.trigger_params().unwrap();
    pulses.CycleCount = 7;
    stage.set_trigger_params(&pulses).unwrap();
    assert_eq!(stage.trigger_params().unwrap().CycleCount, 7);

    let hardware = stage.hardware_info().unwrap();
    assert_eq!(hardware.model_number, "KDC101");
    assert_eq!(hardware.serial_number, 83_300_006);
    assert_eq!(hardware.num_channels, 1);
}

#[test]
fn test_stage_description() {
    let stage = attach_and_open("83300007");

    let mut motor = stage.motor_params().unwrap();
    assert_eq!(motor.steps_per_rev, 512.0);
    motor.pitch = 0.5;
    stage.set_motor_params(&motor).unwrap();
    assert_eq!(stage.motor_params().unwrap().pitch, 0.5);

    let mut limits = stage.motor_velocity_limits().unwrap();
    limits.max_velocity = 1.5;
    stage.set_motor_velocity_limits(&limits).unwrap();
    assert_eq!(stage.motor_velocity_limits().unwrap().max_velocity, 1.5);

    assert_eq!(stage.travel_mode(), TravelMode::Linear);
    stage.set_travel_mode(TravelMode::Rotational).unwrap();
    assert_eq!(stage.travel_mode(), TravelMode::Rotational);

    let mut travel = stage.travel_limits().unwrap();
    travel.max_position = 12.0;
    stage.set_travel_limits(&travel).unwrap();
    assert_eq!(stage.travel_limits().unwrap().max_position, 12.0);
}

#[test]
fn test_block_dicts() {
    let stage = attach_and_open("83300008");

    for kind in BlockKind::ALL {
        let d = stage.block_dict(kind).unwrap();
        assert!(!d.is_empty(), "{} should have fields", kind);
    }

    stage
        .apply_block_dict(
            BlockKind::Homing,
            &dict(&[("velocity", FieldValue::Float(1500.9))]),
        )
        .unwrap();
    let homing = stage.homing_params().unwrap();
    assert_eq!(homing.velocity, 1500);
    assert_eq!(homing.offsetDistance, 34_304);

    let before = stage.pid_params().unwrap();
    let err = stage
        .apply_block_dict(
            BlockKind::Pid,
            &dict(&[
                ("integralGain", FieldValue::Int(1)),
                ("gain", FieldValue::Int(2)),
            ]),
        )
        .unwrap_err();
    assert!(err.is_unknown_field());
    assert_eq!(stage.pid_params().unwrap(), before);

    stage
        .apply_block_dict(
            BlockKind::TravelLimits,
            &dict(&[("max_position", FieldValue::Int(20))]),
        )
        .unwrap();
    assert_eq!(stage.travel_limits().unwrap().max_position, 20.0);
}

// =============================================================================
// Units and settings
// =============================================================================

#[test]
fn test_unit_conversion() {
    let mut device = MockDevice::default();
    device.counts_per_unit = 1000.0;
    mock::attach("83300009", device);
    let kinesis = mock::kinesis();
    kinesis.build_device_list().unwrap();
    let stage = kinesis.open("83300009").unwrap();

    assert_eq!(
        stage
            .real_value_from_device_unit(2500, UnitType::Distance)
            .unwrap(),
        2.5
    );
    assert_eq!(
        stage
            .device_unit_from_real_value(1.25, UnitType::Velocity)
            .unwrap(),
        1250
    );
}

#[test]
fn test_settings() {
    let stage = attach_and_open("83300010");
    stage.request_settings().unwrap();
    stage.load_settings().unwrap();

    let mut pid = stage.pid_params().unwrap();
    pid.proportionalGain = 1;
    stage.set_pid_params(&pid).unwrap();
    stage.reset_stage_to_defaults().unwrap();
    assert_eq!(stage.pid_params().unwrap().proportionalGain, 435);

    stage.persist_settings().unwrap();
    assert_eq!(mock::snapshot("83300010").unwrap().persist_count, 1);
}

#[test]
fn test_rejected_and_not_opened() {
    let stage = attach_and_open("83300011");
    // Re-attaching resets the simulated device to closed behind the session.
    mock::attach("83300011", MockDevice::default());

    assert!(matches!(
        stage.persist_settings(),
        Err(KinesisError::Rejected { function: "CC_PersistSettings", .. })
    ));
    let err = stage.move_to_position(1).unwrap_err();
    assert_eq!(err.vendor_code(), Some(mock::DEVICE_NOT_OPENED));
}
