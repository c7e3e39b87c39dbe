//! Configuration loading from files and environment overrides.
//!
//! Environment variables are process-wide, so tests touching them are
//! serialized.

use std::env;
use std::fs;
use std::path::PathBuf;

use kinesis_motion::config::KinesisConfig;
use kinesis_motion::logging::LogFormat;
use kinesis_motion::{BlockKind, FieldValue};
use serial_test::serial;
use tempfile::TempDir;

fn config_in(dir: &TempDir, contents: &str) -> PathBuf {
    let path = dir.path().join("kinesis.toml");
    fs::write(&path, contents).unwrap();
    path
}

#[test]
#[serial]
fn test_load_full_file() {
    let dir = TempDir::new().unwrap();
    let path = config_in(
        &dir,
        r#"
        [library]
        path = "C:/Kinesis/Thorlabs.MotionControl.KCube.DCServo.dll"

        [logging]
        level = "debug"
        format = "json"

        [status_codes]
        "37" = "Device not homed"

        [[devices]]
        serial = "27000001"
        name = "x-stage"

        [devices.velocity]
        maxVelocity = 500000
        "#,
    );

    let config = KinesisConfig::load_from(&path).unwrap();
    config.validate().unwrap();

    assert_eq!(
        config.library.path,
        PathBuf::from("C:/Kinesis/Thorlabs.MotionControl.KCube.DCServo.dll")
    );
    assert_eq!(config.logging.level, "debug");
    assert_eq!(config.logging.format, LogFormat::Json);
    assert_eq!(config.devices[0].label(), "x-stage");
    assert_eq!(
        config.devices[0].params[&BlockKind::Velocity]["maxVelocity"],
        FieldValue::Int(500_000)
    );
    assert_eq!(
        kinesis_motion::StatusLookup::describe(&config.status_table(), 37),
        Some("Device not homed")
    );
}

#[test]
#[serial]
fn test_missing_file_gives_defaults() {
    let dir = TempDir::new().unwrap();
    let config = KinesisConfig::load_from(dir.path().join("absent.toml")).unwrap();
    assert_eq!(config.logging.level, "info");
    assert!(config.devices.is_empty());
}

#[test]
#[serial]
fn test_environment_overrides_file() {
    let dir = TempDir::new().unwrap();
    let path = config_in(
        &dir,
        r#"
        [logging]
        level = "info"
        "#,
    );

    env::set_var("KINESIS_LOGGING__LEVEL", "warn");
    env::set_var("KINESIS_LIBRARY__PATH", "/opt/kinesis/libdcservo.so");
    let result = KinesisConfig::load_from(&path);
    env::remove_var("KINESIS_LOGGING__LEVEL");
    env::remove_var("KINESIS_LIBRARY__PATH");

    let config = result.unwrap();
    assert_eq!(config.logging.level, "warn");
    assert_eq!(config.library.path, PathBuf::from("/opt/kinesis/libdcservo.so"));
}

#[test]
#[serial]
fn test_malformed_file_is_config_error() {
    let dir = TempDir::new().unwrap();
    let path = config_in(&dir, "[logging\nlevel = ");
    let err = KinesisConfig::load_from(&path).unwrap_err();
    assert!(matches!(err, kinesis_motion::KinesisError::Config { .. }));
}
