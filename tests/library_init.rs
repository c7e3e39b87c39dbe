//! Process-wide library initialization.
//!
//! The library slot can be filled once per process, so this file is its own
//! test binary and runs its steps in a fixed order.

#![cfg(feature = "mock")]

use kinesis_motion::library;
use kinesis_motion::mock::{self, MockDevice};
use kinesis_motion::KinesisError;
use serial_test::serial;

#[test]
#[serial]
fn test_init_lifecycle() {
    // Nothing is bound before init.
    assert!(!library::is_initialized());
    assert!(matches!(library::handle(), Err(KinesisError::NotInitialized)));

    // A failed load leaves the slot empty.
    let err = library::init("definitely-not-a-kinesis-library.dll").unwrap_err();
    assert!(matches!(err, KinesisError::LibraryLoad { .. }));
    assert!(err.to_string().contains("definitely-not-a-kinesis-library.dll"));
    assert!(!library::is_initialized());

    let kinesis = library::install(mock::new_library()).unwrap();
    assert!(library::is_initialized());

    // A second initialization of either kind is refused.
    assert!(matches!(
        library::install(mock::new_library()),
        Err(KinesisError::AlreadyInitialized)
    ));
    assert!(matches!(
        library::init("Thorlabs.MotionControl.KCube.DCServo.dll"),
        Err(KinesisError::AlreadyInitialized)
    ));

    // The installed table is reachable through the global handle.
    mock::attach("83400001", MockDevice::default());
    let handle = library::handle().unwrap();
    handle.build_device_list().unwrap();
    let stage = handle.open("83400001").unwrap();
    stage.move_relative(512).unwrap();
    assert_eq!(stage.position(), 512);
    drop(stage);

    assert!(kinesis.device_list().unwrap().contains(&"83400001".to_string()));
}
