//! # Kinesis KCube DC Servo
//!
//! Safe bindings for `Thorlabs.MotionControl.KCube.DCServo.dll`, the vendor
//! library that drives Thorlabs K-Cube brushed DC servo controllers (KDC101).
//!
//! The raw layouts and entry points live in the `kinesis-sys` crate. This
//! crate adds:
//!
//! - **`library`**: explicit, one-time loading of the DLL and the [`Kinesis`] handle
//! - **`enumeration`**: device discovery by serial number and type
//! - **`device`**: [`KCubeDcServo`], one session per controller
//! - **`params`**: parameter blocks as field dictionaries with all-or-nothing assignment
//! - **`status`**: raw vendor status codes and caller-supplied decode tables
//! - **`config`** / **`logging`**: Figment configuration and `tracing` setup
//! - **`manager`**: opens and configures every device named in the configuration
//! - **`mock`**: an in-process stand-in for the DLL (feature `mock`)
//!
//! The layer adds no motion logic of its own. Calls block until the DLL
//! returns; moves and homing are started, not awaited.
//!
//! ```no_run
//! use kinesis_motion::{library, UnitType};
//!
//! # fn main() -> kinesis_motion::Result<()> {
//! let kinesis = library::init("Thorlabs.MotionControl.KCube.DCServo.dll")?;
//! kinesis.build_device_list()?;
//!
//! let stage = kinesis.open("27000001")?;
//! let target = stage.device_unit_from_real_value(12.5, UnitType::Distance)?;
//! stage.move_to_position(target)?;
//! # Ok(())
//! # }
//! ```

pub mod config;
#[allow(unsafe_code)]
pub mod device;
#[allow(unsafe_code)]
pub mod enumeration;
pub mod error;
#[allow(unsafe_code)]
pub mod library;
pub mod logging;
pub mod manager;
#[cfg(any(test, feature = "mock"))]
#[allow(unsafe_code)]
pub mod mock;
pub mod params;
pub mod status;

pub use config::{DeviceDefinition, KinesisConfig};
pub use device::{HardwareInfo, KCubeDcServo, StopMode, TravelMode, UnitType};
pub use enumeration::{DeviceInfo, MotorType, KCUBE_DC_SERVO_TYPE_ID};
pub use error::{KinesisError, Result};
pub use library::Kinesis;
pub use manager::DeviceManager;
pub use params::{BlockKind, FieldValue, ParamBlock, ParamDict};
pub use status::{StatusCode, StatusLookup, StatusTable, VendorError};
