//! Low-level FFI bindings for the Thorlabs Kinesis KCube DC Servo library.
//!
//! This crate provides raw, unsafe access to
//! `Thorlabs.MotionControl.KCube.DCServo.dll`, the vendor library that drives
//! K-Cube DC servo motor controllers (KDC101 and friends).
//!
//! It contains two things:
//!
//! - [`abi`]: `#[repr(C)]` layouts of the structures the DLL reads and writes,
//!   plus the integer-backed vendor enumerations used as their field types.
//! - [`api`]: the table of typed entry points, resolved once from the DLL at
//!   load time.
//!
//! The vendor headers are not redistributable, so the layouts are written by
//! hand and pinned by layout tests instead of generated with bindgen.
//!
//! # Safety
//!
//! Every entry point is an `unsafe extern "C" fn`. Callers must pass
//! NUL-terminated serial numbers and pointers to correctly sized, writable
//! structures. For a safe wrapper, use the `kinesis_motion` crate instead.
//!
//! # Example (unsafe)
//!
//! ```no_run
//! use kinesis_sys::api::KCubeDcServoLibrary;
//! use std::ffi::CString;
//!
//! let library = unsafe { KCubeDcServoLibrary::load(KCubeDcServoLibrary::DEFAULT_NAME) }.unwrap();
//! let serial = CString::new("27000001").unwrap();
//! unsafe {
//!     (library.TLI_BuildDeviceList)();
//!     if (library.CC_Open)(serial.as_ptr()) == 0 {
//!         println!("position: {}", (library.CC_GetPosition)(serial.as_ptr()));
//!         (library.CC_Close)(serial.as_ptr());
//!     }
//! }
//! ```

#![allow(non_upper_case_globals)]
#![allow(non_camel_case_types)]
#![allow(non_snake_case)]
#![allow(unsafe_code)]
#![allow(missing_docs)]

pub mod abi;
pub mod api;

pub use abi::*;
pub use api::{KCubeDcServoFns, KCubeDcServoLibrary, LoadError};
