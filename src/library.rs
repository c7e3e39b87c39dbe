//! Process-wide handle to the vendor library.
//!
//! The DLL is loaded and its entry points resolved exactly once, by an
//! explicit call to [`init`] (or [`install`] for a table built in-process).
//! Nothing is bound lazily: calling into the layer before initialization
//! fails with [`KinesisError::NotInitialized`].
//!
//! The vendor library keeps its own per-device state keyed by serial number.
//! Its thread safety is undocumented, so this layer makes no claims beyond the
//! entry point table being immutable once installed.

use std::ffi::CStr;
use std::os::raw::c_short;
use std::path::Path;

use kinesis_sys::{KCubeDcServoFns, KCubeDcServoLibrary};
use once_cell::sync::OnceCell;
use parking_lot::Mutex;
use tracing::{debug, info, warn};

use crate::error::{KinesisError, Result};
use crate::status::StatusCode;

static LIBRARY: OnceCell<KCubeDcServoLibrary> = OnceCell::new();

/// Serializes `init`/`install` so a failed load never races a successful one.
static INIT_MUTEX: Mutex<()> = Mutex::new(());

/// Load the vendor DLL from `path` and install it as the process-wide library.
///
/// # Errors
///
/// - [`KinesisError::AlreadyInitialized`] if a library is already installed
/// - [`KinesisError::LibraryLoad`] if the DLL is missing or lacks an entry point
pub fn init<P: AsRef<Path>>(path: P) -> Result<Kinesis> {
    let path = path.as_ref();
    let _guard = INIT_MUTEX.lock();
    if LIBRARY.get().is_some() {
        return Err(KinesisError::AlreadyInitialized);
    }

    // SAFETY: the entry point signatures in kinesis-sys mirror the vendor
    // headers; loading runs the DLL's own initialisation, which has no
    // preconditions on our side.
    let library = unsafe { KCubeDcServoLibrary::load(path.as_os_str()) }.map_err(|source| {
        KinesisError::LibraryLoad {
            path: path.to_path_buf(),
            source,
        }
    })?;

    info!(
        path = %path.display(),
        symbols = KCubeDcServoFns::SYMBOLS.len(),
        "Kinesis library loaded"
    );
    Ok(Kinesis::from_library(LIBRARY.get_or_init(|| library)))
}

/// Install an already-built entry point table as the process-wide library.
///
/// Used with tables assembled from in-process functions, such as the stub
/// library in [`crate::mock`].
pub fn install(library: KCubeDcServoLibrary) -> Result<Kinesis> {
    let _guard = INIT_MUTEX.lock();
    if LIBRARY.get().is_some() {
        return Err(KinesisError::AlreadyInitialized);
    }
    info!(dynamic = library.is_dynamic(), "Kinesis entry point table installed");
    Ok(Kinesis::from_library(LIBRARY.get_or_init(|| library)))
}

/// Handle to the installed library.
///
/// # Errors
///
/// [`KinesisError::NotInitialized`] if neither [`init`] nor [`install`] ran.
pub fn handle() -> Result<Kinesis> {
    LIBRARY
        .get()
        .map(Kinesis::from_library)
        .ok_or(KinesisError::NotInitialized)
}

/// Whether a library has been installed.
pub fn is_initialized() -> bool {
    LIBRARY.get().is_some()
}

/// Cheap, copyable access to a resolved entry point table.
///
/// All safe operations hang off this handle: device enumeration in
/// [`crate::enumeration`] and sessions via [`Kinesis::open`].
#[derive(Clone, Copy, Debug)]
pub struct Kinesis {
    library: &'static KCubeDcServoLibrary,
}

impl Kinesis {
    /// Wrap a table that lives for the rest of the process without touching
    /// the global slot.
    pub fn from_library(library: &'static KCubeDcServoLibrary) -> Self {
        Self { library }
    }

    /// The raw entry points.
    pub fn fns(&self) -> &'static KCubeDcServoFns {
        self.library.fns()
    }
}

/// Map a vendor `short` status onto the crate result type, logging failures.
pub(crate) fn check(function: &'static str, serial: &str, code: c_short) -> Result<()> {
    debug!(function, serial, code, "Kinesis call returned");
    StatusCode(code).into_result().map_err(|error| {
        warn!(function, serial, code, "Kinesis call returned an error status");
        KinesisError::Vendor {
            function,
            serial: serial.to_string(),
            error,
        }
    })
}

/// Map a vendor `bool` result onto the crate result type.
pub(crate) fn check_bool(function: &'static str, serial: &str, accepted: bool) -> Result<()> {
    debug!(function, serial, accepted, "Kinesis call returned");
    if accepted {
        Ok(())
    } else {
        warn!(function, serial, "Kinesis call was rejected");
        Err(KinesisError::Rejected {
            function,
            serial: serial.to_string(),
        })
    }
}

/// Decode a fixed-size, possibly unterminated C character array.
pub(crate) fn c_chars_to_string(chars: &[std::os::raw::c_char]) -> String {
    let bytes: Vec<u8> = chars.iter().map(|&c| c as u8).collect();
    match CStr::from_bytes_until_nul(&bytes) {
        Ok(s) => s.to_string_lossy().into_owned(),
        Err(_) => String::from_utf8_lossy(&bytes).into_owned(),
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_check_success_and_failure() {
        assert!(check("CC_Home", "27000001", 0).is_ok());
        let err = check("CC_Home", "27000001", 35).unwrap_err();
        assert_eq!(err.vendor_code(), Some(35));
    }

    #[test]
    fn test_check_bool() {
        assert!(check_bool("CC_PersistSettings", "27000001", true).is_ok());
        assert!(matches!(
            check_bool("CC_PersistSettings", "27000001", false),
            Err(KinesisError::Rejected { function: "CC_PersistSettings", .. })
        ));
    }

    #[test]
    fn test_c_chars_terminated_and_unterminated() {
        let mut buf = [0 as std::os::raw::c_char; 9];
        for (i, b) in b"27000001".iter().enumerate() {
            buf[i] = *b as std::os::raw::c_char;
        }
        assert_eq!(c_chars_to_string(&buf), "27000001");

        let full = [b'A' as std::os::raw::c_char; 4];
        assert_eq!(c_chars_to_string(&full), "AAAA");
    }
}
