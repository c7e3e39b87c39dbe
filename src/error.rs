//! Error types for Kinesis operations.
//!
//! Vendor status codes are carried through untranslated. Turning a code into
//! text is left to a caller-supplied [`crate::status::StatusLookup`].

use std::path::PathBuf;

use thiserror::Error;

use crate::status::VendorError;

/// Result type alias for Kinesis operations.
pub type Result<T> = std::result::Result<T, KinesisError>;

/// Errors that can occur when binding or driving a Kinesis device.
#[derive(Error, Debug)]
pub enum KinesisError {
    /// The vendor DLL could not be loaded or lacks a required entry point.
    #[error("Failed to load Kinesis library '{path}': {source}")]
    LibraryLoad {
        /// Path handed to the loader.
        path: PathBuf,
        /// Loader failure.
        #[source]
        source: kinesis_sys::LoadError,
    },

    /// A call was made before [`crate::library::init`].
    #[error("Kinesis library not initialized; call kinesis_motion::library::init first")]
    NotInitialized,

    /// [`crate::library::init`] was called a second time.
    #[error("Kinesis library already initialized")]
    AlreadyInitialized,

    /// Serial number cannot be passed to the DLL.
    #[error("Invalid serial number '{serial}': {reason}")]
    InvalidSerial {
        /// The rejected serial.
        serial: String,
        /// What is wrong with it.
        reason: &'static str,
    },

    /// A vendor call returned a non-zero status code.
    #[error("{function} failed for device '{serial}': {error}")]
    Vendor {
        /// Vendor entry point name.
        function: &'static str,
        /// Device addressed, empty for list calls.
        serial: String,
        /// The raw status.
        error: VendorError,
    },

    /// A vendor call reporting success as a boolean returned `false`.
    #[error("{function} was rejected by device '{serial}'")]
    Rejected {
        /// Vendor entry point name.
        function: &'static str,
        /// Device addressed.
        serial: String,
    },

    /// A parameter dictionary names a field the block does not have.
    #[error("{block} has no field '{field}'")]
    UnknownField {
        /// Block type name.
        block: &'static str,
        /// The offending key.
        field: String,
    },

    /// A parameter dictionary value cannot be coerced to the field's type.
    #[error("Invalid value for {block}.{field}: {reason}")]
    InvalidFieldValue {
        /// Block type name.
        block: &'static str,
        /// Field being assigned.
        field: String,
        /// Why coercion failed.
        reason: String,
    },

    /// The device list returned by the DLL could not be decoded.
    #[error("Malformed device list: {message}")]
    DeviceList {
        /// Description of the problem.
        message: String,
    },

    /// Configuration could not be loaded or is inconsistent.
    #[error("Invalid configuration: {message}")]
    Config {
        /// Description of the problem.
        message: String,
    },
}

impl KinesisError {
    /// Raw vendor status code, if this error carries one.
    pub fn vendor_code(&self) -> Option<i16> {
        match self {
            Self::Vendor { error, .. } => Some(error.code()),
            _ => None,
        }
    }

    /// Check if this is an unknown-field error from dictionary assignment.
    pub fn is_unknown_field(&self) -> bool {
        matches!(self, Self::UnknownField { .. })
    }

    pub(crate) fn invalid_field(
        block: &'static str,
        field: &str,
        reason: impl Into<String>,
    ) -> Self {
        Self::InvalidFieldValue {
            block,
            field: field.to_string(),
            reason: reason.into(),
        }
    }
}

impl From<figment::Error> for KinesisError {
    fn from(err: figment::Error) -> Self {
        Self::Config {
            message: err.to_string(),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::status::StatusCode;

    #[test]
    fn test_error_display() {
        let err = KinesisError::UnknownField {
            block: "MOT_HomingParameters",
            field: "speed".to_string(),
        };
        assert_eq!(err.to_string(), "MOT_HomingParameters has no field 'speed'");
        assert!(err.is_unknown_field());
    }

    #[test]
    fn test_vendor_code_passthrough() {
        let error = StatusCode(37).into_result().unwrap_err();
        let err = KinesisError::Vendor {
            function: "CC_MoveToPosition",
            serial: "27000001".to_string(),
            error,
        };
        assert_eq!(err.vendor_code(), Some(37));
        assert!(err.to_string().contains("CC_MoveToPosition"));
        assert!(err.to_string().contains("37"));
    }
}
