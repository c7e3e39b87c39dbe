//! Vendor status codes.
//!
//! Most Kinesis entry points return a `short`: `0` on success, a
//! vendor-defined code otherwise. [`StatusCode`] keeps that raw value and
//! turns it into a tagged result without interpreting it. Decoding a code into
//! text goes through a [`StatusLookup`] the caller chooses, for example a
//! [`StatusTable`] loaded from configuration.

use std::collections::BTreeMap;
use std::fmt;

use serde::{Deserialize, Serialize};

/// Raw status code returned by a vendor call.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(transparent)]
pub struct StatusCode(pub i16);

impl StatusCode {
    /// The success code.
    pub const OK: Self = Self(0);

    /// Whether the call succeeded.
    pub fn is_ok(self) -> bool {
        self.0 == 0
    }

    /// Split into success or a [`VendorError`] carrying the raw code.
    pub fn into_result(self) -> Result<(), VendorError> {
        if self.is_ok() {
            Ok(())
        } else {
            Err(VendorError { code: self.0 })
        }
    }
}

impl From<i16> for StatusCode {
    fn from(code: i16) -> Self {
        Self(code)
    }
}

impl fmt::Display for StatusCode {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.0)
    }
}

/// A non-zero vendor status code.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub struct VendorError {
    code: i16,
}

impl VendorError {
    /// The raw code as returned by the DLL.
    pub fn code(&self) -> i16 {
        self.code
    }

    /// Describe the code with a caller-supplied lookup.
    pub fn describe<'a>(&self, lookup: &'a dyn StatusLookup) -> Option<&'a str> {
        lookup.describe(self.code)
    }
}

impl fmt::Display for VendorError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "vendor status code {}", self.code)
    }
}

impl std::error::Error for VendorError {}

/// Maps vendor status codes to human-readable text.
pub trait StatusLookup {
    /// Text for `code`, or `None` if the code is not known to this lookup.
    fn describe(&self, code: i16) -> Option<&str>;
}

/// A code-to-text table.
///
/// The layer never consults a table on its own; callers pass one to
/// [`VendorError::describe`]. Serialized as a map with decimal string keys so
/// it can live in TOML.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(try_from = "BTreeMap<String, String>", into = "BTreeMap<String, String>")]
pub struct StatusTable {
    entries: BTreeMap<i16, String>,
}

impl StatusTable {
    /// An empty table.
    pub fn new() -> Self {
        Self::default()
    }

    /// Generic codes documented for all Kinesis device libraries.
    pub fn kinesis_defaults() -> Self {
        let entries: &[(i16, &str)] = &[
            (1, "FT_InvalidHandle: the FTDI functions have not been initialized"),
            (2, "FT_DeviceNotFound: the device could not be found"),
            (3, "FT_DeviceNotOpened: the device must be opened before it can be accessed"),
            (4, "FT_IOError: an I/O error has occurred in the FTDI chip"),
            (5, "FT_InsufficientResources: there are insufficient resources to run this application"),
            (6, "FT_InvalidParameter: an invalid parameter has been supplied to the device"),
            (7, "FT_DeviceNotPresent: the device is no longer present"),
            (8, "FT_IncorrectDevice: the device detected does not match that expected"),
            (16, "FT_NoDLLLoaded: the library for this device could not be found"),
            (17, "FT_NoFunctionsAvailable: no functions available for this device"),
            (18, "FT_FunctionNotAvailable: the function is not available for this device"),
            (19, "FT_BadFunctionPointer: bad function pointer detected"),
            (20, "FT_GenericFunctionFail: the function failed to complete successfully"),
            (21, "FT_SpecificFunctionFail: the function failed to complete successfully"),
            (32, "TL_ALREADY_OPEN: attempt to open a device that was already open"),
            (33, "TL_NO_RESPONSE: the device has stopped responding"),
            (34, "TL_NOT_IMPLEMENTED: this function has not been implemented"),
            (35, "TL_FAULT_REPORTED: the device has reported a fault"),
            (36, "TL_INVALID_OPERATION: the function could not be completed at this time"),
            (40, "TL_DISCONNECTING: the function could not be completed because the device is disconnected"),
            (41, "TL_FIRMWARE_BUG: the firmware has thrown an error"),
            (42, "TL_INITIALIZATION_FAILURE: the device has failed to initialize"),
            (43, "TL_INVALID_CHANNEL: an invalid channel address was supplied"),
        ];
        entries
            .iter()
            .map(|(code, text)| (*code, text.to_string()))
            .collect()
    }

    /// Add or replace one entry.
    pub fn insert(&mut self, code: i16, text: impl Into<String>) {
        self.entries.insert(code, text.into());
    }

    /// Overlay `other` on top of this table.
    pub fn merge(&mut self, other: &StatusTable) {
        for (code, text) in &other.entries {
            self.entries.insert(*code, text.clone());
        }
    }

    /// Number of entries.
    pub fn len(&self) -> usize {
        self.entries.len()
    }

    /// Whether the table has no entries.
    pub fn is_empty(&self) -> bool {
        self.entries.is_empty()
    }
}

impl FromIterator<(i16, String)> for StatusTable {
    fn from_iter<I: IntoIterator<Item = (i16, String)>>(iter: I) -> Self {
        Self {
            entries: iter.into_iter().collect(),
        }
    }
}

impl TryFrom<BTreeMap<String, String>> for StatusTable {
    type Error = String;

    fn try_from(raw: BTreeMap<String, String>) -> Result<Self, Self::Error> {
        raw.into_iter()
            .map(|(code, text)| {
                code.trim()
                    .parse::<i16>()
                    .map(|code| (code, text))
                    .map_err(|e| format!("status code '{}' is not a 16-bit integer: {}", code, e))
            })
            .collect()
    }
}

impl From<StatusTable> for BTreeMap<String, String> {
    fn from(table: StatusTable) -> Self {
        table
            .entries
            .into_iter()
            .map(|(code, text)| (code.to_string(), text))
            .collect()
    }
}

impl StatusLookup for StatusTable {
    fn describe(&self, code: i16) -> Option<&str> {
        self.entries.get(&code).map(String::as_str)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_zero_is_success() {
        assert!(StatusCode(0).is_ok());
        assert_eq!(StatusCode::OK.into_result(), Ok(()));
    }

    #[test]
    fn test_nonzero_keeps_raw_code() {
        for raw in [1i16, 37, -1, i16::MAX] {
            let err = StatusCode(raw).into_result().unwrap_err();
            assert_eq!(err.code(), raw);
        }
    }

    #[test]
    fn test_describe_uses_caller_table() {
        let mut table = StatusTable::new();
        table.insert(37, "stage not homed");
        let err = StatusCode(37).into_result().unwrap_err();
        assert_eq!(err.describe(&table), Some("stage not homed"));
        assert_eq!(StatusCode(38).into_result().unwrap_err().describe(&table), None);
    }

    #[test]
    fn test_merge_overrides_defaults() {
        let mut table = StatusTable::kinesis_defaults();
        let before = table.len();
        let mut overrides = StatusTable::new();
        overrides.insert(2, "stage unplugged");
        overrides.insert(99, "custom");
        table.merge(&overrides);

        assert_eq!(table.len(), before + 1);
        assert_eq!(table.describe(2), Some("stage unplugged"));
        assert!(table.describe(32).is_some_and(|t| t.starts_with("TL_ALREADY_OPEN")));
    }

    #[test]
    fn test_table_from_toml() {
        let table: StatusTable = toml::from_str("37 = \"not homed\"\n").unwrap();
        assert_eq!(table.describe(37), Some("not homed"));

        let bad: Result<StatusTable, _> = toml::from_str("nope = \"x\"\n");
        assert!(bad.is_err());
    }
}
