//! Typed entry points of `Thorlabs.MotionControl.KCube.DCServo.dll`.
//!
//! The whole table is resolved once, when the library is loaded. A DLL that is
//! missing any of the symbols below is rejected at load time rather than
//! failing on first use.
//!
//! The SAFEARRAY-based listings (`TLI_GetDeviceList`, `TLI_GetDeviceListByType`,
//! `TLI_GetDeviceListByTypes`) are not part of the table. They hand back a COM
//! `SAFEARRAY**`; the `…Ext` variants return the same serial numbers in a plain
//! character buffer and are used instead.

use std::ffi::OsStr;
use std::ops::Deref;
use std::os::raw::{c_char, c_double, c_int, c_short};

use libloading::Library;
use thiserror::Error;

use crate::abi::*;

/// Failure to load the vendor library or resolve one of its symbols.
#[derive(Error, Debug)]
pub enum LoadError {
    /// The shared library itself could not be opened.
    #[error("Failed to load library: {0}")]
    Library(#[source] libloading::Error),

    /// The library was opened but does not export a required entry point.
    #[error("Library does not export '{symbol}': {source}")]
    MissingSymbol {
        symbol: &'static str,
        #[source]
        source: libloading::Error,
    },
}

macro_rules! kinesis_functions {
    (
        $(
            $(#[$meta:meta])*
            fn $name:ident($($arg:ident: $ty:ty),* $(,)?) $(-> $ret:ty)?;
        )*
    ) => {
        /// Function pointers for every bound vendor entry point.
        ///
        /// Field names are the exported symbol names.
        #[derive(Clone, Copy)]
        pub struct KCubeDcServoFns {
            $(
                $(#[$meta])*
                pub $name: unsafe extern "C" fn($($arg: $ty),*) $(-> $ret)?,
            )*
        }

        impl KCubeDcServoFns {
            /// Names of all symbols resolved at load time.
            pub const SYMBOLS: &'static [&'static str] = &[$(stringify!($name)),*];

            /// Resolve every symbol from an opened library.
            ///
            /// # Safety
            ///
            /// The declared signatures must match the library's exports. The
            /// returned pointers dangle once `library` is unloaded.
            unsafe fn resolve(library: &Library) -> Result<Self, LoadError> {
                Ok(Self {
                    $(
                        $name: *library
                            .get::<unsafe extern "C" fn($($ty),*) $(-> $ret)?>(
                                concat!(stringify!($name), "\0").as_bytes(),
                            )
                            .map_err(|source| LoadError::MissingSymbol {
                                symbol: stringify!($name),
                                source,
                            })?,
                    )*
                })
            }
        }
    };
}

kinesis_functions! {
    // Device list
    fn TLI_BuildDeviceList() -> c_short;
    fn TLI_GetDeviceListSize() -> c_short;
    fn TLI_GetDeviceListExt(receive_buffer: *mut c_char, size_of_buffer: DWORD) -> c_short;
    fn TLI_GetDeviceListByTypeExt(
        receive_buffer: *mut c_char,
        size_of_buffer: DWORD,
        type_id: c_int,
    ) -> c_short;
    fn TLI_GetDeviceListByTypesExt(
        receive_buffer: *mut c_char,
        size_of_buffer: DWORD,
        type_ids: *mut c_int,
        length: c_int,
    ) -> c_short;
    fn TLI_GetDeviceInfo(serial_no: *const c_char, info: *mut TLI_DeviceInfo) -> c_short;

    // Connection
    fn CC_Open(serial_no: *const c_char) -> c_short;
    fn CC_Close(serial_no: *const c_char) -> c_short;
    fn CC_Identify(serial_no: *const c_char);
    fn CC_ClearMessageQueue(serial_no: *const c_char);

    // Motion
    fn CC_CanHome(serial_no: *const c_char) -> bool;
    fn CC_Home(serial_no: *const c_char) -> c_short;
    fn CC_MoveToPosition(serial_no: *const c_char, index: c_int) -> c_short;
    fn CC_MoveRelative(serial_no: *const c_char, displacement: c_int) -> c_short;
    fn CC_StopProfiled(serial_no: *const c_char) -> c_short;
    fn CC_StopImmediate(serial_no: *const c_char) -> c_short;
    fn CC_RequestPosition(serial_no: *const c_char) -> c_short;
    fn CC_GetPosition(serial_no: *const c_char) -> c_int;

    // Velocity
    fn CC_GetVelParams(
        serial_no: *const c_char,
        acceleration: *mut c_int,
        max_velocity: *mut c_int,
    ) -> c_short;
    fn CC_SetVelParams(serial_no: *const c_char, acceleration: c_int, max_velocity: c_int) -> c_short;
    fn CC_GetVelParamsBlock(serial_no: *const c_char, params: *mut MOT_VelocityParameters) -> c_short;
    fn CC_SetVelParamsBlock(serial_no: *const c_char, params: *mut MOT_VelocityParameters) -> c_short;

    // Parameter blocks
    fn CC_GetJogParamsBlock(serial_no: *const c_char, params: *mut MOT_JogParameters) -> c_short;
    fn CC_SetJogParamsBlock(serial_no: *const c_char, params: *mut MOT_JogParameters) -> c_short;
    fn CC_GetHomingParamsBlock(serial_no: *const c_char, params: *mut MOT_HomingParameters) -> c_short;
    fn CC_SetHomingParamsBlock(serial_no: *const c_char, params: *mut MOT_HomingParameters) -> c_short;
    fn CC_GetLimitSwitchParamsBlock(
        serial_no: *const c_char,
        params: *mut MOT_LimitSwitchParameters,
    ) -> c_short;
    fn CC_SetLimitSwitchParamsBlock(
        serial_no: *const c_char,
        params: *mut MOT_LimitSwitchParameters,
    ) -> c_short;
    fn CC_GetDCPIDParams(serial_no: *const c_char, params: *mut MOT_DC_PIDParameters) -> c_short;
    fn CC_SetDCPIDParams(serial_no: *const c_char, params: *mut MOT_DC_PIDParameters) -> c_short;
    fn CC_GetMMIParamsBlock(serial_no: *const c_char, params: *mut KMOT_MMIParams) -> c_short;
    fn CC_SetMMIParamsBlock(serial_no: *const c_char, params: *mut KMOT_MMIParams) -> c_short;
    fn CC_GetTriggerConfigParamsBlock(
        serial_no: *const c_char,
        params: *mut KMOT_TriggerConfig,
    ) -> c_short;
    fn CC_SetTriggerConfigParamsBlock(
        serial_no: *const c_char,
        params: *mut KMOT_TriggerConfig,
    ) -> c_short;
    fn CC_GetTriggerParamsParamsBlock(
        serial_no: *const c_char,
        params: *mut KMOT_TriggerParams,
    ) -> c_short;
    fn CC_SetTriggerParamsParamsBlock(
        serial_no: *const c_char,
        params: *mut KMOT_TriggerParams,
    ) -> c_short;

    fn CC_GetHardwareInfoBlock(
        serial_no: *const c_char,
        hardware_info: *mut TLI_HardwareInformation,
    ) -> c_short;

    // Stage description, real units
    fn CC_GetMotorParamsExt(
        serial_no: *const c_char,
        steps_per_rev: *mut c_double,
        gear_box_ratio: *mut c_double,
        pitch: *mut c_double,
    ) -> c_short;
    fn CC_SetMotorParamsExt(
        serial_no: *const c_char,
        steps_per_rev: c_double,
        gear_box_ratio: c_double,
        pitch: c_double,
    ) -> c_short;
    fn CC_GetMotorVelocityLimits(
        serial_no: *const c_char,
        max_velocity: *mut c_double,
        max_acceleration: *mut c_double,
    ) -> c_short;
    fn CC_SetMotorVelocityLimits(
        serial_no: *const c_char,
        max_velocity: c_double,
        max_acceleration: c_double,
    ) -> c_short;
    fn CC_GetMotorTravelMode(serial_no: *const c_char) -> MOT_TravelModes;
    fn CC_SetMotorTravelMode(serial_no: *const c_char, travel_mode: MOT_TravelModes) -> c_short;
    fn CC_GetMotorTravelLimits(
        serial_no: *const c_char,
        min_position: *mut c_double,
        max_position: *mut c_double,
    ) -> c_short;
    fn CC_SetMotorTravelLimits(
        serial_no: *const c_char,
        min_position: c_double,
        max_position: c_double,
    ) -> c_short;

    // Unit conversion, computed inside the DLL
    fn CC_GetRealValueFromDeviceUnit(
        serial_no: *const c_char,
        device_unit: c_int,
        real_unit: *mut c_double,
        unit_type: UNIT_TYPE,
    ) -> c_short;
    fn CC_GetDeviceUnitFromRealValue(
        serial_no: *const c_char,
        real_unit: c_double,
        device_unit: *mut c_int,
        unit_type: UNIT_TYPE,
    ) -> c_short;

    // Settings persistence
    fn CC_RequestSettings(serial_no: *const c_char) -> c_short;
    fn CC_ResetStageToDefaults(serial_no: *const c_char) -> c_short;
    fn CC_LoadSettings(serial_no: *const c_char) -> bool;
    fn CC_PersistSettings(serial_no: *const c_char) -> bool;
}

/// The loaded vendor library together with its resolved entry points.
///
/// Dereferences to [`KCubeDcServoFns`], so entry points are called as
/// `(library.CC_Open)(serial)`.
pub struct KCubeDcServoLibrary {
    fns: KCubeDcServoFns,
    // Keeps the code behind `fns` mapped. Dropped after `fns` by declaration order.
    _library: Option<Library>,
}

impl KCubeDcServoLibrary {
    /// File name of the vendor library as installed by Kinesis.
    pub const DEFAULT_NAME: &'static str = "Thorlabs.MotionControl.KCube.DCServo.dll";

    /// Load the vendor library and resolve the full entry point table.
    ///
    /// # Safety
    ///
    /// Loading runs the library's initialisation routines, and the bound
    /// signatures are trusted to match the library's actual exports.
    pub unsafe fn load<P: AsRef<OsStr>>(path: P) -> Result<Self, LoadError> {
        let library = Library::new(path).map_err(LoadError::Library)?;
        let fns = KCubeDcServoFns::resolve(&library)?;
        Ok(Self {
            fns,
            _library: Some(library),
        })
    }

    /// Build a table from function pointers that live for the whole process,
    /// such as functions compiled into the current binary.
    pub fn from_fns(fns: KCubeDcServoFns) -> Self {
        Self {
            fns,
            _library: None,
        }
    }

    /// Whether this table was resolved from a dynamically loaded library.
    pub fn is_dynamic(&self) -> bool {
        self._library.is_some()
    }

    /// Access the entry point table.
    pub fn fns(&self) -> &KCubeDcServoFns {
        &self.fns
    }
}

impl Deref for KCubeDcServoLibrary {
    type Target = KCubeDcServoFns;

    fn deref(&self) -> &Self::Target {
        &self.fns
    }
}

impl std::fmt::Debug for KCubeDcServoLibrary {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("KCubeDcServoLibrary")
            .field("dynamic", &self.is_dynamic())
            .field("symbols", &KCubeDcServoFns::SYMBOLS.len())
            .finish()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_symbol_table_names() {
        let symbols = KCubeDcServoFns::SYMBOLS;
        assert!(symbols.contains(&"TLI_BuildDeviceList"));
        assert!(symbols.contains(&"CC_GetDeviceUnitFromRealValue"));
        assert!(symbols.contains(&"CC_PersistSettings"));
        assert!(!symbols.iter().any(|s| *s == "TLI_GetDeviceList"));

        let mut unique = symbols.to_vec();
        unique.sort_unstable();
        unique.dedup();
        assert_eq!(unique.len(), symbols.len());
    }

    #[test]
    fn test_load_missing_library_fails() {
        let err = unsafe { KCubeDcServoLibrary::load("definitely-not-a-kinesis-library.dll") }
            .expect_err("loading a missing library must fail");
        assert!(matches!(err, LoadError::Library(_)));
        assert!(err.to_string().starts_with("Failed to load library"));
    }
}
