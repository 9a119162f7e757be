//! Parameters structure for the executive

// ---------------------------------------------------------------------------
// IMPORTS
// ---------------------------------------------------------------------------

use serde::Deserialize;

// ---------------------------------------------------------------------------
// DATA STRUCTURES
// ---------------------------------------------------------------------------

/// Executable-level parameters.
#[derive(Debug, Clone, Deserialize)]
pub struct ExecParams {
    /// Target period of one control cycle.
    ///
    /// Units: seconds
    pub cycle_period_s: f64,

    /// Where to write the simulator telemetry frames (a serial device or a
    /// plain file). Empty disables telemetry output.
    pub telemetry_path: String,

    /// Directory holding the persistent preference namespaces, relative to
    /// the software root.
    pub prefs_dir: String,

    /// MAC address of the gamepad whose calibration should be loaded.
    pub gamepad_mac: [u8; 6],

    /// Body speed cap above which the LED display shows the Fast pattern.
    ///
    /// Units: meters/second
    pub fast_speed_threshold_ms: f64,
}
