//! # Data Store

// ---------------------------------------------------------------------------
// IMPORTS
// ---------------------------------------------------------------------------

use ctrl_if::cal::GamepadCal;
use ctrl_if::gamepad::GamepadSnapshot;

use crate::bt_activity::BtConnState;
use crate::led_pats::LedPatDisplay;
use crate::motion_ctrl;

// ---------------------------------------------------------------------------
// DATA STRUCTURES
// ---------------------------------------------------------------------------

/// Global data store for the executable.
pub struct DataStore {
    // Cycle management
    /// Number of cycles already executed
    pub num_cycles: u128,

    /// True if this cycle falls on a 1Hz boundary
    pub is_1_hz_cycle: bool,

    /// Elapsed session time at the start of the cycle
    pub sim_time_s: f64,

    // Gamepad
    /// The gamepad state in force this cycle
    pub gamepad_snapshot: GamepadSnapshot,

    /// Calibration for the connected gamepad
    pub gamepad_cal: GamepadCal,

    /// Connection state of the gamepad link
    pub bt_conn_state: BtConnState,

    // MotionCtrl
    pub motion_ctrl: motion_ctrl::MotionCtrl,
    pub motion_ctrl_output: motion_ctrl::OutputData,
    pub motion_ctrl_status_rpt: motion_ctrl::StatusReport,

    // Gamepad LED display
    pub led_display: LedPatDisplay,

    // Monitoring Counters
    /// Number of consecutive cycle overruns
    pub num_consec_cycle_overruns: u64,
}

// ---------------------------------------------------------------------------
// IMPLS
// ---------------------------------------------------------------------------

impl Default for DataStore {
    fn default() -> Self {
        Self {
            num_cycles: 0,
            is_1_hz_cycle: false,
            sim_time_s: 0.0,
            gamepad_snapshot: GamepadSnapshot::centred(),
            gamepad_cal: GamepadCal::default(),
            bt_conn_state: BtConnState::Off,
            motion_ctrl: motion_ctrl::MotionCtrl::default(),
            motion_ctrl_output: motion_ctrl::OutputData::default(),
            motion_ctrl_status_rpt: motion_ctrl::StatusReport::default(),
            led_display: LedPatDisplay::default(),
            num_consec_cycle_overruns: 0,
        }
    }
}

impl DataStore {
    /// Perform actions required at the start of a cycle.
    ///
    /// Clears those items that need clearing at the start of a cycle, and
    /// sets the 1Hz cycle flag.
    pub fn cycle_start(&mut self, cycle_frequency_hz: f64) {
        self.is_1_hz_cycle = self.num_cycles % (cycle_frequency_hz as u128) == 0;

        self.motion_ctrl_output = motion_ctrl::OutputData::default();
        self.motion_ctrl_status_rpt = motion_ctrl::StatusReport::default();

        self.sim_time_s = util::session::get_elapsed_seconds();
    }
}
