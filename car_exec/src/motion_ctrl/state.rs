//! Implementations for the MotionCtrl state structure

// ---------------------------------------------------------------------------
// IMPORTS
// ---------------------------------------------------------------------------

// External
use ctrl_if::cal::GamepadCal;
use ctrl_if::frame::SimFrame;
use ctrl_if::gamepad::GamepadSnapshot;
use log::trace;
use serde::Serialize;

// Internal
use super::{animate_gcs_and_car, integrate_gcs_and_car, GeneralCtrlState, Params};
use crate::blinkers::{Blinkers, LEFT_BIT, RIGHT_BIT};
use crate::bt_activity::{BtActivity, BtConnState};
use crate::motion::Car;
use crate::sim_tm;
use util::{
    archive::{Archived, Archiver},
    bits::write_bit,
    module::State,
    params,
    session::Session,
};

// ---------------------------------------------------------------------------
// CONSTANTS
// ---------------------------------------------------------------------------

/// Bit positions of each lamp within the output pin mask. Descriptor `i` of
/// the virtual output array carries bit `i`.
pub mod lamp_bit {
    pub const STOP: u32 = 0;
    pub const REVERSING: u32 = 1;
    pub const BLINK_LEFT: u32 = 2;
    pub const BLINK_RIGHT: u32 = 3;
    pub const BT: u32 = 4;
}

// ---------------------------------------------------------------------------
// DATA STRUCTURES
// ---------------------------------------------------------------------------

/// Motion control module state
#[derive(Default)]
pub struct MotionCtrl {
    pub(crate) params: Params,

    gcs: GeneralCtrlState,
    car: Car,
    blinkers: Blinkers,
    bt_activity: BtActivity,

    pub(crate) report: StatusReport,
    arch_report: Archiver,
}

/// Input data to Motion Control.
#[derive(Clone, Copy, Debug)]
pub struct InputData {
    /// The gamepad state to animate against.
    pub snapshot: GamepadSnapshot,

    /// The calibration to map the snapshot's axes through.
    pub gamepad_cal: GamepadCal,

    /// Connection state of the gamepad link.
    pub bt_conn_state: BtConnState,

    /// Whether the snapshot is a fresh report rather than a repeat of the
    /// previous one.
    pub fresh_report: bool,
}

/// Output command from MotionCtrl for the motor and lamp drivers.
#[derive(Clone, Copy, Serialize, Debug)]
pub struct OutputData {
    /// Left wheel speed target.
    ///
    /// Units: meters/second
    pub lw_target_ms: f64,

    /// Right wheel speed target.
    ///
    /// Units: meters/second
    pub rw_target_ms: f64,

    /// Whether the motor outputs are live.
    pub enable_motors: bool,

    /// Logical lamp states, one bit per virtual output.
    pub lamp_mask: u32,

    /// The telemetry record for the host simulator.
    #[serde(skip)]
    pub sim_frame: SimFrame,
}

/// Status report for MotionCtrl processing.
#[derive(Clone, Copy, Default, Serialize, Debug)]
pub struct StatusReport {
    pub body_speed_ms: f64,
    pub body_accel_ms2: f64,
    pub lw_target_ms: f64,
    pub rw_target_ms: f64,
    pub joy_braking_state: i8,
    pub effective_braking_factor: f64,
    pub stop_lamp: bool,
    pub reversing_lamp: bool,
    pub blinker_state: u8,
    pub trim: f64,
}

// ---------------------------------------------------------------------------
// IMPLEMENTATIONS
// ---------------------------------------------------------------------------

impl Default for OutputData {
    fn default() -> Self {
        OutputData {
            lw_target_ms: 0.0,
            rw_target_ms: 0.0,
            enable_motors: false,
            lamp_mask: 0,
            sim_frame: SimFrame::default(),
        }
    }
}

impl State for MotionCtrl {
    type InitData = &'static str;
    type InitError = params::LoadError;

    type InputData = InputData;
    type OutputData = OutputData;
    type StatusReport = StatusReport;
    type ProcError = std::convert::Infallible;

    /// Initialise the MotionCtrl module.
    ///
    /// Expected init data is the path to the parameter file
    fn init(&mut self, init_data: Self::InitData, session: &Session)
        -> Result<(), Self::InitError>
    {
        // Load the parameters
        self.params = match params::load(init_data) {
            Ok(p) => p,
            Err(e) => return Err(e),
        };

        // Build the car and control state from the parameters
        self.car = Car::from_params(&self.params.car);
        self.car.init_computed_values();

        self.gcs = GeneralCtrlState {
            idm: self.params.idm,
            flags: self.params.flags,
            max_trim: self.params.max_trim,
            trim: 0.0,
            trim_vel: 0.0,
            pwm_scaler: self.params.pwm_scaler,
        };

        self.blinkers = Blinkers::new();
        self.bt_activity = BtActivity::new();

        // Create the arch folder for motion_ctrl
        let mut arch_path = session.arch_root.clone();
        arch_path.push("motion_ctrl");
        std::fs::create_dir_all(arch_path).unwrap();

        // Initialise the archivers
        self.arch_report = Archiver::from_path(
            session, "motion_ctrl/status_report.csv"
        ).unwrap();

        Ok(())
    }

    /// Perform cyclic processing of Motion Control.
    ///
    /// One call runs the animate phase against the input snapshot, then
    /// integrates every stateful controller by the measured delta time.
    /// Motion control is total: every finite input produces an output.
    fn proc(&mut self, input_data: &Self::InputData, dt_s: f64)
        -> Result<(Self::OutputData, Self::StatusReport), Self::ProcError>
    {
        let dt_ms = (dt_s * 1000.0).round() as u16;

        // ---- ANIMATE ----

        self.blinkers.input =
            ((input_data.snapshot.buttons.l1 as u8) << LEFT_BIT)
            | ((input_data.snapshot.buttons.r1 as u8) << RIGHT_BIT);
        self.blinkers.animate();

        self.bt_activity.state = input_data.bt_conn_state;
        if input_data.fresh_report {
            self.bt_activity.note_activity();
        }
        self.bt_activity.animate();

        animate_gcs_and_car(
            &mut self.gcs,
            &input_data.snapshot,
            &input_data.gamepad_cal,
            &mut self.car,
        );

        // ---- INTEGRATE ----

        self.blinkers.integrate_ms(dt_ms);
        self.bt_activity.integrate_ms(dt_ms);
        integrate_gcs_and_car(&mut self.gcs, &mut self.car, dt_s);

        // ---- OUTPUTS ----

        let sim_frame = sim_tm::build_frame(
            &input_data.snapshot,
            &self.car,
            &self.gcs,
            &self.blinkers,
        );

        let output = OutputData {
            lw_target_ms: self.car.lw_ctrl.target_speed,
            rw_target_ms: self.car.rw_ctrl.target_speed,
            enable_motors: self.gcs.flags.enable_motors,
            lamp_mask: self.lamp_mask(),
            sim_frame,
        };

        self.report = StatusReport {
            body_speed_ms: self.car.speed_ctrl.current_speed(),
            body_accel_ms2: self.car.speed_ctrl.current_accel(),
            lw_target_ms: output.lw_target_ms,
            rw_target_ms: output.rw_target_ms,
            joy_braking_state: self.car.speed_ctrl.joy_braking_state,
            effective_braking_factor: self.car.speed_ctrl.effective_braking_factor,
            stop_lamp: self.gcs.flags.stop_lamp,
            reversing_lamp: self.gcs.flags.reversing_lamp,
            blinker_state: self.blinkers.state,
            trim: self.gcs.trim,
        };

        trace!(
            "MotionCtrl output:\n    wheels: ({:.3}, {:.3}) m/s\n    lamps: {:#07b}",
            output.lw_target_ms,
            output.rw_target_ms,
            output.lamp_mask
        );

        Ok((output, self.report))
    }
}

impl Archived for MotionCtrl {
    fn write(&mut self) -> Result<(), Box<dyn std::error::Error>> {
        self.arch_report.serialise(self.report)?;

        Ok(())
    }
}

impl MotionCtrl {
    /// The car being controlled.
    pub fn car(&self) -> &Car {
        &self.car
    }

    /// The general control state.
    pub fn gcs(&self) -> &GeneralCtrlState {
        &self.gcs
    }

    /// Assemble the logical lamp bitmask for the virtual output layer.
    fn lamp_mask(&self) -> u32 {
        let blink_lit = self.blinkers.lit();
        let left_lamp = blink_lit && (self.blinkers.state & (1 << LEFT_BIT)) != 0;
        let right_lamp = blink_lit && (self.blinkers.state & (1 << RIGHT_BIT)) != 0;

        let mut mask = 0;
        mask = write_bit(mask, lamp_bit::STOP, self.gcs.flags.stop_lamp);
        mask = write_bit(mask, lamp_bit::REVERSING, self.gcs.flags.reversing_lamp);
        mask = write_bit(mask, lamp_bit::BLINK_LEFT, left_lamp);
        mask = write_bit(mask, lamp_bit::BLINK_RIGHT, right_lamp);
        mask = write_bit(mask, lamp_bit::BT, self.bt_activity.lamp_state);
        mask
    }
}

// ---------------------------------------------------------------------------
// TESTS
// ---------------------------------------------------------------------------

#[cfg(test)]
mod test {
    use super::*;

    fn test_input() -> InputData {
        InputData {
            snapshot: GamepadSnapshot::centred(),
            gamepad_cal: GamepadCal::default(),
            bt_conn_state: BtConnState::Connected,
            fresh_report: false,
        }
    }

    /// Build a module as if initialised, but with no session so there is
    /// nothing to archive. The lateral envelope is kept gentle so the body
    /// speed cap stays close to the wheel speed cap.
    fn test_module() -> MotionCtrl {
        let mut ctrl = MotionCtrl::default();
        ctrl.params.car.turn_caps.max_lat_accel = 0.02;
        ctrl.car = Car::from_params(&ctrl.params.car);
        ctrl.car.init_computed_values();
        ctrl.gcs.flags.soften_speed = true;
        ctrl
    }

    #[test]
    fn test_idle_cycle_outputs_zero() {
        let mut ctrl = test_module();
        let input = test_input();

        let mut output = OutputData::default();
        for _ in 0..10 {
            let (o, _) = ctrl.proc(&input, 0.02).unwrap();
            output = o;
        }

        assert!(output.lw_target_ms.abs() < 1e-9);
        assert!(output.rw_target_ms.abs() < 1e-9);
        assert_eq!(output.sim_frame.as_str(), "AAAAAAAA");

        // Idle and connected: only the BT lamp is lit
        assert_eq!(output.lamp_mask, 1 << lamp_bit::BT);
    }

    #[test]
    fn test_indicator_press_lights_lamp() {
        let mut ctrl = test_module();
        let mut input = test_input();
        input.snapshot.buttons.l1 = true;

        let (output, report) = ctrl.proc(&input, 0.02).unwrap();

        assert_eq!(report.blinker_state, 0b10);
        assert_ne!(output.lamp_mask & (1 << lamp_bit::BLINK_LEFT), 0);
        assert_eq!(output.lamp_mask & (1 << lamp_bit::BLINK_RIGHT), 0);
    }

    #[test]
    fn test_drive_cycle_reports_speed() {
        let mut ctrl = test_module();
        let mut input = test_input();
        input.snapshot.lefty = 0; // full stick up

        let mut report = StatusReport::default();
        for _ in 0..100 {
            let (_, r) = ctrl.proc(&input, 0.02).unwrap();
            report = r;
        }

        assert!(report.body_speed_ms > 0.9);
        assert!((report.lw_target_ms - report.rw_target_ms).abs() < 1e-9);
        assert!(!report.reversing_lamp);
    }
}
