//! Main car-side executable entry point.
//!
//! # Architecture
//!
//! The general execution methodology consists of:
//!
//!     - Initialise all modules
//!     - Main loop:
//!         - Gamepad input acquisition (live replay script or idle pad)
//!         - Optional calibration learning
//!         - Motion control processing (animate then integrate)
//!         - Virtual output fan-out to the lamp pins
//!         - Telemetry output to the host simulator
//!
//! # Modules
//!
//! All cyclic modules (e.g. `motion_ctrl`) shall meet the following
//! requirements:
//!     1. Provide a public struct implementing the `util::module::State`
//!        trait.

// ---------------------------------------------------------------------------
// USE MODULES FROM LIBRARY
// ---------------------------------------------------------------------------

use car_lib::{
    bt_activity::BtConnState,
    cal_store::{JoyCalKeeper, PrefsStore, CAL_NAMESPACE},
    data_store::DataStore,
    joy_cal::GamepadCalibrator,
    motion_ctrl,
    params::ExecParams,
    virtual_io::{config_pins, write_pins, LogBackend, CAR_VO_PINS},
};
use ctrl_if::cal::CalSlot;
use ctrl_if::gamepad::GamepadSnapshot;

// ---------------------------------------------------------------------------
// IMPORTS
// ---------------------------------------------------------------------------

// External
use color_eyre::{eyre::WrapErr, Report};
use log::{debug, info, trace, warn};
use std::fs::OpenOptions;
use std::io::Write;
use std::path::PathBuf;
use std::thread;
use std::time::{Duration, Instant};
use structopt::StructOpt;

// Internal
use util::{
    host,
    logger::{logger_init, LevelFilter},
    module::State,
    script_interpreter::{PendingSnapshots, ScriptInterpreter},
    session::Session,
};
use util::archive::Archived;

// ---------------------------------------------------------------------------
// CONSTANTS
// ---------------------------------------------------------------------------

/// Assumed battery level until the gamepad driver reports one.
const BATTERY_LEVEL_PLACEHOLDER: u8 = 4;

// ---------------------------------------------------------------------------
// DATA STRUCTURES
// ---------------------------------------------------------------------------

/// Executable command line options
#[derive(Debug, StructOpt)]
#[structopt(name = "car_exec", about = "ArtCar control executive")]
struct Opt {
    /// Path to a recorded gamepad input script to replay. Without one the
    /// executive idles on a centred pad.
    #[structopt(parse(from_os_str))]
    script: Option<PathBuf>,

    /// Learn the gamepad calibration from the replayed inputs and save it
    /// at the end of the run.
    #[structopt(long)]
    calibrate: bool,
}

/// Various sources for the gamepad snapshots incoming to the exec.
enum InputSource {
    Idle,
    Script(ScriptInterpreter),
}

// ---------------------------------------------------------------------------
// FUNCTIONS
// ---------------------------------------------------------------------------

/// Executable main function, entry point.
fn main() -> Result<(), Report> {

    // ---- EARLY INITIALISATION ----

    let opt = Opt::from_args();

    // Initialise session
    let session = Session::new("car_exec")
        .wrap_err("Failed to create the session")?;

    // Initialise logger
    logger_init(LevelFilter::Trace, &session)
        .wrap_err("Failed to initialise logging")?;

    // Log information on this execution.
    info!("ArtCar Control Executable\n");
    info!("Running on: {}", host::get_uname());
    info!("Session directory: {:?}\n", session.session_root);

    // ---- LOAD PARAMETERS ----

    let exec_params: ExecParams = util::params::load(
        "exec.toml"
    ).wrap_err("Could not load exec params")?;

    info!("Exec parameters loaded");

    let cycle_period_s = exec_params.cycle_period_s;
    let cycle_frequency_hz = 1.0 / cycle_period_s;

    // ---- INITIALISE INPUT SOURCE ----

    debug!("CLI options: {:?}", opt);

    let mut input_source = match opt.script {
        Some(ref path) => {
            info!("Loading input script from {:?}", path);

            let si = ScriptInterpreter::new(path)
                .wrap_err("Failed to load input script")?;

            info!(
                "Loaded script lasts {:.02} s and contains {} snapshots\n",
                si.get_duration(),
                si.get_num_snapshots()
            );

            InputSource::Script(si)
        }
        None => {
            info!("No script provided, idling on a centred gamepad\n");
            InputSource::Idle
        }
    };

    // ---- INITIALISE DATASTORE ----

    info!("Initialising modules...");

    let mut ds = DataStore::default();

    // ---- INITIALISE MODULES ----

    ds.motion_ctrl.init("car_ctrl.toml", &session)
        .wrap_err("Failed to initialise MotionCtrl")?;
    info!("MotionCtrl init complete");

    info!("Module initialisation complete\n");

    // ---- LOAD GAMEPAD CALIBRATION ----

    let mut prefs_root = host::get_artcar_sw_root();
    prefs_root.push(&exec_params.prefs_dir);

    let mut cal_keeper = JoyCalKeeper::new(PrefsStore::new(prefs_root, CAL_NAMESPACE));
    let mut cal_slot_index = cal_keeper.find_slot_by_mac(&exec_params.gamepad_mac);

    match cal_slot_index.and_then(|i| cal_keeper.load_slot(i)) {
        Some(slot) => {
            ds.gamepad_cal = slot.gamepad_cal;
            info!(
                "Gamepad calibration loaded from slot {}",
                cal_slot_index.unwrap()
            );
        }
        None => {
            warn!(
                "No calibration stored for gamepad {:02X?}, using defaults. \
                Run with --calibrate to learn one.",
                exec_params.gamepad_mac
            );
        }
    }

    let mut calibrator = GamepadCalibrator::new();

    // ---- INITIALISE OUTPUTS ----

    let mut pin_backend = LogBackend;
    config_pins(0, &CAR_VO_PINS, &mut pin_backend);

    let mut tm_writer = if exec_params.telemetry_path.is_empty() {
        None
    } else {
        match OpenOptions::new()
            .create(true)
            .append(true)
            .open(&exec_params.telemetry_path)
        {
            Ok(f) => {
                info!("Telemetry output to {:?}", exec_params.telemetry_path);
                Some(f)
            }
            Err(e) => {
                warn!(
                    "Could not open telemetry output {:?}: {}",
                    exec_params.telemetry_path, e
                );
                None
            }
        }
    };

    // ---- MAIN LOOP ----

    info!("Begining main loop\n");

    let mut last_integrate_instant = Instant::now();

    loop {

        // Get cycle start time
        let cycle_start_instant = Instant::now();

        // Clear items that need wiping at the start of the cycle
        ds.cycle_start(cycle_frequency_hz);

        // ---- INPUT ACQUISITION ----

        let mut fresh_report = false;

        match input_source {
            InputSource::Idle => {
                ds.gamepad_snapshot = GamepadSnapshot::centred();
                ds.bt_conn_state = BtConnState::Searching;
            }
            InputSource::Script(ref mut si) => {
                ds.bt_conn_state = BtConnState::Connected;
                match si.get_pending_snapshots() {
                    PendingSnapshots::None => (),
                    PendingSnapshots::Some(snap_vec) => {
                        // The most recent snapshot wins; earlier ones were
                        // superseded within this cycle
                        if let Some(snap) = snap_vec.last() {
                            ds.gamepad_snapshot = *snap;
                            fresh_report = true;
                        }
                    }
                    // Exit if end of script reached
                    PendingSnapshots::EndOfScript => {
                        info!("End of input script reached, stopping");
                        break;
                    }
                }
            }
        }

        // ---- CALIBRATION LEARNING ----

        if opt.calibrate {
            calibrator.sample(
                &mut ds.gamepad_cal,
                &ds.gamepad_snapshot,
                cycle_period_s * 1000.0,
            );
        }

        // ---- MOTION CONTROL PROCESSING ----

        // Measure the real time since the previous integration; every
        // delta must be seen exactly once
        let dt_s = last_integrate_instant.elapsed().as_secs_f64();
        last_integrate_instant = Instant::now();

        let input_data = motion_ctrl::InputData {
            snapshot: ds.gamepad_snapshot,
            gamepad_cal: ds.gamepad_cal,
            bt_conn_state: ds.bt_conn_state,
            fresh_report,
        };

        let (output, status_rpt) = ds.motion_ctrl.proc(&input_data, dt_s)
            .wrap_err("Error during MotionCtrl processing")?;
        ds.motion_ctrl_output = output;
        ds.motion_ctrl_status_rpt = status_rpt;

        // ---- OUTPUT FAN-OUT ----

        write_pins(
            ds.motion_ctrl_output.lamp_mask,
            &CAR_VO_PINS,
            &mut pin_backend,
        );

        if let Some(ref mut writer) = tm_writer {
            match writer.write_all(ds.motion_ctrl_output.sim_frame.as_bytes()) {
                Ok(_) => (),
                Err(e) => warn!("Telemetry write error: {}", e),
            }
        }

        // ---- GAMEPAD LED DISPLAY ----

        ds.led_display.integrate_ms((cycle_period_s * 1000.0) as u16);
        if ds.is_1_hz_cycle {
            let pattern = ds.led_display.current_pattern(
                BATTERY_LEVEL_PLACEHOLDER,
                ds.motion_ctrl.gcs().idm,
                ds.motion_ctrl.car().max_body_speed > exec_params.fast_speed_threshold_ms,
            );
            trace!("Gamepad LED pattern: {:?}", pattern);
        }

        // ---- WRITE ARCHIVES ----

        match ds.motion_ctrl.write() {
            Ok(_) => (),
            Err(e) => warn!("Could not archive MotionCtrl report: {}", e),
        }

        // ---- CYCLE MANAGEMENT ----

        let cycle_dur = Instant::now() - cycle_start_instant;

        // Get sleep duration
        match Duration::from_secs_f64(cycle_period_s)
            .checked_sub(cycle_dur)
        {
            Some(d) => {
                ds.num_consec_cycle_overruns = 0;
                thread::sleep(d);
            }
            None => {
                warn!(
                    "Cycle overran by {:.06} s",
                    cycle_dur.as_secs_f64()
                        - Duration::from_secs_f64(cycle_period_s).as_secs_f64()
                );
                ds.num_consec_cycle_overruns += 1;
            }
        }

        // Increment cycle counter
        ds.num_cycles += 1;
    }

    // ---- SHUTDOWN ----

    if opt.calibrate {
        let mut slot = CalSlot {
            seq_num: 0,
            mac48: exec_params.gamepad_mac,
            gamepad_cal: ds.gamepad_cal,
        };

        match cal_keeper.save_slot(cal_slot_index, &mut slot) {
            Some(i) => {
                cal_slot_index = Some(i);
                info!("Learned calibration saved to slot {}", i);
            }
            None => warn!("Could not save the learned calibration"),
        }

        debug!("Calibration slot in use: {:?}", cal_slot_index);
    }

    info!("End of execution");

    Ok(())
}
