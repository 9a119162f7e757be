//! Module interfaces
//!
//! Each cyclic module in `car_exec` shall implement the `State` trait:
//! typed initialisation against the session, then one `proc` call per
//! control cycle.
//!
//! A cycle first animates the module against its inputs (retargeting any
//! in-flight trajectories), then integrates those trajectories by the
//! wall-clock time measured since the previous cycle. `proc` therefore
//! receives the measured delta explicitly and shall consume each one
//! exactly once; animating without advancing time is expressed by a zero
//! delta.

// ---------------------------------------------------------------------------
// IMPORTS
// ---------------------------------------------------------------------------

// Internal imports
use crate::session::Session;

// ---------------------------------------------------------------------------
// MODULE STATE
// ---------------------------------------------------------------------------

/// The module's internal state.
pub trait State {
    /// Data required during initialisation
    type InitData;
    /// An error which can occur during initialisation.
    type InitError;

    /// Data required for cyclic processing.
    type InputData;
    /// Data produced by cyclic processing.
    type OutputData;
    /// A report on the status of the cyclic processing, recorded in the
    /// session archive.
    type StatusReport;
    /// An error which can occur during cyclic processing.
    type ProcError;

    /// Initialise the module at boot.
    ///
    /// # Inputs
    /// - `init_data`: The input data required by the module (typically the
    ///   path to its parameter file).
    /// - `session`: The session, available for creating archives.
    ///
    /// # Outputs
    /// - On success `Ok(())`.
    /// - On error an `InitError` instance.
    fn init(&mut self, init_data: Self::InitData, session: &Session)
        -> Result<(), Self::InitError>;

    /// Run one control cycle.
    ///
    /// # Inputs
    /// - `input_data`: The data required for processing by the module.
    /// - `dt_s`: The measured wall-clock time in seconds since the
    ///   previous cycle's integration. Non-negative, consumed exactly
    ///   once.
    ///
    /// # Outputs
    /// - On success a tuple of the output data and status report.
    /// - On error a `ProcError` instance.
    fn proc(&mut self, input_data: &Self::InputData, dt_s: f64)
        -> Result<(Self::OutputData, Self::StatusReport), Self::ProcError>;
}
