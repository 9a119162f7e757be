//! Session management
//!
//! A session is one run of the executive: a timestamped directory under
//! the software root holding the log file and the per-cycle archive CSVs
//! written by the cyclic modules. The session epoch anchors every
//! timestamp in the run; log lines and archive records both count seconds
//! from it, so a drive can be reconstructed by lining the two up.

// ---------------------------------------------------------------------------
// IMPORTS
// ---------------------------------------------------------------------------

// External imports
use chrono::{DateTime, Utc};
use conquer_once::OnceCell;
use std::fs;
use std::path::PathBuf;
use thiserror::Error;

// Internal imports
use crate::host;

// ---------------------------------------------------------------------------
// STATICS
// ---------------------------------------------------------------------------

static SESSION_EPOCH: OnceCell<DateTime<Utc>> = OnceCell::uninit();

// ---------------------------------------------------------------------------
// CONSTANTS
// ---------------------------------------------------------------------------

/// Directory under the software root where sessions are kept.
const SESSIONS_DIR: &str = "sessions";

/// Timestamp format used to name the session directory.
const TIMESTAMP_FORMAT: &'static str = "%Y%m%d_%H%M%S";

// ---------------------------------------------------------------------------
// DATA STRUCTURES
// ---------------------------------------------------------------------------

/// A struct storing information about the current session
pub struct Session {
    /// The root directory for this session
    pub session_root: PathBuf,

    /// The root directory for this session's archives
    pub arch_root: PathBuf,

    /// The path to the session's log file
    pub log_file_path: PathBuf,
}

// ---------------------------------------------------------------------------
// ENUMERATIONS
// ---------------------------------------------------------------------------

/// Possible errors associated with the session module.
#[derive(Error, Debug)]
pub enum SessionError {
    #[error("Cannot create the session directory {path:?}: {source}")]
    CannotCreateDir {
        path: PathBuf,
        source: std::io::Error,
    },

    #[error(
        "Cannot initialise the session epoch, has a session already been \
        started? (conquer_once error: {0})")]
    CannotInitEpoch(conquer_once::TryInitError),

    #[error("Cannot get the epoch time, did you forget to start the session?")]
    CannotGetEpoch,
}

// ---------------------------------------------------------------------------
// IMPLEMENTATIONS
// ---------------------------------------------------------------------------

impl Session {
    /// Start the session for this run of the executive.
    ///
    /// Creates `sessions/{exec_name}_{timestamp}` under the software root,
    /// along with its `arch` subdirectory for the per-cycle archives, and
    /// pins the session epoch. Only one session may be started per
    /// process.
    pub fn new(exec_name: &str) -> Result<Self, SessionError> {

        // Set the session epoch
        SESSION_EPOCH
            .try_init_once(|| Utc::now())
            .map_err(SessionError::CannotInitEpoch)?;

        // Format the session epoch as a timestamp
        let timestamp = match SESSION_EPOCH.get() {
            Some(e) => e.format(TIMESTAMP_FORMAT),
            None => return Err(SessionError::CannotGetEpoch),
        };

        // Build the session paths
        let mut session_root = host::get_artcar_sw_root();
        session_root.push(SESSIONS_DIR);
        session_root.push(format!("{}_{}", exec_name, timestamp));

        let mut arch_root = session_root.clone();
        arch_root.push("arch");

        // Creating the deepest directory creates the whole chain
        if let Err(e) = fs::create_dir_all(&arch_root) {
            return Err(SessionError::CannotCreateDir {
                path: arch_root,
                source: e,
            });
        }

        let mut log_file_path = session_root.clone();
        log_file_path.push(format!("{}.log", exec_name));

        // Build the session struct
        Ok(Session {
            session_root,
            arch_root,
            log_file_path,
        })
    }
}

// ---------------------------------------------------------------------------
// PUBLIC FUNCTIONS
// ---------------------------------------------------------------------------

/// Get the number of seconds elapsed since the session epoch.
///
/// # Panics
/// - This function will panic if no session has been started; creating a
///   Session instance pins the epoch.
pub fn get_elapsed_seconds() -> f64 {
    match SESSION_EPOCH.get() {
        Some(e) => {
            // Microsecond resolution; a control cycle is four orders of
            // magnitude longer
            match (Utc::now() - *e).num_microseconds() {
                Some(us) => us as f64 * 1e-6,
                None => std::f64::NAN,
            }
        },
        None => panic!("Cannot get the session epoch!"),
    }
}

/// Return a reference to the session's epoch.
///
/// # Panics
/// - This function will panic if no session has been started; creating a
///   Session instance pins the epoch.
pub fn get_epoch() -> &'static DateTime<Utc> {
    match SESSION_EPOCH.get() {
        Some(e) => e,
        None => panic!("Cannot get the session epoch!"),
    }
}
