//! # ArtCar input script interpreter module
//!
//! This module provides an interpreter for recorded gamepad input scripts,
//! allowing the control core to be driven without a live gamepad. A script
//! is a sequence of `time: {json snapshot};` lines, each giving the time in
//! seconds at which the snapshot becomes the current gamepad state.

// ---------------------------------------------------------------------------
// IMPORTS
// ---------------------------------------------------------------------------

// External
use regex::RegexBuilder;
use std::collections::VecDeque;
use std::fs;
use std::path::{Path, PathBuf};
use thiserror::Error;

// Internal
use crate::session::get_elapsed_seconds;
use ctrl_if::gamepad::{GamepadSnapshot, SnapshotParseError};

// ---------------------------------------------------------------------------
// DATA STRUCTURES
// ---------------------------------------------------------------------------

/// A snapshot which is scripted to apply from a specific time.
pub struct Command {
    /// The time the snapshot is supposed to apply from
    exec_time_s: f64,

    /// The gamepad snapshot
    snapshot: GamepadSnapshot,
}

/// A script interpreter.
///
/// After initialising with the path to the script to run use
/// `.get_pending_snapshots` to acquire the snapshots which have become
/// current since the last call.
pub struct ScriptInterpreter {
    _script_path: PathBuf,
    cmds: VecDeque<Command>,
}

// ---------------------------------------------------------------------------
// ENUMERATIONS
// ---------------------------------------------------------------------------

#[derive(Debug, Error)]
pub enum ScriptError {
    #[error("Could not find the script at {0}")]
    ScriptNotFound(String),

    #[error("Could not load the script: {0}")]
    ScriptLoadError(std::io::Error),

    #[error("The script is empty (or is so bad it can't be read)")]
    ScriptEmpty,

    #[error(
        "Script contains an invalid timestamp: {0}. \
        Should be a float (like 1.0)")]
    InvalidTimestamp(String),

    #[error("Script contains an invalid snapshot at {0} s: {1}")]
    InvalidSnapshot(f64, SnapshotParseError),
}

pub enum PendingSnapshots {
    None,
    Some(Vec<GamepadSnapshot>),
    EndOfScript,
}

// ---------------------------------------------------------------------------
// IMPLEMENTATIONS
// ---------------------------------------------------------------------------

impl ScriptInterpreter {

    /// Create a new interpreter from the given script path.
    pub fn new<P: AsRef<Path>>(script_path: P) -> Result<Self, ScriptError> {

        // Get the path in a buffer
        let path = PathBuf::from(script_path.as_ref());

        // Check that the script file exists.
        if !path.exists() {
            return Err(
                ScriptError::ScriptNotFound(path.to_str().unwrap().to_string()));
        }

        // Load the script into a string
        let script = match fs::read_to_string(script_path) {
            Ok(s) => s,
            Err(e) => return Err(ScriptError::ScriptLoadError(e)),
        };

        // Empty queue of commands
        let mut cmd_queue: VecDeque<Command> = VecDeque::new();

        // Go through the script executing __the magic regex__.
        let re = RegexBuilder::
            new(r"^\s*(\d+(\.\d+)?)\s*:\s*([^;]*);")
            .multi_line(true)
            .build()
            .unwrap();

        let mut num_caps = 0;

        for cap in re.captures_iter(&script) {
            // Parse the exec time
            let exec_time_s: f64 = match cap.get(1).unwrap().as_str().parse() {
                Ok(t) => t,
                Err(e) => return Err(
                    ScriptError::InvalidTimestamp(format!("{}", e))),
            };

            // Parse the snapshot from the payload. The scripts contain JSON
            // only.
            let snapshot = match GamepadSnapshot::from_json(
                cap.get(3).unwrap().as_str())
            {
                Ok(s) => s,
                Err(e) => return Err(ScriptError::InvalidSnapshot(
                    exec_time_s, e
                )),
            };

            // Build command from the match
            cmd_queue.push_back(Command {
                exec_time_s,
                snapshot,
            });

            num_caps += 1;
        }

        if num_caps == 0 {
            return Err(ScriptError::ScriptEmpty)
        }

        Ok(ScriptInterpreter {
            _script_path: path,
            cmds: cmd_queue,
        })
    }

    /// Return a vector of pending snapshots, or `None` if no snapshot became
    /// current since the last call. The last element of the vector is the
    /// most recent snapshot.
    pub fn get_pending_snapshots(&mut self) -> PendingSnapshots {

        // If the queue is empty the script is over and we return the end of
        // script variant
        if self.cmds.len() == 0 {
            return PendingSnapshots::EndOfScript
        }

        let mut snap_vec: Vec<GamepadSnapshot> = vec![];

        let current_time_s = get_elapsed_seconds();

        // Peek items from the queue, if the head's exec time is lower than
        // the current time add it to the vector, and keep adding snapshots
        // until the exec times are larger than the current time.
        while
            self.cmds.len() > 0
            &&
            self.cmds.front().unwrap().exec_time_s < current_time_s
        {
            snap_vec.push(self.cmds.pop_front().unwrap().snapshot);
        }

        // If the vector is longer than 0 return Some, otherwise None
        if snap_vec.len() > 0 {
            PendingSnapshots::Some(snap_vec)
        }
        else {
            PendingSnapshots::None
        }
    }

    /// Get the number of snapshots in the script
    pub fn get_num_snapshots(&self) -> usize {
        self.cmds.len()
    }

    /// Get the length of the script in seconds
    pub fn get_duration(&self) -> f64 {
        match self.cmds.back() {
            Some(c) => c.exec_time_s,
            None => 0f64,
        }
    }
}
