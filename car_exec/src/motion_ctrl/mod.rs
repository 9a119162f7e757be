//! Motion control module
//!
//! The cyclic heart of the executive: each `proc` call reads one gamepad
//! snapshot, animates the blinkers, the general control state and the car,
//! integrates everything by the measured delta time and emits the wheel
//! targets, lamp mask and simulator telemetry frame.

// ---------------------------------------------------------------------------
// MODULES
// ---------------------------------------------------------------------------

mod animate;
mod gc_state;
mod params;
mod state;

// ---------------------------------------------------------------------------
// IMPORTS
// ---------------------------------------------------------------------------

// Internal
pub use animate::*;
pub use gc_state::*;
pub use params::*;
pub use state::*;
