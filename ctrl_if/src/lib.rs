//! # Control interface library
//!
//! This crate defines the data types exchanged between the ArtCar control
//! core and its external collaborators: the gamepad driver, the calibration
//! store and the host car simulator. The executables depend on these types
//! but never on each other.

// ---------------------------------------------------------------------------
// MODULES
// ---------------------------------------------------------------------------

pub mod cal;
pub mod frame;
pub mod gamepad;

// ---------------------------------------------------------------------------
// RE-EXPORTS
// ---------------------------------------------------------------------------

pub use cal::{AxisCal, CalSlot, GamepadCal};
pub use frame::SimFrame;
pub use gamepad::{Buttons, GamepadSnapshot};
