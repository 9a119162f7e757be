//! Motion pipeline module
//!
//! This module contains the layered speed controllers which turn operator
//! demands into kinematically-feasible wheel speed targets:
//!
//! - [`QPosCtrl`] produces piecewise-quadratic one-dimensional trajectories
//! - [`SpeedCtrl`] reinterprets a position controller as a speed controller
//! - [`CarSpeedCtrl`] adds throttle easing and braking behaviour
//! - [`TurnCaps`] couples forward speed to the permissible yaw rate
//! - [`Car`] aggregates one body-speed controller and two wheel controllers

// ---------------------------------------------------------------------------
// MODULES
// ---------------------------------------------------------------------------

mod acc_limits;
mod car;
mod car_speed_ctrl;
mod params;
mod qpos_ctrl;
mod speed_ctrl;
mod turn_caps;

// ---------------------------------------------------------------------------
// IMPORTS
// ---------------------------------------------------------------------------

// Internal
pub use acc_limits::*;
pub use car::*;
pub use car_speed_ctrl::*;
pub use params::*;
pub use qpos_ctrl::*;
pub use speed_ctrl::*;
pub use turn_caps::*;
