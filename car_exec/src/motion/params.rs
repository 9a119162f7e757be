//! Parameters structure for the car's motion pipeline

// ---------------------------------------------------------------------------
// IMPORTS
// ---------------------------------------------------------------------------

use super::{MotorAccLimits, TurnCaps};
use serde::Deserialize;

// ---------------------------------------------------------------------------
// DATA STRUCTURES
// ---------------------------------------------------------------------------

/// Parameters for the car aggregate.
#[derive(Debug, Clone, Deserialize)]
pub struct CarParams {
    // ---- GEOMETRY ----
    /// The distance between the two wheels.
    ///
    /// Units: meters
    pub axle_width_m: f64,

    // ---- CAPABILITIES ----
    /// Largest speed a single wheel may be commanded to.
    ///
    /// Units: meters/second
    pub max_wheel_speed_ms: f64,

    /// Largest speed the body may be commanded to, before reduction by the
    /// turning envelope.
    ///
    /// Units: meters/second
    pub max_body_speed_ms: f64,

    /// The turning capability envelope.
    pub turn_caps: TurnCaps,

    // ---- CONTROL FACTORS ----
    /// Fraction of the full speed range commanded by a D-pad jog.
    pub jog_factor: f64,

    /// Fraction of the full turn range commanded by a D-pad jog.
    pub turn_jog_factor: f64,

    /// Rate cap of the turn-softening controller.
    ///
    /// Units: 1/second (stick deflection per second)
    pub turn_soften_rate: f64,

    /// Acceleration cap of the turn-softening controller.
    ///
    /// Units: 1/second^2
    pub turn_soften_accel: f64,

    /// Fraction of the throttle lever swing injected per cycle when
    /// throttle softening is enabled. In (0, 1].
    pub throttle_factor: f64,

    /// Speed below which joy-braking disengages.
    ///
    /// Units: meters/second
    pub joy_brake_speed_threshold_ms: f64,

    // ---- MOTOR LIMITS ----
    /// Limits applied to each wheel controller.
    pub wheel_mal: MotorAccLimits,

    /// Body limits while cruising.
    pub cruise_mal: MotorAccLimits,

    /// Body limits under full braking.
    pub braking_mal: MotorAccLimits,
}
