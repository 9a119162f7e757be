//! Parameters structure for MotionCtrl

// ---------------------------------------------------------------------------
// IMPORTS
// ---------------------------------------------------------------------------

use super::{GcFlags, Idm};
use crate::motion::{CarParams, MotorAccLimits, TurnCaps};
use serde::Deserialize;

// ---------------------------------------------------------------------------
// DATA STRUCTURES
// ---------------------------------------------------------------------------

/// Parameters for motion control.
#[derive(Debug, Clone, Deserialize)]
pub struct Params {
    /// The input device mode to start in.
    pub idm: Idm,

    /// Initial feature flags.
    pub flags: GcFlags,

    /// Largest magnitude the steering trim may reach.
    pub max_trim: f64,

    /// Scaling applied by the PWM output stage.
    pub pwm_scaler: f64,

    /// The car's geometry, capabilities and motor limits.
    pub car: CarParams,
}

// ---------------------------------------------------------------------------
// IMPLEMENTATIONS
// ---------------------------------------------------------------------------

impl Default for Params {
    fn default() -> Self {
        Self {
            idm: Idm::Iso,
            flags: GcFlags::default(),
            max_trim: 0.5,
            pwm_scaler: 1.0,
            car: CarParams {
                axle_width_m: 1.0,
                max_wheel_speed_ms: 1.0,
                max_body_speed_ms: 1.0,
                turn_caps: TurnCaps::default(),
                jog_factor: 0.25,
                turn_jog_factor: 0.25,
                turn_soften_rate: 4.0,
                turn_soften_accel: 16.0,
                throttle_factor: 1.0,
                joy_brake_speed_threshold_ms: 0.2,
                wheel_mal: MotorAccLimits::uniform(2.0, 50.0),
                cruise_mal: MotorAccLimits::uniform(1.0, 50.0),
                braking_mal: MotorAccLimits::uniform(4.0, 200.0),
            },
        }
    }
}
