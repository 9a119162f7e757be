//! General control state

// ---------------------------------------------------------------------------
// IMPORTS
// ---------------------------------------------------------------------------

// External
use serde::{Deserialize, Serialize};

// ---------------------------------------------------------------------------
// DATA STRUCTURES
// ---------------------------------------------------------------------------

/// Feature and lamp flags of the general control state.
#[derive(Clone, Copy, Default, Debug, Serialize, Deserialize)]
pub struct GcFlags {
    /// Triggers scale the stick instead of braking.
    #[serde(default)]
    pub use_alt_ctrl_method: bool,

    /// Stick-to-turn-centre convention when reversing.
    #[serde(default)]
    pub reverse_turns: bool,

    /// Cap the yaw rate by the lateral-acceleration envelope.
    #[serde(default)]
    pub limit_turn_rate: bool,

    /// Treat a hard opposite-direction stick as a brake.
    #[serde(default)]
    pub enable_joy_brake: bool,

    /// Route the stick through the body speed controller.
    #[serde(default)]
    pub soften_speed: bool,

    /// Route the stick through the turn-softening controller.
    #[serde(default)]
    pub soften_turns: bool,

    /// Ease the throttle lever by the throttle factor.
    #[serde(default)]
    pub soften_throttle: bool,

    /// Wheels snap to their targets instead of integrating.
    #[serde(default)]
    pub motors_are_magic: bool,

    /// The operator is adjusting trim with the triggers.
    #[serde(skip_deserializing, default)]
    pub trimming: bool,

    /// Trim is being driven back to zero.
    #[serde(skip_deserializing, default)]
    pub zeroing_trim: bool,

    /// The stop lamp is illuminated.
    #[serde(skip_deserializing, default)]
    pub stop_lamp: bool,

    /// The reversing lamp is illuminated.
    #[serde(skip_deserializing, default)]
    pub reversing_lamp: bool,

    /// Motor outputs are live.
    #[serde(default)]
    pub enable_motors: bool,
}

/// Input device mode: how the joystick axes map to the turn and speed
/// control variables.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Serialize, Deserialize)]
pub enum Idm {
    /// Single stick: left stick x turns, left stick y drives.
    #[serde(alias = "iso")]
    Iso,

    /// Split axes: right stick x turns, left stick y drives.
    #[serde(alias = "vh")]
    Vh,

    /// Moderated H-pattern: each stick's y drives one side, mixed through
    /// the speed and turn controllers.
    #[serde(alias = "mod_hpat")]
    ModHPat,

    /// Raw H-pattern: each stick's y drives one side's wheel directly.
    #[serde(alias = "hpat")]
    HPat,
}

/// The general control state.
#[derive(Clone, Copy, Debug)]
pub struct GeneralCtrlState {
    /// The input device mode in force.
    pub idm: Idm,

    pub flags: GcFlags,

    /// Largest magnitude the steering trim may reach.
    pub max_trim: f64,

    /// Steering trim offset, consumed by the motor output stage.
    pub trim: f64,

    /// Rate of change of trim, driven by the triggers while trimming.
    pub trim_vel: f64,

    /// Scaling applied by the PWM output stage.
    pub pwm_scaler: f64,
}

// ---------------------------------------------------------------------------
// IMPLEMENTATIONS
// ---------------------------------------------------------------------------

impl Default for GeneralCtrlState {
    fn default() -> Self {
        Self {
            idm: Idm::Iso,
            flags: GcFlags::default(),
            max_trim: 0.5,
            trim: 0.0,
            trim_vel: 0.0,
            pwm_scaler: 1.0,
        }
    }
}

// ---------------------------------------------------------------------------
// TESTS
// ---------------------------------------------------------------------------

#[cfg(test)]
mod test {
    use super::*;

    #[test]
    fn test_idm_aliases() {
        let idm: Idm = toml::from_str::<std::collections::HashMap<String, Idm>>(
            "idm = \"mod_hpat\"",
        )
        .unwrap()["idm"];
        assert_eq!(idm, Idm::ModHPat);
    }
}
