//! Motor acceleration limits

// ---------------------------------------------------------------------------
// IMPORTS
// ---------------------------------------------------------------------------

// External
use serde::{Deserialize, Serialize};

// Internal
use util::maths::lerp;

// ---------------------------------------------------------------------------
// DATA STRUCTURES
// ---------------------------------------------------------------------------

/// Per-direction acceleration and deceleration caps plus a jerk cap.
///
/// All fields are strictly positive magnitudes in SI units (metres/second^2
/// and metres/second^3).
#[derive(Clone, Copy, Debug, Serialize, Deserialize)]
pub struct MotorAccLimits {
    pub max_fwd_accel: f64,
    pub max_fwd_decel: f64,
    pub max_rev_accel: f64,
    pub max_rev_decel: f64,
    pub max_jerk: f64,
}

// ---------------------------------------------------------------------------
// IMPLEMENTATIONS
// ---------------------------------------------------------------------------

impl MotorAccLimits {
    /// Create a new set of limits from each cap individually.
    pub fn new(
        max_fwd_accel: f64,
        max_fwd_decel: f64,
        max_rev_accel: f64,
        max_rev_decel: f64,
        max_jerk: f64,
    ) -> Self {
        Self {
            max_fwd_accel,
            max_fwd_decel,
            max_rev_accel,
            max_rev_decel,
            max_jerk,
        }
    }

    /// Create a new set of limits with the same cap in every direction.
    pub fn uniform(accel: f64, jerk: f64) -> Self {
        Self::new(accel, accel, accel, accel, jerk)
    }

    /// Set every field to the componentwise interpolation between `mal1`
    /// and `mal2`, with the blend factor clamped to [0, 1].
    ///
    /// Used every cycle to mix the cruise and braking limits by the current
    /// effective braking factor.
    pub fn blend_from(&mut self, mal1: &MotorAccLimits, mal2: &MotorAccLimits, t: f64) {
        self.max_fwd_accel = lerp(mal1.max_fwd_accel, mal2.max_fwd_accel, t);
        self.max_fwd_decel = lerp(mal1.max_fwd_decel, mal2.max_fwd_decel, t);
        self.max_rev_accel = lerp(mal1.max_rev_accel, mal2.max_rev_accel, t);
        self.max_rev_decel = lerp(mal1.max_rev_decel, mal2.max_rev_decel, t);
        self.max_jerk = lerp(mal1.max_jerk, mal2.max_jerk, t);
    }
}

impl Default for MotorAccLimits {
    fn default() -> Self {
        Self::uniform(1.0, 1.0)
    }
}

// ---------------------------------------------------------------------------
// TESTS
// ---------------------------------------------------------------------------

#[cfg(test)]
mod test {
    use super::*;

    #[test]
    fn test_blend_endpoints() {
        let a = MotorAccLimits::new(1.0, 2.0, 3.0, 4.0, 5.0);
        let b = MotorAccLimits::new(2.0, 4.0, 6.0, 8.0, 10.0);

        let mut eff = MotorAccLimits::default();

        eff.blend_from(&a, &b, 0.0);
        assert_eq!(eff.max_fwd_accel, 1.0);
        assert_eq!(eff.max_rev_decel, 4.0);

        eff.blend_from(&a, &b, 1.0);
        assert_eq!(eff.max_fwd_accel, 2.0);
        assert_eq!(eff.max_rev_decel, 8.0);
    }

    #[test]
    fn test_blend_midpoint() {
        let a = MotorAccLimits::new(1.0, 2.0, 3.0, 4.0, 5.0);
        let b = MotorAccLimits::new(2.0, 4.0, 6.0, 8.0, 10.0);

        let mut eff = MotorAccLimits::default();
        eff.blend_from(&a, &b, 0.5);

        assert_eq!(eff.max_fwd_accel, 1.5);
        assert_eq!(eff.max_fwd_decel, 3.0);
        assert_eq!(eff.max_rev_accel, 4.5);
        // Each field blends from its own counterpart
        assert_eq!(eff.max_rev_decel, 6.0);
        assert_eq!(eff.max_jerk, 7.5);
    }

    #[test]
    fn test_blend_factor_clamped() {
        let a = MotorAccLimits::uniform(1.0, 1.0);
        let b = MotorAccLimits::uniform(3.0, 3.0);

        let mut eff = MotorAccLimits::default();
        eff.blend_from(&a, &b, 7.0);
        assert_eq!(eff.max_fwd_accel, 3.0);

        eff.blend_from(&a, &b, -7.0);
        assert_eq!(eff.max_fwd_accel, 1.0);
    }
}
