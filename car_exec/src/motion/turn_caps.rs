//! Turning capabilities

// ---------------------------------------------------------------------------
// IMPORTS
// ---------------------------------------------------------------------------

// External
use serde::{Deserialize, Serialize};

// ---------------------------------------------------------------------------
// DATA STRUCTURES
// ---------------------------------------------------------------------------

/// The lateral-acceleration envelope coupling forward speed to the maximum
/// permissible yaw rate.
#[derive(Clone, Copy, Debug, Serialize, Deserialize)]
pub struct TurnCaps {
    /// Maximum lateral acceleration in m/s^2. 1.47 m/s^2 is standard for
    /// highways.
    pub max_lat_accel: f64,

    /// Maximum yaw rate in rad/s.
    pub max_turn_rate: f64,

    /// d(omega)/dv slope for stick-to-turn-centre mode; implies the turning
    /// circle radius when reversing.
    pub reversing_omega_slope: f64,

    /// Stick-to-turn-centre mode (car-like).
    #[serde(default)]
    pub reverse_turns: bool,
}

// ---------------------------------------------------------------------------
// IMPLEMENTATIONS
// ---------------------------------------------------------------------------

impl TurnCaps {
    /// The maximum yaw rate permitted at forward speed `v`.
    ///
    /// The lateral acceleration saturates smoothly towards `max_lat_accel`
    /// as the speed grows, so the permitted rate is `max_turn_rate` when
    /// (nearly) stationary and rolls off as `a(v)/v` at speed.
    pub fn max_turn_rate_for_speed(&self, v: f64) -> f64 {
        let a = self.max_lat_accel
            * (-1.0
                + 2.0
                    / (1.0
                        + (-2.0 * self.max_turn_rate / self.max_lat_accel * v).exp()));
        let mut omega = if v.abs() >= 1e-15 {
            (a / v).min(self.max_turn_rate).max(0.0)
        } else {
            self.max_turn_rate
        };
        if self.reverse_turns {
            // Reversing the vehicle preserves the direction of the turning
            // circle but reverses the sign of the rate of change of the
            // heading. (The joystick is pointed towards the turning
            // centre.)
            omega *= -1.0 + 2.0 / (1.0 + (-2.0 * self.reversing_omega_slope * v).exp());
        } else {
            // Reversing the vehicle preserves the sign of the rate of
            // change of the heading but flips the side on which the turning
            // circle appears. (RC toy tank, skid-steer, excavator,
            // spacecraft, horse)
        }
        omega
    }
}

impl Default for TurnCaps {
    fn default() -> Self {
        Self {
            max_lat_accel: 4.0,
            max_turn_rate: 90f64.to_radians(),
            reversing_omega_slope: 1.0,
            reverse_turns: false,
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
    fn test_rate_bounded_and_monotone() {
        let caps = TurnCaps::default();

        let mut prev = caps.max_turn_rate_for_speed(0.0);
        assert!((prev - caps.max_turn_rate).abs() < 1e-9);

        for i in 1..200 {
            let v = 0.1 * i as f64;
            let omega = caps.max_turn_rate_for_speed(v);

            assert!(omega >= 0.0);
            assert!(omega <= caps.max_turn_rate + 1e-12);
            // Non-increasing in |v| in the skid-steer convention
            assert!(omega <= prev + 1e-12);
            prev = omega;
        }
    }

    #[test]
    fn test_rate_symmetric_without_reverse_turns() {
        let caps = TurnCaps::default();

        for i in 0..50 {
            let v = 0.2 * i as f64;
            let fwd = caps.max_turn_rate_for_speed(v);
            let rev = caps.max_turn_rate_for_speed(-v);
            assert!((fwd - rev).abs() < 1e-9);
        }
    }

    #[test]
    fn test_reverse_turns_flips_sign() {
        let caps = TurnCaps {
            reverse_turns: true,
            ..TurnCaps::default()
        };

        assert!(caps.max_turn_rate_for_speed(1.0) > 0.0);
        assert!(caps.max_turn_rate_for_speed(-1.0) < 0.0);

        // At rest the rate vanishes with the reversing slope factor
        assert!(caps.max_turn_rate_for_speed(0.0).abs() < 1e-12);
    }

    #[test]
    fn test_high_speed_rolloff() {
        let caps = TurnCaps::default();

        // At high speed the rate approaches max_lat_accel / v
        let v = 50.0;
        let omega = caps.max_turn_rate_for_speed(v);
        assert!((omega - caps.max_lat_accel / v).abs() < 1e-3);
    }
}
