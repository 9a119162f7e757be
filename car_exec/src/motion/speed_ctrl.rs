//! Basic speed control

// ---------------------------------------------------------------------------
// IMPORTS
// ---------------------------------------------------------------------------

// Internal
use super::{MotorAccLimits, QPosCtrl};

// ---------------------------------------------------------------------------
// DATA STRUCTURES
// ---------------------------------------------------------------------------

/// A jerk-limited speed controller built on a position controller.
///
/// Using a position controller for velocity control means that the
/// controller's position (x), velocity (v) and acceleration (a) correspond
/// to velocity, acceleration and jerk respectively.
///
/// The acceleration limits are an owned copy; the layer above (for example
/// [`super::CarSpeedCtrl`]) rewrites them before each animation.
#[derive(Clone, Copy, Debug)]
pub struct SpeedCtrl {
    /// The acceleration limits currently in force.
    pub mal: MotorAccLimits,

    v_pos_ctrl: QPosCtrl,

    /// The largest speed a full lever deflection demands.
    pub max_speed: f64,

    /// The speed the controller is heading for.
    pub target_speed: f64,

    /// The speed currently commanded to the motor.
    pub current_speed: f64,

    /// The acceleration currently commanded to the motor.
    pub current_accel: f64,
}

// ---------------------------------------------------------------------------
// IMPLEMENTATIONS
// ---------------------------------------------------------------------------

impl SpeedCtrl {
    /// Create a new controller at rest under the given limits.
    pub fn new(mal: MotorAccLimits) -> Self {
        Self {
            mal,
            v_pos_ctrl: QPosCtrl::new(
                mal.max_fwd_accel,
                mal.max_fwd_decel,
                mal.max_jerk,
                0.0,
            ),
            max_speed: 0.1,
            target_speed: 0.0,
            current_speed: 0.0,
            current_accel: 0.0,
        }
    }

    /// Snap both the target and the current speed to `v` with zero
    /// acceleration, abandoning any trajectory.
    pub fn force_speed(&mut self, v: f64) {
        self.target_speed = v;
        self.current_speed = v;
        self.v_pos_ctrl.x = v;
        self.v_pos_ctrl.target_x = v;
        self.v_pos_ctrl.v = 0.0;
    }

    /// Write the current setpoints into the inner position controller.
    ///
    /// The velocity caps become the acceleration limits appropriate for the
    /// current direction of motion: when moving forward, forward
    /// acceleration and forward deceleration; when moving backward, the
    /// reverse pair swapped so that "deceleration" always means towards
    /// zero speed.
    pub fn animate(&mut self) {
        let (max_acc, max_dec) = if self.current_speed >= 0.0 {
            (self.mal.max_fwd_accel, self.mal.max_fwd_decel)
        } else {
            (self.mal.max_rev_decel, self.mal.max_rev_accel)
        };
        self.v_pos_ctrl.max_fwd_v = max_acc;
        self.v_pos_ctrl.max_rev_v = max_dec;
        self.v_pos_ctrl.max_a = self.mal.max_jerk;
        self.v_pos_ctrl.x = self.current_speed;
        self.v_pos_ctrl.v = self.current_accel;
        self.v_pos_ctrl.target_x = self.target_speed;
    }

    /// Advance the speed and acceleration by `delta_time` seconds.
    pub fn integrate(&mut self, delta_time: f64) {
        self.v_pos_ctrl.integrate(delta_time);
        self.current_speed = self.v_pos_ctrl.x;
        self.current_accel = self.v_pos_ctrl.v;
    }
}

// ---------------------------------------------------------------------------
// TESTS
// ---------------------------------------------------------------------------

#[cfg(test)]
mod test {
    use super::*;

    #[test]
    fn test_tracks_target_speed() {
        let mut ctrl = SpeedCtrl::new(MotorAccLimits::uniform(1.0, 50.0));
        ctrl.target_speed = 1.0;

        for _ in 0..75 {
            ctrl.animate();
            ctrl.integrate(0.02);
        }

        // After 1.5 s of a 1 m/s^2 ramp (plus jerk transients) the speed
        // must have converged
        assert!((ctrl.current_speed - 1.0).abs() < 0.01);
        assert!(ctrl.current_accel.abs() < 0.05);
    }

    #[test]
    fn test_acceleration_limited() {
        let mut ctrl = SpeedCtrl::new(MotorAccLimits::uniform(1.0, 50.0));
        ctrl.target_speed = 5.0;

        for _ in 0..100 {
            ctrl.animate();
            ctrl.integrate(0.02);
            assert!(ctrl.current_accel <= 1.0 + 50.0 * 0.02 + 1e-9);
        }
    }

    #[test]
    fn test_force_speed_snaps() {
        let mut ctrl = SpeedCtrl::new(MotorAccLimits::uniform(1.0, 10.0));
        ctrl.target_speed = 1.0;
        ctrl.animate();
        ctrl.integrate(0.5);

        ctrl.force_speed(0.25);
        assert_eq!(ctrl.current_speed, 0.25);
        assert_eq!(ctrl.target_speed, 0.25);

        // The snapped state is an equilibrium
        ctrl.animate();
        ctrl.integrate(1.0);
        assert!((ctrl.current_speed - 0.25).abs() < 1e-9);
        assert!(ctrl.current_accel.abs() < 1e-9);
    }

    #[test]
    fn test_asymmetric_limits_in_reverse() {
        let mal = MotorAccLimits::new(1.0, 2.0, 3.0, 4.0, 100.0);
        let mut ctrl = SpeedCtrl::new(mal);

        ctrl.force_speed(-1.0);
        ctrl.target_speed = -2.0;
        ctrl.animate();
        ctrl.integrate(0.1);

        // Speeding up in reverse is capped by max_rev_accel, which maps to
        // the reverse velocity cap of the inner controller
        assert!(ctrl.current_accel >= -3.0 - 1e-9);
        assert!(ctrl.current_speed < -1.0);
    }
}
