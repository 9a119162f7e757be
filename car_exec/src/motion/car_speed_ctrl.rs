//! Car speed control

// ---------------------------------------------------------------------------
// IMPORTS
// ---------------------------------------------------------------------------

// Internal
use super::{MotorAccLimits, SpeedCtrl};

// ---------------------------------------------------------------------------
// DATA STRUCTURES
// ---------------------------------------------------------------------------

/// The body-speed controller.
///
/// Wraps a [`SpeedCtrl`] and derives its target from the throttle lever,
/// the pedal braking factor and the joy-braking state machine. The wrapped
/// controller's limits are rewritten every animation as the blend of the
/// cruise and braking limits by the effective braking factor.
#[derive(Clone, Copy, Debug)]
pub struct CarSpeedCtrl {
    speed_ctrl: SpeedCtrl,

    /// Limits in force when cruising.
    pub cruise_mal: MotorAccLimits,

    /// Limits in force under full braking.
    pub braking_mal: MotorAccLimits,

    /// Fraction of the lever swing injected per animation when throttle
    /// softening is enabled. In (0, 1].
    pub throttle_factor: f64,

    /// Enables throttle softening.
    pub enable_throttle: bool,

    /// Speed below which joy-braking disengages, in m/s. Strictly positive.
    pub joy_brake_speed_threshold: f64,

    /// Throttle lever position in [-1, +1].
    pub lever_pos: f64,

    /// Brake pedal deflection in [0, 1].
    pub input_braking_factor: f64,

    /// Enables the joy-braking state machine.
    pub enable_joy_brake: bool,

    /// The braking factor in force after resolving joy-braking against the
    /// pedal. In [0, 1].
    pub effective_braking_factor: f64,

    /// -1 while joy-braking out of forward motion, +1 out of reverse
    /// motion, 0 when not joy-braking.
    pub joy_braking_state: i8,
}

// ---------------------------------------------------------------------------
// IMPLEMENTATIONS
// ---------------------------------------------------------------------------

impl CarSpeedCtrl {
    /// Create a new controller with the default throttle and joy-braking
    /// configuration.
    pub fn new(cruise_mal: MotorAccLimits, braking_mal: MotorAccLimits) -> Self {
        Self {
            speed_ctrl: SpeedCtrl::new(cruise_mal),
            cruise_mal,
            braking_mal,
            throttle_factor: 1.0,
            enable_throttle: true,
            joy_brake_speed_threshold: 0.2,
            lever_pos: 0.0,
            input_braking_factor: 0.0,
            enable_joy_brake: false,
            effective_braking_factor: 0.0,
            joy_braking_state: 0,
        }
    }

    /// Derive the target speed for this cycle and animate the wrapped
    /// controller against the freshly blended limits.
    pub fn animate(&mut self) {
        let ts0 = self.speed_ctrl.max_speed * self.lever_pos;
        let etf = if self.enable_throttle {
            self.throttle_factor
        } else {
            1.0
        };
        let mut ts = self.speed_ctrl.current_speed
            + etf * (ts0 - self.speed_ctrl.current_speed);
        let mut bf = 0.0;

        // Joy-braking engages on a hard opposite-direction lever while
        // moving: both the current speed and the raw demand must exceed the
        // threshold with disagreeing signs.
        if self.enable_joy_brake {
            if self.speed_ctrl.current_speed.abs() >= self.joy_brake_speed_threshold
                && ts0.abs() >= self.joy_brake_speed_threshold
                && (ts0 < 0.0) != (self.speed_ctrl.current_speed < 0.0)
            {
                self.joy_braking_state = if ts0 < 0.0 { -1 } else { 1 };
            }
        } else {
            self.joy_braking_state = 0;
        }

        // The state holds while the opposite-direction lever is still
        // beyond the threshold and the car is still moving; releasing the
        // lever or coming to rest disengages it.
        let still_moving =
            self.speed_ctrl.current_speed.abs() >= self.joy_brake_speed_threshold;
        match self.joy_braking_state {
            -1 => {
                if ts0 < -self.joy_brake_speed_threshold && still_moving {
                    bf = self.lever_pos.abs();
                    // The car may brake to a halt but not accelerate
                    // through zero
                    ts = ts.max(0.0);
                } else {
                    self.joy_braking_state = 0;
                }
            }
            1 => {
                if ts0 > self.joy_brake_speed_threshold && still_moving {
                    bf = self.lever_pos.abs();
                    ts = ts.min(0.0);
                } else {
                    self.joy_braking_state = 0;
                }
            }
            _ => (),
        }

        bf = bf.max(self.input_braking_factor);
        self.effective_braking_factor = bf;

        self.speed_ctrl
            .mal
            .blend_from(&self.cruise_mal, &self.braking_mal, bf);
        ts *= 1.0 - bf;

        self.speed_ctrl.target_speed = ts;
        self.speed_ctrl.animate();
    }

    /// Advance the wrapped controller by `delta_time` seconds.
    pub fn integrate(&mut self, delta_time: f64) {
        self.speed_ctrl.integrate(delta_time);
    }

    /// Snap the wrapped controller to `v`.
    pub fn force_speed(&mut self, v: f64) {
        self.speed_ctrl.force_speed(v);
    }

    pub fn max_speed(&self) -> f64 {
        self.speed_ctrl.max_speed
    }

    pub fn set_max_speed(&mut self, max_speed: f64) {
        self.speed_ctrl.max_speed = max_speed;
    }

    pub fn target_speed(&self) -> f64 {
        self.speed_ctrl.target_speed
    }

    pub fn current_speed(&self) -> f64 {
        self.speed_ctrl.current_speed
    }

    pub fn current_accel(&self) -> f64 {
        self.speed_ctrl.current_accel
    }

    /// The limits currently in force on the wrapped controller.
    pub fn effective_mal(&self) -> &MotorAccLimits {
        &self.speed_ctrl.mal
    }
}

// ---------------------------------------------------------------------------
// TESTS
// ---------------------------------------------------------------------------

#[cfg(test)]
mod test {
    use super::*;

    fn test_ctrl() -> CarSpeedCtrl {
        let mut ctrl = CarSpeedCtrl::new(
            MotorAccLimits::uniform(1.0, 50.0),
            MotorAccLimits::uniform(4.0, 200.0),
        );
        ctrl.set_max_speed(1.0);
        ctrl.enable_joy_brake = true;
        ctrl
    }

    #[test]
    fn test_joy_brake_entry_and_exit() {
        let mut ctrl = test_ctrl();
        ctrl.force_speed(1.0);

        // Hard reverse while moving forward engages joy-braking
        ctrl.lever_pos = -1.0;
        ctrl.animate();

        assert_eq!(ctrl.joy_braking_state, -1);
        assert_eq!(ctrl.effective_braking_factor, 1.0);

        // The handed-down target cannot cross zero
        assert!(ctrl.target_speed() <= 0.0);

        // The effective limits are the full braking set
        assert_eq!(ctrl.effective_mal().max_fwd_decel, 4.0);

        // Brake until the speed falls below the threshold, then the state
        // machine must release
        let mut prev_speed = ctrl.current_speed();
        let mut ticks = 0;
        while ctrl.joy_braking_state == -1 && ticks < 500 {
            ctrl.animate();
            ctrl.integrate(0.02);
            ticks += 1;

            // Speed decreases monotonically and never crosses zero while
            // the brake is engaged
            assert!(ctrl.current_speed() <= prev_speed + 1e-9);
            assert!(ctrl.current_speed() >= -1e-9);
            prev_speed = ctrl.current_speed();
        }

        assert!(ticks < 500, "joy-braking never released");
        assert!(ctrl.current_speed() < ctrl.joy_brake_speed_threshold);
        assert_eq!(ctrl.joy_braking_state, 0);
    }

    #[test]
    fn test_joy_brake_releases_when_lever_centred() {
        let mut ctrl = test_ctrl();
        ctrl.force_speed(1.0);

        ctrl.lever_pos = -1.0;
        ctrl.animate();
        assert_eq!(ctrl.joy_braking_state, -1);

        // Centering the lever releases the brake even at speed
        ctrl.lever_pos = 0.0;
        ctrl.animate();
        assert_eq!(ctrl.joy_braking_state, 0);
        assert_eq!(ctrl.effective_braking_factor, 0.0);
    }

    #[test]
    fn test_joy_brake_disabled() {
        let mut ctrl = test_ctrl();
        ctrl.enable_joy_brake = false;
        ctrl.force_speed(1.0);

        ctrl.lever_pos = -1.0;
        ctrl.animate();

        assert_eq!(ctrl.joy_braking_state, 0);
        assert_eq!(ctrl.effective_braking_factor, 0.0);
    }

    #[test]
    fn test_pedal_braking_scales_target() {
        let mut ctrl = test_ctrl();
        ctrl.lever_pos = 1.0;
        ctrl.input_braking_factor = 0.5;
        ctrl.animate();

        assert_eq!(ctrl.effective_braking_factor, 0.5);
        // Target is eased then scaled by (1 - bf)
        assert!((ctrl.target_speed() - 0.5).abs() < 1e-9);

        // The limits sit halfway between cruise and braking
        assert!((ctrl.effective_mal().max_fwd_accel - 2.5).abs() < 1e-9);
    }

    #[test]
    fn test_throttle_softening_eases_target() {
        let mut ctrl = test_ctrl();
        ctrl.throttle_factor = 0.1;
        ctrl.lever_pos = 1.0;
        ctrl.animate();

        // Only a tenth of the swing is injected per animation
        assert!((ctrl.target_speed() - 0.1).abs() < 1e-9);

        ctrl.enable_throttle = false;
        ctrl.animate();
        assert!((ctrl.target_speed() - 1.0).abs() < 1e-9);
    }
}
