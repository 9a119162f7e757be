//! Car aggregate

// ---------------------------------------------------------------------------
// IMPORTS
// ---------------------------------------------------------------------------

// Internal
use super::{CarParams, CarSpeedCtrl, MotorAccLimits, QPosCtrl, SpeedCtrl, TurnCaps};

// ---------------------------------------------------------------------------
// DATA STRUCTURES
// ---------------------------------------------------------------------------

/// The whole vehicle: one body-speed controller, two wheel controllers, the
/// turning envelope and the turn-softening controller.
#[derive(Clone, Copy, Debug)]
pub struct Car {
    pub turn_caps: TurnCaps,

    /// Softens the turn command; the animator feeds the stick deflection
    /// into its target and reads the softened deflection back.
    pub turn_ctrl: QPosCtrl,

    pub speed_ctrl: CarSpeedCtrl,
    pub lw_ctrl: SpeedCtrl,
    pub rw_ctrl: SpeedCtrl,

    /// Fraction of the full speed range commanded by a D-pad jog.
    pub jog_factor: f64,

    /// Fraction of the full turn range commanded by a D-pad jog.
    pub turn_jog_factor: f64,

    /// Distance between the two wheels in metres. Strictly positive.
    pub axle_width: f64,

    /// Largest speed a single wheel can be commanded to, in m/s.
    pub max_wheel_speed: f64,

    /// Largest speed the body may be commanded to, in m/s. Reduced by
    /// [`Car::init_computed_values`] until the turning envelope fits inside
    /// the wheel speed cap.
    pub max_body_speed: f64,

    /// Yaw rate at full differential wheel speeds, in rad/s. Computed by
    /// [`Car::init_computed_values`].
    pub max_hpat_omega: f64,
}

// ---------------------------------------------------------------------------
// IMPLEMENTATIONS
// ---------------------------------------------------------------------------

impl Car {
    /// Create a new car from its three motor limit sets.
    pub fn new(
        wheel_mal: MotorAccLimits,
        cruise_mal: MotorAccLimits,
        braking_mal: MotorAccLimits,
    ) -> Self {
        Self {
            turn_caps: TurnCaps::default(),
            turn_ctrl: QPosCtrl::default(),
            speed_ctrl: CarSpeedCtrl::new(cruise_mal, braking_mal),
            lw_ctrl: SpeedCtrl::new(wheel_mal),
            rw_ctrl: SpeedCtrl::new(wheel_mal),
            jog_factor: 0.25,
            turn_jog_factor: 0.25,
            axle_width: 1.0,
            max_wheel_speed: 1.0,
            max_body_speed: 1.0,
            max_hpat_omega: 1.0, // Probably way off. It will be computed.
        }
    }

    /// Create a new car configured from a parameter set.
    ///
    /// [`Car::init_computed_values`] must still be called afterwards.
    pub fn from_params(params: &CarParams) -> Self {
        let mut car = Self::new(params.wheel_mal, params.cruise_mal, params.braking_mal);

        car.turn_caps = params.turn_caps;
        car.turn_ctrl = QPosCtrl::new(
            params.turn_soften_rate,
            params.turn_soften_rate,
            params.turn_soften_accel,
            0.0,
        );
        car.speed_ctrl.throttle_factor = params.throttle_factor;
        car.speed_ctrl.joy_brake_speed_threshold = params.joy_brake_speed_threshold_ms;
        car.jog_factor = params.jog_factor;
        car.turn_jog_factor = params.turn_jog_factor;
        car.axle_width = params.axle_width_m;
        car.max_wheel_speed = params.max_wheel_speed_ms;
        car.max_body_speed = params.max_body_speed_ms;

        car
    }

    /// Derive the computed capabilities from the configured ones.
    ///
    /// After this call:
    /// - `max_hpat_omega` is the yaw rate at full opposing wheel speeds
    /// - `max_turn_rate` never exceeds `max_hpat_omega`
    /// - `max_body_speed` is low enough that the body speed plus the
    ///   half-differential of a full-rate turn fits inside the wheel speed
    ///   cap
    ///
    /// Only this function may mutate the computed fields; they are
    /// constants afterwards.
    pub fn init_computed_values(&mut self) {
        self.max_hpat_omega = 2.0 * self.max_wheel_speed / self.axle_width;
        self.turn_caps.max_turn_rate =
            self.turn_caps.max_turn_rate.min(self.max_hpat_omega);

        // Iteratively lower the body speed cap until a full-rate turn at
        // that speed fits. The inequality is monotone in the body speed so
        // the loop terminates.
        let mut mbs_too_high = true;
        while mbs_too_high {
            mbs_too_high = false;
            let omega = self.turn_caps.max_turn_rate_for_speed(self.max_body_speed);
            let hds = 0.5 * omega * self.axle_width;
            if self.max_body_speed + hds > self.max_wheel_speed {
                let new_max_body_speed = self.max_wheel_speed - hds;
                if new_max_body_speed < self.max_body_speed {
                    self.max_body_speed = new_max_body_speed;
                    mbs_too_high = true;
                }
            }
        }
    }
}

impl Default for Car {
    fn default() -> Self {
        Self::new(
            MotorAccLimits::default(),
            MotorAccLimits::default(),
            MotorAccLimits::default(),
        )
    }
}

// ---------------------------------------------------------------------------
// TESTS
// ---------------------------------------------------------------------------

#[cfg(test)]
mod test {
    use super::*;

    fn test_car() -> Car {
        let mut car = Car::new(
            MotorAccLimits::uniform(2.0, 50.0),
            MotorAccLimits::uniform(1.0, 50.0),
            MotorAccLimits::uniform(4.0, 200.0),
        );
        car.axle_width = 0.8;
        car.max_wheel_speed = 2.0;
        car.max_body_speed = 2.0;
        car
    }

    #[test]
    fn test_hpat_omega_computed() {
        let mut car = test_car();
        car.init_computed_values();

        assert!((car.max_hpat_omega - 2.0 * 2.0 / 0.8).abs() < 1e-12);
        assert!(car.turn_caps.max_turn_rate <= car.max_hpat_omega);
    }

    #[test]
    fn test_body_speed_fits_turn_envelope() {
        let mut car = test_car();
        car.init_computed_values();

        // At the body speed cap a full-rate turn must not demand more than
        // a wheel can do
        let omega = car.turn_caps.max_turn_rate_for_speed(car.max_body_speed);
        let hds = 0.5 * omega * car.axle_width;
        assert!(car.max_body_speed + hds <= car.max_wheel_speed + 1e-9);

        // And the same holds across the whole speed range
        let mut v = 0.0;
        while v <= car.max_body_speed {
            let omega = car.turn_caps.max_turn_rate_for_speed(v);
            let wheel = v + 0.5 * omega * car.axle_width;
            assert!(wheel <= car.max_wheel_speed + 1e-9);
            v += 0.01;
        }
    }

    #[test]
    fn test_turn_rate_clipped_to_hpat() {
        let mut car = test_car();
        car.turn_caps.max_turn_rate = 100.0;
        car.init_computed_values();

        assert!((car.turn_caps.max_turn_rate - car.max_hpat_omega).abs() < 1e-12);
    }
}
