//! Quadratic position controller

// ---------------------------------------------------------------------------
// DATA STRUCTURES
// ---------------------------------------------------------------------------

/// A bang-bang position controller following a piecewise-quadratic
/// trajectory.
///
/// Starting from any `(x, v)` the controller reaches `(target_x, 0)` without
/// ever exceeding the velocity caps (beyond the single reining transient) or
/// the acceleration cap. The target may be changed arbitrarily between
/// integrations; the trajectory is rebuilt on every call.
#[derive(Clone, Copy, Debug)]
pub struct QPosCtrl {
    /// Velocity cap in the positive direction. Strictly positive.
    pub max_fwd_v: f64,

    /// Velocity cap in the negative direction (a positive magnitude).
    pub max_rev_v: f64,

    /// Acceleration cap (a positive magnitude).
    pub max_a: f64,

    /// The position the controller is heading for.
    pub target_x: f64,

    /// Current position.
    pub x: f64,

    /// Current velocity.
    pub v: f64,
}

/// One quadratic piece of the trajectory: constant acceleration `a` from
/// state `(x0, v0)` at time `t0`.
#[derive(Clone, Copy)]
struct Piece {
    t0: f64,
    x0: f64,
    v0: f64,
    a: f64,
}

// ---------------------------------------------------------------------------
// IMPLEMENTATIONS
// ---------------------------------------------------------------------------

impl Piece {
    /// Evaluate position and velocity at absolute time `t >= t0`.
    fn eval(&self, t: f64) -> (f64, f64) {
        let tau = t - self.t0;
        (
            self.x0 + tau * (self.v0 + 0.5 * tau * self.a),
            self.v0 + tau * self.a,
        )
    }
}

impl QPosCtrl {
    /// Create a controller at rest at `x`.
    pub fn new(max_fwd_v: f64, max_rev_v: f64, max_a: f64, x: f64) -> Self {
        Self {
            max_fwd_v,
            max_rev_v,
            max_a,
            target_x: x,
            x,
            v: 0.0,
        }
    }

    /// Snap the controller to rest at `x`, abandoning any trajectory.
    pub fn force_to(&mut self, x: f64) {
        self.target_x = x;
        self.x = x;
        self.v = 0.0;
    }

    /// Advance the state by `delta_time` seconds along the trajectory that
    /// brings it to rest at the target.
    ///
    /// Returns the time (relative to now) at which the trajectory reaches
    /// rest.
    pub fn integrate(&mut self, delta_time: f64) -> f64 {
        // There are five segments of the piecewise quadratic kinematic
        // function:
        //
        // Rein - Correct any overspeeding
        // Turn - Quadratic (required to correct overshoot)
        // Lurch - Quadratic (may be projected to have a past starting point)
        // Cruise - Linear
        // Brake - Quadratic
        //
        // A dummy "Rest" piece is appended to maintain consistent execution
        // time.

        let decel = -self.max_a.copysign(self.v);

        // Rein in the current velocity if it is larger than the maximum
        // velocity.
        let mut dv_rein = 0.0;
        if self.v > self.max_fwd_v {
            dv_rein = self.max_fwd_v - self.v;
        } else if self.v < -self.max_rev_v {
            dv_rein = -self.max_rev_v - self.v;
        }
        let dt_rein = dv_rein.abs() / self.max_a;
        let dx_rein = (self.v + 0.5 * decel * dt_rein) * dt_rein;

        let rein = Piece {
            t0: 0.0,
            x0: self.x,
            v0: self.v,
            a: decel,
        };
        let turn = Piece {
            t0: rein.t0 + dt_rein,
            x0: rein.x0 + dx_rein,
            v0: rein.v0 + dv_rein,
            a: decel,
        };

        // Now that any overspeeding has been corrected, consider
        // (turn.t0, turn.x0, turn.v0) to be the initial state.
        //
        // Find the minimum stopping time and the displacement at that time
        // if full deceleration were applied.
        let dt_msd = turn.v0.abs() / self.max_a;
        let dx_msd = dt_msd * (turn.v0 + 0.5 * decel * dt_msd);
        let x_at_msd = turn.x0 + dx_msd;

        let heading_wrong_way = (self.target_x < turn.x0) != (turn.v0 < 0.0);
        let will_overshoot_anyway = (self.target_x < x_at_msd) != (dx_msd < 0.0);

        let mut lurch;
        let t_bplurch;
        let x_bplurch;
        if heading_wrong_way || will_overshoot_anyway {
            // Decelerate to a stop and prepare to lurch in the other
            // direction.
            lurch = Piece {
                t0: turn.t0 + dt_msd,
                x0: turn.x0 + dx_msd,
                v0: 0.0,
                a: 0.0,
            };
            // The back-projected time of initial rest for the lurch is the
            // same as for the beginning of the lurch segment.
            t_bplurch = lurch.t0;
            x_bplurch = lurch.x0;
        } else {
            // No turning is necessary. Proceed to lurch (or lurch even
            // more).
            lurch = Piece {
                t0: turn.t0,
                x0: turn.x0,
                v0: turn.v0,
                a: 0.0,
            };
            t_bplurch = lurch.t0 - dt_msd;
            x_bplurch = lurch.x0 - dx_msd;
        }

        // From here on, the position is a monotonic function. It is
        // convenient to pretend that it is constant or monotonically
        // increasing.
        let dx = self.target_x - x_bplurch;
        let max_v = if dx < 0.0 { self.max_rev_v } else { self.max_fwd_v };
        let accel = self.max_a.copysign(dx);
        let adx = dx.abs();
        let max_dx_for_triangular_v = (max_v * max_v) / self.max_a;

        let dt_vramp;
        let dx_for_triangular_v;
        let lsd;
        let lst;
        let inflection_v;

        if adx <= max_dx_for_triangular_v {
            // Maximum speed not required
            dt_vramp = (adx / self.max_a).sqrt();
            dx_for_triangular_v = adx;
            lsd = 0.0;
            lst = 0.0;
            inflection_v = self.max_a * dt_vramp;
        } else {
            // Linear segment where maximum speed is sustained
            dt_vramp = max_v / self.max_a;
            dx_for_triangular_v = max_dx_for_triangular_v;
            lsd = adx - max_dx_for_triangular_v;
            lst = lsd / max_v.max(1e-12);
            inflection_v = max_v;
        }

        // Acceleration
        lurch.a = accel;

        // Linear segment
        let cruise = Piece {
            t0: t_bplurch + dt_vramp,
            x0: x_bplurch + 0.5 * dx_for_triangular_v.copysign(dx),
            v0: inflection_v.copysign(dx),
            a: 0.0,
        };

        // Deceleration
        let brake = Piece {
            t0: cruise.t0 + lst,
            x0: cruise.x0 + lsd.copysign(dx),
            v0: cruise.v0,
            a: -accel,
        };

        // Rest
        let rest = Piece {
            t0: brake.t0 + dt_vramp,
            x0: self.target_x,
            v0: 0.0,
            a: 0.0,
        };

        let piece = if delta_time < lurch.t0 {
            if delta_time < turn.t0 { &rein } else { &turn }
        } else if delta_time < brake.t0 {
            if delta_time < cruise.t0 { &lurch } else { &cruise }
        } else if delta_time < rest.t0 {
            &brake
        } else {
            &rest
        };

        let (x, v) = piece.eval(delta_time);
        self.x = x;
        self.v = v;

        rest.t0
    }
}

impl Default for QPosCtrl {
    fn default() -> Self {
        Self::new(1.0, 1.0, 1.0, 0.0)
    }
}

// ---------------------------------------------------------------------------
// TESTS
// ---------------------------------------------------------------------------

#[cfg(test)]
mod test {
    use super::*;

    const EPS: f64 = 1e-9;

    #[test]
    fn test_at_rest_stays_at_rest() {
        let mut ctrl = QPosCtrl::new(1.0, 1.0, 1.0, 2.5);

        let rest_time = ctrl.integrate(0.1);

        assert!((ctrl.x - 2.5).abs() < EPS);
        assert!(ctrl.v.abs() < EPS);
        assert!(rest_time.abs() < EPS);
    }

    #[test]
    fn test_reaches_target_at_rest_time() {
        let mut ctrl = QPosCtrl::new(1.0, 1.0, 1.0, 0.0);
        ctrl.target_x = 5.0;

        // Run a zero-length integration just to learn the rest time
        let rest_time = ctrl.integrate(0.0);
        assert!(rest_time > 0.0);

        // Integrating exactly to the rest time lands on the target at rest
        ctrl.integrate(rest_time);
        assert!((ctrl.x - 5.0).abs() < 1e-6);
        assert!(ctrl.v.abs() < 1e-6);

        // And any further integration stays there
        ctrl.integrate(3.0);
        assert!((ctrl.x - 5.0).abs() < 1e-6);
        assert!(ctrl.v.abs() < 1e-6);
    }

    #[test]
    fn test_reaches_negative_target() {
        let mut ctrl = QPosCtrl::new(2.0, 0.5, 1.0, 1.0);
        ctrl.target_x = -4.0;

        let rest_time = ctrl.integrate(0.0);
        ctrl.integrate(rest_time + 0.5);

        assert!((ctrl.x - -4.0).abs() < 1e-6);
        assert!(ctrl.v.abs() < 1e-6);
    }

    #[test]
    fn test_micro_stepping_matches_single_step() {
        // The trajectory is rebuilt on every integration, so many small
        // steps must land on the same state as one large step.
        let mut single = QPosCtrl::new(1.0, 1.0, 2.0, 0.0);
        single.v = 0.4;
        single.target_x = 3.0;

        let mut micro = single.clone();

        single.integrate(1.0);
        for _ in 0..100 {
            micro.integrate(0.01);
        }

        assert!((single.x - micro.x).abs() < 1e-6);
        assert!((single.v - micro.v).abs() < 1e-6);
    }

    #[test]
    fn test_velocity_caps_respected() {
        let mut ctrl = QPosCtrl::new(1.0, 0.5, 2.0, 0.0);
        ctrl.target_x = 100.0;

        let dt = 0.01;
        for i in 0..2000 {
            // Flip the target to force direction reversals mid-flight
            if i == 500 {
                ctrl.target_x = -100.0;
            }
            if i == 1000 {
                ctrl.target_x = 50.0;
            }
            ctrl.integrate(dt);

            // One integration step of acceleration transient is allowed
            assert!(ctrl.v <= 1.0 + 2.0 * dt + EPS);
            assert!(ctrl.v >= -0.5 - 2.0 * dt - EPS);
        }
    }

    #[test]
    fn test_overspeed_is_reined_in() {
        let mut ctrl = QPosCtrl::new(1.0, 1.0, 1.0, 0.0);
        ctrl.v = 3.0;
        ctrl.target_x = 100.0;

        // Reining takes |dv|/max_a = 2 s; after 1 s the velocity must have
        // come down by about 1 m/s
        ctrl.integrate(1.0);
        assert!((ctrl.v - 2.0).abs() < 1e-6);

        // And after the full rein duration the cap holds
        ctrl.integrate(1.0);
        assert!(ctrl.v <= 1.0 + EPS);
    }

    #[test]
    fn test_overshoot_forces_turn() {
        // Moving quickly away from a target directly behind: the controller
        // must stop first, then come back
        let mut ctrl = QPosCtrl::new(1.0, 1.0, 1.0, 0.0);
        ctrl.v = 1.0;
        ctrl.target_x = -2.0;

        let rest_time = ctrl.integrate(0.1);

        // Still moving forward while stopping
        assert!(ctrl.v > 0.0);
        assert!(rest_time > 2.0);

        ctrl.integrate(rest_time);
        assert!((ctrl.x - -2.0).abs() < 1e-6);
        assert!(ctrl.v.abs() < 1e-6);
    }

    #[test]
    fn test_cruise_segment_present_for_long_moves() {
        let mut ctrl = QPosCtrl::new(1.0, 1.0, 1.0, 0.0);
        ctrl.target_x = 10.0;

        // Ramp up takes 1 s over 0.5 m; cruise covers 9 m at 1 m/s; brake
        // takes another 1 s. Total is 11 s.
        let rest_time = ctrl.integrate(0.0);
        assert!((rest_time - 11.0).abs() < 1e-6);

        // Mid-cruise the velocity sits at the cap
        ctrl.integrate(5.0);
        assert!((ctrl.v - 1.0).abs() < 1e-6);
    }
}
