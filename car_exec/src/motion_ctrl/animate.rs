//! Animation (and integration) of the car and general control state

// ---------------------------------------------------------------------------
// IMPORTS
// ---------------------------------------------------------------------------

// External
use ctrl_if::cal::{axis_to_float, GamepadCal};
use ctrl_if::gamepad::GamepadSnapshot;

// Internal
use super::{GeneralCtrlState, Idm};
use crate::motion::Car;
use util::maths::{clamp, lin_map};

// ---------------------------------------------------------------------------
// CONSTANTS
// ---------------------------------------------------------------------------

/// Trigger deflection above which the alternative control method engages.
const TRIG_JOG_THRESHOLD: f64 = 0.1;

/// Speed below which the reversing lamp illuminates.
///
/// Units: meters/second
const REVERSING_LAMP_THRESHOLD: f64 = -0.001;

/// Braking factor at which the stop lamp illuminates.
const STOP_LAMP_BF_THRESHOLD: f64 = 0.05;

/// Rate at which the triggers drive the trim while trimming.
const TRIM_RATE_PER_CYCLE: f64 = 0.005;

/// Trigger deflection at which holding both triggers arms trim zeroing.
const TRIM_ZERO_ARM_THRESHOLD: f64 = 0.8;

/// Rate at which trim returns to zero while zeroing.
///
/// Units: 1/second
const TRIM_ZERO_RATE: f64 = 0.05;

// ---------------------------------------------------------------------------
// PUBLIC FUNCTIONS
// ---------------------------------------------------------------------------

/// Read one gamepad snapshot and write new setpoints into the car and new
/// flags into the general control state.
///
/// This function is idempotent with respect to time: calling it twice with
/// the same inputs retargets the same trajectories. All time advancement
/// happens in [`integrate_gcs_and_car`].
pub fn animate_gcs_and_car(
    gcs: &mut GeneralCtrlState,
    inp: &GamepadSnapshot,
    gpcal: &GamepadCal,
    car: &mut Car,
) {
    car.speed_ctrl.enable_joy_brake = gcs.flags.enable_joy_brake;
    car.turn_caps.reverse_turns = gcs.flags.reverse_turns;

    // In the H-pattern modes with turn rate limiting off the operator gets
    // the full wheel envelope rather than the body envelope
    let mut max_omega = car.turn_caps.max_turn_rate;
    let mut max_ctrl_speed = car.max_body_speed;
    if gcs.idm == Idm::HPat || gcs.idm == Idm::ModHPat {
        if !gcs.flags.limit_turn_rate {
            max_ctrl_speed = car.max_wheel_speed;
            max_omega = car.max_hpat_omega;
        }
    }
    let mut max_omega_for_speed = max_omega;

    let mut lefttrigger = axis_to_float(inp.lefttrigger, &gpcal.lefttrigger);
    let mut righttrigger = axis_to_float(inp.righttrigger, &gpcal.righttrigger);

    // Stick-up is positive
    let left_joy_y = -axis_to_float(inp.lefty, &gpcal.lefty);
    let right_joy_y = -axis_to_float(inp.righty, &gpcal.righty);

    // Input layout

    let mut joystick_x;
    let mut joystick_y;
    {
        let left_joy_x = axis_to_float(inp.leftx, &gpcal.leftx);
        let right_joy_x = axis_to_float(inp.rightx, &gpcal.rightx);

        match gcs.idm {
            Idm::HPat | Idm::ModHPat => {
                joystick_x = 0.5 * (left_joy_y - right_joy_y);
                joystick_y = 0.5 * (left_joy_y + right_joy_y);
                car.turn_caps.reverse_turns = false;
            }

            Idm::Iso => {
                joystick_x = left_joy_x;
                joystick_y = left_joy_y;
            }

            Idm::Vh => {
                joystick_x = right_joy_x;
                joystick_y = left_joy_y;
            }
        }
    }

    // Trim adjustment

    {
        let trim_button_pressed = inp.buttons.circle;
        if trim_button_pressed || gcs.flags.zeroing_trim {
            gcs.flags.trimming = true;
        }
        if gcs.flags.trimming {
            if gcs.flags.zeroing_trim {
                if gcs.trim == 0.0 && gcs.trim_vel == 0.0 {
                    if lefttrigger == 0.0 && righttrigger == 0.0 {
                        gcs.flags.zeroing_trim = false;
                    }
                }
            } else {
                gcs.trim_vel = TRIM_RATE_PER_CYCLE * (lefttrigger - righttrigger);
                if lefttrigger >= TRIM_ZERO_ARM_THRESHOLD
                    && righttrigger >= TRIM_ZERO_ARM_THRESHOLD
                {
                    gcs.flags.zeroing_trim = true;
                }
                if lefttrigger == 0.0 && righttrigger == 0.0 && !trim_button_pressed {
                    gcs.flags.trimming = false;
                }
            }
            // The triggers are spoken for; hide them from the rest of the
            // cycle
            lefttrigger = 0.0;
            righttrigger = 0.0;
        } else {
            gcs.trim_vel = 0.0;
        }
    }

    // Jogging

    let mut is_jogging = false;
    let jogx = (inp.buttons.right as i8) - (inp.buttons.left as i8);
    let jogy = (inp.buttons.up as i8) - (inp.buttons.down as i8);
    if jogx != 0 || jogy != 0 {
        car.turn_caps.reverse_turns = false;
        car.speed_ctrl.enable_joy_brake = false;
        car.speed_ctrl.joy_braking_state = 0;
        joystick_x = car.turn_jog_factor * jogx as f64;
        joystick_y = car.jog_factor * jogy as f64;
        is_jogging = true;
    }

    // Alternative control mode

    if gcs.flags.use_alt_ctrl_method && !is_jogging {
        let lt1 = lin_map((TRIG_JOG_THRESHOLD, 1.0), (0.0, 1.0), lefttrigger);
        let rt1 = lin_map((TRIG_JOG_THRESHOLD, 1.0), (0.0, 1.0), righttrigger);
        let t1 = clamp(&lt1.max(rt1), &0.0, &1.0);
        if t1 > 0.0 {
            joystick_y *= 1.0 - (1.0 - car.jog_factor) * (1.0 - t1);
        }
    }

    // Turn softening

    car.turn_ctrl.target_x = joystick_x;
    if !gcs.flags.soften_turns {
        car.turn_ctrl.x = car.turn_ctrl.target_x;
        car.turn_ctrl.v = 0.0;
    }
    joystick_x = car.turn_ctrl.x;

    // Throttle softening

    car.speed_ctrl.enable_throttle = gcs.flags.soften_throttle;

    // Speed, ideally sourced from a tachometer

    let actual_speed = 0.5 * (car.lw_ctrl.current_speed + car.rw_ctrl.current_speed);

    // Turn command

    if gcs.flags.limit_turn_rate {
        max_omega_for_speed = car.turn_caps.max_turn_rate_for_speed(actual_speed);
    }
    let omega = -max_omega_for_speed * joystick_x;
    let half_diff_speed = 0.5 * car.axle_width * omega;

    // Speed control

    let bf = if gcs.flags.use_alt_ctrl_method {
        0.0
    } else {
        lefttrigger.max(righttrigger)
    };
    car.speed_ctrl.input_braking_factor = bf;
    car.speed_ctrl.lever_pos = joystick_y;
    car.speed_ctrl.set_max_speed(max_ctrl_speed);
    car.speed_ctrl.animate();
    if !gcs.flags.soften_speed {
        car.speed_ctrl
            .force_speed(joystick_y * max_ctrl_speed * (1.0 - bf));
    }

    car.lw_ctrl.target_speed = car.speed_ctrl.current_speed() - half_diff_speed;
    car.rw_ctrl.target_speed = car.speed_ctrl.current_speed() + half_diff_speed;

    // Unmoderated H-pattern control

    if gcs.idm == Idm::HPat {
        car.lw_ctrl.target_speed = car.max_wheel_speed * left_joy_y;
        car.rw_ctrl.target_speed = car.max_wheel_speed * right_joy_y;
    }

    car.lw_ctrl.animate();
    car.rw_ctrl.animate();

    // Lamps

    gcs.flags.reversing_lamp = actual_speed < REVERSING_LAMP_THRESHOLD;

    let mut a = car.speed_ctrl.current_accel();
    if actual_speed < 0.0 {
        a = -a;
    }
    if a < -0.05
        || car.speed_ctrl.joy_braking_state != 0
        || bf >= STOP_LAMP_BF_THRESHOLD
    {
        gcs.flags.stop_lamp = true;
    }
    if a >= -0.01
        && car.speed_ctrl.joy_braking_state == 0
        && bf < STOP_LAMP_BF_THRESHOLD
    {
        gcs.flags.stop_lamp = false;
    }
}

/// Advance every stateful controller by `delta_time` seconds.
pub fn integrate_gcs_and_car(gcs: &mut GeneralCtrlState, car: &mut Car, delta_time: f64) {
    car.turn_ctrl.integrate(delta_time);
    car.speed_ctrl.integrate(delta_time);
    if gcs.flags.motors_are_magic {
        let lw_target = car.lw_ctrl.target_speed;
        let rw_target = car.rw_ctrl.target_speed;
        car.lw_ctrl.force_speed(lw_target);
        car.rw_ctrl.force_speed(rw_target);
    } else {
        car.lw_ctrl.integrate(delta_time);
        car.rw_ctrl.integrate(delta_time);
    }

    if gcs.flags.zeroing_trim {
        gcs.trim_vel = TRIM_ZERO_RATE;
        let abs_delta_trim = gcs.trim_vel * delta_time;
        if gcs.trim > 0.0 {
            gcs.trim = (gcs.trim - abs_delta_trim).max(0.0);
        } else if gcs.trim < 0.0 {
            gcs.trim = (gcs.trim + abs_delta_trim).min(0.0);
        }
        if gcs.trim == 0.0 {
            gcs.trim_vel = 0.0;
        }
    } else {
        gcs.trim += delta_time * gcs.trim_vel;
        gcs.trim = clamp(&gcs.trim, &-gcs.max_trim, &gcs.max_trim);
    }
}

// ---------------------------------------------------------------------------
// TESTS
// ---------------------------------------------------------------------------

#[cfg(test)]
mod test {
    use super::*;
    use crate::motion::MotorAccLimits;

    const DT: f64 = 0.02;

    /// A car with simple round-number capabilities for the scenarios.
    fn test_car() -> Car {
        let mut car = Car::new(
            MotorAccLimits::uniform(4.0, 200.0),
            MotorAccLimits::uniform(1.0, 50.0),
            MotorAccLimits::uniform(4.0, 200.0),
        );
        car.axle_width = 1.0;
        car.max_wheel_speed = 1.0;
        car.max_body_speed = 1.0;
        // A gentle lateral envelope so the body speed cap stays close to
        // the wheel speed cap
        car.turn_caps.max_lat_accel = 0.02;
        car.init_computed_values();
        assert!(car.max_body_speed > 0.98);
        car
    }

    fn test_gcs() -> GeneralCtrlState {
        let mut gcs = GeneralCtrlState::default();
        gcs.flags.soften_speed = true;
        gcs.flags.enable_motors = true;
        gcs
    }

    fn run_cycles(
        gcs: &mut GeneralCtrlState,
        inp: &GamepadSnapshot,
        car: &mut Car,
        n: usize,
    ) {
        let gpcal = GamepadCal::default();
        for _ in 0..n {
            animate_gcs_and_car(gcs, inp, &gpcal, car);
            integrate_gcs_and_car(gcs, car, DT);
        }
    }

    #[test]
    fn test_rest_under_no_input() {
        let mut car = test_car();
        let mut gcs = test_gcs();
        let inp = GamepadSnapshot::centred();

        run_cycles(&mut gcs, &inp, &mut car, 100);

        assert!(car.lw_ctrl.target_speed.abs() < 1e-6);
        assert!(car.rw_ctrl.target_speed.abs() < 1e-6);
        assert!(!gcs.flags.stop_lamp);
        assert!(!gcs.flags.reversing_lamp);
    }

    #[test]
    fn test_straight_line_acceleration() {
        let mut car = test_car();
        let mut gcs = test_gcs();
        gcs.idm = Idm::Iso;

        let mut inp = GamepadSnapshot::centred();
        inp.lefty = 0; // stick up, mapped to +1.0 and negated back

        run_cycles(&mut gcs, &inp, &mut car, 60);

        assert!((car.lw_ctrl.target_speed - 1.0).abs() < 0.05);
        assert!((car.rw_ctrl.target_speed - 1.0).abs() < 0.05);
        assert!(
            (car.lw_ctrl.target_speed - car.rw_ctrl.target_speed).abs() < 1e-9
        );
    }

    #[test]
    fn test_joy_brake_reversal() {
        let mut car = test_car();
        let mut gcs = test_gcs();
        gcs.idm = Idm::Iso;
        gcs.flags.enable_joy_brake = true;

        // Get the car moving forward at speed
        let mut inp = GamepadSnapshot::centred();
        inp.lefty = 0;
        run_cycles(&mut gcs, &inp, &mut car, 100);
        assert!(car.speed_ctrl.current_speed() > 0.8);

        // Slam the stick to full reverse
        inp.lefty = 255;
        let gpcal = GamepadCal::default();
        animate_gcs_and_car(&mut gcs, &inp, &gpcal, &mut car);

        assert_eq!(car.speed_ctrl.joy_braking_state, -1);
        assert_eq!(car.speed_ctrl.effective_braking_factor, 1.0);
        assert!(car.speed_ctrl.target_speed() <= 0.0);
        assert!(gcs.flags.stop_lamp);

        // The braking limits are in force
        assert_eq!(car.speed_ctrl.effective_mal().max_fwd_decel, 4.0);

        // Speed decreases monotonically towards rest
        let mut prev = car.speed_ctrl.current_speed();
        for _ in 0..50 {
            animate_gcs_and_car(&mut gcs, &inp, &gpcal, &mut car);
            integrate_gcs_and_car(&mut gcs, &mut car, DT);
            assert!(car.speed_ctrl.current_speed() <= prev + 1e-9);
            prev = car.speed_ctrl.current_speed();
        }
    }

    #[test]
    fn test_hpat_raw_override() {
        let mut car = test_car();
        let mut gcs = test_gcs();
        gcs.idm = Idm::HPat;

        let mut inp = GamepadSnapshot::centred();
        inp.lefty = 0; // left stick full up
        inp.righty = 255; // right stick full down

        let gpcal = GamepadCal::default();
        animate_gcs_and_car(&mut gcs, &inp, &gpcal, &mut car);

        assert!((car.lw_ctrl.target_speed - car.max_wheel_speed).abs() < 1e-9);
        assert!((car.rw_ctrl.target_speed + car.max_wheel_speed).abs() < 1e-9);
    }

    #[test]
    fn test_mod_hpat_is_moderated() {
        let mut car = test_car();
        let mut gcs = test_gcs();
        gcs.idm = Idm::ModHPat;

        let mut inp = GamepadSnapshot::centred();
        inp.lefty = 0;
        inp.righty = 255;

        let gpcal = GamepadCal::default();
        animate_gcs_and_car(&mut gcs, &inp, &gpcal, &mut car);

        // A pure turn: no forward demand, opposing wheel targets from the
        // turn mixing rather than the raw sticks
        assert!(car.speed_ctrl.target_speed().abs() < 1e-9);
        assert!(car.lw_ctrl.target_speed > 0.0);
        assert!(car.rw_ctrl.target_speed < 0.0);
        assert!(
            (car.lw_ctrl.target_speed + car.rw_ctrl.target_speed).abs() < 1e-9
        );
    }

    #[test]
    fn test_jogging_overrides_stick() {
        let mut car = test_car();
        let mut gcs = test_gcs();
        gcs.idm = Idm::Iso;
        gcs.flags.soften_speed = false;

        let mut inp = GamepadSnapshot::centred();
        inp.buttons.up = true;

        let gpcal = GamepadCal::default();
        animate_gcs_and_car(&mut gcs, &inp, &gpcal, &mut car);

        // The speed demand is the jog factor of the full range
        let expected = car.jog_factor * car.max_body_speed;
        assert!((car.speed_ctrl.current_speed() - expected).abs() < 1e-9);
    }

    #[test]
    fn test_reversing_lamp() {
        let mut car = test_car();
        let mut gcs = test_gcs();
        gcs.idm = Idm::Iso;

        let mut inp = GamepadSnapshot::centred();
        inp.lefty = 255; // full reverse

        run_cycles(&mut gcs, &inp, &mut car, 50);

        assert!(gcs.flags.reversing_lamp);
        assert!(car.speed_ctrl.current_speed() < 0.0);
    }

    #[test]
    fn test_trim_zeroing() {
        let mut car = test_car();
        let mut gcs = test_gcs();
        gcs.max_trim = 0.5;
        gcs.trim = 0.2;
        gcs.flags.trimming = true;

        // Holding both triggers hard arms the zeroing state
        let mut inp = GamepadSnapshot::centred();
        inp.lefttrigger = 255;
        inp.righttrigger = 255;

        let gpcal = GamepadCal::default();
        animate_gcs_and_car(&mut gcs, &inp, &gpcal, &mut car);
        assert!(gcs.flags.zeroing_trim);

        // The triggers were consumed by trimming, not braking
        assert_eq!(car.speed_ctrl.input_braking_factor, 0.0);

        // Trim shrinks at 0.05/s
        integrate_gcs_and_car(&mut gcs, &mut car, 1.0);
        assert!((gcs.trim - 0.15).abs() < 1e-9);

        for _ in 0..3 {
            integrate_gcs_and_car(&mut gcs, &mut car, 1.0);
        }
        assert_eq!(gcs.trim, 0.0);
        assert_eq!(gcs.trim_vel, 0.0);

        // Releasing the triggers clears the zeroing state on the next
        // animation
        inp.lefttrigger = 0;
        inp.righttrigger = 0;
        animate_gcs_and_car(&mut gcs, &inp, &gpcal, &mut car);
        assert!(!gcs.flags.zeroing_trim);

        // And with no button held, trimming itself ends one animation later
        animate_gcs_and_car(&mut gcs, &inp, &gpcal, &mut car);
        assert!(!gcs.flags.trimming);
    }

    #[test]
    fn test_trim_clamped() {
        let mut car = test_car();
        let mut gcs = test_gcs();
        gcs.max_trim = 0.1;
        gcs.flags.trimming = true;

        // Left trigger only: trim grows until the clamp
        let mut inp = GamepadSnapshot::centred();
        inp.lefttrigger = 255;
        inp.buttons.circle = true;

        let gpcal = GamepadCal::default();
        for _ in 0..100 {
            animate_gcs_and_car(&mut gcs, &inp, &gpcal, &mut car);
            integrate_gcs_and_car(&mut gcs, &mut car, 1.0);
        }

        assert_eq!(gcs.trim, 0.1);
    }

    #[test]
    fn test_motors_are_magic_snaps_wheels() {
        let mut car = test_car();
        let mut gcs = test_gcs();
        gcs.idm = Idm::Iso;
        gcs.flags.motors_are_magic = true;

        let mut inp = GamepadSnapshot::centred();
        inp.lefty = 0;

        run_cycles(&mut gcs, &inp, &mut car, 1);

        assert_eq!(car.lw_ctrl.current_speed, car.lw_ctrl.target_speed);
        assert_eq!(car.rw_ctrl.current_speed, car.rw_ctrl.target_speed);
    }

    #[test]
    fn test_unsoftened_speed_snaps_body() {
        let mut car = test_car();
        let mut gcs = test_gcs();
        gcs.idm = Idm::Iso;
        gcs.flags.soften_speed = false;

        let mut inp = GamepadSnapshot::centred();
        inp.lefty = 0;

        let gpcal = GamepadCal::default();
        animate_gcs_and_car(&mut gcs, &inp, &gpcal, &mut car);

        // Without softening the body controller snaps straight to the
        // demand
        assert_eq!(car.speed_ctrl.current_speed(), car.max_body_speed);
    }
}
