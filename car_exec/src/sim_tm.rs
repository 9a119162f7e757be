//! Telemetry output for the host car simulator
//!
//! Every cycle the core packs its state into a fixed 8-character record
//! which the serial writer hands to the simulator: three characters of
//! button bitfield, one of lamp state and two per wheel target.

// ---------------------------------------------------------------------------
// IMPORTS
// ---------------------------------------------------------------------------

// External
use ctrl_if::frame::{int_to_base64, SimFrame};
use ctrl_if::gamepad::GamepadSnapshot;

// Internal
use crate::blinkers::Blinkers;
use crate::motion::Car;
use crate::motion_ctrl::GeneralCtrlState;

// ---------------------------------------------------------------------------
// CONSTANTS
// ---------------------------------------------------------------------------

/// Wheel targets are mapped to signed 11-bit integers in this range.
const WHEEL_SCALE: f64 = 2047.0;

// ---------------------------------------------------------------------------
// PUBLIC FUNCTIONS
// ---------------------------------------------------------------------------

/// Pack the current state into a simulator record.
pub fn build_frame(
    inp: &GamepadSnapshot,
    car: &Car,
    gcs: &GeneralCtrlState,
    blinkers: &Blinkers,
) -> SimFrame {
    let mut buf = [0u8; 9];

    // 17 button bits fit in the last three of six base64 characters
    let b = int_to_base64(inp.buttons.to_bitfield() as i32);
    buf[0] = b[3];
    buf[1] = b[4];
    buf[2] = b[5];

    // Lamps: reversing, stop and the blinker bits when lit
    let lamps = ((gcs.flags.reversing_lamp as i32) << 3)
        | ((gcs.flags.stop_lamp as i32) << 2)
        | (if blinkers.lit() { blinkers.state as i32 } else { 0 });
    buf[3] = int_to_base64(lamps)[5];

    // Wheel targets as signed 11-bit integers
    let k = WHEEL_SCALE / car.max_wheel_speed;

    let x = (k * car.lw_ctrl.target_speed + 0.5) as i32;
    let b = int_to_base64(x.max(-2047).min(2047));
    buf[4] = b[4];
    buf[5] = b[5];

    let x = (k * car.rw_ctrl.target_speed + 0.5) as i32;
    let b = int_to_base64(x.max(-2047).min(2047));
    buf[6] = b[4];
    buf[7] = b[5];

    buf[8] = 0;

    SimFrame(buf)
}

// ---------------------------------------------------------------------------
// TESTS
// ---------------------------------------------------------------------------

#[cfg(test)]
mod test {
    use super::*;
    use crate::motion::MotorAccLimits;
    use ctrl_if::frame::base64_to_tricrumb;

    fn test_car() -> Car {
        let mut car = Car::new(
            MotorAccLimits::uniform(1.0, 10.0),
            MotorAccLimits::uniform(1.0, 10.0),
            MotorAccLimits::uniform(2.0, 20.0),
        );
        car.max_wheel_speed = 1.0;
        car
    }

    /// Decode the frame back into (buttons, lamps, left, right).
    fn decode(frame: &SimFrame) -> (u32, u8, i32, i32) {
        let c = |i: usize| base64_to_tricrumb(frame.as_bytes()[i]).unwrap() as u32;

        let buttons = (c(0) << 12) | (c(1) << 6) | c(2);
        let lamps = c(3) as u8;

        let wheel = |hi: usize| {
            let raw = ((c(hi) << 6) | c(hi + 1)) as i32;
            // Sign-extend the 12-bit field
            if raw >= 2048 {
                raw - 4096
            } else {
                raw
            }
        };

        (buttons, lamps, wheel(4), wheel(6))
    }

    #[test]
    fn test_zero_state_round_trips() {
        let frame = build_frame(
            &GamepadSnapshot::centred(),
            &test_car(),
            &GeneralCtrlState::default(),
            &Blinkers::new(),
        );

        let (buttons, lamps, lw, rw) = decode(&frame);
        assert_eq!(buttons, 0);
        assert_eq!(lamps, 0);
        assert_eq!(lw, 0);
        assert_eq!(rw, 0);

        assert_eq!(frame.as_str(), "AAAAAAAA");
    }

    #[test]
    fn test_buttons_round_trip() {
        let mut inp = GamepadSnapshot::centred();
        inp.buttons.cross = true;
        inp.buttons.start = true;
        inp.buttons.right = true;

        let frame = build_frame(
            &inp,
            &test_car(),
            &GeneralCtrlState::default(),
            &Blinkers::new(),
        );

        let (buttons, _, _, _) = decode(&frame);
        assert_eq!(buttons, inp.buttons.to_bitfield());
    }

    #[test]
    fn test_lamp_bits() {
        let mut gcs = GeneralCtrlState::default();
        gcs.flags.stop_lamp = true;
        gcs.flags.reversing_lamp = true;

        let mut blinkers = Blinkers::new();
        blinkers.state = 0b10;

        let frame = build_frame(
            &GamepadSnapshot::centred(),
            &test_car(),
            &gcs,
            &blinkers,
        );
        let (_, lamps, _, _) = decode(&frame);
        assert_eq!(lamps, 0b1110);

        // Outside the lit part of the period the blinker bits drop out
        blinkers.phase = blinkers.on_period;
        let frame = build_frame(
            &GamepadSnapshot::centred(),
            &test_car(),
            &gcs,
            &blinkers,
        );
        let (_, lamps, _, _) = decode(&frame);
        assert_eq!(lamps, 0b1100);
    }

    #[test]
    fn test_wheel_target_scaling() {
        let mut car = test_car();
        car.lw_ctrl.target_speed = 1.0;
        car.rw_ctrl.target_speed = -0.5;

        let frame = build_frame(
            &GamepadSnapshot::centred(),
            &car,
            &GeneralCtrlState::default(),
            &Blinkers::new(),
        );

        let (_, _, lw, rw) = decode(&frame);
        assert_eq!(lw, 2047);
        // Truncation towards zero of -1023.5 + 0.5
        assert_eq!(rw, -1023);
    }

    #[test]
    fn test_wheel_target_clipped() {
        let mut car = test_car();
        car.lw_ctrl.target_speed = 5.0;
        car.rw_ctrl.target_speed = -5.0;

        let frame = build_frame(
            &GamepadSnapshot::centred(),
            &car,
            &GeneralCtrlState::default(),
            &Blinkers::new(),
        );

        let (_, _, lw, rw) = decode(&frame);
        assert_eq!(lw, 2047);
        assert_eq!(rw, -2047);
    }
}
