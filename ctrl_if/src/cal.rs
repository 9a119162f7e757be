//! # Gamepad axis calibration records
//!
//! Each axis carries a calibrated range and a central dead band ("slop").
//! [`axis_to_float`] converts a raw axis byte into a signed unit value
//! through its calibration. The [`CalSlot`] type defines the 31-byte wire
//! layout used by the persistent calibration store.

// ---------------------------------------------------------------------------
// IMPORTS
// ---------------------------------------------------------------------------

use serde::{Deserialize, Serialize};

// ---------------------------------------------------------------------------
// CONSTANTS
// ---------------------------------------------------------------------------

/// Number of bytes in a serialised calibration slot.
pub const SLOT_BYTES: usize = 31;

/// Offset of the gamepad calibration block within a serialised slot.
const GPC_OFFSET: usize = 7;

// ---------------------------------------------------------------------------
// DATA STRUCTURES
// ---------------------------------------------------------------------------

/// Calibration of a single axis.
///
/// Invariant: `low <= slop_low <= slop_high <= high`.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Serialize, Deserialize)]
pub struct AxisCal {
    /// Lowest raw value the axis is known to reach.
    pub low: u8,

    /// Highest raw value the axis is known to reach.
    pub high: u8,

    /// Lower edge of the dead band.
    pub slop_low: u8,

    /// Upper edge of the dead band.
    pub slop_high: u8,
}

/// Calibration of all six analogue axes of a gamepad.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Serialize, Deserialize)]
pub struct GamepadCal {
    pub leftx: AxisCal,
    pub lefty: AxisCal,
    pub rightx: AxisCal,
    pub righty: AxisCal,
    pub lefttrigger: AxisCal,
    pub righttrigger: AxisCal,
}

/// One persistent calibration slot: a rolling sequence number, the MAC
/// address of the gamepad the calibration belongs to, and the calibration
/// itself.
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub struct CalSlot {
    pub seq_num: u8,
    pub mac48: [u8; 6],
    pub gamepad_cal: GamepadCal,
}

// ---------------------------------------------------------------------------
// IMPLEMENTATIONS
// ---------------------------------------------------------------------------

impl AxisCal {
    /// Default calibration for a centre-sprung joystick axis.
    pub fn default_joystick() -> Self {
        Self {
            low: 0,
            high: 255,
            slop_low: 120,
            slop_high: 134,
        }
    }

    /// Default calibration for a trigger axis, which rests at zero.
    pub fn default_trigger() -> Self {
        Self {
            low: 0,
            high: 255,
            slop_low: 0,
            slop_high: 10,
        }
    }

    /// The midpoint of the dead band.
    pub fn mid_slop(&self) -> u8 {
        ((self.slop_low as u16 + self.slop_high as u16) >> 1) as u8
    }

    fn to_bytes(&self) -> [u8; 4] {
        [self.low, self.high, self.slop_low, self.slop_high]
    }

    fn from_bytes(b: &[u8]) -> Self {
        Self {
            low: b[0],
            high: b[1],
            slop_low: b[2],
            slop_high: b[3],
        }
    }
}

impl Default for GamepadCal {
    fn default() -> Self {
        Self {
            leftx: AxisCal::default_joystick(),
            lefty: AxisCal::default_joystick(),
            rightx: AxisCal::default_joystick(),
            righty: AxisCal::default_joystick(),
            lefttrigger: AxisCal::default_trigger(),
            righttrigger: AxisCal::default_trigger(),
        }
    }
}

impl CalSlot {
    /// Serialise the slot into its 31-byte wire form.
    pub fn to_bytes(&self) -> [u8; SLOT_BYTES] {
        let mut buf = [0u8; SLOT_BYTES];
        buf[0] = self.seq_num;
        buf[1..7].copy_from_slice(&self.mac48);

        let axes = [
            self.gamepad_cal.leftx,
            self.gamepad_cal.lefty,
            self.gamepad_cal.rightx,
            self.gamepad_cal.righty,
            self.gamepad_cal.lefttrigger,
            self.gamepad_cal.righttrigger,
        ];
        for (i, axis) in axes.iter().enumerate() {
            let o = GPC_OFFSET + 4 * i;
            buf[o..o + 4].copy_from_slice(&axis.to_bytes());
        }

        buf
    }

    /// Deserialise a slot from its 31-byte wire form.
    pub fn from_bytes(buf: &[u8; SLOT_BYTES]) -> Self {
        let mut mac48 = [0u8; 6];
        mac48.copy_from_slice(&buf[1..7]);

        let axis = |i: usize| AxisCal::from_bytes(&buf[GPC_OFFSET + 4 * i..]);

        Self {
            seq_num: buf[0],
            mac48,
            gamepad_cal: GamepadCal {
                leftx: axis(0),
                lefty: axis(1),
                rightx: axis(2),
                righty: axis(3),
                lefttrigger: axis(4),
                righttrigger: axis(5),
            },
        }
    }
}

// ---------------------------------------------------------------------------
// PUBLIC FUNCTIONS
// ---------------------------------------------------------------------------

/// Convert a raw axis byte into a signed unit value through a calibration.
///
/// The raw value is clamped to the calibrated range, values inside the dead
/// band map to exactly zero, and values outside it ramp linearly to -1.0 at
/// `low` and +1.0 at `high`.
pub fn axis_to_float(x: u8, cal: &AxisCal) -> f64 {
    let x = x.max(cal.low).min(cal.high);
    if x > cal.slop_high && cal.slop_high < cal.high {
        let slop_high = cal.slop_high as f64;
        (x as f64 - slop_high) / (cal.high as f64 - slop_high)
    } else if x < cal.slop_low && cal.slop_low > cal.low {
        let slop_low = cal.slop_low as f64;
        (x as f64 - slop_low) / (slop_low - cal.low as f64)
    } else {
        0.0
    }
}

// ---------------------------------------------------------------------------
// TESTS
// ---------------------------------------------------------------------------

#[cfg(test)]
mod test {
    use super::*;

    #[test]
    fn test_axis_to_float_dead_band() {
        let cal = AxisCal::default_joystick();

        // Anywhere inside the slop interval maps to exactly zero
        assert_eq!(axis_to_float(120, &cal), 0.0);
        assert_eq!(axis_to_float(127, &cal), 0.0);
        assert_eq!(axis_to_float(134, &cal), 0.0);

        // Extremes map to the full range
        assert_eq!(axis_to_float(255, &cal), 1.0);
        assert_eq!(axis_to_float(0, &cal), -1.0);

        // Positive half ramps from the slop edge
        let v = axis_to_float(194, &cal);
        assert!((v - 60.0 / 121.0).abs() < 1e-12);
    }

    #[test]
    fn test_axis_to_float_clamps() {
        let cal = AxisCal {
            low: 10,
            high: 200,
            slop_low: 100,
            slop_high: 110,
        };

        assert_eq!(axis_to_float(0, &cal), axis_to_float(10, &cal));
        assert_eq!(axis_to_float(255, &cal), 1.0);
    }

    #[test]
    fn test_axis_to_float_pinned_slop() {
        // A trigger has its slop edge pinned at the low end, so the low
        // branch must not divide by zero
        let cal = AxisCal::default_trigger();
        assert_eq!(axis_to_float(0, &cal), 0.0);
        assert_eq!(axis_to_float(10, &cal), 0.0);
        assert!(axis_to_float(255, &cal) == 1.0);
    }

    #[test]
    fn test_slot_round_trip() {
        let slot = CalSlot {
            seq_num: 42,
            mac48: [0xDE, 0xAD, 0xBE, 0xEF, 0x00, 0x01],
            gamepad_cal: GamepadCal {
                leftx: AxisCal {
                    low: 3,
                    high: 250,
                    slop_low: 118,
                    slop_high: 136,
                },
                ..GamepadCal::default()
            },
        };

        let bytes = slot.to_bytes();
        assert_eq!(bytes[0], 42);
        assert_eq!(&bytes[1..7], &slot.mac48);
        assert_eq!(bytes[GPC_OFFSET], 3);

        assert_eq!(CalSlot::from_bytes(&bytes), slot);
    }
}
