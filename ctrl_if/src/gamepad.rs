//! # Gamepad input snapshot
//!
//! The gamepad driver delivers one [`GamepadSnapshot`] per report: six raw
//! 8-bit axes plus the full button set. The control core only ever sees
//! these snapshots, never the transport that produced them.

// ---------------------------------------------------------------------------
// IMPORTS
// ---------------------------------------------------------------------------

use serde::{Deserialize, Serialize};
use thiserror::Error;

// ---------------------------------------------------------------------------
// CONSTANTS
// ---------------------------------------------------------------------------

/// Bit positions of each button within the packed button bitfield.
///
/// This is the single source of truth for the wire layout used by the
/// simulator telemetry frame, so the assignments must not be reordered.
pub mod btn_bit {
    pub const CROSS: u32 = 0;
    pub const CIRCLE: u32 = 1;
    pub const TRIANGLE: u32 = 2;
    pub const SQUARE: u32 = 3;
    pub const L1: u32 = 4;
    pub const R1: u32 = 5;
    pub const L2: u32 = 6;
    pub const R2: u32 = 7;
    pub const SELECT: u32 = 8;
    pub const START: u32 = 9;
    pub const PS: u32 = 10;
    pub const L3: u32 = 11;
    pub const R3: u32 = 12;
    pub const UP: u32 = 13;
    pub const DOWN: u32 = 14;
    pub const LEFT: u32 = 15;
    pub const RIGHT: u32 = 16;
}

// ---------------------------------------------------------------------------
// DATA STRUCTURES
// ---------------------------------------------------------------------------

/// The state of every button on the gamepad.
#[derive(Clone, Copy, Default, Debug, Serialize, Deserialize)]
pub struct Buttons {
    #[serde(default)]
    pub cross: bool,
    #[serde(default)]
    pub circle: bool,
    #[serde(default)]
    pub triangle: bool,
    #[serde(default)]
    pub square: bool,
    #[serde(default)]
    pub l1: bool,
    #[serde(default)]
    pub r1: bool,
    #[serde(default)]
    pub l2: bool,
    #[serde(default)]
    pub r2: bool,
    #[serde(default)]
    pub select: bool,
    #[serde(default)]
    pub start: bool,
    #[serde(default)]
    pub ps: bool,
    #[serde(default)]
    pub l3: bool,
    #[serde(default)]
    pub r3: bool,
    #[serde(default)]
    pub up: bool,
    #[serde(default)]
    pub down: bool,
    #[serde(default)]
    pub left: bool,
    #[serde(default)]
    pub right: bool,
}

/// A single gamepad report.
///
/// Axes are raw unsigned bytes as delivered by the driver, 0 to 255 with
/// the joystick resting position near 127 and triggers resting at 0.
#[derive(Clone, Copy, Default, Debug, Serialize, Deserialize)]
pub struct GamepadSnapshot {
    pub leftx: u8,
    pub lefty: u8,
    pub rightx: u8,
    pub righty: u8,
    pub lefttrigger: u8,
    pub righttrigger: u8,
    #[serde(default)]
    pub buttons: Buttons,
}

// ---------------------------------------------------------------------------
// ENUMERATIONS
// ---------------------------------------------------------------------------

/// An error which can occur when parsing a snapshot from JSON.
#[derive(Debug, Error)]
pub enum SnapshotParseError {
    #[error("Snapshot contains invalid JSON: {0}")]
    InvalidJson(#[from] serde_json::Error),
}

// ---------------------------------------------------------------------------
// IMPLEMENTATIONS
// ---------------------------------------------------------------------------

impl Buttons {
    /// Pack the buttons into the 17-bit wire bitfield.
    pub fn to_bitfield(&self) -> u32 {
        ((self.cross as u32) << btn_bit::CROSS)
            | ((self.circle as u32) << btn_bit::CIRCLE)
            | ((self.triangle as u32) << btn_bit::TRIANGLE)
            | ((self.square as u32) << btn_bit::SQUARE)
            | ((self.l1 as u32) << btn_bit::L1)
            | ((self.r1 as u32) << btn_bit::R1)
            | ((self.l2 as u32) << btn_bit::L2)
            | ((self.r2 as u32) << btn_bit::R2)
            | ((self.select as u32) << btn_bit::SELECT)
            | ((self.start as u32) << btn_bit::START)
            | ((self.ps as u32) << btn_bit::PS)
            | ((self.l3 as u32) << btn_bit::L3)
            | ((self.r3 as u32) << btn_bit::R3)
            | ((self.up as u32) << btn_bit::UP)
            | ((self.down as u32) << btn_bit::DOWN)
            | ((self.left as u32) << btn_bit::LEFT)
            | ((self.right as u32) << btn_bit::RIGHT)
    }
}

impl GamepadSnapshot {
    /// A snapshot with every axis at its resting position and no buttons
    /// pressed. Used when no gamepad report is available.
    pub fn centred() -> Self {
        Self {
            leftx: 127,
            lefty: 127,
            rightx: 127,
            righty: 127,
            lefttrigger: 0,
            righttrigger: 0,
            buttons: Buttons::default(),
        }
    }

    /// Parse a snapshot from a JSON payload.
    pub fn from_json(json_str: &str) -> Result<Self, SnapshotParseError> {
        Ok(serde_json::from_str(json_str)?)
    }
}

// ---------------------------------------------------------------------------
// TESTS
// ---------------------------------------------------------------------------

#[cfg(test)]
mod test {
    use super::*;

    #[test]
    fn test_bitfield_layout() {
        let mut b = Buttons::default();
        assert_eq!(b.to_bitfield(), 0);

        b.cross = true;
        b.select = true;
        b.right = true;
        assert_eq!(b.to_bitfield(), (1 << 0) | (1 << 8) | (1 << 16));
    }

    #[test]
    fn test_snapshot_json() {
        let snap: GamepadSnapshot = serde_json::from_str(
            r#"{"leftx": 127, "lefty": 255, "rightx": 127, "righty": 127,
                "lefttrigger": 0, "righttrigger": 0,
                "buttons": {"cross": true}}"#,
        )
        .unwrap();

        assert_eq!(snap.lefty, 255);
        assert!(snap.buttons.cross);
        assert!(!snap.buttons.circle);

        // Scripts may omit the buttons entirely
        let snap: GamepadSnapshot = serde_json::from_str(
            r#"{"leftx": 127, "lefty": 127, "rightx": 127, "righty": 127,
                "lefttrigger": 255, "righttrigger": 0}"#,
        )
        .unwrap();

        assert_eq!(snap.lefttrigger, 255);
        assert!(!snap.buttons.start);
    }
}
