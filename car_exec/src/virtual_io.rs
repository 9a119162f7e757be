//! Virtual output pins
//!
//! The core emits a bitmask of logical lamp states; this module fans it out
//! to physical pins. Each virtual output carries its own sense and drive
//! mode, so open-drain wiring and active-low lamps are handled here rather
//! than in the control logic. The actual register writes go through the
//! [`PinBackend`] trait.

// ---------------------------------------------------------------------------
// IMPORTS
// ---------------------------------------------------------------------------

use log::trace;
use util::bits::fetch_bit;

// ---------------------------------------------------------------------------
// ENUMERATIONS
// ---------------------------------------------------------------------------

/// Electrical sense of a virtual output.
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub enum VoSense {
    ActiveHigh,
    ActiveLow,
}

/// How a virtual output drives its pin.
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub enum VoDriveMode {
    /// Push-pull: the pin both sources and sinks.
    DriveSink,

    /// Open drain with the weak pull-up providing the high state.
    WpuSink,

    /// Source only: high drives, low floats.
    DriveOnly,

    /// Sink only: low drives, high floats.
    SinkOnly,
}

/// Pin direction and pull configuration understood by the backend.
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub enum PinMode {
    Input,
    InputPullup,
    Output,
}

// ---------------------------------------------------------------------------
// DATA STRUCTURES
// ---------------------------------------------------------------------------

/// Descriptor of one virtual output pin.
#[derive(Clone, Copy, Debug)]
pub struct VoPin {
    /// The physical pin number.
    pub pin: u8,

    pub sense: VoSense,
    pub drive_mode: VoDriveMode,
}

// ---------------------------------------------------------------------------
// CONSTANTS
// ---------------------------------------------------------------------------

/// The car's lamp outputs. Descriptor `i` is driven by bit `i` of the lamp
/// mask assembled by motion control.
pub const CAR_VO_PINS: [VoPin; 5] = [
    // Stop lamp
    VoPin {
        pin: 16,
        sense: VoSense::ActiveHigh,
        drive_mode: VoDriveMode::DriveSink,
    },
    // Reversing lamp
    VoPin {
        pin: 17,
        sense: VoSense::ActiveHigh,
        drive_mode: VoDriveMode::DriveSink,
    },
    // Left indicator
    VoPin {
        pin: 18,
        sense: VoSense::ActiveHigh,
        drive_mode: VoDriveMode::DriveSink,
    },
    // Right indicator
    VoPin {
        pin: 19,
        sense: VoSense::ActiveHigh,
        drive_mode: VoDriveMode::DriveSink,
    },
    // Bluetooth status, wired open-drain to the onboard LED
    VoPin {
        pin: 2,
        sense: VoSense::ActiveLow,
        drive_mode: VoDriveMode::WpuSink,
    },
];

// ---------------------------------------------------------------------------
// TRAITS
// ---------------------------------------------------------------------------

/// The hardware layer a virtual output writes through.
pub trait PinBackend {
    fn pin_mode(&mut self, pin: u8, mode: PinMode);
    fn digital_write(&mut self, pin: u8, level: bool);
}

// ---------------------------------------------------------------------------
// PUBLIC FUNCTIONS
// ---------------------------------------------------------------------------

/// Drive one virtual output to a logical state.
pub fn write_pin<B: PinBackend>(logical_state: bool, vo_desc: &VoPin, backend: &mut B) {
    let state = logical_state != (vo_desc.sense == VoSense::ActiveLow);
    match vo_desc.drive_mode {
        VoDriveMode::DriveSink => {
            backend.digital_write(vo_desc.pin, state);
        }
        VoDriveMode::DriveOnly => {
            if state {
                backend.pin_mode(vo_desc.pin, PinMode::Output);
                backend.digital_write(vo_desc.pin, true);
            } else {
                backend.pin_mode(vo_desc.pin, PinMode::Input);
            }
        }
        VoDriveMode::SinkOnly => {
            if state {
                backend.pin_mode(vo_desc.pin, PinMode::Input);
            } else {
                backend.pin_mode(vo_desc.pin, PinMode::Output);
                backend.digital_write(vo_desc.pin, false);
            }
        }
        VoDriveMode::WpuSink => {
            if state {
                backend.pin_mode(vo_desc.pin, PinMode::InputPullup);
            } else {
                backend.pin_mode(vo_desc.pin, PinMode::Output);
                backend.digital_write(vo_desc.pin, false);
            }
        }
    }
}

/// Fan a logical bitmask out to an array of virtual outputs; bit `i` of the
/// mask drives descriptor `i`.
pub fn write_pins<B: PinBackend>(vo_states: u32, vo_array: &[VoPin], backend: &mut B) {
    for (i, vo_desc) in vo_array.iter().enumerate() {
        write_pin(fetch_bit(vo_states, i as u32), vo_desc, backend);
    }
}

/// Configure one virtual output at boot and drive it to its initial state.
pub fn config_pin<B: PinBackend>(logical_state: bool, vo_desc: &VoPin, backend: &mut B) {
    if vo_desc.drive_mode == VoDriveMode::DriveSink {
        backend.pin_mode(vo_desc.pin, PinMode::Output);
    }
    // It turns out that most of the configuration work is performed in the
    // pin output function.
    write_pin(logical_state, vo_desc, backend);
}

/// Configure an array of virtual outputs at boot.
pub fn config_pins<B: PinBackend>(vo_states: u32, vo_array: &[VoPin], backend: &mut B) {
    for (i, vo_desc) in vo_array.iter().enumerate() {
        config_pin(fetch_bit(vo_states, i as u32), vo_desc, backend);
    }
}

// ---------------------------------------------------------------------------
// BACKENDS
// ---------------------------------------------------------------------------

/// A backend which logs operations instead of touching hardware, used when
/// running on a host without GPIO.
pub struct LogBackend;

impl PinBackend for LogBackend {
    fn pin_mode(&mut self, pin: u8, mode: PinMode) {
        trace!("pin {}: mode {:?}", pin, mode);
    }

    fn digital_write(&mut self, pin: u8, level: bool) {
        trace!("pin {}: {}", pin, level as u8);
    }
}

/// A backend which records every operation, for tests.
#[derive(Default, Debug)]
pub struct RecordingBackend {
    /// (pin, mode) pairs in call order.
    pub modes: Vec<(u8, PinMode)>,

    /// (pin, level) pairs in call order.
    pub writes: Vec<(u8, bool)>,
}

impl PinBackend for RecordingBackend {
    fn pin_mode(&mut self, pin: u8, mode: PinMode) {
        self.modes.push((pin, mode));
    }

    fn digital_write(&mut self, pin: u8, level: bool) {
        self.writes.push((pin, level));
    }
}

// ---------------------------------------------------------------------------
// TESTS
// ---------------------------------------------------------------------------

#[cfg(test)]
mod test {
    use super::*;

    #[test]
    fn test_drive_sink_writes_level() {
        let mut backend = RecordingBackend::default();
        let desc = VoPin {
            pin: 5,
            sense: VoSense::ActiveHigh,
            drive_mode: VoDriveMode::DriveSink,
        };

        write_pin(true, &desc, &mut backend);
        write_pin(false, &desc, &mut backend);

        assert_eq!(backend.writes, vec![(5, true), (5, false)]);
        assert!(backend.modes.is_empty());
    }

    #[test]
    fn test_active_low_inverts() {
        let mut backend = RecordingBackend::default();
        let desc = VoPin {
            pin: 7,
            sense: VoSense::ActiveLow,
            drive_mode: VoDriveMode::DriveSink,
        };

        write_pin(true, &desc, &mut backend);
        assert_eq!(backend.writes, vec![(7, false)]);
    }

    #[test]
    fn test_wpu_sink_floats_high() {
        let mut backend = RecordingBackend::default();
        let desc = VoPin {
            pin: 9,
            sense: VoSense::ActiveHigh,
            drive_mode: VoDriveMode::WpuSink,
        };

        // High releases the pin to the pull-up
        write_pin(true, &desc, &mut backend);
        assert_eq!(backend.modes, vec![(9, PinMode::InputPullup)]);
        assert!(backend.writes.is_empty());

        // Low actively sinks
        write_pin(false, &desc, &mut backend);
        assert_eq!(backend.modes.last(), Some(&(9, PinMode::Output)));
        assert_eq!(backend.writes, vec![(9, false)]);
    }

    #[test]
    fn test_mask_fan_out() {
        let mut backend = RecordingBackend::default();
        let descs = [
            VoPin {
                pin: 1,
                sense: VoSense::ActiveHigh,
                drive_mode: VoDriveMode::DriveSink,
            },
            VoPin {
                pin: 2,
                sense: VoSense::ActiveHigh,
                drive_mode: VoDriveMode::DriveSink,
            },
            VoPin {
                pin: 3,
                sense: VoSense::ActiveHigh,
                drive_mode: VoDriveMode::DriveSink,
            },
        ];

        write_pins(0b101, &descs, &mut backend);

        assert_eq!(backend.writes, vec![(1, true), (2, false), (3, true)]);
    }

    #[test]
    fn test_config_push_pull_sets_direction() {
        let mut backend = RecordingBackend::default();
        let desc = VoPin {
            pin: 4,
            sense: VoSense::ActiveHigh,
            drive_mode: VoDriveMode::DriveSink,
        };

        config_pin(false, &desc, &mut backend);

        assert_eq!(backend.modes, vec![(4, PinMode::Output)]);
        assert_eq!(backend.writes, vec![(4, false)]);
    }
}
