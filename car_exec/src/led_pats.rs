//! Gamepad LED patterns
//!
//! The gamepad carries four player LEDs which double as a status display.
//! The display cycles through three slots (battery level, input layout and
//! speed range), each shown for a fixed period.

// ---------------------------------------------------------------------------
// IMPORTS
// ---------------------------------------------------------------------------

use crate::motion_ctrl::Idm;

// ---------------------------------------------------------------------------
// CONSTANTS
// ---------------------------------------------------------------------------

/// How long each display slot is shown.
pub const LED_PAT_PERIOD_MS: u16 = 1250;

// ---------------------------------------------------------------------------
// ENUMERATIONS
// ---------------------------------------------------------------------------

/// The fixed 4-bit LED patterns.
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
#[repr(u8)]
pub enum LedPattern {
    BattLevel4 = 10, // 1111
    BattLevel3 = 9,  // 1110
    BattLevel2 = 7,  // 1100
    BattLevel1 = 4,  // 1000
    JoyIso = 3,      // 0100
    JoyVh = 8,       // 1101
    JoyModHPat = 6,  // 1010
    JoyHPat = 5,     // 1001
    Slow = 1,        // 0001
    Fast = 2,        // 0010
}

/// The three display slots, cycled in order.
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub enum DisplaySlot {
    Battery,
    Layout,
    Speed,
}

const DISPLAY_SLOTS: [DisplaySlot; 3] =
    [DisplaySlot::Battery, DisplaySlot::Layout, DisplaySlot::Speed];

// ---------------------------------------------------------------------------
// DATA STRUCTURES
// ---------------------------------------------------------------------------

/// Cycles the LED display through its slots.
#[derive(Clone, Copy, Debug, Default)]
pub struct LedPatDisplay {
    slot_index: usize,
    phase_ms: u16,
}

// ---------------------------------------------------------------------------
// IMPLEMENTATIONS
// ---------------------------------------------------------------------------

impl LedPatDisplay {
    /// The slot currently shown.
    pub fn current_slot(&self) -> DisplaySlot {
        DISPLAY_SLOTS[self.slot_index]
    }

    /// The pattern to show for the current slot and vehicle state.
    pub fn current_pattern(&self, battery_level: u8, idm: Idm, fast: bool) -> LedPattern {
        match self.current_slot() {
            DisplaySlot::Battery => battery_pattern(battery_level),
            DisplaySlot::Layout => layout_pattern(idm),
            DisplaySlot::Speed => {
                if fast {
                    LedPattern::Fast
                } else {
                    LedPattern::Slow
                }
            }
        }
    }

    /// Advance the display, moving to the next slot each period.
    pub fn integrate_ms(&mut self, delta_time_ms: u16) {
        self.phase_ms += delta_time_ms;
        while self.phase_ms >= LED_PAT_PERIOD_MS {
            self.phase_ms -= LED_PAT_PERIOD_MS;
            self.slot_index = (self.slot_index + 1) % DISPLAY_SLOTS.len();
        }
    }
}

// ---------------------------------------------------------------------------
// PRIVATE FUNCTIONS
// ---------------------------------------------------------------------------

/// Pattern for a battery level of 1 (nearly flat) to 4 (full).
fn battery_pattern(level: u8) -> LedPattern {
    match level {
        0 | 1 => LedPattern::BattLevel1,
        2 => LedPattern::BattLevel2,
        3 => LedPattern::BattLevel3,
        _ => LedPattern::BattLevel4,
    }
}

fn layout_pattern(idm: Idm) -> LedPattern {
    match idm {
        Idm::Iso => LedPattern::JoyIso,
        Idm::Vh => LedPattern::JoyVh,
        Idm::ModHPat => LedPattern::JoyModHPat,
        Idm::HPat => LedPattern::JoyHPat,
    }
}

// ---------------------------------------------------------------------------
// TESTS
// ---------------------------------------------------------------------------

#[cfg(test)]
mod test {
    use super::*;

    #[test]
    fn test_display_cycles_slots() {
        let mut disp = LedPatDisplay::default();
        assert_eq!(disp.current_slot(), DisplaySlot::Battery);

        disp.integrate_ms(LED_PAT_PERIOD_MS);
        assert_eq!(disp.current_slot(), DisplaySlot::Layout);

        disp.integrate_ms(LED_PAT_PERIOD_MS);
        assert_eq!(disp.current_slot(), DisplaySlot::Speed);

        disp.integrate_ms(LED_PAT_PERIOD_MS);
        assert_eq!(disp.current_slot(), DisplaySlot::Battery);
    }

    #[test]
    fn test_patterns() {
        let disp = LedPatDisplay::default();

        assert_eq!(disp.current_pattern(4, Idm::Iso, false), LedPattern::BattLevel4);
        assert_eq!(disp.current_pattern(1, Idm::Iso, false), LedPattern::BattLevel1);

        let mut disp = disp;
        disp.integrate_ms(LED_PAT_PERIOD_MS);
        assert_eq!(disp.current_pattern(4, Idm::HPat, false), LedPattern::JoyHPat);

        disp.integrate_ms(LED_PAT_PERIOD_MS);
        assert_eq!(disp.current_pattern(4, Idm::HPat, true), LedPattern::Fast);
    }
}
