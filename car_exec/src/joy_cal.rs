//! Gamepad axis calibration learning
//!
//! Calibration is learned passively while the operator waggles the sticks:
//! each axis starts from its template, collapses to the first off-rest
//! value it sees and then widens with the observed extremes. The dead band
//! follows the resting value for a short window so that a stick which does
//! not return exactly to centre still reads as zero.

// ---------------------------------------------------------------------------
// IMPORTS
// ---------------------------------------------------------------------------

// External
use ctrl_if::cal::{AxisCal, GamepadCal};
use ctrl_if::gamepad::GamepadSnapshot;

// ---------------------------------------------------------------------------
// CONSTANTS
// ---------------------------------------------------------------------------

/// How long the dead band keeps following the resting value.
const SLOP_TIME_THRESHOLD_MS: f64 = 500.0;

// ---------------------------------------------------------------------------
// DATA STRUCTURES
// ---------------------------------------------------------------------------

/// Activation and dead-band thresholds for a kind of axis.
#[derive(Clone, Copy, Debug)]
pub struct AxisTemplate {
    /// Values outside [low, high] mean the axis is being deflected and
    /// learning should begin.
    pub low: u8,
    pub high: u8,

    /// The band a resting axis is expected to sit in.
    pub slop_low: u8,
    pub slop_high: u8,
}

/// Per-axis learning state.
#[derive(Clone, Copy, Debug)]
pub struct AxisCalLearner {
    template: AxisTemplate,

    /// Time spent continuously inside the template dead band.
    slop_time_ms: f64,

    /// Whether the axis has been seen off rest and the calibration is
    /// tracking observations.
    floating: bool,
}

/// Learns the calibration of all six axes.
#[derive(Clone, Copy, Debug)]
pub struct GamepadCalibrator {
    leftx: AxisCalLearner,
    lefty: AxisCalLearner,
    rightx: AxisCalLearner,
    righty: AxisCalLearner,
    lefttrigger: AxisCalLearner,
    righttrigger: AxisCalLearner,
}

// ---------------------------------------------------------------------------
// IMPLEMENTATIONS
// ---------------------------------------------------------------------------

impl AxisTemplate {
    /// Template for a centre-sprung joystick axis.
    pub fn joystick() -> Self {
        Self {
            low: 96,
            high: 160,
            slop_low: 112,
            slop_high: 144,
        }
    }

    /// Template for a trigger axis, which rests at zero.
    pub fn trigger() -> Self {
        Self {
            low: 0,
            high: 48,
            slop_low: 0,
            slop_high: 24,
        }
    }
}

impl AxisCalLearner {
    pub fn new(template: AxisTemplate) -> Self {
        Self {
            template,
            slop_time_ms: 0.0,
            floating: false,
        }
    }

    /// Feed one raw sample of duration `delta_time_ms` into the learner.
    pub fn sample(&mut self, cal: &mut AxisCal, x: u8, delta_time_ms: f64) {
        if !self.floating {
            if x < self.template.low || x > self.template.high {
                // First real deflection: collapse the calibration onto the
                // observation and start tracking
                self.floating = true;
                cal.low = x;
                cal.high = x;
                cal.slop_low = x;
                cal.slop_high = x;
            }
            return;
        }

        // Track the observed extremes
        cal.low = cal.low.min(x);
        cal.high = cal.high.max(x);

        if x >= self.template.slop_low && x <= self.template.slop_high {
            if self.slop_time_ms == 0.0 {
                // A fresh rest dwell recentres the dead band
                cal.slop_low = x;
                cal.slop_high = x;
            } else if self.slop_time_ms < SLOP_TIME_THRESHOLD_MS {
                // Early in the dwell the dead band follows the value
                cal.slop_low = cal.slop_low.min(x);
                cal.slop_high = cal.slop_high.max(x);
            }
            self.slop_time_ms += delta_time_ms;
        } else {
            self.slop_time_ms = 0.0;
        }
    }
}

impl GamepadCalibrator {
    pub fn new() -> Self {
        Self {
            leftx: AxisCalLearner::new(AxisTemplate::joystick()),
            lefty: AxisCalLearner::new(AxisTemplate::joystick()),
            rightx: AxisCalLearner::new(AxisTemplate::joystick()),
            righty: AxisCalLearner::new(AxisTemplate::joystick()),
            lefttrigger: AxisCalLearner::new(AxisTemplate::trigger()),
            righttrigger: AxisCalLearner::new(AxisTemplate::trigger()),
        }
    }

    /// Feed one snapshot of duration `delta_time_ms` into all six learners.
    pub fn sample(
        &mut self,
        cal: &mut GamepadCal,
        inp: &GamepadSnapshot,
        delta_time_ms: f64,
    ) {
        self.leftx.sample(&mut cal.leftx, inp.leftx, delta_time_ms);
        self.lefty.sample(&mut cal.lefty, inp.lefty, delta_time_ms);
        self.rightx.sample(&mut cal.rightx, inp.rightx, delta_time_ms);
        self.righty.sample(&mut cal.righty, inp.righty, delta_time_ms);
        self.lefttrigger
            .sample(&mut cal.lefttrigger, inp.lefttrigger, delta_time_ms);
        self.righttrigger
            .sample(&mut cal.righttrigger, inp.righttrigger, delta_time_ms);
    }
}

impl Default for GamepadCalibrator {
    fn default() -> Self {
        Self::new()
    }
}

// ---------------------------------------------------------------------------
// TESTS
// ---------------------------------------------------------------------------
