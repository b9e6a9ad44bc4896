use std::sync::Arc;
use std::time::Duration;

use crate::params::{NumericParameter, Parameter};

use super::STEPS_PER_BAR;

/// Four subdivisions per beat: sixteenth notes.
pub const SUBDIVISIONS_PER_BEAT: u32 = 4;
pub const BPM_BOUNDS: (f32, f32) = (70.0, 200.0);
pub const DEFAULT_BPM: f32 = 125.0;

fn shuffle_factor(shuffle: f32, tick: u64) -> f32 {
    // Even ticks stretch, odd ticks shrink: alternating swing
    if tick % 2 == 0 {
        1.0 + shuffle
    } else {
        1.0 - shuffle
    }
}

/// Counts sixteenth-note ticks without bound and computes the spacing between
/// them. The tempo is read fresh at every reschedule, so a bpm change lands on
/// the next tick and never resets phase.
pub struct SubdivisionClock {
    subdivisions_per_beat: u32,
    shuffle: f32,
    tick: u64,
}

impl SubdivisionClock {
    pub fn new(subdivisions_per_beat: u32, shuffle: f32) -> Self {
        Self {
            subdivisions_per_beat,
            shuffle,
            tick: 0,
        }
    }

    pub fn current_tick(&self) -> u64 {
        self.tick
    }

    /// Current position inside the bar. Wrapping is the consumer's concern;
    /// the clock itself counts without bound.
    pub fn current_step(&self) -> u8 {
        (self.tick % STEPS_PER_BAR as u64) as u8
    }

    /// Fire one tick: returns the index of the tick that just fired.
    pub fn advance(&mut self) -> u64 {
        let fired = self.tick;
        self.tick += 1;
        fired
    }

    /// Nominal spacing before the first tick, no swing applied.
    pub fn base_interval(&self, bpm: f32) -> Duration {
        Duration::from_secs_f32(60_000.0 / bpm / self.subdivisions_per_beat as f32 / 1000.0)
    }

    pub fn interval_after_ms(&self, fired_tick: u64, bpm: f32) -> f32 {
        shuffle_factor(self.shuffle, fired_tick) * (60_000.0 / bpm) / self.subdivisions_per_beat as f32
    }

    /// Spacing between the tick that just fired and the next one.
    pub fn interval_after(&self, fired_tick: u64, bpm: f32) -> Duration {
        Duration::from_secs_f32(self.interval_after_ms(fired_tick, bpm) / 1000.0)
    }
}

/// The clock's parameter surface: tempo in, wrapped step position out.
pub struct ClockUnit {
    pub bpm: NumericParameter,
    pub current_step: Arc<Parameter<u8>>,
}

impl ClockUnit {
    pub fn new(bpm: f32) -> Self {
        Self {
            bpm: NumericParameter::new("BPM", BPM_BOUNDS, bpm),
            current_step: Parameter::new("Current Step", 0),
        }
    }
}
