pub mod bassline;
pub mod clocks;
pub mod drums;
pub mod notes;

pub use bassline::{BasslineGenerator, Pattern, Slot};
pub use clocks::{ClockUnit, SubdivisionClock};
pub use drums::{DrumGenerator, DrumLane, DrumPattern};
pub use notes::Note;

/// Sixteenth-note steps per bar, everywhere.
pub const STEPS_PER_BAR: usize = 16;

pub(crate) fn choose<T: Copy>(rng: &mut fastrand::Rng, options: &[T]) -> T {
    options[rng.usize(0..options.len())]
}
