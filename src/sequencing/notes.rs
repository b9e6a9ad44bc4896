use std::fmt;

use serde::Serialize;

const NOTE_NAMES: [&str; 12] = [
    "C", "C#", "D", "D#", "E", "F", "F#", "G", "G#", "A", "A#", "B",
];

/// A pitch as a MIDI note number.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
pub struct Note(pub u8);

impl Note {
    /// Text name, octave = note / 12 (so 28 reads as "E2").
    pub fn name(&self) -> String {
        format!("{}{}", NOTE_NAMES[(self.0 % 12) as usize], self.0 / 12)
    }

    /// Equal-tempered frequency, A440 at MIDI 69. For instrument implementors.
    pub fn frequency(&self) -> f32 {
        440.0 * 2.0_f32.powf((self.0 as f32 - 69.0) / 12.0)
    }
}

impl fmt::Display for Note {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.name())
    }
}
