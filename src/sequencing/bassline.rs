use std::sync::{Arc, Mutex};

use fastrand::Rng;
use log::debug;
use serde::Serialize;

use crate::params::{trigger, Parameter, Trigger};

use super::notes::Note;
use super::{choose, STEPS_PER_BAR};

/// One sixteenth-note slot of a bassline pattern. `note: None` is a rest.
#[derive(Debug, Clone, Copy, PartialEq, Serialize)]
pub struct Slot {
    pub note: Option<Note>,
    pub accent: bool,
    pub glide: bool,
}

impl Slot {
    pub fn rest() -> Self {
        Self {
            note: None,
            accent: false,
            glide: false,
        }
    }

    pub fn is_rest(&self) -> bool {
        self.note.is_none()
    }
}

/// Empty before first generation, exactly one bar of slots afterwards.
pub type Pattern = Vec<Slot>;

/// Interval-offset shapes the palette is built from. Repeated degrees weight
/// the root and octave so most palettes stay anchored.
const OFFSET_CHOICES: [&[u8]; 8] = [
    &[0, 0, 12, 24, 27],
    &[0, 0, 0, 12, 10, 19, 26, 27],
    &[0, 1, 7, 10, 12, 13],
    &[0],
    &[0, 0, 0, 12],
    &[0, 0, 12, 14, 15, 19],
    &[0, 0, 0, 0, 12, 13, 16, 19, 22, 24, 25],
    &[0, 0, 0, 7, 12, 15, 17, 20, 24],
];

const DENSITY: f32 = 1.0;

/// Stochastic bassline pattern source, shared by every melodic voice.
///
/// The note palette lives here so all voices draw from the same pitch
/// material; raising `new_notes` makes the next `create_pattern` call replace
/// the palette first.
pub struct BasslineGenerator {
    pub note_set: Arc<Parameter<Vec<Note>>>,
    pub new_notes: Trigger,
    rng: Mutex<Rng>,
}

impl BasslineGenerator {
    pub fn new(rng: Rng) -> Arc<Self> {
        Arc::new(Self {
            note_set: Parameter::new("note set", vec![Note(12)]),
            new_notes: trigger("new note set", true),
            rng: Mutex::new(rng),
        })
    }

    fn change_notes(&self, rng: &mut Rng) {
        let root = 16 + rng.u8(0..15);
        let offsets = choose(rng, &OFFSET_CHOICES);
        let notes: Vec<Note> = offsets.iter().map(|o| Note(root + o)).collect();
        debug!("new palette rooted at {}: {:?}", Note(root), notes.iter().map(Note::name).collect::<Vec<_>>());
        self.note_set.set(notes);
    }

    /// Produce one bar of slots from the current palette. Consumes `new_notes`
    /// first if it is raised.
    pub fn create_pattern(&self) -> Pattern {
        let mut rng = self.rng.lock().unwrap();

        if self.new_notes.get() {
            self.change_notes(&mut rng);
            self.new_notes.set(false);
        }

        let note_set = self.note_set.get();
        let mut pattern = Pattern::with_capacity(STEPS_PER_BAR);
        for i in 0..STEPS_PER_BAR {
            // Downbeats hit most often, then triplet positions, then even steps
            let chance = DENSITY
                * if i % 4 == 0 {
                    0.6
                } else if i % 3 == 0 {
                    0.5
                } else if i % 2 == 0 {
                    0.3
                } else {
                    0.1
                };

            if rng.f32() < chance {
                pattern.push(Slot {
                    note: Some(choose(&mut rng, &note_set)),
                    accent: rng.f32() < 0.3,
                    glide: rng.f32() < 0.1,
                });
            } else {
                pattern.push(Slot::rest());
            }
        }

        pattern
    }
}
