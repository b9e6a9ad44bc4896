use std::sync::{Arc, Mutex};

use log::debug;

use crate::instruments::{Instrument, InstrumentEvent};
use crate::params::{trigger, Parameter, Trigger};
use crate::sequencing::drums::{DrumGenerator, DrumPattern, DRUM_LANES};
use crate::sequencing::STEPS_PER_BAR;

const MUTE_NAMES: [&str; DRUM_LANES] = ["Mute BD", "Mute OH", "Mute CH", "Mute SD"];

/// The four-lane drum voice: one instrument per lane, a mute flag per lane,
/// and a pattern regenerated at bar boundaries on request.
pub struct DrumMachine {
    lanes: Vec<Mutex<Box<dyn Instrument>>>,
    gen: DrumGenerator,
    pub pattern: Arc<Parameter<DrumPattern>>,
    pub mutes: Vec<Arc<Parameter<bool>>>,
    pub new_pattern: Trigger,
}

impl DrumMachine {
    pub fn new(lanes: Vec<Box<dyn Instrument>>, gen: DrumGenerator) -> Result<Arc<Self>, String> {
        if lanes.len() != DRUM_LANES {
            return Err(format!(
                "drum machine needs {} lane instruments, got {}",
                DRUM_LANES,
                lanes.len()
            ));
        }

        Ok(Arc::new(Self {
            lanes: lanes.into_iter().map(Mutex::new).collect(),
            gen,
            pattern: Parameter::new("Drum Pattern", DrumPattern::new()),
            mutes: MUTE_NAMES
                .iter()
                .map(|name| Parameter::new(name, false))
                .collect(),
            new_pattern: trigger("New Drum Pattern", true),
        }))
    }

    pub fn step(&self, index: usize) {
        if (index % STEPS_PER_BAR == 0 && self.new_pattern.get()) || self.pattern.get().is_empty() {
            // Always a full kit: the silent archetypes are for direct
            // generator use only
            let fresh = self.gen.create_patterns(true);
            debug!(
                "drum pattern regenerated, {} hits",
                fresh.iter().flatten().filter(|&&v| v > 0.0).count()
            );
            self.pattern.set(fresh);
            self.new_pattern.set(false);
        }

        let pattern = self.pattern.get();
        for (lane, steps) in pattern.iter().enumerate() {
            let velocity = steps[index % steps.len()];
            if velocity > 0.0 && !self.mutes[lane].get() {
                if let Ok(mut instrument) = self.lanes[lane].lock() {
                    instrument.handle_event(InstrumentEvent::Play(velocity)).ok();
                }
            }
        }
    }
}
