use std::sync::{Arc, Mutex};

use log::debug;

use crate::instruments::{Instrument, InstrumentEvent};
use crate::params::{trigger, NumericParameter, Parameter, Trigger};
use crate::sequencing::bassline::{BasslineGenerator, Pattern};
use crate::sequencing::STEPS_PER_BAR;

/// The continuously-drifting dials of one bassline voice. Each write is
/// pushed straight into the instrument by subscription.
pub struct BasslineDials {
    pub cutoff: NumericParameter,
    pub resonance: NumericParameter,
    pub env_mod: NumericParameter,
    pub decay: NumericParameter,
}

impl BasslineDials {
    fn new(voice: usize) -> Self {
        let label = |dial: &str| format!("Voice {} {}", voice + 1, dial);
        Self {
            cutoff: NumericParameter::new(&label("Cutoff"), (30.0, 700.0), 400.0),
            resonance: NumericParameter::new(&label("Resonance"), (1.0, 30.0), 15.0),
            env_mod: NumericParameter::new(&label("Env Mod"), (0.0, 8000.0), 4000.0),
            decay: NumericParameter::new(&label("Decay"), (0.1, 0.9), 0.5),
        }
    }
}

/// One sequenced melodic voice: owns its pattern, regenerates it at bar
/// boundaries when asked, and dispatches the current slot on every clock step.
pub struct BasslineMachine {
    synth: Arc<Mutex<dyn Instrument>>,
    gen: Arc<BasslineGenerator>,
    pub pattern: Arc<Parameter<Pattern>>,
    pub new_pattern: Trigger,
    pub dials: BasslineDials,
}

impl BasslineMachine {
    pub fn new(
        synth: Arc<Mutex<dyn Instrument>>,
        gen: Arc<BasslineGenerator>,
        voice: usize,
    ) -> Arc<Self> {
        let pattern = Parameter::new(&format!("Voice {} Pattern", voice + 1), Pattern::new());
        let new_pattern = trigger(&format!("Voice {} New Pattern", voice + 1), true);

        // Fresh pitch material asks every voice for a fresh pattern on the
        // next bar boundary
        {
            let new_pattern = Arc::clone(&new_pattern);
            gen.new_notes.subscribe(move |raised| {
                if *raised {
                    new_pattern.set(true);
                }
            });
        }

        let dials = BasslineDials::new(voice);
        Self::push_dial(&synth, &dials.cutoff, InstrumentEvent::SetCutoff);
        Self::push_dial(&synth, &dials.resonance, InstrumentEvent::SetResonance);
        Self::push_dial(&synth, &dials.env_mod, InstrumentEvent::SetEnvMod);
        Self::push_dial(&synth, &dials.decay, InstrumentEvent::SetDecay);

        Arc::new(Self {
            synth,
            gen,
            pattern,
            new_pattern,
            dials,
        })
    }

    fn push_dial(
        synth: &Arc<Mutex<dyn Instrument>>,
        dial: &NumericParameter,
        event: fn(f32) -> InstrumentEvent,
    ) {
        let synth = Arc::clone(synth);
        dial.subscribe(move |value| {
            if let Ok(mut synth) = synth.lock() {
                synth.handle_event(event(*value)).ok();
            }
        });
    }

    pub fn step(&self, index: usize) {
        if (index % STEPS_PER_BAR == 0 && self.new_pattern.get()) || self.pattern.get().is_empty() {
            let fresh = self.gen.create_pattern();
            debug!(
                "{}: regenerated, {} active steps",
                self.pattern.name(),
                fresh.iter().filter(|s| !s.is_rest()).count()
            );
            self.pattern.set(fresh);
            self.new_pattern.set(false);
        }

        let pattern = self.pattern.get();
        let slot = pattern[index % pattern.len()];
        let event = match slot.note {
            Some(note) => InstrumentEvent::NoteOn {
                note,
                accent: slot.accent,
                glide: slot.glide,
            },
            None => InstrumentEvent::NoteOff,
        };
        if let Ok(mut synth) = self.synth.lock() {
            synth.handle_event(event).ok();
        }
    }
}
