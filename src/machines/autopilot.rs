use std::sync::{Arc, Mutex};

use fastrand::Rng;
use log::debug;

use crate::params::{Parameter, Trigger, WanderingParameter};
use crate::sequencing::bassline::BasslineGenerator;
use crate::sequencing::clocks::ClockUnit;
use crate::sequencing::drums::DRUM_LANES;

use super::bassline::BasslineMachine;
use super::delay::DelaySection;
use super::drums::DrumMachine;

/// Probability of muting each drum lane when the mutes are redrawn: the kick
/// drops out far less often than the rest.
const MUTE_CHANCES: [f32; DRUM_LANES] = [0.2, 0.5, 0.5, 0.5];

/// The measure-synchronized controller that keeps the machine playing itself.
///
/// Counts measures off the clock (the two counters are offset by one step so
/// mute changes and pattern changes never land on the same tick), rolls dice
/// on measure boundaries, and owns a wanderer for every continuous dial.
pub struct AutoPilot {
    pub upcoming_measure: Arc<Parameter<u64>>,
    pub current_measure: Arc<Parameter<u64>>,
    pub patterns_enabled: Arc<Parameter<bool>>,
    pub dials_enabled: Arc<Parameter<bool>>,
    pub mutes_enabled: Arc<Parameter<bool>>,
    wanderers: Mutex<Vec<WanderingParameter>>,
}

impl AutoPilot {
    pub fn new(
        clock: &ClockUnit,
        gen: &Arc<BasslineGenerator>,
        basslines: &[Arc<BasslineMachine>],
        drums: &Arc<DrumMachine>,
        delay: &DelaySection,
        mut rng: Rng,
    ) -> Self {
        let upcoming_measure = Parameter::new("Upcoming Measure", 0u64);
        let current_measure = Parameter::new("Measure", 0u64);
        let patterns_enabled = Parameter::new("Alter Patterns", true);
        let dials_enabled = Parameter::new("Twiddle Knobs", true);
        let mutes_enabled = Parameter::new("Mute Drum Parts", true);

        // Counting is unconditional; the switches only gate the effects below
        {
            let upcoming = Arc::clone(&upcoming_measure);
            let current = Arc::clone(&current_measure);
            clock.current_step.subscribe(move |step| {
                if *step == 4 {
                    upcoming.set(upcoming.get() + 1);
                } else if *step == 15 {
                    // One step early, so mute decisions apply to the bar they
                    // describe while pattern decisions apply to the next one
                    current.set(current.get() + 1);
                }
            });
        }

        let decision_rng = Arc::new(Mutex::new(rng.fork()));

        {
            let enabled = Arc::clone(&patterns_enabled);
            let rng = Arc::clone(&decision_rng);
            let new_notes = Arc::clone(&gen.new_notes);
            let voice_triggers: Vec<Trigger> = basslines
                .iter()
                .map(|machine| Arc::clone(&machine.new_pattern))
                .collect();
            let drum_trigger = Arc::clone(&drums.new_pattern);

            upcoming_measure.subscribe(move |measure| {
                if !enabled.get() {
                    return;
                }
                let mut rng = rng.lock().unwrap();
                if measure % 64 == 0 && rng.f32() < 0.2 {
                    debug!("autopilot: new note palette requested at measure {}", measure);
                    new_notes.set(true);
                }
                if measure % 16 == 0 {
                    for trigger in &voice_triggers {
                        if rng.f32() < 0.5 {
                            trigger.set(true);
                        }
                    }
                    if rng.f32() < 0.3 {
                        drum_trigger.set(true);
                    }
                }
            });
        }

        {
            let enabled = Arc::clone(&mutes_enabled);
            let rng = Arc::clone(&decision_rng);
            let mutes: Vec<_> = drums.mutes.iter().map(Arc::clone).collect();

            current_measure.subscribe(move |measure| {
                if !enabled.get() {
                    return;
                }
                if measure % 8 == 0 {
                    let mut rng = rng.lock().unwrap();
                    let draw: Vec<bool> =
                        MUTE_CHANCES.iter().map(|&chance| rng.f32() < chance).collect();
                    debug!("autopilot: drum mutes redrawn at measure {}: {:?}", measure, draw);
                    // Overwrite unconditionally, changed or not
                    for (mute, muted) in mutes.iter().zip(draw) {
                        mute.set(muted);
                    }
                }
            });
        }

        let mut wanderers = Vec::new();
        for machine in basslines {
            let dials = &machine.dials;
            for dial in [&dials.cutoff, &dials.resonance, &dials.env_mod, &dials.decay] {
                wanderers.push(WanderingParameter::new(dial.clone(), rng.fork()));
            }
        }
        wanderers.push(WanderingParameter::new(delay.feedback.clone(), rng.fork()));
        wanderers.push(WanderingParameter::new(delay.dry_wet.clone(), rng.fork()));

        Self {
            upcoming_measure,
            current_measure,
            patterns_enabled,
            dials_enabled,
            mutes_enabled,
            wanderers: Mutex::new(wanderers),
        }
    }

    /// Driven by the transport at ~10 Hz. While knob twiddling is switched
    /// off the walks are frozen in place, not reset.
    pub fn step_wanderers(&self) {
        if !self.dials_enabled.get() {
            return;
        }
        for wanderer in self.wanderers.lock().unwrap().iter_mut() {
            wanderer.step();
        }
    }
}
