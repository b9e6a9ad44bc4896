pub mod commands;
pub mod events;
pub mod instruments;
pub mod machines;
pub mod params;
pub mod sequencing;
pub mod transport;

use std::sync::{Arc, Mutex};

use log::info;
use serde::{Deserialize, Serialize};

use crate::commands::{ControlCommand, ControlQueue, ControlReceiver, ControlSender};
use crate::events::{EngineEvent, EngineEventQueue, EngineEventReceiver};
use crate::instruments::{Instrument, NullInstrument};
use crate::machines::{AutoPilot, BasslineMachine, DelaySection, DrumMachine};
use crate::params::NumericParameter;
use crate::sequencing::bassline::BasslineGenerator;
use crate::sequencing::clocks::{ClockUnit, DEFAULT_BPM};
use crate::sequencing::drums::{DrumGenerator, DRUM_LANES};

pub use crate::transport::Transport;

/// Default number of melodic voices when none are supplied.
const DEFAULT_BASSLINE_VOICES: usize = 2;

/// Startup configuration. A fixed seed makes every generative decision in the
/// session reproducible.
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct EngineConfig {
    pub seed: Option<u64>,
    pub bpm: f32,
    pub shuffle: f32,
}

impl Default for EngineConfig {
    fn default() -> Self {
        Self {
            seed: None,
            bpm: DEFAULT_BPM,
            shuffle: 0.0,
        }
    }
}

impl EngineConfig {
    pub fn from_json(value: serde_json::Value) -> Result<Self, String> {
        serde_json::from_value(value).map_err(|err| format!("invalid engine config: {}", err))
    }
}

/// The whole instrument, wired: clock, shared note generator, bassline
/// voices, drum machine, delay dials, autopilot, and the two UI queues.
///
/// Construction already runs the first bar step, so patterns exist before the
/// transport starts ticking.
pub struct Engine {
    pub clock: ClockUnit,
    pub generator: Arc<BasslineGenerator>,
    pub basslines: Vec<Arc<BasslineMachine>>,
    pub drums: Arc<DrumMachine>,
    pub delay: DelaySection,
    pub autopilot: AutoPilot,
    pub master_volume: NumericParameter,
    commands: ControlQueue,
    events: EngineEventQueue,
    config: EngineConfig,
}

impl Engine {
    pub fn new(
        config: EngineConfig,
        bassline_synths: Vec<Arc<Mutex<dyn Instrument>>>,
        drum_lane_instruments: Vec<Box<dyn Instrument>>,
    ) -> Result<Arc<Self>, String> {
        if bassline_synths.is_empty() {
            return Err("engine needs at least one bassline voice".to_string());
        }

        let mut rng = match config.seed {
            Some(seed) => fastrand::Rng::with_seed(seed),
            None => fastrand::Rng::new(),
        };

        let clock = ClockUnit::new(config.bpm);
        let delay = DelaySection::new();
        // Dotted-eighth echo that follows the tempo
        {
            let time = delay.time.clone();
            clock.bpm.subscribe(move |bpm| time.set(0.75 * 60.0 / *bpm));
        }

        let generator = BasslineGenerator::new(rng.fork());
        let basslines: Vec<Arc<BasslineMachine>> = bassline_synths
            .into_iter()
            .enumerate()
            .map(|(voice, synth)| BasslineMachine::new(synth, Arc::clone(&generator), voice))
            .collect();
        let drums = DrumMachine::new(drum_lane_instruments, DrumGenerator::new(rng.fork()))?;
        let master_volume = NumericParameter::new("Volume", (0.0, 1.0), 0.5);

        // Per-step dispatch. Registered before the autopilot so voices play a
        // step before the measure bookkeeping reacts to it.
        {
            let basslines = basslines.clone();
            let drums = Arc::clone(&drums);
            clock.current_step.subscribe(move |step| {
                let index = *step as usize;
                for machine in &basslines {
                    machine.step(index);
                }
                drums.step(index);
            });
        }

        let autopilot = AutoPilot::new(&clock, &generator, &basslines, &drums, &delay, rng.fork());

        let engine = Arc::new(Self {
            clock,
            generator,
            basslines,
            drums,
            delay,
            autopilot,
            master_volume,
            commands: ControlQueue::new(),
            events: EngineEventQueue::new(),
            config,
        });
        engine.wire_event_feed();
        info!(
            "engine up: {} bassline voices at {} bpm",
            engine.basslines.len(),
            engine.config.bpm
        );
        Ok(engine)
    }

    /// An engine with no audio attached: every voice is a `NullInstrument`.
    pub fn headless(config: EngineConfig) -> Result<Arc<Self>, String> {
        let basslines = (0..DEFAULT_BASSLINE_VOICES)
            .map(|_| Arc::new(Mutex::new(NullInstrument)) as Arc<Mutex<dyn Instrument>>)
            .collect();
        let lanes = (0..DRUM_LANES)
            .map(|_| Box::new(NullInstrument) as Box<dyn Instrument>)
            .collect();
        Self::new(config, basslines, lanes)
    }

    pub fn command_sender(&self) -> ControlSender {
        self.commands.sender()
    }

    pub(crate) fn command_receiver(&self) -> ControlReceiver {
        self.commands.receiver()
    }

    pub fn event_receiver(&self) -> EngineEventReceiver {
        self.events.receiver()
    }

    pub fn shuffle(&self) -> f32 {
        self.config.shuffle
    }

    /// Apply one manual override. Index errors are reported, never panicked.
    pub fn apply_command(&self, command: ControlCommand) -> Result<(), String> {
        use ControlCommand::*;
        match command {
            SetBpm(bpm) => self.clock.bpm.set(bpm),
            SetMasterVolume(volume) => self.master_volume.set(volume),
            SetCutoff { voice, value } => self.bassline(voice)?.dials.cutoff.set(value),
            SetResonance { voice, value } => self.bassline(voice)?.dials.resonance.set(value),
            SetEnvMod { voice, value } => self.bassline(voice)?.dials.env_mod.set(value),
            SetDecay { voice, value } => self.bassline(voice)?.dials.decay.set(value),
            SetDelayFeedback(value) => self.delay.feedback.set(value),
            SetDelayDryWet(value) => self.delay.dry_wet.set(value),
            SetMute { lane, muted } => self
                .drums
                .mutes
                .get(lane)
                .ok_or_else(|| format!("no drum lane {}", lane))?
                .set(muted),
            RequestNewBasslinePattern(voice) => self.bassline(voice)?.new_pattern.set(true),
            RequestNewDrumPattern => self.drums.new_pattern.set(true),
            RequestNewNotes => self.generator.new_notes.set(true),
            SetPatternsEnabled(enabled) => self.autopilot.patterns_enabled.set(enabled),
            SetDialsEnabled(enabled) => self.autopilot.dials_enabled.set(enabled),
            SetMutesEnabled(enabled) => self.autopilot.mutes_enabled.set(enabled),
        }
        Ok(())
    }

    fn bassline(&self, voice: usize) -> Result<&Arc<BasslineMachine>, String> {
        self.basslines
            .get(voice)
            .ok_or_else(|| format!("no bassline voice {}", voice))
    }

    /// Subscribe the event queue to everything the UI renders. The immediate
    /// replays double as the initial state snapshot.
    fn wire_event_feed(&self) {
        let sender = self.events.sender();

        {
            let sender = sender.clone();
            self.clock
                .current_step
                .subscribe(move |step| sender.send(EngineEvent::StepChanged(*step)));
        }
        {
            let sender = sender.clone();
            self.autopilot
                .current_measure
                .subscribe(move |measure| sender.send(EngineEvent::MeasureChanged(*measure)));
        }
        {
            let sender = sender.clone();
            self.generator
                .note_set
                .subscribe(move |notes| sender.send(EngineEvent::NoteSetChanged(notes.clone())));
        }
        for (voice, machine) in self.basslines.iter().enumerate() {
            let sender = sender.clone();
            machine.pattern.subscribe(move |pattern| {
                sender.send(EngineEvent::BasslinePatternChanged {
                    voice,
                    pattern: pattern.clone(),
                })
            });
        }
        {
            let sender = sender.clone();
            self.drums
                .pattern
                .subscribe(move |pattern| sender.send(EngineEvent::DrumPatternChanged(pattern.clone())));
        }
        for (lane, mute) in self.drums.mutes.iter().enumerate() {
            let sender = sender.clone();
            mute.subscribe(move |muted| {
                sender.send(EngineEvent::MuteChanged {
                    lane,
                    muted: *muted,
                })
            });
        }
        for dial in self.dial_params() {
            let sender = sender.clone();
            let name = dial.name().to_string();
            dial.subscribe(move |value| {
                sender.send(EngineEvent::DialChanged {
                    name: name.clone(),
                    value: *value,
                })
            });
        }
    }

    fn dial_params(&self) -> Vec<NumericParameter> {
        let mut dials = vec![self.clock.bpm.clone(), self.master_volume.clone()];
        for machine in &self.basslines {
            let d = &machine.dials;
            dials.extend([
                d.cutoff.clone(),
                d.resonance.clone(),
                d.env_mod.clone(),
                d.decay.clone(),
            ]);
        }
        dials.extend([
            self.delay.feedback.clone(),
            self.delay.dry_wet.clone(),
            self.delay.time.clone(),
        ]);
        dials
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::sequencing::STEPS_PER_BAR;

    fn seeded(seed: u64) -> Arc<Engine> {
        Engine::headless(EngineConfig {
            seed: Some(seed),
            ..EngineConfig::default()
        })
        .unwrap()
    }

    fn play_bars(engine: &Engine, bars: usize) {
        for _ in 0..bars {
            for step in 0..STEPS_PER_BAR {
                engine.clock.current_step.set(step as u8);
            }
        }
    }

    #[test]
    fn test_construction_produces_playable_state() {
        let engine = seeded(1);

        for machine in &engine.basslines {
            assert_eq!(machine.pattern.get().len(), STEPS_PER_BAR);
        }
        assert_eq!(engine.drums.pattern.get().len(), DRUM_LANES);

        // The autopilot's measure-zero dice may have re-raised triggers at
        // construction; one bar-start step services everything pending
        engine.clock.current_step.set(0);
        for machine in &engine.basslines {
            assert!(!machine.new_pattern.get());
        }
        assert!(!engine.drums.new_pattern.get());
        assert!(!engine.generator.new_notes.get());
    }

    #[test]
    fn test_two_bars_count_two_measures() {
        let engine = seeded(2);
        play_bars(&engine, 2);

        assert_eq!(engine.autopilot.upcoming_measure.get(), 2);
        assert_eq!(engine.autopilot.current_measure.get(), 2);
    }

    #[test]
    fn test_delay_time_follows_the_tempo() {
        let engine = seeded(3);
        // Dotted eighth at 125 bpm
        assert!((engine.delay.time.get() - 0.75 * 60.0 / 125.0).abs() < 1e-6);

        engine.clock.bpm.set(150.0);
        assert!((engine.delay.time.get() - 0.75 * 60.0 / 150.0).abs() < 1e-6);
    }

    #[test]
    fn test_commands_apply_through_the_queue() {
        let engine = seeded(4);
        let sender = engine.command_sender();
        let receiver = engine.command_receiver();

        sender.send(ControlCommand::SetBpm(140.0));
        sender.send(ControlCommand::SetCutoff {
            voice: 0,
            value: 650.0,
        });
        sender.send(ControlCommand::SetMute {
            lane: 3,
            muted: true,
        });

        receiver.process_commands(|command| engine.apply_command(command).unwrap());

        assert_eq!(engine.clock.bpm.get(), 140.0);
        assert_eq!(engine.basslines[0].dials.cutoff.get(), 650.0);
        assert!(engine.drums.mutes[3].get());
    }

    #[test]
    fn test_bad_indices_are_rejected_not_panicked() {
        let engine = seeded(5);
        assert!(engine
            .apply_command(ControlCommand::SetCutoff {
                voice: 9,
                value: 100.0
            })
            .is_err());
        assert!(engine
            .apply_command(ControlCommand::SetMute {
                lane: 7,
                muted: true
            })
            .is_err());
    }

    #[test]
    fn test_pattern_request_lands_on_the_next_bar() {
        let engine = seeded(6);
        let before = engine.basslines[0].pattern.get();

        engine
            .apply_command(ControlCommand::RequestNewBasslinePattern(0))
            .unwrap();
        // Mid-bar steps leave the pattern alone
        for step in 1..STEPS_PER_BAR {
            engine.clock.current_step.set(step as u8);
        }
        assert_eq!(engine.basslines[0].pattern.get(), before);

        engine.clock.current_step.set(0);
        assert!(!engine.basslines[0].new_pattern.get());
    }

    #[test]
    fn test_event_feed_reports_steps_and_dials() {
        let engine = seeded(7);
        let receiver = engine.event_receiver();

        // Drop the initial snapshot replays
        receiver.process_events(|_| {});

        engine.clock.current_step.set(1);
        engine.basslines[0].dials.cutoff.set(512.0);

        let mut saw_step = false;
        let mut saw_dial = false;
        receiver.process_events(|event| match event {
            EngineEvent::StepChanged(1) => saw_step = true,
            EngineEvent::DialChanged { ref name, value } => {
                if name == "Voice 1 Cutoff" && value == 512.0 {
                    saw_dial = true;
                }
            }
            _ => {}
        });
        assert!(saw_step);
        assert!(saw_dial);
    }

    #[test]
    fn test_external_dial_write_pauses_its_wanderer() {
        let engine = seeded(8);

        // Let the walks thaw from the startup grace period and move
        for _ in 0..400 {
            engine.autopilot.step_wanderers();
        }
        engine.basslines[0].dials.cutoff.set(123.0);
        engine.autopilot.step_wanderers();
        assert_eq!(
            engine.basslines[0].dials.cutoff.get(),
            123.0,
            "manual override must survive the next wander tick"
        );
    }

    #[test]
    fn test_config_from_json() {
        let config =
            EngineConfig::from_json(serde_json::json!({ "bpm": 140.0, "seed": 9 })).unwrap();
        assert_eq!(config.bpm, 140.0);
        assert_eq!(config.seed, Some(9));
        assert_eq!(config.shuffle, 0.0);

        assert!(EngineConfig::from_json(serde_json::json!({ "bpm": "fast" })).is_err());
    }

    #[test]
    fn test_headless_rejects_missing_voices() {
        let result = Engine::new(EngineConfig::default(), Vec::new(), Vec::new());
        assert!(result.is_err());
    }
}
