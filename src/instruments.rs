use crate::sequencing::notes::Note;

/// Everything the sequencer can ask of a sound source. Booleans ride along as
/// articulation flags; dial pushes carry the raw parameter value.
#[derive(Debug, Clone, Copy, PartialEq)]
pub enum InstrumentEvent {
    NoteOn { note: Note, accent: bool, glide: bool },
    NoteOff,
    /// One drum lane hit at the given velocity.
    Play(f32),
    SetCutoff(f32),
    SetResonance(f32),
    SetEnvMod(f32),
    SetDecay(f32),
}

/// The seam to the audio layer. Dispatch is fire-and-forget: the sequencer
/// discards errors and an instrument must not block.
pub trait Instrument: Send {
    /// Handle an event - each instrument decides which events it supports
    fn handle_event(&mut self, event: InstrumentEvent) -> Result<(), String>;
}

/// Accepts every event and does nothing. For headless operation and tests.
#[derive(Debug, Default)]
pub struct NullInstrument;

impl Instrument for NullInstrument {
    fn handle_event(&mut self, _event: InstrumentEvent) -> Result<(), String> {
        Ok(())
    }
}
