pub mod autopilot;
pub mod bassline;
pub mod delay;
pub mod drums;

pub use autopilot::AutoPilot;
pub use bassline::{BasslineDials, BasslineMachine};
pub use delay::DelaySection;
pub use drums::DrumMachine;
