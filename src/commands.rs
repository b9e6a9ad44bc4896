use std::sync::Arc;

use crossbeam::queue::SegQueue;

/// Manual overrides from the UI. Anything a dial or switch can do by direct
/// parameter write can also arrive here; the clock thread drains the queue
/// just before each tick so overrides land between steps.
#[derive(Debug, Clone, Copy, PartialEq)]
pub enum ControlCommand {
    SetBpm(f32),
    SetMasterVolume(f32),
    SetCutoff { voice: usize, value: f32 },
    SetResonance { voice: usize, value: f32 },
    SetEnvMod { voice: usize, value: f32 },
    SetDecay { voice: usize, value: f32 },
    SetDelayFeedback(f32),
    SetDelayDryWet(f32),
    SetMute { lane: usize, muted: bool },
    RequestNewBasslinePattern(usize),
    RequestNewDrumPattern,
    RequestNewNotes,
    SetPatternsEnabled(bool),
    SetDialsEnabled(bool),
    SetMutesEnabled(bool),
}

/// Lock-free command queue for UI -> engine communication
pub struct ControlQueue {
    queue: Arc<SegQueue<ControlCommand>>,
}

impl ControlQueue {
    pub fn new() -> Self {
        Self {
            queue: Arc::new(SegQueue::new()),
        }
    }

    /// Get a handle for sending commands (for UI threads)
    pub fn sender(&self) -> ControlSender {
        ControlSender {
            queue: Arc::clone(&self.queue),
        }
    }

    /// Get a handle for receiving commands (for the clock thread)
    pub fn receiver(&self) -> ControlReceiver {
        ControlReceiver {
            queue: Arc::clone(&self.queue),
        }
    }
}

impl Default for ControlQueue {
    fn default() -> Self {
        Self::new()
    }
}

#[derive(Clone)]
pub struct ControlSender {
    queue: Arc<SegQueue<ControlCommand>>,
}

impl ControlSender {
    /// Send a command to the engine (non-blocking)
    pub fn send(&self, command: ControlCommand) {
        self.queue.push(command);
    }
}

pub struct ControlReceiver {
    queue: Arc<SegQueue<ControlCommand>>,
}

impl ControlReceiver {
    /// Process pending commands, bounded per call so a flooded queue cannot
    /// stall the tick that drains it
    pub fn process_commands<F>(&self, mut apply_command: F)
    where
        F: FnMut(ControlCommand),
    {
        for _ in 0..64 {
            if let Some(command) = self.queue.pop() {
                apply_command(command);
            } else {
                break;
            }
        }
    }

    pub fn has_commands(&self) -> bool {
        !self.queue.is_empty()
    }
}
