use std::sync::Arc;

use crossbeam::queue::SegQueue;
use serde::Serialize;

use crate::sequencing::bassline::Pattern;
use crate::sequencing::drums::DrumPattern;
use crate::sequencing::notes::Note;

/// Engine -> UI notifications. Every parameter the engine exposes is also
/// directly subscribable; this queue is the convenience bridge across the
/// thread boundary, fed by those same subscriptions.
#[derive(Debug, Clone, Serialize)]
pub enum EngineEvent {
    StepChanged(u8),
    MeasureChanged(u64),
    NoteSetChanged(Vec<Note>),
    BasslinePatternChanged { voice: usize, pattern: Pattern },
    DrumPatternChanged(DrumPattern),
    MuteChanged { lane: usize, muted: bool },
    DialChanged { name: String, value: f32 },
}

/// Lock-free event queue for engine -> UI communication
pub struct EngineEventQueue {
    queue: Arc<SegQueue<EngineEvent>>,
}

impl EngineEventQueue {
    pub fn new() -> Self {
        Self {
            queue: Arc::new(SegQueue::new()),
        }
    }

    /// Get a handle for sending events (for the engine side)
    pub fn sender(&self) -> EngineEventSender {
        EngineEventSender {
            queue: Arc::clone(&self.queue),
        }
    }

    /// Get a handle for receiving events (for the UI side)
    pub fn receiver(&self) -> EngineEventReceiver {
        EngineEventReceiver {
            queue: Arc::clone(&self.queue),
        }
    }
}

impl Default for EngineEventQueue {
    fn default() -> Self {
        Self::new()
    }
}

#[derive(Clone)]
pub struct EngineEventSender {
    queue: Arc<SegQueue<EngineEvent>>,
}

impl EngineEventSender {
    /// Send an event to the UI side (non-blocking)
    pub fn send(&self, event: EngineEvent) {
        self.queue.push(event);
    }
}

pub struct EngineEventReceiver {
    queue: Arc<SegQueue<EngineEvent>>,
}

impl EngineEventReceiver {
    /// Drain all pending events through the given closure
    pub fn process_events<F>(&self, mut handle_event: F)
    where
        F: FnMut(EngineEvent),
    {
        while let Some(event) = self.queue.pop() {
            handle_event(event);
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_events_arrive_in_send_order() {
        let queue = EngineEventQueue::new();
        let sender = queue.sender();
        let receiver = queue.receiver();

        sender.send(EngineEvent::StepChanged(3));
        sender.send(EngineEvent::MeasureChanged(12));

        let mut seen = Vec::new();
        receiver.process_events(|event| seen.push(event));

        assert!(matches!(seen[0], EngineEvent::StepChanged(3)));
        assert!(matches!(seen[1], EngineEvent::MeasureChanged(12)));
    }

    #[test]
    fn test_events_serialize_for_the_frontend() {
        let event = EngineEvent::DialChanged {
            name: "Voice 1 Cutoff".to_string(),
            value: 420.0,
        };
        let json = serde_json::to_string(&event).unwrap();
        assert!(json.contains("Voice 1 Cutoff"));
    }
}
