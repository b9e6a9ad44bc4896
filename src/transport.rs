use std::sync::atomic::{AtomicBool, Ordering};
use std::sync::Arc;
use std::thread;
use std::time::{Duration, Instant};

use log::{info, trace, warn};

use crate::sequencing::clocks::{SubdivisionClock, SUBDIVISIONS_PER_BEAT};
use crate::sequencing::STEPS_PER_BAR;
use crate::Engine;

/// Wanderer cadence, independent of tempo.
pub const WANDER_INTERVAL_MS: u64 = 100;

/// The engine's two timer threads: the self-rescheduling clock and the
/// fixed-rate wanderer driver. Neither waits for the other; parameter cells
/// serialize whatever they both touch.
///
/// Dropping the transport stops both threads and joins them.
pub struct Transport {
    stop: Arc<AtomicBool>,
    handles: Vec<thread::JoinHandle<()>>,
}

impl Transport {
    pub fn start(engine: Arc<Engine>) -> Self {
        let stop = Arc::new(AtomicBool::new(false));

        let clock_handle = thread::spawn({
            let engine = Arc::clone(&engine);
            let stop = Arc::clone(&stop);
            move || run_clock(engine, stop)
        });
        let wander_handle = thread::spawn({
            let engine = Arc::clone(&engine);
            let stop = Arc::clone(&stop);
            move || run_wanderers(engine, stop)
        });

        info!("transport started");
        Self {
            stop,
            handles: vec![clock_handle, wander_handle],
        }
    }
}

impl Drop for Transport {
    fn drop(&mut self) {
        self.stop.store(true, Ordering::Relaxed);
        for handle in self.handles.drain(..) {
            handle.join().ok();
        }
        info!("transport stopped");
    }
}

fn run_clock(engine: Arc<Engine>, stop: Arc<AtomicBool>) {
    let receiver = engine.command_receiver();
    let mut clock = SubdivisionClock::new(SUBDIVISIONS_PER_BEAT, engine.shuffle());
    let started = Instant::now();

    // The first tick lands one straight interval after start
    thread::sleep(clock.base_interval(engine.clock.bpm.get()));

    while !stop.load(Ordering::Relaxed) {
        receiver.process_commands(|command| {
            if let Err(err) = engine.apply_command(command) {
                warn!("rejected control command: {}", err);
            }
        });

        let fired = clock.advance();
        engine
            .clock
            .current_step
            .set((fired % STEPS_PER_BAR as u64) as u8);
        trace!("tick {} at {}ms", fired, started.elapsed().as_millis());

        // Tempo is read back here, so a bpm change lands on the next tick
        thread::sleep(clock.interval_after(fired, engine.clock.bpm.get()));
    }
}

fn run_wanderers(engine: Arc<Engine>, stop: Arc<AtomicBool>) {
    while !stop.load(Ordering::Relaxed) {
        thread::sleep(Duration::from_millis(WANDER_INTERVAL_MS));
        engine.autopilot.step_wanderers();
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::EngineConfig;
    use std::sync::Mutex;

    #[test]
    fn test_transport_drives_steps_and_stops_cleanly() {
        let engine = Engine::headless(EngineConfig {
            seed: Some(5),
            ..EngineConfig::default()
        })
        .unwrap();

        let ticks = Arc::new(Mutex::new(0u32));
        {
            let ticks = Arc::clone(&ticks);
            engine.clock.current_step.subscribe(move |_| *ticks.lock().unwrap() += 1);
        }
        *ticks.lock().unwrap() = 0;

        let transport = Transport::start(Arc::clone(&engine));
        // At the default 125 bpm a tick lands every 120ms
        thread::sleep(Duration::from_millis(700));
        drop(transport);

        let after_stop = *ticks.lock().unwrap();
        assert!(after_stop >= 2, "expected at least 2 ticks, got {}", after_stop);

        thread::sleep(Duration::from_millis(300));
        assert_eq!(
            *ticks.lock().unwrap(),
            after_stop,
            "ticks kept arriving after the transport stopped"
        );
    }
}
