use std::sync::Mutex;

use fastrand::Rng;

use super::{choose, STEPS_PER_BAR};

pub const DRUM_LANES: usize = 4;
pub const LANE_KICK: usize = 0;
pub const LANE_OPEN_HAT: usize = 1;
pub const LANE_CLOSED_HAT: usize = 2;
pub const LANE_SNARE: usize = 3;

/// Per-step velocities in [0, 1]; 0.0 is silence.
pub type DrumLane = [f32; STEPS_PER_BAR];
/// Lane order: kick, open hat, closed hat, snare. Empty before first
/// generation, exactly `DRUM_LANES` lanes afterwards.
pub type DrumPattern = Vec<DrumLane>;

#[derive(Debug, Clone, Copy, PartialEq)]
enum KickMode {
    Electro,
    FourFloor,
}

#[derive(Debug, Clone, Copy, PartialEq)]
enum HatMode {
    Offbeats,
    Closed,
    None,
}

#[derive(Debug, Clone, Copy, PartialEq)]
enum SnareMode {
    Backbeat,
    Skip,
    None,
}

/// Stochastic drum pattern source: one rhythmic archetype per lane group,
/// drawn fresh on every call.
pub struct DrumGenerator {
    rng: Mutex<Rng>,
}

impl DrumGenerator {
    pub fn new(rng: Rng) -> Self {
        Self {
            rng: Mutex::new(rng),
        }
    }

    /// Generate all four lanes. With `full`, the silent hat and snare
    /// archetypes are removed from the draw so a fresh kit never starts
    /// completely empty. The kick has no silent archetype at all.
    pub fn create_patterns(&self, full: bool) -> DrumPattern {
        let mut rng = self.rng.lock().unwrap();

        let mut kick = [0.0f32; STEPS_PER_BAR];
        let mut open_hat = [0.0f32; STEPS_PER_BAR];
        let mut closed_hat = [0.0f32; STEPS_PER_BAR];
        let mut snare = [0.0f32; STEPS_PER_BAR];

        let kick_mode = choose(&mut rng, &[KickMode::Electro, KickMode::FourFloor]);
        let hat_mode = choose(
            &mut rng,
            &[
                HatMode::Offbeats,
                HatMode::Closed,
                if full { HatMode::Offbeats } else { HatMode::None },
            ],
        );
        let snare_mode = choose(
            &mut rng,
            &[
                SnareMode::Backbeat,
                SnareMode::Skip,
                if full { SnareMode::Backbeat } else { SnareMode::None },
            ],
        );

        match kick_mode {
            KickMode::FourFloor => {
                for i in 0..STEPS_PER_BAR {
                    if i % 4 == 0 {
                        kick[i] = 0.9;
                    } else if i % 2 == 0 && rng.f32() < 0.1 {
                        kick[i] = 0.6;
                    }
                }
            }
            KickMode::Electro => {
                for i in 0..STEPS_PER_BAR {
                    if i == 0 {
                        kick[i] = 1.0;
                    } else if i % 2 == 0 && i % 8 != 4 && rng.f32() < 0.5 {
                        kick[i] = rng.f32() * 0.9;
                    } else if rng.f32() < 0.05 {
                        kick[i] = rng.f32() * 0.9;
                    }
                }
            }
        }

        match snare_mode {
            SnareMode::Backbeat => {
                for i in 0..STEPS_PER_BAR {
                    if i % 8 == 4 {
                        snare[i] = 1.0;
                    }
                }
            }
            SnareMode::Skip => {
                for i in 0..STEPS_PER_BAR {
                    if i % 8 == 3 || i % 8 == 6 {
                        snare[i] = 0.6 + rng.f32() * 0.4;
                    } else if i % 2 == 0 && rng.f32() < 0.2 {
                        snare[i] = 0.4 + rng.f32() * 0.2;
                    } else if rng.f32() < 0.1 {
                        snare[i] = 0.2 + rng.f32() * 0.2;
                    }
                }
            }
            SnareMode::None => {}
        }

        match hat_mode {
            HatMode::Offbeats => {
                for i in 0..STEPS_PER_BAR {
                    if i % 4 == 2 {
                        open_hat[i] = 0.4;
                    } else if rng.f32() < 0.3 {
                        // Quiet fills, split between the two hats
                        if rng.f32() < 0.5 {
                            closed_hat[i] = rng.f32() * 0.2;
                        } else {
                            open_hat[i] = rng.f32() * 0.2;
                        }
                    }
                }
            }
            HatMode::Closed => {
                for i in 0..STEPS_PER_BAR {
                    if i % 2 == 0 {
                        closed_hat[i] = 0.4;
                    } else if rng.f32() < 0.5 {
                        closed_hat[i] = rng.f32() * 0.3;
                    }
                }
            }
            HatMode::None => {}
        }

        vec![kick, open_hat, closed_hat, snare]
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn lane_is_silent(lane: &DrumLane) -> bool {
        lane.iter().all(|&v| v == 0.0)
    }

    #[test]
    fn test_four_lanes_of_one_bar_each() {
        let gen = DrumGenerator::new(Rng::with_seed(1));
        for _ in 0..50 {
            let pattern = gen.create_patterns(true);
            assert_eq!(pattern.len(), DRUM_LANES);
            for lane in &pattern {
                assert_eq!(lane.len(), STEPS_PER_BAR);
            }
        }
    }

    #[test]
    fn test_velocities_stay_in_unit_range() {
        let gen = DrumGenerator::new(Rng::with_seed(2));
        for _ in 0..200 {
            for lane in gen.create_patterns(false) {
                for v in lane {
                    assert!((0.0..=1.0).contains(&v), "velocity {} out of range", v);
                }
            }
        }
    }

    #[test]
    fn test_kick_always_lands_on_the_one() {
        // Both kick archetypes put a hit on step 0
        let gen = DrumGenerator::new(Rng::with_seed(3));
        for _ in 0..200 {
            let pattern = gen.create_patterns(false);
            assert!(pattern[LANE_KICK][0] > 0.0);
        }
    }

    #[test]
    fn test_full_kit_never_starts_empty() {
        let gen = DrumGenerator::new(Rng::with_seed(4));
        for _ in 0..200 {
            let pattern = gen.create_patterns(true);
            assert!(!lane_is_silent(&pattern[LANE_KICK]));
            assert!(!lane_is_silent(&pattern[LANE_SNARE]), "full draw picked a silent snare");
            let hats_silent = lane_is_silent(&pattern[LANE_OPEN_HAT])
                && lane_is_silent(&pattern[LANE_CLOSED_HAT]);
            assert!(!hats_silent, "full draw picked silent hats");
        }
    }

    #[test]
    fn test_silent_archetypes_reachable_without_full() {
        let gen = DrumGenerator::new(Rng::with_seed(5));
        let mut saw_silent_snare = false;
        let mut saw_silent_hats = false;
        for _ in 0..200 {
            let pattern = gen.create_patterns(false);
            saw_silent_snare |= lane_is_silent(&pattern[LANE_SNARE]);
            saw_silent_hats |= lane_is_silent(&pattern[LANE_OPEN_HAT])
                && lane_is_silent(&pattern[LANE_CLOSED_HAT]);
        }
        assert!(saw_silent_snare, "snare None mode never drawn in 200 tries");
        assert!(saw_silent_hats, "hat None mode never drawn in 200 tries");
    }

    #[test]
    fn test_backbeat_snare_hits_at_five_and_thirteen() {
        let gen = DrumGenerator::new(Rng::with_seed(6));
        let mut saw_backbeat = false;
        for _ in 0..100 {
            let snare = gen.create_patterns(true)[LANE_SNARE];
            if snare[4] == 1.0 && snare[12] == 1.0 {
                // Backbeat puts full-velocity hits at steps 4 and 12, nowhere else
                let others: f32 = snare
                    .iter()
                    .enumerate()
                    .filter(|(i, _)| i % 8 != 4)
                    .map(|(_, v)| v)
                    .sum();
                if others == 0.0 {
                    saw_backbeat = true;
                }
            }
        }
        assert!(saw_backbeat, "backbeat archetype never drawn in 100 tries");
    }

    #[test]
    fn test_offbeat_hats_accent_every_other_upbeat() {
        let gen = DrumGenerator::new(Rng::with_seed(7));
        let mut saw_offbeats = false;
        for _ in 0..100 {
            let pattern = gen.create_patterns(true);
            let oh = pattern[LANE_OPEN_HAT];
            if (2..STEPS_PER_BAR).step_by(4).all(|i| oh[i] == 0.4) {
                saw_offbeats = true;
            }
        }
        assert!(saw_offbeats, "offbeat archetype never drawn in 100 tries");
    }
}
