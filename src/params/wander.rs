use fastrand::Rng;

use super::parameter::NumericParameter;

pub const WANDER_SCALE_FACTOR: f32 = 1.0 / 400.0;

/// Ticks of immunity after an external write is noticed.
const TOUCH_COOLDOWN_TICKS: u32 = 200;
/// Drift stays suppressed until the countdown falls below this.
const DRIFT_RESUME_THRESHOLD: u32 = 100;

/// Random-walk driver for one bounded dial.
///
/// Each `step()` nudges the wrapped parameter by an accumulated delta with
/// fresh uniform noise mixed in, biased back toward the center band once the
/// value strays past 20% from either bound. The bias is probabilistic, not a
/// clamp, so transient excursions beyond the bounds can happen.
///
/// A value that changed since the previous tick means someone else wrote the
/// dial: the walk resets its delta and backs off for a while. The comparison
/// against a remembered previous value is a best-effort heuristic — two
/// independent drivers writing the same parameter can fool it.
pub struct WanderingParameter {
    param: NumericParameter,
    rng: Rng,
    diff: f32,
    scale: f32,
    touch_countdown: u32,
    previous_value: f32,
}

impl WanderingParameter {
    pub fn new(param: NumericParameter, rng: Rng) -> Self {
        Self::with_scale_factor(param, rng, WANDER_SCALE_FACTOR)
    }

    pub fn with_scale_factor(param: NumericParameter, rng: Rng, scale_factor: f32) -> Self {
        let (min, max) = param.bounds();
        Self {
            rng,
            diff: 0.0,
            scale: scale_factor * (max - min),
            touch_countdown: 0,
            previous_value: (min + max) / 2.0,
            param,
        }
    }

    pub fn touch_countdown(&self) -> u32 {
        self.touch_countdown
    }

    pub fn step(&mut self) {
        let (min, max) = self.param.bounds();
        let current = self.param.get();

        if current != self.previous_value {
            // Someone else wrote this dial: absorb the touch and back off
            self.diff = 0.0;
            self.previous_value = current;
            self.touch_countdown = TOUCH_COOLDOWN_TICKS;
            return;
        }

        if self.touch_countdown > 0 {
            self.touch_countdown -= 1;
        }

        if self.touch_countdown < DRIFT_RESUME_THRESHOLD {
            // Harder damping while still cooling down from a touch
            self.diff *= if self.touch_countdown > 0 { 0.8 } else { 0.98 };
            self.diff += (self.rng.f32() - 0.5) * self.scale;

            let value = current + self.diff;
            self.param.set(value);
            // Refresh immediately so our own write never reads as a touch
            self.previous_value = self.param.get();

            let range = max - min;
            if value > min + 0.8 * range {
                self.diff -= self.rng.f32() * self.scale;
            } else if value < min + 0.2 * range {
                self.diff += self.rng.f32() * self.scale;
            }
        }
    }
}
