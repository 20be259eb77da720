//! Pluggable randomness for reply, fallback, and idle selection.

use rand::rngs::StdRng;
use rand::{Rng, SeedableRng};
use std::collections::VecDeque;
use std::time::Duration;

/// Source of uniform draws in `[0.0, 1.0)`.
pub trait RandomSource: Send {
    fn next_f64(&mut self) -> f64;

    /// Uniform index into a collection of `len` items. `len` must be non-zero.
    fn pick_index(&mut self, len: usize) -> usize {
        let index = (self.next_f64() * len as f64) as usize;
        index.min(len.saturating_sub(1))
    }

    /// Uniform duration in `[min, max]`.
    fn duration_between(&mut self, min: Duration, max: Duration) -> Duration {
        if max <= min {
            return min;
        }
        min + (max - min).mul_f64(self.next_f64())
    }
}

/// Entropy-seeded generator for real sessions.
pub struct ThreadRandom {
    rng: StdRng,
}

impl ThreadRandom {
    pub fn new() -> Self {
        Self {
            rng: StdRng::from_entropy(),
        }
    }

    /// Reproducible generator.
    pub fn seeded(seed: u64) -> Self {
        Self {
            rng: StdRng::seed_from_u64(seed),
        }
    }
}

impl Default for ThreadRandom {
    fn default() -> Self {
        Self::new()
    }
}

impl RandomSource for ThreadRandom {
    fn next_f64(&mut self) -> f64 {
        self.rng.gen::<f64>()
    }
}

/// Replays a fixed sequence of draws, then repeats a default.
#[derive(Debug, Clone)]
pub struct ScriptedRandom {
    draws: VecDeque<f64>,
    otherwise: f64,
}

impl ScriptedRandom {
    pub fn new(draws: impl IntoIterator<Item = f64>) -> Self {
        Self {
            draws: draws.into_iter().collect(),
            otherwise: 0.0,
        }
    }

    /// Always returns `value`.
    pub fn constant(value: f64) -> Self {
        Self::new(Vec::new()).then_always(value)
    }

    pub fn then_always(mut self, value: f64) -> Self {
        self.otherwise = value;
        self
    }

    pub fn remaining(&self) -> usize {
        self.draws.len()
    }
}

impl RandomSource for ScriptedRandom {
    fn next_f64(&mut self) -> f64 {
        self.draws.pop_front().unwrap_or(self.otherwise)
    }
}
