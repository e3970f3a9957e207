//! Random-number sources.
//!
//! The traffic engine only ever asks for uniform integers and uniform
//! floats. Every consumer takes a `&mut dyn RandomSource`, so a whole
//! simulation draws from one seeded stream and replays identically.

use rand::{Rng, SeedableRng};
use rand_pcg::Pcg64;

/// A uniform random source.
pub trait RandomSource {
    /// Returns an integer uniformly distributed in `[0, max]` (inclusive).
    fn random_int(&mut self, max: u64) -> u64;

    /// Returns a float uniformly distributed in `[0, 1)`.
    fn random_f64(&mut self) -> f64;
}

/// The default seeded generator (PCG 64).
#[derive(Clone, Debug)]
pub struct SimRng {
    rng: Pcg64,
}

impl SimRng {
    /// Creates a generator from a 64-bit seed.
    pub fn new(seed: u64) -> Self {
        Self {
            rng: Pcg64::seed_from_u64(seed),
        }
    }
}

impl RandomSource for SimRng {
    fn random_int(&mut self, max: u64) -> u64 {
        self.rng.gen_range(0..=max)
    }

    fn random_f64(&mut self) -> f64 {
        self.rng.gen::<f64>()
    }
}
