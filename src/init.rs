//! Uniform random scalars for weight initialization.
use rand::distributions::{Distribution, Uniform};
use rand::rngs::StdRng;
use rand::SeedableRng;

/// Draws scalars uniformly from `[low, high)`.
#[derive(Debug, Clone)]
pub struct UniformInitializer {
    rng: StdRng,
    dist: Uniform<f64>,
}

impl UniformInitializer {
    /// Seeded from OS entropy.
    ///
    /// Panics if `low >= high`.
    pub fn new(low: f64, high: f64) -> Self {
        Self {
            rng: StdRng::from_entropy(),
            dist: Uniform::new(low, high),
        }
    }

    /// Deterministic stream for reproducible runs.
    pub fn seeded(low: f64, high: f64, seed: u64) -> Self {
        Self {
            rng: StdRng::seed_from_u64(seed),
            dist: Uniform::new(low, high),
        }
    }

    pub fn sample(&mut self) -> f64 {
        self.dist.sample(&mut self.rng)
    }
}

impl Default for UniformInitializer {
    fn default() -> Self {
        Self::new(0.0, 1.0)
    }
}
