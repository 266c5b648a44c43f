//! Weighted categorical sampling (C1).
//!
//! Each worker owns one [`Sampler`], derived from the run's master seed and
//! a stream key (the Person's id) rather than a thread index, so outputs are
//! independent of how many worker threads the engine happens to use.

use crate::error::{HepceError, Result};
use rand::rngs::StdRng;
use rand::{Rng, SeedableRng};

/// Tolerance above 1.0 that a weight vector's sum is still accepted.
const WEIGHT_EPSILON: f64 = 1e-5;

pub struct Sampler {
    rng: StdRng,
}

impl Sampler {
    pub fn from_seed(seed: u64) -> Self {
        Self {
            rng: StdRng::seed_from_u64(seed),
        }
    }

    /// Derives a worker/person-local stream from the master seed and a
    /// stream key. Uses splitmix64 to decorrelate nearby keys; the result
    /// does not depend on thread count or iteration order, only on
    /// `(master_seed, stream_key)`.
    pub fn for_stream(master_seed: u64, stream_key: u64) -> Self {
        Self::from_seed(splitmix64(master_seed ^ splitmix64(stream_key)))
    }

    /// Draws a weighted categorical outcome.
    ///
    /// Returns the smallest index whose cumulative prefix sum exceeds the
    /// draw, or `weights.len()` (the implicit "none of the above" outcome)
    /// if the draw lands past the total weight. Fails with
    /// [`HepceError::InvalidWeights`] if `sum(weights) > 1 + epsilon`.
    pub fn get_decision(&mut self, weights: &[f64]) -> Result<usize> {
        let sum: f64 = weights.iter().sum();
        if sum > 1.0 + WEIGHT_EPSILON {
            return Err(HepceError::InvalidWeights { sum });
        }

        let draw: f64 = self.rng.gen_range(0.0..1.0);
        let mut cumulative = 0.0;
        for (i, w) in weights.iter().enumerate() {
            cumulative += w;
            if draw < cumulative {
                return Ok(i);
            }
        }
        Ok(weights.len())
    }

    /// Draws a single Bernoulli outcome with the given success probability.
    pub fn get_bool(&mut self, probability: f64) -> Result<bool> {
        Ok(self.get_decision(&[probability])? == 0)
    }

    pub fn uniform(&mut self) -> f64 {
        self.rng.gen_range(0.0..1.0)
    }
}

fn splitmix64(mut x: u64) -> u64 {
    x = x.wrapping_add(0x9E3779B97F4A7C15);
    let mut z = x;
    z = (z ^ (z >> 30)).wrapping_mul(0xBF58476D1CE4E5B9);
    z = (z ^ (z >> 27)).wrapping_mul(0x94D049BB133111EB);
    z ^ (z >> 31)
}
