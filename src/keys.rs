//! Random key selection for the workload generator.

use rand::rngs::StdRng;
use rand::{Rng, SeedableRng};

/// Draws key indices uniformly from an inclusive range `[lower, upper]`.
#[derive(Debug)]
pub struct RandomKeySelector {
    lower: u64,
    upper: u64,
    rng: StdRng,
}

impl RandomKeySelector {
    /// Creates a selector seeded from OS entropy.
    ///
    /// # Panics
    ///
    /// Panics if `lower > upper`.
    pub fn new(lower: u64, upper: u64) -> Self {
        Self::with_rng(lower, upper, StdRng::from_entropy())
    }

    /// Creates a selector with a fixed seed, producing a reproducible sequence.
    ///
    /// # Panics
    ///
    /// Panics if `lower > upper`.
    pub fn with_seed(lower: u64, upper: u64, seed: u64) -> Self {
        Self::with_rng(lower, upper, StdRng::seed_from_u64(seed))
    }

    fn with_rng(lower: u64, upper: u64, rng: StdRng) -> Self {
        assert!(
            lower <= upper,
            "empty key range: lower bound {lower} exceeds upper bound {upper}"
        );
        Self { lower, upper, rng }
    }

    /// Inclusive lower bound.
    pub fn lower(&self) -> u64 {
        self.lower
    }

    /// Inclusive upper bound.
    pub fn upper(&self) -> u64 {
        self.upper
    }

    /// Draws the next key index.
    #[inline]
    pub fn next_key(&mut self) -> u64 {
        self.rng.gen_range(self.lower..=self.upper)
    }
}
