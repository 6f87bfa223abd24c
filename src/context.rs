//! # Context — Session Randomness and Verbosity
//!
//! A `Context` carries the seeded PRNG and trace-verbosity level used by every
//! probabilistic operation in the crate: Miller–Rabin random bases, polynomial
//! equal-degree splitting, ECM curve selection, and witness-point selection.
//!
//! The PRNG is GMP's randstate (via `rug::rand::RandState`), which is *not*
//! cryptographic. That is acceptable here: every probabilistic choice made
//! downstream is re-verified deterministically (a witness point is checked
//! against the curve equation and order, a root is checked against the
//! polynomial), so an adversarial seed can waste time but not produce a wrong
//! certificate.
//!
//! One context per proving session. The public façade constructs a
//! clock-seeded context per call; tests construct their own with a fixed seed
//! for reproducibility.

use rug::rand::RandState;
use rug::Integer;

/// Seeded PRNG plus verbosity, threaded through all probabilistic operations.
pub struct Context {
    rng: RandState<'static>,
    /// Trace verbosity: 0 quiet, 1 progress, 2+ detailed search tracing.
    pub verbose: u8,
}

impl Context {
    /// Create a context seeded from the wall clock and process id.
    pub fn new() -> Self {
        Self::with_seed(clock_seed())
    }

    /// Create a context with a fixed seed (reproducible runs, tests).
    pub fn with_seed(seed: u64) -> Self {
        let mut rng = RandState::new();
        rng.seed(&Integer::from(seed));
        Context { rng, verbose: 0 }
    }

    /// Uniform random integer with the given number of bits.
    pub fn random_bits(&mut self, bits: u32) -> Integer {
        Integer::from(Integer::random_bits(bits, &mut self.rng))
    }

    /// Uniform random integer in `[0, bound)`. `bound` must be positive.
    pub fn random_below(&mut self, bound: &Integer) -> Integer {
        bound.clone().random_below(&mut self.rng)
    }

    /// Random base in `[2, n-2]` for Miller–Rabin. `n` must exceed 4.
    pub fn random_base(&mut self, n: &Integer) -> Integer {
        loop {
            let base = self.random_below(n);
            if base > 1u32 && base < Integer::from(n - 1u32) {
                return base;
            }
        }
    }
}

impl Default for Context {
    fn default() -> Self {
        Self::new()
    }
}

fn clock_seed() -> u64 {
    use std::collections::hash_map::DefaultHasher;
    use std::hash::{Hash, Hasher};
    let mut h = DefaultHasher::new();
    std::time::SystemTime::now().hash(&mut h);
    std::process::id().hash(&mut h);
    h.finish()
}
