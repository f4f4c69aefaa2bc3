//! Deterministic random number generation.
//!
//! ## Key Features
//!
//! - **Deterministic**: Same seed produces identical boards
//! - **Context streams**: Independent sequences for different purposes
//!   (colour rolls vs hint selection), so asking for a hint never changes
//!   which tokens drop next
//!
//! ```
//! use rust_match3::core::GameRng;
//!
//! let rng = GameRng::new(42);
//! let mut tokens = rng.for_context("tokens");
//! let mut again = GameRng::new(42).for_context("tokens");
//!
//! assert_eq!(tokens.gen_colour(6), again.gen_colour(6));
//! ```

use rand::{Rng, SeedableRng};
use rand_chacha::ChaCha8Rng;
use std::hash::{Hash, Hasher};

/// Deterministic RNG backed by ChaCha8.
#[derive(Clone, Debug)]
pub struct GameRng {
    inner: ChaCha8Rng,
    seed: u64,
}

impl GameRng {
    /// Create a new RNG with the given seed.
    #[must_use]
    pub fn new(seed: u64) -> Self {
        Self {
            inner: ChaCha8Rng::seed_from_u64(seed),
            seed,
        }
    }

    /// Create an independent stream for a specific context.
    ///
    /// The same context always produces the same stream from the same seed.
    #[must_use]
    pub fn for_context(&self, context: &str) -> Self {
        use std::collections::hash_map::DefaultHasher;

        let mut hasher = DefaultHasher::new();
        self.seed.hash(&mut hasher);
        context.hash(&mut hasher);
        Self::new(hasher.finish())
    }

    /// Uniform colour in `0..type_count`.
    pub fn gen_colour(&mut self, type_count: u8) -> u8 {
        self.inner.gen_range(0..type_count)
    }

    /// Choose a random element from a slice.
    #[must_use]
    pub fn choose<'a, T>(&mut self, slice: &'a [T]) -> Option<&'a T> {
        use rand::seq::SliceRandom;
        slice.choose(&mut self.inner)
    }
}
