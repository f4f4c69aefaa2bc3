//! Score accounting.
//!
//! The cascade reports each resolved match exactly once through the
//! [`Scoring`] trait. Hosts pick the rule; [`ComboScore`] is the standard
//! one, multiplying chained matches that land inside a shrinking window.

mod combo;

pub use combo::ComboScore;

/// Receives one score event per resolved match.
pub trait Scoring {
    /// Record a match worth `base` points; returns the points awarded.
    fn add_score(&mut self, base: u64) -> u64;

    /// Points awarded so far.
    fn total(&self) -> u64;

    /// Current multiplier (0 before the first event).
    fn multiplier(&self) -> u32;

    /// Forget all progress.
    fn reset(&mut self);
}

/// Awards the base points with no multiplier.
#[derive(Clone, Debug, Default)]
pub struct FlatScore {
    total: u64,
}

impl Scoring for FlatScore {
    fn add_score(&mut self, base: u64) -> u64 {
        self.total += base;
        base
    }

    fn total(&self) -> u64 {
        self.total
    }

    fn multiplier(&self) -> u32 {
        1
    }

    fn reset(&mut self) {
        self.total = 0;
    }
}
