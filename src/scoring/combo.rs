//! Time-decaying combo multiplier.

use std::time::Duration;

use tokio::time::Instant;

use super::Scoring;
use crate::core::ComboConfig;

/// Multiplies each score event by the number of events chained so far.
///
/// An event chains when it arrives before the window opened by the previous
/// event runs out. The window shrinks as the multiplier grows, see
/// [`ComboConfig::window`].
#[derive(Clone, Debug)]
pub struct ComboScore {
    config: ComboConfig,
    total: u64,
    multiplier: u32,
    last_score: Option<Instant>,
}

impl ComboScore {
    pub fn new(config: ComboConfig) -> Self {
        Self {
            config,
            total: 0,
            multiplier: 0,
            last_score: None,
        }
    }

    /// Record a score event at an explicit instant.
    pub fn add_score_at(&mut self, base: u64, now: Instant) -> u64 {
        if self.combo_remaining(now).is_zero() {
            self.multiplier = 0;
        }
        self.multiplier += 1;
        self.last_score = Some(now);

        let awarded = base * u64::from(self.multiplier);
        self.total += awarded;
        awarded
    }

    /// Time left before the multiplier resets.
    #[must_use]
    pub fn combo_remaining(&self, now: Instant) -> Duration {
        match self.last_score {
            Some(last) => self
                .config
                .window(self.multiplier)
                .saturating_sub(now.saturating_duration_since(last)),
            None => Duration::ZERO,
        }
    }

    /// True while the next event would chain.
    #[must_use]
    pub fn is_combo_active(&self, now: Instant) -> bool {
        !self.combo_remaining(now).is_zero()
    }
}

impl Default for ComboScore {
    fn default() -> Self {
        Self::new(ComboConfig::default())
    }
}

impl Scoring for ComboScore {
    fn add_score(&mut self, base: u64) -> u64 {
        self.add_score_at(base, Instant::now())
    }

    fn total(&self) -> u64 {
        self.total
    }

    fn multiplier(&self) -> u32 {
        self.multiplier
    }

    fn reset(&mut self) {
        self.total = 0;
        self.multiplier = 0;
        self.last_score = None;
    }
}
