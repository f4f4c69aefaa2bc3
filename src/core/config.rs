//! Engine configuration.
//!
//! Hosts configure the engine at startup by providing:
//! - `EngineConfig`: board size, colour count, seed and rule switches
//! - `ComboConfig`: timing of the combo window used by `ComboScore`
//!
//! Both deserialize from JSON with every field optional.

use serde::{Deserialize, Serialize};
use std::time::Duration;

use super::error::{EngineError, EngineResult};
use super::Dimensions;

/// Longest combo window a config may ask for.
pub const MAX_COMBO_SECS: f32 = 3600.0;

/// Timing of the combo window.
///
/// Each score event opens (or refreshes) a window of
/// `max_combo_secs - ln(multiplier) / 2` seconds, never shorter than
/// `min_combo_secs`.
#[derive(Clone, Debug, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct ComboConfig {
    /// Window length at multiplier 1.
    pub max_combo_secs: f32,

    /// Lower clamp for the window at high multipliers.
    pub min_combo_secs: f32,
}

impl Default for ComboConfig {
    fn default() -> Self {
        Self {
            max_combo_secs: 2.0,
            min_combo_secs: 0.25,
        }
    }
}

impl ComboConfig {
    /// Window length for a given multiplier.
    #[must_use]
    pub fn window(&self, multiplier: u32) -> Duration {
        let secs = self.max_combo_secs - (multiplier.max(1) as f32).ln() / 2.0;
        Duration::from_secs_f32(secs.max(self.min_combo_secs).max(0.0).min(MAX_COMBO_SECS))
    }

    fn validate(&self) -> EngineResult<()> {
        let in_range = |secs: f32| secs.is_finite() && secs > 0.0 && secs <= MAX_COMBO_SECS;
        if !in_range(self.max_combo_secs) || !in_range(self.min_combo_secs) {
            return Err(EngineError::InvalidConfig {
                message: format!(
                    "combo window {}..{} s must lie in (0, {MAX_COMBO_SECS}]",
                    self.min_combo_secs, self.max_combo_secs
                ),
            });
        }
        if self.min_combo_secs > self.max_combo_secs {
            return Err(EngineError::InvalidConfig {
                message: "combo.min_combo_secs exceeds combo.max_combo_secs".to_string(),
            });
        }
        Ok(())
    }
}

/// Complete engine configuration.
#[derive(Clone, Debug, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct EngineConfig {
    /// Grid width in slots.
    pub width: usize,

    /// Grid height in slots.
    pub height: usize,

    /// Number of token colours. At least 3 so refills can always avoid matches.
    pub type_count: u8,

    /// Seed for colour rolls and hint selection.
    pub seed: u64,

    /// Only orthogonally adjacent tokens may be swapped.
    pub require_adjacent: bool,

    /// Clear the whole board (as a gem effect) when no moves remain.
    pub clear_on_deadlock: bool,

    /// Combo window timing.
    pub combo: ComboConfig,
}

impl Default for EngineConfig {
    fn default() -> Self {
        Self {
            width: 8,
            height: 8,
            type_count: 5,
            seed: 42,
            require_adjacent: true,
            clear_on_deadlock: false,
            combo: ComboConfig::default(),
        }
    }
}

impl EngineConfig {
    /// Create a config for the given board size with default rules.
    pub fn new(width: usize, height: usize) -> Self {
        Self {
            width,
            height,
            ..Self::default()
        }
    }

    /// Parse a JSON document; missing fields take their defaults.
    pub fn from_json(json: &str) -> EngineResult<Self> {
        let config: Self = serde_json::from_str(json)?;
        config.validate()?;
        Ok(config)
    }

    /// Set the number of colours.
    #[must_use]
    pub fn with_type_count(mut self, type_count: u8) -> Self {
        self.type_count = type_count;
        self
    }

    /// Set the seed.
    #[must_use]
    pub fn with_seed(mut self, seed: u64) -> Self {
        self.seed = seed;
        self
    }

    /// Allow swapping any two tokens, adjacent or not.
    #[must_use]
    pub fn allow_distant_swaps(mut self) -> Self {
        self.require_adjacent = false;
        self
    }

    /// Clear the board when a deadlock is detected.
    #[must_use]
    pub fn clear_on_deadlock(mut self) -> Self {
        self.clear_on_deadlock = true;
        self
    }

    /// Set the combo timing.
    #[must_use]
    pub fn with_combo(mut self, combo: ComboConfig) -> Self {
        self.combo = combo;
        self
    }

    /// Board dimensions.
    #[must_use]
    pub fn dimensions(&self) -> Dimensions {
        Dimensions::new(self.width, self.height)
    }

    /// Reject values the engine cannot run with.
    pub fn validate(&self) -> EngineResult<()> {
        if self.width == 0 || self.height == 0 {
            return Err(EngineError::InvalidConfig {
                message: format!("grid dimensions {}x{} must be non-zero", self.width, self.height),
            });
        }
        if i32::try_from(self.width).is_err() || i32::try_from(self.height).is_err() {
            return Err(EngineError::InvalidConfig {
                message: format!("grid dimensions {}x{} are too large", self.width, self.height),
            });
        }
        if self.type_count < 3 {
            return Err(EngineError::InvalidConfig {
                message: format!("type_count is {}, need at least 3", self.type_count),
            });
        }
        self.combo.validate()
    }
}
