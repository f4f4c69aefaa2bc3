//! Core engine types: positions, RNG, configuration, errors.
//!
//! This module contains the shared vocabulary used by the grid, the match
//! detector and the cascade controller. It knows nothing about match rules.

pub mod position;
pub mod rng;
pub mod config;
pub mod error;

pub use position::{Axis, Dimensions, Direction, Position};
pub use rng::GameRng;
pub use config::{ComboConfig, EngineConfig, MAX_COMBO_SECS};
pub use error::{EngineError, EngineResult, GridError};
