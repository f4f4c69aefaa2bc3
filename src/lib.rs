//! # rust-match3
//!
//! The rules engine of a tile-matching (match-3) puzzle game.
//!
//! Given a rectangular grid of coloured tokens, the engine validates player
//! swaps, detects matches (including branching L, T and plus shapes),
//! resolves them into score and powerup tokens, cascades the grid after
//! removals and works out whether any legal move remains.
//!
//! ## Design Principles
//!
//! 1. **Logical grid only**: rendering, audio and animation are external
//!    collaborators. The engine asks them to move tokens and gets back
//!    completion handles.
//!
//! 2. **Single writer**: every mutation goes through `&mut Cascade`, so no
//!    two cascades can run on one board.
//!
//! 3. **Deterministic**: colour rolls and hint choice come from seeded
//!    `GameRng` streams; match detection is a pure function of the board.
//!
//! ## Modules
//!
//! - `core`: positions, RNG, configuration, errors
//! - `tokens`: tokens, powerup kinds and the pool
//! - `grid`: the slot grid and the board that keeps positions consistent
//! - `matching`: match sets, detection and move availability
//! - `scoring`: score accounting and the combo multiplier
//! - `motion`: motion requests and completion handles
//! - `events`: effect and game-state notifications
//! - `cascade`: the swap → resolve → collapse → refill → scan controller
//!
//! ## Example
//!
//! ```
//! use rust_match3::{Cascade, Collaborators, EngineConfig};
//!
//! # tokio_test::block_on(async {
//! let mut game = Cascade::new(EngineConfig::new(8, 8).with_seed(7), Collaborators::default()).unwrap();
//! game.populate(false).await.unwrap();
//!
//! assert_eq!(game.board().grid().occupied_count(), 64);
//! assert!(game.board().check_consistency().is_ok());
//! # });
//! ```

pub mod core;
pub mod tokens;
pub mod grid;
pub mod matching;
pub mod scoring;
pub mod motion;
pub mod events;
pub mod cascade;

// Re-export commonly used types
pub use crate::core::{
    Axis, Dimensions, Direction, Position,
    GameRng,
    ComboConfig, EngineConfig, MAX_COMBO_SECS,
    EngineError, EngineResult, GridError,
};

pub use crate::tokens::{Kind, Token, TokenId, TokenPool, GEM_TYPE};

pub use crate::grid::{Board, CellView, Grid, Snapshot};

pub use crate::matching::{Match, MatchDetector, MatchType, Move, MoveScanner, Orientation};

pub use crate::scoring::{ComboScore, FlatScore, Scoring};

pub use crate::motion::{Completion, InstantMotion, Motion, Target, TimedMotion};

pub use crate::events::{Effects, Event, EventLog, GameEvents, Silent};

pub use crate::cascade::{
    Cascade, CascadeReport, Collaborators, Phase, PopulateReport, SwapOutcome, SwapRejection,
};
