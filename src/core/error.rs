//! Error types for the engine.
//!
//! `GridError` covers slot-level failures. `EngineError` wraps it together
//! with the board and configuration failures. Rejected swap requests are not
//! errors; they come back as `SwapOutcome::Rejected`.

use thiserror::Error;

use super::Position;
use crate::tokens::TokenId;

/// Slot-level failures reported by `Grid`.
#[derive(Error, Debug, Clone, Copy, PartialEq, Eq)]
pub enum GridError {
    /// Coordinate outside the grid.
    #[error("position {0} is outside the grid")]
    OutOfBounds(Position),

    /// Tried to put an item into an occupied slot.
    #[error("slot {0} is already occupied")]
    SlotOccupied(Position),

    /// Tried to read or remove an item from an empty slot.
    #[error("slot {0} is empty")]
    SlotEmpty(Position),
}

/// Errors raised by the board, pool and cascade controller.
#[derive(Error, Debug)]
pub enum EngineError {
    #[error(transparent)]
    Grid(#[from] GridError),

    /// A token id that the pool never handed out.
    #[error("unknown token {0}")]
    UnknownToken(TokenId),

    /// A placed token whose recorded position disagrees with its slot.
    #[error("token {token} sits in slot {slot} but records position {recorded}")]
    PositionMismatch {
        token: TokenId,
        slot: Position,
        recorded: Position,
    },

    /// Configuration values the engine cannot run with.
    #[error("invalid configuration: {message}")]
    InvalidConfig { message: String },

    /// A text layout that does not describe a rectangular board.
    #[error("invalid layout: {message}")]
    InvalidLayout { message: String },

    /// Configuration file could not be parsed.
    #[error("configuration parse error: {0}")]
    Config(#[from] serde_json::Error),
}

/// Result type alias for engine operations.
pub type EngineResult<T> = Result<T, EngineError>;
