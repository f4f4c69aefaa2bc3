//! Visual motion requests.
//!
//! The engine never animates anything itself. It asks a [`Motion`]
//! collaborator to move a token and gets back a [`Completion`] it can await
//! or poll. While a completion is pending the token is non-idle and is
//! ignored by matching, swaps, moves and collapse.
//!
//! ## Implementations
//!
//! - [`InstantMotion`]: every completion is already finished (tests, headless)
//! - [`TimedMotion`]: each motion is a tokio timer of fixed duration

mod completion;

pub use completion::Completion;

use std::time::Duration;

use crate::core::Position;
use crate::tokens::TokenId;

/// Where a resolved token flies to.
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub enum Target {
    /// The score collection point.
    CollectionPoint,
    /// Another token (the powerup a match is fusing into).
    Token(TokenId),
}

/// Moves tokens on screen.
pub trait Motion {
    /// Move a token to a grid slot (swaps, collapse, refill drops).
    fn move_to(&mut self, token: TokenId, position: Position) -> Completion;

    /// Move a token off the grid toward a target (resolution).
    fn move_toward(&mut self, token: TokenId, target: Target) -> Completion;
}

/// Completes every motion immediately.
#[derive(Clone, Copy, Debug, Default)]
pub struct InstantMotion;

impl Motion for InstantMotion {
    fn move_to(&mut self, _token: TokenId, _position: Position) -> Completion {
        Completion::ready()
    }

    fn move_toward(&mut self, _token: TokenId, _target: Target) -> Completion {
        Completion::ready()
    }
}

/// Completes every motion after a fixed delay.
///
/// Must be used inside a tokio runtime.
#[derive(Clone, Copy, Debug)]
pub struct TimedMotion {
    duration: Duration,
}

impl TimedMotion {
    pub fn new(duration: Duration) -> Self {
        Self { duration }
    }

    fn timer(&self) -> Completion {
        let duration = self.duration;
        Completion::spawn(async move {
            tokio::time::sleep(duration).await;
        })
    }
}

impl Motion for TimedMotion {
    fn move_to(&mut self, _token: TokenId, _position: Position) -> Completion {
        self.timer()
    }

    fn move_toward(&mut self, _token: TokenId, _target: Target) -> Completion {
        self.timer()
    }
}
