//! Tokens and the pool that owns them.
//!
//! - `Token`: colour, kind, position and idle flag
//! - `Kind`: plain or one of the powerups
//! - `TokenPool`: acquire / release / reroll / promote

mod token;
mod pool;

pub use token::{Kind, Token, TokenId, GEM_TYPE};
pub use pool::TokenPool;
