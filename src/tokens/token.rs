//! Token identity and state.
//!
//! A token is one tile on the board: a colour, a `Kind`, the grid position
//! it was last placed at, and an idle flag that is cleared while a motion
//! owns the token.

use serde::{Deserialize, Serialize};

use crate::core::Position;
use crate::matching::MatchType;

/// Type code reported for gems, which match no colour.
pub const GEM_TYPE: i32 = -1;

/// Unique identifier for a pooled token.
///
/// Ids are slab indices and are reused after a token is released.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
pub struct TokenId(pub u32);

impl TokenId {
    #[inline]
    pub(crate) const fn index(self) -> usize {
        self.0 as usize
    }
}

impl std::fmt::Display for TokenId {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "Token({})", self.0)
    }
}

/// What a token does when it is resolved.
#[derive(Clone, Copy, Debug, Default, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub enum Kind {
    /// Ordinary coloured token.
    #[default]
    Plain,
    /// Clears the 3x3 neighbourhood when resolved.
    LineBonus,
    /// Clears its row and column when resolved.
    CrossBonus,
    /// Matches everything; fires when swapped.
    Gem,
}

impl Kind {
    /// The powerup a match of the given type produces.
    #[must_use]
    pub const fn from_match_type(match_type: MatchType) -> Option<Kind> {
        match match_type {
            MatchType::Match4 => Some(Kind::LineBonus),
            MatchType::Cross => Some(Kind::CrossBonus),
            MatchType::Match5 => Some(Kind::Gem),
            MatchType::Invalid => None,
        }
    }

    /// The effect type used when this powerup resolves.
    #[must_use]
    pub const fn effect(self) -> MatchType {
        match self {
            Kind::Plain => MatchType::Invalid,
            Kind::LineBonus => MatchType::Match4,
            Kind::CrossBonus => MatchType::Cross,
            Kind::Gem => MatchType::Match5,
        }
    }

    /// Anything but `Plain`.
    #[must_use]
    pub const fn is_powerup(self) -> bool {
        !matches!(self, Kind::Plain)
    }
}

/// A single tile.
#[derive(Clone, Debug, PartialEq, Eq, Serialize, Deserialize)]
pub struct Token {
    pub(crate) id: TokenId,
    pub(crate) colour: u8,
    pub(crate) kind: Kind,
    pub(crate) position: Position,
    pub(crate) idle: bool,
}

impl Token {
    /// A fresh, idle, plain token.
    #[must_use]
    pub fn new(id: TokenId, colour: u8) -> Self {
        Self {
            id,
            colour,
            kind: Kind::Plain,
            position: Position::default(),
            idle: true,
        }
    }

    #[must_use]
    pub fn id(&self) -> TokenId {
        self.id
    }

    /// Match colour; `None` for gems.
    #[must_use]
    pub fn colour(&self) -> Option<u8> {
        if self.is_gem() {
            None
        } else {
            Some(self.colour)
        }
    }

    /// Integer type code: the colour, or `GEM_TYPE` for gems.
    #[must_use]
    pub fn type_code(&self) -> i32 {
        self.colour().map_or(GEM_TYPE, i32::from)
    }

    #[must_use]
    pub fn kind(&self) -> Kind {
        self.kind
    }

    #[must_use]
    pub fn is_gem(&self) -> bool {
        self.kind == Kind::Gem
    }

    /// Last grid position this token was placed at.
    #[must_use]
    pub fn position(&self) -> Position {
        self.position
    }

    /// False while a motion owns this token.
    #[must_use]
    pub fn is_idle(&self) -> bool {
        self.idle
    }

    /// True when both tokens carry the same match colour.
    #[must_use]
    pub fn matches(&self, other: &Token) -> bool {
        match (self.colour(), other.colour()) {
            (Some(a), Some(b)) => a == b,
            _ => false,
        }
    }
}
