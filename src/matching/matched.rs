//! Match sets and their classification.

use serde::{Deserialize, Serialize};
use smallvec::SmallVec;

use crate::tokens::TokenId;

/// Which axes a match extends along.
#[derive(Clone, Copy, Debug, Default, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub enum Orientation {
    #[default]
    None,
    Horizontal,
    Vertical,
    /// Runs on both axes (L, T and plus shapes).
    Both,
}

impl Orientation {
    fn combine(self, other: Orientation) -> Orientation {
        match (self, other) {
            (a, Orientation::None) => a,
            (Orientation::None, b) => b,
            (a, b) if a == b => a,
            _ => Orientation::Both,
        }
    }
}

/// What a match (or a powerup effect) amounts to.
#[derive(Clone, Copy, Debug, Default, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub enum MatchType {
    /// An ordinary match, or "no powerup involved" when passed to resolve.
    #[default]
    Invalid,
    /// Four in a line; makes a line bonus.
    Match4,
    /// Runs on both axes; makes a cross bonus.
    Cross,
    /// Five or more in a line; makes a gem. Also the match-everything effect.
    Match5,
}

/// An ordered set of distinct tokens that matched together.
///
/// Adding a token that is already present counts a duplicate encounter
/// (`unlisted`) instead of growing the set, so a token reached through two
/// branches is only counted once.
#[derive(Clone, Debug, Default, PartialEq, Eq)]
pub struct Match {
    tokens: SmallVec<[TokenId; 8]>,
    unlisted: usize,
    orientation: Orientation,
    upgrade: Option<TokenId>,
}

impl Match {
    /// Create an empty match.
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    /// Create a match around a seed token, which becomes the upgrade candidate.
    #[must_use]
    pub fn seeded(seed: TokenId) -> Self {
        let mut tokens = SmallVec::new();
        tokens.push(seed);
        Self {
            tokens,
            upgrade: Some(seed),
            ..Self::default()
        }
    }

    /// Add a token; returns `false` (and counts a duplicate) if it was already present.
    pub fn add(&mut self, id: TokenId) -> bool {
        if self.contains(id) {
            self.unlisted += 1;
            false
        } else {
            self.tokens.push(id);
            true
        }
    }

    /// Count a duplicate encounter without touching the set.
    pub fn add_unlisted(&mut self) {
        self.unlisted += 1;
    }

    /// Remove a token; returns whether it was present.
    pub fn remove(&mut self, id: TokenId) -> bool {
        match self.tokens.iter().position(|t| *t == id) {
            Some(idx) => {
                self.tokens.remove(idx);
                true
            }
            None => false,
        }
    }

    #[must_use]
    pub fn contains(&self, id: TokenId) -> bool {
        self.tokens.contains(&id)
    }

    /// Number of distinct tokens.
    #[must_use]
    pub fn len(&self) -> usize {
        self.tokens.len()
    }

    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.tokens.is_empty()
    }

    /// Tokens in insertion order.
    #[must_use]
    pub fn tokens(&self) -> &[TokenId] {
        &self.tokens
    }

    /// Duplicate encounters seen while building.
    #[must_use]
    pub fn unlisted(&self) -> usize {
        self.unlisted
    }

    /// Distinct tokens plus duplicate encounters: the length of the run walked.
    #[must_use]
    pub fn run_length(&self) -> usize {
        self.tokens.len() + self.unlisted
    }

    #[must_use]
    pub fn orientation(&self) -> Orientation {
        self.orientation
    }

    pub fn set_orientation(&mut self, orientation: Orientation) {
        self.orientation = orientation;
    }

    /// Absorb another match, keeping this match's order first.
    pub fn merge(&mut self, other: Match) {
        for id in other.tokens {
            self.add(id);
        }
        self.unlisted += other.unlisted;
        self.orientation = self.orientation.combine(other.orientation);
        if self.upgrade.is_none() {
            self.upgrade = other.upgrade;
        }
    }

    /// The token that becomes a powerup: the seed if there is one,
    /// otherwise the most recently added token.
    #[must_use]
    pub fn upgrade_candidate(&self) -> Option<TokenId> {
        self.upgrade
            .filter(|id| self.contains(*id))
            .or_else(|| self.tokens.last().copied())
    }

    /// Classify the match for powerup creation.
    #[must_use]
    pub fn match_type(&self) -> MatchType {
        if self.orientation == Orientation::Both {
            MatchType::Cross
        } else if self.len() >= 5 {
            MatchType::Match5
        } else if self.len() == 4 {
            MatchType::Match4
        } else {
            MatchType::Invalid
        }
    }
}

impl FromIterator<TokenId> for Match {
    fn from_iter<I: IntoIterator<Item = TokenId>>(iter: I) -> Self {
        let mut m = Match::new();
        for id in iter {
            m.add(id);
        }
        m
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn ids(range: std::ops::Range<u32>) -> impl Iterator<Item = TokenId> {
        range.map(TokenId)
    }

    #[test]
    fn test_add_suppresses_duplicates() {
        let mut m = Match::seeded(TokenId(1));
        assert!(m.add(TokenId(2)));
        assert!(!m.add(TokenId(1)));
        assert_eq!(m.len(), 2);
        assert_eq!(m.unlisted(), 1);
        assert_eq!(m.run_length(), 3);
    }

    #[test]
    fn test_merge_keeps_order_and_counts() {
        let mut a: Match = ids(0..3).collect();
        a.set_orientation(Orientation::Horizontal);
        let mut b: Match = ids(2..5).collect();
        b.add_unlisted();
        b.set_orientation(Orientation::Vertical);

        a.merge(b);

        assert_eq!(a.tokens(), &[TokenId(0), TokenId(1), TokenId(2), TokenId(3), TokenId(4)]);
        assert_eq!(a.unlisted(), 2);
        assert_eq!(a.orientation(), Orientation::Both);
    }

    #[test]
    fn test_orientation_combine() {
        let mut m = Match::seeded(TokenId(0));
        let mut h: Match = ids(1..3).collect();
        h.set_orientation(Orientation::Horizontal);
        m.merge(h);
        assert_eq!(m.orientation(), Orientation::Horizontal);

        let mut h2: Match = ids(3..4).collect();
        h2.set_orientation(Orientation::Horizontal);
        m.merge(h2);
        assert_eq!(m.orientation(), Orientation::Horizontal);
    }

    #[test]
    fn test_match_type() {
        let three: Match = ids(0..3).collect();
        assert_eq!(three.match_type(), MatchType::Invalid);

        let four: Match = ids(0..4).collect();
        assert_eq!(four.match_type(), MatchType::Match4);

        let five: Match = ids(0..5).collect();
        assert_eq!(five.match_type(), MatchType::Match5);

        let mut cross: Match = ids(0..5).collect();
        cross.set_orientation(Orientation::Both);
        assert_eq!(cross.match_type(), MatchType::Cross);
    }

    #[test]
    fn test_upgrade_candidate() {
        let mut m = Match::seeded(TokenId(7));
        m.add(TokenId(8));
        assert_eq!(m.upgrade_candidate(), Some(TokenId(7)));

        m.remove(TokenId(7));
        assert_eq!(m.upgrade_candidate(), Some(TokenId(8)));

        let unseeded: Match = ids(0..3).collect();
        assert_eq!(unseeded.upgrade_candidate(), Some(TokenId(2)));
        assert_eq!(Match::new().upgrade_candidate(), None);
    }

    #[test]
    fn test_remove() {
        let mut m: Match = ids(0..3).collect();
        assert!(m.remove(TokenId(1)));
        assert!(!m.remove(TokenId(1)));
        assert_eq!(m.tokens(), &[TokenId(0), TokenId(2)]);
    }
}
