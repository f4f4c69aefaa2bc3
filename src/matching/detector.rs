//! Match detection.
//!
//! `find_match` grows a match tree from a seed token:
//!
//! 1. Walk the horizontal axis (left, then right) collecting idle tokens of
//!    the seed's colour. A run of two or more besides the seed is merged.
//! 2. From every token on a merged run, walk the perpendicular axis; runs of
//!    two or more are merged and searched again on the other axis. This is
//!    what produces L, T and plus shapes.
//! 3. Repeat 1-2 for the vertical axis (up, then down).
//!
//! Branch search uses an explicit frame stack, so depth is bounded by the
//! heap rather than the call stack. Exploration order is fixed, which makes
//! the result a pure function of the board.

use smallvec::SmallVec;

use super::{Match, Orientation};
use crate::core::{Axis, Direction, Position};
use crate::grid::Board;
use crate::tokens::{Token, TokenId};

/// Tokens on a merged run still to be searched along `axis`.
struct Frame {
    tokens: SmallVec<[TokenId; 8]>,
    next: usize,
    axis: Axis,
}

const fn orientation_of(axis: Axis) -> Orientation {
    match axis {
        Axis::Horizontal => Orientation::Horizontal,
        Axis::Vertical => Orientation::Vertical,
    }
}

/// Read-only match queries over a board.
#[derive(Clone, Copy)]
pub struct MatchDetector<'a> {
    board: &'a Board,
}

impl<'a> MatchDetector<'a> {
    pub fn new(board: &'a Board) -> Self {
        Self { board }
    }

    /// The full match containing `seed`, or `None` if the seed matches nothing.
    #[must_use]
    pub fn find_match(&self, seed: TokenId) -> Option<Match> {
        if !self.board.is_placed(seed) {
            return None;
        }
        let origin = self.board.token(seed)?;
        let mut tree = Match::seeded(seed);

        for axis in [Axis::Horizontal, Axis::Vertical] {
            let run = self.walk_axis(&tree, origin, axis);
            if run.run_length() >= 2 {
                let found: SmallVec<[TokenId; 8]> = SmallVec::from_slice(run.tokens());
                tree.merge(run);
                self.grow_branches(&mut tree, found, axis.perpendicular());
            }
        }

        (tree.len() > 1).then_some(tree)
    }

    /// Every distinct match among idle placed tokens, in row-major seed order.
    #[must_use]
    pub fn find_all(&self) -> Vec<Match> {
        let mut found: Vec<Match> = Vec::new();
        for (_, id) in self.board.grid().occupied() {
            let idle = self.board.token(id).is_some_and(Token::is_idle);
            if !idle || found.iter().any(|m| m.contains(id)) {
                continue;
            }
            if let Some(m) = self.find_match(id) {
                found.push(m);
            }
        }
        found
    }

    /// Same-colour tokens in a straight line from `seed`, idle or not.
    #[must_use]
    pub fn count_run(&self, seed: TokenId, direction: Direction) -> usize {
        let Some(origin) = self.board.token(seed) else {
            return 0;
        };
        let mut count = 0;
        let mut position = origin.position().step(direction);
        while let Some(next) = self.board.token_at(position) {
            if !next.matches(origin) {
                break;
            }
            count += 1;
            position = position.step(direction);
        }
        count
    }

    /// True if `seed` is part of a line of three on either axis.
    ///
    /// Used during population to reject placements that would start a match.
    #[must_use]
    pub fn is_part_of_any_match(&self, seed: TokenId) -> bool {
        [Axis::Horizontal, Axis::Vertical].into_iter().any(|axis| {
            let [a, b] = axis.directions();
            self.count_run(seed, a) + self.count_run(seed, b) > 1
        })
    }

    /// Walk both directions of an axis from `origin`.
    fn walk_axis(&self, tree: &Match, origin: &Token, axis: Axis) -> Match {
        let mut run = Match::new();
        for direction in axis.directions() {
            self.walk(tree, origin, origin.position().step(direction), direction, &mut run);
        }
        run.set_orientation(orientation_of(axis));
        run
    }

    fn walk(&self, tree: &Match, origin: &Token, mut position: Position, direction: Direction, run: &mut Match) {
        while let Some(next) = self.board.token_at(position) {
            if !next.is_idle() || !next.matches(origin) {
                break;
            }
            if tree.contains(next.id()) {
                run.add_unlisted();
            } else {
                run.add(next.id());
            }
            position = position.step(direction);
        }
    }

    fn grow_branches(&self, tree: &mut Match, run: SmallVec<[TokenId; 8]>, axis: Axis) {
        let mut frames = vec![Frame { tokens: run, next: 0, axis }];

        while let Some(frame) = frames.last_mut() {
            let Some(&id) = frame.tokens.get(frame.next) else {
                frames.pop();
                continue;
            };
            frame.next += 1;
            let axis = frame.axis;

            let Some(origin) = self.board.token(id) else {
                continue;
            };
            let branch = self.walk_axis(tree, origin, axis);
            if branch.run_length() >= 2 {
                let found = SmallVec::from_slice(branch.tokens());
                tree.merge(branch);
                frames.push(Frame {
                    tokens: found,
                    next: 0,
                    axis: axis.perpendicular(),
                });
            }
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::core::GameRng;
    use crate::matching::MatchType;
    use crate::tokens::TokenPool;

    fn layout(rows: &[&str]) -> Board {
        Board::from_rows(rows, TokenPool::new(4, GameRng::new(0))).unwrap()
    }

    fn id(board: &Board, x: i32, y: i32) -> TokenId {
        board.id_at(Position::new(x, y)).unwrap()
    }

    #[test]
    fn test_horizontal_three() {
        let board = layout(&["2313", "1110"]);
        let m = MatchDetector::new(&board).find_match(id(&board, 0, 0)).unwrap();
        assert_eq!(m.len(), 3);
        assert_eq!(m.orientation(), Orientation::Horizontal);
        assert_eq!(m.tokens()[0], id(&board, 0, 0));
    }

    #[test]
    fn test_vertical_three() {
        let board = layout(&["12", "10", "13"]);
        let m = MatchDetector::new(&board).find_match(id(&board, 0, 1)).unwrap();
        assert_eq!(m.len(), 3);
        assert_eq!(m.orientation(), Orientation::Vertical);
    }

    #[test]
    fn test_pair_is_not_a_match() {
        let board = layout(&["2313", "1120"]);
        assert!(MatchDetector::new(&board).find_match(id(&board, 0, 0)).is_none());
    }

    #[test]
    fn test_l_shape() {
        let board = layout(&[
            "1 2 3",
            "1 3 2",
            "1 1 1",
        ]);
        let m = MatchDetector::new(&board).find_match(id(&board, 2, 0)).unwrap();
        assert_eq!(m.len(), 5);
        assert_eq!(m.orientation(), Orientation::Both);
        assert_eq!(m.match_type(), MatchType::Cross);
    }

    #[test]
    fn test_non_idle_tokens_break_runs() {
        let mut board = layout(&["2313", "1110"]);
        let middle = id(&board, 1, 0);
        board.set_idle(middle, false).unwrap();
        assert!(MatchDetector::new(&board).find_match(id(&board, 0, 0)).is_none());
    }

    #[test]
    fn test_gem_never_matches() {
        let board = layout(&["2313", "G00."]);
        assert!(MatchDetector::new(&board).find_match(id(&board, 0, 0)).is_none());
        assert!(MatchDetector::new(&board).find_match(id(&board, 1, 0)).is_none());
    }

    #[test]
    fn test_count_run_and_population_check() {
        let board = layout(&["0120", "1102"]);
        let detector = MatchDetector::new(&board);
        let seed = id(&board, 0, 0);
        assert_eq!(detector.count_run(seed, Direction::Right), 1);
        assert_eq!(detector.count_run(seed, Direction::Up), 0);
        assert!(!detector.is_part_of_any_match(seed));

        let board = layout(&["0120", "1112"]);
        let detector = MatchDetector::new(&board);
        assert!(detector.is_part_of_any_match(id(&board, 1, 0)));
    }

    #[test]
    fn test_find_all() {
        let board = layout(&[
            "2 2 2 3",
            "0 3 1 3",
            "1 1 0 3",
        ]);
        let all = MatchDetector::new(&board).find_all();
        assert_eq!(all.len(), 2);
        assert!(all.iter().all(|m| m.len() == 3));
    }
}
