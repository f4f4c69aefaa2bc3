//! Move availability.
//!
//! A move is a swap of an idle token with an idle orthogonal neighbour that
//! would produce a match. Swaps are evaluated hypothetically: the scanner
//! reads colours through a view that exchanges the two slots, so the board
//! is never mutated. A swap involving a gem is always a move.

use rustc_hash::FxHashSet;
use serde::Serialize;

use crate::core::{Axis, Direction, Position};
use crate::grid::Board;
use crate::tokens::TokenId;

/// One legal swap: `token` moves from `from` to `to`.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Serialize)]
pub struct Move {
    pub token: TokenId,
    pub from: Position,
    pub to: Position,
}

/// Finds legal moves on a stable board.
#[derive(Clone, Copy)]
pub struct MoveScanner<'a> {
    board: &'a Board,
}

impl<'a> MoveScanner<'a> {
    pub fn new(board: &'a Board) -> Self {
        Self { board }
    }

    /// Every legal move, row-major by moving token, directions in
    /// left/right/up/down order.
    #[must_use]
    pub fn moves(&self) -> Vec<Move> {
        let mut moves = Vec::new();
        for (from, id) in self.board.grid().occupied() {
            if !self.idle_at(from) {
                continue;
            }
            for direction in Direction::ALL {
                let to = from.step(direction);
                if self.idle_at(to) && self.is_move(from, to) {
                    moves.push(Move { token: id, from, to });
                }
            }
        }
        moves
    }

    /// Tokens that have at least one legal move, in scan order.
    #[must_use]
    pub fn candidates(&self) -> Vec<TokenId> {
        let mut seen = FxHashSet::default();
        self.moves()
            .into_iter()
            .filter(|m| seen.insert(m.token))
            .map(|m| m.token)
            .collect()
    }

    /// True when no legal move exists.
    #[must_use]
    pub fn is_deadlocked(&self) -> bool {
        self.moves().is_empty()
    }

    fn idle_at(&self, position: Position) -> bool {
        self.board.token_at(position).is_some_and(|token| token.is_idle())
    }

    /// Would swapping the tokens at `a` and `b` form a match?
    fn is_move(&self, a: Position, b: Position) -> bool {
        let (Some(ta), Some(tb)) = (self.board.token_at(a), self.board.token_at(b)) else {
            return false;
        };
        if ta.is_gem() || tb.is_gem() {
            return true;
        }
        let (Some(ca), Some(cb)) = (ta.colour(), tb.colour()) else {
            return false;
        };
        if ca == cb {
            return false;
        }

        // After the swap colour `ca` sits at `b` and `cb` sits at `a`.
        let colour_at = |p: Position| -> Option<u8> {
            let source = if p == a {
                b
            } else if p == b {
                a
            } else {
                p
            };
            self.board
                .token_at(source)
                .filter(|token| token.is_idle())
                .and_then(|token| token.colour())
        };

        [(b, ca), (a, cb)].into_iter().any(|(at, colour)| {
            [Axis::Horizontal, Axis::Vertical].into_iter().any(|axis| {
                let run: usize = axis
                    .directions()
                    .into_iter()
                    .map(|direction| {
                        let mut count = 0;
                        let mut p = at.step(direction);
                        while colour_at(p) == Some(colour) {
                            count += 1;
                            p = p.step(direction);
                        }
                        count
                    })
                    .sum();
                run >= 2
            })
        })
    }
}
