//! The board: a grid of token ids plus the pool that owns the tokens.
//!
//! A token's position is stored twice, once as the slot that references it
//! and once inside the token. Every mutator here updates both, so callers
//! never touch `Token::position` directly. `check_consistency` verifies the
//! invariant and is used heavily by the tests.
//!
//! ## Layout fixtures
//!
//! ```
//! use rust_match3::core::{GameRng, Position};
//! use rust_match3::grid::Board;
//! use rust_match3::tokens::TokenPool;
//!
//! // First row is the top of the board.
//! let board = Board::from_rows(&["G 1 .", "0 0 2"], TokenPool::new(3, GameRng::new(1))).unwrap();
//!
//! assert!(board.token_at(Position::new(0, 1)).unwrap().is_gem());
//! assert!(board.token_at(Position::new(2, 1)).is_none());
//! assert_eq!(board.token_at(Position::new(2, 0)).unwrap().colour(), Some(2));
//! ```

use serde::Serialize;

use super::Grid;
use crate::core::{Dimensions, EngineError, EngineResult, GridError, Position};
use crate::matching::MatchType;
use crate::tokens::{Kind, Token, TokenId, TokenPool};

/// Grid of placed tokens.
#[derive(Clone, Debug)]
pub struct Board {
    grid: Grid<TokenId>,
    pool: TokenPool,
}

impl Board {
    /// Create an empty board.
    pub fn new(dimensions: Dimensions, pool: TokenPool) -> Self {
        Self {
            grid: Grid::new(dimensions),
            pool,
        }
    }

    /// Build a board from text rows, top row first.
    ///
    /// `0`-`9` place a plain token of that colour, `G` places a gem and `.`
    /// leaves the slot empty. Whitespace is ignored.
    pub fn from_rows(rows: &[&str], pool: TokenPool) -> EngineResult<Self> {
        let parsed: Vec<Vec<char>> = rows
            .iter()
            .map(|row| row.chars().filter(|c| !c.is_whitespace()).collect())
            .collect();

        let height = parsed.len();
        let width = parsed.first().map_or(0, Vec::len);
        if width == 0 || parsed.iter().any(|row| row.len() != width) {
            return Err(EngineError::InvalidLayout {
                message: "rows must be non-empty and of equal length".to_string(),
            });
        }

        let type_count = pool.type_count();
        let mut board = Self::new(Dimensions::new(width, height), pool);

        for (row_index, row) in parsed.iter().enumerate() {
            let y = (height - 1 - row_index) as i32;
            for (x, cell) in row.iter().enumerate() {
                let position = Position::new(x as i32, y);
                match *cell {
                    '.' => {}
                    'G' => {
                        let id = board.pool.acquire(0);
                        board.pool.promote(id, MatchType::Match5)?;
                        board.place(id, position)?;
                    }
                    c => {
                        let colour = c
                            .to_digit(10)
                            .filter(|d| *d < u32::from(type_count))
                            .ok_or_else(|| EngineError::InvalidLayout {
                                message: format!("unexpected cell '{c}' at {position}"),
                            })?;
                        let id = board.pool.acquire(colour as u8);
                        board.place(id, position)?;
                    }
                }
            }
        }

        Ok(board)
    }

    #[must_use]
    pub fn dimensions(&self) -> Dimensions {
        self.grid.dimensions()
    }

    /// Read-only view of the slots.
    #[must_use]
    pub fn grid(&self) -> &Grid<TokenId> {
        &self.grid
    }

    #[must_use]
    pub fn pool(&self) -> &TokenPool {
        &self.pool
    }

    pub fn pool_mut(&mut self) -> &mut TokenPool {
        &mut self.pool
    }

    /// Look up a live token, placed or not.
    #[must_use]
    pub fn token(&self, id: TokenId) -> Option<&Token> {
        self.pool.get(id)
    }

    /// The token id in a slot.
    #[must_use]
    pub fn id_at(&self, position: Position) -> Option<TokenId> {
        self.grid.item_at(position)
    }

    /// The token in a slot.
    #[must_use]
    pub fn token_at(&self, position: Position) -> Option<&Token> {
        self.id_at(position).and_then(|id| self.pool.get(id))
    }

    /// True when the token currently occupies the slot it records.
    #[must_use]
    pub fn is_placed(&self, id: TokenId) -> bool {
        self.pool
            .get(id)
            .is_some_and(|token| self.grid.item_at(token.position) == Some(id))
    }

    /// Put a token into an empty slot.
    pub fn place(&mut self, id: TokenId, position: Position) -> EngineResult<()> {
        let token = self.pool.get_mut(id)?;
        self.grid.put(position, id)?;
        token.position = position;
        Ok(())
    }

    /// Remove the token from a slot. The token keeps its last position.
    pub fn take(&mut self, position: Position) -> EngineResult<TokenId> {
        Ok(self.grid.remove(position)?)
    }

    /// Exchange two occupied slots and the positions their tokens record.
    pub fn swap(&mut self, a: Position, b: Position) -> EngineResult<()> {
        let id_a = self.grid.get(a)?.ok_or(GridError::SlotEmpty(a))?;
        let id_b = self.grid.get(b)?.ok_or(GridError::SlotEmpty(b))?;
        self.grid.swap(a, b)?;
        self.pool.get_mut(id_a)?.position = b;
        self.pool.get_mut(id_b)?.position = a;
        Ok(())
    }

    /// Move a token into an empty slot.
    pub fn move_token(&mut self, src: Position, dst: Position) -> EngineResult<TokenId> {
        let id = self.grid.move_item(src, dst)?;
        self.pool.get_mut(id)?.position = dst;
        Ok(id)
    }

    /// Mark a token as moving (`false`) or at rest (`true`).
    pub fn set_idle(&mut self, id: TokenId, idle: bool) -> EngineResult<()> {
        self.pool.get_mut(id)?.idle = idle;
        Ok(())
    }

    /// Remove every placed token and return it to the pool.
    pub fn clear(&mut self) -> EngineResult<usize> {
        let placed: Vec<TokenId> = self.grid.occupied().map(|(_, id)| id).collect();
        self.grid.clear();
        for id in &placed {
            self.pool.release(*id)?;
        }
        Ok(placed.len())
    }

    /// Verify that every placed token records its own slot.
    pub fn check_consistency(&self) -> EngineResult<()> {
        for (slot, id) in self.grid.occupied() {
            let token = self.pool.get(id).ok_or(EngineError::UnknownToken(id))?;
            if token.position != slot {
                return Err(EngineError::PositionMismatch {
                    token: id,
                    slot,
                    recorded: token.position,
                });
            }
        }
        Ok(())
    }

    /// True when no column has an empty slot below an occupied one.
    #[must_use]
    pub fn is_settled(&self) -> bool {
        let dims = self.dimensions();
        (0..dims.width as i32).all(|x| {
            let mut seen_gap = false;
            (0..dims.height as i32).all(|y| {
                let empty = self.grid.is_empty(Position::new(x, y));
                let ok = empty || !seen_gap;
                seen_gap |= empty;
                ok
            })
        })
    }

    /// Serializable copy of the visible state.
    #[must_use]
    pub fn snapshot(&self) -> Snapshot {
        let dims = self.dimensions();
        let cells = dims
            .positions()
            .map(|position| {
                self.token_at(position).map(|token| CellView {
                    token: token.id,
                    type_code: token.type_code(),
                    kind: token.kind,
                    idle: token.idle,
                })
            })
            .collect();

        Snapshot {
            width: dims.width,
            height: dims.height,
            cells,
        }
    }
}

fn cell_label(token: Option<&Token>) -> String {
    match token {
        None => ".".to_string(),
        Some(token) => match token.kind {
            Kind::Plain => format!("{}", token.colour),
            Kind::LineBonus => format!("{}+", token.colour),
            Kind::CrossBonus => format!("{}x", token.colour),
            Kind::Gem => "G".to_string(),
        },
    }
}

impl std::fmt::Display for Board {
    /// Top row first, one cell per column.
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        let dims = self.dimensions();
        for y in (0..dims.height as i32).rev() {
            let row: Vec<String> = (0..dims.width as i32)
                .map(|x| format!("{:<3}", cell_label(self.token_at(Position::new(x, y)))))
                .collect();
            writeln!(f, "{}", row.concat().trim_end())?;
        }
        Ok(())
    }
}

/// One occupied cell in a `Snapshot`.
#[derive(Clone, Debug, PartialEq, Eq, Serialize)]
pub struct CellView {
    pub token: TokenId,
    pub type_code: i32,
    pub kind: Kind,
    pub idle: bool,
}

/// Row-major copy of the board, bottom row first.
#[derive(Clone, Debug, PartialEq, Eq, Serialize)]
pub struct Snapshot {
    pub width: usize,
    pub height: usize,
    pub cells: Vec<Option<CellView>>,
}

impl Snapshot {
    /// The cell at a position, `None` when empty or out of bounds.
    #[must_use]
    pub fn cell(&self, position: Position) -> Option<&CellView> {
        Dimensions::new(self.width, self.height)
            .index(position)
            .and_then(|idx| self.cells[idx].as_ref())
    }
}
