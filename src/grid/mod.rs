//! The logical playing field.
//!
//! - `Grid<T>`: bounds-checked slot array with get/put/remove/swap/move
//! - `Board`: `Grid<TokenId>` plus the `TokenPool`, keeping slot and token
//!   positions consistent
//! - `Snapshot`: serializable copy for inspection

#[allow(clippy::module_inception)]
mod grid;
mod board;

pub use grid::Grid;
pub use board::{Board, CellView, Snapshot};
