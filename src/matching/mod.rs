//! Match rules.
//!
//! - `Match`: ordered, duplicate-suppressing token set with an orientation
//! - `MatchDetector`: seed → branching match, run counting
//! - `MoveScanner`: legal moves, hint candidates and deadlock detection
//!
//! Everything here is read-only over a `Board`; resolving matches is the
//! cascade's job.

mod detector;
mod matched;
mod moves;

pub use detector::MatchDetector;
pub use matched::{Match, MatchType, Orientation};
pub use moves::{Move, MoveScanner};
