//! Match detection and move availability integration tests.
//!
//! Boards are built with `Board::from_rows`: the first row is the top of the
//! board, `y = 0` is the bottom row.

use rust_match3::core::{GameRng, Position};
use rust_match3::grid::Board;
use rust_match3::matching::{MatchDetector, MatchType, MoveScanner, Orientation};
use rust_match3::tokens::{TokenId, TokenPool};

fn layout(rows: &[&str], type_count: u8) -> Board {
    Board::from_rows(rows, TokenPool::new(type_count, GameRng::new(11))).unwrap()
}

fn id(board: &Board, x: i32, y: i32) -> TokenId {
    board.id_at(Position::new(x, y)).unwrap()
}

/// The (x + y) % 3 diagonal pattern: full, match-free and without moves.
fn diagonal_board() -> Board {
    layout(
        &[
            "0 1 2 0",
            "2 0 1 2",
            "1 2 0 1",
            "0 1 2 0",
        ],
        3,
    )
}

// =============================================================================
// Branching Shapes
// =============================================================================

/// Test that a plus shape counts its centre once.
#[test]
fn test_plus_shape_is_five() {
    let board = layout(
        &[
            "3 0 3",
            "0 0 0",
            "3 0 3",
        ],
        4,
    );
    let detector = MatchDetector::new(&board);

    for seed in [id(&board, 1, 1), id(&board, 1, 2), id(&board, 0, 1)] {
        let m = detector.find_match(seed).unwrap();
        assert_eq!(m.len(), 5);
        assert_eq!(m.orientation(), Orientation::Both);
        assert_eq!(m.match_type(), MatchType::Cross);
    }
}

/// Test that a T shape is found from the end of its stem.
#[test]
fn test_t_shape_from_stem() {
    let board = layout(
        &[
            "1 1 1",
            "2 1 3",
            "3 1 2",
        ],
        4,
    );
    let m = MatchDetector::new(&board).find_match(id(&board, 1, 0)).unwrap();
    assert_eq!(m.len(), 5);
    assert_eq!(m.match_type(), MatchType::Cross);
}

/// Test that a solid block is found in full, with duplicate encounters counted
/// separately from the set.
#[test]
fn test_solid_block_counts_each_token_once() {
    let board = layout(&["000", "000", "000"], 3);
    let m = MatchDetector::new(&board).find_match(id(&board, 0, 0)).unwrap();
    assert_eq!(m.len(), 9);
    assert!(m.unlisted() > 0);

    let mut tokens = m.tokens().to_vec();
    tokens.sort_unstable();
    tokens.dedup();
    assert_eq!(tokens.len(), 9);
}

/// Test that a line of five classifies as Match5 and a line of four as Match4.
#[test]
fn test_line_classification() {
    let board = layout(&["12121", "00000"], 3);
    let five = MatchDetector::new(&board).find_match(id(&board, 2, 0)).unwrap();
    assert_eq!(five.match_type(), MatchType::Match5);

    let board = layout(&["1212", "0000"], 3);
    let four = MatchDetector::new(&board).find_match(id(&board, 0, 0)).unwrap();
    assert_eq!(four.match_type(), MatchType::Match4);
}

// =============================================================================
// Determinism
// =============================================================================

/// Test that detection is a pure function of the board contents.
#[test]
fn test_detection_is_deterministic() {
    let rows = [
        "0 0 1 0",
        "1 0 0 0",
        "0 0 1 2",
        "2 1 0 1",
    ];
    let first = layout(&rows, 3);
    let second = layout(&rows, 3);

    let a = MatchDetector::new(&first).find_match(id(&first, 1, 1)).unwrap();
    let again = MatchDetector::new(&first).find_match(id(&first, 1, 1)).unwrap();
    let b = MatchDetector::new(&second).find_match(id(&second, 1, 1)).unwrap();

    assert_eq!(a, again);
    assert_eq!(a, b);
    assert_eq!(MatchDetector::new(&first).find_all(), MatchDetector::new(&second).find_all());
}

// =============================================================================
// Move Availability
// =============================================================================

/// Test that the diagonal pattern has no matches and no moves.
#[test]
fn test_diagonal_pattern_is_deadlocked() {
    let board = diagonal_board();
    assert!(MatchDetector::new(&board).find_all().is_empty());
    assert!(MoveScanner::new(&board).is_deadlocked());
}

/// Test that the two-away pattern has a move.
#[test]
fn test_two_away_pattern_has_move() {
    let board = layout(&["0010"], 3);
    let scanner = MoveScanner::new(&board);
    assert!(!scanner.is_deadlocked());
    assert!(scanner.candidates().contains(&id(&board, 3, 0)));
}

/// Test that every reported move really forms a match when applied.
#[test]
fn test_reported_moves_are_real() {
    let rows = [
        "0 1 2 0 1",
        "1 2 0 1 2",
        "0 0 1 2 0",
        "2 1 0 0 1",
    ];
    let board = layout(&rows, 3);
    let moves = MoveScanner::new(&board).moves();
    assert!(!moves.is_empty());

    for mv in moves {
        let mut applied = layout(&rows, 3);
        applied.swap(mv.from, mv.to).unwrap();
        let detector = MatchDetector::new(&applied);
        let moved = applied.id_at(mv.to).unwrap();
        let partner = applied.id_at(mv.from).unwrap();
        assert!(
            detector.find_match(moved).is_some() || detector.find_match(partner).is_some(),
            "move {mv:?} does not match"
        );
    }
}
