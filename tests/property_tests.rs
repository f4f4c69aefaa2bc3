//! Property tests for board invariants under random play.

use proptest::prelude::*;

use rust_match3::cascade::{Cascade, Collaborators, SwapOutcome};
use rust_match3::core::{Direction, EngineConfig, Position};
use rust_match3::matching::MatchDetector;

/// What we check after every step of a random game.
#[derive(Debug, Default)]
struct Health {
    consistent: bool,
    full: bool,
    settled: bool,
    matches_left: usize,
}

fn health(cascade: &Cascade) -> Health {
    let board = cascade.board();
    Health {
        consistent: board.check_consistency().is_ok(),
        full: board.grid().occupied_count() == board.dimensions().area(),
        settled: board.is_settled(),
        matches_left: MatchDetector::new(board).find_all().len(),
    }
}

fn check(h: &Health) -> Result<(), TestCaseError> {
    prop_assert!(h.consistent);
    prop_assert!(h.full);
    prop_assert!(h.settled);
    prop_assert_eq!(h.matches_left, 0);
    Ok(())
}

proptest! {
    #![proptest_config(ProptestConfig::with_cases(48))]

    /// Populating without matches never leaves a match on the board.
    #[test]
    fn populate_leaves_no_matches(
        seed in any::<u64>(),
        width in 3usize..10,
        height in 3usize..10,
        types in 3u8..7,
    ) {
        let config = EngineConfig::new(width, height).with_type_count(types).with_seed(seed);
        let (h, exhausted) = tokio_test::block_on(async {
            let mut cascade = Cascade::new(config, Collaborators::default()).unwrap();
            let report = cascade.populate(false).await.unwrap();
            (health(&cascade), report.exhausted.len())
        });
        check(&h)?;
        prop_assert_eq!(exhausted, 0);
    }

    /// Random swaps always return to a full, consistent, match-free board.
    #[test]
    fn random_swaps_keep_invariants(
        seed in any::<u64>(),
        types in 3u8..6,
        swaps in prop::collection::vec((0i32..6, 0i32..6, 0usize..4), 1..12),
    ) {
        let config = EngineConfig::new(6, 6).with_type_count(types).with_seed(seed);
        let results = tokio_test::block_on(async {
            let mut cascade = Cascade::new(config, Collaborators::default()).unwrap();
            cascade.populate(false).await.unwrap();
            let mut results = vec![health(&cascade)];
            let mut last_score = cascade.score();

            for (x, y, d) in swaps {
                let from = Position::new(x, y);
                let to = from.step(Direction::ALL[d]);
                if !cascade.dimensions().contains(to) {
                    continue;
                }
                let outcome = cascade.try_swap(from, to).await.unwrap();
                if let SwapOutcome::Matched(report) = &outcome {
                    assert_eq!(cascade.score(), last_score + report.points);
                }
                last_score = cascade.score();
                results.push(health(&cascade));
            }
            results
        });
        for h in &results {
            check(h)?;
        }
    }
}
