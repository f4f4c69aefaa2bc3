//! Bookkeeping for motions in flight.

use rustc_hash::FxHashMap;

use crate::motion::Completion;
use crate::tokens::TokenId;

/// What happens to a token when its motion ends.
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub(crate) enum Landing {
    /// Swap finished: the token becomes idle in its new slot.
    Settle,
    /// Collapse or refill drop finished: idle, plus a landing cue.
    Drop,
    /// Resolution finished: the token goes back to the pool.
    Release,
}

/// At most one motion per token.
#[derive(Debug, Default)]
pub(crate) struct InFlight {
    motions: FxHashMap<TokenId, (Completion, Landing)>,
}

impl InFlight {
    /// Track a new motion, aborting any motion the token already had.
    pub(crate) fn launch(&mut self, id: TokenId, completion: Completion, landing: Landing) {
        if let Some((previous, _)) = self.motions.insert(id, (completion, landing)) {
            previous.abort();
        }
    }

    pub(crate) fn take(&mut self, id: TokenId) -> Option<(Completion, Landing)> {
        self.motions.remove(&id)
    }

    /// Remove and return every motion that has already completed, by id.
    pub(crate) fn finished(&mut self) -> Vec<(TokenId, Landing)> {
        let mut done: Vec<TokenId> = self
            .motions
            .iter()
            .filter(|(_, (completion, _))| completion.is_finished())
            .map(|(id, _)| *id)
            .collect();
        done.sort_unstable();

        done.into_iter()
            .filter_map(|id| self.motions.remove(&id).map(|(_, landing)| (id, landing)))
            .collect()
    }

    /// Remove and return every motion, by id.
    pub(crate) fn drain(&mut self) -> Vec<(TokenId, Completion, Landing)> {
        let mut all: Vec<_> = self
            .motions
            .drain()
            .map(|(id, (completion, landing))| (id, completion, landing))
            .collect();
        all.sort_unstable_by_key(|(id, _, _)| *id);
        all
    }

    pub(crate) fn len(&self) -> usize {
        self.motions.len()
    }

    pub(crate) fn is_empty(&self) -> bool {
        self.motions.is_empty()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::time::Duration;

    #[test]
    fn test_finished_is_sorted_and_removed() {
        let mut flight = InFlight::default();
        flight.launch(TokenId(5), Completion::ready(), Landing::Drop);
        flight.launch(TokenId(2), Completion::ready(), Landing::Release);

        assert_eq!(
            flight.finished(),
            vec![(TokenId(2), Landing::Release), (TokenId(5), Landing::Drop)]
        );
        assert!(flight.is_empty());
    }

    #[tokio::test(start_paused = true)]
    async fn test_relaunch_aborts_previous() {
        let mut flight = InFlight::default();
        let slow = Completion::spawn(async {
            tokio::time::sleep(Duration::from_secs(60)).await;
        });
        flight.launch(TokenId(1), slow, Landing::Settle);
        flight.launch(TokenId(1), Completion::ready(), Landing::Drop);

        assert_eq!(flight.len(), 1);
        let (completion, landing) = flight.take(TokenId(1)).unwrap();
        assert_eq!(landing, Landing::Drop);
        assert!(completion.is_finished());
    }

    #[tokio::test(start_paused = true)]
    async fn test_pending_motions_are_not_finished() {
        let mut flight = InFlight::default();
        flight.launch(
            TokenId(0),
            Completion::spawn(async {
                tokio::time::sleep(Duration::from_secs(1)).await;
            }),
            Landing::Drop,
        );
        assert!(flight.finished().is_empty());

        let drained = flight.drain();
        assert_eq!(drained.len(), 1);
        for (_, completion, _) in drained {
            completion.wait().await;
        }
    }
}
