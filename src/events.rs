//! Notifications from the engine to its host.
//!
//! Two fire-and-forget traits, both with no-op defaults so hosts only
//! implement what they care about:
//!
//! - [`Effects`]: presentation cues (sounds, particles) for swaps, landings,
//!   resolutions and powerups
//! - [`GameEvents`]: game-state changes (score, hint, deadlock)
//!
//! [`EventLog`] implements both by recording an [`Event`] list; it is used by
//! the harness and the tests.

use std::cell::RefCell;
use std::rc::Rc;

use serde::Serialize;

use crate::core::Position;
use crate::tokens::{Kind, TokenId};

/// Presentation cues.
pub trait Effects {
    /// Two tokens started swapping.
    fn on_swap(&mut self, _a: TokenId, _b: TokenId) {}

    /// A token finished a collapse or refill drop.
    fn on_land(&mut self, _token: TokenId) {}

    /// A match of `size` tokens resolved.
    fn on_resolve(&mut self, _size: usize) {}

    /// A token became a powerup.
    fn on_promote(&mut self, _token: TokenId, _kind: Kind) {}

    /// A powerup fired.
    fn on_powerup_triggered(&mut self, _token: TokenId, _kind: Kind) {}
}

/// Game-state notifications.
pub trait GameEvents {
    /// The grid is stable and no legal move exists.
    fn on_deadlock(&mut self) {}

    /// The score total changed.
    fn on_score_changed(&mut self, _total: u64) {}

    /// A token with a legal move was picked as the hint.
    fn on_hint(&mut self, _token: TokenId, _position: Position) {}
}

/// Ignores everything.
#[derive(Clone, Copy, Debug, Default)]
pub struct Silent;

impl Effects for Silent {}
impl GameEvents for Silent {}

/// One recorded notification.
#[derive(Clone, Debug, PartialEq, Eq, Serialize)]
pub enum Event {
    Swapped(TokenId, TokenId),
    Landed(TokenId),
    Resolved { size: usize },
    Promoted(TokenId, Kind),
    PowerupTriggered(TokenId, Kind),
    Deadlock,
    ScoreChanged(u64),
    Hint(TokenId, Position),
}

/// Shared recorder for both traits.
///
/// Clones share the same list, so one clone can be given to the engine as
/// `Effects`, another as `GameEvents`, and a third kept for inspection.
#[derive(Clone, Debug, Default)]
pub struct EventLog(Rc<RefCell<Vec<Event>>>);

impl EventLog {
    pub fn new() -> Self {
        Self::default()
    }

    /// Copy of everything recorded so far.
    #[must_use]
    pub fn events(&self) -> Vec<Event> {
        self.0.borrow().clone()
    }

    /// Remove and return everything recorded so far.
    pub fn drain(&self) -> Vec<Event> {
        std::mem::take(&mut *self.0.borrow_mut())
    }

    /// Number of recorded events matching a predicate.
    #[must_use]
    pub fn count(&self, predicate: impl Fn(&Event) -> bool) -> usize {
        self.0.borrow().iter().filter(|e| predicate(e)).count()
    }

    fn push(&self, event: Event) {
        self.0.borrow_mut().push(event);
    }
}

impl Effects for EventLog {
    fn on_swap(&mut self, a: TokenId, b: TokenId) {
        self.push(Event::Swapped(a, b));
    }

    fn on_land(&mut self, token: TokenId) {
        self.push(Event::Landed(token));
    }

    fn on_resolve(&mut self, size: usize) {
        self.push(Event::Resolved { size });
    }

    fn on_promote(&mut self, token: TokenId, kind: Kind) {
        self.push(Event::Promoted(token, kind));
    }

    fn on_powerup_triggered(&mut self, token: TokenId, kind: Kind) {
        self.push(Event::PowerupTriggered(token, kind));
    }
}

impl GameEvents for EventLog {
    fn on_deadlock(&mut self) {
        self.push(Event::Deadlock);
    }

    fn on_score_changed(&mut self, total: u64) {
        self.push(Event::ScoreChanged(total));
    }

    fn on_hint(&mut self, token: TokenId, position: Position) {
        self.push(Event::Hint(token, position));
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_clones_share_the_log() {
        let log = EventLog::new();
        let mut effects = log.clone();
        let mut events = log.clone();

        effects.on_resolve(3);
        events.on_score_changed(9);

        assert_eq!(log.events(), vec![Event::Resolved { size: 3 }, Event::ScoreChanged(9)]);
        assert_eq!(log.count(|e| matches!(e, Event::ScoreChanged(_))), 1);
        assert_eq!(log.drain().len(), 2);
        assert!(log.events().is_empty());
    }

    #[test]
    fn test_silent_accepts_everything() {
        let mut silent = Silent;
        silent.on_swap(TokenId(0), TokenId(1));
        silent.on_deadlock();
    }
}
