//! The cascade state machine.
//!
//! `Cascade` owns the board and drives every mutation of it:
//!
//! ```text
//! Idle → Swapping → Resolving → Collapsing → Refilling → Scanning → (Resolving | Idle)
//! ```
//!
//! All operations take `&mut self`, so at most one cascade runs against a
//! board. Motions run concurrently as tasks behind [`Completion`](crate::motion::Completion) handles; a
//! batch is launched in full and only its last motion is awaited, and
//! finished motions are reaped whenever the controller regains control.
//!
//! ## Resolution
//!
//! Resolving a match is driven by a worklist rather than recursion. A match
//! may promote its upgrade candidate to a powerup; any powerup swept up by a
//! removal fires afterwards as a new match over the grid that remains.

use std::collections::VecDeque;

use serde::Serialize;
use tracing::{debug, info, warn};

use super::flight::{InFlight, Landing};
use crate::core::{Dimensions, EngineConfig, EngineResult, GameRng, GridError, Position};
use crate::events::{Effects, GameEvents, Silent};
use crate::grid::Board;
use crate::matching::{Match, MatchDetector, MatchType, Move, MoveScanner};
use crate::motion::{InstantMotion, Motion, Target};
use crate::scoring::{ComboScore, Scoring};
use crate::tokens::{Kind, Token, TokenId, TokenPool};

/// Consecutive whole-board clears allowed when `clear_on_deadlock` is set.
const MAX_DEADLOCK_CLEARS: usize = 16;

/// Where the controller is in its cycle.
#[derive(Clone, Copy, Debug, Default, PartialEq, Eq, Serialize)]
pub enum Phase {
    #[default]
    Idle,
    Swapping,
    Resolving,
    Collapsing,
    Refilling,
    Scanning,
}

/// Why a swap request was refused. Nothing changes when a swap is refused.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Serialize)]
pub enum SwapRejection {
    /// Both positions name the same slot.
    SameToken,
    /// No token to swap at this position.
    EmptySlot(Position),
    /// The token at this position is still moving.
    NotIdle(Position),
    /// The positions do not share an edge.
    NotAdjacent,
    /// The controller is mid-cascade.
    Busy(Phase),
}

/// Result of a swap request.
#[derive(Clone, Debug, PartialEq, Eq, Serialize)]
pub enum SwapOutcome {
    Rejected(SwapRejection),
    /// Nothing matched and the tokens were swapped back. `cascaded` is set
    /// when swapping back created a match elsewhere.
    Reverted { cascaded: bool },
    /// The swap matched; the board is stable again.
    Matched(CascadeReport),
}

/// Counters for one swap (or stabilize) from request to stable board.
#[derive(Clone, Debug, Default, PartialEq, Eq, Serialize)]
pub struct CascadeReport {
    pub matches_resolved: usize,
    pub tokens_removed: usize,
    pub powerups_formed: usize,
    pub powerups_triggered: usize,
    /// Collapse → refill → scan cycles.
    pub chain_passes: usize,
    /// Points awarded, multipliers included.
    pub points: u64,
    /// Refill placements that could not avoid a match.
    pub reroll_exhausted: usize,
}

impl CascadeReport {
    fn absorb(&mut self, other: &CascadeReport) {
        self.matches_resolved += other.matches_resolved;
        self.tokens_removed += other.tokens_removed;
        self.powerups_formed += other.powerups_formed;
        self.powerups_triggered += other.powerups_triggered;
        self.chain_passes += other.chain_passes;
        self.points += other.points;
        self.reroll_exhausted += other.reroll_exhausted;
    }
}

/// Result of filling empty slots.
#[derive(Clone, Debug, Default, PartialEq, Eq, Serialize)]
pub struct PopulateReport {
    /// Tokens placed.
    pub placed: usize,
    /// Colour steps taken to avoid matches.
    pub rerolled: usize,
    /// Slots where every colour would have started a match.
    pub exhausted: Vec<Position>,
}

/// Everything the controller talks to, injected at construction.
pub struct Collaborators {
    pub motion: Box<dyn Motion>,
    /// `None` uses a `ComboScore` built from the engine config.
    pub scoring: Option<Box<dyn Scoring>>,
    pub effects: Box<dyn Effects>,
    pub events: Box<dyn GameEvents>,
}

impl Default for Collaborators {
    fn default() -> Self {
        Self {
            motion: Box::new(InstantMotion),
            scoring: None,
            effects: Box::new(Silent),
            events: Box::new(Silent),
        }
    }
}

impl Collaborators {
    #[must_use]
    pub fn with_motion(mut self, motion: impl Motion + 'static) -> Self {
        self.motion = Box::new(motion);
        self
    }

    #[must_use]
    pub fn with_scoring(mut self, scoring: impl Scoring + 'static) -> Self {
        self.scoring = Some(Box::new(scoring));
        self
    }

    #[must_use]
    pub fn with_effects(mut self, effects: impl Effects + 'static) -> Self {
        self.effects = Box::new(effects);
        self
    }

    #[must_use]
    pub fn with_events(mut self, events: impl GameEvents + 'static) -> Self {
        self.events = Box::new(events);
        self
    }
}

/// One unit of resolution work.
enum Step {
    /// Promote (if eligible) and then remove.
    Resolve(Match, MatchType),
    /// Remove every token still on the grid and score the match.
    Remove {
        matched: Match,
        used: MatchType,
        target: Target,
    },
    /// A powerup goes off at `origin`.
    Fire {
        token: TokenId,
        kind: Kind,
        origin: Position,
        exclude: Option<TokenId>,
    },
}

/// Drives swaps, resolution and cascades on a board.
pub struct Cascade {
    config: EngineConfig,
    board: Board,
    motion: Box<dyn Motion>,
    scoring: Box<dyn Scoring>,
    effects: Box<dyn Effects>,
    events: Box<dyn GameEvents>,
    in_flight: InFlight,
    phase: Phase,
    hint_rng: GameRng,
    hint: Option<TokenId>,
    report: CascadeReport,
}

impl Cascade {
    /// Create a controller with an empty board.
    pub fn new(config: EngineConfig, collaborators: Collaborators) -> EngineResult<Self> {
        config.validate()?;
        let rng = GameRng::new(config.seed);
        let dimensions = config.dimensions();
        let pool = TokenPool::with_capacity(
            config.type_count,
            rng.for_context("tokens"),
            dimensions.area() * 2,
        );
        let board = Board::new(dimensions, pool);
        Ok(Self::assemble(config, board, rng, collaborators))
    }

    /// Create a controller around an existing board (fixtures, replays).
    ///
    /// Board dimensions and colour count override the config.
    pub fn from_board(
        mut config: EngineConfig,
        board: Board,
        collaborators: Collaborators,
    ) -> EngineResult<Self> {
        let dimensions = board.dimensions();
        config.width = dimensions.width;
        config.height = dimensions.height;
        config.type_count = board.pool().type_count();
        config.validate()?;
        board.check_consistency()?;
        let rng = GameRng::new(config.seed);
        Ok(Self::assemble(config, board, rng, collaborators))
    }

    fn assemble(config: EngineConfig, board: Board, rng: GameRng, collaborators: Collaborators) -> Self {
        let scoring = collaborators
            .scoring
            .unwrap_or_else(|| Box::new(ComboScore::new(config.combo.clone())));
        Self {
            hint_rng: rng.for_context("hints"),
            config,
            board,
            motion: collaborators.motion,
            scoring,
            effects: collaborators.effects,
            events: collaborators.events,
            in_flight: InFlight::default(),
            phase: Phase::Idle,
            hint: None,
            report: CascadeReport::default(),
        }
    }

    // === Accessors ===

    #[must_use]
    pub fn config(&self) -> &EngineConfig {
        &self.config
    }

    #[must_use]
    pub fn dimensions(&self) -> Dimensions {
        self.board.dimensions()
    }

    #[must_use]
    pub fn board(&self) -> &Board {
        &self.board
    }

    /// Direct board access for hosts that edit the grid between moves.
    pub fn board_mut(&mut self) -> &mut Board {
        &mut self.board
    }

    #[must_use]
    pub fn phase(&self) -> Phase {
        self.phase
    }

    /// Current score total.
    #[must_use]
    pub fn score(&self) -> u64 {
        self.scoring.total()
    }

    #[must_use]
    pub fn scoring(&self) -> &dyn Scoring {
        &*self.scoring
    }

    /// The token picked as a hint when the board last became stable.
    #[must_use]
    pub fn hint(&self) -> Option<TokenId> {
        self.hint
    }

    /// Counters of the last swap or stabilize.
    #[must_use]
    pub fn last_report(&self) -> &CascadeReport {
        &self.report
    }

    /// Motions not yet reaped.
    #[must_use]
    pub fn motions_in_flight(&self) -> usize {
        self.in_flight.len()
    }

    /// Every legal move on the current board.
    #[must_use]
    pub fn available_moves(&self) -> Vec<Move> {
        MoveScanner::new(&self.board).moves()
    }

    // === Setup ===

    /// Fill every empty slot, then recompute moves.
    ///
    /// Unless `allow_matches` is set, colours are stepped until a placement
    /// does not start a match.
    pub async fn populate(&mut self, allow_matches: bool) -> EngineResult<PopulateReport> {
        let result = self.populate_inner(allow_matches).await;
        self.recover(result)
    }

    async fn populate_inner(&mut self, allow_matches: bool) -> EngineResult<PopulateReport> {
        self.reap()?;
        let report = self.refill(allow_matches).await?;
        self.phase = Phase::Idle;
        self.settle().await?;
        self.refresh_moves();
        Ok(report)
    }

    /// Resolve any matches already on the board and cascade until stable.
    pub async fn stabilize(&mut self) -> EngineResult<CascadeReport> {
        let result = self.stabilize_inner().await;
        self.recover(result)
    }

    async fn stabilize_inner(&mut self) -> EngineResult<CascadeReport> {
        let mut report = CascadeReport::default();
        if self.scan(&mut report).await? {
            self.cascade(&mut report).await?;
        } else {
            self.phase = Phase::Idle;
            self.finish(&mut report).await?;
        }
        self.report = report.clone();
        Ok(report)
    }

    /// Clear the board, drop all motions and reset the score.
    pub fn reset(&mut self) -> EngineResult<()> {
        for (id, completion, landing) in self.in_flight.drain() {
            completion.abort();
            if landing == Landing::Release {
                self.board.pool_mut().release(id)?;
            }
        }
        let cleared = self.board.clear()?;
        self.scoring.reset();
        self.hint = None;
        self.phase = Phase::Idle;
        self.report = CascadeReport::default();
        self.events.on_score_changed(0);
        debug!(cleared, "board reset");
        Ok(())
    }

    /// Force the colour of the token at `position`.
    pub fn set_colour(&mut self, position: Position, colour: u8) -> EngineResult<()> {
        let id = self
            .board
            .grid()
            .get(position)?
            .ok_or(GridError::SlotEmpty(position))?;
        self.board.pool_mut().set_colour(id, colour)?;
        self.refresh_moves();
        Ok(())
    }

    /// Wait for every motion in flight and apply its landing.
    pub async fn settle(&mut self) -> EngineResult<()> {
        if self.in_flight.is_empty() {
            return Ok(());
        }
        for (id, completion, landing) in self.in_flight.drain() {
            completion.wait().await;
            self.land(id, landing)?;
        }
        Ok(())
    }

    // === Swapping ===

    /// Attempt to swap the tokens at `a` and `b`.
    ///
    /// Out-of-bounds positions are an error; every other invalid request is
    /// refused with [`SwapOutcome::Rejected`] and leaves the board untouched.
    pub async fn try_swap(&mut self, a: Position, b: Position) -> EngineResult<SwapOutcome> {
        let dimensions = self.dimensions();
        for position in [a, b] {
            if !dimensions.contains(position) {
                return Err(GridError::OutOfBounds(position).into());
            }
        }

        self.reap()?;
        if let Err(rejection) = self.check_swap(a, b) {
            debug!(%a, %b, ?rejection, "swap rejected");
            return Ok(SwapOutcome::Rejected(rejection));
        }

        let result = self.swap_and_resolve(a, b).await;
        self.recover(result)
    }

    async fn swap_and_resolve(&mut self, a: Position, b: Position) -> EngineResult<SwapOutcome> {
        let mut report = CascadeReport::default();
        let (first, second) = self.swap_tokens(a, b).await?;
        let (first_gem, second_gem) = (self.is_gem(first), self.is_gem(second));

        let outcome = if first_gem && second_gem {
            self.fire_gem(first, None, &mut report);
            let everything = self.everything();
            self.resolve_into(everything, MatchType::Match5, &mut report).await?;
            self.cascade(&mut report).await?;
            SwapOutcome::Matched(report.clone())
        } else if first_gem || second_gem {
            let (gem, other) = if first_gem { (first, second) } else { (second, first) };
            let colour = self.board.token(other).and_then(Token::colour);
            self.fire_gem(gem, colour, &mut report);
            let matched = self.everything_by_colour(gem, colour);
            self.resolve_into(matched, MatchType::Match5, &mut report).await?;
            self.cascade(&mut report).await?;
            SwapOutcome::Matched(report.clone())
        } else {
            let detector = MatchDetector::new(&self.board);
            let found: Vec<Match> = [first, second]
                .into_iter()
                .filter_map(|id| detector.find_match(id))
                .collect();

            if found.is_empty() {
                debug!(%a, %b, "no match, swapping back");
                self.swap_tokens(a, b).await?;
                let cascaded = self.scan(&mut report).await?;
                if cascaded {
                    self.cascade(&mut report).await?;
                } else {
                    self.phase = Phase::Idle;
                }
                SwapOutcome::Reverted { cascaded }
            } else {
                for matched in found {
                    self.resolve_into(matched, MatchType::Invalid, &mut report).await?;
                }
                self.cascade(&mut report).await?;
                SwapOutcome::Matched(report.clone())
            }
        };

        self.report = report;
        Ok(outcome)
    }

    fn check_swap(&self, a: Position, b: Position) -> Result<(), SwapRejection> {
        if self.phase != Phase::Idle {
            return Err(SwapRejection::Busy(self.phase));
        }
        if a == b {
            return Err(SwapRejection::SameToken);
        }
        for position in [a, b] {
            match self.board.token_at(position) {
                None => return Err(SwapRejection::EmptySlot(position)),
                Some(token) if !token.is_idle() => return Err(SwapRejection::NotIdle(position)),
                Some(_) => {}
            }
        }
        if self.config.require_adjacent && !a.is_adjacent(b) {
            return Err(SwapRejection::NotAdjacent);
        }
        Ok(())
    }

    /// Exchange two tokens and wait for both motions. Returns the ids that
    /// started at `a` and `b`.
    async fn swap_tokens(&mut self, a: Position, b: Position) -> EngineResult<(TokenId, TokenId)> {
        self.phase = Phase::Swapping;
        let first = self.board.grid().get(a)?.ok_or(GridError::SlotEmpty(a))?;
        let second = self.board.grid().get(b)?.ok_or(GridError::SlotEmpty(b))?;

        self.board.swap(a, b)?;
        self.effects.on_swap(first, second);
        self.launch_move(first, b, Landing::Settle)?;
        self.launch_move(second, a, Landing::Settle)?;

        self.await_motion(second).await?;
        self.await_motion(first).await?;
        Ok((first, second))
    }

    fn is_gem(&self, id: TokenId) -> bool {
        self.board.token(id).is_some_and(Token::is_gem)
    }

    fn fire_gem(&mut self, gem: TokenId, colour: Option<u8>, report: &mut CascadeReport) {
        report.powerups_triggered += 1;
        self.effects.on_powerup_triggered(gem, Kind::Gem);
        debug!(%gem, ?colour, "gem swapped");
    }

    // === Resolution ===

    /// Resolve one match, including any powerups it forms or sweeps up.
    ///
    /// `used` is the powerup effect that produced the match, or
    /// `MatchType::Invalid` for an ordinary match. Does not cascade.
    pub async fn resolve(&mut self, matched: Match, used: MatchType) -> EngineResult<CascadeReport> {
        let mut report = CascadeReport::default();
        let result = self.resolve_into(matched, used, &mut report).await;
        self.recover(result)?;
        self.phase = Phase::Idle;
        Ok(report)
    }

    /// Resolve every idle token on the board as a gem effect, then cascade.
    pub async fn match_everything(&mut self) -> EngineResult<CascadeReport> {
        let mut report = CascadeReport::default();
        let everything = self.everything();
        let result = match self.resolve_into(everything, MatchType::Match5, &mut report).await {
            Ok(()) => self.cascade(&mut report).await,
            Err(err) => Err(err),
        };
        self.recover(result)?;
        self.report = report.clone();
        Ok(report)
    }

    /// Return to `Idle` when an operation fails.
    fn recover<T>(&mut self, result: EngineResult<T>) -> EngineResult<T> {
        if let Err(err) = &result {
            warn!(phase = ?self.phase, %err, "cascade aborted");
            self.phase = Phase::Idle;
        }
        result
    }

    async fn resolve_into(
        &mut self,
        matched: Match,
        used: MatchType,
        report: &mut CascadeReport,
    ) -> EngineResult<()> {
        self.phase = Phase::Resolving;
        let mut steps = VecDeque::from([Step::Resolve(matched, used)]);

        while let Some(step) = steps.pop_front() {
            match step {
                Step::Resolve(mut matched, used) => {
                    let mut target = Target::CollectionPoint;
                    // The seed may already have been swept by an earlier step.
                    let candidate = matched
                        .upgrade_candidate()
                        .filter(|id| self.board.is_placed(*id))
                        .or_else(|| {
                            matched
                                .tokens()
                                .iter()
                                .rev()
                                .copied()
                                .find(|id| self.board.is_placed(*id))
                        });

                    if let (MatchType::Invalid, true, Some(candidate)) = (used, matched.len() > 3, candidate) {
                        let match_type = matched.match_type();
                        let previous = self.board.pool_mut().promote(candidate, match_type)?;
                        if let Some(kind) = Kind::from_match_type(match_type) {
                            report.powerups_formed += 1;
                            self.effects.on_promote(candidate, kind);
                            debug!(token = %candidate, ?kind, "powerup formed");
                        }
                        matched.remove(candidate);
                        target = Target::Token(candidate);

                        if let Some(kind) = previous {
                            // The old powerup goes off before this match is removed.
                            let origin = self.board.token(candidate).map_or_else(Position::default, Token::position);
                            steps.push_front(Step::Remove { matched, used, target });
                            steps.push_front(Step::Fire {
                                token: candidate,
                                kind,
                                origin,
                                exclude: Some(candidate),
                            });
                            continue;
                        }
                    }
                    steps.push_front(Step::Remove { matched, used, target });
                }
                Step::Remove { matched, used, target } => {
                    let swept = self.remove_match(&matched, used, target, report).await?;
                    steps.extend(swept);
                }
                Step::Fire { token, kind, origin, exclude } => {
                    report.powerups_triggered += 1;
                    self.effects.on_powerup_triggered(token, kind);
                    debug!(%token, ?kind, %origin, "powerup triggered");
                    let area = self.effect_area(kind, origin, exclude);
                    steps.push_front(Step::Resolve(area, kind.effect()));
                }
            }
        }
        Ok(())
    }

    /// Take every eligible token of `matched` off the grid, wait for the last
    /// one, then score. Returns the powerups that were swept up.
    async fn remove_match(
        &mut self,
        matched: &Match,
        used: MatchType,
        target: Target,
        report: &mut CascadeReport,
    ) -> EngineResult<Vec<Step>> {
        if matched.is_empty() {
            return Ok(Vec::new());
        }
        self.effects.on_resolve(matched.len());
        report.matches_resolved += 1;

        let mut swept = Vec::new();
        let mut last = None;
        for &id in matched.tokens() {
            if !self.board.is_placed(id) {
                continue;
            }
            let Some(token) = self.board.token(id) else {
                continue;
            };
            if token.is_gem() && used != MatchType::Match5 {
                continue;
            }
            let (kind, position) = (token.kind(), token.position());

            self.board.take(position)?;
            self.board.set_idle(id, false)?;
            let completion = self.motion.move_toward(id, target);
            self.in_flight.launch(id, completion, Landing::Release);
            report.tokens_removed += 1;
            last = Some(id);

            if matches!(kind, Kind::LineBonus | Kind::CrossBonus) {
                swept.push(Step::Fire {
                    token: id,
                    kind,
                    origin: position,
                    exclude: None,
                });
            }
        }
        if let Some(id) = last {
            self.await_motion(id).await?;
        }

        let base = (matched.len() as u64).pow(2);
        let awarded = self.scoring.add_score(base);
        report.points += awarded;
        self.events.on_score_changed(self.scoring.total());
        debug!(size = matched.len(), ?used, awarded, "match resolved");
        Ok(swept)
    }

    /// Idle tokens a powerup clears.
    fn effect_area(&self, kind: Kind, origin: Position, exclude: Option<TokenId>) -> Match {
        let dims = self.dimensions();
        let positions: Vec<Position> = match kind {
            Kind::LineBonus => (-1..=1)
                .flat_map(|dy| (-1..=1).map(move |dx| origin.offset(dx, dy)))
                .collect(),
            Kind::CrossBonus => (0..dims.height as i32)
                .map(|y| Position::new(origin.x, y))
                .chain((0..dims.width as i32).map(|x| Position::new(x, origin.y)))
                .collect(),
            Kind::Plain | Kind::Gem => Vec::new(),
        };

        let mut area = Match::new();
        for position in positions {
            if let Some(token) = self.board.token_at(position) {
                if token.is_idle() && Some(token.id()) != exclude {
                    area.add(token.id());
                }
            }
        }
        area
    }

    fn everything(&self) -> Match {
        self.board
            .grid()
            .occupied()
            .filter(|(_, id)| self.board.token(*id).is_some_and(Token::is_idle))
            .map(|(_, id)| id)
            .collect()
    }

    fn everything_by_colour(&self, gem: TokenId, colour: Option<u8>) -> Match {
        let mut matched = Match::seeded(gem);
        for (_, id) in self.board.grid().occupied() {
            let Some(token) = self.board.token(id) else {
                continue;
            };
            if token.is_idle() && colour.is_some() && token.colour() == colour {
                matched.add(id);
            }
        }
        matched
    }

    // === Cascading ===

    /// Collapse → refill → scan until a scan finds nothing, then recompute moves.
    async fn cascade(&mut self, report: &mut CascadeReport) -> EngineResult<()> {
        loop {
            report.chain_passes += 1;
            self.reap()?;
            self.collapse()?;
            let filled = self.refill(true).await?;
            report.reroll_exhausted += filled.exhausted.len();
            if !self.scan(report).await? {
                break;
            }
        }
        self.phase = Phase::Idle;
        self.finish(report).await
    }

    /// Move idle tokens down into empty slots. Motions are not awaited.
    fn collapse(&mut self) -> EngineResult<()> {
        self.phase = Phase::Collapsing;
        let dims = self.dimensions();
        let (width, height) = (dims.width as i32, dims.height as i32);

        for x in 0..width {
            for y_empty in 0..height - 1 {
                let empty = Position::new(x, y_empty);
                if !self.board.grid().is_empty(empty) {
                    continue;
                }
                let source = (y_empty + 1..height)
                    .map(|y| Position::new(x, y))
                    .find(|p| self.board.token_at(*p).is_some_and(Token::is_idle));
                if let Some(source) = source {
                    let id = self.board.move_token(source, empty)?;
                    self.launch_move(id, empty, Landing::Drop)?;
                }
            }
        }
        Ok(())
    }

    /// Fill every empty slot with a fresh token and wait for the last drop.
    async fn refill(&mut self, allow_matches: bool) -> EngineResult<PopulateReport> {
        self.phase = Phase::Refilling;
        let mut report = PopulateReport::default();
        let empty: Vec<Position> = self
            .dimensions()
            .positions()
            .filter(|p| self.board.grid().is_empty(*p))
            .collect();

        let mut last = None;
        for position in empty {
            let id = self.board.pool_mut().acquire_random();
            self.board.place(id, position)?;

            if !allow_matches {
                let initial = self.board.token(id).and_then(Token::colour);
                while MatchDetector::new(&self.board).is_part_of_any_match(id) {
                    let next = self.board.pool_mut().reroll(id)?;
                    report.rerolled += 1;
                    if Some(next) == initial {
                        warn!(%position, "no colour avoids a match, accepting placement");
                        report.exhausted.push(position);
                        break;
                    }
                }
            }

            self.launch_move(id, position, Landing::Drop)?;
            report.placed += 1;
            last = Some(id);
        }

        if let Some(id) = last {
            self.await_motion(id).await?;
        }
        Ok(report)
    }

    /// Wait for all motions, then resolve every match on the board.
    /// Returns whether anything matched.
    async fn scan(&mut self, report: &mut CascadeReport) -> EngineResult<bool> {
        self.phase = Phase::Scanning;
        self.settle().await?;

        let mut matched_any = false;
        for position in self.dimensions().positions() {
            let Some(token) = self.board.token_at(position) else {
                continue;
            };
            if !token.is_idle() {
                continue;
            }
            let id = token.id();
            if let Some(matched) = MatchDetector::new(&self.board).find_match(id) {
                matched_any = true;
                self.resolve_into(matched, MatchType::Invalid, report).await?;
                self.phase = Phase::Scanning;
            }
        }
        Ok(matched_any)
    }

    /// The board is stable: recompute moves, clearing it on deadlock if
    /// configured to.
    async fn finish(&mut self, report: &mut CascadeReport) -> EngineResult<()> {
        let mut clears = 0;
        while !self.refresh_moves() && self.config.clear_on_deadlock {
            if clears == MAX_DEADLOCK_CLEARS {
                warn!(clears, "board still deadlocked after repeated clears");
                break;
            }
            clears += 1;
            info!(clears, "clearing deadlocked board");

            let mut cleared = CascadeReport::default();
            let everything = self.everything();
            self.resolve_into(everything, MatchType::Match5, &mut cleared).await?;
            loop {
                cleared.chain_passes += 1;
                self.reap()?;
                self.collapse()?;
                let filled = self.refill(true).await?;
                cleared.reroll_exhausted += filled.exhausted.len();
                if !self.scan(&mut cleared).await? {
                    break;
                }
            }
            self.phase = Phase::Idle;
            report.absorb(&cleared);
        }
        Ok(())
    }

    /// Recompute move availability and pick a hint. Returns whether any move
    /// exists; emits `on_deadlock` when none does.
    pub fn refresh_moves(&mut self) -> bool {
        let candidates = MoveScanner::new(&self.board).candidates();
        self.hint = self.hint_rng.choose(&candidates).copied();

        match self.hint {
            Some(id) => {
                let position = self.board.token(id).map_or_else(Position::default, Token::position);
                self.events.on_hint(id, position);
                true
            }
            None => {
                info!("no moves available");
                self.events.on_deadlock();
                false
            }
        }
    }

    // === Motions ===

    fn launch_move(&mut self, id: TokenId, position: Position, landing: Landing) -> EngineResult<()> {
        self.board.set_idle(id, false)?;
        let completion = self.motion.move_to(id, position);
        self.in_flight.launch(id, completion, landing);
        Ok(())
    }

    /// Wait for one token's motion, then reap whatever else has finished.
    async fn await_motion(&mut self, id: TokenId) -> EngineResult<()> {
        if let Some((completion, landing)) = self.in_flight.take(id) {
            completion.wait().await;
            self.land(id, landing)?;
        }
        self.reap()
    }

    fn reap(&mut self) -> EngineResult<()> {
        for (id, landing) in self.in_flight.finished() {
            self.land(id, landing)?;
        }
        Ok(())
    }

    fn land(&mut self, id: TokenId, landing: Landing) -> EngineResult<()> {
        match landing {
            Landing::Settle => self.board.set_idle(id, true),
            Landing::Drop => {
                self.board.set_idle(id, true)?;
                self.effects.on_land(id);
                Ok(())
            }
            Landing::Release => self.board.pool_mut().release(id),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::events::{Event, EventLog};
    use crate::motion::Completion;

    fn fixture(rows: &[&str]) -> Board {
        Board::from_rows(rows, TokenPool::new(4, GameRng::new(7))).unwrap()
    }

    fn cascade_with_log(rows: &[&str]) -> (Cascade, EventLog) {
        let log = EventLog::new();
        let collaborators = Collaborators::default()
            .with_effects(log.clone())
            .with_events(log.clone());
        let cascade = Cascade::from_board(EngineConfig::default(), fixture(rows), collaborators).unwrap();
        (cascade, log)
    }

    #[tokio::test]
    async fn test_new_board_is_empty_until_populated() {
        let mut cascade = Cascade::new(EngineConfig::new(6, 5), Collaborators::default()).unwrap();
        assert_eq!(cascade.board().grid().occupied_count(), 0);

        let report = cascade.populate(false).await.unwrap();
        assert_eq!(report.placed, 30);
        assert!(report.exhausted.is_empty());
        assert_eq!(cascade.board().grid().occupied_count(), 30);
        assert!(MatchDetector::new(cascade.board()).find_all().is_empty());
        assert_eq!(cascade.motions_in_flight(), 0);
        assert_eq!(cascade.phase(), Phase::Idle);
    }

    #[tokio::test]
    async fn test_rejections_leave_board_untouched() {
        let (mut cascade, _) = cascade_with_log(&["012.", "1201"]);
        let before = cascade.board().snapshot();

        let same = cascade.try_swap(Position::new(0, 0), Position::new(0, 0)).await.unwrap();
        assert_eq!(same, SwapOutcome::Rejected(SwapRejection::SameToken));

        let empty = cascade.try_swap(Position::new(2, 1), Position::new(3, 1)).await.unwrap();
        assert_eq!(empty, SwapOutcome::Rejected(SwapRejection::EmptySlot(Position::new(3, 1))));

        let far = cascade.try_swap(Position::new(0, 0), Position::new(2, 0)).await.unwrap();
        assert_eq!(far, SwapOutcome::Rejected(SwapRejection::NotAdjacent));

        let moving = cascade.board().id_at(Position::new(1, 0)).unwrap();
        cascade.board_mut().set_idle(moving, false).unwrap();
        let busy = cascade.try_swap(Position::new(0, 0), Position::new(1, 0)).await.unwrap();
        assert_eq!(busy, SwapOutcome::Rejected(SwapRejection::NotIdle(Position::new(1, 0))));
        cascade.board_mut().set_idle(moving, true).unwrap();

        assert_eq!(cascade.board().snapshot(), before);
    }

    #[tokio::test]
    async fn test_out_of_bounds_is_an_error() {
        let (mut cascade, _) = cascade_with_log(&["012", "120"]);
        let result = cascade.try_swap(Position::new(0, 0), Position::new(-1, 0)).await;
        assert!(result.is_err());
    }

    #[tokio::test]
    async fn test_resolve_scores_square_of_size() {
        let (mut cascade, log) = cascade_with_log(&["2313", "1110"]);
        let seed = cascade.board().id_at(Position::new(0, 0)).unwrap();
        let matched = MatchDetector::new(cascade.board()).find_match(seed).unwrap();

        let report = cascade.resolve(matched, MatchType::Invalid).await.unwrap();
        assert_eq!(report.tokens_removed, 3);
        assert_eq!(report.points, 9);
        assert_eq!(cascade.score(), 9);
        assert_eq!(cascade.board().grid().occupied_count(), 5);
        assert_eq!(log.count(|e| *e == Event::Resolved { size: 3 }), 1);
        assert_eq!(cascade.motions_in_flight(), 0);
    }

    #[tokio::test]
    async fn test_match_of_four_forms_line_bonus() {
        let (mut cascade, log) = cascade_with_log(&["2323", "1111"]);
        let seed = cascade.board().id_at(Position::new(1, 0)).unwrap();
        let matched = MatchDetector::new(cascade.board()).find_match(seed).unwrap();

        let report = cascade.resolve(matched, MatchType::Invalid).await.unwrap();
        assert_eq!(report.powerups_formed, 1);
        assert_eq!(report.tokens_removed, 3);
        // Scored on the three tokens that left the grid.
        assert_eq!(report.points, 9);

        let survivor = cascade.board().token(seed).unwrap();
        assert_eq!(survivor.kind(), Kind::LineBonus);
        assert!(cascade.board().is_placed(seed));
        assert_eq!(log.count(|e| *e == Event::Promoted(seed, Kind::LineBonus)), 1);
    }

    #[tokio::test]
    async fn test_empty_effect_awards_nothing() {
        let (mut cascade, log) = cascade_with_log(&["0"]);
        let report = cascade.resolve(Match::new(), MatchType::Match4).await.unwrap();
        assert_eq!(report.points, 0);
        assert_eq!(report.matches_resolved, 0);
        assert!(log.events().is_empty());
    }

    #[tokio::test]
    async fn test_repromotion_fires_old_powerup_first() {
        let (mut cascade, log) = cascade_with_log(&[
            "3 2 3 2",
            "0 0 0 0",
            "2 3 2 3",
        ]);
        let seed = cascade.board().id_at(Position::new(0, 1)).unwrap();
        cascade.board_mut().pool_mut().promote(seed, MatchType::Match4).unwrap();
        let matched = MatchDetector::new(cascade.board()).find_match(seed).unwrap();
        assert_eq!(matched.len(), 4);

        let report = cascade.resolve(matched, MatchType::Invalid).await.unwrap();
        assert!(cascade.board().is_placed(seed));
        assert_eq!(cascade.board().token(seed).unwrap().kind(), Kind::LineBonus);
        assert_eq!(report.powerups_triggered, 1);

        let events = log.events();
        let fired = events
            .iter()
            .position(|e| *e == Event::PowerupTriggered(seed, Kind::LineBonus))
            .unwrap();
        let first_resolve = events.iter().position(|e| matches!(e, Event::Resolved { .. })).unwrap();
        assert!(fired < first_resolve);
    }

    #[tokio::test]
    async fn test_promotion_falls_back_when_seed_is_gone() {
        let (mut cascade, log) = cascade_with_log(&["2323", "1111"]);
        let seed = cascade.board().id_at(Position::new(1, 0)).unwrap();
        let matched = MatchDetector::new(cascade.board()).find_match(seed).unwrap();
        assert_eq!(matched.upgrade_candidate(), Some(seed));
        let expected = *matched.tokens().iter().rev().find(|id| **id != seed).unwrap();

        cascade.board_mut().take(Position::new(1, 0)).unwrap();
        let report = cascade.resolve(matched, MatchType::Invalid).await.unwrap();

        assert_eq!(report.powerups_formed, 1);
        assert_eq!(report.tokens_removed, 2);
        assert!(cascade.board().is_placed(expected));
        assert_eq!(cascade.board().token(expected).unwrap().kind(), Kind::LineBonus);
        assert_eq!(log.count(|e| *e == Event::Promoted(expected, Kind::LineBonus)), 1);
    }

    // =========================================================================
    // Collapse
    // =========================================================================

    /// Test that collapse leaves a moving token in place and drops the
    /// nearest idle token above it into the gap.
    #[tokio::test]
    async fn test_collapse_skips_non_idle_tokens() {
        let (mut cascade, _) = cascade_with_log(&["0", "1", ".", "2"]);
        let top = cascade.board().id_at(Position::new(0, 3)).unwrap();
        let moving = cascade.board().id_at(Position::new(0, 2)).unwrap();
        let bottom = cascade.board().id_at(Position::new(0, 0)).unwrap();
        cascade.board_mut().set_idle(moving, false).unwrap();

        cascade.collapse().unwrap();

        assert_eq!(cascade.board().id_at(Position::new(0, 0)), Some(bottom));
        assert_eq!(cascade.board().id_at(Position::new(0, 1)), Some(top));
        assert_eq!(cascade.board().id_at(Position::new(0, 2)), Some(moving));
        assert!(cascade.board().grid().is_empty(Position::new(0, 3)));
        assert!(!cascade.board().token(moving).unwrap().is_idle());

        cascade.settle().await.unwrap();
        assert!(cascade.board().token(top).unwrap().is_idle());
        assert_eq!(cascade.board().token(top).unwrap().position(), Position::new(0, 1));
    }

    // =========================================================================
    // Failure Recovery
    // =========================================================================

    /// Test that a failed stabilize does not leave the controller busy.
    #[tokio::test]
    async fn test_failed_cascade_returns_to_idle() {
        let (mut cascade, _) = cascade_with_log(&["012", "120"]);
        cascade
            .in_flight
            .launch(TokenId(999), Completion::ready(), Landing::Settle);

        assert!(cascade.stabilize().await.is_err());
        assert_eq!(cascade.phase(), Phase::Idle);

        let outcome = cascade.try_swap(Position::new(0, 0), Position::new(1, 0)).await.unwrap();
        assert!(!matches!(outcome, SwapOutcome::Rejected(SwapRejection::Busy(_))));
    }

    #[tokio::test]
    async fn test_reset_clears_board_and_score() {
        let (mut cascade, _) = cascade_with_log(&["2313", "1110"]);
        let seed = cascade.board().id_at(Position::new(0, 0)).unwrap();
        let matched = MatchDetector::new(cascade.board()).find_match(seed).unwrap();
        cascade.resolve(matched, MatchType::Invalid).await.unwrap();

        cascade.reset().unwrap();
        assert_eq!(cascade.board().grid().occupied_count(), 0);
        assert_eq!(cascade.board().pool().live_count(), 0);
        assert_eq!(cascade.score(), 0);
        assert_eq!(cascade.hint(), None);
    }

    #[tokio::test]
    async fn test_set_colour() {
        let (mut cascade, _) = cascade_with_log(&["012", "120"]);
        cascade.set_colour(Position::new(2, 0), 3).unwrap();
        assert_eq!(cascade.board().token_at(Position::new(2, 0)).unwrap().colour(), Some(3));
        assert!(cascade.set_colour(Position::new(5, 0), 1).is_err());
    }
}
