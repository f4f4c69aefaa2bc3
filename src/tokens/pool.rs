//! Token pool.
//!
//! The pool owns every token ever created in a slab and hands them out by
//! `TokenId`. Released tokens go on a free list and are reused by the next
//! `acquire`, so a long game never allocates once the pool is warm.

use tracing::warn;

use super::token::{Kind, Token, TokenId};
use crate::core::{EngineError, EngineResult, GameRng};
use crate::matching::MatchType;

/// Slab of tokens plus the colour RNG.
#[derive(Clone, Debug)]
pub struct TokenPool {
    slots: Vec<Token>,
    live: Vec<bool>,
    free: Vec<TokenId>,
    rng: GameRng,
    type_count: u8,
}

impl TokenPool {
    /// Create an empty pool rolling colours in `0..type_count`.
    pub fn new(type_count: u8, rng: GameRng) -> Self {
        assert!(type_count > 0, "Must have at least 1 token type");

        Self {
            slots: Vec::new(),
            live: Vec::new(),
            free: Vec::new(),
            rng,
            type_count,
        }
    }

    /// Create a pool with `capacity` tokens already allocated.
    pub fn with_capacity(type_count: u8, rng: GameRng, capacity: usize) -> Self {
        let mut pool = Self::new(type_count, rng);
        pool.slots.reserve(capacity);
        pool.live.reserve(capacity);
        for i in 0..capacity as u32 {
            pool.slots.push(Token::new(TokenId(i), 0));
            pool.live.push(false);
        }
        pool.free = (0..capacity as u32).rev().map(TokenId).collect();
        pool
    }

    /// Number of colours.
    #[must_use]
    pub fn type_count(&self) -> u8 {
        self.type_count
    }

    /// Tokens currently handed out.
    #[must_use]
    pub fn live_count(&self) -> usize {
        self.live.iter().filter(|live| **live).count()
    }

    /// Tokens allocated in total (live and free).
    #[must_use]
    pub fn capacity(&self) -> usize {
        self.slots.len()
    }

    /// Hand out a plain, idle token with a uniformly random colour.
    pub fn acquire_random(&mut self) -> TokenId {
        let colour = self.rng.gen_colour(self.type_count);
        self.acquire(colour)
    }

    /// Hand out a plain, idle token with a specific colour.
    pub fn acquire(&mut self, colour: u8) -> TokenId {
        let id = match self.free.pop() {
            Some(id) => id,
            None => {
                let id = TokenId(self.slots.len() as u32);
                self.slots.push(Token::new(id, 0));
                self.live.push(false);
                id
            }
        };
        self.slots[id.index()] = Token::new(id, colour % self.type_count);
        self.live[id.index()] = true;
        id
    }

    /// Return a token to the pool.
    pub fn release(&mut self, id: TokenId) -> EngineResult<()> {
        match self.live.get_mut(id.index()) {
            Some(live) if *live => {
                *live = false;
                self.free.push(id);
                Ok(())
            }
            _ => Err(EngineError::UnknownToken(id)),
        }
    }

    /// Step the colour cyclically and return the new colour.
    pub fn reroll(&mut self, id: TokenId) -> EngineResult<u8> {
        let type_count = self.type_count;
        let token = self.get_mut(id)?;
        token.colour = (token.colour + 1) % type_count;
        Ok(token.colour)
    }

    /// Force a colour.
    pub fn set_colour(&mut self, id: TokenId, colour: u8) -> EngineResult<()> {
        let type_count = self.type_count;
        self.get_mut(id)?.colour = colour % type_count;
        Ok(())
    }

    /// Reconfigure a token as the powerup for `match_type`.
    ///
    /// Returns the powerup the token carried before, if any; the caller is
    /// responsible for firing it.
    pub fn promote(&mut self, id: TokenId, match_type: MatchType) -> EngineResult<Option<Kind>> {
        let Some(kind) = Kind::from_match_type(match_type) else {
            warn!(%id, "tried to promote a token with an invalid match type");
            return Ok(None);
        };
        let token = self.get_mut(id)?;
        let previous = token.kind;
        token.kind = kind;
        Ok(previous.is_powerup().then_some(previous))
    }

    /// Look up a live token.
    #[must_use]
    pub fn get(&self, id: TokenId) -> Option<&Token> {
        match self.live.get(id.index()) {
            Some(true) => self.slots.get(id.index()),
            _ => None,
        }
    }

    /// Look up a live token mutably.
    pub fn get_mut(&mut self, id: TokenId) -> EngineResult<&mut Token> {
        match self.live.get(id.index()) {
            Some(true) => Ok(&mut self.slots[id.index()]),
            _ => Err(EngineError::UnknownToken(id)),
        }
    }
}
