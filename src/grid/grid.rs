//! Fixed-size 2D slot array.
//!
//! Uses a flat row-major `Vec` for cache locality. Every operation is O(1)
//! and bounds-checked; the grid knows nothing about match rules or about
//! what the stored items are.

use crate::core::{Dimensions, GridError, Position};

/// Dense grid of optional items.
#[derive(Clone, Debug, PartialEq, Eq)]
pub struct Grid<T> {
    dimensions: Dimensions,
    slots: Vec<Option<T>>,
}

impl<T: Copy> Grid<T> {
    /// Create an empty grid.
    pub fn new(dimensions: Dimensions) -> Self {
        Self {
            dimensions,
            slots: vec![None; dimensions.area()],
        }
    }

    #[inline]
    fn index(&self, position: Position) -> Result<usize, GridError> {
        self.dimensions.index(position).ok_or(GridError::OutOfBounds(position))
    }

    #[must_use]
    pub fn dimensions(&self) -> Dimensions {
        self.dimensions
    }

    /// True iff the position is inside the grid.
    #[must_use]
    pub fn check_bounds(&self, position: Position) -> bool {
        self.dimensions.contains(position)
    }

    /// True iff the position is inside the grid and its slot is empty.
    #[must_use]
    pub fn is_empty(&self, position: Position) -> bool {
        matches!(self.get(position), Ok(None))
    }

    /// Slot contents.
    pub fn get(&self, position: Position) -> Result<Option<T>, GridError> {
        Ok(self.slots[self.index(position)?])
    }

    /// Slot contents, treating out-of-bounds as empty.
    #[must_use]
    pub fn item_at(&self, position: Position) -> Option<T> {
        self.get(position).ok().flatten()
    }

    /// Put an item into an empty slot.
    pub fn put(&mut self, position: Position, item: T) -> Result<(), GridError> {
        let idx = self.index(position)?;
        if self.slots[idx].is_some() {
            return Err(GridError::SlotOccupied(position));
        }
        self.slots[idx] = Some(item);
        Ok(())
    }

    /// Take the item out of an occupied slot.
    pub fn remove(&mut self, position: Position) -> Result<T, GridError> {
        let idx = self.index(position)?;
        self.slots[idx].take().ok_or(GridError::SlotEmpty(position))
    }

    /// Exchange the contents of two slots (either may be empty).
    pub fn swap(&mut self, a: Position, b: Position) -> Result<(), GridError> {
        let ia = self.index(a)?;
        let ib = self.index(b)?;
        self.slots.swap(ia, ib);
        Ok(())
    }

    /// Move the item at `src` into the empty slot `dst`.
    pub fn move_item(&mut self, src: Position, dst: Position) -> Result<T, GridError> {
        let is = self.index(src)?;
        let id = self.index(dst)?;
        if self.slots[id].is_some() {
            return Err(GridError::SlotOccupied(dst));
        }
        let item = self.slots[is].take().ok_or(GridError::SlotEmpty(src))?;
        self.slots[id] = Some(item);
        Ok(item)
    }

    /// Empty every slot.
    pub fn clear(&mut self) {
        self.slots.iter_mut().for_each(|slot| *slot = None);
    }

    /// Occupied slots, row by row from the bottom-left.
    pub fn occupied(&self) -> impl Iterator<Item = (Position, T)> + '_ {
        self.dimensions
            .positions()
            .zip(self.slots.iter())
            .filter_map(|(position, slot)| slot.map(|item| (position, item)))
    }

    /// Number of occupied slots.
    #[must_use]
    pub fn occupied_count(&self) -> usize {
        self.slots.iter().filter(|slot| slot.is_some()).count()
    }
}
