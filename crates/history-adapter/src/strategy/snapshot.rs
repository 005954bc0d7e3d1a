use std::fmt;

use anyhow::Result;

use super::{Direction, HistoryStrategy};
use crate::outcome::Outcome;

/// Stores the whole prior value in each slot.
///
/// Entries are complete values of the same type as `present`, so undo and
/// redo are a swap. Cheap for small values; every entry costs one clone.
#[derive(Debug, Clone, Copy, Default)]
pub struct SnapshotStrategy;

impl<D: Clone + fmt::Debug> HistoryStrategy<D> for SnapshotStrategy {
    type Entry = D;

    fn record<F>(&self, present: &mut D, recipe: F) -> Result<D>
    where
        F: FnOnce(&mut D) -> Result<Outcome<D>>,
    {
        // Detached copy taken before the recipe touches `present`.
        let before = present.clone();
        recipe(present)?.apply_to(present);
        Ok(before)
    }

    fn apply_entry(&self, present: &mut D, entry: &mut D, _direction: Direction) -> Result<()> {
        std::mem::swap(present, entry);
        Ok(())
    }
}
