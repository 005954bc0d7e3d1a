use anyhow::Result;

use super::{Direction, HistoryStrategy};
use crate::outcome::Outcome;
use crate::patch::{JsonPatcher, Patcher};

/// A reversible change: `forward` redoes it, `backward` undoes it.
#[derive(Debug, Clone, PartialEq)]
pub struct DeltaEntry<T> {
    pub forward: T,
    pub backward: T,
}

/// Stores forward/backward deltas in each slot.
///
/// Entries are direction-agnostic: replaying one leaves it as it was so it
/// can move to the opposite stack unchanged.
#[derive(Debug, Clone, Copy, Default)]
pub struct DeltaStrategy<P = JsonPatcher> {
    patcher: P,
}

impl<P> DeltaStrategy<P> {
    pub fn new(patcher: P) -> Self {
        Self { patcher }
    }

    pub fn patcher(&self) -> &P {
        &self.patcher
    }
}

impl<D, P: Patcher<D>> HistoryStrategy<D> for DeltaStrategy<P> {
    type Entry = DeltaEntry<P::Delta>;

    fn record<F>(&self, present: &mut D, recipe: F) -> Result<Self::Entry>
    where
        F: FnOnce(&mut D) -> Result<Outcome<D>>,
    {
        let (forward, backward) = self.patcher.produce_with_deltas(present, |draft| {
            recipe(draft)?.apply_to(draft);
            Ok(())
        })?;
        Ok(DeltaEntry { forward, backward })
    }

    fn apply_entry(
        &self,
        present: &mut D,
        entry: &mut Self::Entry,
        direction: Direction,
    ) -> Result<()> {
        let delta = match direction {
            Direction::Undo => &entry.backward,
            Direction::Redo => &entry.forward,
        };
        self.patcher.apply(present, delta)
    }
}
