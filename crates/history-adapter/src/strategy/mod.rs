//! How a `past`/`future` slot records a change.
//!
//! Navigation only ever calls `apply_entry`, so it works the same for
//! whole-value snapshots and for reversible deltas.
use std::fmt;

use anyhow::Result;

use crate::outcome::Outcome;

mod delta;
mod snapshot;

pub use delta::{DeltaEntry, DeltaStrategy};
pub use snapshot::SnapshotStrategy;

/// Which way an entry is being replayed.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Direction {
    Undo,
    Redo,
}

/// Records history entries for recipe calls and replays them.
pub trait HistoryStrategy<D> {
    /// One unit of history.
    type Entry: Clone + fmt::Debug;

    /// Runs `recipe` against `present`, folds its outcome in, and returns
    /// the entry that would undo the change.
    ///
    /// # Errors
    ///
    /// Recipe errors are returned unchanged. `present` keeps whatever the
    /// recipe did before failing.
    fn record<F>(&self, present: &mut D, recipe: F) -> Result<Self::Entry>
    where
        F: FnOnce(&mut D) -> Result<Outcome<D>>;

    /// Replays `entry` against `present`, leaving in `entry` whatever
    /// belongs on the opposite stack.
    ///
    /// # Errors
    ///
    /// Returns an error if the entry no longer fits `present`. Both
    /// `present` and `entry` are unchanged in that case.
    fn apply_entry(&self, present: &mut D, entry: &mut Self::Entry, direction: Direction)
        -> Result<()>;
}
