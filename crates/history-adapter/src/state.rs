//! The `past` / `present` / `future` shape tracked per undoable value.
use std::collections::VecDeque;

use crate::patch::JsonPatch;
use crate::strategy::DeltaEntry;

/// History of one value.
///
/// `past` is oldest first, so its front is the next entry evicted by the
/// limit. `future` is nearest first, so its front is the next redo target.
#[derive(Debug, Clone, PartialEq)]
pub struct HistoryState<D, E> {
    /// Entries that undo back toward older values.
    pub past: VecDeque<E>,
    /// The current value.
    pub present: D,
    /// Entries that redo changes undone since the last recorded one.
    pub future: VecDeque<E>,
    /// When set, recipes still update `present` but record nothing.
    pub paused: bool,
}

/// History state whose entries are reversible JSON patches.
pub type PatchHistoryState<D> = HistoryState<D, DeltaEntry<JsonPatch>>;

/// History state whose entries are whole prior values.
pub type SnapshotHistoryState<D> = HistoryState<D, D>;

impl<D, E> HistoryState<D, E> {
    /// A state holding `present` with no history and recording enabled.
    pub fn new(present: D) -> Self {
        Self {
            past: VecDeque::new(),
            present,
            future: VecDeque::new(),
            paused: false,
        }
    }

    /// Whether there is an entry to undo.
    pub fn can_undo(&self) -> bool {
        !self.past.is_empty()
    }

    /// Whether there is an entry to redo.
    pub fn can_redo(&self) -> bool {
        !self.future.is_empty()
    }
}

impl<D: Default, E> Default for HistoryState<D, E> {
    fn default() -> Self {
        Self::new(D::default())
    }
}

/// Constructs an initial state with no history.
pub fn get_initial_state<D, E>(present: D) -> HistoryState<D, E> {
    HistoryState::new(present)
}
