//! History adapter: navigation and recipe wrapping over a `HistoryState`.
//!
//! Every operation accepts either `&state` (returns a new state, the input is
//! untouched) or `&mut state` (mutates in place and returns the same
//! reference). See `operator` for the dispatch.
use std::fmt;
use std::marker::PhantomData;

use anyhow::Result;
use serde::de::DeserializeOwned;
use serde::Serialize;

use crate::config::HistoryAdapterConfig;
use crate::error::HistoryError;
use crate::operator::Operand;
use crate::outcome::Outcome;
use crate::patch::JsonPatcher;
use crate::state::HistoryState;
use crate::strategy::{DeltaStrategy, Direction, HistoryStrategy, SnapshotStrategy};
use crate::undoable::Undoable;

/// The history state an adapter with strategy `S` operates on.
pub type StateOf<D, S> = HistoryState<D, <S as HistoryStrategy<D>>::Entry>;

/// Adapter recording reversible JSON patches.
pub type PatchHistoryAdapter<D> = HistoryAdapter<D, DeltaStrategy<JsonPatcher>>;

/// Adapter recording whole prior values.
pub type SnapshotHistoryAdapter<D> = HistoryAdapter<D, SnapshotStrategy>;

/// Undo/redo engine for values of type `D`.
///
/// The strategy and configuration are fixed at construction time.
pub struct HistoryAdapter<D, S: HistoryStrategy<D>> {
    strategy: S,
    config: HistoryAdapterConfig,
    _data: PhantomData<fn() -> D>,
}

impl<D, S: HistoryStrategy<D> + fmt::Debug> fmt::Debug for HistoryAdapter<D, S> {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("HistoryAdapter")
            .field("strategy", &self.strategy)
            .field("config", &self.config)
            .finish()
    }
}

impl<D, S: HistoryStrategy<D> + Clone> Clone for HistoryAdapter<D, S> {
    fn clone(&self) -> Self {
        Self {
            strategy: self.strategy.clone(),
            config: self.config,
            _data: PhantomData,
        }
    }
}

impl<D: Serialize + DeserializeOwned> HistoryAdapter<D, DeltaStrategy<JsonPatcher>> {
    /// Creates an adapter whose entries are forward/backward JSON patches.
    ///
    /// # Errors
    ///
    /// Returns `HistoryError::InvalidLimit` for a zero limit.
    pub fn with_patches(config: HistoryAdapterConfig) -> Result<Self, HistoryError> {
        Self::new(DeltaStrategy::default(), config)
    }
}

impl<D: Clone + fmt::Debug> HistoryAdapter<D, SnapshotStrategy> {
    /// Creates an adapter whose entries are full copies of prior values.
    ///
    /// # Errors
    ///
    /// Returns `HistoryError::InvalidLimit` for a zero limit.
    pub fn with_snapshots(config: HistoryAdapterConfig) -> Result<Self, HistoryError> {
        Self::new(SnapshotStrategy, config)
    }
}

impl<D, S: HistoryStrategy<D>> HistoryAdapter<D, S> {
    /// Creates an adapter with a custom strategy.
    ///
    /// # Errors
    ///
    /// Returns `HistoryError::InvalidLimit` for a zero limit.
    pub fn new(strategy: S, config: HistoryAdapterConfig) -> Result<Self, HistoryError> {
        config.validate()?;
        tracing::debug!(limit = ?config.limit, "created history adapter");
        Ok(Self {
            strategy,
            config,
            _data: PhantomData,
        })
    }

    pub fn config(&self) -> &HistoryAdapterConfig {
        &self.config
    }

    pub fn strategy(&self) -> &S {
        &self.strategy
    }

    /// Constructs a state with no history.
    pub fn get_initial_state(&self, present: D) -> StateOf<D, S> {
        HistoryState::new(present)
    }

    /// Applies the most recent `past` entry, if any.
    ///
    /// # Errors
    ///
    /// Returns an error if the entry cannot be replayed.
    pub fn undo<'t, T>(&self, state: T) -> Result<T::Output>
    where
        T: Operand<'t, StateOf<D, S>>,
        StateOf<D, S>: 't,
    {
        state.try_operate(|state| self.undo_mutably(state))
    }

    /// Applies the nearest `future` entry, if any.
    ///
    /// # Errors
    ///
    /// Returns an error if the entry cannot be replayed.
    pub fn redo<'t, T>(&self, state: T) -> Result<T::Output>
    where
        T: Operand<'t, StateOf<D, S>>,
        StateOf<D, S>: 't,
    {
        state.try_operate(|state| self.redo_mutably(state))
    }

    /// Moves `n` steps through history: back for negative `n`, forward for
    /// positive. Stops quietly at either end.
    ///
    /// # Errors
    ///
    /// Returns an error if an entry cannot be replayed.
    pub fn jump<'t, T>(&self, state: T, n: isize) -> Result<T::Output>
    where
        T: Operand<'t, StateOf<D, S>>,
        StateOf<D, S>: 't,
    {
        state.try_operate(|state| self.jump_mutably(state, n))
    }

    /// Drops all `past` and `future` entries. `present` and `paused` stay.
    pub fn clear_history<'t, T>(&self, state: T) -> T::Output
    where
        T: Operand<'t, StateOf<D, S>>,
        StateOf<D, S>: 't,
    {
        state.operate(|state| {
            state.past.clear();
            state.future.clear();
        })
    }

    /// Stops recording: recipes still update `present` but add no entries.
    pub fn pause<'t, T>(&self, state: T) -> T::Output
    where
        T: Operand<'t, StateOf<D, S>>,
        StateOf<D, S>: 't,
    {
        state.operate(|state| state.paused = true)
    }

    /// Starts recording again after `pause`.
    pub fn resume<'t, T>(&self, state: T) -> T::Output
    where
        T: Operand<'t, StateOf<D, S>>,
        StateOf<D, S>: 't,
    {
        state.operate(|state| state.paused = false)
    }

    /// Wraps `recipe` so each call records one history entry.
    ///
    /// The recipe receives the present value and the call arguments. Use a
    /// tuple for `A` when the recipe needs several arguments.
    pub fn undoable<'a, A, F>(&'a self, recipe: F) -> Undoable<'a, D, S, A>
    where
        F: Fn(&mut D, &A) -> Result<Outcome<D>> + 'a,
        StateOf<D, S>: 'a,
    {
        Undoable::new(self, recipe)
    }

    /// Like `undoable`, deciding per call whether the change is recorded.
    ///
    /// `is_undoable` returning `None` counts as undoable.
    pub fn undoable_if<'a, A, F, P>(&'a self, recipe: F, is_undoable: P) -> Undoable<'a, D, S, A>
    where
        F: Fn(&mut D, &A) -> Result<Outcome<D>> + 'a,
        P: Fn(&A) -> Option<bool> + 'a,
        StateOf<D, S>: 'a,
    {
        Undoable::new(self, recipe).when(is_undoable)
    }

    // Entries move between stacks only after a successful replay, so a
    // failure leaves the state exactly as it was.
    pub(crate) fn undo_mutably(&self, state: &mut StateOf<D, S>) -> Result<()> {
        let Some(entry) = state.past.back_mut() else {
            tracing::trace!("nothing to undo");
            return Ok(());
        };
        if let Err(e) = self
            .strategy
            .apply_entry(&mut state.present, entry, Direction::Undo)
        {
            tracing::warn!(error = %e, "undo failed, history unchanged");
            return Err(e);
        }
        if let Some(entry) = state.past.pop_back() {
            state.future.push_front(entry);
        }
        Ok(())
    }

    pub(crate) fn redo_mutably(&self, state: &mut StateOf<D, S>) -> Result<()> {
        let Some(entry) = state.future.front_mut() else {
            tracing::trace!("nothing to redo");
            return Ok(());
        };
        if let Err(e) = self
            .strategy
            .apply_entry(&mut state.present, entry, Direction::Redo)
        {
            tracing::warn!(error = %e, "redo failed, history unchanged");
            return Err(e);
        }
        if let Some(entry) = state.future.pop_front() {
            state.past.push_back(entry);
        }
        Ok(())
    }

    pub(crate) fn jump_mutably(&self, state: &mut StateOf<D, S>, n: isize) -> Result<()> {
        let steps = n.unsigned_abs();
        for _ in 0..steps {
            let exhausted = if n < 0 {
                !state.can_undo()
            } else {
                !state.can_redo()
            };
            if exhausted {
                tracing::trace!(requested = n, "jump stopped at end of history");
                break;
            }
            if n < 0 {
                self.undo_mutably(state)?;
            } else {
                self.redo_mutably(state)?;
            }
        }
        Ok(())
    }

    /// Appends a freshly recorded entry, evicting the oldest past entries to
    /// stay within the limit. A new entry invalidates every redo.
    pub(crate) fn push_entry(&self, state: &mut StateOf<D, S>, entry: S::Entry) {
        if let Some(limit) = self.config.limit {
            while state.past.len() >= limit {
                state.past.pop_front();
                tracing::debug!(limit, "evicted oldest history entry");
            }
        }
        state.past.push_back(entry);
        state.future.clear();
    }
}
