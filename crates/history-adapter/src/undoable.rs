//! Recipes wrapped with history bookkeeping.
use anyhow::Result;

use crate::adapter::{HistoryAdapter, StateOf};
use crate::operator::Operand;
use crate::outcome::Outcome;
use crate::strategy::HistoryStrategy;

type Recipe<'a, D, A> = Box<dyn Fn(&mut D, &A) -> Result<Outcome<D>> + 'a>;
type Predicate<'a, A> = Box<dyn Fn(&A) -> Option<bool> + 'a>;
type Selector<'a, R, H> = Box<dyn for<'r> Fn(&'r mut R) -> &'r mut H + 'a>;

fn identity<T>(state: &mut T) -> &mut T {
    state
}

/// A recipe that records a history entry every time it is applied.
///
/// `R` is the value `apply` is called with. By default that is the history
/// state itself; `select_history_state` lets the history live inside a
/// larger root value.
pub struct Undoable<'a, D, S: HistoryStrategy<D>, A, R = StateOf<D, S>> {
    adapter: &'a HistoryAdapter<D, S>,
    recipe: Recipe<'a, D, A>,
    is_undoable: Option<Predicate<'a, A>>,
    select: Selector<'a, R, StateOf<D, S>>,
}

impl<'a, D, S, A> Undoable<'a, D, S, A>
where
    S: HistoryStrategy<D>,
    StateOf<D, S>: 'a,
{
    pub(crate) fn new<F>(adapter: &'a HistoryAdapter<D, S>, recipe: F) -> Self
    where
        F: Fn(&mut D, &A) -> Result<Outcome<D>> + 'a,
    {
        Self {
            adapter,
            recipe: Box::new(recipe),
            is_undoable: None,
            select: Box::new(identity::<StateOf<D, S>>),
        }
    }
}

impl<'a, D, S: HistoryStrategy<D>, A, R> Undoable<'a, D, S, A, R> {
    /// Decides per call whether the change is recorded.
    ///
    /// The predicate sees the call arguments. `None` counts as undoable.
    pub fn when<P>(mut self, is_undoable: P) -> Self
    where
        P: Fn(&A) -> Option<bool> + 'a,
    {
        self.is_undoable = Some(Box::new(is_undoable));
        self
    }

    /// Operates on a history state nested inside a root value.
    ///
    /// All bookkeeping (pause, limit, past and future) applies to the
    /// selected state.
    pub fn select_history_state<R2, G>(self, selector: G) -> Undoable<'a, D, S, A, R2>
    where
        G: for<'r> Fn(&'r mut R2) -> &'r mut StateOf<D, S> + 'a,
    {
        Undoable {
            adapter: self.adapter,
            recipe: self.recipe,
            is_undoable: self.is_undoable,
            select: Box::new(selector),
        }
    }

    /// Runs the recipe against `root` with `args`.
    ///
    /// `&root` returns a new root value; `&mut root` mutates in place.
    ///
    /// # Errors
    ///
    /// Recipe errors are returned unchanged, as are errors capturing the
    /// history entry.
    pub fn apply<'t, T>(&self, root: T, args: A) -> Result<T::Output>
    where
        T: Operand<'t, R>,
        R: 't,
    {
        root.try_operate(|root| {
            let state = (self.select)(root);
            self.record(state, &args)
        })
    }

    fn record(&self, state: &mut StateOf<D, S>, args: &A) -> Result<()> {
        // Paused or opted out: update `present` directly and leave past and
        // future alone. The strategy never sees the change.
        if state.paused {
            tracing::trace!("history paused, change not recorded");
            return self.run_unrecorded(&mut state.present, args);
        }
        let undoable = self
            .is_undoable
            .as_ref()
            .and_then(|is_undoable| is_undoable(args))
            .unwrap_or(true);
        if !undoable {
            tracing::trace!("change marked not undoable");
            return self.run_unrecorded(&mut state.present, args);
        }

        let entry = self
            .adapter
            .strategy()
            .record(&mut state.present, |present| (self.recipe)(present, args))?;
        self.adapter.push_entry(state, entry);
        Ok(())
    }

    fn run_unrecorded(&self, present: &mut D, args: &A) -> Result<()> {
        (self.recipe)(present, args)?.apply_to(present);
        Ok(())
    }
}
