//! Dual-mode state operator.
//!
//! Every engine operation is written once as a mutator over `&mut S` and
//! exposed through `Operand`. A shared borrow opens a copy-on-write
//! transaction (clone, mutate, commit the clone) and leaves the original
//! untouched. A mutable borrow is treated as a live transactional view owned
//! by an outer caller: the mutator runs against it directly and the same
//! reference is handed back.
use std::convert::Infallible;

/// A state value whose mode is only known at run time.
#[derive(Debug)]
pub enum Target<'a, S> {
    /// A live view the caller is already mutating.
    Bound(&'a mut S),
    /// A plain value to produce a new state from.
    Unbound(&'a S),
}

impl<'a, S> From<&'a mut S> for Target<'a, S> {
    fn from(state: &'a mut S) -> Self {
        Target::Bound(state)
    }
}

impl<'a, S> From<&'a S> for Target<'a, S> {
    fn from(state: &'a S) -> Self {
        Target::Unbound(state)
    }
}

/// Result of operating on a `Target`.
#[derive(Debug)]
pub enum Operated<'a, S> {
    /// The same view that was passed in, mutated in place.
    Bound(&'a mut S),
    /// A freshly committed value.
    Unbound(S),
}

impl<S> Operated<'_, S> {
    /// The resulting state, whichever way it was produced.
    pub fn get(&self) -> &S {
        match self {
            Operated::Bound(state) => state,
            Operated::Unbound(state) => state,
        }
    }

    /// Whether the operation mutated a caller-owned view.
    pub fn is_bound(&self) -> bool {
        matches!(self, Operated::Bound(_))
    }
}

impl<S: Clone> Operated<'_, S> {
    /// Returns the resulting state by value, cloning a bound view.
    pub fn into_owned(self) -> S {
        match self {
            Operated::Bound(state) => state.clone(),
            Operated::Unbound(state) => state,
        }
    }
}

/// Something an operation can run against: a plain value or a live view.
pub trait Operand<'a, S: 'a>: Sized {
    /// `S` for plain values, `&'a mut S` for views.
    type Output;

    /// Runs a fallible mutator. Mutator errors are returned as-is.
    ///
    /// # Errors
    ///
    /// Returns whatever `mutator` returns. A plain value is left untouched
    /// on error; a view keeps any changes made before the failure.
    fn try_operate<E, F>(self, mutator: F) -> Result<Self::Output, E>
    where
        F: FnOnce(&mut S) -> Result<(), E>;

    /// Runs an infallible mutator.
    fn operate<F>(self, mutator: F) -> Self::Output
    where
        F: FnOnce(&mut S),
    {
        let result = self.try_operate(|state| {
            mutator(state);
            Ok::<(), Infallible>(())
        });
        match result {
            Ok(output) => output,
            Err(never) => match never {},
        }
    }
}

impl<'a, S: Clone + 'a> Operand<'a, S> for &'a S {
    type Output = S;

    fn try_operate<E, F>(self, mutator: F) -> Result<S, E>
    where
        F: FnOnce(&mut S) -> Result<(), E>,
    {
        let mut draft = S::clone(self);
        mutator(&mut draft)?;
        Ok(draft)
    }
}

impl<'a, S: 'a> Operand<'a, S> for &'a mut S {
    type Output = &'a mut S;

    fn try_operate<E, F>(self, mutator: F) -> Result<&'a mut S, E>
    where
        F: FnOnce(&mut S) -> Result<(), E>,
    {
        mutator(&mut *self)?;
        Ok(self)
    }
}

impl<'a, S: Clone + 'a> Operand<'a, S> for Target<'a, S> {
    type Output = Operated<'a, S>;

    fn try_operate<E, F>(self, mutator: F) -> Result<Operated<'a, S>, E>
    where
        F: FnOnce(&mut S) -> Result<(), E>,
    {
        match self {
            Target::Bound(view) => view.try_operate(mutator).map(Operated::Bound),
            Target::Unbound(value) => value.try_operate(mutator).map(Operated::Unbound),
        }
    }
}
