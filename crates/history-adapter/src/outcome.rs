//! What a recipe hands back after running against the present value.

/// A recipe either mutated the present value in place or replaced it.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Outcome<D> {
    /// The recipe changed the value through its `&mut` borrow (or not at all).
    Mutated,
    /// The present value becomes this value.
    Replace(D),
}

impl<D> Outcome<D> {
    /// Folds the outcome into `present`.
    pub fn apply_to(self, present: &mut D) {
        if let Outcome::Replace(value) = self {
            *present = value;
        }
    }
}

impl<D> Default for Outcome<D> {
    fn default() -> Self {
        Outcome::Mutated
    }
}

impl<D> From<()> for Outcome<D> {
    fn from(_: ()) -> Self {
        Outcome::Mutated
    }
}

/// The outcome that makes optional data absent.
///
/// Distinct from `Outcome::Mutated`, which keeps whatever the recipe left
/// behind: `nothing()` always ends with `present == None`.
pub fn nothing<T>() -> Outcome<Option<T>> {
    Outcome::Replace(None)
}
