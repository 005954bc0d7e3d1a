//! Bounded, pausable undo/redo history for arbitrary state.
//!
//! A `HistoryAdapter` tracks a `HistoryState` (`past`, `present`, `future`,
//! `paused`) and wraps caller recipes so every call records one undo step.
//! Steps are stored either as whole snapshots of the prior value or as
//! reversible JSON patches. Every operation works on a plain value (returning
//! a new state) or on a `&mut` borrow (mutating in place).
pub mod adapter;
pub mod config;
pub mod error;
pub mod operator;
pub mod outcome;
pub mod patch;
pub mod state;
pub mod strategy;
pub mod undoable;

pub use adapter::{HistoryAdapter, PatchHistoryAdapter, SnapshotHistoryAdapter, StateOf};
pub use config::HistoryAdapterConfig;
pub use error::HistoryError;
pub use operator::{Operand, Operated, Target};
pub use outcome::{nothing, Outcome};
pub use patch::{JsonPatch, JsonPatcher, PatchOp, PatchPath, PathSegment, Patcher};
pub use state::{get_initial_state, HistoryState, PatchHistoryState, SnapshotHistoryState};
pub use strategy::{DeltaEntry, DeltaStrategy, Direction, HistoryStrategy, SnapshotStrategy};
pub use undoable::Undoable;
