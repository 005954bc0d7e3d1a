//! Reversible deltas over the JSON form of a value.
//!
//! `Patcher` is the seam the delta strategy records and replays changes
//! through. `JsonPatcher` is the shipped implementation: it converts the
//! present value to a `serde_json::Value` before and after a recipe runs and
//! records add/remove/replace operations in both directions. Capture and
//! replay cost one serialization round trip of the present value.
use std::fmt;

use anyhow::Result;
use serde::de::DeserializeOwned;
use serde::Serialize;
use serde_json::Value;

use crate::error::HistoryError;

/// Captures and replays reversible deltas for values of type `D`.
pub trait Patcher<D> {
    /// One direction of a change.
    type Delta: Clone + fmt::Debug;

    /// Runs `recipe` against `present` and returns `(forward, backward)`
    /// deltas describing what it changed.
    ///
    /// # Errors
    ///
    /// Recipe errors are returned unchanged. Capture failures are
    /// `HistoryError::Patch`.
    fn produce_with_deltas<F>(&self, present: &mut D, recipe: F) -> Result<(Self::Delta, Self::Delta)>
    where
        F: FnOnce(&mut D) -> Result<()>;

    /// Replays a previously captured delta against `present`.
    ///
    /// # Errors
    ///
    /// Returns `HistoryError::Patch` if the delta does not fit the value.
    /// `present` is unchanged in that case.
    fn apply(&self, present: &mut D, delta: &Self::Delta) -> Result<()>;
}

/// One step into a JSON document.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum PathSegment {
    Key(String),
    Index(usize),
}

/// Location of a patch operation, empty for the document root.
#[derive(Debug, Clone, PartialEq, Eq, Default)]
pub struct PatchPath(pub Vec<PathSegment>);

impl PatchPath {
    pub fn segments(&self) -> &[PathSegment] {
        &self.0
    }

    pub fn is_root(&self) -> bool {
        self.0.is_empty()
    }
}

impl fmt::Display for PatchPath {
    /// Formats as a JSON pointer (`/items/0/title`).
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        for segment in &self.0 {
            match segment {
                PathSegment::Key(key) => {
                    write!(f, "/{}", key.replace('~', "~0").replace('/', "~1"))?
                }
                PathSegment::Index(index) => write!(f, "/{index}")?,
            }
        }
        Ok(())
    }
}

/// A single patch operation.
#[derive(Debug, Clone, PartialEq)]
pub enum PatchOp {
    /// Insert a key, or insert into an array at an index.
    Add { path: PatchPath, value: Value },
    /// Delete a key or an array element.
    Remove { path: PatchPath },
    /// Overwrite the value at a path.
    Replace { path: PatchPath, value: Value },
}

impl PatchOp {
    pub fn path(&self) -> &PatchPath {
        match self {
            PatchOp::Add { path, .. } | PatchOp::Remove { path } | PatchOp::Replace { path, .. } => {
                path
            }
        }
    }
}

/// An ordered list of operations taking one JSON document to another.
#[derive(Debug, Clone, PartialEq, Default)]
pub struct JsonPatch {
    ops: Vec<PatchOp>,
}

impl JsonPatch {
    /// Computes the operations that turn `from` into `to`.
    pub fn diff(from: &Value, to: &Value) -> Self {
        let mut ops = Vec::new();
        diff_into(&mut Vec::new(), from, to, &mut ops);
        Self { ops }
    }

    pub fn ops(&self) -> &[PatchOp] {
        &self.ops
    }

    pub fn is_empty(&self) -> bool {
        self.ops.is_empty()
    }

    /// Applies every operation in order.
    ///
    /// # Errors
    ///
    /// Returns `HistoryError::Patch` for the first operation whose path does
    /// not resolve. Operations before it have already been applied.
    pub fn apply_to(&self, document: &mut Value) -> Result<(), HistoryError> {
        self.ops.iter().try_for_each(|op| apply_op(document, op))
    }
}

fn diff_into(path: &mut Vec<PathSegment>, from: &Value, to: &Value, ops: &mut Vec<PatchOp>) {
    if from == to {
        return;
    }
    match (from, to) {
        (Value::Object(old), Value::Object(new)) => {
            for (key, old_value) in old {
                path.push(PathSegment::Key(key.clone()));
                match new.get(key) {
                    Some(new_value) => diff_into(path, old_value, new_value, ops),
                    None => ops.push(PatchOp::Remove {
                        path: PatchPath(path.clone()),
                    }),
                }
                path.pop();
            }
            for (key, new_value) in new {
                if !old.contains_key(key) {
                    path.push(PathSegment::Key(key.clone()));
                    ops.push(PatchOp::Add {
                        path: PatchPath(path.clone()),
                        value: new_value.clone(),
                    });
                    path.pop();
                }
            }
        }
        (Value::Array(old), Value::Array(new)) => {
            let common = old.len().min(new.len());
            for (index, (old_item, new_item)) in old.iter().zip(new).enumerate() {
                path.push(PathSegment::Index(index));
                diff_into(path, old_item, new_item, ops);
                path.pop();
            }
            for (index, item) in new.iter().enumerate().skip(common) {
                path.push(PathSegment::Index(index));
                ops.push(PatchOp::Add {
                    path: PatchPath(path.clone()),
                    value: item.clone(),
                });
                path.pop();
            }
            // Highest index first so earlier removals don't shift later ones.
            for index in (common..old.len()).rev() {
                path.push(PathSegment::Index(index));
                ops.push(PatchOp::Remove {
                    path: PatchPath(path.clone()),
                });
                path.pop();
            }
        }
        _ => ops.push(PatchOp::Replace {
            path: PatchPath(path.clone()),
            value: to.clone(),
        }),
    }
}

fn resolve_mut<'v>(mut value: &'v mut Value, segments: &[PathSegment]) -> Option<&'v mut Value> {
    for segment in segments {
        value = match (value, segment) {
            (Value::Object(map), PathSegment::Key(key)) => map.get_mut(key)?,
            (Value::Array(items), PathSegment::Index(index)) => items.get_mut(*index)?,
            _ => return None,
        };
    }
    Some(value)
}

fn apply_op(document: &mut Value, op: &PatchOp) -> Result<(), HistoryError> {
    let path = op.path();
    let Some((last, parent_path)) = path.segments().split_last() else {
        *document = match op {
            PatchOp::Add { value, .. } | PatchOp::Replace { value, .. } => value.clone(),
            PatchOp::Remove { .. } => Value::Null,
        };
        return Ok(());
    };

    let parent = resolve_mut(document, parent_path)
        .ok_or_else(|| HistoryError::patch(path, "parent does not exist"))?;

    match (parent, last) {
        (Value::Object(map), PathSegment::Key(key)) => match op {
            PatchOp::Add { value, .. } | PatchOp::Replace { value, .. } => {
                map.insert(key.clone(), value.clone());
            }
            PatchOp::Remove { .. } => {
                map.remove(key)
                    .ok_or_else(|| HistoryError::patch(path, "key does not exist"))?;
            }
        },
        (Value::Array(items), PathSegment::Index(index)) => {
            let index = *index;
            match op {
                PatchOp::Add { value, .. } if index <= items.len() => {
                    items.insert(index, value.clone());
                }
                PatchOp::Replace { value, .. } if index < items.len() => {
                    items[index] = value.clone();
                }
                PatchOp::Remove { .. } if index < items.len() => {
                    items.remove(index);
                }
                _ => return Err(HistoryError::patch(path, "index out of bounds")),
            }
        }
        _ => return Err(HistoryError::patch(path, "path does not match value shape")),
    }
    Ok(())
}

fn to_json<D: Serialize>(value: &D) -> Result<Value, HistoryError> {
    serde_json::to_value(value).map_err(|e| HistoryError::patch(PatchPath::default(), e))
}

/// Records deltas as JSON patches.
///
/// Replay rebuilds `present` from its JSON form, so `D` has to survive a
/// `serde_json` round trip. A change whose result does not deserialize back
/// into `D` (non-finite floats serialize to `null`) is refused when it is
/// recorded. Fields that serde skips are not part of the JSON form and come
/// back as their default after every undo or redo.
#[derive(Debug, Clone, Copy, Default)]
pub struct JsonPatcher;

impl<D: Serialize + DeserializeOwned> Patcher<D> for JsonPatcher {
    type Delta = JsonPatch;

    fn produce_with_deltas<F>(&self, present: &mut D, recipe: F) -> Result<(JsonPatch, JsonPatch)>
    where
        F: FnOnce(&mut D) -> Result<()>,
    {
        let before = to_json(present)?;
        recipe(present)?;
        let after = to_json(present)?;
        // A document that can't be read back would make the entry unreplayable.
        if let Err(e) = <D as serde::Deserialize>::deserialize(&after) {
            return Err(HistoryError::patch(PatchPath::default(), e).into());
        }
        let forward = JsonPatch::diff(&before, &after);
        let backward = JsonPatch::diff(&after, &before);
        tracing::trace!(
            forward = forward.ops.len(),
            backward = backward.ops.len(),
            "captured patches"
        );
        Ok((forward, backward))
    }

    fn apply(&self, present: &mut D, delta: &JsonPatch) -> Result<()> {
        if delta.is_empty() {
            return Ok(());
        }
        let mut document = to_json(present)?;
        delta.apply_to(&mut document)?;
        *present = serde_json::from_value(document)
            .map_err(|e| HistoryError::patch(PatchPath::default(), e))?;
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde::Deserialize;
    use serde_json::json;

    #[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
    struct Book {
        title: String,
        author: String,
        tags: Vec<String>,
    }

    fn book() -> Book {
        Book {
            title: "Hitchhiker's Guide to the Galaxy".to_string(),
            author: "Douglas Adams".to_string(),
            tags: vec!["sci-fi".to_string()],
        }
    }

    fn key(k: &str) -> PathSegment {
        PathSegment::Key(k.to_string())
    }

    #[test]
    fn test_diff_of_equal_documents_is_empty() {
        let doc = json!({"a": [1, 2, {"b": true}]});
        assert!(JsonPatch::diff(&doc, &doc).is_empty());
    }

    #[test]
    fn test_diff_nested_replace() {
        let from = json!({"a": {"b": 1, "c": 2}});
        let to = json!({"a": {"b": 5, "c": 2}});
        let patch = JsonPatch::diff(&from, &to);
        assert_eq!(
            patch.ops(),
            &[PatchOp::Replace {
                path: PatchPath(vec![key("a"), key("b")]),
                value: json!(5),
            }]
        );
    }

    #[test]
    fn test_diff_object_keys_added_and_removed() {
        let from = json!({"gone": 1, "kept": 2});
        let to = json!({"kept": 2, "new": 3});
        let patch = JsonPatch::diff(&from, &to);
        assert_eq!(
            patch.ops(),
            &[
                PatchOp::Remove {
                    path: PatchPath(vec![key("gone")]),
                },
                PatchOp::Add {
                    path: PatchPath(vec![key("new")]),
                    value: json!(3),
                },
            ]
        );
    }

    #[test]
    fn test_forward_and_backward_round_trip_arrays() {
        let from = json!({"items": [1, 2, 3, 4], "n": 1});
        let to = json!({"items": [1, 9], "n": 2});

        let mut doc = from.clone();
        JsonPatch::diff(&from, &to).apply_to(&mut doc).expect("forward");
        assert_eq!(doc, to);

        JsonPatch::diff(&to, &from).apply_to(&mut doc).expect("backward");
        assert_eq!(doc, from);
    }

    #[test]
    fn test_root_replacement() {
        let from = json!({"x": 1});
        let to = Value::Null;
        let patch = JsonPatch::diff(&from, &to);
        assert!(patch.ops()[0].path().is_root());

        let mut doc = from.clone();
        patch.apply_to(&mut doc).expect("apply");
        assert_eq!(doc, Value::Null);
    }

    #[test]
    fn test_apply_rejects_unresolvable_path() {
        let patch = JsonPatch::diff(&json!({"a": {"b": 1}}), &json!({"a": {"b": 2}}));
        let mut doc = json!({"z": 0});
        let err = patch.apply_to(&mut doc).unwrap_err();
        assert!(matches!(err, HistoryError::Patch { ref path, .. } if path == "/a/b"));
    }

    #[test]
    fn test_path_display_escapes_keys() {
        let path = PatchPath(vec![key("a/b"), key("c~d"), PathSegment::Index(3)]);
        assert_eq!(path.to_string(), "/a~1b/c~0d/3");
    }

    #[test]
    fn test_json_patcher_captures_and_replays() {
        let mut present = book();
        let (forward, backward) = JsonPatcher
            .produce_with_deltas(&mut present, |b: &mut Book| {
                b.title = "Mostly Harmless".to_string();
                b.tags.push("comedy".to_string());
                Ok(())
            })
            .expect("produce");
        let changed = present.clone();
        assert_eq!(changed.title, "Mostly Harmless");

        JsonPatcher.apply(&mut present, &backward).expect("undo");
        assert_eq!(present, book());

        JsonPatcher.apply(&mut present, &forward).expect("redo");
        assert_eq!(present, changed);
    }

    #[test]
    fn test_json_patcher_propagates_recipe_error() {
        #[derive(Debug, thiserror::Error)]
        #[error("no such title")]
        struct NoSuchTitle;

        let mut present = book();
        let err = JsonPatcher
            .produce_with_deltas(&mut present, |_: &mut Book| Err(NoSuchTitle.into()))
            .unwrap_err();
        assert!(err.downcast_ref::<NoSuchTitle>().is_some());
    }

    #[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
    struct Gauge {
        value: f64,
    }

    #[test]
    fn test_json_patcher_refuses_change_that_cannot_be_read_back() {
        let mut present = Gauge { value: 1.0 };
        let err = JsonPatcher
            .produce_with_deltas(&mut present, |g: &mut Gauge| {
                g.value = f64::INFINITY;
                Ok(())
            })
            .unwrap_err();
        assert!(matches!(
            err.downcast_ref::<HistoryError>(),
            Some(HistoryError::Patch { .. })
        ));
    }

    #[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
    struct Draft {
        title: String,
        #[serde(skip)]
        cursor: usize,
    }

    #[test]
    fn test_json_patcher_resets_skipped_fields_on_replay() {
        let mut present = Draft {
            title: "a".to_string(),
            cursor: 7,
        };
        let (_, backward) = JsonPatcher
            .produce_with_deltas(&mut present, |d: &mut Draft| {
                d.title = "b".to_string();
                Ok(())
            })
            .expect("produce");
        assert_eq!(present.cursor, 7);

        JsonPatcher.apply(&mut present, &backward).expect("undo");
        assert_eq!(present.title, "a");
        assert_eq!(present.cursor, 0);
    }

    #[test]
    fn test_json_patcher_rejects_patch_that_breaks_type() {
        let mut present = book();
        let patch = JsonPatch::diff(&json!({"title": "x"}), &json!({"title": 5}));
        let err = JsonPatcher.apply(&mut present, &patch).unwrap_err();
        assert!(err.downcast_ref::<HistoryError>().is_some());
        assert_eq!(present, book());
    }
}
