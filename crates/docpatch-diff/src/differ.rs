//! The recursive tree differ.
//!
//! Walks two trees in lock-step and appends patches to a single owned
//! buffer in discovery order. Recursion depth is bounded by
//! [`DiffOptions::max_depth`].

use std::collections::HashSet;

use docpatch_types::{Patch, Path, PathSegment};
use serde_json::{Map, Value};

use crate::error::{DiffError, DiffResult};
use crate::options::DiffOptions;
use crate::text_diff::TextDiffEngine;
use crate::text_patch::diff_primitive;
use crate::validate::{is_root_metadata, validate_property};

/// Accumulates patches for one diff invocation.
pub(crate) struct TreeDiffer<'a> {
    options: &'a DiffOptions,
    engine: &'a dyn TextDiffEngine,
    patches: Vec<Patch>,
}

impl<'a> TreeDiffer<'a> {
    pub(crate) fn new(options: &'a DiffOptions, engine: &'a dyn TextDiffEngine) -> Self {
        Self {
            options,
            engine,
            patches: Vec::new(),
        }
    }

    /// Diff `a` against `b` located at `path` and return the patches.
    pub(crate) fn run(
        mut self,
        a: Option<&Value>,
        b: Option<&Value>,
        path: &Path,
    ) -> DiffResult<Vec<Patch>> {
        self.diff(a, b, path, 0)?;
        Ok(self.patches)
    }

    fn diff(
        &mut self,
        a: Option<&Value>,
        b: Option<&Value>,
        path: &Path,
        depth: usize,
    ) -> DiffResult<()> {
        if a.is_none() && b.is_none() {
            return Ok(());
        }

        if depth > self.options.max_depth {
            return Err(DiffError::DepthExceeded {
                path: path.clone(),
                limit: self.options.max_depth,
            });
        }

        let (a, b) = match (a, b) {
            (Some(a), Some(b)) if same_value(a, b) => return Ok(()),
            (Some(a), Some(b)) => (a, b),
            (None, Some(b)) => {
                self.patches.push(Patch::Set {
                    path: path.clone(),
                    value: b.clone(),
                });
                return Ok(());
            }
            _ => {
                self.patches.push(Patch::Unset { path: path.clone() });
                return Ok(());
            }
        };

        match (a, b) {
            (Value::Object(a), Value::Object(b)) => self.diff_object(a, b, path, depth),
            (Value::Array(a), Value::Array(b)) => self.diff_array(a, b, path, depth),
            (Value::Object(_) | Value::Array(_), _) | (_, Value::Object(_) | Value::Array(_)) => {
                self.patches.push(Patch::Set {
                    path: path.clone(),
                    value: b.clone(),
                });
                Ok(())
            }
            _ => {
                let patch = diff_primitive(a, b, path, self.options, self.engine);
                self.patches.push(patch);
                Ok(())
            }
        }
    }

    fn diff_object(
        &mut self,
        a: &Map<String, Value>,
        b: &Map<String, Value>,
        path: &Path,
        depth: usize,
    ) -> DiffResult<()> {
        let a_keys = diffable_keys(a, path)?;
        let b_keys = diffable_keys(b, path)?;

        for key in a_keys {
            if !b.contains_key(key) {
                self.patches.push(Patch::Unset {
                    path: path.child(key),
                });
            }
        }

        for key in b_keys {
            self.diff(a.get(key), b.get(key), &path.child(key), depth + 1)?;
        }
        Ok(())
    }

    fn diff_array(
        &mut self,
        a: &[Value],
        b: &[Value],
        path: &Path,
        depth: usize,
    ) -> DiffResult<()> {
        if b.len() > a.len() {
            let anchor = a.len() as i64 - 1;
            self.patches.push(Patch::InsertAfter {
                after: path.child(anchor),
                items: b[a.len()..].to_vec(),
            });
        }

        if b.len() < a.len() {
            let removed = &a[b.len()..];
            match unique_keys(removed) {
                // Keys survive concurrent inserts; indices do not.
                Some(keys) if !self.options.is_revision_locked() => {
                    for key in keys {
                        self.patches.push(Patch::Unset {
                            path: path.child(PathSegment::key(key)),
                        });
                    }
                }
                _ => {
                    let segment = if removed.len() == 1 {
                        PathSegment::from(b.len())
                    } else {
                        PathSegment::range(Some(b.len() as u64), None)
                    };
                    self.patches.push(Patch::Unset {
                        path: path.child(segment),
                    });
                }
            }
        }

        if let Some((i, nested)) = b.iter().enumerate().find(|(_, item)| item.is_array()) {
            return Err(DiffError::NestedArray {
                path: path.child(i),
                value: nested.clone(),
            });
        }

        let overlap = a.len().min(b.len());
        let (a, b) = (&a[..overlap], &b[..overlap]);

        // Keys are only trusted when neither side was reordered.
        let keyed = match (unique_keys(a), unique_keys(b)) {
            (Some(a_keys), Some(b_keys)) => a_keys == b_keys,
            _ => false,
        };

        for (i, (item_a, item_b)) in a.iter().zip(b).enumerate() {
            let child = match key_of(item_b) {
                Some(key) if keyed => path.child(PathSegment::key(key)),
                _ => path.child(i),
            };
            self.diff(Some(item_a), Some(item_b), &child, depth + 1)?;
        }
        Ok(())
    }
}

/// Structural equality without recursion, so arbitrarily deep trees cannot
/// overflow the stack. Object key order is ignored, as in `Value`'s `Eq`.
fn same_value(a: &Value, b: &Value) -> bool {
    let mut pending = vec![(a, b)];
    while let Some(pair) = pending.pop() {
        match pair {
            (Value::Object(a), Value::Object(b)) => {
                if a.len() != b.len() {
                    return false;
                }
                for (key, a_child) in a {
                    match b.get(key) {
                        Some(b_child) => pending.push((a_child, b_child)),
                        None => return false,
                    }
                }
            }
            (Value::Array(a), Value::Array(b)) => {
                if a.len() != b.len() {
                    return false;
                }
                pending.extend(a.iter().zip(b));
            }
            (Value::Object(_) | Value::Array(_), _) | (_, Value::Object(_) | Value::Array(_)) => {
                return false;
            }
            (a, b) => {
                if a != b {
                    return false;
                }
            }
        }
    }
    true
}

/// Validated property names of `object`, skipping root metadata.
fn diffable_keys<'v>(object: &'v Map<String, Value>, path: &Path) -> DiffResult<Vec<&'v str>> {
    object
        .iter()
        .filter(|(key, _)| !is_root_metadata(key, path))
        .map(|(key, value)| validate_property(key, value, path))
        .collect()
}

fn key_of(item: &Value) -> Option<&str> {
    item.get("_key")
        .and_then(Value::as_str)
        .filter(|key| !key.is_empty())
}

/// The element keys, in order, if every element is an object carrying a
/// distinct non-empty `_key`.
pub(crate) fn unique_keys(items: &[Value]) -> Option<Vec<&str>> {
    let mut seen = HashSet::with_capacity(items.len());
    items
        .iter()
        .map(|item| {
            let key = item.as_object().and_then(|_| key_of(item))?;
            seen.insert(key).then_some(key)
        })
        .collect()
}
