//! Minimal patch applier used to check differ output.
//!
//! Applies patches in the order the backend applies grouped mutations:
//! sets, then unsets, then inserts. Text patches are not supported.

use docpatch_types::{Patch, PathSegment};
use serde_json::Value;

pub(crate) fn apply_patches(document: &mut Value, patches: &[Patch]) {
    let sets = patches.iter().filter(|p| matches!(p, Patch::Set { .. }));
    let unsets = patches.iter().filter(|p| matches!(p, Patch::Unset { .. }));
    let inserts = patches.iter().filter(|p| matches!(p, Patch::InsertAfter { .. }));

    for patch in sets.chain(unsets).chain(inserts) {
        apply(document, patch);
    }
}

fn apply(document: &mut Value, patch: &Patch) {
    let segments = patch.path().segments();
    let Some((last, parents)) = segments.split_last() else {
        match patch {
            Patch::Set { value, .. } => *document = value.clone(),
            Patch::Unset { .. } => *document = Value::Null,
            other => panic!("cannot apply {} at the root", other.op_name()),
        }
        return;
    };

    let parent = parents
        .iter()
        .fold(document, |node, segment| locate(node, segment));

    match patch {
        Patch::Set { value, .. } => match (parent, last) {
            (Value::Object(map), PathSegment::Property(name)) => {
                map.insert(name.clone(), value.clone());
            }
            (parent, segment) => *locate(parent, segment) = value.clone(),
        },
        Patch::Unset { .. } => match (parent, last) {
            (Value::Object(map), PathSegment::Property(name)) => {
                map.remove(name);
            }
            (Value::Array(items), PathSegment::Index(index)) => {
                items.remove(*index as usize);
            }
            (Value::Array(items), PathSegment::Range(Some(from), None)) => {
                items.truncate(*from as usize);
            }
            (Value::Array(items), PathSegment::Key(key)) => {
                items.retain(|item| {
                    item.get("_key").and_then(Value::as_str) != Some(key.as_str())
                });
            }
            (parent, segment) => panic!("cannot unset {segment:?} on {parent}"),
        },
        Patch::InsertAfter { items, .. } => match (parent, last) {
            (Value::Array(array), PathSegment::Index(index)) => {
                let at = if *index < 0 {
                    array.len() as i64 + index + 1
                } else {
                    index + 1
                };
                let at = at as usize;
                array.splice(at..at, items.iter().cloned());
            }
            (parent, segment) => panic!("cannot insert after {segment:?} in {parent}"),
        },
        Patch::DiffMatchPatch { .. } => panic!("text patches are not supported"),
    }
}

fn locate<'v>(node: &'v mut Value, segment: &PathSegment) -> &'v mut Value {
    match (node, segment) {
        (Value::Object(map), PathSegment::Property(name)) => map
            .get_mut(name)
            .unwrap_or_else(|| panic!("missing property {name}")),
        (Value::Array(items), PathSegment::Index(index)) => &mut items[*index as usize],
        (Value::Array(items), PathSegment::Key(key)) => items
            .iter_mut()
            .find(|item| item.get("_key").and_then(Value::as_str) == Some(key.as_str()))
            .unwrap_or_else(|| panic!("missing key {key}")),
        (node, segment) => panic!("cannot follow {segment:?} into {node}"),
    }
}
