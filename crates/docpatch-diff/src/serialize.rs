//! Patch serializer: groups intermediate patches into mutations.

use docpatch_types::{InsertOperation, Mutation, Operation, Patch};
use serde_json::{Map, Value};

/// Fold `patches` into mutations addressed at document `id`.
///
/// Sets, unsets and text patches each collapse into one mutation; every
/// insert stays its own mutation. Groups are emitted in the order set,
/// unset, diffMatchPatch, then inserts in discovery order, and empty groups
/// are omitted. The revision guard, if any, is attached to the first
/// mutation only.
pub fn serialize_patches(
    patches: Vec<Patch>,
    id: &str,
    if_revision_id: Option<&str>,
) -> Vec<Mutation> {
    let mut set = Map::new();
    let mut unset = Vec::new();
    let mut text = Map::new();
    let mut inserts = Vec::new();

    for patch in patches {
        match patch {
            Patch::Set { path, value } => {
                set.insert(path.encode(), value);
            }
            Patch::Unset { path } => unset.push(path.encode()),
            Patch::DiffMatchPatch { path, value } => {
                text.insert(path.encode(), Value::String(value));
            }
            Patch::InsertAfter { after, items } => inserts.push(Operation::Insert(InsertOperation {
                after: after.encode(),
                items,
            })),
        }
    }

    let grouped = [
        (!set.is_empty()).then(|| Operation::Set(set)),
        (!unset.is_empty()).then(|| Operation::Unset(unset)),
        (!text.is_empty()).then(|| Operation::DiffMatchPatch(text)),
    ];

    grouped
        .into_iter()
        .flatten()
        .chain(inserts)
        .enumerate()
        .map(|(i, operation)| {
            let mutation = Mutation::new(id, operation);
            match if_revision_id {
                Some(revision) if i == 0 => mutation.with_revision(revision),
                _ => mutation,
            }
        })
        .collect()
}
