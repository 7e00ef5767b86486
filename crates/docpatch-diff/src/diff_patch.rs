//! Entry point: resolve identity and guard, check root invariants, diff,
//! serialize.

use docpatch_types::{Mutation, Patch, Path};
use serde_json::Value;
use tracing::debug;

use crate::differ::TreeDiffer;
use crate::error::{DiffError, DiffResult};
use crate::options::{DiffOptions, RevisionGuard};
use crate::serialize::serialize_patches;
use crate::text_diff::{DiffMatchPatchEngine, TextDiffEngine};

/// Compute the mutations that turn document `a` into document `b`.
///
/// Uses the default [`DiffMatchPatchEngine`] for text patches.
pub fn diff_patch(a: &Value, b: &Value, options: &DiffOptions) -> DiffResult<Vec<Mutation>> {
    diff_patch_with_engine(a, b, options, &DiffMatchPatchEngine::default())
}

/// Like [`diff_patch`], with a caller-supplied text-diff engine.
pub fn diff_patch_with_engine(
    a: &Value,
    b: &Value,
    options: &DiffOptions,
    engine: &dyn TextDiffEngine,
) -> DiffResult<Vec<Mutation>> {
    let id = resolve_id(a, b, options)?;
    let revision = resolve_revision(a, options)?;

    if options.base_path.is_root() {
        let (from, to) = (a.get("_type"), b.get("_type"));
        if from != to {
            return Err(DiffError::ImmutableType {
                from: type_label(from),
                to: type_label(to),
            });
        }
    }

    let patches = TreeDiffer::new(options, engine).run(Some(a), Some(b), &options.base_path)?;
    let patch_count = patches.len();
    let mutations = serialize_patches(patches, &id, revision.as_deref());

    debug!(
        id = %id,
        base_path = %options.base_path,
        patches = patch_count,
        mutations = mutations.len(),
        guarded = revision.is_some(),
        "computed diff patch"
    );
    Ok(mutations)
}

/// Diff two items located at `path` and return the intermediate patches,
/// without any identity or root checks.
///
/// A missing side is `None`: `None -> Some` sets, `Some -> None` unsets.
pub fn diff_item(
    a: Option<&Value>,
    b: Option<&Value>,
    options: &DiffOptions,
    path: &Path,
) -> DiffResult<Vec<Patch>> {
    let engine = DiffMatchPatchEngine::default();
    TreeDiffer::new(options, &engine).run(a, b, path)
}

fn resolve_id(a: &Value, b: &Value, options: &DiffOptions) -> DiffResult<String> {
    if let Some(id) = options.id.as_deref().filter(|id| !id.is_empty()) {
        return Ok(id.to_string());
    }

    match (a.get("_id").and_then(Value::as_str), b.get("_id").and_then(Value::as_str)) {
        (Some(a_id), Some(b_id)) if a_id == b_id && !a_id.is_empty() => Ok(a_id.to_string()),
        _ => Err(DiffError::MissingId),
    }
}

fn resolve_revision(a: &Value, options: &DiffOptions) -> DiffResult<Option<String>> {
    match &options.if_revision_id {
        RevisionGuard::None => Ok(None),
        RevisionGuard::Revision(rev) if rev.is_empty() => Ok(None),
        RevisionGuard::Revision(rev) => Ok(Some(rev.clone())),
        RevisionGuard::Infer => a
            .get("_rev")
            .and_then(Value::as_str)
            .filter(|rev| !rev.is_empty())
            .map(|rev| Some(rev.to_string()))
            .ok_or(DiffError::MissingRevision),
    }
}

fn type_label(value: Option<&Value>) -> String {
    match value {
        None => "undefined".to_string(),
        Some(Value::String(s)) => s.clone(),
        Some(other) => other.to_string(),
    }
}
