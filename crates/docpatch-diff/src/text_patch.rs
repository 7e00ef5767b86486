//! Primitive diff: whole-value `set` or a compact text patch.

use docpatch_types::{Patch, Path};
use serde_json::Value;
use tracing::{debug, warn};

use crate::options::DiffOptions;
use crate::text_diff::{utf16_len, TextDiffEngine};

/// Diff two present, non-container values at `path`.
///
/// Returns a `DiffMatchPatch` patch when the new value is a long enough
/// string and the patch text is not much larger than the string itself;
/// a whole-value `Set` otherwise. Engine failures fall back to `Set`.
pub fn diff_primitive(
    a: &Value,
    b: &Value,
    path: &Path,
    options: &DiffOptions,
    engine: &dyn TextDiffEngine,
) -> Patch {
    let set = || Patch::Set {
        path: path.clone(),
        value: b.clone(),
    };

    let settings = &options.diff_match_patch;
    if !settings.enabled {
        return set();
    }

    let (Value::String(old), Value::String(new)) = (a, b) else {
        return set();
    };

    // Underscore-prefixed fields hold identifiers, never prose.
    if path
        .last()
        .and_then(|segment| segment.as_property())
        .is_some_and(|name| name.starts_with('_'))
    {
        return set();
    }

    let length = utf16_len(new);
    if length < settings.length_threshold_absolute {
        return set();
    }

    let patch = match engine.patch_text(old, new) {
        Ok(patch) => patch,
        Err(e) => {
            if !options.hide_warnings {
                warn!(path = %path, error = %e, "text diff failed; using whole-value set");
            }
            return set();
        }
    };

    let patch_length = utf16_len(&patch);
    if patch_length as f64 > length as f64 * settings.length_threshold_relative {
        debug!(path = %path, patch_length, length, "text patch too large; using set");
        return set();
    }

    Patch::DiffMatchPatch {
        path: path.clone(),
        value: patch,
    }
}
