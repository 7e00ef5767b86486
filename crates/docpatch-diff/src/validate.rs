//! Property validation.
//!
//! Property names must be plain identifiers, and the identity-bearing
//! annotations `_key`, `_ref` and `_type` must hold identifier-like strings.
//! Validation is independent of diffing: [`validate_document`] can be used to
//! pre-flight a document before it is ever compared.

use docpatch_types::{is_dottable, Path, PathSegment};
use serde_json::Value;

use crate::error::{DiffError, DiffResult};

/// Metadata fields that are skipped at the document root.
pub const ROOT_METADATA_KEYS: &[&str] = &["_id", "_type", "_createdAt", "_updatedAt", "_rev"];

/// Annotations whose values identify something and must be identifier-like.
const IDENTITY_KEYS: &[&str] = &["_key", "_ref", "_type"];

/// Returns `true` if `key` is reserved metadata when it appears at `path`.
pub fn is_root_metadata(key: &str, path: &Path) -> bool {
    path.is_root() && ROOT_METADATA_KEYS.contains(&key)
}

/// Validate one property of an object located at `path`.
///
/// Returns the property name on success so callers can validate while
/// collecting keys.
pub fn validate_property<'a>(name: &'a str, value: &Value, path: &Path) -> DiffResult<&'a str> {
    let starts_ok = name
        .chars()
        .next()
        .is_some_and(|c| c.is_ascii_alphabetic() || c == '_');
    if !starts_ok {
        return Err(DiffError::InvalidPropertyName {
            path: path.child(name),
            reason: "keys must start with a letter (a-z)",
        });
    }

    if !is_dottable(name) {
        return Err(DiffError::InvalidPropertyName {
            path: path.child(name),
            reason: "keys can only contain letters, numbers and underscores",
        });
    }

    if IDENTITY_KEYS.contains(&name) {
        let reason = match value {
            Value::String(s) if is_identity_value(s) => None,
            Value::String(_) => Some("invalid key - use less exotic characters"),
            _ => Some("keys must be strings"),
        };
        if let Some(reason) = reason {
            return Err(DiffError::InvalidIdentityValue {
                path: path.child(name),
                value: value.clone(),
                reason,
            });
        }
    }

    Ok(name)
}

/// `[a-z0-9][a-z0-9_.-]+`, case-insensitive.
fn is_identity_value(value: &str) -> bool {
    let mut chars = value.chars();
    match chars.next() {
        Some(first) if first.is_ascii_alphanumeric() => {
            let rest = chars.as_str();
            !rest.is_empty()
                && rest
                    .chars()
                    .all(|c| c.is_ascii_alphanumeric() || matches!(c, '_' | '.' | '-'))
        }
        _ => false,
    }
}

enum Visit<'a> {
    Node(&'a Value, Path),
    Element(&'a Value, Path),
    Property(&'a str, &'a Value, Path),
}

/// Validate every property in `document`, and reject arrays of arrays.
///
/// Reserved metadata fields are skipped at the root only. The walk uses an
/// explicit stack, so arbitrarily deep input cannot overflow the call stack;
/// errors are reported in the same order a depth-first recursive walk would
/// find them.
pub fn validate_document(document: &Value) -> DiffResult<bool> {
    let mut stack = vec![Visit::Node(document, Path::root())];

    while let Some(visit) = stack.pop() {
        let (value, path) = match visit {
            Visit::Property(name, value, path) => {
                validate_property(name, value, &path)?;
                continue;
            }
            Visit::Element(value, path) if value.is_array() => {
                return Err(DiffError::NestedArray {
                    path,
                    value: value.clone(),
                });
            }
            Visit::Element(value, path) | Visit::Node(value, path) => (value, path),
        };

        match value {
            Value::Array(items) => {
                for (index, item) in items.iter().enumerate().rev() {
                    stack.push(Visit::Element(item, path.child(index)));
                }
            }
            Value::Object(map) => {
                for (key, child) in map.iter().rev() {
                    if is_root_metadata(key, &path) {
                        continue;
                    }
                    stack.push(Visit::Node(child, path.child(PathSegment::from(key.as_str()))));
                    stack.push(Visit::Property(key, child, path.clone()));
                }
            }
            _ => {}
        }
    }

    Ok(true)
}
