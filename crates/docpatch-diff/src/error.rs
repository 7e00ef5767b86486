//! Error types for the diff crate.

use docpatch_types::Path;
use serde_json::Value;

/// Errors that can occur while diffing documents.
///
/// All of these are input precondition violations; nothing is retried.
#[derive(Debug, thiserror::Error)]
pub enum DiffError {
    /// No explicit id was given and the two documents do not share an `_id`.
    #[error("_id on item A and item B not present or differs, specify document id the mutations should be applied to")]
    MissingId,

    /// The revision guard was set to infer, but item A has no `_rev`.
    #[error("revision guard is set to infer from the document, but no `_rev` was passed in item A; set an explicit revision or pass `_rev` as part of item A")]
    MissingRevision,

    /// The root `_type` differs between the two documents.
    #[error("_type is immutable and cannot be changed ({from} => {to})")]
    ImmutableType { from: String, to: String },

    /// An array directly contains another array.
    #[error("multi-dimensional arrays not supported (at '{path}')")]
    NestedArray { path: Path, value: Value },

    /// A property name does not match `[A-Za-z_][A-Za-z0-9_]*`.
    #[error("{reason} (at '{path}')")]
    InvalidPropertyName { path: Path, reason: &'static str },

    /// A `_key`, `_ref` or `_type` value is not an identifier-like string.
    #[error("{reason} (at '{path}')")]
    InvalidIdentityValue {
        path: Path,
        value: Value,
        reason: &'static str,
    },

    /// The documents nest deeper than the configured limit.
    #[error("maximum nesting depth of {limit} exceeded (at '{path}')")]
    DepthExceeded { path: Path, limit: usize },
}

impl DiffError {
    /// The offending location, for errors tied to one.
    pub fn path(&self) -> Option<&Path> {
        match self {
            Self::NestedArray { path, .. }
            | Self::InvalidPropertyName { path, .. }
            | Self::InvalidIdentityValue { path, .. }
            | Self::DepthExceeded { path, .. } => Some(path),
            _ => None,
        }
    }

    /// The offending value, where one is recorded.
    pub fn value(&self) -> Option<&Value> {
        match self {
            Self::NestedArray { value, .. } | Self::InvalidIdentityValue { value, .. } => {
                Some(value)
            }
            _ => None,
        }
    }
}

/// Convenience alias for diff results.
pub type DiffResult<T> = Result<T, DiffError>;
