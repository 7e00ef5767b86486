//! Diff engine for docpatch.
//!
//! Compares two JSON document trees and produces the mutations that turn
//! the first into the second: whole-value sets and unsets, array inserts,
//! and compact text patches for long strings.
//!
//! # Key Types
//!
//! - [`diff_patch`] -- Entry point: document-addressed [`Mutation`]s
//! - [`diff_item`] -- Intermediate [`Patch`] list for any sub-tree
//! - [`DiffOptions`] -- Id, base path, revision guard and text-patch settings
//! - [`TextDiffEngine`] / [`DiffMatchPatchEngine`] -- Pluggable text diff
//! - [`validate_document`] -- Stand-alone structural check
//!
//! ```
//! use docpatch_diff::{diff_patch, DiffOptions};
//! use serde_json::json;
//!
//! let a = json!({"_id": "x", "title": "A"});
//! let b = json!({"_id": "x", "title": "B"});
//! let mutations = diff_patch(&a, &b, &DiffOptions::default()).unwrap();
//! assert_eq!(
//!     serde_json::to_value(&mutations).unwrap(),
//!     json!([{"patch": {"id": "x", "set": {"title": "B"}}}]),
//! );
//! ```

pub mod diff_patch;
mod differ;
pub mod error;
pub mod options;
pub mod serialize;
pub mod text_diff;
pub mod text_patch;
pub mod validate;

#[cfg(test)]
mod apply;
#[cfg(test)]
mod fixtures;

pub use diff_patch::{diff_item, diff_patch, diff_patch_with_engine};
pub use docpatch_types::{Mutation, Operation, Patch, Path, PathSegment};
pub use error::{DiffError, DiffResult};
pub use options::{DiffOptions, RevisionGuard, TextPatchOptions};
pub use serialize::serialize_patches;
pub use text_diff::{DiffMatchPatchEngine, TextDiffEngine, TextDiffError, TextOp, TextOpKind};
pub use validate::{validate_document, validate_property};
