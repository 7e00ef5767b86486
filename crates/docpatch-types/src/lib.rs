//! Foundation types for docpatch.
//!
//! Every other docpatch crate depends on `docpatch-types`.
//!
//! # Key Types
//!
//! - [`Path`] / [`PathSegment`] -- Location inside a document and its canonical string encoding
//! - [`Patch`] -- Intermediate edit instruction (set / unset / insert / diffMatchPatch)
//! - [`Mutation`] / [`Operation`] -- Serialized, document-addressed change for the backend

pub mod error;
pub mod mutation;
pub mod patch;
pub mod path;

pub use error::PathError;
pub use mutation::{InsertOperation, Mutation, Operation, PatchMutation};
pub use patch::Patch;
pub use path::{is_dottable, Path, PathSegment};
