//! Backend-addressable mutations.
//!
//! A [`Mutation`] wraps exactly one operation for one document:
//!
//! ```json
//! {"patch": {"id": "x", "set": {"title": "B"}, "ifRevisionID": "r1"}}
//! ```

use serde::{Deserialize, Serialize};
use serde_json::{Map, Value};

/// One serialized mutation, ready for the transport layer.
#[derive(Clone, Debug, PartialEq, Serialize, Deserialize)]
pub struct Mutation {
    pub patch: PatchMutation,
}

/// The body of a patch mutation.
#[derive(Clone, Debug, PartialEq, Serialize, Deserialize)]
pub struct PatchMutation {
    /// Target document id.
    pub id: String,
    #[serde(flatten)]
    pub operation: Operation,
    /// Optimistic-concurrency guard: the revision the document must be at.
    #[serde(
        rename = "ifRevisionID",
        default,
        skip_serializing_if = "Option::is_none"
    )]
    pub if_revision_id: Option<String>,
}

/// The operation carried by a mutation.
#[derive(Clone, Debug, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub enum Operation {
    /// Encoded path to replacement value.
    Set(Map<String, Value>),
    /// Encoded paths to remove, in discovery order.
    Unset(Vec<String>),
    /// Encoded path to patch text.
    DiffMatchPatch(Map<String, Value>),
    /// One insertion; never merged with another.
    Insert(InsertOperation),
}

/// Items inserted after an anchor path.
#[derive(Clone, Debug, PartialEq, Serialize, Deserialize)]
pub struct InsertOperation {
    pub after: String,
    pub items: Vec<Value>,
}

impl Mutation {
    /// A mutation with no revision guard.
    pub fn new(id: impl Into<String>, operation: Operation) -> Self {
        Self {
            patch: PatchMutation {
                id: id.into(),
                operation,
                if_revision_id: None,
            },
        }
    }

    /// Attach a revision guard.
    pub fn with_revision(mut self, revision: impl Into<String>) -> Self {
        self.patch.if_revision_id = Some(revision.into());
        self
    }

    /// Target document id.
    pub fn id(&self) -> &str {
        &self.patch.id
    }

    /// The carried operation.
    pub fn operation(&self) -> &Operation {
        &self.patch.operation
    }

    /// The revision guard, if any.
    pub fn if_revision_id(&self) -> Option<&str> {
        self.patch.if_revision_id.as_deref()
    }
}

impl Operation {
    /// Wire name of the operation.
    pub fn kind(&self) -> &'static str {
        match self {
            Self::Set(_) => "set",
            Self::Unset(_) => "unset",
            Self::DiffMatchPatch(_) => "diffMatchPatch",
            Self::Insert(_) => "insert",
        }
    }

    /// Encoded paths touched by this operation.
    pub fn paths(&self) -> Vec<&str> {
        match self {
            Self::Set(map) | Self::DiffMatchPatch(map) => map.keys().map(String::as_str).collect(),
            Self::Unset(paths) => paths.iter().map(String::as_str).collect(),
            Self::Insert(insert) => vec![insert.after.as_str()],
        }
    }
}
