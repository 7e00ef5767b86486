//! Intermediate patch instructions produced by the tree differ.
//!
//! These are not yet addressed at a document; see [`crate::mutation`] for
//! the serialized form.

use serde::Serialize;
use serde_json::Value;

use crate::path::Path;

/// A single edit instruction, in discovery order.
#[derive(Clone, Debug, PartialEq, Serialize)]
#[serde(tag = "op", rename_all = "camelCase")]
pub enum Patch {
    /// Replace the whole value at `path`.
    Set { path: Path, value: Value },
    /// Remove the whole value at `path`.
    Unset { path: Path },
    /// Insert `items` immediately after the array element at `after`.
    #[serde(rename = "insert")]
    InsertAfter { after: Path, items: Vec<Value> },
    /// Apply a serialized text delta to the string at `path`.
    DiffMatchPatch { path: Path, value: String },
}

impl Patch {
    /// The path this patch targets (the anchor for inserts).
    pub fn path(&self) -> &Path {
        match self {
            Self::Set { path, .. } | Self::Unset { path } | Self::DiffMatchPatch { path, .. } => {
                path
            }
            Self::InsertAfter { after, .. } => after,
        }
    }

    /// Short name of the operation, as used on the wire.
    pub fn op_name(&self) -> &'static str {
        match self {
            Self::Set { .. } => "set",
            Self::Unset { .. } => "unset",
            Self::InsertAfter { .. } => "insert",
            Self::DiffMatchPatch { .. } => "diffMatchPatch",
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::path::PathSegment;
    use serde_json::json;

    #[test]
    fn path_of_each_variant() {
        let p = Path::root().child("title");
        let set = Patch::Set { path: p.clone(), value: json!("B") };
        let insert = Patch::InsertAfter { after: p.child(0usize), items: vec![json!(1)] };
        assert_eq!(set.path(), &p);
        assert_eq!(insert.path().last(), Some(&PathSegment::Index(0)));
        assert_eq!(insert.op_name(), "insert");
    }

    #[test]
    fn serializes_with_op_tag() {
        let patch = Patch::Unset { path: Path::root().child("a").child(PathSegment::key("k")) };
        assert_eq!(
            serde_json::to_value(&patch).unwrap(),
            json!({"op": "unset", "path": ["a", {"_key": "k"}]})
        );

        let dmp = Patch::DiffMatchPatch { path: Path::root().child("body"), value: "@@".into() };
        assert_eq!(serde_json::to_value(&dmp).unwrap()["op"], json!("diffMatchPatch"));
    }
}
