//! Document paths and their canonical string encoding.
//!
//! A [`Path`] addresses a location inside one document. The string form
//! produced by [`Path::encode`] is the path micro-language understood by the
//! mutation backend, so it must stay byte-for-byte stable:
//!
//! | segment | encoding |
//! |---------|----------|
//! | property `title` | `title` (`.title` after the first segment) |
//! | property `a-b` | `['a-b']` |
//! | index `3` | `[3]` |
//! | key `abc` | `[_key=="abc"]` |
//! | range `2..` | `[2:]` |

use std::fmt::{self, Write as _};

use serde::de::Error as _;
use serde::{Deserialize, Deserializer, Serialize, Serializer};
use serde_json::{Map, Value};

use crate::error::PathError;

/// A single step in a [`Path`].
#[derive(Clone, Debug, PartialEq, Eq, Hash)]
pub enum PathSegment {
    /// An object property.
    Property(String),
    /// An array position. Negative values count from the end; `-1` is the
    /// insertion anchor for an empty array.
    Index(i64),
    /// An array element addressed by its `_key`.
    Key(String),
    /// An array slice `[from:to]`; an absent bound is open.
    Range(Option<u64>, Option<u64>),
}

impl PathSegment {
    /// Key-reference segment for an array element.
    pub fn key(key: impl Into<String>) -> Self {
        Self::Key(key.into())
    }

    /// Range segment with optional bounds.
    pub fn range(from: Option<u64>, to: Option<u64>) -> Self {
        Self::Range(from, to)
    }

    /// The property name, if this is a property segment.
    pub fn as_property(&self) -> Option<&str> {
        match self {
            Self::Property(name) => Some(name),
            _ => None,
        }
    }

    /// Convert this segment back into its loose JSON form.
    pub fn to_value(&self) -> Value {
        match self {
            Self::Property(name) => Value::String(name.clone()),
            Self::Index(index) => Value::from(*index),
            Self::Key(key) => {
                let mut map = Map::new();
                map.insert("_key".into(), Value::String(key.clone()));
                Value::Object(map)
            }
            Self::Range(from, to) => Value::Array(vec![bound_to_value(*from), bound_to_value(*to)]),
        }
    }

    fn write_to(&self, out: &mut String, position: usize) {
        // Writing into a String cannot fail.
        let _ = match self {
            Self::Range(from, to) => {
                write!(out, "[{}:{}]", bound_to_string(*from), bound_to_string(*to))
            }
            Self::Key(key) => write!(out, "[_key==\"{key}\"]"),
            Self::Index(index) => write!(out, "[{index}]"),
            Self::Property(name) if !is_dottable(name) => write!(out, "['{name}']"),
            Self::Property(name) if position == 0 => write!(out, "{name}"),
            Self::Property(name) => write!(out, ".{name}"),
        };
    }
}

impl From<&str> for PathSegment {
    fn from(name: &str) -> Self {
        Self::Property(name.to_string())
    }
}

impl From<String> for PathSegment {
    fn from(name: String) -> Self {
        Self::Property(name)
    }
}

impl From<i64> for PathSegment {
    fn from(index: i64) -> Self {
        Self::Index(index)
    }
}

impl From<usize> for PathSegment {
    fn from(index: usize) -> Self {
        Self::Index(index as i64)
    }
}

impl TryFrom<&Value> for PathSegment {
    type Error = PathError;

    /// Accepts `"name"`, `3`, `{"_key": "abc"}` and `[from, to]` where either
    /// bound may be `""`.
    fn try_from(value: &Value) -> Result<Self, Self::Error> {
        let unsupported = || PathError::UnsupportedSegment(value.clone());
        match value {
            Value::String(name) => Ok(Self::Property(name.clone())),
            Value::Number(n) => n.as_i64().map(Self::Index).ok_or_else(unsupported),
            Value::Object(map) => match (map.len(), map.get("_key")) {
                (1, Some(Value::String(key))) => Ok(Self::Key(key.clone())),
                _ => Err(unsupported()),
            },
            Value::Array(bounds) => match bounds.as_slice() {
                [from, to] => {
                    let from = bound_from_value(from).ok_or_else(unsupported)?;
                    let to = bound_from_value(to).ok_or_else(unsupported)?;
                    Ok(Self::Range(from, to))
                }
                _ => Err(unsupported()),
            },
            Value::Null | Value::Bool(_) => Err(unsupported()),
        }
    }
}

impl Serialize for PathSegment {
    fn serialize<S: Serializer>(&self, serializer: S) -> Result<S::Ok, S::Error> {
        self.to_value().serialize(serializer)
    }
}

impl<'de> Deserialize<'de> for PathSegment {
    fn deserialize<D: Deserializer<'de>>(deserializer: D) -> Result<Self, D::Error> {
        let value = Value::deserialize(deserializer)?;
        Self::try_from(&value).map_err(D::Error::custom)
    }
}

/// An ordered list of segments addressing a node inside a document.
///
/// The empty path is the document root.
#[derive(Clone, Debug, Default, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(transparent)]
pub struct Path(Vec<PathSegment>);

impl Path {
    /// The document root.
    pub fn root() -> Self {
        Self::default()
    }

    /// Parse a path from its loose JSON form, e.g. `["items", {"_key": "a"}, 0]`.
    pub fn from_value(value: &Value) -> Result<Self, PathError> {
        match value {
            Value::Array(items) => items
                .iter()
                .map(PathSegment::try_from)
                .collect::<Result<Vec<_>, _>>()
                .map(Self),
            other => Err(PathError::NotAnArray(other.clone())),
        }
    }

    /// Returns `true` for the document root.
    pub fn is_root(&self) -> bool {
        self.0.is_empty()
    }

    /// Number of segments.
    pub fn len(&self) -> usize {
        self.0.len()
    }

    /// Returns `true` if the path has no segments.
    pub fn is_empty(&self) -> bool {
        self.0.is_empty()
    }

    /// The segments, root first.
    pub fn segments(&self) -> &[PathSegment] {
        &self.0
    }

    /// The trailing segment.
    pub fn last(&self) -> Option<&PathSegment> {
        self.0.last()
    }

    /// Append a segment in place.
    pub fn push(&mut self, segment: impl Into<PathSegment>) {
        self.0.push(segment.into());
    }

    /// A new path one segment deeper.
    pub fn child(&self, segment: impl Into<PathSegment>) -> Self {
        let mut segments = Vec::with_capacity(self.0.len() + 1);
        segments.extend_from_slice(&self.0);
        segments.push(segment.into());
        Self(segments)
    }

    /// The canonical string form of this path.
    pub fn encode(&self) -> String {
        let mut out = String::new();
        for (position, segment) in self.0.iter().enumerate() {
            segment.write_to(&mut out, position);
        }
        out
    }
}

impl fmt::Display for Path {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&self.encode())
    }
}

impl From<Vec<PathSegment>> for Path {
    fn from(segments: Vec<PathSegment>) -> Self {
        Self(segments)
    }
}

impl FromIterator<PathSegment> for Path {
    fn from_iter<I: IntoIterator<Item = PathSegment>>(iter: I) -> Self {
        Self(iter.into_iter().collect())
    }
}

/// Returns `true` if `name` can be written with dot notation
/// (`[A-Za-z_][A-Za-z0-9_]*`).
pub fn is_dottable(name: &str) -> bool {
    let mut chars = name.chars();
    match chars.next() {
        Some(first) if first.is_ascii_alphabetic() || first == '_' => {
            chars.all(|c| c.is_ascii_alphanumeric() || c == '_')
        }
        _ => false,
    }
}

fn bound_to_string(bound: Option<u64>) -> String {
    bound.map(|b| b.to_string()).unwrap_or_default()
}

fn bound_to_value(bound: Option<u64>) -> Value {
    bound.map_or_else(|| Value::String(String::new()), Value::from)
}

fn bound_from_value(value: &Value) -> Option<Option<u64>> {
    match value {
        Value::String(s) if s.is_empty() => Some(None),
        Value::Number(n) => n.as_u64().map(Some),
        _ => None,
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use proptest::prelude::*;
    use serde_json::json;

    fn path(segments: Vec<PathSegment>) -> Path {
        Path::from(segments)
    }

    #[test]
    fn root_encodes_empty() {
        assert_eq!(Path::root().encode(), "");
        assert!(Path::root().is_root());
    }

    #[test]
    fn dotted_properties() {
        let p = path(vec!["author".into(), "name".into()]);
        assert_eq!(p.encode(), "author.name");
    }

    #[test]
    fn bracketed_properties() {
        let p = path(vec!["meta".into(), "a-b".into()]);
        assert_eq!(p.encode(), "meta['a-b']");

        let leading = path(vec!["13".into()]);
        assert_eq!(leading.encode(), "['13']");
    }

    #[test]
    fn index_key_and_range() {
        let p = path(vec![
            "items".into(),
            PathSegment::key("k2"),
            "tags".into(),
            PathSegment::Index(1),
        ]);
        assert_eq!(p.encode(), "items[_key==\"k2\"].tags[1]");

        let range = path(vec!["tags".into(), PathSegment::range(Some(3), None)]);
        assert_eq!(range.encode(), "tags[3:]");

        let closed = path(vec!["tags".into(), PathSegment::range(None, Some(2))]);
        assert_eq!(closed.encode(), "tags[:2]");
    }

    #[test]
    fn negative_index_anchor() {
        let p = Path::root().child("tags").child(-1i64);
        assert_eq!(p.to_string(), "tags[-1]");
    }

    #[test]
    fn first_segment_index_has_no_dot_after() {
        let p = path(vec![PathSegment::Index(0), "title".into()]);
        assert_eq!(p.encode(), "[0].title");
    }

    #[test]
    fn from_value_accepts_all_shapes() {
        let p = Path::from_value(&json!(["items", {"_key": "abc"}, 2, [1, ""]])).unwrap();
        assert_eq!(
            p.segments(),
            &[
                PathSegment::from("items"),
                PathSegment::key("abc"),
                PathSegment::Index(2),
                PathSegment::range(Some(1), None),
            ]
        );
    }

    #[test]
    fn from_value_rejects_unsupported_segment() {
        let err = Path::from_value(&json!(["foo", {"foo": "bar"}, "blah"])).unwrap_err();
        assert_eq!(err, PathError::UnsupportedSegment(json!({"foo": "bar"})));

        let err = Path::from_value(&json!("foo")).unwrap_err();
        assert!(matches!(err, PathError::NotAnArray(_)));

        assert!(Path::from_value(&json!([true])).is_err());
        assert!(Path::from_value(&json!([[1, 2, 3]])).is_err());
    }

    #[test]
    fn serde_uses_loose_form() {
        let p = path(vec!["a".into(), PathSegment::key("k"), PathSegment::range(Some(0), None)]);
        let json = serde_json::to_value(&p).unwrap();
        assert_eq!(json, json!(["a", {"_key": "k"}, [0, ""]]));
        let parsed: Path = serde_json::from_value(json).unwrap();
        assert_eq!(parsed, p);
    }

    #[test]
    fn dottable_rules() {
        assert!(is_dottable("title"));
        assert!(is_dottable("_key"));
        assert!(is_dottable("a1_b2"));
        assert!(!is_dottable(""));
        assert!(!is_dottable("1a"));
        assert!(!is_dottable("a-b"));
        assert!(!is_dottable("feeling💩today"));
    }

    fn arb_segment() -> impl Strategy<Value = PathSegment> {
        prop_oneof![
            "[a-zA-Z_][a-zA-Z0-9_]{0,8}".prop_map(PathSegment::Property),
            "[a-z -]{1,8}".prop_map(PathSegment::Property),
            (0i64..1000).prop_map(PathSegment::Index),
            "[a-z0-9]{2,8}".prop_map(PathSegment::Key),
            (proptest::option::of(0u64..50), proptest::option::of(0u64..50))
                .prop_map(|(from, to)| PathSegment::Range(from, to)),
        ]
    }

    proptest! {
        #[test]
        fn encoding_is_deterministic_and_prefix_stable(
            segments in proptest::collection::vec(arb_segment(), 0..8),
            extra in arb_segment(),
        ) {
            let p = Path::from(segments);
            prop_assert_eq!(p.encode(), p.encode());
            let longer = p.child(extra);
            prop_assert!(longer.encode().starts_with(&p.encode()));
        }

        #[test]
        fn loose_form_roundtrips(segments in proptest::collection::vec(arb_segment(), 0..8)) {
            let p = Path::from(segments);
            let parsed = Path::from_value(&serde_json::to_value(&p).unwrap()).unwrap();
            prop_assert_eq!(parsed, p);
        }
    }
}
