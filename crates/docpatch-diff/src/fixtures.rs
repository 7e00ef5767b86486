//! Deeply nested documents for stack-safety tests.
//!
//! Built and torn down with explicit loops: `json!` interpolation, `Clone`
//! and the default `Drop` all recurse through the tree.

use serde_json::{Map, Value};

/// `{"<key>": {"<key>": ... leaf}}`, `depth` objects deep.
pub(crate) fn deep_chain(depth: usize, key: &str, leaf: Value) -> Value {
    let mut value = leaf;
    for _ in 0..depth {
        let mut map = Map::new();
        map.insert(key.to_string(), value);
        value = Value::Object(map);
    }
    value
}

/// Drop `value` one level at a time.
pub(crate) fn dismantle(value: Value) {
    let mut stack = vec![value];
    while let Some(value) = stack.pop() {
        match value {
            Value::Object(map) => stack.extend(map.into_iter().map(|(_, child)| child)),
            Value::Array(items) => stack.extend(items),
            _ => {}
        }
    }
}
