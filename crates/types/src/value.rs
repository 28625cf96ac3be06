//! The JSON-like value domain shared by variables, arguments and the
//! compiler's persisted state.
//!
//! Scalars, ordered sequences and mappings all round-trip through
//! `serde_json::Value` without loss, which is what `SaveState`/`LoadState`
//! require: the scalar/sequence distinction must survive a save/load cycle
//! exactly.

/// Alias kept distinct from `serde_json::Value` so call sites read as
/// domain code rather than "just JSON".
pub type Value = serde_json::Value;

/// Normalize a value to an ordered sequence, wrapping scalars in a
/// singleton and leaving `null` as an empty sequence.
pub fn to_sequence(value: &Value) -> Vec<Value> {
    match value {
        Value::Null => Vec::new(),
        Value::Array(items) => items.clone(),
        other => vec![other.clone()],
    }
}

/// Flatten a value to a sequence of stringified scalars, recursing one
/// level into nested arrays (mappings are stringified as a whole).
pub fn to_string_collection(value: &Value) -> Vec<String> {
    match value {
        Value::Null => Vec::new(),
        Value::Array(items) => items.iter().flat_map(to_string_collection).collect(),
        Value::String(s) => vec![s.clone()],
        Value::Bool(b) => vec![b.to_string()],
        Value::Number(n) => vec![n.to_string()],
        Value::Object(_) => vec![value.to_string()],
    }
}
