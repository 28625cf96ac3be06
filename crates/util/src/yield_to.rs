//! The `yieldTo` operator used by the compiler's for-each output collection
//! phase: appends a round's yielded values onto a destination value with one
//! level of flattening.

use flowc_types::Value;

/// `yieldTo(dest, outputs) -> value`.
///
/// `dest` is converted to a mutable sequence (scalar wrapped, `null` treated
/// as empty); each item of `outputs` is appended, spreading one level of
/// nested array but no deeper. An empty `outputs` returns `dest` unchanged
/// (or `[]` if `dest` was absent).
pub fn yield_to(dest: Option<&Value>, outputs: &[Value]) -> Value {
    if outputs.is_empty() {
        return dest.cloned().unwrap_or(Value::Array(Vec::new()));
    }

    let mut items: Vec<Value> = match dest {
        None | Some(Value::Null) => Vec::new(),
        Some(Value::Array(existing)) => existing.clone(),
        Some(scalar) => vec![scalar.clone()],
    };

    for output in outputs {
        match output {
            Value::Array(nested) => items.extend(nested.iter().cloned()),
            other => items.push(other.clone()),
        }
    }

    Value::Array(items)
}
