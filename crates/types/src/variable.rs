use serde::{Deserialize, Serialize};

use crate::value::Value;

/// A named data carrier.
///
/// Two `Variable` instances with the same `id` denote the same logical
/// variable. `id` collisions between otherwise-unrelated variables are
/// forbidden; the compiler assumes the caller (or its own unrolling step)
/// never produces one.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Variable {
    pub id: String,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub value: Option<Value>,
}

impl Variable {
    pub fn new(id: impl Into<String>) -> Self {
        Self { id: id.into(), value: None }
    }

    pub fn with_value(id: impl Into<String>, value: Value) -> Self {
        Self { id: id.into(), value: Some(value) }
    }

    /// Derive the unrolled identity `id$iteration` for this variable.
    pub fn unrolled(&self, iteration: u64) -> Variable {
        Variable { id: format!("{}${}", self.id, iteration), value: self.value.clone() }
    }
}
