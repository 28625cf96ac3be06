use std::collections::BTreeSet;

use serde::{Deserialize, Serialize};

use crate::action::Direction;
use crate::value::Value;

/// A single materialized argument of an [`Executable`].
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Argument {
    pub param_id: String,
    pub label: String,
    pub variable_id: String,
    pub value: Value,
    pub direction: Direction,
    pub data_type: String,
}

/// One concrete invocation: a service path plus its materialized
/// arguments and runtime requirements.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Executable {
    pub service_id: String,
    pub service_name: String,
    pub path: String,
    pub arguments: Vec<Argument>,
    pub runtime: String,
    #[serde(default)]
    pub runtime_arguments: Vec<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub retries: Option<u32>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub max_runtime_ms: Option<u64>,
}

/// The scheduling primitive handed to the external agent/scheduler layer: a
/// non-empty, ordered, immutable sequence of [`Executable`]s plus the union
/// of their required capabilities.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ProcessChain {
    pub id: String,
    pub executables: Vec<Executable>,
    pub required_capabilities: BTreeSet<String>,
}

impl ProcessChain {
    /// Construct a chain, panicking if `executables` is empty: a process
    /// chain with no executables has no meaning downstream and indicates a
    /// compiler bug rather than a recoverable runtime condition.
    pub fn new(id: impl Into<String>, executables: Vec<Executable>) -> Self {
        assert!(!executables.is_empty(), "a ProcessChain must contain at least one Executable");
        Self { id: id.into(), executables, required_capabilities: BTreeSet::new() }
    }

    pub fn with_capabilities(mut self, caps: impl IntoIterator<Item = String>) -> Self {
        self.required_capabilities.extend(caps);
        self
    }
}
