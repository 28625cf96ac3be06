use serde::{Deserialize, Serialize};

use crate::action::Direction;
use crate::value::Value;

/// Min/max bound on how many arguments a service parameter may be bound to.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub struct Cardinality {
    pub min: usize,
    pub max: usize,
}

impl Cardinality {
    pub const REQUIRED_SINGLE: Cardinality = Cardinality { min: 1, max: 1 };

    pub fn contains(&self, count: usize) -> bool {
        count >= self.min && count <= self.max
    }
}

/// One input or output slot of a service's contract.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ServiceParameter {
    pub id: String,
    pub label: String,
    pub kind: Direction,
    pub data_type: String,
    pub cardinality: Cardinality,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub default: Option<Value>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub file_suffix: Option<String>,
}

/// Tag used by [`ServiceParameter::data_type`] to mark the `mergeToDir`
/// special case.
pub const DIRECTORY_DATA_TYPE: &str = "directory";

/// Service signature as published by the (external) service-metadata
/// registry: name, invocation path, runtime, required capabilities and its
/// ordered parameter contract.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ServiceMetadata {
    pub service_id: String,
    pub name: String,
    pub path: String,
    pub runtime: String,
    #[serde(default)]
    pub required_capabilities: Vec<String>,
    pub parameters: Vec<ServiceParameter>,
}

impl ServiceMetadata {
    pub fn parameter(&self, id: &str, kind: Direction) -> Option<&ServiceParameter> {
        self.parameters.iter().find(|p| p.id == id && p.kind == kind)
    }
}
