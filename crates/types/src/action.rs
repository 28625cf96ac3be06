//! Action graph nodes.
//!
//! An [`Action`] is a tagged variant with two shapes: [`ExecuteAction`] (a
//! leaf service call) and [`ForEachAction`] (an iteration construct whose
//! body is itself an ordered sequence of actions, possibly nested
//! `ForEach`es).

use std::sync::atomic::{AtomicU64, Ordering};

use serde::{Deserialize, Serialize};

use crate::variable::Variable;

/// Synthetic per-copy identity for an action.
///
/// Rust values don't carry the kind of object identity the source algorithm
/// relies on to tell apart two content-equal actions produced by unrolling
/// (see the "identity vs equality" design note); this newtype is minted once
/// per action instance (original or unrolled copy) and used as the key for
/// the pending-actions collection instead of structural equality.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
pub struct ActionId(pub u64);

static NEXT_ACTION_ID: AtomicU64 = AtomicU64::new(1);

impl ActionId {
    pub fn fresh() -> Self {
        ActionId(NEXT_ACTION_ID.fetch_add(1, Ordering::Relaxed))
    }
}

/// Direction of a [`Parameter`] within an [`ExecuteAction`].
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "UPPERCASE")]
pub enum Direction {
    Input,
    Output,
}

/// One input or output binding of an [`ExecuteAction`] to a [`Variable`].
///
/// `prefix` and `store` are only meaningful for output parameters: `store`
/// chooses whether the materialized value lands under the durable `outPath`
/// or the scratch `tmpPath`, and `prefix` optionally overrides the output
/// path's directory component.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Parameter {
    pub id: String,
    pub variable: Variable,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub prefix: Option<String>,
    #[serde(default)]
    pub store: bool,
}

impl Parameter {
    pub fn new(id: impl Into<String>, variable: Variable) -> Self {
        Self { id: id.into(), variable, prefix: None, store: false }
    }
}

/// A leaf service invocation: `serviceId` plus ordered input/output
/// parameter bindings.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ExecuteAction {
    pub action_id: ActionId,
    pub service_id: String,
    pub inputs: Vec<Parameter>,
    pub outputs: Vec<Parameter>,
}

impl ExecuteAction {
    pub fn new(service_id: impl Into<String>) -> Self {
        Self { action_id: ActionId::fresh(), service_id: service_id.into(), inputs: Vec::new(), outputs: Vec::new() }
    }
}

/// An iteration construct.
///
/// `yield_to_output` names a variable inside `actions` whose per-iteration
/// value is appended to `output` (the parent's collected result); distinct
/// from `yield_to_input`, whose per-iteration value is appended back onto
/// `input`, enabling a recursive/self-feeding for-each.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ForEachAction {
    pub action_id: ActionId,
    pub input: Variable,
    pub enumerator: Variable,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub output: Option<Variable>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub yield_to_output: Option<Variable>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub yield_to_input: Option<Variable>,
    pub actions: Vec<Action>,
}

impl ForEachAction {
    pub fn new(input: Variable, enumerator: Variable) -> Self {
        Self {
            action_id: ActionId::fresh(),
            input,
            enumerator,
            output: None,
            yield_to_output: None,
            yield_to_input: None,
            actions: Vec::new(),
        }
    }
}

/// Polymorphic workflow graph node.
///
/// Any variant outside `Execute`/`ForEach` encountered during unrolling is
/// rejected with `unsupported action`; there is deliberately no catch-all
/// arm so a future variant fails to compile here rather than being silently
/// ignored at runtime.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(tag = "kind")]
pub enum Action {
    Execute(ExecuteAction),
    ForEach(ForEachAction),
}

impl Action {
    pub fn action_id(&self) -> ActionId {
        match self {
            Action::Execute(a) => a.action_id,
            Action::ForEach(a) => a.action_id,
        }
    }
}
