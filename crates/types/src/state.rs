use indexmap::IndexMap;
use serde::{Deserialize, Serialize};

use crate::action::Action;
use crate::value::Value;
use crate::variable::Variable;

/// The compiler's serializable state blob.
///
/// Top-level keys are exactly `vars`, `actions`, `variable_values`,
/// `for_each_outputs_to_be_collected`, `iterations` per the opaque state
/// blob contract; a round-trip through `save_state`/`load_state` must be
/// lossless.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize, Default)]
pub struct CompilerState {
    pub vars: Vec<Variable>,
    pub actions: Vec<Action>,
    pub variable_values: IndexMap<String, Value>,
    pub for_each_outputs_to_be_collected: IndexMap<String, Vec<Variable>>,
    pub iterations: IndexMap<String, u64>,
}
