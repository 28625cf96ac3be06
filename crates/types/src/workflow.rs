use serde::{Deserialize, Serialize};

use crate::action::Action;
use crate::variable::Variable;

/// Immutable input to the compiler: declared variables (which may carry
/// literal values) and the ordered set of root actions.
///
/// The compiler takes ownership of a working copy at construction time; the
/// `Workflow` itself is never mutated afterward.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize, Default)]
pub struct Workflow {
    pub vars: Vec<Variable>,
    pub actions: Vec<Action>,
}

impl Workflow {
    pub fn new(vars: Vec<Variable>, actions: Vec<Action>) -> Self {
        Self { vars, actions }
    }
}
