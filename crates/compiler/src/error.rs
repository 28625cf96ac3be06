//! The compiler's error taxonomy.
//!
//! Each variant corresponds to one row of the error taxonomy table: these
//! are the kinds a [`crate::Compiler::generate`] call can surface to its
//! caller. `MissingInput` is deliberately *not* one of these surfaced kinds
//! in the common case — see the note on [`crate::fuse`] for why a
//! not-yet-resolvable required input during fusion is treated as "try again
//! next round" rather than propagated.

use flowc_types::ActionId;
use thiserror::Error;

#[derive(Debug, Error, Clone, PartialEq)]
pub enum CompileError {
    #[error("invalid workflow: {0}")]
    InvalidWorkflow(String),

    #[error("unknown service: {0}")]
    UnknownService(String),

    #[error("missing input for action {action:?}, parameter {param}")]
    MissingInput { action: ActionId, param: String },

    #[error("cardinality violation for parameter {param}: expected [{min},{max}], got {got}")]
    Cardinality { param: String, min: usize, max: usize, got: usize },

    #[error("unsupported action: {0}")]
    UnsupportedAction(String),
}
