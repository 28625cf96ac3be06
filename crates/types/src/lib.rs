//! Shared, value-typed, serializable data model for the flowc workflow
//! compiler and its controller.
//!
//! Everything in this crate is a plain data type: no I/O, no logging, no
//! registry access. `flowc-compiler` mutates these types; `flowc-registry`
//! and `flowc-controller` persist and transport them.

pub mod action;
pub mod process_chain;
pub mod service;
pub mod state;
pub mod submission;
pub mod value;
pub mod variable;
pub mod workflow;

pub use action::{Action, ActionId, Direction, ExecuteAction, ForEachAction, Parameter};
pub use process_chain::{Argument, Executable, ProcessChain};
pub use service::{Cardinality, ServiceMetadata, ServiceParameter, DIRECTORY_DATA_TYPE};
pub use state::CompilerState;
pub use submission::{ProcessChainStatus, Submission, SubmissionStatus};
pub use value::Value;
pub use variable::Variable;
pub use workflow::Workflow;
