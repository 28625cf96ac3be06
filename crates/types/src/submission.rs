use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

use crate::value::Value;
use crate::workflow::Workflow;

/// Lifecycle status of a submission, as tracked by the submission registry.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub enum SubmissionStatus {
    Accepted,
    Running,
    Success,
    PartialSuccess,
    Error,
}

impl SubmissionStatus {
    pub fn is_terminal(&self) -> bool {
        matches!(self, SubmissionStatus::Success | SubmissionStatus::PartialSuccess | SubmissionStatus::Error)
    }
}

/// Lifecycle status of a single process chain, as tracked by the process
/// chain registry.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub enum ProcessChainStatus {
    Registered,
    Running,
    Success,
    Error,
}

impl ProcessChainStatus {
    pub fn is_terminal(&self) -> bool {
        matches!(self, ProcessChainStatus::Success | ProcessChainStatus::Error)
    }
}

/// A workflow submission: the unit of work the controller drives to
/// completion.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Submission {
    pub id: String,
    pub workflow: Workflow,
    pub status: SubmissionStatus,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub start_time: Option<DateTime<Utc>>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub end_time: Option<DateTime<Utc>>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub results: Option<Value>,
}

impl Submission {
    pub fn new(id: impl Into<String>, workflow: Workflow) -> Self {
        Self { id: id.into(), workflow, status: SubmissionStatus::Accepted, start_time: None, end_time: None, results: None }
    }
}
