use async_trait::async_trait;
use chrono::{DateTime, Utc};
use flowc_types::{CompilerState, Submission, SubmissionStatus, Value};

use crate::error::RegistryError;

/// Persistence contract for workflow submissions, driven by the controller's
/// per-submission loop and `LookupLoop`.
#[async_trait]
pub trait SubmissionRegistry: Send + Sync {
    /// Atomically claims and returns the next `Accepted` submission, if any,
    /// transitioning it to `Running` as part of the same operation so two
    /// concurrent lookups never hand out the same submission.
    async fn fetch_next(&self) -> Result<Option<Submission>, RegistryError>;

    async fn find_by_id(&self, id: &str) -> Result<Submission, RegistryError>;

    async fn find_ids_by_status(&self, status: SubmissionStatus) -> Result<Vec<String>, RegistryError>;

    async fn get_status(&self, id: &str) -> Result<SubmissionStatus, RegistryError>;

    async fn set_status(&self, id: &str, status: SubmissionStatus) -> Result<(), RegistryError>;

    async fn set_start_time(&self, id: &str, at: DateTime<Utc>) -> Result<(), RegistryError>;

    async fn set_end_time(&self, id: &str, at: DateTime<Utc>) -> Result<(), RegistryError>;

    /// Reads the compiler's opaque, serializable state blob saved by the
    /// last checkpoint, or `None` if this submission hasn't started yet.
    async fn get_execution_state(&self, id: &str) -> Result<Option<CompilerState>, RegistryError>;

    async fn set_execution_state(&self, id: &str, state: CompilerState) -> Result<(), RegistryError>;

    async fn set_results(&self, id: &str, results: Value) -> Result<(), RegistryError>;
}
