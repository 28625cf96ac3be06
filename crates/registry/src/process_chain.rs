use async_trait::async_trait;
use flowc_types::{ProcessChain, ProcessChainStatus, Value};

use crate::error::RegistryError;

/// Persistence contract for process chains handed off to the external
/// agent/scheduler layer.
#[async_trait]
pub trait ProcessChainRegistry: Send + Sync {
    async fn add_process_chains(&self, submission_id: &str, chains: Vec<ProcessChain>) -> Result<(), RegistryError>;

    async fn find_by_submission_id(&self, submission_id: &str) -> Result<Vec<ProcessChain>, RegistryError>;

    /// Counts process chains belonging to `submission_id` currently in
    /// `status`; used by the controller to decide whether any chain is still
    /// outstanding before generating the next round.
    async fn count_by_status(&self, submission_id: &str, status: ProcessChainStatus) -> Result<usize, RegistryError>;

    async fn find_statuses_by_submission_id(&self, submission_id: &str) -> Result<Vec<ProcessChainStatus>, RegistryError>;

    /// Collects the output values produced by every terminal process chain
    /// belonging to `submission_id`, keyed by the variable id they feed.
    async fn get_results(&self, submission_id: &str) -> Result<indexmap::IndexMap<String, Vec<Value>>, RegistryError>;

    async fn get_status(&self, id: &str) -> Result<ProcessChainStatus, RegistryError>;

    async fn set_status(&self, id: &str, status: ProcessChainStatus) -> Result<(), RegistryError>;

    async fn get_error_message(&self, id: &str) -> Result<Option<String>, RegistryError>;

    async fn set_error_message(&self, id: &str, message: String) -> Result<(), RegistryError>;

    /// Clears a previously recorded error message; used by the controller
    /// when resetting a recovered `Running`/`Error` chain back to
    /// `Registered` so a stale message from a prior attempt doesn't linger
    /// past the reset. Default implementation in terms of `set_error_message`
    /// so existing implementations of this trait keep compiling unchanged.
    async fn clear_error_message(&self, id: &str) -> Result<(), RegistryError> {
        self.set_error_message(id, String::new()).await
    }
}
