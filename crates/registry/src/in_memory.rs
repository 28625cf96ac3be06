//! A single in-memory reference implementation of every registry trait,
//! backed by `Mutex`-guarded `IndexMap`s (and `HashSet`s for membership-only
//! state). Grounded on the source workspace's `ProviderRegistry`
//! (`engine/src/provider/registry.rs`): one struct, several independently
//! locked collections, plain accessor methods with no surprising control
//! flow inside the lock.
//!
//! This is the ambient backend the controller and CLI exercise in tests and
//! local runs; it is not a persistence layer and does not survive process
//! restart.

use std::collections::HashSet;
use std::sync::{Arc, Mutex};
use std::time::Duration;

use async_trait::async_trait;
use chrono::{DateTime, Utc};
use flowc_types::{CompilerState, ProcessChain, ProcessChainStatus, ServiceMetadata, Submission, SubmissionStatus, Value};
use indexmap::IndexMap;
use tokio::sync::Notify;

use crate::error::RegistryError;
use crate::lease::{Lease, LeaseHandle};
use crate::plugin::PluginRegistry;
use crate::process_chain::ProcessChainRegistry;
use crate::service_metadata::ServiceMetadataRegistry;
use crate::signal::SignalBus;
use crate::submission::SubmissionRegistry;

#[derive(Debug, Clone)]
struct ChainRecord {
    chain: ProcessChain,
    submission_id: String,
    status: ProcessChainStatus,
    error_message: Option<String>,
}

#[derive(Default)]
pub struct InMemoryRegistry {
    submissions: Mutex<IndexMap<String, Submission>>,
    execution_states: Mutex<IndexMap<String, CompilerState>>,
    process_chains: Mutex<IndexMap<String, ChainRecord>>,
    chain_results: Mutex<IndexMap<String, IndexMap<String, Vec<Value>>>>,
    services: Mutex<IndexMap<String, ServiceMetadata>>,
    output_adapters: Mutex<HashSet<String>>,
    held_leases: Arc<Mutex<HashSet<String>>>,
    published: Mutex<Vec<String>>,
    notifiers: Mutex<IndexMap<String, Arc<Notify>>>,
}

impl InMemoryRegistry {
    pub fn new() -> Self {
        Self::default()
    }

    /// Seeds a submission directly, bypassing `fetch_next`'s claiming
    /// semantics; used by tests and the CLI's local-run mode to enqueue
    /// work.
    pub fn insert_submission(&self, submission: Submission) {
        self.submissions.lock().expect("submissions lock").insert(submission.id.clone(), submission);
    }

    pub fn register_service(&self, service: ServiceMetadata) {
        self.services.lock().expect("services lock").insert(service.service_id.clone(), service);
    }

    pub fn register_output_adapter(&self, data_type: impl Into<String>) {
        self.output_adapters.lock().expect("output adapters lock").insert(data_type.into());
    }

    /// Records a value the external agent/scheduler would have written back
    /// for `variable_id` after successfully running a process chain; feeds
    /// the next `get_results` call.
    pub fn record_result(&self, submission_id: &str, variable_id: &str, value: Value) {
        self.chain_results
            .lock()
            .expect("chain results lock")
            .entry(submission_id.to_string())
            .or_default()
            .entry(variable_id.to_string())
            .or_default()
            .push(value);
    }

    fn notifier_for(&self, topic: &str) -> Arc<Notify> {
        self.notifiers.lock().expect("notifiers lock").entry(topic.to_string()).or_insert_with(|| Arc::new(Notify::new())).clone()
    }

    /// Waits until `topic` is published, or returns immediately if it
    /// already has been since the last time this method drained it.
    pub async fn wait_for_signal(&self, topic: &str) {
        self.notifier_for(topic).notified().await
    }

    pub fn published_topics(&self) -> Vec<String> {
        self.published.lock().expect("published lock").clone()
    }
}

#[async_trait]
impl SubmissionRegistry for InMemoryRegistry {
    async fn fetch_next(&self) -> Result<Option<Submission>, RegistryError> {
        let mut submissions = self.submissions.lock().expect("submissions lock");
        let next = submissions.values_mut().find(|s| s.status == SubmissionStatus::Accepted);
        match next {
            Some(submission) => {
                submission.status = SubmissionStatus::Running;
                Ok(Some(submission.clone()))
            }
            None => Ok(None),
        }
    }

    async fn find_by_id(&self, id: &str) -> Result<Submission, RegistryError> {
        self.submissions.lock().expect("submissions lock").get(id).cloned().ok_or_else(|| RegistryError::NotFound(id.to_string()))
    }

    async fn find_ids_by_status(&self, status: SubmissionStatus) -> Result<Vec<String>, RegistryError> {
        Ok(self.submissions.lock().expect("submissions lock").values().filter(|s| s.status == status).map(|s| s.id.clone()).collect())
    }

    async fn get_status(&self, id: &str) -> Result<SubmissionStatus, RegistryError> {
        self.submissions.lock().expect("submissions lock").get(id).map(|s| s.status).ok_or_else(|| RegistryError::NotFound(id.to_string()))
    }

    async fn set_status(&self, id: &str, status: SubmissionStatus) -> Result<(), RegistryError> {
        let mut submissions = self.submissions.lock().expect("submissions lock");
        let submission = submissions.get_mut(id).ok_or_else(|| RegistryError::NotFound(id.to_string()))?;
        submission.status = status;
        Ok(())
    }

    async fn set_start_time(&self, id: &str, at: DateTime<Utc>) -> Result<(), RegistryError> {
        let mut submissions = self.submissions.lock().expect("submissions lock");
        let submission = submissions.get_mut(id).ok_or_else(|| RegistryError::NotFound(id.to_string()))?;
        submission.start_time = Some(at);
        Ok(())
    }

    async fn set_end_time(&self, id: &str, at: DateTime<Utc>) -> Result<(), RegistryError> {
        let mut submissions = self.submissions.lock().expect("submissions lock");
        let submission = submissions.get_mut(id).ok_or_else(|| RegistryError::NotFound(id.to_string()))?;
        submission.end_time = Some(at);
        Ok(())
    }

    async fn get_execution_state(&self, id: &str) -> Result<Option<CompilerState>, RegistryError> {
        Ok(self.execution_states.lock().expect("execution states lock").get(id).cloned())
    }

    async fn set_execution_state(&self, id: &str, state: CompilerState) -> Result<(), RegistryError> {
        self.execution_states.lock().expect("execution states lock").insert(id.to_string(), state);
        Ok(())
    }

    async fn set_results(&self, id: &str, results: Value) -> Result<(), RegistryError> {
        let mut submissions = self.submissions.lock().expect("submissions lock");
        let submission = submissions.get_mut(id).ok_or_else(|| RegistryError::NotFound(id.to_string()))?;
        submission.results = Some(results);
        Ok(())
    }
}

#[async_trait]
impl ProcessChainRegistry for InMemoryRegistry {
    async fn add_process_chains(&self, submission_id: &str, chains: Vec<ProcessChain>) -> Result<(), RegistryError> {
        let mut process_chains = self.process_chains.lock().expect("process chains lock");
        for chain in chains {
            process_chains.insert(
                chain.id.clone(),
                ChainRecord { chain, submission_id: submission_id.to_string(), status: ProcessChainStatus::Registered, error_message: None },
            );
        }
        Ok(())
    }

    async fn find_by_submission_id(&self, submission_id: &str) -> Result<Vec<ProcessChain>, RegistryError> {
        Ok(self
            .process_chains
            .lock()
            .expect("process chains lock")
            .values()
            .filter(|r| r.submission_id == submission_id)
            .map(|r| r.chain.clone())
            .collect())
    }

    async fn count_by_status(&self, submission_id: &str, status: ProcessChainStatus) -> Result<usize, RegistryError> {
        Ok(self
            .process_chains
            .lock()
            .expect("process chains lock")
            .values()
            .filter(|r| r.submission_id == submission_id && r.status == status)
            .count())
    }

    async fn find_statuses_by_submission_id(&self, submission_id: &str) -> Result<Vec<ProcessChainStatus>, RegistryError> {
        Ok(self
            .process_chains
            .lock()
            .expect("process chains lock")
            .values()
            .filter(|r| r.submission_id == submission_id)
            .map(|r| r.status)
            .collect())
    }

    async fn get_results(&self, submission_id: &str) -> Result<IndexMap<String, Vec<Value>>, RegistryError> {
        Ok(self.chain_results.lock().expect("chain results lock").get(submission_id).cloned().unwrap_or_default())
    }

    async fn get_status(&self, id: &str) -> Result<ProcessChainStatus, RegistryError> {
        self.process_chains.lock().expect("process chains lock").get(id).map(|r| r.status).ok_or_else(|| RegistryError::NotFound(id.to_string()))
    }

    async fn set_status(&self, id: &str, status: ProcessChainStatus) -> Result<(), RegistryError> {
        let mut process_chains = self.process_chains.lock().expect("process chains lock");
        let record = process_chains.get_mut(id).ok_or_else(|| RegistryError::NotFound(id.to_string()))?;
        record.status = status;
        Ok(())
    }

    async fn get_error_message(&self, id: &str) -> Result<Option<String>, RegistryError> {
        self.process_chains
            .lock()
            .expect("process chains lock")
            .get(id)
            .map(|r| r.error_message.clone())
            .ok_or_else(|| RegistryError::NotFound(id.to_string()))
    }

    async fn set_error_message(&self, id: &str, message: String) -> Result<(), RegistryError> {
        let mut process_chains = self.process_chains.lock().expect("process chains lock");
        let record = process_chains.get_mut(id).ok_or_else(|| RegistryError::NotFound(id.to_string()))?;
        record.error_message = Some(message);
        Ok(())
    }
}

#[async_trait]
impl ServiceMetadataRegistry for InMemoryRegistry {
    async fn find_services(&self, service_ids: &[String]) -> Result<Vec<ServiceMetadata>, RegistryError> {
        let services = self.services.lock().expect("services lock");
        service_ids.iter().map(|id| services.get(id).cloned().ok_or_else(|| RegistryError::NotFound(id.clone()))).collect()
    }
}

#[async_trait]
impl PluginRegistry for InMemoryRegistry {
    async fn find_output_adapter(&self, data_type: &str) -> Result<bool, RegistryError> {
        Ok(self.output_adapters.lock().expect("output adapters lock").contains(data_type))
    }
}

struct InMemoryLeaseHandle {
    name: String,
    held: Arc<Mutex<HashSet<String>>>,
}

#[async_trait]
impl LeaseHandle for InMemoryLeaseHandle {
    fn name(&self) -> &str {
        &self.name
    }

    async fn release(&self) -> Result<(), RegistryError> {
        self.held.lock().expect("held leases lock").remove(&self.name);
        Ok(())
    }
}

impl Drop for InMemoryLeaseHandle {
    fn drop(&mut self) {
        self.held.lock().expect("held leases lock").remove(&self.name);
    }
}

#[async_trait]
impl Lease for InMemoryRegistry {
    async fn try_lock(&self, name: &str, timeout: Duration) -> Result<Option<Box<dyn LeaseHandle>>, RegistryError> {
        let deadline = tokio::time::Instant::now() + timeout;
        loop {
            {
                let mut held = self.held_leases.lock().expect("held leases lock");
                if !held.contains(name) {
                    held.insert(name.to_string());
                    return Ok(Some(Box::new(InMemoryLeaseHandle { name: name.to_string(), held: Arc::clone(&self.held_leases) })));
                }
            }
            if tokio::time::Instant::now() >= deadline {
                return Ok(None);
            }
            tokio::time::sleep(Duration::from_millis(10)).await;
        }
    }
}

#[async_trait]
impl SignalBus for InMemoryRegistry {
    async fn publish(&self, topic: &str) -> Result<(), RegistryError> {
        self.published.lock().expect("published lock").push(topic.to_string());
        self.notifier_for(topic).notify_waiters();
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use flowc_types::Workflow;

    use super::*;

    #[tokio::test]
    async fn fetch_next_claims_exactly_one_accepted_submission() {
        let registry = InMemoryRegistry::new();
        registry.insert_submission(Submission::new("s1", Workflow::default()));

        let claimed = registry.fetch_next().await.expect("fetch_next").expect("a submission");
        assert_eq!(claimed.id, "s1");
        assert_eq!(registry.get_status("s1").await.expect("status"), SubmissionStatus::Running);
        assert!(registry.fetch_next().await.expect("fetch_next").is_none());
    }

    #[tokio::test]
    async fn lease_blocks_concurrent_holders_until_released() {
        let registry = InMemoryRegistry::new();
        let first = registry.try_lock("submission:s1", Duration::from_millis(50)).await.expect("try_lock").expect("acquired");
        let second = registry.try_lock("submission:s1", Duration::from_millis(20)).await.expect("try_lock");
        assert!(second.is_none(), "a held lease must not be granted twice");

        first.release().await.expect("release");
        let third = registry.try_lock("submission:s1", Duration::from_millis(50)).await.expect("try_lock");
        assert!(third.is_some(), "a released lease must become available again");
    }

    #[tokio::test]
    async fn process_chain_status_counts_scope_to_submission() {
        let registry = InMemoryRegistry::new();
        let chain = ProcessChain::new(
            "pc1",
            vec![flowc_types::Executable {
                service_id: "svc".into(),
                service_name: "svc".into(),
                path: "/bin/svc".into(),
                arguments: Vec::new(),
                runtime: "native".into(),
                runtime_arguments: Vec::new(),
                retries: None,
                max_runtime_ms: None,
            }],
        );
        registry.add_process_chains("s1", vec![chain]).await.expect("add");

        assert_eq!(registry.count_by_status("s1", ProcessChainStatus::Registered).await.expect("count"), 1);
        registry.set_status("pc1", ProcessChainStatus::Success).await.expect("set_status");
        assert_eq!(registry.count_by_status("s1", ProcessChainStatus::Registered).await.expect("count"), 0);
        assert_eq!(registry.count_by_status("s1", ProcessChainStatus::Success).await.expect("count"), 1);
    }
}
