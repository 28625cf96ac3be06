//! The per-submission driver: `ACCEPTED → {SUCCESS | PARTIAL_SUCCESS | ERROR}`,
//! tolerating process crashes via checkpointed compiler state (§4.2).
//!
//! Grounded on the source workspace's `workflow::runner::drive_workflow_run`
//! (`engine/src/workflow/runner.rs`): an async function that drives a loop
//! over prepared steps, emitting lifecycle events. This controller
//! generalizes that shape to the spec's generate→dispatch→await→feed-results
//! round loop, replacing the source's event channel (there is no UI to
//! stream to in this crate's scope) with `tracing` events, and adding the
//! lease/recovery machinery the distilled spec requires that the source's
//! single-process TUI runner didn't need.

use std::sync::Arc;
use std::time::Duration;

use chrono::Utc;
use flowc_compiler::Compiler;
use flowc_registry::{ProcessChainRegistry, SubmissionRegistry};
use flowc_types::{ProcessChainStatus, SubmissionStatus};
use flowc_util::TimeSortableIdGenerator;
use tokio::sync::Semaphore;

use crate::config::Config;
use crate::error::ControllerError;
use crate::lease_guard::LeaseGuard;
use crate::oracle_bridge::resolve_output_adapters;
use crate::registries::Registries;
use crate::workflow_services::referenced_service_ids;

/// A short acquisition timeout per §5 ("short acquisition timeout (≲1 s)").
const LEASE_ACQUIRE_TIMEOUT: Duration = Duration::from_millis(750);
/// Orphan recovery only needs to confirm no one else holds the lease right
/// now; it releases immediately either way, so it doesn't wait long.
const ORPHAN_PROBE_TIMEOUT: Duration = Duration::from_millis(200);

pub struct Controller<R: Registries> {
    registries: Arc<R>,
    config: Config,
    submission_slots: Option<Arc<Semaphore>>,
}

impl<R: Registries + 'static> Controller<R> {
    pub fn new(registries: Arc<R>, config: Config) -> Self {
        let submission_slots = config.max_concurrent_submissions.map(|n| Arc::new(Semaphore::new(n)));
        Self { registries, config, submission_slots }
    }

    pub fn config(&self) -> &Config {
        &self.config
    }

    /// Drives exactly one submission to a terminal status, acquiring and
    /// releasing its exclusive lease around the whole attempt. Returns
    /// `Err(ControllerError::LeaseUnavailable)` without touching submission
    /// state at all if another worker already owns it — per §7, this is a
    /// "skip silently" condition for callers (`discover_and_run`/
    /// `recover_orphans` both log it at `debug` and move on).
    pub async fn run_submission(&self, submission_id: &str) -> Result<SubmissionStatus, ControllerError> {
        let lease_name = format!("submission:{submission_id}");
        let handle = self
            .registries
            .try_lock(&lease_name, LEASE_ACQUIRE_TIMEOUT)
            .await?
            .ok_or_else(|| ControllerError::LeaseUnavailable(submission_id.to_string()))?;
        let guard = LeaseGuard::new(handle);

        let outcome = self.drive_submission(submission_id).await;
        guard.release().await;

        match outcome {
            Ok(status) => Ok(status),
            Err(error) => {
                tracing::error!(submission_id, %error, "submission loop failed");
                let _ = SubmissionRegistry::set_status(&*self.registries, submission_id, SubmissionStatus::Error).await;
                let _ = self.registries.set_end_time(submission_id, Utc::now()).await;
                Err(error)
            }
        }
    }

    async fn drive_submission(&self, submission_id: &str) -> Result<SubmissionStatus, ControllerError> {
        let submission = self.registries.find_by_id(submission_id).await?;

        if submission.status == SubmissionStatus::Accepted {
            SubmissionRegistry::set_status(&*self.registries, submission_id, SubmissionStatus::Running).await?;
            self.registries.set_start_time(submission_id, Utc::now()).await?;
        }

        let service_ids = referenced_service_ids(&submission.workflow);
        let services = self.registries.find_services(&service_ids).await?;
        let oracle = resolve_output_adapters(&*self.registries, &services).await?;

        let mut compiler = Compiler::new(
            submission.workflow,
            self.config.tmp_path.clone(),
            self.config.out_path.clone(),
            services,
            Box::new(oracle),
            Box::new(TimeSortableIdGenerator),
        );

        let existing_state = self.registries.get_execution_state(submission_id).await?;
        let mut resumed_batch = match existing_state {
            Some(state) => {
                compiler.load_state(state);
                Some(self.reset_recovered_chains(submission_id).await?)
            }
            None => None,
        };

        loop {
            let batch = match resumed_batch.take() {
                Some(batch) => batch,
                None => {
                    let results = self.registries.get_results(submission_id).await?;
                    let chains = compiler.generate(results)?;
                    if chains.is_empty() {
                        break;
                    }
                    let ids: Vec<String> = chains.iter().map(|c| c.id.clone()).collect();
                    self.registries.add_process_chains(submission_id, chains).await?;
                    self.registries.set_execution_state(submission_id, compiler.save_state()).await?;
                    self.registries.publish("process-chains").await?;
                    tracing::info!(submission_id, chain_count = ids.len(), "generated process chains");
                    ids
                }
            };

            self.await_batch_terminal(&batch).await?;
        }

        self.finalize(submission_id, &compiler).await
    }

    /// Restores the recovery batch: every process chain already persisted
    /// for this submission, with any `Running`/`Error` chain reset to
    /// `Registered` (clearing its prior error message) so the await loop
    /// below treats it as outstanding work rather than a stale terminal
    /// result from before the crash.
    async fn reset_recovered_chains(&self, submission_id: &str) -> Result<Vec<String>, ControllerError> {
        let recovered = self.registries.find_by_submission_id(submission_id).await?;
        let mut ids = Vec::with_capacity(recovered.len());
        for chain in recovered {
            let status = ProcessChainRegistry::get_status(&*self.registries, &chain.id).await?;
            if matches!(status, ProcessChainStatus::Running | ProcessChainStatus::Error) {
                ProcessChainRegistry::set_status(&*self.registries, &chain.id, ProcessChainStatus::Registered).await?;
                self.registries.clear_error_message(&chain.id).await?;
            }
            ids.push(chain.id);
        }
        tracing::info!(submission_id, recovered = ids.len(), "resumed submission from checkpointed state");
        Ok(ids)
    }

    /// Polls every chain in `batch` at the configured lookup interval until
    /// all have reached a terminal status. The compiler never sees partial
    /// results mid-batch; `drive_submission` re-reads the accumulated
    /// results from the registry once the whole batch is terminal.
    async fn await_batch_terminal(&self, batch: &[String]) -> Result<(), ControllerError> {
        if batch.is_empty() {
            return Ok(());
        }
        loop {
            let mut all_terminal = true;
            for id in batch {
                if !ProcessChainRegistry::get_status(&*self.registries, id).await?.is_terminal() {
                    all_terminal = false;
                    break;
                }
            }
            if all_terminal {
                return Ok(());
            }
            tokio::time::sleep(self.config.lookup_interval()).await;
        }
    }

    /// Terminal-status decision table from §4.2: `IsFinished` is the gate,
    /// then the ratio of `Error`-status chains to the total ever emitted for
    /// this submission decides among SUCCESS/PARTIAL_SUCCESS/ERROR. A
    /// compiler that exits the loop unfinished (it should only do so by
    /// returning an error, which already short-circuits above) is itself an
    /// ERROR per §4.2's "not executed completely" clause, defensively
    /// covered here too.
    async fn finalize(&self, submission_id: &str, compiler: &Compiler) -> Result<SubmissionStatus, ControllerError> {
        let status = if compiler.is_finished() {
            let total = self.registries.find_by_submission_id(submission_id).await?.len();
            let errors = self.registries.count_by_status(submission_id, ProcessChainStatus::Error).await?;
            if errors == 0 {
                SubmissionStatus::Success
            } else if total > 0 && errors == total {
                SubmissionStatus::Error
            } else {
                SubmissionStatus::PartialSuccess
            }
        } else {
            tracing::warn!(submission_id, "submission not executed completely");
            SubmissionStatus::Error
        };

        SubmissionRegistry::set_status(&*self.registries, submission_id, status).await?;
        self.registries.set_end_time(submission_id, Utc::now()).await?;
        Ok(status)
    }

    /// One submission-discovery tick: claims every currently `Accepted`
    /// submission and spawns a task driving each to completion, bounded by
    /// `max_concurrent_submissions` if configured.
    pub async fn discover_and_run(self: &Arc<Self>) -> Result<(), ControllerError> {
        while let Some(submission) = self.registries.fetch_next().await? {
            self.spawn_submission(submission.id).await;
        }
        Ok(())
    }

    /// One orphan-sweep tick: any submission left `Running` (e.g. by a
    /// worker that crashed mid-round) is re-launched. See the spec's open
    /// question about the release-then-relaunch race: the lease is released
    /// immediately after this probe succeeds, and the relaunched
    /// `run_submission` call re-acquires it — a window in which a different
    /// worker could seize it first. Left as documented, not engineered away.
    pub async fn recover_orphans(self: &Arc<Self>) -> Result<(), ControllerError> {
        let orphaned = self.registries.find_ids_by_status(SubmissionStatus::Running).await?;
        for submission_id in orphaned {
            let lease_name = format!("submission:{submission_id}");
            let Some(handle) = self.registries.try_lock(&lease_name, ORPHAN_PROBE_TIMEOUT).await? else {
                continue;
            };
            let _ = handle.release().await;
            tracing::info!(submission_id, "recovering orphaned running submission");
            self.spawn_submission(submission_id).await;
        }
        Ok(())
    }

    async fn spawn_submission(self: &Arc<Self>, submission_id: String) {
        let controller = Arc::clone(self);
        let permit = match &self.submission_slots {
            Some(slots) => Some(Arc::clone(slots).acquire_owned().await.expect("semaphore never closed")),
            None => None,
        };
        tokio::spawn(async move {
            let _permit = permit;
            match controller.run_submission(&submission_id).await {
                Ok(status) => tracing::info!(submission_id, ?status, "submission reached terminal status"),
                Err(ControllerError::LeaseUnavailable(_)) => {
                    tracing::debug!(submission_id, "another worker already owns this submission");
                }
                Err(error) => tracing::warn!(submission_id, %error, "submission task ended with an error"),
            }
        });
    }
}
