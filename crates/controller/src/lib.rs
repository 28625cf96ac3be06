//! # flowc-controller
//!
//! The recovery-aware execution controller: drives one workflow submission
//! from `ACCEPTED` through a round loop of `flowc_compiler::Compiler::generate`
//! calls to a terminal status, checkpointing compiler state after every
//! round so a crash mid-submission resumes from the last persisted round
//! instead of restarting the workflow. [`lookup::LookupLoop`] is the
//! long-running entry point that discovers new submissions and sweeps
//! orphaned ones.
//!
//! This crate owns no registry implementation of its own; it is generic
//! over anything satisfying [`registries::Registries`], which
//! `flowc-registry`'s `InMemoryRegistry` implements.

mod config;
mod controller;
mod error;
mod lease_guard;
mod lookup;
mod oracle_bridge;
mod registries;
mod workflow_services;

pub use config::Config;
pub use controller::Controller;
pub use error::ControllerError;
pub use lookup::LookupLoop;
pub use registries::Registries;

#[cfg(test)]
mod tests {
    use std::sync::Arc;
    use std::time::Duration;

    use flowc_types::{Action, Cardinality, Direction, ExecuteAction, Parameter, ServiceMetadata, ServiceParameter, Submission, SubmissionStatus, Variable, Workflow};
    use serde_json::json;

    use super::*;
    use flowc_registry::{InMemoryRegistry, ProcessChainRegistry, SubmissionRegistry};

    fn cp_service() -> ServiceMetadata {
        ServiceMetadata {
            service_id: "cp".into(),
            name: "cp".into(),
            path: "/bin/cp".into(),
            runtime: "shell".into(),
            required_capabilities: vec!["fs".into()],
            parameters: vec![
                ServiceParameter {
                    id: "src".into(),
                    label: "src".into(),
                    kind: Direction::Input,
                    data_type: "file".into(),
                    cardinality: Cardinality::REQUIRED_SINGLE,
                    default: None,
                    file_suffix: None,
                },
                ServiceParameter {
                    id: "dst".into(),
                    label: "dst".into(),
                    kind: Direction::Output,
                    data_type: "file".into(),
                    cardinality: Cardinality::REQUIRED_SINGLE,
                    default: None,
                    file_suffix: Some(".out".into()),
                },
            ],
        }
    }

    fn single_action_workflow() -> Workflow {
        let mut action = ExecuteAction::new("cp");
        action.inputs.push(Parameter::new("src", Variable::with_value("X", json!("a.txt"))));
        action.outputs.push(Parameter::new("dst", Variable::new("Y")));
        Workflow::new(vec![], vec![Action::Execute(action)])
    }

    #[tokio::test]
    async fn single_action_submission_reaches_success() {
        let registry = Arc::new(InMemoryRegistry::new());
        registry.register_service(cp_service());
        registry.insert_submission(Submission::new("s1", single_action_workflow()));

        let config = Config::new("/tmp", "/out");
        let controller = Arc::new(Controller::new(Arc::clone(&registry), config));

        let submission_id = "s1".to_string();
        let run_handle = {
            let controller = Arc::clone(&controller);
            tokio::spawn(async move { controller.run_submission(&submission_id).await })
        };

        // Act as the external scheduler: pick up the one chain this workflow
        // compiles to, record its output as a result, mark it Success.
        let chain = loop {
            let chains = registry.find_by_submission_id("s1").await.expect("find chains");
            if let Some(chain) = chains.into_iter().next() {
                break chain;
            }
            tokio::time::sleep(Duration::from_millis(5)).await;
        };
        for exe in &chain.executables {
            for arg in &exe.arguments {
                if arg.direction == Direction::Output {
                    registry.record_result("s1", &arg.variable_id, arg.value.clone());
                }
            }
        }
        ProcessChainRegistry::set_status(&*registry, &chain.id, flowc_types::ProcessChainStatus::Success).await.expect("set status");

        let status = tokio::time::timeout(Duration::from_secs(5), run_handle)
            .await
            .expect("submission did not finish in time")
            .expect("task join")
            .expect("submission run");
        assert_eq!(status, SubmissionStatus::Success);
        assert_eq!(SubmissionRegistry::get_status(&*registry, "s1").await.expect("status"), SubmissionStatus::Success);
    }

    #[tokio::test]
    async fn concurrent_lease_acquisition_yields_exactly_one_winner() {
        let registry = Arc::new(InMemoryRegistry::new());
        registry.register_service(cp_service());
        registry.insert_submission(Submission::new("s1", single_action_workflow()));
        SubmissionRegistry::set_status(&*registry, "s1", SubmissionStatus::Running).await.expect("set status");

        let config = Config::new("/tmp", "/out");
        let controller_a = Arc::new(Controller::new(Arc::clone(&registry), config.clone()));
        let controller_b = Arc::new(Controller::new(Arc::clone(&registry), config));

        let handle_a = { let c = Arc::clone(&controller_a); tokio::spawn(async move { c.run_submission("s1").await }) };
        let handle_b = { let c = Arc::clone(&controller_b); tokio::spawn(async move { c.run_submission("s1").await }) };

        let chain = loop {
            let chains = registry.find_by_submission_id("s1").await.expect("find chains");
            if let Some(chain) = chains.into_iter().next() {
                break chain;
            }
            tokio::time::sleep(Duration::from_millis(5)).await;
        };
        for exe in &chain.executables {
            for arg in &exe.arguments {
                if arg.direction == Direction::Output {
                    registry.record_result("s1", &arg.variable_id, arg.value.clone());
                }
            }
        }
        ProcessChainRegistry::set_status(&*registry, &chain.id, flowc_types::ProcessChainStatus::Success).await.expect("set status");

        let (res_a, res_b) = tokio::join!(
            tokio::time::timeout(Duration::from_secs(5), handle_a),
            tokio::time::timeout(Duration::from_secs(5), handle_b)
        );
        let res_a = res_a.expect("a join timeout").expect("a task join");
        let res_b = res_b.expect("b join timeout").expect("b task join");

        let winners = [res_a.is_ok(), res_b.is_ok()].into_iter().filter(|ok| *ok).count();
        assert_eq!(winners, 1, "exactly one controller should win the lease and drive the submission");
    }
}
