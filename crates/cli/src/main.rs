//! `flowc`: a `clap`-derived binary over the `flowc-compiler`/`flowc-controller`
//! stack. Mirrors the source workspace's `workflow list/preview/run`
//! subcommand shape (`cli/src/main.rs`'s `with_workflow_cli`/`run_workflow_cmd`),
//! replacing its HTTP-request-builder body with a call into this workspace's
//! compiler and controller.
//!
//! `preview` runs a single `Compiler::generate` round and prints the
//! resulting process chains, the way the source's `dry_run_plan` previewed a
//! request without sending it. `run` drives a submission to a terminal
//! status against a local `InMemoryRegistry`, standing in for the external
//! agent/scheduler with a trivial simulated executor that marks every
//! dispatched chain successful and feeds its output arguments back as
//! results — there is no real scheduler in this workspace's scope (§1).

use std::collections::HashSet;
use std::path::{Path, PathBuf};
use std::sync::Arc;
use std::time::Duration;

use anyhow::{Context, Result};
use clap::{Parser, Subcommand};
use flowc_compiler::{Compiler, NoOutputAdapters};
use flowc_controller::{Config, Controller};
use flowc_registry::{InMemoryRegistry, ProcessChainRegistry};
use flowc_types::{Direction, ProcessChainStatus, ServiceMetadata, Submission, Workflow};
use flowc_util::TimeSortableIdGenerator;
use indexmap::IndexMap;

#[derive(Parser)]
#[command(name = "flowc", version, about = "Workflow-to-process-chain compiler and execution controller")]
struct Cli {
    #[command(subcommand)]
    command: Command,
}

#[derive(Subcommand)]
enum Command {
    /// Compile and run workflows
    Workflow {
        #[command(subcommand)]
        action: WorkflowCommand,
    },
}

#[derive(Subcommand)]
enum WorkflowCommand {
    /// List workflow files in a directory
    List {
        #[arg(long, short = 'd', default_value = "workflows")]
        dir: PathBuf,
    },
    /// Compile a workflow once and print the first eligible batch of process chains
    Preview {
        /// Workflow YAML/JSON file
        #[arg(long, short = 'f')]
        file: PathBuf,
        /// Service metadata catalog (YAML/JSON array of ServiceMetadata)
        #[arg(long, short = 's')]
        services: PathBuf,
        #[arg(long, default_value = "/tmp/flowc/work")]
        tmp_path: String,
        #[arg(long, default_value = "/tmp/flowc/out")]
        out_path: String,
    },
    /// Compile and drive a workflow to completion against a local in-memory registry
    Run {
        #[arg(long, short = 'f')]
        file: PathBuf,
        #[arg(long, short = 's')]
        services: PathBuf,
        #[arg(long, default_value = "/tmp/flowc/work")]
        tmp_path: String,
        #[arg(long, default_value = "/tmp/flowc/out")]
        out_path: String,
        #[arg(long, default_value_t = 50)]
        lookup_interval_ms: u64,
    },
}

#[tokio::main]
async fn main() -> Result<()> {
    init_tracing();
    let cli = Cli::parse();
    match cli.command {
        Command::Workflow { action } => run_workflow_cmd(action).await,
    }
}

fn init_tracing() {
    let filter = std::env::var("RUST_LOG").unwrap_or_else(|_| "info".into());
    let _ = tracing_subscriber::fmt().with_env_filter(filter).try_init();
}

async fn run_workflow_cmd(action: WorkflowCommand) -> Result<()> {
    match action {
        WorkflowCommand::List { dir } => list_workflows(&dir),
        WorkflowCommand::Preview { file, services, tmp_path, out_path } => preview(&file, &services, tmp_path, out_path),
        WorkflowCommand::Run { file, services, tmp_path, out_path, lookup_interval_ms } => {
            run_local(&file, &services, tmp_path, out_path, lookup_interval_ms).await
        }
    }
}

fn list_workflows(dir: &Path) -> Result<()> {
    if !dir.exists() {
        println!("no workflows directory found at {}", dir.display());
        return Ok(());
    }
    for entry in std::fs::read_dir(dir).with_context(|| format!("reading {}", dir.display()))? {
        println!("{}", entry?.path().display());
    }
    Ok(())
}

fn preview(file: &Path, services: &Path, tmp_path: String, out_path: String) -> Result<()> {
    let workflow = load_yaml_or_json::<Workflow>(file)?;
    let services = load_yaml_or_json::<Vec<ServiceMetadata>>(services)?;
    let mut compiler = Compiler::new(workflow, tmp_path, out_path, services, Box::new(NoOutputAdapters), Box::new(TimeSortableIdGenerator));

    let chains = compiler.generate(IndexMap::new())?;
    println!("{}", serde_json::to_string_pretty(&chains)?);
    if chains.is_empty() && !compiler.is_finished() {
        eprintln!("no chains are eligible in the first round; this workflow depends on upstream results");
    }
    Ok(())
}

async fn run_local(file: &Path, services_path: &Path, tmp_path: String, out_path: String, lookup_interval_ms: u64) -> Result<()> {
    let workflow = load_yaml_or_json::<Workflow>(file)?;
    let services = load_yaml_or_json::<Vec<ServiceMetadata>>(services_path)?;

    let registry = Arc::new(InMemoryRegistry::new());
    for service in services {
        registry.register_service(service);
    }
    let submission_id = "local".to_string();
    registry.insert_submission(Submission::new(submission_id.clone(), workflow));

    let mut config = Config::new(tmp_path, out_path).with_env_overrides();
    config.lookup_interval_ms = lookup_interval_ms;
    let controller = Controller::new(Arc::clone(&registry), config);

    let simulator = tokio::spawn(simulate_agent(Arc::clone(&registry), submission_id.clone()));
    let status = controller.run_submission(&submission_id).await.context("driving workflow to completion")?;
    simulator.abort();

    println!("submission {submission_id} finished with status {status:?}");
    Ok(())
}

/// Stands in for the external agent/scheduler that would normally dispatch a
/// process chain's executables: every dispatched chain is marked `Success`
/// and its output arguments are fed back as results, so the controller's
/// round loop can make progress without a real runtime behind it.
async fn simulate_agent(registry: Arc<InMemoryRegistry>, submission_id: String) {
    let mut handled = HashSet::new();
    loop {
        let Ok(chains) = registry.find_by_submission_id(&submission_id).await else { return };
        for chain in chains {
            if handled.contains(&chain.id) {
                continue;
            }
            let Ok(ProcessChainStatus::Registered) = ProcessChainRegistry::get_status(&*registry, &chain.id).await else {
                continue;
            };
            for executable in &chain.executables {
                tracing::info!(chain_id = %chain.id, service = %executable.service_name, path = %executable.path, "simulated dispatch");
                for argument in &executable.arguments {
                    if argument.direction == Direction::Output {
                        registry.record_result(&submission_id, &argument.variable_id, argument.value.clone());
                    }
                }
            }
            if let Err(error) = ProcessChainRegistry::set_status(&*registry, &chain.id, ProcessChainStatus::Success).await {
                tracing::warn!(%error, chain_id = %chain.id, "failed to record simulated chain completion");
            }
            handled.insert(chain.id);
        }
        tokio::time::sleep(Duration::from_millis(10)).await;
    }
}

fn load_yaml_or_json<T: serde::de::DeserializeOwned>(path: &Path) -> Result<T> {
    let raw = std::fs::read_to_string(path).with_context(|| format!("reading {}", path.display()))?;
    match path.extension().and_then(|e| e.to_str()) {
        Some("json") => serde_json::from_str(&raw).with_context(|| format!("parsing {} as JSON", path.display())),
        _ => serde_yaml::from_str(&raw).with_context(|| format!("parsing {} as YAML", path.display())),
    }
}
