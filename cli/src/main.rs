use anyhow::{Context, Result};
use clap::Parser;
use gnbsim_operator_core_rs::reconcile::engine;
use gnbsim_operator_core_rs::{
    config, render, ActionTimeout, AppliedState, CharmSnapshot, FileStateStore, Operator,
    ReconcileInputs, ReconcilePlan, StateStore, WorkloadStatus,
};
use serde::de::DeserializeOwned;
use std::path::Path;
use std::sync::Arc;
use tracing_subscriber::EnvFilter;

mod cli;
mod local;

use cli::{Cli, Commands, LocalArgs};
use local::{LocalModel, LocalWorkload};

type LocalOperator = Operator<LocalWorkload, LocalModel, FileStateStore>;

fn main() -> Result<()> {
    tracing_subscriber::fmt()
        .with_env_filter(
            EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new("info")),
        )
        .with_writer(std::io::stderr)
        .init();

    let cli = Cli::parse();
    let runtime = tokio::runtime::Builder::new_multi_thread()
        .enable_all()
        .build()
        .context("failed to start async runtime")?;
    let result = runtime.block_on(run(cli));
    // A timed-out simulation still holds a blocking thread; exit without it
    runtime.shutdown_background();
    result
}

async fn run(cli: Cli) -> Result<()> {
    match cli.command {
        Commands::Render { snapshot } => {
            let snapshot: CharmSnapshot = read_document(&snapshot)?;
            let settings = config::validate(&snapshot.options, &snapshot.relations)
                .context("invalid configuration")?;
            let rendered = render(&settings)?;
            if cli.json {
                print_json(&serde_json::json!({
                    "fingerprint": rendered.fingerprint,
                    "content": rendered.content,
                }))?;
            } else {
                print!("{}", rendered.content);
            }
        }
        Commands::Plan {
            snapshot,
            workload,
            state,
        } => {
            let charm: CharmSnapshot = read_document(&snapshot)?;
            let workload: WorkloadStatus = match workload {
                Some(path) => read_document(&path)?,
                None => WorkloadStatus::default(),
            };
            let applied = match state {
                Some(path) => FileStateStore::new(path).load()?,
                None => AppliedState::default(),
            };
            let plan = engine::plan(&ReconcileInputs::new(charm, workload), &applied)?;
            print_plan(&plan, cli.json)?;
        }
        Commands::Reconcile { local } => {
            let charm: CharmSnapshot = read_document(&local.snapshot)?;
            let mut operator = local_operator(&local, None)?;
            let plan = operator.reconcile(&charm)?;
            print_plan(&plan, cli.json)?;
        }
        Commands::StartSimulation {
            local,
            timeout,
            simulator,
        } => {
            let charm: CharmSnapshot = read_document(&local.snapshot)?;
            let timeout = ActionTimeout::from_secs(timeout)?;
            let operator = local_operator(&local, simulator)?;
            let report = operator.start_simulation(&charm, timeout).await?;
            if cli.json {
                print_json(&report)?;
            } else {
                println!("success: {}", report.success);
                println!("info: {}", report.info);
            }
        }
    }
    Ok(())
}

fn local_operator(
    local: &LocalArgs,
    simulator: Option<std::path::PathBuf>,
) -> Result<LocalOperator> {
    let workload = LocalWorkload::create(&local.root, local.address)
        .with_context(|| format!("failed to prepare workload root {}", local.root.display()))?
        .with_simulator(simulator);
    Ok(Operator::new(
        Arc::new(workload),
        LocalModel::new(&local.root),
        FileStateStore::new(local.state_path()),
    ))
}

/// YAML parser also accepts JSON documents
fn read_document<T: DeserializeOwned>(path: &Path) -> Result<T> {
    let raw = std::fs::read_to_string(path)
        .with_context(|| format!("failed to read {}", path.display()))?;
    serde_yaml::from_str(&raw).with_context(|| format!("failed to parse {}", path.display()))
}

fn print_json<T: serde::Serialize>(value: &T) -> Result<()> {
    println!("{}", serde_json::to_string_pretty(value)?);
    Ok(())
}

fn print_plan(plan: &ReconcilePlan, json: bool) -> Result<()> {
    if json {
        return print_json(plan);
    }
    println!("status: {}", plan.status());
    println!("phase: {}", plan.phase);
    for effect in &plan.effects {
        println!("  - {}", effect.kind());
    }
    Ok(())
}
