//! Start-simulation action
//!
//! Runs the simulator inside the workload against the rendered config and
//! reports how many profiles passed.
//!
//! # Critical Invariants
//!
//! - **Ready first**: nothing touches the workload unless the engine is `Ready`
//! - **Bounded wait**: the caller gets an answer within the timeout; the run
//!   itself is left alone when the deadline passes
//! - **Isolated**: action failures never feed back into reconciliation state

use crate::reconcile::EnginePhase;
use crate::workload::{config_path, ExecOutput, WorkloadError, WorkloadHandle, SIMULATOR_BINARY};
use serde::Serialize;
use std::fmt;
use std::sync::Arc;
use std::time::Duration;
use thiserror::Error;
use tracing::{info, warn};
use uuid::Uuid;

pub const DEFAULT_TIMEOUT_SECS: u64 = 300;

/// Marker the simulator prints once per finished profile
pub const PROFILE_STATUS_MARKER: &str = "Profile Status:";
pub const PROFILE_PASS_MARKER: &str = "Profile Status: PASS";

#[derive(Debug, Error)]
pub enum ActionError {
    #[error("not ready ({0})")]
    NotReady(String),

    #[error("timeout must be a positive integer, got {0}")]
    InvalidTimeout(i64),

    #[error("timed out after {0} seconds")]
    TimedOut(u64),

    #[error("simulation failed with exit code {exit_code}: {diagnostics}")]
    Failed { exit_code: i32, diagnostics: String },

    #[error("no output in simulation")]
    NoOutput,

    #[error("failed to execute simulation: {0}")]
    Workload(#[from] WorkloadError),

    #[error("simulation task aborted: {0}")]
    Aborted(String),
}

impl ActionError {
    /// Machine-readable failure reason
    pub fn reason(&self) -> &'static str {
        match self {
            ActionError::NotReady(_) => "not ready",
            ActionError::InvalidTimeout(_) => "invalid timeout",
            ActionError::TimedOut(_) => "timed out",
            ActionError::Failed { .. } => "failed",
            ActionError::NoOutput => "no output",
            ActionError::Workload(_) | ActionError::Aborted(_) => "execution error",
        }
    }
}

/// Positive number of seconds to wait for a run
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct ActionTimeout(u64);

impl ActionTimeout {
    /// Accept the raw action parameter; zero and negative values are rejected
    pub fn from_secs(secs: i64) -> Result<Self, ActionError> {
        match u64::try_from(secs) {
            Ok(secs) if secs > 0 => Ok(ActionTimeout(secs)),
            _ => Err(ActionError::InvalidTimeout(secs)),
        }
    }

    pub fn as_secs(&self) -> u64 {
        self.0
    }

    pub fn as_duration(&self) -> Duration {
        Duration::from_secs(self.0)
    }
}

impl Default for ActionTimeout {
    fn default() -> Self {
        ActionTimeout(DEFAULT_TIMEOUT_SECS)
    }
}

/// Pass/total count of simulator profiles
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
pub struct ProfileSummary {
    pub passed: usize,
    pub total: usize,
}

impl ProfileSummary {
    pub fn parse(output: &str) -> Self {
        let mut summary = ProfileSummary { passed: 0, total: 0 };
        for line in output.lines().filter(|l| l.contains(PROFILE_STATUS_MARKER)) {
            summary.total += 1;
            if line.contains(PROFILE_PASS_MARKER) {
                summary.passed += 1;
            }
        }
        summary
    }

    pub fn all_passed(&self) -> bool {
        self.total > 0 && self.passed == self.total
    }
}

impl fmt::Display for ProfileSummary {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}/{} profiles passed", self.passed, self.total)
    }
}

/// Action result on success
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct SimulationReport {
    pub run_id: Uuid,
    pub success: bool,
    pub info: String,
    pub output: String,
}

/// Default simulator invocation inside the workload
pub fn simulation_command() -> Vec<String> {
    vec![
        SIMULATOR_BINARY.to_string(),
        "--cfg".to_string(),
        config_path(),
    ]
}

pub struct ActionHandler<W> {
    workload: Arc<W>,
    command: Vec<String>,
}

impl<W: WorkloadHandle + 'static> ActionHandler<W> {
    pub fn new(workload: Arc<W>) -> Self {
        Self {
            workload,
            command: simulation_command(),
        }
    }

    /// Override the simulator invocation
    pub fn with_command(mut self, command: Vec<String>) -> Self {
        self.command = command;
        self
    }

    /// Run the simulator and wait for it, at most `timeout`
    ///
    /// # Errors
    ///
    /// - `NotReady` without touching the workload when `phase` is not `Ready`
    /// - `TimedOut` once the deadline passes. The run keeps its blocking
    ///   thread, so a caller that exits afterwards should shut its runtime
    ///   down with `shutdown_background`
    /// - `Failed` with the captured stderr on a non-zero exit
    /// - `NoOutput` when the simulator printed nothing
    pub async fn start_simulation(
        &self,
        phase: EnginePhase,
        timeout: ActionTimeout,
    ) -> Result<SimulationReport, ActionError> {
        if phase != EnginePhase::Ready {
            warn!(%phase, "refusing to start simulation");
            return Err(ActionError::NotReady(format!("engine is {}", phase)));
        }

        let config = config_path();
        if !self.workload.file_exists(&config)? {
            return Err(ActionError::NotReady(format!("{} is not written", config)));
        }

        let run_id = Uuid::new_v4();
        let workload = Arc::clone(&self.workload);
        let command = self.command.clone();
        info!(
            %run_id,
            command = %command.join(" "),
            timeout_secs = timeout.as_secs(),
            "starting simulation"
        );

        let task = tokio::task::spawn_blocking(move || workload.exec(&command));
        let output = match tokio::time::timeout(timeout.as_duration(), task).await {
            Err(_) => {
                warn!(%run_id, timeout_secs = timeout.as_secs(), "simulation timed out");
                return Err(ActionError::TimedOut(timeout.as_secs()));
            }
            Ok(Err(join_error)) => return Err(ActionError::Aborted(join_error.to_string())),
            Ok(Ok(result)) => result?,
        };

        if !output.success() {
            warn!(%run_id, exit_code = output.exit_code, "simulation failed");
            return Err(ActionError::Failed {
                exit_code: output.exit_code,
                diagnostics: diagnostics(&output),
            });
        }

        let combined = combined_output(&output);
        if combined.trim().is_empty() {
            return Err(ActionError::NoOutput);
        }

        let summary = ProfileSummary::parse(&combined);
        info!(%run_id, %summary, "gnbsim simulation output:\n=====\n{}\n=====", combined);

        Ok(SimulationReport {
            run_id,
            success: summary.all_passed(),
            info: summary.to_string(),
            output: combined,
        })
    }
}

fn diagnostics(output: &ExecOutput) -> String {
    let stderr = output.stderr.trim();
    if stderr.is_empty() {
        output.stdout.trim().to_string()
    } else {
        stderr.to_string()
    }
}

/// gnbsim logs to stderr; keep stdout too in case it is not empty
fn combined_output(output: &ExecOutput) -> String {
    match (output.stdout.trim().is_empty(), output.stderr.trim().is_empty()) {
        (true, _) => output.stderr.clone(),
        (false, true) => output.stdout.clone(),
        (false, false) => format!("{}\n{}", output.stdout.trim_end(), output.stderr),
    }
}
