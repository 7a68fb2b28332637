//! Workload handle - the injected capability for the gnbsim container
//!
//! The core never reaches for a global container object. Everything it does
//! to the workload goes through a [`WorkloadHandle`] passed in by the caller,
//! so tests substitute their own implementation.

use serde::{Deserialize, Serialize};
use std::net::IpAddr;
use thiserror::Error;

/// Directory the config storage is mounted on inside the workload
pub const CONFIG_DIR: &str = "/etc/gnbsim";

pub const CONFIG_FILE_NAME: &str = "gnb.conf";

/// Simulator binary inside the workload image
pub const SIMULATOR_BINARY: &str = "/bin/gnbsim";

/// Full path of the rendered config file inside the workload
pub fn config_path() -> String {
    format!("{}/{}", CONFIG_DIR, CONFIG_FILE_NAME)
}

/// Observed workload state at the start of a pass
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct WorkloadStatus {
    /// The container API answers
    pub can_connect: bool,

    /// Config storage is mounted at [`CONFIG_DIR`]
    pub storage_attached: bool,

    /// The Multus network attachment is in place
    pub network_ready: bool,

    /// The gnbsim service is running
    pub service_running: bool,

    /// Pod address, once assigned
    pub address: Option<IpAddr>,
}

impl WorkloadStatus {
    /// Running and addressable
    pub fn is_ready(&self) -> bool {
        self.can_connect && self.service_running && self.address.is_some()
    }
}

/// Captured result of a command run inside the workload
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct ExecOutput {
    pub exit_code: i32,
    pub stdout: String,
    pub stderr: String,
}

impl ExecOutput {
    pub fn success(&self) -> bool {
        self.exit_code == 0
    }
}

#[derive(Debug, Error)]
pub enum WorkloadError {
    #[error("workload is unreachable: {0}")]
    Unreachable(String),

    #[error("failed to write {path}: {source}")]
    Write {
        path: String,
        #[source]
        source: std::io::Error,
    },

    #[error("failed to run `{command}`: {reason}")]
    Exec { command: String, reason: String },

    #[error("`{command}` exited with code {exit_code}: {stderr}")]
    CommandFailed {
        command: String,
        exit_code: i32,
        stderr: String,
    },

    #[error("failed to restart workload: {0}")]
    Restart(String),
}

/// Operations the core needs from the gnbsim container
///
/// `exec` may block for as long as the command runs; callers that need a
/// deadline run it on a blocking task (see [`crate::action`]).
pub trait WorkloadHandle: Send + Sync {
    /// Probe connectivity, storage, network and service state
    fn status(&self) -> WorkloadStatus;

    /// Write `content` to `path` inside the workload
    fn write_file(&self, path: &str, content: &str) -> Result<(), WorkloadError>;

    /// Whether `path` exists inside the workload
    fn file_exists(&self, path: &str) -> Result<bool, WorkloadError>;

    /// Ask the workload manager to restart the gnbsim service
    fn restart(&self) -> Result<(), WorkloadError>;

    /// Run a command inside the workload and capture its output
    fn exec(&self, command: &[String]) -> Result<ExecOutput, WorkloadError>;
}
