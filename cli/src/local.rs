//! Local stand-ins for the container and the model
//!
//! The workload filesystem is a directory; absolute workload paths are
//! resolved under it. Model effects land as JSON files next to it.

use gnbsim_operator_core_rs::relations::identity::GNB_IDENTITY_RELATION_NAME;
use gnbsim_operator_core_rs::render::NetworkAttachment;
use gnbsim_operator_core_rs::workload::{CONFIG_DIR, SIMULATOR_BINARY};
use gnbsim_operator_core_rs::{
    ExecOutput, ModelError, ModelHandle, PublishedIdentity, WorkloadError, WorkloadHandle,
    WorkloadStatus,
};
use std::fs::{self, OpenOptions};
use std::io::Write;
use std::net::IpAddr;
use std::path::{Path, PathBuf};
use std::process::Command;
use tracing::{debug, info};

/// Appended to on every restart, one line each
pub const SERVICE_LOG: &str = "run/gnbsim.restarts";

/// Commands other than the simulator are recorded here instead of run
pub const COMMAND_LOG: &str = "run/commands.log";

pub struct LocalWorkload {
    root: PathBuf,
    address: IpAddr,
    simulator: Option<PathBuf>,
}

impl LocalWorkload {
    /// Prepare `root` as a workload with config storage attached
    pub fn create(root: impl Into<PathBuf>, address: IpAddr) -> std::io::Result<Self> {
        let workload = Self {
            root: root.into(),
            address,
            simulator: None,
        };
        fs::create_dir_all(workload.host_path(CONFIG_DIR))?;
        Ok(workload)
    }

    pub fn with_simulator(mut self, simulator: Option<PathBuf>) -> Self {
        self.simulator = simulator;
        self
    }

    pub fn host_path(&self, workload_path: &str) -> PathBuf {
        self.root.join(workload_path.trim_start_matches('/'))
    }

    fn ensure_reachable(&self) -> Result<(), WorkloadError> {
        if self.root.is_dir() {
            Ok(())
        } else {
            Err(WorkloadError::Unreachable(format!(
                "{} is not a directory",
                self.root.display()
            )))
        }
    }

    fn append(&self, relative: &str, line: &str) -> std::io::Result<()> {
        let path = self.root.join(relative);
        if let Some(parent) = path.parent() {
            fs::create_dir_all(parent)?;
        }
        let mut file = OpenOptions::new().create(true).append(true).open(path)?;
        writeln!(file, "{}", line)
    }

    fn run_simulator(&self, command: &[String]) -> Result<ExecOutput, WorkloadError> {
        let joined = command.join(" ");
        let simulator = self.simulator.as_ref().ok_or_else(|| WorkloadError::Exec {
            command: joined.clone(),
            reason: "no simulator executable configured".to_string(),
        })?;

        let args: Vec<String> = command[1..]
            .iter()
            .map(|arg| {
                if arg.starts_with(CONFIG_DIR) {
                    self.host_path(arg).display().to_string()
                } else {
                    arg.clone()
                }
            })
            .collect();

        debug!(simulator = %simulator.display(), ?args, "running simulator");
        let output = Command::new(simulator)
            .args(&args)
            .output()
            .map_err(|e| WorkloadError::Exec {
                command: joined,
                reason: e.to_string(),
            })?;

        Ok(ExecOutput {
            exit_code: output.status.code().unwrap_or(-1),
            stdout: String::from_utf8_lossy(&output.stdout).into_owned(),
            stderr: String::from_utf8_lossy(&output.stderr).into_owned(),
        })
    }
}

impl WorkloadHandle for LocalWorkload {
    fn status(&self) -> WorkloadStatus {
        WorkloadStatus {
            can_connect: self.root.is_dir(),
            storage_attached: self.host_path(CONFIG_DIR).is_dir(),
            // No Multus locally
            network_ready: true,
            service_running: self.root.join(SERVICE_LOG).is_file(),
            address: Some(self.address),
        }
    }

    fn write_file(&self, path: &str, content: &str) -> Result<(), WorkloadError> {
        self.ensure_reachable()?;
        let host = self.host_path(path);
        let write_error = |source| WorkloadError::Write {
            path: path.to_string(),
            source,
        };
        if let Some(parent) = host.parent() {
            fs::create_dir_all(parent).map_err(write_error)?;
        }
        fs::write(&host, content).map_err(write_error)
    }

    fn file_exists(&self, path: &str) -> Result<bool, WorkloadError> {
        self.ensure_reachable()?;
        Ok(self.host_path(path).is_file())
    }

    fn restart(&self) -> Result<(), WorkloadError> {
        self.ensure_reachable()?;
        self.append(SERVICE_LOG, "restart")
            .map_err(|e| WorkloadError::Restart(e.to_string()))?;
        info!(root = %self.root.display(), "local service restarted");
        Ok(())
    }

    fn exec(&self, command: &[String]) -> Result<ExecOutput, WorkloadError> {
        self.ensure_reachable()?;
        match command.first().map(String::as_str) {
            Some(SIMULATOR_BINARY) => self.run_simulator(command),
            Some(_) => {
                let joined = command.join(" ");
                self.append(COMMAND_LOG, &joined)
                    .map_err(|e| WorkloadError::Exec {
                        command: joined.clone(),
                        reason: e.to_string(),
                    })?;
                info!(command = %joined, "recorded workload command");
                Ok(ExecOutput::default())
            }
            None => Err(WorkloadError::Exec {
                command: String::new(),
                reason: "empty command".to_string(),
            }),
        }
    }
}

/// Writes relation data and network attachments under `<root>/model`
pub struct LocalModel {
    dir: PathBuf,
}

impl LocalModel {
    pub fn new(root: &Path) -> Self {
        Self {
            dir: root.join("model"),
        }
    }

    pub fn relation_path(&self, relation_id: u32) -> PathBuf {
        self.dir
            .join("relations")
            .join(format!("{}-{}.json", GNB_IDENTITY_RELATION_NAME, relation_id))
    }

    pub fn attachment_path(&self, name: &str) -> PathBuf {
        self.dir.join("network-attachments").join(format!("{}.json", name))
    }
}

fn write_json(path: &Path, value: &serde_json::Value) -> Result<(), String> {
    if let Some(parent) = path.parent() {
        fs::create_dir_all(parent).map_err(|e| e.to_string())?;
    }
    let json = serde_json::to_string_pretty(value).map_err(|e| e.to_string())?;
    fs::write(path, json).map_err(|e| e.to_string())
}

impl ModelHandle for LocalModel {
    fn publish_identity(
        &mut self,
        relation_id: u32,
        identity: &PublishedIdentity,
    ) -> Result<(), ModelError> {
        let data = serde_json::json!(identity.to_relation_data());
        write_json(&self.relation_path(relation_id), &data).map_err(ModelError::Publish)?;
        debug!(relation_id, gnb_name = %identity.gnb_name, "identity published");
        Ok(())
    }

    fn configure_network(&mut self, attachment: &NetworkAttachment) -> Result<(), ModelError> {
        let nad = serde_json::json!({
            "name": attachment.name,
            "interface": attachment.interface,
            "config": attachment.config,
        });
        write_json(&self.attachment_path(&attachment.name), &nad).map_err(|reason| {
            ModelError::Network {
                name: attachment.name.clone(),
                reason,
            }
        })?;
        info!(name = %attachment.name, "network attachment configured");
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use gnbsim_operator_core_rs::workload::config_path;
    use tempfile::TempDir;

    fn workload(dir: &TempDir) -> LocalWorkload {
        LocalWorkload::create(dir.path(), "127.0.0.1".parse().unwrap()).unwrap()
    }

    #[test]
    fn fresh_root_has_storage_but_no_service() {
        let dir = TempDir::new().unwrap();
        let status = workload(&dir).status();

        assert!(status.can_connect);
        assert!(status.storage_attached);
        assert!(!status.service_running);
    }

    #[test]
    fn writes_land_under_root() {
        let dir = TempDir::new().unwrap();
        let workload = workload(&dir);

        workload.write_file(&config_path(), "info: {}\n").unwrap();

        assert!(workload.file_exists(&config_path()).unwrap());
        let on_disk = fs::read_to_string(dir.path().join("etc/gnbsim/gnb.conf")).unwrap();
        assert_eq!(on_disk, "info: {}\n");
    }

    #[test]
    fn route_commands_are_recorded_not_run() {
        let dir = TempDir::new().unwrap();
        let workload = workload(&dir);
        let command: Vec<String> = ["ip", "route", "replace", "10.0.0.0/24", "via", "10.0.0.1"]
            .iter()
            .map(|s| s.to_string())
            .collect();

        let output = workload.exec(&command).unwrap();

        assert!(output.success());
        let log = fs::read_to_string(dir.path().join(COMMAND_LOG)).unwrap();
        assert_eq!(log, "ip route replace 10.0.0.0/24 via 10.0.0.1\n");
    }

    #[test]
    fn removed_root_is_unreachable() {
        let dir = TempDir::new().unwrap();
        let workload = workload(&dir);
        fs::remove_dir_all(dir.path()).unwrap();

        assert!(!workload.status().can_connect);
        assert!(matches!(
            workload.write_file(&config_path(), "info: {}\n"),
            Err(WorkloadError::Unreachable(_))
        ));
        assert!(matches!(workload.restart(), Err(WorkloadError::Unreachable(_))));
    }

    #[test]
    fn simulator_requires_an_executable() {
        let dir = TempDir::new().unwrap();
        let command = vec![SIMULATOR_BINARY.to_string()];

        assert!(matches!(
            workload(&dir).exec(&command),
            Err(WorkloadError::Exec { .. })
        ));
    }
}
