//! Tests for the start-simulation action
//!
//! The scripted workload answers `exec` with canned output after an optional
//! delay and counts how often it was called.

use gnbsim_operator_core_rs::workload::config_path;
use gnbsim_operator_core_rs::{
    ActionError, ActionHandler, ActionTimeout, CharmOptions, CharmSnapshot, EnginePhase,
    ExecOutput, MemoryStateStore, ModelError, ModelHandle, Operator, PublishedIdentity,
    RelationData, RelationSnapshot, UnitContext, WorkloadError, WorkloadHandle, WorkloadStatus,
};
use gnbsim_operator_core_rs::render::NetworkAttachment;
use std::sync::atomic::{AtomicUsize, Ordering};
use std::sync::Arc;
use std::time::{Duration, Instant};

const FOUR_OF_FIVE: &str = "\
2024-01-01T00:00:00Z [INFO][GNBSIM][Profile] Profile Status: PASS
2024-01-01T00:00:01Z [INFO][GNBSIM][Profile] Profile Status: PASS
2024-01-01T00:00:02Z [INFO][GNBSIM][Profile] Profile Status: FAILED
2024-01-01T00:00:03Z [INFO][GNBSIM][Profile] Profile Status: PASS
2024-01-01T00:00:04Z [INFO][GNBSIM][Profile] Profile Status: PASS
";

struct ScriptedWorkload {
    output: ExecOutput,
    delay: Duration,
    config_written: bool,
    execs: AtomicUsize,
}

impl ScriptedWorkload {
    fn new(output: ExecOutput) -> Self {
        Self {
            output,
            delay: Duration::ZERO,
            config_written: true,
            execs: AtomicUsize::new(0),
        }
    }

    fn passing(stderr: &str) -> Self {
        Self::new(ExecOutput {
            exit_code: 0,
            stdout: String::new(),
            stderr: stderr.to_string(),
        })
    }

    fn execs(&self) -> usize {
        self.execs.load(Ordering::SeqCst)
    }
}

impl WorkloadHandle for ScriptedWorkload {
    fn status(&self) -> WorkloadStatus {
        WorkloadStatus {
            can_connect: true,
            storage_attached: true,
            network_ready: true,
            service_running: false,
            address: None,
        }
    }

    fn write_file(&self, _path: &str, _content: &str) -> Result<(), WorkloadError> {
        Ok(())
    }

    fn file_exists(&self, path: &str) -> Result<bool, WorkloadError> {
        Ok(self.config_written && path == config_path())
    }

    fn restart(&self) -> Result<(), WorkloadError> {
        Ok(())
    }

    fn exec(&self, _command: &[String]) -> Result<ExecOutput, WorkloadError> {
        self.execs.fetch_add(1, Ordering::SeqCst);
        std::thread::sleep(self.delay);
        Ok(self.output.clone())
    }
}

fn handler(workload: &Arc<ScriptedWorkload>) -> ActionHandler<ScriptedWorkload> {
    ActionHandler::new(Arc::clone(workload))
}

fn timeout(secs: i64) -> ActionTimeout {
    ActionTimeout::from_secs(secs).unwrap()
}

#[tokio::test]
async fn test_not_ready_never_touches_workload() {
    let workload = Arc::new(ScriptedWorkload::passing(FOUR_OF_FIVE));

    for phase in [EnginePhase::Blocked, EnginePhase::Waiting, EnginePhase::Applying] {
        let err = handler(&workload)
            .start_simulation(phase, timeout(5))
            .await
            .unwrap_err();

        assert!(matches!(err, ActionError::NotReady(_)));
        assert_eq!(err.reason(), "not ready");
    }
    assert_eq!(workload.execs(), 0);
}

#[tokio::test]
async fn test_missing_config_file_is_not_ready() {
    let workload = Arc::new(ScriptedWorkload {
        config_written: false,
        ..ScriptedWorkload::passing(FOUR_OF_FIVE)
    });

    let err = handler(&workload)
        .start_simulation(EnginePhase::Ready, timeout(5))
        .await
        .unwrap_err();

    assert!(matches!(err, ActionError::NotReady(_)));
    assert_eq!(workload.execs(), 0);
}

#[tokio::test]
async fn test_four_of_five_profiles() {
    let workload = Arc::new(ScriptedWorkload::passing(FOUR_OF_FIVE));

    let report = handler(&workload)
        .start_simulation(EnginePhase::Ready, timeout(5))
        .await
        .unwrap();

    assert!(!report.success);
    assert_eq!(report.info, "4/5 profiles passed");
    assert_eq!(workload.execs(), 1);
}

#[tokio::test]
async fn test_all_profiles_pass() {
    let workload = Arc::new(ScriptedWorkload::passing(
        &FOUR_OF_FIVE.replace("FAILED", "PASS"),
    ));

    let report = handler(&workload)
        .start_simulation(EnginePhase::Ready, ActionTimeout::default())
        .await
        .unwrap();

    assert!(report.success);
    assert_eq!(report.info, "5/5 profiles passed");
}

#[tokio::test]
async fn test_run_ids_are_unique() {
    let workload = Arc::new(ScriptedWorkload::passing(FOUR_OF_FIVE));

    let first = handler(&workload)
        .start_simulation(EnginePhase::Ready, timeout(5))
        .await
        .unwrap();
    let second = handler(&workload)
        .start_simulation(EnginePhase::Ready, timeout(5))
        .await
        .unwrap();

    assert_ne!(first.run_id, second.run_id);
}

#[tokio::test]
async fn test_non_zero_exit_fails_with_diagnostics() {
    let workload = Arc::new(ScriptedWorkload::new(ExecOutput {
        exit_code: 1,
        stdout: String::new(),
        stderr: "failed to connect to AMF\n".to_string(),
    }));

    let err = handler(&workload)
        .start_simulation(EnginePhase::Ready, timeout(5))
        .await
        .unwrap_err();

    match err {
        ActionError::Failed {
            exit_code,
            diagnostics,
        } => {
            assert_eq!(exit_code, 1);
            assert_eq!(diagnostics, "failed to connect to AMF");
        }
        other => panic!("expected Failed, got {:?}", other),
    }
}

#[tokio::test]
async fn test_empty_output_is_an_error() {
    let workload = Arc::new(ScriptedWorkload::passing("  \n"));

    let err = handler(&workload)
        .start_simulation(EnginePhase::Ready, timeout(5))
        .await
        .unwrap_err();

    assert!(matches!(err, ActionError::NoOutput));
}

#[tokio::test]
async fn test_timeout_returns_after_deadline() {
    let workload = Arc::new(ScriptedWorkload {
        delay: Duration::from_secs(3),
        ..ScriptedWorkload::passing(FOUR_OF_FIVE)
    });

    let started = Instant::now();
    let err = handler(&workload)
        .start_simulation(EnginePhase::Ready, timeout(1))
        .await
        .unwrap_err();
    let elapsed = started.elapsed();

    assert!(matches!(err, ActionError::TimedOut(1)));
    assert_eq!(err.reason(), "timed out");
    assert!(elapsed >= Duration::from_secs(1));
    assert!(elapsed < Duration::from_secs(3));
}

#[tokio::test]
async fn test_custom_command_is_used() {
    let workload = Arc::new(ScriptedWorkload::passing(FOUR_OF_FIVE));

    let report = handler(&workload)
        .with_command(vec!["/usr/local/bin/gnbsim".to_string()])
        .start_simulation(EnginePhase::Ready, timeout(5))
        .await
        .unwrap();

    assert_eq!(report.info, "4/5 profiles passed");
}

// ============================================================================
// Through the operator
// ============================================================================

#[derive(Default)]
struct NullModel;

impl ModelHandle for NullModel {
    fn publish_identity(&mut self, _: u32, _: &PublishedIdentity) -> Result<(), ModelError> {
        Ok(())
    }

    fn configure_network(&mut self, _: &NetworkAttachment) -> Result<(), ModelError> {
        Ok(())
    }
}

#[tokio::test]
async fn test_operator_refuses_while_workload_not_ready() {
    let workload = Arc::new(ScriptedWorkload::passing(FOUR_OF_FIVE));
    let operator = Operator::new(Arc::clone(&workload), NullModel, MemoryStateStore::new());
    let mut n2 = RelationData::new();
    n2.insert("amf_hostname".to_string(), "amf".to_string());
    n2.insert("amf_port".to_string(), "38412".to_string());
    let charm = CharmSnapshot {
        options: CharmOptions::default(),
        relations: RelationSnapshot {
            n2: Some(n2),
            gnb_identity_relation_ids: vec![],
        },
        unit: UnitContext::default(),
    };

    let err = operator
        .start_simulation(&charm, timeout(1))
        .await
        .unwrap_err();

    assert!(matches!(err, ActionError::NotReady(_)));
    assert_eq!(workload.execs(), 0);
}
