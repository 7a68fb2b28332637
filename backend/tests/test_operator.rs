//! Tests for the operator adapter
//!
//! A recording workload and model stand in for the container and the
//! orchestration layer; the state store is in memory and counts writes.

use gnbsim_operator_core_rs::render::NetworkAttachment;
use gnbsim_operator_core_rs::workload::config_path;
use gnbsim_operator_core_rs::{
    AppliedState, CharmOptions, CharmSnapshot, EnginePhase, ExecOutput, MemoryStateStore,
    ModelError, ModelHandle, Operator, PublishedIdentity, ReconcileError, ReconciliationOutcome,
    RelationData, RelationSnapshot, UnitContext, WorkloadError, WorkloadHandle, WorkloadStatus,
};
use std::sync::{Arc, Mutex};

// ============================================================================
// Test doubles
// ============================================================================

#[derive(Default)]
struct RecordingWorkload {
    status: Mutex<WorkloadStatus>,
    files: Mutex<Vec<(String, String)>>,
    restarts: Mutex<usize>,
    commands: Mutex<Vec<String>>,
    route_exit_code: i32,
}

impl RecordingWorkload {
    fn running() -> Self {
        Self {
            status: Mutex::new(WorkloadStatus {
                can_connect: true,
                storage_attached: true,
                network_ready: true,
                service_running: true,
                address: Some("10.1.0.7".parse().unwrap()),
            }),
            ..Self::default()
        }
    }

    fn set_status(&self, status: WorkloadStatus) {
        *self.status.lock().unwrap() = status;
    }

    fn writes(&self) -> usize {
        self.files.lock().unwrap().len()
    }

    fn restarts(&self) -> usize {
        *self.restarts.lock().unwrap()
    }

    fn commands(&self) -> Vec<String> {
        self.commands.lock().unwrap().clone()
    }
}

impl WorkloadHandle for RecordingWorkload {
    fn status(&self) -> WorkloadStatus {
        self.status.lock().unwrap().clone()
    }

    fn write_file(&self, path: &str, content: &str) -> Result<(), WorkloadError> {
        self.files
            .lock()
            .unwrap()
            .push((path.to_string(), content.to_string()));
        Ok(())
    }

    fn file_exists(&self, path: &str) -> Result<bool, WorkloadError> {
        Ok(self.files.lock().unwrap().iter().any(|(p, _)| p == path))
    }

    fn restart(&self) -> Result<(), WorkloadError> {
        *self.restarts.lock().unwrap() += 1;
        Ok(())
    }

    fn exec(&self, command: &[String]) -> Result<ExecOutput, WorkloadError> {
        self.commands.lock().unwrap().push(command.join(" "));
        Ok(ExecOutput {
            exit_code: self.route_exit_code,
            stdout: String::new(),
            stderr: if self.route_exit_code == 0 {
                String::new()
            } else {
                "RTNETLINK answers: Network is unreachable".to_string()
            },
        })
    }
}

#[derive(Default)]
struct RecordingModel {
    published: Vec<(u32, RelationData)>,
    attachments: Vec<String>,
    fail_publish: bool,
}

impl ModelHandle for RecordingModel {
    fn publish_identity(
        &mut self,
        relation_id: u32,
        identity: &PublishedIdentity,
    ) -> Result<(), ModelError> {
        if self.fail_publish {
            return Err(ModelError::RelationNotFound { relation_id });
        }
        self.published.push((relation_id, identity.to_relation_data()));
        Ok(())
    }

    fn configure_network(&mut self, attachment: &NetworkAttachment) -> Result<(), ModelError> {
        self.attachments.push(attachment.name.clone());
        Ok(())
    }
}

type TestOperator = Operator<RecordingWorkload, RecordingModel, MemoryStateStore>;

fn operator(workload: RecordingWorkload) -> TestOperator {
    Operator::new(
        Arc::new(workload),
        RecordingModel::default(),
        MemoryStateStore::new(),
    )
}

fn charm(options: CharmOptions) -> CharmSnapshot {
    let mut n2 = RelationData::new();
    n2.insert("amf_hostname".to_string(), "amf".to_string());
    n2.insert("amf_port".to_string(), "38412".to_string());
    CharmSnapshot {
        options,
        relations: RelationSnapshot {
            n2: Some(n2),
            gnb_identity_relation_ids: vec![9],
        },
        unit: UnitContext::default(),
    }
}

// ============================================================================
// Reconcile
// ============================================================================

#[test]
fn test_reconcile_applies_and_records() {
    let mut operator = operator(RecordingWorkload::running());

    let plan = operator.reconcile(&charm(CharmOptions::default())).unwrap();

    assert_eq!(plan.outcome, ReconciliationOutcome::Applied);
    assert_eq!(operator.workload().writes(), 1);
    assert_eq!(operator.workload().restarts(), 1);
    assert_eq!(
        operator.workload().commands(),
        vec!["ip route replace 192.168.252.0/24 via 192.168.251.1"]
    );
    assert_eq!(operator.model().attachments, vec!["gnb-net"]);
    assert_eq!(operator.model().published.len(), 1);
    assert_eq!(operator.model().published[0].0, 9);
    assert_eq!(operator.store().writes(), 1);
    assert_eq!(operator.store().state(), &plan.next_applied);
}

#[test]
fn test_second_reconcile_writes_nothing() {
    let mut operator = operator(RecordingWorkload::running());
    let charm = charm(CharmOptions::default());

    operator.reconcile(&charm).unwrap();
    let plan = operator.reconcile(&charm).unwrap();

    assert_eq!(plan.outcome, ReconciliationOutcome::Unchanged);
    assert_eq!(operator.workload().writes(), 1);
    assert_eq!(operator.workload().restarts(), 1);
    assert_eq!(operator.workload().commands().len(), 1);
    assert_eq!(operator.store().writes(), 1);
    // Identity is re-published unchanged
    assert_eq!(operator.model().published.len(), 2);
    assert_eq!(operator.model().published[0], operator.model().published[1]);
}

#[test]
fn test_subscriber_count_change_restarts_once() {
    let mut operator = operator(RecordingWorkload::running());
    operator.reconcile(&charm(CharmOptions::default())).unwrap();
    let fingerprint = operator.store().state().config_fingerprint.clone();

    let three = charm(CharmOptions {
        subscriber_count: 3,
        ..CharmOptions::default()
    });
    operator.reconcile(&three).unwrap();
    operator.reconcile(&three).unwrap();

    assert_ne!(operator.store().state().config_fingerprint, fingerprint);
    assert_eq!(operator.workload().writes(), 2);
    assert_eq!(operator.workload().restarts(), 2);
}

#[test]
fn test_blocked_pass_touches_nothing() {
    let mut operator = operator(RecordingWorkload::running());
    let mut charm = charm(CharmOptions::default());
    charm.relations.n2 = None;

    let plan = operator.reconcile(&charm).unwrap();

    assert_eq!(plan.phase, EnginePhase::Blocked);
    assert_eq!(operator.workload().writes(), 0);
    assert_eq!(operator.workload().restarts(), 0);
    assert_eq!(operator.store().writes(), 0);
}

#[test]
fn test_failed_route_is_an_error_and_not_recorded() {
    let mut operator = operator(RecordingWorkload {
        route_exit_code: 2,
        ..RecordingWorkload::running()
    });

    let err = operator
        .reconcile(&charm(CharmOptions::default()))
        .unwrap_err();

    assert!(matches!(
        err,
        ReconcileError::Workload(WorkloadError::CommandFailed { exit_code: 2, .. })
    ));
    assert_eq!(operator.store().writes(), 0);
    assert_eq!(operator.store().state(), &AppliedState::default());
}

#[test]
fn test_publish_failure_propagates() {
    let mut operator = Operator::new(
        Arc::new(RecordingWorkload::running()),
        RecordingModel {
            fail_publish: true,
            ..RecordingModel::default()
        },
        MemoryStateStore::new(),
    );

    let err = operator
        .reconcile(&charm(CharmOptions::default()))
        .unwrap_err();

    assert!(matches!(
        err,
        ReconcileError::Model(ModelError::RelationNotFound { relation_id: 9 })
    ));
}

#[test]
fn test_service_restart_converges_on_next_pass() {
    let workload = RecordingWorkload::running();
    workload.set_status(WorkloadStatus {
        service_running: false,
        ..RecordingWorkload::running().status()
    });
    let mut operator = operator(workload);
    let charm = charm(CharmOptions::default());

    let first = operator.reconcile(&charm).unwrap();
    assert_eq!(first.phase, EnginePhase::Applying);
    assert!(operator.workload().commands().is_empty());

    operator
        .workload()
        .set_status(RecordingWorkload::running().status());
    let second = operator.reconcile(&charm).unwrap();

    assert_eq!(second.phase, EnginePhase::Ready);
    assert_eq!(operator.workload().writes(), 1);
    assert_eq!(operator.workload().restarts(), 1);
    assert_eq!(operator.workload().commands().len(), 1);
}

#[test]
fn test_phase_is_ready_only_when_config_current() {
    let mut operator = operator(RecordingWorkload::running());
    let charm = charm(CharmOptions::default());

    assert_eq!(operator.phase(&charm).unwrap(), EnginePhase::Applying);

    operator.reconcile(&charm).unwrap();

    assert_eq!(operator.phase(&charm).unwrap(), EnginePhase::Ready);
    assert!(operator
        .workload()
        .file_exists(&config_path())
        .unwrap());
}
