//! Inputs of one reconciliation pass

use crate::config::CharmOptions;
use crate::relations::RelationSnapshot;
use crate::workload::WorkloadStatus;
use serde::{Deserialize, Serialize};

/// Identity of this unit within the orchestration model
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct UnitContext {
    pub model_name: String,
    pub app_name: String,
    pub is_leader: bool,
}

impl Default for UnitContext {
    fn default() -> Self {
        Self {
            model_name: "default".to_string(),
            app_name: "gnbsim".to_string(),
            is_leader: true,
        }
    }
}

/// What the orchestration layer delivers with every event
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct CharmSnapshot {
    pub options: CharmOptions,
    pub relations: RelationSnapshot,
    pub unit: UnitContext,
}

/// Everything a pass looks at, gathered up front
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct ReconcileInputs {
    pub charm: CharmSnapshot,
    pub workload: WorkloadStatus,
}

impl ReconcileInputs {
    pub fn new(charm: CharmSnapshot, workload: WorkloadStatus) -> Self {
        Self { charm, workload }
    }
}
