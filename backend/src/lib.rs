//! gNB Simulator Operator Core
//!
//! Decision logic of the operator that runs a simulated 5G gNodeB (`gnbsim`)
//! as a Kubernetes workload.
//!
//! # Architecture
//!
//! - **config**: options and relation data validated into `CanonicalSettings`
//! - **render**: deterministic config file and network attachment rendering
//! - **relations**: AMF data consumed, gNB identity published
//! - **reconcile**: the pure pass (`plan`) and the applying `Operator`
//! - **workload**: the injected container capability
//! - **action**: the `start-simulation` action
//!
//! # Critical Invariants
//!
//! 1. One pass runs to completion before the next begins (no locking)
//! 2. Equal settings render byte-identical files (fingerprint comparison)
//! 3. Untyped relation data never passes the config boundary

// Module declarations
pub mod action;
pub mod config;
pub mod reconcile;
pub mod relations;
pub mod render;
pub mod status;
pub mod workload;

// Re-exports for convenience
pub use action::{ActionError, ActionHandler, ActionTimeout, ProfileSummary, SimulationReport};
pub use config::{validate, CanonicalSettings, CharmOptions, ConfigModelError, ValidationError};
pub use reconcile::{
    plan, AppliedState, CharmSnapshot, Effect, EnginePhase, FileStateStore, MemoryStateStore,
    ModelError, ModelHandle, Operator, ReconcileError, ReconcileInputs, ReconcilePlan,
    ReconciliationOutcome, StateStore, UnitContext,
};
pub use relations::{compute_identity, PublishedIdentity, RelationData, RelationSnapshot};
pub use render::{render, render_network_attachment, Fingerprint, RenderError, RenderedConfig};
pub use status::UnitStatus;
pub use workload::{ExecOutput, WorkloadError, WorkloadHandle, WorkloadStatus};

// FFI module (when feature enabled)
#[cfg(feature = "pyo3")]
pub mod ffi;

// PyO3 exports (when feature enabled)
#[cfg(feature = "pyo3")]
use pyo3::prelude::*;

#[cfg(feature = "pyo3")]
#[pymodule]
fn gnbsim_operator_core_rs(m: &Bound<'_, PyModule>) -> PyResult<()> {
    m.add_class::<ffi::core::PyGnbsimCore>()?;
    Ok(())
}
