//! Reconciliation - decide and apply the desired workload state
//!
//! See `engine.rs` for the pass itself and `operator.rs` for how its effects
//! reach the workload and the model.

pub mod effects;
pub mod engine;
pub mod inputs;
pub mod model;
pub mod operator;
pub mod state;

pub use effects::{Effect, UpfRoute};
pub use engine::{plan, EnginePhase, ReconcilePlan, ReconciliationOutcome};
pub use inputs::{CharmSnapshot, ReconcileInputs, UnitContext};
pub use model::{ModelError, ModelHandle};
pub use operator::{Operator, ReconcileError};
pub use state::{AppliedState, FileStateStore, MemoryStateStore, StateStore, StateStoreError};
