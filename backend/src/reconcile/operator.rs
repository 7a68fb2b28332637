//! Operator - the thin adapter that gathers inputs and applies planned effects
//!
//! Passes are serialized by the orchestration layer, so the operator holds no
//! locks. The workload handle is shared (`Arc`) because simulation runs hand
//! it to a blocking task.

use crate::action::{ActionError, ActionHandler, ActionTimeout, SimulationReport};
use crate::reconcile::effects::Effect;
use crate::reconcile::engine::{self, EnginePhase, ReconcilePlan};
use crate::reconcile::inputs::{CharmSnapshot, ReconcileInputs};
use crate::reconcile::model::{ModelError, ModelHandle};
use crate::reconcile::state::{StateStore, StateStoreError};
use crate::render::RenderError;
use crate::workload::{WorkloadError, WorkloadHandle};
use std::sync::Arc;
use thiserror::Error;
use tracing::{debug, info};

/// Failures that abort a pass
///
/// Unlike `Blocked`/`Waiting` outcomes these are not reported as status; they
/// propagate to the caller so the orchestration layer retries the event.
#[derive(Debug, Error)]
pub enum ReconcileError {
    #[error("rendering failed: {0}")]
    Render(#[from] RenderError),

    #[error("workload operation failed: {0}")]
    Workload(#[from] WorkloadError),

    #[error("model operation failed: {0}")]
    Model(#[from] ModelError),

    #[error("state store failed: {0}")]
    Store(#[from] StateStoreError),
}

pub struct Operator<W, M, S> {
    workload: Arc<W>,
    model: M,
    store: S,
}

impl<W, M, S> Operator<W, M, S>
where
    W: WorkloadHandle + 'static,
    M: ModelHandle,
    S: StateStore,
{
    pub fn new(workload: Arc<W>, model: M, store: S) -> Self {
        Self {
            workload,
            model,
            store,
        }
    }

    pub fn workload(&self) -> &Arc<W> {
        &self.workload
    }

    pub fn model(&self) -> &M {
        &self.model
    }

    pub fn store(&self) -> &S {
        &self.store
    }

    /// Plan a pass against the current workload without applying anything
    pub fn dry_run(&self, charm: &CharmSnapshot) -> Result<ReconcilePlan, ReconcileError> {
        let applied = self.store.load()?;
        let inputs = ReconcileInputs::new(charm.clone(), self.workload.status());
        Ok(engine::plan(&inputs, &applied)?)
    }

    /// Run one full pass: gather, plan, apply, record
    pub fn reconcile(&mut self, charm: &CharmSnapshot) -> Result<ReconcilePlan, ReconcileError> {
        let applied = self.store.load()?;
        let inputs = ReconcileInputs::new(charm.clone(), self.workload.status());
        let plan = engine::plan(&inputs, &applied)?;

        for effect in &plan.effects {
            self.apply(effect)?;
        }

        if plan.next_applied != applied {
            self.store.store(&plan.next_applied)?;
        }

        info!(
            status = %plan.status(),
            phase = ?plan.phase,
            effects = plan.effects.len(),
            "reconciliation pass finished"
        );
        Ok(plan)
    }

    /// Engine phase as seen right now
    ///
    /// `Ready` only when the pass would not rewrite the config file, so the
    /// simulator is guaranteed to run against the current settings.
    pub fn phase(&self, charm: &CharmSnapshot) -> Result<EnginePhase, ReconcileError> {
        let plan = self.dry_run(charm)?;
        Ok(match plan.phase {
            EnginePhase::Ready if plan.writes_config() => EnginePhase::Applying,
            phase => phase,
        })
    }

    /// Handle the `start-simulation` action
    ///
    /// A failure to even compute the phase is reported as not ready; the
    /// action never changes reconciliation state.
    pub async fn start_simulation(
        &self,
        charm: &CharmSnapshot,
        timeout: ActionTimeout,
    ) -> Result<SimulationReport, ActionError> {
        let phase = self
            .phase(charm)
            .map_err(|e| ActionError::NotReady(e.to_string()))?;

        ActionHandler::new(Arc::clone(&self.workload))
            .start_simulation(phase, timeout)
            .await
    }

    fn apply(&mut self, effect: &Effect) -> Result<(), ReconcileError> {
        debug!(effect = effect.kind(), "applying effect");
        match effect {
            Effect::ConfigureNetwork { attachment } => {
                self.model.configure_network(attachment)?;
            }
            Effect::WriteConfig { path, content } => {
                self.workload.write_file(path, content)?;
                info!(path = %path, "config file written");
            }
            Effect::RestartWorkload => {
                self.workload.restart()?;
                info!("workload restart requested");
            }
            Effect::ReplaceUpfRoute { route } => {
                let command = route.command();
                let output = self.workload.exec(&command)?;
                if !output.success() {
                    return Err(WorkloadError::CommandFailed {
                        command: command.join(" "),
                        exit_code: output.exit_code,
                        stderr: output.stderr,
                    }
                    .into());
                }
                info!(subnet = %route.subnet, gateway = %route.gateway, "UPF route created");
            }
            Effect::PublishIdentity {
                relation_id,
                identity,
            } => {
                self.model.publish_identity(*relation_id, identity)?;
            }
        }
        Ok(())
    }
}
