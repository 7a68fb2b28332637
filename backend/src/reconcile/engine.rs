//! Reconcile Engine - one pass from observed inputs to planned effects
//!
//! # Architecture
//!
//! `plan` is pure: it reads the inputs and the applied-state record and
//! returns an outcome, the effects to apply, and the record to store after
//! applying them. It never blocks and never retries.
//!
//! ```text
//! Every pass:
//! 1. Validate options                    → Blocked on bad config
//! 2. Resolve the fiveg-n2 relation        → Blocked (missing) / Waiting (no data yet)
//! 3. Container reachable, storage mounted → Waiting otherwise
//! 4. Network attachment changed?          → ConfigureNetwork
//!    Multus ready?                        → Waiting otherwise
//! 5. Render; fingerprint changed?         → WriteConfig + RestartWorkload (Applying)
//! 6. Workload running with an address?    → Waiting otherwise
//! 7. UPF route not recorded since the last restart → ReplaceUpfRoute
//! 8. Leader with identity relations       → PublishIdentity per relation
//! 9. Ready (Applied if anything changed, Unchanged otherwise)
//! ```
//!
//! Running `plan` again with the same inputs and the record it returned
//! yields no change effects, only the identical publish effects.

use crate::config::{self, CanonicalSettings};
use crate::reconcile::effects::{Effect, UpfRoute};
use crate::reconcile::inputs::ReconcileInputs;
use crate::reconcile::state::AppliedState;
use crate::relations::compute_identity;
use crate::render::{self, render_network_attachment, RenderError};
use crate::status::UnitStatus;
use crate::workload::config_path;
use serde::Serialize;
use std::fmt;
use tracing::{debug, info, warn};

pub const WAITING_FOR_CONTAINER: &str = "Waiting for container to be ready";
pub const WAITING_FOR_STORAGE: &str = "Waiting for storage to be attached";
pub const WAITING_FOR_NETWORK: &str = "Waiting for Multus to be ready";
pub const WAITING_FOR_WORKLOAD: &str = "Waiting for workload to be ready";

// ============================================================================
// Outcome Types
// ============================================================================

/// Result of one pass, drives the reported status
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
#[serde(tag = "outcome", content = "reason", rename_all = "snake_case")]
pub enum ReconciliationOutcome {
    Blocked(String),
    Waiting(String),
    /// Ready, and this pass changed something
    Applied,
    /// Ready, nothing to change
    Unchanged,
}

impl ReconciliationOutcome {
    pub fn status(&self) -> UnitStatus {
        match self {
            ReconciliationOutcome::Blocked(reason) => UnitStatus::Blocked(reason.clone()),
            ReconciliationOutcome::Waiting(reason) => UnitStatus::Waiting(reason.clone()),
            ReconciliationOutcome::Applied | ReconciliationOutcome::Unchanged => {
                UnitStatus::Active
            }
        }
    }
}

/// Where the pass ended up
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
#[serde(rename_all = "snake_case")]
pub enum EnginePhase {
    /// Bad config or missing integration
    Blocked,
    /// Workload or relation data not there yet
    Waiting,
    /// New config written and restart requested, workload not back yet
    Applying,
    /// Config applied, workload healthy, identity published
    Ready,
}

impl fmt::Display for EnginePhase {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(match self {
            EnginePhase::Blocked => "blocked",
            EnginePhase::Waiting => "waiting",
            EnginePhase::Applying => "applying",
            EnginePhase::Ready => "ready",
        })
    }
}

/// Everything one pass decided
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct ReconcilePlan {
    pub outcome: ReconciliationOutcome,
    pub phase: EnginePhase,
    /// Effects to apply, in order
    pub effects: Vec<Effect>,
    /// Record to store once every effect has been applied
    pub next_applied: AppliedState,
}

impl ReconcilePlan {
    fn halt(
        outcome: ReconciliationOutcome,
        phase: EnginePhase,
        effects: Vec<Effect>,
        next_applied: AppliedState,
    ) -> Self {
        Self {
            outcome,
            phase,
            effects,
            next_applied,
        }
    }

    pub fn status(&self) -> UnitStatus {
        self.outcome.status()
    }

    /// Whether this plan writes a new config file
    pub fn writes_config(&self) -> bool {
        self.effects
            .iter()
            .any(|e| matches!(e, Effect::WriteConfig { .. }))
    }
}

// ============================================================================
// Planning
// ============================================================================

/// Plan one reconciliation pass
///
/// # Errors
///
/// Only rendering failures, which are bugs. Bad input always ends in a
/// `Blocked` or `Waiting` plan instead.
pub fn plan(inputs: &ReconcileInputs, applied: &AppliedState) -> Result<ReconcilePlan, RenderError> {
    let charm = &inputs.charm;
    let workload = &inputs.workload;

    // Steps 1-2: config model
    let settings = match config::validate(&charm.options, &charm.relations) {
        Ok(settings) => settings,
        Err(err) => {
            let (outcome, phase) = if err.is_blocking() {
                warn!(reason = %err, "configuration blocks reconciliation");
                (ReconciliationOutcome::Blocked(err.to_string()), EnginePhase::Blocked)
            } else {
                info!(reason = %err, "waiting for relation data");
                (ReconciliationOutcome::Waiting(err.to_string()), EnginePhase::Waiting)
            };
            return Ok(ReconcilePlan::halt(outcome, phase, Vec::new(), applied.clone()));
        }
    };

    // Step 3: the workload filesystem must be reachable before anything is written
    if !workload.can_connect {
        let next = AppliedState {
            upf_route: None,
            ..applied.clone()
        };
        return Ok(waiting(WAITING_FOR_CONTAINER, Vec::new(), next));
    }
    if !workload.storage_attached {
        return Ok(waiting(WAITING_FOR_STORAGE, Vec::new(), applied.clone()));
    }

    let mut effects = Vec::new();
    let mut next = applied.clone();

    // Step 4: network attachment
    let attachment = render_network_attachment(&settings)?;
    if next.network_fingerprint.as_ref() != Some(&attachment.fingerprint) {
        debug!(fingerprint = %attachment.fingerprint, "network attachment changed");
        next.network_fingerprint = Some(attachment.fingerprint.clone());
        effects.push(Effect::ConfigureNetwork { attachment });
    }
    if !workload.network_ready {
        return Ok(waiting(WAITING_FOR_NETWORK, effects, next));
    }

    // Step 5: config file
    let rendered = render::render(&settings)?;
    let config_changed = next.config_fingerprint.as_ref() != Some(&rendered.fingerprint);
    if config_changed {
        info!(
            previous = ?next.config_fingerprint.as_ref().map(|f| f.as_str()),
            fingerprint = %rendered.fingerprint,
            subscribers = settings.subscriber_count,
            "config changed, scheduling write and restart"
        );
        next.config_fingerprint = Some(rendered.fingerprint.clone());
        // The restart may drop the route
        next.upf_route = None;
        effects.push(Effect::WriteConfig {
            path: config_path(),
            content: rendered.content,
        });
        effects.push(Effect::RestartWorkload);
    }

    // Step 6: the rest needs a running, addressable workload
    if !workload.is_ready() {
        // A workload seen down (restart, reschedule) comes back without the route
        next.upf_route = None;
        let phase = if config_changed {
            EnginePhase::Applying
        } else {
            EnginePhase::Waiting
        };
        return Ok(ReconcilePlan::halt(
            ReconciliationOutcome::Waiting(WAITING_FOR_WORKLOAD.to_string()),
            phase,
            effects,
            next,
        ));
    }

    // Step 7: UPF route
    let route = upf_route(&settings);
    if next.upf_route.as_ref() != Some(&route) {
        next.upf_route = Some(route.clone());
        effects.push(Effect::ReplaceUpfRoute { route });
    }

    // Step 8: identity
    publish_identity(inputs, &settings, &mut effects);

    // Step 9
    let outcome = if effects.iter().any(Effect::is_change) {
        ReconciliationOutcome::Applied
    } else {
        ReconciliationOutcome::Unchanged
    };
    debug!(?outcome, effects = effects.len(), "pass planned");

    Ok(ReconcilePlan {
        outcome,
        phase: EnginePhase::Ready,
        effects,
        next_applied: next,
    })
}

fn waiting(reason: &str, effects: Vec<Effect>, next: AppliedState) -> ReconcilePlan {
    info!(reason, "waiting for workload");
    ReconcilePlan::halt(
        ReconciliationOutcome::Waiting(reason.to_string()),
        EnginePhase::Waiting,
        effects,
        next,
    )
}

fn upf_route(settings: &CanonicalSettings) -> UpfRoute {
    UpfRoute {
        subnet: settings.upf_subnet,
        gateway: settings.upf_gateway,
    }
}

fn publish_identity(inputs: &ReconcileInputs, settings: &CanonicalSettings, effects: &mut Vec<Effect>) {
    let unit = &inputs.charm.unit;
    let relation_ids = &inputs.charm.relations.gnb_identity_relation_ids;

    if !unit.is_leader {
        debug!("not the leader, skipping identity publication");
        return;
    }
    if relation_ids.is_empty() {
        debug!("no fiveg_gnb_identity relations");
        return;
    }

    // The workload was checked ready above, so the address is known.
    let Ok(identity) = compute_identity(settings, unit, inputs.workload.address) else {
        return;
    };

    for relation_id in relation_ids {
        effects.push(Effect::PublishIdentity {
            relation_id: *relation_id,
            identity: identity.clone(),
        });
    }
}
