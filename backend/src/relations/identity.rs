//! `fiveg_gnb_identity` relation: this gNB's identity for downstream consumers

use crate::config::CanonicalSettings;
use crate::reconcile::UnitContext;
use crate::relations::RelationData;
use serde::{Deserialize, Serialize};
use std::net::IpAddr;
use thiserror::Error;

pub const GNB_IDENTITY_RELATION_NAME: &str = "fiveg_gnb_identity";

/// NGAP (SCTP) port exposed by the gnbsim service
pub const NGAP_PORT: u16 = 38412;

/// Data published on every `fiveg_gnb_identity` relation
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct PublishedIdentity {
    pub gnb_name: String,
    pub tac: u32,
    pub gnb_address: IpAddr,
    pub ngap_port: u16,
}

impl PublishedIdentity {
    /// Application data bag form; relation values are always strings
    pub fn to_relation_data(&self) -> RelationData {
        let mut data = RelationData::new();
        data.insert("gnb_name".to_string(), self.gnb_name.clone());
        data.insert("tac".to_string(), self.tac.to_string());
        data.insert("gnb_address".to_string(), self.gnb_address.to_string());
        data.insert("ngap_port".to_string(), self.ngap_port.to_string());
        data
    }
}

/// The workload has no address yet, so there is nothing correct to publish
#[derive(Debug, Clone, PartialEq, Eq, Error)]
#[error("workload address is not known yet")]
pub struct NotReadyError;

/// gNB name: `<model>-gnbsim-<app>`
pub fn gnb_name(unit: &UnitContext) -> String {
    format!("{}-gnbsim-{}", unit.model_name, unit.app_name)
}

/// Compute the identity this unit publishes
///
/// Never returns partial data: without a workload address the caller must
/// wait for a later pass.
pub fn compute_identity(
    settings: &CanonicalSettings,
    unit: &UnitContext,
    workload_address: Option<IpAddr>,
) -> Result<PublishedIdentity, NotReadyError> {
    let gnb_address = workload_address.ok_or(NotReadyError)?;

    Ok(PublishedIdentity {
        gnb_name: gnb_name(unit),
        tac: settings.tac.value(),
        gnb_address,
        ngap_port: NGAP_PORT,
    })
}
