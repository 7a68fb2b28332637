//! Relation data exchanged with other charms
//!
//! - **n2**: AMF reachability consumed from the `fiveg-n2` relation
//! - **identity**: gNB identity published on `fiveg_gnb_identity`
//!
//! Relation data bags arrive as untyped string maps. They are parsed at the
//! config boundary and never travel further than that.

pub mod identity;
pub mod n2;

use serde::{Deserialize, Serialize};
use std::collections::BTreeMap;

/// Untyped relation data bag, as delivered by the orchestration layer
pub type RelationData = BTreeMap<String, String>;

/// Snapshot of every relation the core cares about
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct RelationSnapshot {
    /// Remote application data on `fiveg-n2`; `None` when the relation does not exist
    pub n2: Option<RelationData>,

    /// Ids of the established `fiveg_gnb_identity` relations
    pub gnb_identity_relation_ids: Vec<u32>,
}

pub use identity::{compute_identity, gnb_name, NotReadyError, PublishedIdentity};
pub use n2::parse_n2_data;
