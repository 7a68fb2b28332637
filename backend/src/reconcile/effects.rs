//! Effects - the side effects a pass asks for, as plain data
//!
//! The engine only describes effects; [`Operator`](super::Operator) applies
//! them in the order they were planned.

use crate::relations::PublishedIdentity;
use crate::render::NetworkAttachment;
use ipnetwork::IpNetwork;
use serde::{Deserialize, Serialize};
use std::net::IpAddr;

/// Route from the gNB to the UPF's subnet
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct UpfRoute {
    pub subnet: IpNetwork,
    pub gateway: IpAddr,
}

impl UpfRoute {
    /// `ip route replace <subnet> via <gateway>`, idempotent inside the workload
    pub fn command(&self) -> Vec<String> {
        vec![
            "ip".to_string(),
            "route".to_string(),
            "replace".to_string(),
            self.subnet.to_string(),
            "via".to_string(),
            self.gateway.to_string(),
        ]
    }
}

#[derive(Debug, Clone, PartialEq, Serialize)]
#[serde(tag = "type", rename_all = "snake_case")]
pub enum Effect {
    /// Create or replace the Multus network attachment
    ConfigureNetwork { attachment: NetworkAttachment },

    /// Write the rendered config file into the workload
    WriteConfig { path: String, content: String },

    /// Restart the gnbsim service so it reads the new config
    RestartWorkload,

    /// Point the UPF subnet at the configured gateway
    ReplaceUpfRoute { route: UpfRoute },

    /// Publish identity on one `fiveg_gnb_identity` relation
    PublishIdentity {
        relation_id: u32,
        identity: PublishedIdentity,
    },
}

impl Effect {
    /// Whether applying this effect changes workload or network state
    ///
    /// Publishing identical identity data is not a change.
    pub fn is_change(&self) -> bool {
        !matches!(self, Effect::PublishIdentity { .. })
    }

    /// Short name for logs
    pub fn kind(&self) -> &'static str {
        match self {
            Effect::ConfigureNetwork { .. } => "configure_network",
            Effect::WriteConfig { .. } => "write_config",
            Effect::RestartWorkload => "restart_workload",
            Effect::ReplaceUpfRoute { .. } => "replace_upf_route",
            Effect::PublishIdentity { .. } => "publish_identity",
        }
    }
}
