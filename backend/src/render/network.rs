//! Multus network attachment for the gNB interface

use crate::config::{CanonicalSettings, InterfaceMode};
use crate::render::{fingerprint, Fingerprint, RenderError};
use serde::Serialize;
use serde_json::json;

pub const NETWORK_ATTACHMENT_NAME: &str = "gnb-net";
pub const GNB_INTERFACE_NAME: &str = "gnb";
pub const RAN_BRIDGE_NAME: &str = "ran-br";
pub const CNI_VERSION: &str = "0.3.1";

/// NetworkAttachmentDefinition spec plus the pod interface it is plugged into
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct NetworkAttachment {
    pub name: String,
    pub interface: String,
    /// CNI config, serialized as the NAD's `spec.config` string
    pub config: String,
    pub fingerprint: Fingerprint,
}

/// Render the gNB network attachment
///
/// Static IPAM with the configured gNB address; macvlan on the configured
/// host interface, or the `ran-br` bridge when none is set.
pub fn render_network_attachment(
    settings: &CanonicalSettings,
) -> Result<NetworkAttachment, RenderError> {
    let mut config = json!({
        "cniVersion": CNI_VERSION,
        "ipam": {
            "type": "static",
            "addresses": [{ "address": settings.gnb_address.to_string() }],
        },
        "capabilities": { "mac": true },
    });

    let plugin = match &settings.interface {
        InterfaceMode::Bridge => json!({ "type": "bridge", "bridge": RAN_BRIDGE_NAME }),
        InterfaceMode::Macvlan { master } => json!({ "type": "macvlan", "master": master }),
    };
    if let (Some(config), Some(plugin)) = (config.as_object_mut(), plugin.as_object()) {
        config.extend(plugin.clone());
    }

    let config = serde_json::to_string(&config).map_err(RenderError::NetworkAttachment)?;

    Ok(NetworkAttachment {
        name: NETWORK_ATTACHMENT_NAME.to_string(),
        interface: GNB_INTERFACE_NAME.to_string(),
        fingerprint: fingerprint(config.as_bytes()),
        config,
    })
}
