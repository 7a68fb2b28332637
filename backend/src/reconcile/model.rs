//! Model handle - effects owned by the orchestration layer

use crate::relations::PublishedIdentity;
use crate::render::NetworkAttachment;
use thiserror::Error;

#[derive(Debug, Error)]
pub enum ModelError {
    #[error("relation {relation_id} is gone")]
    RelationNotFound { relation_id: u32 },

    #[error("failed to publish relation data: {0}")]
    Publish(String),

    #[error("failed to configure network attachment {name}: {reason}")]
    Network { name: String, reason: String },
}

/// Relation data and cluster objects, written on the unit's behalf
pub trait ModelHandle {
    fn publish_identity(
        &mut self,
        relation_id: u32,
        identity: &PublishedIdentity,
    ) -> Result<(), ModelError>;

    fn configure_network(&mut self, attachment: &NetworkAttachment) -> Result<(), ModelError>;
}
