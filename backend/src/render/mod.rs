//! Template renderer - canonical settings into on-disk artifacts
//!
//! # Critical Invariants
//!
//! - **Determinism**: equal settings produce byte-identical output, so the
//!   fingerprint alone decides whether the workload must be restarted
//! - **Explicit subscribers**: one record per simulated subscriber, never left
//!   for the simulator to derive
//! - **Stateless**: rendering reads settings and nothing else

pub mod gnbsim;
pub mod network;

use crate::config::CanonicalSettings;
use serde::{Deserialize, Serialize};
use sha2::{Digest, Sha256};
use std::fmt;
use thiserror::Error;

pub use gnbsim::GnbsimDocument;
pub use network::{render_network_attachment, NetworkAttachment};

/// Rendering failures are bugs, never bad operator input
#[derive(Debug, Error)]
pub enum RenderError {
    #[error("failed to serialize gnbsim configuration: {0}")]
    Config(#[source] serde_yaml::Error),

    #[error("failed to serialize network attachment: {0}")]
    NetworkAttachment(#[source] serde_json::Error),
}

/// SHA256 of rendered content, lowercase hex
#[derive(Debug, Clone, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(transparent)]
pub struct Fingerprint(String);

impl Fingerprint {
    pub fn as_str(&self) -> &str {
        &self.0
    }
}

impl fmt::Display for Fingerprint {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&self.0)
    }
}

/// Compute the fingerprint of rendered bytes
pub fn fingerprint(content: &[u8]) -> Fingerprint {
    let mut hasher = Sha256::new();
    hasher.update(content);
    Fingerprint(format!("{:x}", hasher.finalize()))
}

/// Rendered gnbsim configuration file
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct RenderedConfig {
    pub content: String,
    pub fingerprint: Fingerprint,
}

/// Render the gnbsim configuration file
///
/// # Example
/// ```rust,ignore
/// let rendered = render(&settings)?;
/// if applied.config_fingerprint.as_ref() != Some(&rendered.fingerprint) {
///     // write and restart
/// }
/// ```
pub fn render(settings: &CanonicalSettings) -> Result<RenderedConfig, RenderError> {
    let document = GnbsimDocument::from_settings(settings);
    let content = serde_yaml::to_string(&document).map_err(RenderError::Config)?;

    Ok(RenderedConfig {
        fingerprint: fingerprint(content.as_bytes()),
        content,
    })
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_fingerprint_is_sha256_hex() {
        let fp = fingerprint(b"");
        assert_eq!(
            fp.as_str(),
            "e3b0c44298fc1c149afbf4c8996fb92427ae41e4649b934ca495991b7852b855"
        );
    }

    #[test]
    fn test_fingerprint_differs_for_different_content() {
        assert_ne!(fingerprint(b"ueCount: 1"), fingerprint(b"ueCount: 3"));
    }
}
