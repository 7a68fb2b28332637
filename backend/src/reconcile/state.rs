//! Applied state - the durable record of what the last pass applied
//!
//! # Critical Invariants
//!
//! - **Read before write**: every pass loads the record before planning
//! - **Stored after apply**: the record is written only once all effects
//!   succeeded, so a crash in between leads to a re-write, never a skip

use crate::reconcile::effects::UpfRoute;
use crate::render::Fingerprint;
use serde::{Deserialize, Serialize};
use std::fs;
use std::io::Write;
use std::path::{Path, PathBuf};
use thiserror::Error;

/// What the workload is known to be running with
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct AppliedState {
    pub config_fingerprint: Option<Fingerprint>,
    pub network_fingerprint: Option<Fingerprint>,
    pub upf_route: Option<UpfRoute>,
}

#[derive(Debug, Error)]
pub enum StateStoreError {
    #[error("failed to read state from {path}: {source}")]
    Read {
        path: PathBuf,
        #[source]
        source: std::io::Error,
    },

    #[error("failed to write state to {path}: {source}")]
    Write {
        path: PathBuf,
        #[source]
        source: std::io::Error,
    },

    #[error("corrupt state record at {path}: {source}")]
    Corrupt {
        path: PathBuf,
        #[source]
        source: serde_json::Error,
    },
}

/// Narrow load/store interface over charm-local durable storage
pub trait StateStore {
    fn load(&self) -> Result<AppliedState, StateStoreError>;
    fn store(&mut self, state: &AppliedState) -> Result<(), StateStoreError>;
}

// ============================================================================
// File-backed store
// ============================================================================

/// JSON record on local disk, replaced atomically on every store
#[derive(Debug, Clone)]
pub struct FileStateStore {
    path: PathBuf,
}

impl FileStateStore {
    pub fn new(path: impl Into<PathBuf>) -> Self {
        Self { path: path.into() }
    }

    pub fn path(&self) -> &Path {
        &self.path
    }

    fn write_error(&self, source: std::io::Error) -> StateStoreError {
        StateStoreError::Write {
            path: self.path.clone(),
            source,
        }
    }
}

impl StateStore for FileStateStore {
    /// A missing file is an empty record (first pass)
    fn load(&self) -> Result<AppliedState, StateStoreError> {
        let raw = match fs::read_to_string(&self.path) {
            Ok(raw) => raw,
            Err(e) if e.kind() == std::io::ErrorKind::NotFound => {
                return Ok(AppliedState::default())
            }
            Err(source) => {
                return Err(StateStoreError::Read {
                    path: self.path.clone(),
                    source,
                })
            }
        };

        serde_json::from_str(&raw).map_err(|source| StateStoreError::Corrupt {
            path: self.path.clone(),
            source,
        })
    }

    fn store(&mut self, state: &AppliedState) -> Result<(), StateStoreError> {
        let json = serde_json::to_vec_pretty(state).map_err(|source| StateStoreError::Corrupt {
            path: self.path.clone(),
            source,
        })?;

        if let Some(parent) = self.path.parent().filter(|p| !p.as_os_str().is_empty()) {
            fs::create_dir_all(parent).map_err(|e| self.write_error(e))?;
        }

        let tmp = self.path.with_extension("tmp");
        let mut file = fs::File::create(&tmp).map_err(|e| self.write_error(e))?;
        file.write_all(&json).map_err(|e| self.write_error(e))?;
        file.sync_all().map_err(|e| self.write_error(e))?;
        fs::rename(&tmp, &self.path).map_err(|e| self.write_error(e))?;
        Ok(())
    }
}

// ============================================================================
// In-memory store
// ============================================================================

/// Store kept in memory; counts writes so callers can assert on them
#[derive(Debug, Clone, Default)]
pub struct MemoryStateStore {
    state: AppliedState,
    writes: usize,
}

impl MemoryStateStore {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn with_state(state: AppliedState) -> Self {
        Self { state, writes: 0 }
    }

    pub fn state(&self) -> &AppliedState {
        &self.state
    }

    pub fn writes(&self) -> usize {
        self.writes
    }
}

impl StateStore for MemoryStateStore {
    fn load(&self) -> Result<AppliedState, StateStoreError> {
        Ok(self.state.clone())
    }

    fn store(&mut self, state: &AppliedState) -> Result<(), StateStoreError> {
        self.state = state.clone();
        self.writes += 1;
        Ok(())
    }
}
