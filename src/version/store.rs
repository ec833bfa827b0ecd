use super::{Flow, FlowVersion, VersionId, VersionState};
use crate::error::StoreError;
use ahash::AHashMap;
use serde::{Deserialize, Serialize};
use std::fs;
use std::sync::Arc;

/// Persistence seam for version snapshots.
///
/// Writes are last-write-wins: `put` replaces whatever draft is stored under
/// the same id. Locked versions are never replaced.
pub trait VersionStore {
    /// Allocates the next version id. Ids increase monotonically.
    fn next_version_id(&mut self) -> VersionId;

    fn get(&self, id: VersionId) -> Option<Arc<FlowVersion>>;

    fn put(&mut self, version: Arc<FlowVersion>) -> Result<(), StoreError>;

    /// Every stored version, ordered by id.
    fn versions(&self) -> Vec<Arc<FlowVersion>>;
}

/// In-memory store for tests, tools and embedding.
#[derive(Debug, Default)]
pub struct MemoryStore {
    versions: AHashMap<VersionId, Arc<FlowVersion>>,
    next_id: u64,
}

impl MemoryStore {
    pub fn new() -> Self {
        Self::default()
    }
}

impl VersionStore for MemoryStore {
    fn next_version_id(&mut self) -> VersionId {
        self.next_id += 1;
        VersionId(self.next_id)
    }

    fn get(&self, id: VersionId) -> Option<Arc<FlowVersion>> {
        self.versions.get(&id).cloned()
    }

    fn put(&mut self, version: Arc<FlowVersion>) -> Result<(), StoreError> {
        let id = version.id();
        if let Some(existing) = self.versions.get(&id) {
            if existing.state() == VersionState::Locked && existing != &version {
                return Err(StoreError::LockedOverwrite(id));
            }
        }
        self.next_id = self.next_id.max(id.0);
        self.versions.insert(id, version);
        Ok(())
    }

    fn versions(&self) -> Vec<Arc<FlowVersion>> {
        let mut out: Vec<_> = self.versions.values().cloned().collect();
        out.sort_by_key(|version| version.id());
        out
    }
}

/// A flow with all of its versions, as written to and read from disk.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct FlowSnapshot {
    pub flow: Flow,
    pub versions: Vec<FlowVersion>,
}

impl FlowSnapshot {
    pub fn to_json(&self) -> Result<String, StoreError> {
        Ok(serde_json::to_string_pretty(self)?)
    }

    pub fn from_json(json: &str) -> Result<Self, StoreError> {
        Ok(serde_json::from_str(json)?)
    }

    /// Saves the snapshot to a file as pretty-printed JSON.
    pub fn save(&self, path: &str) -> Result<(), StoreError> {
        let json = self.to_json()?;
        fs::write(path, json).map_err(|source| StoreError::Io {
            path: path.to_string(),
            source,
        })
    }

    /// Loads a snapshot from a file.
    pub fn from_file(path: &str) -> Result<Self, StoreError> {
        let json = fs::read_to_string(path).map_err(|source| StoreError::Io {
            path: path.to_string(),
            source,
        })?;
        Self::from_json(&json)
    }

    pub fn version(&self, id: VersionId) -> Option<&FlowVersion> {
        self.versions.iter().find(|version| version.id() == id)
    }
}
