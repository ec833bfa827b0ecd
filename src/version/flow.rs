use super::{FlowId, VersionId};
use serde::{Deserialize, Serialize};

/// A flow: its identity, the published version and the draft being edited.
///
/// `versions` lists every version the flow ever owned, oldest first.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Flow {
    id: FlowId,
    published_version_id: Option<VersionId>,
    draft_version_id: VersionId,
    versions: Vec<VersionId>,
}

impl Flow {
    pub(crate) fn new(id: FlowId, draft_version_id: VersionId) -> Self {
        Self {
            id,
            published_version_id: None,
            draft_version_id,
            versions: vec![draft_version_id],
        }
    }

    pub fn id(&self) -> FlowId {
        self.id
    }

    pub fn published_version_id(&self) -> Option<VersionId> {
        self.published_version_id
    }

    pub fn draft_version_id(&self) -> VersionId {
        self.draft_version_id
    }

    pub fn versions(&self) -> &[VersionId] {
        &self.versions
    }

    pub fn is_published(&self) -> bool {
        self.published_version_id.is_some()
    }

    /// Records a publish: `locked` goes live and `draft` takes over editing.
    pub(crate) fn record_publish(&mut self, locked: VersionId, draft: VersionId) {
        self.published_version_id = Some(locked);
        self.draft_version_id = draft;
        if !self.versions.contains(&draft) {
            self.versions.push(draft);
        }
    }
}
