use super::{Flow, FlowId, FlowSnapshot, FlowVersion, MemoryStore, VersionId, VersionState, VersionStore};
use crate::error::{FlowError, InvariantViolation, StructuralError};
use crate::operation::{FlowOperation, LockAndPublishRequest, UseAsDraftRequest};
use crate::step::{SequentialNamer, StepNamer};
use itertools::Itertools;
use std::sync::Arc;

/// What subscribers see after an operation or transition has been committed.
pub struct OperationEvent<'a> {
    pub operation: &'a FlowOperation,
    /// The flow's draft after the change.
    pub version: &'a FlowVersion,
    /// Names of steps that no longer exist in the draft.
    pub removed_steps: &'a [String],
}

pub type Observer = Box<dyn Fn(&OperationEvent<'_>) + Send + Sync>;

pub struct FlowEditorBuilder<S: VersionStore> {
    store: S,
    flow_id: FlowId,
    display_name: String,
    namer: Box<dyn StepNamer>,
    observers: Vec<Observer>,
}

impl<S: VersionStore> FlowEditorBuilder<S> {
    pub fn new(store: S) -> Self {
        Self {
            store,
            flow_id: FlowId(1),
            display_name: "Untitled".to_string(),
            namer: Box::new(SequentialNamer::default()),
            observers: Vec::new(),
        }
    }

    pub fn flow_id(mut self, flow_id: FlowId) -> Self {
        self.flow_id = flow_id;
        self
    }

    pub fn display_name(mut self, display_name: impl Into<String>) -> Self {
        self.display_name = display_name.into();
        self
    }

    pub fn with_namer(mut self, namer: impl StepNamer + 'static) -> Self {
        self.namer = Box::new(namer);
        self
    }

    pub fn with_observer(
        mut self,
        observer: impl Fn(&OperationEvent<'_>) + Send + Sync + 'static,
    ) -> Self {
        self.observers.push(Box::new(observer));
        self
    }

    /// Creates the flow together with its first, trigger-only draft.
    pub fn build(mut self) -> Result<FlowEditor<S>, FlowError> {
        let id = self.store.next_version_id();
        let draft = Arc::new(FlowVersion::new(id, self.flow_id, self.display_name));
        self.store.put(draft.clone())?;
        log::info!("Created {} with draft {}", self.flow_id, id);
        Ok(FlowEditor {
            flow: Flow::new(self.flow_id, id),
            store: self.store,
            draft,
            namer: self.namer,
            observers: self.observers,
        })
    }
}

/// Owns a flow and serializes every change to its draft.
///
/// Writers go through `&mut self`, so one operation is applied at a time.
/// Readers hold `Arc` snapshots and never see a half-applied operation: a new
/// draft is fully built and stored before it replaces the current one.
/// Two editors over the same stored flow are last-write-wins.
pub struct FlowEditor<S: VersionStore> {
    flow: Flow,
    store: S,
    draft: Arc<FlowVersion>,
    namer: Box<dyn StepNamer>,
    observers: Vec<Observer>,
}

impl<S: VersionStore> FlowEditor<S> {
    pub fn builder(store: S) -> FlowEditorBuilder<S> {
        FlowEditorBuilder::new(store)
    }

    /// Registers a subscriber. Subscribers run in registration order after each commit.
    pub fn subscribe(&mut self, observer: impl Fn(&OperationEvent<'_>) + Send + Sync + 'static) {
        self.observers.push(Box::new(observer));
    }

    pub fn flow(&self) -> &Flow {
        &self.flow
    }

    pub fn store(&self) -> &S {
        &self.store
    }

    pub fn draft(&self) -> Arc<FlowVersion> {
        self.draft.clone()
    }

    pub fn published(&self) -> Option<Arc<FlowVersion>> {
        self.flow
            .published_version_id()
            .and_then(|id| self.store.get(id))
    }

    pub fn version(&self, id: VersionId) -> Option<Arc<FlowVersion>> {
        self.store
            .get(id)
            .filter(|version| version.flow_id() == self.flow.id())
    }

    /// Applies any operation to the flow's current draft.
    pub fn apply(&mut self, operation: &FlowOperation) -> Result<Arc<FlowVersion>, FlowError> {
        match operation {
            FlowOperation::LockAndPublish(_) => self.lock_and_publish(),
            FlowOperation::UseAsDraft(request) => self.overwrite_draft_with_version(request.version_id),
            _ => {
                let outcome = self.draft.apply_with(operation, self.namer.as_ref())?;
                self.commit(operation, outcome.version, &outcome.removed_steps)
            }
        }
    }

    /// Like `apply`, but only if `version_id` is still the flow's draft.
    pub fn apply_to(
        &mut self,
        version_id: VersionId,
        operation: &FlowOperation,
    ) -> Result<Arc<FlowVersion>, FlowError> {
        if version_id != self.flow.draft_version_id() {
            return Err(match self.version(version_id) {
                Some(version) if version.state() == VersionState::Locked => {
                    InvariantViolation::VersionLocked { id: version_id }
                }
                _ => InvariantViolation::NotCurrentDraft { id: version_id },
            }
            .into());
        }
        self.apply(operation)
    }

    /// Locks the current draft, makes it the published version, and opens a
    /// fresh draft with the same content. Returns the new draft.
    pub fn lock_and_publish(&mut self) -> Result<Arc<FlowVersion>, FlowError> {
        let draft = self.draft.clone();
        if draft.id() != self.flow.draft_version_id() {
            return Err(InvariantViolation::NotCurrentDraft { id: draft.id() }.into());
        }
        if draft.state() == VersionState::Locked {
            return Err(InvariantViolation::VersionLocked { id: draft.id() }.into());
        }
        if !draft.is_valid() {
            let reason = draft.validation_issues().iter().join("; ");
            log::warn!("Refused to publish {}: {}", draft.id(), reason);
            return Err(InvariantViolation::InvalidVersion {
                id: draft.id(),
                reason,
            }
            .into());
        }

        let next_id = self.store.next_version_id();
        let locked = Arc::new(draft.locked());
        let next = Arc::new(locked.fork(next_id));
        // Draft first: a failed lock leaves the flow on its old draft.
        self.store.put(next.clone())?;
        self.store.put(locked.clone())?;
        self.flow.record_publish(locked.id(), next_id);
        log::info!(
            "Published {} for {}; editing continues on {}",
            locked.id(),
            self.flow.id(),
            next_id
        );

        let operation = FlowOperation::LockAndPublish(LockAndPublishRequest {});
        self.draft = next.clone();
        self.notify(&operation, &next, &[]);
        Ok(next)
    }

    /// Replaces the draft's content with a copy of a locked version. Used to
    /// discard unpublished changes or to revert to an older version.
    pub fn overwrite_draft_with_version(
        &mut self,
        version_id: VersionId,
    ) -> Result<Arc<FlowVersion>, FlowError> {
        let source = self
            .version(version_id)
            .ok_or(StructuralError::VersionNotFound { id: version_id })?;
        if source.state() != VersionState::Locked {
            return Err(InvariantViolation::VersionNotLocked { id: version_id }.into());
        }

        let next = self
            .draft
            .with_content(source.display_name().to_string(), source.graph().clone());
        let kept = next.graph().names();
        let removed: Vec<String> = self
            .draft
            .step_names()
            .into_iter()
            .filter(|name| !kept.contains(*name))
            .map(str::to_string)
            .collect();
        log::info!(
            "Overwrote draft {} with {}",
            self.draft.id(),
            version_id
        );
        let operation = FlowOperation::UseAsDraft(UseAsDraftRequest { version_id });
        self.commit(&operation, next, &removed)
    }

    /// Overwrites the draft with the published version.
    pub fn discard_changes(&mut self) -> Result<Arc<FlowVersion>, FlowError> {
        let published = self
            .flow
            .published_version_id()
            .ok_or(InvariantViolation::NothingPublished)?;
        self.overwrite_draft_with_version(published)
    }

    pub fn snapshot(&self) -> FlowSnapshot {
        FlowSnapshot {
            flow: self.flow.clone(),
            versions: self
                .store
                .versions()
                .into_iter()
                .filter(|version| version.flow_id() == self.flow.id())
                .map(|version| version.as_ref().clone())
                .collect(),
        }
    }

    fn commit(
        &mut self,
        operation: &FlowOperation,
        version: FlowVersion,
        removed_steps: &[String],
    ) -> Result<Arc<FlowVersion>, FlowError> {
        let version = Arc::new(version);
        self.store.put(version.clone())?;
        self.draft = version.clone();
        self.notify(operation, &version, removed_steps);
        Ok(version)
    }

    fn notify(&self, operation: &FlowOperation, version: &FlowVersion, removed_steps: &[String]) {
        let event = OperationEvent {
            operation,
            version,
            removed_steps,
        };
        for observer in &self.observers {
            observer(&event);
        }
    }
}

impl FlowEditor<MemoryStore> {
    /// Reopens a saved flow in memory. The draft's validity is recomputed.
    ///
    /// Step graphs are checked when the snapshot is deserialized; this also
    /// requires every version the flow lists to be present.
    pub fn from_snapshot(snapshot: FlowSnapshot) -> Result<Self, FlowError> {
        let mut store = MemoryStore::new();
        for version in snapshot.versions {
            store.put(Arc::new(version))?;
        }
        if let Some(id) = snapshot
            .flow
            .versions()
            .iter()
            .copied()
            .find(|id| store.get(*id).is_none())
        {
            return Err(StructuralError::VersionNotFound { id }.into());
        }
        let draft_id = snapshot.flow.draft_version_id();
        let stored = store
            .get(draft_id)
            .ok_or(StructuralError::VersionNotFound { id: draft_id })?;
        let draft = Arc::new(stored.with_content(
            stored.display_name().to_string(),
            stored.graph().clone(),
        ));
        store.put(draft.clone())?;

        Ok(Self {
            flow: snapshot.flow,
            store,
            draft,
            namer: Box::new(SequentialNamer::default()),
            observers: Vec::new(),
        })
    }
}
