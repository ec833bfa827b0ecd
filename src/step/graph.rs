use super::definition::{Step, StepId, StepSettings};
use super::naming::StepNamer;
use crate::error::StructuralError;
use ahash::{AHashMap, AHashSet};
use serde::{Deserialize, Serialize};
use std::collections::BTreeMap;

/// A position in the graph that can hold the head of a chain.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Slot {
    /// The `next_action` link of a step.
    After(StepId),
    /// The child chain of a router branch.
    Branch { router: StepId, index: usize },
    /// The body chain of a loop.
    Loop(StepId),
}

/// Arena of steps rooted at a trigger.
///
/// Steps reference each other by `StepId`. The map is ordered so the
/// serialized form is stable for a given graph. Deserialization runs
/// `check_integrity`, so every graph in memory holds its trigger.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase", try_from = "RawStepGraph")]
pub struct StepGraph {
    trigger: StepId,
    steps: BTreeMap<StepId, Step>,
    next_id: u32,
}

/// Unchecked wire form of a `StepGraph`.
#[derive(Deserialize)]
#[serde(rename_all = "camelCase")]
struct RawStepGraph {
    trigger: StepId,
    steps: BTreeMap<StepId, Step>,
    next_id: u32,
}

impl TryFrom<RawStepGraph> for StepGraph {
    type Error = StructuralError;

    fn try_from(raw: RawStepGraph) -> Result<Self, Self::Error> {
        let graph = StepGraph {
            trigger: raw.trigger,
            steps: raw.steps,
            next_id: raw.next_id,
        };
        graph.check_integrity()?;
        Ok(graph)
    }
}

fn inconsistent(reason: String) -> StructuralError {
    StructuralError::InconsistentGraph { reason }
}

impl StepGraph {
    /// Creates a graph holding only the given trigger settings.
    pub fn new(trigger_name: &str, display_name: &str, settings: StepSettings) -> Self {
        let id = StepId(0);
        let mut steps = BTreeMap::new();
        steps.insert(
            id,
            Step {
                id,
                name: trigger_name.to_string(),
                display_name: display_name.to_string(),
                valid: false,
                next_action: None,
                settings,
            },
        );
        Self {
            trigger: id,
            steps,
            next_id: 1,
        }
    }

    pub fn trigger_id(&self) -> StepId {
        self.trigger
    }

    pub fn trigger(&self) -> &Step {
        // Present in every built or deserialized graph; deletes never reach it.
        &self.steps[&self.trigger]
    }

    /// Checks that the arena holds together: the trigger exists, the id
    /// counter is past every id, names are unique, and every step other than
    /// the trigger is linked from exactly one slot and reachable from it.
    pub fn check_integrity(&self) -> Result<(), StructuralError> {
        if !self.steps.contains_key(&self.trigger) {
            return Err(inconsistent(format!("trigger {} has no step", self.trigger)));
        }
        if let Some(last) = self.steps.keys().next_back() {
            if self.next_id <= last.0 {
                return Err(inconsistent(format!(
                    "next id {} is not past step {}",
                    self.next_id, last
                )));
            }
        }

        let mut names = AHashSet::new();
        let mut owners: AHashMap<StepId, usize> = AHashMap::new();
        for (id, step) in &self.steps {
            if step.id != *id {
                return Err(inconsistent(format!(
                    "step '{}' is stored under {} but claims {}",
                    step.name, id, step.id
                )));
            }
            if !names.insert(step.name.as_str()) {
                return Err(StructuralError::DuplicateStepName {
                    name: step.name.clone(),
                });
            }
            for target in step.next_action.into_iter().chain(step.settings.children()) {
                if !self.steps.contains_key(&target) {
                    return Err(inconsistent(format!(
                        "step '{}' links to missing step {}",
                        step.name, target
                    )));
                }
                *owners.entry(target).or_default() += 1;
            }
        }

        for (id, step) in &self.steps {
            let count = owners.get(id).copied().unwrap_or(0);
            let expected = if *id == self.trigger { 0 } else { 1 };
            if count != expected {
                return Err(inconsistent(format!(
                    "step '{}' is linked from {} places",
                    step.name, count
                )));
            }
        }
        if self.traverse().len() != self.steps.len() {
            return Err(inconsistent("some steps are not reachable from the trigger".to_string()));
        }
        Ok(())
    }

    pub fn get(&self, id: StepId) -> Option<&Step> {
        self.steps.get(&id)
    }

    pub(crate) fn get_mut(&mut self, id: StepId) -> Option<&mut Step> {
        self.steps.get_mut(&id)
    }

    pub fn len(&self) -> usize {
        self.steps.len()
    }

    pub fn is_empty(&self) -> bool {
        self.steps.is_empty()
    }

    /// Resolves a step name to its id.
    pub fn find(&self, name: &str) -> Option<StepId> {
        self.steps
            .values()
            .find(|step| step.name == name)
            .map(|step| step.id)
    }

    pub fn step(&self, name: &str) -> Option<&Step> {
        self.find(name).and_then(|id| self.steps.get(&id))
    }

    pub fn names(&self) -> AHashSet<String> {
        self.steps.values().map(|step| step.name.clone()).collect()
    }

    /// Steps reachable from the trigger in declaration order: the trigger,
    /// then each action, descending into every child chain of a step before
    /// continuing with its successor.
    pub fn traverse(&self) -> Vec<StepId> {
        let mut out = Vec::with_capacity(self.steps.len());
        let mut seen = AHashSet::new();
        self.collect_chain(Some(self.trigger), &mut out, &mut seen);
        out
    }

    /// The step itself plus every step in its child chains, excluding its successors.
    pub fn subtree(&self, id: StepId) -> Vec<StepId> {
        let mut out = Vec::new();
        let mut seen = AHashSet::new();
        if let Some(step) = self.steps.get(&id) {
            seen.insert(id);
            out.push(id);
            for child in step.settings.children() {
                self.collect_chain(Some(child), &mut out, &mut seen);
            }
        }
        out
    }

    /// Every step of the chain starting at `head`, children included.
    pub fn chain(&self, head: Option<StepId>) -> Vec<StepId> {
        let mut out = Vec::new();
        let mut seen = AHashSet::new();
        self.collect_chain(head, &mut out, &mut seen);
        out
    }

    fn collect_chain(
        &self,
        head: Option<StepId>,
        out: &mut Vec<StepId>,
        seen: &mut AHashSet<StepId>,
    ) {
        let mut cursor = head;
        while let Some(id) = cursor {
            // A repeated id means a corrupted snapshot; stop instead of looping.
            if !seen.insert(id) {
                break;
            }
            let Some(step) = self.steps.get(&id) else {
                break;
            };
            out.push(id);
            for child in step.settings.children() {
                self.collect_chain(Some(child), out, seen);
            }
            cursor = step.next_action;
        }
    }

    /// Finds the slot currently pointing at `id`. The trigger has none.
    pub fn slot_of(&self, id: StepId) -> Option<Slot> {
        self.steps.values().find_map(|step| {
            if step.next_action == Some(id) {
                return Some(Slot::After(step.id));
            }
            match &step.settings {
                StepSettings::Router(router) => router
                    .branches
                    .iter()
                    .position(|branch| branch.child == Some(id))
                    .map(|index| Slot::Branch {
                        router: step.id,
                        index,
                    }),
                StepSettings::LoopOnItems(settings) if settings.first_loop_action == Some(id) => {
                    Some(Slot::Loop(step.id))
                }
                _ => None,
            }
        })
    }

    /// Current head of a slot. Unknown owners read as empty.
    pub fn slot_head(&self, slot: Slot) -> Option<StepId> {
        match slot {
            Slot::After(owner) => self.steps.get(&owner).and_then(|step| step.next_action),
            Slot::Branch { router, index } => self
                .steps
                .get(&router)
                .and_then(|step| step.settings.as_router())
                .and_then(|settings| settings.branches.get(index))
                .and_then(|branch| branch.child),
            Slot::Loop(owner) => match self.steps.get(&owner).map(|step| &step.settings) {
                Some(StepSettings::LoopOnItems(settings)) => settings.first_loop_action,
                _ => None,
            },
        }
    }

    pub(crate) fn set_slot_head(&mut self, slot: Slot, head: Option<StepId>) {
        match slot {
            Slot::After(owner) => {
                if let Some(step) = self.steps.get_mut(&owner) {
                    step.next_action = head;
                }
            }
            Slot::Branch { router, index } => {
                if let Some(branch) = self
                    .steps
                    .get_mut(&router)
                    .and_then(|step| step.settings.as_router_mut())
                    .and_then(|settings| settings.branches.get_mut(index))
                {
                    branch.child = head;
                }
            }
            Slot::Loop(owner) => {
                if let Some(StepSettings::LoopOnItems(settings)) =
                    self.steps.get_mut(&owner).map(|step| &mut step.settings)
                {
                    settings.first_loop_action = head;
                }
            }
        }
    }

    /// Adds a detached step to the arena and returns its fresh id.
    pub(crate) fn insert(
        &mut self,
        name: String,
        display_name: String,
        settings: StepSettings,
    ) -> StepId {
        let past_last = self.steps.keys().next_back().map_or(0, |last| last.0 + 1);
        let id = StepId(self.next_id.max(past_last));
        self.next_id = id.0 + 1;
        self.steps.insert(
            id,
            Step {
                id,
                name,
                display_name,
                valid: false,
                next_action: None,
                settings,
            },
        );
        id
    }

    /// Links a detached step in as the new head of `slot`; the previous head
    /// becomes its successor.
    pub(crate) fn attach(&mut self, slot: Slot, id: StepId) {
        let previous = self.slot_head(slot);
        if let Some(step) = self.steps.get_mut(&id) {
            step.next_action = previous;
        }
        self.set_slot_head(slot, Some(id));
    }

    /// Unlinks a step from its chain, re-linking its successor in its place.
    pub(crate) fn detach(&mut self, id: StepId) {
        let next = self.steps.get(&id).and_then(|step| step.next_action);
        if let Some(slot) = self.slot_of(id) {
            self.set_slot_head(slot, next);
        }
        if let Some(step) = self.steps.get_mut(&id) {
            step.next_action = None;
        }
    }

    /// Drops every listed step from the arena and returns their names in order.
    pub(crate) fn remove_all(&mut self, ids: &[StepId]) -> Vec<String> {
        ids.iter()
            .filter_map(|id| self.steps.remove(id))
            .map(|step| step.name)
            .collect()
    }

    /// Deep copies a step and its child chains (not its successors) under
    /// fresh ids and names. The copy is detached.
    pub(crate) fn copy_step_tree(
        &mut self,
        id: StepId,
        namer: &dyn StepNamer,
        taken: &mut AHashSet<String>,
    ) -> Option<StepId> {
        let source = self.steps.get(&id)?.clone();
        let name = namer.mint(taken);
        taken.insert(name.clone());

        let mut settings = source.settings;
        for slot in settings.child_slots_mut() {
            let head = *slot;
            *slot = head.and_then(|head| self.copy_chain_inner(head, namer, taken));
        }
        Some(self.insert(name, source.display_name, settings))
    }

    /// Deep copies a whole chain starting at `head`, returning the head of the copy.
    pub(crate) fn copy_chain(
        &mut self,
        head: Option<StepId>,
        namer: &dyn StepNamer,
        taken: &mut AHashSet<String>,
    ) -> Option<StepId> {
        head.and_then(|head| self.copy_chain_inner(head, namer, taken))
    }

    fn copy_chain_inner(
        &mut self,
        head: StepId,
        namer: &dyn StepNamer,
        taken: &mut AHashSet<String>,
    ) -> Option<StepId> {
        let originals = self.chain_links(head);
        let copies: Vec<StepId> = originals
            .iter()
            .filter_map(|id| self.copy_step_tree(*id, namer, taken))
            .collect();
        for pair in copies.windows(2) {
            if let Some(step) = self.steps.get_mut(&pair[0]) {
                step.next_action = Some(pair[1]);
            }
        }
        copies.first().copied()
    }

    /// Only the `next_action` links of a chain, without descending into children.
    fn chain_links(&self, head: StepId) -> Vec<StepId> {
        let mut out = Vec::new();
        let mut seen = AHashSet::new();
        let mut cursor = Some(head);
        while let Some(id) = cursor {
            if !seen.insert(id) {
                break;
            }
            let Some(step) = self.steps.get(&id) else {
                break;
            };
            out.push(id);
            cursor = step.next_action;
        }
        out
    }
}
