//! Concrete undoable edits over a [`Workspace`].
//!
//! Every command here keeps just enough state to re-apply and revert itself:
//! moves keep both endpoints, updates keep the record they replaced, deletes
//! keep a snapshot of every scene element they removed together with its
//! paint index.

#[cfg(test)]
#[path = "commands_test.rs"]
mod commands_test;

use std::any::Any;

use tracing::{debug, warn};

use crate::doc::{PartialRegion, Region, RegionId};
use crate::error::CommandError;
use crate::geom::Point;
use crate::history::{Command, CommandMeta};
use crate::scene::{ElementId, SceneElement, SceneGraph};
use crate::workspace::{RegionBinding, Workspace};

// =============================================================================
// MoveRegion
// =============================================================================

/// Move a region (and the elements it carries) between two positions.
///
/// Consecutive moves of the same region inside the merge window fold into
/// one entry whose undo returns to where the first move started. Moves that
/// carry different members never fold: each element only travels back as far
/// as it was carried.
#[derive(Debug, Clone)]
pub struct MoveRegion {
    meta: CommandMeta,
    region: RegionId,
    from: Point,
    to: Point,
    carry: Vec<ElementId>,
    merge_window_ms: u64,
}

impl MoveRegion {
    #[must_use]
    pub fn new(region: RegionId, from: Point, to: Point, carry: Vec<ElementId>, now_ms: u64, merge_window_ms: u64) -> Self {
        Self { meta: CommandMeta::new("move_region", "Move region", now_ms), region, from, to, carry, merge_window_ms }
    }

    #[must_use]
    pub fn region(&self) -> RegionId {
        self.region
    }

    #[must_use]
    pub fn start(&self) -> Point {
        self.from
    }

    #[must_use]
    pub fn end(&self) -> Point {
        self.to
    }
}

impl<S: SceneGraph + 'static> Command<Workspace<S>> for MoveRegion {
    fn execute(&mut self, ws: &mut Workspace<S>) -> Result<(), CommandError> {
        ws.place_region(&self.region, self.to, &self.carry)
    }

    fn undo(&mut self, ws: &mut Workspace<S>) -> Result<(), CommandError> {
        ws.place_region(&self.region, self.from, &self.carry)
    }

    fn meta(&self) -> &CommandMeta {
        &self.meta
    }

    fn can_merge(&self, next: &dyn Command<Workspace<S>>) -> bool {
        next.as_any().downcast_ref::<MoveRegion>().is_some_and(|n| {
            n.region == self.region
                && n.carry == self.carry
                && n.meta.timestamp_ms.saturating_sub(self.meta.timestamp_ms) <= self.merge_window_ms
        })
    }

    fn accept_merge(&mut self, next: &dyn Command<Workspace<S>>) -> bool {
        let Some(n) = next.as_any().downcast_ref::<MoveRegion>() else {
            return false;
        };
        self.to = n.to;
        self.meta.timestamp_ms = n.meta.timestamp_ms;
        true
    }

    fn as_any(&self) -> &dyn Any {
        self
    }
}

// =============================================================================
// MoveElement
// =============================================================================

/// Move one scene element's top-left corner. Merges like [`MoveRegion`].
#[derive(Debug, Clone)]
pub struct MoveElement {
    meta: CommandMeta,
    element: ElementId,
    from: Point,
    to: Point,
    merge_window_ms: u64,
}

impl MoveElement {
    #[must_use]
    pub fn new(element: ElementId, from: Point, to: Point, now_ms: u64, merge_window_ms: u64) -> Self {
        Self { meta: CommandMeta::new("move_element", "Move element", now_ms), element, from, to, merge_window_ms }
    }
}

impl<S: SceneGraph + 'static> Command<Workspace<S>> for MoveElement {
    fn execute(&mut self, ws: &mut Workspace<S>) -> Result<(), CommandError> {
        ws.scene.set_position(&self.element, self.to.x, self.to.y)?;
        Ok(())
    }

    fn undo(&mut self, ws: &mut Workspace<S>) -> Result<(), CommandError> {
        ws.scene.set_position(&self.element, self.from.x, self.from.y)?;
        Ok(())
    }

    fn meta(&self) -> &CommandMeta {
        &self.meta
    }

    fn can_merge(&self, next: &dyn Command<Workspace<S>>) -> bool {
        next.as_any().downcast_ref::<MoveElement>().is_some_and(|n| {
            n.element == self.element
                && n.meta.timestamp_ms.saturating_sub(self.meta.timestamp_ms) <= self.merge_window_ms
        })
    }

    fn accept_merge(&mut self, next: &dyn Command<Workspace<S>>) -> bool {
        let Some(n) = next.as_any().downcast_ref::<MoveElement>() else {
            return false;
        };
        self.to = n.to;
        self.meta.timestamp_ms = n.meta.timestamp_ms;
        true
    }

    fn as_any(&self) -> &dyn Any {
        self
    }
}

// =============================================================================
// UpdateRegion
// =============================================================================

/// Apply a sparse property update to a region.
#[derive(Debug, Clone)]
pub struct UpdateRegion {
    meta: CommandMeta,
    region: RegionId,
    partial: PartialRegion,
    before: Option<Region>,
}

impl UpdateRegion {
    #[must_use]
    pub fn new(region: RegionId, partial: PartialRegion, now_ms: u64) -> Self {
        Self { meta: CommandMeta::new("update_region", "Update region", now_ms), region, partial, before: None }
    }
}

impl<S: SceneGraph + 'static> Command<Workspace<S>> for UpdateRegion {
    fn execute(&mut self, ws: &mut Workspace<S>) -> Result<(), CommandError> {
        let current = ws.regions.get(&self.region).ok_or(CommandError::TargetNotFound(self.region))?;
        let next = self.partial.applied_to(current);
        self.before = Some(ws.replace_region(next)?);
        Ok(())
    }

    fn undo(&mut self, ws: &mut Workspace<S>) -> Result<(), CommandError> {
        let before = self.before.clone().ok_or_else(|| CommandError::Failed("update was never applied".into()))?;
        ws.replace_region(before)?;
        Ok(())
    }

    fn meta(&self) -> &CommandMeta {
        &self.meta
    }

    fn as_any(&self) -> &dyn Any {
        self
    }
}

// =============================================================================
// CreateRegion
// =============================================================================

/// Add a region together with its background proxy and nameplate.
///
/// The proxy goes to the bottom of the paint order, the nameplate on top.
#[derive(Debug, Clone)]
pub struct CreateRegion {
    meta: CommandMeta,
    region: Region,
    proxy: SceneElement,
    label: SceneElement,
}

impl CreateRegion {
    #[must_use]
    pub fn new(region: Region, proxy: SceneElement, label: SceneElement, now_ms: u64) -> Self {
        let description = format!("Create {}", region.name);
        Self { meta: CommandMeta::new("create_region", description, now_ms), region, proxy, label }
    }

    #[must_use]
    pub fn region(&self) -> &Region {
        &self.region
    }

    #[must_use]
    pub fn binding(&self) -> RegionBinding {
        RegionBinding { proxy: self.proxy.id, label: self.label.id }
    }
}

impl<S: SceneGraph + 'static> Command<Workspace<S>> for CreateRegion {
    fn execute(&mut self, ws: &mut Workspace<S>) -> Result<(), CommandError> {
        self.region.validate()?;
        ws.scene.insert_at(self.proxy.clone(), 0)?;
        if let Err(e) = ws.scene.insert(self.label.clone()) {
            remove_quietly(ws, &self.proxy.id);
            return Err(e.into());
        }
        let index = ws.regions.len();
        if let Err(e) = ws.attach(self.region.clone(), index, self.binding()) {
            remove_quietly(ws, &self.label.id);
            remove_quietly(ws, &self.proxy.id);
            return Err(e);
        }
        debug!(region = %self.region.id, "commands: region created");
        Ok(())
    }

    fn undo(&mut self, ws: &mut Workspace<S>) -> Result<(), CommandError> {
        let (region, _, _) = ws.detach(&self.region.id).ok_or(CommandError::TargetNotFound(self.region.id))?;
        if let Some(proxy) = ws.scene.element(&self.proxy.id) {
            self.proxy = proxy.clone();
        }
        if let Some(label) = ws.scene.element(&self.label.id) {
            self.label = label.clone();
        }
        self.region = region;
        remove_quietly(ws, &self.label.id);
        remove_quietly(ws, &self.proxy.id);
        Ok(())
    }

    fn meta(&self) -> &CommandMeta {
        &self.meta
    }

    fn as_any(&self) -> &dyn Any {
        self
    }
}

// =============================================================================
// DeleteRegion
// =============================================================================

/// Everything a region deletion removed, for restoration.
#[derive(Debug, Clone)]
struct RegionSnapshot {
    region: Region,
    store_index: usize,
    binding: Option<RegionBinding>,
    /// Removed scene elements with their paint index, ascending.
    elements: Vec<(SceneElement, usize)>,
}

/// Delete a region, its chrome, and its member elements.
#[derive(Debug, Clone)]
pub struct DeleteRegion {
    meta: CommandMeta,
    region: RegionId,
    members: Vec<ElementId>,
    snapshot: Option<RegionSnapshot>,
}

impl DeleteRegion {
    #[must_use]
    pub fn new(region: RegionId, members: Vec<ElementId>, now_ms: u64) -> Self {
        Self { meta: CommandMeta::new("delete_region", "Delete region", now_ms), region, members, snapshot: None }
    }

    #[must_use]
    pub fn region(&self) -> RegionId {
        self.region
    }
}

impl<S: SceneGraph + 'static> Command<Workspace<S>> for DeleteRegion {
    fn execute(&mut self, ws: &mut Workspace<S>) -> Result<(), CommandError> {
        let (region, store_index, binding) =
            ws.detach(&self.region).ok_or(CommandError::TargetNotFound(self.region))?;

        let mut doomed: Vec<ElementId> = self.members.clone();
        if let Some(b) = binding {
            doomed.push(b.proxy);
            doomed.push(b.label);
        }
        let mut elements: Vec<(SceneElement, usize)> = doomed
            .iter()
            .filter_map(|id| Some((ws.scene.element(id)?.clone(), ws.scene.index_of(id)?)))
            .collect();
        elements.sort_by_key(|(_, index)| *index);

        let mut snapshot = RegionSnapshot { region, store_index, binding, elements: Vec::new() };
        for (element, index) in elements.iter().rev() {
            if let Err(e) = ws.scene.remove(&element.id) {
                if let Err(rollback) = restore(ws, &snapshot) {
                    warn!(error = %rollback, region = %self.region, "commands: delete rollback failed");
                }
                return Err(e.into());
            }
            snapshot.elements.insert(0, (element.clone(), *index));
        }

        debug!(region = %self.region, removed = snapshot.elements.len(), "commands: region deleted");
        self.snapshot = Some(snapshot);
        Ok(())
    }

    fn undo(&mut self, ws: &mut Workspace<S>) -> Result<(), CommandError> {
        let snapshot = self.snapshot.as_ref().ok_or_else(|| CommandError::Failed("delete was never applied".into()))?;
        restore(ws, snapshot)?;
        self.snapshot = None;
        Ok(())
    }

    fn meta(&self) -> &CommandMeta {
        &self.meta
    }

    fn as_any(&self) -> &dyn Any {
        self
    }
}

/// Put a deleted region back exactly where it was.
fn restore<S: SceneGraph>(ws: &mut Workspace<S>, snapshot: &RegionSnapshot) -> Result<(), CommandError> {
    for (element, index) in &snapshot.elements {
        let index = (*index).min(ws.scene.len());
        ws.scene.insert_at(element.clone(), index)?;
    }
    match snapshot.binding {
        Some(binding) => ws.attach(snapshot.region.clone(), snapshot.store_index, binding),
        None => {
            ws.regions.insert_at(snapshot.region.clone(), snapshot.store_index)?;
            ws.index_region(&snapshot.region.id);
            Ok(())
        }
    }
}

fn remove_quietly<S: SceneGraph>(ws: &mut Workspace<S>, id: &ElementId) {
    if let Err(e) = ws.scene.remove(id) {
        warn!(error = %e, element = %id, "commands: cleanup removal failed");
    }
}
