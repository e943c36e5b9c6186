//! Top-level editor: one scene, its regions, and every engine component.
//!
//! DESIGN
//! ======
//! `Editor` is what a host embeds. It owns the [`Workspace`] (scene, region
//! store, bindings, grid) and wires the layout controller, membership
//! tracker, layer list and batched history around it. Every entry point
//! returns the [`Action`]s the host should react to; none of them fail.
//!
//! State-changing operations run through one path: snapshot the region
//! records, apply the edit (usually via history), then diff the records to
//! emit `RegionCommitted` / `RegionRemoved`, keep layout subscriptions in
//! step with the store, and feed scene change events to the membership
//! tracker and the layer list. Undo, redo, batch flushes and direct edits
//! all get the same bookkeeping this way.
//!
//! ERROR HANDLING
//! ==============
//! Unknown ids are silent no-ops. Command failures are logged by the history
//! and surfaced as `Action::Notify` with the error text.

#[cfg(test)]
#[path = "editor_test.rs"]
mod editor_test;

use std::collections::HashMap;
use std::sync::Arc;

use tracing::{debug, info, warn};

use crate::commands::{CreateRegion, DeleteRegion, MoveElement, MoveRegion, UpdateRegion};
use crate::config::EditorConfig;
use crate::consts::LABEL_HEIGHT;
use crate::doc::{Document, PartialRegion, Region, RegionId};
use crate::error::{CommandError, SceneError};
use crate::geom::{Bounds, Point};
use crate::history::{BatchedHistory, Command};
use crate::layers::{Layer, LayerId, LayerOrder};
use crate::layout::{LayoutEvent, RegionLayoutController, Subscription};
use crate::membership::{MembershipChange, MembershipTracker};
use crate::scene::{ElementId, ElementKind, SceneElement, SceneEvent, SceneGraph};
use crate::workspace::{RegionBinding, Workspace};

/// What the host should do after an editor call.
#[derive(Debug, Clone, PartialEq)]
pub enum Action {
    /// A region was created or its record changed. Carries the new record.
    RegionCommitted(Region),
    RegionRemoved(RegionId),
    MembershipChanged(MembershipChange),
    LayersChanged(Arc<[Layer]>),
    /// Message for the user, typically a failed command.
    Notify(String),
    RenderNeeded,
}

type History<S> = BatchedHistory<Workspace<S>>;

/// The interactive layout and edit-history engine over scene `S`.
pub struct Editor<S> {
    ws: Workspace<S>,
    config: EditorConfig,
    layout: RegionLayoutController,
    membership: MembershipTracker,
    layers: LayerOrder,
    history: History<S>,
    subscriptions: HashMap<RegionId, Subscription>,
    clipboard: Option<Region>,
    zoom: f64,
    scene_snapshot: serde_json::Value,
}

impl<S: SceneGraph + 'static> Editor<S> {
    #[must_use]
    pub fn new(scene: S, config: EditorConfig) -> Self {
        let mut ws = Workspace::new(scene, config.grid_cell_size, config.label_offset);
        ws.scene.drain_events();
        let mut layers = LayerOrder::new(config.layer_debounce_ms);
        layers.recompute(&ws.scene);
        Self {
            ws,
            layout: RegionLayoutController::from_config(&config),
            membership: MembershipTracker::new(config.membership_debounce_ms),
            layers,
            history: BatchedHistory::new(config.history_max_depth, config.batch_window_ms),
            subscriptions: HashMap::new(),
            clipboard: None,
            zoom: 1.0,
            scene_snapshot: serde_json::Value::Null,
            config,
        }
    }

    // =========================================================================
    // Queries
    // =========================================================================

    #[must_use]
    pub fn config(&self) -> &EditorConfig {
        &self.config
    }

    #[must_use]
    pub fn workspace(&self) -> &Workspace<S> {
        &self.ws
    }

    #[must_use]
    pub fn scene(&self) -> &S {
        &self.ws.scene
    }

    /// Mutable scene access for the host (pointer-driven moves, imports).
    /// Call [`Editor::sync_scene_events`] afterwards.
    pub fn scene_mut(&mut self) -> &mut S {
        &mut self.ws.scene
    }

    #[must_use]
    pub fn region(&self, id: &RegionId) -> Option<&Region> {
        self.ws.regions.get(id)
    }

    /// All regions in creation order.
    #[must_use]
    pub fn regions(&self) -> Vec<&Region> {
        self.ws.regions.list()
    }

    #[must_use]
    pub fn binding(&self, id: &RegionId) -> Option<RegionBinding> {
        self.ws.bindings.get(id).copied()
    }

    #[must_use]
    pub fn layers(&self) -> Arc<[Layer]> {
        self.layers.layers()
    }

    #[must_use]
    pub fn layer_for(&self, element: &ElementId) -> Option<LayerId> {
        self.layers.layer_for(element)
    }

    #[must_use]
    pub fn region_of(&self, element: &ElementId) -> Option<RegionId> {
        self.membership.region_of(element)
    }

    #[must_use]
    pub fn members(&self, region: &RegionId) -> Vec<ElementId> {
        self.membership.members(region)
    }

    #[must_use]
    pub fn is_dragging(&self, region: &RegionId) -> bool {
        self.layout.is_dragging(region)
    }

    #[must_use]
    pub fn can_undo(&self) -> bool {
        self.history.can_undo()
    }

    #[must_use]
    pub fn can_redo(&self) -> bool {
        self.history.can_redo()
    }

    #[must_use]
    pub fn undo_description(&self) -> Option<&str> {
        self.history.history().undo_description()
    }

    #[must_use]
    pub fn redo_description(&self) -> Option<&str> {
        self.history.history().redo_description()
    }

    /// Pairs of regions whose bounds strictly overlap, in creation order.
    #[must_use]
    pub fn overlapping_pairs(&self) -> Vec<(RegionId, RegionId)> {
        let order: HashMap<RegionId, usize> =
            self.ws.regions.list().iter().enumerate().map(|(i, r)| (r.id, i)).collect();
        let mut pairs = Vec::new();
        for region in self.ws.regions.list() {
            let bounds = region.bounds();
            for hit in self.ws.grid.query(&bounds, Some(&region.id)) {
                let (Some(a), Some(b)) = (order.get(&region.id), order.get(&hit.id)) else {
                    continue;
                };
                if a < b && hit.bounds.overlaps(&bounds) {
                    pairs.push((region.id, hit.id));
                }
            }
        }
        pairs
    }

    /// Earliest time at which [`Editor::tick`] has work to do, if any is pending.
    #[must_use]
    pub fn next_deadline(&self) -> Option<u64> {
        [self.membership.next_deadline(), self.layers.next_deadline(), self.history.next_deadline()]
            .into_iter()
            .flatten()
            .min()
    }

    // =========================================================================
    // Regions
    // =========================================================================

    /// Create a region near `bounds`, moved off any region it would overlap.
    pub fn create_region(&mut self, name: &str, bounds: Bounds, now_ms: u64) -> Vec<Action> {
        self.create_from(Region::new(name, bounds), bounds, now_ms)
    }

    /// Apply a sparse property update as one undoable step.
    pub fn update_region(&mut self, id: RegionId, partial: PartialRegion, now_ms: u64) -> Vec<Action> {
        if !self.ws.regions.contains(&id) {
            return Vec::new();
        }
        let cmd = UpdateRegion::new(id, partial, now_ms);
        self.run(now_ms, |history, ws| history.execute(Box::new(cmd), ws).map(|()| true))
    }

    /// Delete a region with its chrome and member elements.
    pub fn delete_region(&mut self, id: RegionId, now_ms: u64) -> Vec<Action> {
        if !self.ws.regions.contains(&id) {
            return Vec::new();
        }
        let cmd = DeleteRegion::new(id, self.membership.members(&id), now_ms);
        self.run(now_ms, |history, ws| history.execute(Box::new(cmd), ws).map(|()| true))
    }

    /// Copy a region's properties next to it.
    pub fn duplicate_region(&mut self, id: RegionId, now_ms: u64) -> Vec<Action> {
        let Some(source) = self.ws.regions.get(&id).cloned() else {
            return Vec::new();
        };
        let offset = Point::new(self.config.paste_offset, self.config.paste_offset);
        let bounds = source.bounds().translate(offset);
        let mut template = source;
        template.name = format!("{} copy", template.name);
        self.create_from(template, bounds, now_ms)
    }

    /// Remember a region's properties for a later paste.
    pub fn copy_region(&mut self, id: RegionId) -> Vec<Action> {
        if let Some(region) = self.ws.regions.get(&id) {
            self.clipboard = Some(region.clone());
        }
        Vec::new()
    }

    /// Create a region from the clipboard, offset from where it was copied.
    /// Repeated pastes cascade.
    pub fn paste_region(&mut self, now_ms: u64) -> Vec<Action> {
        let Some(mut template) = self.clipboard.clone() else {
            return Vec::new();
        };
        let offset = Point::new(self.config.paste_offset, self.config.paste_offset);
        let bounds = template.bounds().translate(offset);
        template.x = bounds.x;
        template.y = bounds.y;
        self.clipboard = Some(template.clone());
        self.create_from(template, bounds, now_ms)
    }

    /// Mark one region active. Not recorded in history.
    pub fn activate_region(&mut self, id: RegionId, now_ms: u64) -> Vec<Action> {
        if !self.ws.regions.contains(&id) {
            return Vec::new();
        }
        self.run(now_ms, |_, ws| {
            ws.regions.activate(&id);
            Ok(true)
        })
    }

    /// Relax every region apart in one undoable step.
    pub fn settle_regions(&mut self, now_ms: u64) -> Vec<Action> {
        let outcome = self.layout.solver().settle(&self.ws.region_bounds(), self.config.grid_cell_size);
        if !outcome.resolved {
            warn!(iterations = outcome.iterations, "editor: settle left overlaps behind");
        }
        let moves: Vec<MoveRegion> = outcome
            .displacements
            .iter()
            .zip(&outcome.bounds)
            .filter(|((_, d), _)| *d != Point::zero())
            .map(|((id, d), (_, after))| {
                let carry = self.membership.members(id);
                MoveRegion::new(*id, after.origin().sub(*d), after.origin(), carry, now_ms, 0)
            })
            .collect();
        if moves.is_empty() {
            return Vec::new();
        }
        info!(count = moves.len(), iterations = outcome.iterations, "editor: settling regions");
        self.run(now_ms, |history, ws| {
            for cmd in moves {
                history.submit(Box::new(cmd), now_ms);
            }
            history.flush(ws)
        })
    }

    fn create_from(&mut self, template: Region, bounds: Bounds, now_ms: u64) -> Vec<Action> {
        if bounds.is_degenerate() {
            return vec![Action::Notify(format!("invalid region size {}x{}", bounds.width, bounds.height))];
        }
        let placed = self.layout.solver().resolve_placement(bounds, &self.ws.grid, None);

        let mut region = Region::new(template.name, placed);
        region.background_color = template.background_color;
        region.locked = template.locked;
        let id = region.id;

        let mut proxy = SceneElement::new(ElementKind::RegionBackground, region.name.clone(), placed);
        proxy.locked = region.locked;
        let label_at = placed.origin().add(self.config.label_offset);
        let label = SceneElement::new(
            ElementKind::RegionLabel,
            region.name.clone(),
            Bounds::new(label_at.x, label_at.y, placed.width, LABEL_HEIGHT),
        );

        debug!(%id, x = placed.x, y = placed.y, "editor: creating region");
        let cmd = CreateRegion::new(region, proxy, label, now_ms);
        self.run(now_ms, |history, ws| history.execute(Box::new(cmd), ws).map(|()| true))
    }

    // =========================================================================
    // Drag
    // =========================================================================

    /// Start dragging a region. Its current members travel with it.
    pub fn begin_drag(&mut self, region: RegionId) -> Vec<Action> {
        let carry = self.membership.members(&region);
        if !self.layout.begin_drag(&self.ws, region, carry) {
            debug!(%region, "editor: drag refused");
        }
        Vec::new()
    }

    /// The host moved the region's proxy; correct and redraw.
    pub fn drag_moved(&mut self, region: RegionId, now_ms: u64) -> Vec<Action> {
        let mut actions = Vec::new();
        let drew = self.layout.drag_moved(&mut self.ws, region, now_ms);
        self.sync_into(now_ms, &mut actions);
        if drew {
            actions.push(Action::RenderNeeded);
        }
        actions
    }

    /// Move the region's proxy to `(x, y)` and react as if the pointer had.
    pub fn drag_to(&mut self, region: RegionId, x: f64, y: f64, now_ms: u64) -> Vec<Action> {
        if !self.layout.is_dragging(&region) {
            return Vec::new();
        }
        let Some(binding) = self.ws.bindings.get(&region).copied() else {
            return Vec::new();
        };
        if let Err(e) = self.ws.scene.set_position(&binding.proxy, x, y) {
            warn!(error = %e, %region, "editor: proxy move failed");
            return Vec::new();
        }
        self.drag_moved(region, now_ms)
    }

    /// Release the region. Records one undo entry for the whole drag.
    pub fn end_drag(&mut self, region: RegionId, now_ms: u64) -> Vec<Action> {
        let before = self.ws.regions.to_vec();
        let Some(LayoutEvent::Committed { region, from, to, displacement, carry }) =
            self.layout.end_drag(&mut self.ws, region)
        else {
            return Vec::new();
        };
        if displacement == Point::zero() {
            return self.sync_scene_events(now_ms);
        }
        // The layout already wrote the store; history only needs the entry.
        let cmd = MoveRegion::new(region, from, to, carry, now_ms, self.config.merge_window_ms);
        self.run_from(before, now_ms, |history, ws| history.record(Box::new(cmd), ws).map(|()| true))
    }

    // =========================================================================
    // Elements & history
    // =========================================================================

    /// Move a scene element as one undoable (mergeable) step.
    pub fn move_element(&mut self, element: ElementId, x: f64, y: f64, now_ms: u64) -> Vec<Action> {
        let Some(el) = self.ws.scene.element(&element) else {
            return Vec::new();
        };
        if el.locked || el.kind.is_decorative() {
            return Vec::new();
        }
        let cmd = MoveElement::new(element, el.bounds.origin(), Point::new(x, y), now_ms, self.config.merge_window_ms);
        self.run(now_ms, |history, ws| history.execute(Box::new(cmd), ws).map(|()| true))
    }

    /// Apply and record a host-defined command.
    pub fn execute(&mut self, cmd: Box<dyn Command<Workspace<S>>>, now_ms: u64) -> Vec<Action> {
        self.run(now_ms, |history, ws| history.execute(cmd, ws).map(|()| true))
    }

    /// Queue a command for the current batch window.
    pub fn submit(&mut self, cmd: Box<dyn Command<Workspace<S>>>, now_ms: u64) -> Vec<Action> {
        self.history.submit(cmd, now_ms);
        Vec::new()
    }

    pub fn undo(&mut self, now_ms: u64) -> Vec<Action> {
        self.run(now_ms, |history, ws| history.undo(ws))
    }

    pub fn redo(&mut self, now_ms: u64) -> Vec<Action> {
        self.run(now_ms, |history, ws| history.redo(ws))
    }

    // =========================================================================
    // Layers
    // =========================================================================

    pub fn toggle_layer_visibility(&mut self, id: LayerId, now_ms: u64) -> Vec<Action> {
        self.layer_op(now_ms, |layers, scene| layers.toggle_visibility(id, scene))
    }

    pub fn toggle_layer_lock(&mut self, id: LayerId, now_ms: u64) -> Vec<Action> {
        self.layer_op(now_ms, |layers, scene| layers.toggle_lock(id, scene))
    }

    pub fn layer_up(&mut self, id: LayerId, now_ms: u64) -> Vec<Action> {
        self.layer_op(now_ms, |layers, scene| layers.move_up(id, scene))
    }

    pub fn layer_down(&mut self, id: LayerId, now_ms: u64) -> Vec<Action> {
        self.layer_op(now_ms, |layers, scene| layers.move_down(id, scene))
    }

    pub fn layer_to_back(&mut self, id: LayerId, now_ms: u64) -> Vec<Action> {
        self.layer_op(now_ms, |layers, scene| layers.move_to_back(id, scene))
    }

    pub fn duplicate_layer(&mut self, id: LayerId, now_ms: u64) -> Vec<Action> {
        let offset = self.config.duplicate_offset;
        self.layer_op(now_ms, |layers, scene| layers.duplicate(id, scene, offset).map(|copy| copy.is_some()))
    }

    pub fn delete_layer(&mut self, id: LayerId, now_ms: u64) -> Vec<Action> {
        self.layer_op(now_ms, |layers, scene| layers.delete(id, scene))
    }

    fn layer_op<F>(&mut self, now_ms: u64, op: F) -> Vec<Action>
    where
        F: FnOnce(&mut LayerOrder, &mut S) -> Result<bool, SceneError>,
    {
        let mut actions = Vec::new();
        let before = self.layers.layers();
        match op(&mut self.layers, &mut self.ws.scene) {
            Ok(true) => {
                let after = self.layers.layers();
                if !Arc::ptr_eq(&before, &after) {
                    actions.push(Action::LayersChanged(after));
                }
                actions.push(Action::RenderNeeded);
            }
            Ok(false) => {}
            Err(e) => {
                warn!(error = %e, "editor: layer operation failed");
                actions.push(Action::Notify(e.to_string()));
            }
        }
        self.sync_into(now_ms, &mut actions);
        actions
    }

    // =========================================================================
    // Scene events & time
    // =========================================================================

    /// Feed one scene change notification.
    pub fn on_scene_event(&mut self, event: SceneEvent, now_ms: u64) -> Vec<Action> {
        let mut actions = Vec::new();
        self.handle_event(event, now_ms, &mut actions);
        actions
    }

    /// Drain the scene's pending change notifications and feed them all.
    pub fn sync_scene_events(&mut self, now_ms: u64) -> Vec<Action> {
        let mut actions = Vec::new();
        self.sync_into(now_ms, &mut actions);
        actions
    }

    /// Advance animations, batch windows, and debounce timers to `now_ms`.
    pub fn tick(&mut self, now_ms: u64) -> Vec<Action> {
        let mut actions = Vec::new();
        let drew = self.layout.tick(&mut self.ws, now_ms);

        if self.history.next_deadline().is_some_and(|deadline| deadline <= now_ms) {
            actions.extend(self.run(now_ms, |history, ws| history.poll(now_ms, ws)));
        }
        self.sync_into(now_ms, &mut actions);

        // Store bounds lag the chrome during a drag; wait for the commit.
        if self.layout.dragging().is_empty() {
            let regions = self.ws.region_bounds();
            for change in self.membership.poll(now_ms, &self.ws.scene, &regions) {
                actions.push(Action::MembershipChanged(change));
            }
        }
        if self.layers.poll(now_ms, &self.ws.scene) {
            actions.push(Action::LayersChanged(self.layers.layers()));
        }
        if drew && !actions.contains(&Action::RenderNeeded) {
            actions.push(Action::RenderNeeded);
        }
        actions
    }

    // =========================================================================
    // Persistence
    // =========================================================================

    /// Replace all regions from a persisted document. Region chrome is
    /// created fresh in the scene; history starts empty.
    pub fn load_document(&mut self, doc: Document, now_ms: u64) -> Vec<Action> {
        let stale: Vec<RegionBinding> = self.ws.bindings.values().copied().collect();
        self.dispose();
        for binding in stale {
            for element in [binding.proxy, binding.label] {
                if let Err(e) = self.ws.scene.remove(&element) {
                    debug!(error = %e, "editor: stale region chrome already gone");
                }
            }
        }
        self.zoom = doc.zoom;
        self.scene_snapshot = doc.scene;

        let mut actions = Vec::new();
        for e in self.ws.regions.load(doc.regions) {
            warn!(error = %e, "editor: skipped invalid region");
            actions.push(Action::Notify(e.to_string()));
        }
        for region in self.ws.regions.to_vec() {
            match self.draw_chrome(&region) {
                Ok(binding) => {
                    let sub = self.layout.setup(&mut self.ws, region.id, binding);
                    self.subscriptions.insert(region.id, sub);
                    actions.push(Action::RegionCommitted(region));
                }
                Err(e) => {
                    warn!(error = %e, region = %region.id, "editor: failed to draw region");
                    actions.push(Action::Notify(e.to_string()));
                }
            }
        }
        self.ws.reindex();
        self.ws.scene.drain_events();

        for el in self.ws.scene.elements() {
            if !el.kind.is_decorative() {
                self.membership.schedule(el.id, now_ms);
            }
        }
        self.layers.recompute(&self.ws.scene);
        info!(regions = self.ws.regions.len(), "editor: document loaded");
        actions.push(Action::LayersChanged(self.layers.layers()));
        actions.push(Action::RenderNeeded);
        actions
    }

    /// Current state in persisted form. The scene snapshot is passed through.
    #[must_use]
    pub fn document(&self) -> Document {
        Document {
            zoom: self.zoom,
            scene: self.scene_snapshot.clone(),
            regions: self.ws.regions.to_vec(),
            ..Document::default()
        }
    }

    /// Replace the opaque scene snapshot stored with the document.
    pub fn set_scene_snapshot(&mut self, snapshot: serde_json::Value) {
        self.scene_snapshot = snapshot;
    }

    pub fn set_zoom(&mut self, zoom: f64) {
        if zoom.is_finite() && zoom > 0.0 {
            self.zoom = zoom;
        }
    }

    /// Tear down every subscription and timer, and forget history.
    /// Region records and the scene are left as they are.
    pub fn dispose(&mut self) {
        for (_, sub) in self.subscriptions.drain() {
            self.layout.teardown(&mut self.ws, sub);
        }
        self.membership.clear();
        self.history.clear();
        self.layers.recompute(&self.ws.scene);
        self.ws.scene.drain_events();
    }

    // =========================================================================
    // Internals
    // =========================================================================

    /// Apply an edit, then reconcile subscriptions, membership and layers
    /// against whatever it changed.
    fn run<F>(&mut self, now_ms: u64, op: F) -> Vec<Action>
    where
        F: FnOnce(&mut History<S>, &mut Workspace<S>) -> Result<bool, CommandError>,
    {
        let before = self.ws.regions.to_vec();
        self.run_from(before, now_ms, op)
    }

    /// [`Editor::run`] against a region snapshot taken earlier.
    fn run_from<F>(&mut self, before: Vec<Region>, now_ms: u64, op: F) -> Vec<Action>
    where
        F: FnOnce(&mut History<S>, &mut Workspace<S>) -> Result<bool, CommandError>,
    {
        let mut actions = Vec::new();
        if let Err(e) = op(&mut self.history, &mut self.ws) {
            actions.push(Action::Notify(e.to_string()));
        }
        self.reconcile_regions(&before, now_ms, &mut actions);
        self.sync_into(now_ms, &mut actions);
        if actions.iter().any(|a| !matches!(a, Action::Notify(_))) {
            actions.push(Action::RenderNeeded);
        }
        actions
    }

    fn reconcile_regions(&mut self, before: &[Region], now_ms: u64, actions: &mut Vec<Action>) {
        let old: HashMap<RegionId, &Region> = before.iter().map(|r| (r.id, r)).collect();

        for region in self.ws.regions.to_vec() {
            let previous = old.get(&region.id).copied();
            if previous == Some(&region) {
                continue;
            }
            if !self.subscriptions.contains_key(&region.id)
                && let Some(binding) = self.ws.bindings.get(&region.id).copied()
            {
                let sub = self.layout.setup(&mut self.ws, region.id, binding);
                self.subscriptions.insert(region.id, sub);
            }
            let mut touched = vec![region.bounds()];
            touched.extend(previous.map(Region::bounds));
            self.rescan_membership(&touched, now_ms);
            actions.push(Action::RegionCommitted(region));
        }

        for region in before {
            if self.ws.regions.contains(&region.id) {
                continue;
            }
            self.layout.forget(&region.id);
            self.subscriptions.remove(&region.id);
            for element in self.membership.release_region(&region.id) {
                actions.push(Action::MembershipChanged(MembershipChange {
                    element,
                    from: Some(region.id),
                    to: None,
                }));
            }
            debug!(region = %region.id, "editor: region removed");
            actions.push(Action::RegionRemoved(region.id));
        }
    }

    fn sync_into(&mut self, now_ms: u64, actions: &mut Vec<Action>) {
        for event in self.ws.scene.drain_events() {
            self.handle_event(event, now_ms, actions);
        }
    }

    fn handle_event(&mut self, event: SceneEvent, now_ms: u64, actions: &mut Vec<Action>) {
        match event {
            SceneEvent::Added(id) | SceneEvent::Modified(id) => {
                let Some(el) = self.ws.scene.element(&id) else {
                    return;
                };
                if el.kind.is_decorative() {
                    return;
                }
                self.membership.schedule(id, now_ms);
                self.layers.schedule(now_ms);
            }
            SceneEvent::Removed(id) => {
                if let Some(from) = self.membership.forget(&id) {
                    actions.push(Action::MembershipChanged(MembershipChange { element: id, from: Some(from), to: None }));
                }
                self.layers.schedule(now_ms);
            }
        }
    }

    /// Queue a membership recheck for every element centered in any of `areas`.
    fn rescan_membership(&mut self, areas: &[Bounds], now_ms: u64) {
        let hits: Vec<ElementId> = self
            .ws
            .scene
            .elements()
            .into_iter()
            .filter(|el| !el.kind.is_decorative())
            .filter(|el| areas.iter().any(|area| area.contains_point(el.bounds.center())))
            .map(|el| el.id)
            .collect();
        for id in hits {
            self.membership.schedule(id, now_ms);
        }
    }

    /// Insert a background proxy and nameplate for a region loaded from disk.
    fn draw_chrome(&mut self, region: &Region) -> Result<RegionBinding, SceneError> {
        let bounds = region.bounds();
        let mut proxy = SceneElement::new(ElementKind::RegionBackground, region.name.clone(), bounds);
        proxy.locked = region.locked;
        let proxy = self.ws.scene.insert_at(proxy, 0)?;
        let label_at = region.origin().add(self.config.label_offset);
        let label = self.ws.scene.insert(SceneElement::new(
            ElementKind::RegionLabel,
            region.name.clone(),
            Bounds::new(label_at.x, label_at.y, bounds.width, LABEL_HEIGHT),
        ))?;
        Ok(RegionBinding { proxy, label })
    }
}
