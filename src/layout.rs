//! Per-region drag orchestration.
//!
//! DESIGN
//! ======
//! The host moves a region's background proxy under the pointer. On every
//! pointer move the controller reads the proxy's position back from the
//! scene, asks the repulsion solver where the region should be given its
//! neighbors, and either applies that directly or, when the correction is
//! visible, glides toward it over a few frames. The nameplate and any carried
//! member elements follow on every applied position.
//!
//! Nothing is written to the region store while a drag is in flight. On
//! release the in-flight glide snaps to its target, the store and grid are
//! updated once, and a [`LayoutEvent::Committed`] reports the net
//! displacement so the owner can record a single undo entry.
//!
//! ```text
//!   setup ──► Idle ──begin_drag──► Moving ──end_drag──► Idle
//!                                    │  ▲
//!                             drag_moved / tick
//! ```

#[cfg(test)]
#[path = "layout_test.rs"]
mod layout_test;

use std::collections::HashMap;

use tracing::{debug, info, warn};

use crate::config::EditorConfig;
use crate::doc::RegionId;
use crate::geom::Point;
use crate::repulsion::RepulsionSolver;
use crate::scene::{ElementId, SceneGraph};
use crate::schedule::FrameTable;
use crate::workspace::{RegionBinding, Workspace};

/// Pairs a `setup` with its `teardown`.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub struct Subscription {
    pub region: RegionId,
    token: u64,
}

/// Drag state of one region.
#[derive(Debug, Clone, PartialEq)]
pub enum DragPhase {
    Idle,
    Moving {
        /// Store position when the drag began.
        start: Point,
        /// Last position applied to the chrome.
        current: Point,
        /// Elements that travel with the region.
        carry: Vec<ElementId>,
    },
}

/// Emitted when a drag ends.
#[derive(Debug, Clone, PartialEq)]
pub enum LayoutEvent {
    Committed { region: RegionId, from: Point, to: Point, displacement: Point, carry: Vec<ElementId> },
}

#[derive(Debug, Clone, Copy, PartialEq)]
struct Glide {
    from: Point,
    to: Point,
    started_ms: u64,
}

impl Glide {
    /// Position at `now_ms`, and whether the glide is finished.
    fn sample(&self, now_ms: u64, duration_ms: u64) -> (Point, bool) {
        if duration_ms == 0 {
            return (self.to, true);
        }
        let elapsed = now_ms.saturating_sub(self.started_ms);
        if elapsed >= duration_ms {
            return (self.to, true);
        }
        #[allow(clippy::cast_precision_loss)]
        let t = elapsed as f64 / duration_ms as f64;
        (self.from.lerp(self.to, ease_out(t)), false)
    }
}

/// Cubic ease-out on `[0, 1]`.
fn ease_out(t: f64) -> f64 {
    let inv = 1.0 - t.clamp(0.0, 1.0);
    1.0 - inv * inv * inv
}

#[derive(Debug)]
struct Session {
    token: u64,
    phase: DragPhase,
}

/// Drives region drags against a [`Workspace`].
#[derive(Debug)]
pub struct RegionLayoutController {
    solver: RepulsionSolver,
    sessions: HashMap<RegionId, Session>,
    frames: FrameTable<RegionId, Glide>,
    animation_ms: u64,
    epsilon: f64,
    next_token: u64,
}

impl RegionLayoutController {
    #[must_use]
    pub fn new(solver: RepulsionSolver, animation_ms: u64, epsilon: f64) -> Self {
        Self { solver, sessions: HashMap::new(), frames: FrameTable::new(), animation_ms, epsilon, next_token: 1 }
    }

    #[must_use]
    pub fn from_config(config: &EditorConfig) -> Self {
        Self::new(RepulsionSolver::new(config.solver), config.animation_ms, config.correction_epsilon)
    }

    #[must_use]
    pub fn solver(&self) -> &RepulsionSolver {
        &self.solver
    }

    // =========================================================================
    // Lifecycle
    // =========================================================================

    /// Start managing a region's layout. Re-running setup for the same region
    /// supersedes the earlier subscription.
    pub fn setup<S: SceneGraph>(
        &mut self,
        ws: &mut Workspace<S>,
        region: RegionId,
        binding: RegionBinding,
    ) -> Subscription {
        self.frames.cancel(&region);
        let token = self.next_token;
        self.next_token += 1;
        self.sessions.insert(region, Session { token, phase: DragPhase::Idle });
        ws.bindings.insert(region, binding);
        ws.index_region(&region);
        debug!(%region, "layout: region managed");
        Subscription { region, token }
    }

    /// Stop managing a region. Stale or repeated teardowns are no-ops.
    pub fn teardown<S: SceneGraph>(&mut self, ws: &mut Workspace<S>, subscription: Subscription) -> bool {
        let live = self.sessions.get(&subscription.region).is_some_and(|s| s.token == subscription.token);
        if !live {
            return false;
        }
        self.forget(&subscription.region);
        ws.bindings.remove(&subscription.region);
        ws.grid.remove(&subscription.region);
        debug!(region = %subscription.region, "layout: region released");
        true
    }

    /// Drop drag state and pending frames for a region without touching the workspace.
    pub fn forget(&mut self, region: &RegionId) {
        self.frames.cancel(region);
        self.sessions.remove(region);
    }

    #[must_use]
    pub fn is_managed(&self, region: &RegionId) -> bool {
        self.sessions.contains_key(region)
    }

    #[must_use]
    pub fn phase(&self, region: &RegionId) -> Option<&DragPhase> {
        self.sessions.get(region).map(|s| &s.phase)
    }

    #[must_use]
    pub fn is_dragging(&self, region: &RegionId) -> bool {
        matches!(self.phase(region), Some(DragPhase::Moving { .. }))
    }

    /// Whether any corrective glide is in flight.
    #[must_use]
    pub fn is_animating(&self) -> bool {
        !self.frames.is_empty()
    }

    /// Regions currently being dragged.
    #[must_use]
    pub fn dragging(&self) -> Vec<RegionId> {
        let mut ids: Vec<RegionId> =
            self.sessions.iter().filter(|(_, s)| matches!(s.phase, DragPhase::Moving { .. })).map(|(id, _)| *id).collect();
        ids.sort();
        ids
    }

    // =========================================================================
    // Drag
    // =========================================================================

    /// Enter `Moving`. Locked, unknown, unmanaged or already-moving regions are refused.
    pub fn begin_drag<S: SceneGraph>(&mut self, ws: &Workspace<S>, region: RegionId, carry: Vec<ElementId>) -> bool {
        let Some(record) = ws.regions.get(&region) else {
            return false;
        };
        if record.locked {
            return false;
        }
        let Some(session) = self.sessions.get_mut(&region) else {
            return false;
        };
        if matches!(session.phase, DragPhase::Moving { .. }) {
            return false;
        }
        let start = record.origin();
        session.phase = DragPhase::Moving { start, current: start, carry };
        debug!(%region, "layout: drag started");
        true
    }

    /// React to the proxy having been moved by the pointer.
    ///
    /// Returns true when anything was drawn.
    pub fn drag_moved<S: SceneGraph>(&mut self, ws: &mut Workspace<S>, region: RegionId, now_ms: u64) -> bool {
        if !self.is_dragging(&region) {
            return false;
        }
        self.frames.cancel(&region);

        let Some(proxy) = ws.bindings.get(&region).map(|b| b.proxy) else {
            return false;
        };
        let Some(raw) = ws.scene.bounds(&proxy) else {
            return false;
        };
        let neighbors = self.solver.neighbors(&raw, &ws.grid, Some(&region));
        let corrected = self.solver.apply_repulsion(&raw, &neighbors);

        let correction = corrected.distance(raw.origin());
        if correction > self.epsilon && self.animation_ms > 0 {
            self.apply(ws, region, raw.origin());
            self.frames.request(region, Glide { from: raw.origin(), to: corrected, started_ms: now_ms });
        } else {
            self.apply(ws, region, corrected);
        }
        true
    }

    /// Advance every in-flight glide. Returns true when anything was drawn.
    pub fn tick<S: SceneGraph>(&mut self, ws: &mut Workspace<S>, now_ms: u64) -> bool {
        let mut drew = false;
        for region in self.frames.keys() {
            let Some(glide) = self.frames.get(&region).copied() else {
                continue;
            };
            let (pos, done) = glide.sample(now_ms, self.animation_ms);
            self.apply(ws, region, pos);
            if done {
                self.frames.cancel(&region);
            }
            drew = true;
        }
        drew
    }

    /// Finish the drag: snap any glide to its target, write the store once,
    /// and report the net displacement.
    pub fn end_drag<S: SceneGraph>(&mut self, ws: &mut Workspace<S>, region: RegionId) -> Option<LayoutEvent> {
        if !self.is_dragging(&region) {
            return None;
        }
        if let Some(glide) = self.frames.cancel(&region) {
            self.apply(ws, region, glide.to);
        }
        let session = self.sessions.get_mut(&region)?;
        let DragPhase::Moving { start, current, carry } = std::mem::replace(&mut session.phase, DragPhase::Idle) else {
            return None;
        };

        if !ws.regions.set_origin(&region, current) {
            warn!(%region, "layout: dragged region vanished before commit");
            return None;
        }
        ws.index_region(&region);

        let displacement = current.sub(start);
        info!(%region, dx = displacement.x, dy = displacement.y, "layout: drag committed");
        Some(LayoutEvent::Committed { region, from: start, to: current, displacement, carry })
    }

    /// Draw the region's chrome at `origin` and remember it as the current position.
    fn apply<S: SceneGraph>(&mut self, ws: &mut Workspace<S>, region: RegionId, origin: Point) {
        let Some(Session { phase: DragPhase::Moving { current, carry, .. }, .. }) = self.sessions.get_mut(&region)
        else {
            return;
        };
        match ws.move_chrome(&region, *current, origin, carry) {
            Ok(()) => *current = origin,
            Err(e) => warn!(error = %e, %region, "layout: failed to draw region"),
        }
    }
}
