#![allow(clippy::float_cmp)]

use super::*;
use crate::config::SolverConfig;
use crate::doc::Region;
use crate::geom::Bounds;
use crate::scene::{ElementKind, MemoryScene, SceneElement};

const LABEL: Point = Point { x: 0.0, y: -24.0 };

struct Fixture {
    ws: Workspace<MemoryScene>,
    ctl: RegionLayoutController,
}

impl Fixture {
    fn new() -> Self {
        Self {
            ws: Workspace::new(MemoryScene::new(), 200.0, LABEL),
            ctl: RegionLayoutController::new(RepulsionSolver::new(SolverConfig::default()), 120, 0.5),
        }
    }

    fn add(&mut self, bounds: Bounds) -> (RegionId, RegionBinding, Subscription) {
        let region = Region::new("r", bounds);
        let id = region.id;
        let proxy = self.ws.scene.insert(SceneElement::new(ElementKind::RegionBackground, "r", bounds)).unwrap();
        let label_at = bounds.origin().add(LABEL);
        let label = self
            .ws
            .scene
            .insert(SceneElement::new(ElementKind::RegionLabel, "r", Bounds::new(label_at.x, label_at.y, bounds.width, 20.0)))
            .unwrap();
        self.ws.regions.insert(region).unwrap();
        let binding = RegionBinding { proxy, label };
        let sub = self.ctl.setup(&mut self.ws, id, binding);
        (id, binding, sub)
    }

    /// Simulate the pointer dragging the proxy.
    fn pointer_to(&mut self, binding: &RegionBinding, x: f64, y: f64) {
        self.ws.scene.set_position(&binding.proxy, x, y).unwrap();
    }

    fn origin_of(&self, element: &ElementId) -> Point {
        self.ws.scene.bounds(element).unwrap().origin()
    }
}

// =============================================================
// Lifecycle
// =============================================================

#[test]
fn setup_registers_binding_and_grid_entry() {
    let mut f = Fixture::new();
    let (id, binding, _) = f.add(Bounds::new(0.0, 0.0, 300.0, 200.0));
    assert!(f.ctl.is_managed(&id));
    assert_eq!(f.ws.bindings.get(&id), Some(&binding));
    assert!(f.ws.grid.get(&id).is_some());
    assert_eq!(f.ctl.phase(&id), Some(&DragPhase::Idle));
}

#[test]
fn teardown_is_idempotent() {
    let mut f = Fixture::new();
    let (id, _, sub) = f.add(Bounds::new(0.0, 0.0, 300.0, 200.0));
    assert!(f.ctl.teardown(&mut f.ws, sub));
    assert!(!f.ctl.teardown(&mut f.ws, sub));
    assert!(!f.ctl.is_managed(&id));
    assert!(f.ws.grid.is_empty());
}

#[test]
fn stale_subscription_does_not_tear_down_newer_setup() {
    let mut f = Fixture::new();
    let (id, binding, old) = f.add(Bounds::new(0.0, 0.0, 300.0, 200.0));
    let fresh = f.ctl.setup(&mut f.ws, id, binding);
    assert!(!f.ctl.teardown(&mut f.ws, old));
    assert!(f.ctl.is_managed(&id));
    assert!(f.ctl.teardown(&mut f.ws, fresh));
}

#[test]
fn begin_drag_refuses_locked_and_unknown_regions() {
    let mut f = Fixture::new();
    let (id, _, _) = f.add(Bounds::new(0.0, 0.0, 300.0, 200.0));
    let ghost = uuid::Uuid::new_v4();
    assert!(!f.ctl.begin_drag(&f.ws, ghost, vec![]));

    let mut locked = f.ws.regions.get(&id).unwrap().clone();
    locked.locked = true;
    f.ws.regions.insert(locked).unwrap();
    assert!(!f.ctl.begin_drag(&f.ws, id, vec![]));
}

// =============================================================
// Dragging
// =============================================================

#[test]
fn free_drag_applies_directly_and_label_follows() {
    let mut f = Fixture::new();
    let (id, binding, _) = f.add(Bounds::new(0.0, 0.0, 300.0, 200.0));
    assert!(f.ctl.begin_drag(&f.ws, id, vec![]));

    f.pointer_to(&binding, 40.0, 30.0);
    assert!(f.ctl.drag_moved(&mut f.ws, id, 0));

    assert!(!f.ctl.is_animating());
    assert_eq!(f.origin_of(&binding.label), Point::new(40.0, 6.0));
    // The store only changes on commit.
    assert_eq!(f.ws.regions.get(&id).unwrap().origin(), Point::zero());
}

#[test]
fn end_drag_commits_once_with_net_displacement() {
    let mut f = Fixture::new();
    let (id, binding, _) = f.add(Bounds::new(0.0, 0.0, 300.0, 200.0));
    f.ctl.begin_drag(&f.ws, id, vec![]);
    f.pointer_to(&binding, 40.0, 30.0);
    f.ctl.drag_moved(&mut f.ws, id, 0);
    f.pointer_to(&binding, 100.0, 50.0);
    f.ctl.drag_moved(&mut f.ws, id, 16);

    let event = f.ctl.end_drag(&mut f.ws, id).unwrap();
    let LayoutEvent::Committed { region, from, to, displacement, .. } = event;
    assert_eq!(region, id);
    assert_eq!(from, Point::zero());
    assert_eq!(to, Point::new(100.0, 50.0));
    assert_eq!(displacement, Point::new(100.0, 50.0));
    assert_eq!(f.ws.regions.get(&id).unwrap().origin(), Point::new(100.0, 50.0));
    assert_eq!(f.ws.grid.get(&id).unwrap().bounds.origin(), Point::new(100.0, 50.0));
    assert_eq!(f.ctl.phase(&id), Some(&DragPhase::Idle));
    assert!(f.ctl.end_drag(&mut f.ws, id).is_none());
}

#[test]
fn dragging_into_a_neighbor_glides_away() {
    let mut f = Fixture::new();
    let (id, binding, _) = f.add(Bounds::new(0.0, 0.0, 300.0, 200.0));
    f.add(Bounds::new(1000.0, 0.0, 300.0, 200.0));
    f.ctl.begin_drag(&f.ws, id, vec![]);

    f.pointer_to(&binding, 800.0, 0.0);
    f.ctl.drag_moved(&mut f.ws, id, 1000);
    assert!(f.ctl.is_animating());
    // The first frame shows the raw pointer position.
    assert_eq!(f.origin_of(&binding.label), Point::new(800.0, -24.0));

    f.ctl.tick(&mut f.ws, 1060);
    let midway = f.origin_of(&binding.proxy);
    assert!(midway.x < 800.0);

    f.ctl.tick(&mut f.ws, 1120);
    assert!(!f.ctl.is_animating());
    let settled = f.origin_of(&binding.proxy);
    assert!(settled.x < midway.x);
    assert!(settled.y.abs() < 1e-9);
    assert_eq!(f.origin_of(&binding.label), settled.add(LABEL));
}

#[test]
fn end_drag_snaps_in_flight_glide_to_target() {
    let mut f = Fixture::new();
    let (id, binding, _) = f.add(Bounds::new(0.0, 0.0, 300.0, 200.0));
    let (other, _, _) = f.add(Bounds::new(1000.0, 0.0, 300.0, 200.0));
    f.ctl.begin_drag(&f.ws, id, vec![]);
    f.pointer_to(&binding, 800.0, 0.0);
    f.ctl.drag_moved(&mut f.ws, id, 0);

    let raw = f.ws.scene.bounds(&binding.proxy).unwrap();
    let neighbors = vec![f.ws.regions.get(&other).unwrap().bounds()];
    let target = f.ctl.solver().apply_repulsion(&raw, &neighbors);

    let LayoutEvent::Committed { to, .. } = f.ctl.end_drag(&mut f.ws, id).unwrap();
    assert!(to.approx_eq(target, 1e-9));
    assert!(!f.ctl.is_animating());
    assert!(f.origin_of(&binding.proxy).approx_eq(target, 1e-9));
}

#[test]
fn new_move_cancels_pending_frame() {
    let mut f = Fixture::new();
    let (id, binding, _) = f.add(Bounds::new(0.0, 0.0, 300.0, 200.0));
    f.add(Bounds::new(1000.0, 0.0, 300.0, 200.0));
    f.ctl.begin_drag(&f.ws, id, vec![]);
    f.pointer_to(&binding, 800.0, 0.0);
    f.ctl.drag_moved(&mut f.ws, id, 0);
    assert!(f.ctl.is_animating());

    // Pointer pulls back to open space: applied directly, stale glide gone.
    f.pointer_to(&binding, 0.0, 500.0);
    f.ctl.drag_moved(&mut f.ws, id, 10);
    assert!(!f.ctl.is_animating());
    f.ctl.tick(&mut f.ws, 500);
    assert_eq!(f.origin_of(&binding.proxy), Point::new(0.0, 500.0));
}

#[test]
fn carried_members_follow_the_region() {
    let mut f = Fixture::new();
    let (id, binding, _) = f.add(Bounds::new(0.0, 0.0, 300.0, 200.0));
    let member = f.ws.scene.insert(SceneElement::new(ElementKind::Shape, "m", Bounds::new(50.0, 50.0, 10.0, 10.0))).unwrap();
    f.ctl.begin_drag(&f.ws, id, vec![member]);

    f.pointer_to(&binding, 20.0, 10.0);
    f.ctl.drag_moved(&mut f.ws, id, 0);
    f.pointer_to(&binding, 60.0, 10.0);
    f.ctl.drag_moved(&mut f.ws, id, 16);

    assert_eq!(f.origin_of(&member), Point::new(110.0, 60.0));
}

#[test]
fn sessions_are_independent() {
    let mut f = Fixture::new();
    let (a, a_binding, _) = f.add(Bounds::new(0.0, 0.0, 100.0, 100.0));
    let (b, b_binding, _) = f.add(Bounds::new(0.0, 2000.0, 100.0, 100.0));
    f.ctl.begin_drag(&f.ws, a, vec![]);
    f.ctl.begin_drag(&f.ws, b, vec![]);
    f.pointer_to(&a_binding, 10.0, 0.0);
    f.pointer_to(&b_binding, 0.0, 2010.0);
    f.ctl.drag_moved(&mut f.ws, a, 0);
    f.ctl.drag_moved(&mut f.ws, b, 0);

    f.ctl.end_drag(&mut f.ws, a);
    assert!(f.ctl.is_dragging(&b));
    let LayoutEvent::Committed { displacement, .. } = f.ctl.end_drag(&mut f.ws, b).unwrap();
    assert_eq!(displacement, Point::new(0.0, 10.0));
}

#[test]
fn drag_moved_without_begin_is_noop() {
    let mut f = Fixture::new();
    let (id, binding, _) = f.add(Bounds::new(0.0, 0.0, 300.0, 200.0));
    f.pointer_to(&binding, 40.0, 40.0);
    assert!(!f.ctl.drag_moved(&mut f.ws, id, 0));
    assert_eq!(f.origin_of(&binding.label), Point::new(0.0, -24.0));
}

#[test]
fn ease_out_is_monotone_and_bounded() {
    let mut last = 0.0;
    for step in 0..=10 {
        let v = ease_out(f64::from(step) / 10.0);
        assert!(v >= last);
        last = v;
    }
    assert_eq!(ease_out(0.0), 0.0);
    assert_eq!(ease_out(1.0), 1.0);
}
