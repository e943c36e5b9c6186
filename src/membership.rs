//! Element-to-region membership.
//!
//! An element belongs to the region that contains the center of its
//! bounding box. Where regions overlap, the smallest one wins, with ties
//! going to the earlier region in the input order. Zero-area regions never
//! claim anything.
//!
//! Scene modifications arrive in bursts while the user drags, so the
//! recomputation is debounced per element: every `schedule` call pushes the
//! element's deadline out, and `poll` settles whatever is due. Only a real
//! change (a different region, or joining or leaving any region) produces a
//! [`MembershipChange`].

#[cfg(test)]
#[path = "membership_test.rs"]
mod membership_test;

use std::collections::HashMap;

use tracing::debug;

use crate::doc::RegionId;
use crate::geom::Bounds;
use crate::scene::{ElementId, SceneGraph};
use crate::schedule::TimerTable;

/// A settled change in an element's region.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct MembershipChange {
    pub element: ElementId,
    pub from: Option<RegionId>,
    pub to: Option<RegionId>,
}

/// The region whose bounds contain the center of `bounds`.
#[must_use]
pub fn containing_region(bounds: &Bounds, regions: &[(RegionId, Bounds)]) -> Option<RegionId> {
    let center = bounds.center();
    if !center.is_finite() {
        return None;
    }
    let mut best: Option<(RegionId, f64)> = None;
    for (id, region) in regions {
        if region.is_degenerate() || !region.contains_point(center) {
            continue;
        }
        let area = region.area();
        match best {
            Some((_, best_area)) if best_area <= area => {}
            _ => best = Some((*id, area)),
        }
    }
    best.map(|(id, _)| id)
}

/// Debounced membership table.
#[derive(Debug)]
pub struct MembershipTracker {
    assignments: HashMap<ElementId, RegionId>,
    timers: TimerTable<ElementId>,
    debounce_ms: u64,
}

impl MembershipTracker {
    #[must_use]
    pub fn new(debounce_ms: u64) -> Self {
        Self { assignments: HashMap::new(), timers: TimerTable::new(), debounce_ms }
    }

    /// Queue a recomputation for `element`, pushing out any pending deadline.
    pub fn schedule(&mut self, element: ElementId, now_ms: u64) {
        self.timers.schedule(element, now_ms, self.debounce_ms);
    }

    #[must_use]
    pub fn is_pending(&self, element: &ElementId) -> bool {
        self.timers.is_pending(element)
    }

    /// Earliest pending deadline, if any.
    #[must_use]
    pub fn next_deadline(&self) -> Option<u64> {
        self.timers.next_deadline()
    }

    /// Settle every element whose debounce window has elapsed.
    ///
    /// Elements that left the scene are dropped. Decorative elements never
    /// belong to a region.
    pub fn poll<S: SceneGraph>(
        &mut self,
        now_ms: u64,
        scene: &S,
        regions: &[(RegionId, Bounds)],
    ) -> Vec<MembershipChange> {
        let mut changes = Vec::new();
        for element in self.timers.take_due(now_ms) {
            let Some(el) = scene.element(&element) else {
                if let Some(from) = self.assignments.remove(&element) {
                    changes.push(MembershipChange { element, from: Some(from), to: None });
                }
                continue;
            };
            if el.kind.is_decorative() {
                continue;
            }
            if let Some(change) = self.update_membership(element, &el.bounds, regions) {
                changes.push(change);
            }
        }
        if !changes.is_empty() {
            debug!(count = changes.len(), "membership: settled changes");
        }
        changes
    }

    /// Recompute one element immediately. Returns a change only when the
    /// containing region differs from the recorded one.
    pub fn update_membership(
        &mut self,
        element: ElementId,
        bounds: &Bounds,
        regions: &[(RegionId, Bounds)],
    ) -> Option<MembershipChange> {
        let to = containing_region(bounds, regions);
        let from = self.assignments.get(&element).copied();
        if from == to {
            return None;
        }
        match to {
            Some(region) => self.assignments.insert(element, region),
            None => self.assignments.remove(&element),
        };
        Some(MembershipChange { element, from, to })
    }

    /// Drop an element: cancel its timer and its annotation.
    pub fn forget(&mut self, element: &ElementId) -> Option<RegionId> {
        self.timers.cancel(element);
        self.assignments.remove(element)
    }

    /// Clear every annotation pointing at `region`. Returns the affected elements.
    pub fn release_region(&mut self, region: &RegionId) -> Vec<ElementId> {
        let mut released: Vec<ElementId> =
            self.assignments.iter().filter(|(_, r)| *r == region).map(|(el, _)| *el).collect();
        released.sort();
        for element in &released {
            self.assignments.remove(element);
        }
        released
    }

    #[must_use]
    pub fn region_of(&self, element: &ElementId) -> Option<RegionId> {
        self.assignments.get(element).copied()
    }

    /// Members of `region`, sorted by id.
    #[must_use]
    pub fn members(&self, region: &RegionId) -> Vec<ElementId> {
        let mut members: Vec<ElementId> =
            self.assignments.iter().filter(|(_, r)| *r == region).map(|(el, _)| *el).collect();
        members.sort();
        members
    }

    pub fn clear(&mut self) {
        self.assignments.clear();
        self.timers.clear();
    }

    /// Number of elements currently assigned to some region.
    #[must_use]
    pub fn len(&self) -> usize {
        self.assignments.len()
    }

    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.assignments.is_empty()
    }
}
