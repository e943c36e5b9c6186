//! The mutable state commands and the layout controller act on.
//!
//! A `Workspace` bundles the host scene graph with the region records, the
//! proxy/label binding of every region, and the spatial grid over region
//! bounds. Its helpers keep those four in step: moving a region moves its
//! background proxy, its nameplate and the grid entry together.

#[cfg(test)]
#[path = "workspace_test.rs"]
mod workspace_test;

use std::collections::HashMap;

use serde::{Deserialize, Serialize};
use tracing::debug;

use crate::doc::{Region, RegionId, RegionStore};
use crate::error::{CommandError, SceneError};
use crate::geom::{Bounds, Point};
use crate::scene::{ElementId, SceneGraph};
use crate::spatial::{SpatialGrid, SpatialItem};

/// Scene elements that draw a region: its background proxy and its nameplate.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub struct RegionBinding {
    pub proxy: ElementId,
    pub label: ElementId,
}

/// Scene, regions, bindings and the region grid.
pub struct Workspace<S> {
    pub scene: S,
    pub regions: RegionStore,
    pub bindings: HashMap<RegionId, RegionBinding>,
    pub grid: SpatialGrid<RegionId, ()>,
    /// Nameplate offset from a region's top-left corner.
    pub label_offset: Point,
}

impl<S: SceneGraph> Workspace<S> {
    #[must_use]
    pub fn new(scene: S, cell_size: f64, label_offset: Point) -> Self {
        Self {
            scene,
            regions: RegionStore::new(),
            bindings: HashMap::new(),
            grid: SpatialGrid::new(cell_size),
            label_offset,
        }
    }

    /// Region bounds in creation order.
    #[must_use]
    pub fn region_bounds(&self) -> Vec<(RegionId, Bounds)> {
        self.regions.list().into_iter().map(|r| (r.id, r.bounds())).collect()
    }

    /// Re-index a region in the grid from its stored bounds.
    pub fn index_region(&mut self, id: &RegionId) {
        match self.regions.get(id) {
            Some(region) => self.grid.update(SpatialItem::new(*id, region.bounds(), ())),
            None => {
                self.grid.remove(id);
            }
        }
    }

    /// Rebuild the whole grid from the store.
    pub fn reindex(&mut self) {
        self.grid.clear();
        for (id, bounds) in self.region_bounds() {
            self.grid.insert(SpatialItem::new(id, bounds, ()));
        }
    }

    /// Draw a region's chrome at `origin` without touching the store: the
    /// proxy, the nameplate, and `carry` shifted by the same delta from `from`.
    ///
    /// # Errors
    ///
    /// Returns the scene's failure for the proxy or label.
    pub fn move_chrome(
        &mut self,
        id: &RegionId,
        from: Point,
        origin: Point,
        carry: &[ElementId],
    ) -> Result<(), SceneError> {
        if let Some(binding) = self.bindings.get(id).copied() {
            self.scene.set_position(&binding.proxy, origin.x, origin.y)?;
            let label = origin.add(self.label_offset);
            self.scene.set_position(&binding.label, label.x, label.y)?;
        }
        let delta = origin.sub(from);
        if delta == Point::zero() {
            return Ok(());
        }
        for element in carry {
            let Some(bounds) = self.scene.bounds(element) else {
                continue;
            };
            self.scene.set_bounds(element, bounds.translate(delta))?;
        }
        Ok(())
    }

    /// Move a region to `origin`: store, chrome, carried members and grid.
    ///
    /// # Errors
    ///
    /// Returns `TargetNotFound` for unknown regions, or the scene's failure.
    pub fn place_region(&mut self, id: &RegionId, origin: Point, carry: &[ElementId]) -> Result<(), CommandError> {
        let from = self.regions.get(id).map(Region::origin).ok_or(CommandError::TargetNotFound(*id))?;
        self.move_chrome(id, from, origin, carry)?;
        self.regions.set_origin(id, origin);
        self.index_region(id);
        Ok(())
    }

    /// Replace a region's record, redrawing its chrome to match. Returns the
    /// record it replaced.
    ///
    /// # Errors
    ///
    /// Returns `TargetNotFound`, `InvalidSize`, or the scene's failure.
    pub fn replace_region(&mut self, next: Region) -> Result<Region, CommandError> {
        next.validate()?;
        let id = next.id;
        let current = self.regions.get(&id).cloned().ok_or(CommandError::TargetNotFound(id))?;
        if let Some(binding) = self.bindings.get(&id).copied() {
            self.scene.set_bounds(&binding.proxy, next.bounds())?;
            let label = next.origin().add(self.label_offset);
            self.scene.set_position(&binding.label, label.x, label.y)?;
            if next.name != current.name {
                self.scene.set_name(&binding.label, &next.name)?;
            }
            if next.locked != current.locked {
                self.scene.set_locked(&binding.proxy, next.locked)?;
            }
        }
        self.regions.insert(next)?;
        self.index_region(&id);
        Ok(current)
    }

    /// Register a region whose chrome is already in the scene.
    ///
    /// # Errors
    ///
    /// Returns `InvalidSize` for non-positive dimensions.
    pub fn attach(&mut self, region: Region, index: usize, binding: RegionBinding) -> Result<(), CommandError> {
        let id = region.id;
        self.regions.insert_at(region, index)?;
        self.bindings.insert(id, binding);
        self.index_region(&id);
        debug!(%id, "workspace: region attached");
        Ok(())
    }

    /// Unregister a region, leaving its chrome in the scene. Returns the
    /// record, its position in creation order, and its binding.
    pub fn detach(&mut self, id: &RegionId) -> Option<(Region, usize, Option<RegionBinding>)> {
        let (region, index) = self.regions.remove(id)?;
        self.grid.remove(id);
        let binding = self.bindings.remove(id);
        debug!(%id, "workspace: region detached");
        Some((region, index, binding))
    }
}
