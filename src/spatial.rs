//! Uniform-grid spatial index over axis-aligned bounds.
//!
//! DESIGN
//! ======
//! The plane is cut into fixed-size square cells. An item is listed under
//! every cell its bounding box touches (inclusive range over cell
//! coordinates), so a query only visits the cells its own rectangle covers.
//! Candidates gathered from those cells are deduplicated and then filtered by
//! the exact rectangle test. There is no rebalancing: the workload is a few
//! hundred regions, and cell size is the only tuning knob.
//!
//! Footprints are capped at [`GRID_MAX_CELLS`]. A larger item is kept on a
//! separate oversize list that every query checks, and a larger query falls
//! back to a linear scan of all items. Either way the work is bounded by the
//! item count, never by the area of a rectangle.

#[cfg(test)]
#[path = "spatial_test.rs"]
mod spatial_test;

use std::collections::{HashMap, HashSet};
use std::hash::Hash;

use tracing::debug;

use crate::consts::{GRID_CELL_SIZE, GRID_MAX_CELLS};
use crate::geom::Bounds;

type Cell = (i64, i64);

/// An entry in the grid: identity, bounds, and an arbitrary payload.
#[derive(Debug, Clone, PartialEq)]
pub struct SpatialItem<K, P> {
    pub id: K,
    pub bounds: Bounds,
    pub payload: P,
}

impl<K, P> SpatialItem<K, P> {
    #[must_use]
    pub fn new(id: K, bounds: Bounds, payload: P) -> Self {
        Self { id, bounds, payload }
    }
}

struct Slot<K, P> {
    seq: u64,
    item: SpatialItem<K, P>,
    cells: Vec<Cell>,
}

/// Grid index keyed by `K`, carrying payload `P` per item.
pub struct SpatialGrid<K, P> {
    cell_size: f64,
    cells: HashMap<Cell, Vec<K>>,
    slots: HashMap<K, Slot<K, P>>,
    oversize: Vec<K>,
    next_seq: u64,
}

impl<K, P> SpatialGrid<K, P>
where
    K: Copy + Eq + Hash,
{
    /// Create a grid with the given cell size. Non-finite or non-positive
    /// sizes fall back to [`GRID_CELL_SIZE`].
    #[must_use]
    pub fn new(cell_size: f64) -> Self {
        let cell_size = if cell_size.is_finite() && cell_size > 0.0 { cell_size } else { GRID_CELL_SIZE };
        Self { cell_size, cells: HashMap::new(), slots: HashMap::new(), oversize: Vec::new(), next_seq: 0 }
    }

    #[must_use]
    pub fn cell_size(&self) -> f64 {
        self.cell_size
    }

    /// Index an item. An existing item with the same id is replaced.
    pub fn insert(&mut self, item: SpatialItem<K, P>) {
        self.remove(&item.id);
        if !item.bounds.x.is_finite()
            || !item.bounds.y.is_finite()
            || !item.bounds.width.is_finite()
            || !item.bounds.height.is_finite()
        {
            debug!(bounds = ?item.bounds, "spatial: skipping non-finite bounds");
            return;
        }

        let cells = if let Some(cells) = self.cells_for(&item.bounds) {
            for cell in &cells {
                self.cells.entry(*cell).or_default().push(item.id);
            }
            cells
        } else {
            debug!(bounds = ?item.bounds, "spatial: indexing oversize item");
            self.oversize.push(item.id);
            Vec::new()
        };
        let seq = self.next_seq;
        self.next_seq += 1;
        self.slots.insert(item.id, Slot { seq, item, cells });
    }

    /// Drop an item from every cell it occupies. Unknown ids are ignored.
    pub fn remove(&mut self, id: &K) -> Option<SpatialItem<K, P>> {
        let slot = self.slots.remove(id)?;
        if slot.cells.is_empty() {
            self.oversize.retain(|other| other != id);
        }
        for cell in &slot.cells {
            if let Some(ids) = self.cells.get_mut(cell) {
                ids.retain(|other| other != id);
                if ids.is_empty() {
                    self.cells.remove(cell);
                }
            }
        }
        Some(slot.item)
    }

    /// Re-index an item after its bounds changed.
    pub fn update(&mut self, item: SpatialItem<K, P>) {
        self.remove(&item.id);
        self.insert(item);
    }

    /// Items whose bounds intersect `bounds`, each reported once, in insertion order.
    #[must_use]
    pub fn query(&self, bounds: &Bounds, exclude: Option<&K>) -> Vec<&SpatialItem<K, P>> {
        let mut hits: Vec<&Slot<K, P>> = match self.cells_for(bounds) {
            Some(cells) => {
                let mut seen: HashSet<K> = HashSet::new();
                let candidates = cells
                    .iter()
                    .filter_map(|cell| self.cells.get(cell))
                    .flatten()
                    .chain(&self.oversize)
                    .filter(|id| seen.insert(**id));
                candidates.filter_map(|id| self.slots.get(id)).collect()
            }
            None => self.slots.values().collect(),
        };
        hits.retain(|slot| exclude != Some(&slot.item.id) && slot.item.bounds.intersects(bounds));
        hits.sort_by_key(|slot| slot.seq);
        hits.into_iter().map(|slot| &slot.item).collect()
    }

    #[must_use]
    pub fn get(&self, id: &K) -> Option<&SpatialItem<K, P>> {
        self.slots.get(id).map(|slot| &slot.item)
    }

    /// All items in insertion order.
    #[must_use]
    pub fn items(&self) -> Vec<&SpatialItem<K, P>> {
        let mut slots: Vec<&Slot<K, P>> = self.slots.values().collect();
        slots.sort_by_key(|slot| slot.seq);
        slots.into_iter().map(|slot| &slot.item).collect()
    }

    pub fn clear(&mut self) {
        self.cells.clear();
        self.slots.clear();
        self.oversize.clear();
    }

    #[must_use]
    pub fn len(&self) -> usize {
        self.slots.len()
    }

    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.slots.is_empty()
    }

    /// Cells covered by `bounds`, or `None` when the extent is not finite or
    /// spans more than [`GRID_MAX_CELLS`] of them.
    #[allow(clippy::cast_possible_truncation)]
    fn cells_for(&self, bounds: &Bounds) -> Option<Vec<Cell>> {
        if !bounds.x.is_finite() || !bounds.y.is_finite() || !bounds.right().is_finite() || !bounds.bottom().is_finite() {
            return None;
        }
        let min_cx = (bounds.left() / self.cell_size).floor() as i64;
        let max_cx = (bounds.right() / self.cell_size).floor() as i64;
        let min_cy = (bounds.top() / self.cell_size).floor() as i64;
        let max_cy = (bounds.bottom() / self.cell_size).floor() as i64;

        let span = |a: i64, b: i64| u128::from(a.abs_diff(b)) + 1;
        let count = span(min_cx, max_cx) * span(min_cy, max_cy);
        if count > u128::from(GRID_MAX_CELLS) {
            return None;
        }

        let mut out = Vec::with_capacity(count as usize);
        for cx in min_cx.min(max_cx)..=max_cx.max(min_cx) {
            for cy in min_cy.min(max_cy)..=max_cy.max(min_cy) {
                out.push((cx, cy));
            }
        }
        Some(out)
    }
}

impl<K, P> Default for SpatialGrid<K, P>
where
    K: Copy + Eq + Hash,
{
    fn default() -> Self {
        Self::new(GRID_CELL_SIZE)
    }
}
