//! Document model: regions, sparse region updates, the region store, and the
//! persisted document shape.
//!
//! A `Region` is an artboard: a named rectangle on the canvas that elements
//! belong to. The `RegionStore` owns the live region records in creation
//! order; the layout controller publishes settled positions into it and
//! property edits go through `apply_partial`. `Document` is the JSON shape
//! the persistence collaborator stores: regions, zoom, and an opaque
//! scene-graph snapshot the engine passes through untouched.

#[cfg(test)]
#[path = "doc_test.rs"]
mod doc_test;

use std::collections::HashMap;

use serde::{Deserialize, Serialize};
use uuid::Uuid;

use crate::error::RegionError;
use crate::geom::{Bounds, Point};

/// Unique identifier for a region.
pub type RegionId = Uuid;

/// Default region fill.
pub const DEFAULT_BACKGROUND: &str = "#FFFFFF";

/// An artboard on the canvas.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Region {
    /// Stable for the region's lifetime.
    pub id: RegionId,
    pub name: String,
    /// Left edge in world coordinates.
    pub x: f64,
    /// Top edge in world coordinates.
    pub y: f64,
    /// Always positive.
    pub width: f64,
    /// Always positive.
    pub height: f64,
    /// Fill color as a CSS color string.
    pub background_color: String,
    /// The region currently targeted by the host's tools.
    #[serde(default)]
    pub is_active: bool,
    /// Locked regions cannot be dragged.
    #[serde(default)]
    pub locked: bool,
}

impl Region {
    /// A new unlocked, inactive region with a fresh id.
    #[must_use]
    pub fn new(name: impl Into<String>, bounds: Bounds) -> Self {
        Self {
            id: Uuid::new_v4(),
            name: name.into(),
            x: bounds.x,
            y: bounds.y,
            width: bounds.width,
            height: bounds.height,
            background_color: DEFAULT_BACKGROUND.to_owned(),
            is_active: false,
            locked: false,
        }
    }

    #[must_use]
    pub fn bounds(&self) -> Bounds {
        Bounds::new(self.x, self.y, self.width, self.height)
    }

    #[must_use]
    pub fn origin(&self) -> Point {
        Point::new(self.x, self.y)
    }

    /// # Errors
    ///
    /// Returns `InvalidSize` when width or height is not a positive finite number.
    pub fn validate(&self) -> Result<(), RegionError> {
        if self.bounds().is_degenerate() {
            return Err(RegionError::InvalidSize { width: self.width, height: self.height });
        }
        Ok(())
    }
}

/// Sparse update for a region. Only present fields are applied.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct PartialRegion {
    #[serde(skip_serializing_if = "Option::is_none")]
    pub name: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub x: Option<f64>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub y: Option<f64>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub width: Option<f64>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub height: Option<f64>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub background_color: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub is_active: Option<bool>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub locked: Option<bool>,
}

impl PartialRegion {
    /// Apply to a copy of `region` without touching the original.
    #[must_use]
    pub fn applied_to(&self, region: &Region) -> Region {
        let mut out = region.clone();
        if let Some(name) = &self.name {
            out.name.clone_from(name);
        }
        if let Some(x) = self.x {
            out.x = x;
        }
        if let Some(y) = self.y {
            out.y = y;
        }
        if let Some(w) = self.width {
            out.width = w;
        }
        if let Some(h) = self.height {
            out.height = h;
        }
        if let Some(color) = &self.background_color {
            out.background_color.clone_from(color);
        }
        if let Some(active) = self.is_active {
            out.is_active = active;
        }
        if let Some(locked) = self.locked {
            out.locked = locked;
        }
        out
    }
}

/// Live region records in creation order.
#[derive(Debug, Default)]
pub struct RegionStore {
    regions: HashMap<RegionId, Region>,
    order: Vec<RegionId>,
}

impl RegionStore {
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    /// Insert a region at the end of the order, or replace one with the same id in place.
    ///
    /// # Errors
    ///
    /// Returns `InvalidSize` for non-positive dimensions.
    pub fn insert(&mut self, region: Region) -> Result<(), RegionError> {
        let index = self.order.len();
        self.insert_at(region, index)
    }

    /// Insert a region at a position in the order (clamped to the end).
    ///
    /// # Errors
    ///
    /// Returns `InvalidSize` for non-positive dimensions.
    pub fn insert_at(&mut self, region: Region, index: usize) -> Result<(), RegionError> {
        region.validate()?;
        if !self.regions.contains_key(&region.id) {
            let index = index.min(self.order.len());
            self.order.insert(index, region.id);
        }
        self.regions.insert(region.id, region);
        Ok(())
    }

    /// Remove a region, returning it with the position it held in the order.
    pub fn remove(&mut self, id: &RegionId) -> Option<(Region, usize)> {
        let region = self.regions.remove(id)?;
        let index = self.order.iter().position(|other| other == id).unwrap_or(self.order.len());
        if index < self.order.len() {
            self.order.remove(index);
        }
        Some((region, index))
    }

    #[must_use]
    pub fn get(&self, id: &RegionId) -> Option<&Region> {
        self.regions.get(id)
    }

    #[must_use]
    pub fn contains(&self, id: &RegionId) -> bool {
        self.regions.contains_key(id)
    }

    /// Apply a sparse update. Returns the region as it was before.
    ///
    /// # Errors
    ///
    /// Returns `NotFound` for unknown ids and `InvalidSize` if the update
    /// would leave a non-positive dimension; the region is unchanged then.
    pub fn apply_partial(&mut self, id: &RegionId, partial: &PartialRegion) -> Result<Region, RegionError> {
        let current = self.regions.get_mut(id).ok_or(RegionError::NotFound(*id))?;
        let next = partial.applied_to(current);
        next.validate()?;
        Ok(std::mem::replace(current, next))
    }

    /// Move a region's top-left corner. Returns false for unknown ids.
    pub fn set_origin(&mut self, id: &RegionId, origin: Point) -> bool {
        let Some(region) = self.regions.get_mut(id) else {
            return false;
        };
        region.x = origin.x;
        region.y = origin.y;
        true
    }

    /// Mark one region active and every other inactive. Unknown ids clear all.
    pub fn activate(&mut self, id: &RegionId) {
        for (rid, region) in &mut self.regions {
            region.is_active = rid == id;
        }
    }

    /// All regions in creation order.
    #[must_use]
    pub fn list(&self) -> Vec<&Region> {
        self.order.iter().filter_map(|id| self.regions.get(id)).collect()
    }

    /// Cloned regions in creation order.
    #[must_use]
    pub fn to_vec(&self) -> Vec<Region> {
        self.list().into_iter().cloned().collect()
    }

    /// Replace all regions. Invalid records are skipped and reported.
    pub fn load(&mut self, regions: Vec<Region>) -> Vec<RegionError> {
        self.regions.clear();
        self.order.clear();
        let mut rejected = Vec::new();
        for region in regions {
            if let Err(e) = self.insert(region) {
                rejected.push(e);
            }
        }
        rejected
    }

    #[must_use]
    pub fn len(&self) -> usize {
        self.regions.len()
    }

    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.regions.is_empty()
    }
}

/// Current persisted document format version.
pub const DOCUMENT_VERSION: u32 = 1;

/// Persisted editor state.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Document {
    #[serde(default = "default_version")]
    pub version: u32,
    #[serde(default = "default_zoom")]
    pub zoom: f64,
    /// Serialized scene-graph state, owned by the host.
    #[serde(default)]
    pub scene: serde_json::Value,
    #[serde(default)]
    pub regions: Vec<Region>,
}

fn default_version() -> u32 {
    DOCUMENT_VERSION
}

fn default_zoom() -> f64 {
    1.0
}

impl Default for Document {
    fn default() -> Self {
        Self { version: DOCUMENT_VERSION, zoom: 1.0, scene: serde_json::Value::Null, regions: Vec::new() }
    }
}

impl Document {
    /// # Errors
    ///
    /// Returns the underlying JSON error on malformed input.
    pub fn from_json(input: &str) -> Result<Self, serde_json::Error> {
        serde_json::from_str(input)
    }

    /// # Errors
    ///
    /// Returns the underlying JSON error if serialization fails.
    pub fn to_json(&self) -> Result<String, serde_json::Error> {
        serde_json::to_string_pretty(self)
    }
}
