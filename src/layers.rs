//! Layer list derived from the scene's paint order.
//!
//! The layer panel shows every non-decorative element, bottom to top, with
//! a stable [`LayerId`]. Ids are handed out lazily the first time an element
//! is seen and live in a side table until the element leaves the scene.
//!
//! Recomputation is debounced, and a rebuild that produces the same list
//! keeps the previous `Arc`, so consumers can compare with `Arc::ptr_eq` to
//! skip redraws.

#[cfg(test)]
#[path = "layers_test.rs"]
mod layers_test;

use std::collections::HashMap;
use std::sync::Arc;

use serde::{Deserialize, Serialize};
use tracing::debug;

use crate::error::SceneError;
use crate::geom::Point;
use crate::scene::{ElementId, ElementKind, SceneGraph};

/// Stable identity of a layer row.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
pub struct LayerId(pub u64);

/// One row of the layer panel.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Layer {
    pub id: LayerId,
    pub element: ElementId,
    pub name: String,
    pub kind: ElementKind,
    pub visible: bool,
    pub locked: bool,
    /// Position among layers, 0 at the bottom.
    pub z_index: usize,
}

/// Derived, reference-stable layer list.
#[derive(Debug)]
pub struct LayerOrder {
    layers: Arc<[Layer]>,
    ids: HashMap<ElementId, LayerId>,
    next_id: u64,
    debounce_ms: u64,
    deadline: Option<u64>,
}

impl LayerOrder {
    #[must_use]
    pub fn new(debounce_ms: u64) -> Self {
        Self { layers: Arc::from(Vec::new()), ids: HashMap::new(), next_id: 1, debounce_ms, deadline: None }
    }

    /// Current layer list, bottom to top.
    #[must_use]
    pub fn layers(&self) -> Arc<[Layer]> {
        Arc::clone(&self.layers)
    }

    #[must_use]
    pub fn layer(&self, id: LayerId) -> Option<&Layer> {
        self.layers.iter().find(|layer| layer.id == id)
    }

    #[must_use]
    pub fn layer_for(&self, element: &ElementId) -> Option<LayerId> {
        self.ids.get(element).copied()
    }

    /// Request a rebuild after the debounce window; repeated calls push it out.
    pub fn schedule(&mut self, now_ms: u64) {
        self.deadline = Some(now_ms.saturating_add(self.debounce_ms));
    }

    #[must_use]
    pub fn next_deadline(&self) -> Option<u64> {
        self.deadline
    }

    /// Rebuild if the debounce window has closed. Returns true when the list changed.
    pub fn poll<S: SceneGraph>(&mut self, now_ms: u64, scene: &S) -> bool {
        match self.deadline {
            Some(deadline) if deadline <= now_ms => self.recompute(scene),
            _ => false,
        }
    }

    /// Rebuild from the scene now. Returns true when the list changed.
    pub fn recompute<S: SceneGraph>(&mut self, scene: &S) -> bool {
        self.deadline = None;
        let mut rebuilt = Vec::new();
        for el in scene.elements() {
            if el.kind.is_decorative() {
                continue;
            }
            let id = match self.ids.get(&el.id) {
                Some(id) => *id,
                None => {
                    let id = LayerId(self.next_id);
                    self.next_id += 1;
                    self.ids.insert(el.id, id);
                    id
                }
            };
            rebuilt.push(Layer {
                id,
                element: el.id,
                name: el.name.clone(),
                kind: el.kind,
                visible: el.visible,
                locked: el.locked,
                z_index: rebuilt.len(),
            });
        }
        self.ids.retain(|element, _| scene.element(element).is_some_and(|el| !el.kind.is_decorative()));

        if *self.layers == rebuilt[..] {
            return false;
        }
        debug!(count = rebuilt.len(), "layers: list rebuilt");
        self.layers = Arc::from(rebuilt);
        true
    }

    /// Flip an element's visibility. `Ok(false)` for unknown layers.
    ///
    /// # Errors
    ///
    /// Returns the scene's failure.
    pub fn toggle_visibility<S: SceneGraph>(&mut self, id: LayerId, scene: &mut S) -> Result<bool, SceneError> {
        let Some(layer) = self.layer(id) else {
            return Ok(false);
        };
        scene.set_visible(&layer.element, !layer.visible)?;
        self.recompute(scene);
        Ok(true)
    }

    /// Flip an element's lock. `Ok(false)` for unknown layers.
    ///
    /// # Errors
    ///
    /// Returns the scene's failure.
    pub fn toggle_lock<S: SceneGraph>(&mut self, id: LayerId, scene: &mut S) -> Result<bool, SceneError> {
        let Some(layer) = self.layer(id) else {
            return Ok(false);
        };
        scene.set_locked(&layer.element, !layer.locked)?;
        self.recompute(scene);
        Ok(true)
    }

    /// Bring one layer forward, past any decorative elements in between.
    /// `Ok(false)` when no layer is above.
    ///
    /// # Errors
    ///
    /// Returns the scene's failure.
    pub fn move_up<S: SceneGraph>(&mut self, id: LayerId, scene: &mut S) -> Result<bool, SceneError> {
        self.reorder(id, scene, |scene, el| step_past_decorations(scene, el, true))
    }

    /// Send one layer backward, stepping over decorative elements.
    ///
    /// # Errors
    ///
    /// Returns the scene's failure.
    pub fn move_down<S: SceneGraph>(&mut self, id: LayerId, scene: &mut S) -> Result<bool, SceneError> {
        self.reorder(id, scene, |scene, el| step_past_decorations(scene, el, false))
    }

    /// Send to the bottom of the paint order.
    ///
    /// # Errors
    ///
    /// Returns the scene's failure.
    pub fn move_to_back<S: SceneGraph>(&mut self, id: LayerId, scene: &mut S) -> Result<bool, SceneError> {
        self.reorder(id, scene, |scene, el| scene.send_to_back(el))
    }

    /// Clone a layer's element, offset it, and place it directly above the
    /// original. Returns the new layer's id, or `None` for unknown layers.
    ///
    /// # Errors
    ///
    /// Returns the scene's failure.
    pub fn duplicate<S: SceneGraph>(
        &mut self,
        id: LayerId,
        scene: &mut S,
        offset: f64,
    ) -> Result<Option<LayerId>, SceneError> {
        let Some(original) = self.layer(id).map(|layer| layer.element) else {
            return Ok(None);
        };
        let copy = scene.clone_element(&original)?;
        let bounds = scene.bounds(&copy).ok_or(SceneError::ElementNotFound(copy))?;
        let shifted = bounds.origin().add(Point::new(offset, offset));
        scene.set_position(&copy, shifted.x, shifted.y)?;

        loop {
            let (Some(at), Some(target)) = (scene.index_of(&copy), scene.index_of(&original)) else {
                break;
            };
            if at <= target + 1 || !scene.send_backward(&copy)? {
                break;
            }
        }

        self.recompute(scene);
        Ok(self.layer_for(&copy))
    }

    /// Remove a layer's element from the scene and release its id.
    ///
    /// # Errors
    ///
    /// Returns the scene's failure.
    pub fn delete<S: SceneGraph>(&mut self, id: LayerId, scene: &mut S) -> Result<bool, SceneError> {
        let Some(element) = self.layer(id).map(|layer| layer.element) else {
            return Ok(false);
        };
        scene.remove(&element)?;
        self.ids.remove(&element);
        self.recompute(scene);
        Ok(true)
    }

    fn reorder<S, F>(&mut self, id: LayerId, scene: &mut S, op: F) -> Result<bool, SceneError>
    where
        S: SceneGraph,
        F: FnOnce(&mut S, &ElementId) -> Result<bool, SceneError>,
    {
        let Some(element) = self.layer(id).map(|layer| layer.element) else {
            return Ok(false);
        };
        let moved = op(scene, &element)?;
        if moved {
            self.recompute(scene);
        }
        Ok(moved)
    }
}

/// Move `element` next to the nearest non-decorative element in the given
/// direction, passing any decorations in between. Does nothing when only
/// decorations lie that way.
fn step_past_decorations<S: SceneGraph>(scene: &mut S, element: &ElementId, up: bool) -> Result<bool, SceneError> {
    let at = scene.index_of(element).ok_or(SceneError::ElementNotFound(*element))?;
    let target = {
        let elements = scene.elements();
        let visible = |i: &usize| elements.get(*i).is_some_and(|el| !el.kind.is_decorative());
        if up { (at + 1..elements.len()).find(visible) } else { (0..at).rev().find(visible) }
    };
    let Some(target) = target else {
        return Ok(false);
    };
    for _ in 0..at.abs_diff(target) {
        let stepped = if up { scene.bring_forward(element)? } else { scene.send_backward(element)? };
        if !stepped {
            break;
        }
    }
    Ok(true)
}
