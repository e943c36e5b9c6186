//! Scene-graph contract and an in-memory implementation.
//!
//! The scene graph is the single source of truth for geometry and paint
//! order. The engine reads bounds and order through [`SceneGraph`] and writes
//! back positions, visibility, lock state and order changes; it never keeps an
//! authoritative copy of its own. Hosts adapt their rendering engine to this
//! trait; [`MemoryScene`] is a plain vector-backed implementation used by the
//! CLI and the tests.

#[cfg(test)]
#[path = "scene_test.rs"]
mod scene_test;

use serde::{Deserialize, Serialize};
use uuid::Uuid;

use crate::error::SceneError;
use crate::geom::Bounds;

/// Unique identifier for a scene element.
pub type ElementId = Uuid;

/// The kind of a scene element.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum ElementKind {
    /// Vector shape (rect, ellipse, path).
    Shape,
    /// Text block.
    Text,
    /// Raster image.
    Image,
    /// Group of other elements, moved as one.
    Group,
    /// Background rectangle standing in for a region on the canvas.
    RegionBackground,
    /// Nameplate drawn next to a region.
    RegionLabel,
    /// Canvas grid line.
    GridLine,
}

impl ElementKind {
    /// Internal chrome that never shows up in the layer list or joins a region.
    #[must_use]
    pub fn is_decorative(self) -> bool {
        matches!(self, Self::RegionBackground | Self::RegionLabel | Self::GridLine)
    }
}

/// A scene element as seen through the contract.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct SceneElement {
    pub id: ElementId,
    pub kind: ElementKind,
    /// Display name, shown in the layer list.
    pub name: String,
    pub bounds: Bounds,
    pub visible: bool,
    pub locked: bool,
    /// Host-defined properties the engine never interprets.
    #[serde(default)]
    pub props: serde_json::Value,
}

impl SceneElement {
    /// A visible, unlocked element with a fresh id.
    #[must_use]
    pub fn new(kind: ElementKind, name: impl Into<String>, bounds: Bounds) -> Self {
        Self {
            id: Uuid::new_v4(),
            kind,
            name: name.into(),
            bounds,
            visible: true,
            locked: false,
            props: serde_json::Value::Null,
        }
    }
}

/// Structural change notifications emitted by the scene graph.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum SceneEvent {
    Added(ElementId),
    Removed(ElementId),
    Modified(ElementId),
}

impl SceneEvent {
    #[must_use]
    pub fn element(&self) -> ElementId {
        match self {
            Self::Added(id) | Self::Removed(id) | Self::Modified(id) => *id,
        }
    }
}

/// What the engine needs from the host's scene graph.
///
/// Paint order runs bottom to top: index 0 is painted first.
pub trait SceneGraph {
    /// All elements in paint order.
    fn elements(&self) -> Vec<&SceneElement>;

    fn element(&self, id: &ElementId) -> Option<&SceneElement>;

    /// Position of an element in paint order.
    fn index_of(&self, id: &ElementId) -> Option<usize>;

    fn len(&self) -> usize;

    fn is_empty(&self) -> bool {
        self.len() == 0
    }

    fn bounds(&self, id: &ElementId) -> Option<Bounds> {
        self.element(id).map(|el| el.bounds)
    }

    /// Add an element on top of the paint order.
    ///
    /// # Errors
    ///
    /// Returns `DuplicateElement` if the id is already present.
    fn insert(&mut self, element: SceneElement) -> Result<ElementId, SceneError>;

    /// Add an element at a paint-order index.
    ///
    /// # Errors
    ///
    /// Returns `IndexOutOfRange` when `index > len` and `DuplicateElement` on id reuse.
    fn insert_at(&mut self, element: SceneElement, index: usize) -> Result<ElementId, SceneError>;

    /// # Errors
    ///
    /// Returns `ElementNotFound` for unknown ids.
    fn remove(&mut self, id: &ElementId) -> Result<SceneElement, SceneError>;

    /// # Errors
    ///
    /// Returns `ElementNotFound` for unknown ids.
    fn set_bounds(&mut self, id: &ElementId, bounds: Bounds) -> Result<(), SceneError>;

    /// Move an element's top-left corner, keeping its size.
    ///
    /// # Errors
    ///
    /// Returns `ElementNotFound` for unknown ids.
    fn set_position(&mut self, id: &ElementId, x: f64, y: f64) -> Result<(), SceneError> {
        let bounds = self.bounds(id).ok_or(SceneError::ElementNotFound(*id))?;
        self.set_bounds(id, Bounds::new(x, y, bounds.width, bounds.height))
    }

    /// # Errors
    ///
    /// Returns `ElementNotFound` for unknown ids.
    fn set_name(&mut self, id: &ElementId, name: &str) -> Result<(), SceneError>;

    /// # Errors
    ///
    /// Returns `ElementNotFound` for unknown ids.
    fn set_visible(&mut self, id: &ElementId, visible: bool) -> Result<(), SceneError>;

    /// # Errors
    ///
    /// Returns `ElementNotFound` for unknown ids.
    fn set_locked(&mut self, id: &ElementId, locked: bool) -> Result<(), SceneError>;

    /// Swap with the element painted directly above. Returns false at the top.
    ///
    /// # Errors
    ///
    /// Returns `ElementNotFound` for unknown ids.
    fn bring_forward(&mut self, id: &ElementId) -> Result<bool, SceneError>;

    /// Swap with the element painted directly below. Returns false at the bottom.
    ///
    /// # Errors
    ///
    /// Returns `ElementNotFound` for unknown ids.
    fn send_backward(&mut self, id: &ElementId) -> Result<bool, SceneError>;

    /// Move to the bottom of the paint order. Returns false if already there.
    ///
    /// # Errors
    ///
    /// Returns `ElementNotFound` for unknown ids.
    fn send_to_back(&mut self, id: &ElementId) -> Result<bool, SceneError>;

    /// Copy an element under a fresh id and paint it on top.
    ///
    /// # Errors
    ///
    /// Returns `ElementNotFound` for unknown ids.
    fn clone_element(&mut self, id: &ElementId) -> Result<ElementId, SceneError>;

    /// Take every change notification recorded since the last call.
    fn drain_events(&mut self) -> Vec<SceneEvent>;
}

/// Vector-backed scene graph that records its own change events.
#[derive(Debug, Default)]
pub struct MemoryScene {
    elements: Vec<SceneElement>,
    events: Vec<SceneEvent>,
}

impl MemoryScene {
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    /// Build a scene from elements already in paint order, without events.
    #[must_use]
    pub fn from_elements(elements: Vec<SceneElement>) -> Self {
        Self { elements, events: Vec::new() }
    }

    fn position(&self, id: &ElementId) -> Result<usize, SceneError> {
        self.elements
            .iter()
            .position(|el| el.id == *id)
            .ok_or(SceneError::ElementNotFound(*id))
    }

    fn element_mut(&mut self, id: &ElementId) -> Result<&mut SceneElement, SceneError> {
        self.elements
            .iter_mut()
            .find(|el| el.id == *id)
            .ok_or(SceneError::ElementNotFound(*id))
    }
}

impl SceneGraph for MemoryScene {
    fn elements(&self) -> Vec<&SceneElement> {
        self.elements.iter().collect()
    }

    fn element(&self, id: &ElementId) -> Option<&SceneElement> {
        self.elements.iter().find(|el| el.id == *id)
    }

    fn index_of(&self, id: &ElementId) -> Option<usize> {
        self.elements.iter().position(|el| el.id == *id)
    }

    fn len(&self) -> usize {
        self.elements.len()
    }

    fn insert(&mut self, element: SceneElement) -> Result<ElementId, SceneError> {
        let len = self.elements.len();
        self.insert_at(element, len)
    }

    fn insert_at(&mut self, element: SceneElement, index: usize) -> Result<ElementId, SceneError> {
        if index > self.elements.len() {
            return Err(SceneError::IndexOutOfRange { index, len: self.elements.len() });
        }
        if self.element(&element.id).is_some() {
            return Err(SceneError::DuplicateElement(element.id));
        }
        let id = element.id;
        self.elements.insert(index, element);
        self.events.push(SceneEvent::Added(id));
        Ok(id)
    }

    fn remove(&mut self, id: &ElementId) -> Result<SceneElement, SceneError> {
        let index = self.position(id)?;
        let element = self.elements.remove(index);
        self.events.push(SceneEvent::Removed(*id));
        Ok(element)
    }

    fn set_bounds(&mut self, id: &ElementId, bounds: Bounds) -> Result<(), SceneError> {
        self.element_mut(id)?.bounds = bounds;
        self.events.push(SceneEvent::Modified(*id));
        Ok(())
    }

    fn set_name(&mut self, id: &ElementId, name: &str) -> Result<(), SceneError> {
        name.clone_into(&mut self.element_mut(id)?.name);
        self.events.push(SceneEvent::Modified(*id));
        Ok(())
    }

    fn set_visible(&mut self, id: &ElementId, visible: bool) -> Result<(), SceneError> {
        self.element_mut(id)?.visible = visible;
        self.events.push(SceneEvent::Modified(*id));
        Ok(())
    }

    fn set_locked(&mut self, id: &ElementId, locked: bool) -> Result<(), SceneError> {
        self.element_mut(id)?.locked = locked;
        self.events.push(SceneEvent::Modified(*id));
        Ok(())
    }

    fn bring_forward(&mut self, id: &ElementId) -> Result<bool, SceneError> {
        let index = self.position(id)?;
        if index + 1 >= self.elements.len() {
            return Ok(false);
        }
        self.elements.swap(index, index + 1);
        self.events.push(SceneEvent::Modified(*id));
        Ok(true)
    }

    fn send_backward(&mut self, id: &ElementId) -> Result<bool, SceneError> {
        let index = self.position(id)?;
        if index == 0 {
            return Ok(false);
        }
        self.elements.swap(index, index - 1);
        self.events.push(SceneEvent::Modified(*id));
        Ok(true)
    }

    fn send_to_back(&mut self, id: &ElementId) -> Result<bool, SceneError> {
        let index = self.position(id)?;
        if index == 0 {
            return Ok(false);
        }
        let element = self.elements.remove(index);
        self.elements.insert(0, element);
        self.events.push(SceneEvent::Modified(*id));
        Ok(true)
    }

    fn clone_element(&mut self, id: &ElementId) -> Result<ElementId, SceneError> {
        let index = self.position(id)?;
        let mut copy = self.elements[index].clone();
        copy.id = Uuid::new_v4();
        self.insert(copy)
    }

    fn drain_events(&mut self) -> Vec<SceneEvent> {
        std::mem::take(&mut self.events)
    }
}
