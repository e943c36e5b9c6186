//! Error types.
//!
//! Geometry and indexing never fail; they fall back to "no displacement" or
//! "no membership change". The errors here cover the scene-graph contract,
//! region edits, and command execution, the last of which is the only kind
//! surfaced to the user.

use uuid::Uuid;

/// Failures reported by a [`crate::scene::SceneGraph`] implementation.
#[derive(Debug, Clone, PartialEq, thiserror::Error)]
pub enum SceneError {
    #[error("element not found: {0}")]
    ElementNotFound(Uuid),
    #[error("element already exists: {0}")]
    DuplicateElement(Uuid),
    #[error("paint index {index} out of range (len {len})")]
    IndexOutOfRange { index: usize, len: usize },
    #[error("scene rejected change: {0}")]
    Rejected(String),
}

/// Failures of region store operations.
#[derive(Debug, Clone, PartialEq, thiserror::Error)]
pub enum RegionError {
    #[error("region not found: {0}")]
    NotFound(Uuid),
    #[error("invalid region size {width}x{height}")]
    InvalidSize { width: f64, height: f64 },
}

/// Failure of a command's `execute` or `undo`.
#[derive(Debug, Clone, PartialEq, thiserror::Error)]
pub enum CommandError {
    #[error("command target not found: {0}")]
    TargetNotFound(Uuid),
    #[error(transparent)]
    Scene(#[from] SceneError),
    #[error(transparent)]
    Region(#[from] RegionError),
    #[error("command failed: {0}")]
    Failed(String),
}
