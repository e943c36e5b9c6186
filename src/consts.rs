//! Shared numeric constants for the layout engine.
//!
//! These are the defaults behind [`crate::config::EditorConfig`]; every one of
//! them can be overridden at runtime.

// ── Spatial index ───────────────────────────────────────────────

/// Side length of one spatial-grid cell in world units.
pub const GRID_CELL_SIZE: f64 = 200.0;

/// Items or queries covering more cells than this skip the cell table.
pub const GRID_MAX_CELLS: u64 = 4096;

// ── Repulsion ───────────────────────────────────────────────────

/// Center distance beyond which two regions exert no force on each other.
pub const REPULSION_DISTANCE: f64 = 300.0;

/// Coarse neighbor radius applied before the precise force calculation.
pub const PREFILTER_RADIUS: f64 = 300.0;

/// Force multiplier, as a fraction of the pair's repulsion distance.
pub const FORCE_SCALE: f64 = 1.0;

/// Fraction of the aggregate force applied per step.
pub const DAMPING: f64 = 0.5;

/// Smallest center separation considered practical; below half of it the floor force applies.
pub const MIN_SEPARATION: f64 = 40.0;

/// Lower bound on force magnitude once centers are closer than `MIN_SEPARATION / 2`.
pub const FLOOR_FORCE: f64 = 20.0;

/// Extra clearance added on top of the geometric separation distance of a pair.
pub const SEPARATION_MARGIN: f64 = 24.0;

/// Iteration cap for a whole-layout settle pass.
pub const SETTLE_MAX_ITERATIONS: usize = 200;

/// Corrections smaller than this (world units) are applied without animation.
pub const CORRECTION_EPSILON: f64 = 0.5;

// ── Region layout ───────────────────────────────────────────────

/// Duration of a corrective glide toward the repelled position.
pub const CORRECTION_ANIMATION_MS: u64 = 120;

/// Offset of the region nameplate from the region's top-left corner.
pub const LABEL_OFFSET_X: f64 = 0.0;

/// Nameplate sits above the region.
pub const LABEL_OFFSET_Y: f64 = -24.0;

/// Height of the nameplate element created for each region.
pub const LABEL_HEIGHT: f64 = 20.0;

// ── Debounce windows ────────────────────────────────────────────

/// Per-element membership reassignment debounce.
pub const MEMBERSHIP_DEBOUNCE_MS: u64 = 150;

/// Layer list recomputation debounce.
pub const LAYER_DEBOUNCE_MS: u64 = 100;

// ── History ─────────────────────────────────────────────────────

/// Maximum number of undo entries kept.
pub const HISTORY_MAX_DEPTH: usize = 50;

/// Moves of the same object closer together than this merge into one entry.
pub const MERGE_WINDOW_MS: u64 = 500;

/// Commands submitted within this window are committed as one pass.
pub const BATCH_WINDOW_MS: u64 = 50;

// ── Duplication ─────────────────────────────────────────────────

/// Offset applied to a duplicated layer.
pub const DUPLICATE_OFFSET: f64 = 10.0;

/// Offset applied to a pasted region relative to its source.
pub const PASTE_OFFSET: f64 = 40.0;
