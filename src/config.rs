//! Engine tunables.
//!
//! Every knob has a compiled-in default from [`crate::consts`] and can be
//! overridden through an `ARTBOARD_*` environment variable. Unparseable
//! values fall back to the default rather than failing.

#[cfg(test)]
#[path = "config_test.rs"]
mod config_test;

use crate::consts::*;
use crate::geom::Point;

/// Repulsion solver tuning.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct SolverConfig {
    /// Center distance at which repulsion fades to zero.
    pub repulsion_distance: f64,
    /// Coarse neighbor radius around the moving rectangle.
    pub prefilter_radius: f64,
    /// Force magnitude multiplier.
    pub force_scale: f64,
    /// Fraction of the aggregate force applied per step, in `(0, 1)`.
    pub damping: f64,
    /// Minimum practical center separation.
    pub min_separation: f64,
    /// Force floor applied below `min_separation / 2`.
    pub floor_force: f64,
    /// Clearance added to a pair's geometric separation distance.
    pub margin: f64,
    /// Iteration cap for [`crate::repulsion::RepulsionSolver::settle`].
    pub max_iterations: usize,
}

impl Default for SolverConfig {
    fn default() -> Self {
        Self {
            repulsion_distance: REPULSION_DISTANCE,
            prefilter_radius: PREFILTER_RADIUS,
            force_scale: FORCE_SCALE,
            damping: DAMPING,
            min_separation: MIN_SEPARATION,
            floor_force: FLOOR_FORCE,
            margin: SEPARATION_MARGIN,
            max_iterations: SETTLE_MAX_ITERATIONS,
        }
    }
}

impl SolverConfig {
    /// Load solver overrides from the environment.
    #[must_use]
    pub fn from_env() -> Self {
        let d = Self::default();
        Self {
            repulsion_distance: env_parse("ARTBOARD_REPULSION_DISTANCE", d.repulsion_distance),
            prefilter_radius: env_parse("ARTBOARD_PREFILTER_RADIUS", d.prefilter_radius),
            force_scale: env_parse("ARTBOARD_FORCE_SCALE", d.force_scale),
            damping: env_parse("ARTBOARD_DAMPING", d.damping).clamp(0.01, 0.99),
            min_separation: env_parse("ARTBOARD_MIN_SEPARATION", d.min_separation),
            floor_force: env_parse("ARTBOARD_FLOOR_FORCE", d.floor_force),
            margin: env_parse("ARTBOARD_SEPARATION_MARGIN", d.margin),
            max_iterations: env_parse("ARTBOARD_SETTLE_MAX_ITERATIONS", d.max_iterations),
        }
    }
}

/// Full editor configuration.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct EditorConfig {
    /// Spatial grid cell size.
    pub grid_cell_size: f64,
    pub solver: SolverConfig,
    /// Length of a corrective glide during drags.
    pub animation_ms: u64,
    /// Corrections below this distance are applied without animation.
    pub correction_epsilon: f64,
    /// Nameplate offset from a region's top-left corner.
    pub label_offset: Point,
    pub membership_debounce_ms: u64,
    pub layer_debounce_ms: u64,
    pub history_max_depth: usize,
    pub merge_window_ms: u64,
    pub batch_window_ms: u64,
    /// Offset applied to duplicated layers.
    pub duplicate_offset: f64,
    /// Offset applied to pasted or duplicated regions.
    pub paste_offset: f64,
}

impl Default for EditorConfig {
    fn default() -> Self {
        Self {
            grid_cell_size: GRID_CELL_SIZE,
            solver: SolverConfig::default(),
            animation_ms: CORRECTION_ANIMATION_MS,
            correction_epsilon: CORRECTION_EPSILON,
            label_offset: Point::new(LABEL_OFFSET_X, LABEL_OFFSET_Y),
            membership_debounce_ms: MEMBERSHIP_DEBOUNCE_MS,
            layer_debounce_ms: LAYER_DEBOUNCE_MS,
            history_max_depth: HISTORY_MAX_DEPTH,
            merge_window_ms: MERGE_WINDOW_MS,
            batch_window_ms: BATCH_WINDOW_MS,
            duplicate_offset: DUPLICATE_OFFSET,
            paste_offset: PASTE_OFFSET,
        }
    }
}

impl EditorConfig {
    /// Load the configuration, applying `ARTBOARD_*` overrides.
    #[must_use]
    pub fn from_env() -> Self {
        let d = Self::default();
        Self {
            grid_cell_size: env_parse("ARTBOARD_GRID_CELL_SIZE", d.grid_cell_size),
            solver: SolverConfig::from_env(),
            animation_ms: env_parse("ARTBOARD_ANIMATION_MS", d.animation_ms),
            correction_epsilon: env_parse("ARTBOARD_CORRECTION_EPSILON", d.correction_epsilon),
            label_offset: Point::new(
                env_parse("ARTBOARD_LABEL_OFFSET_X", d.label_offset.x),
                env_parse("ARTBOARD_LABEL_OFFSET_Y", d.label_offset.y),
            ),
            membership_debounce_ms: env_parse("ARTBOARD_MEMBERSHIP_DEBOUNCE_MS", d.membership_debounce_ms),
            layer_debounce_ms: env_parse("ARTBOARD_LAYER_DEBOUNCE_MS", d.layer_debounce_ms),
            history_max_depth: env_parse("ARTBOARD_HISTORY_MAX_DEPTH", d.history_max_depth).max(1),
            merge_window_ms: env_parse("ARTBOARD_MERGE_WINDOW_MS", d.merge_window_ms),
            batch_window_ms: env_parse("ARTBOARD_BATCH_WINDOW_MS", d.batch_window_ms),
            duplicate_offset: env_parse("ARTBOARD_DUPLICATE_OFFSET", d.duplicate_offset),
            paste_offset: env_parse("ARTBOARD_PASTE_OFFSET", d.paste_offset),
        }
    }
}

/// Parse an environment variable, falling back to `default` when it is unset
/// or does not parse.
pub(crate) fn env_parse<T>(key: &str, default: T) -> T
where
    T: std::str::FromStr + Copy,
{
    match std::env::var(key) {
        Ok(raw) => parse_or(&raw, default),
        Err(_) => default,
    }
}

pub(crate) fn parse_or<T>(raw: &str, default: T) -> T
where
    T: std::str::FromStr + Copy,
{
    raw.trim().parse::<T>().unwrap_or(default)
}
