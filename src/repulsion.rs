//! Repulsion between axis-aligned regions.
//!
//! DESIGN
//! ======
//! Each neighbor pushes the moving rectangle away along the line between the
//! two centers. The push fades quadratically with center distance and is
//! zero at or beyond the pair's repulsion distance:
//!
//! ```text
//! force = ((R - d) / R)^2 * scale          scale = force_scale * R
//! ```
//!
//! Scaling by `R` keeps the push proportional to the size of the pair, so a
//! pair of large regions separates as quickly as a pair of small ones. The
//! summed force is damped before it is applied, which keeps competing
//! neighbors from making the rectangle oscillate.
//!
//! This is a relaxation step, not a constraint solve. The layout controller
//! calls it once per drag frame; [`RepulsionSolver::settle`] repeats it over a
//! whole layout until nothing overlaps or the iteration cap is reached.
//!
//! Coincident centers produce no force at all rather than an infinite one;
//! callers that need a guaranteed exit (initial placement) fall back to a
//! deterministic shift.

#[cfg(test)]
#[path = "repulsion_test.rs"]
mod repulsion_test;

use std::hash::Hash;

use tracing::debug;

use crate::config::SolverConfig;
use crate::geom::{Bounds, Point};
use crate::spatial::{SpatialGrid, SpatialItem};

/// Result of a whole-layout settle pass.
#[derive(Debug, Clone)]
pub struct SettleOutcome<K> {
    /// Final bounds per item, in input order.
    pub bounds: Vec<(K, Bounds)>,
    /// Net displacement per item, in input order.
    pub displacements: Vec<(K, Point)>,
    /// Relaxation steps taken.
    pub iterations: usize,
    /// True when no pair overlaps at the end.
    pub resolved: bool,
}

#[derive(Debug, Clone, Copy, Default)]
pub struct RepulsionSolver {
    config: SolverConfig,
}

impl RepulsionSolver {
    #[must_use]
    pub fn new(config: SolverConfig) -> Self {
        Self { config }
    }

    #[must_use]
    pub fn config(&self) -> &SolverConfig {
        &self.config
    }

    /// Displacement contributed by `other` onto `moving`.
    ///
    /// Zero when the centers are at least `repulsion_distance` apart or exactly
    /// coincident. Never returns a non-finite value.
    #[must_use]
    pub fn calculate_force(&self, moving: &Bounds, other: &Bounds, repulsion_distance: f64) -> Point {
        if repulsion_distance <= 0.0 || !repulsion_distance.is_finite() {
            return Point::zero();
        }
        let delta = moving.center().sub(other.center());
        let d = delta.length();
        if !d.is_finite() || d == 0.0 || d >= repulsion_distance {
            return Point::zero();
        }

        let falloff = (repulsion_distance - d) / repulsion_distance;
        let mut magnitude = falloff * falloff * self.config.force_scale * repulsion_distance;
        if d < self.config.min_separation / 2.0 {
            magnitude = magnitude.max(self.config.floor_force);
        }

        let angle = delta.y.atan2(delta.x);
        let force = Point::new(angle.cos() * magnitude, angle.sin() * magnitude);
        if force.is_finite() { force } else { Point::zero() }
    }

    /// Repulsion distance used for a specific pair: the configured distance,
    /// widened to the pair's geometric clearance plus margin.
    #[must_use]
    pub fn effective_distance(&self, a: &Bounds, b: &Bounds) -> f64 {
        self.config.repulsion_distance.max(clearance(a, b) + self.config.margin)
    }

    /// New top-left for `moving` after one damped step away from `neighbors`.
    ///
    /// Neighbors outside the pre-filter radius are ignored.
    #[must_use]
    pub fn apply_repulsion(&self, moving: &Bounds, neighbors: &[Bounds]) -> Point {
        let origin = moving.origin();
        let total = self.aggregate_force(moving, neighbors);
        let next = origin.add(total.scale(self.config.damping));
        if next.is_finite() { next } else { origin }
    }

    /// Neighbors of `moving` from a grid, restricted to the pre-filter radius.
    #[must_use]
    pub fn neighbors<K, P>(&self, moving: &Bounds, grid: &SpatialGrid<K, P>, exclude: Option<&K>) -> Vec<Bounds>
    where
        K: Copy + Eq + Hash,
    {
        let zone = moving.inflate(self.config.prefilter_radius);
        grid.query(&zone, exclude).into_iter().map(|item| item.bounds).collect()
    }

    /// Relax a whole layout until no two items overlap.
    ///
    /// Every step computes all forces from the same snapshot before moving
    /// anything, so a symmetric pair shares the displacement equally.
    #[must_use]
    pub fn settle<K>(&self, items: &[(K, Bounds)], cell_size: f64) -> SettleOutcome<K>
    where
        K: Copy + Eq + Hash,
    {
        let mut current: Vec<(K, Bounds)> = items.to_vec();
        let mut grid: SpatialGrid<K, ()> = SpatialGrid::new(cell_size);
        for (id, bounds) in &current {
            grid.insert(SpatialItem::new(*id, *bounds, ()));
        }

        let mut iterations = 0;
        let mut resolved = !has_overlap(&current, &grid);
        while !resolved && iterations < self.config.max_iterations {
            let steps: Vec<Point> = current
                .iter()
                .map(|(id, bounds)| {
                    let neighbors = self.neighbors(bounds, &grid, Some(id));
                    self.aggregate_force(bounds, &neighbors).scale(self.config.damping)
                })
                .collect();

            for ((id, bounds), step) in current.iter_mut().zip(steps) {
                if step.is_finite() {
                    *bounds = bounds.translate(step);
                    grid.update(SpatialItem::new(*id, *bounds, ()));
                }
            }
            iterations += 1;
            resolved = !has_overlap(&current, &grid);
        }

        debug!(count = current.len(), iterations, resolved, "repulsion: settle pass finished");

        let displacements = items
            .iter()
            .zip(&current)
            .map(|((id, before), (_, after))| (*id, after.origin().sub(before.origin())))
            .collect();
        SettleOutcome { bounds: current, displacements, iterations, resolved }
    }

    /// Position for a new rectangle that overlaps nothing in `occupied`.
    ///
    /// Repulsion steps run first; when they stall (coincident centers) or run
    /// out of iterations, the rectangle is shifted right past whatever it
    /// still overlaps.
    #[must_use]
    pub fn resolve_placement<K, P>(&self, candidate: Bounds, occupied: &SpatialGrid<K, P>, exclude: Option<&K>) -> Bounds
    where
        K: Copy + Eq + Hash,
    {
        let mut pos = candidate;
        for _ in 0..self.config.max_iterations {
            let blocking = overlapping(&pos, occupied, exclude);
            if blocking.is_empty() {
                return pos;
            }
            let neighbors = self.neighbors(&pos, occupied, exclude);
            let next = self.apply_repulsion(&pos, &neighbors);
            if next.approx_eq(pos.origin(), f64::EPSILON) {
                break;
            }
            pos = pos.with_origin(next);
        }

        for _ in 0..=occupied.len() {
            let blocking = overlapping(&pos, occupied, exclude);
            let Some(right) = blocking.iter().map(Bounds::right).reduce(f64::max) else {
                return pos;
            };
            pos = Bounds::new(right + self.config.margin, pos.y, pos.width, pos.height);
        }
        pos
    }

    fn aggregate_force(&self, moving: &Bounds, neighbors: &[Bounds]) -> Point {
        let zone = moving.inflate(self.config.prefilter_radius);
        neighbors
            .iter()
            .filter(|other| other.intersects(&zone))
            .map(|other| self.calculate_force(moving, other, self.effective_distance(moving, other)))
            .fold(Point::zero(), Point::add)
    }
}

/// Center distance, along the current center line, at which two rectangles
/// stop overlapping. Coincident centers use the horizontal half-sum.
#[must_use]
pub fn clearance(a: &Bounds, b: &Bounds) -> f64 {
    let delta = a.center().sub(b.center());
    let d = delta.length();
    let half_w = (a.width + b.width) / 2.0;
    let half_h = (a.height + b.height) / 2.0;
    if d == 0.0 || !d.is_finite() {
        return half_w;
    }
    let ux = delta.x.abs() / d;
    let uy = delta.y.abs() / d;
    let along_x = if ux > 0.0 { half_w / ux } else { f64::INFINITY };
    let along_y = if uy > 0.0 { half_h / uy } else { f64::INFINITY };
    along_x.min(along_y)
}

fn overlapping<K, P>(pos: &Bounds, grid: &SpatialGrid<K, P>, exclude: Option<&K>) -> Vec<Bounds>
where
    K: Copy + Eq + Hash,
{
    grid.query(pos, exclude)
        .into_iter()
        .map(|item| item.bounds)
        .filter(|other| other.overlaps(pos))
        .collect()
}

fn has_overlap<K>(items: &[(K, Bounds)], grid: &SpatialGrid<K, ()>) -> bool
where
    K: Copy + Eq + Hash,
{
    items
        .iter()
        .any(|(id, bounds)| !overlapping(bounds, grid, Some(id)).is_empty())
}
