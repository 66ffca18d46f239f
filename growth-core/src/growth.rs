//! The differential growth simulation object.

use glam::{Vec2, Vec3};
use rand::Rng;
use std::fmt;

use crate::{
    boundary::Boundary,
    config::{GrowthConfig, TubeConfig},
    displacement_buffer::DisplacementBuffer,
    error::{GeometryError, Result},
    phases,
    spatial_hash::SpatialHash,
    tube::TubeMesh,
};

/// Scales the attraction radius at a point.
///
/// Lets a caller vary local spacing over the plane, e.g. denser growth near
/// a feature. Any `Fn(Vec2) -> f32` is a field.
pub trait DistanceField {
    fn scale(&self, p: Vec2) -> f32;
}

/// The constant field `1.0`.
#[derive(Debug, Clone, Copy, Default)]
pub struct Uniform;

impl DistanceField for Uniform {
    #[inline]
    fn scale(&self, _p: Vec2) -> f32 {
        1.0
    }
}

impl<F: Fn(Vec2) -> f32> DistanceField for F {
    #[inline]
    fn scale(&self, p: Vec2) -> f32 {
        self(p)
    }
}

/// A closed polygon loop evolving under differential growth.
///
/// The loop is caller-owned: create one per simulation and drive it by
/// calling [`Growth::grow`] once per tick. There is no built-in stopping
/// rule and the point count grows without bound, so callers must cap
/// iterations or points themselves, or use [`Growth::grow_until`].
///
/// Neighbouring entries of `points` are neighbours along the boundary, and
/// the last point connects back to the first. Growth steps only move points
/// or insert new ones between existing neighbours; they never reorder.
#[derive(Debug)]
pub struct Growth<F = Uniform> {
    points: Vec<Vec2>,
    cfg: GrowthConfig,
    field: F,
    iteration: usize,
    split_count: usize,
    insertion_count: usize,
    acc: DisplacementBuffer,
    repel: DisplacementBuffer,
}

impl Growth<Uniform> {
    /// Starts a simulation from an initial loop with a uniform field.
    ///
    /// ### Errors
    /// See [`Growth::with_field`].
    pub fn new(points: Vec<Vec2>, cfg: GrowthConfig) -> Result<Self> {
        Self::with_field(points, cfg, Uniform)
    }
}

impl<F: DistanceField> Growth<F> {
    pub const MIN_POINTS: usize = 3;

    /// Starts a simulation whose attraction radius is modulated by `field`.
    ///
    /// ### Errors
    /// - [`GeometryError::TooFewPoints`] for a loop of fewer than 3 points.
    /// - [`GeometryError::InvalidParameter`] if a coordinate is not finite.
    /// - Any error from [`GrowthConfig::validate`].
    pub fn with_field(points: Vec<Vec2>, cfg: GrowthConfig, field: F) -> Result<Self> {
        if points.len() < Self::MIN_POINTS {
            return Err(GeometryError::TooFewPoints {
                min: Self::MIN_POINTS,
                actual: points.len(),
            });
        }
        if let Some(bad) = points.iter().find(|p| !p.is_finite()) {
            return Err(GeometryError::InvalidParameter {
                name: "point",
                value: if bad.x.is_finite() { bad.y } else { bad.x },
            });
        }
        cfg.validate()?;

        let acc = DisplacementBuffer::with_len(points.len());
        let repel = DisplacementBuffer::with_len(points.len());
        Ok(Self {
            points,
            cfg,
            field,
            iteration: 0,
            split_count: 0,
            insertion_count: 0,
            acc,
            repel,
        })
    }

    #[inline]
    pub fn points(&self) -> &[Vec2] {
        &self.points
    }

    #[inline]
    pub fn len(&self) -> usize {
        self.points.len()
    }

    #[inline]
    pub fn is_empty(&self) -> bool {
        self.points.is_empty()
    }

    #[inline]
    pub fn config(&self) -> &GrowthConfig {
        &self.cfg
    }

    /// Replaces the parameters for subsequent steps.
    ///
    /// The current configuration is kept if `cfg` fails validation.
    pub fn set_config(&mut self, cfg: GrowthConfig) -> Result<()> {
        cfg.validate()?;
        self.cfg = cfg;
        Ok(())
    }

    #[inline]
    pub fn iteration(&self) -> usize {
        self.iteration
    }

    #[inline]
    pub fn split_count(&self) -> usize {
        self.split_count
    }

    #[inline]
    pub fn insertion_count(&self) -> usize {
        self.insertion_count
    }

    /// Advances the simulation by a single step.
    ///
    /// The step consists of:
    /// 1. [`phases::split_phase`] — subdivide overlong edges.
    /// 2. Build the [`SpatialHash`] at `repulsion_radius`, then run
    ///    [`phases::attraction_phase`] and [`phases::repulsion_phase`]
    ///    (including `boundary` if given) against the same split loop. Both
    ///    displacements are summed and applied in one pass.
    /// 3. Rebuild the hash and run [`phases::insertion_phase`].
    /// 4. [`phases::jiggle_phase`].
    /// 5. [`phases::smoothing_phase`], applied in one pass.
    ///
    /// The hash is rebuilt from scratch each time the points it indexes
    /// have changed.
    ///
    /// ### Parameters
    /// - `boundary` - Optional obstacle points that repel the loop and
    ///   count toward local density.
    /// - `rng` - Source for insertion draws and jiggle.
    pub fn grow(&mut self, boundary: Option<&Boundary>, rng: &mut impl Rng) {
        let radius = self.cfg.repulsion_radius;
        let hashed = boundary.filter(|b| !b.is_empty()).map(|b| b.hashed(radius));

        let (points, splits) = phases::split_phase(&self.points, &self.cfg);
        self.points = points;
        self.split_count += splits;

        let hash = SpatialHash::build(&self.points, radius);
        phases::attraction_phase(&self.points, &self.cfg, &self.field, &mut self.acc);
        phases::repulsion_phase(&self.points, &hash, hashed.as_ref(), &self.cfg, &mut self.repel);
        self.acc.merge_from(&self.repel);
        self.acc.apply_to(&mut self.points);

        let hash = SpatialHash::build(&self.points, radius);
        let (points, inserted) =
            phases::insertion_phase(&self.points, &hash, hashed.as_ref(), &self.cfg, rng);
        self.points = points;
        self.insertion_count += inserted;

        phases::jiggle_phase(&mut self.points, self.cfg.jiggle_radius, rng);

        phases::smoothing_phase(&self.points, self.cfg.smoothing, &mut self.acc);
        self.acc.apply_to(&mut self.points);

        self.iteration += 1;
        log::debug!(
            "growth step {}: {} points, {splits} splits, {inserted} insertions",
            self.iteration,
            self.points.len()
        );
    }

    /// Grows until `max_iterations` steps have run or the loop reaches
    /// `point_ceiling` points, whichever comes first.
    ///
    /// ### Returns
    /// The number of steps performed by this call.
    pub fn grow_until(
        &mut self,
        max_iterations: usize,
        point_ceiling: usize,
        boundary: Option<&Boundary>,
        rng: &mut impl Rng,
    ) -> usize {
        let mut steps = 0;
        while steps < max_iterations {
            if self.points.len() >= point_ceiling {
                log::info!(
                    "growth stopped at {} points after {steps} steps (ceiling {point_ceiling})",
                    self.points.len()
                );
                break;
            }
            self.grow(boundary, rng);
            steps += 1;
        }
        steps
    }

    /// The loop lifted into 3-D at `z = height`.
    pub fn as_polygon(&self, height: f32) -> Vec<Vec3> {
        self.points.iter().map(|p| p.extend(height)).collect()
    }

    /// Like [`Growth::as_polygon`], with the first point repeated at the end
    /// so the tube mesher treats the curve as closed.
    pub fn as_closed_polygon(&self, height: f32) -> Vec<Vec3> {
        let mut polygon = self.as_polygon(height);
        if let Some(&first) = polygon.first() {
            polygon.push(first);
        }
        polygon
    }

    /// Sweeps a tube along the closed loop at `z = height`.
    ///
    /// ### Errors
    /// Any error from [`TubeMesh::from_curve`].
    pub fn as_tube(&self, height: f32, cfg: &TubeConfig) -> Result<TubeMesh> {
        TubeMesh::from_curve(&self.as_closed_polygon(height), cfg)
    }
}

impl<F> fmt::Display for Growth<F> {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(
            f,
            "growth loop with {} points, grown {} times, split {} times, inserted {} times",
            self.points.len(),
            self.iteration,
            self.split_count,
            self.insertion_count
        )
    }
}
