use glam::Vec2;
use rand::Rng;
use std::f32::consts::TAU;

use crate::{
    error::{GeometryError, Result},
    spatial_hash::SpatialHash,
};

/// External obstacle points that repel the growing loop.
///
/// Boundary points never move; they are hashed at the loop's repulsion
/// radius and their repulsion is amplified by
/// [`crate::config::GrowthConfig::boundary_repulsion_multiplier`].
/// Every point is finite.
#[derive(Debug, Clone, Default)]
pub struct Boundary {
    points: Vec<Vec2>,
}

impl Boundary {
    /// ### Errors
    /// [`GeometryError::InvalidParameter`] if a coordinate is not finite.
    pub fn from_positions(points: Vec<Vec2>) -> Result<Self> {
        if let Some(bad) = points.iter().find(|p| !p.is_finite()) {
            return Err(GeometryError::InvalidParameter {
                name: "boundary point",
                value: if bad.x.is_finite() { bad.y } else { bad.x },
            });
        }
        Ok(Self { points })
    }

    /// `count` points evenly spaced on a circle, e.g. a containing wall.
    ///
    /// ### Errors
    /// See [`Boundary::from_positions`].
    pub fn circle(center: Vec2, radius: f32, count: usize) -> Result<Self> {
        let points = (0..count)
            .map(|i| {
                let angle = TAU * i as f32 / count as f32;
                center + Vec2::from_angle(angle) * radius
            })
            .collect();

        Self::from_positions(points)
    }

    /// `count` points uniform in the square `[-half_range, half_range]²`.
    ///
    /// ### Panics
    /// Panics if `half_range` is negative or not finite.
    pub fn random_in_square(count: usize, half_range: f32, rng: &mut impl Rng) -> Self {
        let points = (0..count)
            .map(|_| {
                let x = rng.random_range(-half_range..=half_range);
                let y = rng.random_range(-half_range..=half_range);
                Vec2::new(x, y)
            })
            .collect();

        Self { points }
    }

    #[inline]
    pub fn points(&self) -> &[Vec2] {
        &self.points
    }

    #[inline]
    pub fn is_empty(&self) -> bool {
        self.points.is_empty()
    }

    /// Buckets the boundary at `spacing`, normally the repulsion radius.
    pub fn hashed(&self, spacing: f32) -> HashedBoundary<'_> {
        HashedBoundary {
            points: &self.points,
            hash: SpatialHash::build(&self.points, spacing),
        }
    }
}

/// A [`Boundary`] together with its spatial hash for one growth step.
#[derive(Debug)]
pub struct HashedBoundary<'a> {
    pub points: &'a [Vec2],
    pub hash: SpatialHash,
}

#[cfg(test)]
mod tests {
    use super::*;
    use approx::assert_relative_eq;
    use rand::{SeedableRng, rngs::StdRng};

    #[test]
    fn circle_points_lie_on_radius() {
        let b = Boundary::circle(Vec2::new(5.0, -2.0), 10.0, 16).unwrap();
        assert_eq!(b.points().len(), 16);
        for p in b.points() {
            let r = p.distance(Vec2::new(5.0, -2.0));
            assert_relative_eq!(r, 10.0, epsilon = 1e-4);
        }
    }

    #[test]
    fn random_in_square_stays_in_range() {
        let mut rng = StdRng::seed_from_u64(7);
        let b = Boundary::random_in_square(200, 3.0, &mut rng);
        assert_eq!(b.points().len(), 200);
        assert!(b.points().iter().all(|p| p.x.abs() <= 3.0 && p.y.abs() <= 3.0));
    }

    #[test]
    fn non_finite_points_are_rejected() {
        let err = Boundary::from_positions(vec![Vec2::ZERO, Vec2::new(1.0, f32::NAN)]).unwrap_err();
        assert!(matches!(
            err,
            GeometryError::InvalidParameter {
                name: "boundary point",
                ..
            }
        ));
        assert!(Boundary::circle(Vec2::ZERO, f32::INFINITY, 8).is_err());
        assert!(Boundary::from_positions(Vec::new()).unwrap().is_empty());
    }
}
