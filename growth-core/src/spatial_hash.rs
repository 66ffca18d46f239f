use glam::{IVec2, Vec2};
use std::collections::HashMap;

use crate::types::PointId;

/// Uniform grid bucketing 2-D points by integer cell coordinate.
///
/// A point at `p` lands in cell `floor(p / spacing)`. With `spacing` equal
/// to the query radius, every point within that radius of `p` lies in the
/// 3×3 block of cells around `p`'s own cell, so [`SpatialHash::neighbours`]
/// visits a bounded number of candidates per query.
///
/// The grid stores indices into the slice it was built from. It is meant to
/// be rebuilt from scratch whenever that slice changes length or order;
/// there is no incremental update.
#[derive(Debug, Clone)]
pub struct SpatialHash {
    spacing: f32,
    inv_spacing: f32,
    cells: HashMap<IVec2, Vec<PointId>>,
}

impl SpatialHash {
    /// Buckets every point in `points` at the given cell size.
    ///
    /// `spacing` must be strictly positive; callers validate it through
    /// [`crate::config::GrowthConfig::validate`].
    pub fn build(points: &[Vec2], spacing: f32) -> Self {
        let mut hash = Self {
            spacing,
            inv_spacing: 1.0 / spacing,
            cells: HashMap::with_capacity(points.len()),
        };
        for (id, &p) in points.iter().enumerate() {
            let key = hash.cell_of(p);
            hash.cells.entry(key).or_default().push(id);
        }
        hash
    }

    #[inline]
    pub fn spacing(&self) -> f32 {
        self.spacing
    }

    #[inline]
    pub fn cell_of(&self, p: Vec2) -> IVec2 {
        (p * self.inv_spacing).floor().as_ivec2()
    }

    /// Number of occupied cells.
    pub fn cell_count(&self) -> usize {
        self.cells.len()
    }

    /// Ids stored in the 3×3 block of cells around `p`.
    ///
    /// Candidates are not distance filtered and include the point itself
    /// when `p` came from the hashed slice.
    pub fn neighbours(&self, p: Vec2) -> impl Iterator<Item = PointId> + '_ {
        let center = self.cell_of(p);
        (-1..=1)
            .flat_map(move |dy| (-1..=1).map(move |dx| center + IVec2::new(dx, dy)))
            .filter_map(|key| self.cells.get(&key))
            .flatten()
            .copied()
    }

    /// Ids of hashed points strictly within `radius` of `p`, skipping `skip`.
    ///
    /// `points` must be the slice this hash was built from.
    pub fn within<'a>(
        &'a self,
        points: &'a [Vec2],
        p: Vec2,
        radius: f32,
        skip: Option<PointId>,
    ) -> impl Iterator<Item = PointId> + 'a {
        let r2 = radius * radius;
        self.neighbours(p)
            .filter(move |&id| Some(id) != skip && (points[id] - p).length_squared() < r2)
    }
}
