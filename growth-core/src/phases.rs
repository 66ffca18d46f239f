//! Individual phases of one differential growth step.
//!
//! [`crate::growth::Growth::grow`] runs them in this order:
//! 1. [`split_phase`] — subdivide loop edges longer than the split distance.
//! 2. [`attraction_phase`] — pull each point toward its neighbour midpoint.
//! 3. [`repulsion_phase`] — push points apart within the repulsion radius,
//!    using a [`SpatialHash`] for neighbour lookup.
//! 4. [`insertion_phase`] — density-driven and random midpoint insertion.
//! 5. [`jiggle_phase`] — small random perturbation.
//! 6. [`smoothing_phase`] — Laplacian relaxation toward neighbour midpoints.
//!
//! Force-like phases write into a [`DisplacementBuffer`] computed from an
//! unmodified snapshot; the caller applies the buffer afterwards. Structural
//! phases return a new point list with loop order preserved.

use glam::Vec2;
use rand::Rng;
use std::f32::consts::TAU;

use crate::{
    boundary::HashedBoundary, config::GrowthConfig, displacement_buffer::DisplacementBuffer,
    growth::DistanceField, spatial_hash::SpatialHash, types::PointId,
};

/// Distances at or below this are treated as coincident.
const COINCIDENT_EPSILON: f32 = 1e-9;

#[inline]
pub fn midpoint(a: Vec2, b: Vec2) -> Vec2 {
    (a + b) * 0.5
}

#[inline]
fn loop_neighbours(points: &[Vec2], id: PointId) -> (Vec2, Vec2) {
    let n = points.len();
    (points[(id + n - 1) % n], points[(id + 1) % n])
}

/// Evenly spaced points strictly between `a` and `b`, about `goal` apart.
///
/// The span is cut into `floor(|b - a| / goal)` equal pieces and the
/// interior cut points are yielded in order from `a` to `b`. Yields nothing
/// if the span is shorter than two pieces.
pub fn interpolate(a: Vec2, b: Vec2, goal: f32) -> impl Iterator<Item = Vec2> {
    let dir = b - a;
    let pieces = if goal > 0.0 {
        (dir.length() / goal).floor() as usize
    } else {
        0
    };
    let step = if pieces > 0 {
        dir / pieces as f32
    } else {
        Vec2::ZERO
    };
    (1..pieces).map(move |i| a + step * i as f32)
}

/// Subdivides every loop edge longer than [`GrowthConfig::split_distance`].
///
/// For each consecutive pair `(v, next)`, wrapping from the last point to
/// the first, the edge is replaced by [`interpolate`]d points spaced about
/// `attraction_radius` apart. Since `split_distance = 2 × attraction_radius`
/// this always inserts at least one point and leaves every resulting gap
/// below the split distance.
///
/// ### Parameters
/// - `points` - Current loop, in order.
/// - `cfg` - Provides the attraction radius and derived split distance.
///
/// ### Returns
/// The new loop and the number of edges that were split.
pub fn split_phase(points: &[Vec2], cfg: &GrowthConfig) -> (Vec<Vec2>, usize) {
    let n = points.len();
    if n < 2 {
        return (points.to_vec(), 0);
    }

    let split_distance = cfg.split_distance();
    let mut out = Vec::with_capacity(n + n / 4);
    let mut splits = 0;

    for (i, &v) in points.iter().enumerate() {
        let next = points[(i + 1) % n];
        out.push(v);
        if (next - v).length() > split_distance {
            out.extend(interpolate(v, next, cfg.attraction_radius));
            splits += 1;
        }
    }

    (out, splits)
}

/// Accumulates the pull of each point toward its two loop neighbours.
///
/// For point `v` with neighbours `p` and `n` the contribution is
/// `((p - v) + (n - v)) × k` where
/// `k = attraction_strength × attraction_radius × field.scale(v)`.
/// `k` is clamped to `[0, 0.5]`, so a point is pulled at most onto the
/// midpoint of its neighbours and never past it.
///
/// ### Parameters
/// - `points` - Snapshot of the loop; not modified.
/// - `cfg` - Attraction strength and radius.
/// - `field` - Per-point modulation of the attraction radius.
/// - `acc` - Resized to `points.len()`, cleared, then filled.
pub fn attraction_phase(
    points: &[Vec2],
    cfg: &GrowthConfig,
    field: &impl DistanceField,
    acc: &mut DisplacementBuffer,
) {
    acc.ensure_len(points.len());
    if points.len() < 3 {
        return;
    }

    for (id, &v) in points.iter().enumerate() {
        let (prev, next) = loop_neighbours(points, id);
        let local_radius = cfg.attraction_radius * field.scale(v);
        let k = (cfg.attraction_strength * local_radius).clamp(0.0, 0.5);
        acc.add(id, ((prev - v) + (next - v)) * k);
    }
}

/// Quadratic falloff repulsion magnitude, zero at the radius boundary.
#[inline]
pub fn repulsion_magnitude(strength: f32, distance: f32, radius: f32) -> f32 {
    let t = 1.0 - distance / radius;
    strength * t * t
}

/// Accumulates pairwise repulsion between nearby points.
///
/// For each point `v` and each other point `o` found through `hash` with
/// `d = |v - o| < repulsion_radius`, adds
/// `normalize(v - o) × repulsion_strength × (1 - d / repulsion_radius)²`.
/// Points are compared by index, so a point never repels itself, and
/// coincident pairs are skipped because their direction is undefined.
///
/// Boundary points repel the same way, scaled by
/// [`GrowthConfig::boundary_repulsion_multiplier`].
///
/// ### Parameters
/// - `points` - Snapshot of the loop; not modified.
/// - `hash` - Grid built from `points` at `repulsion_radius` spacing.
/// - `boundary` - Optional hashed obstacle points.
/// - `cfg` - Repulsion strength, radius and boundary multiplier.
/// - `acc` - Resized to `points.len()`, cleared, then filled.
pub fn repulsion_phase(
    points: &[Vec2],
    hash: &SpatialHash,
    boundary: Option<&HashedBoundary<'_>>,
    cfg: &GrowthConfig,
    acc: &mut DisplacementBuffer,
) {
    acc.ensure_len(points.len());
    let radius = cfg.repulsion_radius;
    let mut coincident = 0usize;

    for (id, &v) in points.iter().enumerate() {
        for other in hash.within(points, v, radius, Some(id)) {
            let away = v - points[other];
            let d = away.length();
            if d <= COINCIDENT_EPSILON {
                coincident += 1;
                continue;
            }
            let sc = repulsion_magnitude(cfg.repulsion_strength, d, radius);
            acc.add(id, away / d * sc);
        }

        if let Some(b) = boundary {
            for other in b.hash.within(b.points, v, radius, None) {
                let away = v - b.points[other];
                let d = away.length();
                if d <= COINCIDENT_EPSILON {
                    coincident += 1;
                    continue;
                }
                let sc = repulsion_magnitude(cfg.repulsion_strength, d, radius)
                    * cfg.boundary_repulsion_multiplier;
                acc.add(id, away / d * sc);
            }
        }
    }

    if coincident > 0 {
        log::trace!("repulsion skipped {coincident} coincident pairs");
    }
}

/// Number of loop and boundary points within `repulsion_radius` of `points[id]`.
pub fn local_density(
    points: &[Vec2],
    id: PointId,
    hash: &SpatialHash,
    boundary: Option<&HashedBoundary<'_>>,
    radius: f32,
) -> usize {
    let v = points[id];
    let own = hash.within(points, v, radius, Some(id)).count();
    let external = boundary.map_or(0, |b| b.hash.within(b.points, v, radius, None).count());
    own + external
}

/// Inserts midpoints where the loop is sparse, plus occasional random ones.
///
/// For each point `v`, in loop order, with density measured by
/// [`local_density`]:
///
/// - density below `repulsion_minimum_threshold` forces an insertion;
/// - otherwise, a random draw below `random_insertion_rate` inserts only if
///   density is below `repulsion_maximum_threshold`.
///
/// An inserted point is the midpoint of `v` and its successor and lands
/// directly after `v`. One draw is taken per point whether or not it is
/// needed, so a seeded `rng` gives a reproducible sequence. With an
/// insertion rate of zero the phase is disabled and the loop is returned
/// unchanged, unless [`GrowthConfig::forced_insertion_at_zero_rate`] keeps
/// the density-forced insertions.
///
/// ### Parameters
/// - `points` - Current loop, in order.
/// - `hash` - Grid built from `points` at `repulsion_radius` spacing.
/// - `boundary` - Optional hashed obstacle points counted toward density.
/// - `cfg` - Thresholds, rate and radius.
/// - `rng` - Source of the random draws.
///
/// ### Returns
/// The new loop and the number of inserted points.
pub fn insertion_phase(
    points: &[Vec2],
    hash: &SpatialHash,
    boundary: Option<&HashedBoundary<'_>>,
    cfg: &GrowthConfig,
    rng: &mut impl Rng,
) -> (Vec<Vec2>, usize) {
    let n = points.len();
    let enabled = cfg.random_insertion_rate > 0.0 || cfg.forced_insertion_at_zero_rate;
    if n < 2 || !enabled {
        return (points.to_vec(), 0);
    }

    let mut out = Vec::with_capacity(n + n / 8);
    let mut inserted = 0;

    for (id, &v) in points.iter().enumerate() {
        out.push(v);

        let density = local_density(points, id, hash, boundary, cfg.repulsion_radius);
        let forced = density < cfg.repulsion_minimum_threshold;
        let allowed = density < cfg.repulsion_maximum_threshold;
        let drawn = rng.random::<f32>() < cfg.random_insertion_rate;

        if forced || (drawn && allowed) {
            let next = points[(id + 1) % n];
            out.push(midpoint(v, next));
            inserted += 1;
        }
    }

    (out, inserted)
}

/// Nudges every point by a random offset of length below `radius`.
///
/// Direction is uniform over the circle and length uniform in
/// `[0, radius)`. Does nothing for a non-positive radius.
pub fn jiggle_phase(points: &mut [Vec2], radius: f32, rng: &mut impl Rng) {
    if radius <= 0.0 {
        return;
    }
    for p in points.iter_mut() {
        let angle = rng.random::<f32>() * TAU;
        let r = rng.random::<f32>() * radius;
        *p += Vec2::from_angle(angle) * r;
    }
}

/// Accumulates a Laplacian pull of `factor` toward each neighbour midpoint.
///
/// ### Parameters
/// - `points` - Snapshot of the loop; not modified.
/// - `factor` - Fraction of the distance to the midpoint, in `[0, 1]`.
/// - `acc` - Resized to `points.len()`, cleared, then filled.
pub fn smoothing_phase(points: &[Vec2], factor: f32, acc: &mut DisplacementBuffer) {
    acc.ensure_len(points.len());
    if points.len() < 3 {
        return;
    }
    for (id, &v) in points.iter().enumerate() {
        let (prev, next) = loop_neighbours(points, id);
        acc.add(id, (midpoint(prev, next) - v) * factor);
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use approx::assert_relative_eq;
    use crate::{boundary::Boundary, growth::Uniform};
    use rand::{SeedableRng, rngs::StdRng};

    fn square(side: f32) -> Vec<Vec2> {
        vec![
            Vec2::new(0.0, 0.0),
            Vec2::new(side, 0.0),
            Vec2::new(side, side),
            Vec2::new(0.0, side),
        ]
    }

    #[test]
    fn interpolate_yields_interior_points_only() {
        let pts: Vec<Vec2> = interpolate(Vec2::ZERO, Vec2::new(10.0, 0.0), 2.5).collect();
        assert_eq!(
            pts,
            vec![
                Vec2::new(2.5, 0.0),
                Vec2::new(5.0, 0.0),
                Vec2::new(7.5, 0.0)
            ]
        );

        // Span shorter than two pieces, and a degenerate goal.
        assert_eq!(interpolate(Vec2::ZERO, Vec2::new(1.0, 0.0), 2.5).count(), 0);
        assert_eq!(interpolate(Vec2::ZERO, Vec2::ZERO, 0.0).count(), 0);
    }

    #[test]
    fn split_phase_fills_a_stretched_two_point_loop() {
        let cfg = GrowthConfig::default();
        let points = vec![Vec2::ZERO, Vec2::new(100.0, 0.0)];

        let (out, splits) = split_phase(&points, &cfg);

        // Both the forward edge and the wrap-around edge get split.
        assert_eq!(splits, 2);
        assert_eq!(out.len(), 2 + 2 * 39);
        assert_eq!(out[0], Vec2::ZERO);
        assert_eq!(out[40], Vec2::new(100.0, 0.0));

        for i in 0..out.len() {
            let gap = (out[(i + 1) % out.len()] - out[i]).length();
            assert!(gap <= cfg.split_distance(), "gap {gap} at {i}");
        }
    }

    #[test]
    fn split_phase_leaves_short_edges_alone() {
        let cfg = GrowthConfig::default();
        let points = square(4.0);
        let (out, splits) = split_phase(&points, &cfg);
        assert_eq!(splits, 0);
        assert_eq!(out, points);
    }

    #[test]
    fn attraction_pulls_toward_neighbour_midpoint() {
        let cfg = GrowthConfig::default().with_strengths(0.0, 0.1).with_radii(1.0, 1.0);
        let points = vec![
            Vec2::new(-1.0, 0.0),
            Vec2::new(0.0, 1.0),
            Vec2::new(1.0, 0.0),
            Vec2::new(0.0, -5.0),
        ];
        let mut acc = DisplacementBuffer::with_len(0);

        attraction_phase(&points, &cfg, &Uniform, &mut acc);

        // Point 1 sits above the midpoint (0, 0) of its neighbours.
        let d = acc.total(1);
        // k = 0.1, so the pull is 0.2 of the way to the midpoint.
        assert_relative_eq!(d, Vec2::new(0.0, -0.2), epsilon = 1e-6);
    }

    #[test]
    fn attraction_never_overshoots_the_midpoint() {
        let cfg = GrowthConfig::default().with_strengths(0.0, 0.55).with_radii(20.0, 30.0);
        let mut points = square(1.0);
        let mut acc = DisplacementBuffer::with_len(0);

        attraction_phase(&points, &cfg, &Uniform, &mut acc);
        let before = points.clone();
        acc.apply_to(&mut points);

        for id in 0..4 {
            let (p, n) = loop_neighbours(&before, id);
            assert_relative_eq!(points[id], midpoint(p, n), epsilon = 1e-6);
        }
    }

    #[test]
    fn repulsion_pushes_close_points_apart_symmetrically() {
        let cfg = GrowthConfig::default().with_strengths(0.5, 0.0).with_radii(2.0, 4.0);
        let points = vec![Vec2::new(0.0, 0.0), Vec2::new(1.0, 0.0)];
        let hash = SpatialHash::build(&points, cfg.repulsion_radius);
        let mut acc = DisplacementBuffer::with_len(0);

        repulsion_phase(&points, &hash, None, &cfg, &mut acc);

        // Magnitude 0.5 * (1 - 1/2)^2 = 0.125.
        assert_relative_eq!(acc.total(0), Vec2::new(-0.125, 0.0), epsilon = 1e-6);
        assert_relative_eq!(acc.total(1), Vec2::new(0.125, 0.0), epsilon = 1e-6);
    }

    #[test]
    fn repulsion_ignores_points_outside_radius_and_coincident_pairs() {
        let cfg = GrowthConfig::default().with_strengths(0.5, 0.0).with_radii(1.0, 2.0);
        let points = vec![Vec2::ZERO, Vec2::ZERO, Vec2::new(1.5, 0.0)];
        let hash = SpatialHash::build(&points, cfg.repulsion_radius);
        let mut acc = DisplacementBuffer::with_len(0);

        repulsion_phase(&points, &hash, None, &cfg, &mut acc);

        assert_eq!(acc.len(), 3);
        assert!((0..3).all(|id| acc.total(id) == Vec2::ZERO));
    }

    #[test]
    fn boundary_repulsion_is_amplified() {
        let cfg = GrowthConfig::default().with_strengths(0.5, 0.0).with_radii(2.0, 4.0);
        let points = vec![Vec2::ZERO];
        let hash = SpatialHash::build(&points, cfg.repulsion_radius);
        let boundary = Boundary::from_positions(vec![Vec2::new(1.0, 0.0)]).unwrap();
        let hashed = boundary.hashed(cfg.repulsion_radius);
        let mut acc = DisplacementBuffer::with_len(0);

        repulsion_phase(&points, &hash, Some(&hashed), &cfg, &mut acc);

        // 10 × the loop-to-loop magnitude of 0.125.
        assert_relative_eq!(acc.total(0), Vec2::new(-1.25, 0.0), epsilon = 1e-5);
    }

    #[test]
    fn repulsion_magnitude_vanishes_at_radius() {
        assert_eq!(repulsion_magnitude(0.75, 20.0, 20.0), 0.0);
        assert_eq!(repulsion_magnitude(0.75, 0.0, 20.0), 0.75);
    }

    #[test]
    fn sparse_points_force_insertion() {
        let cfg = GrowthConfig::default();
        let points = square(1.0);
        let hash = SpatialHash::build(&points, cfg.repulsion_radius);
        let mut rng = StdRng::seed_from_u64(1);

        let (out, inserted) = insertion_phase(&points, &hash, None, &cfg, &mut rng);

        // Every point has fewer than 25 neighbours, so every edge gains a midpoint.
        assert_eq!(inserted, 4);
        assert_eq!(out.len(), 8);
        assert_eq!(out[1], Vec2::new(0.5, 0.0));
        assert_eq!(out[7], Vec2::new(0.0, 0.5));
    }

    #[test]
    fn dense_points_forbid_insertion() {
        let cfg = GrowthConfig::default()
            .with_thresholds(0, 2)
            .with_random_insertion_rate(1.0);
        // Every point sees three others within the radius.
        let points = square(0.5);
        let hash = SpatialHash::build(&points, cfg.repulsion_radius);
        let mut rng = StdRng::seed_from_u64(1);

        let (out, inserted) = insertion_phase(&points, &hash, None, &cfg, &mut rng);

        assert_eq!(inserted, 0);
        assert_eq!(out, points);
    }

    #[test]
    fn boundary_points_count_toward_density() {
        let cfg = GrowthConfig::default().with_thresholds(4, 4);
        let points = square(0.5);
        let hash = SpatialHash::build(&points, cfg.repulsion_radius);
        let boundary = Boundary::from_positions(vec![Vec2::new(0.25, 0.25)]).unwrap();
        let hashed = boundary.hashed(cfg.repulsion_radius);

        assert_eq!(local_density(&points, 0, &hash, None, cfg.repulsion_radius), 3);
        assert_eq!(
            local_density(&points, 0, &hash, Some(&hashed), cfg.repulsion_radius),
            4
        );

        let mut rng = StdRng::seed_from_u64(3);
        let (_, inserted) = insertion_phase(&points, &hash, Some(&hashed), &cfg, &mut rng);
        assert_eq!(inserted, 0);
    }

    #[test]
    fn zero_rate_disables_insertion() {
        let cfg = GrowthConfig::frozen();
        let points = square(1.0);
        let hash = SpatialHash::build(&points, cfg.repulsion_radius);
        let mut rng = StdRng::seed_from_u64(1);

        let (out, inserted) = insertion_phase(&points, &hash, None, &cfg, &mut rng);

        assert_eq!(inserted, 0);
        assert_eq!(out, points);
    }

    #[test]
    fn zero_rate_can_keep_forced_insertion() {
        let cfg = GrowthConfig::frozen().with_forced_insertion_at_zero_rate(true);
        let points = square(1.0);
        let hash = SpatialHash::build(&points, cfg.repulsion_radius);
        let mut rng = StdRng::seed_from_u64(1);

        let (out, inserted) = insertion_phase(&points, &hash, None, &cfg, &mut rng);
        assert_eq!(inserted, 4);
        assert_eq!(out.len(), 8);

        // Dense points are not forced and the zero rate never draws one.
        let cfg = cfg.with_thresholds(2, 45);
        let points = square(0.5);
        let hash = SpatialHash::build(&points, cfg.repulsion_radius);
        let (out, inserted) = insertion_phase(&points, &hash, None, &cfg, &mut rng);
        assert_eq!(inserted, 0);
        assert_eq!(out, points);
    }

    #[test]
    fn jiggle_stays_within_radius() {
        let mut rng = StdRng::seed_from_u64(42);
        let original = square(10.0);
        let mut points = original.clone();

        jiggle_phase(&mut points, 0.01, &mut rng);

        for (a, b) in original.iter().zip(&points) {
            assert!(a.distance(*b) <= 0.01 + 1e-5);
        }

        let mut untouched = original.clone();
        jiggle_phase(&mut untouched, 0.0, &mut rng);
        assert_eq!(untouched, original);
    }

    #[test]
    fn full_smoothing_moves_points_onto_midpoints() {
        let mut points = vec![
            Vec2::new(0.0, 0.0),
            Vec2::new(2.0, 2.0),
            Vec2::new(4.0, 0.0),
        ];
        let snapshot = points.clone();
        let mut acc = DisplacementBuffer::with_len(0);

        smoothing_phase(&points, 1.0, &mut acc);
        acc.apply_to(&mut points);

        // Each point reads the snapshot, not already-smoothed neighbours.
        assert_eq!(points[1], midpoint(snapshot[0], snapshot[2]));
        assert_eq!(points[0], midpoint(snapshot[2], snapshot[1]));
    }
}
