//! Curve and polygon helpers feeding the growth simulation and the mesher.

use glam::{Vec2, Vec3};
use rand::Rng;
use std::f32::consts::TAU;

/// Upper bound on subdivision passes; each pass doubles the point count.
pub const MAX_SUBDIVISIONS: usize = 10;

/// Number of loop points for roughly unit spacing on a circle of `radius`.
#[inline]
pub fn circle_subdivisions(radius: f32) -> usize {
    (radius * TAU).ceil().max(0.0) as usize
}

/// `count` points evenly spaced counter-clockwise on a circle.
///
/// The first point is not repeated at the end; use it as a growth seed.
pub fn circle_loop(center: Vec2, radius: f32, count: usize) -> Vec<Vec2> {
    (0..count)
        .map(|i| center + Vec2::from_angle(TAU * i as f32 / count as f32) * radius)
        .collect()
}

/// Orientation of a [`directed_curve`] walker as three Euler angles.
#[derive(Debug, Clone, Copy, Default, PartialEq)]
pub struct Heading {
    pub alpha: f32,
    pub beta: f32,
    pub gamma: f32,
}

impl Heading {
    /// Unit step direction for the current angles.
    pub fn direction(&self) -> Vec3 {
        let (sa, ca) = self.alpha.sin_cos();
        let (sb, cb) = self.beta.sin_cos();
        let (sg, cg) = self.gamma.sin_cos();
        Vec3::new(-ca * sb * sg - sa * cg, -sa * sb * sg + ca * cg, cb * sg)
    }
}

/// A random-walk curve of `count` points starting after `start`.
///
/// Each step moves along the current [`Heading::direction`] by
/// `segment_length` jittered by up to `±segment_jitter / 2`, then every
/// angle drifts by a random amount in `[0, angle_delta)`.
pub fn directed_curve(
    start: Vec3,
    heading: Heading,
    segment_length: f32,
    angle_delta: f32,
    segment_jitter: f32,
    count: usize,
    rng: &mut impl Rng,
) -> Vec<Vec3> {
    let mut heading = heading;
    let mut current = start;
    let mut points = Vec::with_capacity(count);

    for _ in 0..count {
        let length = segment_length + (rng.random::<f32>() - 0.5) * segment_jitter;
        current += heading.direction() * length;
        points.push(current);

        heading.alpha += rng.random::<f32>() * angle_delta;
        heading.beta += rng.random::<f32>() * angle_delta;
        heading.gamma += rng.random::<f32>() * angle_delta;
    }

    points
}

/// One corner-cutting pass over a closed loop.
///
/// Each point `v_i` is replaced by `(v_i + avg(m_{i-1}, m_i)) / 2`, where
/// `m_i` is the midpoint of edge `i`, and `m_i` is inserted after it. The
/// output has twice as many points.
pub fn catmull_polygon(points: &[Vec3]) -> Vec<Vec3> {
    let n = points.len();
    if n < 3 {
        return points.to_vec();
    }
    let mids: Vec<Vec3> = (0..n).map(|i| (points[i] + points[(i + 1) % n]) * 0.5).collect();

    let mut out = Vec::with_capacity(2 * n);
    for i in 0..n {
        let before = mids[(i + n - 1) % n];
        out.push(((before + mids[i]) * 0.5 + points[i]) * 0.5);
        out.push(mids[i]);
    }
    out
}

/// [`catmull_polygon`] applied `passes` times, at most [`MAX_SUBDIVISIONS`].
pub fn catmull_polygon_n(points: &[Vec3], passes: usize) -> Vec<Vec3> {
    let mut out = points.to_vec();
    for _ in 0..passes.min(MAX_SUBDIVISIONS) {
        out = catmull_polygon(&out);
    }
    out
}

/// Corner-cutting for an open polyline; the endpoints stay fixed.
///
/// Interior points are smoothed exactly as in [`catmull_polygon`] and every
/// edge gains its midpoint.
pub fn catmull_polyline_n(points: &[Vec3], passes: usize) -> Vec<Vec3> {
    let mut out = points.to_vec();
    for _ in 0..passes.min(MAX_SUBDIVISIONS) {
        let n = out.len();
        if n < 3 {
            break;
        }
        let mids: Vec<Vec3> = out.windows(2).map(|w| (w[0] + w[1]) * 0.5).collect();

        let mut next = Vec::with_capacity(2 * n - 1);
        next.push(out[0]);
        for i in 1..n - 1 {
            next.push(mids[i - 1]);
            next.push(((mids[i - 1] + mids[i]) * 0.5 + out[i]) * 0.5);
        }
        next.push(mids[n - 2]);
        next.push(out[n - 1]);
        out = next;
    }
    out
}

/// Offsets a closed loop sideways by a per-point distance.
///
/// Positive distances move to the left of the direction of travel, i.e.
/// inward for a counter-clockwise loop. Each point moves along the bisector
/// of its two edge normals, lengthened by `1 / cos(turn / 2)` so both
/// adjacent edges end up `distance` away. Reversals, where that factor
/// blows up, use the outgoing edge normal instead.
pub fn offset_polygon(points: &[Vec2], mut distance: impl FnMut(usize, Vec2) -> f32) -> Vec<Vec2> {
    let n = points.len();
    if n < 2 {
        return points.to_vec();
    }
    let normals: Vec<Vec2> = (0..n)
        .map(|i| (points[(i + 1) % n] - points[i]).normalize_or_zero().perp())
        .collect();

    (0..n)
        .map(|i| {
            let incoming = normals[(i + n - 1) % n];
            let outgoing = normals[i];
            let bisector = (incoming + outgoing).normalize_or_zero();
            let cos_half = bisector.dot(outgoing);
            let miter = if cos_half > 1e-3 {
                bisector / cos_half
            } else {
                outgoing
            };
            points[i] + miter * distance(i, points[i])
        })
        .collect()
}

/// Tweens a stack of closed layers into one rising path.
///
/// Layer `k` starts at `z = k × layer_height` and its points climb evenly
/// so the next layer begins where this one ends. Original `z` values are
/// replaced.
pub fn stack_layers(layers: &[Vec<Vec3>], layer_height: f32) -> Vec<Vec3> {
    let total = layers.iter().map(Vec::len).sum();
    let mut path = Vec::with_capacity(total);

    for (k, layer) in layers.iter().enumerate() {
        if layer.is_empty() {
            continue;
        }
        let base = k as f32 * layer_height;
        let step = layer_height / layer.len() as f32;
        path.extend(
            layer
                .iter()
                .enumerate()
                .map(|(i, p)| Vec3::new(p.x, p.y, base + step * i as f32)),
        );
    }

    path
}

#[cfg(test)]
mod tests {
    use super::*;
    use approx::assert_relative_eq;
    use rand::{SeedableRng, rngs::StdRng};

    const TOL: f32 = 1e-4;

    fn square() -> Vec<Vec3> {
        vec![
            Vec3::new(0.0, 0.0, 0.0),
            Vec3::new(1.0, 0.0, 0.0),
            Vec3::new(1.0, 1.0, 0.0),
            Vec3::new(0.0, 1.0, 0.0),
        ]
    }

    #[test]
    fn circle_loop_is_evenly_spaced() {
        let pts = circle_loop(Vec2::new(1.0, 2.0), 80.0, circle_subdivisions(80.0));
        assert_eq!(pts.len(), 503);
        let spacing = (pts[1] - pts[0]).length();
        for i in 0..pts.len() {
            let gap = (pts[(i + 1) % pts.len()] - pts[i]).length();
            assert_relative_eq!(gap, spacing, epsilon = 1e-2);
            assert_relative_eq!(pts[i].distance(Vec2::new(1.0, 2.0)), 80.0, epsilon = 1e-2);
        }
    }

    #[test]
    fn heading_direction_is_unit() {
        let h = Heading {
            alpha: 0.3,
            beta: 1.1,
            gamma: -0.7,
        };
        assert_relative_eq!(h.direction().length(), 1.0, epsilon = TOL);
        assert_eq!(Heading::default().direction(), Vec3::new(0.0, 1.0, 0.0));
    }

    #[test]
    fn directed_curve_steps_by_segment_length() {
        let mut rng = StdRng::seed_from_u64(4);
        let pts = directed_curve(Vec3::ZERO, Heading::default(), 0.5, 0.01, 0.0, 100, &mut rng);

        assert_eq!(pts.len(), 100);
        assert_relative_eq!(pts[0], Vec3::new(0.0, 0.5, 0.0), epsilon = TOL);
        for w in pts.windows(2) {
            assert_relative_eq!(w[0].distance(w[1]), 0.5, epsilon = TOL);
        }
    }

    #[test]
    fn catmull_polygon_doubles_and_shrinks_inward() {
        let out = catmull_polygon(&square());
        assert_eq!(out.len(), 8);
        assert_eq!(out[1], Vec3::new(0.5, 0.0, 0.0));
        assert_eq!(out[0], Vec3::new(0.125, 0.125, 0.0));

        // Pass count is clamped.
        let tri = vec![Vec3::ZERO, Vec3::X, Vec3::Y];
        assert_eq!(catmull_polygon_n(&tri, 50).len(), 3 << MAX_SUBDIVISIONS);
    }

    #[test]
    fn catmull_polyline_keeps_endpoints() {
        let pts = vec![Vec3::ZERO, Vec3::new(1.0, 1.0, 0.0), Vec3::new(2.0, 0.0, 0.0)];
        let out = catmull_polyline_n(&pts, 2);

        assert_eq!(out.first(), Some(&Vec3::ZERO));
        assert_eq!(out.last(), Some(&Vec3::new(2.0, 0.0, 0.0)));
        // 3 -> 5 -> 9 points.
        assert_eq!(out.len(), 9);
        // The peak is cut down.
        assert!(out.iter().all(|p| p.y < 1.0));
    }

    #[test]
    fn offset_square_moves_edges_by_distance() {
        let pts: Vec<Vec2> = square().iter().map(|p| p.truncate()).collect();
        let out = offset_polygon(&pts, |_, _| 0.1);

        // Counter-clockwise, so positive offsets shrink the square.
        assert_relative_eq!(out[0], Vec2::new(0.1, 0.1), epsilon = TOL);
        assert_relative_eq!(out[2], Vec2::new(0.9, 0.9), epsilon = TOL);
    }

    #[test]
    fn offset_of_collinear_points_is_perpendicular() {
        let pts = vec![Vec2::ZERO, Vec2::new(1.0, 0.0), Vec2::new(2.0, 0.0), Vec2::new(1.0, -1.0)];
        let out = offset_polygon(&pts, |i, _| if i == 1 { 0.5 } else { 0.0 });
        assert_relative_eq!(out[1], Vec2::new(1.0, 0.5), epsilon = TOL);
        assert_eq!(out[0], pts[0]);
    }

    #[test]
    fn stacked_layers_rise_continuously() {
        let layer = square();
        let path = stack_layers(&[layer.clone(), layer.clone(), Vec::new()], 2.0);

        assert_eq!(path.len(), 8);
        let zs: Vec<f32> = path.iter().map(|p| p.z).collect();
        assert_eq!(zs, vec![0.0, 0.5, 1.0, 1.5, 2.0, 2.5, 3.0, 3.5]);
        assert_eq!(path[5].truncate(), layer[1].truncate());
    }
}
