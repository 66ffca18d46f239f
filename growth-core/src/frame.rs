//! Rotation-minimizing frames along piecewise-linear curves.
//!
//! Frames are built in three passes:
//! 1. [`raw_tangents`] — unit direction of each segment.
//! 2. [`local_tangents`] — per-point tangent blended from the adjacent
//!    segments, plus the width scale that blend implies.
//! 3. [`parallel_transport_frames`] — a seed normal at the first point,
//!    carried forward with [`transport`].
//!
//! The vertical axis is `+Z`.

use glam::Vec3;

use crate::error::{GeometryError, Result};

/// Squared end-to-end distance below which a curve counts as closed.
pub const CLOSED_EPSILON_SQ: f32 = 1e-6;

/// Blended tangents shorter than this are treated as a reversal.
const REVERSAL_EPSILON: f32 = 1e-6;

/// Horizontal tangent components below this count as vertical.
const VERTICAL_EPSILON: f32 = 1e-6;

/// Orthonormal frame at one curve point.
///
/// `binormal = tangent × normal`, so `(tangent, normal, binormal)` is
/// right-handed.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct Frame {
    pub position: Vec3,
    pub tangent: Vec3,
    pub normal: Vec3,
    pub binormal: Vec3,
    /// Distance travelled along the curve from its first point.
    pub arc_length: f32,
    /// `1 / |blended tangent|`; grows at sharp turns, `1.0` on straights.
    pub width_scale: f32,
}

/// Whether the first and last points coincide.
pub fn is_closed(points: &[Vec3]) -> bool {
    match (points.first(), points.last()) {
        (Some(a), Some(b)) if points.len() >= 2 => a.distance_squared(*b) < CLOSED_EPSILON_SQ,
        _ => false,
    }
}

/// Unit direction from each point to the next, one entry per point.
///
/// The final entry repeats the first segment for a closed curve and the
/// last segment for an open one. Zero-length segments borrow the direction
/// of the nearest earlier valid segment, or the first valid one if none
/// precedes them.
///
/// ### Errors
/// - [`GeometryError::TooFewPoints`] for fewer than 2 points.
/// - [`GeometryError::DegenerateCurve`] if no segment has a direction.
pub fn raw_tangents(points: &[Vec3], closed: bool) -> Result<Vec<Vec3>> {
    if points.len() < 2 {
        return Err(GeometryError::TooFewPoints {
            min: 2,
            actual: points.len(),
        });
    }

    let segments: Vec<Option<Vec3>> = points
        .windows(2)
        .map(|w| (w[1] - w[0]).try_normalize())
        .collect();
    let first_valid = segments
        .iter()
        .flatten()
        .copied()
        .next()
        .ok_or(GeometryError::DegenerateCurve)?;

    let mut tangents = Vec::with_capacity(points.len());
    let mut last = first_valid;
    for seg in segments {
        if let Some(t) = seg {
            last = t;
        }
        tangents.push(last);
    }

    let wrap = if closed { tangents[0] } else { last };
    tangents.push(wrap);
    Ok(tangents)
}

/// Normalized average of two unit tangents and its width scale.
///
/// If the tangents nearly cancel (a reversal), returns `(t1, 1.0)`.
pub fn blend_tangents(t0: Vec3, t1: Vec3) -> (Vec3, f32) {
    let mid = (t0 + t1) * 0.5;
    let len = mid.length();
    if len < REVERSAL_EPSILON {
        log::trace!("anti-parallel tangents, falling back to {t1}");
        return (t1, 1.0);
    }
    (mid / len, 1.0 / len)
}

/// Per-point tangents and width scales from [`raw_tangents`].
///
/// Point `i > 0` blends segments `i - 1` and `i`. The first point of an open
/// curve takes the first segment unchanged; on a closed curve it blends the
/// last real segment with the first, matching the final point.
pub fn local_tangents(raw: &[Vec3], closed: bool) -> (Vec<Vec3>, Vec<f32>) {
    let n = raw.len();
    let mut tangents = Vec::with_capacity(n);
    let mut widths = Vec::with_capacity(n);
    if n == 0 {
        return (tangents, widths);
    }

    let (t, w) = if closed && n >= 2 {
        blend_tangents(raw[n - 2], raw[0])
    } else {
        (raw[0], 1.0)
    };
    tangents.push(t);
    widths.push(w);

    for pair in raw.windows(2) {
        let (t, w) = blend_tangents(pair[0], pair[1]);
        tangents.push(t);
        widths.push(w);
    }

    (tangents, widths)
}

/// Seed normal: the tangent rotated a quarter turn in the XY plane.
///
/// Near-vertical tangents have no horizontal component to rotate and get
/// `+X` instead.
pub fn first_normal(tangent: Vec3) -> Vec3 {
    if tangent.x.abs() < VERTICAL_EPSILON && tangent.y.abs() < VERTICAL_EPSILON {
        return Vec3::X;
    }
    Vec3::new(-tangent.y, tangent.x, 0.0).normalize()
}

/// Carries a normal/binormal pair onto a new tangent.
///
/// `binormal = tangent × previous_normal`, then
/// `normal = binormal × tangent`. This removes only the component of the
/// old normal along the new tangent, so the frame does not spin around the
/// curve. When the old normal is parallel to the new tangent the old
/// binormal is projected instead.
///
/// ### Returns
/// `(normal, binormal)`, both unit length and perpendicular to `tangent`.
pub fn transport(previous_normal: Vec3, previous_binormal: Vec3, tangent: Vec3) -> (Vec3, Vec3) {
    let cross = tangent.cross(previous_normal);
    let binormal = if cross.length_squared() > 1e-12 {
        cross.normalize()
    } else {
        log::trace!("normal parallel to tangent {tangent}, projecting binormal");
        (previous_binormal - tangent * previous_binormal.dot(tangent))
            .try_normalize()
            .unwrap_or_else(|| tangent.cross(first_normal(tangent)).normalize())
    };
    let normal = binormal.cross(tangent).normalize();
    (normal, binormal)
}

/// Computes a rotation-minimizing frame at every curve point.
///
/// # Example
///
/// ```
/// use glam::Vec3;
/// use growth_core::frame::parallel_transport_frames;
///
/// let points = vec![Vec3::ZERO, Vec3::X, Vec3::new(2.0, 0.0, 0.0)];
/// let frames = parallel_transport_frames(&points).unwrap();
/// assert_eq!(frames.len(), 3);
/// assert_eq!(frames[2].arc_length, 2.0);
/// ```
///
/// ### Errors
/// See [`raw_tangents`].
pub fn parallel_transport_frames(points: &[Vec3]) -> Result<Vec<Frame>> {
    let closed = is_closed(points);
    let raw = raw_tangents(points, closed)?;
    let (tangents, widths) = local_tangents(&raw, closed);

    let mut frames = Vec::with_capacity(points.len());

    let tangent = tangents[0];
    let normal = first_normal(tangent);
    frames.push(Frame {
        position: points[0],
        tangent,
        normal,
        binormal: tangent.cross(normal).normalize(),
        arc_length: 0.0,
        width_scale: widths[0],
    });

    for i in 1..points.len() {
        let prev = frames[i - 1];
        let tangent = tangents[i];
        let (normal, binormal) = transport(prev.normal, prev.binormal, tangent);
        frames.push(Frame {
            position: points[i],
            tangent,
            normal,
            binormal,
            arc_length: prev.arc_length + points[i - 1].distance(points[i]),
            width_scale: widths[i],
        });
    }

    Ok(frames)
}
