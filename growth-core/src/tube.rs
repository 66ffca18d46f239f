//! Tube mesh generation along curves.
//!
//! A ring of `divisions` vertices is swept along the curve using the frames
//! from [`parallel_transport_frames`], and consecutive rings are stitched
//! into quads. Ring indices do not wrap, so the tube ends are left open.

use glam::{Vec2, Vec3};
use std::f32::consts::TAU;

use crate::{
    config::TubeConfig,
    error::{GeometryError, Result},
    frame::{Frame, is_closed, parallel_transport_frames},
};

/// Per-vertex attributes describing the neighbouring rings.
///
/// Renderers that deform the tube in a shader read these to interpolate
/// toward the previous or next ring. Every vector has one entry per vertex.
/// The first ring's "previous" and the last ring's "next" are extrapolated
/// one unit past the end of the curve.
#[derive(Debug, Clone, Default, PartialEq)]
pub struct DeformationAttributes {
    /// Frame normal of the vertex's own ring.
    pub direction_a: Vec<Vec3>,
    /// Frame binormal of the vertex's own ring.
    pub direction_b: Vec<Vec3>,
    /// `(u, z × u_delta)` of the vertex's own ring.
    pub pattern_uv: Vec<Vec2>,
    pub previous_position: Vec<Vec3>,
    pub previous_direction: Vec<Vec3>,
    pub previous_pattern_uv: Vec<Vec2>,
    pub next_position: Vec<Vec3>,
    pub next_direction: Vec<Vec3>,
    pub next_pattern_uv: Vec<Vec2>,
}

impl DeformationAttributes {
    fn with_capacity(n: usize) -> Self {
        Self {
            direction_a: Vec::with_capacity(n),
            direction_b: Vec::with_capacity(n),
            pattern_uv: Vec::with_capacity(n),
            previous_position: Vec::with_capacity(n),
            previous_direction: Vec::with_capacity(n),
            previous_pattern_uv: Vec::with_capacity(n),
            next_position: Vec::with_capacity(n),
            next_direction: Vec::with_capacity(n),
            next_pattern_uv: Vec::with_capacity(n),
        }
    }
}

/// Neighbour data shared by every vertex of one ring.
struct RingContext {
    pattern_uv: Vec2,
    previous_position: Vec3,
    previous_direction: Vec3,
    previous_pattern_uv: Vec2,
    next_position: Vec3,
    next_direction: Vec3,
    next_pattern_uv: Vec2,
}

/// Immutable vertex and index buffers of a swept tube.
///
/// Vertex `ring * divisions + j` is division `j` of ring `ring`. Rebuild
/// the mesh with [`TubeMesh::from_curve`] to change it.
#[derive(Debug, Clone, PartialEq)]
pub struct TubeMesh {
    positions: Vec<Vec3>,
    uvs: Vec<Vec2>,
    normals: Vec<Vec3>,
    indices: Vec<u32>,
    frames: Vec<Frame>,
    deformation: Option<DeformationAttributes>,
    divisions: usize,
    closed: bool,
}

impl TubeMesh {
    /// Sweeps a circular cross-section along `points`.
    ///
    /// # Example
    ///
    /// ```
    /// use glam::Vec3;
    /// use growth_core::{config::TubeConfig, tube::TubeMesh};
    ///
    /// let points = vec![Vec3::ZERO, Vec3::new(0.0, 0.0, 10.0)];
    /// let cfg = TubeConfig::default().with_radius(0.5).with_divisions(16);
    ///
    /// let mesh = TubeMesh::from_curve(&points, &cfg).unwrap();
    /// assert_eq!(mesh.vertex_count(), 32);
    /// assert_eq!(mesh.triangle_count(), 32);
    /// ```
    ///
    /// ### Errors
    /// - [`GeometryError::TooFewPoints`] for fewer than 2 points.
    /// - Any error from [`TubeConfig::validate`].
    /// - [`GeometryError::TooManyVertices`] if `points.len() × divisions`
    ///   exceeds `u32::MAX`.
    /// - [`GeometryError::DegenerateCurve`] if all points coincide.
    pub fn from_curve(points: &[Vec3], cfg: &TubeConfig) -> Result<Self> {
        if points.len() < 2 {
            return Err(GeometryError::TooFewPoints {
                min: 2,
                actual: points.len(),
            });
        }
        cfg.validate()?;

        let divisions = cfg.divisions;
        let vertex_count = points
            .len()
            .checked_mul(divisions)
            .filter(|&count| u32::try_from(count).is_ok())
            .ok_or(GeometryError::TooManyVertices {
                count: points.len().saturating_mul(divisions),
            })?;

        let frames = parallel_transport_frames(points)?;

        // Per-division constants shared by every ring.
        let alpha_delta = TAU / divisions as f32;
        let v_delta = cfg.uv_scale / divisions as f32;
        let u_delta = if cfg.radius > 0.0 {
            cfg.uv_scale / (TAU * cfg.radius)
        } else {
            0.0
        };
        let ring: Vec<(f32, f32, f32)> = (0..divisions)
            .map(|j| {
                let (sin, cos) = (j as f32 * alpha_delta).sin_cos();
                (cos, sin, j as f32 * v_delta)
            })
            .collect();

        let mut positions = Vec::with_capacity(vertex_count);
        let mut uvs = Vec::with_capacity(vertex_count);
        let mut normals = Vec::with_capacity(vertex_count);
        let mut deformation = cfg
            .deformation_attributes
            .then(|| DeformationAttributes::with_capacity(vertex_count));

        for (index, frame) in frames.iter().enumerate() {
            let u = frame.arc_length * u_delta;
            let context = deformation
                .is_some()
                .then(|| ring_context(&frames, index, u_delta));

            for &(cos, sin, v) in &ring {
                let radial = frame.normal * cos + frame.binormal * sin;
                positions.push(frame.position + radial * cfg.radius);
                uvs.push(Vec2::new(u, v));
                normals.push(radial);

                if let (Some(attrs), Some(ctx)) = (deformation.as_mut(), context.as_ref()) {
                    attrs.direction_a.push(frame.normal);
                    attrs.direction_b.push(frame.binormal);
                    attrs.pattern_uv.push(ctx.pattern_uv);
                    attrs.previous_position.push(ctx.previous_position);
                    attrs.previous_direction.push(ctx.previous_direction);
                    attrs.previous_pattern_uv.push(ctx.previous_pattern_uv);
                    attrs.next_position.push(ctx.next_position);
                    attrs.next_direction.push(ctx.next_direction);
                    attrs.next_pattern_uv.push(ctx.next_pattern_uv);
                }
            }
        }

        let indices = tube_indices(divisions, frames.len());

        Ok(Self {
            positions,
            uvs,
            normals,
            indices,
            deformation,
            divisions,
            closed: is_closed(points),
            frames,
        })
    }

    #[inline]
    pub fn positions(&self) -> &[Vec3] {
        &self.positions
    }

    #[inline]
    pub fn uvs(&self) -> &[Vec2] {
        &self.uvs
    }

    /// Unit radial direction of each vertex, usable as a vertex normal.
    #[inline]
    pub fn normals(&self) -> &[Vec3] {
        &self.normals
    }

    #[inline]
    pub fn indices(&self) -> &[u32] {
        &self.indices
    }

    /// One frame per ring.
    #[inline]
    pub fn frames(&self) -> &[Frame] {
        &self.frames
    }

    #[inline]
    pub fn deformation(&self) -> Option<&DeformationAttributes> {
        self.deformation.as_ref()
    }

    #[inline]
    pub fn divisions(&self) -> usize {
        self.divisions
    }

    #[inline]
    pub fn ring_count(&self) -> usize {
        self.frames.len()
    }

    #[inline]
    pub fn vertex_count(&self) -> usize {
        self.positions.len()
    }

    #[inline]
    pub fn triangle_count(&self) -> usize {
        self.indices.len() / 3
    }

    /// Whether the source curve's ends coincided.
    #[inline]
    pub fn is_closed(&self) -> bool {
        self.closed
    }

    /// Vertex positions of one ring.
    ///
    /// ### Panics
    /// Panics if `ring >= self.ring_count()`.
    pub fn ring(&self, ring: usize) -> &[Vec3] {
        let start = ring * self.divisions;
        &self.positions[start..start + self.divisions]
    }

    pub fn triangles(&self) -> impl Iterator<Item = [u32; 3]> + '_ {
        self.indices.chunks_exact(3).map(|t| [t[0], t[1], t[2]])
    }
}

fn ring_context(frames: &[Frame], index: usize, u_delta: f32) -> RingContext {
    let frame = &frames[index];
    let pattern = |f: &Frame| Vec2::new(f.arc_length * u_delta, f.position.z * u_delta);
    let last = frames.len() - 1;

    let (previous_position, previous_direction, previous_pattern_uv) = if index == 0 {
        let away = (frame.position - frames[1].position).normalize_or_zero();
        (
            frame.position + away,
            frame.normal,
            Vec2::new((frame.arc_length - 1.0) * u_delta, frame.position.z * u_delta),
        )
    } else {
        let prev = &frames[index - 1];
        (prev.position, prev.normal, pattern(prev))
    };

    let (next_position, next_direction, next_pattern_uv) = if index == last {
        let away = (frame.position - frames[last - 1].position).normalize_or_zero();
        (
            frame.position + away,
            frame.normal,
            Vec2::new((frame.arc_length + 1.0) * u_delta, frame.position.z * u_delta),
        )
    } else {
        let next = &frames[index + 1];
        (next.position, next.normal, pattern(next))
    };

    RingContext {
        pattern_uv: pattern(frame),
        previous_position,
        previous_direction,
        previous_pattern_uv,
        next_position,
        next_direction,
        next_pattern_uv,
    }
}

/// Triangle indices stitching `rings` consecutive rings of `divisions`.
///
/// For ring `i` (vertices `A`) and ring `i + 1` (vertices `B`), each
/// division `j` emits `(A_j, A_j+1, B_j)` and `(A_j+1, B_j+1, B_j)` with
/// `j + 1` taken modulo `divisions`.
///
/// Indices are `u32`; `divisions × rings` must not exceed `u32::MAX`, which
/// [`TubeMesh::from_curve`] checks before calling this.
pub fn tube_indices(divisions: usize, rings: usize) -> Vec<u32> {
    let mut indices = Vec::with_capacity(6 * divisions * rings.saturating_sub(1));

    for i in 0..rings.saturating_sub(1) {
        let a = i * divisions;
        let b = (i + 1) * divisions;
        for j in 0..divisions {
            let k = (j + 1) % divisions;
            let (a_j, a_k) = ((a + j) as u32, (a + k) as u32);
            let (b_j, b_k) = ((b + j) as u32, (b + k) as u32);
            indices.extend_from_slice(&[a_j, a_k, b_j, a_k, b_k, b_j]);
        }
    }

    indices
}
