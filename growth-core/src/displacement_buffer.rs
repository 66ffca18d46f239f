use crate::types::PointId;
use glam::Vec2;

/// Per-point displacement summed over one force phase.
///
/// Force phases read positions from an unmodified snapshot, push their
/// contributions here, and only then move the points in one pass via
/// [`DisplacementBuffer::apply_to`]. A phase's result is therefore
/// independent of the order in which points are visited.
///
/// Buffers are owned by [`crate::growth::Growth`] and reused across steps;
/// each phase resizes and clears its buffer with
/// [`DisplacementBuffer::ensure_len`] before writing. Phases that must read
/// the same snapshot write separate buffers that are merged before applying.
#[derive(Debug, Clone, Default)]
pub struct DisplacementBuffer {
    offset: Vec<Vec2>,
}

impl DisplacementBuffer {
    /// A zeroed buffer for `len` points.
    pub fn with_len(len: usize) -> Self {
        Self {
            offset: vec![Vec2::ZERO; len],
        }
    }

    /// Resizes to `len` points and zeroes every entry.
    ///
    /// Entries are cleared even when the length already matches, so the
    /// buffer never leaks displacement from the previous phase.
    pub fn ensure_len(&mut self, len: usize) {
        self.offset.resize(len, Vec2::ZERO);
        self.clear();
    }

    pub fn clear(&mut self) {
        self.offset.fill(Vec2::ZERO);
    }

    #[inline]
    pub fn len(&self) -> usize {
        self.offset.len()
    }

    #[inline]
    pub fn is_empty(&self) -> bool {
        self.offset.is_empty()
    }

    /// ### Panics
    /// Panics if `id` is out of bounds.
    #[inline]
    pub fn add(&mut self, id: PointId, offset: Vec2) {
        self.offset[id] += offset;
    }

    #[inline]
    pub fn total(&self, id: PointId) -> Vec2 {
        self.offset[id]
    }

    /// Adds another buffer's displacements into this one.
    ///
    /// ### Panics
    /// Panics if the two buffers have different lengths.
    pub fn merge_from(&mut self, other: &DisplacementBuffer) {
        assert_eq!(self.offset.len(), other.offset.len());
        for (a, b) in self.offset.iter_mut().zip(&other.offset) {
            *a += *b;
        }
    }

    /// Moves every point by its summed displacement.
    ///
    /// ### Panics
    /// Panics if `points` and the buffer have different lengths.
    pub fn apply_to(&self, points: &mut [Vec2]) {
        assert_eq!(self.offset.len(), points.len());
        for (p, d) in points.iter_mut().zip(&self.offset) {
            *p += *d;
        }
    }
}
