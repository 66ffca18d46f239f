//! Error types for curve meshing and growth construction.

use thiserror::Error;

/// Errors raised while validating geometry input or parameters.
#[derive(Error, Debug, Clone, PartialEq)]
pub enum GeometryError {
    /// A curve or polygon has fewer points than the operation needs.
    #[error("need at least {min} points, got {actual}")]
    TooFewPoints { min: usize, actual: usize },

    /// The tube cross-section has too few vertices.
    #[error("divisions must be at least {min}, got {actual}")]
    TooFewDivisions { min: usize, actual: usize },

    /// A radius is negative, zero where it must be positive, or not finite.
    #[error("invalid {name}: {value}")]
    InvalidRadius { name: &'static str, value: f32 },

    /// A scalar parameter is not finite or outside its allowed range.
    #[error("invalid parameter {name}: {value}")]
    InvalidParameter { name: &'static str, value: f32 },

    /// The mesh would need vertex indices beyond `u32::MAX`.
    #[error("mesh needs {count} vertices, more than u32 indices can address")]
    TooManyVertices { count: usize },

    /// Every segment of the curve has zero length.
    #[error("curve is degenerate: all segments have zero length")]
    DegenerateCurve,
}

/// A specialized Result type for geometry operations.
pub type Result<T> = std::result::Result<T, GeometryError>;
