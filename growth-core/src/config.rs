//! Parameters for the growth simulation and the tube mesher.

use serde::{Deserialize, Serialize};

use crate::error::{GeometryError, Result};

/// Tunable parameters of the differential growth simulation.
///
/// Missing fields fall back to [`GrowthConfig::default`] when deserialized.
#[derive(Clone, Copy, Debug, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct GrowthConfig {
    /// Peak displacement two coincident-but-distinct points push each other by.
    pub repulsion_strength: f32,
    /// Pull of each point toward the midpoint of its loop neighbours.
    pub attraction_strength: f32,
    /// Range of repulsion, also the spatial hash cell size.
    pub repulsion_radius: f32,
    /// Target spacing along the loop. Edges longer than twice this are split.
    pub attraction_radius: f32,
    /// Upper bound of the random per-point perturbation.
    pub jiggle_radius: f32,
    /// Fraction of the way each point moves toward its neighbour midpoint.
    pub smoothing: f32,
    /// Probability per point per iteration of an optional insertion.
    pub random_insertion_rate: f32,
    /// Below this many neighbours an insertion is forced.
    pub repulsion_minimum_threshold: usize,
    /// At or above this many neighbours insertion is forbidden.
    pub repulsion_maximum_threshold: usize,
    /// Scale applied to repulsion coming from boundary points.
    pub boundary_repulsion_multiplier: f32,
    /// Keep density-forced insertion when `random_insertion_rate` is zero.
    ///
    /// Off by default, so a zero rate disables insertion entirely.
    pub forced_insertion_at_zero_rate: bool,
}

impl Default for GrowthConfig {
    fn default() -> Self {
        Self {
            repulsion_strength: 0.015,
            attraction_strength: 0.025,
            repulsion_radius: 1.25,
            attraction_radius: 2.5,
            jiggle_radius: 0.0001,
            smoothing: 0.5,
            random_insertion_rate: 0.01,
            repulsion_minimum_threshold: 25,
            repulsion_maximum_threshold: 45,
            boundary_repulsion_multiplier: 10.0,
            forced_insertion_at_zero_rate: false,
        }
    }
}

impl GrowthConfig {
    /// Edge length above which [`crate::phases::split_phase`] subdivides.
    #[inline]
    pub fn split_distance(&self) -> f32 {
        self.attraction_radius * 2.0
    }

    #[must_use]
    pub fn with_radii(mut self, repulsion_radius: f32, attraction_radius: f32) -> Self {
        self.repulsion_radius = repulsion_radius;
        self.attraction_radius = attraction_radius;
        self
    }

    #[must_use]
    pub fn with_strengths(mut self, repulsion: f32, attraction: f32) -> Self {
        self.repulsion_strength = repulsion;
        self.attraction_strength = attraction;
        self
    }

    #[must_use]
    pub fn with_jiggle_radius(mut self, jiggle_radius: f32) -> Self {
        self.jiggle_radius = jiggle_radius;
        self
    }

    #[must_use]
    pub fn with_smoothing(mut self, smoothing: f32) -> Self {
        self.smoothing = smoothing;
        self
    }

    #[must_use]
    pub fn with_random_insertion_rate(mut self, rate: f32) -> Self {
        self.random_insertion_rate = rate;
        self
    }

    #[must_use]
    pub fn with_thresholds(mut self, minimum: usize, maximum: usize) -> Self {
        self.repulsion_minimum_threshold = minimum;
        self.repulsion_maximum_threshold = maximum;
        self
    }

    /// Density-only insertion: forced insertions still happen with a zero
    /// random rate.
    #[must_use]
    pub fn with_forced_insertion_at_zero_rate(mut self, enabled: bool) -> Self {
        self.forced_insertion_at_zero_rate = enabled;
        self
    }

    /// A configuration under which one growth step moves nothing.
    ///
    /// Forces, jiggle, smoothing and insertion are all zeroed; radii keep
    /// their defaults so the spatial hash and split rule stay well-defined.
    pub fn frozen() -> Self {
        Self::default()
            .with_strengths(0.0, 0.0)
            .with_jiggle_radius(0.0)
            .with_smoothing(0.0)
            .with_random_insertion_rate(0.0)
            .with_forced_insertion_at_zero_rate(false)
    }

    /// Checks that every parameter is finite and within its range.
    ///
    /// ### Errors
    /// - [`GeometryError::InvalidRadius`] if either radius is not strictly
    ///   positive and finite.
    /// - [`GeometryError::InvalidParameter`] for negative strengths or
    ///   jiggle, and for smoothing or insertion rate outside `[0, 1]`.
    pub fn validate(&self) -> Result<()> {
        positive_radius("repulsion_radius", self.repulsion_radius)?;
        positive_radius("attraction_radius", self.attraction_radius)?;
        non_negative("repulsion_strength", self.repulsion_strength)?;
        non_negative("attraction_strength", self.attraction_strength)?;
        non_negative("jiggle_radius", self.jiggle_radius)?;
        non_negative(
            "boundary_repulsion_multiplier",
            self.boundary_repulsion_multiplier,
        )?;
        unit_interval("smoothing", self.smoothing)?;
        unit_interval("random_insertion_rate", self.random_insertion_rate)?;
        Ok(())
    }
}

/// Parameters of the swept tube cross-section.
#[derive(Clone, Copy, Debug, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct TubeConfig {
    /// Cross-section radius. Zero collapses every ring onto the spine.
    pub radius: f32,
    /// Vertices per ring.
    pub divisions: usize,
    /// Texture repeats around the circumference.
    pub uv_scale: f32,
    /// Whether to emit the per-vertex neighbour attributes used for
    /// downstream deformation.
    pub deformation_attributes: bool,
}

impl Default for TubeConfig {
    fn default() -> Self {
        Self {
            radius: 1.5,
            divisions: 8,
            uv_scale: 2.0,
            deformation_attributes: true,
        }
    }
}

impl TubeConfig {
    /// Smallest cross-section that still encloses area.
    pub const MIN_DIVISIONS: usize = 3;

    #[must_use]
    pub fn with_radius(mut self, radius: f32) -> Self {
        self.radius = radius;
        self
    }

    #[must_use]
    pub fn with_divisions(mut self, divisions: usize) -> Self {
        self.divisions = divisions;
        self
    }

    #[must_use]
    pub fn with_uv_scale(mut self, uv_scale: f32) -> Self {
        self.uv_scale = uv_scale;
        self
    }

    /// Drop the deformation attributes and produce static geometry only.
    #[must_use]
    pub fn static_geometry(mut self) -> Self {
        self.deformation_attributes = false;
        self
    }

    /// ### Errors
    /// - [`GeometryError::InvalidRadius`] if the radius is negative or not finite.
    /// - [`GeometryError::TooFewDivisions`] if `divisions < 3`.
    /// - [`GeometryError::InvalidParameter`] if `uv_scale` is not finite.
    pub fn validate(&self) -> Result<()> {
        if !self.radius.is_finite() || self.radius < 0.0 {
            return Err(GeometryError::InvalidRadius {
                name: "radius",
                value: self.radius,
            });
        }
        if self.divisions < Self::MIN_DIVISIONS {
            return Err(GeometryError::TooFewDivisions {
                min: Self::MIN_DIVISIONS,
                actual: self.divisions,
            });
        }
        if !self.uv_scale.is_finite() {
            return Err(GeometryError::InvalidParameter {
                name: "uv_scale",
                value: self.uv_scale,
            });
        }
        Ok(())
    }
}

fn positive_radius(name: &'static str, value: f32) -> Result<()> {
    if value.is_finite() && value > 0.0 {
        Ok(())
    } else {
        Err(GeometryError::InvalidRadius { name, value })
    }
}

fn non_negative(name: &'static str, value: f32) -> Result<()> {
    if value.is_finite() && value >= 0.0 {
        Ok(())
    } else {
        Err(GeometryError::InvalidParameter { name, value })
    }
}

fn unit_interval(name: &'static str, value: f32) -> Result<()> {
    if (0.0..=1.0).contains(&value) {
        Ok(())
    } else {
        Err(GeometryError::InvalidParameter { name, value })
    }
}
