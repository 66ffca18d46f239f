//! Differential growth of closed 2-D loops and parallel-transport tube
//! meshing of the resulting curves.
//!
//! Main components:
//! - [`growth`] — the caller-owned growth simulation object.
//! - [`phases`] — the individual steps of one growth iteration.
//! - [`spatial_hash`] — uniform grid for radius neighbour queries.
//! - [`displacement_buffer`] — snapshot-then-apply displacement accumulator.
//! - [`boundary`] — external obstacle points.
//! - [`frame`] — rotation-minimizing frames along polylines.
//! - [`tube`] — tube mesh buffers swept along a curve.
//! - [`curves`] — seed loops, random curves, subdivision, offsets, stacking.
//! - [`config`] — parameters for growth and meshing.
//! - [`error`] — validation errors.
//! - [`types`] — shared type aliases and IDs.
//!
//! Typical flow: seed a [`growth::Growth`] with
//! [`curves::circle_loop`], call [`growth::Growth::grow`] once per tick,
//! and hand [`growth::Growth::as_closed_polygon`] snapshots (or a
//! [`curves::stack_layers`] path built from them) to
//! [`tube::TubeMesh::from_curve`].

pub mod boundary;
pub mod config;
pub mod curves;
pub mod displacement_buffer;
pub mod error;
pub mod frame;
pub mod growth;
pub mod phases;
pub mod spatial_hash;
pub mod tube;
pub mod types;

pub use error::{GeometryError, Result};
