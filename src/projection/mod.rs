//! Map projection support.
//!
//! The pipeline only needs one geometric capability: mapping plane
//! coordinates back to geographic longitude/latitude. The `Projection`
//! trait keeps that capability stateless and batch-oriented; points outside
//! the continuously-defined region come back as NaN rather than errors, so
//! a batch is never interrupted by individual invalid points.

pub mod elliptic;
pub mod spilhaus;

pub use spilhaus::{Spilhaus, PLANE_EXTENT};

/// An invertible plane projection over a square domain.
pub trait Projection {
    /// Map plane coordinates to (longitude, latitude) in degrees.
    ///
    /// Input slices must have equal length. Output vectors have the same
    /// length and order; undefined points are NaN in both outputs.
    fn invert(&self, x: &[f64], y: &[f64]) -> (Vec<f64>, Vec<f64>);

    /// Half-width of the square plane domain, in plane units
    fn half_width(&self) -> f64;

    /// Get the name of this projection
    fn name(&self) -> &str;
}
