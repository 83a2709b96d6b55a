//! Projected grid generation.
//!
//! Produces the deterministic set of plane coordinates tiling the
//! projection's square domain at R-by-R density. The ordering is row-major
//! (y varies slowest) and is relied on positionally by every later stage:
//! resampling, caching and rendering all index the same sequence.

use crate::error::{PelagosError, Result};

/// Row-major plane coordinates of an R-by-R sampling of the projection domain.
#[derive(Debug, Clone, PartialEq)]
pub struct ProjectedGrid {
    /// Points per axis
    pub resolution: usize,
    /// Plane x coordinate per point, meters
    pub x: Vec<f64>,
    /// Plane y coordinate per point, meters
    pub y: Vec<f64>,
}

impl ProjectedGrid {
    /// Total point count, exactly resolution squared
    pub fn len(&self) -> usize {
        self.x.len()
    }

    /// Whether the grid holds no points
    pub fn is_empty(&self) -> bool {
        self.x.is_empty()
    }
}

/// Generate the full grid for a resolution over a square domain of the given
/// half-width.
///
/// Pure function: the same inputs always yield the identical point sequence.
pub fn make_gridpoints(resolution: usize, half_width: f64) -> Result<ProjectedGrid> {
    if resolution == 0 {
        return Err(PelagosError::InvalidParameter {
            param: "resolution".to_string(),
            message: "Grid resolution must be greater than 0".to_string(),
        });
    }

    let axis = linspace(-half_width, half_width, resolution);
    let n = resolution * resolution;
    let mut x = Vec::with_capacity(n);
    let mut y = Vec::with_capacity(n);

    for &yv in &axis {
        for &xv in &axis {
            x.push(xv);
            y.push(yv);
        }
    }

    Ok(ProjectedGrid { resolution, x, y })
}

/// Evenly spaced samples from `start` to `end` inclusive
fn linspace(start: f64, end: f64, n: usize) -> Vec<f64> {
    if n == 1 {
        return vec![start];
    }
    let step = (end - start) / (n - 1) as f64;
    (0..n).map(|i| start + step * i as f64).collect()
}
