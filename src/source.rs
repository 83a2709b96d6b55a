//! Source grid containers.
//!
//! A source grid is a geographic dataset indexed by latitude/longitude
//! carrying one scalar field: continuous temperature for `SourceGrid`,
//! a boolean land/sea classification for `MaskGrid`. Axes are stored sorted
//! ascending so nearest-cell lookups can binary search them.

use ndarray::Array2;

use crate::error::{PelagosError, Result};

/// A continuous scalar field on a regular lat/lon grid.
///
/// `values` is indexed `[lat][lon]`; missing cells are NaN.
#[derive(Debug, Clone)]
pub struct SourceGrid {
    /// Dataset identity, used for logging and cache keys
    pub name: String,
    /// Latitude axis, degrees, ascending
    pub lats: Vec<f64>,
    /// Longitude axis, degrees, ascending
    pub lons: Vec<f64>,
    /// Cell values, NaN where the source has no data
    pub values: Array2<f32>,
}

/// A boolean land/sea classification on a regular lat/lon grid.
///
/// `values` is indexed `[lat][lon]`; `true` is land.
#[derive(Debug, Clone)]
pub struct MaskGrid {
    /// Dataset identity, used for logging and cache keys
    pub name: String,
    /// Latitude axis, degrees, ascending
    pub lats: Vec<f64>,
    /// Longitude axis, degrees, ascending
    pub lons: Vec<f64>,
    /// Cell classification, `true` for land
    pub values: Array2<bool>,
}

impl SourceGrid {
    /// Create a grid, checking axis/array consistency
    pub fn new(name: String, lats: Vec<f64>, lons: Vec<f64>, values: Array2<f32>) -> Result<Self> {
        validate_axes(&name, &lats, &lons, values.shape())?;
        Ok(Self {
            name,
            lats,
            lons,
            values,
        })
    }

    /// Nearest-cell value for a geographic coordinate
    pub fn nearest(&self, lon: f64, lat: f64) -> f32 {
        let i = nearest_index(&self.lats, lat);
        let j = nearest_index(&self.lons, lon);
        self.values[[i, j]]
    }
}

impl MaskGrid {
    /// Create a mask grid, checking axis/array consistency
    pub fn new(name: String, lats: Vec<f64>, lons: Vec<f64>, values: Array2<bool>) -> Result<Self> {
        validate_axes(&name, &lats, &lons, values.shape())?;
        Ok(Self {
            name,
            lats,
            lons,
            values,
        })
    }

    /// Nearest-cell classification for a geographic coordinate
    pub fn nearest(&self, lon: f64, lat: f64) -> bool {
        let i = nearest_index(&self.lats, lat);
        let j = nearest_index(&self.lons, lon);
        self.values[[i, j]]
    }
}

fn validate_axes(name: &str, lats: &[f64], lons: &[f64], shape: &[usize]) -> Result<()> {
    if lats.is_empty() || lons.is_empty() {
        return Err(PelagosError::MissingInputDataset {
            path: name.to_string(),
            message: "Source grid has an empty coordinate axis".to_string(),
        });
    }
    if shape != [lats.len(), lons.len()] {
        return Err(PelagosError::MissingInputDataset {
            path: name.to_string(),
            message: format!(
                "Source grid shape {:?} does not match axes ({} x {})",
                shape,
                lats.len(),
                lons.len()
            ),
        });
    }
    if lats.windows(2).any(|w| w[0] >= w[1]) || lons.windows(2).any(|w| w[0] >= w[1]) {
        return Err(PelagosError::MissingInputDataset {
            path: name.to_string(),
            message: "Source grid axes must be strictly ascending".to_string(),
        });
    }
    Ok(())
}

/// Index of the axis value nearest to `value`.
///
/// Axes are strictly ascending, so the nearest match is unique up to exact
/// midpoints, which resolve to the lower index.
pub fn nearest_index(axis: &[f64], value: f64) -> usize {
    let i = axis.partition_point(|&c| c < value);
    if i == 0 {
        return 0;
    }
    if i == axis.len() {
        return axis.len() - 1;
    }
    // value sits between axis[i - 1] and axis[i]
    if (value - axis[i - 1]) <= (axis[i] - value) {
        i - 1
    } else {
        i
    }
}
