//! Nearest-neighbor resampling of source grids onto the projected grid.
//!
//! For each grid point with valid inverted coordinates, the value of the
//! nearest source cell is assigned; no interpolation. Points outside the
//! projection domain stay unset. If no point at all has valid coordinates
//! the run aborts - an all-invalid grid means the projection or domain is
//! misconfigured, not that the ocean is empty.

use std::time::Instant;
use tracing::debug;

use crate::error::{PelagosError, Result};
use crate::frame::{FrameValues, ResampledFrame};
use crate::grid::ProjectedGrid;
use crate::logging::{log_operation_end, log_operation_start};
use crate::projection::Projection;
use crate::source::{MaskGrid, SourceGrid};

/// Grid geometry with inverted geographic coordinates, shared by every
/// frame resampled at one resolution.
#[derive(Debug, Clone)]
pub struct GridGeometry {
    pub resolution: usize,
    pub x: Vec<f64>,
    pub y: Vec<f64>,
    pub lon: Vec<f64>,
    pub lat: Vec<f64>,
}

impl GridGeometry {
    /// Invert a projected grid, failing fast when the whole grid falls
    /// outside the projection domain.
    pub fn build(grid: &ProjectedGrid, projection: &dyn Projection) -> Result<Self> {
        let start = Instant::now();
        log_operation_start("invert_grid", Some(projection.name()));

        let (lon, lat) = projection.invert(&grid.x, &grid.y);

        let valid = lon
            .iter()
            .zip(&lat)
            .filter(|(lo, la)| lo.is_finite() && la.is_finite())
            .count();
        debug!(
            resolution = grid.resolution,
            valid = valid,
            total = grid.len(),
            "Grid inversion finished"
        );
        if valid == 0 {
            log_operation_end("invert_grid", start, false);
            return Err(PelagosError::ProjectionDomainEmpty {
                resolution: grid.resolution,
            });
        }
        log_operation_end("invert_grid", start, true);

        Ok(Self {
            resolution: grid.resolution,
            x: grid.x.clone(),
            y: grid.y.clone(),
            lon,
            lat,
        })
    }
}

/// Resample a continuous source grid onto the projected geometry.
pub fn resample_temperature(geometry: &GridGeometry, source: &SourceGrid) -> Result<ResampledFrame> {
    let values = sample(geometry, |lon, lat| {
        let v = source.nearest(lon, lat);
        if v.is_finite() {
            Some(v)
        } else {
            None
        }
    })?;

    let frame = ResampledFrame {
        resolution: geometry.resolution,
        x: geometry.x.clone(),
        y: geometry.y.clone(),
        lon: geometry.lon.clone(),
        lat: geometry.lat.clone(),
        values: FrameValues::Temperature(values),
    };
    frame.validate()?;
    Ok(frame)
}

/// Resample a land/sea mask onto the projected geometry.
pub fn resample_landmask(geometry: &GridGeometry, mask: &MaskGrid) -> Result<ResampledFrame> {
    let values = sample(geometry, |lon, lat| Some(mask.nearest(lon, lat)))?;

    let frame = ResampledFrame {
        resolution: geometry.resolution,
        x: geometry.x.clone(),
        y: geometry.y.clone(),
        lon: geometry.lon.clone(),
        lat: geometry.lat.clone(),
        values: FrameValues::Mask(values),
    };
    frame.validate()?;
    Ok(frame)
}

/// Run one lookup per valid point; invalid points yield `None`.
fn sample<T, F>(geometry: &GridGeometry, lookup: F) -> Result<Vec<Option<T>>>
where
    F: Fn(f64, f64) -> Option<T>,
{
    let mut valid = 0usize;
    let values = geometry
        .lon
        .iter()
        .zip(&geometry.lat)
        .map(|(&lon, &lat)| {
            if lon.is_finite() && lat.is_finite() {
                valid += 1;
                lookup(lon, lat)
            } else {
                None
            }
        })
        .collect();

    // GridGeometry::build already rejects an all-invalid grid; this guards
    // geometries constructed by other means (cache reload paths, tests).
    if valid == 0 {
        return Err(PelagosError::ProjectionDomainEmpty {
            resolution: geometry.resolution,
        });
    }
    Ok(values)
}
