//! Resampled frame data model.
//!
//! A `ResampledFrame` is the ordered collection of projected grid points
//! with values populated from one source dataset. Frames keep the full
//! R-by-R point set through caching and reload; points whose inverted
//! coordinates fall outside the projection domain carry `None` and are
//! filtered only at render time.

use crate::error::{PelagosError, Result};

/// Per-point values of a frame, continuous or categorical.
#[derive(Debug, Clone, PartialEq)]
pub enum FrameValues {
    /// Continuous field, `None` where the point is invalid or the source
    /// has no data
    Temperature(Vec<Option<f32>>),
    /// Land/sea classification, `true` for land, `None` where the point is
    /// invalid
    Mask(Vec<Option<bool>>),
}

impl FrameValues {
    /// Number of per-point values
    pub fn len(&self) -> usize {
        match self {
            FrameValues::Temperature(v) => v.len(),
            FrameValues::Mask(v) => v.len(),
        }
    }

    /// Whether the frame holds no values
    pub fn is_empty(&self) -> bool {
        self.len() == 0
    }
}

/// One resampled dataset on the projected grid.
///
/// All columns share the grid's row-major point order. `lon`/`lat` are NaN
/// at points outside the projection's continuously-defined region.
#[derive(Debug, Clone, PartialEq)]
pub struct ResampledFrame {
    /// Grid resolution this frame was generated at
    pub resolution: usize,
    /// Plane x coordinate per point, meters
    pub x: Vec<f64>,
    /// Plane y coordinate per point, meters
    pub y: Vec<f64>,
    /// Inverted longitude per point, degrees, NaN where undefined
    pub lon: Vec<f64>,
    /// Inverted latitude per point, degrees, NaN where undefined
    pub lat: Vec<f64>,
    /// Sampled values
    pub values: FrameValues,
}

impl ResampledFrame {
    /// Check internal consistency: every column has resolution² entries
    pub fn validate(&self) -> Result<()> {
        let n = self.resolution * self.resolution;
        if self.x.len() != n
            || self.y.len() != n
            || self.lon.len() != n
            || self.lat.len() != n
            || self.values.len() != n
        {
            return Err(PelagosError::Cache {
                message: format!(
                    "Frame columns do not match resolution {}: x={} y={} lon={} lat={} values={}",
                    self.resolution,
                    self.x.len(),
                    self.y.len(),
                    self.lon.len(),
                    self.lat.len(),
                    self.values.len()
                ),
            });
        }
        Ok(())
    }

    /// Number of points with valid inverted coordinates
    pub fn valid_count(&self) -> usize {
        self.lon
            .iter()
            .zip(&self.lat)
            .filter(|(lon, lat)| lon.is_finite() && lat.is_finite())
            .count()
    }

    /// Whether two frames share identical plane and geographic geometry
    pub fn same_geometry(&self, other: &ResampledFrame) -> bool {
        fn eq_nan(a: &[f64], b: &[f64]) -> bool {
            a.len() == b.len()
                && a.iter()
                    .zip(b)
                    .all(|(x, y)| x == y || (x.is_nan() && y.is_nan()))
        }
        self.resolution == other.resolution
            && self.x == other.x
            && self.y == other.y
            && eq_nan(&self.lon, &other.lon)
            && eq_nan(&self.lat, &other.lat)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn frame(values: FrameValues) -> ResampledFrame {
        ResampledFrame {
            resolution: 2,
            x: vec![0.0, 1.0, 0.0, 1.0],
            y: vec![0.0, 0.0, 1.0, 1.0],
            lon: vec![10.0, f64::NAN, 30.0, 40.0],
            lat: vec![1.0, f64::NAN, 3.0, 4.0],
            values,
        }
    }

    #[test]
    fn test_validate_lengths() {
        let f = frame(FrameValues::Temperature(vec![
            Some(1.0),
            None,
            Some(3.0),
            Some(4.0),
        ]));
        assert!(f.validate().is_ok());

        let short = frame(FrameValues::Mask(vec![Some(true)]));
        assert!(short.validate().is_err());
    }

    #[test]
    fn test_valid_count_skips_nan() {
        let f = frame(FrameValues::Mask(vec![
            Some(false),
            None,
            Some(true),
            Some(false),
        ]));
        assert_eq!(f.valid_count(), 3);
    }

    #[test]
    fn test_same_geometry_tolerates_nan() {
        let a = frame(FrameValues::Temperature(vec![Some(1.0), None, None, None]));
        let b = frame(FrameValues::Mask(vec![Some(true), None, None, None]));
        assert!(a.same_geometry(&b));
    }
}
