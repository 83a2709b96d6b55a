//! Frame caching.
//!
//! Resampled frames are persisted as Arrow IPC files keyed by artifact name
//! and resolution, and reloaded on later runs instead of recomputed. The
//! load attempt is an `Option` consumed by a plain conditional: a missing,
//! unreadable or mismatched artifact is an expected miss that falls back to
//! recomputation, never an error surfaced to the caller.

use std::fs::File;
use std::path::{Path, PathBuf};
use std::sync::Arc;

use arrow_array::{Array, BooleanArray, Float32Array, Float64Array, RecordBatch};
use arrow_ipc::reader::FileReader;
use arrow_ipc::writer::FileWriter;
use arrow_schema::{DataType, Field, Schema};
use tracing::{debug, info, warn};

use crate::error::{PelagosError, Result};
use crate::frame::{FrameValues, ResampledFrame};

/// Path of the artifact for a name/resolution pair
pub fn artifact_path(dir: &Path, name: &str, resolution: usize) -> PathBuf {
    dir.join(format!("{}_{}.arrow", name, resolution))
}

/// Load the named frame, or compute and persist it.
///
/// Recomputes when `reload` is set or when the artifact is absent, corrupt,
/// or was produced at a different resolution. Both paths yield frames with
/// identical shape and column semantics.
pub fn load_or_compute<F>(
    dir: &Path,
    name: &str,
    resolution: usize,
    reload: bool,
    compute: F,
) -> Result<ResampledFrame>
where
    F: FnOnce() -> Result<ResampledFrame>,
{
    let path = artifact_path(dir, name, resolution);

    if !reload {
        if let Some(frame) = try_load_frame(&path, resolution) {
            info!(
                artifact = name,
                path = %path.display(),
                "Loaded cached frame"
            );
            return Ok(frame);
        }
    }

    info!(
        artifact = name,
        reload = reload,
        "Computing frame"
    );
    let frame = compute()?;
    store_frame(&path, &frame)?;
    info!(
        artifact = name,
        path = %path.display(),
        points = frame.x.len(),
        "Frame persisted"
    );
    Ok(frame)
}

/// Attempt to load a frame; any failure is a miss
pub fn try_load_frame(path: &Path, resolution: usize) -> Option<ResampledFrame> {
    match load_frame(path) {
        Ok(frame) => {
            if frame.resolution != resolution {
                warn!(
                    path = %path.display(),
                    found = frame.resolution,
                    wanted = resolution,
                    "Cached frame has wrong resolution, recomputing"
                );
                return None;
            }
            Some(frame)
        }
        Err(e) => {
            debug!(
                path = %path.display(),
                error = %e,
                "Cache miss"
            );
            None
        }
    }
}

/// Persist a frame, overwriting any prior artifact under the same path
pub fn store_frame(path: &Path, frame: &ResampledFrame) -> Result<()> {
    frame.validate()?;

    let value_field = match &frame.values {
        FrameValues::Temperature(_) => Field::new("z", DataType::Float32, true),
        FrameValues::Mask(_) => Field::new("z", DataType::Boolean, true),
    };
    let schema = Arc::new(
        Schema::new(vec![
            Field::new("x", DataType::Float64, false),
            Field::new("y", DataType::Float64, false),
            Field::new("lon", DataType::Float64, false),
            Field::new("lat", DataType::Float64, false),
            value_field,
        ])
        .with_metadata(
            [("resolution".to_string(), frame.resolution.to_string())]
                .into_iter()
                .collect(),
        ),
    );

    let value_column: Arc<dyn Array> = match &frame.values {
        FrameValues::Temperature(v) => Arc::new(Float32Array::from(v.clone())),
        FrameValues::Mask(v) => Arc::new(BooleanArray::from(v.clone())),
    };
    let batch = RecordBatch::try_new(
        schema.clone(),
        vec![
            Arc::new(Float64Array::from(frame.x.clone())),
            Arc::new(Float64Array::from(frame.y.clone())),
            Arc::new(Float64Array::from(frame.lon.clone())),
            Arc::new(Float64Array::from(frame.lat.clone())),
            value_column,
        ],
    )?;

    let file = File::create(path)?;
    let mut writer = FileWriter::try_new(file, &schema)?;
    writer.write(&batch)?;
    writer.finish()?;
    Ok(())
}

/// Read a frame back from an Arrow IPC file
pub fn load_frame(path: &Path) -> Result<ResampledFrame> {
    let file = File::open(path)?;
    let mut reader = FileReader::try_new(file, None)?;

    let resolution: usize = reader
        .schema()
        .metadata()
        .get("resolution")
        .and_then(|v| v.parse().ok())
        .ok_or_else(|| PelagosError::Cache {
            message: format!("Artifact {} has no resolution metadata", path.display()),
        })?;

    let batch = reader.next().ok_or_else(|| PelagosError::Cache {
        message: format!("Artifact {} holds no record batch", path.display()),
    })??;

    if batch.num_columns() != 5 {
        return Err(PelagosError::Cache {
            message: format!(
                "Artifact {} has {} columns, expected 5",
                path.display(),
                batch.num_columns()
            ),
        });
    }

    let frame = ResampledFrame {
        resolution,
        x: float64_column(&batch, 0, path)?,
        y: float64_column(&batch, 1, path)?,
        lon: float64_column(&batch, 2, path)?,
        lat: float64_column(&batch, 3, path)?,
        values: value_column(&batch, 4, path)?,
    };
    frame.validate()?;
    Ok(frame)
}

fn float64_column(batch: &RecordBatch, index: usize, path: &Path) -> Result<Vec<f64>> {
    let column = batch
        .column(index)
        .as_any()
        .downcast_ref::<Float64Array>()
        .ok_or_else(|| PelagosError::Cache {
            message: format!(
                "Artifact {} column {} is not Float64",
                path.display(),
                index
            ),
        })?;
    Ok(column.values().to_vec())
}

fn value_column(batch: &RecordBatch, index: usize, path: &Path) -> Result<FrameValues> {
    let column = batch.column(index);
    if let Some(floats) = column.as_any().downcast_ref::<Float32Array>() {
        return Ok(FrameValues::Temperature(floats.iter().collect()));
    }
    if let Some(bools) = column.as_any().downcast_ref::<BooleanArray>() {
        return Ok(FrameValues::Mask(bools.iter().collect()));
    }
    Err(PelagosError::Cache {
        message: format!(
            "Artifact {} value column has unsupported type {:?}",
            path.display(),
            column.data_type()
        ),
    })
}

#[cfg(test)]
mod tests {
    use super::*;
    use tempfile::tempdir;

    fn temperature_frame() -> ResampledFrame {
        ResampledFrame {
            resolution: 2,
            x: vec![-1.0, 1.0, -1.0, 1.0],
            y: vec![-1.0, -1.0, 1.0, 1.0],
            lon: vec![10.0, f64::NAN, 30.0, 40.0],
            lat: vec![1.0, f64::NAN, 3.0, 4.0],
            values: FrameValues::Temperature(vec![Some(20.5), None, None, Some(-1.5)]),
        }
    }

    fn mask_frame() -> ResampledFrame {
        ResampledFrame {
            values: FrameValues::Mask(vec![Some(false), None, Some(true), Some(false)]),
            ..temperature_frame()
        }
    }

    #[test]
    fn test_round_trip_temperature() {
        let dir = tempdir().unwrap();
        let path = artifact_path(dir.path(), "sst", 2);
        let frame = temperature_frame();

        store_frame(&path, &frame).unwrap();
        let loaded = load_frame(&path).unwrap();

        assert_eq!(loaded.resolution, 2);
        assert_eq!(loaded.x, frame.x);
        assert_eq!(loaded.y, frame.y);
        assert!(loaded.same_geometry(&frame));
        assert_eq!(loaded.values, frame.values);
    }

    #[test]
    fn test_round_trip_mask() {
        let dir = tempdir().unwrap();
        let path = artifact_path(dir.path(), "landmask", 2);
        let frame = mask_frame();

        store_frame(&path, &frame).unwrap();
        let loaded = load_frame(&path).unwrap();
        assert_eq!(loaded.values, frame.values);
    }

    #[test]
    fn test_missing_artifact_is_a_miss() {
        let dir = tempdir().unwrap();
        let path = artifact_path(dir.path(), "sst", 2);
        assert!(try_load_frame(&path, 2).is_none());
    }

    #[test]
    fn test_corrupt_artifact_is_a_miss() {
        let dir = tempdir().unwrap();
        let path = artifact_path(dir.path(), "sst", 2);
        std::fs::write(&path, b"not an arrow file").unwrap();
        assert!(try_load_frame(&path, 2).is_none());
    }

    #[test]
    fn test_resolution_mismatch_is_a_miss() {
        let dir = tempdir().unwrap();
        let path = artifact_path(dir.path(), "sst", 2);
        store_frame(&path, &temperature_frame()).unwrap();
        assert!(try_load_frame(&path, 3).is_none());
        assert!(try_load_frame(&path, 2).is_some());
    }

    #[test]
    fn test_load_or_compute_uses_cache() {
        let dir = tempdir().unwrap();
        let frame = temperature_frame();
        store_frame(&artifact_path(dir.path(), "sst", 2), &frame).unwrap();

        // compute must not run on a warm cache
        let loaded = load_or_compute(dir.path(), "sst", 2, false, || {
            panic!("should not recompute")
        })
        .unwrap();
        assert_eq!(loaded.values, frame.values);
    }

    #[test]
    fn test_load_or_compute_forced_reload() {
        let dir = tempdir().unwrap();
        let stale = temperature_frame();
        store_frame(&artifact_path(dir.path(), "sst", 2), &stale).unwrap();

        let fresh = ResampledFrame {
            values: FrameValues::Temperature(vec![Some(7.0), None, None, Some(8.0)]),
            ..temperature_frame()
        };
        let fresh_clone = fresh.clone();
        let out = load_or_compute(dir.path(), "sst", 2, true, move || Ok(fresh_clone)).unwrap();
        assert_eq!(out.values, fresh.values);

        // The artifact was overwritten
        let reloaded = load_frame(&artifact_path(dir.path(), "sst", 2)).unwrap();
        assert_eq!(reloaded.values, fresh.values);
    }

    #[test]
    fn test_idempotent_artifacts() {
        let dir = tempdir().unwrap();
        let path_a = artifact_path(dir.path(), "a", 2);
        let path_b = artifact_path(dir.path(), "b", 2);
        let frame = temperature_frame();
        store_frame(&path_a, &frame).unwrap();
        store_frame(&path_b, &frame).unwrap();

        let bytes_a = std::fs::read(&path_a).unwrap();
        let bytes_b = std::fs::read(&path_b).unwrap();
        assert_eq!(bytes_a, bytes_b);
    }
}
