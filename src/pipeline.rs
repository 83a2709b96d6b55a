//! End-to-end run orchestration.
//!
//! One call wires the stages together: load both source datasets, build the
//! projected grid and its inverse geometry, obtain both resampled frames
//! through the cache, and compose the final image. Source loading happens
//! first so a missing dataset aborts before any expensive grid work, and
//! composition happens last so no image exists unless every stage succeeded.

use std::time::Instant;
use tracing::info;

use crate::cache;
use crate::config::Config;
use crate::data_loader;
use crate::error::{PelagosError, Result};
use crate::grid::make_gridpoints;
use crate::logging::{log_operation_end, log_operation_start, log_timed_operation};
use crate::projection::{Projection, Spilhaus};
use crate::render::{self, RenderSummary};
use crate::resample::{resample_landmask, resample_temperature, GridGeometry};

/// Run the full pipeline as configured
pub fn run(config: &Config) -> Result<RenderSummary> {
    // The binary validates before calling in, but library callers reach
    // this entry point directly
    config.validate()?;

    let start = Instant::now();
    log_operation_start(
        "pipeline",
        Some(&format!("resolution={}", config.grid.resolution)),
    );

    let sst_path = config
        .data
        .sst_path
        .as_ref()
        .ok_or_else(|| PelagosError::Config {
            message: "No temperature dataset configured".to_string(),
        })?;
    let landmask_path =
        config
            .data
            .landmask_path
            .as_ref()
            .ok_or_else(|| PelagosError::Config {
                message: "No landmask dataset configured".to_string(),
            })?;

    // Both sources load before any grid computation
    let sst = data_loader::load_sst(sst_path, &config.data)?;
    let mask = data_loader::load_landmask(landmask_path)?;

    let projection = Spilhaus::new();
    let grid = make_gridpoints(config.grid.resolution, projection.half_width())?;
    info!(
        resolution = config.grid.resolution,
        points = grid.len(),
        "Projected grid generated"
    );

    // The inverse projection runs once; both frames reuse the geometry
    let geometry = GridGeometry::build(&grid, &projection)?;

    let resolution = config.grid.resolution;
    let sst_frame = log_timed_operation("frame_sst", || {
        cache::load_or_compute(
            &config.grid.cache_dir,
            "sst",
            resolution,
            config.grid.reload,
            || resample_temperature(&geometry, &sst),
        )
    })?;
    let mask_frame = log_timed_operation("frame_landmask", || {
        cache::load_or_compute(
            &config.grid.cache_dir,
            "landmask",
            resolution,
            config.grid.reload,
            || resample_landmask(&geometry, &mask),
        )
    })?;

    info!(
        valid = sst_frame.valid_count(),
        total = sst_frame.x.len(),
        "Frames ready for composition"
    );
    let summary = render::compose(&sst_frame, &mask_frame, &config.render)?;

    log_operation_end("pipeline", start, true);
    info!(
        ocean = summary.ocean_points,
        temperature = summary.temperature_points,
        land = summary.land_points,
        duration_ms = start.elapsed().as_millis() as u64,
        "Pipeline complete"
    );
    Ok(summary)
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_run_validates_config() {
        let mut config = Config::default();
        config.data.sst_path = Some("/nonexistent/woa.nc".into());
        config.data.landmask_path = Some("/nonexistent/mask.csv".into());
        config.render.legend_tick_step = 0.0;
        let result = run(&config);
        assert!(matches!(result.unwrap_err(), PelagosError::Config { .. }));
    }

    #[test]
    fn test_run_requires_source_paths() {
        let config = Config::default();
        let result = run(&config);
        assert!(matches!(result.unwrap_err(), PelagosError::Config { .. }));
    }

    #[test]
    fn test_run_fails_fast_on_missing_dataset() {
        let mut config = Config::default();
        config.data.sst_path = Some("/nonexistent/woa.nc".into());
        config.data.landmask_path = Some("/nonexistent/mask.csv".into());
        let result = run(&config);
        assert!(matches!(
            result.unwrap_err(),
            PelagosError::MissingInputDataset { .. }
        ));
    }
}
