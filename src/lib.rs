//! # pelagos
//!
//! A deterministic Spilhaus-projection renderer for sea surface temperature.
//!
//! This library turns a World Ocean Atlas temperature climatology and its
//! land/sea mask into a single composite map of the world ocean on the
//! Spilhaus square, with expensive resampling stages cached on disk.
//!
//! ## Pipeline
//!
//! - **Grid**: a deterministic R x R point grid covering the projection plane
//! - **Projection**: inverse Spilhaus mapping from plane coordinates to
//!   geographic coordinates
//! - **Resampling**: nearest-neighbor sampling of temperature and landmask
//!   at each valid grid point
//! - **Cache**: Arrow IPC artifacts keyed by resolution, reused across runs
//! - **Render**: z-ordered layer composition with a thermal color scale and
//!   a legend

pub mod cache;
pub mod config;
#[cfg(feature = "netcdf")]
pub mod data_loader;
pub mod error;
pub mod frame;
pub mod grid;
pub mod logging;
#[cfg(feature = "netcdf")]
pub mod pipeline;
pub mod projection;
pub mod render;
pub mod resample;
pub mod source;

pub use config::Config;
pub use error::{PelagosError, Result};
pub use frame::{FrameValues, ResampledFrame};
pub use grid::{make_gridpoints, ProjectedGrid};
pub use logging::{
    init_tracing, log_error, log_operation_end, log_operation_start, log_source_load_stats,
    log_timed_operation,
};
pub use projection::{Projection, Spilhaus, PLANE_EXTENT};
pub use render::RenderSummary;
pub use source::{MaskGrid, SourceGrid};
