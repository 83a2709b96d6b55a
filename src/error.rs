//! Error types for the pelagos pipeline.
//!
//! One enum covers every failure mode. Apart from a cache miss, which the
//! cache layer recovers from locally, every error aborts the run before any
//! output is written.

use thiserror::Error;

/// The main error type for pelagos operations.
#[derive(Error, Debug)]
pub enum PelagosError {
    /// NetCDF file operation errors
    #[cfg(feature = "netcdf")]
    #[error("NetCDF error: {0}")]
    NetCdf(#[from] netcdf::Error),

    /// IO errors
    #[error("IO error: {0}")]
    Io(#[from] std::io::Error),

    /// Configuration errors
    #[error("Configuration error: {message}")]
    Config { message: String },

    /// A source dataset is missing or malformed
    #[error("Missing input dataset: {path} - {message}")]
    MissingInputDataset { path: String, message: String },

    /// Invalid parameter errors
    #[error("Invalid parameter: {param} - {message}")]
    InvalidParameter { param: String, message: String },

    /// Every inverted grid coordinate fell outside the projection domain
    #[error("Projection domain empty: no valid coordinates at resolution {resolution}")]
    ProjectionDomainEmpty { resolution: usize },

    /// Cache artifact errors that cannot be recovered by recomputation
    #[error("Cache error: {message}")]
    Cache { message: String },

    /// Rendering or output errors
    #[error("Rendering error: {message}")]
    Render { message: String },

    /// JSON serialization/deserialization errors
    #[error("JSON error: {0}")]
    Json(#[from] serde_json::Error),

    /// Arrow serialization errors
    #[error("Arrow error: {0}")]
    Arrow(#[from] arrow_schema::ArrowError),

    /// ndarray shape errors
    #[error("Shape error: {0}")]
    Shape(#[from] ndarray::ShapeError),
}

/// Convenience type alias for Results with PelagosError
pub type Result<T> = std::result::Result<T, PelagosError>;
