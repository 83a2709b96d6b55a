//! pelagos - Spilhaus sea surface temperature maps from WOA data
//!
//! This is the main entry point for the pelagos application.

use tracing::{error, info};

use pelagos::{pipeline, Config, Result};

fn main() -> Result<()> {
    // Initialize tracing with default level first
    pelagos::init_tracing("info");

    info!("Starting pelagos v{}", env!("CARGO_PKG_VERSION"));

    // Load configuration
    let config = Config::load().map_err(|e| {
        error!("Configuration error: {}", e);
        e
    })?;

    // Validate configuration
    config.validate().map_err(|e| {
        error!("Invalid configuration: {}", e);
        e
    })?;

    // Re-initialize tracing with configured level
    if std::env::var("RUST_LOG").is_err() {
        std::env::set_var("RUST_LOG", &config.log_level);
    }

    let summary = pipeline::run(&config).map_err(|e| {
        pelagos::log_error(&e, "pipeline");
        e
    })?;

    info!(
        output = %config.render.output.display(),
        ocean = summary.ocean_points,
        temperature = summary.temperature_points,
        land = summary.land_points,
        "Done"
    );
    Ok(())
}
