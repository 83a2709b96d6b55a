//! Configuration management for pelagos.
//!
//! This module handles the layered configuration system with the following precedence:
//! 1. Command-line arguments (highest priority)
//! 2. Environment variables
//! 3. JSON config file
//! 4. Default values (lowest priority)
//!
//! All run-level constants (reload flag, resolution, colors, legend range)
//! live in one `Config` that is passed into the pipeline entry point, so
//! tests can run the pipeline repeatedly with varied parameters.

use clap::Parser;
use serde::{Deserialize, Serialize};
use std::path::PathBuf;

use crate::error::{PelagosError, Result};

/// Command-line arguments for pelagos
#[derive(Parser, Debug)]
#[command(name = "pelagos")]
#[command(author, version, about, long_about = None)]
pub struct Args {
    /// Path to the WOA temperature NetCDF file
    pub sst_file: PathBuf,

    /// Path to the WOA land/sea mask CSV file
    pub landmask_file: PathBuf,

    /// Grid resolution (points per axis), default 500
    #[arg(short, long, env = "PELAGOS_RESOLUTION")]
    pub resolution: Option<usize>,

    /// Force regeneration of cached frames
    #[arg(long, env = "PELAGOS_RELOAD")]
    pub reload: bool,

    /// Output image path, default sst_spilhaus.svg
    #[arg(short, long, env = "PELAGOS_OUTPUT")]
    pub output: Option<PathBuf>,

    /// Directory for cached frame artifacts, default "."
    #[arg(long, env = "PELAGOS_CACHE_DIR")]
    pub cache_dir: Option<PathBuf>,

    /// Path to JSON configuration file
    #[arg(short, long, env = "PELAGOS_CONFIG")]
    pub config: Option<PathBuf>,

    /// Log level (trace, debug, info, warn, error), default info
    #[arg(long, env = "PELAGOS_LOG_LEVEL")]
    pub log_level: Option<String>,
}

/// Source dataset configuration
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct DataConfig {
    /// Path to the temperature NetCDF file
    #[serde(default)]
    pub sst_path: Option<PathBuf>,

    /// Path to the land/sea mask CSV file
    #[serde(default)]
    pub landmask_path: Option<PathBuf>,

    /// Name of the temperature variable in the NetCDF file
    #[serde(default = "default_variable")]
    pub variable: String,

    /// Depth index to slice (0 = sea surface)
    #[serde(default)]
    pub depth_index: usize,

    /// Time index to slice
    #[serde(default)]
    pub time_index: usize,
}

/// Grid and cache configuration
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct GridConfig {
    /// Points per axis of the projected grid
    #[serde(default = "default_resolution")]
    pub resolution: usize,

    /// Force regeneration of cached frames
    #[serde(default)]
    pub reload: bool,

    /// Directory for cache artifacts
    #[serde(default = "default_cache_dir")]
    pub cache_dir: PathBuf,
}

/// Rendering configuration
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct RenderConfig {
    /// Color for ocean cells lacking a temperature sample
    #[serde(default = "default_gap_color")]
    pub gap_color: String,

    /// Background color, also used for the land layer
    #[serde(default = "default_background_color")]
    pub background_color: String,

    /// Foreground color for legend text and ticks
    #[serde(default = "default_foreground_color")]
    pub foreground_color: String,

    /// Lower bound of the legend value range, in degrees Celsius
    #[serde(default = "default_legend_min")]
    pub legend_min: f32,

    /// Upper bound of the legend value range, in degrees Celsius
    #[serde(default = "default_legend_max")]
    pub legend_max: f32,

    /// Spacing between legend ticks, in degrees Celsius
    #[serde(default = "default_legend_tick_step")]
    pub legend_tick_step: f32,

    /// Legend label
    #[serde(default = "default_legend_label")]
    pub legend_label: String,

    /// Output image path
    #[serde(default = "default_output")]
    pub output: PathBuf,
}

/// Complete configuration
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Config {
    /// Source dataset configuration
    #[serde(default)]
    pub data: DataConfig,

    /// Grid and cache configuration
    #[serde(default)]
    pub grid: GridConfig,

    /// Rendering configuration
    #[serde(default)]
    pub render: RenderConfig,

    /// Log level
    #[serde(default = "default_log_level")]
    pub log_level: String,
}

impl Config {
    /// Load configuration from all sources with proper precedence
    pub fn load() -> Result<Self> {
        let args = Args::parse();
        Self::from_args(args)
    }

    /// Build the configuration from already-parsed arguments
    pub fn from_args(args: Args) -> Result<Self> {
        // Start with defaults
        let mut config = Config::default();

        // Load from JSON file if provided
        if let Some(config_path) = &args.config {
            let json_config = Self::load_from_file(config_path)?;
            config.merge(json_config);
        }

        // Override with command-line arguments, but only where the user
        // actually passed something; absent flags must not clobber the
        // JSON layer with clap defaults
        config.data.sst_path = Some(args.sst_file);
        config.data.landmask_path = Some(args.landmask_file);
        if let Some(resolution) = args.resolution {
            config.grid.resolution = resolution;
        }
        if args.reload {
            config.grid.reload = true;
        }
        if let Some(cache_dir) = args.cache_dir {
            config.grid.cache_dir = cache_dir;
        }
        if let Some(output) = args.output {
            config.render.output = output;
        }
        if let Some(log_level) = args.log_level {
            config.log_level = log_level;
        }

        Ok(config)
    }

    /// Load configuration from a JSON file
    fn load_from_file(path: &PathBuf) -> Result<Self> {
        let content = std::fs::read_to_string(path)?;
        let config: Config = serde_json::from_str(&content)?;
        Ok(config)
    }

    /// Merge another config into this one (other takes precedence)
    fn merge(&mut self, other: Config) {
        if other.data.sst_path.is_some() {
            self.data.sst_path = other.data.sst_path;
        }
        if other.data.landmask_path.is_some() {
            self.data.landmask_path = other.data.landmask_path;
        }
        self.data.variable = other.data.variable;
        self.data.depth_index = other.data.depth_index;
        self.data.time_index = other.data.time_index;
        self.grid = other.grid;
        self.render = other.render;
        self.log_level = other.log_level;
    }

    /// Validate the configuration
    pub fn validate(&self) -> Result<()> {
        // Resolution R <= 0 is a contract violation, rejected before use
        if self.grid.resolution == 0 {
            return Err(PelagosError::Config {
                message: "Grid resolution must be greater than 0".to_string(),
            });
        }

        if self.data.variable.is_empty() {
            return Err(PelagosError::Config {
                message: "Temperature variable name cannot be empty".to_string(),
            });
        }

        if self.render.legend_max <= self.render.legend_min {
            return Err(PelagosError::Config {
                message: format!(
                    "Legend range is empty: min {} >= max {}",
                    self.render.legend_min, self.render.legend_max
                ),
            });
        }

        if self.render.legend_tick_step <= 0.0 {
            return Err(PelagosError::Config {
                message: "Legend tick step must be positive".to_string(),
            });
        }

        for (name, value) in [
            ("gap_color", &self.render.gap_color),
            ("background_color", &self.render.background_color),
            ("foreground_color", &self.render.foreground_color),
        ] {
            if crate::render::colormap::parse_color(value).is_none() {
                return Err(PelagosError::Config {
                    message: format!("Invalid {}: {}", name, value),
                });
            }
        }

        // Validate log level
        match self.log_level.as_str() {
            "trace" | "debug" | "info" | "warn" | "error" => {}
            _ => {
                return Err(PelagosError::Config {
                    message: format!(
                        "Invalid log level: {}. Must be one of: trace, debug, info, warn, error",
                        self.log_level
                    ),
                });
            }
        }

        Ok(())
    }
}

impl Default for Config {
    fn default() -> Self {
        Self {
            data: DataConfig::default(),
            grid: GridConfig::default(),
            render: RenderConfig::default(),
            log_level: default_log_level(),
        }
    }
}

impl Default for DataConfig {
    fn default() -> Self {
        Self {
            sst_path: None,
            landmask_path: None,
            variable: default_variable(),
            depth_index: 0,
            time_index: 0,
        }
    }
}

impl Default for GridConfig {
    fn default() -> Self {
        Self {
            resolution: default_resolution(),
            reload: false,
            cache_dir: default_cache_dir(),
        }
    }
}

impl Default for RenderConfig {
    fn default() -> Self {
        Self {
            gap_color: default_gap_color(),
            background_color: default_background_color(),
            foreground_color: default_foreground_color(),
            legend_min: default_legend_min(),
            legend_max: default_legend_max(),
            legend_tick_step: default_legend_tick_step(),
            legend_label: default_legend_label(),
            output: default_output(),
        }
    }
}

// Default value functions for serde
fn default_variable() -> String {
    "t_mn".to_string()
}

fn default_resolution() -> usize {
    500
}

fn default_cache_dir() -> PathBuf {
    PathBuf::from(".")
}

fn default_gap_color() -> String {
    "lightgrey".to_string()
}

fn default_background_color() -> String {
    "white".to_string()
}

fn default_foreground_color() -> String {
    "black".to_string()
}

fn default_legend_min() -> f32 {
    0.0
}

fn default_legend_max() -> f32 {
    30.0
}

fn default_legend_tick_step() -> f32 {
    5.0
}

fn default_legend_label() -> String {
    "SST [°C]".to_string()
}

fn default_output() -> PathBuf {
    PathBuf::from("sst_spilhaus.svg")
}

fn default_log_level() -> String {
    "info".to_string()
}
