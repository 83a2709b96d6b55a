//! Layered composition of the final image.
//!
//! Merges the temperature frame and the landmask frame into one composite
//! SVG. The point layers are rasterized into a PNG (one pixel per grid
//! point) embedded in the SVG; the legend and text stay vector. Layer
//! stacking, back to front:
//!
//! 1. ocean points in the gap color - visible wherever the temperature
//!    layer has no sample,
//! 2. temperature points colored by the thermal scale,
//! 3. land points in the background color, occluding temperature points
//!    that nearest-neighbor lookup placed on land near coastlines.
//!
//! Plane coordinates mean nothing to a viewer, so the map carries no axes,
//! ticks or border.

pub mod colormap;
pub mod legend;

use base64::engine::general_purpose::STANDARD as BASE64;
use base64::Engine;
use image::{ImageBuffer, Rgba, RgbaImage};
use std::io::Cursor;
use std::time::Instant;
use tracing::{debug, info};

use crate::config::RenderConfig;
use crate::error::{PelagosError, Result};
use crate::frame::{FrameValues, ResampledFrame};
use colormap::{parse_color, to_hex, Colormap, Thermal};

/// Edge length of the map viewport in SVG units
const MAP_SIZE: f64 = 800.0;

/// Width reserved for the legend column
const LEGEND_COLUMN: f64 = 110.0;

/// Counts of points drawn per layer, mostly for logging and tests
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct RenderSummary {
    /// Points drawn in the ocean gap layer
    pub ocean_points: usize,
    /// Points drawn in the temperature layer
    pub temperature_points: usize,
    /// Points drawn in the land layer
    pub land_points: usize,
}

/// Compose both frames into the configured output file.
///
/// Fails before writing anything if the frames disagree on geometry or
/// carry the wrong value kinds; no partial image is ever produced.
pub fn compose(
    temperature: &ResampledFrame,
    mask: &ResampledFrame,
    config: &RenderConfig,
) -> Result<RenderSummary> {
    let start = Instant::now();

    let temps = match &temperature.values {
        FrameValues::Temperature(v) => v,
        FrameValues::Mask(_) => {
            return Err(PelagosError::Render {
                message: "Temperature frame carries mask values".to_string(),
            })
        }
    };
    let land = match &mask.values {
        FrameValues::Mask(v) => v,
        FrameValues::Temperature(_) => {
            return Err(PelagosError::Render {
                message: "Mask frame carries temperature values".to_string(),
            })
        }
    };
    if !temperature.same_geometry(mask) {
        return Err(PelagosError::Render {
            message: format!(
                "Frames do not share grid geometry (resolutions {} and {})",
                temperature.resolution, mask.resolution
            ),
        });
    }

    let gap = parse_render_color(&config.gap_color, "gap_color")?;
    let background = parse_render_color(&config.background_color, "background_color")?;
    let foreground = parse_render_color(&config.foreground_color, "foreground_color")?;

    let (raster, summary) = rasterize_layers(temperature, temps, land, gap, background, config);

    debug!(
        ocean = summary.ocean_points,
        temperature = summary.temperature_points,
        land = summary.land_points,
        "Rasterized point layers"
    );

    let svg = assemble_svg(&raster, background, to_hex(foreground).as_str(), config)?;
    std::fs::write(&config.output, svg).map_err(|e| PelagosError::Render {
        message: format!("Failed to write {}: {}", config.output.display(), e),
    })?;

    info!(
        output = %config.output.display(),
        duration_ms = start.elapsed().as_millis() as u64,
        "Composite image written"
    );
    Ok(summary)
}

/// Paint the three point layers back-to-front into a one-pixel-per-point
/// raster.
fn rasterize_layers(
    frame: &ResampledFrame,
    temps: &[Option<f32>],
    land: &[Option<bool>],
    gap: [u8; 3],
    background: [u8; 3],
    config: &RenderConfig,
) -> (RgbaImage, RenderSummary) {
    let r = frame.resolution as u32;
    let mut img: RgbaImage =
        ImageBuffer::from_pixel(r, r, Rgba([background[0], background[1], background[2], 255]));
    let colormap = Thermal;

    let mut summary = RenderSummary {
        ocean_points: 0,
        temperature_points: 0,
        land_points: 0,
    };

    // Row-major point order; plane y grows upward, image y downward
    let pixel = |i: usize| -> (u32, u32) {
        let col = (i % frame.resolution) as u32;
        let row = (i / frame.resolution) as u32;
        (col, r - 1 - row)
    };

    // Layer 1: ocean cells in the gap color
    for (i, v) in land.iter().enumerate() {
        if *v == Some(false) {
            let (px, py) = pixel(i);
            img.put_pixel(px, py, Rgba([gap[0], gap[1], gap[2], 255]));
            summary.ocean_points += 1;
        }
    }

    // Layer 2: temperature samples
    for (i, v) in temps.iter().enumerate() {
        if let Some(t) = v {
            let (px, py) = pixel(i);
            img.put_pixel(
                px,
                py,
                Rgba(colormap.map(*t, config.legend_min, config.legend_max)),
            );
            summary.temperature_points += 1;
        }
    }

    // Layer 3: land cells on top, in the background color
    for (i, v) in land.iter().enumerate() {
        if *v == Some(true) {
            let (px, py) = pixel(i);
            img.put_pixel(px, py, Rgba([background[0], background[1], background[2], 255]));
            summary.land_points += 1;
        }
    }

    (img, summary)
}

/// Build the composite SVG document around the rasterized layers
fn assemble_svg(
    raster: &RgbaImage,
    background: [u8; 3],
    foreground: &str,
    config: &RenderConfig,
) -> Result<String> {
    let mut png = Cursor::new(Vec::new());
    raster
        .write_to(&mut png, image::ImageOutputFormat::Png)
        .map_err(|e| PelagosError::Render {
            message: format!("Failed to encode raster layers: {}", e),
        })?;
    let encoded = BASE64.encode(png.into_inner());

    let width = MAP_SIZE + LEGEND_COLUMN;
    let height = MAP_SIZE;

    let legend = legend::svg_fragment(
        &Thermal,
        config.legend_min,
        config.legend_max,
        config.legend_tick_step,
        &config.legend_label,
        foreground,
        MAP_SIZE + 30.0,
        height * 0.1,
        18.0,
        height * 0.25,
    );

    Ok(format!(
        r##"<svg xmlns="http://www.w3.org/2000/svg" width="{w}" height="{h}" viewBox="0 0 {w} {h}">
<rect width="{w}" height="{h}" fill="{bg}"/>
<image x="0" y="0" width="{m}" height="{m}" image-rendering="pixelated" href="data:image/png;base64,{png}"/>
{legend}
</svg>
"##,
        w = width,
        h = height,
        m = MAP_SIZE,
        bg = to_hex(background),
        png = encoded,
        legend = legend,
    ))
}

fn parse_render_color(value: &str, param: &str) -> Result<[u8; 3]> {
    parse_color(value).ok_or_else(|| PelagosError::InvalidParameter {
        param: param.to_string(),
        message: format!("Unrecognized color: {}", value),
    })
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::config::RenderConfig;
    use std::path::Path;
    use tempfile::tempdir;

    fn frames_2x2() -> (ResampledFrame, ResampledFrame) {
        let base = ResampledFrame {
            resolution: 2,
            x: vec![-1.0, 1.0, -1.0, 1.0],
            y: vec![-1.0, -1.0, 1.0, 1.0],
            lon: vec![10.0, 20.0, 30.0, f64::NAN],
            lat: vec![1.0, 2.0, 3.0, f64::NAN],
            values: FrameValues::Temperature(vec![Some(5.0), None, Some(25.0), None]),
        };
        let mask = ResampledFrame {
            values: FrameValues::Mask(vec![Some(false), Some(false), Some(true), None]),
            ..base.clone()
        };
        (base, mask)
    }

    fn test_config(dir: &Path) -> RenderConfig {
        RenderConfig {
            output: dir.join("out.svg"),
            ..RenderConfig::default()
        }
    }

    #[test]
    fn test_compose_layer_counts() {
        let dir = tempdir().unwrap();
        let (sst, mask) = frames_2x2();
        let summary = compose(&sst, &mask, &test_config(dir.path())).unwrap();

        assert_eq!(summary.ocean_points, 2);
        assert_eq!(summary.temperature_points, 2);
        assert_eq!(summary.land_points, 1);
        assert!(dir.path().join("out.svg").exists());
    }

    #[test]
    fn test_compose_output_is_svg_with_embedded_raster() {
        let dir = tempdir().unwrap();
        let (sst, mask) = frames_2x2();
        compose(&sst, &mask, &test_config(dir.path())).unwrap();

        let svg = std::fs::read_to_string(dir.path().join("out.svg")).unwrap();
        assert!(svg.starts_with("<svg"));
        assert!(svg.contains("data:image/png;base64,"));
        assert!(svg.contains("SST [°C]"));
        // No axis decoration of any kind
        assert!(!svg.contains("axis"));
    }

    #[test]
    fn test_compose_rejects_mismatched_geometry() {
        let dir = tempdir().unwrap();
        let (sst, mut mask) = frames_2x2();
        mask.x[0] = 99.0;
        let err = compose(&sst, &mask, &test_config(dir.path())).unwrap_err();
        assert!(matches!(err, PelagosError::Render { .. }));
        assert!(!dir.path().join("out.svg").exists());
    }

    #[test]
    fn test_compose_rejects_swapped_kinds() {
        let dir = tempdir().unwrap();
        let (sst, mask) = frames_2x2();
        let err = compose(&mask, &sst, &test_config(dir.path())).unwrap_err();
        assert!(matches!(err, PelagosError::Render { .. }));
    }

    #[test]
    fn test_land_occludes_temperature() {
        let (mut sst, mask) = frames_2x2();
        // Give the land point (index 2) a temperature sample
        if let FrameValues::Temperature(v) = &mut sst.values {
            v[2] = Some(30.0);
        }
        let temps = match &sst.values {
            FrameValues::Temperature(v) => v.clone(),
            _ => unreachable!(),
        };
        let land = match &mask.values {
            FrameValues::Mask(v) => v.clone(),
            _ => unreachable!(),
        };
        let config = RenderConfig::default();
        let (img, _) = rasterize_layers(
            &sst,
            &temps,
            &land,
            [211, 211, 211],
            [255, 255, 255],
            &config,
        );

        // Point 2 is row 1, col 0 -> pixel (0, 0); land paints it white
        assert_eq!(img.get_pixel(0, 0), &Rgba([255, 255, 255, 255]));
    }

    #[test]
    fn test_all_sea_mask_draws_no_land() {
        let dir = tempdir().unwrap();
        let (sst, mut mask) = frames_2x2();
        mask.values = FrameValues::Mask(vec![Some(false), Some(false), Some(false), None]);
        let summary = compose(&sst, &mask, &test_config(dir.path())).unwrap();
        assert_eq!(summary.land_points, 0);
        assert_eq!(summary.ocean_points, 3);
    }
}
