//! Colormap and color handling for the composite image.
//!
//! The temperature layer uses a perceptually-ordered thermal colormap,
//! bounded to the configured physical range. Run-level colors (gap,
//! background, foreground) accept hex notation or a small set of CSS names.

use colorgrad::Gradient;
use once_cell::sync::Lazy;

/// Trait for color mapping implementations
pub trait Colormap: Send + Sync {
    /// Map a normalized value (0.0 to 1.0) to an RGBA color
    fn map_normalized(&self, value: f32) -> [u8; 4];

    /// Map a value to an RGBA color given the data range.
    ///
    /// Values outside the range clamp to its ends, keeping the scale
    /// bounded to the physically expected range.
    fn map(&self, value: f32, min: f32, max: f32) -> [u8; 4] {
        let normalized = if max > min {
            ((value - min) / (max - min)).clamp(0.0, 1.0)
        } else {
            0.5
        };
        self.map_normalized(normalized)
    }

    /// Get the name of this colormap
    fn name(&self) -> &str;
}

/// Control points approximating the cmocean "thermal" colormap
const THERMAL_STOPS: &[&str] = &[
    "#042333", "#0e2e62", "#24388e", "#433e96", "#61459a", "#7f4c95", "#9d5386", "#bb5e70",
    "#d56e53", "#e98531", "#f2a924", "#e8fa5b",
];

static THERMAL_GRADIENT: Lazy<Gradient> = Lazy::new(|| {
    colorgrad::CustomGradient::new()
        .html_colors(THERMAL_STOPS)
        .build()
        .expect("thermal gradient stops are valid")
});

/// Thermal colormap - dark blue through magenta to yellow, perceptually
/// ordered, the conventional scale for sea temperature.
pub struct Thermal;

impl Colormap for Thermal {
    fn map_normalized(&self, value: f32) -> [u8; 4] {
        THERMAL_GRADIENT.at(value.clamp(0.0, 1.0) as f64).to_rgba8()
    }

    fn name(&self) -> &str {
        "thermal"
    }
}

/// Parse a color string to RGB.
///
/// Accepts `#rrggbb`, `#rgb` and the CSS names the configuration defaults
/// use. Returns `None` for anything else.
pub fn parse_color(value: &str) -> Option<[u8; 3]> {
    let v = value.trim().to_lowercase();

    if let Some(hex) = v.strip_prefix('#') {
        return match hex.len() {
            6 => {
                let r = u8::from_str_radix(&hex[0..2], 16).ok()?;
                let g = u8::from_str_radix(&hex[2..4], 16).ok()?;
                let b = u8::from_str_radix(&hex[4..6], 16).ok()?;
                Some([r, g, b])
            }
            3 => {
                let d = |i: usize| u8::from_str_radix(&hex[i..i + 1], 16).ok().map(|n| n * 17);
                Some([d(0)?, d(1)?, d(2)?])
            }
            _ => None,
        };
    }

    match v.as_str() {
        "white" => Some([255, 255, 255]),
        "black" => Some([0, 0, 0]),
        "lightgrey" | "lightgray" => Some([211, 211, 211]),
        "grey" | "gray" => Some([128, 128, 128]),
        "darkgrey" | "darkgray" => Some([169, 169, 169]),
        "charcoal" => Some([54, 69, 79]),
        _ => None,
    }
}

/// Format an RGB triple as a hex color for SVG attributes
pub fn to_hex(rgb: [u8; 3]) -> String {
    format!("#{:02x}{:02x}{:02x}", rgb[0], rgb[1], rgb[2])
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_thermal_endpoints() {
        let low = Thermal.map_normalized(0.0);
        let high = Thermal.map_normalized(1.0);
        // Cold end is dark blue, warm end is bright yellow
        assert!(low[2] > low[0]);
        assert!(high[0] > 200 && high[1] > 200);
        assert_eq!(low[3], 255);
        assert_eq!(high[3], 255);
    }

    #[test]
    fn test_map_is_bounded() {
        let below = Thermal.map(-10.0, 0.0, 30.0);
        let at_min = Thermal.map(0.0, 0.0, 30.0);
        assert_eq!(below, at_min);

        let above = Thermal.map(99.0, 0.0, 30.0);
        let at_max = Thermal.map(30.0, 0.0, 30.0);
        assert_eq!(above, at_max);
    }

    #[test]
    fn test_parse_color() {
        assert_eq!(parse_color("#ff0000"), Some([255, 0, 0]));
        assert_eq!(parse_color("#fff"), Some([255, 255, 255]));
        assert_eq!(parse_color("white"), Some([255, 255, 255]));
        assert_eq!(parse_color("lightgrey"), Some([211, 211, 211]));
        assert_eq!(parse_color("Black"), Some([0, 0, 0]));
        assert_eq!(parse_color("nope"), None);
        assert_eq!(parse_color("#12345"), None);
    }

    #[test]
    fn test_to_hex() {
        assert_eq!(to_hex([255, 0, 128]), "#ff0080");
    }
}
