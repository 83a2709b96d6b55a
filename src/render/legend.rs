//! Legend generation.
//!
//! The legend is drawn as vector SVG: a gradient bar sampled from the
//! colormap, tick marks at fixed physical-unit positions, and a unit label.

use super::colormap::Colormap;

/// Tick values from `min` to `max` inclusive at the given spacing.
///
/// A step that is not strictly positive yields no ticks; the loop below
/// would never terminate on it.
pub fn ticks(min: f32, max: f32, step: f32) -> Vec<f32> {
    if !(step > 0.0) {
        return Vec::new();
    }
    let mut out = Vec::new();
    let mut v = min;
    // tolerance so max itself survives accumulation error
    while v <= max + step * 1e-4 {
        out.push(v.min(max));
        v += step;
    }
    out
}

/// Render the legend as an SVG fragment.
///
/// The bar runs bottom (min) to top (max) at the given position and size;
/// tick labels sit to the right of the bar, the unit label above it.
#[allow(clippy::too_many_arguments)]
pub fn svg_fragment(
    colormap: &dyn Colormap,
    min: f32,
    max: f32,
    step: f32,
    label: &str,
    foreground: &str,
    x: f64,
    y: f64,
    width: f64,
    height: f64,
) -> String {
    let mut svg = String::new();

    // Gradient definition sampled from the colormap (SVG gradients
    // interpolate linearly between stops, so a moderate sample count is
    // enough to track the colormap)
    let samples = 16;
    svg.push_str(r##"<linearGradient id="legend-scale" x1="0" y1="1" x2="0" y2="0">"##);
    for i in 0..=samples {
        let t = i as f32 / samples as f32;
        let [r, g, b, _] = colormap.map_normalized(t);
        svg.push_str(&format!(
            r##"<stop offset="{:.4}" stop-color="#{:02x}{:02x}{:02x}"/>"##,
            t, r, g, b
        ));
    }
    svg.push_str("</linearGradient>");

    // Bar with a thin outline in the foreground color
    svg.push_str(&format!(
        r##"<rect x="{:.1}" y="{:.1}" width="{:.1}" height="{:.1}" fill="url(#legend-scale)" stroke="{}" stroke-width="0.5"/>"##,
        x, y, width, height, foreground
    ));

    // Ticks and labels
    for tick in ticks(min, max, step) {
        let frac = if max > min {
            (tick - min) / (max - min)
        } else {
            0.0
        };
        let ty = y + height * (1.0 - frac) as f64;
        svg.push_str(&format!(
            r##"<line x1="{:.1}" y1="{:.1}" x2="{:.1}" y2="{:.1}" stroke="{}" stroke-width="0.8"/>"##,
            x + width,
            ty,
            x + width + 4.0,
            ty,
            foreground
        ));
        svg.push_str(&format!(
            r##"<text x="{:.1}" y="{:.1}" font-size="11" fill="{}" dominant-baseline="middle">{}</text>"##,
            x + width + 7.0,
            ty,
            foreground,
            format_tick(tick)
        ));
    }

    // Unit label above the bar
    svg.push_str(&format!(
        r##"<text x="{:.1}" y="{:.1}" font-size="12" fill="{}">{}</text>"##,
        x,
        y - 8.0,
        foreground,
        label
    ));

    svg
}

/// Trim trailing zeros so ticks read "5" rather than "5.0"
fn format_tick(value: f32) -> String {
    if value == value.trunc() {
        format!("{}", value as i64)
    } else {
        format!("{:.1}", value)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::render::colormap::Thermal;

    #[test]
    fn test_ticks_span_range_inclusive() {
        assert_eq!(ticks(0.0, 30.0, 5.0), vec![0.0, 5.0, 10.0, 15.0, 20.0, 25.0, 30.0]);
    }

    #[test]
    fn test_ticks_with_uneven_step() {
        let t = ticks(0.0, 10.0, 4.0);
        assert_eq!(t, vec![0.0, 4.0, 8.0]);
    }

    #[test]
    fn test_ticks_single_point_range() {
        let t = ticks(2.0, 2.0, 1.0);
        assert_eq!(t, vec![2.0]);
    }

    #[test]
    fn test_ticks_nonpositive_step_yields_none() {
        assert!(ticks(0.0, 30.0, 0.0).is_empty());
        assert!(ticks(0.0, 30.0, -5.0).is_empty());
        assert!(ticks(0.0, 30.0, f32::NAN).is_empty());
    }

    #[test]
    fn test_fragment_contains_ticks_and_label() {
        let svg = svg_fragment(
            &Thermal,
            0.0,
            30.0,
            5.0,
            "SST [°C]",
            "#000000",
            800.0,
            50.0,
            20.0,
            150.0,
        );
        assert!(svg.contains("legend-scale"));
        assert!(svg.contains("SST [°C]"));
        assert!(svg.contains(">0<"));
        assert!(svg.contains(">30<"));
        // 7 tick lines for 0..30 step 5
        assert_eq!(svg.matches("<line").count(), 7);
    }

    #[test]
    fn test_format_tick() {
        assert_eq!(format_tick(5.0), "5");
        assert_eq!(format_tick(2.5), "2.5");
        assert_eq!(format_tick(-10.0), "-10");
    }
}
