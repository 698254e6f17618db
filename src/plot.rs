//! SVG step-plot rendering of the usage histogram
//!
//! The plot is built as markup text: a post-style step outline of node count
//! over time, optionally overlaid with shaded per-category regions driven by
//! the contiguous-span extraction, plus axes, ticks, and a legend.

use std::collections::BTreeMap;
use std::fmt::Write as _;

use crate::histogram::UsageHistogram;
use crate::spans;

/// Histogram data in plottable form: bucket midpoints (hours), node totals,
/// and per-bucket labels
#[derive(Debug, Clone, PartialEq)]
pub struct PlotSeries {
    pub times_hours: Vec<f64>,
    pub nodes: Vec<u64>,
    pub labels: Vec<Vec<String>>,
}

impl PlotSeries {
    pub fn from_histogram(histogram: &UsageHistogram) -> Self {
        Self {
            times_hours: histogram.midpoints_hours(),
            nodes: histogram.node_counts(),
            labels: histogram.bucket_labels(),
        }
    }

    /// Bucket width in hours, recovered from the midpoint spacing.
    fn step_hours(&self) -> f64 {
        match self.times_hours.as_slice() {
            [] => 0.0,
            [only] => only * 2.0,
            [first, second, ..] => second - first,
        }
    }
}

/// Explicit plot configuration passed into the renderer
#[derive(Debug, Clone)]
pub struct PlotStyle {
    pub width: u32,
    pub height: u32,
    /// Fill color per category
    pub colors: BTreeMap<String, String>,
    /// Colors cycled through for categories missing from `colors`
    pub fallback_palette: Vec<String>,
}

impl Default for PlotStyle {
    fn default() -> Self {
        let colors = [
            ("singleFrame", "#00bcd4"),
            ("mosaic", "#fdd835"),
            ("coadd", "#43a047"),
            ("multiband", "#1e88e5"),
            ("forced", "#8e24aa"),
            ("skyCorrection", "#d81b60"),
            ("unknown", "#e53935"),
        ]
        .iter()
        .map(|(k, v)| (k.to_string(), v.to_string()))
        .collect();

        Self {
            width: 640,
            height: 640,
            colors,
            fallback_palette: vec![
                "#fb8c00".to_string(),
                "#5e35b1".to_string(),
                "#00897b".to_string(),
                "#6d4c41".to_string(),
            ],
        }
    }
}

impl PlotStyle {
    /// Fill color for a category; unmapped categories cycle the fallback
    /// palette by position so reruns stay deterministic.
    fn color_for(&self, label: &str, position: usize) -> &str {
        if let Some(color) = self.colors.get(label) {
            return color;
        }
        if self.fallback_palette.is_empty() {
            return "#9e9e9e";
        }
        &self.fallback_palette[position % self.fallback_palette.len()]
    }
}

const MARGIN_LEFT: f64 = 62.0;
const MARGIN_RIGHT: f64 = 20.0;
const MARGIN_TOP: f64 = 42.0;
const MARGIN_BOTTOM: f64 = 52.0;
const TICK_COUNT: usize = 5;

/// Escape text content for SVG markup.
fn escape_text(text: &str) -> String {
    text.replace('&', "&amp;")
        .replace('<', "&lt;")
        .replace('>', "&gt;")
        .replace('"', "&quot;")
        .replace('\'', "&#39;")
}

/// Render the usage plot as an SVG document.
pub fn render_svg(series: &PlotSeries, style: &PlotStyle, title: &str, color: bool) -> String {
    let width = style.width as f64;
    let height = style.height as f64;
    let plot_w = width - MARGIN_LEFT - MARGIN_RIGHT;
    let plot_h = height - MARGIN_TOP - MARGIN_BOTTOM;

    let step = series.step_hours();
    let x_max = (series.times_hours.len() as f64 * step).max(f64::EPSILON);
    let y_max = nice_ceiling(series.nodes.iter().copied().max().unwrap_or(0));

    // Left edge of bucket k in pixels.
    let x_px = |k: usize| MARGIN_LEFT + (k as f64 * step) / x_max * plot_w;
    let y_px = |v: f64| MARGIN_TOP + plot_h - (v / y_max as f64) * plot_h;

    let mut svg = String::new();
    let _ = writeln!(
        svg,
        r#"<svg xmlns="http://www.w3.org/2000/svg" width="{}" height="{}" viewBox="0 0 {} {}">"#,
        style.width, style.height, style.width, style.height
    );
    let _ = writeln!(
        svg,
        r#"  <rect width="{}" height="{}" fill="white"/>"#,
        style.width, style.height
    );

    draw_grid(&mut svg, plot_w, plot_h);
    draw_axes(&mut svg, x_max, y_max, plot_w, plot_h);

    if !title.is_empty() {
        let _ = writeln!(
            svg,
            r#"  <text x="{:.1}" y="24" text-anchor="middle" font-size="18" font-family="sans-serif">{}</text>"#,
            MARGIN_LEFT + plot_w / 2.0,
            escape_text(title)
        );
    }

    if series.nodes.is_empty() {
        svg.push_str("</svg>\n");
        return svg;
    }

    if color {
        // Grey outline with shaded category spans under it.
        let span_map = spans::label_spans(&series.labels);
        for (position, (label, label_spans)) in span_map.iter().enumerate() {
            let fill = style.color_for(label, position);
            for &(first, last) in label_spans {
                let points = area_points(series, first, last, &x_px, &y_px);
                let _ = writeln!(
                    svg,
                    r#"  <polygon points="{points}" fill="{fill}" fill-opacity="0.5"/>"#
                );
            }
        }
        let outline = outline_points(series, &x_px, &y_px);
        let _ = writeln!(
            svg,
            r##"  <polyline points="{outline}" fill="none" stroke="#444444" stroke-opacity="0.4" stroke-width="1.5"/>"##
        );
        draw_legend(&mut svg, style, &span_map, width);
    } else {
        let points = area_points(series, 0, series.nodes.len() - 1, &x_px, &y_px);
        let _ = writeln!(
            svg,
            r##"  <polygon points="{points}" fill="#1e88e5" fill-opacity="0.25"/>"##
        );
        let outline = outline_points(series, &x_px, &y_px);
        let _ = writeln!(
            svg,
            r##"  <polyline points="{outline}" fill="none" stroke="#1e88e5" stroke-width="1.5"/>"##
        );
    }

    svg.push_str("</svg>\n");
    svg
}

/// Round a node count up to a tick-friendly axis maximum.
fn nice_ceiling(max_nodes: u64) -> u64 {
    let max_nodes = max_nodes.max(1);
    max_nodes.div_ceil(TICK_COUNT as u64) * TICK_COUNT as u64
}

/// Post-step polyline over the buckets: node count held across each bucket.
fn outline_points(
    series: &PlotSeries,
    x_px: &impl Fn(usize) -> f64,
    y_px: &impl Fn(f64) -> f64,
) -> String {
    let mut points = String::new();
    for (k, &nodes) in series.nodes.iter().enumerate() {
        let y = y_px(nodes as f64);
        let _ = write!(points, "{:.1},{:.1} {:.1},{:.1} ", x_px(k), y, x_px(k + 1), y);
    }
    points.trim_end().to_string()
}

/// Closed polygon under the step curve across buckets [first, last],
/// dropped to the baseline at both ends.
fn area_points(
    series: &PlotSeries,
    first: usize,
    last: usize,
    x_px: &impl Fn(usize) -> f64,
    y_px: &impl Fn(f64) -> f64,
) -> String {
    let mut points = String::new();
    let baseline = y_px(0.0);
    let _ = write!(points, "{:.1},{:.1} ", x_px(first), baseline);
    for k in first..=last {
        let y = y_px(series.nodes[k] as f64);
        let _ = write!(points, "{:.1},{:.1} {:.1},{:.1} ", x_px(k), y, x_px(k + 1), y);
    }
    let _ = write!(points, "{:.1},{:.1}", x_px(last + 1), baseline);
    points
}

fn draw_grid(svg: &mut String, plot_w: f64, plot_h: f64) {
    for i in 1..TICK_COUNT {
        let frac = i as f64 / TICK_COUNT as f64;
        let x = MARGIN_LEFT + frac * plot_w;
        let y = MARGIN_TOP + plot_h - frac * plot_h;
        let _ = writeln!(
            svg,
            r##"  <line x1="{x:.1}" y1="{MARGIN_TOP}" x2="{x:.1}" y2="{:.1}" stroke="#dddddd" stroke-dasharray="2,4"/>"##,
            MARGIN_TOP + plot_h
        );
        let _ = writeln!(
            svg,
            r##"  <line x1="{MARGIN_LEFT}" y1="{y:.1}" x2="{:.1}" y2="{y:.1}" stroke="#dddddd" stroke-dasharray="2,4"/>"##,
            MARGIN_LEFT + plot_w
        );
    }
}

fn draw_axes(svg: &mut String, x_max: f64, y_max: u64, plot_w: f64, plot_h: f64) {
    let x0 = MARGIN_LEFT;
    let y0 = MARGIN_TOP + plot_h;
    let _ = writeln!(
        svg,
        r#"  <line x1="{x0}" y1="{MARGIN_TOP}" x2="{x0}" y2="{y0}" stroke="black"/>"#
    );
    let _ = writeln!(
        svg,
        r#"  <line x1="{x0}" y1="{y0}" x2="{:.1}" y2="{y0}" stroke="black"/>"#,
        x0 + plot_w
    );

    for i in 0..=TICK_COUNT {
        let frac = i as f64 / TICK_COUNT as f64;
        let x = x0 + frac * plot_w;
        let y = y0 - frac * plot_h;
        let _ = writeln!(
            svg,
            r#"  <line x1="{x:.1}" y1="{y0}" x2="{x:.1}" y2="{:.1}" stroke="black"/>"#,
            y0 + 5.0
        );
        let _ = writeln!(
            svg,
            r#"  <text x="{x:.1}" y="{:.1}" text-anchor="middle" font-size="12" font-family="sans-serif">{:.1}</text>"#,
            y0 + 20.0,
            frac * x_max
        );
        let _ = writeln!(
            svg,
            r#"  <line x1="{:.1}" y1="{y:.1}" x2="{x0}" y2="{y:.1}" stroke="black"/>"#,
            x0 - 5.0
        );
        let _ = writeln!(
            svg,
            r#"  <text x="{:.1}" y="{:.1}" text-anchor="end" font-size="12" font-family="sans-serif">{}</text>"#,
            x0 - 9.0,
            y + 4.0,
            (frac * y_max as f64).round() as u64
        );
    }

    let _ = writeln!(
        svg,
        r#"  <text x="{:.1}" y="{:.1}" text-anchor="middle" font-size="14" font-family="sans-serif">time [h]</text>"#,
        x0 + plot_w / 2.0,
        y0 + 42.0
    );
    let _ = writeln!(
        svg,
        r#"  <text x="16" y="{:.1}" text-anchor="middle" font-size="14" font-family="sans-serif" transform="rotate(-90 16 {:.1})">N nodes</text>"#,
        MARGIN_TOP + plot_h / 2.0,
        MARGIN_TOP + plot_h / 2.0
    );
}

fn draw_legend(
    svg: &mut String,
    style: &PlotStyle,
    span_map: &BTreeMap<String, Vec<(usize, usize)>>,
    width: f64,
) {
    let x = width - MARGIN_RIGHT - 150.0;
    let mut y = MARGIN_TOP + 8.0;
    let _ = writeln!(
        svg,
        r#"  <text x="{x:.1}" y="{y:.1}" font-size="12" font-weight="bold" font-family="sans-serif">Code Name</text>"#
    );
    y += 8.0;
    for (position, label) in span_map.keys().enumerate() {
        let fill = style.color_for(label, position);
        let _ = writeln!(
            svg,
            r##"  <rect x="{x:.1}" y="{y:.1}" width="12" height="12" fill="{fill}" fill-opacity="0.5" stroke="#444444"/>"##
        );
        let _ = writeln!(
            svg,
            r#"  <text x="{:.1}" y="{:.1}" font-size="12" font-family="sans-serif">{}</text>"#,
            x + 18.0,
            y + 10.0,
            escape_text(label)
        );
        y += 18.0;
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn series() -> PlotSeries {
        PlotSeries {
            times_hours: vec![0.25, 0.75, 1.25, 1.75],
            nodes: vec![2, 5, 5, 1],
            labels: vec![
                vec!["coadd".to_string()],
                vec!["coadd".to_string(), "mosaic".to_string()],
                vec!["mosaic".to_string()],
                vec![],
            ],
        }
    }

    #[test]
    fn test_step_hours_from_midpoints() {
        assert_eq!(series().step_hours(), 0.5);
        let single = PlotSeries {
            times_hours: vec![0.25],
            nodes: vec![1],
            labels: vec![vec![]],
        };
        assert_eq!(single.step_hours(), 0.5);
    }

    #[test]
    fn test_render_svg_monochrome() {
        let svg = render_svg(&series(), &PlotStyle::default(), "", false);
        assert!(svg.starts_with("<svg"));
        assert!(svg.ends_with("</svg>\n"));
        assert!(svg.contains("<polyline"));
        assert!(svg.contains("<polygon"));
        assert!(svg.contains("time [h]"));
        // No legend without color coding.
        assert!(!svg.contains("Code Name"));
    }

    #[test]
    fn test_render_svg_color_has_legend_and_spans() {
        let svg = render_svg(&series(), &PlotStyle::default(), "", true);
        assert!(svg.contains("Code Name"));
        assert!(svg.contains(">coadd</text>"));
        assert!(svg.contains(">mosaic</text>"));
        // coadd fill color from the default style
        assert!(svg.contains("#43a047"));
    }

    #[test]
    fn test_render_svg_title_escaped() {
        let svg = render_svg(&series(), &PlotStyle::default(), "w<2023> & co", false);
        assert!(svg.contains("w&lt;2023&gt; &amp; co"));
    }

    #[test]
    fn test_color_for_falls_back_deterministically() {
        let style = PlotStyle::default();
        let first = style.color_for("neverSeen", 0);
        let second = style.color_for("neverSeen", 0);
        assert_eq!(first, second);
        assert_ne!(style.color_for("a", 0), style.color_for("b", 1));
    }

    #[test]
    fn test_nice_ceiling() {
        assert_eq!(nice_ceiling(0), 5);
        assert_eq!(nice_ceiling(4), 5);
        assert_eq!(nice_ceiling(5), 5);
        assert_eq!(nice_ceiling(23), 25);
    }

    #[test]
    fn test_empty_series_renders_frame_only() {
        let empty = PlotSeries {
            times_hours: vec![],
            nodes: vec![],
            labels: vec![],
        };
        let svg = render_svg(&empty, &PlotStyle::default(), "t", false);
        assert!(svg.contains("</svg>"));
        assert!(!svg.contains("<polygon"));
    }
}
