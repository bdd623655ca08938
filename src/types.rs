//! Core data types for mipscope
//!
//! This module contains the small value types shared by the buffer, channel
//! and viewport modules.
//!
//! # Main Types
//!
//! - [`MipEntry`] - One `(min, max, avg)` aggregate in a mip level
//! - [`TraceStyle`] - Per-channel render flags (colors, line width, envelope/average)
//! - [`SampleRect`] - A rectangle in sample-space (x = sample index, y = calibrated value)

use serde::{Deserialize, Serialize};

/// One aggregate entry of a mip level
///
/// At level 0 an entry describes a single appended sample. Each coarser level
/// combines two neighbouring entries: the extremes are kept exactly while the
/// average is the mean of the two averages ("average of averages").
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct MipEntry {
    /// Smallest raw value covered by this entry
    pub min: f64,
    /// Largest raw value covered by this entry
    pub max: f64,
    /// Pairwise-halved average of the covered raw values
    pub avg: f64,
}

impl MipEntry {
    /// Create an entry from explicit min, max and average
    pub fn new(min: f64, max: f64, avg: f64) -> Self {
        Self { min, max, avg }
    }

    /// Create an entry for a single raw value
    pub fn splat(value: f64) -> Self {
        Self::new(value, value, value)
    }

    /// Combine two neighbouring entries into their parent entry
    #[inline]
    pub fn combine(a: &MipEntry, b: &MipEntry) -> Self {
        Self {
            min: a.min.min(b.min),
            max: a.max.max(b.max),
            avg: (a.avg + b.avg) / 2.0,
        }
    }
}

/// Visual settings for drawing a channel
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct TraceStyle {
    /// Color of the average line (RGBA)
    #[serde(default = "default_avg_color")]
    pub color: [u8; 4],
    /// Color of the min/max envelope (RGBA)
    #[serde(default = "default_minmax_color")]
    pub minmax_color: [u8; 4],
    /// Whether to draw the min/max envelope
    #[serde(default)]
    pub show_minmax: bool,
    /// Whether to draw the average line
    #[serde(default = "default_true")]
    pub show_avg: bool,
    /// Line width in pixels
    #[serde(default = "default_line_width")]
    pub line_width: f32,
}

fn default_avg_color() -> [u8; 4] {
    rgba_from_unit(1.0, 0.5, 0.5, 1.0)
}

fn default_minmax_color() -> [u8; 4] {
    rgba_from_unit(0.4, 0.1, 0.1, 1.0)
}

fn default_true() -> bool {
    true
}

fn default_line_width() -> f32 {
    1.0
}

impl Default for TraceStyle {
    fn default() -> Self {
        Self {
            color: default_avg_color(),
            minmax_color: default_minmax_color(),
            show_minmax: false,
            show_avg: true,
            line_width: default_line_width(),
        }
    }
}

impl TraceStyle {
    /// Set the average line color
    pub fn with_color(mut self, color: [u8; 4]) -> Self {
        self.color = color;
        self
    }

    /// Set whether the min/max envelope is drawn
    pub fn with_minmax(mut self, show: bool) -> Self {
        self.show_minmax = show;
        self
    }

    /// Set whether the average line is drawn
    pub fn with_avg(mut self, show: bool) -> Self {
        self.show_avg = show;
        self
    }

    /// Set the line width
    pub fn with_line_width(mut self, width: f32) -> Self {
        self.line_width = width;
        self
    }
}

/// Axis-aligned rectangle in sample-space
///
/// `x1`/`x2` are sample indices (left/right edge), `y1`/`y2` are calibrated
/// values at the top/bottom screen edge. `y1 > y2` is the usual orientation
/// (larger values at the top); `y1 < y2` describes an inverted value axis.
#[derive(Debug, Clone, Copy, PartialEq, Default, Serialize, Deserialize)]
pub struct SampleRect {
    pub x1: f64,
    pub y1: f64,
    pub x2: f64,
    pub y2: f64,
}

impl SampleRect {
    pub fn new(x1: f64, y1: f64, x2: f64, y2: f64) -> Self {
        Self { x1, y1, x2, y2 }
    }

    /// Horizontal extent in samples
    #[inline]
    pub fn width(&self) -> f64 {
        self.x2 - self.x1
    }

    /// Signed vertical extent (`y2 - y1`)
    #[inline]
    pub fn height(&self) -> f64 {
        self.y2 - self.y1
    }

    /// True when the value axis grows downwards on screen
    #[inline]
    pub fn is_inverted(&self) -> bool {
        self.y1 < self.y2
    }

    /// Translate horizontally
    #[inline]
    pub fn shift_x(&mut self, dx: f64) {
        self.x1 += dx;
        self.x2 += dx;
    }

    /// Translate vertically
    #[inline]
    pub fn shift_y(&mut self, dy: f64) {
        self.y1 += dy;
        self.y2 += dy;
    }

    /// All four scalars are finite
    pub fn is_finite(&self) -> bool {
        self.x1.is_finite() && self.y1.is_finite() && self.x2.is_finite() && self.y2.is_finite()
    }
}

/// Convert unit-range color components into RGBA bytes
pub fn rgba_from_unit(r: f32, g: f32, b: f32, a: f32) -> [u8; 4] {
    let to_u8 = |c: f32| (c.clamp(0.0, 1.0) * 255.0).round() as u8;
    [to_u8(r), to_u8(g), to_u8(b), to_u8(a)]
}

/// Generate a distinct color based on a channel index
///
/// Uses the golden ratio to spread hues evenly across the color wheel.
pub fn generate_color(index: u32) -> [u8; 4] {
    const GOLDEN_RATIO: f32 = 0.618033988749895;

    let hue = ((index as f32 * GOLDEN_RATIO) % 1.0) * 360.0;
    let (r, g, b) = hsv_to_rgb(hue, 0.7, 0.85);
    [r, g, b, 255]
}

/// Convert HSV (hue 0-360, saturation 0-1, value 0-1) to RGB (u8, u8, u8)
fn hsv_to_rgb(hue: f32, saturation: f32, value: f32) -> (u8, u8, u8) {
    let c = value * saturation;
    let x = c * (1.0 - ((hue / 60.0) % 2.0 - 1.0).abs());
    let m = value - c;

    let (r, g, b) = match (hue / 60.0) as u32 {
        0 => (c, x, 0.0),
        1 => (x, c, 0.0),
        2 => (0.0, c, x),
        3 => (0.0, x, c),
        4 => (x, 0.0, c),
        _ => (c, 0.0, x),
    };

    (
        ((r + m) * 255.0) as u8,
        ((g + m) * 255.0) as u8,
        ((b + m) * 255.0) as u8,
    )
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_combine_keeps_extremes() {
        let a = MipEntry::new(1.0, 4.0, 2.0);
        let b = MipEntry::new(-3.0, 2.0, 0.0);
        let c = MipEntry::combine(&a, &b);
        assert_eq!(c, MipEntry::new(-3.0, 4.0, 1.0));
    }

    #[test]
    fn test_default_style_matches_legacy_colors() {
        let style = TraceStyle::default();
        assert_eq!(style.color, [255, 128, 128, 255]);
        assert_eq!(style.minmax_color, [102, 26, 26, 255]);
        assert!(style.show_avg);
        assert!(!style.show_minmax);
    }

    #[test]
    fn test_rect_geometry() {
        let mut r = SampleRect::new(-500.0, 5.0, 0.0, 0.0);
        assert_eq!(r.width(), 500.0);
        assert_eq!(r.height(), -5.0);
        assert!(!r.is_inverted());
        r.shift_x(100.0);
        assert_eq!((r.x1, r.x2), (-400.0, 100.0));
    }

    #[test]
    fn test_generated_colors_are_opaque_and_distinct() {
        let a = generate_color(1);
        let b = generate_color(2);
        assert_eq!(a[3], 255);
        assert_ne!(a, b);
    }
}
