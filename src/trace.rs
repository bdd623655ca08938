//! Per-frame trace geometry
//!
//! A [`Trace`] is what one channel contributes to a frame: an average
//! polyline and optional min/max bars. X is in graph-area pixels, Y is the
//! calibrated value, so any backend that maps values to rows (see
//! [`ViewportController::value_to_pixel_y`]) can draw it.

use crate::channel::Channel;
use crate::error::Result;
use crate::viewport::ViewportController;

/// Vertical extent drawn at one pixel column
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct MinMaxBar {
    pub x: f64,
    pub min: f64,
    pub max: f64,
}

/// Drawable geometry of one channel for one frame
#[derive(Debug, Clone, Default, PartialEq)]
pub struct Trace {
    /// Legend name of the channel
    pub name: String,
    /// Mip level the geometry was taken from
    pub level: usize,
    /// `(pixel_x, value)` vertices of the average line
    pub avg: Vec<(f64, f64)>,
    /// Envelope bars
    pub minmax: Vec<MinMaxBar>,
    pub color: [u8; 4],
    pub minmax_color: [u8; 4],
    pub line_width: f32,
}

impl Trace {
    /// Nothing to draw
    pub fn is_empty(&self) -> bool {
        self.avg.is_empty() && self.minmax.is_empty()
    }

    /// Average line in screen pixels of `viewport`
    pub fn avg_pixels<'a>(
        &'a self,
        viewport: &'a ViewportController,
    ) -> impl Iterator<Item = (f64, f64)> + 'a {
        self.avg
            .iter()
            .map(move |&(x, v)| (x, viewport.value_to_pixel_y(v)))
    }
}

/// Build the geometry of `channel` for samples `start..end` drawn across
/// `resolution` pixels
///
/// Indices are in the channel's own sample-space. Fewer than two entries in
/// view produce an empty trace.
pub fn build(channel: &Channel, start: f64, end: f64, resolution: f64) -> Result<Trace> {
    let style = &channel.style;
    let slice = channel.query_range(start, end, resolution)?;

    let mut trace = Trace {
        name: channel.name().to_string(),
        level: slice.level,
        color: style.color,
        minmax_color: style.minmax_color,
        line_width: style.line_width,
        ..Default::default()
    };

    if !slice.is_drawable() {
        return Ok(trace);
    }

    if style.show_avg {
        trace.avg = slice
            .iter_pixels()
            .map(|(x, e)| (x, channel.raw_to_value(e.avg)))
            .collect();
    }

    if style.show_minmax {
        trace.minmax = slice
            .iter_pixels()
            .map(|(x, e)| {
                let a = channel.raw_to_value(e.min);
                let b = channel.raw_to_value(e.max);
                // a mapping may invert the raw axis
                MinMaxBar {
                    x,
                    min: a.min(b),
                    max: a.max(b),
                }
            })
            .collect();
    }

    Ok(trace)
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::channel::{ChannelConfig, ValueMapping};
    use crate::types::TraceStyle;
    use crate::viewport::ViewportSettings;

    fn ramp_channel(samples: usize, style: TraceStyle) -> Channel {
        let config = ChannelConfig::new("ramp", 100.0)
            .with_mapping(ValueMapping::new(0.0, 0.0, 5.0, 255.0))
            .with_style(style);
        let mut ch = Channel::new(config).unwrap();
        for i in 0..samples {
            ch.append((i % 256) as f64, Some(0.0));
        }
        ch
    }

    #[test]
    fn test_avg_line_spans_resolution() {
        let ch = ramp_channel(100, TraceStyle::default());
        let trace = build(&ch, 0.0, 100.0, 100.0).unwrap();
        assert_eq!(trace.level, 0);
        assert_eq!(trace.avg.len(), 100);
        assert!(trace.minmax.is_empty());
        assert!((trace.avg[0].0 - 0.5).abs() < 1e-9);
        assert!((trace.avg[99].0 - 99.5).abs() < 1e-9);
        assert!((trace.avg[51].1 - 51.0 * 5.0 / 255.0).abs() < 1e-9);
    }

    #[test]
    fn test_minmax_bars_follow_style() {
        let style = TraceStyle::default().with_minmax(true).with_avg(false);
        let ch = ramp_channel(4096, style);
        let trace = build(&ch, 0.0, 4096.0, 64.0).unwrap();
        assert!(trace.avg.is_empty());
        assert!(trace.level > 0);
        assert!(trace.minmax.len() <= 2 * 64 + 2);
        for bar in &trace.minmax {
            assert!(bar.min <= bar.max);
            assert!(bar.min >= 0.0 && bar.max <= 5.0);
        }
    }

    #[test]
    fn test_inverted_mapping_keeps_bar_order() {
        let style = TraceStyle::default().with_minmax(true);
        let config = ChannelConfig::new("inv", 10.0)
            .with_mapping(ValueMapping::new(0.0, 255.0, 5.0, 0.0))
            .with_style(style);
        let mut ch = Channel::new(config).unwrap();
        for v in [0.0, 255.0, 0.0, 255.0] {
            ch.append(v, Some(0.0));
        }
        let trace = build(&ch, 0.0, 4.0, 1.0).unwrap();
        assert!(trace.minmax.iter().all(|b| b.min <= b.max));
    }

    #[test]
    fn test_too_few_samples_is_empty() {
        let ch = ramp_channel(1, TraceStyle::default());
        let trace = build(&ch, 0.0, 10.0, 100.0).unwrap();
        assert!(trace.is_empty());
        assert_eq!(trace.name, "ramp");
    }

    #[test]
    fn test_bad_resolution_is_rejected() {
        let ch = ramp_channel(10, TraceStyle::default());
        assert!(build(&ch, 0.0, 10.0, 0.0).is_err());
    }

    #[test]
    fn test_avg_pixels_use_viewport_rows() {
        let ch = ramp_channel(600, TraceStyle::default());
        let mut vp = ViewportController::new(&ch, ViewportSettings::default());
        vp.set_view_size(500.0, 101.0);
        vp.tick(1.0 / 60.0, &ch);
        let c = vp.current();
        let trace = build(&ch, c.x1, c.x2, 500.0).unwrap();
        for (px, py) in trace.avg_pixels(&vp) {
            assert!((0.0..=500.0).contains(&px));
            assert!((0.0..=100.0 + 1e-9).contains(&py));
        }
    }
}
