//! Viewport navigation
//!
//! The [`ViewportController`] owns the visible sample-space rectangle of a
//! plot. Input (zoom, pan, drag) only ever moves the *target* rectangle; the
//! *current* rectangle, which the renderer reads every frame, eases towards
//! the target in [`ViewportController::tick`].
//!
//! # Anchoring
//!
//! While anchored, the right edge of both rectangles is pinned to the newest
//! sample, so the trace grows out of the right edge in real time. Panning back
//! in time releases the anchor; scrolling the current view past the last
//! sample re-engages it.
//!
//! # Bounds
//!
//! [`ViewportController::hold_bounds`] runs after every tick and navigation
//! step and silently repairs any state: coordinates are clamped to
//! `±VIEWPORT_BOUND`, the horizontal extent is kept at two samples or more,
//! and the value axis cannot wander more than `y_overlap` of the screen past
//! the channel's calibrated range. Nothing here returns an error.
//!
//! `VIEWPORT_BOUND` keeps indices inside what downstream 32-bit pixel math
//! can handle. At ~960 Hz that is roughly 12 days of samples; navigation past
//! that point is clipped.

use crate::channel::Channel;
use crate::types::SampleRect;
use serde::{Deserialize, Serialize};

/// Largest absolute sample-space coordinate a viewport may take
pub const VIEWPORT_BOUND: f64 = (u32::MAX / 4) as f64;

/// Frame rate the easing constants are tuned for
pub const NOMINAL_FRAME_RATE: f64 = 60.0;

/// Zoom ratios are limited to this to keep `zoom_out` finite
const MAX_ZOOM_RATIO: f64 = 0.99;

/// Target extents below this do not feed the easing ramp
const MIN_RAMP_EXTENT: f64 = 0.0001;

/// Scale of wheel deltas in [`ViewportController::zoom_at_pixel`]
const WHEEL_ZOOM_COEF: f64 = 0.001;

const DEFAULT_VIEW_SIZE: (f64, f64) = (640.0, 480.0);

/// Read-only view of the channel a viewport follows
pub trait SampleExtent {
    /// Number of samples recorded so far
    fn sample_count(&self) -> usize;
    /// Calibrated `(value_min, value_max)`
    fn value_bounds(&self) -> (f64, f64);
    /// Nominal sampling frequency in Hz
    fn frequency(&self) -> f64;
}

impl SampleExtent for Channel {
    fn sample_count(&self) -> usize {
        self.size()
    }

    fn value_bounds(&self) -> (f64, f64) {
        self.value_range()
    }

    fn frequency(&self) -> f64 {
        Channel::frequency(self)
    }
}

/// Tuning of viewport motion and limits
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct ViewportSettings {
    /// Fraction of the remaining distance covered per frame at full speed
    pub damping: f64,
    /// Growth of the easing coefficient per unit of relative distance
    pub ramp_rate: f64,
    /// Per-frame decay of the easing coefficient
    pub ramp_decay: f64,
    /// How far (fraction of the visible span) the value axis may leave the
    /// channel's calibrated range
    pub y_overlap: f64,
    /// Smallest visible horizontal extent in samples
    pub min_width: f64,
    /// Coordinate clamp
    pub bound: f64,
    /// Seconds of data visible before any zooming
    pub initial_seconds: f64,
}

impl Default for ViewportSettings {
    fn default() -> Self {
        Self {
            damping: 0.4,
            ramp_rate: 0.02,
            ramp_decay: 0.99,
            y_overlap: 0.30,
            min_width: 2.0,
            bound: VIEWPORT_BOUND,
            initial_seconds: 5.0,
        }
    }
}

/// Animated, self-correcting sample-space viewport
#[derive(Debug, Clone)]
pub struct ViewportController {
    /// Rectangle the renderer draws
    current: SampleRect,
    /// Rectangle input events move; `current` follows it
    target: SampleRect,
    anchored: bool,
    ax: f64,
    ay: f64,
    smooth_movement: bool,
    view_width: f64,
    view_height: f64,
    settings: ViewportSettings,
}

impl ViewportController {
    /// Create a viewport showing the last `initial_seconds` of `reference`,
    /// anchored to the newest sample
    pub fn new<E: SampleExtent + ?Sized>(reference: &E, settings: ViewportSettings) -> Self {
        let visible = (settings.initial_seconds * reference.frequency()).round();
        let (value_min, value_max) = reference.value_bounds();
        let rect = SampleRect::new(-visible, value_max, 0.0, value_min);

        Self {
            current: rect,
            target: rect,
            anchored: true,
            ax: 0.0,
            ay: 0.0,
            smooth_movement: true,
            view_width: DEFAULT_VIEW_SIZE.0,
            view_height: DEFAULT_VIEW_SIZE.1,
            settings,
        }
    }

    /// Rectangle to render this frame
    pub fn current(&self) -> SampleRect {
        self.current
    }

    /// Rectangle the view is moving towards
    pub fn target(&self) -> SampleRect {
        self.target
    }

    pub fn is_anchored(&self) -> bool {
        self.anchored
    }

    pub fn smooth_movement(&self) -> bool {
        self.smooth_movement
    }

    pub fn settings(&self) -> &ViewportSettings {
        &self.settings
    }

    /// Pixel size of the graph area
    pub fn view_size(&self) -> (f64, f64) {
        (self.view_width, self.view_height)
    }

    /// Set the pixel size of the graph area (borders and scrollbar excluded)
    pub fn set_view_size(&mut self, width: f64, height: f64) {
        let sane = |v: f64| if v.is_finite() && v >= 1.0 { v } else { 1.0 };
        self.view_width = sane(width);
        self.view_height = sane(height);
    }

    /// Toggle eased movement
    ///
    /// Disable while the user drags the plot so the view tracks the pointer
    /// 1:1, and re-enable on release.
    pub fn set_smooth_movement(&mut self, smooth: bool) {
        self.smooth_movement = smooth;
    }

    /// Advance the animation by one frame of `dt` seconds
    pub fn tick<E: SampleExtent + ?Sized>(&mut self, dt: f64, reference: &E) {
        let frames = if dt.is_finite() && dt > 0.0 {
            dt * NOMINAL_FRAME_RATE
        } else {
            1.0
        };
        let damping = 1.0 - (1.0 - self.settings.damping).powf(frames);

        let t = self.target;
        let c = self.current;

        // Ease in: the coefficient grows with the remaining relative distance
        // and decays every frame, so large jumps start slowly.
        let tw = (t.x2 - t.x1).abs();
        if tw > MIN_RAMP_EXTENT {
            self.ax += ((t.x1 - c.x1).abs() + (t.x2 - c.x2).abs()) / tw * self.settings.ramp_rate;
        }
        self.ax *= self.settings.ramp_decay;

        let th = (t.y2 - t.y1).abs();
        if th > MIN_RAMP_EXTENT {
            self.ay += ((t.y1 - c.y1).abs() + (t.y2 - c.y2).abs()) / th * self.settings.ramp_rate;
        }
        self.ay *= self.settings.ramp_decay;

        if !self.ax.is_finite() {
            self.ax = 0.0;
        }
        if !self.ay.is_finite() {
            self.ay = 0.0;
        }

        let (ax, ay) = if self.smooth_movement {
            (self.ax.min(1.0), self.ay.min(1.0))
        } else {
            (1.0, 1.0)
        };

        self.current.x1 += (t.x1 - c.x1) * damping * ax;
        self.current.y1 += (t.y1 - c.y1) * damping * ay;
        self.current.x2 += (t.x2 - c.x2) * damping * ax;
        self.current.y2 += (t.y2 - c.y2) * damping * ay;

        self.hold_bounds(reference);
    }

    /// Re-establish every viewport invariant against `reference`
    pub fn hold_bounds<E: SampleExtent + ?Sized>(&mut self, reference: &E) {
        let count = reference.sample_count() as f64;

        if self.current.x2 > count && !self.anchored {
            tracing::trace!("Viewport re-anchored at sample {}", count);
            self.anchored = true;
        }

        if self.anchored {
            let dx = self.current.x2 - count;
            let dxw = self.target.x2 - count;
            self.current.x1 -= dx;
            self.current.x2 = count;
            self.target.x1 -= dxw;
            self.target.x2 = count;
        }

        let bound = self.settings.bound;
        for rect in [&mut self.current, &mut self.target] {
            rect.x1 = clamp_to_bound(rect.x1, bound);
            rect.y1 = clamp_to_bound(rect.y1, bound);
            rect.x2 = clamp_to_bound(rect.x2, bound);
            rect.y2 = clamp_to_bound(rect.y2, bound);
        }

        // Less than two samples on screen is not drawable
        let min_width = self.settings.min_width;
        floor_width(&mut self.target, min_width, bound);
        floor_width(&mut self.current, min_width, bound);

        self.hold_vertical(reference.value_bounds());
    }

    /// Keep the target's value extent near `[value_min, value_max]`
    fn hold_vertical(&mut self, (value_min, value_max): (f64, f64)) {
        let overlap = self.settings.y_overlap;
        let t = &mut self.target;
        let span = t.y1 - t.y2;

        if self.current.is_inverted() {
            // y1 is the top edge and holds the smaller value
            let top = value_min + span * overlap;
            let bottom = value_max - span * overlap;
            if t.y1 < top {
                t.y2 -= t.y1 - top;
                t.y1 = top;
            }
            if t.y2 > bottom {
                t.y1 += bottom - t.y2;
                t.y2 = bottom;
            }
            if t.y1 < top {
                t.y1 = top;
            }
            if t.y2 > bottom {
                t.y2 = bottom;
            }
        } else {
            let bottom = value_min - span * overlap;
            let top = value_max + span * overlap;
            if t.y1 > top {
                t.y2 -= t.y1 - top;
                t.y1 = top;
            }
            if t.y2 < bottom {
                t.y1 += bottom - t.y2;
                t.y2 = bottom;
            }
            if t.y1 > top {
                t.y1 = top;
            }
            if t.y2 < bottom {
                t.y2 = bottom;
            }
        }

        let bound = self.settings.bound;
        t.y1 = clamp_to_bound(t.y1, bound);
        t.y2 = clamp_to_bound(t.y2, bound);
    }

    /// Shrink the target symmetrically: `x_ratio` of the samples and
    /// `y_ratio` of the value span disappear from view
    pub fn zoom_in<E: SampleExtent + ?Sized>(&mut self, x_ratio: f64, y_ratio: f64, reference: &E) {
        let n = self.target.width() * zoom_ratio(x_ratio);
        self.target.x1 += n / 2.0;
        self.target.x2 -= n / 2.0;
        let n = self.target.height() * zoom_ratio(y_ratio);
        self.target.y1 += n / 2.0;
        self.target.y2 -= n / 2.0;

        self.hold_bounds(reference);
    }

    /// Inverse of [`ViewportController::zoom_in`] with the same ratios
    ///
    /// The width is restored away from the bound. An anchored view keeps its
    /// right edge on the newest sample, and the value axis is limited as after
    /// any move.
    pub fn zoom_out<E: SampleExtent + ?Sized>(
        &mut self,
        x_ratio: f64,
        y_ratio: f64,
        reference: &E,
    ) {
        let n = self.target.width() * (1.0 / (1.0 - zoom_ratio(x_ratio)) - 1.0);
        self.target.x1 -= n / 2.0;
        self.target.x2 += n / 2.0;
        let n = self.target.height() * (1.0 / (1.0 - zoom_ratio(y_ratio)) - 1.0);
        self.target.y1 -= n / 2.0;
        self.target.y2 += n / 2.0;

        self.hold_bounds(reference);
    }

    /// Wheel zoom around a pointer position in graph-area pixels
    ///
    /// Positive deltas widen the view, negative deltas narrow it. The sample
    /// and value under the pointer stay in place.
    pub fn zoom_at_pixel<E: SampleExtent + ?Sized>(
        &mut self,
        x: f64,
        y: f64,
        dx: f64,
        dy: f64,
        reference: &E,
    ) {
        let d = unit_fraction(x / self.view_width);
        let n = self.target.width() * finite_or_zero(dx) * WHEEL_ZOOM_COEF;
        self.target.x1 -= d * n;
        self.target.x2 += (1.0 - d) * n;

        let d = unit_fraction(y / self.view_height);
        let n = self.target.height() * finite_or_zero(dy) * WHEEL_ZOOM_COEF;
        self.target.y1 += d * n;
        self.target.y2 -= (1.0 - d) * n;

        self.hold_bounds(reference);
    }

    /// Pan the view by a pixel displacement of the graph area
    ///
    /// Negative `dx` moves back in time and releases the anchor. Positive `dy`
    /// moves the view down the screen.
    pub fn move_by_pixels<E: SampleExtent + ?Sized>(&mut self, dx: f64, dy: f64, reference: &E) {
        let dwx = finite_or_zero(dx) / self.view_width * self.target.width();
        let dwy = finite_or_zero(dy) / self.view_height * self.target.height();
        self.target.shift_x(dwx);
        self.target.shift_y(dwy);
        if dwx < 0.0 {
            self.release_anchor();
        }
        self.hold_bounds(reference);
    }

    /// Pan the view by fractions of its own extent
    pub fn move_by_ratio<E: SampleExtent + ?Sized>(&mut self, dx: f64, dy: f64, reference: &E) {
        let d = self.target.width() * finite_or_zero(dx);
        self.target.shift_x(d);
        if d < 0.0 {
            self.release_anchor();
        }
        let d = self.target.height() * finite_or_zero(dy);
        self.target.shift_y(d);
        self.hold_bounds(reference);
    }

    /// Jump back to the newest sample and follow it
    pub fn follow_latest<E: SampleExtent + ?Sized>(&mut self, reference: &E) {
        self.anchored = true;
        self.hold_bounds(reference);
    }

    fn release_anchor(&mut self) {
        if self.anchored {
            tracing::trace!("Viewport anchor released");
        }
        self.anchored = false;
    }

    /// Horizontal pixel position of a sample index in the current view
    pub fn sample_to_pixel_x(&self, sample: f64) -> f64 {
        (sample - self.current.x1) / self.current.width() * self.view_width
    }

    /// Sample index under a horizontal pixel position
    pub fn pixel_to_sample_x(&self, px: f64) -> f64 {
        self.current.x1 + px / self.view_width * self.current.width()
    }

    /// Vertical pixel position (0 = top pixel row) of a calibrated value.
    /// Not finite when the current view has no vertical extent.
    pub fn value_to_pixel_y(&self, value: f64) -> f64 {
        self.pixel_rows() / self.current.height() * (value - self.current.y1)
    }

    /// Calibrated value at a vertical pixel position (0 = top pixel row)
    pub fn pixel_to_value_y(&self, py: f64) -> f64 {
        self.current.y1 + self.current.height() / self.pixel_rows() * py
    }

    /// Pixel centres span `height - 1` rows
    fn pixel_rows(&self) -> f64 {
        (self.view_height - 1.0).max(1.0)
    }

    /// Scrollbar thumb `(x1, x2)` in pixels for a bar `width_px` wide
    /// representing `sample_count` samples
    pub fn scrollbar(&self, width_px: f64, sample_count: usize) -> Option<(f64, f64)> {
        if sample_count == 0 || !(width_px > 0.0) {
            return None;
        }
        let n = sample_count as f64;
        let x1 = self.current.x1 / n * width_px;
        let mut x2 = self.current.x2 / n * width_px;
        if x2 - x1 < 1.0 {
            x2 = x1 + 1.0;
        }
        Some((x1.clamp(0.0, width_px), x2.clamp(0.0, width_px)))
    }
}

/// Clamp to `[-bound, bound]`; NaN collapses to `-bound`
#[inline]
fn clamp_to_bound(v: f64, bound: f64) -> f64 {
    v.max(-bound).min(bound)
}

fn floor_width(rect: &mut SampleRect, min_width: f64, bound: f64) {
    if rect.x2 - rect.x1 < min_width {
        rect.x2 = rect.x1 + min_width;
        if rect.x2 > bound {
            rect.x2 = bound;
            rect.x1 = bound - min_width;
        }
    }
}

#[inline]
fn finite_or_zero(v: f64) -> f64 {
    if v.is_finite() {
        v
    } else {
        0.0
    }
}

#[inline]
fn zoom_ratio(r: f64) -> f64 {
    finite_or_zero(r).clamp(0.0, MAX_ZOOM_RATIO)
}

#[inline]
fn unit_fraction(v: f64) -> f64 {
    finite_or_zero(v).clamp(0.0, 1.0)
}
