//! Grid line placement and time labels
//!
//! Grid steps are powers of two of the axis unit (volts, seconds), picked so
//! that neighbouring lines are at least `min_division_px` pixels apart.

/// Default minimum distance between horizontal (value) grid lines
pub const MIN_VALUE_DIVISION_PX: f64 = 50.0;

/// Default minimum distance between vertical (time) grid lines
pub const MIN_TIME_DIVISION_PX: f64 = 100.0;

/// A grid line at a position in axis units
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct GridMark {
    /// Position in axis units (volts, seconds, ...)
    pub value: f64,
    /// Distance to the neighbouring marks
    pub step_size: f64,
}

/// Power-of-two step for an axis spanning `span` units over `pixels`
///
/// Returns `None` for spans or pixel counts that cannot produce lines.
pub fn step(span: f64, pixels: f64, min_division_px: f64) -> Option<f64> {
    let span = span.abs();
    if !(span > 1e-6 && span.is_finite() && pixels > 0.0 && min_division_px > 0.0) {
        return None;
    }
    let units_per_division = span / pixels * min_division_px;
    let s = 2f64.powf(units_per_division.log2().ceil());
    (s.is_finite() && s > 0.0).then_some(s)
}

/// Grid marks strictly inside `(lo, hi)` on multiples of `step`
///
/// Bounds may be given in either order.
pub fn lines(lo: f64, hi: f64, step: f64) -> Vec<GridMark> {
    let (lo, hi) = if hi < lo { (hi, lo) } else { (lo, hi) };
    if !(step > 0.0 && lo.is_finite() && hi.is_finite()) {
        return Vec::new();
    }

    let first = (lo / step).floor() + 1.0;
    let last = (hi / step).ceil() - 1.0;
    if last < first {
        return Vec::new();
    }

    // A step far smaller than the span would mean millions of lines
    if last - first > 10_000.0 {
        tracing::debug!("Grid step {} too fine for span {}..{}", step, lo, hi);
        return Vec::new();
    }

    let count = (last - first) as usize + 1;
    (0..count)
        .map(|k| GridMark {
            value: (first + k as f64) * step,
            step_size: step,
        })
        .collect()
}

/// Format a duration as a compact grid label
///
/// `"1.50s"`, `"2m3.00s"`, `"1h0m0.00s"`, `"1d2h3m4.00s"`; negative
/// durations get a leading `-`.
pub fn format_time(seconds: f64) -> String {
    let s = seconds.abs();
    let days = (s / 86_400.0).floor();
    let hours = (s / 3_600.0).floor() % 24.0;
    let minutes = (s / 60.0).floor() % 60.0;
    let secs = s % 60.0;

    let t = if s < 60.0 {
        format!("{:.2}s", s)
    } else if s < 3_600.0 {
        format!("{}m{:.2}s", minutes, secs)
    } else if s < 86_400.0 {
        format!("{}h{}m{:.2}s", hours, minutes, secs)
    } else {
        format!("{}d{}h{}m{:.2}s", days, hours, minutes, secs)
    };

    if seconds < 0.0 {
        format!("-{}", t)
    } else {
        t
    }
}
