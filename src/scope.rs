//! Scope orchestration
//!
//! A [`Scope`] is the non-visual half of an oscilloscope widget. It owns the
//! channels and the viewport, advances the viewport once per frame and
//! produces the per-channel [`Trace`]s and grid marks a renderer needs.
//!
//! The first channel is the reference: its sample indices span the shared
//! sample-space and it drives anchoring and value limits. Other channels are
//! rescaled by frequency ratio, which assumes all channels started sampling
//! at the same instant.

use crate::channel::Channel;
use crate::config::ScopeConfig;
use crate::error::{Result, ResultExt, ScopeError};
use crate::grid::{self, GridMark, MIN_TIME_DIVISION_PX, MIN_VALUE_DIVISION_PX};
use crate::ingest::SampleReceiver;
use crate::trace::{self, Trace};
use crate::viewport::{ViewportController, ViewportSettings};

/// Channels plus the viewport looking at them
#[derive(Debug, Clone)]
pub struct Scope {
    channels: Vec<Channel>,
    viewport: ViewportController,
}

impl Scope {
    /// Create a scope over `channels`; the first one is the reference
    pub fn new(channels: Vec<Channel>, settings: ViewportSettings) -> Result<Self> {
        let Some(reference) = channels.first() else {
            return Err(ScopeError::Configuration(
                "a scope needs at least one channel".to_string(),
            ));
        };
        let viewport = ViewportController::new(reference, settings);

        tracing::info!(
            "Scope created with {} channel(s), reference '{}' at {} Hz",
            channels.len(),
            reference.name(),
            reference.frequency()
        );

        Ok(Self { channels, viewport })
    }

    /// Build channels and viewport from a config
    pub fn from_config(config: &ScopeConfig) -> Result<Self> {
        config.validate()?;
        let channels = config
            .channels
            .iter()
            .map(|c| {
                Channel::new(c.clone()).with_context(|| format!("creating channel '{}'", c.name))
            })
            .collect::<Result<Vec<_>>>()?;
        Self::new(channels, config.viewport.clone())
    }

    pub fn channels(&self) -> &[Channel] {
        &self.channels
    }

    pub fn channel(&self, index: usize) -> Option<&Channel> {
        self.channels.get(index)
    }

    pub fn channel_mut(&mut self, index: usize) -> Option<&mut Channel> {
        self.channels.get_mut(index)
    }

    /// The channel whose sample-space the viewport uses
    pub fn reference(&self) -> &Channel {
        &self.channels[0]
    }

    pub fn viewport(&self) -> &ViewportController {
        &self.viewport
    }

    /// Append a raw value to channel `index`
    pub fn append(&mut self, index: usize, raw: f64, timestamp: Option<f64>) -> Result<()> {
        let len = self.channels.len();
        let channel = self
            .channels
            .get_mut(index)
            .ok_or(ScopeError::IndexOutOfRange { index, len })?;
        channel.append(raw, timestamp);
        Ok(())
    }

    /// Apply every sample queued in `receiver` so far
    ///
    /// Returns the number of samples applied. Samples for unknown channels
    /// are dropped.
    pub fn drain(&mut self, receiver: &SampleReceiver) -> usize {
        let mut applied = 0;
        for (index, sample) in receiver.pending() {
            match self.channels.get_mut(index) {
                Some(channel) => {
                    sample.apply(channel);
                    applied += 1;
                }
                None => tracing::warn!("Dropping sample for unknown channel {}", index),
            }
        }
        if applied > 0 {
            tracing::trace!("Drained {} sample(s)", applied);
        }
        applied
    }

    /// Advance the viewport animation by `dt` seconds
    pub fn tick(&mut self, dt: f64) {
        self.viewport.tick(dt, &self.channels[0]);
    }

    /// Geometry of every channel for the current view, `width_px` wide
    pub fn frame(&self, width_px: f64) -> Result<Vec<Trace>> {
        let view = self.viewport.current();
        let reference_frequency = self.channels[0].frequency();

        self.channels
            .iter()
            .map(|ch| {
                let start = ch.rescale_index(view.x1, reference_frequency);
                let end = ch.rescale_index(view.x2, reference_frequency);
                trace::build(ch, start, end, width_px)
                    .with_context(|| format!("building trace for '{}'", ch.name()))
            })
            .collect()
    }

    /// Horizontal grid lines in calibrated units of the reference channel
    pub fn value_grid(&self) -> Vec<GridMark> {
        let view = self.viewport.current();
        let (_, height) = self.viewport.view_size();
        match grid::step(view.height(), height - 1.0, MIN_VALUE_DIVISION_PX) {
            Some(step) => grid::lines(view.y1, view.y2, step),
            None => Vec::new(),
        }
    }

    /// Vertical grid lines in seconds since the first reference sample
    pub fn time_grid(&self) -> Vec<GridMark> {
        let view = self.viewport.current();
        let reference = &self.channels[0];
        let (width, _) = self.viewport.view_size();
        let t1 = reference.sample_to_time(view.x1);
        let t2 = reference.sample_to_time(view.x2);
        match grid::step(t2 - t1, width, MIN_TIME_DIVISION_PX) {
            Some(step) => grid::lines(t1, t2, step),
            None => Vec::new(),
        }
    }

    // Navigation, forwarded to the viewport with the reference channel

    pub fn set_view_size(&mut self, width: f64, height: f64) {
        self.viewport.set_view_size(width, height);
    }

    pub fn set_smooth_movement(&mut self, smooth: bool) {
        self.viewport.set_smooth_movement(smooth);
    }

    pub fn zoom_in(&mut self, x_ratio: f64, y_ratio: f64) {
        self.viewport.zoom_in(x_ratio, y_ratio, &self.channels[0]);
    }

    pub fn zoom_out(&mut self, x_ratio: f64, y_ratio: f64) {
        self.viewport.zoom_out(x_ratio, y_ratio, &self.channels[0]);
    }

    pub fn zoom_at_pixel(&mut self, x: f64, y: f64, dx: f64, dy: f64) {
        self.viewport.zoom_at_pixel(x, y, dx, dy, &self.channels[0]);
    }

    pub fn move_by_pixels(&mut self, dx: f64, dy: f64) {
        self.viewport.move_by_pixels(dx, dy, &self.channels[0]);
    }

    pub fn move_by_ratio(&mut self, dx: f64, dy: f64) {
        self.viewport.move_by_ratio(dx, dy, &self.channels[0]);
    }

    pub fn follow_latest(&mut self) {
        self.viewport.follow_latest(&self.channels[0]);
    }
}
