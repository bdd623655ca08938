//! Sample channels
//!
//! A [`Channel`] wraps one [`MipBuffer`] with everything needed to turn its
//! raw samples into something a plot can label: the sampling frequency, an
//! affine calibration from raw values to physical units, a legend name and
//! unit, render flags, and a sparse wall-clock index.
//!
//! # Calibration
//!
//! Samples are stored raw. The [`ValueMapping`] is applied when values are
//! queried or rendered, so recalibrating with [`Channel::set_mapping`] never
//! rewrites history.
//!
//! # Timestamps
//!
//! Every `floor(frequency)` appended samples (one second of *sample* time) the
//! channel records a wall-clock timestamp. [`Channel::sample_to_time_utc`]
//! interpolates between these stamps, which tolerates jitter of the real
//! sampling clock while keeping the index tiny.
//!
//! # Multiple channels
//!
//! Channels drawn into the same plot are assumed to be phase-locked: sample 0
//! of every channel marks the same instant, and the first channel is the
//! fastest one. This is a caller obligation and is not checked.

use crate::error::{Result, ScopeError};
use crate::mip::{MipBuffer, MipSlice};
use crate::types::{MipEntry, TraceStyle};
use serde::{Deserialize, Serialize};

/// Affine mapping between raw sample values and physical values
///
/// For example an 8-bit ADC measuring 0..5 V maps raw 0 to 0 V and raw 255
/// to 5 V. A mapping with `value_max_raw < value_min_raw` is allowed and
/// inverts the raw axis.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct ValueMapping {
    pub value_min: f64,
    pub value_min_raw: f64,
    pub value_max: f64,
    pub value_max_raw: f64,
}

impl Default for ValueMapping {
    fn default() -> Self {
        Self {
            value_min: 0.0,
            value_min_raw: 0.0,
            value_max: 5.0,
            value_max_raw: 255.0,
        }
    }
}

impl ValueMapping {
    pub fn new(value_min: f64, value_min_raw: f64, value_max: f64, value_max_raw: f64) -> Self {
        Self {
            value_min,
            value_min_raw,
            value_max,
            value_max_raw,
        }
    }

    /// Validate and normalize the mapping
    ///
    /// Rejects `value_min > value_max`. Equal endpoints would divide by zero,
    /// so a degenerate maximum (physical or raw) is bumped by one.
    pub fn normalized(self) -> Result<Self> {
        // NaN fails the comparison and is rejected as well
        if !(self.value_min <= self.value_max) {
            return Err(ScopeError::InvalidMapping {
                value_min: self.value_min,
                value_max: self.value_max,
            });
        }

        let mut mapping = self;
        if mapping.value_min == mapping.value_max {
            tracing::warn!(
                "Degenerate value range {}..{}, widening by 1",
                mapping.value_min,
                mapping.value_max
            );
            mapping.value_max += 1.0;
        }
        if mapping.value_min_raw == mapping.value_max_raw {
            tracing::warn!(
                "Degenerate raw range {}..{}, widening by 1",
                mapping.value_min_raw,
                mapping.value_max_raw
            );
            mapping.value_max_raw += 1.0;
        }
        Ok(mapping)
    }

    /// Physical units per raw unit
    #[inline]
    pub fn scale(&self) -> f64 {
        (self.value_max - self.value_min) / (self.value_max_raw - self.value_min_raw)
    }
}

/// Immutable description of a channel, validated by [`Channel::new`]
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ChannelConfig {
    /// Legend name
    #[serde(default = "default_name")]
    pub name: String,
    /// Unit label (e.g. "V", "mA")
    #[serde(default = "default_unit")]
    pub unit: String,
    /// Nominal sampling frequency in Hz
    pub frequency: f64,
    /// Raw-to-physical calibration
    #[serde(default)]
    pub mapping: ValueMapping,
    /// Render flags
    #[serde(default)]
    pub style: TraceStyle,
}

fn default_name() -> String {
    String::from("graph")
}

fn default_unit() -> String {
    String::from("V")
}

impl ChannelConfig {
    /// Create a config with default mapping and style
    pub fn new(name: impl Into<String>, frequency: f64) -> Self {
        Self {
            name: name.into(),
            unit: default_unit(),
            frequency,
            mapping: ValueMapping::default(),
            style: TraceStyle::default(),
        }
    }

    /// Set the unit label
    pub fn with_unit(mut self, unit: impl Into<String>) -> Self {
        self.unit = unit.into();
        self
    }

    /// Set the calibration mapping
    pub fn with_mapping(mut self, mapping: ValueMapping) -> Self {
        self.mapping = mapping;
        self
    }

    /// Set the render style
    pub fn with_style(mut self, style: TraceStyle) -> Self {
        self.style = style;
        self
    }

    /// Check the parameters that cannot be auto-corrected
    pub fn validate(&self) -> Result<()> {
        if !(self.frequency.is_finite() && self.frequency > 0.0) {
            return Err(ScopeError::Configuration(format!(
                "channel '{}': frequency must be a positive number, got {}",
                self.name, self.frequency
            )));
        }
        self.mapping.normalized().map(|_| ())
    }
}

/// Current wall-clock time in seconds since the Unix epoch
fn now_utc_seconds() -> f64 {
    chrono::Utc::now().timestamp_micros() as f64 / 1e6
}

/// One stream of samples with calibration and timing metadata
#[derive(Debug, Clone)]
pub struct Channel {
    name: String,
    unit: String,
    frequency: f64,
    mapping: ValueMapping,
    /// Physical units per raw unit, cached from `mapping`
    value_scale: f64,
    /// Render flags, freely adjustable by the owner
    pub style: TraceStyle,
    data: MipBuffer,
    /// One wall-clock stamp per `samples_per_stamp` samples
    timestamps: Vec<f64>,
    samples_per_stamp: usize,
}

impl Channel {
    /// Create a channel from a validated config
    pub fn new(config: ChannelConfig) -> Result<Self> {
        config.validate()?;
        let mapping = config.mapping.normalized()?;

        // Sub-hertz channels still stamp every sample
        let samples_per_stamp = (config.frequency.floor() as usize).max(1);

        tracing::debug!(
            "Created channel '{}' at {} Hz ({}..{} {})",
            config.name,
            config.frequency,
            mapping.value_min,
            mapping.value_max,
            config.unit
        );

        Ok(Self {
            name: config.name,
            unit: config.unit,
            frequency: config.frequency,
            value_scale: mapping.scale(),
            mapping,
            style: config.style,
            data: MipBuffer::new(),
            timestamps: Vec::new(),
            samples_per_stamp,
        })
    }

    /// Snapshot of this channel's configuration
    pub fn config(&self) -> ChannelConfig {
        ChannelConfig {
            name: self.name.clone(),
            unit: self.unit.clone(),
            frequency: self.frequency,
            mapping: self.mapping,
            style: self.style.clone(),
        }
    }

    pub fn name(&self) -> &str {
        &self.name
    }

    pub fn unit(&self) -> &str {
        &self.unit
    }

    pub fn frequency(&self) -> f64 {
        self.frequency
    }

    pub fn mapping(&self) -> ValueMapping {
        self.mapping
    }

    /// Calibrated `(value_min, value_max)`
    pub fn value_range(&self) -> (f64, f64) {
        (self.mapping.value_min, self.mapping.value_max)
    }

    /// Recalibrate the raw-to-physical mapping
    ///
    /// Already appended samples are unaffected; the new mapping applies to
    /// every later conversion.
    pub fn set_mapping(
        &mut self,
        value_min: f64,
        value_min_raw: f64,
        value_max: f64,
        value_max_raw: f64,
    ) -> Result<()> {
        let mapping =
            ValueMapping::new(value_min, value_min_raw, value_max, value_max_raw).normalized()?;
        self.mapping = mapping;
        self.value_scale = mapping.scale();
        tracing::debug!(
            "Channel '{}' recalibrated: raw {}..{} -> {}..{} {}",
            self.name,
            mapping.value_min_raw,
            mapping.value_max_raw,
            mapping.value_min,
            mapping.value_max,
            self.unit
        );
        Ok(())
    }

    /// Append a raw sample
    ///
    /// `timestamp` (seconds since the Unix epoch) is only consulted on
    /// samples that start a new second of sample time; `None` means now.
    pub fn append(&mut self, raw_value: f64, timestamp: Option<f64>) {
        self.stamp_if_due(timestamp);
        self.data.append(raw_value);
    }

    /// Append a pre-aggregated raw entry (e.g. from an upstream decimator)
    pub fn append_minmaxavg(&mut self, min: f64, max: f64, avg: f64, timestamp: Option<f64>) {
        self.stamp_if_due(timestamp);
        self.data.append_minmaxavg(min, max, avg);
    }

    fn stamp_if_due(&mut self, timestamp: Option<f64>) {
        if self.data.size() % self.samples_per_stamp == 0 {
            self.timestamps.push(timestamp.unwrap_or_else(now_utc_seconds));
        }
    }

    /// Number of samples appended
    #[inline]
    pub fn size(&self) -> usize {
        self.data.size()
    }

    /// Raw entry at sample index `i`
    pub fn get(&self, i: usize) -> Result<MipEntry> {
        self.data.get(i)
    }

    /// Underlying mip buffer
    pub fn buffer(&self) -> &MipBuffer {
        &self.data
    }

    /// See [`MipBuffer::query_range`]; entries are raw values
    pub fn query_range(
        &self,
        start_index: f64,
        end_index: f64,
        resolution: f64,
    ) -> Result<MipSlice<'_>> {
        self.data.query_range(start_index, end_index, resolution)
    }

    /// Recorded wall-clock stamps, one per second of sample time
    pub fn timestamps(&self) -> &[f64] {
        &self.timestamps
    }

    /// Raw value to physical value
    #[inline]
    pub fn raw_to_value(&self, raw: f64) -> f64 {
        self.mapping.value_min + (raw - self.mapping.value_min_raw) * self.value_scale
    }

    /// Physical value to raw value
    #[inline]
    pub fn value_to_raw(&self, value: f64) -> f64 {
        self.mapping.value_min_raw + (value - self.mapping.value_min) / self.value_scale
    }

    /// Seconds since the first sample
    #[inline]
    pub fn sample_to_time(&self, sample_num: f64) -> f64 {
        sample_num / self.frequency
    }

    /// Sample index for seconds since the first sample
    #[inline]
    pub fn time_to_sample(&self, time: f64) -> f64 {
        time * self.frequency
    }

    /// Map a sample index in the sample-space of a channel running at
    /// `reference_frequency` onto this channel's indices
    #[inline]
    pub fn rescale_index(&self, index: f64, reference_frequency: f64) -> f64 {
        index * self.frequency / reference_frequency
    }

    /// Absolute time of a sample in seconds since the Unix epoch
    ///
    /// Interpolates between the two recorded stamps around `sample_num`.
    /// Past the last stamp the nominal sample rate is used. Returns 0 when
    /// nothing was recorded yet or for samples before the first one.
    pub fn sample_to_time_utc(&self, sample_num: f64) -> f64 {
        let Some(&last) = self.timestamps.last() else {
            return 0.0;
        };
        let per = self.samples_per_stamp as i64;
        let bucket = (sample_num.trunc() as i64).div_euclid(per);
        if bucket < 0 {
            return 0.0;
        }

        let last_bucket = self.timestamps.len() as i64 - 1;
        if bucket >= last_bucket {
            return last + (sample_num - (last_bucket * per) as f64) / self.frequency;
        }

        let i = bucket as usize;
        let (t0, t1) = (self.timestamps[i], self.timestamps[i + 1]);
        t0 + (t1 - t0) / per as f64 * (sample_num - (bucket * per) as f64)
    }

    /// [`Channel::sample_to_time_utc`] as a chrono timestamp
    pub fn sample_to_datetime_utc(&self, sample_num: f64) -> Option<chrono::DateTime<chrono::Utc>> {
        if self.timestamps.is_empty() {
            return None;
        }
        let micros = (self.sample_to_time_utc(sample_num) * 1e6).round() as i64;
        chrono::DateTime::from_timestamp_micros(micros)
    }
}
