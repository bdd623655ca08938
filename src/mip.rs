//! Multi-resolution sample buffer
//!
//! A [`MipBuffer`] stores every appended sample at level 0 and keeps a pyramid
//! of progressively coarser `(min, max, avg)` aggregates above it, in the same
//! spirit as texture mip-mapping:
//!
//! ```text
//!   8 values appended:
//!
//!         level 0         level 1         level 2         level 3
//!      avg min max     avg min max     avg min max     avg min max
//!   0   25  25  25      30  25  35      40  25  60      28   5  60
//!   1   35  35  35      50  40  60      16   5  30
//!   2   40  40  40      20  10  30
//!   3   60  60  60      12   5  19
//!   4   10  10  10
//!   5   30  30  30
//!   6   19  19  19
//!   7    5   5   5
//! ```
//!
//! Level `k + 1` always holds `len(level k) / 2` entries. A parent entry is
//! produced the moment a level reaches an even length, so the pyramid is
//! consistent after every append.
//!
//! [`MipBuffer::query_range`] picks the coarsest level that still has about
//! one entry per output pixel. Rendering cost per frame is therefore bounded
//! by the output resolution, not by how many samples have been recorded.
//!
//! Averages are combined pairwise, so a level-`k` average is the "average of
//! averages" of its `2^k` samples. Only for complete power-of-two blocks does
//! this equal the arithmetic mean; min and max are always exact.

use crate::error::{Result, ScopeError};
use crate::types::MipEntry;

/// Minimum sample span (in level units) below which the query never descends
/// to a coarser level.
const MIN_DESCEND_SPAN: f64 = 5.0;

/// Pyramid of min/max/avg aggregates over an append-only sample stream
#[derive(Debug, Clone, Default)]
pub struct MipBuffer {
    /// `levels[0]` holds raw samples, `levels[k]` holds pairs of `levels[k - 1]`
    levels: Vec<Vec<MipEntry>>,
}

impl MipBuffer {
    /// Create an empty buffer
    pub fn new() -> Self {
        Self::default()
    }

    /// Create an empty buffer with room for `samples` raw samples (and the
    /// levels above them) before reallocating
    pub fn with_capacity(samples: usize) -> Self {
        let mut levels = Vec::new();
        let mut n = samples;
        while n > 0 {
            levels.push(Vec::with_capacity(n));
            n /= 2;
        }
        Self { levels }
    }

    /// Append one raw sample (min, max and average all equal `value`)
    #[inline]
    pub fn append(&mut self, value: f64) {
        self.append_minmaxavg(value, value, value);
    }

    /// Append one pre-aggregated entry and propagate it up the pyramid
    pub fn append_minmaxavg(&mut self, min: f64, max: f64, avg: f64) {
        let mut entry = MipEntry::new(min, max, avg);
        let mut level = 0;

        loop {
            if level == self.levels.len() {
                self.levels.push(Vec::new());
            }
            let buf = &mut self.levels[level];
            buf.push(entry);

            let len = buf.len();
            if len % 2 != 0 {
                break;
            }
            entry = MipEntry::combine(&buf[len - 2], &buf[len - 1]);
            level += 1;
        }
    }

    /// Number of raw samples appended so far
    #[inline]
    pub fn size(&self) -> usize {
        self.levels.first().map_or(0, Vec::len)
    }

    /// Alias for [`MipBuffer::size`]
    #[inline]
    pub fn len(&self) -> usize {
        self.size()
    }

    #[inline]
    pub fn is_empty(&self) -> bool {
        self.size() == 0
    }

    /// Number of levels that contain at least one entry
    pub fn level_count(&self) -> usize {
        self.levels.iter().take_while(|l| !l.is_empty()).count()
    }

    /// Entries of level `k`, if that level exists
    pub fn level(&self, k: usize) -> Option<&[MipEntry]> {
        self.levels.get(k).map(Vec::as_slice)
    }

    /// Raw entry at level-0 index `i`
    pub fn get(&self, i: usize) -> Result<MipEntry> {
        self.level(0)
            .and_then(|raw| raw.get(i))
            .copied()
            .ok_or(ScopeError::IndexOutOfRange {
                index: i,
                len: self.size(),
            })
    }

    /// Select the entries needed to draw the sample range `[start_index,
    /// end_index)` across `resolution` output pixels.
    ///
    /// Sample `i` covers the continuous interval `[i, i + 1)`, so fractional
    /// indices are allowed. Each level descended halves both indices. The
    /// returned pixel offsets place the centre of `start_index`/`end_index`
    /// entries within `[0, resolution]`, accounting for parts of the range
    /// that fall outside the recorded data.
    ///
    /// An empty or inverted range yields an empty slice. A resolution that is
    /// not a positive finite number is rejected.
    pub fn query_range(
        &self,
        start_index: f64,
        end_index: f64,
        resolution: f64,
    ) -> Result<MipSlice<'_>> {
        if !(resolution.is_finite() && resolution > 0.0) {
            return Err(ScopeError::InvalidResolution(resolution));
        }
        if !(start_index.is_finite() && end_index.is_finite()) || end_index <= start_index {
            return Ok(MipSlice::empty(0));
        }

        let mut level = 0;
        let mut start = start_index;
        let mut end = end_index;
        while (end - start) / resolution >= 2.0
            && level + 1 < self.level_count()
            && end - start >= MIN_DESCEND_SPAN
        {
            start /= 2.0;
            end /= 2.0;
            level += 1;
        }

        let entries = self.level(level).unwrap_or(&[]);
        let pixels_per_sample = resolution / (end - start);

        // Clamp in f64 so indices far outside the data never reach an integer cast
        let first = start.round().max(0.0);
        let last = (end.round() - 1.0).min(entries.len() as f64 - 1.0);
        if entries.is_empty() || last < first {
            return Ok(MipSlice::empty(level));
        }
        let first = first as usize;
        let last = last as usize;

        Ok(MipSlice {
            level,
            entries: &entries[first..=last],
            start_pixel: (first as f64 + 0.5 - start) * pixels_per_sample,
            start_index: first,
            end_pixel: resolution - (end - last as f64 - 0.5) * pixels_per_sample,
            end_index: last,
        })
    }
}

/// Result of [`MipBuffer::query_range`]
///
/// `entries` are exactly the level entries `start_index..=end_index`. The
/// first entry is drawn at `start_pixel`, the last at `end_pixel`, and the
/// ones in between are spaced evenly.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct MipSlice<'a> {
    /// Pyramid level the entries were taken from
    pub level: usize,
    /// Selected entries
    pub entries: &'a [MipEntry],
    /// Pixel position of the first entry
    pub start_pixel: f64,
    /// Level index of the first entry
    pub start_index: usize,
    /// Pixel position of the last entry
    pub end_pixel: f64,
    /// Level index of the last entry (inclusive)
    pub end_index: usize,
}

impl<'a> MipSlice<'a> {
    fn empty(level: usize) -> Self {
        Self {
            level,
            entries: &[],
            start_pixel: 0.0,
            start_index: 0,
            end_pixel: 0.0,
            end_index: 0,
        }
    }

    #[inline]
    pub fn len(&self) -> usize {
        self.entries.len()
    }

    #[inline]
    pub fn is_empty(&self) -> bool {
        self.entries.is_empty()
    }

    /// At least two entries, i.e. something a line strip can be drawn from
    #[inline]
    pub fn is_drawable(&self) -> bool {
        self.entries.len() >= 2
    }

    /// Pixel distance between consecutive entries
    pub fn pixel_step(&self) -> f64 {
        if self.is_drawable() {
            (self.end_pixel - self.start_pixel) / (self.end_index - self.start_index) as f64
        } else {
            0.0
        }
    }

    /// Iterate entries together with their pixel x position
    pub fn iter_pixels(&self) -> impl Iterator<Item = (f64, &'a MipEntry)> + '_ {
        let step = self.pixel_step();
        let start = self.start_pixel;
        self.entries
            .iter()
            .enumerate()
            .map(move |(k, e)| (start + k as f64 * step, e))
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use proptest::prelude::*;

    fn buffer_from(values: &[f64]) -> MipBuffer {
        let mut buf = MipBuffer::new();
        for &v in values {
            buf.append(v);
        }
        buf
    }

    #[test]
    fn test_four_samples_build_two_parents() {
        let buf = buffer_from(&[0.0, 1.0, 2.0, 3.0]);
        assert_eq!(buf.size(), 4);

        let level1 = buf.level(1).unwrap();
        assert_eq!(level1.len(), 2);
        assert_eq!(level1[0], MipEntry::new(0.0, 1.0, 0.5));
        assert_eq!(level1[1], MipEntry::new(2.0, 3.0, 2.5));

        let level2 = buf.level(2).unwrap();
        assert_eq!(level2, &[MipEntry::new(0.0, 3.0, 1.5)]);
        assert_eq!(buf.level_count(), 3);
    }

    #[test]
    fn test_levels_are_created_lazily() {
        let mut buf = MipBuffer::new();
        assert_eq!(buf.level_count(), 0);
        buf.append(1.0);
        assert_eq!(buf.level_count(), 1);
        assert!(buf.level(1).is_none());
        buf.append(2.0);
        assert_eq!(buf.level_count(), 2);
    }

    #[test]
    fn test_documented_pyramid() {
        let buf = buffer_from(&[25.0, 35.0, 40.0, 60.0, 10.0, 30.0, 19.0, 5.0]);
        let level2 = buf.level(2).unwrap();
        assert_eq!(level2[0], MipEntry::new(25.0, 60.0, 40.0));
        assert_eq!(level2[1], MipEntry::new(5.0, 30.0, 16.0));
        assert_eq!(buf.level(3).unwrap(), &[MipEntry::new(5.0, 60.0, 28.0)]);
    }

    #[test]
    fn test_get_out_of_range() {
        let buf = buffer_from(&[1.0, 2.0]);
        assert_eq!(buf.get(1).unwrap().avg, 2.0);
        match buf.get(2) {
            Err(ScopeError::IndexOutOfRange { index, len }) => {
                assert_eq!(index, 2);
                assert_eq!(len, 2);
            }
            other => panic!("expected IndexOutOfRange, got {:?}", other),
        }
        assert!(MipBuffer::new().get(0).is_err());
    }

    #[test]
    fn test_with_capacity_starts_empty() {
        let buf = MipBuffer::with_capacity(1024);
        assert_eq!(buf.size(), 0);
        assert_eq!(buf.level_count(), 0);
        assert!(buf.is_empty());
    }

    #[test]
    fn test_query_picks_level_by_resolution() {
        let buf = buffer_from(&[25.0, 35.0, 40.0, 60.0, 10.0, 30.0, 19.0, 5.0]);
        // 8 samples on 4 pixels: one level-1 entry per pixel
        assert_eq!(buf.query_range(0.0, 8.0, 4.0).unwrap().level, 1);
        // 8 samples on 5 pixels stay at level 0
        assert_eq!(buf.query_range(0.0, 8.0, 5.0).unwrap().level, 0);
    }

    #[test]
    fn test_query_pixel_offsets() {
        let mut buf = MipBuffer::new();
        for _ in 0..5 {
            buf.append_minmaxavg(1.0, 2.0, 3.0);
        }
        let slice = buf.query_range(1.0, 10.0, 10.0).unwrap();
        assert_eq!(slice.level, 0);
        assert_eq!(slice.start_index, 1);
        assert_eq!(slice.end_index, 4);
        assert_eq!(slice.len(), 4);
        assert!((slice.start_pixel - 5.0 / 9.0).abs() < 1e-12);
        assert!((slice.end_pixel - (10.0 - 5.5 * 10.0 / 9.0)).abs() < 1e-12);
    }

    #[test]
    fn test_query_degenerate_inputs() {
        let buf = buffer_from(&[1.0, 2.0, 3.0]);
        assert!(buf.query_range(2.0, 2.0, 100.0).unwrap().is_empty());
        assert!(buf.query_range(3.0, 1.0, 100.0).unwrap().is_empty());
        assert!(buf.query_range(f64::NAN, 1.0, 100.0).unwrap().is_empty());
        assert!(MipBuffer::new().query_range(0.0, 100.0, 10.0).unwrap().is_empty());
        // completely outside the recorded data
        assert!(buf.query_range(50.0, 60.0, 10.0).unwrap().is_empty());
        assert!(buf.query_range(-60.0, -50.0, 10.0).unwrap().is_empty());
    }

    #[test]
    fn test_query_far_outside_data() {
        // a single sample cannot be halved, so huge indices reach level 0 as is
        let buf = buffer_from(&[7.0]);
        assert!(buf.query_range(-1e20, -1e19, 100.0).unwrap().is_empty());
        assert!(buf.query_range(1e19, 1e20, 100.0).unwrap().is_empty());
        assert!(buf.query_range(f64::MIN, -1.0, 100.0).unwrap().is_empty());

        let slice = buf.query_range(-1e20, 1e20, 100.0).unwrap();
        assert_eq!(slice.len(), 1);
        assert_eq!(slice.start_index, 0);
        assert_eq!(slice.end_index, 0);
        assert_eq!(slice.entries[0].avg, 7.0);

        let buf = buffer_from(&[1.0, 2.0, 3.0, 4.0]);
        assert!(buf.query_range(-1e300, -1e299, 10.0).unwrap().is_empty());
        assert_eq!(buf.query_range(-1e300, 1e300, 10.0).unwrap().len(), 1);
    }

    #[test]
    fn test_query_rejects_bad_resolution() {
        let buf = buffer_from(&[1.0, 2.0, 3.0]);
        for res in [0.0, -1.0, f64::NAN, f64::INFINITY] {
            assert!(matches!(
                buf.query_range(0.0, 3.0, res),
                Err(ScopeError::InvalidResolution(_))
            ));
        }
    }

    #[test]
    fn test_query_clamps_to_recorded_samples() {
        let buf = buffer_from(&(0..10).map(f64::from).collect::<Vec<_>>());
        let slice = buf.query_range(-5.0, 15.0, 100.0).unwrap();
        assert_eq!(slice.start_index, 0);
        assert_eq!(slice.end_index, 9);
        // data starts 5.5 samples into the range at 5 pixels per sample
        assert!((slice.start_pixel - 27.5).abs() < 1e-9);
        assert!((slice.end_pixel - 72.5).abs() < 1e-9);
    }

    #[test]
    fn test_iter_pixels_spacing() {
        let buf = buffer_from(&[0.0, 1.0, 2.0, 3.0]);
        let slice = buf.query_range(0.0, 4.0, 8.0).unwrap();
        let xs: Vec<f64> = slice.iter_pixels().map(|(x, _)| x).collect();
        assert_eq!(xs, vec![1.0, 3.0, 5.0, 7.0]);
    }

    #[test]
    fn test_large_buffer_query_is_bounded() {
        let mut buf = MipBuffer::new();
        for i in 0..1_000_000 {
            buf.append((i % 1000) as f64);
        }
        let slice = buf.query_range(0.0, 1_000_000.0, 800.0).unwrap();
        assert!(slice.len() <= 1602);
        assert!(slice.level >= 9);
    }

    /// Reference aggregate for a block of 2^k raw samples
    fn reference_block(raw: &[f64]) -> MipEntry {
        if raw.len() == 1 {
            return MipEntry::splat(raw[0]);
        }
        let (l, r) = raw.split_at(raw.len() / 2);
        MipEntry::combine(&reference_block(l), &reference_block(r))
    }

    proptest! {
        #[test]
        fn test_level_lengths_halve(values in prop::collection::vec(-1e6f64..1e6, 0..600)) {
            let buf = buffer_from(&values);
            prop_assert_eq!(buf.size(), values.len());
            for k in 1..buf.level_count() {
                let below = buf.level(k - 1).unwrap().len();
                prop_assert_eq!(buf.level(k).unwrap().len(), below / 2);
            }
            // no further level would be non-empty
            let top = buf.level_count();
            if top > 0 {
                prop_assert!(buf.level(top - 1).unwrap().len() < 2);
            }
        }

        #[test]
        fn test_aggregates_match_raw_blocks(values in prop::collection::vec(-1e3f64..1e3, 1..300)) {
            let buf = buffer_from(&values);
            for k in 0..buf.level_count() {
                let block = 1usize << k;
                for (i, entry) in buf.level(k).unwrap().iter().enumerate() {
                    let raw = &values[i * block..(i + 1) * block];
                    let min = raw.iter().cloned().fold(f64::INFINITY, f64::min);
                    let max = raw.iter().cloned().fold(f64::NEG_INFINITY, f64::max);
                    prop_assert_eq!(entry.min, min);
                    prop_assert_eq!(entry.max, max);
                    prop_assert!((entry.avg - reference_block(raw).avg).abs() < 1e-9);
                }
            }
        }

        #[test]
        fn test_query_work_is_bounded_by_resolution(
            samples in 1usize..20_000,
            start in -5_000.0f64..20_000.0,
            span in 1.0f64..40_000.0,
            resolution in 1.0f64..500.0,
        ) {
            let mut buf = MipBuffer::new();
            for i in 0..samples {
                buf.append(i as f64);
            }
            let slice = buf.query_range(start, start + span, resolution).unwrap();
            let bound = (2.0 * resolution + 2.0).max(MIN_DESCEND_SPAN + 2.0);
            prop_assert!((slice.len() as f64) <= bound);
            if !slice.is_empty() {
                prop_assert!(slice.end_index >= slice.start_index);
                prop_assert!(slice.end_index < buf.level(slice.level).unwrap().len());
            }
        }
    }
}
