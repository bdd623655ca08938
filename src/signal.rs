//! Deterministic test signals
//!
//! Stand-in for a real acquisition source in the demo binary, tests and
//! benches. Every generator is a pure function of its seed and the sample
//! time, so runs are reproducible.

use std::f64::consts::TAU;

/// Lower clamp of [`SignalPattern::Composite`], the 8-bit ADC floor
const RAW_MIN: f64 = 0.0;
/// Upper clamp of [`SignalPattern::Composite`], the 8-bit ADC ceiling
const RAW_MAX: f64 = 255.0;

/// `(angular rate, amplitude)` terms of the composite signal
const COMPOSITE_TERMS: [(f64, f64); 9] = [
    (30.0, 1.0),
    (32.3, 2.0),
    (33.3, 1.0),
    (55.3, 1.0),
    (1.1, 20.0),
    (1.3, 20.0),
    (0.2124, 40.0),
    (0.0824, 40.0),
    (0.0324, 40.0),
];

/// Waveform produced by a [`SignalGenerator`]
#[derive(Debug, Clone, Copy, PartialEq, Default)]
pub enum SignalPattern {
    /// Sum of slow drifts and fast ripple around mid-scale, clamped to 0..255
    #[default]
    Composite,
    /// Sine wave with frequency (Hz) and amplitude
    Sine {
        frequency: f64,
        amplitude: f64,
        offset: f64,
    },
    /// Sawtooth wave
    Sawtooth { period: f64, amplitude: f64 },
    /// Constant value
    Constant(f64),
}

/// Seeded signal source
#[derive(Debug, Clone, PartialEq)]
pub struct SignalGenerator {
    seed: u32,
    pattern: SignalPattern,
}

impl SignalGenerator {
    /// Composite generator; different seeds give differently shaped signals
    pub fn new(seed: u32) -> Self {
        Self {
            seed,
            pattern: SignalPattern::Composite,
        }
    }

    pub fn with_pattern(mut self, pattern: SignalPattern) -> Self {
        self.pattern = pattern;
        self
    }

    pub fn seed(&self) -> u32 {
        self.seed
    }

    pub fn pattern(&self) -> SignalPattern {
        self.pattern
    }

    /// Raw value at `t` seconds
    pub fn sample(&self, t: f64) -> f64 {
        let seed = self.seed as f64;
        match self.pattern {
            SignalPattern::Composite => {
                let speed = seed + 1.0;
                let phase = seed * 2.0;
                let s: f64 = COMPOSITE_TERMS
                    .iter()
                    .map(|&(rate, amp)| (t * speed * rate + phase).sin() * amp)
                    .sum();
                (s + 127.0).clamp(RAW_MIN, RAW_MAX)
            }
            SignalPattern::Sine {
                frequency,
                amplitude,
                offset,
            } => offset + amplitude * (TAU * frequency * t + seed).sin(),
            SignalPattern::Sawtooth { period, amplitude } => {
                if period > 0.0 {
                    amplitude * (t.rem_euclid(period) / period)
                } else {
                    0.0
                }
            }
            SignalPattern::Constant(v) => v,
        }
    }
}
