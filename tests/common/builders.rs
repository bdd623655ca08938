//! Test data builders for creating test objects

use mipscope::{Channel, ChannelConfig, ValueMapping};

/// Builder for channels pre-filled with samples
pub struct ChannelBuilder {
    name: String,
    frequency: f64,
    mapping: ValueMapping,
    samples: Vec<f64>,
    timestamp: Option<f64>,
}

impl ChannelBuilder {
    pub fn new(name: &str) -> Self {
        Self {
            name: name.to_string(),
            frequency: 100.0,
            mapping: ValueMapping::default(),
            samples: Vec::new(),
            timestamp: Some(0.0),
        }
    }

    pub fn frequency(mut self, frequency: f64) -> Self {
        self.frequency = frequency;
        self
    }

    pub fn mapping(mut self, mapping: ValueMapping) -> Self {
        self.mapping = mapping;
        self
    }

    /// Append `count` copies of `value`
    pub fn constant(mut self, value: f64, count: usize) -> Self {
        self.samples.extend(std::iter::repeat(value).take(count));
        self
    }

    /// Append `count` samples of a 0..=255 sawtooth
    pub fn ramp(mut self, count: usize) -> Self {
        self.samples.extend((0..count).map(|i| (i % 256) as f64));
        self
    }

    /// Stamp samples with the wall clock instead of a fixed time
    pub fn wall_clock(mut self) -> Self {
        self.timestamp = None;
        self
    }

    pub fn build(self) -> Channel {
        let config = ChannelConfig::new(self.name, self.frequency).with_mapping(self.mapping);
        let mut channel = Channel::new(config).expect("valid test channel");
        for v in self.samples {
            channel.append(v, self.timestamp);
        }
        channel
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_channel_builder() {
        let ch = ChannelBuilder::new("test")
            .frequency(10.0)
            .constant(1.0, 5)
            .ramp(3)
            .build();

        assert_eq!(ch.name(), "test");
        assert_eq!(ch.frequency(), 10.0);
        assert_eq!(ch.size(), 8);
        assert_eq!(ch.get(7).unwrap().avg, 2.0);
    }
}
