//! Sample ingestion from producer threads
//!
//! Channels are single-writer: only the thread that owns the [`Scope`] may
//! append to them. Acquisition threads instead post samples into a bounded
//! queue created by [`queue`], and the owner applies them in one batch per
//! frame with [`Scope::drain`].
//!
//! ```text
//! +-----------------+   SampleSender    +------------------+
//! | producer thread | ----------------> |  bounded queue   |
//! +-----------------+     (clone ok)    +--------+---------+
//!                                                | SampleReceiver
//!                                                v
//!                                       +------------------+
//!                                       | Scope::drain     |  render thread
//!                                       +------------------+
//! ```
//!
//! The queue is bounded so a stalled render thread applies backpressure to
//! producers instead of growing memory without limit.
//!
//! [`Scope`]: crate::scope::Scope
//! [`Scope::drain`]: crate::scope::Scope::drain

use crate::channel::Channel;
use crossbeam_channel::{bounded, Receiver, Sender, TrySendError};

/// One value destined for a channel
#[derive(Debug, Clone, Copy, PartialEq)]
pub enum Sample {
    /// A direct measurement
    Raw { value: f64, timestamp: Option<f64> },
    /// A pre-aggregated block, see [`Channel::append_minmaxavg`]
    MinMaxAvg {
        min: f64,
        max: f64,
        avg: f64,
        timestamp: Option<f64>,
    },
}

impl Sample {
    /// Append to `channel`
    pub fn apply(self, channel: &mut Channel) {
        match self {
            Sample::Raw { value, timestamp } => channel.append(value, timestamp),
            Sample::MinMaxAvg {
                min,
                max,
                avg,
                timestamp,
            } => channel.append_minmaxavg(min, max, avg, timestamp),
        }
    }
}

/// A queued sample together with the index of its channel
pub type SampleMessage = (usize, Sample);

/// Producer side of the sample queue
#[derive(Debug, Clone)]
pub struct SampleSender {
    sender: Sender<SampleMessage>,
}

impl SampleSender {
    /// Queue a raw value, blocking while the queue is full
    ///
    /// Returns false once the receiving side is gone.
    pub fn send(&self, channel: usize, value: f64, timestamp: Option<f64>) -> bool {
        self.send_sample(channel, Sample::Raw { value, timestamp })
    }

    /// Queue a pre-aggregated block, blocking while the queue is full
    pub fn send_minmaxavg(
        &self,
        channel: usize,
        min: f64,
        max: f64,
        avg: f64,
        timestamp: Option<f64>,
    ) -> bool {
        self.send_sample(
            channel,
            Sample::MinMaxAvg {
                min,
                max,
                avg,
                timestamp,
            },
        )
    }

    /// Queue any sample, blocking while the queue is full
    pub fn send_sample(&self, channel: usize, sample: Sample) -> bool {
        self.sender.send((channel, sample)).is_ok()
    }

    /// Queue without blocking; false when the queue is full or closed
    pub fn try_send(&self, channel: usize, sample: Sample) -> bool {
        match self.sender.try_send((channel, sample)) {
            Ok(()) => true,
            Err(TrySendError::Full(_)) => {
                tracing::trace!("Sample queue full, dropping sample for channel {}", channel);
                false
            }
            Err(TrySendError::Disconnected(_)) => false,
        }
    }
}

/// Consumer side of the sample queue
#[derive(Debug)]
pub struct SampleReceiver {
    receiver: Receiver<SampleMessage>,
}

impl SampleReceiver {
    /// Number of queued samples
    pub fn len(&self) -> usize {
        self.receiver.len()
    }

    pub fn is_empty(&self) -> bool {
        self.receiver.is_empty()
    }

    /// Take the samples queued right now
    ///
    /// Samples that arrive while iterating are left for the next call, so a
    /// fast producer cannot keep a drain running forever.
    pub fn pending(&self) -> impl Iterator<Item = SampleMessage> + '_ {
        let n = self.receiver.len();
        self.receiver.try_iter().take(n)
    }
}

/// Create a bounded sample queue holding up to `capacity` samples
pub fn queue(capacity: usize) -> (SampleSender, SampleReceiver) {
    let (sender, receiver) = bounded(capacity.max(1));
    (SampleSender { sender }, SampleReceiver { receiver })
}
