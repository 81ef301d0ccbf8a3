//! Pose consumer trait: the seam to the visualization layer

use std::sync::Arc;
use tokio::sync::watch;

use crate::types::PoseSample;

/// Receiver of decoded and replayed pose samples.
///
/// Called synchronously, once per record, in strict arrival (or replay) order,
/// from within the tick that produced the sample. Implementations must not
/// block: the whole ingest loop waits on them.
pub trait PoseConsumer {
    fn on_pose(&mut self, sample: &PoseSample);
}

impl<F> PoseConsumer for F
where
    F: FnMut(&PoseSample),
{
    fn on_pose(&mut self, sample: &PoseSample) {
        self(sample)
    }
}

/// Collects every sample in order, mostly useful in tests and offline tooling.
#[derive(Debug, Default, Clone)]
pub struct PoseLog {
    samples: Vec<PoseSample>,
}

impl PoseLog {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn samples(&self) -> &[PoseSample] {
        &self.samples
    }

    pub fn len(&self) -> usize {
        self.samples.len()
    }

    pub fn is_empty(&self) -> bool {
        self.samples.is_empty()
    }

    /// Take the collected samples, leaving the log empty.
    pub fn drain(&mut self) -> Vec<PoseSample> {
        std::mem::take(&mut self.samples)
    }
}

impl PoseConsumer for PoseLog {
    fn on_pose(&mut self, sample: &PoseSample) {
        self.samples.push(*sample);
    }
}

/// Publishes the latest sample on a tokio watch channel.
///
/// Watch semantics are latest-wins: a renderer that redraws slower than samples
/// arrive only ever sees the newest pose. Hosts that need every sample should
/// implement [`PoseConsumer`] directly.
#[derive(Debug)]
pub struct WatchConsumer {
    tx: watch::Sender<Option<Arc<PoseSample>>>,
    published: u64,
}

impl WatchConsumer {
    /// Create a consumer and the receiver that observes it.
    pub fn channel() -> (Self, watch::Receiver<Option<Arc<PoseSample>>>) {
        let (tx, rx) = watch::channel(None);
        (Self { tx, published: 0 }, rx)
    }

    /// Samples published so far.
    pub fn published(&self) -> u64 {
        self.published
    }
}

impl PoseConsumer for WatchConsumer {
    fn on_pose(&mut self, sample: &PoseSample) {
        // No receivers left is fine; the feed may simply have been dropped first
        self.tx.send_replace(Some(Arc::new(*sample)));
        self.published += 1;
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::types::{Quaternion, Vector3};

    fn at_height(z: f64) -> PoseSample {
        PoseSample::new(Vector3::new(0.0, 0.0, z), Quaternion::IDENTITY)
    }

    #[test]
    fn closures_are_consumers() {
        let mut heights = Vec::new();
        let mut consumer = |sample: &PoseSample| heights.push(sample.position.z);
        consumer.on_pose(&at_height(1.0));
        consumer.on_pose(&at_height(2.0));
        assert_eq!(heights, vec![1.0, 2.0]);
    }

    #[test]
    fn pose_log_keeps_every_sample_in_order() {
        let mut log = PoseLog::new();
        for z in [3.0, 1.0, 2.0] {
            log.on_pose(&at_height(z));
        }
        let heights: Vec<f64> = log.samples().iter().map(|s| s.position.z).collect();
        assert_eq!(heights, vec![3.0, 1.0, 2.0]);

        assert_eq!(log.drain().len(), 3);
        assert!(log.is_empty());
    }

    #[test]
    fn watch_consumer_keeps_latest() {
        let (mut consumer, rx) = WatchConsumer::channel();
        assert!(rx.borrow().is_none());

        consumer.on_pose(&at_height(1.0));
        consumer.on_pose(&at_height(2.0));

        let latest = rx.borrow().clone().expect("published");
        assert_eq!(latest.position.z, 2.0);
        assert_eq!(consumer.published(), 2);
    }

    #[test]
    fn watch_consumer_survives_dropped_receiver() {
        let (mut consumer, rx) = WatchConsumer::channel();
        drop(rx);
        consumer.on_pose(&at_height(3.0));
        assert_eq!(consumer.published(), 1);
    }
}
