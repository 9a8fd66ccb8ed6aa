use std::sync::mpsc::{self, Receiver, Sender};

use crate::types::Sample;

/// Creates the unbounded producer->consumer channel for sensor samples.
///
/// The sender side is cheap to clone and safe to call from the sensor
/// callback thread; the queue side belongs to the render loop.
pub fn sample_queue() -> (SampleSender, SampleQueue) {
    let (tx, rx) = mpsc::channel();
    (SampleSender { tx }, SampleQueue { rx })
}

/// Producer half of the sample channel.
#[derive(Clone)]
pub struct SampleSender {
    tx: Sender<Sample>,
}

impl SampleSender {
    /// Enqueues a sample without blocking the caller.
    ///
    /// A send can only fail once the consumer is gone, i.e. during
    /// shutdown; the sample is silently dropped then.
    pub fn push(&self, sample: Sample) {
        self.tx.send(sample).ok();
    }
}

/// Consumer half of the sample channel.
pub struct SampleQueue {
    rx: Receiver<Sample>,
}

impl SampleQueue {
    /// Removes and returns everything currently queued, in FIFO order.
    ///
    /// An empty queue yields an empty vec, not an error.
    pub fn drain_all(&self) -> Vec<Sample> {
        self.rx.try_iter().collect()
    }
}
