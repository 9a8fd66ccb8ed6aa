use std::sync::Arc;

use crate::filter::HighpassFilter;
use crate::queue::SampleSender;
use crate::session::SessionShared;
use crate::types::{now_ms, Sample};

/// Producer-side handle the sensor callback feeds raw readings into.
///
/// Each reading is stamped with the elapsed time since the session
/// epoch, run through the filter (a no-op when disabled) and pushed
/// onto the queue. Nothing here blocks the sensor thread.
pub struct SensorFeed {
    sender: SampleSender,
    filter: HighpassFilter,
    shared: Arc<SessionShared>,
}

impl SensorFeed {
    pub(crate) fn new(sender: SampleSender, shared: Arc<SessionShared>) -> Self {
        Self {
            sender,
            filter: HighpassFilter::new(),
            shared,
        }
    }

    pub fn update(&mut self, x: f32, y: f32, z: f32) {
        self.update_at(x, y, z, now_ms());
    }

    pub(crate) fn update_at(&mut self, x: f32, y: f32, z: f32, now: i64) {
        let (epoch_start_ms, filter_enabled) = self.shared.producer_params();
        let values = self.filter.apply([x, y, z], filter_enabled);
        self.sender.push(Sample::new(now - epoch_start_ms, values));
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::config::VisualizerConfig;
    use crate::queue::sample_queue;

    fn feed_with_config(config: VisualizerConfig, epoch: i64) -> (SensorFeed, crate::queue::SampleQueue) {
        let shared = Arc::new(SessionShared::new(&config, epoch));
        let (sender, queue) = sample_queue();
        (SensorFeed::new(sender, shared), queue)
    }

    #[test]
    fn timestamps_are_relative_to_the_epoch() {
        let config = VisualizerConfig {
            filter_enabled: false,
            ..Default::default()
        };
        let (mut feed, queue) = feed_with_config(config, 1_000);

        feed.update_at(0.0, 0.0, -9.8, 1_500);
        feed.update_at(0.0, 0.0, -9.8, 2_500);

        let samples = queue.drain_all();
        assert_eq!(samples[0].timestamp_ms, 500);
        assert_eq!(samples[1].timestamp_ms, 1_500);
    }

    #[test]
    fn disabled_filter_passes_raw_values_through() {
        let config = VisualizerConfig {
            filter_enabled: false,
            ..Default::default()
        };
        let (mut feed, queue) = feed_with_config(config, 0);

        feed.update_at(1.0, -2.0, 9.5, 10);

        let samples = queue.drain_all();
        assert_eq!(samples[0].axis_values, [1.0, -2.0, 9.5]);
    }

    #[test]
    fn enabled_filter_strips_a_constant_reading_over_time() {
        let config = VisualizerConfig::default();
        assert!(config.filter_enabled);
        let (mut feed, queue) = feed_with_config(config, 0);

        for i in 0..100 {
            feed.update_at(0.0, 0.0, -9.8, i * 20);
        }

        let samples = queue.drain_all();
        let first = samples.first().unwrap().axis_values[2].abs();
        let last = samples.last().unwrap().axis_values[2].abs();
        assert!(first > 8.0);
        assert!(last < 0.01);
    }
}
