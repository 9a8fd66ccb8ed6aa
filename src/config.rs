use serde::{Deserialize, Serialize};

use crate::types::Axis;

/// Options the visualizer recognizes.
#[derive(Clone, Copy, Debug, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct VisualizerConfig {
    pub filter_enabled: bool,
    /// Axis the trace follows; accepts 0, 1 or 2 in JSON.
    pub axis: Axis,
    /// Delay between render ticks (fixed-delay, not fixed-rate).
    pub tick_period_ms: u64,
}

impl Default for VisualizerConfig {
    fn default() -> Self {
        Self {
            filter_enabled: true,
            axis: Axis::Z,
            tick_period_ms: 50,
        }
    }
}

impl VisualizerConfig {
    pub fn from_json(json: &str) -> serde_json::Result<Self> {
        serde_json::from_str(json)
    }
}
