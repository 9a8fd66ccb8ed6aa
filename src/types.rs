use std::fmt;
use std::time::{SystemTime, UNIX_EPOCH};

use serde::{Deserialize, Serialize};

/// Largest magnitude on the displayed g scale.
pub const MAX_G: f32 = 3.0;
/// Standard gravity in m/s^2.
pub const GRAVITY_EARTH: f32 = 9.806_65;
/// Acceleration mapped to the left/right canvas edges.
pub const MAX_ACCELERATION: f32 = MAX_G * GRAVITY_EARTH;
/// Longest span of history kept in memory; this is what gets saved.
pub const RETENTION_WINDOW_MS: i64 = 60_000;
/// Span of history that is actually rendered.
pub const DISPLAY_WINDOW_MS: i64 = 10_000;
pub const DISPLAY_WINDOW_SECONDS: f32 = DISPLAY_WINDOW_MS as f32 / 1000.0;
/// Baseline tracking rate of the low-pass stage.
pub const FILTER_ALPHA: f32 = 0.1;

/// Which acceleration axis the trace follows.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Serialize, Deserialize)]
#[serde(try_from = "u8", into = "u8")]
pub enum Axis {
    X,
    Y,
    Z,
}

impl Axis {
    pub fn index(self) -> usize {
        match self {
            Axis::X => 0,
            Axis::Y => 1,
            Axis::Z => 2,
        }
    }

    pub fn from_index(index: u8) -> Option<Self> {
        match index {
            0 => Some(Axis::X),
            1 => Some(Axis::Y),
            2 => Some(Axis::Z),
            _ => None,
        }
    }
}

impl TryFrom<u8> for Axis {
    type Error = String;

    fn try_from(value: u8) -> Result<Self, Self::Error> {
        Axis::from_index(value).ok_or_else(|| format!("axis index out of range: {value}"))
    }
}

impl From<Axis> for u8 {
    fn from(axis: Axis) -> u8 {
        axis.index() as u8
    }
}

impl fmt::Display for Axis {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Axis::X => write!(f, "x"),
            Axis::Y => write!(f, "y"),
            Axis::Z => write!(f, "z"),
        }
    }
}

/// One timestamped tri-axial acceleration reading.
///
/// Timestamps are milliseconds relative to the session epoch and
/// non-decreasing as produced (the producer stamps at capture time).
#[derive(Clone, Copy, Debug, PartialEq)]
pub struct Sample {
    pub timestamp_ms: i64,
    pub axis_values: [f32; 3],
}

impl Sample {
    pub fn new(timestamp_ms: i64, axis_values: [f32; 3]) -> Self {
        Self {
            timestamp_ms,
            axis_values,
        }
    }

    pub fn value(&self, axis: Axis) -> f32 {
        self.axis_values[axis.index()]
    }
}

/// Wall-clock milliseconds since the Unix epoch.
pub fn now_ms() -> i64 {
    SystemTime::now()
        .duration_since(UNIX_EPOCH)
        .map(|d| d.as_millis() as i64)
        .unwrap_or(0)
}
