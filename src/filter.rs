use crate::types::FILTER_ALPHA;

/// Per-axis exponential baseline tracker with high-pass output.
///
/// Each axis keeps a running low-pass estimate of the raw signal; the
/// output is the residual `raw - baseline`, which strips gravity and
/// slow drift while keeping the shake. The baseline starts at zero, so
/// the first moments of filtered output carry a warm-up transient while
/// it converges onto the input signal; downstream consumers see that
/// transient and it is left as-is.
#[derive(Debug, Default)]
pub struct HighpassFilter {
    baseline: [f32; 3],
}

impl HighpassFilter {
    pub fn new() -> Self {
        Self::default()
    }

    /// Filters one raw reading. Disabled means identity: the input is
    /// returned untouched and the baseline is not advanced, so toggling
    /// the filter never resets its state.
    pub fn apply(&mut self, raw: [f32; 3], enabled: bool) -> [f32; 3] {
        if !enabled {
            return raw;
        }
        let mut out = [0.0f32; 3];
        for axis in 0..3 {
            self.baseline[axis] = raw[axis] * FILTER_ALPHA + self.baseline[axis] * (1.0 - FILTER_ALPHA);
            out[axis] = raw[axis] - self.baseline[axis];
        }
        out
    }
}
