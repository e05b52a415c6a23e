use crate::domain::prediction::BoundMode;

/// Upper bound used when a station's capacity is not known.
pub const DEFAULT_CAPACITY_CEILING: u32 = 40;

/// Pre-sigmoid scale applied in `SigmoidRenormalize` mode.
pub const SIGMOID_INPUT_SCALE: f64 = 0.1;

/// Map a raw model output onto a bike count in `[0, capacity]`.
///
/// `raw_output` must be finite; the service rejects non-finite model output
/// before it gets here.
pub fn bound(raw_output: f64, capacity: u32, mode: BoundMode) -> u32 {
    let ceiling = capacity as f64;
    let count = match mode {
        BoundMode::Clamp => raw_output.round(),
        BoundMode::SigmoidRenormalize => {
            let squashed = sigmoid(raw_output * SIGMOID_INPUT_SCALE);
            // [0,1] -> [-1,1] -> [0,capacity]. The two steps cancel to
            // capacity * sigmoid(0.1 * raw), so a raw output of 0 lands on
            // half capacity.
            let centered = 2.0 * squashed - 1.0;
            ((centered + 1.0) / 2.0 * ceiling).round()
        }
    };
    count.clamp(0.0, ceiling) as u32
}

fn sigmoid(x: f64) -> f64 {
    1.0 / (1.0 + (-x).exp())
}

/// `bound` with a configured mode and a fallback ceiling for unknown capacity.
#[derive(Debug, Clone, Copy)]
pub struct PredictionBounder {
    mode: BoundMode,
    fallback_ceiling: u32,
}

impl PredictionBounder {
    pub fn new(mode: BoundMode, fallback_ceiling: u32) -> Self {
        Self {
            mode,
            fallback_ceiling,
        }
    }

    pub fn mode(&self) -> BoundMode {
        self.mode
    }

    pub fn bound(&self, raw_output: f64, capacity: Option<u32>) -> u32 {
        bound(
            raw_output,
            capacity.unwrap_or(self.fallback_ceiling),
            self.mode,
        )
    }
}

impl Default for PredictionBounder {
    fn default() -> Self {
        Self::new(BoundMode::Clamp, DEFAULT_CAPACITY_CEILING)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_clamp_mode() {
        assert_eq!(bound(-100.0, 20, BoundMode::Clamp), 0);
        assert_eq!(bound(500.0, 20, BoundMode::Clamp), 20);
        assert_eq!(bound(10.4, 20, BoundMode::Clamp), 10);
        assert_eq!(bound(10.6, 20, BoundMode::Clamp), 11);
        assert_eq!(bound(20.0, 20, BoundMode::Clamp), 20);
    }

    #[test]
    fn test_clamp_is_monotonic() {
        let mut last = 0;
        for i in -200..=600 {
            let out = bound(i as f64 * 0.1, 30, BoundMode::Clamp);
            assert!(out >= last);
            last = out;
        }
    }

    #[test]
    fn test_zero_capacity() {
        assert_eq!(bound(7.0, 0, BoundMode::Clamp), 0);
        assert_eq!(bound(7.0, 0, BoundMode::SigmoidRenormalize), 0);
    }

    #[test]
    fn test_sigmoid_mode_range_and_midpoint() {
        assert_eq!(bound(0.0, 20, BoundMode::SigmoidRenormalize), 10);
        assert_eq!(bound(-1000.0, 20, BoundMode::SigmoidRenormalize), 0);
        assert_eq!(bound(1000.0, 20, BoundMode::SigmoidRenormalize), 20);
        // capacity * sigmoid(1.0) = 20 * 0.731 = 14.6
        assert_eq!(bound(10.0, 20, BoundMode::SigmoidRenormalize), 15);
    }

    #[test]
    fn test_unknown_capacity_uses_ceiling() {
        let bounder = PredictionBounder::default();
        assert_eq!(bounder.bound(95.0, None), DEFAULT_CAPACITY_CEILING);
        assert_eq!(bounder.bound(95.0, Some(12)), 12);
        assert_eq!(bounder.mode(), BoundMode::Clamp);
    }
}
