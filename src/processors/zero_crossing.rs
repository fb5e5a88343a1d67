use crate::dispatch::{AudioEvent, AudioProcessor, Control};

/// Fraction of adjacent sample pairs whose signs differ.
pub fn zero_crossing_rate(samples: &[f32]) -> f32 {
    if samples.len() < 2 {
        return 0.0;
    }
    let crossings = samples
        .windows(2)
        .filter(|pair| pair[0] * pair[1] < 0.0)
        .count();
    crossings as f32 / (samples.len() - 1) as f32
}

/// Records the zero-crossing rate of each window.
#[derive(Debug, Clone, Copy, Default)]
pub struct ZeroCrossingRate {
    rate: f32,
}

impl ZeroCrossingRate {
    pub fn new() -> Self {
        Self::default()
    }

    /// Rate of the last window.
    pub fn rate(&self) -> f32 {
        self.rate
    }
}

impl AudioProcessor for ZeroCrossingRate {
    fn process(&mut self, event: &mut AudioEvent) -> Control {
        self.rate = zero_crossing_rate(event.buffer());
        Control::Continue
    }
}
