use crate::dispatch::{AudioEvent, AudioProcessor, Control};

/// Multiplies every sample by a fixed gain, clipping to [-1, 1].
#[derive(Debug, Clone, Copy)]
pub struct Gain {
    gain: f32,
}

impl Gain {
    pub fn new(gain: f32) -> Self {
        Self { gain }
    }

    pub fn gain(&self) -> f32 {
        self.gain
    }

    pub fn set_gain(&mut self, gain: f32) {
        self.gain = gain;
    }
}

impl AudioProcessor for Gain {
    fn process(&mut self, event: &mut AudioEvent) -> Control {
        apply_gain(event.buffer_mut(), self.gain);
        Control::Continue
    }
}

#[inline]
fn apply_gain(samples: &mut [f32], gain: f32) {
    for s in samples.iter_mut() {
        *s = (*s * gain).clamp(-1.0, 1.0);
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::io::AudioFormat;

    #[test]
    fn scales_and_clips() {
        let format = AudioFormat::pcm16(8_000.0, 1).unwrap();
        let mut event = AudioEvent::with_samples(format, vec![0.1, -0.2, 0.6, -0.9]);

        Gain::new(2.0).process(&mut event);

        assert_eq!(event.buffer(), &[0.2, -0.4, 1.0, -1.0]);
    }
}
