use crate::{
    dispatch::{AudioEvent, AudioProcessor, Control},
    error::{Error, Result},
};

/// Truncates samples to a lower bit depth ("bitcrusher").
#[derive(Debug, Clone, Copy)]
pub struct BitDepth {
    bits: u32,
    scale: f32,
}

impl BitDepth {
    /// `bits` must be between 2 and 24.
    pub fn new(bits: u32) -> Result<Self> {
        if !(2..=24).contains(&bits) {
            return Err(Error::InvalidParameters(format!(
                "bit depth must be between 2 and 24, got {bits}"
            )));
        }
        Ok(Self {
            bits,
            scale: ((1u32 << bits) / 2 - 1) as f32,
        })
    }

    pub fn bits(&self) -> u32 {
        self.bits
    }
}

impl AudioProcessor for BitDepth {
    fn process(&mut self, event: &mut AudioEvent) -> Control {
        for s in event.buffer_mut() {
            *s = (*s * self.scale).trunc() / self.scale;
        }
        Control::Continue
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::io::AudioFormat;

    #[test]
    fn three_bits_leave_three_levels_per_side() {
        let format = AudioFormat::pcm16(8_000.0, 1).unwrap();
        let mut event = AudioEvent::with_samples(format, vec![0.5, 0.9, -0.4, 0.3]);

        BitDepth::new(3).unwrap().process(&mut event);

        let expected = [1.0 / 3.0, 2.0 / 3.0, -1.0 / 3.0, 0.0];
        for (got, want) in event.buffer().iter().zip(expected) {
            assert!((got - want).abs() < 1e-6, "{got} != {want}");
        }
    }

    #[test]
    fn rejects_unusable_depths() {
        assert!(BitDepth::new(1).is_err());
        assert!(BitDepth::new(32).is_err());
    }
}
