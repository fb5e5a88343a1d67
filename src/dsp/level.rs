//! Signal level measurement: RMS and sound pressure level.

/*
Signal Level
============

Vocabulary
----------

  RMS           Root mean square. The square root of the average squared
                sample value. A steady measure of how "big" a block is,
                unlike the peak which reacts to single samples.

                  rms = sqrt( (x0² + x1² + ... + xn-1²) / n )

  dB            Logarithmic level relative to full scale (1.0):

                  dB = 20 × log₁₀(rms)

                A full-scale square wave sits at 0 dB, a full-scale sine at
                about -3 dB, and digital silence at -∞.

  SPL           "Sound pressure level" as used throughout this crate: the
                dB value of a block's RMS. It is relative to digital full
                scale, not a calibrated acoustic measurement.


Silence
-------

A block is silent when its SPL falls below a threshold. -70 dB is the usual
default: quiet enough to ignore dithering and background hiss, loud enough
that any real signal clears it.
*/

/// Default silence threshold in dB.
pub const DEFAULT_SILENCE_THRESHOLD: f64 = -70.0;

/// Root mean square of a block. Empty blocks have an RMS of 0.
pub fn rms(samples: &[f32]) -> f64 {
    if samples.is_empty() {
        return 0.0;
    }
    let sum: f64 = samples.iter().map(|&s| s as f64 * s as f64).sum();
    (sum / samples.len() as f64).sqrt()
}

/// Convert a linear amplitude to dB. Zero maps to negative infinity.
#[inline]
pub fn linear_to_db(value: f64) -> f64 {
    20.0 * value.log10()
}

/// Sound pressure level of a block in dB relative to full scale.
pub fn sound_pressure_level(samples: &[f32]) -> f64 {
    linear_to_db(rms(samples))
}

/// Whether the block's SPL is below `threshold_db`.
pub fn is_silence(samples: &[f32], threshold_db: f64) -> bool {
    sound_pressure_level(samples) < threshold_db
}

#[cfg(test)]
mod tests {
    use super::*;
    use approx::assert_abs_diff_eq;

    #[test]
    fn square_wave_rms_equals_amplitude() {
        let block: Vec<f32> = (0..64).map(|i| if i % 2 == 0 { 0.5 } else { -0.5 }).collect();
        assert_abs_diff_eq!(rms(&block), 0.5, epsilon = 1e-9);
    }

    #[test]
    fn full_scale_sine_is_about_minus_three_db() {
        let block: Vec<f32> = (0..4800)
            .map(|i| (2.0 * std::f32::consts::PI * i as f32 / 48.0).sin())
            .collect();
        assert_abs_diff_eq!(sound_pressure_level(&block), -3.01, epsilon = 0.01);
    }

    #[test]
    fn digital_silence_is_negative_infinity() {
        let block = [0.0f32; 32];
        assert_eq!(sound_pressure_level(&block), f64::NEG_INFINITY);
        assert!(is_silence(&block, DEFAULT_SILENCE_THRESHOLD));
    }

    #[test]
    fn quiet_noise_counts_as_silence() {
        let block = [1e-4f32; 32]; // -80 dB
        assert!(is_silence(&block, DEFAULT_SILENCE_THRESHOLD));
        assert!(!is_silence(&[0.1f32; 32], DEFAULT_SILENCE_THRESHOLD));
    }
}
