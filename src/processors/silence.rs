use crate::{
    dispatch::{AudioEvent, AudioProcessor, Control},
    dsp::level::{self, DEFAULT_SILENCE_THRESHOLD},
};

/// Measures each window's level and optionally vetoes silent windows.
///
/// With `veto_silence` enabled, processors after this one only see windows
/// louder than the threshold. The stream itself keeps running.
#[derive(Debug, Clone)]
pub struct SilenceDetector {
    threshold_db: f64,
    veto_silence: bool,
    current_spl: f64,
    silent_windows: u64,
}

impl SilenceDetector {
    pub fn new(threshold_db: f64) -> Self {
        Self {
            threshold_db,
            veto_silence: false,
            current_spl: f64::NEG_INFINITY,
            silent_windows: 0,
        }
    }

    /// Stop the chain for silent windows.
    pub fn veto_silence(mut self, enabled: bool) -> Self {
        self.veto_silence = enabled;
        self
    }

    pub fn threshold(&self) -> f64 {
        self.threshold_db
    }

    /// Level of the last window in dB.
    pub fn current_spl(&self) -> f64 {
        self.current_spl
    }

    pub fn silent_windows(&self) -> u64 {
        self.silent_windows
    }
}

impl Default for SilenceDetector {
    fn default() -> Self {
        Self::new(DEFAULT_SILENCE_THRESHOLD)
    }
}

impl AudioProcessor for SilenceDetector {
    fn process(&mut self, event: &mut AudioEvent) -> Control {
        self.current_spl = level::sound_pressure_level(event.buffer());
        if self.current_spl >= self.threshold_db {
            return Control::Continue;
        }

        self.silent_windows += 1;
        if self.veto_silence {
            Control::StopWindow
        } else {
            Control::Continue
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::io::AudioFormat;

    fn event(samples: Vec<f32>) -> AudioEvent {
        AudioEvent::with_samples(AudioFormat::pcm16(8_000.0, 1).unwrap(), samples)
    }

    #[test]
    fn measures_without_vetoing_by_default() {
        let mut detector = SilenceDetector::default();

        assert_eq!(detector.process(&mut event(vec![0.0; 64])), Control::Continue);
        assert_eq!(detector.silent_windows(), 1);
        assert_eq!(detector.current_spl(), f64::NEG_INFINITY);
    }

    #[test]
    fn vetoes_only_silent_windows() {
        let mut detector = SilenceDetector::default().veto_silence(true);

        assert_eq!(detector.process(&mut event(vec![1e-5; 64])), Control::StopWindow);
        assert_eq!(detector.process(&mut event(vec![0.3; 64])), Control::Continue);
        assert!(detector.current_spl() > -11.0);
    }
}
