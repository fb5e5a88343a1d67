use crate::dispatch::{AudioEvent, AudioProcessor, Control};

/// Halts the stream at a given time.
///
/// The first window starting at or after `stop_time` seconds, and every
/// processor after this one, is dropped.
#[derive(Debug, Clone, Copy)]
pub struct StopAt {
    stop_time: f64,
}

impl StopAt {
    pub fn new(stop_time: f64) -> Self {
        Self { stop_time }
    }

    pub fn stop_time(&self) -> f64 {
        self.stop_time
    }

    pub fn set_stop_time(&mut self, stop_time: f64) {
        self.stop_time = stop_time;
    }
}

impl AudioProcessor for StopAt {
    fn process(&mut self, event: &mut AudioEvent) -> Control {
        if event.timestamp() >= self.stop_time {
            Control::StopStream
        } else {
            Control::Continue
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::io::AudioFormat;

    #[test]
    fn halts_once_the_window_reaches_the_stop_time() {
        let format = AudioFormat::pcm16(1_000.0, 1).unwrap();
        let mut event = AudioEvent::with_samples(format, vec![0.0; 100]);
        let mut stop = StopAt::new(0.5);

        event.set_bytes_processed(2 * 400);
        assert_eq!(stop.process(&mut event), Control::Continue);
        event.set_bytes_processed(2 * 500);
        assert_eq!(stop.process(&mut event), Control::StopStream);
    }
}
