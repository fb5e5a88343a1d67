//! Linear fades, timed from the first window a fade processor sees.

use crate::dispatch::{AudioEvent, AudioProcessor, Control};

/// Scale each frame by `gain(t)`, where `t` is the frame's time in seconds
/// since `start`. Returns the time just past the last frame.
fn apply_ramp(event: &mut AudioEvent, start: f64, gain: impl Fn(f64) -> f32) -> f64 {
    let sample_rate = event.sample_rate() as f64;
    let channels = event.channels();
    let offset = event.timestamp() - start;

    let mut frames = 0;
    for (i, frame) in event.buffer_mut().chunks_mut(channels).enumerate() {
        let g = gain(offset + i as f64 / sample_rate);
        for s in frame {
            *s *= g;
        }
        frames = i + 1;
    }
    offset + frames as f64 / sample_rate
}

/// Fades from silence to full level over `duration` seconds.
#[derive(Debug, Clone)]
pub struct FadeIn {
    duration: f64,
    start: Option<f64>,
    done: bool,
}

impl FadeIn {
    pub fn new(duration: f64) -> Self {
        Self {
            duration,
            start: None,
            done: duration <= 0.0,
        }
    }

    pub fn is_done(&self) -> bool {
        self.done
    }
}

impl AudioProcessor for FadeIn {
    fn process(&mut self, event: &mut AudioEvent) -> Control {
        if self.done {
            return Control::Continue;
        }

        let start = *self.start.get_or_insert(event.timestamp());
        let duration = self.duration;
        let end = apply_ramp(event, start, |t| (t / duration).clamp(0.0, 1.0) as f32);
        if end >= duration {
            self.done = true;
        }
        Control::Continue
    }
}

/// Fades from full level to silence over `duration` seconds, then keeps the
/// stream silent.
#[derive(Debug, Clone)]
pub struct FadeOut {
    duration: f64,
    start: Option<f64>,
    halt_when_silent: bool,
}

impl FadeOut {
    pub fn new(duration: f64) -> Self {
        Self {
            duration,
            start: None,
            halt_when_silent: false,
        }
    }

    /// Halt the stream once the fade has reached silence.
    pub fn halt_when_silent(mut self, enabled: bool) -> Self {
        self.halt_when_silent = enabled;
        self
    }
}

impl AudioProcessor for FadeOut {
    fn process(&mut self, event: &mut AudioEvent) -> Control {
        let start = *self.start.get_or_insert(event.timestamp());
        let duration = self.duration;
        let end = apply_ramp(event, start, |t| {
            if duration <= 0.0 {
                0.0
            } else {
                (1.0 - t / duration).clamp(0.0, 1.0) as f32
            }
        });

        if self.halt_when_silent && end >= duration {
            Control::StopStream
        } else {
            Control::Continue
        }
    }
}
