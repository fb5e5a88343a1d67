use crate::dispatch::{AudioEvent, AudioProcessor, Control};

/// Measures how long the stream was, in seconds, once it finishes.
#[derive(Debug, Clone, Default)]
pub struct DurationProbe {
    last_end: Option<f64>,
    duration: Option<f64>,
}

impl DurationProbe {
    pub fn new() -> Self {
        Self::default()
    }

    /// Stream duration, available after the stream finished. Includes any
    /// padding of the last window.
    pub fn duration(&self) -> Option<f64> {
        self.duration
    }
}

impl AudioProcessor for DurationProbe {
    fn process(&mut self, event: &mut AudioEvent) -> Control {
        self.last_end = Some(event.end_timestamp());
        Control::Continue
    }

    fn on_finished(&mut self) {
        self.duration = Some(self.last_end.unwrap_or(0.0));
    }
}
