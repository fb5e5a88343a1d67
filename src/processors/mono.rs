use crate::dispatch::{AudioEvent, AudioProcessor, Control};

/// How interleaved channels are folded into one.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Downmix {
    /// Average of all channels.
    Mean,
    /// Keep the first channel, drop the rest.
    First,
}

/// Replaces an interleaved multichannel window with a mono one.
///
/// The event's format still describes the source; later processors should
/// treat the buffer as one sample per frame.
#[derive(Debug, Clone)]
pub struct MultichannelToMono {
    mode: Downmix,
    mono: Vec<f32>,
}

impl MultichannelToMono {
    pub fn new(mode: Downmix) -> Self {
        Self {
            mode,
            mono: Vec::new(),
        }
    }

    pub fn mean() -> Self {
        Self::new(Downmix::Mean)
    }

    pub fn first_channel() -> Self {
        Self::new(Downmix::First)
    }
}

impl AudioProcessor for MultichannelToMono {
    fn process(&mut self, event: &mut AudioEvent) -> Control {
        let channels = event.channels();
        if channels <= 1 {
            return Control::Continue;
        }

        self.mono.clear();
        self.mono
            .extend(event.buffer().chunks_exact(channels).map(|frame| match self.mode {
                Downmix::Mean => frame.iter().sum::<f32>() / channels as f32,
                Downmix::First => frame[0],
            }));

        let overlap = event.overlap() / channels;
        event.swap_buffer(&mut self.mono);
        event.set_overlap(overlap);
        Control::Continue
    }
}
