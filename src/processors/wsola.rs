use log::{debug, warn};

use crate::{
    dispatch::{AudioEvent, AudioProcessor, Control},
    dsp::wsola::{WsolaLengths, WsolaParams, WsolaStretcher},
    error::Result,
};

/// Time stretching processor for mono streams.
///
/// Consumes windows of [`input_buffer_size`](Self::input_buffer_size)
/// samples and replaces each with a stretched block of
/// `seek_window - overlap` samples. Build the dispatcher with
/// `input_buffer_size()` and `overlap()`; after a parameter change the
/// processor asks the dispatcher for the new geometry itself.
///
/// Multichannel streams must be folded first, e.g. with
/// [`MultichannelToMono`](crate::processors::MultichannelToMono). An
/// interleaved window halts the stream.
pub struct Wsola {
    stretcher: WsolaStretcher,
    output: Vec<f32>,
    pending: Option<WsolaParams>,
    warned: bool,
}

impl Wsola {
    pub fn new(params: WsolaParams) -> Result<Self> {
        let stretcher = WsolaStretcher::new(params)?;
        let output = vec![0.0; stretcher.lengths().output_size()];
        Ok(Self {
            stretcher,
            output,
            pending: None,
            warned: false,
        })
    }

    /// Window size the dispatcher must deliver, in frames.
    pub fn input_buffer_size(&self) -> usize {
        self.stretcher.lengths().input_size()
    }

    /// Window overlap the dispatcher must use, in frames.
    pub fn overlap(&self) -> usize {
        self.stretcher.lengths().input_overlap()
    }

    pub fn lengths(&self) -> &WsolaLengths {
        self.stretcher.lengths()
    }

    /// Parameters in force, not counting a queued change.
    pub fn params(&self) -> &WsolaParams {
        self.stretcher.params()
    }

    /// Queue new parameters. They take effect after the current window, and
    /// the dispatcher switches geometry for the window after that.
    pub fn set_parameters(&mut self, params: WsolaParams) -> Result<()> {
        WsolaLengths::from_params(&params)?;
        self.pending = Some(params);
        Ok(())
    }

    /// Queue a tempo change, keeping the segment lengths.
    pub fn set_tempo(&mut self, tempo: f64) -> Result<()> {
        let base = self.pending.unwrap_or(*self.stretcher.params());
        self.set_parameters(base.with_tempo(tempo))
    }

    pub fn has_pending_change(&self) -> bool {
        self.pending.is_some()
    }
}

impl AudioProcessor for Wsola {
    fn process(&mut self, event: &mut AudioEvent) -> Control {
        let lengths = *self.stretcher.lengths();
        let len = event.buffer().len();
        if len != lengths.input_size() {
            let channels = event.channels();
            if channels > 1 && len == lengths.input_size() * channels {
                warn!("wsola needs mono input, got {channels} interleaved channels; halting");
                return Control::StopStream;
            }
            if !self.warned {
                self.warned = true;
                warn!(
                    "wsola expects {} samples per window, got {len}; skipping such windows",
                    lengths.input_size()
                );
            }
            return Control::StopWindow;
        }

        self.output.resize(lengths.output_size(), 0.0);
        self.stretcher.process(event.buffer(), &mut self.output);
        event.swap_buffer(&mut self.output);
        event.set_overlap(0);

        if let Some(params) = self.pending.take() {
            match self.stretcher.configure(params) {
                Ok(()) => {
                    let next = self.stretcher.lengths();
                    debug!(
                        "wsola tempo {} -> input {} / overlap {}",
                        params.tempo,
                        next.input_size(),
                        next.input_overlap()
                    );
                    event.request_geometry(next.input_size(), next.input_overlap());
                }
                Err(e) => warn!("ignoring wsola parameters: {e}"),
            }
        }

        Control::Continue
    }
}
