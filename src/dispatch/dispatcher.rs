//! The blocking read loop that slides windows over a source.

/*
Sliding Windows
===============

Most analysis works on short overlapping windows: a pitch tracker wants 1024
samples at a time, advancing by 512, so every sample is seen twice.

    window  W   frames per event
    overlap O   frames repeated from the previous window
    step    S = W - O   new frames read per window

    source   ├─────────────────────────────────────────────────▶
    window 0 ├──────── W ────────┤
    window 1          ├──────── W ────────┤
    window 2                   ├──────── W ────────┤
             ◀── S ──▶◀── S ──▶

Between windows the trailing O samples slide to the front of the scratch
buffer and only S new frames are read and decoded:

    before   [ a a a a a a | b b b b ]      O = 4
    shift    [ b b b b | . . . . . . ]
    read     [ b b b b | c c c c c c ]      S = 6 new frames


First and Last Window
---------------------

The first window has nothing to carry over. By default it is read in full
(W fresh frames, reported overlap 0). With `zero_pad_first` it starts with O
frames of silence instead, so every window including the first carries
exactly O old frames.

The last read is usually short. With `zero_pad_last` (the default) the
remainder is filled with silence and every window keeps length W. Without it
the buffers shrink to what was actually read.


Byte Accounting
---------------

Timestamps are derived from the byte offset of each window's start, which
advances by the step (S frames) per window, or by what was actually read
when the stream ends early. Window k therefore starts at k × S frames, plus
whatever was skipped before the run.


Geometry Changes
----------------

A processor may ask for a new (W', O') while a window is in flight. The next
window still starts one old step later, so no input is repeated or lost.
Whatever the old window already holds past that point is carried into the
new buffer; for that one window the reported overlap is the carried amount
rather than O'. Carried frames that do not fit into a smaller W' are queued
and served before the next read:

    old      [ a a a a | b b b b b b ]      W = 10, O = 6, S = 4
    new      [ b b b b ] + queued [ b b ]   W' = 4
*/

use std::sync::{
    atomic::{AtomicBool, Ordering},
    Arc,
};

use log::{debug, trace, warn};
use parking_lot::Mutex;

use crate::{
    dispatch::{
        event::AudioEvent,
        processor::{AudioProcessor, Control, ProcessorChain, ProcessorId},
    },
    error::{Error, Result},
    io::{AudioFormat, AudioSource, ReadStatus, SampleConverter},
};

/// Window size and overlap, both in frames.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct Geometry {
    pub window: usize,
    pub overlap: usize,
}

impl Geometry {
    pub fn new(window: usize, overlap: usize) -> Result<Self> {
        Geometry { window, overlap }.validated()
    }

    /// Frames read per window after the first.
    pub fn step(&self) -> usize {
        self.window - self.overlap
    }

    fn validated(self) -> Result<Self> {
        if self.window == 0 || self.overlap >= self.window {
            return Err(Error::InvalidGeometry {
                window: self.window,
                overlap: self.overlap,
            });
        }
        Ok(self)
    }
}

struct Shared {
    chain: ProcessorChain,
    stopped: AtomicBool,
    running: AtomicBool,
}

impl Shared {
    fn stop(&self) {
        if !self.stopped.swap(true, Ordering::AcqRel) {
            debug!("dispatcher stop requested");
        }
        // A running loop notifies the chain itself on its way out.
        if !self.running.load(Ordering::Acquire) {
            self.chain.finish_all();
        }
    }
}

/// Thread-safe handle for stopping a dispatcher and editing its chain while
/// `run()` blocks another thread.
#[derive(Clone)]
pub struct DispatcherHandle {
    shared: Arc<Shared>,
}

impl DispatcherHandle {
    /// Stop the stream. Every processor is notified exactly once, however
    /// often this is called.
    pub fn stop(&self) {
        self.shared.stop();
    }

    pub fn is_stopped(&self) -> bool {
        self.shared.stopped.load(Ordering::Acquire)
    }

    pub fn add_processor<P: AudioProcessor + 'static>(&self, processor: P) -> ProcessorId {
        self.shared.chain.add(processor)
    }

    pub fn add_shared<P: AudioProcessor + 'static>(&self, processor: Arc<Mutex<P>>) -> ProcessorId {
        self.shared.chain.add_shared(processor)
    }

    pub fn remove_processor(&self, id: ProcessorId) -> bool {
        self.shared.chain.remove(id)
    }
}

/// Reads overlapping windows from a source and drives the processor chain.
///
/// The source is closed when the run ends, on [`stop`](Self::stop), or when
/// the dispatcher is dropped, whichever comes first.
pub struct Dispatcher<S: AudioSource> {
    source: S,
    format: AudioFormat,
    converter: SampleConverter,
    geometry: Geometry,
    zero_pad_first: bool,
    zero_pad_last: bool,
    shared: Arc<Shared>,
    event: AudioEvent,
    samples: Vec<f32>,
    bytes: Vec<u8>,
    bytes_processed: u64,
    /// Frames already in place at the front of `samples` for the next read.
    carried: Option<usize>,
    /// Decoded samples that follow the carried frames, left over when a
    /// geometry change shrank the window.
    backlog: Vec<f32>,
    exhausted: bool,
    closed: bool,
}

impl<S: AudioSource> Dispatcher<S> {
    /// Dispatch windows of `window` frames overlapping by `overlap` frames.
    pub fn new(source: S, window: usize, overlap: usize) -> Result<Self> {
        let geometry = Geometry::new(window, overlap)?;
        let format = *source.format();
        let mut event = AudioEvent::new(format);
        event.set_frame_length(source.frame_length());

        let channels = format.channels() as usize;
        Ok(Self {
            converter: SampleConverter::new(&format),
            samples: vec![0.0; window * channels],
            bytes: vec![0; window * format.frame_size()],
            source,
            format,
            geometry,
            zero_pad_first: false,
            zero_pad_last: true,
            shared: Arc::new(Shared {
                chain: ProcessorChain::new(),
                stopped: AtomicBool::new(false),
                running: AtomicBool::new(false),
            }),
            event,
            bytes_processed: 0,
            carried: None,
            backlog: Vec::new(),
            exhausted: false,
            closed: false,
        })
    }

    /// Start the first window with `overlap` frames of silence instead of
    /// reading it in full.
    pub fn zero_pad_first(mut self, enabled: bool) -> Self {
        self.zero_pad_first = enabled;
        self
    }

    /// Pad a short last window with silence (default) instead of shrinking it.
    pub fn zero_pad_last(mut self, enabled: bool) -> Self {
        self.zero_pad_last = enabled;
        self
    }

    pub fn format(&self) -> &AudioFormat {
        &self.format
    }

    pub fn geometry(&self) -> Geometry {
        self.geometry
    }

    /// Byte offset of the next window start.
    pub fn bytes_processed(&self) -> u64 {
        self.bytes_processed
    }

    pub fn is_stopped(&self) -> bool {
        self.shared.stopped.load(Ordering::Acquire)
    }

    pub fn handle(&self) -> DispatcherHandle {
        DispatcherHandle {
            shared: self.shared.clone(),
        }
    }

    pub fn add_processor<P: AudioProcessor + 'static>(&self, processor: P) -> ProcessorId {
        self.shared.chain.add(processor)
    }

    pub fn add_shared<P: AudioProcessor + 'static>(&self, processor: Arc<Mutex<P>>) -> ProcessorId {
        self.shared.chain.add_shared(processor)
    }

    /// Remove a processor, delivering its `on_finished`.
    pub fn remove_processor(&self, id: ProcessorId) -> bool {
        self.shared.chain.remove(id)
    }

    /// Skip `seconds` of audio before the run. Timestamps include the
    /// skipped part.
    pub fn skip(&mut self, seconds: f64) -> Result<()> {
        let frames = (seconds * self.format.sample_rate() as f64).round().max(0.0) as u64;
        let expected = frames * self.format.frame_size() as u64;
        let skipped = self.source.skip(expected)?;
        self.bytes_processed += skipped;

        if skipped != expected {
            return Err(Error::Skip { expected, skipped });
        }
        debug!("skipped {seconds} s ({skipped} bytes)");
        Ok(())
    }

    /// Change the window geometry before the run. Processors change it
    /// mid-stream with [`AudioEvent::request_geometry`].
    pub fn set_window_and_overlap(&mut self, window: usize, overlap: usize) -> Result<()> {
        let geometry = Geometry::new(window, overlap)?;
        let channels = self.format.channels() as usize;
        self.samples = vec![0.0; window * channels];
        self.bytes = vec![0; window * self.format.frame_size()];
        self.carried = None;
        self.backlog.clear();
        self.geometry = geometry;
        Ok(())
    }

    /// Stop without running. Notifies the chain and closes the source.
    /// A stop through a [`DispatcherHandle`] outside a run leaves closing
    /// to the next `run()` or to drop.
    pub fn stop(&mut self) {
        self.shared.stop();
        self.close_source();
    }

    /// Read and dispatch windows until the stream ends, a processor halts
    /// the pipeline, or `stop()` is called on a handle.
    ///
    /// Every processor's `on_finished` has run by the time this returns,
    /// including when an I/O error is returned.
    pub fn run(&mut self) -> Result<()> {
        if self.is_stopped() {
            self.shared.chain.finish_all();
            self.close_source();
            return Ok(());
        }

        self.shared.running.store(true, Ordering::Release);
        let result = self.dispatch_loop();
        self.shared.stopped.store(true, Ordering::Release);
        self.shared.running.store(false, Ordering::Release);

        self.shared.chain.finish_all();
        self.close_source();

        if let Err(e) = &result {
            warn!("dispatch stopped on error: {e}");
        }
        result
    }

    fn dispatch_loop(&mut self) -> Result<()> {
        while !self.is_stopped() && !self.exhausted {
            let Some(advance) = self.read_next_window()? else {
                break;
            };

            let frame_size = self.format.frame_size();
            let channels = self.format.channels() as usize;
            let carried = self.carried.unwrap_or(0);
            self.event.load_window(
                &self.samples,
                carried * channels,
                self.bytes_processed,
                self.samples.len() / channels * frame_size,
            );
            trace!(
                "window at {:.3} s: {} frames, advancing {}",
                self.event.timestamp(),
                self.samples.len() / channels,
                advance
            );

            let snapshot = self.shared.chain.snapshot();
            let control = ProcessorChain::dispatch(&snapshot, &mut self.event);
            self.bytes_processed += (advance * frame_size) as u64;

            let next = match self.event.take_geometry_request().map(Geometry::validated) {
                Some(Ok(geometry)) => geometry,
                Some(Err(e)) => {
                    warn!("ignoring geometry request: {e}");
                    self.geometry
                }
                None => self.geometry,
            };
            self.carry_overlap(next);

            if control == Control::StopStream {
                debug!("processor halted the stream");
                self.shared.stopped.store(true, Ordering::Release);
            }
        }
        Ok(())
    }

    /// Fill the part of the window after the carried frames. Returns how
    /// many frames the next window start lies past this one, or `None` when
    /// there is nothing left to dispatch.
    fn read_next_window(&mut self) -> Result<Option<usize>> {
        let channels = self.format.channels() as usize;
        let frame_size = self.format.frame_size();
        let window = self.samples.len() / channels;

        let start = match self.carried {
            Some(frames) => frames,
            None if self.zero_pad_first => {
                self.samples[..self.geometry.overlap * channels].fill(0.0);
                self.geometry.overlap
            }
            None => 0,
        };
        self.carried = Some(start);

        let queued = (self.backlog.len() / channels).min(window - start);
        self.samples[start * channels..(start + queued) * channels]
            .copy_from_slice(&self.backlog[..queued * channels]);
        self.backlog.drain(..queued * channels);

        let offset = start + queued;
        let read = self.fill_bytes(offset * frame_size)?;
        if self.is_stopped() {
            return Ok(None);
        }

        // A trailing partial frame cannot be decoded.
        let fresh = read / frame_size;
        let frames = queued + fresh;
        if frames == 0 && offset < window {
            return Ok(None);
        }

        let filled = offset + fresh;
        let byte_range = offset * frame_size..filled * frame_size;
        let sample_range = offset * channels..filled * channels;
        self.converter
            .to_floats(&self.bytes[byte_range], &mut self.samples[sample_range]);

        let step = self.geometry.step();
        let advance = if filled == window { step } else { frames.min(step) };

        if filled < window {
            if self.zero_pad_last {
                self.samples[filled * channels..].fill(0.0);
            } else {
                debug!("shrinking last window from {window} to {filled} frames");
                self.samples.truncate(filled * channels);
                self.bytes.truncate(filled * frame_size);
                self.geometry = Geometry {
                    window: filled,
                    overlap: self.geometry.overlap.min(filled - 1),
                };
            }
        }

        Ok(Some(advance))
    }

    /// Read into `bytes[offset..]` until it is full, the source is
    /// exhausted, or the dispatcher is stopped.
    fn fill_bytes(&mut self, offset: usize) -> Result<usize> {
        let end = self.bytes.len();
        let mut filled = offset;

        while filled < end && !self.is_stopped() {
            match self.source.read(&mut self.bytes[filled..end])? {
                ReadStatus::Read(0) => std::thread::yield_now(),
                ReadStatus::Read(n) => filled += n,
                ReadStatus::Exhausted => {
                    self.exhausted = true;
                    break;
                }
            }
        }
        Ok(filled - offset)
    }

    /// Slide what the next window shares with this one to the front of the
    /// buffer. The next window starts one step of the current geometry
    /// later, whatever geometry it is read with.
    fn carry_overlap(&mut self, next: Geometry) {
        let channels = self.format.channels() as usize;
        let len = self.samples.len();
        let tail_start = (self.geometry.step() * channels).min(len);

        if next == self.geometry {
            self.samples.copy_within(tail_start.., 0);
            self.carried = Some((len - tail_start) / channels);
            return;
        }

        debug!(
            "geometry {}/{} -> {}/{}",
            self.geometry.window, self.geometry.overlap, next.window, next.overlap
        );
        let mut samples = vec![0.0; next.window * channels];
        let tail = &self.samples[tail_start..];
        let keep = tail.len().min(samples.len());
        samples[..keep].copy_from_slice(&tail[..keep]);
        let mut backlog = tail[keep..].to_vec();
        backlog.append(&mut self.backlog);
        self.backlog = backlog;

        self.samples = samples;
        self.bytes = vec![0; next.window * self.format.frame_size()];
        self.carried = Some(keep / channels);
        self.geometry = next;
    }

    fn close_source(&mut self) {
        if self.closed {
            return;
        }
        self.closed = true;
        if let Err(e) = self.source.close() {
            warn!("failed to close source: {e}");
        }
    }
}

impl<S: AudioSource> Drop for Dispatcher<S> {
    fn drop(&mut self) {
        self.close_source();
    }
}
