//! The window of audio handed to every processor.

use crate::{
    dispatch::dispatcher::Geometry,
    dsp::level,
    io::{AudioFormat, SampleConverter},
};

/// One window of normalized samples plus its position in the stream.
///
/// The dispatcher owns a single event per run and reuses it for every
/// window. Processors receive it by `&mut` borrow: they may edit the samples
/// in place, swap in a buffer of a different length, or ask the dispatcher
/// for a different window geometry starting with the next read.
///
/// Multichannel audio is interleaved. `overlap` counts samples, so for a
/// stereo stream it is twice the overlap in frames.
#[derive(Debug, Clone)]
pub struct AudioEvent {
    format: AudioFormat,
    converter: SampleConverter,
    buffer: Vec<f32>,
    overlap: usize,
    bytes_processed: u64,
    bytes_processing: usize,
    frame_length: Option<u64>,
    byte_scratch: Vec<u8>,
    geometry_request: Option<Geometry>,
}

impl AudioEvent {
    pub fn new(format: AudioFormat) -> Self {
        Self {
            format,
            converter: SampleConverter::new(&format),
            buffer: Vec::new(),
            overlap: 0,
            bytes_processed: 0,
            bytes_processing: 0,
            frame_length: None,
            byte_scratch: Vec::new(),
            geometry_request: None,
        }
    }

    /// Event holding `samples`, positioned at the start of the stream.
    pub fn with_samples(format: AudioFormat, samples: Vec<f32>) -> Self {
        let mut event = Self::new(format);
        event.bytes_processing = samples.len() * format.bytes_per_sample();
        event.buffer = samples;
        event
    }

    pub fn format(&self) -> &AudioFormat {
        &self.format
    }

    pub fn sample_rate(&self) -> f32 {
        self.format.sample_rate()
    }

    pub fn channels(&self) -> usize {
        self.format.channels() as usize
    }

    pub fn buffer(&self) -> &[f32] {
        &self.buffer
    }

    pub fn buffer_mut(&mut self) -> &mut [f32] {
        &mut self.buffer
    }

    /// Install `buffer` as the window and return the previous one so the
    /// caller can reuse its allocation.
    pub fn replace_buffer(&mut self, buffer: Vec<f32>) -> Vec<f32> {
        std::mem::replace(&mut self.buffer, buffer)
    }

    /// Exchange the window with `buffer` without allocating.
    pub fn swap_buffer(&mut self, buffer: &mut Vec<f32>) {
        std::mem::swap(&mut self.buffer, buffer);
    }

    /// Set every sample of the window to zero.
    pub fn clear_buffer(&mut self) {
        self.buffer.fill(0.0);
    }

    /// Leading samples carried over from the previous window.
    pub fn overlap(&self) -> usize {
        self.overlap
    }

    /// Clamped below the buffer length.
    pub fn set_overlap(&mut self, overlap: usize) {
        self.overlap = overlap.min(self.buffer.len().saturating_sub(1));
    }

    /// Byte offset of the window start in the source.
    pub fn bytes_processed(&self) -> u64 {
        self.bytes_processed
    }

    pub fn set_bytes_processed(&mut self, bytes: u64) {
        self.bytes_processed = bytes;
    }

    /// Byte span of the current window.
    pub fn bytes_processing(&self) -> usize {
        self.bytes_processing
    }

    pub fn set_bytes_processing(&mut self, bytes: usize) {
        self.bytes_processing = bytes;
    }

    /// Total stream length in frames, when the source knows it.
    pub fn frame_length(&self) -> Option<u64> {
        self.frame_length
    }

    pub fn set_frame_length(&mut self, frames: Option<u64>) {
        self.frame_length = frames;
    }

    pub fn frames_processed(&self) -> u64 {
        self.bytes_processed / self.format.frame_size() as u64
    }

    /// Start of the window in seconds.
    pub fn timestamp(&self) -> f64 {
        self.frames_processed() as f64 / self.format.sample_rate() as f64
    }

    /// End of the window in seconds.
    pub fn end_timestamp(&self) -> f64 {
        let end = self.bytes_processed + self.bytes_processing as u64;
        (end / self.format.frame_size() as u64) as f64 / self.format.sample_rate() as f64
    }

    /// Fraction of the stream before this window, when its length is known.
    pub fn progress(&self) -> Option<f64> {
        match self.frame_length {
            Some(total) if total > 0 => Some(self.frames_processed() as f64 / total as f64),
            _ => None,
        }
    }

    pub fn rms(&self) -> f64 {
        level::rms(&self.buffer)
    }

    /// Window level in dB relative to full scale.
    pub fn sound_pressure_level(&self) -> f64 {
        level::sound_pressure_level(&self.buffer)
    }

    pub fn is_silence(&self, threshold_db: f64) -> bool {
        level::is_silence(&self.buffer, threshold_db)
    }

    /// The window encoded back into the stream's byte format.
    ///
    /// Encoded on every call; the scratch allocation is kept between calls.
    pub fn byte_buffer(&mut self) -> &[u8] {
        let len = self.buffer.len() * self.converter.bytes_per_sample();
        self.byte_scratch.resize(len, 0);
        self.converter.to_bytes(&self.buffer, &mut self.byte_scratch);
        &self.byte_scratch
    }

    /// Ask the dispatcher to read `window` frames with `overlap` frames of
    /// overlap from the next window on. The last request of a window wins.
    pub fn request_geometry(&mut self, window: usize, overlap: usize) {
        self.geometry_request = Some(Geometry { window, overlap });
    }

    pub fn pending_geometry(&self) -> Option<Geometry> {
        self.geometry_request
    }

    pub(crate) fn take_geometry_request(&mut self) -> Option<Geometry> {
        self.geometry_request.take()
    }

    /// Load a freshly read window.
    pub(crate) fn load_window(
        &mut self,
        samples: &[f32],
        overlap: usize,
        bytes_processed: u64,
        bytes_processing: usize,
    ) {
        self.buffer.clear();
        self.buffer.extend_from_slice(samples);
        self.overlap = overlap;
        self.bytes_processed = bytes_processed;
        self.bytes_processing = bytes_processing;
    }
}
