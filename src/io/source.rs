//! Byte sources the dispatcher pulls audio from.

use std::io::{ErrorKind, Read};

use crate::{
    error::Result,
    io::{converter::SampleConverter, format::AudioFormat},
};

/// Outcome of a single blocking read.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ReadStatus {
    /// `n` bytes were written to the start of the buffer. `Read(0)` means
    /// nothing was available this time; the caller should try again.
    Read(usize),
    /// The stream has ended for good. No further data will arrive.
    Exhausted,
}

/// A sequential PCM byte stream with a known format.
///
/// Reads block until data is available, the source is closed, or the stream
/// is exhausted. End of stream is only ever reported as
/// [`ReadStatus::Exhausted`], never as an error.
pub trait AudioSource: Send {
    fn format(&self) -> &AudioFormat;

    /// Total stream length in frames, when known.
    fn frame_length(&self) -> Option<u64> {
        None
    }

    fn read(&mut self, buf: &mut [u8]) -> Result<ReadStatus>;

    /// Discard up to `bytes` bytes. Returns how many were actually skipped.
    fn skip(&mut self, bytes: u64) -> Result<u64>;

    /// Release the underlying stream. Further reads report exhaustion.
    fn close(&mut self) -> Result<()>;
}

impl<S: AudioSource + ?Sized> AudioSource for Box<S> {
    fn format(&self) -> &AudioFormat {
        (**self).format()
    }

    fn frame_length(&self) -> Option<u64> {
        (**self).frame_length()
    }

    fn read(&mut self, buf: &mut [u8]) -> Result<ReadStatus> {
        (**self).read(buf)
    }

    fn skip(&mut self, bytes: u64) -> Result<u64> {
        (**self).skip(bytes)
    }

    fn close(&mut self) -> Result<()> {
        (**self).close()
    }
}

/// An in-memory source over encoded PCM bytes.
pub struct MemorySource {
    format: AudioFormat,
    bytes: Vec<u8>,
    position: usize,
    closed: bool,
}

impl MemorySource {
    pub fn new(bytes: Vec<u8>, format: AudioFormat) -> Self {
        Self {
            format,
            bytes,
            position: 0,
            closed: false,
        }
    }

    /// Encode normalized samples with `format` and serve them as bytes.
    ///
    /// Samples are interleaved when `format` has more than one channel.
    pub fn from_floats(samples: &[f32], format: AudioFormat) -> Self {
        let converter = SampleConverter::new(&format);
        let mut bytes = vec![0u8; samples.len() * format.bytes_per_sample()];
        converter.to_bytes(samples, &mut bytes);
        Self::new(bytes, format)
    }

    pub fn is_closed(&self) -> bool {
        self.closed
    }
}

impl AudioSource for MemorySource {
    fn format(&self) -> &AudioFormat {
        &self.format
    }

    fn frame_length(&self) -> Option<u64> {
        Some((self.bytes.len() / self.format.frame_size()) as u64)
    }

    fn read(&mut self, buf: &mut [u8]) -> Result<ReadStatus> {
        if self.closed || self.position >= self.bytes.len() {
            return Ok(ReadStatus::Exhausted);
        }
        let n = buf.len().min(self.bytes.len() - self.position);
        buf[..n].copy_from_slice(&self.bytes[self.position..self.position + n]);
        self.position += n;
        Ok(ReadStatus::Read(n))
    }

    fn skip(&mut self, bytes: u64) -> Result<u64> {
        let remaining = (self.bytes.len() - self.position) as u64;
        let skipped = bytes.min(remaining);
        self.position += skipped as usize;
        Ok(skipped)
    }

    fn close(&mut self) -> Result<()> {
        self.closed = true;
        Ok(())
    }
}

/// A source over any blocking byte reader: a file, a pipe, a socket.
///
/// The reader carries raw PCM in `format`; headers must already be
/// stripped.
pub struct StreamSource<R> {
    format: AudioFormat,
    reader: Option<R>,
    frame_length: Option<u64>,
}

impl<R: Read + Send> StreamSource<R> {
    pub fn new(reader: R, format: AudioFormat) -> Self {
        Self {
            format,
            reader: Some(reader),
            frame_length: None,
        }
    }

    /// Declare the total stream length in frames.
    pub fn with_frame_length(mut self, frames: u64) -> Self {
        self.frame_length = Some(frames);
        self
    }
}

impl<R: Read + Send> AudioSource for StreamSource<R> {
    fn format(&self) -> &AudioFormat {
        &self.format
    }

    fn frame_length(&self) -> Option<u64> {
        self.frame_length
    }

    fn read(&mut self, buf: &mut [u8]) -> Result<ReadStatus> {
        let Some(reader) = self.reader.as_mut() else {
            return Ok(ReadStatus::Exhausted);
        };
        if buf.is_empty() {
            return Ok(ReadStatus::Read(0));
        }
        loop {
            match reader.read(buf) {
                // std readers signal end of stream with Ok(0)
                Ok(0) => return Ok(ReadStatus::Exhausted),
                Ok(n) => return Ok(ReadStatus::Read(n)),
                Err(e) if e.kind() == ErrorKind::Interrupted => continue,
                Err(e) if e.kind() == ErrorKind::WouldBlock => return Ok(ReadStatus::Read(0)),
                Err(e) => return Err(e.into()),
            }
        }
    }

    fn skip(&mut self, bytes: u64) -> Result<u64> {
        let Some(reader) = self.reader.as_mut() else {
            return Ok(0);
        };
        let skipped = std::io::copy(&mut reader.take(bytes), &mut std::io::sink())?;
        Ok(skipped)
    }

    fn close(&mut self) -> Result<()> {
        self.reader = None;
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::io::Cursor;

    fn mono() -> AudioFormat {
        AudioFormat::pcm16(8_000.0, 1).unwrap()
    }

    #[test]
    fn memory_source_reads_until_exhausted() {
        let mut source = MemorySource::new(vec![1, 2, 3, 4, 5], mono());
        let mut buf = [0u8; 4];

        assert_eq!(source.read(&mut buf).unwrap(), ReadStatus::Read(4));
        assert_eq!(buf, [1, 2, 3, 4]);
        assert_eq!(source.read(&mut buf).unwrap(), ReadStatus::Read(1));
        assert_eq!(source.read(&mut buf).unwrap(), ReadStatus::Exhausted);
    }

    #[test]
    fn memory_source_reports_frame_length() {
        let source = MemorySource::from_floats(&[0.0; 100], mono());
        assert_eq!(source.frame_length(), Some(100));
    }

    #[test]
    fn skip_is_bounded_by_remaining_bytes() {
        let mut source = MemorySource::new(vec![0; 10], mono());
        assert_eq!(source.skip(4).unwrap(), 4);
        assert_eq!(source.skip(100).unwrap(), 6);
    }

    #[test]
    fn closed_sources_are_exhausted() {
        let mut source = StreamSource::new(Cursor::new(vec![0u8; 16]), mono());
        let mut buf = [0u8; 4];

        assert_eq!(source.read(&mut buf).unwrap(), ReadStatus::Read(4));
        source.close().unwrap();
        assert_eq!(source.read(&mut buf).unwrap(), ReadStatus::Exhausted);
    }

    #[test]
    fn stream_source_maps_eof_to_exhausted() {
        let mut source = StreamSource::new(Cursor::new(vec![7u8; 3]), mono());
        let mut buf = [0u8; 8];

        assert_eq!(source.read(&mut buf).unwrap(), ReadStatus::Read(3));
        assert_eq!(source.read(&mut buf).unwrap(), ReadStatus::Exhausted);
        assert_eq!(source.skip(10).unwrap(), 0);
    }
}
