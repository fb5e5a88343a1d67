use std::io::Write;

use log::warn;

use crate::dispatch::{AudioEvent, AudioProcessor, Control};

/// Writes the stream as raw PCM in the source format.
///
/// Only the new part of each window is written, so overlapping windows do
/// not duplicate audio. A write error is logged and halts the stream.
pub struct RawWriter<W> {
    writer: Option<W>,
    bytes_written: u64,
}

impl<W: Write + Send> RawWriter<W> {
    pub fn new(writer: W) -> Self {
        Self {
            writer: Some(writer),
            bytes_written: 0,
        }
    }

    pub fn bytes_written(&self) -> u64 {
        self.bytes_written
    }

    pub fn get_ref(&self) -> Option<&W> {
        self.writer.as_ref()
    }

    /// Take the writer out. Later windows are no longer written.
    pub fn take_writer(&mut self) -> Option<W> {
        self.writer.take()
    }
}

impl<W: Write + Send> AudioProcessor for RawWriter<W> {
    fn process(&mut self, event: &mut AudioEvent) -> Control {
        let Some(writer) = self.writer.as_mut() else {
            return Control::Continue;
        };

        let skip = event.overlap() * event.format().bytes_per_sample();
        let bytes = event.byte_buffer();
        let new = &bytes[skip.min(bytes.len())..];

        match writer.write_all(new) {
            Ok(()) => {
                self.bytes_written += new.len() as u64;
                Control::Continue
            }
            Err(e) => {
                warn!("raw writer failed: {e}");
                Control::StopStream
            }
        }
    }

    fn on_finished(&mut self) {
        if let Some(writer) = self.writer.as_mut() {
            if let Err(e) = writer.flush() {
                warn!("raw writer flush failed: {e}");
            }
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::io::AudioFormat;

    #[test]
    fn skips_the_overlap() {
        let format = AudioFormat::pcm16(8_000.0, 1).unwrap();
        let mut event = AudioEvent::with_samples(format, vec![0.0, 0.0, 1.0]);
        event.set_overlap(2);
        let mut writer = RawWriter::new(Vec::new());

        writer.process(&mut event);
        writer.on_finished();

        assert_eq!(writer.bytes_written(), 2);
        assert_eq!(writer.take_writer().unwrap(), vec![0xff, 0x7f]);
    }

    struct Broken;

    impl Write for Broken {
        fn write(&mut self, _buf: &[u8]) -> std::io::Result<usize> {
            Err(std::io::Error::other("disk full"))
        }

        fn flush(&mut self) -> std::io::Result<()> {
            Ok(())
        }
    }

    #[test]
    fn write_errors_halt_the_stream() {
        let format = AudioFormat::pcm16(8_000.0, 1).unwrap();
        let mut event = AudioEvent::with_samples(format, vec![0.5; 4]);

        assert_eq!(RawWriter::new(Broken).process(&mut event), Control::StopStream);
    }
}
