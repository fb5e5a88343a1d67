//! Live input: a source fed from another thread through a lock-free ring.
//!
//! A [`LiveFeed`] is held by whoever produces audio (a capture callback, a
//! network receiver, a test) and a [`LiveSource`] is handed to the
//! dispatcher. The feed never blocks. The source waits briefly for bytes and
//! reports `Read(0)` when none arrived, until the feed is dropped.

use std::{thread, time::Duration};

use rtrb::{Consumer, Producer, RingBuffer};

use crate::{
    error::Result,
    io::{
        converter::SampleConverter,
        format::AudioFormat,
        source::{AudioSource, ReadStatus},
    },
};

const POLL_INTERVAL: Duration = Duration::from_millis(1);
/// Polls per read before handing control back with `Read(0)`, so the
/// dispatcher gets to check its stop flag.
const POLLS_PER_READ: usize = 20;

/// Create a connected feed/source pair with room for `capacity_frames`.
pub fn live_channel(format: AudioFormat, capacity_frames: usize) -> (LiveFeed, LiveSource) {
    let capacity = capacity_frames.max(1) * format.frame_size();
    let (producer, consumer) = RingBuffer::<u8>::new(capacity);

    let feed = LiveFeed {
        producer,
        converter: SampleConverter::new(&format),
        scratch: Vec::new(),
    };
    let source = LiveSource {
        format,
        consumer: Some(consumer),
    };
    (feed, source)
}

/// Producer half. Dropping it marks the end of the live stream.
pub struct LiveFeed {
    producer: Producer<u8>,
    converter: SampleConverter,
    scratch: Vec<u8>,
}

impl LiveFeed {
    /// Push raw PCM bytes. Returns how many were accepted; the rest did not
    /// fit in the ring.
    pub fn push_bytes(&mut self, bytes: &[u8]) -> usize {
        let n = bytes.len().min(self.producer.slots());
        if n == 0 {
            return 0;
        }
        match self.producer.write_chunk_uninit(n) {
            Ok(chunk) => chunk.fill_from_iter(bytes[..n].iter().copied()),
            Err(_) => 0,
        }
    }

    /// Encode and push whole samples. Returns the number of samples accepted.
    pub fn push_samples(&mut self, samples: &[f32]) -> usize {
        let width = self.converter.bytes_per_sample();
        let fit = (self.producer.slots() / width).min(samples.len());
        if fit == 0 {
            return 0;
        }

        // The scratch buffer only ever grows to the largest pushed block.
        self.scratch.resize(fit * width, 0);
        self.converter.to_bytes(&samples[..fit], &mut self.scratch);

        let mut scratch = std::mem::take(&mut self.scratch);
        let pushed = self.push_bytes(&scratch);
        std::mem::swap(&mut self.scratch, &mut scratch);
        pushed / width
    }

    /// Free space in bytes.
    pub fn available(&self) -> usize {
        self.producer.slots()
    }
}

/// Consumer half, read by the dispatcher.
pub struct LiveSource {
    format: AudioFormat,
    consumer: Option<Consumer<u8>>,
}

impl AudioSource for LiveSource {
    fn format(&self) -> &AudioFormat {
        &self.format
    }

    fn read(&mut self, buf: &mut [u8]) -> Result<ReadStatus> {
        let Some(consumer) = self.consumer.as_mut() else {
            return Ok(ReadStatus::Exhausted);
        };
        if buf.is_empty() {
            return Ok(ReadStatus::Read(0));
        }

        for _ in 0..POLLS_PER_READ {
            let available = consumer.slots();
            if available > 0 {
                let n = available.min(buf.len());
                let Ok(chunk) = consumer.read_chunk(n) else {
                    return Ok(ReadStatus::Read(0));
                };
                let (first, second) = chunk.as_slices();
                buf[..first.len()].copy_from_slice(first);
                buf[first.len()..first.len() + second.len()].copy_from_slice(second);
                chunk.commit_all();
                return Ok(ReadStatus::Read(n));
            }
            if consumer.is_abandoned() && consumer.slots() == 0 {
                return Ok(ReadStatus::Exhausted);
            }
            thread::sleep(POLL_INTERVAL);
        }
        Ok(ReadStatus::Read(0))
    }

    fn skip(&mut self, bytes: u64) -> Result<u64> {
        let mut scratch = [0u8; 1024];
        let mut skipped = 0u64;
        while skipped < bytes {
            let want = (bytes - skipped).min(scratch.len() as u64) as usize;
            match self.read(&mut scratch[..want])? {
                ReadStatus::Read(n) => skipped += n as u64,
                ReadStatus::Exhausted => break,
            }
        }
        Ok(skipped)
    }

    fn close(&mut self) -> Result<()> {
        self.consumer = None;
        Ok(())
    }
}

#[cfg(feature = "playback")]
pub use capture::{open_default_input, CaptureStream};

#[cfg(feature = "playback")]
mod capture {
    use cpal::traits::{DeviceTrait, HostTrait, StreamTrait};

    use super::{live_channel, LiveSource};
    use crate::{
        error::{Error, Result},
        io::format::{AudioFormat, ByteOrder, Encoding},
    };

    /// Keeps the capture stream running. Not `Send`; keep it on the thread
    /// that opened it and hand the [`LiveSource`] to the dispatcher.
    pub struct CaptureStream {
        _stream: cpal::Stream,
    }

    /// Open the default input device as a live source of 32-bit float frames.
    pub fn open_default_input(capacity_frames: usize) -> Result<(LiveSource, CaptureStream)> {
        let host = cpal::default_host();
        let device = host
            .default_input_device()
            .ok_or_else(|| Error::Device("no default input device available".into()))?;
        let config = device
            .default_input_config()
            .map_err(|e| Error::Device(e.to_string()))?;

        let byte_order = if cfg!(target_endian = "big") {
            ByteOrder::BigEndian
        } else {
            ByteOrder::LittleEndian
        };
        let format = AudioFormat::new(
            config.sample_rate().0 as f32,
            32,
            config.channels(),
            Encoding::Float,
            byte_order,
        )?;
        let (mut feed, source) = live_channel(format, capacity_frames);

        let stream = device
            .build_input_stream(
                &config.into(),
                move |data: &[f32], _: &cpal::InputCallbackInfo| {
                    let pushed = feed.push_samples(data);
                    if pushed < data.len() {
                        log::trace!("live input overrun, dropped {} samples", data.len() - pushed);
                    }
                },
                |err| log::warn!("audio input error: {err}"),
                None,
            )
            .map_err(|e| Error::Device(e.to_string()))?;
        stream.play().map_err(|e| Error::Device(e.to_string()))?;

        log::debug!(
            "capturing from default input at {} Hz, {} channels",
            format.sample_rate(),
            format.channels()
        );
        Ok((source, CaptureStream { _stream: stream }))
    }
}
