//! Plays the stream on the default output device.

use std::{thread, time::Duration};

use cpal::traits::{DeviceTrait, HostTrait, StreamTrait};
use log::{debug, trace, warn};
use rtrb::{Consumer, Producer, RingBuffer};

use crate::{
    dispatch::{AudioEvent, AudioProcessor, Control},
    error::{Error, Result},
    io::AudioFormat,
};

const RETRY_INTERVAL: Duration = Duration::from_millis(1);

/// Keeps the output stream alive. Not `Send`; keep it on the thread that
/// opened the player and move the [`AudioPlayer`] into the chain.
pub struct PlaybackStream {
    _stream: cpal::Stream,
}

/// Sends the new part of every window to the sound card.
///
/// `process` blocks while the ring buffer is full, so the dispatcher runs at
/// playback speed. Samples are played at the stream's sample rate; source
/// channels are spread over the device channels round-robin.
pub struct AudioPlayer {
    producer: Producer<f32>,
}

impl AudioPlayer {
    /// Open the default output device for `format`, buffering up to
    /// `capacity_frames` frames.
    pub fn open_default(format: &AudioFormat, capacity_frames: usize) -> Result<(Self, PlaybackStream)> {
        let host = cpal::default_host();
        let device = host
            .default_output_device()
            .ok_or_else(|| Error::Device("no default output device available".into()))?;
        let default_config = device
            .default_output_config()
            .map_err(|e| Error::Device(e.to_string()))?;

        let device_channels = default_config.channels() as usize;
        let source_channels = format.channels() as usize;
        let config = cpal::StreamConfig {
            channels: default_config.channels(),
            sample_rate: cpal::SampleRate(format.sample_rate() as u32),
            buffer_size: cpal::BufferSize::Default,
        };

        let (producer, mut consumer) = RingBuffer::<f32>::new(capacity_frames.max(1) * source_channels);
        let stream = device
            .build_output_stream(
                &config,
                move |data: &mut [f32], _: &cpal::OutputCallbackInfo| {
                    for frame in data.chunks_mut(device_channels) {
                        if !pop_frame(&mut consumer, source_channels, frame) {
                            frame.fill(0.0);
                        }
                    }
                },
                |err| warn!("audio output error: {err}"),
                None,
            )
            .map_err(|e| Error::Device(e.to_string()))?;
        stream.play().map_err(|e| Error::Device(e.to_string()))?;

        debug!(
            "playing on default output at {} Hz, {} channels",
            format.sample_rate(),
            device_channels
        );
        Ok((Self { producer }, PlaybackStream { _stream: stream }))
    }
}

/// Copy one source frame into an output frame. False on underrun.
fn pop_frame(consumer: &mut Consumer<f32>, source_channels: usize, out: &mut [f32]) -> bool {
    let Ok(chunk) = consumer.read_chunk(source_channels) else {
        return false;
    };
    let (first, second) = chunk.as_slices();
    for (c, o) in out.iter_mut().enumerate() {
        let i = c % source_channels;
        *o = if i < first.len() {
            first[i]
        } else {
            second[i - first.len()]
        };
    }
    chunk.commit_all();
    true
}

impl AudioProcessor for AudioPlayer {
    fn process(&mut self, event: &mut AudioEvent) -> Control {
        let samples = &event.buffer()[event.overlap()..];
        let mut offset = 0;

        while offset < samples.len() {
            let n = self.producer.slots().min(samples.len() - offset);
            if n == 0 {
                if self.producer.is_abandoned() {
                    warn!("output stream closed, halting playback");
                    return Control::StopStream;
                }
                thread::sleep(RETRY_INTERVAL);
                continue;
            }
            if let Ok(chunk) = self.producer.write_chunk_uninit(n) {
                offset += chunk.fill_from_iter(samples[offset..offset + n].iter().copied());
            }
        }
        trace!("queued {} samples for playback", samples.len());
        Control::Continue
    }
}
