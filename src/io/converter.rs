//! Sample codec: native PCM bytes to normalized floats and back.

/*
PCM Sample Conversion
=====================

Audio arrives as bytes. Every processor works on floats in [-1.0, +1.0].
The converter sits between the two and is the only place that knows about
bit depth, byte order and signedness.

Vocabulary
----------

  frame         One sample for every channel, interleaved:
                  stereo 16-bit = [L lo, L hi, R lo, R hi]

  full scale    The largest representable magnitude. For an N-bit integer
                sample it is 2^(N-1) - 1, and it maps to 1.0.

  offset binary Unsigned encoding: silence sits at 2^(N-1), not at 0.


Scaling
-------

    float = int / full_scale
    int   = round(clamp(float, -1, 1) * full_scale)

The most negative integer (-2^(N-1)) decodes to slightly below -1.0. That
is the usual asymmetry of two's complement and is left as is.

Encoding rounds to the nearest step, so a float -> bytes -> float round trip
is exact to within half a quantization step: 0.5 / full_scale.
*/

use crate::io::format::{AudioFormat, ByteOrder, Encoding};

/// Converts between interleaved PCM bytes and normalized float samples.
#[derive(Debug, Clone, Copy)]
pub struct SampleConverter {
    bytes_per_sample: usize,
    encoding: Encoding,
    byte_order: ByteOrder,
    full_scale: f64,
    unsigned_offset: i64,
}

impl SampleConverter {
    pub fn new(format: &AudioFormat) -> Self {
        let bits = format.bits_per_sample() as u32;
        Self {
            bytes_per_sample: format.bytes_per_sample(),
            encoding: format.encoding(),
            byte_order: format.byte_order(),
            full_scale: ((1i64 << (bits - 1)) - 1) as f64,
            unsigned_offset: 1i64 << (bits - 1),
        }
    }

    pub fn bytes_per_sample(&self) -> usize {
        self.bytes_per_sample
    }

    /// Decode `out.len()` samples from the start of `bytes`.
    ///
    /// `bytes` must hold at least `out.len() * bytes_per_sample` bytes.
    pub fn to_floats(&self, bytes: &[u8], out: &mut [f32]) {
        debug_assert!(bytes.len() >= out.len() * self.bytes_per_sample);

        for (sample, chunk) in out
            .iter_mut()
            .zip(bytes.chunks_exact(self.bytes_per_sample))
        {
            *sample = self.decode(chunk);
        }
    }

    /// Encode every sample of `samples` into the start of `out`.
    pub fn to_bytes(&self, samples: &[f32], out: &mut [u8]) {
        debug_assert!(out.len() >= samples.len() * self.bytes_per_sample);

        for (&sample, chunk) in samples
            .iter()
            .zip(out.chunks_exact_mut(self.bytes_per_sample))
        {
            self.encode(sample, chunk);
        }
    }

    fn decode(&self, chunk: &[u8]) -> f32 {
        let raw = self.read_raw(chunk);
        match self.encoding {
            Encoding::Float => f32::from_bits(raw as u32),
            Encoding::SignedInt => (sign_extend(raw, self.bytes_per_sample) as f64 / self.full_scale) as f32,
            Encoding::UnsignedInt => {
                ((raw as i64 - self.unsigned_offset) as f64 / self.full_scale) as f32
            }
        }
    }

    fn encode(&self, sample: f32, chunk: &mut [u8]) {
        let raw = match self.encoding {
            Encoding::Float => sample.to_bits() as u64,
            Encoding::SignedInt => {
                let value = (sample.clamp(-1.0, 1.0) as f64 * self.full_scale).round() as i64;
                value as u64
            }
            Encoding::UnsignedInt => {
                let value = (sample.clamp(-1.0, 1.0) as f64 * self.full_scale).round() as i64;
                (value + self.unsigned_offset) as u64
            }
        };
        self.write_raw(raw, chunk);
    }

    fn read_raw(&self, chunk: &[u8]) -> u64 {
        match self.byte_order {
            ByteOrder::LittleEndian => chunk
                .iter()
                .rev()
                .fold(0u64, |acc, &b| (acc << 8) | b as u64),
            ByteOrder::BigEndian => chunk.iter().fold(0u64, |acc, &b| (acc << 8) | b as u64),
        }
    }

    fn write_raw(&self, raw: u64, chunk: &mut [u8]) {
        let n = chunk.len();
        for (i, byte) in chunk.iter_mut().enumerate() {
            let shift = match self.byte_order {
                ByteOrder::LittleEndian => i * 8,
                ByteOrder::BigEndian => (n - 1 - i) * 8,
            };
            *byte = (raw >> shift) as u8;
        }
    }
}

#[inline]
fn sign_extend(raw: u64, bytes: usize) -> i64 {
    let shift = 64 - bytes * 8;
    ((raw << shift) as i64) >> shift
}
