//! PCM stream format description.

use crate::error::{Error, Result};

/// How a single sample is laid out in bytes.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
#[cfg_attr(feature = "serde", derive(serde::Serialize, serde::Deserialize))]
pub enum Encoding {
    /// Two's complement integers.
    SignedInt,
    /// Offset binary integers (silence at half scale).
    UnsignedInt,
    /// IEEE 754 single precision, already normalized.
    Float,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
#[cfg_attr(feature = "serde", derive(serde::Serialize, serde::Deserialize))]
pub enum ByteOrder {
    LittleEndian,
    BigEndian,
}

/// Immutable description of an interleaved PCM stream.
#[derive(Debug, Clone, Copy, PartialEq)]
#[cfg_attr(feature = "serde", derive(serde::Serialize, serde::Deserialize))]
pub struct AudioFormat {
    sample_rate: f32,
    bits_per_sample: u16,
    channels: u16,
    encoding: Encoding,
    byte_order: ByteOrder,
}

impl AudioFormat {
    /// Create and validate a format.
    pub fn new(
        sample_rate: f32,
        bits_per_sample: u16,
        channels: u16,
        encoding: Encoding,
        byte_order: ByteOrder,
    ) -> Result<Self> {
        if !(sample_rate.is_finite() && sample_rate > 0.0) {
            return Err(Error::UnsupportedFormat(format!(
                "sample rate must be positive, got {sample_rate}"
            )));
        }
        if channels == 0 {
            return Err(Error::UnsupportedFormat("at least one channel is required".into()));
        }
        if !matches!(bits_per_sample, 8 | 16 | 24 | 32) {
            return Err(Error::UnsupportedFormat(format!(
                "{bits_per_sample} bits per sample"
            )));
        }
        if encoding == Encoding::Float && bits_per_sample != 32 {
            return Err(Error::UnsupportedFormat(format!(
                "float samples must be 32 bits, got {bits_per_sample}"
            )));
        }

        Ok(Self {
            sample_rate,
            bits_per_sample,
            channels,
            encoding,
            byte_order,
        })
    }

    /// Signed 16-bit little-endian PCM, the most common raw format.
    pub fn pcm16(sample_rate: f32, channels: u16) -> Result<Self> {
        Self::new(
            sample_rate,
            16,
            channels,
            Encoding::SignedInt,
            ByteOrder::LittleEndian,
        )
    }

    /// 32-bit little-endian float samples.
    pub fn float32(sample_rate: f32, channels: u16) -> Result<Self> {
        Self::new(
            sample_rate,
            32,
            channels,
            Encoding::Float,
            ByteOrder::LittleEndian,
        )
    }

    pub fn sample_rate(&self) -> f32 {
        self.sample_rate
    }

    pub fn bits_per_sample(&self) -> u16 {
        self.bits_per_sample
    }

    pub fn bytes_per_sample(&self) -> usize {
        self.bits_per_sample as usize / 8
    }

    pub fn channels(&self) -> u16 {
        self.channels
    }

    pub fn encoding(&self) -> Encoding {
        self.encoding
    }

    pub fn byte_order(&self) -> ByteOrder {
        self.byte_order
    }

    /// Bytes per frame (one sample for every channel). Always > 0.
    pub fn frame_size(&self) -> usize {
        self.bytes_per_sample() * self.channels as usize
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn frame_size_counts_all_channels() {
        let format = AudioFormat::new(
            48_000.0,
            24,
            2,
            Encoding::SignedInt,
            ByteOrder::BigEndian,
        )
        .unwrap();

        assert_eq!(format.bytes_per_sample(), 3);
        assert_eq!(format.frame_size(), 6);
    }

    #[test]
    fn rejects_unsupported_layouts() {
        assert!(AudioFormat::pcm16(0.0, 1).is_err());
        assert!(AudioFormat::pcm16(44_100.0, 0).is_err());
        assert!(AudioFormat::new(44_100.0, 12, 1, Encoding::SignedInt, ByteOrder::LittleEndian).is_err());
        assert!(AudioFormat::new(44_100.0, 16, 1, Encoding::Float, ByteOrder::LittleEndian).is_err());
    }
}
