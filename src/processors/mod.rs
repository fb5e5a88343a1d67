//! Ready-made processors for the dispatch chain.
//!
//! `wsola` is the time stretcher. The rest are small utilities: level and
//! silence measurement, channel folding, gain and fades, stopping, and
//! writing the stream out.

/// Bit depth reduction.
pub mod bit_depth;
/// Stream duration measurement.
pub mod duration;
/// Linear fade in and fade out.
pub mod fade;
/// Fixed gain with clipping.
pub mod gain;
/// Interleaved multichannel to mono.
pub mod mono;
/// Playback on the default output device.
#[cfg(feature = "playback")]
pub mod player;
/// Silence detection and window veto.
pub mod silence;
/// Halt the stream at a given time.
pub mod stop;
/// WSOLA time stretching.
pub mod wsola;
/// Raw PCM output.
pub mod writer;
/// Zero-crossing rate.
pub mod zero_crossing;

pub use bit_depth::BitDepth;
pub use duration::DurationProbe;
pub use fade::{FadeIn, FadeOut};
pub use gain::Gain;
pub use mono::{Downmix, MultichannelToMono};
#[cfg(feature = "playback")]
pub use player::{AudioPlayer, PlaybackStream};
pub use silence::SilenceDetector;
pub use stop::StopAt;
pub use wsola::Wsola;
pub use writer::RawWriter;
pub use zero_crossing::ZeroCrossingRate;
