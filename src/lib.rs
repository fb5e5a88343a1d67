//! Block-streaming audio analysis with WSOLA time stretching.
//!
//! A [`Dispatcher`] pulls PCM bytes from an [`AudioSource`], decodes them to
//! normalized floats and slides overlapping windows over the stream. Each
//! window travels through a chain of [`AudioProcessor`]s inside one reused
//! [`AudioEvent`].
//!
//! ```no_run
//! use tarsos_dsp::{processors::Wsola, Dispatcher, MemorySource, WsolaParams};
//!
//! # fn main() -> tarsos_dsp::Result<()> {
//! let format = tarsos_dsp::AudioFormat::pcm16(44_100.0, 1)?;
//! let source = MemorySource::from_floats(&vec![0.0; 44_100], format);
//!
//! let wsola = Wsola::new(WsolaParams::music(1.5, 44_100.0))?;
//! let mut dispatcher = Dispatcher::new(source, wsola.input_buffer_size(), wsola.overlap())?;
//! dispatcher.add_processor(wsola);
//! dispatcher.run()?;
//! # Ok(())
//! # }
//! ```

pub mod dispatch; // Windowing engine and processor protocol
pub mod dsp; // Allocation-free signal math
pub mod error;
pub mod io; // Sources, formats and the sample codec
pub mod processors; // Ready-made chain members

pub use dispatch::{
    AudioEvent, AudioProcessor, Control, Dispatcher, DispatcherHandle, Geometry, ProcessorChain,
    ProcessorId,
};
pub use dsp::{WsolaLengths, WsolaParams};
pub use error::{Error, Result};
pub use io::{AudioFormat, AudioSource, ByteOrder, Encoding, MemorySource, ReadStatus, StreamSource};

/// Common analysis window size in frames.
pub const DEFAULT_WINDOW_SIZE: usize = 1024;
/// Common analysis overlap in frames.
pub const DEFAULT_OVERLAP: usize = 512;
