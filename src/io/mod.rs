// Purpose - external interfaces, format conversions

pub mod converter;
pub mod format;
#[cfg(feature = "rtrb")]
pub mod live;
pub mod source;

pub use converter::SampleConverter;
pub use format::{AudioFormat, ByteOrder, Encoding};
#[cfg(feature = "rtrb")]
pub use live::{live_channel, LiveFeed, LiveSource};
pub use source::{AudioSource, MemorySource, ReadStatus, StreamSource};
