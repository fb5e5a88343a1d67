// Purpose - windowed streaming: the dispatcher, its event, and the processor chain

pub mod dispatcher;
pub mod event;
pub mod processor;

pub use dispatcher::{Dispatcher, DispatcherHandle, Geometry};
pub use event::AudioEvent;
pub use processor::{AudioProcessor, Control, ProcessorChain, ProcessorId};
