//! The processor protocol and the chain the dispatcher drives.

use std::sync::{
    atomic::{AtomicBool, AtomicU64, Ordering},
    Arc,
};

use arc_swap::ArcSwap;
use log::debug;
use parking_lot::Mutex;

use crate::dispatch::event::AudioEvent;

/// What the dispatcher does after a processor returns.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Control {
    /// Pass the event on to the next processor.
    Continue,
    /// Skip the rest of the chain for this window. The stream continues.
    StopWindow,
    /// Skip the rest of the chain and halt the whole pipeline after this
    /// window.
    StopStream,
}

/// A stage in the processing chain.
///
/// `process` runs once per window on the dispatch thread. `on_finished`
/// runs exactly once per processor: at end of stream, on stop, or when the
/// processor is removed from the chain. It may run without any prior call to
/// `process`.
pub trait AudioProcessor: Send {
    fn process(&mut self, event: &mut AudioEvent) -> Control;

    fn on_finished(&mut self) {
        // Default: nothing to release
    }
}

/// Allow boxed processors to be added like any other processor
impl<P: AudioProcessor + ?Sized> AudioProcessor for Box<P> {
    fn process(&mut self, event: &mut AudioEvent) -> Control {
        (**self).process(event)
    }

    fn on_finished(&mut self) {
        (**self).on_finished()
    }
}

/// Identifies a processor within one chain.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord)]
pub struct ProcessorId(u64);

pub(crate) struct Slot {
    id: ProcessorId,
    finished: AtomicBool,
    processor: Arc<Mutex<dyn AudioProcessor>>,
}

impl Slot {
    pub(crate) fn process(&self, event: &mut AudioEvent) -> Control {
        if self.finished.load(Ordering::Acquire) {
            return Control::Continue;
        }
        self.processor.lock().process(event)
    }

    /// Deliver `on_finished` unless it already fired.
    pub(crate) fn finish(&self) {
        if !self.finished.swap(true, Ordering::AcqRel) {
            self.processor.lock().on_finished();
        }
    }
}

/// Ordered, copy-on-write list of processors.
///
/// The dispatch thread iterates a snapshot taken at the start of each
/// window, so a processor added from another thread joins with the next
/// window. A removed processor is finished at once and skipped from then on,
/// even within the current snapshot.
///
/// A processor must not remove itself from inside `process`: its own lock is
/// held for the duration of the call. Return [`Control::StopStream`] instead.
pub struct ProcessorChain {
    slots: ArcSwap<Vec<Arc<Slot>>>,
    next_id: AtomicU64,
}

impl ProcessorChain {
    pub fn new() -> Self {
        Self {
            slots: ArcSwap::from_pointee(Vec::new()),
            next_id: AtomicU64::new(0),
        }
    }

    /// Append a processor owned by the chain.
    pub fn add<P: AudioProcessor + 'static>(&self, processor: P) -> ProcessorId {
        self.add_shared(Arc::new(Mutex::new(processor)))
    }

    /// Append a processor the caller keeps a handle to, e.g. to read its
    /// results after the run.
    pub fn add_shared<P: AudioProcessor + 'static>(&self, processor: Arc<Mutex<P>>) -> ProcessorId {
        let id = ProcessorId(self.next_id.fetch_add(1, Ordering::Relaxed));
        let slot = Arc::new(Slot {
            id,
            finished: AtomicBool::new(false),
            processor,
        });

        self.slots.rcu(|current| {
            let mut next = (**current).clone();
            next.push(slot.clone());
            next
        });
        debug!("added processor {id:?}");
        id
    }

    /// Remove a processor and deliver its `on_finished`. Unknown ids are
    /// ignored.
    pub fn remove(&self, id: ProcessorId) -> bool {
        let mut removed = None;
        self.slots.rcu(|current| {
            let mut next = (**current).clone();
            removed = next
                .iter()
                .position(|slot| slot.id == id)
                .map(|index| next.remove(index));
            next
        });

        match removed {
            Some(slot) => {
                slot.finish();
                debug!("removed processor {id:?}");
                true
            }
            None => false,
        }
    }

    pub fn contains(&self, id: ProcessorId) -> bool {
        self.slots.load().iter().any(|slot| slot.id == id)
    }

    pub fn len(&self) -> usize {
        self.slots.load().len()
    }

    pub fn is_empty(&self) -> bool {
        self.len() == 0
    }

    pub(crate) fn snapshot(&self) -> Arc<Vec<Arc<Slot>>> {
        self.slots.load_full()
    }

    /// Run every processor in the snapshot over `event`, honouring vetoes.
    pub(crate) fn dispatch(snapshot: &[Arc<Slot>], event: &mut AudioEvent) -> Control {
        for slot in snapshot {
            match slot.process(event) {
                Control::Continue => {}
                Control::StopWindow => return Control::StopWindow,
                Control::StopStream => return Control::StopStream,
            }
        }
        Control::Continue
    }

    /// Deliver `on_finished` to every processor still in the chain.
    pub fn finish_all(&self) {
        for slot in self.slots.load().iter() {
            slot.finish();
        }
    }
}

impl Default for ProcessorChain {
    fn default() -> Self {
        Self::new()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::io::AudioFormat;

    #[derive(Default)]
    struct Tally {
        windows: usize,
        finished: usize,
        control: Option<Control>,
    }

    impl AudioProcessor for Tally {
        fn process(&mut self, _event: &mut AudioEvent) -> Control {
            self.windows += 1;
            self.control.unwrap_or(Control::Continue)
        }

        fn on_finished(&mut self) {
            self.finished += 1;
        }
    }

    fn event() -> AudioEvent {
        AudioEvent::with_samples(AudioFormat::pcm16(8_000.0, 1).unwrap(), vec![0.0; 16])
    }

    #[test]
    fn removal_finishes_exactly_once() {
        let chain = ProcessorChain::new();
        let tally = Arc::new(Mutex::new(Tally::default()));
        let id = chain.add_shared(tally.clone());

        assert!(chain.remove(id));
        assert!(!chain.remove(id));
        chain.finish_all();

        assert_eq!(tally.lock().finished, 1);
        assert!(chain.is_empty());
    }

    #[test]
    fn removing_an_unknown_id_is_a_no_op() {
        let chain = ProcessorChain::new();
        let other = ProcessorChain::new();
        chain.add(Tally::default());
        let foreign = other.add(Tally::default());
        let foreign = ProcessorId(foreign.0 + 10);

        assert!(!chain.remove(foreign));
        assert_eq!(chain.len(), 1);
    }

    #[test]
    fn stop_window_skips_the_rest_of_the_chain() {
        let chain = ProcessorChain::new();
        let veto = Arc::new(Mutex::new(Tally {
            control: Some(Control::StopWindow),
            ..Tally::default()
        }));
        let after = Arc::new(Mutex::new(Tally::default()));
        chain.add_shared(veto.clone());
        chain.add_shared(after.clone());

        let control = ProcessorChain::dispatch(&chain.snapshot(), &mut event());

        assert_eq!(control, Control::StopWindow);
        assert_eq!(veto.lock().windows, 1);
        assert_eq!(after.lock().windows, 0);
    }

    #[test]
    fn snapshot_is_unaffected_by_later_changes() {
        let chain = ProcessorChain::new();
        let first = Arc::new(Mutex::new(Tally::default()));
        let second = Arc::new(Mutex::new(Tally::default()));
        chain.add_shared(first.clone());

        let snapshot = chain.snapshot();
        chain.add_shared(second.clone());
        ProcessorChain::dispatch(&snapshot, &mut event());

        assert_eq!(first.lock().windows, 1);
        assert_eq!(second.lock().windows, 0);
        assert_eq!(chain.len(), 2);
    }

    #[test]
    fn finished_processors_are_skipped() {
        let chain = ProcessorChain::new();
        let tally = Arc::new(Mutex::new(Tally::default()));
        chain.add_shared(tally.clone());

        let snapshot = chain.snapshot();
        chain.finish_all();
        ProcessorChain::dispatch(&snapshot, &mut event());

        assert_eq!(tally.lock().windows, 0);
        assert_eq!(tally.lock().finished, 1);
    }

    #[test]
    fn boxed_processors_forward_calls() {
        let chain = ProcessorChain::new();
        let boxed: Box<dyn AudioProcessor> = Box::new(Tally::default());
        chain.add(boxed);

        assert_eq!(
            ProcessorChain::dispatch(&chain.snapshot(), &mut event()),
            Control::Continue
        );
    }
}
