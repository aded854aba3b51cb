//! A source driven by the embedding application.

use std::sync::atomic::{AtomicU64, Ordering};
use std::sync::{Arc, Mutex, PoisonError};

use tracing::debug;

use super::{EventSink, EventSource, HostEvent};
use crate::error::{Error, Result};

#[derive(Debug, Default)]
struct Shared {
    sink: Mutex<Option<EventSink>>,
    dispatched: AtomicU64,
}

/// An [`EventSource`] whose events are pushed through a
/// [`ManualSourceHandle`].
#[derive(Debug, Default)]
pub struct ManualSource {
    shared: Arc<Shared>,
}

impl ManualSource {
    /// Create a detached source.
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    /// Get a handle for pushing events. Handles stay valid after the source
    /// is moved into a tracker.
    #[must_use]
    pub fn handle(&self) -> ManualSourceHandle {
        ManualSourceHandle {
            shared: Arc::clone(&self.shared),
        }
    }
}

impl EventSource for ManualSource {
    fn name(&self) -> &'static str {
        "manual"
    }

    fn attach(&mut self, sink: EventSink) -> Result<()> {
        let mut slot = self
            .shared
            .sink
            .lock()
            .unwrap_or_else(PoisonError::into_inner);
        if slot.is_some() {
            return Err(Error::source_attach(self.name(), "already attached"));
        }
        *slot = Some(sink);
        debug!(source = self.name(), "Event source attached");
        Ok(())
    }

    fn detach(&mut self) -> Result<()> {
        let mut slot = self
            .shared
            .sink
            .lock()
            .unwrap_or_else(PoisonError::into_inner);
        if slot.take().is_none() {
            return Err(Error::source_detach(self.name(), "not attached"));
        }
        debug!(source = self.name(), "Event source detached");
        Ok(())
    }

    fn is_attached(&self) -> bool {
        self.shared
            .sink
            .lock()
            .unwrap_or_else(PoisonError::into_inner)
            .is_some()
    }
}

/// A cloneable handle for pushing events into a [`ManualSource`].
#[derive(Debug, Clone)]
pub struct ManualSourceHandle {
    shared: Arc<Shared>,
}

impl ManualSourceHandle {
    /// Push one event. Returns `false` if no tracker is attached, in which
    /// case the event is dropped.
    pub fn dispatch(&self, event: HostEvent) -> bool {
        // Clone the sink so capture runs without holding the slot lock.
        let sink = self
            .shared
            .sink
            .lock()
            .unwrap_or_else(PoisonError::into_inner)
            .clone();

        match sink {
            Some(sink) => {
                sink.emit(event);
                self.shared.dispatched.fetch_add(1, Ordering::Relaxed);
                true
            }
            None => false,
        }
    }

    /// Number of events delivered to an attached tracker.
    #[must_use]
    pub fn dispatched(&self) -> u64 {
        self.shared.dispatched.load(Ordering::Relaxed)
    }

    /// Whether a tracker is attached.
    #[must_use]
    pub fn is_attached(&self) -> bool {
        self.shared
            .sink
            .lock()
            .unwrap_or_else(PoisonError::into_inner)
            .is_some()
    }
}
