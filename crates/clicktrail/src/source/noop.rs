//! A source for hosts without a UI.

use super::{EventSink, EventSource};
use crate::error::Result;

/// An [`EventSource`] that never emits anything.
#[derive(Debug, Default)]
pub struct NoopSource {
    attached: bool,
}

impl NoopSource {
    /// Create a new no-op source.
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }
}

impl EventSource for NoopSource {
    fn name(&self) -> &'static str {
        "noop"
    }

    fn attach(&mut self, _sink: EventSink) -> Result<()> {
        self.attached = true;
        Ok(())
    }

    fn detach(&mut self) -> Result<()> {
        self.attached = false;
        Ok(())
    }

    fn is_attached(&self) -> bool {
        self.attached
    }
}
