//! Replaying recorded host events through a tracker.
//!
//! A replay file holds one [`HostEvent`] per line as JSON. Blank lines and
//! lines starting with `#` are skipped.

use std::io::BufRead;
use std::sync::Arc;

use tracing::debug;

use crate::config::Config;
use crate::error::{Error, Result};
use crate::host::StaticHost;
use crate::source::{HostEvent, ManualSource};
use crate::tracker::Tracker;

/// Parse a JSON-lines stream of host events.
///
/// # Errors
///
/// Returns an error naming the line if a line is not a host event, or if
/// reading fails.
pub fn read_host_events(reader: impl BufRead) -> Result<Vec<HostEvent>> {
    let mut events = Vec::new();
    for (index, line) in reader.lines().enumerate() {
        let line = line?;
        let trimmed = line.trim();
        if trimmed.is_empty() || trimmed.starts_with('#') {
            continue;
        }
        let event = serde_json::from_str(trimmed).map_err(|source| Error::ReplayLine {
            line: index + 1,
            source,
        })?;
        events.push(event);
    }
    Ok(events)
}

/// Feed `events` through a freshly initialized tracker and return it.
///
/// Events go through a [`ManualSource`] so they take the same capture path
/// as live ones.
pub fn replay(config: Config, events: impl IntoIterator<Item = HostEvent>) -> Tracker {
    let host = Arc::new(StaticHost::from_config(&config.host));
    let source = ManualSource::new();
    let handle = source.handle();
    let tracker = Tracker::builder(config).host(host).source(source).build();
    tracker.init();

    for event in events {
        handle.dispatch(event);
    }
    debug!(dispatched = handle.dispatched(), "Replay finished");

    tracker.dispose();
    tracker
}
