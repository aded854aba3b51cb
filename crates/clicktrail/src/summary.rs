//! Aggregation over buffered events.

use std::collections::BTreeMap;

use serde::Serialize;

use crate::buffer::RingBuffer;
use crate::event::{ErrorEvent, ErrorType, InteractionEvent, InteractionType};

/// Number of recent events included in a summary.
pub const SUMMARY_RECENT_EVENTS: usize = 10;

/// A snapshot of what the tracker currently holds.
#[derive(Debug, Clone, PartialEq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct AnalyticsSummary {
    /// Buffered interactions.
    pub total_interactions: usize,
    /// Buffered errors.
    pub total_errors: usize,
    /// Interaction counts by type.
    pub interaction_types: BTreeMap<InteractionType, usize>,
    /// Error counts by type.
    pub error_types: BTreeMap<ErrorType, usize>,
    /// Interaction counts by element category.
    pub element_counts: BTreeMap<String, usize>,
    /// Latest errors, oldest first.
    pub recent_errors: Vec<ErrorEvent>,
    /// Latest interactions, oldest first.
    pub recent_interactions: Vec<InteractionEvent>,
}

impl AnalyticsSummary {
    /// Aggregate the given buffers.
    #[must_use]
    pub fn from_buffers(
        interactions: &RingBuffer<InteractionEvent>,
        errors: &RingBuffer<ErrorEvent>,
    ) -> Self {
        let mut interaction_types = BTreeMap::new();
        let mut element_counts = BTreeMap::new();
        for event in interactions.iter() {
            *interaction_types.entry(event.kind).or_insert(0) += 1;
            *element_counts.entry(event.element.clone()).or_insert(0) += 1;
        }

        let mut error_types = BTreeMap::new();
        for event in errors.iter() {
            *error_types.entry(event.kind).or_insert(0) += 1;
        }

        Self {
            total_interactions: interactions.len(),
            total_errors: errors.len(),
            interaction_types,
            error_types,
            element_counts,
            recent_errors: errors.recent(SUMMARY_RECENT_EVENTS),
            recent_interactions: interactions.recent(SUMMARY_RECENT_EVENTS),
        }
    }
}
