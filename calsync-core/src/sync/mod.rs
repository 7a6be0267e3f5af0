//! Applying reconciliation results to a remote calendar.

mod executor;
mod stats;

pub use executor::SyncExecutor;
pub use stats::{SyncFailure, SyncStats};

use tracing::{debug, warn};

use crate::date_range::DateRange;
use crate::event::Event;
use crate::timezone::TimezoneResolver;

/// Narrow parsed feed events to the ones a sync should consider.
///
/// Drops events without a start, events whose start falls outside `range`
/// and timed events that end before they start.
pub fn prepare_source_events(
    events: Vec<Event>,
    range: &DateRange,
    resolver: &TimezoneResolver,
) -> Vec<Event> {
    events
        .into_iter()
        .filter(|event| {
            let Some(start) = &event.start else {
                debug!(uid = %event.uid, "Dropping event without start");
                return false;
            };
            if !range.contains(resolver.to_absolute(start, &event.time_zone)) {
                return false;
            }
            if !event.has_valid_span(resolver) {
                warn!(uid = %event.uid, summary = %event.summary, "Dropping event that ends before it starts");
                return false;
            }
            true
        })
        .collect()
}
