use std::sync::atomic::{AtomicUsize, Ordering};

use serde::Serialize;

/// Running counters for [`super::TimezoneResolver`]. Shared resolvers can be
/// used from several threads, hence atomics.
#[derive(Debug, Default)]
pub struct ResolutionStats {
    absolute: AtomicUsize,
    declared: AtomicUsize,
    default_zone: AtomicUsize,
    system_local: AtomicUsize,
    unknown_zone_names: AtomicUsize,
    nonexistent_local_times: AtomicUsize,
}

/// Point-in-time copy of [`ResolutionStats`].
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize)]
pub struct ResolutionCounts {
    /// Values that were already UTC.
    pub absolute: usize,
    /// Resolved with the declared zone.
    pub declared: usize,
    /// Resolved with the configured default zone.
    pub default_zone: usize,
    /// Resolved with the host zone.
    pub system_local: usize,
    /// Declared names that matched no known zone.
    pub unknown_zone_names: usize,
    /// Civil times inside a DST gap of the zone tried.
    pub nonexistent_local_times: usize,
}

impl ResolutionCounts {
    /// Conversions that did not use the zone the value asked for.
    pub fn fallbacks(&self) -> usize {
        self.default_zone + self.system_local
    }
}

impl ResolutionStats {
    pub(crate) fn record_absolute(&self) {
        self.absolute.fetch_add(1, Ordering::Relaxed);
    }

    pub(crate) fn record_declared(&self) {
        self.declared.fetch_add(1, Ordering::Relaxed);
    }

    pub(crate) fn record_default(&self) {
        self.default_zone.fetch_add(1, Ordering::Relaxed);
    }

    pub(crate) fn record_system_local(&self) {
        self.system_local.fetch_add(1, Ordering::Relaxed);
    }

    pub(crate) fn record_unknown_name(&self) {
        self.unknown_zone_names.fetch_add(1, Ordering::Relaxed);
    }

    pub(crate) fn record_nonexistent(&self) {
        self.nonexistent_local_times.fetch_add(1, Ordering::Relaxed);
    }

    pub fn snapshot(&self) -> ResolutionCounts {
        ResolutionCounts {
            absolute: self.absolute.load(Ordering::Relaxed),
            declared: self.declared.load(Ordering::Relaxed),
            default_zone: self.default_zone.load(Ordering::Relaxed),
            system_local: self.system_local.load(Ordering::Relaxed),
            unknown_zone_names: self.unknown_zone_names.load(Ordering::Relaxed),
            nonexistent_local_times: self.nonexistent_local_times.load(Ordering::Relaxed),
        }
    }
}
