//! Civil time to absolute instant conversion.
//!
//! [`TimezoneResolver`] is the only place that decides what instant a
//! zoned, floating, or date-only [`EventTime`] refers to. Resolution order:
//!
//! 1. the declared zone (the `TZID` on the value, else the event's zone)
//! 2. the configured default zone
//! 3. the zone of the machine running calsync
//!
//! A time that falls in a spring-forward gap of the chosen zone is read with
//! the offset in effect before the transition (RFC 5545, 3.3.5).
//!
//! Each step that is taken is counted in [`ResolutionStats`] so a silent
//! misconversion shows up in the numbers.

mod aliases;
mod stats;

pub use aliases::lookup_zone;
pub use stats::{ResolutionCounts, ResolutionStats};

use chrono::{DateTime, Duration, Local, NaiveDateTime, NaiveTime, TimeZone, Utc};
use chrono_tz::Tz;
use tracing::{debug, warn};

use crate::event::EventTime;

#[derive(Debug)]
pub struct TimezoneResolver {
    default_zone_name: String,
    default_zone: Option<Tz>,
    stats: ResolutionStats,
}

impl TimezoneResolver {
    /// Create a resolver whose second fallback is `default_zone`.
    ///
    /// An unresolvable default is not an error: conversions then fall
    /// straight through to the system zone.
    pub fn new(default_zone: &str) -> Self {
        let resolved = lookup_zone(default_zone);
        if resolved.is_none() {
            warn!(
                zone = default_zone,
                "Default time zone is not recognized, civil times will use the system zone"
            );
        }

        TimezoneResolver {
            default_zone_name: default_zone.to_string(),
            default_zone: resolved,
            stats: ResolutionStats::default(),
        }
    }

    /// Resolver defaulting to UTC. Results never depend on the host zone.
    pub fn utc_default() -> Self {
        Self::new("UTC")
    }

    pub fn default_zone_name(&self) -> &str {
        &self.default_zone_name
    }

    /// Snapshot of how conversions have been resolved so far.
    pub fn counts(&self) -> ResolutionCounts {
        self.stats.snapshot()
    }

    /// The absolute instant `time` refers to.
    ///
    /// `declared_zone` is the event-level zone (usually the DTSTART `TZID`),
    /// used for values that don't carry their own. Pass `""` when there is none.
    pub fn to_absolute(&self, time: &EventTime, declared_zone: &str) -> DateTime<Utc> {
        let (civil, declared) = match time {
            EventTime::Utc { datetime } => {
                self.stats.record_absolute();
                return *datetime;
            }
            EventTime::Zoned { datetime, tzid } => (*datetime, tzid.as_str()),
            EventTime::Floating { datetime } => (*datetime, declared_zone),
            EventTime::Date { date } => (date.and_time(NaiveTime::MIN), declared_zone),
        };

        self.civil_to_absolute(civil, declared)
    }

    fn civil_to_absolute(&self, civil: NaiveDateTime, declared: &str) -> DateTime<Utc> {
        let declared = declared.trim();

        if !declared.is_empty() {
            match lookup_zone(declared) {
                Some(tz) => {
                    if let Some(instant) = self.localize_counted(&tz, civil, declared) {
                        self.stats.record_declared();
                        return instant;
                    }
                }
                None => {
                    self.stats.record_unknown_name();
                    warn!(
                        zone = declared,
                        default = %self.default_zone_name,
                        "Unknown time zone, falling back to default"
                    );
                }
            }
        }

        if let Some(tz) = &self.default_zone {
            if let Some(instant) = self.localize_counted(tz, civil, &self.default_zone_name) {
                self.stats.record_default();
                debug!(zone = %self.default_zone_name, %civil, "Resolved civil time with default zone");
                return instant;
            }
        }

        self.stats.record_system_local();
        warn!(%civil, "Resolving civil time in the system zone");
        system_local_to_utc(civil)
    }

    /// [`localize`], then [`before_gap`] for a time the zone skips.
    fn localize_counted(&self, tz: &Tz, civil: NaiveDateTime, zone: &str) -> Option<DateTime<Utc>> {
        if let Some(instant) = localize(tz, civil) {
            return Some(instant);
        }

        self.stats.record_nonexistent();
        debug!(zone, %civil, "Local time falls in a daylight saving gap");
        before_gap(tz, civil)
    }
}

impl Default for TimezoneResolver {
    fn default() -> Self {
        Self::new(crate::constants::DEFAULT_TIME_ZONE)
    }
}

/// Apply the zone's rules as of `civil`'s own date.
///
/// Ambiguous times (fall-back overlap) resolve to the earlier instant;
/// times inside a spring-forward gap don't exist and yield `None`.
fn localize<Z: TimeZone>(tz: &Z, civil: NaiveDateTime) -> Option<DateTime<Utc>> {
    tz.from_local_datetime(&civil)
        .earliest()
        .map(|dt| dt.with_timezone(&Utc))
}

/// Read a skipped local time with the offset from before the transition:
/// find the nearest earlier hour that exists and shift its instant forward.
fn before_gap<Z: TimeZone>(tz: &Z, civil: NaiveDateTime) -> Option<DateTime<Utc>> {
    (1..=24).find_map(|hours| {
        let shift = Duration::hours(hours);
        let earlier = civil.checked_sub_signed(shift)?;
        localize(tz, earlier)?.checked_add_signed(shift)
    })
}

/// Last resort, so it always yields an instant. Failing everything else the
/// wall clock is read as UTC.
fn system_local_to_utc(civil: NaiveDateTime) -> DateTime<Utc> {
    localize(&Local, civil)
        .or_else(|| before_gap(&Local, civil))
        .unwrap_or_else(|| civil.and_utc())
}
