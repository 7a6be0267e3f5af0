//! Provider-neutral event types.
//!
//! The same [`Event`] shape is produced by the ICS parser for feed events and
//! by remote providers for events already in the target calendar. Remote
//! events are wrapped in a [`RemoteEvent`] carrying the address and ownership
//! data the provider attaches.

use std::fmt;

use chrono::{DateTime, NaiveDate, NaiveDateTime, Utc};
use serde::{Deserialize, Serialize};

use crate::timezone::TimezoneResolver;

/// A calendar event (feed or remote side).
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct Event {
    pub uid: String,
    pub summary: String,
    #[serde(default)]
    pub description: String,
    #[serde(default)]
    pub location: String,
    #[serde(default)]
    pub url: String,
    #[serde(default)]
    pub organizer: String,
    /// Addresses in the order they appeared, duplicates kept.
    #[serde(default)]
    pub attendees: Vec<String>,
    pub start: Option<EventTime>,
    /// Unset for all-day events that carry no DTEND.
    pub end: Option<EventTime>,
    #[serde(default)]
    pub is_all_day: bool,
    /// TZID declared on DTSTART, empty when none.
    #[serde(default)]
    pub time_zone: String,
    /// RRULE value, carried through without interpretation.
    #[serde(default)]
    pub recurrence_rule: String,
    #[serde(default)]
    pub status: EventStatus,
    pub last_modified: Option<EventTime>,
}

impl Event {
    /// `start <= end` when both are present on a timed event.
    pub fn has_valid_span(&self, resolver: &TimezoneResolver) -> bool {
        if self.is_all_day {
            return true;
        }
        match (&self.start, &self.end) {
            (Some(start), Some(end)) => {
                resolver.to_absolute(start, &self.time_zone)
                    <= resolver.to_absolute(end, &self.time_zone)
            }
            _ => true,
        }
    }
}

impl fmt::Display for Event {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        if self.summary.is_empty() {
            write!(f, "(No title)")
        } else {
            write!(f, "{}", self.summary)
        }
    }
}

/// A timestamp together with where its meaning comes from.
///
/// The variant is the provenance: only `Utc` is an absolute instant. Every
/// other variant must go through [`TimezoneResolver::to_absolute`] before it
/// is compared with anything.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(tag = "kind", rename_all = "snake_case")]
pub enum EventTime {
    /// `YYYYMMDDTHHMMSSZ`
    Utc { datetime: DateTime<Utc> },
    /// Civil time with a declared `TZID`
    Zoned {
        datetime: NaiveDateTime,
        tzid: String,
    },
    /// Civil time with no zone information
    Floating { datetime: NaiveDateTime },
    /// `VALUE=DATE`
    Date { date: NaiveDate },
}

impl EventTime {
    pub fn utc(datetime: DateTime<Utc>) -> Self {
        EventTime::Utc { datetime }
    }

    pub fn zoned(datetime: NaiveDateTime, tzid: impl Into<String>) -> Self {
        EventTime::Zoned {
            datetime,
            tzid: tzid.into(),
        }
    }

    pub fn floating(datetime: NaiveDateTime) -> Self {
        EventTime::Floating { datetime }
    }

    pub fn date(date: NaiveDate) -> Self {
        EventTime::Date { date }
    }

    /// The calendar date as written, before any zone conversion.
    pub fn civil_date(&self) -> NaiveDate {
        match self {
            EventTime::Utc { datetime } => datetime.date_naive(),
            EventTime::Zoned { datetime, .. } | EventTime::Floating { datetime } => {
                datetime.date()
            }
            EventTime::Date { date } => *date,
        }
    }
}

impl fmt::Display for EventTime {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            EventTime::Utc { datetime } => write!(f, "{}", datetime.format("%Y-%m-%d %H:%M UTC")),
            EventTime::Zoned { datetime, tzid } => {
                write!(f, "{} ({})", datetime.format("%Y-%m-%d %H:%M"), tzid)
            }
            EventTime::Floating { datetime } => write!(f, "{}", datetime.format("%Y-%m-%d %H:%M")),
            EventTime::Date { date } => write!(f, "{}", date.format("%Y-%m-%d")),
        }
    }
}

#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
pub enum EventStatus {
    #[default]
    Tentative,
    Confirmed,
    Cancelled,
}

impl EventStatus {
    /// Anything that isn't CONFIRMED or CANCELLED is tentative.
    pub fn from_ics_str(value: &str) -> Self {
        match value.trim().to_ascii_uppercase().as_str() {
            "CONFIRMED" => EventStatus::Confirmed,
            "CANCELLED" => EventStatus::Cancelled,
            _ => EventStatus::Tentative,
        }
    }
}

/// An event as it exists in the remote calendar.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct RemoteEvent {
    /// Provider-side identifier used to address updates and deletes.
    pub remote_id: String,
    /// Opaque revision token, passed back untouched on update.
    #[serde(default)]
    pub version_token: String,
    /// Whether calsync created this event. Set by the provider from the
    /// marker it attaches at creation time.
    #[serde(default)]
    pub managed: bool,
    pub event: Event,
}

impl fmt::Display for RemoteEvent {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.event)
    }
}
