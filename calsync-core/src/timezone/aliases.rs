//! Zone names seen in real-world feeds that need mapping before lookup.

use std::str::FromStr;

use chrono_tz::{America, Asia, Australia, Etc, Europe, Tz};

/// Names matched case-insensitively before falling back to an IANA lookup.
///
/// Exchange and Outlook export Windows zone names in `TZID`, so those are
/// mapped onto the IANA zone with the same rules.
const ZONE_ALIASES: &[(&str, Tz)] = &[
    ("UTC", Tz::UTC),
    ("Z", Tz::UTC),
    ("Etc/UTC", Tz::UTC),
    ("GMT", Etc::GMT),
    ("Europe/Moscow", Europe::Moscow),
    ("Russian Standard Time", Europe::Moscow),
    ("Europe/London", Europe::London),
    ("GMT Standard Time", Europe::London),
    ("Europe/Berlin", Europe::Berlin),
    ("W. Europe Standard Time", Europe::Berlin),
    ("Europe/Paris", Europe::Paris),
    ("Romance Standard Time", Europe::Paris),
    ("America/New_York", America::New_York),
    ("Eastern Standard Time", America::New_York),
    ("America/Chicago", America::Chicago),
    ("Central Standard Time", America::Chicago),
    ("America/Denver", America::Denver),
    ("Mountain Standard Time", America::Denver),
    ("America/Los_Angeles", America::Los_Angeles),
    ("Pacific Standard Time", America::Los_Angeles),
    ("Asia/Tokyo", Asia::Tokyo),
    ("Tokyo Standard Time", Asia::Tokyo),
    ("China Standard Time", Asia::Shanghai),
    ("India Standard Time", Asia::Kolkata),
    ("Australia/Sydney", Australia::Sydney),
    ("AUS Eastern Standard Time", Australia::Sydney),
];

/// Resolve a declared zone name to its rules.
///
/// Returns `None` for names that are neither aliased nor valid IANA names.
pub fn lookup_zone(name: &str) -> Option<Tz> {
    let name = name.trim().trim_matches('"');
    if name.is_empty() {
        return None;
    }

    ZONE_ALIASES
        .iter()
        .find(|(alias, _)| alias.eq_ignore_ascii_case(name))
        .map(|(_, tz)| *tz)
        .or_else(|| Tz::from_str(name).ok())
}
