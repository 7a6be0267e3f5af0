//! Content lines (`NAME;PARAM=VALUE:VALUE`) and the property names we act on.

use std::fmt;

/// VEVENT properties calsync reads. Everything else is skipped.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum PropertyName {
    Uid,
    Summary,
    Description,
    Location,
    Url,
    Organizer,
    Attendee,
    DtStart,
    DtEnd,
    LastModified,
    Status,
    RRule,
}

impl PropertyName {
    pub fn from_name(name: &str) -> Option<Self> {
        let property = match name.trim().to_ascii_uppercase().as_str() {
            "UID" => PropertyName::Uid,
            "SUMMARY" => PropertyName::Summary,
            "DESCRIPTION" => PropertyName::Description,
            "LOCATION" => PropertyName::Location,
            "URL" => PropertyName::Url,
            "ORGANIZER" => PropertyName::Organizer,
            "ATTENDEE" => PropertyName::Attendee,
            "DTSTART" => PropertyName::DtStart,
            "DTEND" => PropertyName::DtEnd,
            "LAST-MODIFIED" => PropertyName::LastModified,
            "STATUS" => PropertyName::Status,
            "RRULE" => PropertyName::RRule,
            _ => return None,
        };
        Some(property)
    }

    pub fn as_str(&self) -> &'static str {
        match self {
            PropertyName::Uid => "UID",
            PropertyName::Summary => "SUMMARY",
            PropertyName::Description => "DESCRIPTION",
            PropertyName::Location => "LOCATION",
            PropertyName::Url => "URL",
            PropertyName::Organizer => "ORGANIZER",
            PropertyName::Attendee => "ATTENDEE",
            PropertyName::DtStart => "DTSTART",
            PropertyName::DtEnd => "DTEND",
            PropertyName::LastModified => "LAST-MODIFIED",
            PropertyName::Status => "STATUS",
            PropertyName::RRule => "RRULE",
        }
    }
}

impl fmt::Display for PropertyName {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

/// One unfolded line split into its parts.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ContentLine<'a> {
    pub name: &'a str,
    /// Everything between the first `;` and the first `:`, unparsed.
    pub params: &'a str,
    pub value: &'a str,
}

impl<'a> ContentLine<'a> {
    /// Split on the first `:`, then split the left side on the first `;`.
    /// Lines without a colon aren't properties.
    pub fn split(line: &'a str) -> Option<Self> {
        let (left, value) = line.split_once(':')?;
        let (name, params) = left.split_once(';').unwrap_or((left, ""));
        Some(ContentLine {
            name,
            params,
            value,
        })
    }

    /// Value of parameter `key` (case-insensitive), quotes stripped.
    pub fn param(&self, key: &str) -> Option<&'a str> {
        self.params
            .split(';')
            .filter_map(|p| p.split_once('='))
            .find(|(k, _)| k.trim().eq_ignore_ascii_case(key))
            .map(|(_, v)| v.trim().trim_matches('"'))
    }

    pub fn is_date_value(&self) -> bool {
        self.param("VALUE")
            .is_some_and(|v| v.eq_ignore_ascii_case("DATE"))
    }
}
