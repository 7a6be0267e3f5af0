//! VEVENT extraction from raw feed text.
//!
//! Feeds in the wild are loosely formed, so parsing is forgiving: malformed
//! blocks and lines are skipped and counted rather than failing the whole
//! calendar. The only hard error is input with no content at all.

use std::fmt;

use chrono::{NaiveDate, NaiveDateTime};
use tracing::{debug, warn};

use crate::error::{CalSyncError, CalSyncResult};
use crate::event::{Event, EventStatus, EventTime};
use crate::ics::property::{ContentLine, PropertyName};
use crate::ics::text::{extract_address, unescape_text, unfold_lines};

const BEGIN_EVENT: &str = "BEGIN:VEVENT";
const END_EVENT: &str = "END:VEVENT";

/// Parse feed text into events, in the order they appear.
///
/// Fails only when `text` is empty or whitespace. Blocks without a UID are
/// left out.
pub fn parse(text: &str) -> CalSyncResult<Vec<Event>> {
    parse_with_report(text).map(|report| report.events)
}

/// Like [`parse`], also returning what was skipped along the way.
pub fn parse_with_report(text: &str) -> CalSyncResult<ParseReport> {
    if text.trim().is_empty() {
        return Err(CalSyncError::Format("calendar text is empty".into()));
    }

    let lines = unfold_lines(text);
    let mut report = ParseReport::default();
    let mut i = 0;

    while i < lines.len() {
        if !lines[i].eq_ignore_ascii_case(BEGIN_EVENT) {
            i += 1;
            continue;
        }

        report.blocks += 1;

        match find_block_end(&lines, i) {
            Some(end) => {
                let block = parse_block(&lines[i + 1..end]);
                report.diagnostics.extend(block.diagnostics);

                if block.event.uid.is_empty() {
                    report.skipped_without_uid += 1;
                    debug!(summary = %block.event.summary, "Skipping VEVENT without UID");
                } else {
                    report.events.push(block.event);
                }
                i = end + 1;
            }
            None => {
                report.unterminated_blocks += 1;
                warn!(line = i + 1, "VEVENT without matching END:VEVENT, ignoring");
                i += 1;
            }
        }
    }

    for diagnostic in &report.diagnostics {
        warn!("{}", diagnostic);
    }

    Ok(report)
}

/// Events plus everything that was dropped or degraded while parsing.
#[derive(Debug, Default)]
pub struct ParseReport {
    pub events: Vec<Event>,
    /// `BEGIN:VEVENT` lines seen.
    pub blocks: usize,
    pub skipped_without_uid: usize,
    pub unterminated_blocks: usize,
    pub diagnostics: Vec<ParseDiagnostic>,
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub enum ParseDiagnostic {
    /// A date property whose value could not be read. The property is left
    /// unset on the event.
    InvalidDateTime {
        uid: String,
        property: PropertyName,
        value: String,
    },
}

impl fmt::Display for ParseDiagnostic {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            ParseDiagnostic::InvalidDateTime {
                uid,
                property,
                value,
            } => write!(f, "Invalid {} value '{}' in event '{}'", property, value, uid),
        }
    }
}

/// Index of the `END:VEVENT` closing the block opened at `begin`.
///
/// A second `BEGIN:VEVENT` before any end means the first block was never
/// closed.
fn find_block_end(lines: &[String], begin: usize) -> Option<usize> {
    for (offset, line) in lines[begin + 1..].iter().enumerate() {
        if line.eq_ignore_ascii_case(END_EVENT) {
            return Some(begin + 1 + offset);
        }
        if line.eq_ignore_ascii_case(BEGIN_EVENT) {
            return None;
        }
    }
    None
}

struct ParsedBlock {
    event: Event,
    diagnostics: Vec<ParseDiagnostic>,
}

fn parse_block(lines: &[String]) -> ParsedBlock {
    let mut event = Event::default();
    let mut invalid: Vec<(PropertyName, String)> = Vec::new();
    // Nested components (VALARM) have their own DESCRIPTION/SUMMARY
    let mut nested_depth = 0usize;

    for line in lines {
        let Some(content) = ContentLine::split(line) else {
            continue;
        };

        if content.name.eq_ignore_ascii_case("BEGIN") {
            nested_depth += 1;
            continue;
        }
        if content.name.eq_ignore_ascii_case("END") {
            nested_depth = nested_depth.saturating_sub(1);
            continue;
        }
        if nested_depth > 0 {
            continue;
        }

        let Some(property) = PropertyName::from_name(content.name) else {
            continue;
        };

        match property {
            PropertyName::Uid => event.uid = content.value.trim().to_string(),
            PropertyName::Summary => event.summary = unescape_text(content.value),
            PropertyName::Description => event.description = unescape_text(content.value),
            PropertyName::Location => event.location = unescape_text(content.value),
            PropertyName::Url => event.url = content.value.to_string(),
            PropertyName::Organizer => event.organizer = extract_address(content.value),
            PropertyName::Attendee => event.attendees.push(extract_address(content.value)),
            PropertyName::DtStart => match parse_date_time(&content) {
                Some(start) => {
                    event.is_all_day = matches!(start, EventTime::Date { .. });
                    if let Some(tzid) = content.param("TZID") {
                        event.time_zone = tzid.to_string();
                    }
                    event.start = Some(start);
                }
                None => invalid.push((property, content.value.to_string())),
            },
            PropertyName::DtEnd => match parse_date_time(&content) {
                Some(end) => event.end = Some(end),
                None => invalid.push((property, content.value.to_string())),
            },
            PropertyName::LastModified => match parse_date_time(&content) {
                Some(modified) => event.last_modified = Some(modified),
                None => invalid.push((property, content.value.to_string())),
            },
            PropertyName::Status => event.status = EventStatus::from_ics_str(content.value),
            PropertyName::RRule => event.recurrence_rule = content.value.to_string(),
        }
    }

    let diagnostics = invalid
        .into_iter()
        .map(|(property, value)| ParseDiagnostic::InvalidDateTime {
            uid: event.uid.clone(),
            property,
            value,
        })
        .collect();

    ParsedBlock { event, diagnostics }
}

/// Read a DATE or DATE-TIME value, keeping its provenance.
///
/// No zone conversion happens here: a `TZID` only tags the value.
fn parse_date_time(content: &ContentLine) -> Option<EventTime> {
    let value = content.value.trim();
    let is_eight_digits = value.len() == 8 && value.bytes().all(|b| b.is_ascii_digit());

    // A bare YYYYMMDD without VALUE=DATE is not a DATE-TIME and is rejected below
    if content.is_date_value() {
        if is_eight_digits {
            return NaiveDate::parse_from_str(value, "%Y%m%d")
                .ok()
                .map(EventTime::date);
        }
        debug!(value, "VALUE=DATE on a date-time value, reading it as date-time");
    }

    if let Some(utc) = value.strip_suffix('Z').or_else(|| value.strip_suffix('z')) {
        return parse_civil(utc).map(|dt| EventTime::utc(dt.and_utc()));
    }

    let civil = parse_civil(value)?;
    match content.param("TZID") {
        Some(tzid) if !tzid.is_empty() => Some(EventTime::zoned(civil, tzid)),
        _ => Some(EventTime::floating(civil)),
    }
}

fn parse_civil(value: &str) -> Option<NaiveDateTime> {
    NaiveDateTime::parse_from_str(value, "%Y%m%dT%H%M%S").ok()
}

#[cfg(test)]
mod tests {
    use super::*;
    use chrono::{TimeZone, Utc};

    fn wrap(body: &str) -> String {
        format!(
            "BEGIN:VCALENDAR\r\nVERSION:2.0\r\nPRODID:TEST\r\n{}\r\nEND:VCALENDAR\r\n",
            body
        )
    }

    fn single(body: &str) -> Event {
        let text = wrap(&format!("BEGIN:VEVENT\r\nUID:test-1\r\n{}\r\nEND:VEVENT", body));
        let mut events = parse(&text).expect("Should parse");
        assert_eq!(events.len(), 1);
        events.remove(0)
    }

    fn naive(y: i32, m: u32, d: u32, h: u32, min: u32) -> NaiveDateTime {
        NaiveDate::from_ymd_opt(y, m, d)
            .unwrap()
            .and_hms_opt(h, min, 0)
            .unwrap()
    }

    #[test]
    fn empty_and_whitespace_input_is_a_format_error() {
        assert!(matches!(parse(""), Err(CalSyncError::Format(_))));
        assert!(matches!(parse("  \r\n\t "), Err(CalSyncError::Format(_))));
    }

    #[test]
    fn text_without_events_yields_nothing() {
        let events = parse("BEGIN:VCALENDAR\nEND:VCALENDAR").unwrap();
        assert!(events.is_empty());
    }

    #[test]
    fn parses_basic_utc_event() {
        let event = single(
            "SUMMARY:Test\r\nDTSTART:20241201T090000Z\r\nDTEND:20241201T100000Z\r\nSTATUS:CONFIRMED",
        );

        assert_eq!(event.uid, "test-1");
        assert_eq!(event.summary, "Test");
        assert_eq!(
            event.start,
            Some(EventTime::utc(Utc.with_ymd_and_hms(2024, 12, 1, 9, 0, 0).unwrap()))
        );
        assert_eq!(
            event.end,
            Some(EventTime::utc(Utc.with_ymd_and_hms(2024, 12, 1, 10, 0, 0).unwrap()))
        );
        assert_eq!(event.status, EventStatus::Confirmed);
        assert!(!event.is_all_day);
    }

    #[test]
    fn folded_summary_is_joined() {
        let event = single("SUMMARY:Multiline\r\n Summary Test");
        assert_eq!(event.summary, "MultilineSummary Test");
    }

    #[test]
    fn all_day_event_has_no_invented_end() {
        let event = single("SUMMARY:Christmas\r\nDTSTART;VALUE=DATE:20241225");

        assert!(event.is_all_day);
        assert_eq!(
            event.start,
            Some(EventTime::date(NaiveDate::from_ymd_opt(2024, 12, 25).unwrap()))
        );
        assert_eq!(event.end, None);
    }

    #[test]
    fn tzid_is_recorded_without_conversion() {
        let event = single(
            "DTSTART;TZID=Europe/Berlin:20240715T100000\r\nDTEND;TZID=Europe/Berlin:20240715T110000",
        );

        assert_eq!(event.time_zone, "Europe/Berlin");
        assert_eq!(
            event.start,
            Some(EventTime::zoned(naive(2024, 7, 15, 10, 0), "Europe/Berlin"))
        );
    }

    #[test]
    fn value_without_zone_is_floating() {
        let event = single("DTSTART:20240715T100000");
        assert_eq!(event.start, Some(EventTime::floating(naive(2024, 7, 15, 10, 0))));
        assert_eq!(event.time_zone, "");
    }

    #[test]
    fn escaped_text_is_unescaped() {
        let event = single("SUMMARY:Text with\\nline break and\\, comma\r\nLOCATION:Room 1\\; Floor 2");
        assert_eq!(event.summary, "Text with\nline break and, comma");
        assert_eq!(event.location, "Room 1; Floor 2");
    }

    #[test]
    fn attendees_keep_order_and_duplicates() {
        let event = single(
            "ORGANIZER;CN=Boss:MAILTO:boss@example.com\r\n\
             ATTENDEE;CN=A;PARTSTAT=ACCEPTED:mailto:a@example.com\r\n\
             ATTENDEE:mailto:b@example.com\r\n\
             ATTENDEE:mailto:a@example.com",
        );

        assert_eq!(event.organizer, "boss@example.com");
        assert_eq!(
            event.attendees,
            vec!["a@example.com", "b@example.com", "a@example.com"]
        );
    }

    #[test]
    fn recurrence_rule_is_opaque() {
        let event = single("RRULE:FREQ=WEEKLY;BYDAY=MO,WE;COUNT=10");
        assert_eq!(event.recurrence_rule, "FREQ=WEEKLY;BYDAY=MO,WE;COUNT=10");
    }

    #[test]
    fn unknown_status_is_tentative() {
        assert_eq!(single("STATUS:CANCELLED").status, EventStatus::Cancelled);
        assert_eq!(single("STATUS:SOMETHING").status, EventStatus::Tentative);
        assert_eq!(single("SUMMARY:No status").status, EventStatus::Tentative);
    }

    #[test]
    fn unknown_properties_and_garbage_lines_are_ignored() {
        let event = single("X-MICROSOFT-CDO-BUSYSTATUS:BUSY\r\nthis is not a property\r\nSUMMARY:Kept");
        assert_eq!(event.summary, "Kept");
    }

    #[test]
    fn blocks_without_uid_are_dropped() {
        let text = wrap(
            "BEGIN:VEVENT\r\nUID:a\r\nSUMMARY:One\r\nEND:VEVENT\r\n\
             BEGIN:VEVENT\r\nSUMMARY:No uid\r\nEND:VEVENT\r\n\
             BEGIN:VEVENT\r\nUID:b\r\nSUMMARY:Two\r\nEND:VEVENT",
        );

        let report = parse_with_report(&text).unwrap();

        let uids: Vec<_> = report.events.iter().map(|e| e.uid.as_str()).collect();
        assert_eq!(uids, vec!["a", "b"]);
        assert_eq!(report.blocks, 3);
        assert_eq!(report.skipped_without_uid, 1);
    }

    #[test]
    fn unterminated_block_is_ignored_but_later_blocks_survive() {
        let text = wrap(
            "BEGIN:VEVENT\r\nUID:broken\r\nSUMMARY:Never closed\r\n\
             BEGIN:VEVENT\r\nUID:ok\r\nSUMMARY:Fine\r\nEND:VEVENT\r\n\
             BEGIN:VEVENT\r\nUID:tail",
        );

        let report = parse_with_report(&text).unwrap();

        assert_eq!(report.events.len(), 1);
        assert_eq!(report.events[0].uid, "ok");
        assert_eq!(report.events[0].summary, "Fine");
        assert_eq!(report.unterminated_blocks, 2);
    }

    #[test]
    fn alarm_properties_do_not_leak_into_event() {
        let event = single(
            "DESCRIPTION:Event body\r\n\
             BEGIN:VALARM\r\nACTION:DISPLAY\r\nDESCRIPTION:Reminder\r\nTRIGGER:-PT15M\r\nEND:VALARM",
        );
        assert_eq!(event.description, "Event body");
    }

    #[test]
    fn invalid_dates_are_reported_not_substituted() {
        let text = wrap(
            "BEGIN:VEVENT\r\nUID:bad\r\nDTSTART:tomorrow\r\nDTEND:20241301T250000\r\nEND:VEVENT",
        );

        let report = parse_with_report(&text).unwrap();

        assert_eq!(report.events.len(), 1);
        assert_eq!(report.events[0].start, None);
        assert_eq!(report.events[0].end, None);
        assert_eq!(
            report.diagnostics[0],
            ParseDiagnostic::InvalidDateTime {
                uid: "bad".into(),
                property: PropertyName::DtStart,
                value: "tomorrow".into(),
            }
        );
        assert_eq!(report.diagnostics.len(), 2);
    }

    #[test]
    fn date_requires_value_date_parameter() {
        let text = wrap(
            "BEGIN:VEVENT\r\nUID:bare-date\r\nDTSTART:20241225\r\nEND:VEVENT\r\n\
             BEGIN:VEVENT\r\nUID:typed-date\r\nDTSTART;VALUE=DATE:20241225\r\nEND:VEVENT",
        );

        let report = parse_with_report(&text).unwrap();

        let bare = &report.events[0];
        assert_eq!(bare.start, None);
        assert!(!bare.is_all_day);
        assert_eq!(
            report.diagnostics,
            vec![ParseDiagnostic::InvalidDateTime {
                uid: "bare-date".into(),
                property: PropertyName::DtStart,
                value: "20241225".into(),
            }]
        );

        let typed = &report.events[1];
        assert!(typed.is_all_day);
        assert_eq!(
            typed.start,
            Some(EventTime::date(NaiveDate::from_ymd_opt(2024, 12, 25).unwrap()))
        );
    }

    #[test]
    fn lowercase_markers_are_accepted() {
        let text = "begin:vevent\nuid:x\nsummary:lower\nend:vevent";
        let events = parse(text).unwrap();
        assert_eq!(events.len(), 1);
        assert_eq!(events[0].summary, "lower");
    }
}
