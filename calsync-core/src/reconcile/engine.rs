//! Matching feed events against remote events.

use std::collections::HashSet;

use chrono::{DateTime, Duration, Utc};
use serde::{Deserialize, Serialize};
use tracing::debug;

use crate::constants::{DEFAULT_MATCH_TOLERANCE_MINUTES, DEFAULT_UPDATE_TOLERANCE_MINUTES};
use crate::event::{Event, RemoteEvent};
use crate::reconcile::plan::{ActionPlan, ChangedField, Match, MatchKind, Update};
use crate::timezone::TimezoneResolver;

/// Time slack used by [`reconcile`].
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub struct Tolerances {
    /// Starts must be closer than this for a summary-based match.
    pub match_minutes: i64,
    /// Start or end drift beyond this marks a matched event as changed.
    pub update_minutes: i64,
}

impl Default for Tolerances {
    fn default() -> Self {
        Tolerances {
            match_minutes: DEFAULT_MATCH_TOLERANCE_MINUTES,
            update_minutes: DEFAULT_UPDATE_TOLERANCE_MINUTES,
        }
    }
}

/// Compute the operations that bring `remote` in line with `source`.
///
/// Each feed event, in order, takes the first remaining remote event that
/// shares its UID, or failing that one with the same summary starting within
/// `match_minutes`. Matched remote events leave the pool, so none is used
/// twice. Leftover remote events are deleted only when calsync owns them.
///
/// Deterministic for a given input order; inputs are not modified.
pub fn reconcile(
    source: &[Event],
    remote: &[RemoteEvent],
    tolerances: Tolerances,
    resolver: &TimezoneResolver,
) -> ActionPlan {
    let source_spans: Vec<Span> = source.iter().map(|e| Span::of(e, resolver)).collect();
    let remote_spans: Vec<Span> = remote
        .iter()
        .map(|r| Span::of(&r.event, resolver))
        .collect();

    let match_window = minutes_saturating(tolerances.match_minutes);
    let update_window = minutes_saturating(tolerances.update_minutes);

    // Remote events carrying one of these are reserved for the UID rule
    let source_uids: HashSet<String> = source
        .iter()
        .map(|e| uid_key(&e.uid))
        .filter(|uid| !uid.is_empty())
        .collect();

    // Remaining remote events; matched slots are emptied, order is kept
    let mut pool: Vec<Option<&RemoteEvent>> = remote.iter().map(Some).collect();
    let mut plan = ActionPlan::default();

    for (event, span) in source.iter().zip(&source_spans) {
        let found = find_by_uid(&pool, event)
            .map(|idx| (idx, MatchKind::Uid))
            .or_else(|| {
                find_by_summary_and_time(
                    &pool,
                    &remote_spans,
                    &source_uids,
                    event,
                    span,
                    match_window,
                )
                .map(|idx| (idx, MatchKind::SummaryAndTime))
            });

        let Some((idx, kind)) = found else {
            debug!(uid = %event.uid, summary = %event.summary, "No remote match, will create");
            plan.creates.push(event.clone());
            continue;
        };
        let Some(matched_remote) = pool[idx].take() else {
            continue;
        };

        debug!(
            uid = %event.uid,
            remote_id = %matched_remote.remote_id,
            ?kind,
            "Matched feed event to remote event"
        );

        let matched = Match {
            source: event.clone(),
            remote: matched_remote.clone(),
            kind,
        };

        if !matched_remote.managed {
            debug!(
                uid = %event.uid,
                remote_id = %matched_remote.remote_id,
                "Matched remote event is not managed by calsync, leaving it alone"
            );
            plan.skips.push(matched_remote.clone());
            plan.conflicts.push(matched);
            continue;
        }

        let changes = changed_fields(
            event,
            span,
            &matched_remote.event,
            &remote_spans[idx],
            update_window,
        );

        if changes.is_empty() {
            plan.unchanged.push(matched);
        } else {
            let payload = RemoteEvent {
                remote_id: matched_remote.remote_id.clone(),
                version_token: matched_remote.version_token.clone(),
                managed: matched_remote.managed,
                event: event.clone(),
            };
            plan.updates.push(Update {
                matched,
                changes,
                payload,
            });
        }
    }

    for leftover in pool.into_iter().flatten() {
        if leftover.managed {
            plan.deletes.push(leftover.clone());
        } else {
            plan.skips.push(leftover.clone());
        }
    }

    plan
}

/// Start and end as absolute instants, resolved once per event.
struct Span {
    start: Option<DateTime<Utc>>,
    end: Option<DateTime<Utc>>,
}

impl Span {
    fn of(event: &Event, resolver: &TimezoneResolver) -> Self {
        Span {
            start: event
                .start
                .as_ref()
                .map(|t| resolver.to_absolute(t, &event.time_zone)),
            end: event
                .end
                .as_ref()
                .map(|t| resolver.to_absolute(t, &event.time_zone)),
        }
    }
}

fn find_by_uid(pool: &[Option<&RemoteEvent>], event: &Event) -> Option<usize> {
    let uid = uid_key(&event.uid);
    if uid.is_empty() {
        return None;
    }

    pool.iter()
        .position(|slot| slot.is_some_and(|r| uid_key(&r.event.uid) == uid))
}

fn find_by_summary_and_time(
    pool: &[Option<&RemoteEvent>],
    remote_spans: &[Span],
    source_uids: &HashSet<String>,
    event: &Event,
    span: &Span,
    window: Duration,
) -> Option<usize> {
    let start = span.start?;
    let summary = event.summary.trim();

    pool.iter().zip(remote_spans).position(|(slot, remote_span)| {
        let Some(remote) = slot else {
            return false;
        };
        if source_uids.contains(&uid_key(&remote.event.uid)) {
            return false;
        }
        let Some(remote_start) = remote_span.start else {
            return false;
        };
        eq_ignore_case(remote.event.summary.trim(), summary)
            && (remote_start - start).abs() < window
    })
}

fn changed_fields(
    source: &Event,
    source_span: &Span,
    remote: &Event,
    remote_span: &Span,
    window: Duration,
) -> Vec<ChangedField> {
    let mut changes = Vec::new();

    if !eq_ignore_case(&source.summary, &remote.summary) {
        changes.push(ChangedField::Summary);
    }
    if drifted(source_span.start, remote_span.start, window) {
        changes.push(ChangedField::Start);
    }
    if drifted(source_span.end, remote_span.end, window) {
        changes.push(ChangedField::End);
    }
    if normalize_text(&source.location) != normalize_text(&remote.location) {
        changes.push(ChangedField::Location);
    }
    if normalize_text(&source.description) != normalize_text(&remote.description) {
        changes.push(ChangedField::Description);
    }

    changes
}

/// A value appearing or disappearing counts as drift.
fn drifted(a: Option<DateTime<Utc>>, b: Option<DateTime<Utc>>, window: Duration) -> bool {
    match (a, b) {
        (Some(a), Some(b)) => (a - b).abs() > window,
        (None, None) => false,
        _ => true,
    }
}

fn uid_key(uid: &str) -> String {
    uid.trim().to_lowercase()
}

/// Tolerances are configuration; out-of-range values widen to "any".
fn minutes_saturating(minutes: i64) -> Duration {
    Duration::try_minutes(minutes).unwrap_or(if minutes < 0 {
        Duration::MIN
    } else {
        Duration::MAX
    })
}

fn eq_ignore_case(a: &str, b: &str) -> bool {
    a == b || a.to_lowercase() == b.to_lowercase()
}

/// Providers may rewrite line endings and pad text; neither is a change.
fn normalize_text(value: &str) -> String {
    value.replace("\r\n", "\n").trim().to_string()
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::event::EventTime;
    use chrono::{NaiveDate, TimeZone};

    fn at(h: u32, m: u32) -> EventTime {
        EventTime::utc(Utc.with_ymd_and_hms(2024, 12, 1, h, m, 0).unwrap())
    }

    fn event(uid: &str, summary: &str, start: EventTime, end: EventTime) -> Event {
        Event {
            uid: uid.into(),
            summary: summary.into(),
            start: Some(start),
            end: Some(end),
            ..Default::default()
        }
    }

    fn remote(id: &str, event: Event, managed: bool) -> RemoteEvent {
        RemoteEvent {
            remote_id: id.into(),
            version_token: format!("{id}-v1"),
            managed,
            event,
        }
    }

    fn run(source: &[Event], remote: &[RemoteEvent]) -> ActionPlan {
        reconcile(source, remote, Tolerances::default(), &TimezoneResolver::utc_default())
    }

    #[test]
    fn empty_remote_creates_everything() {
        let source = vec![event("e1@x", "Test", at(9, 0), at(10, 0))];

        let plan = run(&source, &[]);

        assert_eq!(plan.creates, source);
        assert!(plan.updates.is_empty());
        assert!(plan.deletes.is_empty());
        assert!(plan.skips.is_empty());
    }

    #[test]
    fn uid_match_is_case_insensitive_and_unchanged_when_equal() {
        let source = vec![event("E1@X", "Standup", at(9, 0), at(9, 15))];
        let remotes = vec![remote("r1", event("e1@x", "standup", at(9, 0), at(9, 15)), true)];

        let plan = run(&source, &remotes);

        assert!(plan.is_empty());
        assert_eq!(plan.unchanged.len(), 1);
        assert_eq!(plan.unchanged[0].kind, MatchKind::Uid);
    }

    #[test]
    fn uid_match_wins_over_better_summary_candidate() {
        let source = vec![event("e1", "Planning", at(9, 0), at(10, 0))];
        let remotes = vec![
            remote("lookalike", event("other", "Planning", at(9, 0), at(10, 0)), true),
            remote("by-uid", event("e1", "Something else", at(15, 0), at(16, 0)), true),
        ];

        let plan = run(&source, &remotes);

        assert_eq!(plan.updates.len(), 1);
        assert_eq!(plan.updates[0].matched.remote.remote_id, "by-uid");
        assert_eq!(plan.updates[0].matched.kind, MatchKind::Uid);
        assert_eq!(plan.deletes.len(), 1);
        assert_eq!(plan.deletes[0].remote_id, "lookalike");
    }

    #[test]
    fn summary_and_time_fallback_within_tolerance() {
        let source = vec![event("feed-uid", "  Review ", at(9, 0), at(10, 0))];
        let remotes = vec![remote("r1", event("", "review", at(9, 20), at(10, 20)), true)];

        let plan = run(&source, &remotes);

        assert_eq!(plan.updates.len(), 1);
        let update = &plan.updates[0];
        assert_eq!(update.matched.kind, MatchKind::SummaryAndTime);
        // Matching trims summaries, change detection does not
        assert_eq!(
            update.changes,
            vec![ChangedField::Summary, ChangedField::Start, ChangedField::End]
        );
    }

    #[test]
    fn summary_fallback_rejects_distant_start() {
        let source = vec![event("feed-uid", "Review", at(9, 0), at(10, 0))];
        let remotes = vec![remote("r1", event("", "Review", at(9, 30), at(10, 30)), true)];

        let plan = run(&source, &remotes);

        assert_eq!(plan.creates.len(), 1);
        assert_eq!(plan.deletes.len(), 1);
    }

    #[test]
    fn small_drift_is_not_an_update() {
        let source = vec![event("e1", "Sync", at(9, 0), at(10, 0))];
        let remotes = vec![remote("r1", event("e1", "Sync", at(9, 4), at(10, 5)), true)];

        let plan = run(&source, &remotes);

        assert!(plan.updates.is_empty());
        assert_eq!(plan.unchanged.len(), 1);
    }

    #[test]
    fn location_and_description_changes_are_updates() {
        let mut changed = event("e1", "Sync", at(9, 0), at(10, 0));
        changed.location = "Room B".into();
        changed.description = "Agenda".into();
        let mut current = event("e1", "Sync", at(9, 0), at(10, 0));
        current.location = "Room A".into();
        current.description = "Agenda\r\n".into();

        let plan = run(&[changed.clone()], &[remote("r1", current, true)]);

        assert_eq!(plan.updates.len(), 1);
        assert_eq!(plan.updates[0].changes, vec![ChangedField::Location]);
        assert_eq!(plan.updates[0].payload.event, changed);
        assert_eq!(plan.updates[0].payload.remote_id, "r1");
        assert_eq!(plan.updates[0].payload.version_token, "r1-v1");
    }

    #[test]
    fn times_are_compared_as_instants() {
        // 10:00 Berlin in winter is 09:00 UTC
        let civil = NaiveDate::from_ymd_opt(2024, 12, 1)
            .unwrap()
            .and_hms_opt(10, 0, 0)
            .unwrap();
        let mut source = event(
            "e1",
            "Sync",
            EventTime::zoned(civil, "Europe/Berlin"),
            EventTime::zoned(civil + Duration::hours(1), "Europe/Berlin"),
        );
        source.time_zone = "Europe/Berlin".into();
        let remotes = vec![remote("r1", event("e1", "Sync", at(9, 0), at(10, 0)), true)];

        let plan = run(&[source], &remotes);

        assert!(plan.updates.is_empty());
        assert_eq!(plan.unchanged.len(), 1);
    }

    #[test]
    fn each_remote_event_is_matched_at_most_once() {
        let source = vec![
            event("a", "Standup", at(9, 0), at(9, 15)),
            event("b", "Standup", at(9, 5), at(9, 20)),
        ];
        let remotes = vec![remote("r1", event("", "Standup", at(9, 0), at(9, 15)), true)];

        let plan = run(&source, &remotes);

        assert_eq!(plan.unchanged.len(), 1);
        assert_eq!(plan.unchanged[0].source.uid, "a");
        assert_eq!(plan.creates.len(), 1);
        assert_eq!(plan.creates[0].uid, "b");
    }

    #[test]
    fn summary_fallback_skips_remote_owned_by_another_feed_uid() {
        let source = vec![
            event("a", "Standup", at(9, 0), at(9, 15)),
            event("b", "Other", at(15, 0), at(15, 30)),
        ];
        let remotes = vec![remote("r-b", event("b", "Standup", at(9, 0), at(9, 15)), true)];

        let plan = run(&source, &remotes);

        assert_eq!(plan.creates.len(), 1);
        assert_eq!(plan.creates[0].uid, "a");
        assert_eq!(plan.updates.len(), 1);
        let update = &plan.updates[0];
        assert_eq!(update.matched.source.uid, "b");
        assert_eq!(update.matched.remote.remote_id, "r-b");
        assert_eq!(update.matched.kind, MatchKind::Uid);
        assert!(plan.unchanged.is_empty());
    }

    #[test]
    fn huge_tolerances_do_not_panic() {
        let source = vec![event("a", "Standup", at(9, 0), at(9, 15))];
        let remotes = vec![remote("r1", event("", "Standup", at(20, 0), at(20, 15)), true)];

        let plan = reconcile(
            &source,
            &remotes,
            Tolerances {
                match_minutes: i64::MAX,
                update_minutes: i64::MAX,
            },
            &TimezoneResolver::utc_default(),
        );

        assert_eq!(plan.unchanged.len(), 1);
        assert_eq!(plan.unchanged[0].kind, MatchKind::SummaryAndTime);
    }

    #[test]
    fn leftover_remote_events_split_by_ownership() {
        let remotes = vec![
            remote("ours", event("old", "Gone", at(9, 0), at(10, 0)), true),
            remote("theirs", event("", "Lunch", at(12, 0), at(13, 0)), false),
        ];

        let plan = run(&[], &remotes);

        assert_eq!(plan.deletes.len(), 1);
        assert_eq!(plan.deletes[0].remote_id, "ours");
        assert_eq!(plan.skips.len(), 1);
        assert_eq!(plan.skips[0].remote_id, "theirs");
    }

    #[test]
    fn unmanaged_match_is_never_updated() {
        let source = vec![
            event("shared", "Renamed", at(11, 0), at(12, 0)),
            event("feed-2", "Lunch", at(12, 0), at(13, 0)),
        ];
        let remotes = vec![
            remote("by-uid", event("shared", "Original", at(9, 0), at(10, 0)), false),
            remote("by-name", event("", "Lunch", at(12, 0), at(13, 0)), false),
        ];

        let plan = run(&source, &remotes);

        assert!(plan.is_empty());
        assert_eq!(plan.skips.len(), 2);
        assert_eq!(plan.conflicts.len(), 2);
    }

    #[test]
    fn event_without_start_never_matches_by_summary() {
        let source = vec![Event {
            uid: "no-start".into(),
            summary: "Floating idea".into(),
            ..Default::default()
        }];
        let remotes = vec![remote("r1", event("", "Floating idea", at(9, 0), at(10, 0)), true)];

        let plan = run(&source, &remotes);

        assert_eq!(plan.creates.len(), 1);
        assert_eq!(plan.deletes.len(), 1);
    }
}
