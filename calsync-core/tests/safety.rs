//! Remote events calsync doesn't own are never updated or deleted.

use chrono::{Duration, TimeZone, Utc};

use calsync_core::{Event, EventTime, RemoteEvent, Tolerances, TimezoneResolver, reconcile};

fn event(uid: &str, summary: &str, offset_minutes: i64) -> Event {
    let start = Utc.with_ymd_and_hms(2025, 5, 5, 9, 0, 0).unwrap() + Duration::minutes(offset_minutes);
    Event {
        uid: uid.into(),
        summary: summary.into(),
        start: Some(EventTime::utc(start)),
        end: Some(EventTime::utc(start + Duration::hours(1))),
        ..Default::default()
    }
}

fn remote(id: usize, managed: bool, event: Event) -> RemoteEvent {
    RemoteEvent {
        remote_id: format!("r{id}"),
        version_token: String::new(),
        managed,
        event,
    }
}

#[test]
fn unmanaged_events_never_touched() {
    let summaries = ["Standup", "standup ", "Lunch", ""];
    let uids = ["a@x", "A@X", "b@x", ""];
    let offsets = [0, 10, 29, 30, 90];

    let mut source = Vec::new();
    let mut remotes = Vec::new();
    let mut id = 0;
    for (i, summary) in summaries.iter().enumerate() {
        for (j, uid) in uids.iter().enumerate() {
            for offset in offsets {
                if (i + j + offset as usize) % 3 == 0 {
                    source.push(event(uid, summary, offset));
                }
                id += 1;
                remotes.push(remote(id, id % 2 == 0, event(uid, summary, offset + 5)));
            }
        }
    }

    for tolerances in [
        Tolerances::default(),
        Tolerances {
            match_minutes: 0,
            update_minutes: 0,
        },
        Tolerances {
            match_minutes: 1_000,
            update_minutes: 60,
        },
    ] {
        let plan = reconcile(&source, &remotes, tolerances, &TimezoneResolver::utc_default());

        assert!(plan.updates.iter().all(|u| u.matched.remote.managed));
        assert!(plan.updates.iter().all(|u| u.payload.managed));
        assert!(plan.deletes.iter().all(|r| r.managed));

        // Every remote event lands in exactly one bucket
        let mut seen: Vec<&str> = plan
            .updates
            .iter()
            .map(|u| u.matched.remote.remote_id.as_str())
            .chain(plan.deletes.iter().map(|r| r.remote_id.as_str()))
            .chain(plan.skips.iter().map(|r| r.remote_id.as_str()))
            .chain(plan.unchanged.iter().map(|m| m.remote.remote_id.as_str()))
            .collect();
        seen.sort();
        let before = seen.len();
        seen.dedup();
        assert_eq!(seen.len(), before);
        assert_eq!(seen.len(), remotes.len());

        // Every feed event is created, matched or in conflict exactly once
        assert_eq!(
            plan.creates.len() + plan.updates.len() + plan.unchanged.len() + plan.conflicts.len(),
            source.len()
        );
    }
}
