//! Applies an [`ActionPlan`] to a [`RemoteCalendar`].

use tracing::{error, info};

use crate::reconcile::{ActionKind, ActionPlan};
use crate::remote::RemoteCalendar;
use crate::sync::stats::SyncStats;

pub struct SyncExecutor<'a, R: RemoteCalendar> {
    remote: &'a R,
    dry_run: bool,
}

impl<'a, R: RemoteCalendar> SyncExecutor<'a, R> {
    pub fn new(remote: &'a R) -> Self {
        SyncExecutor {
            remote,
            dry_run: false,
        }
    }

    /// Count what would happen without calling the remote.
    pub fn dry_run(mut self, dry_run: bool) -> Self {
        self.dry_run = dry_run;
        self
    }

    /// Run creates, then updates, then deletes. A failed operation is
    /// recorded and the rest of the plan still runs.
    pub async fn apply(&self, plan: &ActionPlan) -> SyncStats {
        let mut stats = SyncStats {
            unchanged: plan.unchanged.len(),
            skipped: plan.skips.len(),
            conflicts: plan.conflicts.len(),
            ..SyncStats::default()
        };

        for event in &plan.creates {
            let result = if self.dry_run {
                Ok(())
            } else {
                self.remote.create(event).await.map(|created| {
                    info!(summary = %event.summary, remote_id = %created.remote_id, "Created event");
                })
            };
            self.settle(&mut stats, ActionKind::Create, &event.summary, result);
        }

        for update in &plan.updates {
            let summary = &update.payload.event.summary;
            let result = if self.dry_run {
                Ok(())
            } else {
                self.remote.update(&update.payload).await.inspect(|_| {
                    info!(%summary, remote_id = %update.payload.remote_id, "Updated event");
                })
            };
            self.settle(&mut stats, ActionKind::Update, summary, result);
        }

        for remote_event in &plan.deletes {
            let summary = &remote_event.event.summary;
            let result = if self.dry_run {
                Ok(())
            } else {
                self.remote
                    .delete(&remote_event.remote_id)
                    .await
                    .inspect(|_| {
                        info!(%summary, remote_id = %remote_event.remote_id, "Deleted event");
                    })
            };
            self.settle(&mut stats, ActionKind::Delete, summary, result);
        }

        stats
    }

    fn settle(
        &self,
        stats: &mut SyncStats,
        kind: ActionKind,
        summary: &str,
        result: crate::CalSyncResult<()>,
    ) {
        match result {
            Ok(()) => stats.record_success(kind),
            Err(e) => {
                error!(%summary, ?kind, error = %e, "Remote operation failed");
                stats.record_failure(kind, summary, e.to_string());
            }
        }
    }
}

#[cfg(test)]
mod tests {
    use std::sync::Mutex;

    use chrono::{TimeZone, Utc};

    use super::*;
    use crate::date_range::DateRange;
    use crate::error::{CalSyncError, CalSyncResult};
    use crate::event::{Event, EventTime, RemoteEvent};
    use crate::reconcile::{Match, MatchKind, Update};

    #[derive(Default)]
    struct FakeRemote {
        events: Mutex<Vec<RemoteEvent>>,
        calls: Mutex<Vec<String>>,
        reject_summary: Option<String>,
    }

    impl FakeRemote {
        fn check(&self, call: String, summary: &str) -> CalSyncResult<()> {
            self.calls.lock().unwrap().push(call);
            if self.reject_summary.as_deref() == Some(summary) {
                return Err(CalSyncError::Provider("403 Forbidden".into()));
            }
            Ok(())
        }
    }

    impl RemoteCalendar for FakeRemote {
        async fn list(&self, _range: &DateRange) -> CalSyncResult<Vec<RemoteEvent>> {
            Ok(self.events.lock().unwrap().clone())
        }

        async fn create(&self, event: &Event) -> CalSyncResult<RemoteEvent> {
            self.check(format!("create {}", event.summary), &event.summary)?;
            let created = RemoteEvent {
                remote_id: format!("r-{}", event.uid),
                version_token: "1".into(),
                managed: true,
                event: event.clone(),
            };
            self.events.lock().unwrap().push(created.clone());
            Ok(created)
        }

        async fn update(&self, event: &RemoteEvent) -> CalSyncResult<()> {
            self.check(format!("update {}", event.remote_id), &event.event.summary)
        }

        async fn delete(&self, remote_id: &str) -> CalSyncResult<()> {
            self.check(format!("delete {remote_id}"), "")
        }
    }

    fn event(uid: &str, summary: &str) -> Event {
        Event {
            uid: uid.into(),
            summary: summary.into(),
            start: Some(EventTime::utc(Utc.with_ymd_and_hms(2025, 3, 1, 9, 0, 0).unwrap())),
            end: Some(EventTime::utc(Utc.with_ymd_and_hms(2025, 3, 1, 10, 0, 0).unwrap())),
            ..Default::default()
        }
    }

    fn managed(remote_id: &str, event: Event) -> RemoteEvent {
        RemoteEvent {
            remote_id: remote_id.into(),
            version_token: "v1".into(),
            managed: true,
            event,
        }
    }

    fn sample_plan() -> ActionPlan {
        let old = managed("r-old", event("old@x", "Old"));
        let stale = managed("r-b", event("b@x", "Standup"));
        ActionPlan {
            creates: vec![event("a@x", "Planning")],
            updates: vec![Update {
                matched: Match {
                    source: event("b@x", "Standup (moved)"),
                    remote: stale,
                    kind: MatchKind::Uid,
                },
                changes: vec![crate::reconcile::ChangedField::Summary],
                payload: managed("r-b", event("b@x", "Standup (moved)")),
            }],
            deletes: vec![old],
            skips: vec![RemoteEvent {
                managed: false,
                ..managed("r-mine", event("", "Dentist"))
            }],
            ..ActionPlan::default()
        }
    }

    #[tokio::test]
    async fn applies_in_order() {
        let remote = FakeRemote::default();
        let stats = SyncExecutor::new(&remote).apply(&sample_plan()).await;

        assert_eq!(
            *remote.calls.lock().unwrap(),
            vec!["create Planning", "update r-b", "delete r-old"]
        );
        assert_eq!(stats.created, 1);
        assert_eq!(stats.updated, 1);
        assert_eq!(stats.deleted, 1);
        assert_eq!(stats.skipped, 1);
        assert!(stats.is_clean());
    }

    #[tokio::test]
    async fn failure_does_not_stop_the_run() {
        let remote = FakeRemote {
            reject_summary: Some("Planning".into()),
            ..FakeRemote::default()
        };
        let stats = SyncExecutor::new(&remote).apply(&sample_plan()).await;

        assert_eq!(stats.created, 0);
        assert_eq!(stats.updated, 1);
        assert_eq!(stats.deleted, 1);
        assert_eq!(stats.errors(), 1);
        assert_eq!(stats.failures[0].kind, ActionKind::Create);
        assert_eq!(stats.failures[0].summary, "Planning");
        assert!(stats.failures[0].message.contains("403"));
    }

    #[tokio::test]
    async fn dry_run_never_calls_remote() {
        let remote = FakeRemote::default();
        let stats = SyncExecutor::new(&remote)
            .dry_run(true)
            .apply(&sample_plan())
            .await;

        assert!(remote.calls.lock().unwrap().is_empty());
        assert_eq!((stats.created, stats.updated, stats.deleted), (1, 1, 1));
    }
}
