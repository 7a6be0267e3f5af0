use std::fmt;

use serde::Serialize;

use crate::reconcile::ActionKind;

/// A single remote operation that failed.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct SyncFailure {
    pub kind: ActionKind,
    pub summary: String,
    pub message: String,
}

impl fmt::Display for SyncFailure {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{} {}: {}", self.kind, self.summary, self.message)
    }
}

/// Tally of one applied plan.
#[derive(Debug, Clone, Default, PartialEq, Serialize)]
pub struct SyncStats {
    pub created: usize,
    pub updated: usize,
    pub deleted: usize,
    pub unchanged: usize,
    pub skipped: usize,
    pub conflicts: usize,
    pub failures: Vec<SyncFailure>,
}

impl SyncStats {
    pub fn errors(&self) -> usize {
        self.failures.len()
    }

    pub fn is_clean(&self) -> bool {
        self.failures.is_empty()
    }

    pub(crate) fn record_success(&mut self, kind: ActionKind) {
        match kind {
            ActionKind::Create => self.created += 1,
            ActionKind::Update => self.updated += 1,
            ActionKind::Delete => self.deleted += 1,
        }
    }

    pub(crate) fn record_failure(&mut self, kind: ActionKind, summary: &str, message: String) {
        self.failures.push(SyncFailure {
            kind,
            summary: summary.to_string(),
            message,
        });
    }
}

impl fmt::Display for SyncStats {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(
            f,
            "{} created, {} updated, {} deleted, {} unchanged, {} skipped, {} errors",
            self.created,
            self.updated,
            self.deleted,
            self.unchanged,
            self.skipped,
            self.errors()
        )
    }
}
