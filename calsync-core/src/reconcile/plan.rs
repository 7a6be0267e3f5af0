use std::fmt;

use serde::Serialize;

use crate::event::{Event, RemoteEvent};

/// The operation a plan entry asks for.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
pub enum ActionKind {
    Create,
    Update,
    Delete,
}

impl ActionKind {
    pub fn symbol(&self) -> &'static str {
        match self {
            ActionKind::Create => "+",
            ActionKind::Update => "~",
            ActionKind::Delete => "-",
        }
    }
}

impl fmt::Display for ActionKind {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.symbol())
    }
}

/// Which rule paired a feed event with a remote event.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
pub enum MatchKind {
    Uid,
    SummaryAndTime,
}

/// Fields that differ between a matched pair.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
pub enum ChangedField {
    Summary,
    Start,
    End,
    Location,
    Description,
}

impl fmt::Display for ChangedField {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let name = match self {
            ChangedField::Summary => "summary",
            ChangedField::Start => "start",
            ChangedField::End => "end",
            ChangedField::Location => "location",
            ChangedField::Description => "description",
        };
        f.write_str(name)
    }
}

/// A feed event paired with the remote event it corresponds to.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct Match {
    pub source: Event,
    pub remote: RemoteEvent,
    pub kind: MatchKind,
}

/// A matched pair whose remote side must be overwritten.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct Update {
    pub matched: Match,
    pub changes: Vec<ChangedField>,
    /// Full replacement: every field from the feed event, addressed by the
    /// remote id and version token of the matched remote event.
    pub payload: RemoteEvent,
}

/// Output of one reconciliation run.
///
/// `creates`, `updates`, `deletes` and `skips` never share a remote event,
/// and `updates`/`deletes` only ever contain managed remote events.
#[derive(Debug, Clone, Default, PartialEq, Serialize)]
pub struct ActionPlan {
    pub creates: Vec<Event>,
    pub updates: Vec<Update>,
    pub deletes: Vec<RemoteEvent>,
    /// Remote events calsync doesn't own. Never acted upon.
    pub skips: Vec<RemoteEvent>,
    pub unchanged: Vec<Match>,
    /// Feed events that matched a remote event calsync doesn't own. The remote
    /// side is in `skips`; the feed event is neither created nor applied.
    pub conflicts: Vec<Match>,
}

impl ActionPlan {
    /// True when applying the plan would not touch the remote calendar.
    pub fn is_empty(&self) -> bool {
        self.creates.is_empty() && self.updates.is_empty() && self.deletes.is_empty()
    }

    pub fn operation_count(&self) -> usize {
        self.creates.len() + self.updates.len() + self.deletes.len()
    }

    pub fn count(&self, kind: ActionKind) -> usize {
        match kind {
            ActionKind::Create => self.creates.len(),
            ActionKind::Update => self.updates.len(),
            ActionKind::Delete => self.deletes.len(),
        }
    }
}
