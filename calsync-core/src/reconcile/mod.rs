//! Feed-to-remote reconciliation.

mod engine;
mod plan;

pub use engine::{Tolerances, reconcile};
pub use plan::{ActionKind, ActionPlan, ChangedField, Match, MatchKind, Update};
