//! Core of calsync: one-way sync from a read-only ICS feed into a remote calendar.
//!
//! - `ics` turns raw feed text into [`Event`]s
//! - `timezone` decides which absolute instant a civil time means
//! - `reconcile` diffs feed events against remote events into an [`ActionPlan`]
//! - `sync` applies a plan through a [`RemoteCalendar`]

pub mod config;
pub mod constants;
pub mod date_range;
pub mod error;
pub mod event;
pub mod ics;
pub mod reconcile;
pub mod remote;
pub mod sync;
pub mod timezone;

pub use error::{CalSyncError, CalSyncResult};
pub use event::*;
pub use reconcile::{ActionPlan, Tolerances, reconcile};
pub use remote::RemoteCalendar;
pub use timezone::TimezoneResolver;
