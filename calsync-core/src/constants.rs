/// Start times closer than this are considered the same occurrence when
/// matching events that have no common UID.
pub const DEFAULT_MATCH_TOLERANCE_MINUTES: i64 = 30;

/// Start/end drift allowed before a matched event is rewritten.
pub const DEFAULT_UPDATE_TOLERANCE_MINUTES: i64 = 5;

/// Zone assumed for civil times whose declared zone can't be resolved.
pub const DEFAULT_TIME_ZONE: &str = "Europe/Moscow";

/// Days before today included in the sync window.
pub const DEFAULT_SYNC_DAYS_PAST: i64 = 30;

/// Days after today included in the sync window.
pub const DEFAULT_SYNC_DAYS_FUTURE: i64 = 90;
