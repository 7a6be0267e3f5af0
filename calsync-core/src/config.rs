//! calsync configuration.

use std::path::{Path, PathBuf};

use config::{Config, Environment, File};
use serde::{Deserialize, Serialize};

use crate::constants::{
    DEFAULT_MATCH_TOLERANCE_MINUTES, DEFAULT_SYNC_DAYS_FUTURE, DEFAULT_SYNC_DAYS_PAST,
    DEFAULT_TIME_ZONE, DEFAULT_UPDATE_TOLERANCE_MINUTES,
};
use crate::date_range::DateRange;
use crate::error::{CalSyncError, CalSyncResult};
use crate::reconcile::Tolerances;
use crate::remote::Remote;
use crate::timezone::TimezoneResolver;

fn default_time_zone() -> String {
    DEFAULT_TIME_ZONE.to_string()
}

fn default_match_tolerance() -> i64 {
    DEFAULT_MATCH_TOLERANCE_MINUTES
}

fn default_update_tolerance() -> i64 {
    DEFAULT_UPDATE_TOLERANCE_MINUTES
}

fn default_days_past() -> i64 {
    DEFAULT_SYNC_DAYS_PAST
}

fn default_days_future() -> i64 {
    DEFAULT_SYNC_DAYS_FUTURE
}

/// Configuration at ~/.config/calsync/config.toml, overridable by an explicit
/// file and by `CALSYNC_*` environment variables (in that order).
#[derive(Debug, Serialize, Deserialize, Clone, PartialEq)]
pub struct CalsyncConfig {
    /// ICS feed to read. `webcal://` URLs and local paths are accepted.
    #[serde(default)]
    pub feed_url: Option<String>,

    /// Zone for floating times and undeclared zones.
    #[serde(default = "default_time_zone")]
    pub default_time_zone: String,

    #[serde(default = "default_match_tolerance")]
    pub match_tolerance_minutes: i64,

    #[serde(default = "default_update_tolerance")]
    pub update_tolerance_minutes: i64,

    #[serde(default = "default_days_past")]
    pub sync_days_past: i64,

    #[serde(default = "default_days_future")]
    pub sync_days_future: i64,

    #[serde(default)]
    pub remote: Option<Remote>,
}

impl Default for CalsyncConfig {
    fn default() -> Self {
        CalsyncConfig {
            feed_url: None,
            default_time_zone: default_time_zone(),
            match_tolerance_minutes: DEFAULT_MATCH_TOLERANCE_MINUTES,
            update_tolerance_minutes: DEFAULT_UPDATE_TOLERANCE_MINUTES,
            sync_days_past: DEFAULT_SYNC_DAYS_PAST,
            sync_days_future: DEFAULT_SYNC_DAYS_FUTURE,
            remote: None,
        }
    }
}

impl CalsyncConfig {
    pub fn config_path() -> CalSyncResult<PathBuf> {
        let config_dir = dirs::config_dir()
            .ok_or_else(|| CalSyncError::Config("Could not determine config directory".into()))?
            .join("calsync");

        Ok(config_dir.join("config.toml"))
    }

    /// Load the user config, creating a commented default on first run.
    pub fn load(explicit: Option<&Path>) -> CalSyncResult<Self> {
        let config_path = Self::config_path()?;

        if !config_path.exists() {
            Self::create_default_config(&config_path)?;
        }

        Self::load_from(&config_path, explicit)
    }

    /// Layer `base` (optional), `explicit` (required if given) and the
    /// environment, then validate.
    pub fn load_from(base: &Path, explicit: Option<&Path>) -> CalSyncResult<Self> {
        let mut builder = Config::builder().add_source(File::from(base).required(false));

        if let Some(path) = explicit {
            let expanded = PathBuf::from(shellexpand::tilde(&path.to_string_lossy()).into_owned());
            builder = builder.add_source(File::from(expanded).required(true));
        }

        let config: CalsyncConfig = builder
            .add_source(Environment::with_prefix("CALSYNC").try_parsing(true))
            .build()
            .map_err(|e| CalSyncError::Config(e.to_string()))?
            .try_deserialize()
            .map_err(|e| CalSyncError::Config(e.to_string()))?;

        config.validate()?;
        Ok(config)
    }

    fn validate(&self) -> CalSyncResult<()> {
        for (name, value) in [
            ("match_tolerance_minutes", self.match_tolerance_minutes),
            ("update_tolerance_minutes", self.update_tolerance_minutes),
            ("sync_days_past", self.sync_days_past),
            ("sync_days_future", self.sync_days_future),
        ] {
            if value < 0 {
                return Err(CalSyncError::Config(format!(
                    "{name} must not be negative (got {value})"
                )));
            }
        }
        Ok(())
    }

    pub fn tolerances(&self) -> Tolerances {
        Tolerances {
            match_minutes: self.match_tolerance_minutes,
            update_minutes: self.update_tolerance_minutes,
        }
    }

    pub fn resolver(&self) -> TimezoneResolver {
        TimezoneResolver::new(&self.default_time_zone)
    }

    /// The sync window around the current time.
    pub fn date_range(&self) -> DateRange {
        DateRange::around(chrono::Utc::now(), self.sync_days_past, self.sync_days_future)
    }

    /// Create a default config file with all options commented out.
    pub fn create_default_config(path: &Path) -> CalSyncResult<()> {
        let contents = format!(
            "\
# calsync configuration

# ICS feed to mirror (https://, webcal:// or a local path):
# feed_url = \"https://example.com/calendar.ics\"

# Zone for times without an explicit offset:
# default_time_zone = \"{DEFAULT_TIME_ZONE}\"

# Pair events by summary when their starts are closer than this:
# match_tolerance_minutes = {DEFAULT_MATCH_TOLERANCE_MINUTES}

# Ignore start/end drift up to this:
# update_tolerance_minutes = {DEFAULT_UPDATE_TOLERANCE_MINUTES}

# Sync window, in days around today:
# sync_days_past = {DEFAULT_SYNC_DAYS_PAST}
# sync_days_future = {DEFAULT_SYNC_DAYS_FUTURE}

# Remote calendar, reached through calsync-provider-<provider>:
# [remote]
# provider = \"exchange\"
# mailbox = \"me@example.com\"
"
        );

        if let Some(parent) = path.parent() {
            std::fs::create_dir_all(parent).map_err(|e| {
                CalSyncError::Config(format!("Could not create config directory: {e}"))
            })?;
        }

        std::fs::write(path, contents)
            .map_err(|e| CalSyncError::Config(format!("Could not write config file: {e}")))?;

        Ok(())
    }
}
