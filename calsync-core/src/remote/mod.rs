//! The writable side of a sync.

pub mod protocol;
pub mod provider;

use std::collections::HashMap;
use std::future::Future;

use serde::{Deserialize, Serialize};

use crate::date_range::DateRange;
use crate::error::CalSyncResult;
use crate::event::{Event, RemoteEvent};
use crate::remote::protocol::{CheckConnection, CreateEvent, DeleteEvent, ListEvents, UpdateEvent};
use crate::remote::provider::Provider;

/// A calendar calsync can list and write.
///
/// Implementations must report `managed: true` on events they created on
/// calsync's behalf, and only on those.
pub trait RemoteCalendar {
    fn list(&self, range: &DateRange)
    -> impl Future<Output = CalSyncResult<Vec<RemoteEvent>>> + Send;

    fn create(&self, event: &Event) -> impl Future<Output = CalSyncResult<RemoteEvent>> + Send;

    fn update(&self, event: &RemoteEvent) -> impl Future<Output = CalSyncResult<()>> + Send;

    fn delete(&self, remote_id: &str) -> impl Future<Output = CalSyncResult<()>> + Send;
}

/// Provider-specific settings forwarded verbatim to the provider binary.
#[derive(Debug, Serialize, Deserialize, Clone, Default, PartialEq)]
pub struct RemoteConfig(pub HashMap<String, toml::Value>);

impl From<&RemoteConfig> for serde_json::Map<String, serde_json::Value> {
    fn from(config: &RemoteConfig) -> Self {
        config
            .0
            .iter()
            .filter_map(|(k, v)| serde_json::to_value(v).ok().map(|v| (k.clone(), v)))
            .collect()
    }
}

/// A remote calendar reached through a provider binary, e.g.
///
/// ```toml
/// [remote]
/// provider = "exchange"
/// mailbox = "me@example.com"
/// ```
#[derive(Debug, Serialize, Deserialize, Clone, PartialEq)]
pub struct Remote {
    pub provider: Provider,
    #[serde(flatten)]
    pub config: RemoteConfig,
}

impl Remote {
    fn remote_config(&self) -> serde_json::Map<String, serde_json::Value> {
        serde_json::Map::from(&self.config)
    }

    /// Ask the provider to authenticate and return who it is connected as.
    pub async fn check_connection(&self) -> CalSyncResult<String> {
        self.provider
            .call(CheckConnection {
                remote_config: self.remote_config(),
            })
            .await
    }
}

impl RemoteCalendar for Remote {
    async fn list(&self, range: &DateRange) -> CalSyncResult<Vec<RemoteEvent>> {
        self.provider
            .call(ListEvents {
                remote_config: self.remote_config(),
                from: range.from_rfc3339(),
                to: range.to_rfc3339(),
            })
            .await
    }

    async fn create(&self, event: &Event) -> CalSyncResult<RemoteEvent> {
        self.provider
            .call(CreateEvent {
                remote_config: self.remote_config(),
                event: event.clone(),
            })
            .await
    }

    async fn update(&self, event: &RemoteEvent) -> CalSyncResult<()> {
        self.provider
            .call(UpdateEvent {
                remote_config: self.remote_config(),
                event: event.clone(),
            })
            .await
    }

    async fn delete(&self, remote_id: &str) -> CalSyncResult<()> {
        self.provider
            .call(DeleteEvent {
                remote_config: self.remote_config(),
                remote_id: remote_id.to_string(),
            })
            .await
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn remote_deserializes_from_toml_table() {
        let remote: Remote = toml::from_str(
            r#"
provider = "exchange"
mailbox = "me@example.com"
page_size = 50
"#,
        )
        .unwrap();

        assert_eq!(remote.provider.name(), "exchange");
        let params = serde_json::Map::from(&remote.config);
        assert_eq!(params["mailbox"], "me@example.com");
        assert_eq!(params["page_size"], 50);
        assert!(!params.contains_key("provider"));
    }
}
