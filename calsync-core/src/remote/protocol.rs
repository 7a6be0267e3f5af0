//! JSON protocol spoken between calsync and provider binaries over
//! stdin/stdout. One request per process, one response line back.

use serde::{Deserialize, Serialize, de::DeserializeOwned};

use crate::event::{Event, RemoteEvent};

pub trait ProviderCommand: Serialize {
    type Response: DeserializeOwned;
    fn command() -> Command;
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum Command {
    CheckConnection,
    ListEvents,
    CreateEvent,
    UpdateEvent,
    DeleteEvent,
}

/// Request sent from calsync to provider.
#[derive(Debug, Serialize, Deserialize)]
pub struct Request {
    pub command: Command,
    #[serde(default)]
    pub params: serde_json::Value,
}

/// Response sent from provider to calsync.
#[derive(Debug, Serialize, Deserialize)]
#[serde(tag = "status", rename_all = "snake_case")]
pub enum Response<T> {
    Success { data: T },
    Error { error: String },
}

/// Verify the provider can reach the remote calendar before any writes.
#[derive(Debug, Serialize, Deserialize)]
pub struct CheckConnection {
    #[serde(flatten)]
    pub remote_config: serde_json::Map<String, serde_json::Value>,
}

impl ProviderCommand for CheckConnection {
    type Response = String; // Human-readable identity (account, mailbox)
    fn command() -> Command {
        Command::CheckConnection
    }
}

/// List events within a time range.
///
/// Providers report `managed: true` for events that carry calsync's marker.
#[derive(Debug, Serialize, Deserialize)]
pub struct ListEvents {
    #[serde(flatten)]
    pub remote_config: serde_json::Map<String, serde_json::Value>,
    pub from: String,
    pub to: String,
}

impl ProviderCommand for ListEvents {
    type Response = Vec<RemoteEvent>;
    fn command() -> Command {
        Command::ListEvents
    }
}

/// Create a new event. Providers must mark it as managed by calsync.
#[derive(Debug, Serialize, Deserialize)]
pub struct CreateEvent {
    #[serde(flatten)]
    pub remote_config: serde_json::Map<String, serde_json::Value>,
    pub event: Event,
}

impl ProviderCommand for CreateEvent {
    type Response = RemoteEvent;
    fn command() -> Command {
        Command::CreateEvent
    }
}

/// Overwrite an existing event.
#[derive(Debug, Serialize, Deserialize)]
pub struct UpdateEvent {
    #[serde(flatten)]
    pub remote_config: serde_json::Map<String, serde_json::Value>,
    pub event: RemoteEvent,
}

impl ProviderCommand for UpdateEvent {
    type Response = ();
    fn command() -> Command {
        Command::UpdateEvent
    }
}

/// Delete an event by remote id.
#[derive(Debug, Serialize, Deserialize)]
pub struct DeleteEvent {
    #[serde(flatten)]
    pub remote_config: serde_json::Map<String, serde_json::Value>,
    pub remote_id: String,
}

impl ProviderCommand for DeleteEvent {
    type Response = ();
    fn command() -> Command {
        Command::DeleteEvent
    }
}
