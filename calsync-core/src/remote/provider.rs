//! Provider subprocess protocol.
//!
//! Remote calendars are reached through external binaries named
//! `calsync-provider-<name>` that speak the JSON protocol in
//! [`super::protocol`] over stdin/stdout. Providers hold their own
//! credentials; calsync only forwards the `[remote]` config table.

use std::process::Stdio;
use std::time::Duration;

use serde::{Deserialize, Serialize, de::DeserializeOwned};
use tokio::io::AsyncWriteExt;
use tokio::process::Command as TokioCommand;
use tokio::time::timeout;

use crate::error::{CalSyncError, CalSyncResult};
use crate::remote::protocol::{Command, ProviderCommand, Request, Response};

const PROVIDER_TIMEOUT: Duration = Duration::from_secs(30);

#[derive(Clone, Debug, PartialEq, Eq, Serialize, Deserialize)]
pub struct Provider(String);

impl Provider {
    pub fn from_name(name: &str) -> Self {
        Provider(name.to_string())
    }

    pub fn name(&self) -> &str {
        &self.0
    }

    pub fn binary_name(&self) -> String {
        format!("calsync-provider-{}", self.0)
    }

    fn binary_path(&self) -> CalSyncResult<std::path::PathBuf> {
        which::which(self.binary_name())
            .map_err(|_| CalSyncError::ProviderNotInstalled(self.binary_name()))
    }

    /// Call a typed provider command and return the result.
    ///
    /// The response type is inferred from the command's associated type.
    pub async fn call<C: ProviderCommand>(&self, cmd: C) -> CalSyncResult<C::Response> {
        timeout(PROVIDER_TIMEOUT, self.call_raw(C::command(), cmd))
            .await
            .map_err(|_| CalSyncError::ProviderTimeout(PROVIDER_TIMEOUT.as_secs()))?
    }

    async fn call_raw<P: Serialize, R: DeserializeOwned>(
        &self,
        command: Command,
        params: P,
    ) -> CalSyncResult<R> {
        let params = serde_json::to_value(params)
            .map_err(|e| CalSyncError::Serialization(e.to_string()))?;
        let request = Request { command, params };
        let request_json = serde_json::to_string(&request)
            .map_err(|e| CalSyncError::Serialization(e.to_string()))?;

        let binary_path = self.binary_path()?;
        tracing::debug!(provider = %self.0, ?command, "calling provider");

        let mut child = TokioCommand::new(&binary_path)
            .stdin(Stdio::piped())
            .stdout(Stdio::piped())
            .stderr(Stdio::inherit())
            .kill_on_drop(true)
            .spawn()
            .map_err(|e| {
                CalSyncError::Provider(format!("Failed to spawn {}: {}", binary_path.display(), e))
            })?;

        let mut stdin = child
            .stdin
            .take()
            .ok_or_else(|| CalSyncError::Provider("Provider stdin unavailable".into()))?;
        stdin
            .write_all(format!("{request_json}\n").as_bytes())
            .await?;
        drop(stdin);

        let output = child.wait_with_output().await?;

        if !output.status.success() {
            return Err(CalSyncError::Provider(format!(
                "Provider exited with status: {}",
                output.status.code().unwrap_or(-1)
            )));
        }

        let response_str = String::from_utf8_lossy(&output.stdout);
        if response_str.trim().is_empty() {
            return Err(CalSyncError::Provider(
                "Provider returned no response".into(),
            ));
        }

        let response: Response<R> = serde_json::from_str(&response_str)
            .map_err(|e| CalSyncError::Provider(format!("Failed to parse response: {}", e)))?;

        match response {
            Response::Success { data } => Ok(data),
            Response::Error { error } => Err(CalSyncError::Provider(error)),
        }
    }
}
