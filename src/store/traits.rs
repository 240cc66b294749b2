// ABOUTME: Defines the PendingRequestStore trait and PendingEntry, the serialized
// ABOUTME: state of a backchannel request awaiting resumption elsewhere.

use std::time::{Duration, SystemTime, UNIX_EPOCH};

use async_trait::async_trait;
use serde::{Deserialize, Serialize};

use crate::error::StoreError;
use crate::flow::BackchannelRequest;

/// Opaque durable key-value map.
///
/// Distinct keys may be used concurrently; callers never race on one key.
#[async_trait]
pub trait PendingRequestStore: Send + Sync {
    /// Fetch the value under `key`.
    async fn get(&self, key: &str) -> Result<Option<String>, StoreError>;

    /// Store `value` under `key`, replacing any previous value.
    async fn put(&self, key: &str, value: String) -> Result<(), StoreError>;

    /// Remove `key`. Removing a missing key is not an error.
    async fn delete(&self, key: &str) -> Result<(), StoreError>;
}

/// A backchannel request persisted for later resumption.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct PendingEntry {
    pub request_id: String,
    pub user_id: String,
    pub binding_message: String,
    pub scopes: Vec<String>,

    /// Whatever the context getter produced for this invocation.
    #[serde(default)]
    pub context: serde_json::Value,

    /// Absolute expiry, milliseconds since the Unix epoch.
    pub expires_at_ms: u64,

    /// Poll interval in milliseconds at the time of persisting.
    pub interval_ms: u64,
}

impl PendingEntry {
    /// Snapshot `request` together with what was asked of the user.
    pub fn from_request(
        request: &BackchannelRequest,
        user_id: &str,
        binding_message: &str,
        scopes: &[String],
        context: serde_json::Value,
    ) -> Self {
        let expires_at = SystemTime::now() + request.remaining();
        Self {
            request_id: request.id().to_string(),
            user_id: user_id.to_string(),
            binding_message: binding_message.to_string(),
            scopes: scopes.to_vec(),
            context,
            expires_at_ms: unix_millis(expires_at),
            interval_ms: request.interval().as_millis().try_into().unwrap_or(u64::MAX),
        }
    }

    /// Whether the request's lifetime has run out.
    pub fn is_expired(&self) -> bool {
        unix_millis(SystemTime::now()) >= self.expires_at_ms
    }

    /// Time left before expiry.
    pub fn remaining(&self) -> Duration {
        Duration::from_millis(
            self.expires_at_ms
                .saturating_sub(unix_millis(SystemTime::now())),
        )
    }

    /// Serialize and store under `key`.
    pub async fn save(&self, store: &dyn PendingRequestStore, key: &str) -> Result<(), StoreError> {
        let value = serde_json::to_string(self)?;
        store.put(key, value).await
    }

    /// Load and deserialize the entry under `key`.
    pub async fn load(
        store: &dyn PendingRequestStore,
        key: &str,
    ) -> Result<Option<Self>, StoreError> {
        match store.get(key).await? {
            Some(value) => Ok(Some(serde_json::from_str(&value)?)),
            None => Ok(None),
        }
    }
}

fn unix_millis(time: SystemTime) -> u64 {
    time.duration_since(UNIX_EPOCH)
        .map(|d| d.as_millis().try_into().unwrap_or(u64::MAX))
        .unwrap_or(0)
}
