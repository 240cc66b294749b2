// ABOUTME: BackchannelRequest - one in-flight approval request with a fixed
// ABOUTME: expiry instant and a poll interval that can only grow.

use std::time::Duration;

use tokio::time::Instant;

use crate::config::SlowDownPolicy;

/// A started backchannel request, owned by exactly one guarded invocation.
#[derive(Debug, Clone)]
pub struct BackchannelRequest {
    id: String,
    expires_at: Instant,
    interval: Duration,
}

impl BackchannelRequest {
    /// Longest lifetime honored; larger server values are capped to it.
    pub const MAX_LIFETIME: Duration = Duration::from_secs(86400 * 365 * 30);

    /// A request that expires `expires_in` from now.
    pub fn new(id: impl Into<String>, expires_in: Duration, interval: Duration) -> Self {
        Self {
            id: id.into(),
            expires_at: Instant::now() + expires_in.min(Self::MAX_LIFETIME),
            interval,
        }
    }

    /// Server-issued request identifier.
    pub fn id(&self) -> &str {
        &self.id
    }

    /// Fixed at initiation; never extended.
    pub fn expires_at(&self) -> Instant {
        self.expires_at
    }

    /// Current wait between grant checks.
    pub fn interval(&self) -> Duration {
        self.interval
    }

    /// Time left before expiry.
    pub fn remaining(&self) -> Duration {
        self.expires_at.saturating_duration_since(Instant::now())
    }

    pub fn is_expired(&self) -> bool {
        Instant::now() >= self.expires_at
    }

    pub(crate) fn slow_down(&mut self, policy: SlowDownPolicy) {
        self.interval = policy.apply(self.interval);
    }
}
