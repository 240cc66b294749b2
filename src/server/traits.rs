// ABOUTME: Defines the AuthorizationServer trait - start a backchannel request
// ABOUTME: and check its grant. Substitutable independently of polling logic.

use std::fmt;
use std::time::Duration;

use async_trait::async_trait;

use crate::credential::Credential;
use crate::error::{GrantError, InitiationError};

/// What the server returned when a backchannel request was started.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct AuthorizeResponse {
    /// Opaque request identifier (`auth_req_id`).
    pub request_id: String,

    /// Lifetime of the request.
    pub expires_in: Duration,

    /// Minimum wait between grant checks.
    pub interval: Duration,
}

/// Classification of a token-endpoint error.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum GrantErrorCode {
    /// The user has not decided yet.
    AuthorizationPending,
    /// Polling too fast; the interval must grow.
    SlowDown,
    /// The user declined.
    AccessDenied,
    /// The request lifetime ended server-side.
    ExpiredToken,
    /// Anything else.
    Other(String),
}

impl GrantErrorCode {
    /// Parse an OAuth `error` value.
    pub fn parse(code: &str) -> Self {
        match code {
            "authorization_pending" => Self::AuthorizationPending,
            "slow_down" => Self::SlowDown,
            "access_denied" => Self::AccessDenied,
            "expired_token" => Self::ExpiredToken,
            other => Self::Other(other.to_string()),
        }
    }

    /// The wire form of this code.
    pub fn as_str(&self) -> &str {
        match self {
            Self::AuthorizationPending => "authorization_pending",
            Self::SlowDown => "slow_down",
            Self::AccessDenied => "access_denied",
            Self::ExpiredToken => "expired_token",
            Self::Other(code) => code,
        }
    }
}

impl fmt::Display for GrantErrorCode {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

/// The authorization server, reduced to the two calls a backchannel flow needs.
#[async_trait]
pub trait AuthorizationServer: Send + Sync {
    /// Start a backchannel authorization request for `user_id`.
    async fn authorize(
        &self,
        user_id: &str,
        binding_message: &str,
        scopes: &[String],
    ) -> Result<AuthorizeResponse, InitiationError>;

    /// Check whether the request has been approved.
    ///
    /// Returns the credential on approval; every other state is an error
    /// whose [`GrantError::code`] tells the poller what to do.
    async fn grant(&self, request_id: &str) -> Result<Credential, GrantError>;
}
