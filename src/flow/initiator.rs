// ABOUTME: RequestInitiator - starts a backchannel request and validates the
// ABOUTME: server's reply before any polling begins. Never retries.

use tracing::{debug, instrument};

use super::BackchannelRequest;
use crate::error::InitiationError;
use crate::server::AuthorizationServer;

/// Starts backchannel authorization requests.
pub struct RequestInitiator<'a> {
    server: &'a dyn AuthorizationServer,
}

impl<'a> RequestInitiator<'a> {
    pub fn new(server: &'a dyn AuthorizationServer) -> Self {
        Self { server }
    }

    /// Ask the server to start an approval request for `user_id`.
    ///
    /// The reply must carry a request id and a positive lifetime and interval;
    /// anything less is reported as [`InitiationError::InvalidResponse`].
    #[instrument(skip(self, binding_message), level = "debug")]
    pub async fn start(
        &self,
        user_id: &str,
        binding_message: &str,
        scopes: &[String],
    ) -> Result<BackchannelRequest, InitiationError> {
        let response = self
            .server
            .authorize(user_id, binding_message, scopes)
            .await?;

        if response.request_id.is_empty() {
            return Err(InitiationError::InvalidResponse(
                "missing request id".to_string(),
            ));
        }
        if response.expires_in.is_zero() {
            return Err(InitiationError::InvalidResponse(
                "expires_in must be positive".to_string(),
            ));
        }
        if response.interval.is_zero() {
            return Err(InitiationError::InvalidResponse(
                "interval must be positive".to_string(),
            ));
        }

        debug!(
            request_id = %response.request_id,
            expires_in = ?response.expires_in,
            interval = ?response.interval,
            "backchannel request started"
        );

        Ok(BackchannelRequest::new(
            response.request_id,
            response.expires_in,
            response.interval,
        ))
    }
}
