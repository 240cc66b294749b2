// ABOUTME: GrantPoller - the polling state machine that checks a backchannel
// ABOUTME: request until it is approved, denied, expired, or fails.

use tokio::time::Instant;
use tracing::{debug, info, instrument, warn};

use super::BackchannelRequest;
use crate::config::SlowDownPolicy;
use crate::credential::Credential;
use crate::error::GrantError;
use crate::server::{AuthorizationServer, GrantErrorCode};

/// Terminal result of polling. Reached exactly once per request.
#[derive(Debug)]
pub enum GrantOutcome {
    /// The user approved; here is the token.
    Approved(Credential),
    /// The user declined.
    Denied { reason: String },
    /// The request's lifetime ran out.
    Expired,
    /// The server answered with something unrecognized, or could not be reached.
    Failed(GrantError),
}

impl GrantOutcome {
    /// Short label for logs.
    pub fn label(&self) -> &'static str {
        match self {
            GrantOutcome::Approved(_) => "approved",
            GrantOutcome::Denied { .. } => "denied",
            GrantOutcome::Expired => "expired",
            GrantOutcome::Failed(_) => "failed",
        }
    }
}

/// Checks a backchannel request until it reaches a terminal outcome.
///
/// Checks are strictly sequential. The first check is issued immediately;
/// each later one waits the current interval, which grows on `slow_down`.
/// No check is issued once the expiry instant has been reached, and a check
/// still in flight at that instant is abandoned.
pub struct GrantPoller<'a> {
    server: &'a dyn AuthorizationServer,
    slow_down: SlowDownPolicy,
}

impl<'a> GrantPoller<'a> {
    pub fn new(server: &'a dyn AuthorizationServer, slow_down: SlowDownPolicy) -> Self {
        Self { server, slow_down }
    }

    /// Poll `request` to completion.
    #[instrument(skip_all, fields(request_id = %request.id()), level = "debug")]
    pub async fn poll(&self, mut request: BackchannelRequest) -> GrantOutcome {
        let deadline = request.expires_at();
        let mut checks: u32 = 0;

        loop {
            if Instant::now() >= deadline {
                info!(checks, "backchannel request expired");
                return GrantOutcome::Expired;
            }

            let result =
                match tokio::time::timeout_at(deadline, self.server.grant(request.id())).await {
                    Ok(result) => result,
                    Err(_) => {
                        info!(checks, "backchannel request expired during a check");
                        return GrantOutcome::Expired;
                    }
                };
            checks += 1;

            if Instant::now() >= deadline {
                info!(checks, "check resolved after expiry; result discarded");
                return GrantOutcome::Expired;
            }

            if let Some(outcome) = self.transition(&mut request, result) {
                debug!(checks, outcome = outcome.label(), "polling finished");
                return outcome;
            }

            let wake = Instant::now()
                .checked_add(request.interval())
                .map_or(deadline, |next| next.min(deadline));
            tokio::time::sleep_until(wake).await;
        }
    }

    /// Apply one check's result. `None` means keep polling.
    fn transition(
        &self,
        request: &mut BackchannelRequest,
        result: Result<Credential, GrantError>,
    ) -> Option<GrantOutcome> {
        let error = match result {
            Ok(credential) => return Some(GrantOutcome::Approved(credential)),
            Err(error) => error,
        };

        match error.code() {
            GrantErrorCode::AuthorizationPending => {
                debug!("authorization pending");
                None
            }
            GrantErrorCode::SlowDown => {
                request.slow_down(self.slow_down);
                debug!(interval = ?request.interval(), "slow_down; interval increased");
                None
            }
            GrantErrorCode::AccessDenied => {
                let reason = error
                    .description()
                    .unwrap_or("the user denied the authorization request")
                    .to_string();
                info!(%reason, "authorization denied");
                Some(GrantOutcome::Denied { reason })
            }
            GrantErrorCode::ExpiredToken => {
                info!("server reports the request expired");
                Some(GrantOutcome::Expired)
            }
            GrantErrorCode::Other(code) => {
                warn!(%code, error = %error, "grant check failed");
                Some(GrantOutcome::Failed(error))
            }
        }
    }
}
