// ABOUTME: OutcomeResolver - turns a terminal GrantOutcome into the guarded
// ABOUTME: call's result: run the operation, reject gracefully, or raise.

use std::future::Future;

use tracing::debug;

use super::GrantOutcome;
use crate::config::{Rejection, RejectionHandler};
use crate::credential::CredentialContext;
use crate::error::GuardError;

/// Maps outcomes onto results.
pub struct OutcomeResolver<'a, T> {
    on_rejection: &'a RejectionHandler<T>,
}

impl<'a, T> OutcomeResolver<'a, T> {
    pub fn new(on_rejection: &'a RejectionHandler<T>) -> Self {
        Self { on_rejection }
    }

    /// Resolve `outcome` for request `request_id`.
    ///
    /// - Approved: runs `operation` with the credential in scope; its result,
    ///   error included, is returned as is.
    /// - Denied / Expired: returns what the rejection handler produces.
    /// - Failed: raises [`GuardError::Grant`]; the handler is not called.
    pub async fn resolve<E, Op, Fut>(
        &self,
        request_id: &str,
        outcome: GrantOutcome,
        operation: Op,
    ) -> Result<T, E>
    where
        Op: FnOnce() -> Fut,
        Fut: Future<Output = Result<T, E>>,
        E: From<GuardError>,
    {
        match outcome {
            GrantOutcome::Approved(credential) => {
                debug!(request_id, "approved; running protected operation");
                CredentialContext::scope(credential, async move { operation().await }).await
            }
            GrantOutcome::Denied { reason } => {
                Ok((self.on_rejection)(Rejection::denied(request_id, reason)).await)
            }
            GrantOutcome::Expired => Ok((self.on_rejection)(Rejection::expired(request_id)).await),
            GrantOutcome::Failed(error) => Err(E::from(GuardError::Grant(error))),
        }
    }
}
