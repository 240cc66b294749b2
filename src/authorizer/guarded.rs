// ABOUTME: GuardedOperation - the callable returned by protect(). Derives the
// ABOUTME: invocation context and dispatches on the configured mode.

use std::future::Future;

use serde::Serialize;
use tracing::{debug, info, instrument};

use super::BackchannelAuthorizer;
use crate::config::Mode;
use crate::error::{GuardError, StoreError};
use crate::flow::{GrantPoller, OutcomeResolver, RequestInitiator};
use crate::store::PendingEntry;

/// An operation that runs only after the user approves out of band.
pub struct GuardedOperation<T, G, F> {
    authorizer: BackchannelAuthorizer<T>,
    context_getter: G,
    operation: F,
}

impl<T, G, F> GuardedOperation<T, G, F> {
    pub(crate) fn new(authorizer: BackchannelAuthorizer<T>, context_getter: G, operation: F) -> Self {
        Self {
            authorizer,
            context_getter,
            operation,
        }
    }

    /// Invoke the guarded operation with `args`.
    ///
    /// In [`Mode::Block`] this returns the operation's result, the rejection
    /// handler's result, or an error. In [`Mode::Interrupt`] it returns
    /// [`GuardError::Pending`] once the request has been persisted.
    #[instrument(
        skip_all,
        fields(user_id = %self.authorizer.params.user_id, mode = ?self.authorizer.params.mode),
        level = "debug"
    )]
    pub async fn call<A, C, Fut, E>(&self, args: A) -> Result<T, E>
    where
        G: Fn(&A) -> C,
        C: Serialize,
        F: Fn(A) -> Fut,
        Fut: Future<Output = Result<T, E>>,
        E: From<GuardError>,
    {
        let context = serde_json::to_value((self.context_getter)(&args));

        match self.authorizer.params.mode {
            Mode::Block => {
                match &context {
                    Ok(value) => debug!(context = %value, "invocation context"),
                    Err(e) => debug!(error = %e, "invocation context is not serializable"),
                }
                self.block(args).await
            }
            Mode::Interrupt => Err(E::from(self.interrupt(context).await)),
        }
    }

    async fn block<A, Fut, E>(&self, args: A) -> Result<T, E>
    where
        F: Fn(A) -> Fut,
        Fut: Future<Output = Result<T, E>>,
        E: From<GuardError>,
    {
        let params = &self.authorizer.params;
        let server = self.authorizer.server.as_ref();

        let request = RequestInitiator::new(server)
            .start(&params.user_id, &params.binding_message, &params.scopes)
            .await
            .map_err(|e| E::from(GuardError::from(e)))?;
        let request_id = request.id().to_string();

        let outcome = GrantPoller::new(server, params.slow_down)
            .poll(request)
            .await;

        OutcomeResolver::new(params.rejection_handler())
            .resolve(&request_id, outcome, || (self.operation)(args))
            .await
    }

    /// Start and persist a request. Always yields the error to raise.
    async fn interrupt(&self, context: Result<serde_json::Value, serde_json::Error>) -> GuardError {
        let params = &self.authorizer.params;
        let Some(store) = params.store.as_ref() else {
            return GuardError::Configuration(
                "interrupt mode requires a pending request store".to_string(),
            );
        };
        let context = match context {
            Ok(value) => value,
            Err(e) => return GuardError::Store(StoreError::Json(e)),
        };

        let request = match RequestInitiator::new(self.authorizer.server.as_ref())
            .start(&params.user_id, &params.binding_message, &params.scopes)
            .await
        {
            Ok(request) => request,
            Err(e) => return e.into(),
        };

        let entry = PendingEntry::from_request(
            &request,
            &params.user_id,
            &params.binding_message,
            &params.scopes,
            context,
        );
        let key = uuid::Uuid::new_v4().to_string();
        if let Err(e) = entry.save(store.as_ref(), &key).await {
            return e.into();
        }

        info!(%key, request_id = %entry.request_id, "authorization request stored for resumption");
        GuardError::Pending { key }
    }
}
