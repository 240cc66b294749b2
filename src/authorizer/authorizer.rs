// ABOUTME: BackchannelAuthorizer - holds the server and protection parameters
// ABOUTME: and hands out guarded operations via protect().

use std::sync::Arc;

use super::GuardedOperation;
use crate::config::{AuthorizationConfig, ProtectionParams};
use crate::error::GuardError;
use crate::server::{AuthorizationServer, HttpAuthorizationServer};

/// Gates operations behind out-of-band user approval.
///
/// `T` is the result type shared by guarded operations and the rejection
/// handler. Cloning is cheap; clones share the server and parameters.
pub struct BackchannelAuthorizer<T> {
    pub(crate) server: Arc<dyn AuthorizationServer>,
    pub(crate) params: Arc<ProtectionParams<T>>,
}

impl<T> BackchannelAuthorizer<T> {
    /// Create an authorizer talking HTTP to the server in `config`.
    pub fn new(config: AuthorizationConfig, params: ProtectionParams<T>) -> Result<Self, GuardError> {
        let server = HttpAuthorizationServer::new(config)?;
        Ok(Self::with_server(Arc::new(server), params))
    }

    /// Create an authorizer over any server implementation.
    pub fn with_server(server: Arc<dyn AuthorizationServer>, params: ProtectionParams<T>) -> Self {
        Self {
            server,
            params: Arc::new(params),
        }
    }

    pub fn params(&self) -> &ProtectionParams<T> {
        &self.params
    }

    /// Guard `operation`.
    ///
    /// Each call of the returned [`GuardedOperation`] derives a context from
    /// its arguments with `context_getter`, obtains approval according to the
    /// configured mode, and only then runs `operation` with the credential in
    /// scope.
    ///
    /// The context must be `Serialize`. The guard never interprets it: Block
    /// mode only logs it, and Interrupt mode stores it in the pending entry.
    pub fn protect<G, F>(&self, context_getter: G, operation: F) -> GuardedOperation<T, G, F> {
        GuardedOperation::new(self.clone(), context_getter, operation)
    }
}

impl<T> Clone for BackchannelAuthorizer<T> {
    fn clone(&self) -> Self {
        Self {
            server: Arc::clone(&self.server),
            params: Arc::clone(&self.params),
        }
    }
}
