// ABOUTME: Prelude module - convenient imports for common use cases.
// ABOUTME: Use `use ciba_guard::prelude::*;` to get started quickly.

pub use crate::authorizer::{BackchannelAuthorizer, GuardedOperation};
pub use crate::config::{
    AuthorizationConfig, Mode, ProtectionParams, ProtectionParamsBuilder, Rejection,
    RejectionHandler, RejectionKind, SlowDownPolicy,
};
pub use crate::credential::{Credential, CredentialContext};
pub use crate::error::{GrantError, GuardError, InitiationError, StoreError};
pub use crate::flow::{BackchannelRequest, GrantOutcome, GrantPoller, OutcomeResolver, RequestInitiator};
pub use crate::server::{
    AuthorizationServer, AuthorizeResponse, GrantErrorCode, GrantStep, HttpAuthorizationServer,
    ScriptedServer,
};
pub use crate::store::{FileStore, InMemoryStore, PendingEntry, PendingRequestStore};
