// ABOUTME: Defines Credential and CredentialContext, a tokio task-local carrier
// ABOUTME: that exposes the approved token only inside the guarded operation.

use std::fmt;
use std::future::Future;
use std::time::Duration;

tokio::task_local! {
    static CURRENT_CREDENTIAL: Credential;
}

/// A token issued by the authorization server after the user approved.
///
/// Not serializable. A credential lives only as long as the guarded
/// operation it was issued for.
#[derive(Clone, PartialEq, Eq)]
pub struct Credential {
    /// Token type, usually `Bearer`.
    pub token_type: String,

    /// Opaque access token.
    pub access_token: String,

    /// Lifetime reported by the server, if any.
    pub expires_in: Option<Duration>,

    /// Granted scopes, space separated.
    pub scope: Option<String>,

    /// ID token, when `openid` was requested.
    pub id_token: Option<String>,
}

impl Credential {
    /// Create a bearer credential.
    pub fn bearer(access_token: impl Into<String>) -> Self {
        Self {
            token_type: "Bearer".to_string(),
            access_token: access_token.into(),
            expires_in: None,
            scope: None,
            id_token: None,
        }
    }

    /// Value for an `Authorization` header.
    pub fn authorization_header(&self) -> String {
        format!("{} {}", self.token_type, self.access_token)
    }
}

impl fmt::Debug for Credential {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("Credential")
            .field("token_type", &self.token_type)
            .field("access_token", &"[redacted]")
            .field("expires_in", &self.expires_in)
            .field("scope", &self.scope)
            .field("id_token", &self.id_token.as_ref().map(|_| "[redacted]"))
            .finish()
    }
}

/// Ambient access to the credential of the currently running guarded operation.
///
/// The scope follows the future it wraps across every `.await`, and is torn
/// down when that future completes, fails, or is dropped. Tasks spawned with
/// `tokio::spawn` start outside any scope.
pub struct CredentialContext;

impl CredentialContext {
    /// Run `future` with `credential` visible to it and everything it awaits.
    pub async fn scope<F>(credential: Credential, future: F) -> F::Output
    where
        F: Future,
    {
        CURRENT_CREDENTIAL.scope(credential, future).await
    }

    /// Run a synchronous closure with `credential` in scope.
    pub fn sync_scope<R>(credential: Credential, f: impl FnOnce() -> R) -> R {
        CURRENT_CREDENTIAL.sync_scope(credential, f)
    }

    /// The credential in scope, if any.
    pub fn current() -> Option<Credential> {
        CURRENT_CREDENTIAL.try_with(Credential::clone).ok()
    }

    /// The access token in scope, if any.
    pub fn access_token() -> Option<String> {
        Self::with(|c| c.access_token.clone())
    }

    /// Borrow the credential in scope without cloning it.
    pub fn with<R>(f: impl FnOnce(&Credential) -> R) -> Option<R> {
        CURRENT_CREDENTIAL.try_with(f).ok()
    }

    /// Whether a credential scope is active on this task.
    pub fn is_active() -> bool {
        CURRENT_CREDENTIAL.try_with(|_| ()).is_ok()
    }
}
