// ABOUTME: ProtectionParams - who must approve, what they see, which scopes are
// ABOUTME: requested, how polling backs off, and what happens on rejection.

use std::fmt;
use std::future::Future;
use std::sync::Arc;
use std::time::Duration;

use futures::FutureExt;
use futures::future::BoxFuture;

use crate::error::GuardError;
use crate::store::PendingRequestStore;

/// How a guarded call waits for approval.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum Mode {
    /// Poll until a terminal outcome, then run or reject.
    #[default]
    Block,
    /// Start the request, persist it in the store, and return
    /// [`GuardError::Pending`] immediately.
    Interrupt,
}

/// How the poll interval grows when the server answers `slow_down`.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum SlowDownPolicy {
    /// Add a fixed amount.
    Increment(Duration),
    /// Double the interval.
    Double,
}

impl SlowDownPolicy {
    /// Increment mandated for device-style polling (RFC 8628, section 3.5).
    pub const DEFAULT_INCREMENT: Duration = Duration::from_secs(5);

    /// The interval to use after a `slow_down`. Always strictly larger.
    pub fn apply(&self, interval: Duration) -> Duration {
        match self {
            SlowDownPolicy::Increment(step) => {
                let step = if step.is_zero() {
                    Self::DEFAULT_INCREMENT
                } else {
                    *step
                };
                interval.saturating_add(step)
            }
            SlowDownPolicy::Double => interval.saturating_mul(2),
        }
    }
}

impl Default for SlowDownPolicy {
    fn default() -> Self {
        SlowDownPolicy::Increment(Self::DEFAULT_INCREMENT)
    }
}

/// Why a guarded call was rejected without running the operation.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum RejectionKind {
    /// The user declined.
    Denied,
    /// Nobody decided before the request expired.
    Expired,
}

/// Passed to the rejection handler.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Rejection {
    pub kind: RejectionKind,

    /// Human-readable reason.
    pub reason: String,

    /// The backchannel request that was rejected.
    pub request_id: String,
}

impl Rejection {
    /// A denial with the server's reason.
    pub fn denied(request_id: impl Into<String>, reason: impl Into<String>) -> Self {
        Self {
            kind: RejectionKind::Denied,
            reason: reason.into(),
            request_id: request_id.into(),
        }
    }

    /// An expiry.
    pub fn expired(request_id: impl Into<String>) -> Self {
        Self {
            kind: RejectionKind::Expired,
            reason: "authorization request expired before the user responded".to_string(),
            request_id: request_id.into(),
        }
    }
}

impl fmt::Display for Rejection {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&self.reason)
    }
}

/// Produces the guarded call's result when the user denies or the request expires.
pub type RejectionHandler<T> = Arc<dyn Fn(Rejection) -> BoxFuture<'static, T> + Send + Sync>;

/// Everything an authorizer needs besides the server itself.
pub struct ProtectionParams<T> {
    pub(crate) user_id: String,
    pub(crate) binding_message: String,
    pub(crate) scopes: Vec<String>,
    pub(crate) mode: Mode,
    pub(crate) slow_down: SlowDownPolicy,
    pub(crate) on_rejection: RejectionHandler<T>,
    pub(crate) store: Option<Arc<dyn PendingRequestStore>>,
}

impl<T> ProtectionParams<T> {
    /// Start building parameters for `user_id`, showing `binding_message`.
    pub fn builder(
        user_id: impl Into<String>,
        binding_message: impl Into<String>,
    ) -> ProtectionParamsBuilder<T> {
        ProtectionParamsBuilder::new(user_id, binding_message)
    }

    pub fn user_id(&self) -> &str {
        &self.user_id
    }

    pub fn binding_message(&self) -> &str {
        &self.binding_message
    }

    /// Requested scopes in first-seen order.
    pub fn scopes(&self) -> &[String] {
        &self.scopes
    }

    pub fn mode(&self) -> Mode {
        self.mode
    }

    pub fn slow_down(&self) -> SlowDownPolicy {
        self.slow_down
    }

    pub fn store(&self) -> Option<&Arc<dyn PendingRequestStore>> {
        self.store.as_ref()
    }

    pub(crate) fn rejection_handler(&self) -> &RejectionHandler<T> {
        &self.on_rejection
    }
}

impl<T> fmt::Debug for ProtectionParams<T> {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("ProtectionParams")
            .field("user_id", &self.user_id)
            .field("binding_message", &self.binding_message)
            .field("scopes", &self.scopes)
            .field("mode", &self.mode)
            .field("slow_down", &self.slow_down)
            .field("store", &self.store.is_some())
            .finish()
    }
}

/// Builder for [`ProtectionParams`].
pub struct ProtectionParamsBuilder<T> {
    user_id: String,
    binding_message: String,
    scopes: Vec<String>,
    mode: Mode,
    slow_down: SlowDownPolicy,
    on_rejection: Option<RejectionHandler<T>>,
    store: Option<Arc<dyn PendingRequestStore>>,
}

impl<T> ProtectionParamsBuilder<T> {
    pub fn new(user_id: impl Into<String>, binding_message: impl Into<String>) -> Self {
        Self {
            user_id: user_id.into(),
            binding_message: binding_message.into(),
            scopes: Vec::new(),
            mode: Mode::default(),
            slow_down: SlowDownPolicy::default(),
            on_rejection: None,
            store: None,
        }
    }

    /// Request a scope. Repeats are ignored.
    pub fn scope(mut self, scope: impl Into<String>) -> Self {
        let scope = scope.into();
        if !scope.is_empty() && !self.scopes.contains(&scope) {
            self.scopes.push(scope);
        }
        self
    }

    /// Request several scopes, in order.
    pub fn scopes<I, S>(self, scopes: I) -> Self
    where
        I: IntoIterator<Item = S>,
        S: Into<String>,
    {
        scopes.into_iter().fold(self, |builder, s| builder.scope(s))
    }

    pub fn mode(mut self, mode: Mode) -> Self {
        self.mode = mode;
        self
    }

    pub fn slow_down(mut self, policy: SlowDownPolicy) -> Self {
        self.slow_down = policy;
        self
    }

    /// Store for persisting requests in [`Mode::Interrupt`].
    pub fn store(mut self, store: Arc<dyn PendingRequestStore>) -> Self {
        self.store = Some(store);
        self
    }

    /// Handler invoked once on denial or expiry.
    pub fn on_rejection<F, Fut>(mut self, handler: F) -> Self
    where
        F: Fn(Rejection) -> Fut + Send + Sync + 'static,
        Fut: Future<Output = T> + Send + 'static,
    {
        self.on_rejection = Some(Arc::new(move |rejection: Rejection| {
            handler(rejection).boxed()
        }));
        self
    }

    /// Use an already-boxed rejection handler.
    pub fn rejection_handler(mut self, handler: RejectionHandler<T>) -> Self {
        self.on_rejection = Some(handler);
        self
    }

    /// Build, validating that the parameters are usable.
    pub fn build(self) -> Result<ProtectionParams<T>, GuardError> {
        if self.user_id.trim().is_empty() {
            return Err(GuardError::Configuration("user id is empty".to_string()));
        }
        if self.binding_message.trim().is_empty() {
            return Err(GuardError::Configuration(
                "binding message is empty".to_string(),
            ));
        }
        let on_rejection = self.on_rejection.ok_or_else(|| {
            GuardError::Configuration("a rejection handler is required".to_string())
        })?;
        if self.mode == Mode::Interrupt && self.store.is_none() {
            return Err(GuardError::Configuration(
                "interrupt mode requires a pending request store".to_string(),
            ));
        }

        Ok(ProtectionParams {
            user_id: self.user_id,
            binding_message: self.binding_message,
            scopes: self.scopes,
            mode: self.mode,
            slow_down: self.slow_down,
            on_rejection,
            store: self.store,
        })
    }
}
