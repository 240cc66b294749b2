// ABOUTME: ScriptedServer - an in-memory AuthorizationServer that replays a
// ABOUTME: scripted sequence of grant replies and counts every call.

use std::collections::VecDeque;
use std::sync::Mutex;
use std::sync::atomic::{AtomicUsize, Ordering};
use std::time::Duration;

use async_trait::async_trait;
use tokio::time::Instant;

use super::{AuthorizationServer, AuthorizeResponse, GrantErrorCode};
use crate::credential::Credential;
use crate::error::{GrantError, InitiationError};

/// One scripted reply from the token endpoint.
#[derive(Debug, Clone)]
pub enum GrantStep {
    /// `authorization_pending`.
    Pending,
    /// `slow_down`.
    SlowDown,
    /// `access_denied` with a description.
    Denied(String),
    /// `expired_token`.
    ExpiredToken,
    /// Any other OAuth error code.
    Error(String),
    /// A failure below the OAuth layer.
    Transport(String),
    /// Approval with this credential.
    Approve(Credential),
}

impl GrantStep {
    /// Approval with a bearer token.
    pub fn approve(access_token: impl Into<String>) -> Self {
        Self::Approve(Credential::bearer(access_token))
    }

    fn into_result(self) -> Result<Credential, GrantError> {
        match self {
            GrantStep::Pending => Err(GrantError::Api {
                status: 400,
                code: GrantErrorCode::AuthorizationPending,
                description: None,
            }),
            GrantStep::SlowDown => Err(GrantError::Api {
                status: 400,
                code: GrantErrorCode::SlowDown,
                description: None,
            }),
            GrantStep::Denied(reason) => Err(GrantError::Api {
                status: 403,
                code: GrantErrorCode::AccessDenied,
                description: Some(reason),
            }),
            GrantStep::ExpiredToken => Err(GrantError::Api {
                status: 400,
                code: GrantErrorCode::ExpiredToken,
                description: None,
            }),
            GrantStep::Error(code) => Err(GrantError::api(400, code, None)),
            GrantStep::Transport(message) => Err(GrantError::Transport(message)),
            GrantStep::Approve(credential) => Ok(credential),
        }
    }
}

/// An authorization server that follows a script.
///
/// Grant steps are consumed in order; the last one repeats forever, so a
/// script of `[Pending]` keeps the request pending until it expires.
pub struct ScriptedServer {
    authorize_reply: Result<AuthorizeResponse, String>,
    steps: Mutex<VecDeque<GrantStep>>,
    grant_delay: Duration,
    authorize_calls: AtomicUsize,
    grant_calls: AtomicUsize,
    grant_times: Mutex<Vec<Instant>>,
}

impl ScriptedServer {
    /// Answer authorize with `request_id`, `expires_in` and `interval` (seconds).
    pub fn new(request_id: impl Into<String>, expires_in: f64, interval: f64) -> Self {
        Self::with_authorize(Ok(AuthorizeResponse {
            request_id: request_id.into(),
            expires_in: Duration::from_secs_f64(expires_in),
            interval: Duration::from_secs_f64(interval),
        }))
    }

    /// Fail every authorize call with a transport error.
    pub fn failing_authorize(message: impl Into<String>) -> Self {
        Self::with_authorize(Err(message.into()))
    }

    /// Answer authorize with an explicit reply.
    pub fn with_authorize(reply: Result<AuthorizeResponse, String>) -> Self {
        Self {
            authorize_reply: reply,
            steps: Mutex::new(VecDeque::new()),
            grant_delay: Duration::ZERO,
            authorize_calls: AtomicUsize::new(0),
            grant_calls: AtomicUsize::new(0),
            grant_times: Mutex::new(Vec::new()),
        }
    }

    /// Append grant replies.
    pub fn then(self, steps: impl IntoIterator<Item = GrantStep>) -> Self {
        if let Ok(mut queue) = self.steps.lock() {
            queue.extend(steps);
        }
        self
    }

    /// Make every grant call take `delay` before answering.
    pub fn with_grant_delay(mut self, delay: Duration) -> Self {
        self.grant_delay = delay;
        self
    }

    /// Number of authorize calls so far.
    pub fn authorize_calls(&self) -> usize {
        self.authorize_calls.load(Ordering::SeqCst)
    }

    /// Number of grant calls so far.
    pub fn grant_calls(&self) -> usize {
        self.grant_calls.load(Ordering::SeqCst)
    }

    /// When each grant call was issued.
    pub fn grant_times(&self) -> Vec<Instant> {
        self.grant_times
            .lock()
            .map(|times| times.clone())
            .unwrap_or_default()
    }

    fn next_step(&self) -> GrantStep {
        let Ok(mut queue) = self.steps.lock() else {
            return GrantStep::Transport("script poisoned".to_string());
        };
        if queue.len() > 1 {
            queue.pop_front().unwrap_or(GrantStep::Pending)
        } else {
            queue.front().cloned().unwrap_or(GrantStep::Pending)
        }
    }
}

#[async_trait]
impl AuthorizationServer for ScriptedServer {
    async fn authorize(
        &self,
        _user_id: &str,
        _binding_message: &str,
        _scopes: &[String],
    ) -> Result<AuthorizeResponse, InitiationError> {
        self.authorize_calls.fetch_add(1, Ordering::SeqCst);
        self.authorize_reply
            .clone()
            .map_err(InitiationError::Transport)
    }

    async fn grant(&self, _request_id: &str) -> Result<Credential, GrantError> {
        self.grant_calls.fetch_add(1, Ordering::SeqCst);
        if let Ok(mut times) = self.grant_times.lock() {
            times.push(Instant::now());
        }
        let step = self.next_step();
        if !self.grant_delay.is_zero() {
            tokio::time::sleep(self.grant_delay).await;
        }
        step.into_result()
    }
}
