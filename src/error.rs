// ABOUTME: Defines all error types for the guard library using thiserror.
// ABOUTME: Each concern has its own error enum, unified under GuardError.

use crate::server::GrantErrorCode;

/// Top-level error type for guarded invocations.
#[derive(Debug, thiserror::Error)]
pub enum GuardError {
    #[error("Initiation error: {0}")]
    Initiation(#[from] InitiationError),

    #[error("Grant error: {0}")]
    Grant(#[from] GrantError),

    #[error("Authorization pending; request stored under key '{key}'")]
    Pending { key: String },

    #[error("Store error: {0}")]
    Store(#[from] StoreError),

    #[error("Configuration error: {0}")]
    Configuration(String),
}

/// Errors from starting a backchannel authorization request.
#[derive(Debug, thiserror::Error)]
pub enum InitiationError {
    #[error("HTTP error: {0}")]
    Http(#[from] reqwest::Error),

    #[error("Transport error: {0}")]
    Transport(String),

    #[error("Authorization server rejected request ({status}): {error}")]
    Api {
        status: u16,
        error: String,
        description: Option<String>,
    },

    #[error("Invalid authorize response: {0}")]
    InvalidResponse(String),
}

/// Errors from polling the token endpoint.
#[derive(Debug, thiserror::Error)]
pub enum GrantError {
    #[error("HTTP error: {0}")]
    Http(#[from] reqwest::Error),

    #[error("Transport error: {0}")]
    Transport(String),

    #[error("Token endpoint error ({status}): {code}")]
    Api {
        status: u16,
        code: GrantErrorCode,
        description: Option<String>,
    },

    #[error("Invalid token response: {0}")]
    InvalidResponse(String),
}

impl GrantError {
    /// Build an API error from a raw OAuth error code.
    pub fn api(status: u16, code: impl AsRef<str>, description: Option<String>) -> Self {
        Self::Api {
            status,
            code: GrantErrorCode::parse(code.as_ref()),
            description,
        }
    }

    /// Classify this error for the polling state machine.
    ///
    /// Anything that did not come back as a structured OAuth error is `Other`.
    pub fn code(&self) -> GrantErrorCode {
        match self {
            GrantError::Api { code, .. } => code.clone(),
            GrantError::Http(_) => GrantErrorCode::Other("http".to_string()),
            GrantError::Transport(_) => GrantErrorCode::Other("transport".to_string()),
            GrantError::InvalidResponse(_) => GrantErrorCode::Other("invalid_response".to_string()),
        }
    }

    /// The server's human-readable description, if it sent one.
    pub fn description(&self) -> Option<&str> {
        match self {
            GrantError::Api { description, .. } => description.as_deref(),
            _ => None,
        }
    }
}

/// Errors from pending-request stores.
#[derive(Debug, thiserror::Error)]
pub enum StoreError {
    #[error("IO error: {0}")]
    Io(#[from] std::io::Error),

    #[error("JSON error: {0}")]
    Json(#[from] serde_json::Error),

    /// Failures from stores backed by something other than files.
    #[error(transparent)]
    Backend(#[from] anyhow::Error),
}
