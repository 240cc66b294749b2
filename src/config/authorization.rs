// ABOUTME: AuthorizationConfig - how to reach the authorization server and
// ABOUTME: authenticate as the client. Loadable from CIBA_* environment variables.

use std::time::Duration;

use crate::error::GuardError;

/// Default HTTP timeout for calls to the authorization server.
pub const DEFAULT_HTTP_TIMEOUT: Duration = Duration::from_secs(30);

/// Domain and client credentials for the authorization server.
#[derive(Clone)]
pub struct AuthorizationConfig {
    /// Tenant domain, with or without scheme.
    pub domain: String,

    /// OAuth client identifier.
    pub client_id: String,

    /// OAuth client secret.
    pub client_secret: String,

    /// API audience for the issued access token.
    pub audience: Option<String>,

    /// Requested lifetime of each backchannel request.
    pub requested_expiry: Option<Duration>,

    /// HTTP timeout per call.
    pub timeout: Duration,
}

impl AuthorizationConfig {
    /// Create a config with the required fields.
    pub fn new(
        domain: impl Into<String>,
        client_id: impl Into<String>,
        client_secret: impl Into<String>,
    ) -> Self {
        Self {
            domain: domain.into(),
            client_id: client_id.into(),
            client_secret: client_secret.into(),
            audience: None,
            requested_expiry: None,
            timeout: DEFAULT_HTTP_TIMEOUT,
        }
    }

    /// Load from `CIBA_DOMAIN`, `CIBA_CLIENT_ID`, `CIBA_CLIENT_SECRET` and the
    /// optional `CIBA_AUDIENCE`, `CIBA_REQUESTED_EXPIRY`, `CIBA_HTTP_TIMEOUT`.
    pub fn from_env() -> Result<Self, GuardError> {
        Self::from_lookup(|key| std::env::var(key).ok())
    }

    /// Load using an arbitrary variable lookup.
    pub fn from_lookup<F>(lookup: F) -> Result<Self, GuardError>
    where
        F: Fn(&str) -> Option<String>,
    {
        let required = |key: &str| {
            lookup(key)
                .filter(|v| !v.trim().is_empty())
                .ok_or_else(|| GuardError::Configuration(format!("{} is not set", key)))
        };
        let seconds = |key: &str| -> Result<Option<Duration>, GuardError> {
            match lookup(key).filter(|v| !v.trim().is_empty()) {
                None => Ok(None),
                Some(raw) => raw
                    .trim()
                    .parse::<u64>()
                    .map(|s| Some(Duration::from_secs(s)))
                    .map_err(|e| GuardError::Configuration(format!("{}: {}", key, e))),
            }
        };

        let mut config = Self::new(
            required("CIBA_DOMAIN")?,
            required("CIBA_CLIENT_ID")?,
            required("CIBA_CLIENT_SECRET")?,
        );
        config.audience = lookup("CIBA_AUDIENCE").filter(|v| !v.trim().is_empty());
        config.requested_expiry = seconds("CIBA_REQUESTED_EXPIRY")?;
        if let Some(timeout) = seconds("CIBA_HTTP_TIMEOUT")? {
            config.timeout = timeout;
        }
        Ok(config)
    }

    /// Set the API audience.
    pub fn with_audience(mut self, audience: impl Into<String>) -> Self {
        self.audience = Some(audience.into());
        self
    }

    /// Ask the server for a specific request lifetime.
    pub fn with_requested_expiry(mut self, expiry: Duration) -> Self {
        self.requested_expiry = Some(expiry);
        self
    }

    /// Set the HTTP timeout.
    pub fn with_timeout(mut self, timeout: Duration) -> Self {
        self.timeout = timeout;
        self
    }

    /// `https://<domain>` without a trailing slash.
    pub fn base_url(&self) -> String {
        let domain = self.domain.trim().trim_end_matches('/');
        if domain.starts_with("https://") || domain.starts_with("http://") {
            domain.to_string()
        } else {
            format!("https://{}", domain)
        }
    }

    /// Issuer identifier, `<base>/`.
    pub fn issuer(&self) -> String {
        format!("{}/", self.base_url())
    }
}

impl std::fmt::Debug for AuthorizationConfig {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("AuthorizationConfig")
            .field("domain", &self.domain)
            .field("client_id", &self.client_id)
            .field("client_secret", &"[redacted]")
            .field("audience", &self.audience)
            .field("requested_expiry", &self.requested_expiry)
            .field("timeout", &self.timeout)
            .finish()
    }
}
