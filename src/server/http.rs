// ABOUTME: HTTP implementation of AuthorizationServer over reqwest.
// ABOUTME: Posts form-encoded requests to /bc-authorize and /oauth/token.

use async_trait::async_trait;
use tracing::{debug, instrument};

use super::{AuthorizationServer, AuthorizeResponse, CIBA_GRANT_TYPE};
use super::{parse_authorize_response, parse_token_response};
use crate::config::AuthorizationConfig;
use crate::credential::Credential;
use crate::error::{GrantError, GuardError, InitiationError};

/// Authorization server reached over HTTPS.
pub struct HttpAuthorizationServer {
    config: AuthorizationConfig,
    http_client: reqwest::Client,
}

impl HttpAuthorizationServer {
    /// Create a client for the server described by `config`.
    pub fn new(config: AuthorizationConfig) -> Result<Self, GuardError> {
        let http_client = reqwest::Client::builder()
            .timeout(config.timeout)
            .user_agent(format!("ciba-guard/{}", env!("CARGO_PKG_VERSION")))
            .build()
            .map_err(|e| {
                GuardError::Configuration(format!("Failed to create HTTP client: {}", e))
            })?;

        Self::with_client(config, http_client)
    }

    /// Create with a custom reqwest client.
    pub fn with_client(
        config: AuthorizationConfig,
        http_client: reqwest::Client,
    ) -> Result<Self, GuardError> {
        reqwest::Url::parse(&config.base_url())
            .map_err(|e| GuardError::Configuration(format!("Invalid domain: {}", e)))?;

        Ok(Self {
            config,
            http_client,
        })
    }

    /// The backchannel authorization endpoint.
    pub fn authorize_url(&self) -> String {
        format!("{}/bc-authorize", self.config.base_url())
    }

    /// The token endpoint.
    pub fn token_url(&self) -> String {
        format!("{}/oauth/token", self.config.base_url())
    }

    /// `login_hint` identifying the user by issuer and subject.
    pub fn login_hint(&self, user_id: &str) -> String {
        serde_json::json!({
            "format": "iss_sub",
            "iss": self.config.issuer(),
            "sub": user_id,
        })
        .to_string()
    }

    /// Form fields for the authorize call.
    pub fn authorize_form(
        &self,
        user_id: &str,
        binding_message: &str,
        scopes: &[String],
    ) -> Vec<(&'static str, String)> {
        let mut scope: Vec<&str> = scopes.iter().map(String::as_str).collect();
        if !scope.contains(&"openid") {
            scope.insert(0, "openid");
        }

        let mut form = vec![
            ("client_id", self.config.client_id.clone()),
            ("client_secret", self.config.client_secret.clone()),
            ("login_hint", self.login_hint(user_id)),
            ("scope", scope.join(" ")),
            ("binding_message", binding_message.to_string()),
        ];
        if let Some(audience) = &self.config.audience {
            form.push(("audience", audience.clone()));
        }
        if let Some(expiry) = self.config.requested_expiry {
            form.push(("requested_expiry", expiry.as_secs().to_string()));
        }
        form
    }

    /// Form fields for a grant poll.
    pub fn grant_form(&self, request_id: &str) -> Vec<(&'static str, String)> {
        vec![
            ("grant_type", CIBA_GRANT_TYPE.to_string()),
            ("auth_req_id", request_id.to_string()),
            ("client_id", self.config.client_id.clone()),
            ("client_secret", self.config.client_secret.clone()),
        ]
    }

    async fn post_form(
        &self,
        url: &str,
        form: &[(&'static str, String)],
    ) -> Result<(u16, Vec<u8>), reqwest::Error> {
        let response = self
            .http_client
            .post(url)
            .header("Accept", "application/json")
            .form(form)
            .send()
            .await?;

        let status = response.status().as_u16();
        let body = response.bytes().await?;
        Ok((status, body.to_vec()))
    }
}

#[async_trait]
impl AuthorizationServer for HttpAuthorizationServer {
    #[instrument(skip(self, binding_message, scopes), level = "debug")]
    async fn authorize(
        &self,
        user_id: &str,
        binding_message: &str,
        scopes: &[String],
    ) -> Result<AuthorizeResponse, InitiationError> {
        let form = self.authorize_form(user_id, binding_message, scopes);
        let (status, body) = self.post_form(&self.authorize_url(), &form).await?;
        debug!(status, "bc-authorize responded");
        parse_authorize_response(status, &body)
    }

    #[instrument(skip(self), level = "debug")]
    async fn grant(&self, request_id: &str) -> Result<Credential, GrantError> {
        let form = self.grant_form(request_id);
        let (status, body) = self.post_form(&self.token_url(), &form).await?;
        debug!(status, "token endpoint responded");
        parse_token_response(status, &body)
    }
}

#[cfg(test)]
mod tests {
    use std::time::Duration;

    use wiremock::matchers::{body_string_contains, header, method, path};
    use wiremock::{Mock, MockServer, ResponseTemplate};

    use super::*;
    use crate::server::GrantErrorCode;

    fn mock_client(server: &MockServer) -> HttpAuthorizationServer {
        let config = AuthorizationConfig::new(server.uri(), "cid", "csecret");
        HttpAuthorizationServer::new(config).unwrap()
    }

    fn server() -> HttpAuthorizationServer {
        let config = AuthorizationConfig::new("tenant.example.com", "cid", "csecret");
        HttpAuthorizationServer::new(config).unwrap()
    }

    #[test]
    fn test_endpoints() {
        let server = server();
        assert_eq!(
            server.authorize_url(),
            "https://tenant.example.com/bc-authorize"
        );
        assert_eq!(server.token_url(), "https://tenant.example.com/oauth/token");
    }

    #[test]
    fn test_login_hint() {
        let hint: serde_json::Value =
            serde_json::from_str(&server().login_hint("auth0|123")).unwrap();
        assert_eq!(hint["format"], "iss_sub");
        assert_eq!(hint["iss"], "https://tenant.example.com/");
        assert_eq!(hint["sub"], "auth0|123");
    }

    #[test]
    fn test_authorize_form_prepends_openid() {
        let form = server().authorize_form("u1", "Buy 10 ACME", &["stock:trade".to_string()]);
        let scope = form.iter().find(|(k, _)| *k == "scope").unwrap();
        assert_eq!(scope.1, "openid stock:trade");
        assert!(!form.iter().any(|(k, _)| *k == "audience"));
    }

    #[test]
    fn test_authorize_form_keeps_existing_openid() {
        let form = server().authorize_form(
            "u1",
            "msg",
            &["email".to_string(), "openid".to_string()],
        );
        let scope = form.iter().find(|(k, _)| *k == "scope").unwrap();
        assert_eq!(scope.1, "email openid");
    }

    #[test]
    fn test_authorize_form_optional_fields() {
        let config = AuthorizationConfig::new("tenant.example.com", "cid", "csecret")
            .with_audience("https://api.example.com")
            .with_requested_expiry(Duration::from_secs(120));
        let server = HttpAuthorizationServer::new(config).unwrap();
        let form = server.authorize_form("u1", "msg", &[]);

        assert!(form.contains(&("audience", "https://api.example.com".to_string())));
        assert!(form.contains(&("requested_expiry", "120".to_string())));
    }

    #[test]
    fn test_grant_form() {
        let form = server().grant_form("r1");
        assert!(form.contains(&("grant_type", CIBA_GRANT_TYPE.to_string())));
        assert!(form.contains(&("auth_req_id", "r1".to_string())));
    }

    #[test]
    fn test_invalid_domain_rejected() {
        let config = AuthorizationConfig::new("https://bad domain", "cid", "csecret");
        assert!(HttpAuthorizationServer::new(config).is_err());
    }

    #[tokio::test]
    async fn test_authorize_posts_form_and_parses_reply() {
        let server = MockServer::start().await;

        Mock::given(method("POST"))
            .and(path("/bc-authorize"))
            .and(header("content-type", "application/x-www-form-urlencoded"))
            .and(body_string_contains("client_id=cid"))
            .and(body_string_contains("scope=openid+stock%3Atrade"))
            .and(body_string_contains("binding_message=Buy+10+ACME"))
            .and(body_string_contains("login_hint="))
            .respond_with(ResponseTemplate::new(200).set_body_json(serde_json::json!({
                "auth_req_id": "r1",
                "expires_in": 300,
                "interval": 2
            })))
            .expect(1)
            .mount(&server)
            .await;

        let reply = mock_client(&server)
            .authorize("user-1", "Buy 10 ACME", &["stock:trade".to_string()])
            .await
            .unwrap();

        assert_eq!(reply.request_id, "r1");
        assert_eq!(reply.expires_in, Duration::from_secs(300));
        assert_eq!(reply.interval, Duration::from_secs(2));
    }

    #[tokio::test]
    async fn test_authorize_error_body() {
        let server = MockServer::start().await;

        Mock::given(method("POST"))
            .and(path("/bc-authorize"))
            .respond_with(ResponseTemplate::new(400).set_body_json(serde_json::json!({
                "error": "unknown_user_id",
                "error_description": "no such user"
            })))
            .mount(&server)
            .await;

        let err = mock_client(&server)
            .authorize("ghost", "msg", &[])
            .await
            .unwrap_err();

        match err {
            InitiationError::Api {
                status,
                error,
                description,
            } => {
                assert_eq!(status, 400);
                assert_eq!(error, "unknown_user_id");
                assert_eq!(description.as_deref(), Some("no such user"));
            }
            other => panic!("Expected Api error, got {:?}", other),
        }
    }

    #[tokio::test]
    async fn test_grant_returns_credential() {
        let server = MockServer::start().await;

        Mock::given(method("POST"))
            .and(path("/oauth/token"))
            .and(body_string_contains(
                "grant_type=urn%3Aopenid%3Aparams%3Agrant-type%3Aciba",
            ))
            .and(body_string_contains("auth_req_id=r1"))
            .respond_with(ResponseTemplate::new(200).set_body_json(serde_json::json!({
                "access_token": "tok",
                "token_type": "Bearer",
                "expires_in": 60,
                "scope": "openid stock:trade"
            })))
            .mount(&server)
            .await;

        let credential = mock_client(&server).grant("r1").await.unwrap();

        assert_eq!(credential.access_token, "tok");
        assert_eq!(credential.expires_in, Some(Duration::from_secs(60)));
        assert_eq!(credential.scope.as_deref(), Some("openid stock:trade"));
    }

    #[tokio::test]
    async fn test_grant_classifies_slow_down() {
        let server = MockServer::start().await;

        Mock::given(method("POST"))
            .and(path("/oauth/token"))
            .respond_with(
                ResponseTemplate::new(400)
                    .set_body_json(serde_json::json!({ "error": "slow_down" })),
            )
            .mount(&server)
            .await;

        let err = mock_client(&server).grant("r1").await.unwrap_err();

        assert_eq!(err.code(), GrantErrorCode::SlowDown);
        assert_eq!(err.description(), None);
    }

    #[tokio::test]
    async fn test_grant_classifies_access_denied() {
        let server = MockServer::start().await;

        Mock::given(method("POST"))
            .and(path("/oauth/token"))
            .respond_with(ResponseTemplate::new(403).set_body_json(serde_json::json!({
                "error": "access_denied",
                "error_description": "User declined the trade"
            })))
            .mount(&server)
            .await;

        let err = mock_client(&server).grant("r1").await.unwrap_err();

        assert_eq!(err.code(), GrantErrorCode::AccessDenied);
        assert_eq!(err.description(), Some("User declined the trade"));
    }
}
