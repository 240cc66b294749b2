// ABOUTME: Wire types for the backchannel and token endpoints, plus the pure
// ABOUTME: parsers that turn HTTP status and body into domain results.

use std::time::Duration;

use serde::Deserialize;

use super::AuthorizeResponse;
use crate::credential::Credential;
use crate::error::{GrantError, InitiationError};

/// Interval assumed when the server omits one (CIBA Core 7.3).
pub const DEFAULT_POLL_INTERVAL: Duration = Duration::from_secs(5);

/// Grant type for polling a backchannel request.
pub const CIBA_GRANT_TYPE: &str = "urn:openid:params:grant-type:ciba";

/// Successful `/bc-authorize` body.
#[derive(Debug, Deserialize)]
pub struct BackchannelAuthorizeBody {
    pub auth_req_id: String,
    pub expires_in: f64,
    #[serde(default)]
    pub interval: Option<f64>,
}

/// Successful token endpoint body.
#[derive(Debug, Deserialize)]
pub struct TokenBody {
    pub access_token: String,
    #[serde(default)]
    pub token_type: Option<String>,
    #[serde(default)]
    pub expires_in: Option<u64>,
    #[serde(default)]
    pub scope: Option<String>,
    #[serde(default)]
    pub id_token: Option<String>,
}

/// OAuth error body.
#[derive(Debug, Deserialize)]
pub struct OAuthErrorBody {
    pub error: String,
    #[serde(default)]
    pub error_description: Option<String>,
}

fn seconds(field: &str, value: f64) -> Result<Duration, String> {
    Duration::try_from_secs_f64(value).map_err(|e| format!("{} = {}: {}", field, value, e))
}

/// Parse the reply to a backchannel authorize call.
pub fn parse_authorize_response(
    status: u16,
    body: &[u8],
) -> Result<AuthorizeResponse, InitiationError> {
    if !(200..300).contains(&status) {
        return Err(match serde_json::from_slice::<OAuthErrorBody>(body) {
            Ok(err) => InitiationError::Api {
                status,
                error: err.error,
                description: err.error_description,
            },
            Err(_) => InitiationError::Api {
                status,
                error: "http_error".to_string(),
                description: Some(String::from_utf8_lossy(body).into_owned()),
            },
        });
    }

    let parsed: BackchannelAuthorizeBody = serde_json::from_slice(body)
        .map_err(|e| InitiationError::InvalidResponse(e.to_string()))?;

    let expires_in =
        seconds("expires_in", parsed.expires_in).map_err(InitiationError::InvalidResponse)?;
    let interval = match parsed.interval {
        Some(value) => seconds("interval", value).map_err(InitiationError::InvalidResponse)?,
        None => DEFAULT_POLL_INTERVAL,
    };

    Ok(AuthorizeResponse {
        request_id: parsed.auth_req_id,
        expires_in,
        interval,
    })
}

/// Parse the reply to a token endpoint poll.
pub fn parse_token_response(status: u16, body: &[u8]) -> Result<Credential, GrantError> {
    if !(200..300).contains(&status) {
        return Err(match serde_json::from_slice::<OAuthErrorBody>(body) {
            Ok(err) => GrantError::api(status, &err.error, err.error_description),
            Err(_) => GrantError::InvalidResponse(format!(
                "HTTP {} - {}",
                status,
                String::from_utf8_lossy(body)
            )),
        });
    }

    let parsed: TokenBody =
        serde_json::from_slice(body).map_err(|e| GrantError::InvalidResponse(e.to_string()))?;

    if parsed.access_token.is_empty() {
        return Err(GrantError::InvalidResponse(
            "empty access_token".to_string(),
        ));
    }

    Ok(Credential {
        token_type: parsed.token_type.unwrap_or_else(|| "Bearer".to_string()),
        access_token: parsed.access_token,
        expires_in: parsed.expires_in.map(Duration::from_secs),
        scope: parsed.scope,
        id_token: parsed.id_token,
    })
}
